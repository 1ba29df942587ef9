//! Tagged value tree walked by the comparator

use crate::{ToValue, NIL};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use std::borrow::Cow;
use std::fmt;

/// Shape category of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Absent,
    Scalar,
    Timestamp,
    Optional,
    Extractable,
    Sequence,
    Record,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Absent => write!(f, "absent"),
            Shape::Scalar => write!(f, "scalar"),
            Shape::Timestamp => write!(f, "timestamp"),
            Shape::Optional => write!(f, "optional"),
            Shape::Extractable => write!(f, "extractable"),
            Shape::Sequence => write!(f, "sequence"),
            Shape::Record => write!(f, "record"),
        }
    }
}

/// A value reduced to the shapes the comparator understands
///
/// The plain `Display` form is the "string rendering" used by the fast
/// path: records print every field value (hidden ones included) inside
/// braces, sequences print their items inside brackets. The alternate form
/// (`{:#}`) adds type names and field names and is used in mismatch
/// reports.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (`None`, null pointer, JSON `null`)
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    /// Raw bytes, as drivers return text columns
    Bytes(Vec<u8>),
    Timestamp(DateTime<FixedOffset>),
    /// Optional or boxed indirection around a present value
    Boxed(Box<Value>),
    /// Driver value whose comparable content is its storage value
    Stored(Stored),
    Sequence(Sequence),
    Record(Record),
}

impl Value {
    /// Wrap a value in one level of indirection
    ///
    /// An absent value stays absent: there is no boxed null.
    pub fn boxed(inner: Value) -> Self {
        match inner {
            Value::Null => Value::Null,
            inner => Value::Boxed(Box::new(inner)),
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Value::Null => Shape::Absent,
            Value::Bool(_)
            | Value::Int(_)
            | Value::UInt(_)
            | Value::Float(_)
            | Value::Text(_)
            | Value::Bytes(_) => Shape::Scalar,
            Value::Timestamp(_) => Shape::Timestamp,
            Value::Boxed(_) => Shape::Optional,
            Value::Stored(_) => Shape::Extractable,
            Value::Sequence(_) => Shape::Sequence,
            Value::Record(_) => Shape::Record,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's type, used in reports and conversion checks
    pub fn type_name(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed("nil"),
            Value::Bool(_) => Cow::Borrowed("bool"),
            Value::Int(_) => Cow::Borrowed("i64"),
            Value::UInt(_) => Cow::Borrowed("u64"),
            Value::Float(_) => Cow::Borrowed("f64"),
            Value::Text(_) => Cow::Borrowed("String"),
            Value::Bytes(_) => Cow::Borrowed("Vec<u8>"),
            Value::Timestamp(_) => Cow::Borrowed("DateTime"),
            Value::Boxed(inner) => Cow::Owned(format!("&{}", inner.type_name())),
            Value::Stored(stored) => Cow::Borrowed(&stored.type_name),
            Value::Sequence(seq) => Cow::Owned(format!("Vec<{}>", seq.elem_type)),
            Value::Record(record) => Cow::Borrowed(&record.type_name),
        }
    }

    /// Replace an extractable value with its storage value
    pub fn unwrap_stored(&self) -> &Value {
        match self {
            Value::Stored(stored) => &stored.storage,
            other => other,
        }
    }

    /// Remove one level of indirection
    pub fn unwrap_boxed(&self) -> &Value {
        match self {
            Value::Boxed(inner) => inner,
            other => other,
        }
    }

    /// Remove every level of indirection
    pub fn peel(&self) -> &Value {
        let mut current = self;
        while let Value::Boxed(inner) = current {
            current = inner;
        }
        current
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Value::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Timestamp form of the value, looking through wrappers
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(ts.with_timezone(&Utc)),
            Value::Boxed(inner) => inner.as_timestamp(),
            Value::Stored(stored) => stored.storage.as_timestamp(),
            _ => None,
        }
    }

    /// Convert this value to the type of `target`, if such a conversion exists
    ///
    /// Numbers convert between each other when the value is representable,
    /// records convert to records with the same field names in the same
    /// order, and sequences convert when their element types agree. Text
    /// and bytes convert into each other when the bytes are valid UTF-8.
    pub fn convert_to(&self, target: &Value) -> Option<Value> {
        match (self, target) {
            (Value::Bool(b), Value::Bool(_)) => Some(Value::Bool(*b)),
            (Value::Int(i), Value::Int(_)) => Some(Value::Int(*i)),
            (Value::Int(i), Value::UInt(_)) => u64::try_from(*i).ok().map(Value::UInt),
            (Value::Int(i), Value::Float(_)) => Some(Value::Float(*i as f64)),
            (Value::UInt(u), Value::UInt(_)) => Some(Value::UInt(*u)),
            (Value::UInt(u), Value::Int(_)) => i64::try_from(*u).ok().map(Value::Int),
            (Value::UInt(u), Value::Float(_)) => Some(Value::Float(*u as f64)),
            (Value::Float(x), Value::Float(_)) => Some(Value::Float(*x)),
            (Value::Float(x), Value::Int(_)) => {
                integral(*x, i64::MIN as f64, i64::MAX as f64).map(|x| Value::Int(x as i64))
            }
            (Value::Float(x), Value::UInt(_)) => {
                integral(*x, 0.0, u64::MAX as f64).map(|x| Value::UInt(x as u64))
            }
            (Value::Text(s), Value::Text(_)) => Some(Value::Text(s.clone())),
            (Value::Text(s), Value::Bytes(_)) => Some(Value::Bytes(s.clone().into_bytes())),
            (Value::Bytes(b), Value::Bytes(_)) => Some(Value::Bytes(b.clone())),
            (Value::Bytes(b), Value::Text(_)) => String::from_utf8(b.clone()).ok().map(Value::Text),
            (Value::Timestamp(ts), Value::Timestamp(_)) => Some(Value::Timestamp(*ts)),
            (Value::Record(record), Value::Record(other)) if record.same_layout(other) => {
                Some(Value::Record(Record {
                    type_name: other.type_name.clone(),
                    fields: record.fields.clone(),
                }))
            }
            (Value::Sequence(seq), Value::Sequence(other)) if seq.elem_type == other.elem_type => {
                Some(Value::Sequence(seq.clone()))
            }
            _ => None,
        }
    }
}

fn integral(x: f64, min: f64, max: f64) -> Option<f64> {
    (x.fract() == 0.0 && x >= min && x < max).then_some(x)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alternate = f.alternate();
        match self {
            Value::Null if alternate => write!(f, "None"),
            Value::Null => f.write_str(NIL),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) if alternate => write!(f, "{s:?}"),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) if alternate => write!(f, "b\"{}\"", b.escape_ascii()),
            Value::Bytes(b) => {
                f.write_str("[")?;
                for (i, byte) in b.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{byte}")?;
                }
                f.write_str("]")
            }
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Boxed(inner) if alternate => write!(f, "&{inner:#}"),
            Value::Boxed(inner) => write!(f, "&{inner}"),
            Value::Stored(stored) if alternate => {
                write!(f, "{}({})", stored.type_name, stored.rendering)
            }
            Value::Stored(stored) => f.write_str(&stored.rendering),
            Value::Sequence(seq) => {
                if alternate {
                    write!(f, "{} ", self.type_name())?;
                }
                f.write_str("[")?;
                for (i, item) in seq.items.iter().enumerate() {
                    if alternate {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{item:#}")?;
                    } else {
                        if i > 0 {
                            f.write_str(" ")?;
                        }
                        write!(f, "{item}")?;
                    }
                }
                f.write_str("]")
            }
            Value::Record(record) if alternate => {
                write!(f, "{} {{", record.type_name)?;
                for (i, field) in record.fields.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{sep}{}: {:#}", field.name, field.value)?;
                }
                if record.fields.is_empty() {
                    f.write_str("}")
                } else {
                    f.write_str(" }")
                }
            }
            Value::Record(record) => {
                f.write_str("{")?;
                for (i, field) in record.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", field.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A structured record: named fields in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: String,
    pub fields: Vec<Field>,
}

/// One field of a [`Record`]
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
    /// Whether the field takes part in field-by-field comparison
    pub visible: bool,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a visible field
    pub fn field<T: ToValue + ?Sized>(mut self, name: impl Into<String>, value: &T) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.to_value(),
            visible: true,
        });
        self
    }

    /// Add a field that is rendered but never compared on its own
    pub fn hidden<T: ToValue + ?Sized>(mut self, name: impl Into<String>, value: &T) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.to_value(),
            visible: false,
        });
        self
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Look up a field by name, visible or not
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.value)
    }

    pub fn visible_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|field| field.visible)
    }

    pub fn has_visible_fields(&self) -> bool {
        self.fields.iter().any(|field| field.visible)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn same_layout(&self, other: &Record) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.name == b.name)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

/// An ordered sequence of values sharing one element type
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub elem_type: String,
    pub items: Vec<Value>,
}

impl Sequence {
    pub fn new(elem_type: impl Into<String>, items: Vec<Value>) -> Self {
        Self {
            elem_type: elem_type.into(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<Sequence> for Value {
    fn from(seq: Sequence) -> Self {
        Value::Sequence(seq)
    }
}

/// An extractable value: how it renders, and what it stores
#[derive(Debug, Clone, PartialEq)]
pub struct Stored {
    pub type_name: String,
    pub rendering: String,
    pub storage: Box<Value>,
}

impl Stored {
    pub fn new(type_name: impl Into<String>, rendering: impl Into<String>, storage: Value) -> Self {
        Self {
            type_name: type_name.into(),
            rendering: rendering.into(),
            storage: Box::new(storage),
        }
    }
}

impl From<Stored> for Value {
    fn from(stored: Stored) -> Self {
        Value::Stored(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet(name: &str, cache: i64) -> Value {
        Record::new("Pet")
            .field("Name", name)
            .hidden("cache", &cache)
            .into()
    }

    #[test]
    fn test_boxed_null_stays_null() {
        assert_eq!(Value::boxed(Value::Null), Value::Null);
        assert_eq!(Value::boxed(Value::Int(1)).shape(), Shape::Optional);
    }

    #[test]
    fn test_plain_rendering() {
        assert_eq!(Value::Null.to_string(), "<nil>");
        assert_eq!(Value::Float(5.0).to_string(), "5");
        assert_eq!(Value::Text("hi".into()).to_string(), "hi");
        assert_eq!(pet("rex", 3).to_string(), "{rex 3}");
        assert_eq!(Value::boxed(pet("rex", 3)).to_string(), "&{rex 3}");

        let seq = Value::from(Sequence::new("i64", vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(seq.to_string(), "[1 2]");
    }

    #[test]
    fn test_alternate_rendering() {
        assert_eq!(format!("{:#}", pet("rex", 3)), r#"Pet { Name: "rex", cache: 3 }"#);
        assert_eq!(format!("{:#}", Value::from(Record::new("Empty"))), "Empty {}");

        let seq = Value::from(Sequence::new("i64", vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(format!("{seq:#}"), "Vec<i64> [1, 2]");
    }

    #[test]
    fn test_timestamp_rendering_uses_utc_suffix() {
        let ts: DateTime<FixedOffset> = "2024-01-01T00:00:00.400Z".parse().unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-01-01T00:00:00.400Z");
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(Value::Int(5).convert_to(&Value::UInt(0)), Some(Value::UInt(5)));
        assert_eq!(Value::Int(-5).convert_to(&Value::UInt(0)), None);
        assert_eq!(Value::Float(2.0).convert_to(&Value::Int(0)), Some(Value::Int(2)));
        assert_eq!(Value::Float(2.5).convert_to(&Value::Int(0)), None);
        assert_eq!(Value::Bool(true).convert_to(&Value::Int(0)), None);
    }

    #[test]
    fn test_text_and_bytes_conversions() {
        let bytes = Value::Bytes(b"ab".to_vec());
        assert_eq!(bytes.to_string(), "[97 98]");
        assert_eq!(format!("{bytes:#}"), r#"b"ab""#);
        assert_eq!(bytes.shape(), Shape::Scalar);

        let text = Value::Text("ab".into());
        assert_eq!(text.convert_to(&bytes), Some(bytes.clone()));
        assert_eq!(bytes.convert_to(&text), Some(text));
        assert_eq!(Value::Bytes(vec![0xff, 0xfe]).convert_to(&Value::Text(String::new())), None);
    }

    #[test]
    fn test_record_conversion_requires_same_layout() {
        let other = Value::from(Record::new("Animal").field("Name", "x").hidden("cache", &0i64));
        let converted = pet("rex", 1).convert_to(&other).unwrap();
        assert_eq!(converted.type_name(), "Animal");

        let mismatched = Value::from(Record::new("Animal").field("Title", "x"));
        assert_eq!(pet("rex", 1).convert_to(&mismatched), None);
    }

    #[test]
    fn test_peel_and_timestamp_through_wrappers() {
        let ts: DateTime<FixedOffset> = "2024-01-01T02:00:00+02:00".parse().unwrap();
        let stored = Value::from(Stored::new("NullTime", "x", Value::Timestamp(ts)));
        let wrapped = Value::boxed(Value::boxed(stored));
        assert_eq!(wrapped.peel().shape(), Shape::Extractable);
        assert_eq!(
            wrapped.as_timestamp().unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
    }
}
