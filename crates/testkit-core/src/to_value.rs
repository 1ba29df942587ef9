//! Introspection of Rust values into [`Value`] trees

use crate::value::{Field, Record, Sequence, Value};
use chrono::{DateTime, NaiveDateTime, TimeZone};

/// Conversion of a Rust value into the comparator's value model
///
/// Records implement this by hand, listing their fields with
/// [`Record::field`] (compared) or [`Record::hidden`] (rendered only):
///
/// ```
/// use testkit_core::{Record, ToValue, Value};
///
/// struct Company {
///     id: i64,
///     name: String,
/// }
///
/// impl ToValue for Company {
///     fn to_value(&self) -> Value {
///         Record::new("Company")
///             .field("ID", &self.id)
///             .field("Name", &self.name)
///             .into()
///     }
/// }
/// ```
pub trait ToValue {
    fn to_value(&self) -> Value;

    /// Type name used as the element type of sequences of `Self`
    fn type_label() -> String
    where
        Self: Sized,
    {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Strip module paths from a fully qualified type name
///
/// `alloc::vec::Vec<my_crate::models::Pet>` becomes `Vec<Pet>`.
pub fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut token = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            token.push(c);
        } else {
            out.push_str(last_segment(&token));
            token.clear();
            out.push(c);
        }
    }
    out.push_str(last_segment(&token));
    out
}

fn last_segment(token: &str) -> &str {
    token.rsplit("::").next().unwrap_or(token)
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

macro_rules! impl_signed {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }
        )*
    };
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {
        $(
            impl ToValue for $t {
                fn to_value(&self) -> Value {
                    Value::UInt(u64::from(*self))
                }
            }
        )*
    };
}

impl_signed!(i8, i16, i32, i64);
impl_unsigned!(u8, u16, u32, u64);

impl ToValue for isize {
    fn to_value(&self) -> Value {
        Value::Int(*self as i64)
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Value {
        Value::UInt(*self as u64)
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_owned())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

/// Byte buffer compared as a single scalar
///
/// `Vec<u8>` introspects as a sequence of integers; wrap it in `Bytes` to
/// get a value that coerces to and from text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bytes(pub Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl ToValue for Bytes {
    fn to_value(&self) -> Value {
        Value::Bytes(self.0.clone())
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        Value::boxed((**self).to_value())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(inner) => Value::boxed(inner.to_value()),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Sequence::new(T::type_label(), self.iter().map(ToValue::to_value).collect()).into()
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<Tz: TimeZone> ToValue for DateTime<Tz> {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.fixed_offset())
    }
}

/// Naive timestamps are taken to be UTC
impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.and_utc().fixed_offset())
    }
}

/// JSON objects become records of type `Object` whose fields are all visible
impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        match self {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => {
                Sequence::new("Value", items.iter().map(ToValue::to_value).collect()).into()
            }
            serde_json::Value::Object(map) => {
                let mut record = Record::new("Object");
                for (key, value) in map {
                    record.push(Field {
                        name: key.clone(),
                        value: value.to_value(),
                        visible: true,
                    });
                }
                record.into()
            }
        }
    }
}
