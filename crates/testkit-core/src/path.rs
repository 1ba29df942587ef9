//! Hierarchical location of a node inside a value tree

use serde::{Serialize, Serializer};
use std::fmt;

/// One step into a value: a record field or a sequence index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Path from the root of a comparison to one of its nodes
///
/// Renders fields joined by `.` and indices in brackets, e.g.
/// `Pets[2].Name`. The empty path renders as `(root)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ValuePath {
    segments: Vec<Segment>,
}

impl ValuePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of a field below this path
    pub fn field(&self, name: impl Into<String>) -> Self {
        self.child(Segment::Field(name.into()))
    }

    /// Path of a sequence element below this path
    pub fn index(&self, i: usize) -> Self {
        self.child(Segment::Index(i))
    }

    fn child(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment);
        Self { segments }
    }

    /// Append `other` below this path
    pub fn join(&self, other: &ValuePath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn first(&self) -> Option<&Segment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, Segment::Field(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl Serialize for ValuePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<S: Into<String>> FromIterator<S> for ValuePath {
    /// Build a path of field segments
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(|s| Segment::Field(s.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(ValuePath::root().to_string(), "(root)");
        assert!(ValuePath::root().is_root());
    }

    #[test]
    fn test_nested_display() {
        let path = ValuePath::root().field("Pets").index(2).field("Name");
        assert_eq!(path.to_string(), "Pets[2].Name");

        let path = ValuePath::root().index(0).index(1).field("ID");
        assert_eq!(path.to_string(), "[0][1].ID");
    }

    #[test]
    fn test_join() {
        let base: ValuePath = ["Manager"].into_iter().collect();
        let tail = ValuePath::root().field("Account").field("Number");
        assert_eq!(base.join(&tail).to_string(), "Manager.Account.Number");
        assert_eq!(base.join(&tail).first(), Some(&Segment::Field("Manager".into())));
    }

    #[test]
    fn test_serializes_as_string() {
        let path = ValuePath::root().field("Toys").index(1);
        assert_eq!(serde_json::to_string(&path).unwrap(), r#""Toys[1]""#);
    }
}
