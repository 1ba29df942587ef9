//! Mismatch reports

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use testkit_core::{Segment, ValuePath};

/// What kind of difference a [`Mismatch`] records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Values differ after every unwrap and conversion
    Value,
    /// One side is absent, the other present
    Presence,
    /// Sequences of different lengths
    Length { actual: usize, expected: usize },
    /// Timestamps differ at second granularity
    Timestamp,
    /// No conversion exists between the two types
    Type,
    /// A named field does not exist
    Missing,
    /// A fixture invariant does not hold
    Check,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchKind::Value => write!(f, "VALUE"),
            MismatchKind::Presence => write!(f, "PRESENCE"),
            MismatchKind::Length { .. } => write!(f, "LENGTH"),
            MismatchKind::Timestamp => write!(f, "TIME"),
            MismatchKind::Type => write!(f, "TYPE"),
            MismatchKind::Missing => write!(f, "MISSING"),
            MismatchKind::Check => write!(f, "CHECK"),
        }
    }
}

/// A single difference between actual and expected values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    pub path: ValuePath,
    pub kind: MismatchKind,
    pub actual: String,
    pub expected: String,
}

impl Mismatch {
    pub fn new(
        path: ValuePath,
        kind: MismatchKind,
        actual: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self {
            path,
            kind,
            actual: actual.into(),
            expected: expected.into(),
        }
    }

    /// A fixture invariant that does not hold at `path`
    pub fn check(path: ValuePath, actual: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::new(path, MismatchKind::Check, actual, expected)
    }

    /// Two collections at `path` hold different numbers of items
    pub fn length(path: ValuePath, actual: usize, expected: usize) -> Self {
        Self::new(
            path,
            MismatchKind::Length { actual, expected },
            actual.to_string(),
            expected.to_string(),
        )
    }

    /// Name of the top-level field or index this mismatch lives under
    pub fn group(&self) -> String {
        match self.path.first() {
            Some(Segment::Field(name)) => name.clone(),
            Some(segment @ Segment::Index(_)) => segment.to_string(),
            None => self.path.to_string(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MismatchKind::Length { actual, expected } => write!(
                f,
                "{}: expect length: {}, got: {} (expect: {}, got: {})",
                self.path, expected, actual, self.expected, self.actual
            ),
            _ => write!(
                f,
                "{}: expect: {}, got: {}",
                self.path, self.expected, self.actual
            ),
        }
    }
}

/// Every mismatch found by one top-level comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Report {
    mismatches: Vec<Mismatch>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mismatch: Mismatch) {
        self.mismatches.push(mismatch);
    }

    /// Append every mismatch of `other`
    pub fn merge(&mut self, other: Report) {
        self.mismatches.extend(other.mismatches);
    }

    /// Move every mismatch below `prefix`
    pub fn nest_under(mut self, prefix: &ValuePath) -> Self {
        for mismatch in &mut self.mismatches {
            mismatch.path = prefix.join(&mismatch.path);
        }
        self
    }

    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mismatches.len()
    }

    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mismatch> {
        self.mismatches.iter()
    }

    /// Mismatches recorded exactly at `path`
    pub fn at<'a>(&'a self, path: &'a ValuePath) -> impl Iterator<Item = &'a Mismatch> + 'a {
        self.mismatches.iter().filter(move |m| &m.path == path)
    }

    /// Whether any mismatch was recorded at the rendered path
    pub fn has_path(&self, path: &str) -> bool {
        self.mismatches.iter().any(|m| m.path.to_string() == path)
    }

    /// Mismatches grouped by top-level field or index, in discovery order
    pub fn grouped(&self) -> IndexMap<String, Vec<&Mismatch>> {
        let mut groups: IndexMap<String, Vec<&Mismatch>> = IndexMap::new();
        for mismatch in &self.mismatches {
            groups.entry(mismatch.group()).or_default().push(mismatch);
        }
        groups
    }

    /// Print a summary of the report, one line per mismatch
    pub fn print_summary(&self, name: &str) {
        if self.passed() {
            println!("✅ {name} - PASS");
        } else {
            println!("❌ {name} - FAIL ({} mismatches)", self.len());
            for mismatch in &self.mismatches {
                println!("   [{:>8}] {mismatch}", mismatch.kind.to_string());
            }
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (group, mismatches) in self.grouped() {
            writeln!(f, "--- {group}")?;
            for mismatch in mismatches {
                writeln!(f, "    {mismatch}")?;
            }
        }
        Ok(())
    }
}

impl IntoIterator for Report {
    type Item = Mismatch;
    type IntoIter = std::vec::IntoIter<Mismatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.mismatches.into_iter()
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Mismatch;
    type IntoIter = std::slice::Iter<'a, Mismatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.mismatches.iter()
    }
}

impl Extend<Mismatch> for Report {
    fn extend<I: IntoIterator<Item = Mismatch>>(&mut self, iter: I) {
        self.mismatches.extend(iter);
    }
}

impl FromIterator<Mismatch> for Report {
    fn from_iter<I: IntoIterator<Item = Mismatch>>(iter: I) -> Self {
        Self {
            mismatches: iter.into_iter().collect(),
        }
    }
}
