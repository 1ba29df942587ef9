//! Panicking assertions for use inside tests

use crate::compare::compare;
use crate::fields::compare_fields;
use crate::report::Report;
use testkit_core::ToValue;

/// Assert that two values are deeply equal
///
/// Panics with every mismatch, grouped by top-level field or index.
#[track_caller]
pub fn assert_equal<A, E>(actual: &A, expected: &E)
where
    A: ToValue + ?Sized,
    E: ToValue + ?Sized,
{
    compare(actual, expected).assert_passed();
}

/// Assert that the named fields of two records are deeply equal
#[track_caller]
pub fn assert_obj_equal<A, E>(actual: &A, expected: &E, names: &[&str])
where
    A: ToValue + ?Sized,
    E: ToValue + ?Sized,
{
    compare_fields(actual, expected, names).assert_passed();
}

impl Report {
    /// Panic if any mismatch was recorded
    #[track_caller]
    pub fn assert_passed(&self) {
        if !self.passed() {
            panic!("{} mismatch(es):\n{}", self.len(), self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_equal_passes() {
        assert_equal(&vec![1i64, 2], &vec![1u8, 2]);
    }

    #[test]
    #[should_panic(expected = "[1]: expect: 3, got: 2")]
    fn test_assert_equal_reports_path() {
        assert_equal(&vec![1i64, 2], &vec![1i64, 3]);
    }

    #[test]
    #[should_panic(expected = "1 mismatch(es)")]
    fn test_assert_obj_equal_on_non_record() {
        assert_obj_equal(&1i64, &1i64, &["ID"]);
    }
}
