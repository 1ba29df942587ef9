//! Named-field comparison of two records

use crate::compare::diff;
use crate::report::{Mismatch, MismatchKind, Report};
use testkit_core::{ToValue, Value, ValuePath};

const MISSING: &str = "(missing)";

/// Compare only the named fields of two records
///
/// Each field is compared with the full deep-equality rules at path
/// `name`. Indirection on either record is looked through first.
pub fn compare_fields<A, E>(actual: &A, expected: &E, names: &[&str]) -> Report
where
    A: ToValue + ?Sized,
    E: ToValue + ?Sized,
{
    compare_fields_at(
        &ValuePath::root(),
        &actual.to_value(),
        &expected.to_value(),
        names,
    )
}

/// Compare the named fields of two records, reporting below `path`
pub fn compare_fields_at(
    path: &ValuePath,
    actual: &Value,
    expected: &Value,
    names: &[&str],
) -> Report {
    let mut report = Report::new();
    let (actual, expected) = (actual.peel(), expected.peel());

    match (actual, expected) {
        (Value::Null, Value::Null) => {}
        (Value::Null, _) | (_, Value::Null) => report.push(Mismatch::new(
            path.clone(),
            MismatchKind::Presence,
            actual.to_string(),
            expected.to_string(),
        )),
        (Value::Record(got), Value::Record(want)) => {
            for name in names {
                let field_path = path.field(*name);
                match (got.get(name), want.get(name)) {
                    (Some(g), Some(w)) => diff(&field_path, g, w, &mut report),
                    (g, w) => report.push(Mismatch::new(
                        field_path,
                        MismatchKind::Missing,
                        g.map_or_else(|| MISSING.to_string(), ToString::to_string),
                        w.map_or_else(|| MISSING.to_string(), ToString::to_string),
                    )),
                }
            }
        }
        _ => report.push(Mismatch::new(
            path.clone(),
            MismatchKind::Type,
            actual.type_name(),
            expected.type_name(),
        )),
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use testkit_core::Record;

    fn company(id: i64, name: &str, note: &str) -> Value {
        Record::new("Company")
            .field("ID", &id)
            .field("Name", name)
            .field("Note", note)
            .into()
    }

    #[test]
    fn test_only_named_fields_compared() {
        let report = compare_fields(&company(1, "a", "x"), &company(1, "a", "y"), &["ID", "Name"]);
        assert!(report.is_empty());

        let report = compare_fields(&company(1, "a", "x"), &company(2, "a", "y"), &["ID", "Name"]);
        assert_eq!(report.len(), 1);
        assert!(report.has_path("ID"));
    }

    #[test]
    fn test_missing_field() {
        let report = compare_fields(&company(1, "a", "x"), &company(1, "a", "x"), &["Owner"]);
        assert_eq!(report.len(), 1);
        let mismatch = &report.mismatches()[0];
        assert_eq!(mismatch.kind, MismatchKind::Missing);
        assert_eq!(mismatch.actual, "(missing)");
    }

    #[test]
    fn test_boxed_records_are_peeled() {
        let report = compare_fields(
            &Value::boxed(company(1, "a", "x")),
            &company(1, "a", "x"),
            &["ID"],
        );
        assert!(report.is_empty());
    }

    #[test]
    fn test_absent_records() {
        assert!(compare_fields(&None::<i64>, &None::<i64>, &["ID"]).is_empty());

        let report = compare_fields(&None::<i64>, &company(1, "a", "x"), &["ID"]);
        assert_eq!(report.mismatches()[0].kind, MismatchKind::Presence);
        assert!(report.mismatches()[0].path.is_root());
    }

    #[test]
    fn test_non_record_input() {
        let report = compare_fields(&5i64, &company(1, "a", "x"), &["ID"]);
        assert_eq!(report.mismatches()[0].kind, MismatchKind::Type);
        assert_eq!(report.mismatches()[0].expected, "Company");
    }
}
