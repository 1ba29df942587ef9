//! Recursive deep equality walker

use crate::report::{Mismatch, MismatchKind, Report};
use crate::timestamp::same_second;
use chrono::Utc;
use std::borrow::Cow;
use testkit_core::{ToValue, Value, ValuePath};
use tracing::{debug, trace};

/// Compare two values from the root
pub fn compare<A, E>(actual: &A, expected: &E) -> Report
where
    A: ToValue + ?Sized,
    E: ToValue + ?Sized,
{
    compare_at(&ValuePath::root(), &actual.to_value(), &expected.to_value())
}

/// Compare two value trees, reporting mismatches below `path`
pub fn compare_at(path: &ValuePath, actual: &Value, expected: &Value) -> Report {
    let mut report = Report::new();
    diff(path, actual, expected, &mut report);
    debug!(path = %path, mismatches = report.len(), "Compared values");
    report
}

pub(crate) fn diff(path: &ValuePath, actual: &Value, expected: &Value, report: &mut Report) {
    if actual.to_string() == expected.to_string() {
        return;
    }

    if actual.is_null() != expected.is_null() {
        record(report, path, MismatchKind::Presence, actual, expected);
        return;
    }

    if let Value::Timestamp(got) = actual {
        let got = got.with_timezone(&Utc);
        match expected.as_timestamp() {
            Some(want) if same_second(&got, &want) => {}
            Some(_) => record(report, path, MismatchKind::Timestamp, actual, expected),
            None if holds_null(expected) => {
                record(report, path, MismatchKind::Presence, actual, expected)
            }
            None => record(report, path, MismatchKind::Type, actual, expected),
        }
        return;
    }

    match (actual, expected) {
        (Value::Stored(_), _) | (_, Value::Stored(_)) => {
            trace!(path = %path, "Comparing storage values");
            diff(path, actual.unwrap_stored(), expected.unwrap_stored(), report);
        }
        (Value::Boxed(_), _) | (_, Value::Boxed(_)) => {
            diff(path, actual.unwrap_boxed(), expected.unwrap_boxed(), report);
        }
        (Value::Sequence(got), Value::Sequence(want)) => {
            if got.len() != want.len() {
                report.push(Mismatch::new(
                    path.clone(),
                    MismatchKind::Length {
                        actual: got.len(),
                        expected: want.len(),
                    },
                    actual.to_string(),
                    expected.to_string(),
                ));
                return;
            }
            for (i, (g, w)) in got.items.iter().zip(&want.items).enumerate() {
                diff(&path.index(i), g, w, report);
            }
        }
        (Value::Record(got), Value::Record(want))
            if got.len() == want.len() && got.has_visible_fields() =>
        {
            for (g, w) in got.fields.iter().zip(&want.fields) {
                if g.visible {
                    diff(&path.field(&g.name), &g.value, &w.value, report);
                }
            }
        }
        _ => coerce(path, actual, expected, report),
    }
}

/// Convert one side to the other's type and compare again
///
/// Tries `actual` as `expected`'s type first, then `expected` as
/// `actual`'s type.
fn coerce(path: &ValuePath, actual: &Value, expected: &Value, report: &mut Report) {
    let (got, want): (Cow<'_, Value>, Cow<'_, Value>) =
        if let Some(converted) = actual.convert_to(expected) {
            (Cow::Owned(converted), Cow::Borrowed(expected))
        } else if let Some(converted) = expected.convert_to(actual) {
            (Cow::Borrowed(actual), Cow::Owned(converted))
        } else {
            record(report, path, MismatchKind::Type, actual, expected);
            return;
        };

    if got.to_string() != want.to_string() {
        report.push(Mismatch::new(
            path.clone(),
            MismatchKind::Value,
            format!("{actual:#}"),
            format!("{expected:#}"),
        ));
    }
}

/// Whether a value is absent once wrappers and storage values are removed
fn holds_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Boxed(inner) => holds_null(inner),
        Value::Stored(stored) => holds_null(&stored.storage),
        _ => false,
    }
}

fn record(
    report: &mut Report,
    path: &ValuePath,
    kind: MismatchKind,
    actual: &Value,
    expected: &Value,
) {
    trace!(path = %path, %kind, "Mismatch");
    report.push(Mismatch::new(
        path.clone(),
        kind,
        actual.to_string(),
        expected.to_string(),
    ));
}
