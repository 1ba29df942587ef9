//! Deep equality comparison for dialect tests
//!
//! Compares an "actual" and an "expected" value tree and reports every
//! difference by path instead of stopping at the first one.
//!
//! # Rules
//!
//! ```text
//! 1. renderings equal            -> equal
//! 2. one side absent             -> mismatch, no descent
//! 3. actual is a timestamp       -> equal at second granularity?
//! 4. extractable value           -> compare storage values
//! 5. optional / boxed            -> compare pointees
//! 6. two sequences               -> length, then element-wise
//! 7. two records, same arity     -> visible fields
//! 8. convertible types           -> convert, compare renderings
//! 9. otherwise                   -> mismatch
//! ```

pub mod assert;
pub mod compare;
pub mod fields;
pub mod report;
mod timestamp;

pub use assert::{assert_equal, assert_obj_equal};
pub use compare::{compare, compare_at};
pub use fields::{compare_fields, compare_fields_at};
pub use report::{Mismatch, MismatchKind, Report};
pub use timestamp::same_second;
