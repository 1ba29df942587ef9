//! Driver-style nullable column wrappers
//!
//! Each wrapper pairs a value with a validity flag, the way database
//! drivers model nullable columns. Their comparable content is their
//! storage value, exposed through [`Valuer`], not their surface form.

use crate::value::{Stored, Value};
use crate::{ToValue, NULL};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value whose comparable content is the value it would store
pub trait Valuer {
    /// The value written to the database: [`Value::Null`] when unset
    fn storage_value(&self) -> Value;
}

macro_rules! nullable {
    ($(#[$meta:meta])* $name:ident, $inner:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub value: $inner,
            pub valid: bool,
        }

        impl $name {
            /// A set value
            pub fn new(value: impl Into<$inner>) -> Self {
                Self {
                    value: value.into(),
                    valid: true,
                }
            }

            /// An unset value
            pub fn null() -> Self {
                Self::default()
            }

            pub fn is_null(&self) -> bool {
                !self.valid
            }

            pub fn get(&self) -> Option<&$inner> {
                self.valid.then_some(&self.value)
            }
        }

        impl From<Option<$inner>> for $name {
            fn from(value: Option<$inner>) -> Self {
                match value {
                    Some(value) => Self::new(value),
                    None => Self::null(),
                }
            }
        }

        impl Valuer for $name {
            fn storage_value(&self) -> Value {
                match self.get() {
                    Some(value) => value.to_value(),
                    None => Value::Null,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.get() {
                    Some(value) => write!(f, "{}", value.to_value()),
                    None => f.write_str(NULL),
                }
            }
        }

        impl ToValue for $name {
            fn to_value(&self) -> Value {
                Stored::new(stringify!($name), self.to_string(), self.storage_value()).into()
            }
        }
    };
}

nullable!(
    /// Nullable text column
    NullString,
    String
);
nullable!(
    /// Nullable 64-bit integer column
    NullInt64,
    i64
);
nullable!(NullFloat64, f64);
nullable!(NullBool, bool);
nullable!(
    /// Nullable timestamp column
    NullTime,
    DateTime<Utc>
);

impl NullInt64 {
    /// Nullable foreign key from an optional row ID, treating 0 as unset
    pub fn from_id(id: i64) -> Self {
        if id == 0 {
            Self::null()
        } else {
            Self::new(id)
        }
    }
}
