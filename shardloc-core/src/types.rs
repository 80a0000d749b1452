//! Strongly-typed names for shards and steps.
//!
//! Names are owned by the dataflow model upstream; here they are opaque,
//! comparable keys. Wrapping them keeps a step name from ever being used
//! as a registry key.

use std::borrow::Borrow;
use std::fmt;

/// Macro to generate strongly-typed name wrappers.
///
/// Each name type wraps a `String` and provides:
/// - Type safety (can't mix `ShardName` with `StepName`)
/// - Debug/Display formatting
/// - Cheap borrowing as `&str`
macro_rules! define_name {
    ($name:ident, $prefix:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[repr(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new name from anything convertible to a `String`.
            #[inline]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the name as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the inner string.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", $prefix, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_name!(ShardName, "shard", "Unique name of a dataset shard.");
define_name!(StepName, "step", "Human-readable name of a dataflow step.");
