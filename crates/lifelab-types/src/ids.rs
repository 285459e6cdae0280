//! Type-safe identifier wrappers around store-assigned integers.
//!
//! Experiments and trace rows are keyed by `BIGSERIAL` columns, so their
//! identifiers are monotonic `i64` values handed out by the store on
//! insert. Wrapping them prevents passing a trace id where an experiment
//! id is expected.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around a store-assigned `i64` key.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(#[ts(type = "number")] pub i64);

        impl $name {
            /// Return the inner integer value.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of an experiment row.
    ExperimentId
}

define_id! {
    /// Surrogate identifier of a single generation trace row.
    TraceId
}
