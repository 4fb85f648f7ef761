//! Buff records and the key grammar that governs them.
//!
//! - `value`: literal vs formula values, scale and merge arithmetic
//! - `grammar`: target key names and the scale class each implies
//! - `record`: titled key → value bundles validated against the grammar

mod grammar;
mod record;
mod value;

pub use grammar::{KeyGrammar, ScaleClass, SuffixRule};
pub use record::BuffRecord;
pub use value::{BuffValue, format_number, merge_value, scale};

pub(crate) use value::{is_atomic, wrap};
