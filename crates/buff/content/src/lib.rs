//! File-backed inputs and outputs for the buff translation engine.
//!
//! This crate reads everything [`buff_core`] needs from a data directory and
//! writes what it produces back out:
//! - Engine configuration (data-driven via TOML)
//! - Per-character parameter tables (JSON or RON)
//! - Source formula blocks (plain text)
//! - Produced buff records (pretty JSON)
//!
//! `buff-core` itself performs no I/O; all of it lives here.

pub mod cache;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use cache::ParameterCache;

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, ContentFactory, LoadResult, ParameterLoader, RecordLoader, RecordWriter,
    SourceLoader,
};
