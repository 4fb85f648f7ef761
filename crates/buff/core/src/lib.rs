//! Formula translation and repair for generated buff data.
//!
//! `buff-core` turns formula snippets written in a source calculation
//! vocabulary (call expressions over a per-character parameter table) into
//! formula text of a target vocabulary, and repairs known misinterpretation
//! shapes in produced target formulas. It never evaluates either dialect.
//!
//! Modules are organized leaf-first:
//!
//! - [`scan`]: bracket- and string-aware scanning primitives
//! - [`symbols`]: named sub-formulas of one source block
//! - [`params`]: parameter tables and path resolution
//! - [`translate`]: the recursive node translator
//! - [`gate`]: the allow-list check every translation must pass
//! - [`buff`]: key grammar, scale and merge, buff records
//! - [`repair`]: pattern repair over produced formulas
//! - [`engine`]: the per-unit driver tying the pieces together
//!
//! Refusing to translate is a normal outcome. Every declined fragment is a
//! [`Rejection`], logged and dropped; nothing in the pipeline panics or
//! surfaces partial output.
//!
//! ```
//! use buff_core::{BuffValue, Engine, EngineConfig, ParameterTable, TranslationUnit};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let unit = TranslationUnit::new(
//!     "Example",
//!     "const x = pct(dm.skill.hit1); premod: { dmg_: x }",
//!     ParameterTable::new().with("skill.hit1", 12.0),
//! );
//! let records = engine.translate_unit(&unit);
//! assert_eq!(records[0].get("dmg"), Some(&BuffValue::Number(1200.0)));
//! ```

pub mod buff;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod params;
pub mod repair;
pub mod scan;
pub mod symbols;
pub mod translate;

pub use buff::{BuffRecord, BuffValue, KeyGrammar, ScaleClass, SuffixRule, merge_value, scale};
pub use config::{EngineConfig, RepairConfig};
pub use engine::{Engine, TranslationUnit};
pub use error::{BuffError, ConfigError, EngineError, ErrorSeverity, Rejection};
pub use gate::{AllowList, has_disallowed_free_identifier};
pub use params::{AccessPath, ParamValue, ParameterTable, Step, resolve, resolve_value};
pub use repair::{RepairEngine, RepairKind, RepairRule};
pub use symbols::{Origin, SourceExpr, SymbolTable};
pub use translate::{CallForm, InliningStack, Translator};
