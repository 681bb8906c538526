//! # cfgbind-engine
//!
//! Declarative binding of command-line tokens to typed config instances.
//!
//! Handles:
//! - **Schema**: Field kinds and their annotations.
//! - **Registry**: Registration of config types, sections, and constraints.
//! - **Parser**: Token grammar, `--config` YAML documents, and validation.
//! - **Coercion**: Conversion of supplied values into declared kinds.
//! - **Executor**: Instance construction, checks, and phase execution.
//! - **Help**: Sectioned help text.

pub mod coerce;
pub mod config_type;
pub mod engine;
pub mod executor;
pub mod help;
pub mod parser;
pub mod registry;
pub mod schema;

pub use cfgbind_common::config::RunOptions;
pub use cfgbind_common::error::{CfgbindError, ErrorCategory, HandlerError, HandlerResult, Result};
pub use cfgbind_common::types::{ConfigSection, Constraint, SectionId};

pub use crate::config_type::ConfigType;
pub use crate::engine::Engine;
pub use crate::executor::{ParseResult, ParsedInstance};
pub use crate::registry::{Registry, RegistryBuilder};
pub use crate::schema::{Field, FieldKind, FloatWidth, IntWidth, Shape};
