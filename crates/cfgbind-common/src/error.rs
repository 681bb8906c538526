//! Unified error type for the cfgbind workspace.
//!
//! Every failure the engine can report is a variant of [`CfgbindError`]. The
//! engine never terminates the process; callers decide how to surface errors.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Error produced by a caller-supplied check or phase operation.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a caller-supplied check or phase operation.
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// Coarse grouping of [`CfgbindError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A config type or field was declared incorrectly.
    Registration,
    /// The token stream does not follow the command-line grammar.
    Grammar,
    /// A value could not be converted into its field's kind.
    Coercion,
    /// A required/singleton/exclusive rule was broken.
    Constraint,
    /// An external document could not be read or understood.
    Document,
    /// A type's own check operation rejected its values.
    Semantic,
    /// A phase operation failed.
    Phase,
    /// Writing help output failed.
    Output,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registration => write!(f, "registration"),
            Self::Grammar => write!(f, "grammar"),
            Self::Coercion => write!(f, "coercion"),
            Self::Constraint => write!(f, "constraint"),
            Self::Document => write!(f, "document"),
            Self::Semantic => write!(f, "semantic"),
            Self::Phase => write!(f, "phase"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CfgbindError {
    /// A config type with the same flag name is already registered.
    #[error("config type --{flag} is already registered")]
    DuplicateFlag {
        /// Conflicting flag name.
        flag: String,
    },

    /// A flag name is empty, malformed, or reserved.
    #[error("invalid flag name \"{flag}\": {reason}")]
    InvalidFlagName {
        /// Offending flag name.
        flag: String,
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// Two fields of one config type share a name.
    #[error("config type --{flag} declares field \"{field}\" more than once")]
    DuplicateField {
        /// Owning config type.
        flag: String,
        /// Repeated field name.
        field: String,
    },

    /// A field annotation could not be understood.
    #[error("invalid annotation on field \"{field}\" of --{flag}: {message}")]
    InvalidAnnotation {
        /// Owning config type.
        flag: String,
        /// Annotated field.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// More than one field of a config type is marked as the bare value.
    #[error("config type --{flag} marks both \"{first}\" and \"{second}\" as bare value")]
    MultipleBareValues {
        /// Owning config type.
        flag: String,
        /// First bare-value field.
        first: String,
        /// Second bare-value field.
        second: String,
    },

    /// A section reference does not belong to this registry.
    #[error("config type --{flag} refers to an unknown section")]
    UnknownSection {
        /// Config type carrying the reference.
        flag: String,
    },

    /// A `--<name>` token does not name a registered config type.
    #[error("unknown flag: --{flag}")]
    UnknownFlag {
        /// Name following the `--` prefix.
        flag: String,
    },

    /// A `key=value` token names a field the config type does not have.
    #[error("config type --{flag} has no field named \"{field}\"")]
    UnknownField {
        /// Config type of the active block.
        flag: String,
        /// Unrecognized field key.
        field: String,
    },

    /// An unlabeled token was given to a config type with no bare-value field.
    #[error("config type --{flag} does not accept a bare value (got \"{value}\")")]
    NoBareValueField {
        /// Config type of the active block.
        flag: String,
        /// The unlabeled token.
        value: String,
    },

    /// A token appeared before any `--<FlagName>` opened a block.
    #[error("\"{token}\" does not follow any --<type> flag")]
    ValueOutsideBlock {
        /// The stray token.
        token: String,
    },

    /// `--config` was the last token.
    #[error("--config requires a file path")]
    MissingConfigPath,

    /// Text could not be converted to the field's scalar kind.
    #[error("invalid value \"{value}\" for field \"{field}\" of --{flag}: {message}")]
    InvalidValue {
        /// Owning config type.
        flag: String,
        /// Target field.
        field: String,
        /// Offending value, rendered as text.
        value: String,
        /// Description of the problem.
        message: String,
    },

    /// A structured field value could not be decoded into its declared shape.
    #[error("cannot decode field \"{field}\" of --{flag}: {source}")]
    Decode {
        /// Owning config type.
        flag: String,
        /// Target field.
        field: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// The assembled field values could not be bound to the config type.
    #[error("cannot build --{flag} from its field values: {source}")]
    Bind {
        /// Config type being built.
        flag: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A required config type is absent.
    #[error("required config type --{flag} was not specified")]
    MissingRequiredType {
        /// Missing config type.
        flag: String,
    },

    /// A required field received no value.
    #[error("required field \"{field}\" of --{flag} was not specified")]
    MissingRequiredField {
        /// Owning config type.
        flag: String,
        /// Missing field.
        field: String,
    },

    /// A singleton config type appears more than once.
    #[error("config type --{flag} may only be specified once")]
    DuplicateSingleton {
        /// Repeated config type.
        flag: String,
    },

    /// An exclusive config type appears together with other instances.
    #[error("config type --{flag} cannot be combined with any other config type")]
    ExclusiveConflict {
        /// The exclusive config type.
        flag: String,
    },

    /// A document file could not be read.
    #[error("cannot read config file {path}: {source}")]
    DocumentRead {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A document file is not valid YAML.
    #[error("cannot parse config file {path}: {source}")]
    DocumentParse {
        /// Document path.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A document is valid YAML but not a list of single-key mappings.
    #[error("malformed config file {path}: {message}")]
    DocumentShape {
        /// Document path.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// A config type's check operation rejected an instance.
    #[error("invalid --{flag}: {source}")]
    Check {
        /// Rejected config type.
        flag: String,
        /// Error returned by the check.
        #[source]
        source: HandlerError,
    },

    /// A phase operation failed.
    #[error("phase {phase} of --{flag} failed: {source}")]
    Phase {
        /// Phase being executed.
        phase: String,
        /// Config type whose operation failed.
        flag: String,
        /// Error returned by the operation.
        #[source]
        source: HandlerError,
    },

    /// Help output could not be written.
    #[error("cannot write help output: {source}")]
    Output {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl CfgbindError {
    /// Returns the taxonomy group this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateFlag { .. }
            | Self::InvalidFlagName { .. }
            | Self::DuplicateField { .. }
            | Self::InvalidAnnotation { .. }
            | Self::MultipleBareValues { .. }
            | Self::UnknownSection { .. } => ErrorCategory::Registration,
            Self::UnknownFlag { .. }
            | Self::UnknownField { .. }
            | Self::NoBareValueField { .. }
            | Self::ValueOutsideBlock { .. }
            | Self::MissingConfigPath => ErrorCategory::Grammar,
            Self::InvalidValue { .. } | Self::Decode { .. } | Self::Bind { .. } => {
                ErrorCategory::Coercion
            }
            Self::MissingRequiredType { .. }
            | Self::MissingRequiredField { .. }
            | Self::DuplicateSingleton { .. }
            | Self::ExclusiveConflict { .. } => ErrorCategory::Constraint,
            Self::DocumentRead { .. } | Self::DocumentParse { .. } | Self::DocumentShape { .. } => {
                ErrorCategory::Document
            }
            Self::Check { .. } => ErrorCategory::Semantic,
            Self::Phase { .. } => ErrorCategory::Phase,
            Self::Output { .. } => ErrorCategory::Output,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CfgbindError>;
