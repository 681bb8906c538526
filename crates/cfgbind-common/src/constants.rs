//! Reserved command-line tokens and the field annotation vocabulary.

/// Prefix that marks a token as a flag (`--circle`, `--config`).
pub const FLAG_PREFIX: &str = "--";

/// Separator between a field key and its value in an assignment token.
pub const ASSIGNMENT_SEPARATOR: char = '=';

/// Reserved flag name whose following token is a document path.
pub const CONFIG_FLAG: &str = "config";

/// Reserved flag name that renders help instead of running.
pub const HELP_FLAG: &str = "help";

/// Flag names that cannot be registered as config types.
pub const RESERVED_FLAGS: [&str; 2] = [CONFIG_FLAG, HELP_FLAG];

/// Annotation key holding a field's help text.
pub const ANNOTATION_DESCRIPTION: &str = "description";

/// Annotation key marking the field that receives unlabeled tokens.
pub const ANNOTATION_BARE_VALUE: &str = "barevalue";

/// Annotation key marking a field that must receive a value.
pub const ANNOTATION_REQUIRED: &str = "required";

/// Annotation key holding the literal text applied when a field is absent.
pub const ANNOTATION_DEFAULT: &str = "default";

/// Words accepted as a true boolean annotation value (compared lowercase).
pub const TRUE_WORDS: [&str; 4] = ["yes", "y", "true", "1"];

/// Words accepted as a false boolean annotation value (compared lowercase).
pub const FALSE_WORDS: [&str; 4] = ["no", "n", "false", "0"];

/// Heading used in help output for types that belong to no section, when
/// explicit sections are also present.
pub const UNSECTIONED_HEADING: &str = "Other";
