//! Per-call options for a parse-and-run invocation.

/// Behavior switches for a single parse-and-run call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Render help instead of failing when the token stream is empty.
    pub show_help_if_no_args: bool,
}

impl RunOptions {
    /// Options that render help when no tokens are given.
    #[must_use]
    pub const fn show_help_if_no_args() -> Self {
        Self {
            show_help_if_no_args: true,
        }
    }
}
