//! The parse-and-run entry point over a frozen registry.

use std::io::{self, Write};
use std::path::Path;

use cfgbind_common::config::RunOptions;
use cfgbind_common::constants::{CONFIG_FLAG, HELP_FLAG};
use cfgbind_common::error::Result;
use cfgbind_common::types::normalize_key;

use crate::executor::{self, ParseResult};
use crate::help;
use crate::parser::{self, validator};
use crate::registry::Registry;

const FALLBACK_PROGRAM_NAME: &str = "program";

/// Binds command-line tokens to registered config types and runs phases.
#[derive(Debug)]
pub struct Engine {
    registry: Registry,
    program_name: String,
}

impl Engine {
    /// Creates an engine; the usage line names the running executable.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        let program_name = std::env::args()
            .next()
            .and_then(|arg0| {
                Path::new(&arg0)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| FALLBACK_PROGRAM_NAME.to_owned());
        Self {
            registry,
            program_name,
        }
    }

    /// Overrides the program name shown in the usage line.
    #[must_use]
    pub fn with_program_name(mut self, name: impl Into<String>) -> Self {
        self.program_name = name.into();
        self
    }

    /// The frozen registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders the help text.
    #[must_use]
    pub fn render_help(&self) -> String {
        help::render(&self.registry, &self.program_name)
    }

    /// Writes the help text to `out`.
    ///
    /// # Errors
    ///
    /// Returns an output error if writing fails.
    pub fn show_help(&self, out: &mut dyn Write) -> Result<()> {
        out.write_all(self.render_help().as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Parses `args`, constructs instances, and runs `phases` over them.
    /// Help goes to standard output.
    ///
    /// # Errors
    ///
    /// See [`Engine::parse_and_run_with_output`].
    pub fn parse_and_run<I, S, P>(
        &self,
        args: I,
        phases: &[P],
        options: RunOptions,
    ) -> Result<ParseResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        P: AsRef<str>,
    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.parse_and_run_with_output(args, phases, options, &mut out)
    }

    /// Like [`Engine::parse_and_run`], writing help to `out`.
    ///
    /// A `--help` token anywhere in `args`, or empty `args` when
    /// `options.show_help_if_no_args` is set, renders help and returns a
    /// result with [`ParseResult::help_shown`] set; nothing else runs.
    ///
    /// # Errors
    ///
    /// Returns the first grammar, document, constraint, coercion, semantic,
    /// or phase error. Phase operations that completed before a failure are
    /// not undone.
    pub fn parse_and_run_with_output<I, S, P>(
        &self,
        args: I,
        phases: &[P],
        options: RunOptions,
        out: &mut dyn Write,
    ) -> Result<ParseResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        P: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_owned()).collect();

        if wants_help(&args) || (args.is_empty() && options.show_help_if_no_args) {
            tracing::debug!("rendering help");
            self.show_help(out)?;
            return Ok(ParseResult::help());
        }

        let entries = parser::parse_args(&self.registry, &args)?;
        validator::validate(&self.registry, &entries)?;
        let instances = executor::construct(&self.registry, &entries)?;
        executor::run_checks(&self.registry, &instances)?;

        let what_ran = instances
            .iter()
            .find(|instance| self.registry.get(instance.type_index()).exclusive)
            .map(|instance| instance.flag_name().to_owned());

        executor::run_phases(&self.registry, &instances, phases)?;
        tracing::info!(instances = instances.len(), "run complete");
        Ok(ParseResult::new(instances, what_ran))
    }
}

/// Whether a `--help` token appears, skipping the path operand of `--config`.
fn wants_help(args: &[String]) -> bool {
    let mut tokens = args.iter();
    while let Some(token) = tokens.next() {
        match parser::flag_name(token).map(normalize_key) {
            Some(flag) if flag == CONFIG_FLAG => {
                let _ = tokens.next();
            }
            Some(flag) if flag == HELP_FLAG => return true,
            _ => {}
        }
    }
    false
}
