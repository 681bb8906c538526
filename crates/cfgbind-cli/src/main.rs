//! # shapes: cfgbind example CLI
//!
//! Draws circles and rectangles described on the command line or in a
//! `--config` YAML document.

mod output;
mod shapes;

use cfgbind_engine::{Engine, RunOptions};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let engine = Engine::new(shapes::registry()?).with_program_name("shapes");
    let result = engine.parse_and_run(
        std::env::args().skip(1),
        &shapes::PHASES,
        RunOptions::show_help_if_no_args(),
    )?;
    if let Some(flag) = result.what_ran() {
        tracing::debug!(flag, "exclusive command ran");
    }
    Ok(())
}
