//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<(), CliError>`
//! - Thin wrappers that validate CLI input, call into the library crates and
//!   format output for the terminal
//!
//! Supervision, compile orchestration and persistence live in the library
//! crates, never here.

pub mod cleanup;
pub mod compile;
pub mod config;
pub mod live;
pub mod run;
