//! Compile orchestration for promptdesk.
//!
//! - [`HttpCompilerClient`] talks to the compiler service
//! - [`TokenIssuer`] decides which attempt is authoritative
//! - [`CompileRequestPipeline`] runs the draft and refined phases
//! - [`LiveEditController`] debounces edits into live-mode attempts
//! - [`DisplayState`] applies pipeline events without regressing to stale data

mod client;
mod display;
pub mod live;
pub mod pipeline;
mod token;

pub use client::{DEFAULT_BACKEND_URL, HttpCompilerClient};
pub use display::DisplayState;
pub use live::{DEFAULT_DEBOUNCE, LiveEditController, debounced, edits_from_channel};
pub use pipeline::{
    CompileEvent, CompileEventKind, CompileRequestPipeline, DEFAULT_REFINED_TIMEOUT,
    PipelineOutcome,
};
pub use token::{InFlightToken, TokenIssuer};
