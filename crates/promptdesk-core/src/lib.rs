//! Core domain types and ports for promptdesk.
//!
//! This crate has no I/O of its own. It defines what a compile request and
//! result look like, how statuses render, how supervised services are
//! described, and the traits infrastructure crates implement.
#![deny(unused_crate_dependencies)]

pub mod compile;
pub mod llm;
pub mod paths;
pub mod ports;
pub mod service;
pub mod settings;
pub mod status;

pub use compile::{
    CompileBody, CompileMode, CompilePhase, CompileRequest, CompileResult, PromptField,
};
pub use llm::{LlmConfig, Provider, UnknownProvider};
pub use paths::{DATA_DIR_ENV, PathError, data_root, settings_path};
pub use ports::{CONNECTION_FAILED, CompileError, CompilerClient, SettingsStore, StoreError};
pub use service::{
    DEFAULT_BACKEND_PORT, DEFAULT_BACKEND_TIMEOUT, DEFAULT_FRONTEND_PORT,
    DEFAULT_FRONTEND_TIMEOUT, DEFAULT_POLL_INTERVAL, ServiceSpec, ServiceState,
};
pub use settings::{Settings, SettingsError, SettingsUpdate, validate_settings};
pub use status::CompileStatus;
