//! Shared CLI presentation utilities.
//!
//! Format-only helpers; nothing in here decides what is shown, only how.

pub mod compile_display;

pub use compile_display::{mask_secret, print_event, print_fields, print_separator};
