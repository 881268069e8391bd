//! Terminal rendering of compile statuses and results.

use promptdesk_compile::{CompileEvent, CompileEventKind, DisplayState};
use promptdesk_core::PromptField;

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Render an event that [`DisplayState::apply`] accepted.
pub fn print_event(display: &DisplayState, event: &CompileEvent) {
    match &event.kind {
        CompileEventKind::Status(status) => println!("» {status}"),
        CompileEventKind::Result(result) => {
            println!("» {} result ready", result.phase);
            print_fields(display);
        }
    }
}

/// Print every prompt field, preferring refined values.
pub fn print_fields(display: &DisplayState) {
    for field in PromptField::ALL {
        let Some(value) = display.field(field) else {
            continue;
        };
        print_separator(60);
        println!("{}", field.label());
        print_separator(60);
        if value.is_empty() {
            println!("(empty)");
        } else {
            println!("{value}");
        }
    }
}

/// Mask all but the last four characters of a secret.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return "(not set)".to_string();
    }
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret(""), "(not set)");
        assert_eq!(mask_secret("abc"), "****");
        assert_eq!(mask_secret("sk-1234567890"), "****7890");
    }
}
