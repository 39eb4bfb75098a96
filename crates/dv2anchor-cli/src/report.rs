//! Terminal diagnostics for failed runs
//!
//! Formats an error chain for stderr, listing every Data Vault violation on
//! its own line. Colors use crossterm.

use crossterm::style::{Color, Stylize};
use crossterm::tty::IsTty;

use crate::cli::ColorChoice;
use dv2anchor::ConvertError;

/// Decide whether diagnostics on stderr get colors
pub fn should_colorize(choice: ColorChoice) -> bool {
    match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::env::var("NO_COLOR").is_err() && std::io::stderr().is_tty(),
    }
}

/// Format `error` for stderr
///
/// Validation failures list their violations; every other error prints its
/// cause chain.
pub fn format_error(error: &anyhow::Error, color: bool) -> String {
    let paint = |text: &str, c: Color| -> String {
        if color {
            format!("{}", text.with(c).bold())
        } else {
            text.to_string()
        }
    };

    let mut out = format!("{} {}", paint("error:", Color::Red), error);

    if let Some(ConvertError::Validation(validation)) = error.downcast_ref::<ConvertError>() {
        out.push_str(&format!(
            "\n{} {} violation(s):",
            paint("note:", Color::Cyan),
            validation.len()
        ));
        for violation in validation.violations() {
            out.push_str(&format!("\n  {} {}", paint("✗", Color::Red), violation));
        }
        return out;
    }

    for cause in error.chain().skip(1) {
        out.push_str(&format!("\n  {} {}", paint("caused by:", Color::Yellow), cause));
    }
    out
}
