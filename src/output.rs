//! Output formatting utilities for the uabench CLI.
//!
//! Colored message helpers plus the tier coloring used for score
//! percentages.
//!
//! # Examples
//!
//! ```rust,no_run
//! use uabench::output::{success, error, warning, info};
//!
//! success("Analysis complete");
//! error("Failed to read corpus");
//! warning("Suite skipped");
//! info("Loading results");
//! ```

use colored::{ColoredString, Colorize};

use crate::score::{format_rate, Tier};

/// Print a success message in green with a checkmark
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message in red with an X mark
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message in yellow with a warning sign
pub fn warning(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an info message in blue with an info icon
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Format a parser name with emphasis
///
/// # Examples
///
/// ```rust
/// use uabench::output::parser_name;
///
/// let formatted = parser_name("woothee");
/// println!("Scoring {}", formatted);
/// ```
pub fn parser_name(name: &str) -> String {
    name.cyan().to_string()
}

/// Format a test suite name with emphasis
pub fn suite_name(name: &str) -> String {
    name.magenta().to_string()
}

/// Format a count with emphasis
pub fn count(n: usize) -> String {
    n.to_string().bold().to_string()
}

/// Apply the color of a tier to `text`.
pub fn paint(text: &str, tier: Tier) -> ColoredString {
    match tier {
        Tier::Tier5 => text.green().bold(),
        Tier::Tier4 => text.green(),
        Tier::Tier3 => text.cyan(),
        Tier::Tier2 => text.yellow(),
        Tier::Mid => text.bright_red(),
        Tier::Low => text.red().bold(),
    }
}

/// Render a rate as a percentage colored by its tier; `-` stays plain.
///
/// # Examples
///
/// ```rust
/// use uabench::output::rate;
///
/// assert!(rate(Some(97.5)).contains("97.50%"));
/// assert_eq!(rate(None), "-");
/// ```
pub fn rate(value: Option<f64>) -> String {
    let text = format_rate(value);
    match value {
        Some(percent) => paint(&text, Tier::classify(percent)).to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_name_format() {
        let name = parser_name("uap-core");
        assert!(name.contains("uap-core"));
    }

    #[test]
    fn test_count_format() {
        assert!(count(42).contains("42"));
    }

    #[test]
    fn test_rate_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(rate(Some(50.0)), "50.00%");
        assert_eq!(rate(None), "-");
        assert_eq!(paint("x", Tier::Low).to_string(), "x");
    }
}
