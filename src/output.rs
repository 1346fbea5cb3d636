//! # Output Configuration
//!
//! Controls CLI output appearance: colors, emoji markers and progress bars.
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! Progress bars are drawn on stderr, only when it is a terminal.

use std::env;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::batch::OutcomeKind;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `always` forces colors on (overriding `NO_COLOR`), `never` forces them
    /// off, anything else detects support from the environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// A bar of `len` steps, hidden when stderr is not a terminal.
    pub fn progress(&self, len: usize, message: &str) -> ProgressBar {
        if !console::Term::stderr().is_term() {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        let template = if self.use_color {
            "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}"
        } else {
            "{msg} [{bar:30}] {pos}/{len}"
        };
        if let Ok(progress_style) = ProgressStyle::with_template(template) {
            bar.set_style(progress_style.progress_chars("=> "));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }

    /// Marker printed in front of a per-repository result line.
    pub fn marker(&self, kind: OutcomeKind) -> String {
        let (symbol, plain) = match kind {
            OutcomeKind::Succeeded => ("✅", "[OK]"),
            OutcomeKind::Skipped => ("⏭️", "[SKIP]"),
            OutcomeKind::Failed => ("❌", "[FAIL]"),
        };
        let text = emoji(self, symbol, plain);
        if !self.use_color {
            return text.to_string();
        }
        match kind {
            OutcomeKind::Succeeded => style(text).green().to_string(),
            OutcomeKind::Skipped => style(text).yellow().to_string(),
            OutcomeKind::Failed => style(text).red().bold().to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns `emoji_str` when colors are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}
