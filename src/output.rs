//! # Output Configuration
//!
//! Controls how the CLI renders per-dependency results: colored markers on a
//! capable terminal, bracketed plain-text tags everywhere else.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vendor_patch::output::{emoji, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} client: 2 applied", emoji(&out, "✅", "[OK]"));
//! ```

use std::env;

use console::style;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always" forces colors on
    /// (overriding `NO_COLOR`), "never" forces them off, anything else
    /// detects support from the environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables colors, even when empty
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

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// Marker for a successful dependency.
    pub fn ok(&self) -> String {
        self.paint(emoji(self, "✅", "[OK]"), Tone::Good)
    }

    /// Marker for a failed dependency.
    pub fn failed(&self) -> String {
        self.paint(emoji(self, "❌", "[FAILED]"), Tone::Bad)
    }

    /// Marker for a non-fatal condition.
    pub fn warning(&self) -> String {
        self.paint(emoji(self, "⚠️", "[WARN]"), Tone::Warn)
    }

    /// Dependency names stand out in summaries.
    pub fn name(&self, name: &str) -> String {
        if self.use_color {
            style(name).force_styling(true).bold().to_string()
        } else {
            name.to_string()
        }
    }

    fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.use_color {
            return text.to_string();
        }
        let styled = style(text).force_styling(true);
        match tone {
            Tone::Good => styled.green(),
            Tone::Bad => styled.red(),
            Tone::Warn => styled.yellow(),
        }
        .to_string()
    }
}

enum Tone {
    Good,
    Bad,
    Warn,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The emoji when colors are enabled, the plain alternative otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}
