//! # Output Configuration
//!
//! Terminal capabilities and the narration sink used while a run progresses.
//!
//! [`OutputConfig`] is resolved once per run from the `--color` flag and the
//! environment, then handed to the [`Console`]; nothing else in the crate
//! inspects the terminal or the environment for styling decisions.
//!
//! ## Respecting User Preferences
//!
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;

use crate::exec::TargetCommand;

/// Output configuration for controlling styled output.
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// Whether bold/colored text should be emitted.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never" or "auto".
    /// In auto mode, styling is disabled if `NO_COLOR` is set, `CLICOLOR=0`,
    /// `TERM=dumb`, or stdout is not a TTY (unless `CLICOLOR_FORCE=1`).
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of NO_COLOR (even if empty) disables colors
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

    pub fn plain() -> Self {
        Self { use_color: false }
    }

    /// Render `text` in bold when styling is enabled.
    pub fn bold<D: Display>(&self, text: D) -> String {
        console::style(text)
            .bold()
            .force_styling(self.use_color)
            .to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Where human-readable progress goes during a run.
///
/// Narrative lines go to `out`; command diagnostics and the error summary go
/// to `err`. Write failures (a closed pipe, typically) are ignored: losing
/// narration must not change the outcome of the run.
pub struct Console {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    config: OutputConfig,
    started: bool,
}

impl Console {
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>, config: OutputConfig) -> Self {
        Self {
            out,
            err,
            config,
            started: false,
        }
    }

    /// A console on the process's stdout and stderr.
    pub fn stdio(config: OutputConfig) -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()), config)
    }

    /// A console that discards everything.
    pub fn sink() -> Self {
        Self::new(Box::new(io::sink()), Box::new(io::sink()), OutputConfig::plain())
    }

    pub fn config(&self) -> OutputConfig {
        self.config
    }

    /// Whether any section has been printed yet.
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Start a new stdout section, separated from earlier ones by a blank line.
    pub fn begin_section(&mut self) {
        if self.started {
            let _ = writeln!(self.out);
        }
        self.started = true;
    }

    /// Per-target banner.
    pub fn header(&mut self, target: &Path) {
        self.begin_section();
        let banner = self
            .config
            .bold(format!("------  {}  ------", target.display()));
        let _ = writeln!(self.out, "{}", banner);
    }

    pub fn command(&mut self, command: &TargetCommand) {
        let prompt = self.config.bold("$ ");
        let _ = writeln!(self.out, "{}{}", prompt, command);
    }

    pub fn dry_command(&mut self, command: &TargetCommand) {
        let prompt = self.config.bold("DRY $ ");
        let _ = writeln!(self.out, "{}{}", prompt, command);
    }

    pub fn line<D: Display>(&mut self, text: D) {
        let _ = writeln!(self.out, "{}", text);
    }

    pub fn heading<D: Display>(&mut self, text: D) {
        let heading = self.config.bold(text);
        let _ = writeln!(self.out, "{}", heading);
    }

    /// Write text to stdout verbatim.
    pub fn raw(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
    }

    pub fn diagnostic<D: Display>(&mut self, text: D) {
        let _ = self.out.flush();
        let _ = writeln!(self.err, "{}", text);
    }

    pub fn error_heading<D: Display>(&mut self, text: D) {
        let _ = self.out.flush();
        let heading = self.config.bold(text);
        let _ = writeln!(self.err, "{}", heading);
    }

    pub fn flush(&mut self) {
        let _ = self.out.flush();
        let _ = self.err.flush();
    }
}
