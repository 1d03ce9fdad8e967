//! # Output and Progress Reporting
//!
//! This module provides the console reporter a migration writes its progress
//! to, and the configuration controlling colors and emojis based on terminal
//! capabilities and user preferences.
//!
//! ## Respecting User Preferences
//!
//! The module respects the following environment variables and flags:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Indentation
//!
//! A `Reporter` is passed explicitly to every step. Nested work (the steps of
//! one clone, the externals of one tree) is reported through
//! [`Reporter::nested`], which returns a reporter one tab deeper that shares
//! the same sink.
//!
//! ```rust,ignore
//! use svn_migrate::output::{OutputConfig, Reporter};
//!
//! let reporter = Reporter::stdout(OutputConfig::from_env_and_flag("auto"));
//! reporter.step("🔍", "finding latest revision of svn://host/repo");
//! reporter.nested().say("making empty directory: src/assets");
//! ```

use std::env;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

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
    /// # Arguments
    /// * `color_flag` - The value of the --color CLI flag: "always", "never", or "auto"
    ///
    /// In auto mode, colors are disabled if:
    /// - `NO_COLOR` environment variable is set (any value, including empty)
    /// - `CLICOLOR=0` is set
    /// - `TERM=dumb` is set
    /// - stdout is not a TTY (unless `CLICOLOR_FORCE=1`)
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    /// Detect whether color output is supported based on environment.
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

    /// Create a configuration with colors always enabled.
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the appropriate string based on color configuration.
///
/// When colors are enabled, returns the emoji. When disabled, returns
/// the plain text alternative.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Indentable progress sink.
///
/// Cloning a reporter is cheap; clones share the sink, so lines written from
/// parallel clones never interleave mid-line.
#[derive(Clone)]
pub struct Reporter {
    sink: Option<Sink>,
    depth: usize,
    config: OutputConfig,
}

impl Reporter {
    /// A reporter writing to an arbitrary sink.
    pub fn new(writer: Box<dyn Write + Send>, config: OutputConfig) -> Self {
        Self {
            sink: Some(Arc::new(Mutex::new(writer))),
            depth: 0,
            config,
        }
    }

    /// A reporter writing to standard output.
    pub fn stdout(config: OutputConfig) -> Self {
        Self::new(Box::new(io::stdout()), config)
    }

    /// A reporter that discards everything.
    pub fn quiet() -> Self {
        Self {
            sink: None,
            depth: 0,
            config: OutputConfig::without_color(),
        }
    }

    /// A reporter capturing its output in memory, and the buffer it fills.
    pub fn capture() -> (Self, CapturedOutput) {
        let buffer = CapturedOutput::default();
        let reporter = Self::new(Box::new(buffer.clone()), OutputConfig::without_color());
        (reporter, buffer)
    }

    /// A reporter one indentation level deeper, sharing this one's sink.
    pub fn nested(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self.clone()
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Writes one line at the current indentation.
    pub fn say(&self, msg: impl fmt::Display) {
        self.write_line(&msg.to_string());
    }

    /// Writes one line announcing a step, prefixed with `icon` when colors
    /// are enabled.
    pub fn step(&self, icon: &str, msg: impl fmt::Display) {
        if self.config.use_color {
            self.write_line(&format!("{} {}", icon, style(msg).bold()));
        } else {
            self.write_line(&msg.to_string());
        }
    }

    /// Writes a closing line for a successful run.
    pub fn success(&self, msg: impl fmt::Display) {
        let mark = emoji(&self.config, "✅", "[OK]");
        if self.config.use_color {
            self.write_line(&format!("{} {}", mark, style(msg).green()));
        } else {
            self.write_line(&format!("{} {}", mark, msg));
        }
    }

    fn write_line(&self, line: &str) {
        let Some(sink) = &self.sink else {
            return;
        };

        // A poisoned sink only means another thread panicked mid-write
        let mut writer = match sink.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        let indent = "\t".repeat(self.depth);
        let _ = writeln!(writer, "{}{}", indent, line);
        let _ = writer.flush();
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("depth", &self.depth)
            .field("quiet", &self.sink.is_none())
            .field("config", &self.config)
            .finish()
    }
}

/// In-memory sink filled by [`Reporter::capture`].
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        let bytes = match self.0.lock() {
            Ok(bytes) => bytes.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::other("captured output poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
