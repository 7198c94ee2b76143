//! Output formatting abstraction for text vs JSON rendering
//!
//! All subcommand output flows through [`OutputWriter`] which handles format switching.

use std::io::Write;

use colored::Colorize;
use logforward_core::api::{Condition, ConditionStatus};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Abstraction for writing CLI output in different formats.
///
/// Subcommand handlers call `writer.render(&payload)` where `payload`
/// implements both `Serialize` (for JSON) and `Render` (for text).
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        match self.format {
            OutputFormat::Text => {
                payload.render_text(&mut handle)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut handle, payload)?;
                writeln!(handle)?;
            }
        }
        Ok(())
    }
}

/// Trait for human-readable text rendering.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// Write one condition as `STATUS  type  reason: message`.
pub fn write_condition(w: &mut dyn Write, condition: &Condition) -> std::io::Result<()> {
    let status = match condition.status {
        ConditionStatus::True => "True".green(),
        ConditionStatus::False => "False".red(),
        ConditionStatus::Unknown => "Unknown".yellow(),
    };
    write!(w, "  {:<8} {:<40} {}", status, condition.condition_type, condition.reason)?;
    if condition.message.is_empty() {
        writeln!(w)
    } else {
        writeln!(w, ": {}", condition.message)
    }
}
