//! CLI-specific error types and exit code mapping

use logforward_compiler::CompilerError;
use logforward_core::error::LogForwardError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The forwarder was evaluated but is not Ready.
    #[error("forwarder {0} is not ready")]
    NotReady(String),

    /// The forwarder document could not be parsed.
    #[error("invalid forwarder document {path}: {reason}")]
    Document { path: String, reason: String },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// YAML serialisation failed during output rendering.
    #[error("yaml output error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logforward-core.
    #[error("{0}")]
    Core(#[from] LogForwardError),

    /// Wrapped compiler error.
    #[error("{0}")]
    Compiler(#[from] CompilerError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                         |
    /// |------|---------------------------------|
    /// | 0    | Success                         |
    /// | 1    | General / command error         |
    /// | 2    | Configuration error             |
    /// | 3    | Forwarder not Ready             |
    /// | 10   | IO error                        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(LogForwardError::Config(_)) => 2,
            Self::NotReady(_) => 3,
            Self::Io(_) => 10,
            Self::Command(_)
            | Self::Document { .. }
            | Self::JsonSerialize(_)
            | Self::Yaml(_)
            | Self::Core(_)
            | Self::Compiler(_) => 1,
        }
    }
}
