//! CLI error types with exit code handling
//!
//! Library errors are folded into a few categories, each with its own exit
//! code. Template errors keep their source snippet.

use appgen_build::BuildError;
use appgen_core::CoreError;
use appgen_engine::{EngineError, TemplateError};
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Invalid manifest, configuration or chart metadata
    #[error("Validation failed: {message}")]
    #[diagnostic(code(appgen::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Template failure with its source location
    #[error(transparent)]
    #[diagnostic(transparent)]
    Template(TemplateError),

    /// Template failure without a source location
    #[error("Template error: {message}")]
    #[diagnostic(code(appgen::cli::template))]
    Render { message: String },

    /// Chart acquisition, lint, package or bundle failure
    #[error("Build failed: {message}")]
    #[diagnostic(code(appgen::cli::build))]
    Build {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, existing output, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(appgen::cli::io))]
    Io {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Invalid combination of arguments
    #[error("{message}")]
    #[diagnostic(code(appgen::cli::usage))]
    Usage { message: String },

    /// Run interrupted by the user
    #[error("Interrupted")]
    #[diagnostic(code(appgen::cli::interrupted))]
    Cancelled,
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Template(_) | CliError::Render { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Build { .. } => exit_codes::BUILD_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Cancelled => exit_codes::INTERRUPTED,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
            help: None,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    fn io_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
            help: None,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::OutputExists { .. } => {
                CliError::io_with_help(err.to_string(), "pass --overwrite to replace it")
            }
            CoreError::OutputMissing { .. } => CliError::io_with_help(
                err.to_string(),
                "generate the application without --package-only first",
            ),
            CoreError::InvalidConfig { .. } => CliError::validation_with_help(
                err.to_string(),
                "check the appgen configuration file",
            ),
            CoreError::InvalidChecksumFile { .. } => CliError::validation(err.to_string()),
            CoreError::Archive { .. } => CliError::build(err.to_string()),
            CoreError::Io(e) => CliError::from(e),
            e if e.is_validation() => CliError::validation(e.to_string()),
            e => CliError::build(e.to_string()),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Template(t) => CliError::Template(t),
            EngineError::Core(e) => CliError::from(e),
            EngineError::Io(e) => CliError::from(e),
            e @ (EngineError::UnknownKey { .. }
            | EngineError::KindMismatch { .. }
            | EngineError::TemplateNotFound { .. }) => CliError::Render {
                message: e.to_string(),
            },
            e => CliError::validation(e.to_string()),
        }
    }
}

impl From<BuildError> for CliError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::Cancelled => CliError::Cancelled,
            BuildError::Core(e) => CliError::from(e),
            BuildError::Io(e) => CliError::from(e),
            e @ BuildError::Spawn { .. } => CliError::Build {
                message: e.to_string(),
                help: Some(
                    "install the tool or set its path in the appgen configuration file"
                        .to_string(),
                ),
            },
            e if e.is_validation() => CliError::validation(e.to_string()),
            e => CliError::build(e.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
