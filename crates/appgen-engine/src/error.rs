//! Engine error types

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use appgen_core::CoreError;

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Template error")]
    Template(#[from] TemplateError),

    #[error("Key '{key}' is not part of the {context} context")]
    UnknownKey { context: &'static str, key: String },

    #[error("Key '{key}' of the {context} context expects a {expected} value")]
    KindMismatch {
        context: &'static str,
        key: String,
        expected: &'static str,
    },

    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Invalid setup option [{section}] {key}: {message}")]
    SetupOption {
        section: String,
        key: String,
        message: String,
    },

    #[error("Invalid metadata: {message}")]
    Metadata { message: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    /// Token key not declared by the context the template renders with
    UnknownKey,
    /// Block marker that cannot be rendered
    InvalidBlock,
    Other,
}

impl TemplateErrorKind {
    pub fn to_code_string(&self) -> &'static str {
        match self {
            Self::UnknownKey => "unknown_key",
            Self::InvalidBlock => "invalid_block",
            Self::Other => "render",
        }
    }
}

/// Template-specific error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(appgen::template))]
pub struct TemplateError {
    pub message: String,

    pub kind: TemplateErrorKind,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,

    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Error pointing at a whole line (1-based) of a template
    pub fn at_line(
        kind: TemplateErrorKind,
        message: impl Into<String>,
        template_name: &str,
        template_source: &str,
        line: usize,
    ) -> Self {
        Self {
            message: message.into(),
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span: calculate_span(template_source, line),
            suggestion: None,
        }
    }

    /// Error pointing at a byte range of a template
    pub fn at_offset(
        kind: TemplateErrorKind,
        message: impl Into<String>,
        template_name: &str,
        template_source: &str,
        offset: usize,
        len: usize,
    ) -> Self {
        Self {
            message: message.into(),
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span: Some(SourceSpan::new(offset.into(), len)),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

/// Span of a whole line, 1-based
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (index, line) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line_num {
            let len = line.trim_end_matches(['\n', '\r']).len();
            return Some(SourceSpan::new(offset.into(), len));
        }
        offset += line.len();
    }

    None
}

pub type Result<T> = std::result::Result<T, EngineError>;
