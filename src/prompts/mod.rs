//! Prompt templates
//!
//! Templates are markdown files with `{{field}}` placeholders, checked
//! against a per-template field declaration before rendering. Loaded text is
//! held in an explicitly constructed `PromptCache`.

pub mod cache;
pub mod scripts;
pub mod template;

use std::path::PathBuf;

use thiserror::Error;

pub use cache::{FsTemplateSource, PromptCache, StaticTemplateSource, TemplateSource};
pub use template::{
    render_template, CallFlowVars, CustomerNeedsVars, FieldKind, FieldSpec, FieldValue,
    QuickSummaryVars, RecommendedRepliesVars, SentimentVars, TemplateId, TemplateVars,
};

/// Template loading and rendering errors
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Prompt template {template} not found at {}", .path.display())]
    NotFound { template: TemplateId, path: PathBuf },

    #[error("Failed to read prompt template {template}: {source}")]
    Io {
        template: TemplateId,
        #[source]
        source: std::io::Error,
    },

    #[error("Template {template} requires a value for '{field}'")]
    MissingVariable {
        template: TemplateId,
        field: &'static str,
    },

    #[error("Template {template} does not declare '{field}'")]
    UndeclaredVariable { template: TemplateId, field: String },

    #[error("Template {template} expects '{field}' to be {expected}")]
    TypeMismatch {
        template: TemplateId,
        field: &'static str,
        expected: FieldKind,
    },

    #[error("Failed to read industry script {file}: {source}")]
    ScriptIo {
        file: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Template {template} contains undeclared placeholder '{{{{{placeholder}}}}}'")]
    UnknownPlaceholder {
        template: TemplateId,
        placeholder: String,
    },
}
