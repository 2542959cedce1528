//! Appgen Engine - template substitution and tree rendering
//!
//! Templates carry two kinds of markers:
//! - `$key$` / `$key%default$` scalar tokens
//! - `@key|indent@` block markers, replaced by an indented YAML block
//!
//! Every rendered file is backed by a context whose keys are declared in a
//! [`ContextSchema`].

pub mod context;
pub mod document;
pub mod error;
pub mod metadata;
pub mod plugin;
pub mod renderer;
pub mod setup_cfg;
pub mod substitution;
pub mod templates;

pub use context::{Context, ContextSchema, ContextValue, KeyKind, KeySpec, normalize_key};
pub use document::TemplateDocument;
pub use error::{EngineError, Result, TemplateError, TemplateErrorKind};
pub use metadata::{render_metadata, write_metadata};
pub use plugin::render_plugins;
pub use renderer::{RenderAction, RenderStep, render_flux};
pub use setup_cfg::SetupCfg;
pub use substitution::{ScalarOutcome, render_line, substitute_block, substitute_scalars};
pub use templates::{TemplateName, TemplateSet};
