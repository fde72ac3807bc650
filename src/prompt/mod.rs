//! Prompt construction subsystem.
//!
//! This module provides:
//!
//! - **Template**: `{variable}` substitution engine for prompts and files
//! - **Context**: project context extraction and external context sources
//! - **Manager**: named template registry and rendering front door
//! - **Library**: the built-in prompt texts
//!
//! # Template Syntax
//!
//! ```text
//! Write a CI workflow for {project_name} ({language}).
//! Run: {build_command}
//! ```
//!
//! Use `{{` and `}}` to render literal braces.

mod context;
pub mod library;
mod manager;
mod template;

pub use context::{ContextSource, ProjectContext, StaticContext};
pub use library::BUILTIN_PROMPTS;
pub use manager::PromptManager;
pub use template::{TemplateError, placeholders, render_template, vars};
