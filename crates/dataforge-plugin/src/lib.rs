//! Plugin system for Dataforge.
//!
//! A plugin is a named unit of work that maps one JSON input to one JSON
//! output. This crate provides:
//! - the [`Plugin`] contract every plugin implements
//! - [`PluginMetadata`], the fixed composition of a plugin's name,
//!   description and schemas
//! - [`PluginRegistry`], the name-to-plugin table consulted by pipelines
//! - built-in plugins: [`FnPlugin`] (closure-backed) and
//!   [`PromptTemplatePlugin`] (named text templates)

pub mod error;
pub mod function;
pub mod metadata;
pub mod plugin;
pub mod registry;
pub mod template;
pub mod validation;

pub use error::{PluginError, RegistryError, Result};
pub use function::FnPlugin;
pub use metadata::PluginMetadata;
pub use plugin::Plugin;
pub use registry::PluginRegistry;
pub use template::{PromptTemplatePlugin, render_template};
pub use validation::{ContractViolation, validate_name, validate_registration};
