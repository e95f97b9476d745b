//! Shared types, error model, and configuration for composefn.
//!
//! This crate is the foundation depended on by all other composefn crates.
//! It provides:
//! - [`ComposeFnError`] - the unified error type
//! - The request/response message schema ([`proto`])
//! - The typed resource model ([`resource`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod proto;
pub mod resource;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_TTL, DefaultsConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{ComposeFnError, Result};
pub use proto::{
    FunctionResult, Match, MatchLabels, Requirements, ResourceSelector, RunFunctionRequest,
    RunFunctionResponse, Severity, State, Struct,
};
pub use resource::{
    Composite, DesiredComposed, GroupVersionKind, Labels, Name, ObservedComposed, Ready,
    Unstructured,
};
