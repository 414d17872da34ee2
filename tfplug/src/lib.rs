//! tfplug - Terraform Plugin Framework for Rust
//!
//! The in-process framework layer for building Terraform providers:
//! dynamic values, schema declaration, diagnostics, and the provider /
//! data source traits. Wire-protocol serving lives outside this crate.

pub mod context;
pub mod data_source;
pub mod error;
pub mod provider;
pub mod schema;
pub mod types;

pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use provider::Provider;
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use types::{Diagnostic, Dynamic, DynamicValue};
