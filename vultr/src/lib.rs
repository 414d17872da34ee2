//! Terraform provider for Vultr
//!
//! The provider authenticates against the Vultr v2 API with a bearer token
//! and exposes read-only data sources over it. Configuration falls back to
//! the `VULTR_API_KEY` and `VULTR_API_ENDPOINT` environment variables so
//! credentials can stay out of Terraform files.

pub mod api;
pub mod data_sources;
pub mod filter;
pub mod provider_data;

use async_trait::async_trait;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, Provider, ProviderMetadataRequest,
    ProviderMetadataResponse, ProviderSchemaRequest, ProviderSchemaResponse,
    ValidateProviderConfigRequest, ValidateProviderConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::TfplugError;

use crate::api::client::DEFAULT_BASE_URL;
use crate::api::Client;
use crate::data_sources::InstancesDataSource;
use crate::provider_data::VultrProviderData;

const API_KEY_ENV: &str = "VULTR_API_KEY";
const API_ENDPOINT_ENV: &str = "VULTR_API_ENDPOINT";

#[derive(Default)]
pub struct VultrProvider;

impl VultrProvider {
    pub fn new() -> Self {
        Self
    }

    /// Resolve an optional string attribute, falling back to an environment
    /// variable. Empty strings count as unset.
    fn resolve(config: &DynamicValue, attribute: &str, env_var: &str) -> Option<String> {
        match config.get_string(&AttributePath::new(attribute)) {
            Ok(value) if !value.is_empty() => Some(value),
            _ => std::env::var(env_var).ok().filter(|v| !v.is_empty()),
        }
    }
}

#[async_trait]
impl Provider for VultrProvider {
    fn type_name(&self) -> &str {
        "vultr"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ProviderSchemaRequest,
    ) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Vultr cloud provider")
            .attribute(
                AttributeBuilder::new("api_key", AttributeType::String)
                    .description("Vultr API key; defaults to the VULTR_API_KEY environment variable")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_endpoint", AttributeType::String)
                    .description(
                        "Vultr API base URL; defaults to the VULTR_API_ENDPOINT environment variable or the public endpoint",
                    )
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        // Credentials may come from the environment, so absence here is not
        // an error; configure does the real check.
        ValidateProviderConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let mut diagnostics = vec![];

        let Some(api_key) = Self::resolve(&request.config, "api_key", API_KEY_ENV) else {
            diagnostics.push(Diagnostic::error(
                "Missing API key",
                format!(
                    "Set the api_key provider attribute or the {} environment variable",
                    API_KEY_ENV
                ),
            ));
            return ConfigureProviderResponse {
                diagnostics,
                provider_data: None,
            };
        };

        let endpoint = Self::resolve(&request.config, "api_endpoint", API_ENDPOINT_ENV)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        tracing::debug!("configuring Vultr client against {}", endpoint);

        match Client::with_base_url(&endpoint, &api_key) {
            Ok(client) => ConfigureProviderResponse {
                diagnostics,
                provider_data: Some(Arc::new(VultrProviderData::new(client))),
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create Vultr client",
                    e.to_string(),
                ));
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    async fn create_data_source(
        &self,
        _ctx: Context,
        type_name: &str,
    ) -> tfplug::Result<Box<dyn DataSourceWithConfigure>> {
        match type_name {
            "vultr_instances" => Ok(Box::new(InstancesDataSource::new())),
            other => Err(TfplugError::DataSourceNotFound(other.to_string())),
        }
    }
}
