//! vultr_instances data source
//!
//! Lists compute instances, applies the configured filter blocks against a
//! flattened view of each instance, enriches every match with its backup
//! schedule and VPC attachments, and projects the result into state.

use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;

use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{
    Attribute, AttributeBuilder, AttributeType, NestedType, ObjectNestingMode, SchemaBuilder,
};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use crate::api::{ApiError, BackupSchedule, Client, Instance};
use crate::filter::{flatten, matches, FilterSpec};
use crate::provider_data::VultrProviderData;

/// Error taxonomy for the read path. Each variant surfaces as its own
/// diagnostic summary; a read either fully succeeds or fully fails.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Upstream(#[from] ApiError),

    #[error("unable to flatten instance for filtering: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no results were found")]
    NoResults,
}

impl ReadError {
    fn into_diagnostic(self) -> Diagnostic {
        let summary = match &self {
            ReadError::Config(_) => "Invalid filter configuration",
            ReadError::Upstream(_) => "Vultr API request failed",
            ReadError::Serialization(_) => "Failed to flatten instance",
            ReadError::NoResults => "No instances found",
        };
        Diagnostic::error(summary, self.to_string())
    }
}

#[derive(Default)]
pub struct InstancesDataSource {
    provider_data: Option<VultrProviderData>,
}

impl InstancesDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_instances(
        &self,
        client: &Client,
        config: &DynamicValue,
    ) -> Result<DynamicValue, ReadError> {
        let filter_entries = config
            .get_list(&AttributePath::new("filter"))
            .map_err(|_| ReadError::Config("at least one filter block is required".to_string()))?;
        let specs = parse_filters(&filter_entries)?;

        let api = client.instances();
        let instances = api.list_all().await?;
        tracing::debug!("fetched {} instances from Vultr", instances.len());

        let mut matched = Vec::new();
        for instance in instances {
            let record = flatten(&instance)?;
            if matches(&specs, &record) {
                matched.push(instance);
            }
        }

        if matched.is_empty() {
            return Err(ReadError::NoResults);
        }
        tracing::debug!("{} instances matched the configured filters", matched.len());

        let mut projected = Vec::with_capacity(matched.len());
        for instance in &matched {
            let schedule = api.backup_schedule(&instance.id).await?;
            let vpc_ids: Vec<String> = api
                .list_vpcs(&instance.id)
                .await?
                .into_iter()
                .map(|vpc| vpc.id)
                .collect();
            projected.push(project_instance(instance, &schedule, &vpc_ids));
        }

        let mut root = HashMap::new();
        root.insert(
            "id".to_string(),
            Dynamic::String("instances".to_string()),
        );
        root.insert("filter".to_string(), Dynamic::List(filter_entries));
        root.insert("instances".to_string(), Dynamic::List(projected));
        Ok(DynamicValue::new(Dynamic::Map(root)))
    }
}

/// Parse the configured filter blocks into specs.
/// An absent or empty filter list is a configuration error: this data
/// source never lists unfiltered.
fn parse_filters(entries: &[Dynamic]) -> Result<Vec<FilterSpec>, ReadError> {
    if entries.is_empty() {
        return Err(ReadError::Config(
            "at least one filter block is required".to_string(),
        ));
    }

    let mut specs = Vec::with_capacity(entries.len());
    for entry in entries {
        let Dynamic::Map(fields) = entry else {
            return Err(ReadError::Config(
                "filter entries must be objects with name and values".to_string(),
            ));
        };

        let name = match fields.get("name") {
            Some(Dynamic::String(name)) if !name.is_empty() => name.clone(),
            _ => {
                return Err(ReadError::Config(
                    "filter name must be a non-empty string".to_string(),
                ))
            }
        };

        let values = match fields.get("values") {
            Some(Dynamic::List(items)) => items
                .iter()
                .map(|item| match item {
                    Dynamic::String(s) => Ok(s.clone()),
                    Dynamic::Number(n) => Ok(render_config_number(*n)),
                    Dynamic::Bool(b) => Ok(b.to_string()),
                    _ => Err(ReadError::Config(format!(
                        "filter '{}' contains a non-scalar value",
                        name
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => {
                return Err(ReadError::Config(format!(
                    "filter '{}' is missing a values list",
                    name
                )))
            }
        };

        specs.push(FilterSpec { name, values });
    }

    Ok(specs)
}

/// Terraform numbers are f64; render whole numbers without a fraction so
/// a configured 80 compares equal to the wire value 80.
fn render_config_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Shape one matched instance into the declared output object.
/// Schedule hour/dom/dow become strings, matching the published schema.
fn project_instance(instance: &Instance, schedule: &BackupSchedule, vpc_ids: &[String]) -> Dynamic {
    let string_list = |items: &[String]| {
        Dynamic::List(items.iter().map(|s| Dynamic::String(s.clone())).collect())
    };

    let mut backups_schedule = HashMap::new();
    backups_schedule.insert(
        "type".to_string(),
        Dynamic::String(schedule.schedule_type.clone()),
    );
    backups_schedule.insert(
        "hour".to_string(),
        Dynamic::String(schedule.hour.to_string()),
    );
    backups_schedule.insert("dom".to_string(), Dynamic::String(schedule.dom.to_string()));
    backups_schedule.insert("dow".to_string(), Dynamic::String(schedule.dow.to_string()));

    let backups = if schedule.enabled.unwrap_or(false) {
        "enabled"
    } else {
        "disabled"
    };

    let mut fields = HashMap::new();
    fields.insert("os".to_string(), Dynamic::String(instance.os.clone()));
    fields.insert("ram".to_string(), Dynamic::Number(instance.ram as f64));
    fields.insert("disk".to_string(), Dynamic::Number(instance.disk as f64));
    fields.insert(
        "main_ip".to_string(),
        Dynamic::String(instance.main_ip.clone()),
    );
    fields.insert(
        "vcpu_count".to_string(),
        Dynamic::Number(instance.vcpu_count as f64),
    );
    fields.insert(
        "region".to_string(),
        Dynamic::String(instance.region.clone()),
    );
    fields.insert(
        "date_created".to_string(),
        Dynamic::String(instance.date_created.clone()),
    );
    fields.insert(
        "allowed_bandwidth".to_string(),
        Dynamic::Number(instance.allowed_bandwidth as f64),
    );
    fields.insert(
        "netmask_v4".to_string(),
        Dynamic::String(instance.netmask_v4.clone()),
    );
    fields.insert(
        "gateway_v4".to_string(),
        Dynamic::String(instance.gateway_v4.clone()),
    );
    fields.insert(
        "status".to_string(),
        Dynamic::String(instance.status.clone()),
    );
    fields.insert(
        "power_status".to_string(),
        Dynamic::String(instance.power_status.clone()),
    );
    fields.insert(
        "server_status".to_string(),
        Dynamic::String(instance.server_status.clone()),
    );
    fields.insert("plan".to_string(), Dynamic::String(instance.plan.clone()));
    fields.insert("label".to_string(), Dynamic::String(instance.label.clone()));
    fields.insert(
        "internal_ip".to_string(),
        Dynamic::String(instance.internal_ip.clone()),
    );
    fields.insert("kvm".to_string(), Dynamic::String(instance.kvm.clone()));
    fields.insert("tag".to_string(), Dynamic::String(instance.tag.clone()));
    fields.insert("tags".to_string(), string_list(&instance.tags));
    fields.insert("os_id".to_string(), Dynamic::Number(instance.os_id as f64));
    fields.insert(
        "app_id".to_string(),
        Dynamic::Number(instance.app_id as f64),
    );
    fields.insert(
        "image_id".to_string(),
        Dynamic::String(instance.image_id.clone()),
    );
    fields.insert(
        "firewall_group_id".to_string(),
        Dynamic::String(instance.firewall_group_id.clone()),
    );
    fields.insert(
        "v6_network".to_string(),
        Dynamic::String(instance.v6_network.clone()),
    );
    fields.insert(
        "v6_main_ip".to_string(),
        Dynamic::String(instance.v6_main_ip.clone()),
    );
    fields.insert(
        "v6_network_size".to_string(),
        Dynamic::Number(instance.v6_network_size as f64),
    );
    fields.insert("features".to_string(), string_list(&instance.features));
    fields.insert(
        "hostname".to_string(),
        Dynamic::String(instance.hostname.clone()),
    );
    fields.insert(
        "backups".to_string(),
        Dynamic::String(backups.to_string()),
    );
    fields.insert(
        "backups_schedule".to_string(),
        Dynamic::Map(backups_schedule),
    );
    fields.insert("private_network_ids".to_string(), string_list(vpc_ids));
    fields.insert("vpc_ids".to_string(), string_list(vpc_ids));

    Dynamic::Map(fields)
}

fn object_type(attributes: &[Attribute]) -> AttributeType {
    AttributeType::Object(
        attributes
            .iter()
            .map(|attr| (attr.name.clone(), attr.r#type.clone()))
            .collect(),
    )
}

fn filter_attributes() -> Vec<Attribute> {
    vec![
        AttributeBuilder::new("name", AttributeType::String)
            .description("Field name to filter on")
            .required()
            .build(),
        AttributeBuilder::new("values", AttributeType::List(Box::new(AttributeType::String)))
            .description("Values the field may take; any match accepts the record")
            .required()
            .build(),
    ]
}

fn instance_attributes() -> Vec<Attribute> {
    let string_list = || AttributeType::List(Box::new(AttributeType::String));

    let computed_string = |name: &str| {
        AttributeBuilder::new(name, AttributeType::String)
            .computed()
            .build()
    };
    let computed_number = |name: &str| {
        AttributeBuilder::new(name, AttributeType::Number)
            .computed()
            .build()
    };

    vec![
        computed_string("os"),
        computed_number("ram"),
        computed_number("disk"),
        computed_string("main_ip"),
        computed_number("vcpu_count"),
        computed_string("region"),
        computed_string("date_created"),
        computed_number("allowed_bandwidth"),
        computed_string("netmask_v4"),
        computed_string("gateway_v4"),
        computed_string("status"),
        computed_string("power_status"),
        computed_string("server_status"),
        computed_string("plan"),
        computed_string("label"),
        computed_string("internal_ip"),
        computed_string("kvm"),
        computed_string("tag"),
        AttributeBuilder::new("tags", AttributeType::Set(Box::new(AttributeType::String)))
            .computed()
            .build(),
        computed_number("os_id"),
        computed_number("app_id"),
        computed_string("image_id"),
        computed_string("firewall_group_id"),
        computed_string("v6_network"),
        computed_string("v6_main_ip"),
        computed_number("v6_network_size"),
        AttributeBuilder::new("features", string_list())
            .computed()
            .build(),
        computed_string("hostname"),
        computed_string("backups"),
        AttributeBuilder::new(
            "backups_schedule",
            AttributeType::Map(Box::new(AttributeType::String)),
        )
        .computed()
        .build(),
        AttributeBuilder::new("private_network_ids", string_list())
            .computed()
            .build(),
        AttributeBuilder::new("vpc_ids", string_list())
            .computed()
            .build(),
    ]
}

#[async_trait]
impl DataSource for InstancesDataSource {
    fn type_name(&self) -> &str {
        "vultr_instances"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let filter_attrs = filter_attributes();
        let instance_attrs = instance_attributes();

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Lists Vultr compute instances matching the configured filters")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The data source ID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "filter",
                    AttributeType::List(Box::new(object_type(&filter_attrs))),
                )
                .description("Filter blocks; all must match, any value within one may")
                .optional()
                .nested_type(NestedType {
                    attributes: filter_attrs,
                    nesting: ObjectNestingMode::List,
                })
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "instances",
                    AttributeType::List(Box::new(object_type(&instance_attrs))),
                )
                .description("Matching instances with backup and VPC detail")
                .computed()
                .nested_type(NestedType {
                    attributes: instance_attrs,
                    nesting: ObjectNestingMode::List,
                })
                .build(),
            )
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let mut diagnostics = vec![];

        if let Ok(entries) = request.config.get_list(&AttributePath::new("filter")) {
            if let Err(e) = parse_filters(&entries) {
                diagnostics.push(e.into_diagnostic());
            }
        }

        ValidateDataSourceConfigResponse { diagnostics }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = vec![];

        let Some(provider_data) = &self.provider_data else {
            diagnostics.push(Diagnostic::error(
                "Provider not configured",
                "Provider data was not supplied to the vultr_instances data source",
            ));
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics,
            };
        };

        match self
            .read_instances(&provider_data.client, &request.config)
            .await
        {
            Ok(state) => ReadDataSourceResponse { state, diagnostics },
            Err(e) => {
                diagnostics.push(e.into_diagnostic());
                ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                }
            }
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for InstancesDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        match request.provider_data {
            Some(data) => match data.downcast_ref::<VultrProviderData>() {
                Some(provider_data) => {
                    self.provider_data = Some(provider_data.clone());
                }
                None => {
                    diagnostics.push(Diagnostic::error(
                        "Invalid provider data",
                        "Failed to extract VultrProviderData from provider data",
                    ));
                }
            },
            None => {
                diagnostics.push(Diagnostic::error(
                    "No provider data",
                    "No provider data was supplied to the data source",
                ));
            }
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}
