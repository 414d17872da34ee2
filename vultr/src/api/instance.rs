//! Instance API: listing, backup schedules, and VPC attachments

use serde::{Deserialize, Serialize};

use super::client::Client;
use super::common::ApiQueryParams;
use super::error::ApiError;
use super::response::{collect_pages, ListMeta};

/// A Vultr compute instance as returned by `GET /instances`.
///
/// Field names follow the wire format exactly; the flattener and the filter
/// engine match user-supplied filter names against them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub ram: i64,
    #[serde(default)]
    pub disk: i64,
    #[serde(default)]
    pub main_ip: String,
    #[serde(default)]
    pub vcpu_count: i64,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub date_created: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub allowed_bandwidth: i64,
    #[serde(default)]
    pub netmask_v4: String,
    #[serde(default)]
    pub gateway_v4: String,
    #[serde(default)]
    pub power_status: String,
    #[serde(default)]
    pub server_status: String,
    #[serde(default)]
    pub v6_network: String,
    #[serde(default)]
    pub v6_main_ip: String,
    #[serde(default)]
    pub v6_network_size: i64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub internal_ip: String,
    #[serde(default)]
    pub kvm: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub os_id: i64,
    #[serde(default)]
    pub app_id: i64,
    #[serde(default)]
    pub image_id: String,
    #[serde(default)]
    pub firewall_group_id: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Backup schedule from `GET /instances/{id}/backup-schedule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSchedule {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(rename = "type", default)]
    pub schedule_type: String,
    #[serde(default)]
    pub next_scheduled_time_utc: String,
    #[serde(default)]
    pub hour: i64,
    #[serde(default)]
    pub dow: i64,
    #[serde(default)]
    pub dom: i64,
}

/// VPC attachment from `GET /instances/{id}/vpcs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcAttachment {
    pub id: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub mac_address: u64,
}

/// Options for the instance list endpoint.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub per_page: Option<u32>,
    pub cursor: Option<String>,
}

impl ListOptions {
    fn to_query_params(&self) -> ApiQueryParams {
        ApiQueryParams::new()
            .add_optional("per_page", self.per_page)
            .add_optional("cursor", self.cursor.clone())
    }
}

#[derive(Debug, Deserialize)]
struct InstancesEnvelope {
    #[serde(default)]
    instances: Vec<Instance>,
    #[serde(default)]
    meta: ListMeta,
}

#[derive(Debug, Deserialize)]
struct BackupScheduleEnvelope {
    backup_schedule: BackupSchedule,
}

#[derive(Debug, Deserialize)]
struct VpcsEnvelope {
    #[serde(default)]
    vpcs: Vec<VpcAttachment>,
    #[serde(default)]
    meta: ListMeta,
}

/// Instance API operations
pub struct InstanceApi<'a> {
    client: &'a Client,
}

impl<'a> InstanceApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /instances
    pub async fn list(&self, options: &ListOptions) -> Result<(Vec<Instance>, ListMeta), ApiError> {
        let envelope: InstancesEnvelope = self
            .client
            .get_with_params("/instances", &options.to_query_params())
            .await?;
        Ok((envelope.instances, envelope.meta))
    }

    /// All instances across every page.
    pub async fn list_all(&self) -> Result<Vec<Instance>, ApiError> {
        collect_pages(|cursor| {
            let options = ListOptions {
                cursor,
                ..ListOptions::default()
            };
            async move { self.list(&options).await }
        })
        .await
    }

    /// GET /instances/{id}/backup-schedule
    pub async fn backup_schedule(&self, instance_id: &str) -> Result<BackupSchedule, ApiError> {
        let path = format!("/instances/{}/backup-schedule", instance_id);
        let envelope: BackupScheduleEnvelope = self.client.get(&path).await?;
        Ok(envelope.backup_schedule)
    }

    /// GET /instances/{id}/vpcs
    pub async fn list_vpcs(&self, instance_id: &str) -> Result<Vec<VpcAttachment>, ApiError> {
        let path = format!("/instances/{}/vpcs", instance_id);
        collect_pages(|cursor| {
            let params = ApiQueryParams::new().add_optional("cursor", cursor);
            let path = path.clone();
            async move {
                let envelope: VpcsEnvelope = self.client.get_with_params(&path, &params).await?;
                Ok((envelope.vpcs, envelope.meta))
            }
        })
        .await
    }
}
