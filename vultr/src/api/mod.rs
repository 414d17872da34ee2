//! Vultr API v2 client and per-resource API surfaces

pub mod client;
pub mod common;
pub mod error;
pub mod instance;
pub mod response;

pub use client::Client;
pub use common::ApiQueryParams;
pub use error::ApiError;
pub use instance::{BackupSchedule, Instance, InstanceApi, ListOptions, VpcAttachment};
pub use response::{collect_pages, Links, ListMeta};
