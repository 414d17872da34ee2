//! Shared state handed from the provider to its data sources

use crate::api::Client;
use std::sync::Arc;

/// Provider data passed to data sources after configure.
/// Cloning is cheap; the client is shared behind an Arc.
#[derive(Clone)]
pub struct VultrProviderData {
    pub client: Arc<Client>,
}

impl VultrProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}
