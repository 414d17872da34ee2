//! End-to-end flow: configure the provider, create the vultr_instances data
//! source through the factory, and read state against a mock Vultr API.

use mockito::{Matcher, Server, ServerGuard};
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, DataSourceWithConfigure, ReadDataSourceRequest,
};
use tfplug::provider::{ConfigureProviderRequest, Provider};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};
use std::collections::HashMap;
use vultr::VultrProvider;

fn filter_config(name: &str, values: &[&str]) -> DynamicValue {
    let mut filter = HashMap::new();
    filter.insert("name".to_string(), Dynamic::String(name.to_string()));
    filter.insert(
        "values".to_string(),
        Dynamic::List(
            values
                .iter()
                .map(|v| Dynamic::String(v.to_string()))
                .collect(),
        ),
    );

    let mut root = HashMap::new();
    root.insert(
        "filter".to_string(),
        Dynamic::List(vec![Dynamic::Map(filter)]),
    );
    DynamicValue::new(Dynamic::Map(root))
}

async fn configured_data_source(server: &ServerGuard) -> Box<dyn DataSourceWithConfigure> {
    let mut provider = VultrProvider::new();

    let mut config = HashMap::new();
    config.insert(
        "api_key".to_string(),
        Dynamic::String("test-key".to_string()),
    );
    config.insert(
        "api_endpoint".to_string(),
        Dynamic::String(server.url()),
    );

    let configure = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                config: DynamicValue::new(Dynamic::Map(config)),
            },
        )
        .await;
    assert!(
        configure.diagnostics.is_empty(),
        "provider configure failed: {:?}",
        configure.diagnostics
    );

    let mut ds = provider
        .create_data_source(Context::new(), "vultr_instances")
        .await
        .expect("data source factory");

    let ds_configure = ds
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: configure.provider_data,
            },
        )
        .await;
    assert!(
        ds_configure.diagnostics.is_empty(),
        "data source configure failed: {:?}",
        ds_configure.diagnostics
    );

    ds
}

fn instances_page() -> &'static str {
    r#"{
        "instances": [
            {
                "id": "inst-1",
                "os": "Ubuntu 22.04 x64",
                "ram": 1024,
                "disk": 25,
                "main_ip": "192.0.2.10",
                "vcpu_count": 1,
                "region": "ewr",
                "plan": "vc2-1c-1gb",
                "status": "active",
                "label": "web",
                "hostname": "web",
                "tags": ["prod"]
            }
        ],
        "meta": {"total": 1, "links": {"next": "", "prev": ""}}
    }"#
}

#[tokio::test]
async fn provider_wires_data_source_read_end_to_end() {
    let mut server = Server::new_async().await;
    let _instances = server
        .mock("GET", "/instances")
        .match_query(Matcher::Regex("^$".to_string()))
        .match_header("authorization", "Bearer test-key")
        .with_body(instances_page())
        .create_async()
        .await;
    let _schedule = server
        .mock("GET", "/instances/inst-1/backup-schedule")
        .with_body(r#"{"backup_schedule":{"enabled":true,"type":"daily","hour":2,"dow":0,"dom":0}}"#)
        .create_async()
        .await;
    let _vpcs = server
        .mock("GET", "/instances/inst-1/vpcs")
        .match_query(Matcher::Regex("^$".to_string()))
        .with_body(
            r#"{"vpcs":[{"id":"vpc-1","ip_address":"10.1.0.3"}],"meta":{"total":1,"links":{"next":"","prev":""}}}"#,
        )
        .create_async()
        .await;

    let ds = configured_data_source(&server).await;
    let response = ds
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "vultr_instances".to_string(),
                config: filter_config("label", &["web"]),
            },
        )
        .await;

    assert!(
        response.diagnostics.is_empty(),
        "read failed: {:?}",
        response.diagnostics
    );

    let state = response.state;
    assert_eq!(
        state.get_string(&AttributePath::new("id")).unwrap(),
        "instances"
    );

    let first = AttributePath::new("instances").index(0);
    assert_eq!(
        state.get_string(&first.clone().attribute("region")).unwrap(),
        "ewr"
    );
    assert_eq!(
        state.get_string(&first.clone().attribute("backups")).unwrap(),
        "enabled"
    );
    assert_eq!(
        state
            .get_string(&first.clone().attribute("backups_schedule").attribute("hour"))
            .unwrap(),
        "2"
    );
    assert_eq!(
        state.get_list(&first.attribute("vpc_ids")).unwrap(),
        vec![Dynamic::String("vpc-1".to_string())]
    );
}

#[tokio::test]
async fn read_with_no_matching_instances_surfaces_error() {
    let mut server = Server::new_async().await;
    let _instances = server
        .mock("GET", "/instances")
        .match_query(Matcher::Regex("^$".to_string()))
        .with_body(instances_page())
        .create_async()
        .await;

    let ds = configured_data_source(&server).await;
    let response = ds
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "vultr_instances".to_string(),
                config: filter_config("label", &["nope"]),
            },
        )
        .await;

    assert!(response.state.is_null());
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "No instances found");
}
