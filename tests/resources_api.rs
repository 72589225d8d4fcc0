//! End-to-end tests for the infrastructure status API.

use std::sync::Arc;
use std::time::Duration;

use iac_dashboard::config::AppConfig;
use iac_dashboard::infra::SnapshotInventory;
use sdk_rust::DashboardClient;
use serde_json::json;

mod common;

fn live_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.demo.enabled = false;
    config
}

#[tokio::test]
async fn demo_status_is_complete() {
    let server = common::start_server(AppConfig::default()).await;
    let client = DashboardClient::new(&server.url());

    let status = client.status().await.unwrap();
    assert_eq!(status["status"], "connected");
    assert_eq!(status["progress"], 100);
    assert_eq!(status["ec2Instances"].as_array().unwrap().len(), 2);
    assert_eq!(status["loadBalancer"]["active"], true);
    assert_eq!(status["database"]["identifier"], "rds-iac");
    assert_eq!(status["storage"]["bucketName"], "frontend-web-abc123");
    assert_eq!(status["cdn"]["distributionId"], "E1234567890ABC");
    assert_eq!(status["network"]["publicSubnetCount"], 2);
    assert_eq!(status["totalResourceCount"], 7);
    assert_eq!(status["healthyResourceCount"], 7);
}

#[tokio::test]
async fn live_mode_without_inventory_degrades() {
    let server = common::start_server(live_config()).await;
    let client = DashboardClient::new(&server.url());

    assert_eq!(client.resource("ec2").await.unwrap(), json!([]));
    for name in ["alb", "rds", "s3", "cloudfront", "vpc"] {
        assert!(client.resource(name).await.unwrap().is_null(), "{name}");
    }

    let status = client.status().await.unwrap();
    assert_eq!(status["status"], "connected");
    assert_eq!(status["totalResourceCount"], 0);
    assert_eq!(status["healthyResourceCount"], 0);

    let health = client.resource_health().await.unwrap();
    assert_eq!(health["status"], "UP");
    assert_eq!(health["components"]["ec2"]["status"], "DOWN");
    assert_eq!(health["components"]["alb"]["dns"], "N/A");
}

#[tokio::test]
async fn live_mode_reads_snapshot() {
    let path = std::env::temp_dir().join(format!("iac-inventory-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        json!({
            "instances": [
                {"instanceId": "i-live", "instanceType": "t3.small", "availabilityZone": "ap-northeast-2a",
                 "state": "stopped", "tags": {"Name": "api"}}
            ],
            "databases": [
                {"identifier": "db", "endpoint": "db.example", "port": 5432, "engine": "postgres",
                 "engineVersion": "16", "instanceClass": "db.t3.micro", "status": "backing-up",
                 "availabilityZone": "ap-northeast-2a"}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let mut config = live_config();
    config.resources.ec2.instance_ids = vec!["i-live".into()];
    config.resources.rds.endpoint = "db.example".into();

    let server = common::start_server_with(config, Arc::new(SnapshotInventory::new(&path)), None).await;
    let client = DashboardClient::new(&server.url());

    let ec2 = client.resource("ec2").await.unwrap();
    assert_eq!(ec2[0]["instanceName"], "api");
    assert_eq!(ec2[0]["healthStatus"], "unhealthy");

    let rds = client.resource("rds").await.unwrap();
    assert_eq!(rds["backingUp"], true);
    assert_eq!(rds["postgreSQL"], true);
    assert_eq!(rds["connectionString"], "jdbc:postgres://db.example:5432/");

    let status = client.status().await.unwrap();
    assert_eq!(status["totalResourceCount"], 2);
    assert_eq!(status["healthyResourceCount"], 0);

    std::fs::remove_file(&path).unwrap_or_default();
}

#[tokio::test]
async fn connection_status_thresholds() {
    let server = common::start_server(AppConfig::default()).await;
    let client = DashboardClient::new(&server.url());

    let connecting = client.connection_status(0).await.unwrap();
    assert_eq!(connecting["status"], "connecting");
    assert_eq!(connecting["progress"], 0);

    let connected = client.connection_status(3000).await.unwrap();
    assert_eq!(connected["status"], "connected");
    assert_eq!(connected["progress"], 100);
    assert!(connected["timestamp"].as_i64().unwrap() > 0);

    let body: serde_json::Value = common::http_client()
        .get(format!("{}/api/resources/connection-status?delay=soon", server.url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "connecting");
}

#[tokio::test]
async fn deployment_progress_is_complete() {
    let server = common::start_server(AppConfig::default()).await;
    let client = DashboardClient::new(&server.url());

    let progress = client.deployment_progress().await.unwrap();
    assert_eq!(progress["totalSteps"], 9);
    assert_eq!(progress["currentStep"], 9);
    assert_eq!(progress["status"], "completed");
    assert_eq!(progress["estimatedTimeRemaining"], 0);
}

#[tokio::test]
async fn config_update_switches_mode() {
    let server = common::start_server(AppConfig::default()).await;
    let client = DashboardClient::new(&server.url());
    assert_eq!(client.resource("ec2").await.unwrap().as_array().unwrap().len(), 2);

    server.config_updates.send(live_config()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(client.resource("ec2").await.unwrap(), json!([]));
}
