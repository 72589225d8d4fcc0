//! Infrastructure status aggregation.
//!
//! Six independent sub-fetches, each either demo or live. A failed fetch
//! never fails the aggregate: it is logged, counted, and replaced by the
//! resource's default (empty list or absent descriptor).

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use serde::Serialize;

use crate::config::{AppConfig, ResourcesConfig};
use crate::infra::demo;
use crate::infra::inventory::{CloudInventory, InventoryError, InventoryResult};
use crate::infra::progress::ConnectionState;
use crate::infra::types::{
    Cdn, Database, Ec2Instance, HealthStatus, LoadBalancer, Network, Storage,
};
use crate::observability::metrics;

/// Descriptors gathered by one aggregation pass.
#[derive(Debug, Clone, Default)]
pub struct ResourceSnapshot {
    pub ec2_instances: Vec<Ec2Instance>,
    pub load_balancer: Option<LoadBalancer>,
    pub database: Option<Database>,
    pub storage: Option<Storage>,
    pub cdn: Option<Cdn>,
    pub network: Option<Network>,
}

/// Full dashboard payload.
///
/// Counts are computed from the descriptors when the status is built and
/// the descriptors cannot be changed afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureStatus {
    status: ConnectionState,
    message: String,
    last_updated: DateTime<Utc>,
    ec2_instances: Option<Vec<Ec2Instance>>,
    load_balancer: Option<LoadBalancer>,
    database: Option<Database>,
    storage: Option<Storage>,
    cdn: Option<Cdn>,
    network: Option<Network>,
    progress: u32,
    total_resource_count: usize,
    healthy_resource_count: usize,
}

impl InfrastructureStatus {
    pub fn connected(snapshot: ResourceSnapshot) -> Self {
        let mut status = Self {
            status: ConnectionState::Connected,
            message: "All resources connected successfully".to_string(),
            last_updated: Utc::now(),
            ec2_instances: Some(snapshot.ec2_instances),
            load_balancer: snapshot.load_balancer,
            database: snapshot.database,
            storage: snapshot.storage,
            cdn: snapshot.cdn,
            network: snapshot.network,
            progress: 100,
            total_resource_count: 0,
            healthy_resource_count: 0,
        };
        status.total_resource_count = status.count_total();
        status.healthy_resource_count = status.count_healthy();
        status
    }

    /// An error payload with every resource absent.
    pub fn error(cause: &str) -> Self {
        Self {
            status: ConnectionState::Error,
            message: format!("Failed to gather resource information: {cause}"),
            last_updated: Utc::now(),
            ec2_instances: None,
            load_balancer: None,
            database: None,
            storage: None,
            cdn: None,
            network: None,
            progress: 100,
            total_resource_count: 0,
            healthy_resource_count: 0,
        }
    }

    fn count_total(&self) -> usize {
        self.ec2_instances.as_ref().map_or(0, Vec::len)
            + usize::from(self.load_balancer.is_some())
            + usize::from(self.database.is_some())
            + usize::from(self.storage.is_some())
            + usize::from(self.cdn.is_some())
            + usize::from(self.network.is_some())
    }

    // Exact, case-sensitive comparisons. Storage counts whenever present.
    fn count_healthy(&self) -> usize {
        let ec2 = self.ec2_instances.as_ref().map_or(0, |instances| {
            instances
                .iter()
                .filter(|i| i.health_status == HealthStatus::Healthy)
                .count()
        });
        ec2 + usize::from(
            self.load_balancer
                .as_ref()
                .is_some_and(|lb| lb.record.state == "active"),
        ) + usize::from(
            self.database
                .as_ref()
                .is_some_and(|db| db.record.status == "available"),
        ) + usize::from(self.storage.is_some())
            + usize::from(self.cdn.as_ref().is_some_and(|cdn| cdn.record.status == "Deployed"))
            + usize::from(
                self.network
                    .as_ref()
                    .is_some_and(|vpc| vpc.record.state == "available"),
            )
    }

    pub fn status(&self) -> ConnectionState {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn ec2_instances(&self) -> Option<&[Ec2Instance]> {
        self.ec2_instances.as_deref()
    }

    pub fn load_balancer(&self) -> Option<&LoadBalancer> {
        self.load_balancer.as_ref()
    }

    pub fn network(&self) -> Option<&Network> {
        self.network.as_ref()
    }

    pub fn total_resource_count(&self) -> usize {
        self.total_resource_count
    }

    pub fn healthy_resource_count(&self) -> usize {
        self.healthy_resource_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComponentState {
    Up,
    Down,
}

impl ComponentState {
    fn present(present: bool) -> Self {
        if present {
            ComponentState::Up
        } else {
            ComponentState::Down
        }
    }
}

/// One entry under `components` in the health rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub status: ComponentState,
    #[serde(flatten)]
    pub details: BTreeMap<&'static str, serde_json::Value>,
}

impl ComponentHealth {
    fn named(status: ComponentState, key: &'static str, value: Option<String>) -> Self {
        let value = value.unwrap_or_else(|| "N/A".to_string());
        Self {
            status,
            details: BTreeMap::from([(key, serde_json::Value::String(value))]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: ComponentState,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<BTreeMap<&'static str, ComponentHealth>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Gathers resource descriptors for one request.
pub struct InfrastructureAggregator {
    config: Arc<AppConfig>,
    inventory: Arc<dyn CloudInventory>,
}

impl InfrastructureAggregator {
    pub fn new(config: Arc<AppConfig>, inventory: Arc<dyn CloudInventory>) -> Self {
        Self { config, inventory }
    }

    fn demo(&self) -> bool {
        self.config.demo.enabled
    }

    fn resources(&self) -> &ResourcesConfig {
        &self.config.resources
    }

    pub async fn fetch_ec2(&self) -> InventoryResult<Vec<Ec2Instance>> {
        if self.demo() {
            return Ok(demo::ec2_instances(self.resources()));
        }
        let ids = &self.resources().ec2.instance_ids;
        if ids.is_empty() {
            return Err(InventoryError::Unconfigured("ec2 instance ids"));
        }
        let records = self.inventory.describe_instances(ids).await?;
        Ok(records.into_iter().map(Ec2Instance::from).collect())
    }

    pub async fn fetch_load_balancer(&self) -> InventoryResult<LoadBalancer> {
        if self.demo() {
            return Ok(demo::load_balancer(self.resources()));
        }
        let dns_name = required(&self.resources().alb.dns_name, "alb dns name")?;
        Ok(self.inventory.describe_load_balancer(dns_name).await?.into())
    }

    pub async fn fetch_database(&self) -> InventoryResult<Database> {
        if self.demo() {
            return Ok(demo::database(self.resources()));
        }
        let endpoint = required(&self.resources().rds.endpoint, "rds endpoint")?;
        Ok(self.inventory.describe_database(endpoint).await?.into())
    }

    pub async fn fetch_storage(&self) -> InventoryResult<Storage> {
        if self.demo() {
            return Ok(demo::storage(self.resources()));
        }
        let bucket = required(&self.resources().s3.bucket_name, "s3 bucket name")?;
        Ok(self.inventory.describe_bucket(bucket).await?.into())
    }

    pub async fn fetch_cdn(&self) -> InventoryResult<Cdn> {
        if self.demo() {
            return Ok(demo::cdn(self.resources()));
        }
        let id = required(
            &self.resources().cloudfront.distribution_id,
            "cloudfront distribution id",
        )?;
        Ok(self.inventory.describe_distribution(id).await?.into())
    }

    pub async fn fetch_network(&self) -> InventoryResult<Network> {
        if self.demo() {
            return Ok(demo::network(self.resources()));
        }
        Ok(self.inventory.describe_network().await?.into())
    }

    pub async fn ec2_instances(&self) -> Vec<Ec2Instance> {
        degrade("ec2", self.fetch_ec2().await).unwrap_or_default()
    }

    pub async fn load_balancer(&self) -> Option<LoadBalancer> {
        degrade("alb", self.fetch_load_balancer().await)
    }

    pub async fn database(&self) -> Option<Database> {
        degrade("rds", self.fetch_database().await)
    }

    pub async fn storage(&self) -> Option<Storage> {
        degrade("s3", self.fetch_storage().await)
    }

    pub async fn cdn(&self) -> Option<Cdn> {
        degrade("cloudfront", self.fetch_cdn().await)
    }

    pub async fn network(&self) -> Option<Network> {
        degrade("vpc", self.fetch_network().await)
    }

    /// All six resources, fetched concurrently.
    pub async fn snapshot(&self) -> ResourceSnapshot {
        let (ec2_instances, load_balancer, database, storage, cdn, network) = tokio::join!(
            self.ec2_instances(),
            self.load_balancer(),
            self.database(),
            self.storage(),
            self.cdn(),
            self.network(),
        );
        ResourceSnapshot {
            ec2_instances,
            load_balancer,
            database,
            storage,
            cdn,
            network,
        }
    }

    /// Never fails: an orchestration panic becomes an error payload.
    pub async fn status(&self) -> InfrastructureStatus {
        match AssertUnwindSafe(self.snapshot()).catch_unwind().await {
            Ok(snapshot) => {
                let status = InfrastructureStatus::connected(snapshot);
                metrics::record_infrastructure_snapshot(
                    status.healthy_resource_count,
                    status.total_resource_count,
                );
                tracing::debug!(
                    total = status.total_resource_count,
                    healthy = status.healthy_resource_count,
                    demo = self.demo(),
                    "Infrastructure status gathered"
                );
                status
            }
            Err(panic) => {
                let cause = panic_message(panic.as_ref());
                tracing::error!(error = %cause, "Infrastructure status aggregation failed");
                InfrastructureStatus::error(&cause)
            }
        }
    }

    /// Per-component UP/DOWN rollup for compute, load balancer, database and storage.
    pub async fn health(&self) -> HealthReport {
        let gathered = AssertUnwindSafe(async {
            tokio::join!(
                self.ec2_instances(),
                self.load_balancer(),
                self.database(),
                self.storage(),
            )
        })
        .catch_unwind()
        .await;

        match gathered {
            Ok((ec2, alb, rds, s3)) => {
                let healthy = ec2
                    .iter()
                    .filter(|i| i.health_status == HealthStatus::Healthy)
                    .count();
                let compute = ComponentHealth {
                    status: ComponentState::present(!ec2.is_empty()),
                    details: BTreeMap::from([
                        ("count", serde_json::Value::from(ec2.len())),
                        ("healthy", serde_json::Value::from(healthy)),
                    ]),
                };
                let components = BTreeMap::from([
                    ("ec2", compute),
                    (
                        "alb",
                        ComponentHealth::named(
                            ComponentState::present(alb.is_some()),
                            "dns",
                            alb.map(|lb| lb.record.dns_name),
                        ),
                    ),
                    (
                        "rds",
                        ComponentHealth::named(
                            ComponentState::present(rds.is_some()),
                            "endpoint",
                            rds.map(|db| db.record.endpoint),
                        ),
                    ),
                    (
                        "s3",
                        ComponentHealth::named(
                            ComponentState::present(s3.is_some()),
                            "bucket",
                            s3.map(|b| b.record.bucket_name),
                        ),
                    ),
                ]);
                HealthReport {
                    status: ComponentState::Up,
                    timestamp: Utc::now(),
                    components: Some(components),
                    error: None,
                }
            }
            Err(panic) => {
                let cause = panic_message(panic.as_ref());
                tracing::error!(error = %cause, "Resource health check failed");
                HealthReport {
                    status: ComponentState::Down,
                    timestamp: Utc::now(),
                    components: None,
                    error: Some(cause),
                }
            }
        }
    }
}

fn required<'a>(value: &'a str, what: &'static str) -> InventoryResult<&'a str> {
    if value.is_empty() {
        Err(InventoryError::Unconfigured(what))
    } else {
        Ok(value)
    }
}

fn degrade<T>(resource: &'static str, result: InventoryResult<T>) -> Option<T> {
    let e = match result {
        Ok(value) => {
            tracing::info!(resource, "Resource fetched");
            return Some(value);
        }
        Err(e) => e,
    };
    match &e {
        InventoryError::Backend(_) => {
            tracing::error!(resource, error = %e, "Resource fetch failed, using default")
        }
        InventoryError::Unconfigured(_) | InventoryError::NotFound(_) => {
            tracing::warn!(resource, error = %e, "Resource unavailable, using default")
        }
    }
    metrics::record_fetch_failure(resource);
    None
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::inventory::{InventoryDocument, StaticInventory, UnavailableInventory};
    use crate::infra::types::{BucketRecord, InstanceRecord, NetworkRecord};
    use async_trait::async_trait;

    fn config(demo: bool) -> Arc<AppConfig> {
        let mut config = AppConfig::default();
        config.demo.enabled = demo;
        Arc::new(config)
    }

    /// Records the level and `resource` field of every event.
    #[derive(Clone, Default)]
    struct CapturedEvents(Arc<std::sync::Mutex<Vec<(tracing::Level, String)>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CapturedEvents {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            struct Resource(String);
            impl tracing::field::Visit for Resource {
                fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                    if field.name() == "resource" {
                        self.0 = value.to_string();
                    }
                }
                fn record_debug(&mut self, _: &tracing::field::Field, _: &dyn std::fmt::Debug) {}
            }
            let mut resource = Resource(String::new());
            event.record(&mut resource);
            self.0
                .lock()
                .unwrap()
                .push((*event.metadata().level(), resource.0));
        }
    }

    fn fetch_levels(results: Vec<(&'static str, InventoryResult<u8>)>) -> Vec<(tracing::Level, String)> {
        use tracing_subscriber::layer::SubscriberExt;

        let events = CapturedEvents::default();
        let subscriber = tracing_subscriber::registry().with(events.clone());
        tracing::subscriber::with_default(subscriber, || {
            for (resource, result) in results {
                degrade(resource, result);
            }
        });
        let captured = events.0.lock().unwrap().clone();
        captured
    }

    #[test]
    fn fetch_outcomes_log_at_graded_levels() {
        let levels = fetch_levels(vec![
            ("ec2", Ok(1)),
            ("alb", Err(InventoryError::Unconfigured("load balancer dns name"))),
            ("rds", Err(InventoryError::NotFound("rds-iac".into()))),
            ("s3", Err(InventoryError::Backend("connection refused".into()))),
        ]);
        assert_eq!(
            levels,
            vec![
                (tracing::Level::INFO, "ec2".to_string()),
                (tracing::Level::WARN, "alb".to_string()),
                (tracing::Level::WARN, "rds".to_string()),
                (tracing::Level::ERROR, "s3".to_string()),
            ]
        );
    }

    fn aggregator(demo: bool, inventory: impl CloudInventory + 'static) -> InfrastructureAggregator {
        InfrastructureAggregator::new(config(demo), Arc::new(inventory))
    }

    #[tokio::test]
    async fn demo_status_is_fully_connected() {
        let status = aggregator(true, UnavailableInventory).status().await;
        assert_eq!(status.status(), ConnectionState::Connected);
        // 2 instances + alb + rds + s3 + cloudfront + vpc
        assert_eq!(status.total_resource_count(), 7);
        assert_eq!(status.healthy_resource_count(), 7);
    }

    #[tokio::test]
    async fn live_failures_degrade_to_defaults() {
        let status = aggregator(false, UnavailableInventory).status().await;
        assert_eq!(status.status(), ConnectionState::Connected);
        assert_eq!(status.ec2_instances(), Some(&[][..]));
        assert!(status.load_balancer().is_none());
        assert!(status.network().is_none());
        assert_eq!(status.total_resource_count(), 0);
        assert_eq!(status.healthy_resource_count(), 0);
    }

    #[tokio::test]
    async fn live_mode_requires_identifiers() {
        let agg = aggregator(false, StaticInventory::default());
        assert_eq!(
            agg.fetch_ec2().await.unwrap_err(),
            InventoryError::Unconfigured("ec2 instance ids")
        );
        assert_eq!(
            agg.fetch_storage().await.unwrap_err(),
            InventoryError::Unconfigured("s3 bucket name")
        );
    }

    #[tokio::test]
    async fn live_mode_maps_inventory_records() {
        let document: InventoryDocument = serde_json::from_value(serde_json::json!({
            "instances": [
                {"instanceId": "i-1", "instanceType": "t3.micro", "availabilityZone": "a", "state": "running"},
                {"instanceId": "i-2", "instanceType": "t3.micro", "availabilityZone": "b", "state": "stopped"}
            ],
            "buckets": [
                {"bucketName": "site", "region": "ap-northeast-2", "publicAccessStatus": "public"}
            ],
            "networks": [
                {"vpcId": "vpc-1", "cidrBlock": "10.0.0.0/16", "state": "pending"}
            ]
        }))
        .unwrap();

        let mut config = AppConfig::default();
        config.demo.enabled = false;
        config.resources.ec2.instance_ids = vec!["i-1".into(), "i-2".into()];
        config.resources.s3.bucket_name = "site".into();
        let agg = InfrastructureAggregator::new(Arc::new(config), Arc::new(StaticInventory::new(document)));

        let status = agg.status().await;
        // 2 instances + bucket + vpc
        assert_eq!(status.total_resource_count(), 4);
        // running instance + bucket (always counted)
        assert_eq!(status.healthy_resource_count(), 2);
        assert!(status.healthy_resource_count() <= status.total_resource_count());
    }

    struct PanickingInventory;

    #[async_trait]
    impl CloudInventory for PanickingInventory {
        async fn describe_instances(&self, _: &[String]) -> InventoryResult<Vec<InstanceRecord>> {
            panic!("inventory exploded")
        }
        async fn describe_load_balancer(
            &self,
            _: &str,
        ) -> InventoryResult<crate::infra::types::LoadBalancerRecord> {
            Err(InventoryError::Backend("down".into()))
        }
        async fn describe_database(
            &self,
            _: &str,
        ) -> InventoryResult<crate::infra::types::DatabaseRecord> {
            Err(InventoryError::Backend("down".into()))
        }
        async fn describe_bucket(&self, _: &str) -> InventoryResult<BucketRecord> {
            Err(InventoryError::Backend("down".into()))
        }
        async fn describe_distribution(
            &self,
            _: &str,
        ) -> InventoryResult<crate::infra::types::DistributionRecord> {
            Err(InventoryError::Backend("down".into()))
        }
        async fn describe_network(&self) -> InventoryResult<NetworkRecord> {
            Err(InventoryError::Backend("down".into()))
        }
    }

    #[tokio::test]
    async fn orchestration_panic_becomes_error_status() {
        let mut config = AppConfig::default();
        config.demo.enabled = false;
        config.resources.ec2.instance_ids = vec!["i-1".into()];
        let agg = InfrastructureAggregator::new(Arc::new(config.clone()), Arc::new(PanickingInventory));

        let status = agg.status().await;
        assert_eq!(status.status(), ConnectionState::Error);
        assert!(status.message().contains("inventory exploded"));
        assert!(status.ec2_instances().is_none());
        assert_eq!(status.total_resource_count(), 0);

        let agg = InfrastructureAggregator::new(Arc::new(config), Arc::new(PanickingInventory));
        let health = agg.health().await;
        assert_eq!(health.status, ComponentState::Down);
        assert_eq!(health.error.as_deref(), Some("inventory exploded"));
    }

    #[tokio::test]
    async fn health_rollup_shape() {
        let report = aggregator(true, UnavailableInventory).health().await;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "UP");
        assert_eq!(json["components"]["ec2"]["status"], "UP");
        assert_eq!(json["components"]["ec2"]["count"], 2);
        assert_eq!(json["components"]["ec2"]["healthy"], 2);
        assert_eq!(json["components"]["alb"]["dns"], demo::DEFAULT_ALB_DNS);
        assert_eq!(json["components"]["s3"]["bucket"], demo::DEFAULT_BUCKET);

        let report = aggregator(false, UnavailableInventory).health().await;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "UP");
        assert_eq!(json["components"]["ec2"]["status"], "DOWN");
        assert_eq!(json["components"]["rds"]["endpoint"], "N/A");
    }

    #[test]
    fn error_status_serializes_nulls() {
        let json = serde_json::to_value(InfrastructureStatus::error("boom")).unwrap();
        assert_eq!(json["status"], "error");
        assert!(json["ec2Instances"].is_null());
        assert!(json["loadBalancer"].is_null());
        assert_eq!(json["progress"], 100);
        assert_eq!(json["totalResourceCount"], 0);
    }
}
