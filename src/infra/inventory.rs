//! Cloud inventory sources for live mode.
//!
//! The aggregator only talks to [`CloudInventory`]. A failure here never
//! reaches a client: the aggregator logs it and substitutes the documented
//! default for that resource.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::infra::types::{
    BucketRecord, DatabaseRecord, DistributionRecord, InstanceRecord, LoadBalancerRecord,
    NetworkRecord,
};

/// Why a resource could not be described.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InventoryError {
    /// Live lookup needs an identifier the operator has not configured.
    #[error("{0} not configured")]
    Unconfigured(&'static str),

    #[error("{0} not found")]
    NotFound(String),

    #[error("inventory unavailable: {0}")]
    Backend(String),
}

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Read access to the cloud account.
#[async_trait]
pub trait CloudInventory: Send + Sync {
    /// Instances matching `ids`. Unknown ids are skipped.
    async fn describe_instances(&self, ids: &[String]) -> InventoryResult<Vec<InstanceRecord>>;

    async fn describe_load_balancer(&self, dns_name: &str) -> InventoryResult<LoadBalancerRecord>;

    async fn describe_database(&self, endpoint: &str) -> InventoryResult<DatabaseRecord>;

    async fn describe_bucket(&self, name: &str) -> InventoryResult<BucketRecord>;

    async fn describe_distribution(&self, id: &str) -> InventoryResult<DistributionRecord>;

    /// The first non-default network.
    async fn describe_network(&self) -> InventoryResult<NetworkRecord>;
}

/// Everything an inventory source knows, in one document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InventoryDocument {
    pub instances: Vec<InstanceRecord>,
    pub load_balancers: Vec<LoadBalancerRecord>,
    pub databases: Vec<DatabaseRecord>,
    pub buckets: Vec<BucketRecord>,
    pub distributions: Vec<DistributionRecord>,
    pub networks: Vec<NetworkRecord>,
}

impl InventoryDocument {
    fn instances(&self, ids: &[String]) -> Vec<InstanceRecord> {
        self.instances
            .iter()
            .filter(|i| ids.contains(&i.instance_id))
            .cloned()
            .collect()
    }

    fn load_balancer(&self, dns_name: &str) -> InventoryResult<LoadBalancerRecord> {
        self.load_balancers
            .iter()
            .find(|lb| lb.dns_name == dns_name)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(format!("load balancer {dns_name}")))
    }

    fn database(&self, endpoint: &str) -> InventoryResult<DatabaseRecord> {
        self.databases
            .iter()
            .find(|db| db.endpoint == endpoint)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(format!("database {endpoint}")))
    }

    fn bucket(&self, name: &str) -> InventoryResult<BucketRecord> {
        self.buckets
            .iter()
            .find(|b| b.bucket_name == name)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(format!("bucket {name}")))
    }

    fn distribution(&self, id: &str) -> InventoryResult<DistributionRecord> {
        self.distributions
            .iter()
            .find(|d| d.distribution_id == id)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound(format!("distribution {id}")))
    }

    fn network(&self) -> InventoryResult<NetworkRecord> {
        self.networks
            .iter()
            .find(|n| !n.is_default)
            .cloned()
            .ok_or_else(|| InventoryError::NotFound("non-default vpc".to_string()))
    }
}

/// Inventory backed by a fixed, in-memory document.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    document: InventoryDocument,
}

impl StaticInventory {
    pub fn new(document: InventoryDocument) -> Self {
        Self { document }
    }
}

#[async_trait]
impl CloudInventory for StaticInventory {
    async fn describe_instances(&self, ids: &[String]) -> InventoryResult<Vec<InstanceRecord>> {
        Ok(self.document.instances(ids))
    }

    async fn describe_load_balancer(&self, dns_name: &str) -> InventoryResult<LoadBalancerRecord> {
        self.document.load_balancer(dns_name)
    }

    async fn describe_database(&self, endpoint: &str) -> InventoryResult<DatabaseRecord> {
        self.document.database(endpoint)
    }

    async fn describe_bucket(&self, name: &str) -> InventoryResult<BucketRecord> {
        self.document.bucket(name)
    }

    async fn describe_distribution(&self, id: &str) -> InventoryResult<DistributionRecord> {
        self.document.distribution(id)
    }

    async fn describe_network(&self) -> InventoryResult<NetworkRecord> {
        self.document.network()
    }
}

/// Inventory read from a JSON file on every call, so an external exporter
/// can refresh the file while the server runs.
#[derive(Debug, Clone)]
pub struct SnapshotInventory {
    path: PathBuf,
}

impl SnapshotInventory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> InventoryResult<InventoryDocument> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            InventoryError::Backend(format!("reading {}: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            InventoryError::Backend(format!("parsing {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl CloudInventory for SnapshotInventory {
    async fn describe_instances(&self, ids: &[String]) -> InventoryResult<Vec<InstanceRecord>> {
        Ok(self.load().await?.instances(ids))
    }

    async fn describe_load_balancer(&self, dns_name: &str) -> InventoryResult<LoadBalancerRecord> {
        self.load().await?.load_balancer(dns_name)
    }

    async fn describe_database(&self, endpoint: &str) -> InventoryResult<DatabaseRecord> {
        self.load().await?.database(endpoint)
    }

    async fn describe_bucket(&self, name: &str) -> InventoryResult<BucketRecord> {
        self.load().await?.bucket(name)
    }

    async fn describe_distribution(&self, id: &str) -> InventoryResult<DistributionRecord> {
        self.load().await?.distribution(id)
    }

    async fn describe_network(&self) -> InventoryResult<NetworkRecord> {
        self.load().await?.network()
    }
}

/// Used when live mode has no inventory source configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableInventory;

impl UnavailableInventory {
    fn error() -> InventoryError {
        InventoryError::Backend("no inventory source configured".to_string())
    }
}

#[async_trait]
impl CloudInventory for UnavailableInventory {
    async fn describe_instances(&self, _ids: &[String]) -> InventoryResult<Vec<InstanceRecord>> {
        Err(Self::error())
    }

    async fn describe_load_balancer(&self, _dns_name: &str) -> InventoryResult<LoadBalancerRecord> {
        Err(Self::error())
    }

    async fn describe_database(&self, _endpoint: &str) -> InventoryResult<DatabaseRecord> {
        Err(Self::error())
    }

    async fn describe_bucket(&self, _name: &str) -> InventoryResult<BucketRecord> {
        Err(Self::error())
    }

    async fn describe_distribution(&self, _id: &str) -> InventoryResult<DistributionRecord> {
        Err(Self::error())
    }

    async fn describe_network(&self) -> InventoryResult<NetworkRecord> {
        Err(Self::error())
    }
}
