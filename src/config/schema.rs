//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dashboard.
//! All types derive Serde traits for deserialization from config files, and
//! every field carries a default so an empty file is a valid configuration.
//!
//! Resource override fields mirror the `aws.resources.*` property tree. An
//! empty string or list means "not configured": demo mode substitutes its
//! documented default, live mode treats the lookup as unconfigured.

use serde::{Deserialize, Serialize};

/// Root configuration for the dashboard service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, timeouts).
    pub listener: ListenerConfig,

    /// Cross-origin settings for the browser frontend.
    pub cors: CorsConfig,

    /// Demo/live switch.
    pub demo: DemoConfig,

    /// Known resource identifiers and per-field overrides.
    pub resources: ResourcesConfig,

    /// Live-mode inventory source.
    pub inventory: InventoryConfig,

    /// Voting feature settings.
    pub votes: VotesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. A `*.` host prefix matches any subdomain.
    pub allowed_origins: Vec<String>,

    /// Allowed HTTP methods.
    pub allowed_methods: Vec<String>,

    /// Whether credentials (cookies, auth headers) are allowed.
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "https://*.cloudfront.net".to_string(),
                "https://*.amazonaws.com".to_string(),
            ],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allow_credentials: true,
        }
    }
}

/// Demo mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Serve synthetic data instead of querying the inventory.
    pub enabled: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Known resource identifiers, grouped by service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResourcesConfig {
    pub ec2: Ec2Config,
    pub alb: AlbConfig,
    pub rds: RdsConfig,
    pub s3: S3Config,
    pub cloudfront: CloudFrontConfig,
    pub vpc: VpcConfig,
    pub security_groups: SecurityGroupsConfig,
}

/// Compute instance overrides. Lists are matched by position.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Ec2Config {
    pub instance_ids: Vec<String>,
    pub public_ips: Vec<String>,
    pub private_ips: Vec<String>,
    pub availability_zones: Vec<String>,
    pub instance_types: Vec<String>,
    pub ami_id: String,
}

/// Load balancer overrides.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AlbConfig {
    pub dns_name: String,
    pub arn: String,
    pub target_group_name: String,
    pub listener_arn: String,
    pub availability_zones: Vec<String>,
}

/// Database overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RdsConfig {
    pub endpoint: String,
    pub port: u16,
    pub instance_identifier: String,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub availability_zone: String,
    pub multi_az: bool,
}

impl Default for RdsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            port: 3306,
            instance_identifier: String::new(),
            engine: "mysql".to_string(),
            engine_version: "8.0".to_string(),
            instance_class: String::new(),
            availability_zone: String::new(),
            multi_az: false,
        }
    }
}

/// Bucket overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct S3Config {
    pub bucket_name: String,
    pub region: String,
    pub website_endpoint: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket_name: String::new(),
            region: "ap-northeast-2".to_string(),
            website_endpoint: String::new(),
        }
    }
}

/// CDN distribution overrides.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CloudFrontConfig {
    pub distribution_id: String,
    pub domain_name: String,
    pub status: String,
}

/// Network overrides.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct VpcConfig {
    pub vpc_id: String,
    pub cidr_block: String,
    pub public_subnet_ids: Vec<String>,
    pub private_subnet_ids_was: Vec<String>,
    pub private_subnet_ids_db: Vec<String>,
    pub internet_gateway_id: String,
    pub nat_gateway_ids: Vec<String>,
}

/// Security group identifiers (informational only).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityGroupsConfig {
    pub alb_id: String,
    pub was_id: String,
    pub db_id: String,
}

/// Inventory source for live mode.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct InventoryConfig {
    /// Path to a JSON inventory document. Without it live lookups fail.
    pub snapshot_path: Option<String>,
}

/// Voting feature configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct VotesConfig {
    /// JSON file the poll store is loaded from and flushed to.
    pub persistence_path: Option<String>,

    /// Create a couple of sample polls on startup when the store is empty.
    pub seed_demo_polls: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty or JSON log lines.
    pub log_format: LogFormat,

    /// Enable Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
