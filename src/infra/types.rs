//! Resource descriptors.
//!
//! Every descriptor is a raw `*Record` (what the inventory reports, or what
//! demo mode synthesizes) plus predicates derived from it once, on
//! construction. Records deserialize from inventory documents; descriptors
//! serialize the record fields and the derived fields side by side.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Usable addresses in a /24 subnet once AWS reserves its five.
const USABLE_SUBNET_ADDRESSES: u32 = 251;

fn is(value: &str, expected: &str) -> bool {
    value.eq_ignore_ascii_case(expected)
}

fn elapsed_minutes(since: Option<DateTime<Utc>>) -> i64 {
    since
        .map(|t| (Utc::now() - t).num_minutes().max(0))
        .unwrap_or(0)
}

// ── Compute ────────────────────────────────────────────────────

/// Health classification of a compute instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

impl HealthStatus {
    /// `running` is healthy, `stopped`/`stopping` unhealthy, anything else unknown.
    pub fn from_instance_state(state: &str) -> Self {
        if is(state, "running") {
            HealthStatus::Healthy
        } else if is(state, "stopped") || is(state, "stopping") {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceRecord {
    pub instance_id: String,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub public_ip: Option<String>,
    pub instance_type: String,
    pub availability_zone: String,
    pub state: String,
    #[serde(default)]
    pub ami_id: Option<String>,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub launch_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// A compute instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "InstanceRecord")]
pub struct Ec2Instance {
    #[serde(flatten)]
    pub record: InstanceRecord,
    pub health_status: HealthStatus,
    pub instance_name: String,
    pub uptime_minutes: i64,
    pub running: bool,
    pub has_public_ip: bool,
}

impl From<InstanceRecord> for Ec2Instance {
    fn from(record: InstanceRecord) -> Self {
        Self {
            health_status: HealthStatus::from_instance_state(&record.state),
            instance_name: record
                .tags
                .get("Name")
                .cloned()
                .unwrap_or_else(|| record.instance_id.clone()),
            uptime_minutes: elapsed_minutes(record.launch_time),
            running: is(&record.state, "running"),
            has_public_ip: record.public_ip.as_deref().is_some_and(|ip| !ip.is_empty()),
            record,
        }
    }
}

// ── Load balancer ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHealthRecord {
    pub target_id: String,
    pub target_type: String,
    pub health_status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Health of one registered target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TargetHealthRecord")]
pub struct TargetHealth {
    #[serde(flatten)]
    pub record: TargetHealthRecord,
    pub healthy: bool,
    pub initializing: bool,
    pub draining: bool,
}

impl From<TargetHealthRecord> for TargetHealth {
    fn from(record: TargetHealthRecord) -> Self {
        Self {
            healthy: is(&record.health_status, "healthy"),
            initializing: is(&record.health_status, "initial"),
            draining: is(&record.health_status, "draining"),
            record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroupRecord {
    pub arn: String,
    pub name: String,
    pub protocol: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub health_check_path: Option<String>,
    #[serde(default)]
    pub targets: Vec<TargetHealth>,
}

/// A target group with counts derived from its targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TargetGroupRecord")]
pub struct TargetGroup {
    #[serde(flatten)]
    pub record: TargetGroupRecord,
    pub healthy_target_count: u32,
    pub unhealthy_target_count: u32,
    pub total_target_count: u32,
    pub health_percentage: f64,
    pub all_targets_healthy: bool,
}

impl From<TargetGroupRecord> for TargetGroup {
    fn from(record: TargetGroupRecord) -> Self {
        let total = record.targets.len() as u32;
        let healthy = record
            .targets
            .iter()
            .filter(|t| t.record.health_status == "healthy")
            .count() as u32;
        let unhealthy = total - healthy;
        Self {
            healthy_target_count: healthy,
            unhealthy_target_count: unhealthy,
            total_target_count: total,
            health_percentage: if total == 0 {
                0.0
            } else {
                f64::from(healthy) / f64::from(total) * 100.0
            },
            all_targets_healthy: unhealthy == 0,
            record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerRecord {
    pub arn: String,
    pub dns_name: String,
    pub state: String,
    #[serde(rename = "type")]
    pub lb_type: String,
    pub scheme: String,
    #[serde(default)]
    pub availability_zones: Vec<String>,
    #[serde(default)]
    pub target_groups: Vec<TargetGroup>,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

/// An application load balancer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LoadBalancerRecord")]
pub struct LoadBalancer {
    #[serde(flatten)]
    pub record: LoadBalancerRecord,
    pub load_balancer_name: Option<String>,
    pub internet_facing: bool,
    pub active: bool,
    pub total_target_count: u32,
    pub healthy_target_count: u32,
}

impl From<LoadBalancerRecord> for LoadBalancer {
    fn from(record: LoadBalancerRecord) -> Self {
        Self {
            load_balancer_name: record.arn.split('/').nth(1).map(str::to_string),
            internet_facing: is(&record.scheme, "internet-facing"),
            active: is(&record.state, "active"),
            total_target_count: record
                .target_groups
                .iter()
                .map(|tg| tg.healthy_target_count + tg.unhealthy_target_count)
                .sum(),
            healthy_target_count: record
                .target_groups
                .iter()
                .map(|tg| tg.healthy_target_count)
                .sum(),
            record,
        }
    }
}

// ── Database ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseRecord {
    pub identifier: String,
    pub endpoint: String,
    pub port: u16,
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub status: String,
    #[serde(rename = "multiAZ", default)]
    pub multi_az: bool,
    pub availability_zone: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub storage_type: Option<String>,
    #[serde(default)]
    pub allocated_storage: Option<u32>,
}

/// A managed database instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "DatabaseRecord")]
pub struct Database {
    #[serde(flatten)]
    pub record: DatabaseRecord,
    pub available: bool,
    pub backing_up: bool,
    pub creating: bool,
    pub connection_string: String,
    pub uptime_hours: i64,
    #[serde(rename = "mySQL")]
    pub mysql: bool,
    #[serde(rename = "postgreSQL")]
    pub postgresql: bool,
}

impl From<DatabaseRecord> for Database {
    fn from(record: DatabaseRecord) -> Self {
        let engine = if record.engine.is_empty() {
            "mysql"
        } else {
            record.engine.as_str()
        };
        Self {
            available: is(&record.status, "available"),
            backing_up: is(&record.status, "backing-up"),
            creating: is(&record.status, "creating"),
            connection_string: format!("jdbc:{}://{}:{}/", engine, record.endpoint, record.port),
            uptime_hours: elapsed_minutes(record.created_time) / 60,
            mysql: is(&record.engine, "mysql"),
            postgresql: is(&record.engine, "postgres") || is(&record.engine, "postgresql"),
            record,
        }
    }
}

// ── Storage ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketRecord {
    pub bucket_name: String,
    pub region: String,
    #[serde(default)]
    pub creation_date: Option<DateTime<Utc>>,
    /// `public`, `private` or `unknown`.
    pub public_access_status: String,
    #[serde(default)]
    pub website_hosting: bool,
    #[serde(default)]
    pub website_endpoint: Option<String>,
    #[serde(default)]
    pub bucket_policy_status: Option<String>,
    #[serde(default)]
    pub encryption_enabled: Option<bool>,
    #[serde(default)]
    pub versioning_enabled: Option<bool>,
}

/// An object storage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "BucketRecord")]
pub struct Storage {
    #[serde(flatten)]
    pub record: BucketRecord,
    pub bucket_arn: String,
    pub bucket_url: String,
    pub website_hosting_enabled: bool,
    pub public_access_allowed: bool,
    pub secure: bool,
    pub age_in_days: i64,
}

impl From<BucketRecord> for Storage {
    fn from(record: BucketRecord) -> Self {
        Self {
            bucket_arn: format!("arn:aws:s3:::{}", record.bucket_name),
            bucket_url: format!(
                "https://{}.s3.{}.amazonaws.com",
                record.bucket_name, record.region
            ),
            website_hosting_enabled: record.website_hosting,
            public_access_allowed: is(&record.public_access_status, "public"),
            secure: is(&record.public_access_status, "private"),
            age_in_days: elapsed_minutes(record.creation_date) / (60 * 24),
            record,
        }
    }
}

// ── CDN ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginRecord {
    pub origin_id: String,
    pub domain_name: String,
    /// `s3` or `custom`.
    pub origin_type: String,
    #[serde(default)]
    pub origin_path: Option<String>,
    #[serde(default)]
    pub http_port: Option<u16>,
    #[serde(default)]
    pub https_port: Option<u16>,
    #[serde(default)]
    pub origin_protocol_policy: Option<String>,
}

/// A distribution origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "OriginRecord")]
pub struct Origin {
    #[serde(flatten)]
    pub record: OriginRecord,
    pub s3_origin: bool,
    pub custom_origin: bool,
    pub supports_https: bool,
    pub origin_url: String,
}

impl From<OriginRecord> for Origin {
    fn from(record: OriginRecord) -> Self {
        let s3_origin = is(&record.origin_type, "s3") || record.domain_name.contains(".s3.");
        let supports_https = record.https_port.is_some()
            || record
                .origin_protocol_policy
                .as_deref()
                .is_some_and(|p| is(p, "https-only") || is(p, "match-viewer"));
        let scheme = if supports_https { "https" } else { "http" };
        Self {
            s3_origin,
            custom_origin: is(&record.origin_type, "custom") || !s3_origin,
            supports_https,
            origin_url: format!(
                "{}://{}{}",
                scheme,
                record.domain_name,
                record.origin_path.as_deref().unwrap_or("")
            ),
            record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRecord {
    pub distribution_id: String,
    pub domain_name: String,
    /// `Deployed`, `InProgress` or `Disabled`.
    pub status: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub last_modified_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub origins: Vec<Origin>,
    #[serde(default)]
    pub price_class: Option<String>,
    #[serde(default)]
    pub default_root_object: Option<String>,
    #[serde(default)]
    pub custom_error_pages_enabled: Option<bool>,
}

/// A CDN distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "DistributionRecord")]
pub struct Cdn {
    #[serde(flatten)]
    pub record: DistributionRecord,
    pub deployed: bool,
    pub in_progress: bool,
    pub cloud_front_url: String,
    pub has_s3_origin: bool,
    pub days_since_last_modified: i64,
}

impl From<DistributionRecord> for Cdn {
    fn from(record: DistributionRecord) -> Self {
        Self {
            deployed: is(&record.status, "Deployed"),
            in_progress: is(&record.status, "InProgress"),
            cloud_front_url: format!("https://{}", record.domain_name),
            has_s3_origin: record.origins.iter().any(|o| is(&o.record.origin_type, "s3")),
            days_since_last_modified: elapsed_minutes(record.last_modified_time) / (60 * 24),
            record,
        }
    }
}

// ── Network ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetRecord {
    pub subnet_id: String,
    pub cidr_block: String,
    pub availability_zone: String,
    pub state: String,
    #[serde(default)]
    pub map_public_ip_on_launch: bool,
    #[serde(default)]
    pub available_ip_address_count: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subnet_type: Option<String>,
}

/// A subnet. Public means instances get a public address on launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SubnetRecord")]
pub struct Subnet {
    #[serde(flatten)]
    pub record: SubnetRecord,
    pub subnet_arn: String,
    pub public: bool,
    pub available: bool,
    pub ip_usage_percentage: f64,
}

impl From<SubnetRecord> for Subnet {
    fn from(record: SubnetRecord) -> Self {
        let ip_usage_percentage = match record.available_ip_address_count {
            Some(free) => {
                let used = f64::from(USABLE_SUBNET_ADDRESSES) - f64::from(free);
                used / f64::from(USABLE_SUBNET_ADDRESSES) * 100.0
            }
            None => 0.0,
        };
        Self {
            subnet_arn: format!("arn:aws:ec2:*:*:subnet/{}", record.subnet_id),
            public: record.map_public_ip_on_launch,
            available: is(&record.state, "available"),
            ip_usage_percentage,
            record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternetGatewayRecord {
    pub internet_gateway_id: String,
    pub state: String,
    #[serde(default)]
    pub attached_vpc_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "InternetGatewayRecord")]
pub struct InternetGateway {
    #[serde(flatten)]
    pub record: InternetGatewayRecord,
    pub internet_gateway_arn: String,
    pub attached: bool,
    pub available: bool,
}

impl From<InternetGatewayRecord> for InternetGateway {
    fn from(record: InternetGatewayRecord) -> Self {
        let attached = is(&record.state, "attached");
        Self {
            internet_gateway_arn: format!(
                "arn:aws:ec2:*:*:internet-gateway/{}",
                record.internet_gateway_id
            ),
            attached,
            available: attached || is(&record.state, "available"),
            record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatGatewayRecord {
    pub nat_gateway_id: String,
    pub state: String,
    pub subnet_id: String,
    #[serde(default)]
    pub availability_zone: Option<String>,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub name: Option<String>,
    /// `public` or `private`.
    #[serde(default)]
    pub connectivity_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "NatGatewayRecord")]
pub struct NatGateway {
    #[serde(flatten)]
    pub record: NatGatewayRecord,
    pub nat_gateway_arn: String,
    pub available: bool,
    pub pending: bool,
    pub public: bool,
    pub uptime_hours: i64,
}

impl From<NatGatewayRecord> for NatGateway {
    fn from(record: NatGatewayRecord) -> Self {
        Self {
            nat_gateway_arn: format!("arn:aws:ec2:*:*:natgateway/{}", record.nat_gateway_id),
            available: is(&record.state, "available"),
            pending: is(&record.state, "pending"),
            public: record
                .connectivity_type
                .as_deref()
                .is_some_and(|c| is(c, "public"))
                || record.public_ip.is_some(),
            uptime_hours: elapsed_minutes(record.create_time) / 60,
            record,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    pub vpc_id: String,
    pub cidr_block: String,
    pub state: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    #[serde(default)]
    pub internet_gateway: Option<InternetGateway>,
    #[serde(default)]
    pub nat_gateways: Vec<NatGateway>,
    #[serde(default)]
    pub route_table_count: Option<u32>,
    #[serde(default)]
    pub security_group_count: Option<u32>,
}

/// A virtual network and its subnets and gateways.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "NetworkRecord")]
pub struct Network {
    #[serde(flatten)]
    pub record: NetworkRecord,
    pub vpc_arn: String,
    pub available: bool,
    pub default_vpc: bool,
    pub public_subnet_count: usize,
    pub private_subnet_count: usize,
    pub total_subnet_count: usize,
    pub has_nat_gateway: bool,
    pub has_internet_gateway: bool,
}

impl From<NetworkRecord> for Network {
    fn from(record: NetworkRecord) -> Self {
        let public = record.subnets.iter().filter(|s| s.public).count();
        Self {
            vpc_arn: format!("arn:aws:ec2:*:*:vpc/{}", record.vpc_id),
            available: is(&record.state, "available"),
            default_vpc: record.is_default,
            public_subnet_count: public,
            private_subnet_count: record.subnets.len() - public,
            total_subnet_count: record.subnets.len(),
            has_nat_gateway: !record.nat_gateways.is_empty(),
            has_internet_gateway: record.internet_gateway.is_some(),
            record,
        }
    }
}
