//! Synthetic resources for demo mode.
//!
//! Each generator starts from fixed defaults and replaces any field the
//! operator configured. Empty strings and empty lists count as "not
//! configured".

use std::collections::BTreeMap;

use chrono::{Duration, Utc};

use crate::config::ResourcesConfig;
use crate::infra::types::{
    BucketRecord, Cdn, Database, DatabaseRecord, DistributionRecord, Ec2Instance, InstanceRecord,
    InternetGatewayRecord, LoadBalancer, LoadBalancerRecord, NatGatewayRecord, Network,
    NetworkRecord, OriginRecord, Storage, SubnetRecord, TargetGroupRecord, TargetHealthRecord,
};

pub const DEFAULT_INSTANCE_IDS: [&str; 2] = ["i-1234567890abcdef0", "i-0987654321fedcba0"];
const DEFAULT_PRIVATE_IPS: [&str; 2] = ["172.31.47.117", "172.31.40.58"];
const DEFAULT_INSTANCE_TYPE: &str = "t3.micro";
const DEFAULT_ZONES: [&str; 2] = ["ap-northeast-2a", "ap-northeast-2c"];
const DEFAULT_AMI: &str = "ami-0ea4d4b8dc1e46212";

pub const DEFAULT_ALB_DNS: &str = "alb-web-1234567890.ap-northeast-2.elb.amazonaws.com";
const DEFAULT_ALB_ARN: &str = "arn:aws:elasticloadbalancing:ap-northeast-2:123456789012:loadbalancer/app/alb-web/1234567890123456";
const DEFAULT_TARGET_GROUP: &str = "alb-tg";

const DEFAULT_RDS_IDENTIFIER: &str = "rds-iac";
pub const DEFAULT_RDS_ENDPOINT: &str = "rds-iac.cluster-xyz123.ap-northeast-2.rds.amazonaws.com";
const DEFAULT_RDS_CLASS: &str = "db.t3.micro";

pub const DEFAULT_BUCKET: &str = "frontend-web-abc123";
const DEFAULT_REGION: &str = "ap-northeast-2";

const DEFAULT_DISTRIBUTION_ID: &str = "E1234567890ABC";
const DEFAULT_DISTRIBUTION_DOMAIN: &str = "d1234567890abc.cloudfront.net";

const DEFAULT_VPC_ID: &str = "vpc-1234567890abcdef0";
const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";
const DEFAULT_IGW_ID: &str = "igw-1234567890abcdef0";
const DEFAULT_PUBLIC_SUBNETS: [&str; 2] = ["subnet-1234567890abcdef0", "subnet-0987654321fedcba0"];
const DEFAULT_WAS_SUBNETS: [&str; 2] = ["subnet-1111222233334444", "subnet-5555666677778888"];
const DEFAULT_DB_SUBNETS: [&str; 2] = ["subnet-aaaa111122223333", "subnet-bbbb444455556666"];

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

fn list_or(values: &[String], defaults: &[&str]) -> Vec<String> {
    if values.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        values.to_vec()
    }
}

/// `ap-northeast-2a`, `ap-northeast-2b`, ... by position.
fn zone_for(index: usize) -> String {
    let letter = (b'a' + (index % 26) as u8) as char;
    format!("{DEFAULT_REGION}{letter}")
}

pub fn instance_ids(resources: &ResourcesConfig) -> Vec<String> {
    list_or(&resources.ec2.instance_ids, &DEFAULT_INSTANCE_IDS)
}

fn bucket_name(resources: &ResourcesConfig) -> String {
    or_default(&resources.s3.bucket_name, DEFAULT_BUCKET)
}

fn bucket_region(resources: &ResourcesConfig) -> String {
    or_default(&resources.s3.region, DEFAULT_REGION)
}

pub fn ec2_instances(resources: &ResourcesConfig) -> Vec<Ec2Instance> {
    let ec2 = &resources.ec2;
    let private_ips = list_or(&ec2.private_ips, &DEFAULT_PRIVATE_IPS);
    let zones = list_or(&ec2.availability_zones, &DEFAULT_ZONES);
    let ami_id = or_default(&ec2.ami_id, DEFAULT_AMI);
    let now = Utc::now();

    instance_ids(resources)
        .into_iter()
        .enumerate()
        .map(|(i, instance_id)| {
            let tags = BTreeMap::from([
                ("Name".to_string(), format!("WAS-Instance-{}", i + 1)),
                ("Environment".to_string(), "Demo".to_string()),
            ]);
            InstanceRecord {
                instance_id,
                private_ip: Some(
                    private_ips
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| format!("172.31.0.{}", 10 + i)),
                ),
                public_ip: ec2.public_ips.get(i).filter(|ip| !ip.is_empty()).cloned(),
                instance_type: ec2
                    .instance_types
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_INSTANCE_TYPE.to_string()),
                availability_zone: zones.get(i).cloned().unwrap_or_else(|| zone_for(i)),
                state: "running".to_string(),
                ami_id: Some(ami_id.clone()),
                architecture: Some("x86_64".to_string()),
                launch_time: Some(now - Duration::hours(2 - i as i64)),
                tags,
            }
            .into()
        })
        .collect()
}

pub fn load_balancer(resources: &ResourcesConfig) -> LoadBalancer {
    let alb = &resources.alb;
    let group_name = or_default(&alb.target_group_name, DEFAULT_TARGET_GROUP);

    let targets = instance_ids(resources)
        .into_iter()
        .map(|target_id| {
            TargetHealthRecord {
                target_id,
                target_type: "instance".to_string(),
                health_status: "healthy".to_string(),
                description: Some("Target is healthy".to_string()),
                port: None,
            }
            .into()
        })
        .collect();

    let group = TargetGroupRecord {
        arn: format!(
            "arn:aws:elasticloadbalancing:ap-northeast-2:123456789012:targetgroup/{group_name}/1234567890123456"
        ),
        name: group_name,
        protocol: "HTTP".to_string(),
        port: Some(8080),
        health_check_path: Some("/actuator/health".to_string()),
        targets,
    };

    LoadBalancerRecord {
        arn: or_default(&alb.arn, DEFAULT_ALB_ARN),
        dns_name: or_default(&alb.dns_name, DEFAULT_ALB_DNS),
        state: "active".to_string(),
        lb_type: "application".to_string(),
        scheme: "internet-facing".to_string(),
        availability_zones: list_or(&alb.availability_zones, &DEFAULT_ZONES),
        target_groups: vec![group.into()],
        created_time: Some(Utc::now() - Duration::hours(3)),
    }
    .into()
}

pub fn database(resources: &ResourcesConfig) -> Database {
    let rds = &resources.rds;
    DatabaseRecord {
        identifier: or_default(&rds.instance_identifier, DEFAULT_RDS_IDENTIFIER),
        endpoint: or_default(&rds.endpoint, DEFAULT_RDS_ENDPOINT),
        port: rds.port,
        engine: or_default(&rds.engine, "mysql"),
        engine_version: or_default(&rds.engine_version, "8.0"),
        instance_class: or_default(&rds.instance_class, DEFAULT_RDS_CLASS),
        status: "available".to_string(),
        multi_az: rds.multi_az,
        availability_zone: or_default(&rds.availability_zone, "ap-northeast-2a"),
        created_time: Some(Utc::now() - Duration::hours(4)),
        storage_type: Some("gp2".to_string()),
        allocated_storage: Some(20),
    }
    .into()
}

pub fn storage(resources: &ResourcesConfig) -> Storage {
    let bucket = bucket_name(resources);
    let region = bucket_region(resources);
    let website_endpoint = if resources.s3.website_endpoint.is_empty() {
        format!("{bucket}.s3-website.{region}.amazonaws.com")
    } else {
        resources.s3.website_endpoint.clone()
    };

    BucketRecord {
        bucket_name: bucket,
        region,
        creation_date: Some(Utc::now() - Duration::hours(5)),
        public_access_status: "private".to_string(),
        website_hosting: true,
        website_endpoint: Some(website_endpoint),
        bucket_policy_status: None,
        encryption_enabled: Some(true),
        versioning_enabled: Some(false),
    }
    .into()
}

pub fn cdn(resources: &ResourcesConfig) -> Cdn {
    let cloudfront = &resources.cloudfront;
    let bucket = bucket_name(resources);
    let region = bucket_region(resources);

    let origin = OriginRecord {
        domain_name: format!("{bucket}.s3.{region}.amazonaws.com"),
        origin_id: bucket,
        origin_type: "s3".to_string(),
        origin_path: Some(String::new()),
        http_port: None,
        https_port: None,
        origin_protocol_policy: None,
    };

    DistributionRecord {
        distribution_id: or_default(&cloudfront.distribution_id, DEFAULT_DISTRIBUTION_ID),
        domain_name: or_default(&cloudfront.domain_name, DEFAULT_DISTRIBUTION_DOMAIN),
        status: or_default(&cloudfront.status, "Deployed"),
        enabled: true,
        comment: Some("Frontend distribution for voting system".to_string()),
        last_modified_time: Some(Utc::now() - Duration::hours(2)),
        origins: vec![origin.into()],
        price_class: Some("PriceClass_All".to_string()),
        default_root_object: Some("index.html".to_string()),
        custom_error_pages_enabled: None,
    }
    .into()
}

struct SubnetTier {
    ids: Vec<String>,
    first_octet: usize,
    free_addresses: fn(usize) -> u32,
    name_prefix: &'static str,
    public: bool,
}

pub fn network(resources: &ResourcesConfig) -> Network {
    let vpc = &resources.vpc;
    let vpc_id = or_default(&vpc.vpc_id, DEFAULT_VPC_ID);

    let tiers = [
        SubnetTier {
            ids: list_or(&vpc.public_subnet_ids, &DEFAULT_PUBLIC_SUBNETS),
            first_octet: 1,
            free_addresses: |i| 245u32.saturating_sub(i as u32 * 2),
            name_prefix: "pub-sub",
            public: true,
        },
        SubnetTier {
            ids: list_or(&vpc.private_subnet_ids_was, &DEFAULT_WAS_SUBNETS),
            first_octet: 3,
            free_addresses: |i| 249u32.saturating_sub(i as u32),
            name_prefix: "pri-sub-was",
            public: false,
        },
        SubnetTier {
            ids: list_or(&vpc.private_subnet_ids_db, &DEFAULT_DB_SUBNETS),
            first_octet: 5,
            free_addresses: |i| 252u32.saturating_sub(i as u32),
            name_prefix: "pri-sub-db",
            public: false,
        },
    ];

    let subnets: Vec<_> = tiers
        .iter()
        .flat_map(|tier| {
            tier.ids.iter().enumerate().map(move |(i, id)| {
                SubnetRecord {
                    subnet_id: id.clone(),
                    cidr_block: format!("10.0.{}.0/24", i + tier.first_octet),
                    availability_zone: zone_for(i),
                    state: "available".to_string(),
                    map_public_ip_on_launch: tier.public,
                    available_ip_address_count: Some((tier.free_addresses)(i)),
                    name: Some(format!("{}-{}", tier.name_prefix, i + 1)),
                    subnet_type: Some(if tier.public { "public" } else { "private" }.to_string()),
                }
                .into()
            })
        })
        .collect();

    let nat_subnet = tiers[0].ids.first().cloned().unwrap_or_default();
    let nat_gateways = vpc
        .nat_gateway_ids
        .iter()
        .filter(|id| !id.is_empty())
        .map(|id| {
            NatGatewayRecord {
                nat_gateway_id: id.clone(),
                state: "available".to_string(),
                subnet_id: nat_subnet.clone(),
                availability_zone: Some(zone_for(0)),
                public_ip: None,
                private_ip: None,
                create_time: Some(Utc::now() - Duration::hours(5)),
                name: None,
                connectivity_type: Some("public".to_string()),
            }
            .into()
        })
        .collect();

    let internet_gateway = InternetGatewayRecord {
        internet_gateway_id: or_default(&vpc.internet_gateway_id, DEFAULT_IGW_ID),
        state: "attached".to_string(),
        attached_vpc_id: Some(vpc_id.clone()),
        name: Some("main-igw".to_string()),
    };

    NetworkRecord {
        vpc_id,
        cidr_block: or_default(&vpc.cidr_block, DEFAULT_VPC_CIDR),
        state: "available".to_string(),
        is_default: false,
        name: Some("main-vpc".to_string()),
        subnets,
        internet_gateway: Some(internet_gateway.into()),
        nat_gateways,
        route_table_count: Some(4),
        security_group_count: Some(3),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::types::HealthStatus;

    #[test]
    fn default_instances() {
        let instances = ec2_instances(&ResourcesConfig::default());
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].record.instance_id, "i-1234567890abcdef0");
        assert_eq!(instances[1].record.private_ip.as_deref(), Some("172.31.40.58"));
        assert_eq!(instances[1].record.availability_zone, "ap-northeast-2c");
        assert_eq!(instances[0].instance_name, "WAS-Instance-1");
        assert!(instances.iter().all(|i| i.health_status == HealthStatus::Healthy));
        assert!(instances.iter().all(|i| !i.has_public_ip));
    }

    #[test]
    fn instance_overrides_fill_missing_positions() {
        let mut resources = ResourcesConfig::default();
        resources.ec2.instance_ids = vec!["i-a".into(), "i-b".into(), "i-c".into()];
        resources.ec2.public_ips = vec!["3.3.3.3".into()];
        resources.ec2.instance_types = vec!["m5.large".into()];

        let instances = ec2_instances(&resources);
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[0].record.public_ip.as_deref(), Some("3.3.3.3"));
        assert_eq!(instances[1].record.public_ip, None);
        assert_eq!(instances[0].record.instance_type, "m5.large");
        assert_eq!(instances[1].record.instance_type, "t3.micro");
        assert_eq!(instances[2].record.private_ip.as_deref(), Some("172.31.0.12"));
        assert_eq!(instances[2].record.availability_zone, "ap-northeast-2c");
    }

    #[test]
    fn load_balancer_targets_follow_instances() {
        let alb = load_balancer(&ResourcesConfig::default());
        assert_eq!(alb.record.dns_name, DEFAULT_ALB_DNS);
        assert_eq!(alb.load_balancer_name.as_deref(), Some("app"));
        assert_eq!(alb.total_target_count, 2);
        assert_eq!(alb.healthy_target_count, 2);
        assert!(alb.active);
        assert_eq!(alb.record.target_groups[0].record.name, "alb-tg");
    }

    #[test]
    fn database_and_bucket_defaults() {
        let db = database(&ResourcesConfig::default());
        assert_eq!(db.record.identifier, "rds-iac");
        assert_eq!(db.record.port, 3306);
        assert!(db.available);
        assert!(db.mysql);
        assert_eq!(
            db.connection_string,
            "jdbc:mysql://rds-iac.cluster-xyz123.ap-northeast-2.rds.amazonaws.com:3306/"
        );

        let s3 = storage(&ResourcesConfig::default());
        assert_eq!(s3.record.bucket_name, DEFAULT_BUCKET);
        assert_eq!(
            s3.record.website_endpoint.as_deref(),
            Some("frontend-web-abc123.s3-website.ap-northeast-2.amazonaws.com")
        );
        assert!(s3.secure);
    }

    #[test]
    fn cdn_origin_follows_bucket_override() {
        let mut resources = ResourcesConfig::default();
        resources.s3.bucket_name = "my-site".into();
        resources.cloudfront.status = "InProgress".into();

        let cdn = cdn(&resources);
        assert!(!cdn.deployed);
        assert!(cdn.in_progress);
        assert!(cdn.has_s3_origin);
        assert_eq!(cdn.record.origins[0].record.origin_id, "my-site");
        assert_eq!(
            cdn.record.origins[0].record.domain_name,
            "my-site.s3.ap-northeast-2.amazonaws.com"
        );
    }

    #[test]
    fn network_layout() {
        let vpc = network(&ResourcesConfig::default());
        assert_eq!(vpc.record.vpc_id, DEFAULT_VPC_ID);
        assert_eq!(vpc.total_subnet_count, 6);
        assert_eq!(vpc.public_subnet_count, 2);
        assert_eq!(vpc.private_subnet_count, 4);
        assert!(vpc.has_internet_gateway);
        assert!(!vpc.has_nat_gateway);

        let subnets = &vpc.record.subnets;
        assert_eq!(subnets[1].record.cidr_block, "10.0.2.0/24");
        assert_eq!(subnets[1].record.available_ip_address_count, Some(243));
        assert_eq!(subnets[3].record.name.as_deref(), Some("pri-sub-was-2"));
        assert_eq!(subnets[4].record.cidr_block, "10.0.5.0/24");
        assert_eq!(subnets[5].record.availability_zone, "ap-northeast-2b");
    }

    #[test]
    fn nat_gateways_only_when_configured() {
        let mut resources = ResourcesConfig::default();
        resources.vpc.nat_gateway_ids = vec!["nat-1".into()];
        let vpc = network(&resources);
        assert!(vpc.has_nat_gateway);
        assert_eq!(vpc.record.nat_gateways[0].record.subnet_id, DEFAULT_PUBLIC_SUBNETS[0]);
    }
}
