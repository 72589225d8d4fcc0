//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the effective configuration: file (if any), then environment
/// overrides, then validation of the merged result.
pub fn resolve_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply per-field overrides named after the original property keys
/// (`aws.resources.ec2.instance-ids` becomes `AWS_RESOURCES_EC2_INSTANCE_IDS`).
///
/// List values are comma separated. Values that fail to parse are logged and
/// leave the current setting untouched.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    set_parsed(&lookup, "DEMO_MODE_ENABLED", &mut config.demo.enabled);
    set_string(&lookup, "SERVER_BIND_ADDRESS", &mut config.listener.bind_address);
    if let Some(path) = lookup("INVENTORY_SNAPSHOT_PATH") {
        config.inventory.snapshot_path = Some(path.trim().to_string());
    }
    if let Some(path) = lookup("VOTES_PERSISTENCE_PATH") {
        config.votes.persistence_path = Some(path.trim().to_string());
    }

    let r = &mut config.resources;

    set_list(&lookup, "AWS_RESOURCES_EC2_INSTANCE_IDS", &mut r.ec2.instance_ids);
    set_list(&lookup, "AWS_RESOURCES_EC2_DETAILS_PUBLIC_IPS", &mut r.ec2.public_ips);
    set_list(&lookup, "AWS_RESOURCES_EC2_DETAILS_PRIVATE_IPS", &mut r.ec2.private_ips);
    set_list(
        &lookup,
        "AWS_RESOURCES_EC2_DETAILS_AVAILABILITY_ZONES",
        &mut r.ec2.availability_zones,
    );
    set_list(
        &lookup,
        "AWS_RESOURCES_EC2_DETAILS_INSTANCE_TYPES",
        &mut r.ec2.instance_types,
    );
    set_string(&lookup, "AWS_RESOURCES_EC2_DETAILS_AMI_ID", &mut r.ec2.ami_id);

    set_string(&lookup, "AWS_RESOURCES_ALB_DNS_NAME", &mut r.alb.dns_name);
    set_string(&lookup, "AWS_RESOURCES_ALB_ARN", &mut r.alb.arn);
    set_string(
        &lookup,
        "AWS_RESOURCES_ALB_TARGET_GROUP_NAME",
        &mut r.alb.target_group_name,
    );
    set_string(&lookup, "AWS_RESOURCES_ALB_LISTENER_ARN", &mut r.alb.listener_arn);
    set_list(
        &lookup,
        "AWS_RESOURCES_ALB_AVAILABILITY_ZONES",
        &mut r.alb.availability_zones,
    );

    set_string(&lookup, "AWS_RESOURCES_RDS_ENDPOINT", &mut r.rds.endpoint);
    set_parsed(&lookup, "AWS_RESOURCES_RDS_PORT", &mut r.rds.port);
    set_string(
        &lookup,
        "AWS_RESOURCES_RDS_INSTANCE_IDENTIFIER",
        &mut r.rds.instance_identifier,
    );
    set_string(&lookup, "AWS_RESOURCES_RDS_ENGINE", &mut r.rds.engine);
    set_string(&lookup, "AWS_RESOURCES_RDS_ENGINE_VERSION", &mut r.rds.engine_version);
    set_string(&lookup, "AWS_RESOURCES_RDS_INSTANCE_CLASS", &mut r.rds.instance_class);
    set_string(
        &lookup,
        "AWS_RESOURCES_RDS_AVAILABILITY_ZONE",
        &mut r.rds.availability_zone,
    );
    set_parsed(&lookup, "AWS_RESOURCES_RDS_MULTI_AZ", &mut r.rds.multi_az);

    set_string(&lookup, "AWS_RESOURCES_S3_BUCKET_NAME", &mut r.s3.bucket_name);
    set_string(&lookup, "AWS_RESOURCES_S3_REGION", &mut r.s3.region);
    set_string(
        &lookup,
        "AWS_RESOURCES_S3_WEBSITE_ENDPOINT",
        &mut r.s3.website_endpoint,
    );

    set_string(
        &lookup,
        "AWS_RESOURCES_CLOUDFRONT_DISTRIBUTION_ID",
        &mut r.cloudfront.distribution_id,
    );
    set_string(
        &lookup,
        "AWS_RESOURCES_CLOUDFRONT_DOMAIN_NAME",
        &mut r.cloudfront.domain_name,
    );
    set_string(&lookup, "AWS_RESOURCES_CLOUDFRONT_STATUS", &mut r.cloudfront.status);

    set_string(&lookup, "AWS_RESOURCES_VPC_VPC_ID", &mut r.vpc.vpc_id);
    set_string(&lookup, "AWS_RESOURCES_VPC_CIDR_BLOCK", &mut r.vpc.cidr_block);
    set_list(
        &lookup,
        "AWS_RESOURCES_VPC_PUBLIC_SUBNET_IDS",
        &mut r.vpc.public_subnet_ids,
    );
    set_list(
        &lookup,
        "AWS_RESOURCES_VPC_PRIVATE_SUBNET_IDS_WAS",
        &mut r.vpc.private_subnet_ids_was,
    );
    set_list(
        &lookup,
        "AWS_RESOURCES_VPC_PRIVATE_SUBNET_IDS_DB",
        &mut r.vpc.private_subnet_ids_db,
    );
    set_string(
        &lookup,
        "AWS_RESOURCES_VPC_INTERNET_GATEWAY_ID",
        &mut r.vpc.internet_gateway_id,
    );
    set_list(
        &lookup,
        "AWS_RESOURCES_VPC_NAT_GATEWAY_IDS",
        &mut r.vpc.nat_gateway_ids,
    );

    set_string(
        &lookup,
        "AWS_RESOURCES_SECURITY_GROUPS_ALB_ID",
        &mut r.security_groups.alb_id,
    );
    set_string(
        &lookup,
        "AWS_RESOURCES_SECURITY_GROUPS_WAS_ID",
        &mut r.security_groups.was_id,
    );
    set_string(
        &lookup,
        "AWS_RESOURCES_SECURITY_GROUPS_DB_ID",
        &mut r.security_groups.db_id,
    );
}

fn set_string<F>(lookup: &F, key: &str, target: &mut String)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(key) {
        *target = value.trim().to_string();
    }
}

fn set_list<F>(lookup: &F, key: &str, target: &mut Vec<String>)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(key) {
        *target = value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
    }
}

fn set_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = lookup(key) {
        match value.trim().parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(
                key = key,
                value = %value,
                "Ignoring unparseable environment override"
            ),
        }
    }
}
