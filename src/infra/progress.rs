//! Display-only progress simulators for the dashboard's connect animation.

use serde::Serialize;

/// Delay below which the dashboard is still "connecting".
pub const CONNECT_THRESHOLD_MS: i64 = 3_000;

pub const DEPLOYMENT_STEPS: [&str; 9] = [
    "Create VPC",
    "Configure subnets",
    "Configure security groups",
    "Launch EC2 instances",
    "Configure ALB",
    "Create RDS",
    "Configure S3 bucket",
    "Deploy CloudFront",
    "Deploy application",
];

pub const STEP_DURATION_MS: u64 = 30_000;

/// How long ago the simulated deployment started.
pub const ASSUMED_ELAPSED_MS: u64 = 5 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub status: ConnectionState,
    pub message: String,
    pub progress: u32,
    pub timestamp: i64,
}

/// Connection state `delay_ms` after the dashboard started connecting.
pub fn connection_status(delay_ms: i64, timestamp: i64) -> ConnectionStatus {
    let delay = delay_ms.max(0);
    if delay < CONNECT_THRESHOLD_MS {
        ConnectionStatus {
            status: ConnectionState::Connecting,
            message: "Connecting to AWS resources...".to_string(),
            progress: (delay / 30).min(100) as u32,
            timestamp,
        }
    } else {
        ConnectionStatus {
            status: ConnectionState::Connected,
            message: "All resources connected successfully!".to_string(),
            progress: 100,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentState {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentProgress {
    pub total_steps: usize,
    /// 1-based.
    pub current_step: usize,
    pub current_step_name: &'static str,
    pub progress: usize,
    pub status: DeploymentState,
    /// Seconds.
    pub estimated_time_remaining: u64,
}

pub fn deployment_progress(elapsed_ms: u64) -> DeploymentProgress {
    let total = DEPLOYMENT_STEPS.len();
    let step = ((elapsed_ms / STEP_DURATION_MS) as usize).min(total - 1);
    let last = step == total - 1;

    DeploymentProgress {
        total_steps: total,
        current_step: step + 1,
        current_step_name: DEPLOYMENT_STEPS[step],
        progress: ((step + 1) * 100 / total).min(100),
        status: if last {
            DeploymentState::Completed
        } else {
            DeploymentState::InProgress
        },
        estimated_time_remaining: ((total - step - 1) as u64) * STEP_DURATION_MS / 1000,
    }
}
