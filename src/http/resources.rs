//! `/api/resources` handlers. None of these ever answer with an error status.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use crate::http::response::now_millis;
use crate::http::server::AppState;
use crate::infra::progress::{
    connection_status as simulate_connection, deployment_progress as simulate_deployment,
    ConnectionStatus, DeploymentProgress, ASSUMED_ELAPSED_MS,
};
use crate::infra::types::{Cdn, Database, Ec2Instance, LoadBalancer, Network, Storage};
use crate::infra::{HealthReport, InfrastructureStatus};

#[derive(Debug, Default, Deserialize)]
pub struct ConnectionQuery {
    #[serde(default)]
    pub delay: i64,
}

pub async fn status(State(state): State<AppState>) -> Json<InfrastructureStatus> {
    tracing::info!("Infrastructure status requested");
    Json(state.aggregator().status().await)
}

/// A missing or unparsable `delay` counts as 0.
pub async fn connection_status(
    query: Result<Query<ConnectionQuery>, QueryRejection>,
) -> Json<ConnectionStatus> {
    let delay = query.map(|Query(q)| q.delay).unwrap_or_default();
    Json(simulate_connection(delay, now_millis()))
}

pub async fn ec2(State(state): State<AppState>) -> Json<Vec<Ec2Instance>> {
    Json(state.aggregator().ec2_instances().await)
}

pub async fn alb(State(state): State<AppState>) -> Json<Option<LoadBalancer>> {
    Json(state.aggregator().load_balancer().await)
}

pub async fn rds(State(state): State<AppState>) -> Json<Option<Database>> {
    Json(state.aggregator().database().await)
}

pub async fn s3(State(state): State<AppState>) -> Json<Option<Storage>> {
    Json(state.aggregator().storage().await)
}

pub async fn cloudfront(State(state): State<AppState>) -> Json<Option<Cdn>> {
    Json(state.aggregator().cdn().await)
}

pub async fn vpc(State(state): State<AppState>) -> Json<Option<Network>> {
    Json(state.aggregator().network().await)
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.aggregator().health().await)
}

pub async fn deployment_progress() -> Json<DeploymentProgress> {
    Json(simulate_deployment(ASSUMED_ELAPSED_MS))
}
