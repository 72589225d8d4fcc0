//! Infrastructure Dashboard Backend
//!
//! Reports the health of a small AWS deployment (compute, load balancer,
//! database, bucket, CDN and network) and hosts a poll/voting feature, both
//! behind one JSON API.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http (router, CORS, request id, trace, metrics)
//!                  │
//!                  ├──▶ infra    aggregator ──▶ demo generators
//!                  │                        └─▶ CloudInventory (live)
//!                  │
//!                  └──▶ voting   VoteService ──▶ PollStore (DashMap + JSON file)
//!
//!     Cross-cutting: config (TOML + env + hot reload), observability,
//!                    lifecycle (startup, signals, shutdown)
//! ```

pub mod config;
pub mod http;
pub mod infra;
pub mod lifecycle;
pub mod observability;
pub mod voting;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
