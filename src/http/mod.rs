//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, middleware stack)
//!     → request.rs (request id set and echoed)
//!     → resources.rs / votes.rs (handlers)
//!     → response.rs (expected failures become 200 + error body)
//!     → Send to client
//! ```

pub mod request;
pub mod resources;
pub mod response;
pub mod server;
pub mod votes;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::ErrorBody;
pub use server::{AppState, HttpServer};
