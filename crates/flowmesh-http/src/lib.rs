//! # Flowmesh HTTP
//!
//! Thin axum adapter over [`flowmesh_core::FlowEngine`].
//!
//! | Route | Method | Result |
//! |---|---|---|
//! | `/upload` | POST | install the configuration in the body, return the topology |
//! | `/publish?topic=&message=` | GET, POST | publish a value, return the topic listing |
//! | `/graph-data` | GET | topology of the running graph, 404 before any upload |
//! | `/topics` | GET | topic listing |
//! | `/health` | GET | liveness |
//!
//! Configuration errors answer 400 with an [`ErrorResponse`] body.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use config::{ConfigError, HttpServerConfig, HttpServerConfigBuilder};
pub use error::{ApiError, ErrorResponse};
pub use router::{AppState, router};
pub use server::{ServerError, serve, shutdown_signal};
