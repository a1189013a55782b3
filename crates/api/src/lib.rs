//! ReelForge render backend.
//!
//! Accepts render requests, serves their frame data snapshots to the
//! screenshot renderer and reports job status. Exposed as a library so
//! integration tests and the binary entrypoint share the same pieces.

pub mod background;
pub mod config;
pub mod error;
pub mod frames;
pub mod handlers;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod runner;
pub mod state;
pub mod store;
