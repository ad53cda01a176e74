//! MCP (Model Context Protocol) server for Panaride ride-hailing operations.
//!
//! This crate exposes the ride-hailing domain tools (driver search, fare
//! quoting, distance/ETA, ride lifecycle, driver statistics) to AI assistants
//! via the Model Context Protocol.
//!
//! # Architecture
//!
//! - `server`: server state, tool catalog, and dispatch
//! - `tools`: tool implementations backed by `panaride-lib`
//! - `types`: serializable tool inputs (with JSON Schema) and outputs
//! - `rpc`: JSON-RPC 2.0 stdio transport
//! - `error`: serializable error type for tool failures
//!
//! # Transport
//!
//! The server communicates via stdio using line-delimited JSON-RPC 2.0
//! messages. All logging is redirected to stderr to prevent stdout protocol
//! corruption.

pub mod error;
pub mod rpc;
pub mod server;
pub mod tools;
pub mod types;

pub use error::{Error, Result};
pub use server::{tool_catalog, tool_names, ServerState};
