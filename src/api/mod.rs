//! API Module
//!
//! HTTP handlers and routing for the document store REST API.
//!
//! # Endpoints
//! - `PUT /namespaces/:name` - Create a namespace
//! - `GET /namespaces/:name` - Read a namespace document
//! - `POST /namespaces/:name/records` - Append a record
//! - `GET /namespaces/:name/tables/:table/terms/:term` - Probe a cached term
//! - `GET /namespaces/:name/summary` - Account and record counts
//! - `GET /accounts/:email` - Look up an account
//! - `PUT /home/:section` - Save a home page section
//! - `GET /search/:term` - Cache-aside metadata search
//! - `GET /stats` - Store statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
