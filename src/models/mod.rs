//! Request and Response models for the document store API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{AppendRequest, HomeSectionRequest, SearchQuery};
pub use responses::{
    AppendResponse, CachedTermResponse, ErrorResponse, HealthResponse, NamespaceResponse,
    SearchResponse, StatsResponse,
};
