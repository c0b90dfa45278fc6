//! Service Layer
//!
//! Business logic behind the route handlers. Handlers stay thin: they
//! extract the request, call a service, and map the result to a response.

mod ingest_service;

pub use ingest_service::*;
