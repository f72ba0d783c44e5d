//! REST API server: search, session control, listings and OpenAPI docs.

pub mod auth;
pub mod dto;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;
