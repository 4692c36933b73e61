//! HTTP module
//!
//! Request descriptors, the builder that produces them, and the client
//! that executes them.

mod client;
mod request;
mod response;

pub use client::{HttpClient, RequestExecutor};
pub use request::{Cookie, FuzzRequest, RequestTemplate};
pub use response::Response;
