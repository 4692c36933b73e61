//! paramsweep - one-parameter-at-a-time HTTP parameter fuzzer
//!
//! Varies a single path, query, header or cookie parameter per request
//! against a fixed baseline and dispatches the requests through a bounded
//! worker pool.

pub mod app;
pub mod error;
pub mod fuzzer;
pub mod http;

pub use error::*;
