//! Application configuration

mod config;

pub use config::{Config, GeneratorSpec, HttpConfig, ParameterList};
