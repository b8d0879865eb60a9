//! HTTP client for the configuration service

pub mod client;

pub use client::{ConfigHttpClient, ConfigHttpClientBuilder};
