//! # maas-core
//!
//! Core types and utilities for talking to a MAAS region controller.
//!
//! This crate provides the error taxonomy, request parameter builder, HTTP
//! transport and configuration shared by the typed MAAS API client.
//!
//! ## Modules
//!
//! - [`error`] - Error types and per-operation HTTP status mapping
//! - [`query`] - Ordered multi-valued request parameters
//! - [`client`] - HTTP client tuning and retry policy
//! - [`config`] - Validated client configuration
//! - [`transport`] - The `ControllerInterface` contract and its reqwest implementation

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod transport;

// Re-export commonly used types
pub use config::MaasClientConfig;
pub use error::{Error, ErrorKind, Result, ServerError, StatusPolicy};
pub use query::QueryParams;
pub use transport::{ControllerInterface, HttpController, HttpControllerBuilder};
