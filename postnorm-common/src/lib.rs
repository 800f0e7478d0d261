//! # postnorm common library
//!
//! Shared code for the postnorm service and tools:
//! - Error taxonomy
//! - Configuration loading
//! - Mapping registry (allow-list, registry document, cache)
//! - Field-mapping normalizer
//! - Normalization pipeline

pub mod config;
pub mod error;
pub mod normalizer;
pub mod registry;
pub mod service;

pub use error::{Error, ErrorKind, Result};
pub use normalizer::{normalize, NormalizedRecord, RawRecord};
pub use registry::{FieldMapping, PlatformConfig, Registry, RegistrySource};
pub use service::PostService;
