// # cloud-prepare-core
//
// Core library for preparing cloud networking so Submariner can run on a
// cluster, and for reverting those changes.
//
// ## Architecture Overview
//
// - **Cloud**: Trait for a cloud's prepare/cleanup operations
// - **Reporter**: Trait receiving progress of an operation
// - **PortSpec / PrepareForSubmarinerInput**: What needs opening
// - **CloudRegistry**: Plugin-based registry for cloud implementations
// - **PrepareConfig**: Serializable configuration for the binary and embedders
//
// ## Design Principles
//
// 1. **Thin contract**: A cloud is two operations plus a progress sink
// 2. **Idempotency**: Every operation can be re-run safely
// 3. **Plugin-Based**: Clouds are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All functionality can be used as a library

pub mod config;
pub mod error;
pub mod ports;
pub mod registry;
pub mod reporter;
pub mod traits;

// Re-export core types for convenience
pub use config::{CloudConfig, OperationConfig, PrepareConfig};
pub use error::{Error, Result};
pub use ports::{PortSpec, PrepareForSubmarinerInput, Protocol, format_ports};
pub use registry::CloudRegistry;
pub use reporter::{RecordingReporter, ReportEvent, TracingReporter};
pub use traits::{Cloud, CloudFactory, ReportResult, Reporter};
