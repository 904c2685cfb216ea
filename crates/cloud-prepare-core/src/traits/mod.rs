//! Core traits for cloud preparation
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`Cloud`]: Prepare and clean up a cloud's networking for Submariner
//! - [`Reporter`]: Receive progress of a running operation

pub mod cloud;
pub mod reporter;

pub use cloud::{Cloud, CloudFactory};
pub use reporter::{ReportResult, Reporter};
