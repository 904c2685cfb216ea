//! Plugin-based cloud registry
//!
//! The registry allows cloud implementations to be registered dynamically at
//! runtime, avoiding hardcoded if-else chains in the binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cloud_prepare_core::CloudRegistry;
//!
//! let registry = CloudRegistry::new();
//! cloud_prepare_azure::register(&registry);
//!
//! let cloud = registry.create_cloud(&config)?;
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::config::PrepareConfig;
use crate::error::{Error, Result};
use crate::traits::{Cloud, CloudFactory};

/// Registry of cloud factories keyed by type name
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct CloudRegistry {
    clouds: RwLock<HashMap<String, Box<dyn CloudFactory>>>,
}

impl CloudRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cloud factory
    ///
    /// # Parameters
    ///
    /// - `name`: Cloud type name (e.g., "azure")
    /// - `factory`: Factory object for creating cloud instances
    pub fn register_cloud(&self, name: impl Into<String>, factory: Box<dyn CloudFactory>) {
        let name = name.into();
        tracing::debug!("Registering cloud type: {}", name);
        self.clouds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, factory);
    }

    /// Create a cloud from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn Cloud>)`: Created cloud instance
    /// - `Err(Error)`: If the cloud type is not registered or creation fails
    pub fn create_cloud(&self, config: &PrepareConfig) -> Result<Box<dyn Cloud>> {
        let cloud_type = config.cloud.type_name();
        let clouds = self.clouds.read().unwrap_or_else(PoisonError::into_inner);

        let factory = clouds
            .get(cloud_type)
            .ok_or_else(|| Error::config(format!("Unknown cloud type: {}", cloud_type)))?;

        factory.create(config)
    }

    /// List all registered cloud types
    pub fn list_clouds(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .clouds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Check if a cloud type is registered
    pub fn has_cloud(&self, name: &str) -> bool {
        self.clouds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
