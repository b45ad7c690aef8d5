//! Name-to-group lookup shared by the HTTP server and the application.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::{CacheError, ConfigError};
use crate::group::Group;

/// Registry of groups, owned by whoever assembles the node.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl GroupRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `group` under its name.
    ///
    /// Names are unique: registering a second group with the same name fails
    /// with [`ConfigError::DuplicateGroup`] and leaves the first one in place.
    pub fn register(&self, group: Group) -> Result<Arc<Group>, ConfigError> {
        let mut groups = self.groups.write().unwrap_or_else(PoisonError::into_inner);
        if groups.contains_key(group.name()) {
            return Err(ConfigError::DuplicateGroup(group.name().to_owned()));
        }
        debug!(group = group.name(), "registering group");
        let group = Arc::new(group);
        groups.insert(group.name().to_owned(), Arc::clone(&group));
        Ok(group)
    }

    /// Returns the group registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<Group>> {
        self.groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Like [`get`](Self::get), but reports an unknown name as [`CacheError::UnknownGroup`].
    pub fn require(&self, name: &str) -> Result<Arc<Group>, CacheError> {
        self.get(name)
            .ok_or_else(|| CacheError::UnknownGroup(name.to_owned()))
    }

    /// Names of all registered groups, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .groups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort_unstable();
        names
    }
}
