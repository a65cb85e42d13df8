//! Node name → VM lookup.

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::types::ResourceMapping;

/// Read-only set of configured node mappings.
///
/// Node names are unique; duplicates are rejected at construction.
#[derive(Debug, Clone, Default)]
pub struct ResourceMapper {
    mappings: Vec<ResourceMapping>,
}

impl ResourceMapper {
    /// Build a mapper, failing on duplicate node names.
    pub fn new(mappings: Vec<ResourceMapping>) -> ConfigResult<Self> {
        for (i, m) in mappings.iter().enumerate() {
            if mappings[..i].iter().any(|prev| prev.node_name == m.node_name) {
                return Err(ConfigError::DuplicateMapping(m.node_name.clone()));
            }
        }
        debug!(count = mappings.len(), "node mappings loaded");
        Ok(Self { mappings })
    }

    /// Find the mapping for a node. Matching is exact and case-sensitive.
    ///
    /// `None` is a normal outcome: the node simply has no VM to act on.
    pub fn find(&self, node_name: &str) -> Option<&ResourceMapping> {
        self.mappings.iter().find(|m| m.node_name == node_name)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> ResourceMapper {
        ResourceMapper::new(vec![
            ResourceMapping::new("w1", "pve1", 101),
            ResourceMapping::new("w2", "pve2", 102),
        ])
        .unwrap()
    }

    #[test]
    fn find_existing() {
        let m = mapper();
        let found = m.find("w2").unwrap();
        assert_eq!(found.host, "pve2");
        assert_eq!(found.vmid, 102);
    }

    #[test]
    fn find_missing_is_none() {
        assert!(mapper().find("w9").is_none());
    }

    #[test]
    fn find_is_case_sensitive() {
        assert!(mapper().find("W1").is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = ResourceMapper::new(vec![
            ResourceMapping::new("w1", "pve1", 101),
            ResourceMapping::new("w1", "pve2", 201),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateMapping(name) if name == "w1"));
    }

    #[test]
    fn empty_mapper() {
        let m = ResourceMapper::new(vec![]).unwrap();
        assert!(m.is_empty());
        assert!(m.find("w1").is_none());
    }
}
