// Copyright (c) 2025 - Cowboy AI, Inc.
//! Virtualization Catalog
//!
//! Images, flavors and disk sizes cannot be derived from the deployment
//! model, so they come from a separate catalog. Every lookup is an ordered
//! list of keys tried against one table, first hit wins.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::topology::ServerClass;

/// Catch-all key of the image and disk tables
pub const DEFAULT_KEY: &str = "default";

/// Size of the volumes of a disk model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiskSize {
    /// Same size for every volume
    Uniform(u64),
    /// Size per volume name, with an optional `default` entry
    PerVolume(IndexMap<String, u64>),
}

impl DiskSize {
    pub fn for_volume(&self, volume: &str) -> Option<u64> {
        match self {
            DiskSize::Uniform(size) => Some(*size),
            DiskSize::PerVolume(sizes) => first_match(sizes, &[volume, DEFAULT_KEY]).copied(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtConfig {
    /// server id / role name / `default` → distro id → image
    pub images: IndexMap<String, IndexMap<String, String>>,
    /// server id / role name / class default key → flavor
    pub flavors: IndexMap<String, String>,
    /// disk model name / `default` → size
    pub disks: IndexMap<String, DiskSize>,
    /// Components a lifecycle-manager-only service group may host
    pub clm_service_components: IndexSet<String>,
    pub default_distro_id: String,
}

/// Value of the first key present in `table`
pub fn first_match<'a, V>(table: &'a IndexMap<String, V>, keys: &[&str]) -> Option<&'a V> {
    keys.iter().find_map(|key| table.get(*key))
}

impl VirtConfig {
    /// Image for a server: server id, then role name, then `default`
    ///
    /// A key only matches when it carries an image for the distro.
    pub fn image_for(&self, server_id: &str, role: &str, distro: &str) -> Option<&str> {
        [server_id, role, DEFAULT_KEY]
            .into_iter()
            .filter_map(|key| self.images.get(key))
            .find_map(|by_distro| by_distro.get(distro))
            .map(String::as_str)
    }

    /// Flavor configured for the server id, then the role name
    pub fn explicit_flavor(&self, server_id: &str, role: &str) -> Option<&str> {
        first_match(&self.flavors, &[server_id, role]).map(String::as_str)
    }

    /// Default flavor of a server class
    pub fn class_flavor(&self, class: ServerClass) -> Option<&str> {
        self.flavors
            .get(class.default_flavor_key())
            .map(String::as_str)
    }

    /// Volume size: disk model entry, then the global `default` entry
    pub fn disk_size(&self, disk_model: &str, volume: &str) -> Option<u64> {
        first_match(&self.disks, &[disk_model, DEFAULT_KEY])
            .and_then(|size| size.for_volume(volume))
            .or_else(|| self.disks.get(DEFAULT_KEY)?.for_volume(volume))
    }

    pub fn is_clm_component(&self, component: &str) -> bool {
        self.clm_service_components.contains(component)
    }

    /// Distro a server boots, falling back to the catalog default
    pub fn distro_for<'a>(&'a self, distro_id: Option<&'a str>) -> &'a str {
        distro_id.unwrap_or(&self.default_distro_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> VirtConfig {
        serde_json::from_value(json!({
            "images": {
                "default": {"sles12sp3": "cloud-sles12sp3"},
                "COMPUTE-ROLE": {"rhel73": "cloud-rhel73"},
                "compute3": {"sles12sp3": "special-image"}
            },
            "flavors": {
                "CONTROLLER-ROLE": "cloud-large",
                "compute3": "cloud-xlarge",
                "default_compute_flavor": "cloud-compute",
                "default_controller_flavor": "cloud-controller",
                "default_clm_flavor": "cloud-clm"
            },
            "disks": {
                "default": 20,
                "CONTROLLER-DISKS": {"vdb": 50, "default": 30},
                "COMPUTE-DISKS": {"vdc": 60},
                "LARGE-DISKS": 100
            },
            "clm_service_components": ["lifecycle-manager", "ntp-client"],
            "default_distro_id": "sles12sp3"
        }))
        .unwrap()
    }

    #[test]
    fn test_image_fallback() {
        let virt = catalog();
        assert_eq!(virt.image_for("compute3", "COMPUTE-ROLE", "sles12sp3"), Some("special-image"));
        assert_eq!(virt.image_for("compute1", "COMPUTE-ROLE", "rhel73"), Some("cloud-rhel73"));
        assert_eq!(virt.image_for("compute1", "COMPUTE-ROLE", "sles12sp3"), Some("cloud-sles12sp3"));
        assert_eq!(virt.image_for("compute1", "COMPUTE-ROLE", "centos"), None);
    }

    #[test]
    fn test_flavor_lookup() {
        let virt = catalog();
        assert_eq!(virt.explicit_flavor("compute3", "COMPUTE-ROLE"), Some("cloud-xlarge"));
        assert_eq!(virt.explicit_flavor("controller1", "CONTROLLER-ROLE"), Some("cloud-large"));
        assert_eq!(virt.explicit_flavor("compute1", "COMPUTE-ROLE"), None);
        assert_eq!(virt.class_flavor(ServerClass::Compute), Some("cloud-compute"));
        assert_eq!(virt.class_flavor(ServerClass::LifecycleManager), Some("cloud-clm"));
    }

    #[test]
    fn test_disk_size_fallback() {
        let virt = catalog();
        assert_eq!(virt.disk_size("CONTROLLER-DISKS", "vdb"), Some(50));
        assert_eq!(virt.disk_size("CONTROLLER-DISKS", "vdc"), Some(30));
        assert_eq!(virt.disk_size("COMPUTE-DISKS", "vdc"), Some(60));
        assert_eq!(virt.disk_size("COMPUTE-DISKS", "vdb"), Some(20));
        assert_eq!(virt.disk_size("LARGE-DISKS", "vdb"), Some(100));
        assert_eq!(virt.disk_size("OTHER-DISKS", "vdb"), Some(20));
    }

    #[test]
    fn test_missing_sections_fail() {
        let result: Result<VirtConfig, _> = serde_json::from_value(json!({"images": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_distro_fallback() {
        let virt = catalog();
        assert_eq!(virt.distro_for(None), "sles12sp3");
        assert_eq!(virt.distro_for(Some("rhel73")), "rhel73");
    }
}
