// Copyright (c) 2025 - Cowboy AI, Inc.
//! Volume Layout per Disk Model

use std::collections::BTreeSet;
use tracing::debug;

use crate::domain::DiskModel;
use crate::errors::{TopologyError, TopologyResult};
use crate::topology::{VirtualDiskModel, Volume};
use crate::virt_config::VirtConfig;

/// Device holding the root file system, provided by the image itself
pub const ROOT_DEVICE: &str = "/dev/sda_root";

const LEGACY_DEVICE_PREFIX: &str = "/dev/sd";
const VIRTUAL_DEVICE_PREFIX: &str = "/dev/vd";
const DEVICE_DIR: &str = "/dev/";

/// Every device a disk model uses, deduplicated and sorted
pub fn disk_devices(disk_model: &DiskModel) -> BTreeSet<&str> {
    disk_model
        .volume_groups
        .iter()
        .flat_map(|group| group.physical_volumes.iter().map(String::as_str))
        .chain(
            disk_model
                .device_groups
                .iter()
                .flat_map(|group| group.devices.iter().map(|device| device.name.as_str())),
        )
        .collect()
}

/// Device path as seen by a virtual machine
pub fn virtual_device(device: &str) -> String {
    match device.strip_prefix(LEGACY_DEVICE_PREFIX) {
        Some(rest) => format!("{VIRTUAL_DEVICE_PREFIX}{rest}"),
        None => device.to_string(),
    }
}

/// Build one volume per device of a disk model
pub fn build_disk_model(
    disk_model: &DiskModel,
    virt: &VirtConfig,
) -> TopologyResult<VirtualDiskModel> {
    let mut volumes = Vec::new();

    for device in disk_devices(disk_model) {
        if device == ROOT_DEVICE {
            continue;
        }
        let mountpoint = virtual_device(device);
        let name = mountpoint
            .strip_prefix(DEVICE_DIR)
            .unwrap_or(&mountpoint)
            .to_string();
        let size = virt.disk_size(&disk_model.name, &name).ok_or_else(|| {
            TopologyError::MissingDiskSize {
                disk_model: disk_model.name.clone(),
                volume: name.clone(),
            }
        })?;

        debug!("Disk model {}: volume {} ({})", disk_model.name, name, size);
        volumes.push(Volume {
            name,
            mountpoint,
            size,
        });
    }

    Ok(VirtualDiskModel {
        name: disk_model.name.clone(),
        volumes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Device, DeviceGroup, VolumeGroup};
    use crate::virt_config::DiskSize;
    use pretty_assertions::assert_eq;

    fn disk_model() -> DiskModel {
        DiskModel {
            name: "CONTROLLER-DISKS".to_string(),
            volume_groups: vec![VolumeGroup {
                name: "ardana-vg".to_string(),
                physical_volumes: vec!["/dev/sda_root".to_string(), "/dev/sdb".to_string()],
            }],
            device_groups: vec![DeviceGroup {
                name: "swift".to_string(),
                devices: vec![
                    Device {
                        name: "/dev/sdc".to_string(),
                    },
                    Device {
                        name: "/dev/sdb".to_string(),
                    },
                ],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_virtual_device() {
        assert_eq!(virtual_device("/dev/sdb"), "/dev/vdb");
        assert_eq!(virtual_device("/dev/vdb"), "/dev/vdb");
    }

    #[test]
    fn test_build_disk_model() {
        let mut virt = VirtConfig::default();
        virt.disks.insert("default".to_string(), DiskSize::Uniform(20));
        virt.disks.insert(
            "CONTROLLER-DISKS".to_string(),
            DiskSize::PerVolume([("vdc".to_string(), 50)].into_iter().collect()),
        );

        let built = build_disk_model(&disk_model(), &virt).unwrap();

        assert_eq!(
            built.volumes,
            vec![
                Volume {
                    name: "vdb".to_string(),
                    mountpoint: "/dev/vdb".to_string(),
                    size: 20,
                },
                Volume {
                    name: "vdc".to_string(),
                    mountpoint: "/dev/vdc".to_string(),
                    size: 50,
                },
            ]
        );
    }

    #[test]
    fn test_missing_disk_size() {
        let err = build_disk_model(&disk_model(), &VirtConfig::default()).unwrap_err();
        assert!(matches!(err, TopologyError::MissingDiskSize { volume, .. } if volume == "vdb"));
    }
}
