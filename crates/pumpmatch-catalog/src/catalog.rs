use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::info;

use crate::ids::DeviceId;
use crate::types::{CatalogData, Device, Dimension};

/// Errors from catalog loading and validation.
///
/// This is the only fatal error class in the engine: a catalog that fails
/// validation blocks the engine from serving any request.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog source failed: {0}")]
    Source(String),

    #[error("catalog JSON is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("catalog has no devices")]
    NoDevices,

    #[error("catalog has no dimensions")]
    NoDimensions,

    #[error("duplicate device id: {0}")]
    DuplicateDevice(DeviceId),

    #[error("duplicate dimension number: {0}")]
    DuplicateDimension(u8),

    #[error("dimension {dimension} has no detail entry for device {device}")]
    MissingDetail { dimension: u8, device: DeviceId },

    #[error("dimension {dimension} has a detail entry for unknown device {device}")]
    OrphanDetail { dimension: u8, device: DeviceId },
}

/// Read interface to the catalog data source.
///
/// The catalog is populated by an out-of-scope administration subsystem;
/// the engine only ever consumes it through this seam.
pub trait CatalogSource: Send + Sync {
    fn fetch(&self) -> Result<CatalogData, CatalogError>;
}

/// A source backed by a JSON document (e.g. an exported catalog snapshot).
pub struct JsonSource {
    json: String,
}

impl JsonSource {
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

impl CatalogSource for JsonSource {
    fn fetch(&self) -> Result<CatalogData, CatalogError> {
        Ok(serde_json::from_str(&self.json)?)
    }
}

/// Validated, immutable catalog view.
///
/// `devices()` returns devices in the fixed order the source declared
/// them. That order is the canonical tie-break: when two devices end a
/// scoring run with equal final scores, the one earlier in this list wins.
#[derive(Debug)]
pub struct Catalog {
    devices: Vec<Device>,
    dimensions: BTreeMap<u8, Dimension>,
}

impl Catalog {
    /// Load and validate catalog data from a source.
    ///
    /// Validates uniqueness of device ids and dimension numbers and
    /// completeness of the device × dimension detail matrix. Any violation
    /// is fatal.
    pub fn load(source: &dyn CatalogSource) -> Result<Self, CatalogError> {
        let data = source.fetch()?;

        if data.devices.is_empty() {
            return Err(CatalogError::NoDevices);
        }
        if data.dimensions.is_empty() {
            return Err(CatalogError::NoDimensions);
        }

        let mut seen_devices = BTreeSet::new();
        for device in &data.devices {
            if !seen_devices.insert(device.id.clone()) {
                return Err(CatalogError::DuplicateDevice(device.id.clone()));
            }
        }

        let mut dimensions = BTreeMap::new();
        for dimension in data.dimensions {
            // Detail matrix must be exactly the active device set.
            for device in &data.devices {
                if !dimension.details.contains_key(&device.id) {
                    return Err(CatalogError::MissingDetail {
                        dimension: dimension.number,
                        device: device.id.clone(),
                    });
                }
            }
            for device_id in dimension.details.keys() {
                if !seen_devices.contains(device_id) {
                    return Err(CatalogError::OrphanDetail {
                        dimension: dimension.number,
                        device: device_id.clone(),
                    });
                }
            }

            if dimensions.insert(dimension.number, dimension.clone()).is_some() {
                return Err(CatalogError::DuplicateDimension(dimension.number));
            }
        }

        info!(
            devices = data.devices.len(),
            dimensions = dimensions.len(),
            "Catalog loaded and validated"
        );

        Ok(Self {
            devices: data.devices,
            dimensions,
        })
    }

    /// Devices in canonical order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Device ids in canonical order.
    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.iter().map(|d| d.id.clone()).collect()
    }

    /// Look up a device by id.
    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| &d.id == id)
    }

    /// Position of a device in the canonical order (used for tie-breaks).
    pub fn device_rank(&self, id: &DeviceId) -> Option<usize> {
        self.devices.iter().position(|d| &d.id == id)
    }

    /// Look up a dimension by number.
    pub fn dimension(&self, number: u8) -> Option<&Dimension> {
        self.dimensions.get(&number)
    }

    /// All dimensions, ordered by number.
    pub fn dimensions(&self) -> impl Iterator<Item = &Dimension> {
        self.dimensions.values()
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }
}
