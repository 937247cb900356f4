use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::DeviceId;

/// One candidate pump system being scored.
///
/// Immutable reference data; loaded once and shared read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub display_name: String,
}

/// One of the fixed comparison axes across candidate devices.
///
/// `details` maps every active device to the attribute text describing how
/// that device behaves along this dimension. Completeness of this map is
/// enforced at catalog load time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// Unique dimension number (1-based).
    pub number: u8,
    pub name: String,
    pub description: String,
    pub category: String,
    pub details: BTreeMap<DeviceId, String>,
}

impl Dimension {
    /// Detail text for one device, if present.
    pub fn detail(&self, device: &DeviceId) -> Option<&str> {
        self.details.get(device).map(String::as_str)
    }
}

/// Raw catalog payload as produced by a [`CatalogSource`](crate::CatalogSource).
///
/// Device order in `devices` is preserved through validation and becomes
/// the canonical tie-break order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogData {
    pub devices: Vec<Device>,
    pub dimensions: Vec<Dimension>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_detail_lookup() {
        let mut details = BTreeMap::new();
        details.insert(DeviceId::new("a"), "tubeless pod".to_string());

        let dim = Dimension {
            number: 3,
            name: "Tubing style".into(),
            description: "Tubed vs tubeless wear".into(),
            category: "Wear".into(),
            details,
        };

        assert_eq!(dim.detail(&DeviceId::new("a")), Some("tubeless pod"));
        assert_eq!(dim.detail(&DeviceId::new("b")), None);
    }
}
