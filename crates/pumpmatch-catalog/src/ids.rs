use serde::{Deserialize, Serialize};

/// Strong typed IDs used throughout PumpMatch.

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dev:{}", self.0)
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "feat:{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        let dev = DeviceId::new("omnipod5");
        assert_eq!(format!("{}", dev), "dev:omnipod5");

        let feat = FeatureId::new("tubeless-design");
        assert_eq!(format!("{}", feat), "feat:tubeless-design");
    }

    #[test]
    fn device_id_serialization() {
        let id = DeviceId::new("mobi");
        let json = serde_json::to_string(&id).unwrap();
        let restored: DeviceId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
