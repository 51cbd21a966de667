//! Built-in catalog of robots that can be referenced into the stage.

use serde::Serialize;
use thiserror::Error;

const ASSET_ROOT: &str =
    "https://omniverse-content-production.s3-us-west-2.amazonaws.com/Assets/Isaac/4.5/Isaac/Robots";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotCategory {
    Manipulator,
    Mobile,
    Humanoid,
}

impl std::fmt::Display for RobotCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RobotCategory::Manipulator => write!(f, "manipulator"),
            RobotCategory::Mobile => write!(f, "mobile"),
            RobotCategory::Humanoid => write!(f, "humanoid"),
        }
    }
}

/// A robot asset together with the prim it is mounted at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotSpec {
    pub key: &'static str,
    pub name: &'static str,
    /// Path of the USD asset relative to the Isaac robots bucket.
    asset: &'static str,
    pub prim_path: &'static str,
    pub description: &'static str,
    pub category: RobotCategory,
}

impl RobotSpec {
    pub fn usd_path(&self) -> String {
        format!("{}/{}", ASSET_ROOT, self.asset)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RobotError {
    #[error("Robot '{name}' not found. Available robots: {}", available.join(", "))]
    Unknown {
        name: String,
        available: Vec<&'static str>,
    },
}

static CATALOG: &[RobotSpec] = &[
    RobotSpec {
        key: "franka",
        name: "Franka Emika Panda",
        asset: "Franka/franka.usd",
        prim_path: "/World/Franka",
        description: "7-DOF robotic arm with parallel gripper",
        category: RobotCategory::Manipulator,
    },
    RobotSpec {
        key: "ur5",
        name: "Universal Robots UR5",
        asset: "UniversalRobots/ur5/ur5.usd",
        prim_path: "/World/UR5",
        description: "6-DOF collaborative robot arm",
        category: RobotCategory::Manipulator,
    },
    RobotSpec {
        key: "kinova",
        name: "Kinova Gen3",
        asset: "Kinova/Gen3/gen3n7_instanceable.usd",
        prim_path: "/World/Kinova",
        description: "7-DOF lightweight robotic arm",
        category: RobotCategory::Manipulator,
    },
    RobotSpec {
        key: "flexiv",
        name: "Flexiv Rizon 4",
        asset: "Flexiv/Rizon4/flexiv_rizon4.usd",
        prim_path: "/World/FlexivRizon4",
        description: "7-DOF adaptive robotic arm",
        category: RobotCategory::Manipulator,
    },
    RobotSpec {
        key: "carter",
        name: "NVIDIA Carter",
        asset: "Carter/carter_v1.usd",
        prim_path: "/World/Carter",
        description: "Differential drive mobile robot",
        category: RobotCategory::Mobile,
    },
    RobotSpec {
        key: "jetbot",
        name: "NVIDIA JetBot",
        asset: "Jetbot/jetbot.usd",
        prim_path: "/World/JetBot",
        description: "Educational AI robot platform",
        category: RobotCategory::Mobile,
    },
    RobotSpec {
        key: "digit",
        name: "Agility Robotics Digit",
        asset: "Agility/Digit/digit_v4.usd",
        prim_path: "/World/Digit",
        description: "Bipedal humanoid robot",
        category: RobotCategory::Humanoid,
    },
];

pub fn all() -> &'static [RobotSpec] {
    CATALOG
}

pub fn keys() -> Vec<&'static str> {
    CATALOG.iter().map(|spec| spec.key).collect()
}

/// Resolve a robot by its catalog key, ignoring case and surrounding whitespace.
pub fn lookup(name: &str) -> Result<&'static RobotSpec, RobotError> {
    let wanted = name.trim().to_lowercase();
    CATALOG
        .iter()
        .find(|spec| spec.key == wanted)
        .ok_or_else(|| RobotError::Unknown {
            name: wanted,
            available: keys(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let spec = lookup("  Franka ").unwrap();
        assert_eq!(spec.key, "franka");
        assert_eq!(spec.name, "Franka Emika Panda");
        assert_eq!(lookup("UR5").unwrap().prim_path, "/World/UR5");
    }

    #[test]
    fn test_unknown_robot_lists_available() {
        let err = lookup("atlas").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Robot 'atlas' not found"));
        assert!(message.contains("franka, ur5, kinova, flexiv, carter, jetbot, digit"));
    }

    #[test]
    fn test_catalog_invariants() {
        let mut seen = HashSet::new();
        for spec in all() {
            assert!(!spec.key.is_empty());
            assert_eq!(spec.key, spec.key.to_lowercase());
            assert!(seen.insert(spec.key), "duplicate key {}", spec.key);
            assert!(spec.prim_path.starts_with("/World/"));
            assert!(spec.usd_path().starts_with("https://"));
            assert!(spec.usd_path().ends_with(".usd"));
        }
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn test_usd_path_uses_asset_root() {
        let spec = lookup("jetbot").unwrap();
        assert_eq!(
            spec.usd_path(),
            "https://omniverse-content-production.s3-us-west-2.amazonaws.com/Assets/Isaac/4.5/Isaac/Robots/Jetbot/jetbot.usd"
        );
        assert_eq!(spec.category, RobotCategory::Mobile);
    }
}
