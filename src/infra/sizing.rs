//! Node size tiers and their static instance-type and capacity tables.

use std::fmt;

/// Maximum node count when the size tier is not one of the known ones.
pub const DEFAULT_MAX_CAPACITY: u32 = 4;

/// Size tier of a node group as written in the config file.
///
/// Unknown tiers are kept as [`NodeSize::Other`] so a file with an explicit
/// `instanceType` override still loads.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(from = "String", into = "String")]
pub enum NodeSize {
    XS,
    S,
    M,
    L,
    XL,
    XXL,
    Other(String),
}

impl NodeSize {
    /// Default instance type for the tier, `None` for unknown tiers.
    pub fn instance_type(&self) -> Option<&'static str> {
        match self {
            NodeSize::XS => Some("t3.small"),
            NodeSize::S => Some("t3.medium"),
            NodeSize::M => Some("m6a.2xlarge"),
            NodeSize::L => Some("m6a.4xlarge"),
            NodeSize::XL => Some("m6a.8xlarge"),
            NodeSize::XXL => Some("m6a.16xlarge"),
            NodeSize::Other(_) => None,
        }
    }

    /// Autoscaling ceiling for the tier.
    pub fn max_capacity(&self) -> u32 {
        match self {
            NodeSize::XS => 3,
            NodeSize::S => 7,
            NodeSize::M => 15,
            NodeSize::L => 31,
            NodeSize::XL => 63,
            NodeSize::XXL => 127,
            NodeSize::Other(_) => DEFAULT_MAX_CAPACITY,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeSize::XS => "XS",
            NodeSize::S => "S",
            NodeSize::M => "M",
            NodeSize::L => "L",
            NodeSize::XL => "XL",
            NodeSize::XXL => "XXL",
            NodeSize::Other(raw) => raw,
        }
    }
}

impl From<String> for NodeSize {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "XS" => NodeSize::XS,
            "S" => NodeSize::S,
            "M" => NodeSize::M,
            "L" => NodeSize::L,
            "XL" => NodeSize::XL,
            "XXL" => NodeSize::XXL,
            _ => NodeSize::Other(raw),
        }
    }
}

impl From<NodeSize> for String {
    fn from(size: NodeSize) -> Self {
        size.as_str().to_string()
    }
}

impl fmt::Display for NodeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
