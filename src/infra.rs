//! Cluster configuration files and the static lookups derived from them.

pub mod environment;
pub mod loader;
pub mod model;
pub mod sizing;

pub use environment::{ConfigTier, Environment};
pub use loader::{config_path, load};
pub use model::{InfraConfig, InstanceTypes, NodegroupConfig, ProjectConfig, StackConfig, Tags};
pub use sizing::NodeSize;
