//! EKS control plane, managed node groups and cluster add-ons.

pub mod addon;
pub mod cilium;
pub mod cluster;
pub mod nodegroup;

pub use cluster::Cluster;
