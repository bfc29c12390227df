//! Terraform JSON desired-state graph.

pub mod address;
pub mod block;
pub mod expr;
pub mod graph;
pub mod synth;

pub use address::{Address, ProviderRef, sanitize_id};
pub use block::{Block, Provider};
pub use graph::{Stack, Waves};
pub use synth::{SynthReport, synth};
