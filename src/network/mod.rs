pub mod network;
pub mod spec;

pub use network::{LayerSnapshot, Network};
pub use spec::{LayerSpec, NetworkSpec};
