//! Top-level facade crate for gaugebeat.
//!
//! Re-exports the core model and the exporter library so users can depend on a single crate.

pub mod core {
    pub use gaugebeat_core::*;
}

pub mod exporter {
    pub use gaugebeat_exporter::*;
}
