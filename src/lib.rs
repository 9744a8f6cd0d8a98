//! Workspace crate for geomark. Re-exports [`geomark_core`] so the demos can
//! be run from the repository root (`cargo run --example scripted_session`).

pub use geomark_core::*;
