//! geomark-cli
//! ===========
//!
//! Command-line driver for the `geomark-core` map interaction engine.
//!
//! The binary (`geomark`) is the primary deliverable. This library target
//! holds the replay script parser so it can be tested and reused.
//!
//! Quick start
//! -----------
//!
//! ```text
//! geomark suggest Bost
//! geomark geocode "Portland, Oregon"
//! geomark reverse 42.35 -71.07
//! geomark replay session.txt --position 42.36,-71.06
//! ```
//!
//! For programmatic access use the [`geomark_core`] crate directly.
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod script;
