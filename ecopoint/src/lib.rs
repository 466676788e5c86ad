//! # ecopoint
//!
//! Analyse de couverture des points de collecte à partir de couches GeoJSON :
//! configuration (presets, `.env`), lecture des couches, écriture des
//! résultats et rapport.

pub mod config;
pub mod report;
pub mod store;
