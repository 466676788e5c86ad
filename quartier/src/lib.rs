//! # quartier
//!
//! Couverture des points de collecte de déchets par quartier.
//!
//! ## Étapes
//!
//! - Construction des zones : découpage par la limite administrative,
//!   priorité aux zones manuelles, surface et centroïde en projection métrique
//! - Capacité : nombre de points et espacement idéaux par zone
//! - Rattachement des routes et des points à leur zone
//! - Saturation : écart entre espacement mesuré et espacement idéal
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quartier::{analyze, AnalysisConfig, AnalysisInput};
//!
//! let analysis = analyze(input, &AnalysisConfig::default())?;
//! println!("Saturés: {}", analysis.saturated.len());
//!
//! for err in &analysis.errors {
//!     eprintln!("{}", err);
//! }
//! ```

pub mod assign;
pub mod capacity;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod saturation;
pub mod store;
pub mod types;
pub mod zones;

pub use config::AnalysisConfig;
pub use error::{DataQualityIssue, QuartierError};
pub use pipeline::{analyze, analyze_to, run, Analysis, AnalysisInput, Stage};
pub use saturation::ZoneScore;
pub use store::{RecordSink, RecordSource};
pub use types::{
    CollectionPoint, PointRecord, PopulationInput, PopulationSource, Route, RouteRecord,
    SaturationState, Zone, ZoneId, ZoneOrigin, ZoneRecord, ZoneRef, ZoneSet,
};
