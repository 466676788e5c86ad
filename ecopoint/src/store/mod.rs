//! Lecture et écriture des couches sur disque
//!
//! Entrées (répertoire `--input`) :
//! - `zones.geojson` : zones extraites (`name`, `population`)
//! - `manual_zones.geojson` : zones manuelles, optionnel
//! - `boundary.geojson` : limite administrative, optionnel
//! - `routes.geojson` : routes (`id`)
//! - `points.geojson` : points de collecte (`id`, `amenity`, `route`)
//!
//! Sorties (répertoire `--output`) : quartiers, routes et points par état, en
//! GeoJSON et optionnellement en CSV avec géométrie WKT.

pub mod csv;
pub mod geojson;
pub mod sink;
pub mod source;

pub use sink::GeoJsonSink;
pub use source::GeoJsonSource;

use geo::Geometry;
use serde_json::Value;

pub const ZONES_FILE: &str = "zones.geojson";
pub const MANUAL_ZONES_FILE: &str = "manual_zones.geojson";
pub const BOUNDARY_FILE: &str = "boundary.geojson";
pub const ROUTES_FILE: &str = "routes.geojson";
pub const POINTS_FILE: &str = "points.geojson";

pub const QUARTIERS_OUTPUT: &str = "quartiers";
pub const ROUTES_OUTPUT: &str = "routes";
pub const SATURATED_OUTPUT: &str = "points_saturated";
pub const NOT_SATURATED_OUTPUT: &str = "points_not_saturated";
pub const UNSCORED_OUTPUT: &str = "points_unscored";

/// Enregistrement prêt à être écrit
#[derive(Debug, Clone)]
pub struct OutputFeature {
    pub id: String,
    pub geometry: Geometry,
    /// Valeurs dans l'ordre des colonnes de la couche
    pub properties: Vec<Value>,
}
