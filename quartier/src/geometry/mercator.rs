//! Projection Web Mercator (EPSG:3857)
//!
//! Projection métrique de référence des données OpenStreetMap. Les surfaces
//! y sont dilatées d'un facteur 1/cos²(lat) : c'est la convention historique
//! des jeux de quartiers, conservée pour la comparabilité des superficies.

use super::ellipsoid::WGS84;
use super::projection::Geographic;

/// Latitude maximale représentable (degrés)
const MAX_LAT_DEG: f64 = 85.0;

/// Convertit coordonnées géographiques vers Web Mercator (EPSG:3857)
pub fn geographic_to_web_mercator(geo: Geographic) -> (f64, f64) {
    // Web Mercator utilise un modèle sphérique avec le rayon équatorial
    let r = WGS84::A;

    let lat = geo
        .lat
        .clamp(-MAX_LAT_DEG.to_radians(), MAX_LAT_DEG.to_radians());

    let x = r * geo.lon;
    let y = r * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();

    (x, y)
}

/// Convertit Web Mercator vers coordonnées géographiques
pub fn web_mercator_to_geographic(x: f64, y: f64) -> Geographic {
    let r = WGS84::A;

    let lon = x / r;
    let lat = 2.0 * (y / r).exp().atan() - std::f64::consts::FRAC_PI_2;

    Geographic::new(lon, lat)
}
