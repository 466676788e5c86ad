//! Reprojection légère en Rust pur entre WGS84 et une projection métrique
//!
//! Les géométries échangées avec l'extérieur sont en longitude/latitude
//! (EPSG:4326). Surfaces et distances sont calculées dans une projection
//! métrique :
//! - Web Mercator (EPSG:3857)
//! - UTM (EPSG:326xx nord, EPSG:327xx sud)
//! - Identité (coordonnées déjà en mètres)

use geo::{Coord, MapCoords};
use serde::{Deserialize, Serialize};

use super::{mercator, utm};
use crate::QuartierError;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Projection métrique cible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricCrs {
    /// Web Mercator (EPSG:3857)
    WebMercator,
    /// UTM, fuseau 1 à 60
    Utm { zone: u8, south: bool },
    /// Pas de reprojection : les coordonnées sont déjà en mètres
    Identity,
}

impl MetricCrs {
    /// Code EPSG de la projection
    pub fn epsg(&self) -> Option<u32> {
        match *self {
            Self::WebMercator => Some(3857),
            Self::Utm { zone, south } => {
                let base = if south { 32700 } else { 32600 };
                Some(base + zone as u32)
            }
            Self::Identity => None,
        }
    }

    /// Vérifie que la projection est supportée
    pub fn validate(&self) -> Result<(), QuartierError> {
        match *self {
            Self::Utm { zone, .. } if !(1..=60).contains(&zone) => Err(QuartierError::Projection(
                format!("UTM zone {} is out of range (1-60)", zone),
            )),
            _ => Ok(()),
        }
    }
}

/// Reprojection WGS84 ⇄ projection métrique
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    crs: MetricCrs,
}

impl Projector {
    /// Crée un nouveau reprojector
    pub fn new(crs: MetricCrs) -> Result<Self, QuartierError> {
        crs.validate()?;
        Ok(Self { crs })
    }

    pub fn crs(&self) -> MetricCrs {
        self.crs
    }

    /// WGS84 (degrés) → projection métrique (mètres)
    pub fn forward_coord(&self, c: Coord) -> Coord {
        let (x, y) = match self.crs {
            MetricCrs::WebMercator => {
                mercator::geographic_to_web_mercator(Geographic::from_degrees(c.x, c.y))
            }
            MetricCrs::Utm { zone, south } => {
                utm::geographic_to_utm(Geographic::from_degrees(c.x, c.y), zone, south)
            }
            MetricCrs::Identity => (c.x, c.y),
        };
        Coord { x, y }
    }

    /// Projection métrique (mètres) → WGS84 (degrés)
    pub fn inverse_coord(&self, c: Coord) -> Coord {
        let (x, y) = match self.crs {
            MetricCrs::WebMercator => mercator::web_mercator_to_geographic(c.x, c.y).to_degrees(),
            MetricCrs::Utm { zone, south } => {
                utm::utm_to_geographic(c.x, c.y, zone, south).to_degrees()
            }
            MetricCrs::Identity => (c.x, c.y),
        };
        Coord { x, y }
    }

    /// Projette une géométrie vers la projection métrique
    pub fn forward<G>(&self, geom: &G) -> G::Output
    where
        G: MapCoords<f64, f64>,
    {
        geom.map_coords(|c| self.forward_coord(c))
    }

    /// Ramène une géométrie en coordonnées géographiques
    pub fn inverse<G>(&self, geom: &G) -> G::Output
    where
        G: MapCoords<f64, f64>,
    {
        geom.map_coords(|c| self.inverse_coord(c))
    }

    /// Retourne une description de la projection utilisée
    pub fn description(&self) -> String {
        match self.crs {
            MetricCrs::WebMercator => "Web Mercator (EPSG:3857)".to_string(),
            MetricCrs::Utm { zone, south } => format!(
                "UTM {}{} (EPSG:{})",
                zone,
                if south { "S" } else { "N" },
                self.crs.epsg().unwrap_or_default()
            ),
            MetricCrs::Identity => "identity (coordinates already metric)".to_string(),
        }
    }
}
