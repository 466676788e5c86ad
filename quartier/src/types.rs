//! Types de données pour le crate quartier
//!
//! Les enregistrements `*Record` sont fournis par le collaborateur de
//! persistance (voir [`crate::store`]). Les types enrichis (`Zone`, `Route`,
//! `CollectionPoint`) sont produits par l'analyse.

use geo::{Geometry, MultiPolygon, Point};
use serde::Serialize;

/// Identifiant d'une zone : sa position dans le [`ZoneSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ZoneId(pub usize);

/// Référence d'une route ou d'un point vers sa zone.
///
/// Relation de recherche, pas de possession : supprimer une zone ne supprime
/// ni ses routes ni ses points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneRef {
    Assigned(ZoneId),
    /// Aucune zone n'intersecte l'entité
    Unassigned,
}

impl ZoneRef {
    pub fn zone_id(self) -> Option<ZoneId> {
        match self {
            Self::Assigned(id) => Some(id),
            Self::Unassigned => None,
        }
    }

    pub fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }
}

/// Provenance d'une zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneOrigin {
    /// Extraite automatiquement (occupation du sol résidentielle)
    Extracted,
    /// Dessinée à la main, prioritaire sur les zones extraites
    Manual,
}

/// Population telle que lue dans la source
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PopulationInput {
    Count(u64),
    #[default]
    Missing,
    /// Valeur présente mais non numérique (texte brut conservé)
    Invalid(String),
}

/// Origine de la population retenue pour une zone
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationSource {
    /// Fournie par la source
    Supplied,
    /// Estimée depuis la surface et la densité configurée
    Estimated,
    /// Absente, aucune densité configurée
    Missing,
    /// Non numérique dans la source
    Invalid(String),
}

/// Zone candidate ou manuelle, en coordonnées géographiques
#[derive(Debug, Clone)]
pub struct ZoneRecord {
    pub name: String,
    pub origin: ZoneOrigin,
    pub boundary: Geometry,
    pub population: PopulationInput,
}

/// Route, en coordonnées géographiques
#[derive(Debug, Clone)]
pub struct RouteRecord {
    pub id: String,
    pub geometry: Geometry,
}

/// Point de collecte, en coordonnées géographiques
#[derive(Debug, Clone)]
pub struct PointRecord {
    pub id: String,
    pub location: Point,
    pub amenity: String,
    /// Route desservant le point
    pub route_id: Option<String>,
}

/// Capacité idéale d'une zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Capacity {
    /// Nombre idéal de points de collecte (≥ 1)
    pub ideal_point_count: u32,
    /// Espacement idéal entre points, en km
    pub ideal_spacing_km: f64,
}

/// Zone (quartier) construite
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub origin: ZoneOrigin,
    /// Limite en coordonnées géographiques
    pub boundary: MultiPolygon,
    /// Surface calculée dans la projection métrique
    pub area_km2: f64,
    /// Centroïde en coordonnées géographiques
    pub centroid: Point,
    pub population: Option<u64>,
    pub population_source: PopulationSource,
    /// Renseignée par le planificateur de capacité
    pub capacity: Option<Capacity>,
}

/// Ensemble ordonné des zones d'une analyse.
///
/// L'ordre d'insertion fixe l'identifiant des zones et départage les
/// entités qui intersectent plusieurs zones.
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    zones: Vec<Zone>,
}

impl ZoneSet {
    /// Construit l'ensemble et renumérote les zones dans l'ordre donné
    pub fn new(mut zones: Vec<Zone>) -> Self {
        for (i, zone) in zones.iter_mut().enumerate() {
            zone.id = ZoneId(i);
        }
        Self { zones }
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(id.0)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Zone> {
        self.zones.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Zone> {
        self.zones.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Nom de la zone référencée, `None` si non assignée
    pub fn name_of(&self, zone: ZoneRef) -> Option<&str> {
        zone.zone_id()
            .and_then(|id| self.get(id))
            .map(|z| z.name.as_str())
    }

    pub fn by_name(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name == name)
    }
}

impl<'a> IntoIterator for &'a ZoneSet {
    type Item = &'a Zone;
    type IntoIter = std::slice::Iter<'a, Zone>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}

/// Route rattachée à sa zone
#[derive(Debug, Clone)]
pub struct Route {
    pub id: String,
    pub geometry: Geometry,
    pub zone: ZoneRef,
}

/// État de saturation d'un point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaturationState {
    Saturated,
    NotSaturated,
}

impl SaturationState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Saturated => "saturated",
            Self::NotSaturated => "not_saturated",
        }
    }
}

/// Résultat du scoring d'un point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Saturation {
    /// Degré de saturation en %, dans [0, 100]
    pub degree: f64,
    pub state: SaturationState,
}

/// Point de collecte enrichi
#[derive(Debug, Clone)]
pub struct CollectionPoint {
    pub id: String,
    pub location: Point,
    pub amenity: String,
    pub route_id: Option<String>,
    pub zone: ZoneRef,
    /// `None` tant que le point n'est pas scoré (ou s'il est exclu)
    pub saturation: Option<Saturation>,
}

impl From<PointRecord> for CollectionPoint {
    fn from(record: PointRecord) -> Self {
        Self {
            id: record.id,
            location: record.location,
            amenity: record.amenity,
            route_id: record.route_id,
            zone: ZoneRef::Unassigned,
            saturation: None,
        }
    }
}

impl From<RouteRecord> for Route {
    fn from(record: RouteRecord) -> Self {
        Self {
            id: record.id,
            geometry: record.geometry,
            zone: ZoneRef::Unassigned,
        }
    }
}
