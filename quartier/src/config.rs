//! Paramètres de l'analyse
//!
//! Toutes les constantes du modèle (capacité de service, facteurs, seuil de
//! saturation) sont regroupées ici et passées explicitement aux étapes.

use serde::{Deserialize, Serialize};

use crate::geometry::MetricCrs;
use crate::QuartierError;

/// Configuration complète d'une analyse
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub capacity: CapacityConfig,
    pub zones: ZoneConfig,
    pub saturation: SaturationConfig,
}

/// Paramètres du planificateur de capacité
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CapacityConfig {
    /// Nombre d'habitants desservis par un point de collecte
    pub service_capacity: u32,

    /// Multiplicateur lié à la densité du quartier
    pub density_factor: f64,

    /// Multiplicateur lié à l'accessibilité du quartier
    pub accessibility_factor: f64,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            service_capacity: 500,
            density_factor: 1.0,
            accessibility_factor: 1.0,
        }
    }
}

/// Paramètres de construction des zones
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Densité (hab/km²) pour estimer une population absente.
    /// Pas de valeur par défaut : sans densité, une zone sans population
    /// est exclue du scoring.
    pub population_density: Option<f64>,

    /// Supprime les accents des noms de zones
    pub normalize_names: bool,

    /// Projection métrique utilisée pour les surfaces et distances
    pub metric_crs: MetricCrs,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            population_density: None,
            normalize_names: true,
            metric_crs: MetricCrs::WebMercator,
        }
    }
}

/// Paramètres du calcul de saturation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SaturationConfig {
    /// Au-delà de ce pourcentage, un point est saturé (strictement supérieur)
    pub threshold_percent: f64,

    /// Mesure de distance entre points
    pub distance: DistanceMetric,

    /// Formule du degré de saturation
    pub model: SaturationModel,

    /// Traitement des zones de 0 ou 1 point
    pub sparse_zones: SparseZonePolicy,
}

impl Default for SaturationConfig {
    fn default() -> Self {
        Self {
            threshold_percent: 50.0,
            distance: DistanceMetric::Projected,
            model: SaturationModel::Spacing,
            sparse_zones: SparseZonePolicy::ForceSaturated,
        }
    }
}

/// Mesure de distance entre deux points de collecte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Distance euclidienne dans la projection métrique
    Projected,
    /// Distance orthodromique (sphère WGS84)
    Haversine,
}

/// Formule du degré de saturation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaturationModel {
    /// Écart relatif entre espacement mesuré et espacement idéal
    Spacing,
    /// Combinaison pondérée de l'écart sur le nombre de points et de
    /// l'écart d'espacement, chacun diminué d'une tolérance
    Blended {
        count_weight: f64,
        spacing_weight: f64,
        count_tolerance_percent: f64,
        spacing_tolerance_percent: f64,
    },
}

impl SaturationModel {
    /// Variante pondérée avec les réglages historiques du backend web
    pub fn blended_default() -> Self {
        Self::Blended {
            count_weight: 0.85,
            spacing_weight: 0.15,
            count_tolerance_percent: 10.0,
            spacing_tolerance_percent: 10.0,
        }
    }
}

/// Traitement des zones sans espacement mesurable (0 ou 1 point)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SparseZonePolicy {
    /// Degré de saturation 100, état saturé (comportement historique)
    ForceSaturated,
    /// Points exclus du scoring et signalés
    Exclude,
}

impl AnalysisConfig {
    /// Vérifie la cohérence des paramètres
    pub fn validate(&self) -> Result<(), QuartierError> {
        let cap = &self.capacity;
        if cap.service_capacity == 0 {
            return Err(QuartierError::Config(
                "capacity.service_capacity must be > 0".to_string(),
            ));
        }
        for (name, value) in [
            ("capacity.density_factor", cap.density_factor),
            ("capacity.accessibility_factor", cap.accessibility_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(QuartierError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if let Some(density) = self.zones.population_density {
            if !density.is_finite() || density <= 0.0 {
                return Err(QuartierError::Config(format!(
                    "zones.population_density must be a positive number, got {}",
                    density
                )));
            }
        }
        self.zones.metric_crs.validate()?;

        let threshold = self.saturation.threshold_percent;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(QuartierError::Config(format!(
                "saturation.threshold_percent must be within [0, 100], got {}",
                threshold
            )));
        }

        if let SaturationModel::Blended {
            count_weight,
            spacing_weight,
            count_tolerance_percent,
            spacing_tolerance_percent,
        } = self.saturation.model
        {
            if count_weight < 0.0 || spacing_weight < 0.0 || count_weight + spacing_weight <= 0.0 {
                return Err(QuartierError::Config(
                    "saturation.model weights must be non-negative and not both zero".to_string(),
                ));
            }
            for tolerance in [count_tolerance_percent, spacing_tolerance_percent] {
                if !(0.0..100.0).contains(&tolerance) {
                    return Err(QuartierError::Config(format!(
                        "saturation.model tolerances must be within [0, 100), got {}",
                        tolerance
                    )));
                }
            }
        }

        Ok(())
    }
}
