//! Planification de la capacité idéale des zones
//!
//! Chaque zone est modélisée comme une grille de cellules de même surface,
//! un point de collecte par cellule : l'espacement idéal est le côté d'une
//! cellule.

use tracing::{debug, warn};

use crate::config::CapacityConfig;
use crate::types::{Capacity, PopulationSource, ZoneSet};
use crate::{DataQualityIssue, QuartierError};

/// Nombre idéal de points : `max(1, ceil(population / capacité × facteurs))`
pub fn ideal_point_count(population: u64, config: &CapacityConfig) -> u32 {
    let raw = population as f64 / config.service_capacity as f64
        * config.density_factor
        * config.accessibility_factor;
    (raw.ceil() as u32).max(1)
}

/// Espacement idéal en km : `sqrt(surface / nombre idéal)`
pub fn ideal_spacing(area_km2: f64, ideal_point_count: u32) -> f64 {
    (area_km2 / ideal_point_count as f64).sqrt()
}

/// Renseigne la capacité de chaque zone dont la population est connue.
///
/// Les zones sans population exploitable restent sans capacité et sont
/// signalées : elles ne seront pas scorées.
pub fn plan_capacity(zones: &mut ZoneSet, config: &CapacityConfig) -> Vec<QuartierError> {
    let mut errors = Vec::new();

    for zone in zones.iter_mut() {
        let Some(population) = zone.population else {
            let issue = match &zone.population_source {
                PopulationSource::Invalid(raw) => DataQualityIssue::InvalidPopulation(raw.clone()),
                _ => DataQualityIssue::MissingPopulation,
            };
            warn!(zone = %zone.name, issue = %issue, "Zone excluded from scoring");
            errors.push(QuartierError::data_quality(zone.name.clone(), issue));
            zone.capacity = None;
            continue;
        };

        let count = ideal_point_count(population, config);
        let spacing = ideal_spacing(zone.area_km2, count);
        debug!(
            zone = %zone.name,
            population,
            ideal_point_count = count,
            ideal_spacing_km = spacing,
            "Capacity planned"
        );

        zone.capacity = Some(Capacity {
            ideal_point_count: count,
            ideal_spacing_km: spacing,
        });
    }

    errors
}
