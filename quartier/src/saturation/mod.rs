//! Degré de saturation des points de collecte
//!
//! Le degré est calculé par zone puis reporté sur chacun de ses points : tous
//! les points d'une zone partagent le même score.

pub mod distance;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

pub use distance::{ExhaustivePairs, PairwiseSpacing, ZoneSpacing};

use crate::config::{SaturationConfig, SaturationModel, SparseZonePolicy};
use crate::types::{CollectionPoint, Saturation, SaturationState, Zone, ZoneId, ZoneSet};
use crate::{DataQualityIssue, QuartierError};

/// Degré maximal
pub const MAX_DEGREE: f64 = 100.0;

/// Synthèse du scoring d'une zone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneScore {
    pub zone: ZoneId,
    pub name: String,
    pub point_count: usize,
    pub ideal_point_count: u32,
    pub ideal_spacing_km: f64,
    /// `None` pour une zone de moins de deux points
    pub actual_spacing_km: Option<f64>,
    pub degree: f64,
    pub state: SaturationState,
}

/// Points classés, synthèses par zone et diagnostics
#[derive(Debug, Clone, Default)]
pub struct Scoring {
    pub saturated: Vec<CollectionPoint>,
    pub not_saturated: Vec<CollectionPoint>,
    /// Points non scorés : sans zone, zone sans capacité, zone trop peu dotée
    pub excluded: Vec<CollectionPoint>,
    pub scores: Vec<ZoneScore>,
    pub errors: Vec<QuartierError>,
}

/// `min(100, |réel − idéal| / idéal × 100)`, 100 pour une zone sans espacement
pub fn degree_of_saturation(spacing: ZoneSpacing, ideal_spacing_km: f64) -> f64 {
    match spacing {
        ZoneSpacing::Measured(actual) => relative_deviation(actual, ideal_spacing_km).min(MAX_DEGREE),
        ZoneSpacing::Sparse { .. } => MAX_DEGREE,
    }
}

fn relative_deviation(actual: f64, ideal: f64) -> f64 {
    (actual - ideal).abs() / ideal * 100.0
}

/// Écart diminué de la tolérance puis ramené à [0, 1] pour un écart ≤ 100 %
fn tolerated(deviation: f64, tolerance_percent: f64) -> f64 {
    (deviation - tolerance_percent).max(0.0) / (100.0 - tolerance_percent)
}

/// Degré selon le modèle configuré
pub fn zone_degree(
    model: &SaturationModel,
    spacing: ZoneSpacing,
    point_count: usize,
    ideal_point_count: u32,
    ideal_spacing_km: f64,
) -> f64 {
    match *model {
        SaturationModel::Spacing => degree_of_saturation(spacing, ideal_spacing_km),
        SaturationModel::Blended {
            count_weight,
            spacing_weight,
            count_tolerance_percent,
            spacing_tolerance_percent,
        } => {
            let Some(actual) = spacing.km() else {
                return MAX_DEGREE;
            };
            let count_term = tolerated(
                relative_deviation(point_count as f64, ideal_point_count as f64),
                count_tolerance_percent,
            );
            let spacing_term = tolerated(
                relative_deviation(actual, ideal_spacing_km),
                spacing_tolerance_percent,
            );
            ((count_weight * count_term + spacing_weight * spacing_term) * 100.0).min(MAX_DEGREE)
        }
    }
}

/// Saturé si le degré dépasse strictement le seuil
pub fn classify(degree: f64, threshold_percent: f64) -> SaturationState {
    if degree > threshold_percent {
        SaturationState::Saturated
    } else {
        SaturationState::NotSaturated
    }
}

/// Résultat pour une zone
#[derive(Default)]
struct ZoneOutcome {
    scored: Vec<CollectionPoint>,
    excluded: Vec<CollectionPoint>,
    score: Option<ZoneScore>,
    error: Option<QuartierError>,
}

/// Score tous les points rattachés.
///
/// Les zones sont traitées en parallèle ; le résultat reste groupé par zone,
/// zones dans l'ordre du [`ZoneSet`] et points dans l'ordre d'entrée.
pub fn score_points(
    points: Vec<CollectionPoint>,
    zones: &ZoneSet,
    config: &SaturationConfig,
    spacing: &dyn PairwiseSpacing,
) -> Scoring {
    let mut groups: Vec<Vec<CollectionPoint>> = vec![Vec::new(); zones.len()];
    let mut scoring = Scoring::default();

    for point in points {
        match point.zone.zone_id().filter(|id| id.0 < groups.len()) {
            Some(id) => groups[id.0].push(point),
            None => scoring.excluded.push(point),
        }
    }

    let outcomes: Vec<ZoneOutcome> = zones
        .iter()
        .zip(groups)
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(zone, group)| score_zone(zone, group, config, spacing))
        .collect();

    for outcome in outcomes {
        for point in outcome.scored {
            match point.saturation.map(|s| s.state) {
                Some(SaturationState::Saturated) => scoring.saturated.push(point),
                Some(SaturationState::NotSaturated) => scoring.not_saturated.push(point),
                None => scoring.excluded.push(point),
            }
        }
        scoring.excluded.extend(outcome.excluded);
        scoring.scores.extend(outcome.score);
        scoring.errors.extend(outcome.error);
    }

    info!(
        saturated = scoring.saturated.len(),
        not_saturated = scoring.not_saturated.len(),
        excluded = scoring.excluded.len(),
        "Saturation scored"
    );

    scoring
}

fn score_zone(
    zone: &Zone,
    mut points: Vec<CollectionPoint>,
    config: &SaturationConfig,
    spacing: &dyn PairwiseSpacing,
) -> ZoneOutcome {
    // Quartier sans point : rien à scorer ni à signaler
    if points.is_empty() {
        return ZoneOutcome::default();
    }

    // Zone sans population : déjà signalée par le planificateur
    let Some(capacity) = zone.capacity else {
        return ZoneOutcome {
            excluded: points,
            ..ZoneOutcome::default()
        };
    };

    let ideal = capacity.ideal_spacing_km;
    if !ideal.is_finite() || ideal <= 0.0 {
        warn!(zone = %zone.name, ideal_spacing_km = ideal, "Zone not scored");
        return ZoneOutcome {
            excluded: points,
            error: Some(QuartierError::data_quality(
                zone.name.clone(),
                DataQualityIssue::ZeroIdealSpacing,
            )),
            ..ZoneOutcome::default()
        };
    }

    let locations: Vec<_> = points.iter().map(|p| p.location).collect();
    let actual = spacing.mean_spacing(&locations);

    if let (ZoneSpacing::Sparse { points: count }, SparseZonePolicy::Exclude) =
        (actual, config.sparse_zones)
    {
        warn!(zone = %zone.name, points = count, "Sparse zone not scored");
        return ZoneOutcome {
            excluded: points,
            error: Some(QuartierError::data_quality(
                zone.name.clone(),
                DataQualityIssue::SparseZone { points: count },
            )),
            ..ZoneOutcome::default()
        };
    }

    let degree = zone_degree(
        &config.model,
        actual,
        points.len(),
        capacity.ideal_point_count,
        ideal,
    );
    let state = classify(degree, config.threshold_percent);

    debug!(
        zone = %zone.name,
        points = points.len(),
        actual_spacing_km = ?actual.km(),
        ideal_spacing_km = ideal,
        degree,
        state = state.as_str(),
        "Zone scored"
    );

    for point in &mut points {
        point.saturation = Some(Saturation { degree, state });
    }

    ZoneOutcome {
        score: Some(ZoneScore {
            zone: zone.id,
            name: zone.name.clone(),
            point_count: points.len(),
            ideal_point_count: capacity.ideal_point_count,
            ideal_spacing_km: ideal,
            actual_spacing_km: actual.km(),
            degree,
            state,
        }),
        scored: points,
        ..ZoneOutcome::default()
    }
}
