//! Construction du modèle de zones (quartiers)
//!
//! Étapes, dans l'ordre :
//! 1. projection métrique et validation de chaque polygone
//! 2. découpage par la limite administrative (si fournie)
//! 3. soustraction des zones manuelles aux zones extraites
//! 4. surface, centroïde et population
//! 5. unicité des noms

pub mod names;
pub mod overlap;

use geo::{Geometry, MultiPolygon};
use tracing::{debug, info, warn};

use crate::config::ZoneConfig;
use crate::geometry::{self, Projector};
use crate::types::{
    PopulationInput, PopulationSource, Zone, ZoneId, ZoneOrigin, ZoneRecord, ZoneSet,
};
use crate::{DataQualityIssue, QuartierError};

pub use names::{dedupe_names, normalize_name};

/// Résultat de la construction des zones
#[derive(Debug, Clone, Default)]
pub struct ZoneBuild {
    pub zones: ZoneSet,
    /// Zones écartées ou renommées
    pub errors: Vec<QuartierError>,
}

/// Zone en cours de construction, géométrie projetée
struct Draft {
    name: String,
    origin: ZoneOrigin,
    projected: MultiPolygon,
    population: PopulationInput,
}

/// Construit l'ensemble des zones à partir des zones extraites et manuelles.
///
/// Les zones extraites précèdent les zones manuelles dans le résultat, chaque
/// groupe dans l'ordre d'entrée. Une zone inexploitable est écartée et
/// signalée dans [`ZoneBuild::errors`].
///
/// # Errors
///
/// Retourne une erreur uniquement si la projection configurée est invalide.
pub fn build_zones(
    records: Vec<ZoneRecord>,
    boundary: Option<&Geometry>,
    config: &ZoneConfig,
) -> Result<ZoneBuild, QuartierError> {
    let projector = Projector::new(config.metric_crs)?;
    let mut errors = Vec::new();

    if records.is_empty() {
        info!("No zone to build");
        return Ok(ZoneBuild::default());
    }

    let total = records.len();
    let boundary = boundary.and_then(|b| prepare_boundary(b, &projector, &mut errors));

    let mut candidates = Vec::new();
    let mut manual = Vec::new();

    for record in records {
        let Some(draft) = prepare(record, &projector, boundary.as_ref(), config, &mut errors) else {
            continue;
        };
        match draft.origin {
            ZoneOrigin::Extracted => candidates.push(draft),
            ZoneOrigin::Manual => manual.push(draft),
        }
    }

    let manual_geoms: Vec<(&str, &MultiPolygon)> = manual
        .iter()
        .map(|d| (d.name.as_str(), &d.projected))
        .collect();

    let mut resolved = Vec::with_capacity(candidates.len() + manual.len());
    for mut draft in candidates {
        match overlap::subtract_manual(draft.projected, &manual_geoms, &draft.name) {
            Ok(geom) => {
                draft.projected = geom;
                resolved.push(draft);
            }
            Err(e) => {
                warn!(zone = %draft.name, error = %e, "Dropping zone");
                errors.push(e);
            }
        }
    }
    resolved.extend(manual);

    let mut zones: Vec<Zone> = resolved
        .into_iter()
        .filter_map(|draft| finalize(draft, &projector, config, &mut errors))
        .collect();

    let mut zone_names: Vec<String> = zones.iter().map(|z| z.name.clone()).collect();
    for (i, renamed_to) in dedupe_names(&mut zone_names) {
        warn!(zone = %zones[i].name, renamed_to = %renamed_to, "Duplicate zone name");
        errors.push(QuartierError::data_quality(
            zones[i].name.clone(),
            DataQualityIssue::DuplicateName {
                renamed_to: renamed_to.clone(),
            },
        ));
        zones[i].name = renamed_to;
    }

    info!(
        zones = zones.len(),
        dropped = total - zones.len(),
        crs = %projector.description(),
        "Zones built"
    );

    Ok(ZoneBuild {
        zones: ZoneSet::new(zones),
        errors,
    })
}

/// Projette et valide la limite administrative. Une limite invalide est
/// signalée et le découpage n'a pas lieu.
fn prepare_boundary(
    boundary: &Geometry,
    projector: &Projector,
    errors: &mut Vec<QuartierError>,
) -> Option<MultiPolygon> {
    let checked = geometry::to_multipolygon(boundary.clone())
        .ok_or_else(|| "boundary is not a polygon".to_string())
        .and_then(|mp| {
            let projected = projector.forward(&mp);
            geometry::check_polygon(&projected).map(|_| projected)
        });

    match checked {
        Ok(projected) => Some(projected),
        Err(reason) => {
            warn!(reason = %reason, "Invalid boundary, zones are not clipped");
            errors.push(QuartierError::data_quality(
                "boundary",
                DataQualityIssue::DegenerateGeometry(reason),
            ));
            None
        }
    }
}

/// Normalise le nom, projette, valide et découpe une zone
fn prepare(
    record: ZoneRecord,
    projector: &Projector,
    boundary: Option<&MultiPolygon>,
    config: &ZoneConfig,
    errors: &mut Vec<QuartierError>,
) -> Option<Draft> {
    let name = if config.normalize_names {
        normalize_name(&record.name)
    } else {
        record.name.trim().to_string()
    };

    let reject = |errors: &mut Vec<QuartierError>, issue: DataQualityIssue| {
        warn!(zone = %name, issue = %issue, "Dropping zone");
        errors.push(QuartierError::data_quality(name.clone(), issue));
    };

    let Some(mp) = geometry::to_multipolygon(record.boundary) else {
        reject(
            errors,
            DataQualityIssue::DegenerateGeometry("not a polygon".to_string()),
        );
        return None;
    };

    let mut projected = projector.forward(&mp);
    if let Err(reason) = geometry::check_polygon(&projected) {
        reject(errors, DataQualityIssue::DegenerateGeometry(reason));
        return None;
    }

    if let Some(boundary) = boundary {
        projected = match geometry::intersection(&projected, boundary, &name) {
            Ok(clipped) => clipped,
            Err(e) => {
                warn!(zone = %name, error = %e, "Dropping zone");
                errors.push(e);
                return None;
            }
        };
        if geometry::is_empty(&projected) {
            reject(errors, DataQualityIssue::EmptyAfterClip);
            return None;
        }
    }

    Some(Draft {
        name,
        origin: record.origin,
        projected,
        population: record.population,
    })
}

/// Calcule surface, centroïde et population puis revient en coordonnées
/// géographiques
fn finalize(
    draft: Draft,
    projector: &Projector,
    config: &ZoneConfig,
    errors: &mut Vec<QuartierError>,
) -> Option<Zone> {
    let area_km2 = geometry::area_km2(&draft.projected);
    let centroid = geometry::centroid(&draft.projected).filter(|_| area_km2 > 0.0);

    let Some(centroid) = centroid else {
        warn!(zone = %draft.name, "Dropping zone with zero area");
        errors.push(QuartierError::data_quality(
            draft.name,
            DataQualityIssue::ZeroArea,
        ));
        return None;
    };

    let (population, population_source) =
        resolve_population(draft.population, area_km2, config.population_density);
    if population_source == PopulationSource::Estimated {
        debug!(zone = %draft.name, population = ?population, "Population estimated from density");
    }

    Some(Zone {
        id: ZoneId(0),
        name: draft.name,
        origin: draft.origin,
        boundary: projector.inverse(&draft.projected),
        area_km2,
        centroid: projector.inverse(&centroid),
        population,
        population_source,
        capacity: None,
    })
}

/// Population retenue : la valeur fournie, sinon une estimation par la
/// densité si elle est configurée. Une valeur non numérique n'est jamais
/// estimée.
pub fn resolve_population(
    input: PopulationInput,
    area_km2: f64,
    density: Option<f64>,
) -> (Option<u64>, PopulationSource) {
    match (input, density) {
        (PopulationInput::Count(n), _) => (Some(n), PopulationSource::Supplied),
        (PopulationInput::Invalid(raw), _) => (None, PopulationSource::Invalid(raw)),
        (PopulationInput::Missing, Some(density)) => (
            Some((area_km2 * density).floor() as u64),
            PopulationSource::Estimated,
        ),
        (PopulationInput::Missing, None) => (None, PopulationSource::Missing),
    }
}
