//! Résolution des chevauchements entre zones extraites et zones manuelles

use geo::{BoundingRect, Intersects, MultiPolygon};
use tracing::debug;

use crate::geometry;
use crate::QuartierError;

/// Soustrait toutes les zones manuelles qui intersectent la zone candidate.
///
/// Les zones manuelles ne sont jamais modifiées. La soustraction est appliquée
/// pour chaque zone manuelle avant de rendre la géométrie finale.
pub fn subtract_manual(
    candidate: MultiPolygon,
    manual: &[(&str, &MultiPolygon)],
    entity: &str,
) -> Result<MultiPolygon, QuartierError> {
    manual
        .iter()
        .try_fold(candidate, |current, &(manual_name, manual_geom)| {
            if !overlaps(&current, manual_geom) {
                return Ok(current);
            }
            debug!(zone = %entity, manual = %manual_name, "Subtracting manual zone");
            geometry::difference(&current, manual_geom, entity)
        })
}

/// Test d'intersection précédé d'un filtre sur les emprises
fn overlaps(a: &MultiPolygon, b: &MultiPolygon) -> bool {
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(ra), Some(rb)) => ra.intersects(&rb) && a.intersects(b),
        _ => false,
    }
}
