//! Primitives géométriques : validation, opérations booléennes, surfaces,
//! centroïdes et reprojection

mod ellipsoid;
mod mercator;
pub mod projection;
mod utm;

use std::panic::{catch_unwind, AssertUnwindSafe};

use geo::algorithm::line_intersection::line_intersection;
use geo::{
    Area, BooleanOps, Centroid, Coord, Geometry, Line, LineString, MultiPolygon, Point, Polygon,
};

pub use ellipsoid::WGS84;
pub use projection::{Geographic, MetricCrs, Projector};

use crate::QuartierError;

/// Mètres carrés par kilomètre carré
const M2_PER_KM2: f64 = 1e6;

/// Normalise une géométrie surfacique en `MultiPolygon`
pub fn to_multipolygon(geometry: Geometry) -> Option<MultiPolygon> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        Geometry::MultiPolygon(mp) => Some(mp),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        _ => None,
    }
}

/// Vérifie qu'un polygone est exploitable par les opérations booléennes.
///
/// Retourne la raison du rejet : coordonnées non finies, anneau de moins de
/// 4 points ou non fermé, anneau auto-intersecté, surface nulle.
pub fn check_polygon(mp: &MultiPolygon) -> Result<(), String> {
    if mp.0.is_empty() {
        return Err("no polygon".to_string());
    }

    for poly in mp {
        check_ring(poly.exterior()).map_err(|e| format!("exterior ring: {}", e))?;
        for (i, hole) in poly.interiors().iter().enumerate() {
            check_ring(hole).map_err(|e| format!("interior ring {}: {}", i, e))?;
        }
    }

    if mp.unsigned_area() == 0.0 {
        return Err("zero area".to_string());
    }

    Ok(())
}

fn check_ring(ring: &LineString) -> Result<(), String> {
    if ring.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err("non-finite coordinate".to_string());
    }
    if ring.0.len() < 4 {
        return Err(format!("{} vertices, at least 4 required", ring.0.len()));
    }
    if ring.0.first() != ring.0.last() {
        return Err("ring is not closed".to_string());
    }
    if ring_self_intersects(ring) {
        return Err("self-intersecting ring".to_string());
    }
    Ok(())
}

/// Détecte un croisement entre deux segments non adjacents de l'anneau
fn ring_self_intersects(ring: &LineString) -> bool {
    // Les sommets consécutifs dupliqués donneraient des segments de longueur nulle
    let mut coords: Vec<Coord> = Vec::with_capacity(ring.0.len());
    for c in &ring.0 {
        if coords.last() != Some(c) {
            coords.push(*c);
        }
    }

    let segments: Vec<Line> = coords.windows(2).map(|w| Line::new(w[0], w[1])).collect();
    let n = segments.len();
    if n < 3 {
        return true;
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                continue;
            }
            if line_intersection(segments[i], segments[j]).is_some() {
                return true;
            }
        }
    }

    false
}

/// Intersection `a ∩ b`
pub fn intersection(
    a: &MultiPolygon,
    b: &MultiPolygon,
    entity: &str,
) -> Result<MultiPolygon, QuartierError> {
    guarded(entity, "intersection", || a.intersection(b))
}

/// Différence `a − b`
pub fn difference(
    a: &MultiPolygon,
    b: &MultiPolygon,
    entity: &str,
) -> Result<MultiPolygon, QuartierError> {
    guarded(entity, "difference", || a.difference(b))
}

/// Exécute une opération booléenne en convertissant une panique du noyau
/// géométrique en erreur récupérable
fn guarded<F>(entity: &str, operation: &'static str, op: F) -> Result<MultiPolygon, QuartierError>
where
    F: FnOnce() -> MultiPolygon,
{
    catch_unwind(AssertUnwindSafe(op)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "geometry kernel panicked".to_string());
        QuartierError::geometry_operation(entity, operation, reason)
    })
}

/// Vrai si la géométrie ne couvre aucune surface
pub fn is_empty(mp: &MultiPolygon) -> bool {
    mp.0.is_empty() || mp.unsigned_area() == 0.0
}

/// Surface en km² d'une géométrie exprimée en mètres
pub fn area_km2(projected: &MultiPolygon) -> f64 {
    projected.unsigned_area() / M2_PER_KM2
}

/// Centroïde d'une géométrie projetée
pub fn centroid(projected: &MultiPolygon) -> Option<Point> {
    projected.centroid()
}

/// Arrondit les coordonnées d'une géométrie à la précision spécifiée
pub fn round_coords(geom: &Geometry, decimals: u8) -> Geometry {
    use geo::MapCoords;

    let factor = 10_f64.powi(decimals as i32);
    geom.map_coords(|c| Coord {
        x: (c.x * factor).round() / factor,
        y: (c.y * factor).round() / factor,
    })
}

/// Construit un `MultiPolygon` à partir d'un anneau de coordonnées (lon, lat)
pub fn polygon_from_ring(coords: &[(f64, f64)]) -> MultiPolygon {
    let ring: LineString = coords.iter().map(|&(x, y)| Coord { x, y }).collect();
    MultiPolygon::new(vec![Polygon::new(ring, vec![])])
}
