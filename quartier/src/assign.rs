//! Rattachement des routes et des points de collecte aux zones
//!
//! Une entité est rattachée à la première zone qu'elle intersecte, dans
//! l'ordre du [`ZoneSet`]. Une entité à cheval sur deux zones va donc à celle
//! de plus petit identifiant.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use geo::{BoundingRect, Geometry, Intersects, MultiPolygon, Point, Rect};
use tracing::{debug, warn};

use crate::types::{CollectionPoint, Route, ZoneId, ZoneRef, ZoneSet};
use crate::{DataQualityIssue, QuartierError};

struct IndexedZone<'a> {
    id: ZoneId,
    bbox: Rect,
    boundary: &'a MultiPolygon,
}

/// Index des zones avec pré-filtre sur les emprises.
///
/// Le filtre ne change pas le résultat, il évite seulement les tests
/// d'intersection exacts inutiles.
pub struct ZoneIndex<'a> {
    zones: Vec<IndexedZone<'a>>,
}

impl<'a> ZoneIndex<'a> {
    pub fn new(zones: &'a ZoneSet) -> Self {
        let zones = zones
            .iter()
            .filter_map(|z| {
                z.boundary.bounding_rect().map(|bbox| IndexedZone {
                    id: z.id,
                    bbox,
                    boundary: &z.boundary,
                })
            })
            .collect();
        Self { zones }
    }

    /// Première zone intersectant la géométrie
    pub fn locate(&self, geom: &Geometry) -> ZoneRef {
        let Some(bbox) = geom.bounding_rect() else {
            return ZoneRef::Unassigned;
        };

        self.zones
            .iter()
            .find(|z| z.bbox.intersects(&bbox) && geom.intersects(z.boundary))
            .map_or(ZoneRef::Unassigned, |z| ZoneRef::Assigned(z.id))
    }

    /// Première zone contenant ou touchant le point
    pub fn locate_point(&self, point: &Point) -> ZoneRef {
        self.zones
            .iter()
            .find(|z| point.intersects(&z.bbox) && point.intersects(z.boundary))
            .map_or(ZoneRef::Unassigned, |z| ZoneRef::Assigned(z.id))
    }
}

/// Rattache chaque route à sa zone.
///
/// Les routes sans zone restent dans la liste avec [`ZoneRef::Unassigned`].
pub fn assign_routes(routes: &mut [Route], index: &ZoneIndex) -> Vec<QuartierError> {
    let mut errors = Vec::new();

    for route in routes.iter_mut() {
        route.zone = index.locate(&route.geometry);
        if !route.zone.is_assigned() {
            warn!(route = %route.id, "Route intersects no zone");
            errors.push(QuartierError::data_quality(
                format!("route {}", route.id),
                DataQualityIssue::Unassigned,
            ));
        }
    }

    errors
}

/// Rattache chaque point à une zone.
///
/// Un point desservi par une route rattachée prend la zone de cette route.
/// Sinon (pas de route, route inconnue ou route hors zone), le point est
/// testé directement contre les zones. Pour un identifiant de route en
/// double, la première route l'emporte.
pub fn assign_points(
    points: &mut [CollectionPoint],
    routes: &[Route],
    index: &ZoneIndex,
) -> Vec<QuartierError> {
    let mut errors = Vec::new();

    let mut route_zones: HashMap<&str, ZoneRef> = HashMap::with_capacity(routes.len());
    for route in routes {
        match route_zones.entry(route.id.as_str()) {
            Entry::Vacant(entry) => {
                entry.insert(route.zone);
            }
            Entry::Occupied(_) => {
                warn!(route = %route.id, "Duplicate route id");
                errors.push(QuartierError::data_quality(
                    format!("route {}", route.id),
                    DataQualityIssue::DuplicateRoute,
                ));
            }
        }
    }

    for point in points.iter_mut() {
        let via_route = match point.route_id.as_deref() {
            Some(route_id) => match route_zones.get(route_id) {
                Some(zone) => Some(*zone).filter(|z| z.is_assigned()),
                None => {
                    warn!(point = %point.id, route = %route_id, "Unknown route");
                    errors.push(QuartierError::data_quality(
                        format!("point {}", point.id),
                        DataQualityIssue::UnknownRoute(route_id.to_string()),
                    ));
                    None
                }
            },
            None => None,
        };

        point.zone = match via_route {
            Some(zone) => zone,
            None => index.locate_point(&point.location),
        };

        if point.zone.is_assigned() {
            debug!(point = %point.id, zone = ?point.zone, "Point assigned");
        } else {
            warn!(point = %point.id, "Point lies in no zone");
            errors.push(QuartierError::data_quality(
                format!("point {}", point.id),
                DataQualityIssue::Unassigned,
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon_from_ring;
    use crate::types::{PopulationSource, Zone, ZoneOrigin};
    use geo::{line_string, LineString};

    fn zone(name: &str, x0: f64, side: f64) -> Zone {
        Zone {
            id: ZoneId(0),
            name: name.to_string(),
            origin: ZoneOrigin::Extracted,
            boundary: polygon_from_ring(&[
                (x0, 0.0),
                (x0 + side, 0.0),
                (x0 + side, side),
                (x0, side),
                (x0, 0.0),
            ]),
            area_km2: side * side,
            centroid: Point::new(x0 + side / 2.0, side / 2.0),
            population: Some(100),
            population_source: PopulationSource::Supplied,
            capacity: None,
        }
    }

    fn zones() -> ZoneSet {
        // A = [0,1]², B = [1,2]×[0,1], C loin
        ZoneSet::new(vec![zone("A", 0.0, 1.0), zone("B", 1.0, 1.0), zone("C", 10.0, 1.0)])
    }

    fn route(id: &str, line: LineString) -> Route {
        Route {
            id: id.to_string(),
            geometry: Geometry::LineString(line),
            zone: ZoneRef::Unassigned,
        }
    }

    fn point(id: &str, x: f64, y: f64, route_id: Option<&str>) -> CollectionPoint {
        CollectionPoint {
            id: id.to_string(),
            location: Point::new(x, y),
            amenity: "waste_basket".to_string(),
            route_id: route_id.map(str::to_string),
            zone: ZoneRef::Unassigned,
            saturation: None,
        }
    }

    #[test]
    fn test_first_match_wins() {
        let zones = zones();
        let index = ZoneIndex::new(&zones);

        // Sur la frontière commune de A et B
        assert_eq!(
            index.locate_point(&Point::new(1.0, 0.5)),
            ZoneRef::Assigned(ZoneId(0))
        );
        assert_eq!(
            index.locate_point(&Point::new(1.5, 0.5)),
            ZoneRef::Assigned(ZoneId(1))
        );
        assert_eq!(index.locate_point(&Point::new(5.0, 0.5)), ZoneRef::Unassigned);
    }

    #[test]
    fn test_assign_routes() {
        let zones = zones();
        let index = ZoneIndex::new(&zones);
        let mut routes = vec![
            route("straddling", line_string![(x: 0.5, y: 0.5), (x: 1.5, y: 0.5)]),
            route("in_b", line_string![(x: 1.2, y: 0.2), (x: 1.8, y: 0.8)]),
            route("nowhere", line_string![(x: 5.0, y: 5.0), (x: 6.0, y: 6.0)]),
        ];

        let errors = assign_routes(&mut routes, &index);

        assert_eq!(routes[0].zone, ZoneRef::Assigned(ZoneId(0)));
        assert_eq!(routes[1].zone, ZoneRef::Assigned(ZoneId(1)));
        assert_eq!(routes[2].zone, ZoneRef::Unassigned);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].entity(), Some("route nowhere"));
    }

    #[test]
    fn test_point_follows_route_zone() {
        let zones = zones();
        let index = ZoneIndex::new(&zones);
        let mut routes = vec![
            route("r1", line_string![(x: 0.5, y: 0.5), (x: 1.5, y: 0.5)]),
            route("r_out", line_string![(x: 5.0, y: 5.0), (x: 6.0, y: 6.0)]),
        ];
        assign_routes(&mut routes, &index);

        let mut points = vec![
            // Géométriquement dans B mais desservi par r1 (zone A)
            point("p1", 1.5, 0.5, Some("r1")),
            // Route hors zone : test direct
            point("p2", 1.5, 0.5, Some("r_out")),
            // Route inconnue : signalée puis test direct
            point("p3", 10.5, 0.5, Some("r404")),
            point("p4", 50.0, 50.0, None),
        ];

        let errors = assign_points(&mut points, &routes, &index);

        assert_eq!(points[0].zone, ZoneRef::Assigned(ZoneId(0)));
        assert_eq!(points[1].zone, ZoneRef::Assigned(ZoneId(1)));
        assert_eq!(points[2].zone, ZoneRef::Assigned(ZoneId(2)));
        assert_eq!(points[3].zone, ZoneRef::Unassigned);

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0],
            QuartierError::data_quality("point p3", DataQualityIssue::UnknownRoute("r404".to_string()))
        );
        assert_eq!(
            errors[1],
            QuartierError::data_quality("point p4", DataQualityIssue::Unassigned)
        );
    }

    #[test]
    fn test_duplicate_route_id_keeps_first() {
        let zones = zones();
        let index = ZoneIndex::new(&zones);
        let mut routes = vec![
            route("r", line_string![(x: 0.2, y: 0.5), (x: 0.8, y: 0.5)]),
            route("r", line_string![(x: 1.2, y: 0.5), (x: 1.8, y: 0.5)]),
        ];
        assign_routes(&mut routes, &index);
        assert_eq!(routes[1].zone, ZoneRef::Assigned(ZoneId(1)));

        let mut points = vec![point("p", 50.0, 50.0, Some("r"))];
        let errors = assign_points(&mut points, &routes, &index);

        assert_eq!(points[0].zone, ZoneRef::Assigned(ZoneId(0)));
        assert_eq!(
            errors,
            vec![QuartierError::data_quality("route r", DataQualityIssue::DuplicateRoute)]
        );
    }

    #[test]
    fn test_assignment_is_idempotent() {
        let zones = zones();
        let index = ZoneIndex::new(&zones);
        let mut routes = vec![route("r1", line_string![(x: 0.9, y: 0.5), (x: 1.1, y: 0.5)])];
        let mut points: Vec<CollectionPoint> = (0..20)
            .map(|i| point(&format!("p{}", i), i as f64 * 0.1, 0.5, None))
            .collect();

        assign_routes(&mut routes, &index);
        assign_points(&mut points, &routes, &index);
        let first: Vec<ZoneRef> = points.iter().map(|p| p.zone).collect();
        let first_route = routes[0].zone;

        assign_routes(&mut routes, &index);
        assign_points(&mut points, &routes, &index);
        let second: Vec<ZoneRef> = points.iter().map(|p| p.zone).collect();

        assert_eq!(first, second);
        assert_eq!(first_route, routes[0].zone);
    }
}
