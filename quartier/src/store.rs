//! Interfaces avec le collaborateur de persistance
//!
//! Toutes les géométries échangées sont en longitude/latitude (degrés). Le
//! format de stockage (fichiers, base) reste l'affaire de l'implémentation.

use geo::Geometry;

use crate::types::{CollectionPoint, PointRecord, Route, RouteRecord, ZoneRecord, ZoneSet};

/// Source des enregistrements à analyser
pub trait RecordSource {
    type Error;

    /// Zones extraites et manuelles, dans l'ordre de lecture
    fn load_zones(&self) -> Result<Vec<ZoneRecord>, Self::Error>;

    /// Limite administrative, `None` si aucune
    fn load_boundary(&self) -> Result<Option<Geometry>, Self::Error>;

    fn load_routes(&self) -> Result<Vec<RouteRecord>, Self::Error>;

    fn load_points(&self) -> Result<Vec<PointRecord>, Self::Error>;
}

/// Destination des résultats.
///
/// Les zones sont passées à chaque appel pour résoudre les
/// [`ZoneRef`](crate::ZoneRef) en noms.
pub trait RecordSink {
    type Error;

    fn persist_zones(&mut self, zones: &ZoneSet) -> Result<(), Self::Error>;

    fn persist_routes(&mut self, routes: &[Route], zones: &ZoneSet) -> Result<(), Self::Error>;

    fn persist_points_by_state(
        &mut self,
        saturated: &[CollectionPoint],
        not_saturated: &[CollectionPoint],
        zones: &ZoneSet,
    ) -> Result<(), Self::Error>;

    /// Points sans degré de saturation (non rattachés, exclus ou analyse
    /// arrêtée avant le scoring). Ignorés par défaut.
    fn persist_unscored_points(
        &mut self,
        _points: &[CollectionPoint],
        _zones: &ZoneSet,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}
