//! Enchaînement des étapes de l'analyse

use std::fmt;

use geo::Geometry;
use serde::Serialize;
use tracing::info;

use crate::assign::{assign_points, assign_routes, ZoneIndex};
use crate::capacity::plan_capacity;
use crate::config::AnalysisConfig;
use crate::geometry::Projector;
use crate::saturation::{score_points, ExhaustivePairs, ZoneScore};
use crate::store::{RecordSink, RecordSource};
use crate::types::{CollectionPoint, PointRecord, Route, RouteRecord, ZoneRecord, ZoneSet};
use crate::zones::build_zones;
use crate::QuartierError;

/// Dernière étape exécutée
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Stage {
    /// Construction des zones et planification de la capacité
    Zones,
    /// Rattachement des routes et des points
    Assignment,
    /// Scoring de saturation
    Saturation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zones => "zones",
            Self::Assignment => "assignment",
            Self::Saturation => "saturation",
        };
        f.write_str(name)
    }
}

/// Enregistrements d'entrée
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub zones: Vec<ZoneRecord>,
    pub boundary: Option<Geometry>,
    pub routes: Vec<RouteRecord>,
    pub points: Vec<PointRecord>,
}

/// Résultat d'une analyse
#[derive(Debug, Clone)]
pub struct Analysis {
    pub stage: Stage,
    pub zones: ZoneSet,
    pub routes: Vec<Route>,
    pub saturated: Vec<CollectionPoint>,
    pub not_saturated: Vec<CollectionPoint>,
    /// Points rattachés ou non, sans degré de saturation. Vide à l'étape
    /// [`Stage::Zones`]
    pub unscored: Vec<CollectionPoint>,
    pub scores: Vec<ZoneScore>,
    /// Erreurs récupérables, dans l'ordre des étapes
    pub errors: Vec<QuartierError>,
}

impl Analysis {
    pub fn point_count(&self) -> usize {
        self.saturated.len() + self.not_saturated.len() + self.unscored.len()
    }
}

/// Analyse complète
pub fn analyze(input: AnalysisInput, config: &AnalysisConfig) -> Result<Analysis, QuartierError> {
    analyze_to(input, config, Stage::Saturation)
}

/// Exécute l'analyse jusqu'à l'étape donnée incluse.
///
/// # Errors
///
/// Seule une configuration invalide interrompt l'analyse. Les problèmes de
/// données sont collectés dans [`Analysis::errors`].
pub fn analyze_to(
    input: AnalysisInput,
    config: &AnalysisConfig,
    stage: Stage,
) -> Result<Analysis, QuartierError> {
    config.validate()?;

    let build = build_zones(input.zones, input.boundary.as_ref(), &config.zones)?;
    let mut zones = build.zones;
    let mut errors = build.errors;
    errors.extend(plan_capacity(&mut zones, &config.capacity));

    let mut routes: Vec<Route> = input.routes.into_iter().map(Route::from).collect();
    let mut points: Vec<CollectionPoint> = input.points.into_iter().map(CollectionPoint::from).collect();

    if stage >= Stage::Assignment {
        let index = ZoneIndex::new(&zones);
        errors.extend(assign_routes(&mut routes, &index));
        errors.extend(assign_points(&mut points, &routes, &index));
    }

    let mut analysis = Analysis {
        stage,
        zones,
        routes,
        saturated: Vec::new(),
        not_saturated: Vec::new(),
        unscored: Vec::new(),
        scores: Vec::new(),
        errors,
    };

    if stage < Stage::Saturation {
        // Avant le rattachement, les points n'ont pas été traités
        if stage >= Stage::Assignment {
            analysis.unscored = points;
        }
        info!(stage = %stage, zones = analysis.zones.len(), "Analysis stopped");
        return Ok(analysis);
    }

    let projector = Projector::new(config.zones.metric_crs)?;
    let spacing = ExhaustivePairs::new(config.saturation.distance, projector);
    let scoring = score_points(points, &analysis.zones, &config.saturation, &spacing);

    analysis.saturated = scoring.saturated;
    analysis.not_saturated = scoring.not_saturated;
    analysis.unscored = scoring.excluded;
    analysis.scores = scoring.scores;
    analysis.errors.extend(scoring.errors);

    info!(
        zones = analysis.zones.len(),
        saturated = analysis.saturated.len(),
        not_saturated = analysis.not_saturated.len(),
        unscored = analysis.unscored.len(),
        issues = analysis.errors.len(),
        "Analysis complete"
    );

    Ok(analysis)
}

/// Charge les enregistrements, analyse jusqu'à l'étape donnée et persiste le
/// résultat.
pub fn run<S, K, E>(
    source: &S,
    sink: &mut K,
    config: &AnalysisConfig,
    stage: Stage,
) -> Result<Analysis, E>
where
    S: RecordSource<Error = E>,
    K: RecordSink<Error = E>,
    E: From<QuartierError>,
{
    let input = AnalysisInput {
        zones: source.load_zones()?,
        boundary: source.load_boundary()?,
        routes: source.load_routes()?,
        points: source.load_points()?,
    };

    let analysis = analyze_to(input, config, stage)?;

    sink.persist_zones(&analysis.zones)?;
    if stage >= Stage::Assignment {
        sink.persist_routes(&analysis.routes, &analysis.zones)?;
    }
    if stage >= Stage::Saturation {
        sink.persist_points_by_state(&analysis.saturated, &analysis.not_saturated, &analysis.zones)?;
    }
    if stage >= Stage::Assignment {
        sink.persist_unscored_points(&analysis.unscored, &analysis.zones)?;
    }

    Ok(analysis)
}
