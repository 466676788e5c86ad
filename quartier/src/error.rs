//! Types d'erreurs pour le crate quartier

use std::fmt;

use thiserror::Error;

/// Erreurs pouvant survenir pendant l'analyse
///
/// Seules `Config` et `Projection` interrompent une analyse. Les autres
/// variantes sont collectées dans [`crate::Analysis::errors`] : l'entité
/// fautive est exclue et l'analyse continue.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QuartierError {
    /// Donnée inexploitable (population, espacement, géométrie)
    #[error("Data quality issue for {entity}: {issue}")]
    DataQuality {
        entity: String,
        issue: DataQualityIssue,
    },

    /// Opération géométrique impossible (intersection, différence)
    #[error("Geometry operation '{operation}' failed for {entity}: {reason}")]
    GeometryOperation {
        entity: String,
        operation: &'static str,
        reason: String,
    },

    /// Projection non supportée ou coordonnée hors domaine
    #[error("Projection error: {0}")]
    Projection(String),

    /// Paramètre de configuration invalide
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Nature d'un problème de qualité de données
#[derive(Debug, Clone, PartialEq)]
pub enum DataQualityIssue {
    /// Population absente et aucune densité configurée
    MissingPopulation,
    /// Population présente mais non numérique
    InvalidPopulation(String),
    /// Espacement idéal nul ou absent
    ZeroIdealSpacing,
    /// Polygone dégénéré (auto-intersection, anneau trop court...)
    DegenerateGeometry(String),
    /// Zone vide après découpage par la limite administrative
    EmptyAfterClip,
    /// Zone de surface nulle
    ZeroArea,
    /// Nom déjà utilisé par une autre zone, renommée
    DuplicateName { renamed_to: String },
    /// Entité sans zone
    Unassigned,
    /// Référence vers une route inconnue
    UnknownRoute(String),
    /// Identifiant déjà porté par une route précédente, ignorée pour le
    /// rattachement des points
    DuplicateRoute,
    /// Zone trop peu dotée pour mesurer un espacement (politique `exclude`)
    SparseZone { points: usize },
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPopulation => write!(f, "population is missing and no density is configured"),
            Self::InvalidPopulation(raw) => write!(f, "population '{}' is not numeric", raw),
            Self::ZeroIdealSpacing => write!(f, "ideal spacing is zero or missing"),
            Self::DegenerateGeometry(reason) => write!(f, "degenerate geometry ({})", reason),
            Self::EmptyAfterClip => write!(f, "geometry is empty after clipping to the boundary"),
            Self::ZeroArea => write!(f, "zone has zero area"),
            Self::DuplicateName { renamed_to } => {
                write!(f, "duplicate zone name, renamed to '{}'", renamed_to)
            }
            Self::Unassigned => write!(f, "no zone intersects this feature"),
            Self::UnknownRoute(route) => write!(f, "route '{}' does not exist", route),
            Self::DuplicateRoute => write!(f, "route id already used, the first route is kept"),
            Self::SparseZone { points } => {
                write!(f, "{} point(s) are not enough to measure spacing", points)
            }
        }
    }
}

impl QuartierError {
    /// Crée une erreur de qualité de données
    pub fn data_quality(entity: impl Into<String>, issue: DataQualityIssue) -> Self {
        Self::DataQuality {
            entity: entity.into(),
            issue,
        }
    }

    /// Crée une erreur d'opération géométrique
    pub fn geometry_operation(
        entity: impl Into<String>,
        operation: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::GeometryOperation {
            entity: entity.into(),
            operation,
            reason: reason.into(),
        }
    }

    /// Identifiant de l'entité concernée, si l'erreur en porte un
    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::DataQuality { entity, .. } | Self::GeometryOperation { entity, .. } => {
                Some(entity)
            }
            Self::Projection(_) | Self::Config(_) => None,
        }
    }
}
