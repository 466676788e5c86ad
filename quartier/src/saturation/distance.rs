//! Distance moyenne entre points de collecte

use geo::{HaversineDistance, Point};

use crate::config::DistanceMetric;
use crate::geometry::Projector;

const M_PER_KM: f64 = 1000.0;

/// Espacement mesuré dans une zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneSpacing {
    /// Distance moyenne entre paires de points, en km
    Measured(f64),
    /// Moins de deux points : aucun espacement mesurable
    Sparse { points: usize },
}

impl ZoneSpacing {
    pub fn km(self) -> Option<f64> {
        match self {
            Self::Measured(km) => Some(km),
            Self::Sparse { .. } => None,
        }
    }
}

/// Calcul de l'espacement moyen d'un ensemble de points
///
/// Les points sont en coordonnées géographiques. Une implémentation indexée
/// peut remplacer [`ExhaustivePairs`] tant que la moyenne reste la même.
pub trait PairwiseSpacing: Send + Sync {
    fn mean_spacing(&self, points: &[Point]) -> ZoneSpacing;
}

/// Moyenne sur toutes les paires non ordonnées, en O(n²)
#[derive(Debug, Clone, Copy)]
pub struct ExhaustivePairs {
    metric: DistanceMetric,
    projector: Projector,
}

impl ExhaustivePairs {
    pub fn new(metric: DistanceMetric, projector: Projector) -> Self {
        Self { metric, projector }
    }

    fn mean_over_pairs<T, F>(items: &[T], distance: F) -> f64
    where
        F: Fn(&T, &T) -> f64,
    {
        let mut total = 0.0;
        let mut pairs = 0_u64;
        for (i, a) in items.iter().enumerate() {
            for b in &items[i + 1..] {
                total += distance(a, b);
                pairs += 1;
            }
        }
        total / pairs as f64
    }
}

impl PairwiseSpacing for ExhaustivePairs {
    fn mean_spacing(&self, points: &[Point]) -> ZoneSpacing {
        if points.len() < 2 {
            return ZoneSpacing::Sparse {
                points: points.len(),
            };
        }

        let mean = match self.metric {
            DistanceMetric::Projected => {
                let projected: Vec<_> = points.iter().map(|p| self.projector.forward_coord(p.0)).collect();
                Self::mean_over_pairs(&projected, |a, b| (a.x - b.x).hypot(a.y - b.y) / M_PER_KM)
            }
            DistanceMetric::Haversine => {
                Self::mean_over_pairs(points, |a, b| a.haversine_distance(b) / M_PER_KM)
            }
        };

        ZoneSpacing::Measured(mean)
    }
}
