//! Rapport d'analyse
//!
//! Compteurs par étape, scores par zone et problèmes de données collectés
//! pendant l'analyse.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use quartier::{Analysis, DataQualityIssue, QuartierError, Stage, ZoneScore};
use serde::Serialize;

/// Statut global de l'analyse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Aucun problème de données
    Success,
    /// Des entités ont été exclues ou renommées
    PartialSuccess,
    /// Aucune zone exploitable
    Failed,
}

/// Niveau de sévérité d'un problème
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueLevel {
    /// Entité exclue de l'analyse
    Error,
    /// Entité conservée avec dégradation
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunIssue {
    pub level: IssueLevel,
    pub entity: Option<String>,
    pub message: String,
}

impl From<&QuartierError> for RunIssue {
    fn from(err: &QuartierError) -> Self {
        let level = match err {
            QuartierError::DataQuality {
                issue:
                    DataQualityIssue::DuplicateName { .. }
                    | DataQualityIssue::DuplicateRoute
                    | DataQualityIssue::UnknownRoute(_),
                ..
            } => IssueLevel::Warning,
            _ => IssueLevel::Error,
        };

        Self {
            level,
            entity: err.entity().map(str::to_string),
            message: err.to_string(),
        }
    }
}

/// Rapport complet d'une analyse
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Configuration utilisée (preset ou fichier)
    pub config: String,
    pub stage: Stage,
    pub duration_secs: f64,
    pub status: RunStatus,

    pub zones: usize,
    pub zones_scored: usize,
    pub routes: usize,
    pub routes_unassigned: usize,
    pub points_saturated: usize,
    pub points_not_saturated: usize,
    pub points_unscored: usize,
    /// Features d'entrée illisibles
    pub features_skipped: usize,

    pub scores: Vec<ZoneScore>,
    pub issues: Vec<RunIssue>,
}

impl RunReport {
    pub fn new(config: &str, stage: Stage) -> Self {
        Self {
            config: config.to_string(),
            stage,
            duration_secs: 0.0,
            status: RunStatus::Success,
            zones: 0,
            zones_scored: 0,
            routes: 0,
            routes_unassigned: 0,
            points_saturated: 0,
            points_not_saturated: 0,
            points_unscored: 0,
            features_skipped: 0,
            scores: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Reprend les compteurs et les erreurs d'une analyse
    pub fn record_analysis(&mut self, analysis: &Analysis) {
        self.stage = analysis.stage;
        self.zones = analysis.zones.len();
        self.zones_scored = analysis.scores.len();
        self.routes = analysis.routes.len();
        self.routes_unassigned = analysis
            .routes
            .iter()
            .filter(|r| !r.zone.is_assigned())
            .count();
        self.points_saturated = analysis.saturated.len();
        self.points_not_saturated = analysis.not_saturated.len();
        self.points_unscored = analysis.unscored.len();
        self.scores = analysis.scores.clone();
        self.issues.extend(analysis.errors.iter().map(RunIssue::from));
    }

    pub fn record_skipped_features(&mut self, count: usize) {
        self.features_skipped += count;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = if self.zones == 0 {
            RunStatus::Failed
        } else if self.issues.is_empty() && self.features_skipped == 0 {
            RunStatus::Success
        } else {
            RunStatus::PartialSuccess
        };
    }

    pub fn errors(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.level == IssueLevel::Error)
            .count()
    }

    pub fn warnings(&self) -> usize {
        self.issues.len() - self.errors()
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("ANALYSIS REPORT - {} ({})", self.stage, self.config);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!("Zones: {} built, {} scored", self.zones, self.zones_scored);
        println!(
            "Routes: {} total, {} unassigned",
            self.routes, self.routes_unassigned
        );
        println!(
            "Points: {} saturated, {} not saturated, {} unscored",
            self.points_saturated, self.points_not_saturated, self.points_unscored
        );
        if self.features_skipped > 0 {
            println!("Input features skipped: {}", self.features_skipped);
        }

        if !self.scores.is_empty() {
            println!("\n--- BY ZONE ---");
            for s in &self.scores {
                let spacing = s
                    .actual_spacing_km
                    .map_or_else(|| "-".to_string(), |km| format!("{:.3} km", km));
                println!(
                    "  {}: {}/{} points, spacing {} (ideal {:.3} km), {:.1}% {:?}",
                    s.name,
                    s.point_count,
                    s.ideal_point_count,
                    spacing,
                    s.ideal_spacing_km,
                    s.degree,
                    s.state
                );
            }
        }

        let warnings: Vec<_> = self
            .issues
            .iter()
            .filter(|i| i.level == IssueLevel::Warning)
            .collect();
        if !warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", warnings.len());
            for w in warnings.iter().take(10) {
                println!("  {}", w.message);
            }
            if warnings.len() > 10 {
                println!("  ... and {} more", warnings.len() - 10);
            }
        }

        let errors: Vec<_> = self
            .issues
            .iter()
            .filter(|i| i.level == IssueLevel::Error)
            .collect();
        if !errors.is_empty() {
            println!("\n--- ERRORS ({}) ---", errors.len());
            for e in errors.iter().take(20) {
                println!("  {}", e.message);
            }
            if errors.len() > 20 {
                println!("  ... and {} more", errors.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{} zones, {} saturated, {} not saturated, {} unscored, {} errors, {} warnings",
            self.zones,
            self.points_saturated,
            self.points_not_saturated,
            self.points_unscored,
            self.errors(),
            self.warnings()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_levels() {
        let dup = QuartierError::data_quality(
            "Q1",
            DataQualityIssue::DuplicateName {
                renamed_to: "Q1 (2)".to_string(),
            },
        );
        let missing = QuartierError::data_quality("Q2", DataQualityIssue::MissingPopulation);

        assert_eq!(RunIssue::from(&dup).level, IssueLevel::Warning);
        let issue = RunIssue::from(&missing);
        assert_eq!(issue.level, IssueLevel::Error);
        assert_eq!(issue.entity.as_deref(), Some("Q2"));
    }

    #[test]
    fn test_finalize() {
        let mut report = RunReport::new("default", Stage::Saturation);
        report.finalize();
        assert_eq!(report.status, RunStatus::Failed);

        report.zones = 3;
        report.finalize();
        assert_eq!(report.status, RunStatus::Success);

        report.record_skipped_features(2);
        report.finalize();
        assert_eq!(report.status, RunStatus::PartialSuccess);
    }

    #[test]
    fn test_summary() {
        let mut report = RunReport::new("bab-ezzouar", Stage::Saturation);
        report.zones = 2;
        report.points_saturated = 5;
        report.points_not_saturated = 7;
        report
            .issues
            .push(RunIssue::from(&QuartierError::data_quality(
                "point p1",
                DataQualityIssue::Unassigned,
            )));
        report
            .issues
            .push(RunIssue::from(&QuartierError::data_quality(
                "route r1",
                DataQualityIssue::DuplicateRoute,
            )));

        assert_eq!(
            report.summary(),
            "2 zones, 5 saturated, 7 not saturated, 0 unscored, 1 errors, 1 warnings"
        );
        assert_eq!(report.errors(), 1);
        assert_eq!(report.warnings(), 1);
    }

    #[test]
    fn test_save_to_file() {
        let path = std::env::temp_dir().join("ecopoint_test_report.json");
        let mut report = RunReport::new("default", Stage::Zones);
        report.zones = 1;
        report.finalize();
        report.save_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["status"], "Success");
        assert_eq!(parsed["stage"], "Zones");

        std::fs::remove_file(path).ok();
    }
}
