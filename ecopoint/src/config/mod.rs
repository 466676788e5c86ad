//! Chargement de la configuration d'analyse
//!
//! Ordre de priorité : options CLI > variables d'environnement > fichier ou
//! preset.

use std::path::Path;

use anyhow::{Context, Result};
use quartier::AnalysisConfig;

/// Densité (hab/km²) pour estimer les populations absentes
pub const ENV_POPULATION_DENSITY: &str = "ECOPOINT_POPULATION_DENSITY";
/// Habitants desservis par un point de collecte
pub const ENV_SERVICE_CAPACITY: &str = "ECOPOINT_SERVICE_CAPACITY";
/// Seuil de saturation en %
pub const ENV_SATURATION_THRESHOLD: &str = "ECOPOINT_SATURATION_THRESHOLD";

/// Charge une configuration depuis un fichier JSON ou un preset embarqué
pub fn load(preset_or_path: &str) -> Result<AnalysisConfig> {
    let path = Path::new(preset_or_path);
    if path.is_file() {
        load_file(path)
    } else {
        from_preset(preset_or_path)
    }
}

/// Charge une configuration depuis un fichier
pub fn load_file(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config JSON: {}", path.display()))
}

/// Charge une configuration depuis un preset embarqué
pub fn from_preset(preset: &str) -> Result<AnalysisConfig> {
    match preset {
        "default" => load_embedded(include_str!("presets/default.json")),
        "bab-ezzouar" => load_embedded(include_str!("presets/bab-ezzouar.json")),
        _ => anyhow::bail!(
            "Unknown preset or missing config file: {}. Use: default, bab-ezzouar",
            preset
        ),
    }
}

fn load_embedded(json: &str) -> Result<AnalysisConfig> {
    serde_json::from_str(json).context("Failed to parse embedded config")
}

/// Applique les variables d'environnement (`.env` compris)
pub fn apply_env_overrides(config: &mut AnalysisConfig) -> Result<()> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Applique les surcharges fournies par `lookup`
pub fn apply_overrides_from<F>(config: &mut AnalysisConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_POPULATION_DENSITY) {
        let density: f64 = raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not a number: '{}'", ENV_POPULATION_DENSITY, raw))?;
        config.zones.population_density = Some(density);
    }

    if let Some(raw) = lookup(ENV_SERVICE_CAPACITY) {
        config.capacity.service_capacity = raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not an integer: '{}'", ENV_SERVICE_CAPACITY, raw))?;
    }

    if let Some(raw) = lookup(ENV_SATURATION_THRESHOLD) {
        config.saturation.threshold_percent = raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not a number: '{}'", ENV_SATURATION_THRESHOLD, raw))?;
    }

    Ok(())
}
