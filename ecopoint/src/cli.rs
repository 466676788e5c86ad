//! Définition et implémentation des commandes CLI
//!
//! - `run` : analyse complète (zones, rattachement, saturation)
//! - `zones` : construction des zones et capacité seulement
//! - `assign` : zones puis rattachement des routes et des points

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use ecopoint::config;
use ecopoint::report::RunReport;
use ecopoint::store::{GeoJsonSink, GeoJsonSource};
use quartier::{AnalysisConfig, Stage};
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Full analysis: zones, assignment and saturation scoring
    Run(RunArgs),

    /// Build zones and plan their capacity only
    Zones(RunArgs),

    /// Build zones, then assign routes and collection points
    Assign(RunArgs),
}

impl Commands {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Run(_) => Stage::Saturation,
            Self::Zones(_) => Stage::Zones,
            Self::Assign(_) => Stage::Assignment,
        }
    }

    pub fn args(&self) -> &RunArgs {
        match self {
            Self::Run(args) | Self::Zones(args) | Self::Assign(args) => args,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Directory holding zones.geojson, routes.geojson and points.geojson
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory (created if missing)
    #[arg(short, long, default_value = "./output")]
    pub output: PathBuf,

    /// Config preset name (default/bab-ezzouar) or path to a JSON config
    #[arg(long, default_value = "default")]
    pub config: String,

    /// Population density (inhabitants/km²) used when a zone has no population
    #[arg(long)]
    pub density: Option<f64>,

    /// Inhabitants served by one collection point
    #[arg(long)]
    pub service_capacity: Option<u32>,

    /// Saturation threshold in percent (strictly above means saturated)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Also write every layer as CSV with WKT geometry
    #[arg(long)]
    pub csv: bool,

    /// Save the analysis report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Coordinate precision (decimal places). Default: 7 (~1cm)
    #[arg(long, default_value_t = 7)]
    pub precision: u8,
}

/// Résout la configuration : fichier ou preset, puis environnement, puis CLI
pub fn resolve_config(args: &RunArgs) -> Result<AnalysisConfig> {
    let mut config = config::load(&args.config)?;
    config::apply_env_overrides(&mut config)?;

    if let Some(density) = args.density {
        config.zones.population_density = Some(density);
    }
    if let Some(capacity) = args.service_capacity {
        config.capacity.service_capacity = capacity;
    }
    if let Some(threshold) = args.threshold {
        config.saturation.threshold_percent = threshold;
    }

    config.validate()?;
    Ok(config)
}

/// Analyse jusqu'à `stage` et écrit les couches dans le répertoire de sortie
pub fn cmd_run(args: &RunArgs, stage: Stage) -> Result<RunReport> {
    let start = Instant::now();
    let config = resolve_config(args)?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory: {}", args.output.display()))?;

    let source = GeoJsonSource::new(&args.input);
    let mut sink = GeoJsonSink::new(&args.output)
        .with_csv(args.csv)
        .with_precision(args.precision);

    info!(
        input = %source.dir().display(),
        output = %sink.dir().display(),
        config = %args.config,
        stage = %stage,
        "Starting analysis"
    );

    let analysis = quartier::run(&source, &mut sink, &config, stage)?;

    let mut report = RunReport::new(&args.config, stage);
    report.record_analysis(&analysis);
    report.record_skipped_features(source.skipped());
    report.set_duration(start.elapsed());
    report.finalize();

    if let Some(path) = &args.report {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to save report: {}", path.display()))?;
        info!(path = %path.display(), "Report saved");
    }

    println!("{} files written to {}", sink.written().len(), sink.dir().display());
    Ok(report)
}
