use std::{fs::File, io::BufReader, path::PathBuf};

use clap::Parser;
use safewalk::{
    config::SelectionConfig,
    engine::rank_candidates,
    models::{CandidateRoute, CandidateSummary},
    weights::SubregionWeights,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Score saved candidate routes against subregion safety weights"
)]
struct Args {
    /// JSON array of candidate routes (source, legs, overview_polyline)
    #[arg(long)]
    routes: PathBuf,

    /// JSON array of {lat, lng, weight} safety cells
    #[arg(long)]
    weights: PathBuf,

    /// Minimum spacing in degrees below which consecutive nodes are merged
    #[arg(long, default_value_t = 0.0002)]
    min_node_spacing: f64,

    /// Target spacing in degrees of the densified points
    #[arg(long, default_value_t = 0.0004)]
    target_spacing: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let candidates: Vec<CandidateRoute> =
        serde_json::from_reader(BufReader::new(File::open(&args.routes)?))?;
    let weights = SubregionWeights::from_file(&args.weights)?;
    tracing::info!(
        "scoring {} candidates from {:?} against {} cells",
        candidates.len(),
        args.routes,
        weights.len()
    );

    let mut config = SelectionConfig::default();
    config.densify.min_node_spacing = args.min_node_spacing;
    config.densify.target_spacing = args.target_spacing;

    let selection = rank_candidates(candidates, &weights, &config)?;
    let summaries: Vec<CandidateSummary> = selection.summaries();
    println!("{}", serde_json::to_string_pretty(&summaries)?);
    tracing::info!(
        "safest route is #{} ({})",
        selection.winner(),
        selection.winning_candidate().source
    );

    Ok(())
}
