use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use anime_network::{
    build_matrix, fingerprint, read_episodes_csv, trim, Artifact, GraphBuilder, NetworkCache,
    DEFAULT_MIN_APPEARANCES,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let episodes_path = args
        .next()
        .unwrap_or_else(|| "data/episodes.csv".to_string());
    let min_appearances = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid min_appearances: {raw}"))?,
        None => DEFAULT_MIN_APPEARANCES,
    };

    let episodes =
        read_episodes_csv(&episodes_path).with_context(|| format!("reading {episodes_path}"))?;
    let matrix = build_matrix(&episodes, min_appearances)?;
    let fp = fingerprint(&matrix, min_appearances)?;

    let cache = NetworkCache::default();
    let artifact = match cache.load_validated(fp) {
        Ok(artifact) => {
            info!(path = %cache.path().display(), "reusing cached network");
            artifact
        }
        Err(miss) => {
            warn!(%miss, "rebuilding network from source data");
            let graph = GraphBuilder::default().build(&matrix)?;
            let artifact = Artifact { matrix, graph };
            cache.save(&artifact, fp)?;
            artifact
        }
    };

    let result = trim(&artifact.graph)?;
    println!("Maximum cutoff weight: {}", result.cutoff_weight);
    println!(
        "Percentage of edges removed: {:.2}%",
        result.percentage_removed
    );
    println!("Strongest relationships:");
    for (a, b, weight) in result.graph.top_edges(5) {
        println!("  {a} -- {b}: {weight:.3}");
    }

    Ok(())
}
