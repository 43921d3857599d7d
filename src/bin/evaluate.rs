use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use stayrec::engine::model::RatingTable;
use stayrec::engine::{aggregator, evaluator, CollaborativeModel};
use stayrec::{init_tracing, Config, InteractionEvent};
use tracing::info;

/// Offline ranking evaluation over an interaction-event dump.
///
/// Reads a JSON array of events, aggregates them into a rating table,
/// holds out a deterministic test split, trains a model on the remainder,
/// and prints Precision/Recall@K. Pass --full-model to instead score a
/// model trained on everything, which measures memorization and is
/// reported as biased.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON file containing an array of interaction events
    #[arg(short, long)]
    events: String,

    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Cutoff for the ranking metrics
    #[arg(short, long)]
    k: Option<usize>,

    /// Evaluate a model trained on the full table instead of the train split
    #[arg(long)]
    full_model: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        Config::default()
    };
    let k = args.k.unwrap_or(config.evaluation.k);

    let raw = std::fs::read_to_string(&args.events)
        .with_context(|| format!("reading events from {}", args.events))?;
    let events: Vec<InteractionEvent> =
        serde_json::from_str(&raw).context("parsing events JSON")?;
    info!(events = events.len(), "loaded interaction events");

    let table = aggregator::aggregate(&events, Utc::now(), &config.decay)?;
    info!(
        users = table.users().len(),
        items = table.items().len(),
        ratings = table.entries().len(),
        "aggregated rating table"
    );

    let (train, test) = evaluator::split_train_test(
        table.entries(),
        config.evaluation.test_ratio,
        config.evaluation.seed,
    );

    let report = if args.full_model {
        let model = CollaborativeModel::train(&table);
        evaluator::precision_recall_at_k(
            &model,
            &test,
            k,
            config.recommendation.top_k_neighbors,
            true,
        )
    } else {
        let model = CollaborativeModel::train(&RatingTable::from_entries(train));
        evaluator::precision_recall_at_k(
            &model,
            &test,
            k,
            config.recommendation.top_k_neighbors,
            false,
        )
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
