use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::UserId;
use models::RecommendationRow;
use pipeline::FeatureName;
use server::{RecommendationService, ServiceConfig};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// BookRecs - hybrid book recommendations for library patrons
#[derive(Parser)]
#[command(name = "book-recs")]
#[command(about = "Library book recommendations from BM25 item-kNN with a popularity fallback", long_about = None)]
struct Cli {
    /// Directory holding config.json, bm25_model_config.json and data_config.json
    #[arg(short, long, default_value = "configs")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe the service
    Info,

    /// Fit both models and write recommendations for every user
    Recommend {
        /// Directory for submission.csv (overrides data_config.json)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Recommendations per user (overrides config.json)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a patron's profile, history and recommendations
    User {
        /// Library card number (chb)
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to show
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServiceConfig::load_dir(&cli.config_dir)
        .with_context(|| format!("Failed to load configuration from {}", cli.config_dir.display()))?;
    debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Info => {
            // No data needed; describe without loading the tables
            println!("{}", "BookRecs".bold().blue());
            println!("{}", server::service::INFO_MESSAGE);
            print_config(&config);
        }
        Commands::Recommend { output, limit } => {
            if let Some(output) = output {
                config.data.submissions_path = output;
            }
            if let Some(limit) = limit {
                config.common.n_recos = limit;
            }
            handle_recommend(config)?;
        }
        Commands::User { user_id, limit } => {
            if let Some(limit) = limit {
                config.common.n_recos = limit;
            }
            handle_user(config, &user_id)?;
        }
    }

    Ok(())
}

/// Load the tables and fit both models
fn fitted_service(config: ServiceConfig) -> Result<RecommendationService> {
    println!("Loading tables from {}...", config.data.interactions_path.display());
    let start = Instant::now();
    let mut service = RecommendationService::from_config(config).context("Failed to load library data")?;
    println!(
        "{} Loaded {} users and {} items in {:?}",
        "✓".green(),
        service.dataset().n_users(),
        service.dataset().n_items(),
        start.elapsed()
    );

    let start = Instant::now();
    let generation = service.fit().generation;
    println!("{} Fitted models (generation {}) in {:?}", "✓".green(), generation, start.elapsed());
    Ok(service)
}

/// Handle the 'recommend' command
fn handle_recommend(config: ServiceConfig) -> Result<()> {
    let service = fitted_service(config)?;

    let start = Instant::now();
    let path = service.predict_and_save().context("Prediction failed")?;
    println!(
        "{} Wrote recommendations for {} users to {} in {:?}",
        "✓".green(),
        service.user_ids().len(),
        path.display().to_string().bold(),
        start.elapsed()
    );
    Ok(())
}

/// Handle the 'user' command
fn handle_user(config: ServiceConfig, user_id: &str) -> Result<()> {
    let service = fitted_service(config)?;
    let dataset = service.dataset();

    println!("{}", format!("Patron {}", user_id).bold().blue());
    match dataset.user_id_map().to_internal(user_id) {
        Some(user) => {
            for feature in FeatureName::ALL {
                let value = dataset.user_features().value(user, feature).unwrap_or("-");
                println!("{}{}: {}", "• ".green(), feature, value);
            }

            let history = dataset.user_items(user);
            println!("{}Books borrowed: {}", "• ".cyan(), history.len());
            for entry in history.iter().take(10) {
                if let Some(item_id) = dataset.item_id_map().to_external(entry.item) {
                    println!("  - {} (weight {})", item_id, entry.weight);
                }
            }
        }
        None => println!("{}", "No borrowing history, showing popular books".yellow()),
    }

    let rows = service
        .recommend_for(user_id)
        .with_context(|| format!("Failed to recommend for {}", user_id))?;
    print_recommendations(&rows);
    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(rows: &[RecommendationRow]) {
    println!("{}", "Recommended books:".bold().blue());
    if rows.is_empty() {
        println!("  (nothing left to recommend)");
    }
    for row in rows {
        println!("{}. {}", row.rank.to_string().green(), row.item_id);
    }
}

/// Print the effective configuration
fn print_config(config: &ServiceConfig) {
    println!("{}", "Configuration:".bold());
    println!("  recommendations per user: {}", config.common.n_recos);
    println!(
        "  item-kNN: k={} k1={} b={}",
        config.model.bm25_k, config.model.bm25_k1, config.model.bm25_b
    );
    println!("  cold rule: {:?}", config.common.cold_rule());
    println!("  interactions: {}", config.data.interactions_path.display());
    println!("  submissions: {}", config.data.submissions_path.display());
}
