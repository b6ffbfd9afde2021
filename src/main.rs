use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use konser_lakehouse::{
    report, Config, GoldOutput, Lakehouse, Layer, PrescriptiveEngine, Recommendation,
};

/// Concert expense lakehouse: Bronze -> Silver -> Gold plus budget recommendations
#[derive(Parser, Debug)]
#[command(name = "konser-lakehouse")]
#[command(version)]
struct Cli {
    /// TOML settings file; environment variables override it
    #[arg(short, long, global = true, env = "KONSER_CONFIG")]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline on a CSV file and rank the concerts that fit the budget
    Run {
        /// Source CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Budget in Rupiah
        #[arg(short, long, value_parser = parse_budget)]
        budget: f64,

        /// Ranked rows to print
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print the result as JSON instead of tables
        #[arg(long, conflicts_with = "tui")]
        json: bool,

        /// Browse the result in the terminal UI
        #[arg(long)]
        tui: bool,

        /// Also write the full ranking to this CSV file
        #[arg(long, value_name = "PATH")]
        save_ranking: Option<PathBuf>,
    },

    /// List persisted files
    Files {
        #[arg(short, long, conflicts_with = "latest")]
        layer: Option<Layer>,

        /// Only the newest file of each layer
        #[arg(long)]
        latest: bool,
    },

    /// Print a download link (presigned on MinIO, a path on local storage)
    Url { identifier: String },

    /// Delete a persisted file
    Delete { identifier: String },
}

fn parse_budget(s: &str) -> std::result::Result<f64, String> {
    let budget: f64 = s.trim().parse().map_err(|_| format!("not a number: {}", s))?;
    if !budget.is_finite() || budget <= 0.0 {
        return Err("budget must be greater than 0".to_string());
    }
    Ok(budget)
}

#[derive(Serialize)]
struct RunOutput<'a> {
    timestamp: &'a str,
    budget: f64,
    gold: &'a GoldOutput,
    recommendation: Option<&'a Recommendation>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "konser_lakehouse=debug"
    } else {
        "konser_lakehouse=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Run {
            input,
            budget,
            top,
            json,
            tui,
            save_ranking,
        } => {
            let options = RunOptions {
                top,
                json,
                tui,
                save_ranking,
            };
            run_pipeline(&config, &input, budget, &options)
        }
        Command::Files { latest: true, .. } => list_latest(&config),
        Command::Files { layer, .. } => list_files(&config, layer),
        Command::Url { identifier } => print_url(&config, &identifier),
        Command::Delete { identifier } => delete_file(&config, &identifier),
    }
}

fn open_lakehouse(config: &Config) -> Result<Lakehouse> {
    let lakehouse = Lakehouse::new(config).context("Failed to open storage")?;
    info!(backend = lakehouse.store().backend_name(), "storage ready");
    Ok(lakehouse)
}

struct RunOptions {
    top: usize,
    json: bool,
    tui: bool,
    save_ranking: Option<PathBuf>,
}

fn run_pipeline(
    config: &Config,
    input: &std::path::Path,
    budget: f64,
    options: &RunOptions,
) -> Result<()> {
    let mut lakehouse = open_lakehouse(config)?;
    let run = lakehouse
        .run(input, budget)
        .with_context(|| format!("Pipeline failed for {}", input.display()))?;
    info!(timestamp = %run.timestamp, "lakehouse ready");

    let recommendation = PrescriptiveEngine::new(&run.gold.records, budget)
        .with_weights(config.weights)
        .calc_scores();

    if let Some(path) = &options.save_ranking {
        save_ranking(recommendation.as_ref(), path)?;
    }

    if options.json {
        let output = RunOutput {
            timestamp: &run.timestamp,
            budget,
            gold: &run.gold,
            recommendation: recommendation.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if options.tui {
        return browse(&run.gold, recommendation.as_ref(), budget);
    }

    println!("{}", report::gold_summary(&run.gold, budget));
    println!("{}", report::location_table(&run.gold.location_stats));
    if let Some(rec) = &recommendation {
        println!("{}", report::ranking_table(rec.top(options.top)));
    }
    print!("{}", report::recommendation_summary(recommendation.as_ref()));
    Ok(())
}

fn save_ranking(recommendation: Option<&Recommendation>, path: &std::path::Path) -> Result<()> {
    let Some(rec) = recommendation else {
        warn!(path = %path.display(), "no concert fits the budget, ranking not written");
        return Ok(());
    };
    let bytes = rec.ranked_csv().context("Failed to encode ranking")?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write ranking to {}", path.display()))?;
    info!(path = %path.display(), rows = rec.ranked.len(), "ranking saved");
    Ok(())
}

#[cfg(feature = "tui")]
fn browse(gold: &GoldOutput, recommendation: Option<&Recommendation>, budget: f64) -> Result<()> {
    let mut app = konser_lakehouse::ui::App::new(gold, recommendation, budget);
    konser_lakehouse::ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn browse(_gold: &GoldOutput, _recommendation: Option<&Recommendation>, _budget: f64) -> Result<()> {
    bail!("terminal UI not available, rebuild with --features tui")
}

fn list_files(config: &Config, layer: Option<Layer>) -> Result<()> {
    let lakehouse = open_lakehouse(config)?;
    let layers = match layer {
        Some(layer) => vec![layer],
        None => Layer::ALL.to_vec(),
    };

    for layer in layers {
        let folder = layer.folder(lakehouse.folders());
        let files = lakehouse
            .store()
            .list(folder)
            .with_context(|| format!("Failed to list {}", folder))?;

        println!("{} ({} file(s))", layer.name(), files.len());
        for id in files {
            println!("  {}", id);
        }
    }
    Ok(())
}

fn list_latest(config: &Config) -> Result<()> {
    let lakehouse = open_lakehouse(config)?;
    let latest = lakehouse
        .latest_outputs()
        .context("Failed to list latest outputs")?;

    if latest.is_empty() {
        println!("no outputs yet");
    }
    for (layer, id) in latest {
        println!("{:<7} {}", layer.name(), id);
    }
    Ok(())
}

fn print_url(config: &Config, identifier: &str) -> Result<()> {
    let lakehouse = open_lakehouse(config)?;
    match lakehouse.store().presigned_url(identifier)? {
        Some(url) => println!("{}", url),
        None => println!("{}", identifier),
    }
    Ok(())
}

fn delete_file(config: &Config, identifier: &str) -> Result<()> {
    let lakehouse = open_lakehouse(config)?;
    if !lakehouse.store().delete(identifier)? {
        bail!("not found: {}", identifier);
    }
    println!("deleted {}", identifier);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_budget() {
        assert_eq!(parse_budget("3000000"), Ok(3_000_000.0));
        assert_eq!(parse_budget(" 1.5 "), Ok(1.5));
        assert!(parse_budget("0").is_err());
        assert!(parse_budget("-5").is_err());
        assert!(parse_budget("abc").is_err());
        assert!(parse_budget("inf").is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "konser-lakehouse",
            "run",
            "--input",
            "konser.csv",
            "--budget",
            "3000000",
            "--top",
            "5",
        ])
        .unwrap();

        match cli.command {
            Command::Run { budget, top, json, .. } => {
                assert_eq!(budget, 3_000_000.0);
                assert_eq!(top, 5);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_zero_budget() {
        let result = Cli::try_parse_from([
            "konser-lakehouse",
            "run",
            "--input",
            "konser.csv",
            "--budget",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_layer() {
        let cli = Cli::try_parse_from(["konser-lakehouse", "files", "--layer", "gold"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Files {
                layer: Some(Layer::Gold),
                latest: false
            }
        ));
    }

    #[test]
    fn test_cli_parses_latest_files() {
        let cli = Cli::try_parse_from(["konser-lakehouse", "files", "--latest"]).unwrap();
        assert!(matches!(cli.command, Command::Files { layer: None, latest: true }));

        let both = Cli::try_parse_from(["konser-lakehouse", "files", "--latest", "--layer", "gold"]);
        assert!(both.is_err(), "--latest already covers every layer");
    }

    #[test]
    fn test_cli_parses_save_ranking() {
        let cli = Cli::try_parse_from([
            "konser-lakehouse",
            "run",
            "--input",
            "konser.csv",
            "--budget",
            "3000000",
            "--save-ranking",
            "ranking.csv",
        ])
        .unwrap();

        match cli.command {
            Command::Run { save_ranking, .. } => {
                assert_eq!(save_ranking, Some(PathBuf::from("ranking.csv")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_save_ranking_writes_csv() {
        use konser_lakehouse::record::{Affordability, GoldRecord};

        let rows = vec![GoldRecord {
            name: "BTS".to_string(),
            location: Some("Jakarta".to_string()),
            date: None,
            ticket_price: None,
            transport_cost: None,
            accommodation_cost: None,
            merchandise: Some(10.0),
            total: 100.0,
            efficiency_score: 0.1,
            affordability: Affordability::VeryAffordable,
        }];
        let rec = PrescriptiveEngine::new(&rows, 200.0).calc_scores();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ranking.csv");
        save_ranking(rec.as_ref(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 2, "header plus one ranked row");
        assert!(written.contains("BTS"));

        let missing = dir.path().join("none.csv");
        save_ranking(None, &missing).unwrap();
        assert!(!missing.exists(), "nothing is written without a feasible concert");
    }

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
