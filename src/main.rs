use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cwl_analyzer::analyzer::{CwlAnalyzer, LeagueAnalysis};
use cwl_analyzer::config::{AppConfig, TrackedClan};
use cwl_analyzer::fetch::{ApiClient, ApiClientConfig, CocApi, FixtureApi};
use cwl_analyzer::models::{ClanTag, PlayerRow, War, WarPayload};
use cwl_analyzer::period_for;
use cwl_analyzer::storage::{
    list_periods, FileLeagueCache, JsonlReader, ReportFile, StorageConfig,
};

#[derive(Parser)]
#[command(name = "cwl-analyzer")]
#[command(about = "Clan War League scoring, standings and promotion tracker")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the current league of every configured clan
    Analyze {
        /// Only analyze the clan with this alias
        #[arg(long)]
        clan: Option<String>,

        /// Period label for stored results (default: current month, e.g. "OCT")
        #[arg(long)]
        period: Option<String>,

        /// Rebuild leagues even when a cached copy exists
        #[arg(long)]
        recheck: bool,

        /// Serve API responses from a fixture directory instead of the live API
        #[arg(long)]
        fixtures: Option<PathBuf>,
    },

    /// Score a single saved war JSON file
    ScoreWar {
        /// Path to a war payload
        path: PathBuf,

        /// Tag of the clan whose players are scored
        #[arg(long)]
        clan_tag: String,
    },

    /// Print a stored leaderboard
    Show {
        /// Clan alias
        clan: String,

        /// Period label (default: current month)
        #[arg(long)]
        period: Option<String>,
    },

    /// List periods with stored results
    Periods,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; the token may come from the environment
    let _ = dotenvy::from_filename(".env");

    let mut config = load_config(Path::new(&cli.config))?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(data_dir);
    }

    // Initialize tracing
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));
    let json_layer = cli
        .json_logs
        .then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!cli.json_logs).then(|| tracing_subscriber::fmt::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .init();

    tracing::info!("Starting cwl-analyzer v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());

    match cli.command {
        Commands::Analyze {
            clan,
            period,
            recheck,
            fixtures,
        } => {
            let clans: Vec<TrackedClan> = match clan {
                Some(alias) => match config.clan(&alias) {
                    Some(tracked) => vec![tracked.clone()],
                    None => bail!("Unknown clan alias: {}", alias),
                },
                None => config.clans.clone(),
            };
            if clans.is_empty() {
                bail!("No clans configured in {}", cli.config);
            }

            let period = period.unwrap_or_else(current_period);
            let api = build_api(&config, fixtures.as_deref())?;
            let cache = FileLeagueCache::new(storage.clone());
            let analyzer = CwlAnalyzer::new(
                api.as_ref(),
                &cache,
                config.scoring,
                config.promotion_rules()?,
            )
            .with_recheck(recheck || config.recheck);

            let mut failures = 0usize;
            for tracked in &clans {
                match analyzer.analyze(tracked, &period).await {
                    Ok(analysis) => {
                        print_analysis(&analysis);
                        if let Err(e) = analysis.write_reports(&storage) {
                            tracing::error!(clan = %tracked.alias, "Failed to write reports: {}", e);
                            failures += 1;
                        }
                    }
                    Err(e) => {
                        tracing::error!(clan = %tracked.alias, "Analysis failed: {}", e);
                        failures += 1;
                    }
                }
            }

            if failures > 0 {
                tracing::warn!("{} of {} clans failed", failures, clans.len());
            }
            if failures == clans.len() {
                bail!("Every clan failed to analyze");
            }
        }
        Commands::ScoreWar { path, clan_tag } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let payload: WarPayload = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse war payload {:?}", path))?;

            let clan_tag = ClanTag::new(&clan_tag);
            let Some(war) = War::from_payload(payload, &clan_tag)? else {
                bail!("Clan {} does not take part in this war", clan_tag);
            };
            print_war(&war, &config);
        }
        Commands::Show { clan, period } => {
            let period = period.unwrap_or_else(current_period);
            let reader: JsonlReader<PlayerRow> =
                JsonlReader::for_report(&storage, ReportFile::Players, &period, &clan)?;
            if !reader.exists() {
                println!("No results for {} in {}.", clan, period);
                println!("Run `analyze --clan {} --period {}` first.", clan, period);
                return Ok(());
            }

            println!("=== {} ({}) ===\n", clan, period);
            print_rows(&reader.read_all()?);
        }
        Commands::Periods => {
            let periods = list_periods(&storage)?;
            if periods.is_empty() {
                println!("No stored results under {:?}", storage.results_root());
            }
            for period in periods {
                println!("{}", period);
            }
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::from_file(path).with_context(|| format!("Failed to load {:?}", path))
    } else {
        Ok(AppConfig::default())
    }
}

fn current_period() -> String {
    period_for(chrono::Utc::now().date_naive())
}

fn build_api(config: &AppConfig, fixtures: Option<&Path>) -> Result<Box<dyn CocApi>> {
    if let Some(dir) = fixtures {
        tracing::info!("Using fixtures from {:?}", dir);
        return Ok(Box::new(FixtureApi::from_dir(dir)?));
    }

    let client = ApiClient::new(ApiClientConfig {
        base_url: url::Url::parse(&config.api.base_url)?,
        token: config.api.token()?,
        timeout: Duration::from_secs(config.api.timeout_seconds),
        user_agent: format!("cwl-analyzer/{}", env!("CARGO_PKG_VERSION")),
    })?;
    Ok(Box::new(client))
}

fn print_analysis(analysis: &LeagueAnalysis) {
    let league = &analysis.league;
    println!(
        "\n=== {} ({}) - {} ===\n",
        league.clan_info.name,
        league.clan_tag,
        analysis.period
    );
    println!(
        "League:      {}",
        league.tier().unwrap_or("unknown")
    );
    println!("Wars:        {}", league.wars.len());
    if let Some(mean) = analysis.mean_th_levels() {
        println!("Mean TH:     {:.2} vs {:.2}", mean.home, mean.enemy);
    }
    println!(
        "Attacks:     {} (3*: {}, 2*: {}, 1*: {}, 0*: {}, missed: {})\n",
        analysis.stars.attacks(),
        analysis.stars.three,
        analysis.stars.two,
        analysis.stars.one,
        analysis.stars.zero,
        analysis.stars.missed
    );

    print_rows(&analysis.player_rows());

    println!("\nStandings:");
    for (i, standing) in league.standings.iter().enumerate() {
        let marker = if standing.tag == league.clan_tag { " <" } else { "" };
        println!(
            "  {:>2}. {:<24} {:>4} stars {:>9.1}%{}",
            i + 1,
            standing.name,
            standing.stars,
            standing.destruction,
            marker
        );
    }

    match league.placement {
        Some(placement) => println!(
            "\nPlaced {} of {}: {}",
            placement,
            league.standings.len(),
            league.promotion_status
        ),
        None => println!("\nNot placed: {}", league.promotion_status),
    }
}

fn print_rows(rows: &[PlayerRow]) {
    println!(
        "  {:>4}  {:<20} {:<12} {:>9} {:>7} {:>9}",
        "Rank", "Name", "Tag", "Score", "Attacks", "Average"
    );
    for row in rows {
        let average = row
            .average_score
            .map(|a| format!("{:.2}", a))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:>4}  {:<20} {:<12} {:>9.2} {:>3}/{:<3} {:>9}",
            row.rank,
            row.name,
            row.tag.as_str(),
            row.score,
            row.attacks,
            row.wars_participated,
            average
        );
    }
}

fn print_war(war: &War, config: &AppConfig) {
    let result = match war.won() {
        Some(true) => "Won",
        Some(false) => "Lost",
        None if war.ended => "Tied",
        None => "In progress",
    };
    println!(
        "=== {} vs {}: {} ===\n",
        war.home_clan.name, war.enemy_clan.name, result
    );

    let mut scored: Vec<(&str, f64)> = war
        .players
        .iter()
        .map(|player| (player.name.as_str(), config.scoring.score(player)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    for (name, score) in scored {
        println!("  {:<20} {:>9.2}", name, score);
    }
}
