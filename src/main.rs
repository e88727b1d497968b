use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use league_insight::analysis::queue::QueueBucket;
use league_insight::analysis::summary::Summarizer;
use league_insight::api::client::RiotApiClient;
use league_insight::api::endpoints::normalize_platform;
use league_insight::config::{load_splits, Config};
use league_insight::display::output::{
    display_champion_table, display_error, display_info, display_match_page, display_rank, display_split,
    display_success, display_warning, display_year,
};
use league_insight::ingest::paginator::{
    fetch_matches_in_window, fetch_matches_since_patch, CollectedMatches, PageReport, PaginationConfig,
};
use league_insight::ingest::patch::find_split;
use league_insight::ingest::{derive_platform, resolve_player_id, PlayerId};
use league_insight::report::{fetch_rank_snapshot, recent_matches};
use std::time::Duration;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "league_insight")]
#[command(about = "Split and year analytics from your League of Legends match history", long_about = None)]
#[command(version)]
struct Cli {
    /// Regional cluster (americas, europe, asia, sea); taken from --platform or probed when omitted
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Platform shard for rank lookups (na1, euw1, ...); derived when omitted
    #[arg(short, long, global = true)]
    platform: Option<String>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse one split: primary queue, best champion, standout metric
    Split {
        /// Riot id, Name#TAG
        riot_id: String,

        /// Split id from the split table (s1, s2, ...)
        #[arg(short, long, default_value = "s1")]
        split: String,

        /// Show the full champion table
        #[arg(long)]
        table: bool,

        /// Maximum pages of 100 match ids to walk
        #[arg(long, default_value = "40")]
        max_pages: usize,
    },

    /// Every split plus the whole year, with current rank
    Year {
        /// Riot id, Name#TAG
        riot_id: String,

        /// Stop once this many matches are collected
        #[arg(long, default_value = "50")]
        sample: usize,

        /// Maximum pages of 100 match ids to walk
        #[arg(long, default_value = "40")]
        max_pages: usize,
    },

    /// Recent match briefs
    Matches {
        /// Riot id, Name#TAG
        riot_id: String,

        /// all, solo, flex, normal, aram or clash
        #[arg(short, long, default_value = "all")]
        mode: String,

        /// Skip this many recent matches
        #[arg(long, default_value = "0")]
        start: usize,

        /// Number of matches to show (max 50)
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Current ranked standing
    Rank {
        /// Riot id, Name#TAG
        riot_id: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli) {
        display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::from_env().context("failed to load configuration")?;
    if cli.region.is_some() {
        config.region = cli.region.clone();
    }
    if cli.platform.is_some() {
        config.platform = cli.platform.clone();
    }

    let client = RiotApiClient::new(&config).context("failed to build API client")?;

    match cli.command {
        Commands::Split {
            riot_id,
            split,
            table,
            max_pages,
        } => {
            let player = resolve(&client, &config, &riot_id)?;
            let splits = load_splits().context("failed to load split windows")?;
            let Some(window) = find_split(&splits, &split) else {
                let known: Vec<&str> = splits.iter().map(|s| s.id.as_str()).collect();
                bail!("unknown split {:?} (known: {})", split, known.join(", "));
            };

            display_info(&format!("Walking match history for patches {}", window.patch_range()));
            let pagination = PaginationConfig {
                max_pages,
                ..PaginationConfig::default()
            };
            let spinner = page_spinner();
            let collected = fetch_matches_in_window(&client, player.region, &player.puuid, window, &pagination, |p| {
                report_page(&spinner, p)
            })
            .context("failed to collect matches")?;
            spinner.finish_and_clear();
            report_collected(&collected);

            let summary = Summarizer::default().summarize_split(&collected.matches, &player.puuid, window);
            display_split(&summary);
            if table {
                display_champion_table(&summary.period.champions);
            }
        }

        Commands::Year {
            riot_id,
            sample,
            max_pages,
        } => {
            let player = resolve(&client, &config, &riot_id)?;
            let splits = load_splits().context("failed to load split windows")?;
            let Some(earliest) = splits.iter().map(|s| s.first).min() else {
                bail!("no split windows configured");
            };

            let pagination = PaginationConfig {
                max_pages,
                sample_target: sample,
                ..PaginationConfig::default()
            };
            let spinner = page_spinner();
            let (collected, platform) = rayon::join(
                || {
                    fetch_matches_since_patch(&client, player.region, &player.puuid, earliest, &pagination, |p| {
                        report_page(&spinner, p)
                    })
                },
                || platform_for(&client, &config, &player),
            );
            spinner.finish_and_clear();
            let collected = collected.context("failed to collect matches")?;
            report_collected(&collected);

            let summary = Summarizer::default().summarize_year(&collected.matches, &player.puuid, &splits);
            display_year(&summary);

            match platform {
                Ok(Some(platform)) => {
                    let rank = fetch_rank_snapshot(&client, player.region, platform, &player.puuid)
                        .context("failed to look up rank")?;
                    display_rank(&player.riot_id(), &rank);
                }
                Ok(None) => display_warning("Could not determine a platform for rank lookup"),
                Err(e) => display_warning(&format!("Rank lookup skipped: {}", e)),
            }
        }

        Commands::Matches {
            riot_id,
            mode,
            start,
            count,
        } => {
            let bucket = match mode.trim().to_lowercase().as_str() {
                "all" => None,
                other => match QueueBucket::parse(other) {
                    Some(bucket) => Some(bucket),
                    None => bail!("unknown mode {:?} (all, solo, flex, normal, aram, clash)", mode),
                },
            };
            let player = resolve(&client, &config, &riot_id)?;
            let page = recent_matches(&client, player.region, &player.puuid, bucket, start, count)
                .context("failed to list matches")?;
            display_match_page(&page);
        }

        Commands::Rank { riot_id } => {
            let player = resolve(&client, &config, &riot_id)?;
            let Some(platform) = platform_for(&client, &config, &player)? else {
                bail!("could not determine a platform for {}", player.riot_id());
            };
            let rank = fetch_rank_snapshot(&client, player.region, platform, &player.puuid)
                .context("failed to look up rank")?;
            display_rank(&player.riot_id(), &rank);
        }
    }

    Ok(())
}

fn resolve(client: &RiotApiClient, config: &Config, riot_id: &str) -> Result<PlayerId> {
    let player = resolve_player_id(client, riot_id, config.region_hint().as_deref())
        .with_context(|| format!("failed to resolve {}", riot_id))?;
    display_success(&format!("Found {} on {}", player.riot_id(), player.region));
    Ok(player)
}

fn platform_for(
    client: &RiotApiClient,
    config: &Config,
    player: &PlayerId,
) -> Result<Option<&'static str>, league_insight::error::AppError> {
    match &config.platform {
        Some(p) => Ok(Some(normalize_platform(p))),
        None => derive_platform(client, player),
    }
}

fn page_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Fetching match history");
    spinner
}

fn report_page(spinner: &ProgressBar, page: &PageReport) {
    let oldest = page.oldest.map(|p| p.to_string()).unwrap_or_else(|| "?".to_string());
    spinner.set_message(format!(
        "Page {}: kept {} of {} (oldest patch {})",
        page.page, page.kept, page.ids, oldest
    ));
}

fn report_collected(collected: &CollectedMatches) {
    display_success(&format!(
        "Collected {} matches from {} pages ({:?})",
        collected.matches.len(),
        collected.pages,
        collected.stop
    ));
    if collected.failed > 0 {
        display_warning(&format!("{} match details could not be fetched", collected.failed));
    }
}
