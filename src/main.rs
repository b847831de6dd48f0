mod db;
mod enrich;
mod fetch;
mod parser;
mod record;
mod service;
mod settings;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::warn;

use db::Store;
use enrich::ScorecardClient;
use parser::page::Page;
use parser::site;
use record::CollegeRecord;
use service::{Service, WatchRequest};
use settings::Settings;

#[derive(Parser)]
#[command(name = "college_scraper", about = "College profile extraction and tracking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the store with empty collections and default preferences
    Init,
    /// Extract a college page (file or URL), enrich it and save the record
    Analyze {
        /// Saved HTML file or http(s) URL
        source: String,
        /// Page URL used for adapter dispatch (defaults to the source URL)
        #[arg(long)]
        url: Option<String>,
        /// Skip the Scorecard lookup
        #[arg(long)]
        offline: bool,
    },
    /// Extract many saved pages in parallel from a JSON manifest of {url, path}
    Batch {
        manifest: PathBuf,
        /// Skip the Scorecard lookup
        #[arg(long)]
        offline: bool,
    },
    /// Add a page to the watchlist
    Watch {
        url: String,
        /// Display name (default: page heading)
        #[arg(long)]
        name: Option<String>,
        /// Saved copy of the page to read the heading from
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Saved colleges overview table
    List {
        /// Filter by source (e.g. "Niche", "US News")
        #[arg(short, long)]
        source: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Print one saved record as JSON
    Show { name: String },
    /// Print saved records side by side
    Compare {
        #[arg(required = true, num_args = 2..)]
        names: Vec<String>,
    },
    /// Answer one JSON {type, data} message read from stdin
    Message,
    /// Show store statistics
    Stats,
}

#[derive(Deserialize)]
struct ManifestEntry {
    url: String,
    path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Init => {
            let store = open_store(&settings)?;
            if store.init_defaults()? {
                println!("Initialized store at {}", settings.db_path.display());
            } else {
                println!("Store already initialized at {}", settings.db_path.display());
            }
            Ok(())
        }
        Commands::Analyze {
            source,
            url,
            offline,
        } => {
            let svc = service(&settings, offline)?;
            let url = match url {
                Some(u) => u,
                None if fetch::is_remote(&source) => source.clone(),
                None => bail!("--url is required when analyzing a saved file"),
            };
            if !site::is_college_page(&url) {
                warn!("No dedicated adapter for {}, using generic extraction", url);
            }
            let html = load_source(&source, &settings).await?;
            let record = svc.analyze(&url, &html).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Batch { manifest, offline } => {
            let svc = service(&settings, offline)?;
            let raw = std::fs::read_to_string(&manifest)
                .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
            let entries: Vec<ManifestEntry> = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid manifest {}", manifest.display()))?;
            if entries.is_empty() {
                println!("Manifest is empty.");
                return Ok(());
            }

            let t_extract = Instant::now();
            println!("Extracting {} pages...", entries.len());
            let records = extract_pages(&entries)?;
            println!(
                "Extracted {} pages in {:.1}s",
                records.len(),
                t_extract.elapsed().as_secs_f64()
            );

            let mut saved = 0;
            for record in records {
                let name = record.name.clone();
                match svc.enrich_and_save(record).await {
                    Ok(_) => saved += 1,
                    Err(e) => warn!("Failed to save {}: {}", name, e),
                }
            }
            println!("Saved {} of {} records.", saved, entries.len());
            Ok(())
        }
        Commands::Watch { url, name, file } => {
            let svc = service(&settings, true)?;
            let name = match name {
                Some(n) => n,
                None => watch_name(&url, file.as_deref(), &settings).await,
            };
            let resp = svc.add_to_watchlist(WatchRequest {
                name: name.clone(),
                url: url.clone(),
            });
            match (resp.success, resp.inserted) {
                (true, true) => println!("Watching {} ({})", name, url),
                (true, false) => println!("Already watching {}", url),
                _ => bail!("Could not update the watchlist"),
            }
            Ok(())
        }
        Commands::List { source, limit } => {
            let store = open_store(&settings)?;
            let rows: Vec<CollegeRecord> = store
                .colleges()?
                .into_iter()
                .filter(|c| {
                    source
                        .as_deref()
                        .map_or(true, |s| c.source.eq_ignore_ascii_case(s))
                })
                .take(limit)
                .collect();
            if rows.is_empty() {
                println!("No colleges found.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<28} | {:<20} | {:<16} | {:>8} | {:<11} | {:<9}",
                "#", "College", "Location", "Source", "Accept", "SAT", "ACT"
            );
            println!("{}", "-".repeat(112));

            for (i, c) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<28} | {:<20} | {:<16} | {:>8} | {:<11} | {:<9}",
                    i + 1,
                    truncate(&c.name, 28),
                    truncate(&c.location, 20),
                    truncate(&c.source, 16),
                    or_dash(&c.acceptance_rate),
                    or_dash(&c.sat_range),
                    or_dash(&c.act_range),
                );
            }

            let watchlist = store.watchlist()?;
            if !watchlist.is_empty() {
                println!("\n--- Watchlist ---");
                for w in &watchlist {
                    println!("  {}: {}", truncate(&w.name, 28), w.url);
                }
            }

            println!("\n{} colleges", rows.len());
            Ok(())
        }
        Commands::Show { name } => {
            let store = open_store(&settings)?;
            match store.find(&name)? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("No college named {:?}.", name),
            }
            Ok(())
        }
        Commands::Compare { names } => {
            let store = open_store(&settings)?;
            let mut records = Vec::with_capacity(names.len());
            for name in &names {
                match store.find(name)? {
                    Some(r) => records.push(r),
                    None => bail!("No college named {:?}", name),
                }
            }
            print_comparison(&records);
            Ok(())
        }
        Commands::Message => {
            let svc = service(&settings, false)?;
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read message from stdin")?;
            let message: serde_json::Value =
                serde_json::from_str(&input).context("Message is not valid JSON")?;
            if let Some(resp) = svc.handle(&message).await {
                println!("{}", resp);
            }
            Ok(())
        }
        Commands::Stats => {
            let store = open_store(&settings)?;
            let colleges = store.colleges()?;
            let mut by_source = std::collections::BTreeMap::<&str, usize>::new();
            for c in &colleges {
                *by_source.entry(c.source.as_str()).or_default() += 1;
            }
            println!("Colleges:  {}", colleges.len());
            for (source, n) in &by_source {
                println!("  {:<18} {}", source, n);
            }
            println!("Watchlist: {}", store.watchlist()?.len());
            let prefs = store.preferences()?;
            println!(
                "Prefs:     auto-analyze={} notifications={} theme={}",
                prefs.auto_analyze, prefs.show_notifications, prefs.theme
            );
            match store
                .last_sync()?
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            {
                Some(t) => println!("Last sync: {}", t.format("%Y-%m-%d %H:%M:%S UTC")),
                None => println!("Last sync: never (run 'init')"),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn open_store(settings: &Settings) -> anyhow::Result<Store> {
    Store::open(&settings.db_path)
        .with_context(|| format!("Failed to open store {}", settings.db_path.display()))
}

fn service(settings: &Settings, offline: bool) -> anyhow::Result<Service<Option<ScorecardClient>>> {
    let enricher = if offline {
        None
    } else {
        Some(ScorecardClient::new(settings).context("Failed to build Scorecard client")?)
    };
    Ok(Service::new(open_store(settings)?, enricher))
}

async fn load_source(source: &str, settings: &Settings) -> anyhow::Result<String> {
    if fetch::is_remote(source) {
        fetch::fetch_page(source, settings.fetch_timeout()).await
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
    }
}

/// Heading from a saved copy, else from the live page, else the URL itself.
async fn watch_name(url: &str, file: Option<&Path>, settings: &Settings) -> String {
    let html = match file {
        Some(path) => std::fs::read_to_string(path).ok(),
        None => match fetch::fetch_page(url, settings.fetch_timeout()).await {
            Ok(html) => Some(html),
            Err(e) => {
                warn!("Could not fetch {} for its heading: {:#}", url, e);
                None
            }
        },
    };
    html.map(|h| Page::parse(&h).heading_or_title("h1"))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| url.to_string())
}

fn extract_pages(entries: &[ManifestEntry]) -> anyhow::Result<Vec<CollegeRecord>> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let records = entries
        .par_iter()
        .filter_map(|entry| {
            let out = match std::fs::read_to_string(&entry.path) {
                Ok(html) => Some(parser::process_page(&entry.url, &html)),
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path.display(), e);
                    None
                }
            };
            pb.inc(1);
            out
        })
        .collect();

    pb.finish_and_clear();
    Ok(records)
}

fn print_comparison(records: &[CollegeRecord]) {
    const W: usize = 24;
    let rows: [(&str, fn(&CollegeRecord) -> &str); 10] = [
        ("Location", |c| c.location.as_str()),
        ("Type", |c| c.kind.as_str()),
        ("Size", |c| c.size.as_str()),
        ("Acceptance", |c| c.acceptance_rate.as_str()),
        ("In-state", |c| c.tuition.in_state.as_str()),
        ("Out-of-state", |c| c.tuition.out_of_state.as_str()),
        ("SAT", |c| c.sat_range.as_str()),
        ("ACT", |c| c.act_range.as_str()),
        ("GPA", |c| c.gpa.as_str()),
        ("Source", |c| c.source.as_str()),
    ];

    print!("{:<14}", "");
    for c in records {
        print!(" | {:<W$}", truncate(&c.name, W));
    }
    println!();
    println!("{}", "-".repeat(14 + records.len() * (W + 3)));
    for (label, field) in rows {
        print!("{:<14}", label);
        for c in records {
            print!(" | {:<W$}", truncate(or_dash(field(c)), W));
        }
        println!();
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
