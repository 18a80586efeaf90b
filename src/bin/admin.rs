//! CLI administration tool for resilient-cache.
//!
//! Inspects and maintains the on-disk cache tiers and checks reachability
//! without going through the HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # List durable cache entries
//! cargo run --bin admin -- cache list
//!
//! # Show the cached response for a request path
//! cargo run --bin admin -- cache show "/api/bugs?page=1"
//!
//! # Delete all durable entries
//! cargo run --bin admin -- cache purge
//!
//! # List locally cached images
//! cargo run --bin admin -- images list
//!
//! # Run the connectivity probe once
//! cargo run --bin admin -- network probe
//! ```
//!
//! # Environment Variables
//!
//! - `CACHE_DIR` (default `cache/api`): durable tier directory
//! - `IMAGE_CACHE_DIR` (default `cache/images`): image store directory
//! - `IMAGE_PUBLIC_PATH` (default `/media/images`): public image prefix
//! - `PROBE_URL`, `PROBE_TIMEOUT_SECONDS`: connectivity probe
//! - `REDIS_URL` (optional): also inspect the Redis volatile tier

use resilient_cache::domain::entities::{CacheKey, CachedResponse, RequestIdentity, cache_key};
use resilient_cache::domain::gateways::ConnectivityProbe;
use resilient_cache::domain::repositories::{DurableCache, VolatileCache};
use resilient_cache::infrastructure::cache::{FileCache, RedisCache};
use resilient_cache::infrastructure::http::HttpProbe;
use resilient_cache::infrastructure::media::FileImageRepository;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// CLI tool for managing resilient-cache.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and maintain cached API responses
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Inspect locally cached images
    Images {
        #[command(subcommand)]
        action: ImagesAction,
    },

    /// Network diagnostics
    Network {
        #[command(subcommand)]
        action: NetworkAction,
    },
}

/// Response cache subcommands.
#[derive(Subcommand)]
enum CacheAction {
    /// List durable entries
    List,

    /// Show the cached response for a request
    Show {
        /// Request path with query (e.g. "/api/bugs?page=1") or a full cache key
        target: String,
    },

    /// Delete every durable entry
    Purge {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Image store subcommands.
#[derive(Subcommand)]
enum ImagesAction {
    /// List cached images, newest first
    List,
}

/// Network subcommands.
#[derive(Subcommand)]
enum NetworkAction {
    /// Run the connectivity probe once
    Probe,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cache { action } => handle_cache_action(action).await?,
        Commands::Images { action } => handle_images_action(action).await?,
        Commands::Network { action } => handle_network_action(action).await?,
    }

    Ok(())
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn durable_store() -> FileCache {
    FileCache::new(PathBuf::from(env_or("CACHE_DIR", "cache/api")))
}

/// Dispatches response cache commands.
async fn handle_cache_action(action: CacheAction) -> Result<()> {
    let store = durable_store();

    match action {
        CacheAction::List => list_entries(&store).await?,
        CacheAction::Show { target } => show_entry(&store, &target).await?,
        CacheAction::Purge { yes } => purge_entries(&store, yes).await?,
    }

    Ok(())
}

/// Lists durable entries with size and age.
///
/// # Output Format
///
/// ```text
/// 📋 Durable cache (cache/api)
///
///   Entry                                              Size        Age
///   ─────────────────────────────────────────────────────────────────────────
///   api_cache_GET_api_bugs?page=1                      2.4 KiB     3h 12m
/// ```
async fn list_entries(store: &FileCache) -> Result<()> {
    println!(
        "{} {}",
        "📋 Durable cache".bright_blue().bold(),
        format!("({})", store.cache_dir().display()).bright_black()
    );
    println!();

    let entries = store
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list cache entries: {}", e))?;

    if entries.is_empty() {
        println!("{}", "  No entries found".yellow());
        return Ok(());
    }

    println!(
        "  {:<50} {:<11} {}",
        "Entry".bright_white().bold(),
        "Size".bright_white().bold(),
        "Age".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    let now = Utc::now();
    let mut total_size = 0;
    for entry in &entries {
        total_size += entry.size;
        println!(
            "  {:<50} {:<11} {}",
            entry.file_stem.cyan(),
            format_size(entry.size),
            format_age(now - entry.modified).bright_black()
        );
    }

    println!();
    println!(
        "  Total: {} entries, {}",
        entries.len().to_string().bright_white().bold(),
        format_size(total_size).bright_white().bold()
    );
    println!();

    Ok(())
}

/// Shows the durable entry for a request, and the Redis entry if configured.
async fn show_entry(store: &FileCache, target: &str) -> Result<()> {
    let key = parse_target(target);

    println!("{} {}", "🔍 Cache entry".bright_blue().bold(), key.as_str().cyan());
    println!();

    match store
        .get(&key)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read durable entry: {}", e))?
    {
        Some(response) => print_response("Durable", &response),
        None => println!("  {} {}", "Durable:".bright_white(), "miss".yellow()),
    }

    if let Ok(redis_url) = std::env::var("REDIS_URL") {
        match RedisCache::connect(&redis_url).await {
            Ok(redis) => match redis.get(&key).await {
                Ok(Some(response)) => print_response("Redis", &response),
                Ok(None) => println!("  {} {}", "Redis:".bright_white(), "miss".yellow()),
                Err(e) => println!("  {} {}", "Redis:".bright_white(), e.to_string().red()),
            },
            Err(e) => println!("  {} {}", "Redis:".bright_white(), e.to_string().red()),
        }
    }

    println!(
        "  {} {}",
        "File:".bright_white(),
        store.entry_path(&key).display().to_string().bright_black()
    );
    println!();

    Ok(())
}

fn print_response(tier: &str, response: &CachedResponse) {
    println!("  {} {}", format!("{}:", tier).bright_white(), "hit".green().bold());
    println!("    Status:       {}", response.status);
    println!("    Content-Type: {}", response.content_type);
    println!(
        "    Cached:       {} ({} ago)",
        response.cached_at.format("%Y-%m-%d %H:%M:%S"),
        format_age(response.age(Utc::now()))
    );
    println!("    Size:         {}", format_size(response.body.len() as u64));

    let preview = match serde_json::from_slice::<serde_json::Value>(&response.body) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_default(),
        Err(_) => String::from_utf8_lossy(&response.body).into_owned(),
    };
    for line in preview.lines().take(20) {
        println!("    {}", line.bright_black());
    }
    println!();
}

/// Deletes all durable entries after confirmation.
///
/// Durable entries never expire; this is the only way they are removed.
async fn purge_entries(store: &FileCache, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Purge durable cache".bright_blue().bold());
    println!();

    let count = store
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list cache entries: {}", e))?
        .len();

    if count == 0 {
        println!("{}", "  Nothing to purge".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "⚠️  {} entries will be deleted. Offline fallback for these requests will be lost.",
            count
        )
        .yellow()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete all durable entries?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let removed = store
        .purge()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to purge cache: {}", e))?;

    println!();
    println!(
        "{}",
        format!("✅ Removed {} entries", removed).green().bold()
    );
    println!();

    Ok(())
}

/// Dispatches image store commands.
async fn handle_images_action(action: ImagesAction) -> Result<()> {
    match action {
        ImagesAction::List => {
            let store = FileImageRepository::new(
                PathBuf::from(env_or("IMAGE_CACHE_DIR", "cache/images")),
                env_or("IMAGE_PUBLIC_PATH", "/media/images"),
            );

            println!(
                "{} {}",
                "🖼️  Cached images".bright_blue().bold(),
                format!("({})", store.media_dir().display()).bright_black()
            );
            println!();

            let images = store
                .list()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list images: {}", e))?;

            if images.is_empty() {
                println!("{}", "  No images found".yellow());
                return Ok(());
            }

            let now = Utc::now();
            for image in &images {
                println!(
                    "  {:<60} {:<11} {}",
                    image.filename.cyan(),
                    format_size(image.size),
                    format_age(now - image.fetched_at).bright_black()
                );
            }

            println!();
            println!(
                "  Total: {}",
                images.len().to_string().bright_white().bold()
            );
            println!();
        }
    }

    Ok(())
}

/// Handles network diagnostic commands.
async fn handle_network_action(action: NetworkAction) -> Result<()> {
    match action {
        NetworkAction::Probe => {
            let url = env_or("PROBE_URL", "https://www.google.com/generate_204");
            let timeout = std::env::var("PROBE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2);

            println!("{} {}", "🔍 Probing".bright_blue(), url.cyan());

            let probe = HttpProbe::new(url, Duration::from_secs(timeout))
                .map_err(|e| anyhow::anyhow!("Failed to build probe: {}", e))?;

            let started = Instant::now();
            let result = probe.check().await;
            let elapsed = started.elapsed().as_millis();

            match result {
                Ok(()) => println!(
                    "{} {}",
                    "✅ Online".green().bold(),
                    format!("({} ms)", elapsed).bright_black()
                ),
                Err(e) => println!(
                    "{} {}",
                    "❌ Offline".red().bold(),
                    format!("({})", e).bright_black()
                ),
            }
        }
    }

    Ok(())
}

/// Accepts either a full cache key or a request path.
fn parse_target(target: &str) -> CacheKey {
    if target.starts_with(cache_key::KEY_PREFIX) {
        CacheKey::from_raw(target)
    } else {
        RequestIdentity::from_path_and_query("GET", target).cache_key()
    }
}

fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KIB {
        format!("{} B", bytes)
    } else if bytes_f < KIB * KIB {
        format!("{:.1} KiB", bytes_f / KIB)
    } else {
        format!("{:.1} MiB", bytes_f / (KIB * KIB))
    }
}

fn format_age(age: chrono::Duration) -> String {
    let minutes = age.num_minutes().max(0);
    if minutes < 60 {
        format!("{}m", minutes)
    } else if minutes < 60 * 24 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{}d {}h", minutes / (60 * 24), (minutes / 60) % 24)
    }
}
