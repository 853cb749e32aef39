#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use quota_guard_lib::cache::{CacheKey, CacheTier};
use quota_guard_lib::config::{load_from_env, load_from_path, Config};
use quota_guard_lib::telemetry::{init_metrics, init_tracing, render_metrics};
use quota_guard_lib::{GuardError, QuotaGuard, ReportRequest};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Quota guard for quota-constrained reporting APIs")]
struct Cli {
    /// Path to configuration TOML file. Without it, defaults plus GA4_* variables are used
    #[arg(short, long, value_name = "FILE", global = true, env = "QUOTA_GUARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the cache key of a request payload
    Key {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        resource: Option<String>,
        /// report or metadata
        #[arg(long, default_value = "report")]
        tier: CacheTier,
        /// Request payload as JSON
        #[arg(long, default_value = "null")]
        payload: String,
    },
    /// Load and validate the configuration, then print the effective values
    CheckConfig,
    /// Drive concurrent synthetic report requests through the guard
    Simulate {
        #[arg(long, default_value_t = 20)]
        requests: usize,
        #[arg(long, default_value = "properties/demo")]
        resource: String,
        #[arg(long, default_value = "tenant-demo")]
        tenant: String,
        /// Latency of each synthetic external call
        #[arg(long, default_value_t = 50)]
        latency_ms: u64,
        /// Number of distinct payloads cycled through (repeats hit the cache)
        #[arg(long, default_value_t = 4)]
        distinct: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_config(cli.config.as_ref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(&cfg.logging) {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }

    let outcome = match cli.command {
        Command::Key { tenant, resource, tier, payload } => {
            print_key(&tenant, resource.as_deref(), tier, &payload)
        }
        Command::CheckConfig => print_config(&cfg),
        Command::Simulate { requests, resource, tenant, latency_ms, distinct } => {
            simulate(&cfg, &tenant, &resource, requests, latency_ms, distinct).await
        }
    };

    if let Err(err) = outcome {
        error!(%err, "command failed");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, GuardError> {
    match path {
        Some(path) => load_from_path(path),
        None => load_from_env(),
    }
}

fn print_key(
    tenant: &str,
    resource: Option<&str>,
    tier: CacheTier,
    payload: &str,
) -> Result<(), GuardError> {
    let payload: Value = serde_json::from_str(payload)?;
    println!("{}", CacheKey::for_tier(tier, tenant, resource, &payload));
    Ok(())
}

fn print_config(cfg: &Config) -> Result<(), GuardError> {
    println!("cache.disabled           = {}", cfg.cache.disabled);
    println!("cache.default_ttl_ms     = {}", cfg.cache.default_ttl_ms);
    println!("cache.metadata_ttl_ms    = {}", cfg.cache.metadata_ttl_ms);
    println!("concurrency.max_concurrent = {}", cfg.concurrency.max_concurrent);
    println!("rate_limit.window_ms     = {}", cfg.rate_limit.window_ms);
    println!("rate_limit.max           = {}", cfg.rate_limit.max);
    Ok(())
}

async fn simulate(
    cfg: &Config,
    tenant: &str,
    resource: &str,
    requests: usize,
    latency_ms: u64,
    distinct: usize,
) -> Result<(), GuardError> {
    let (metrics, registry) =
        init_metrics().map_err(|e| GuardError::Telemetry(format!("Failed to init metrics: {e}")))?;
    let guard = Arc::new(QuotaGuard::new(cfg, Some(metrics)));
    let fetched = Arc::new(AtomicUsize::new(0));
    let latency = Duration::from_millis(latency_ms);

    info!(requests, resource, tenant, "starting simulation");

    let mut handles = Vec::with_capacity(requests);
    for i in 0..requests {
        let guard = guard.clone();
        let fetched = fetched.clone();
        let tenant = tenant.to_string();
        let resource = resource.to_string();
        let payload = json!({
            "metrics": ["sessions"],
            "dimensions": ["date"],
            "variant": i % distinct.max(1),
        });

        handles.push(tokio::spawn(async move {
            let request = ReportRequest::new(&tenant, Some(&resource), &payload);
            guard
                .run_report(&request, || async {
                    fetched.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(latency).await;
                    Ok::<Value, GuardError>(json!({ "rows": [] }))
                })
                .await
        }));
    }

    let mut served = 0usize;
    let mut limited = 0usize;
    for handle in handles {
        match handle.await {
            Ok(Ok(_)) => served += 1,
            Ok(Err(GuardError::RateLimited(_))) => limited += 1,
            Ok(Err(err)) => return Err(err),
            Err(join_err) => {
                return Err(std::io::Error::other(format!("simulation task failed: {join_err}")).into())
            }
        }
    }

    println!("served:         {served}");
    println!("rate limited:   {limited}");
    println!("external calls: {}", fetched.load(Ordering::Relaxed));
    println!();
    print!("{}", render_metrics(&registry)?);
    Ok(())
}
