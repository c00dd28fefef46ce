use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use hazard_router::sdk::{
    config::{RouterConfig, RoutingBackend},
    facilities::FacilityRegistry,
    geo::Coordinate,
    hazards::{Confidence, FeedFilter, HazardFeed, HazardPoint, HazardStatistics},
    routing::{
        latest_per_hazard, BatchFailure, BatchReport, BatchScheduler, FallbackRouter, NearestFacilityMatch,
        OfflineProvider, RemoteOsrmProvider, RoutingProvider,
    },
    routing::provider::remote::DEFAULT_OSRM_BASE_URL,
    util::{log::init_logging, rate_limit::osrm_limiter},
};
use serde::Serialize;
use std::{fs::File, io::Write, path::PathBuf};

/// Finds the nearest emergency facility for detected hazards and routes to it
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Facility registry (.csv or .json)
    #[arg(short, long, default_value = "data/hospitals.csv")]
    facilities: PathBuf,

    /// Hazard feed in the fire-detection JSON format
    #[arg(long, default_value = "data/fires.json")]
    hazards: PathBuf,

    /// Route a single hazard from the feed
    #[arg(long, conflicts_with_all = ["lat", "all", "high_confidence"])]
    hazard_id: Option<String>,

    /// Route an ad-hoc point (requires --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Route every hazard left after filtering
    #[arg(long, conflicts_with = "high_confidence")]
    all: bool,

    /// Route only high-confidence hazards
    #[arg(long)]
    high_confidence: bool,

    /// [Optional] Keep only hazards with this confidence (h, n, l)
    #[arg(long)]
    confidence: Option<Confidence>,

    /// [Optional] Keep at most this many hazards
    #[arg(long)]
    limit: Option<usize>,

    /// Ignore facilities without emergency services
    #[arg(long)]
    emergency_only: bool,

    /// Never call the routing service; use straight-line estimates
    #[arg(long)]
    offline: bool,

    /// Include feed statistics in the output
    #[arg(long)]
    stats: bool,

    /// Where to write the JSON result
    #[arg(short, long, default_value = "routes.json")]
    output: PathBuf,
}

#[derive(Serialize)]
struct RunOutput {
    generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    statistics: Option<HazardStatistics>,
    matches: Vec<NearestFacilityMatch>,
    failures: Vec<BatchFailure>,
    cancelled: bool,
}

fn main() -> Result<()> {
    init_logging();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // --- 1. Configuration and registry ---
    let mut config = RouterConfig::from_env()?;
    if cli.offline {
        config.backend = RoutingBackend::Offline;
    }

    let mut registry = FacilityRegistry::load(&cli.facilities)?;
    if cli.emergency_only {
        registry = registry.emergency_only();
    }
    if registry.is_empty() {
        bail!("No emergency facilities configured in {}", cli.facilities.display());
    }
    log::info!("Loaded {} facilities from {}", registry.len(), cli.facilities.display());

    let provider: Box<dyn RoutingProvider> = match &config.backend {
        RoutingBackend::Remote { base_url, timeout } => {
            log::info!("Routing via {} (timeout {:?})", base_url, timeout);
            let remote = RemoteOsrmProvider::new(base_url.clone(), *timeout)?;
            if remote.base_url() == DEFAULT_OSRM_BASE_URL {
                // Public demo server allows one request per second.
                Box::new(remote.with_limiter(osrm_limiter()))
            } else {
                Box::new(remote)
            }
        }
        RoutingBackend::Offline => {
            log::info!("Offline mode: all routes are straight-line estimates");
            Box::new(OfflineProvider)
        }
    };
    let router = FallbackRouter::new(provider, config.fallback);

    // --- 2. Hazards ---
    let filter = FeedFilter {
        confidence: cli.confidence,
        limit: cli.limit,
    };
    let needs_feed = cli.lat.is_none() || cli.stats;
    let feed = if needs_feed {
        HazardFeed::load(&cli.hazards)?
    } else {
        HazardFeed::default()
    };
    let selected = feed.filtered(&filter);
    let statistics = cli.stats.then(|| HazardFeed::statistics(&selected));
    if let Some(stats) = &statistics {
        log::info!(
            "{} hazards ({} high, {} medium, {} low), avg brightness {}",
            stats.total,
            stats.high,
            stats.medium,
            stats.low,
            stats
                .avg_brightness
                .map(|b| format!("{:.1}K", b))
                .unwrap_or_else(|| "n/a".to_string())
        );
    }

    // --- 3. Routing ---
    let report = if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        let point = Coordinate::new(lat, lon).context("Invalid --lat/--lon")?;
        single(&router, &HazardPoint::new("cli", point), &registry)?
    } else if let Some(id) = &cli.hazard_id {
        let hazard = feed
            .get(id)
            .with_context(|| format!("Unknown hazard id: {}", id))?;
        single(&router, hazard, &registry)?
    } else if cli.all || cli.high_confidence {
        let scheduler = BatchScheduler::new(config.batch);
        if cli.high_confidence {
            router.auto_route_high_confidence(&scheduler, &selected, registry.facilities(), None)
        } else {
            router.route_all(&scheduler, &selected, registry.facilities(), None)
        }
    } else if cli.stats {
        BatchReport::default()
    } else {
        bail!("Nothing to route: pass --hazard-id, --lat/--lon, --all or --high-confidence");
    };

    let matches = latest_per_hazard(report.matches);
    for matched in &matches {
        log_match(matched);
    }
    for failure in &report.failures {
        log::error!("Hazard {} not routed: {}", failure.hazard_id, failure.reason);
    }

    // --- 4. Output ---
    let output = RunOutput {
        generated_at: Utc::now(),
        statistics,
        matches,
        failures: report.failures,
        cancelled: report.cancelled,
    };
    let json_output = serde_json::to_string_pretty(&output)?;
    let mut file = File::create(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;
    file.write_all(json_output.as_bytes())?;
    log::info!(
        "{} routes written to {}",
        output.matches.len(),
        cli.output.display()
    );

    Ok(())
}

fn single<P: RoutingProvider>(
    router: &FallbackRouter<P>,
    hazard: &HazardPoint,
    registry: &FacilityRegistry,
) -> Result<BatchReport> {
    let matched = router.route_to_nearest(hazard, registry.facilities())?;
    Ok(BatchReport {
        matches: vec![matched],
        ..Default::default()
    })
}

fn log_match(matched: &NearestFacilityMatch) {
    let Some(route) = &matched.route else {
        return;
    };
    log::info!(
        "Hazard {} -> {} ({:.2} km away): {}",
        matched.hazard.id,
        matched.facility.name,
        matched.distance_km,
        route
    );
    if route.is_fallback {
        log::warn!(
            "Route for hazard {} is an estimate; distance and time are not driving directions",
            matched.hazard.id
        );
    }
}
