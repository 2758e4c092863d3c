mod cli;
mod config;
mod datasources;
mod db;
mod error;
mod logic;
mod models;
mod stores;

use anyhow::Context;
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use datasources::{OpenWeatherMapClient, PriceServiceClient};
use db::Database;
use error::HarvestWiseError;
use logic::suitability::{filter_crops_for_farm, sowing_date};
use logic::weather::LiveWeather;
use logic::{
    AdvisoryOrchestrator, AdvisoryStores, BatchReport, MarketPriceService, PredictionClient,
    WeatherProvider,
};
use models::{CropInstance, FarmContext, IrrigationType};
use std::path::Path;
use std::sync::Arc;
use stores::{CropInstanceStore, ReferenceCatalog, RiskHistoryStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init = cli.command {
        Config::setup_interactive().context("Interactive setup failed")?;
        return Ok(());
    }

    let config = Config::load(cli.config.clone()).context("Failed to load configuration")?;
    let db_path = Config::db_path(cli.data_dir.as_ref())?;
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    tracing::debug!(path = %db.path().display(), "Database ready");

    match cli.command {
        Commands::Init => Ok(()),
        Commands::Check => check(&config, &db_path).await,
        Commands::Advise { force, json } => advise(&config, &db, force, json).await,
        Commands::Suggest { month, temp } => suggest(&config, &db, month, temp).await,
        Commands::Plant {
            name,
            sowing_date,
            irrigation,
        } => plant(&config, &db, &name, sowing_date.as_deref(), irrigation.as_deref()),
        Commands::Predict { name, date } => predict(&config, &db, &name, date.as_deref()).await,
        Commands::Crops => crops(&db),
        Commands::History { limit } => history(&db, limit),
    }
}

fn weather_provider(config: &Config, db: &Database) -> WeatherProvider {
    let live = config
        .openweathermap
        .as_ref()
        .filter(|c| c.enabled && !c.api_key.is_empty())
        .map(|c| Box::new(OpenWeatherMapClient::new(c.clone())) as Box<dyn LiveWeather>);

    WeatherProvider::new(live, Arc::new(db.clone()))
}

fn parse_date(raw: &str, field: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("{} must be YYYY-MM-DD, got '{}'", field, raw))
}

async fn check(config: &Config, db_path: &Path) -> anyhow::Result<()> {
    println!("Configuration OK");
    println!("  Farm:       {} ({})", config.farm.name, config.farm.user_id);
    println!("  Database:   {}", db_path.display());

    match config.openweathermap.as_ref().filter(|c| c.enabled) {
        Some(owm) => {
            let client = OpenWeatherMapClient::new(owm.clone());
            let ok = client.test_connection(config.farm.coordinates()).await?;
            println!("  Weather:    {}", if ok { "OK" } else { "UNREACHABLE" });
        }
        None => println!("  Weather:    not configured (seasonal estimates)"),
    }

    let prices = PriceServiceClient::new(&config.prediction);
    let ok = prices.test_connection().await;
    println!(
        "  Prices:     {} ({})",
        if ok { "OK" } else { "UNREACHABLE" },
        config.prediction.base_url
    );

    Ok(())
}

async fn advise(config: &Config, db: &Database, force: bool, json: bool) -> anyhow::Result<()> {
    let orchestrator = AdvisoryOrchestrator::new(
        AdvisoryStores::from_database(db),
        weather_provider(config, db),
        config.farm.coordinates(),
        config.advisory.idempotency_ttl_hours,
    );

    let result = orchestrator.run(&config.farm.user_id, force).await;
    orchestrator.shutdown().await;
    let report = result.context("Advisory run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    if report.crops.is_empty() {
        println!("No crops planted. Add one with `harvestwise plant <crop>`.");
        return;
    }

    if let Some(source) = report.weather_source {
        println!("Weather: {}", source);
    }
    println!();

    for crop in &report.crops {
        let status = crop
            .harvest_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into());
        println!("{} [{}]", crop.name, status);

        if let (Some(pct), Some(level)) = (crop.risk_percentage, crop.risk_level) {
            println!(
                "  Spoilage risk {}% | combined {:.2} ({}) | shelf life left {} days",
                pct,
                crop.total_risk.unwrap_or_default(),
                level,
                crop.shelf_life_remaining.unwrap_or_default()
            );
        }
        if let Some(trend) = crop.price_trend {
            println!("  Price trend {} {}", trend.arrow(), trend);
        }
        if let Some(ref advisory) = crop.advisory {
            println!(
                "  {} {} ({}): {}",
                advisory.urgency.symbol(),
                advisory.action,
                advisory.urgency,
                advisory.message
            );
        }
    }

    println!();
    println!(
        "{} processed, {} skipped, {} failed{}",
        report.processed,
        report.skipped,
        report.failed,
        if report.saved { "" } else { " (portfolio not saved)" }
    );
}

async fn suggest(
    config: &Config,
    db: &Database,
    month: Option<u32>,
    temp: Option<f64>,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let temperature = match temp {
        Some(t) => t,
        None => {
            weather_provider(config, db)
                .current(config.farm.coordinates())
                .await
                .temperature_c
        }
    };

    let mut farm = FarmContext::new(config.farm.soil_type.clone(), month.unwrap_or(today.month()))
        .with_temperature(temperature);
    if let Some(area) = config.farm.area_hectares {
        farm = farm.with_area(area);
    }
    if let Some(ref region) = config.farm.region {
        farm = farm.with_region(region.clone());
    }

    let catalog = db.list_all()?;
    let result = filter_crops_for_farm(&farm, &catalog);

    if result.used_fallback {
        println!("No crop matches every condition; showing the closest seasonal options.");
    }
    if result.suggestions.is_empty() {
        println!("No crops to suggest for month {}.", farm.month);
        return Ok(());
    }

    for s in &result.suggestions {
        println!(
            "{:<12} score {:>5.1}  soil {}  season {}  sow {}",
            s.crop.name,
            s.score,
            if s.soil_match { "yes" } else { "no " },
            if s.season_match { "yes" } else { "no " },
            sowing_date(&s.crop, today)
        );
    }
    Ok(())
}

fn plant(
    config: &Config,
    db: &Database,
    name: &str,
    sowing: Option<&str>,
    irrigation: Option<&str>,
) -> anyhow::Result<()> {
    let reference = db
        .find_by_name(name)?
        .ok_or_else(|| HarvestWiseError::NotFound(format!("crop '{}' is not in the catalog", name)))?;

    let sowing = match sowing {
        Some(raw) => parse_date(raw, "--sowing-date")?,
        None => sowing_date(&reference, Local::now().date_naive()),
    };

    let irrigation = irrigation
        .map(|raw| {
            IrrigationType::from_str(raw)
                .ok_or_else(|| HarvestWiseError::InvalidData(format!("unknown irrigation type '{}'", raw)))
        })
        .transpose()?;

    let crop = CropInstance::plant(&reference, sowing, irrigation);
    let mut portfolio = db.load(&config.farm.user_id)?;
    portfolio.push(crop.clone());
    db.save(&config.farm.user_id, &portfolio)?;

    tracing::info!(crop_id = %crop.id, "Crop planted");
    println!(
        "Planted {} on {}; expected harvest {}",
        crop.name,
        crop.sowing_date,
        crop.harvest_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
    );
    Ok(())
}

async fn predict(config: &Config, db: &Database, name: &str, date: Option<&str>) -> anyhow::Result<()> {
    let reference = db
        .find_by_name(name)?
        .ok_or_else(|| HarvestWiseError::NotFound(format!("crop '{}' is not in the catalog", name)))?;

    let target = match date {
        Some(raw) => parse_date(raw, "--date")?,
        None => Local::now().date_naive(),
    };

    let client = PredictionClient::new(
        Box::new(PriceServiceClient::new(&config.prediction)),
        &config.prediction,
    );
    let service = MarketPriceService::new(client, Arc::new(db.clone()));

    let prediction = service
        .price_for(&reference.id, target, &config.farm.user_id)
        .await
        .with_context(|| format!("Could not get a price for {}", reference.name))?;

    println!(
        "{} on {}: {:.2} {} {} (confidence {:.0}%)",
        reference.name,
        prediction.target_date,
        prediction.predicted_price,
        prediction.trend.arrow(),
        prediction.trend,
        prediction.confidence * 100.0
    );
    Ok(())
}

fn crops(db: &Database) -> anyhow::Result<()> {
    for crop in db.list_all()? {
        let months: Vec<String> = crop.ideal_sowing_months.iter().map(u32::to_string).collect();
        println!(
            "{:<12} {:>3} days  {:>4.0}-{:<4.0}°C  shelf {:>3}d  {:<10}  sow [{}]",
            crop.name,
            crop.growth_duration_days,
            crop.optimal_temp_min,
            crop.optimal_temp_max,
            crop.shelf_life_days,
            crop.storage_or_default().as_str(),
            months.join(",")
        );
    }
    Ok(())
}

fn history(db: &Database, limit: usize) -> anyhow::Result<()> {
    let records = db.recent(limit)?;
    if records.is_empty() {
        println!("No risk history yet. Run `harvestwise advise` first.");
        return Ok(());
    }

    for r in records {
        println!(
            "{}  {:<12} {:>3}% {:<8} {:<10} {:.1}°C {:.0}%",
            r.recorded_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            r.crop_name,
            r.risk_percentage,
            r.risk_level.as_str(),
            r.storage_type.as_str(),
            r.temperature_c,
            r.humidity_percent
        );
    }
    Ok(())
}
