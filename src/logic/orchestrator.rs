//! Batch advisory run over a farmer's crop portfolio.
//!
//! Each crop goes through: idempotency check, harvest classification, then
//! (for harvested crops) spoilage scoring, market risk, cached price trend and
//! advisory. The portfolio is written back once at the end of the batch.

use super::advisory;
use super::calculations::{classify_total_risk, market_risk_score, shelf_life_usage, total_risk};
use super::harvest;
use super::history::HistoryWriter;
use super::spoilage::SpoilageRiskScorer;
use super::weather::WeatherProvider;
use crate::db::Database;
use crate::error::{HarvestWiseError, Result};
use crate::models::{
    Coordinates, CropInstance, CropReference, HarvestStatus, PriceTrend, RiskAssessment,
    RiskHistoryRecord, RiskLevel, WeatherSnapshot, WeatherSource,
};
use crate::stores::{
    CropInstanceStore, IdempotencyCache, PredictionCache, ReferenceCatalog, RiskHistoryStore,
};
use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Repositories the orchestrator reads and writes.
#[derive(Clone)]
pub struct AdvisoryStores {
    pub catalog: Arc<dyn ReferenceCatalog>,
    pub crops: Arc<dyn CropInstanceStore>,
    pub predictions: Arc<dyn PredictionCache>,
    pub history: Arc<dyn RiskHistoryStore>,
    pub marks: Arc<dyn IdempotencyCache>,
}

impl AdvisoryStores {
    pub fn from_database(db: &Database) -> Self {
        let db = Arc::new(db.clone());
        Self {
            catalog: db.clone(),
            crops: db.clone(),
            predictions: db.clone(),
            history: db.clone(),
            marks: db,
        }
    }
}

/// Result of one batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub crops: Vec<CropInstance>,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub weather_source: Option<WeatherSource>,
    pub saved: bool,
}

enum CropOutcome {
    Processed(CropInstance),
    Skipped(CropInstance),
    Failed(CropInstance),
}

/// Shared, read-only inputs for every crop in a batch.
struct BatchContext<'a> {
    user_id: &'a str,
    now: DateTime<Utc>,
    today: NaiveDate,
    weather: &'a WeatherSnapshot,
    catalog: std::result::Result<Vec<CropReference>, String>,
}

impl BatchContext<'_> {
    fn reference_for(&self, crop: &CropInstance) -> Result<&CropReference> {
        let catalog = self
            .catalog
            .as_ref()
            .map_err(|e| HarvestWiseError::DataSourceUnavailable(e.clone()))?;

        catalog
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(crop.name.trim()))
            .or_else(|| catalog.iter().find(|r| r.id == crop.reference_id))
            .ok_or_else(|| HarvestWiseError::NotFound(format!("crop reference '{}'", crop.name)))
    }
}

/// Risk and market outcome for a harvested crop.
struct HarvestEvaluation {
    assessment: RiskAssessment,
    total_risk: f64,
    level: RiskLevel,
    trend: Option<PriceTrend>,
}

pub struct AdvisoryOrchestrator {
    stores: AdvisoryStores,
    weather: WeatherProvider,
    coordinates: Coordinates,
    history: HistoryWriter,
    scorer: SpoilageRiskScorer,
    ttl: Duration,
}

impl AdvisoryOrchestrator {
    /// Must be called inside a tokio runtime; spawns the history writer.
    pub fn new(
        stores: AdvisoryStores,
        weather: WeatherProvider,
        coordinates: Coordinates,
        ttl_hours: i64,
    ) -> Self {
        let history = HistoryWriter::spawn(stores.history.clone());
        Self {
            stores,
            weather,
            coordinates,
            history,
            scorer: SpoilageRiskScorer::new(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Run one batch for `user_id`. `force` ignores idempotency marks.
    pub async fn run(&self, user_id: &str, force: bool) -> Result<BatchReport> {
        self.run_at(user_id, force, Utc::now()).await
    }

    pub async fn run_at(&self, user_id: &str, force: bool, now: DateTime<Utc>) -> Result<BatchReport> {
        let portfolio = self.stores.crops.load(user_id)?;
        if portfolio.is_empty() {
            info!(user_id, "No crops in portfolio");
            return Ok(BatchReport {
                crops: Vec::new(),
                processed: 0,
                skipped: 0,
                failed: 0,
                weather_source: None,
                saved: true,
            });
        }

        let weather = self.weather.current(self.coordinates).await;
        let catalog = self.stores.catalog.list_all().map_err(|e| {
            warn!("Failed to load crop catalog: {}", e);
            e.to_string()
        });

        let ctx = BatchContext {
            user_id,
            now,
            today: now.with_timezone(&Local).date_naive(),
            weather: &weather,
            catalog,
        };

        let mut report = BatchReport {
            crops: Vec::with_capacity(portfolio.len()),
            processed: 0,
            skipped: 0,
            failed: 0,
            weather_source: Some(weather.source),
            saved: false,
        };

        for crop in portfolio {
            match self.process_crop(crop, &ctx, force) {
                CropOutcome::Processed(c) => {
                    report.processed += 1;
                    report.crops.push(c);
                }
                CropOutcome::Skipped(c) => {
                    report.skipped += 1;
                    report.crops.push(c);
                }
                CropOutcome::Failed(c) => {
                    report.failed += 1;
                    report.crops.push(c);
                }
            }
        }

        match self.stores.crops.save(user_id, &report.crops) {
            Ok(()) => report.saved = true,
            Err(e) => warn!(user_id, "Failed to save crop portfolio: {}", e),
        }

        info!(
            user_id,
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            weather = %weather.source,
            "Advisory batch complete"
        );

        Ok(report)
    }

    /// Wait for queued history records to be written.
    pub async fn shutdown(self) {
        self.history.shutdown().await;
    }

    fn process_crop(&self, crop: CropInstance, ctx: &BatchContext, force: bool) -> CropOutcome {
        if !force && self.recently_processed(&crop.id, ctx.now) {
            debug!(crop_id = %crop.id, "Processed within TTL, skipping");
            return CropOutcome::Skipped(crop);
        }

        match self.advise(&crop, ctx) {
            Ok(updated) => {
                if let Err(e) = self.stores.marks.set(&crop.id, ctx.now) {
                    warn!(crop_id = %crop.id, "Failed to record idempotency mark: {}", e);
                }
                CropOutcome::Processed(updated)
            }
            Err(e) => {
                warn!(crop_id = %crop.id, crop = %crop.name, "Crop processing failed: {}", e);
                CropOutcome::Failed(crop)
            }
        }
    }

    fn recently_processed(&self, crop_id: &str, now: DateTime<Utc>) -> bool {
        match self.stores.marks.get(crop_id) {
            Ok(Some(last)) => now - last < self.ttl,
            Ok(None) => false,
            Err(e) => {
                warn!(crop_id, "Failed to read idempotency mark: {}", e);
                false
            }
        }
    }

    fn advise(&self, crop: &CropInstance, ctx: &BatchContext) -> Result<CropInstance> {
        let status = harvest::classify(crop.harvest_date, ctx.today);
        let mut updated = crop.clone();
        updated.harvest_status = Some(status);

        if status.is_harvest_relevant() {
            let evaluation = self.evaluate_harvested(crop, ctx)?;

            updated.risk_percentage = Some(evaluation.assessment.score);
            updated.total_risk = Some(evaluation.total_risk);
            updated.risk_level = Some(evaluation.level);
            updated.shelf_life_remaining = Some(evaluation.assessment.shelf_life_remaining);
            updated.price_trend = evaluation.trend;
            updated.advisory = Some(advisory::generate(evaluation.level, evaluation.trend));

            self.history.submit(RiskHistoryRecord {
                id: None,
                crop_instance_id: crop.id.clone(),
                crop_name: crop.name.clone(),
                risk_percentage: evaluation.assessment.score,
                risk_level: evaluation.assessment.level,
                storage_type: evaluation.assessment.storage.storage_type,
                temperature_c: ctx.weather.temperature_c,
                humidity_percent: ctx.weather.humidity_percent,
                recorded_at: ctx.now,
            });
        } else if status == HarvestStatus::ApproachingHarvest {
            let days = harvest::days_to_harvest(crop.harvest_date, ctx.today).unwrap_or(0);
            updated.advisory = Some(advisory::prepare(days));
        }

        Ok(updated)
    }

    fn evaluate_harvested(&self, crop: &CropInstance, ctx: &BatchContext) -> Result<HarvestEvaluation> {
        let harvest_date = crop.harvest_date.ok_or_else(|| {
            HarvestWiseError::InvalidData(format!("crop '{}' has no harvest date", crop.id))
        })?;
        let reference = ctx.reference_for(crop)?;

        let assessment = self
            .scorer
            .assess(reference, harvest_date, Some(ctx.weather), ctx.today);

        let usage = shelf_life_usage(assessment.days_since_harvest, reference.shelf_life_days);
        let combined = total_risk(assessment.score, market_risk_score(usage));
        let trend = self.cached_trend(&crop.reference_id, ctx);

        debug!(
            crop_id = %crop.id,
            score = assessment.score,
            total_risk = combined,
            trend = ?trend,
            "Harvested crop evaluated"
        );

        Ok(HarvestEvaluation {
            assessment,
            total_risk: combined,
            level: classify_total_risk(combined),
            trend,
        })
    }

    /// Cache-only: a miss or cache error means no trend signal.
    fn cached_trend(&self, crop_id: &str, ctx: &BatchContext) -> Option<PriceTrend> {
        match self.stores.predictions.get(crop_id, ctx.today, ctx.user_id) {
            Ok(prediction) => prediction.map(|p| p.trend),
            Err(e) => {
                warn!(crop_id, "Failed to read price prediction cache: {}", e);
                None
            }
        }
    }
}
