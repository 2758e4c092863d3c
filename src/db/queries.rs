use crate::db::Database;
use crate::error::Result;
use crate::models::{
    Advisory, CropInstance, CropReference, HarvestStatus, IrrigationType, MoistureSensitivity,
    PricePrediction, PriceTrend, RiskHistoryRecord, RiskLevel, StorageType, WeatherSnapshot,
    WeatherSource,
};
use crate::stores::{
    CropInstanceStore, IdempotencyCache, PredictionCache, ReferenceCatalog, RiskHistoryStore,
    WeatherCache,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Row};
use serde::de::DeserializeOwned;
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

// Reference Catalog Queries

impl ReferenceCatalog for Database {
    fn list_all(&self) -> Result<Vec<CropReference>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM crop_references ORDER BY name")?;
            let crops = stmt
                .query_map([], row_to_crop_reference)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(crops)
        })
    }

    fn find_by_name(&self, name: &str) -> Result<Option<CropReference>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM crop_references WHERE name = ?1 COLLATE NOCASE",
                [name.trim()],
                row_to_crop_reference,
            )
            .optional()
            .map_err(Into::into)
        })
    }
}

fn row_to_crop_reference(row: &Row) -> rusqlite::Result<CropReference> {
    let id: String = row.get("id")?;
    let sensitivity_str: String = row.get("moisture_sensitivity")?;
    let storage_str: Option<String> = row.get("storage_type")?;
    let months_json: String = row.get("ideal_sowing_months")?;
    let soils_json: String = row.get("suitable_soils")?;
    let regions_json: String = row.get("region_tags")?;

    let moisture_sensitivity = MoistureSensitivity::from_str(&sensitivity_str).unwrap_or_else(|| {
        warn!(
            crop_id = %id,
            moisture_sensitivity = %sensitivity_str,
            "Unknown moisture_sensitivity in catalog, defaulting to Medium"
        );
        MoistureSensitivity::Medium
    });
    let storage_type = storage_str.as_ref().and_then(|s| {
        StorageType::from_str(s).or_else(|| {
            warn!(crop_id = %id, storage_type = %s, "Unknown storage_type in catalog, ignoring");
            None
        })
    });

    let growth: i64 = row.get("growth_duration_days")?;
    let shelf_life: i64 = row.get("shelf_life_days")?;

    Ok(CropReference {
        name: row.get("name")?,
        growth_duration_days: growth.max(0) as u32,
        optimal_temp_min: row.get("optimal_temp_min")?,
        optimal_temp_max: row.get("optimal_temp_max")?,
        moisture_sensitivity,
        shelf_life_days: shelf_life.max(0) as u32,
        storage_type,
        ideal_sowing_months: parse_json_list(&id, "ideal_sowing_months", &months_json),
        suitable_soils: parse_json_list(&id, "suitable_soils", &soils_json),
        region_tags: parse_json_list(&id, "region_tags", &regions_json),
        min_area_hectares: row.get("min_area_hectares")?,
        id,
    })
}

fn parse_json_list<T: DeserializeOwned>(id: &str, column: &str, raw: &str) -> Vec<T> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(crop_id = %id, column, error = %e, "Malformed list in catalog, treating as empty");
        Vec::new()
    })
}

// Crop Portfolio Queries

impl CropInstanceStore for Database {
    fn load(&self, user_id: &str) -> Result<Vec<CropInstance>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM crop_instances WHERE user_id = ?1 ORDER BY position")?;
            // Any unreadable row fails the load: save() replaces the whole
            // portfolio, so a partial read would delete the skipped crops.
            let crops = stmt
                .query_map([user_id], row_to_crop_instance)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| {
                    warn!(user_id, error = %e, "Unreadable crop in portfolio");
                    e
                })?;
            Ok(crops)
        })
    }

    fn save(&self, user_id: &str, crops: &[CropInstance]) -> Result<()> {
        let mut rows = Vec::with_capacity(crops.len());
        for crop in crops {
            let advisory = crop.advisory.as_ref().map(serde_json::to_string).transpose()?;
            rows.push((crop, advisory));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM crop_instances WHERE user_id = ?1", [user_id])?;
            for (position, (crop, advisory)) in rows.iter().enumerate() {
                tx.execute(
                    r#"
                    INSERT INTO crop_instances
                        (user_id, id, position, reference_id, name, sowing_date, harvest_date,
                         irrigation_type, harvest_status, risk_level, risk_percentage,
                         total_risk, shelf_life_remaining, advisory, price_trend)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                    "#,
                    params![
                        user_id,
                        crop.id,
                        position as i64,
                        crop.reference_id,
                        crop.name,
                        crop.sowing_date.format(DATE_FORMAT).to_string(),
                        crop.harvest_date.map(|d| d.format(DATE_FORMAT).to_string()),
                        crop.irrigation_type.map(|i| format!("{:?}", i)),
                        crop.harvest_status.map(|s| s.as_str()),
                        crop.risk_level.map(|l| l.as_str()),
                        crop.risk_percentage.map(|p| p as i64),
                        crop.total_risk,
                        crop.shelf_life_remaining,
                        advisory,
                        crop.price_trend.map(|t| t.as_str()),
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

fn row_to_crop_instance(row: &Row) -> rusqlite::Result<CropInstance> {
    let id: String = row.get("id")?;
    let sowing_str: String = row.get("sowing_date")?;
    let harvest_str: Option<String> = row.get("harvest_date")?;
    let irrigation_str: Option<String> = row.get("irrigation_type")?;
    let status_str: Option<String> = row.get("harvest_status")?;
    let level_str: Option<String> = row.get("risk_level")?;
    let advisory_json: Option<String> = row.get("advisory")?;
    let trend_str: Option<String> = row.get("price_trend")?;
    let risk_percentage: Option<i64> = row.get("risk_percentage")?;

    let sowing_date = NaiveDate::parse_from_str(&sowing_str, DATE_FORMAT).unwrap_or_else(|_| {
        warn!(crop_id = %id, sowing_date = %sowing_str, "Invalid sowing_date, using today");
        chrono::Local::now().date_naive()
    });
    let harvest_date = harvest_str.as_ref().and_then(|s| {
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map_err(|_| warn!(crop_id = %id, harvest_date = %s, "Invalid harvest_date, ignoring"))
            .ok()
    });
    let irrigation_type = irrigation_str.as_ref().and_then(|i| {
        IrrigationType::from_str(i).or_else(|| {
            warn!(crop_id = %id, irrigation_type = %i, "Unknown irrigation_type, ignoring");
            None
        })
    });
    let advisory = advisory_json.as_ref().and_then(|json| {
        serde_json::from_str::<Advisory>(json)
            .map_err(|e| warn!(crop_id = %id, error = %e, "Malformed advisory, ignoring"))
            .ok()
    });

    Ok(CropInstance {
        reference_id: row.get("reference_id")?,
        name: row.get("name")?,
        sowing_date,
        harvest_date,
        irrigation_type,
        harvest_status: status_str.as_deref().and_then(HarvestStatus::from_str),
        risk_level: level_str.as_deref().and_then(RiskLevel::from_str),
        risk_percentage: risk_percentage.map(|p| p.clamp(0, 100) as u32),
        total_risk: row.get("total_risk")?,
        shelf_life_remaining: row.get("shelf_life_remaining")?,
        advisory,
        price_trend: trend_str.as_deref().map(PriceTrend::coerce),
        id,
    })
}

// Price Prediction Cache Queries

impl PredictionCache for Database {
    fn get(
        &self,
        crop_id: &str,
        target_date: NaiveDate,
        user_id: &str,
    ) -> Result<Option<PricePrediction>> {
        let prediction = self.with_conn(|conn| {
            conn.query_row(
                r#"
                SELECT * FROM price_predictions
                WHERE crop_id = ?1 AND target_date = ?2 AND user_id = ?3
                "#,
                params![crop_id, target_date.format(DATE_FORMAT).to_string(), user_id],
                row_to_price_prediction,
            )
            .optional()
            .map_err(Into::into)
        })?;

        Ok(prediction.filter(|p| p.is_fresh(Utc::now())))
    }

    fn upsert(&self, prediction: &PricePrediction) -> Result<PricePrediction> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO price_predictions
                    (crop_id, target_date, user_id, predicted_price, confidence, trend, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT (crop_id, target_date, user_id) DO UPDATE SET
                    predicted_price = excluded.predicted_price,
                    confidence = excluded.confidence,
                    trend = excluded.trend,
                    created_at = excluded.created_at
                "#,
                params![
                    prediction.crop_id,
                    prediction.target_date.format(DATE_FORMAT).to_string(),
                    prediction.user_id,
                    prediction.predicted_price,
                    prediction.confidence,
                    prediction.trend.as_str(),
                    prediction.created_at.to_rfc3339(),
                ],
            )?;
            Ok(prediction.clone())
        })
    }
}

fn row_to_price_prediction(row: &Row) -> rusqlite::Result<PricePrediction> {
    let target_str: String = row.get("target_date")?;
    let trend_str: String = row.get("trend")?;
    let created_at_str: String = row.get("created_at")?;

    Ok(PricePrediction {
        crop_id: row.get("crop_id")?,
        target_date: NaiveDate::parse_from_str(&target_str, DATE_FORMAT)
            .unwrap_or_else(|_| chrono::Local::now().date_naive()),
        user_id: row.get("user_id")?,
        predicted_price: row.get("predicted_price")?,
        confidence: row.get("confidence")?,
        trend: PriceTrend::coerce(&trend_str),
        // An unreadable timestamp must not look fresh
        created_at: parse_timestamp(&created_at_str).unwrap_or(DateTime::<Utc>::MIN_UTC),
    })
}

// Risk History Queries

impl RiskHistoryStore for Database {
    fn append(&self, record: &RiskHistoryRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO risk_history
                    (crop_instance_id, crop_name, risk_percentage, risk_level, storage_type,
                     temperature_c, humidity_percent, recorded_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    record.crop_instance_id,
                    record.crop_name,
                    record.risk_percentage as i64,
                    record.risk_level.as_str(),
                    record.storage_type.as_str(),
                    record.temperature_c,
                    record.humidity_percent,
                    record.recorded_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn recent(&self, limit: usize) -> Result<Vec<RiskHistoryRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM risk_history ORDER BY id DESC LIMIT ?1")?;
            let records = stmt
                .query_map([limit as i64], row_to_risk_history)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(records)
        })
    }
}

fn row_to_risk_history(row: &Row) -> rusqlite::Result<RiskHistoryRecord> {
    let level_str: String = row.get("risk_level")?;
    let storage_str: String = row.get("storage_type")?;
    let recorded_at_str: String = row.get("recorded_at")?;
    let risk_percentage: i64 = row.get("risk_percentage")?;

    Ok(RiskHistoryRecord {
        id: Some(row.get("id")?),
        crop_instance_id: row.get("crop_instance_id")?,
        crop_name: row.get("crop_name")?,
        risk_percentage: risk_percentage.clamp(0, 100) as u32,
        risk_level: RiskLevel::from_str(&level_str).unwrap_or(RiskLevel::Low),
        storage_type: StorageType::from_str(&storage_str).unwrap_or(StorageType::Normal),
        temperature_c: row.get("temperature_c")?,
        humidity_percent: row.get("humidity_percent")?,
        recorded_at: parse_timestamp(&recorded_at_str).unwrap_or_else(Utc::now),
    })
}

// Idempotency Marks

impl IdempotencyCache for Database {
    fn get(&self, crop_id: &str) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self.with_conn(|conn| {
            conn.query_row(
                "SELECT processed_at FROM idempotency_marks WHERE crop_id = ?1",
                [crop_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
        })?;

        Ok(raw.as_deref().and_then(parse_timestamp))
    }

    fn set(&self, crop_id: &str, processed_at: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO idempotency_marks (crop_id, processed_at) VALUES (?1, ?2)",
                params![crop_id, processed_at.to_rfc3339()],
            )?;
            Ok(())
        })
    }
}

// Weather Cache

impl WeatherCache for Database {
    fn last(&self) -> Result<Option<WeatherSnapshot>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM weather_cache WHERE id = 1",
                [],
                row_to_weather_snapshot,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    fn store(&self, snapshot: &WeatherSnapshot) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO weather_cache
                    (id, temperature_c, humidity_percent, rainfall_mm, icon, source, timestamp)
                VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    snapshot.temperature_c,
                    snapshot.humidity_percent,
                    snapshot.rainfall_mm,
                    snapshot.icon,
                    snapshot.source.as_str(),
                    snapshot.timestamp.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }
}

fn row_to_weather_snapshot(row: &Row) -> rusqlite::Result<WeatherSnapshot> {
    let source_str: String = row.get("source")?;
    let timestamp_str: String = row.get("timestamp")?;

    Ok(WeatherSnapshot {
        temperature_c: row.get("temperature_c")?,
        humidity_percent: row.get("humidity_percent")?,
        rainfall_mm: row.get("rainfall_mm")?,
        icon: row.get("icon")?,
        source: WeatherSource::from_str(&source_str).unwrap_or(WeatherSource::Cached),
        timestamp: parse_timestamp(&timestamp_str).unwrap_or_else(Utc::now),
    })
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdvisoryAction, Urgency};
    use chrono::Duration;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn seed_catalog_is_listed() {
        let db = db();
        let crops = db.list_all().unwrap();
        assert!(crops.len() >= 8);
        let tomato = crops.iter().find(|c| c.id == "tomato").unwrap();
        assert_eq!(tomato.storage_type, Some(StorageType::Cold));
        assert_eq!(tomato.moisture_sensitivity, MoistureSensitivity::High);
        assert!(tomato.ideal_sowing_months.contains(&11));
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let db = db();
        assert_eq!(db.find_by_name("tOMATO").unwrap().unwrap().id, "tomato");
        assert_eq!(db.find_by_name(" Wheat ").unwrap().unwrap().id, "wheat");
        assert!(db.find_by_name("Tomatoes").unwrap().is_none());
    }

    #[test]
    fn unknown_storage_type_reads_as_none() {
        let db = db();
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE crop_references SET storage_type = 'Cellar' WHERE id = 'onion'",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        let onion = db.find_by_name("onion").unwrap().unwrap();
        assert_eq!(onion.storage_type, None);
        assert_eq!(onion.storage_or_default(), StorageType::Normal);
    }

    #[test]
    fn portfolio_save_replaces_everything() {
        let db = db();
        let tomato = db.find_by_name("Tomato").unwrap().unwrap();
        let wheat = db.find_by_name("Wheat").unwrap().unwrap();
        let sowing = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let mut first = CropInstance::plant(&tomato, sowing, Some(IrrigationType::Drip));
        first.id = "c1".into();
        first.advisory = Some(Advisory::new(AdvisoryAction::Hold, Urgency::Low, "Hold"));
        first.risk_level = Some(RiskLevel::Low);
        first.price_trend = Some(PriceTrend::Rising);
        let mut second = CropInstance::plant(&wheat, sowing, None);
        second.id = "c2".into();

        db.save("farmer-1", &[first.clone(), second.clone()]).unwrap();
        assert_eq!(db.load("farmer-1").unwrap(), vec![first.clone(), second]);

        db.save("farmer-1", &[first.clone()]).unwrap();
        assert_eq!(db.load("farmer-1").unwrap(), vec![first]);
        assert!(db.load("someone-else").unwrap().is_empty());
    }

    #[test]
    fn unreadable_crop_fails_load_instead_of_dropping_it() {
        let db = db();
        let tomato = db.find_by_name("Tomato").unwrap().unwrap();
        let sowing = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut a = CropInstance::plant(&tomato, sowing, None);
        a.id = "a".into();
        let mut b = CropInstance::plant(&tomato, sowing, None);
        b.id = "b".into();
        db.save("farmer-1", &[a, b]).unwrap();

        db.with_conn(|conn| {
            conn.execute("UPDATE crop_instances SET total_risk = 'n/a' WHERE id = 'b'", [])?;
            Ok(())
        })
        .unwrap();

        assert!(db.load("farmer-1").is_err());

        let rows: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM crop_instances WHERE user_id = 'farmer-1'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[test]
    fn prediction_cache_respects_freshness() {
        let db = db();
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut prediction = PricePrediction {
            crop_id: "onion".into(),
            target_date: date,
            user_id: "farmer-1".into(),
            predicted_price: 2100.0,
            confidence: 0.8,
            trend: PriceTrend::Falling,
            created_at: Utc::now(),
        };
        db.upsert(&prediction).unwrap();
        let cached = PredictionCache::get(&db, "onion", date, "farmer-1").unwrap();
        assert_eq!(cached.map(|p| p.trend), Some(PriceTrend::Falling));

        // Different user is a different key
        assert!(PredictionCache::get(&db, "onion", date, "farmer-2").unwrap().is_none());

        prediction.created_at = Utc::now() - Duration::hours(25);
        db.upsert(&prediction).unwrap();
        assert!(PredictionCache::get(&db, "onion", date, "farmer-1").unwrap().is_none());
    }

    #[test]
    fn risk_history_newest_first() {
        let db = db();
        for pct in [10, 50, 90] {
            db.append(&RiskHistoryRecord {
                id: None,
                crop_instance_id: "c1".into(),
                crop_name: "Tomato".into(),
                risk_percentage: pct,
                risk_level: RiskLevel::from_score(pct),
                storage_type: StorageType::Cold,
                temperature_c: 31.0,
                humidity_percent: 70.0,
                recorded_at: Utc::now(),
            })
            .unwrap();
        }
        let recent = db.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].risk_percentage, 90);
        assert_eq!(recent[1].risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn idempotency_marks_last_write_wins() {
        let db = db();
        assert!(IdempotencyCache::get(&db, "c1").unwrap().is_none());
        let first = Utc::now() - Duration::hours(2);
        let second = Utc::now();
        db.set("c1", first).unwrap();
        db.set("c1", second).unwrap();
        let stored = IdempotencyCache::get(&db, "c1").unwrap().unwrap();
        assert_eq!(stored.timestamp(), second.timestamp());
    }

    #[test]
    fn weather_cache_keeps_latest() {
        let db = db();
        assert!(db.last().unwrap().is_none());
        db.store(&WeatherSnapshot::new(30.0, 60.0, 2.0)).unwrap();
        db.store(&WeatherSnapshot::new(33.0, 40.0, 0.0).with_icon("01d"))
            .unwrap();
        let last = db.last().unwrap().unwrap();
        assert_eq!(last.temperature_c, 33.0);
        assert_eq!(last.icon, "01d");
    }
}
