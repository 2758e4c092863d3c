use crate::db::Database;
use crate::error::Result;

const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS crop_references (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE COLLATE NOCASE,
        growth_duration_days INTEGER NOT NULL,
        optimal_temp_min REAL NOT NULL,
        optimal_temp_max REAL NOT NULL,
        moisture_sensitivity TEXT NOT NULL,
        shelf_life_days INTEGER NOT NULL,
        storage_type TEXT,
        ideal_sowing_months TEXT NOT NULL DEFAULT '[]',
        suitable_soils TEXT NOT NULL DEFAULT '[]',
        region_tags TEXT NOT NULL DEFAULT '[]',
        min_area_hectares REAL
    );

    CREATE TABLE IF NOT EXISTS crop_instances (
        user_id TEXT NOT NULL,
        id TEXT NOT NULL,
        position INTEGER NOT NULL,
        reference_id TEXT NOT NULL,
        name TEXT NOT NULL,
        sowing_date TEXT NOT NULL,
        harvest_date TEXT,
        irrigation_type TEXT,
        harvest_status TEXT,
        risk_level TEXT,
        risk_percentage INTEGER,
        total_risk REAL,
        shelf_life_remaining INTEGER,
        advisory TEXT,
        price_trend TEXT,
        PRIMARY KEY (user_id, id)
    );

    CREATE TABLE IF NOT EXISTS price_predictions (
        crop_id TEXT NOT NULL,
        target_date TEXT NOT NULL,
        user_id TEXT NOT NULL,
        predicted_price REAL NOT NULL,
        confidence REAL NOT NULL DEFAULT 0,
        trend TEXT NOT NULL DEFAULT 'stable',
        created_at TEXT NOT NULL,
        PRIMARY KEY (crop_id, target_date, user_id)
    );

    CREATE TABLE IF NOT EXISTS risk_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        crop_instance_id TEXT NOT NULL,
        crop_name TEXT NOT NULL,
        risk_percentage INTEGER NOT NULL,
        risk_level TEXT NOT NULL,
        storage_type TEXT NOT NULL,
        temperature_c REAL NOT NULL,
        humidity_percent REAL NOT NULL,
        recorded_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS idempotency_marks (
        crop_id TEXT PRIMARY KEY,
        processed_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS weather_cache (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        temperature_c REAL NOT NULL,
        humidity_percent REAL NOT NULL,
        rainfall_mm REAL NOT NULL,
        icon TEXT NOT NULL DEFAULT '',
        source TEXT NOT NULL,
        timestamp TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS schema_migrations (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    // Migration 2: Add indexes
    r#"
    CREATE INDEX IF NOT EXISTS idx_crop_instances_user
        ON crop_instances(user_id, position);
    CREATE INDEX IF NOT EXISTS idx_risk_history_recorded_at
        ON risk_history(recorded_at);
    "#,
    // Migration 3: Starter reference catalog
    r#"
    INSERT OR IGNORE INTO crop_references
        (id, name, growth_duration_days, optimal_temp_min, optimal_temp_max,
         moisture_sensitivity, shelf_life_days, storage_type, ideal_sowing_months,
         suitable_soils, region_tags, min_area_hectares)
    VALUES
        ('wheat', 'Wheat', 120, 10, 25, 'Low', 180, 'Dry', '[10,11,12]',
         '["Loamy","Clay Loam"]', '["Punjab","Haryana","Uttar Pradesh","Madhya Pradesh"]', 0.5),
        ('rice', 'Rice', 120, 10, 30, 'Medium', 365, 'Dry', '[6,7]',
         '["Clay","Clay Loam"]', '["West Bengal","Punjab","Andhra Pradesh"]', 0.5),
        ('tomato', 'Tomato', 90, 10, 30, 'High', 20, 'Cold', '[1,6,7,11,12]',
         '["Loamy","Sandy Loam"]', '["Maharashtra","Karnataka"]', 0.1),
        ('potato', 'Potato', 100, 4, 12, 'Medium', 90, 'Cold', '[10,11]',
         '["Sandy Loam","Loamy"]', '["Uttar Pradesh","West Bengal"]', 0.2),
        ('onion', 'Onion', 120, 5, 30, 'Medium', 150, 'Ventilated', '[6,10,11,12]',
         '["Loamy","Sandy Loam","Clay Loam"]', '["Maharashtra","Karnataka"]', 0.2),
        ('maize', 'Maize', 95, 10, 30, 'Medium', 120, 'Dry', '[2,6,7]',
         '["Loamy","Sandy Loam"]', '["Karnataka","Bihar"]', 0.5),
        ('mustard', 'Mustard', 110, 10, 25, 'Low', 240, 'Dry', '[10,11]',
         '["Sandy Loam","Loamy"]', '["Rajasthan","Haryana"]', 0.3),
        ('chickpea', 'Chickpea', 100, 10, 30, 'Low', 300, 'Dry', '[10,11]',
         '["Sandy Loam","Clay Loam","Black"]', '["Madhya Pradesh","Rajasthan"]', 0.3),
        ('spinach', 'Spinach', 45, 2, 8, 'High', 10, 'Cold', '[1,2,9,10,11]',
         '["Loamy"]', '[]', NULL);
    "#,
];

pub fn run(db: &Database) -> Result<()> {
    db.with_conn_mut(|conn| {
        // Ensure schema_migrations table exists
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;

        // Get current version
        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        // Apply pending migrations
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                tracing::info!("Applying migration {}", version);
                let tx = conn.transaction()?;
                tx.execute_batch(migration)?;
                tx.execute(
                    "INSERT INTO schema_migrations (version) VALUES (?1)",
                    [version],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    })
}
