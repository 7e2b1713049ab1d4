//! SQLite database management with migrations
//!
//! Holds the recipe catalogue: recipes with their embeddings plus the tag,
//! dietary, ingredient and device-compatibility side tables.

use crate::error::{MiseError, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;
use std::time::Duration;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database manager with migration support
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database at `db_path`
    pub fn new(db_path: &Path, pool_size: u32, busy_timeout_ms: u64) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| MiseError::Io {
                    source: e,
                    context: format!("Failed to create database directory: {:?}", parent),
                })?;
            }
        }

        let pragmas = format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = {};",
            busy_timeout_ms
        );
        let manager =
            SqliteConnectionManager::file(db_path).with_init(move |c| c.execute_batch(&pragmas));

        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_timeout(Duration::from_millis(busy_timeout_ms.max(250)))
            .build(manager)
            .map_err(|e| MiseError::Pool(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };
        db.migrate()?;

        Ok(db)
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| MiseError::Pool(format!("Failed to get connection: {}", e)))
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.get_conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current_version: i32 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )?;

        for (version, migration) in MIGRATIONS.iter().enumerate() {
            let version = version as i32 + 1;

            if version > current_version {
                tracing::info!("Applying migration {}", version);

                conn.execute_batch(migration)?;

                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, datetime('now'))",
                    params![version],
                )?;
            }
        }

        Ok(())
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.get_conn()?;

        let recipe_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;

        let embedded_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE embedding IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let tag_count: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT tag) FROM recipe_tags",
            [],
            |row| row.get(0),
        )?;

        Ok(DbStats {
            recipe_count: recipe_count as usize,
            embedded_count: embedded_count as usize,
            tag_count: tag_count as usize,
        })
    }
}

/// Database statistics
#[derive(Debug)]
pub struct DbStats {
    pub recipe_count: usize,
    pub embedded_count: usize,
    pub tag_count: usize,
}

/// Database migrations (each string is one migration)
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    CREATE TABLE recipes (
        recipe_id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        url TEXT NOT NULL,
        image_url TEXT,
        prep_time_minutes INTEGER,
        cook_time_minutes INTEGER,
        total_time_minutes INTEGER,
        servings INTEGER,
        difficulty TEXT,
        nutrition_calories_kcal REAL,
        nutrition_protein_g REAL,
        nutrition_carbs_g REAL,
        nutrition_fat_g REAL,
        rating REAL,
        rating_count INTEGER NOT NULL DEFAULT 0,
        embedding BLOB
    );

    CREATE INDEX idx_recipes_total_time ON recipes(total_time_minutes);
    CREATE INDEX idx_recipes_difficulty ON recipes(difficulty);

    -- Meal categories and cuisines
    CREATE TABLE recipe_tags (
        recipe_id TEXT NOT NULL,
        tag TEXT NOT NULL,
        PRIMARY KEY (recipe_id, tag),
        FOREIGN KEY (recipe_id) REFERENCES recipes(recipe_id) ON DELETE CASCADE
    );

    CREATE INDEX idx_recipe_tags_tag ON recipe_tags(tag);

    CREATE TABLE recipe_dietary_tags (
        recipe_id TEXT NOT NULL,
        dietary_tag TEXT NOT NULL,
        PRIMARY KEY (recipe_id, dietary_tag),
        FOREIGN KEY (recipe_id) REFERENCES recipes(recipe_id) ON DELETE CASCADE
    );

    CREATE INDEX idx_recipe_dietary_tags_tag ON recipe_dietary_tags(dietary_tag);

    CREATE TABLE recipe_ingredients (
        recipe_id TEXT NOT NULL,
        ingredient TEXT NOT NULL,
        FOREIGN KEY (recipe_id) REFERENCES recipes(recipe_id) ON DELETE CASCADE
    );

    CREATE INDEX idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);

    -- Device revisions a recipe supports (TM5, TM6, ...)
    CREATE TABLE recipe_devices (
        recipe_id TEXT NOT NULL,
        version TEXT NOT NULL,
        PRIMARY KEY (recipe_id, version),
        FOREIGN KEY (recipe_id) REFERENCES recipes(recipe_id) ON DELETE CASCADE
    );

    CREATE INDEX idx_recipe_devices_version ON recipe_devices(version);
    "#,
];
