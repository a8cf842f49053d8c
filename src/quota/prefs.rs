//! SQLite-backed user preferences
//!
//! Local stand-in for the external preferences collaborator. The quota gate
//! asks exactly one question of it: which subscription plan a user is on.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// SQLite-backed preference store
pub struct PreferenceStore {
    conn: Mutex<Connection>,
}

impl PreferenceStore {
    /// Create or open the store at the default data location
    pub fn open_default() -> Result<Self, String> {
        Self::open(Self::default_db_path()?)
    }

    /// Create or open the store at an explicit path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, String> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create data dir: {}", e))?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| format!("Failed to open preferences database: {}", e))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS user_preferences (
                user_id TEXT PRIMARY KEY,
                subscription_plan TEXT,
                updated_at TEXT NOT NULL
            );
        "#,
        )
        .map_err(|e| format!("Failed to create tables: {}", e))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn default_db_path() -> Result<PathBuf, String> {
        dirs::data_dir()
            .map(|d| d.join("ada-tutor").join("preferences.db"))
            .ok_or_else(|| "Could not determine data directory".to_string())
    }

    /// Stored subscription plan for a user, if any
    pub fn subscription_plan(&self, user_id: &str) -> Result<Option<String>, String> {
        let conn = self.conn.lock().unwrap();
        let plan: Option<Option<String>> = conn
            .query_row(
                "SELECT subscription_plan FROM user_preferences WHERE user_id = ?",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| format!("Database query failed: {}", e))?;

        // Absent row and NULL column read the same: no plan recorded
        Ok(plan.flatten())
    }

    /// Record (or clear) a user's subscription plan
    pub fn set_plan(&self, user_id: &str, plan: Option<&str>) -> Result<(), String> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO user_preferences (user_id, subscription_plan, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET
                subscription_plan = excluded.subscription_plan,
                updated_at = excluded.updated_at
            "#,
            params![user_id, plan, Utc::now().to_rfc3339()],
        )
        .map_err(|e| format!("Failed to store preference: {}", e))?;

        debug!(user = user_id, plan = ?plan, "Updated subscription plan");
        Ok(())
    }
}
