use anyhow::Result;
use sqlx::sqlite::SqlitePool;

use crate::domain::{Likelihood, Settings, Stats};

const KEY_API_KEY: &str = "api_key";
const KEY_ENABLED: &str = "enabled";

/// Persisted settings and running tallies. Settings are read once per
/// analysis; the tally is bumped once per completed classification.
#[derive(Clone)]
pub struct SettingsStore {
    pool: SqlitePool,
}

impl SettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn settings(&self) -> Result<Settings> {
        let api_key = self.get_value(KEY_API_KEY).await?.filter(|v| !v.is_empty());
        let enabled = match self.get_value(KEY_ENABLED).await?.as_deref() {
            Some("false") => false,
            _ => true,
        };
        Ok(Settings { api_key, enabled })
    }

    pub async fn set_api_key(&self, api_key: &str) -> Result<()> {
        self.set_value(KEY_API_KEY, api_key).await
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.set_value(KEY_ENABLED, if enabled { "true" } else { "false" })
            .await
    }

    pub async fn record(&self, likelihood: Likelihood) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO stats (label, count) VALUES (?1, 1)
               ON CONFLICT(label) DO UPDATE SET count = count + 1"#,
        )
        .bind(likelihood.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<Stats> {
        let rows: Vec<(String, i64)> = sqlx::query_as(r#"SELECT label, count FROM stats"#)
            .fetch_all(&self.pool)
            .await?;

        let mut stats = Stats::default();
        for (label, count) in rows {
            let count = count.max(0) as u64;
            match Likelihood::parse(&label) {
                Some(Likelihood::Low) => stats.low = count,
                Some(Likelihood::Medium) => stats.medium = count,
                Some(Likelihood::High) => stats.high = count,
                Some(Likelihood::Certain) => stats.certain = count,
                None => continue,
            }
            stats.total += count;
        }
        Ok(stats)
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as(r#"SELECT value FROM settings WHERE key = ?1"#)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
               ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                              updated_at = CURRENT_TIMESTAMP"#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_store() -> SettingsStore {
        // One connection, or each pool checkout would see its own :memory: db.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::apply_schema(&pool).await.unwrap();
        SettingsStore::new(pool)
    }

    #[tokio::test]
    async fn settings_default_to_enabled_without_key() {
        let store = memory_store().await;
        let settings = store.settings().await.unwrap();
        assert!(settings.enabled);
        assert!(settings.api_key.is_none());
    }

    #[tokio::test]
    async fn set_and_read_back_settings() {
        let store = memory_store().await;
        store.set_api_key("sk-botlens-test").await.unwrap();
        store.set_enabled(false).await.unwrap();

        let settings = store.settings().await.unwrap();
        assert_eq!(settings.api_key.as_deref(), Some("sk-botlens-test"));
        assert!(!settings.enabled);
    }

    #[tokio::test]
    async fn record_tallies_per_label_and_total() {
        let store = memory_store().await;
        store.record(Likelihood::High).await.unwrap();
        store.record(Likelihood::High).await.unwrap();
        store.record(Likelihood::Low).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(Likelihood::High), 2);
        assert_eq!(stats.count(Likelihood::Low), 1);
        assert_eq!(stats.count(Likelihood::Certain), 0);
    }
}
