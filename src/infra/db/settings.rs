use async_trait::async_trait;

use crate::{
    application::repos::{RepoError, SettingsRepo},
    domain::entities::SettingRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct SettingRow {
    name: String,
    value: String,
}

impl From<SettingRow> for SettingRecord {
    fn from(row: SettingRow) -> Self {
        Self {
            name: row.name,
            value: row.value,
        }
    }
}

#[async_trait]
impl SettingsRepo for PostgresRepositories {
    async fn find_setting(&self, name: &str) -> Result<Option<SettingRecord>, RepoError> {
        let row = sqlx::query_as::<_, SettingRow>(
            "SELECT name, value FROM settings WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SettingRecord::from))
    }

    async fn upsert_setting(&self, record: SettingRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO settings (name, value)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(&record.name)
        .bind(&record.value)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
