//! PostgreSQL store for feedback records and the versioned weights document

use crate::learning::RunRecord;
use crate::models::{FeedbackRecord, LearningWeights};
use crate::store::{LearningStore, StoreError, VersionedWeights};
use async_trait::async_trait;
use chrono::Utc;
use tokio_postgres::{Client, NoTls};
use tracing::{error, warn};
use uuid::Uuid;

const WEIGHTS_ROW_ID: i16 = 1;

pub struct PostgresStore {
    client: Client,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to connect to PostgreSQL: {}", e)))?;

        // Spawn connection task
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        let store = Self { client };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS plan_feedback (
                    seq BIGSERIAL PRIMARY KEY,
                    id TEXT NOT NULL UNIQUE,
                    plan_id TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    record_json TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS learning_weights (
                    id SMALLINT PRIMARY KEY,
                    version BIGINT NOT NULL,
                    weights_json TEXT NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                );
                CREATE TABLE IF NOT EXISTS learning_runs (
                    run_id TEXT PRIMARY KEY,
                    record_json TEXT NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                );",
            )
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to create tables: {}", e)))
    }

    async fn current_version(&self) -> Result<u64, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT version FROM learning_weights WHERE id = $1",
                &[&WEIGHTS_ROW_ID],
            )
            .await?;
        Ok(row.map(|r| r.get::<_, i64>(0) as u64).unwrap_or(0))
    }
}

#[async_trait]
impl LearningStore for PostgresStore {
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        self.client
            .execute(
                "INSERT INTO plan_feedback (id, plan_id, created_at, record_json)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (id) DO NOTHING",
                &[&record.id, &record.plan_id, &record.timestamp, &json],
            )
            .await?;
        Ok(())
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        let rows = self
            .client
            .query("SELECT record_json FROM plan_feedback ORDER BY seq", &[])
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let json: String = row.get(0);
            match serde_json::from_str::<FeedbackRecord>(&json) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "Skipping unreadable feedback row"),
            }
        }
        Ok(records)
    }

    async fn load_weights(&self) -> Result<VersionedWeights, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT version, weights_json FROM learning_weights WHERE id = $1",
                &[&WEIGHTS_ROW_ID],
            )
            .await?;

        match row {
            Some(row) => {
                let version: i64 = row.get(0);
                let json: String = row.get(1);
                Ok(VersionedWeights {
                    version: version as u64,
                    weights: serde_json::from_str(&json)?,
                })
            }
            None => Ok(VersionedWeights::default()),
        }
    }

    async fn save_weights(
        &self,
        weights: &LearningWeights,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let json = serde_json::to_string(weights)?;
        let now = Utc::now();

        let updated = if expected_version == 0 {
            self.client
                .execute(
                    "INSERT INTO learning_weights (id, version, weights_json, updated_at)
                     VALUES ($1, 1, $2, $3)
                     ON CONFLICT (id) DO NOTHING",
                    &[&WEIGHTS_ROW_ID, &json, &now],
                )
                .await?
        } else {
            let expected = expected_version as i64;
            self.client
                .execute(
                    "UPDATE learning_weights
                     SET version = version + 1, weights_json = $2, updated_at = $3
                     WHERE id = $1 AND version = $4",
                    &[&WEIGHTS_ROW_ID, &json, &now, &expected],
                )
                .await?
        };

        if updated == 1 {
            return Ok(expected_version + 1);
        }

        Err(StoreError::VersionConflict {
            expected: expected_version,
            found: self.current_version().await?,
        })
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(run)?;
        self.client
            .execute(
                "INSERT INTO learning_runs (run_id, record_json, updated_at)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (run_id) DO UPDATE
                 SET record_json = EXCLUDED.record_json, updated_at = EXCLUDED.updated_at",
                &[&run.run_id.to_string(), &json, &run.updated_at],
            )
            .await?;
        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunRecord>, StoreError> {
        let row = self
            .client
            .query_opt(
                "SELECT record_json FROM learning_runs WHERE run_id = $1",
                &[&run_id.to_string()],
            )
            .await?;
        match row {
            Some(row) => {
                let json: String = row.get(0);
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
