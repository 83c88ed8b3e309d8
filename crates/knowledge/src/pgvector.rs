//! PostgreSQL + pgvector knowledge store.
//!
//! Records are embedded through the LLM Gateway's `embed` call and
//! retrieved by cosine distance (`<=>`). Embeddings travel as pgvector
//! text literals (`[0.1,0.2,...]`) cast with `::vector`.
//!
//! # Setup
//!
//! ```sql
//! CREATE EXTENSION IF NOT EXISTS vector;
//! ```
//!
//! The table itself is created by [`PgVectorStore::migrate`].

use async_trait::async_trait;
use aura_core::error::KnowledgeError;
use aura_core::knowledge::{KnowledgeQuery, KnowledgeRecord, KnowledgeStore};
use aura_core::provider::{EmbeddingRequest, Provider};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use std::sync::Arc;
use tracing::{debug, info};

const MIGRATION: &str = include_str!("../migrations/001_create_agent_knowledge.sql");

pub struct PgVectorStore {
    pool: PgPool,
    embedder: Arc<dyn Provider>,
    embedding_model: String,
    table: String,
    embedding_dim: usize,
}

impl PgVectorStore {
    /// Connect and prepare the table.
    pub async fn connect(
        database_url: &str,
        table: &str,
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
        embedding_dim: usize,
    ) -> Result<Self, KnowledgeError> {
        validate_identifier(table)?;

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| KnowledgeError::Unavailable(format!("PostgreSQL connection failed: {e}")))?;

        info!(table, "Connected to PostgreSQL knowledge store");

        let store = Self {
            pool,
            embedder,
            embedding_model: embedding_model.into(),
            table: table.to_string(),
            embedding_dim,
        };
        store.migrate().await?;
        Ok(store)
    }

    /// Create the knowledge table if it does not exist.
    pub async fn migrate(&self) -> Result<(), KnowledgeError> {
        sqlx::raw_sql(&migration_sql(&self.table, self.embedding_dim))
            .execute(&self.pool)
            .await
            .map_err(|e| KnowledgeError::MigrationFailed(e.to_string()))?;

        info!(table = %self.table, "Knowledge schema migration complete");
        Ok(())
    }

    async fn embed_one(&self, text: &str) -> Result<String, KnowledgeError> {
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![text.to_string()],
            })
            .await
            .map_err(|e| KnowledgeError::EmbeddingFailed(e.to_string()))?;

        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| KnowledgeError::EmbeddingFailed("empty embedding response".into()))?;

        if embedding.len() != self.embedding_dim {
            return Err(KnowledgeError::EmbeddingFailed(format!(
                "expected {} dimensions, got {}",
                self.embedding_dim,
                embedding.len()
            )));
        }

        Ok(vector_literal(&embedding))
    }
}

/// Table names are spliced into SQL, so only plain identifiers pass.
fn validate_identifier(name: &str) -> Result<(), KnowledgeError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(KnowledgeError::Storage(format!(
            "invalid table name '{name}'"
        )))
    }
}

fn migration_sql(table: &str, dim: usize) -> String {
    MIGRATION
        .replace("{table}", table)
        .replace("{dim}", &dim.to_string())
}

fn vector_literal(embedding: &[f32]) -> String {
    format!(
        "[{}]",
        embedding
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    )
}

fn row_to_record(row: &PgRow) -> KnowledgeRecord {
    KnowledgeRecord {
        content: row.get("content"),
        source: row.get("source"),
        owner_id: row.get("owner_id"),
        category: row.get("category"),
        created_at: row.get("created_at"),
        score: row.get::<f64, _>("score") as f32,
    }
}

#[async_trait]
impl KnowledgeStore for PgVectorStore {
    fn name(&self) -> &str {
        "pgvector"
    }

    async fn upsert(&self, key: &str, record: KnowledgeRecord) -> Result<String, KnowledgeError> {
        let embedding = self.embed_one(&record.content).await?;
        let meta = serde_json::json!({
            "source": record.source,
            "user_id": record.owner_id,
            "type": record.category,
        });

        let sql = format!(
            "INSERT INTO {table} (key, content, source, owner_id, category, meta, created_at, embedding) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8::vector) \
             ON CONFLICT (key) DO UPDATE SET \
               content = EXCLUDED.content, \
               source = EXCLUDED.source, \
               owner_id = EXCLUDED.owner_id, \
               category = EXCLUDED.category, \
               meta = EXCLUDED.meta, \
               created_at = EXCLUDED.created_at, \
               embedding = EXCLUDED.embedding",
            table = self.table
        );

        sqlx::query(&sql)
            .bind(key)
            .bind(&record.content)
            .bind(&record.source)
            .bind(&record.owner_id)
            .bind(&record.category)
            .bind(&meta)
            .bind(record.created_at)
            .bind(&embedding)
            .execute(&self.pool)
            .await
            .map_err(|e| KnowledgeError::Storage(format!("Failed to store record: {e}")))?;

        debug!(key, chars = record.content.len(), "Stored knowledge record");
        Ok(key.to_string())
    }

    async fn retrieve(&self, query: KnowledgeQuery) -> Result<Vec<KnowledgeRecord>, KnowledgeError> {
        if query.text.trim().is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embed_one(&query.text).await?;

        let sql = format!(
            "SELECT content, source, owner_id, category, created_at, \
             1.0 - (embedding <=> $1::vector) AS score \
             FROM {table} \
             WHERE embedding IS NOT NULL \
             AND ($2::text IS NULL OR owner_id = $2) \
             ORDER BY embedding <=> $1::vector ASC \
             LIMIT $3",
            table = self.table
        );

        let rows = sqlx::query(&sql)
            .bind(&embedding)
            .bind(query.owner_id.as_deref())
            .bind(query.limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| KnowledgeError::QueryFailed(format!("Vector search failed: {e}")))?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn count(&self) -> Result<usize, KnowledgeError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS cnt FROM {}", self.table))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| KnowledgeError::QueryFailed(format!("Failed to count records: {e}")))?;

        let count: i64 = row.get("cnt");
        Ok(count as usize)
    }
}

// ── Unit tests (no DB required) ──────────────────────────────────────────
