use crate::{
    core::vector::{
        cosine_similarity, EmbeddingRecord, SearchHit, StoreInfo, VectorDb, VectorStoreBackend,
    },
    err,
    error::ShelfError,
    map_err,
};
use chrono::{DateTime, Utc};
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};
use std::path::Path;
use tracing::{debug, warn};

/// File created in the store directory. Its presence means the store exists.
pub const MARKER: &str = "vectors.sqlite3";

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Creates and opens [SqliteVectorDb]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteBackend;

#[async_trait::async_trait]
impl VectorStoreBackend for SqliteBackend {
    type Db = SqliteVectorDb;

    fn marker(&self) -> &'static str {
        MARKER
    }

    async fn create(
        &self,
        dir: &Path,
        info: &StoreInfo,
        records: &[EmbeddingRecord],
    ) -> Result<Self::Db, ShelfError> {
        let path = dir.join(MARKER);
        let db = SqliteVectorDb::connect(&path, true).await?;

        match db.init(info, records).await {
            Ok(()) => Ok(db),
            Err(e) => {
                db.close().await;
                remove_database_files(&path).await;
                Err(e)
            }
        }
    }

    async fn open(&self, dir: &Path) -> Result<Self::Db, ShelfError> {
        SqliteVectorDb::connect(&dir.join(MARKER), false).await
    }
}

/// Remove the database and its journal files, logging failures.
async fn remove_database_files(path: &Path) {
    let mut paths = vec![path.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        paths.push(name.into());
    }

    for path in paths {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Unable to remove '{}': {e}", path.display());
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqliteVectorDb {
    pool: SqlitePool,
}

impl SqliteVectorDb {
    async fn connect(path: &Path, create: bool) -> Result<Self, ShelfError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = map_err!(
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect_with(options)
                .await
        );

        debug!("Connected to '{}'", path.display());

        Ok(Self { pool })
    }

    async fn init(&self, info: &StoreInfo, records: &[EmbeddingRecord]) -> Result<(), ShelfError> {
        map_err!(MIGRATOR.run(&self.pool).await);

        map_err!(
            sqlx::query(
                "INSERT INTO store_info(name, embedding_provider, embedding_model, size, created_at)
                 VALUES(?, ?, ?, ?, ?)",
            )
            .bind(info.name.as_str())
            .bind(info.embedding_provider.as_str())
            .bind(info.embedding_model.as_str())
            .bind(info.size as i64)
            .bind(info.created_at)
            .execute(&self.pool)
            .await
        );

        self.insert_embeddings(records).await
    }

    /// Close all connections to the database.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait::async_trait]
impl VectorDb for SqliteVectorDb {
    fn id(&self) -> &'static str {
        "sqlite"
    }

    async fn info(&self) -> Result<StoreInfo, ShelfError> {
        let row = map_err!(
            sqlx::query_as::<_, StoreInfoRow>(
                "SELECT name, embedding_provider, embedding_model, size, created_at FROM store_info LIMIT 1",
            )
            .fetch_optional(&self.pool)
            .await
        );

        let Some(row) = row else {
            return err!(NotFound, "store info");
        };

        Ok(row.into())
    }

    async fn insert_embeddings(&self, records: &[EmbeddingRecord]) -> Result<(), ShelfError> {
        let info = self.info().await?;

        if let Some(record) = records.iter().find(|r| r.vector.len() != info.size) {
            return err!(
                InvalidInput,
                "store '{}' holds vectors of size {}, got {}",
                info.name,
                info.size,
                record.vector.len()
            );
        }

        let mut tx = map_err!(self.pool.begin().await);

        for record in records {
            let vector = map_err!(serde_json::to_string(&record.vector));
            map_err!(
                sqlx::query(
                    "INSERT INTO embeddings(id, content, source, chunk_index, vector)
                     VALUES(?, ?, ?, ?, ?)",
                )
                .bind(record.id.to_string())
                .bind(record.content.as_str())
                .bind(record.source.as_str())
                .bind(record.chunk_index as i64)
                .bind(vector)
                .execute(&mut tx)
                .await
            );
        }

        map_err!(tx.commit().await);

        debug!("Inserted {} embeddings into '{}'", records.len(), info.name);

        Ok(())
    }

    async fn query(&self, search: &[f64], limit: usize) -> Result<Vec<SearchHit>, ShelfError> {
        let rows = map_err!(
            sqlx::query_as::<_, EmbeddingRow>(
                "SELECT content, source, chunk_index, vector FROM embeddings ORDER BY rowid",
            )
            .fetch_all(&self.pool)
            .await
        );

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let vector: Vec<f64> = map_err!(serde_json::from_str(&row.vector));
            hits.push(SearchHit {
                score: cosine_similarity(search, &vector),
                content: row.content,
                source: row.source,
                chunk_index: row.chunk_index as usize,
            });
        }

        // Stable, so equal scores keep the insertion order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);

        Ok(hits)
    }

    async fn count(&self) -> Result<usize, ShelfError> {
        let count: i64 = map_err!(
            sqlx::query_scalar("SELECT COUNT(*) FROM embeddings")
                .fetch_one(&self.pool)
                .await
        );
        Ok(count as usize)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreInfoRow {
    name: String,
    embedding_provider: String,
    embedding_model: String,
    size: i64,
    created_at: DateTime<Utc>,
}

impl From<StoreInfoRow> for StoreInfo {
    fn from(row: StoreInfoRow) -> Self {
        Self {
            name: row.name,
            embedding_provider: row.embedding_provider,
            embedding_model: row.embedding_model,
            size: row.size as usize,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EmbeddingRow {
    content: String,
    source: String,
    chunk_index: i64,
    vector: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chunk::Chunk;

    const DIR: &str = "__sqlite_vector_tests";

    fn record(content: &str, index: usize, vector: Vec<f64>) -> EmbeddingRecord {
        let chunk = Chunk {
            content: content.to_string(),
            source: "test.txt".to_string(),
            index,
        };
        EmbeddingRecord::new(&chunk, vector)
    }

    #[tokio::test]
    async fn create_open_and_query() {
        let dir = Path::new(DIR).join("create_open_and_query");
        let _ = tokio::fs::remove_dir_all(&dir).await;
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let info = StoreInfo::new("test", "test", "test-model", 2);
        let records = vec![
            record("right", 0, vec![1.0, 0.0]),
            record("up", 1, vec![0.0, 1.0]),
            record("also right", 2, vec![2.0, 0.0]),
            record("diagonal", 3, vec![1.0, 1.0]),
        ];

        let db = SqliteBackend.create(&dir, &info, &records).await.unwrap();
        assert!(dir.join(MARKER).exists());
        assert_eq!(4, db.count().await.unwrap());
        db.close().await;

        let db = SqliteBackend.open(&dir).await.unwrap();
        let stored = db.info().await.unwrap();
        assert_eq!("test-model", stored.embedding_model);
        assert_eq!(2, stored.size);

        let hits = db.query(&[1.0, 0.0], 3).await.unwrap();
        let content = hits.iter().map(|h| h.content.as_str()).collect::<Vec<_>>();

        // Both "right" vectors score 1 and keep their insertion order
        assert_eq!(vec!["right", "also right", "diagonal"], content);
        assert!((hits[0].score - 1.0).abs() < 1e-9);
        assert_eq!(2, hits[1].chunk_index);

        db.close().await;
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn query_with_non_finite_vector() {
        let dir = Path::new(DIR).join("query_with_non_finite_vector");
        let _ = tokio::fs::remove_dir_all(&dir).await;
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let info = StoreInfo::new("test", "test", "test-model", 2);
        // Zero vectors score 0, the rest NaN
        let records = (0..20)
            .map(|i| {
                let vector = if i % 3 == 0 {
                    vec![0.0, 0.0]
                } else {
                    vec![1.0, i as f64]
                };
                record(&format!("chunk {i}"), i, vector)
            })
            .collect::<Vec<_>>();

        let db = SqliteBackend.create(&dir, &info, &records).await.unwrap();

        let hits = db.query(&[f64::INFINITY, 1.0], 5).await.unwrap();
        assert_eq!(5, hits.len());

        db.close().await;
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_wrong_vector_size() {
        let dir = Path::new(DIR).join("rejects_wrong_vector_size");
        let _ = tokio::fs::remove_dir_all(&dir).await;
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let info = StoreInfo::new("test", "test", "test-model", 3);
        let records = vec![record("short", 0, vec![1.0, 0.0])];

        assert!(SqliteBackend.create(&dir, &info, &records).await.is_err());
        assert!(!dir.join(MARKER).exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
