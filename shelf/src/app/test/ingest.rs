use super::{test_dir, TestEmbedder, TEST_EMBEDDER_ID, TEST_MODEL, TEST_TEXT};
use crate::{
    app::vector::sqlite::{SqliteBackend, MARKER},
    core::{
        chunk::ChunkConfig,
        ingest::{IngestConfig, Ingestion},
        vector::create_vector_store,
    },
    error::ShelfErr,
};
use std::path::Path;
use tracing_test::traced_test;

const SUITE: &str = "__ingest_tests";

async fn config(dir: &Path) -> IngestConfig {
    let source = dir.join("book.txt");
    tokio::fs::write(&source, TEST_TEXT).await.unwrap();

    IngestConfig {
        source,
        parse: None,
        chunk: ChunkConfig::recursive(100, 20).unwrap(),
        model: TEST_MODEL.to_string(),
        db_dir: dir.join("db"),
        store_name: "store".to_string(),
    }
}

#[tokio::test]
async fn missing_source_fails_before_processing() {
    let dir = test_dir(SUITE, "missing_source").await;
    let embedder = TestEmbedder::new();

    let config = IngestConfig {
        source: dir.join("does_not_exist.txt"),
        ..config(&dir).await
    };

    let result = Ingestion::new(&SqliteBackend, &embedder).run(&config).await;

    let Err(e) = result else {
        panic!("ingestion succeeded");
    };
    assert!(matches!(e.error, ShelfErr::NotFound(_)));
    assert_eq!(0, embedder.embedded());
    assert!(!config.db_dir.exists());

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
#[traced_test]
async fn existing_store_is_reused() {
    let dir = test_dir(SUITE, "existing_store_is_reused").await;
    let config = config(&dir).await;

    let embedder = TestEmbedder::new();
    let (report, store) = Ingestion::new(&SqliteBackend, &embedder)
        .run(&config)
        .await
        .unwrap();

    assert!(report.created);
    assert_eq!(5, report.chunks);
    assert_eq!(5, embedder.embedded());
    assert_eq!(5, store.count().await.unwrap());
    assert!(store.dir.join(MARKER).exists());
    store.db.close().await;

    let embedder = TestEmbedder::new();
    let (report, store) = Ingestion::new(&SqliteBackend, &embedder)
        .run(&config)
        .await
        .unwrap();

    assert!(!report.created);
    assert_eq!(5, report.chunks);
    assert_eq!(0, embedder.embedded());
    assert_eq!(5, store.count().await.unwrap());
    assert!(logs_contain("already exists"));

    let info = store.info().await.unwrap();
    assert_eq!(TEST_EMBEDDER_ID, info.embedding_provider);
    assert_eq!(TEST_MODEL, info.embedding_model);
    store.db.close().await;

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn chunk_count_is_deterministic() {
    let dir = test_dir(SUITE, "chunk_count_is_deterministic").await;
    let base = config(&dir).await;
    let embedder = TestEmbedder::new();
    let ingestion = Ingestion::new(&SqliteBackend, &embedder);

    let mut counts = vec![];
    for (i, chunk) in [
        ChunkConfig::recursive(60, 10).unwrap(),
        ChunkConfig::recursive(60, 10).unwrap(),
        ChunkConfig::character(60, 10).unwrap(),
        ChunkConfig::character(60, 10).unwrap(),
    ]
    .into_iter()
    .enumerate()
    {
        let config = IngestConfig {
            chunk,
            store_name: format!("store_{i}"),
            ..base.clone()
        };
        let (report, store) = ingestion.run(&config).await.unwrap();
        assert_eq!(report.chunks, store.count().await.unwrap());
        store.db.close().await;
        counts.push(report.chunks);
    }

    assert_eq!(7, counts[0]);
    assert_eq!(counts[0], counts[1]);
    assert_eq!(counts[2], counts[3]);

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn reusing_store_with_other_model_fails() {
    let dir = test_dir(SUITE, "reusing_store_with_other_model_fails").await;
    let config = config(&dir).await;
    let embedder = TestEmbedder::new();
    let ingestion = Ingestion::new(&SqliteBackend, &embedder);

    let (_, store) = ingestion.run(&config).await.unwrap();
    store.db.close().await;

    let config = IngestConfig {
        model: "other-model".to_string(),
        ..config
    };

    let Err(e) = ingestion.run(&config).await else {
        panic!("store reused with a different model");
    };
    assert!(matches!(e.error, ShelfErr::InvalidEmbeddingModel(_)));

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn empty_document_creates_nothing() {
    let dir = test_dir(SUITE, "empty_document_creates_nothing").await;
    let config = config(&dir).await;
    tokio::fs::write(&config.source, "  \n\n ").await.unwrap();

    let embedder = TestEmbedder::new();
    let Err(e) = Ingestion::new(&SqliteBackend, &embedder)
        .run(&config)
        .await
    else {
        panic!("store created from an empty document");
    };

    assert!(matches!(e.error, ShelfErr::InvalidInput(_)));
    assert!(!config.db_dir.join("store").join(MARKER).exists());

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn unsupported_model_creates_nothing() {
    let dir = test_dir(SUITE, "unsupported_model_creates_nothing").await;
    let embedder = TestEmbedder::new();
    let chunks = ChunkConfig::default().split(&crate::core::document::Document::new(
        "book.txt", TEST_TEXT,
    ));

    let result = create_vector_store(
        &SqliteBackend,
        &chunks,
        &embedder,
        "no-such-model",
        &dir,
        "store",
    )
    .await;

    let Err(e) = result else {
        panic!("store created with an unsupported model");
    };
    assert!(matches!(e.error, ShelfErr::InvalidEmbeddingModel(_)));
    assert!(!dir.join("store").join(MARKER).exists());

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
