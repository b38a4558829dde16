use super::{
    agent::{greeting_graph, AgentState},
    repo::pg::{close_db_connection, get_db_connection, DbConfig},
    state::AppState,
    vector::sqlite::{SqliteBackend, SqliteVectorDb},
};
use crate::{
    config::{Command, SplitterKind, StartArgs},
    core::{
        chunk::ChunkConfig,
        document::convert::process_documents,
        ingest::{IngestConfig, Ingestion},
        path_exists,
        retriever::{Retriever, SearchKind},
        vector::{SearchHit, VectorDb, VectorStore},
    },
    err,
    error::ShelfError,
    map_err,
};
use std::fmt::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

/// Execute the command given in `args`.
pub async fn run(args: StartArgs) -> Result<(), ShelfError> {
    match args.command {
        Command::Convert => {
            let converted = process_documents(&args.book_dir_path()).await?;
            info!("Converted {} documents", converted.len());
        }
        Command::Ingest {
            splitter,
            size,
            overlap,
        } => ingest(&args, splitter, size, overlap).await?,
        Command::Query {
            k,
            threshold,
            no_threshold,
        } => {
            let kind = if no_threshold {
                SearchKind::Similarity { k }
            } else {
                SearchKind::SimilarityScoreThreshold {
                    k,
                    score_threshold: threshold,
                }
            };
            query(&args, kind).await?
        }
        Command::Greet {
            ref name,
            age,
            ref skills,
        } => {
            let graph = greeting_graph()?;
            let state = graph.invoke(AgentState {
                name: name.clone(),
                age,
                skills: skills.clone(),
                result: String::new(),
            });
            println!("{}", map_err!(serde_json::to_string_pretty(&state)));
        }
        Command::DbCheck => {
            let config = DbConfig::from_env();
            let pool = get_db_connection(&config).await;
            let connected = pool.is_some();
            close_db_connection(pool).await;
            if !connected {
                return err!(
                    NotFound,
                    "unable to connect to postgres at {}:{}",
                    config.host,
                    config.port
                );
            }
        }
    }

    Ok(())
}

async fn ingest(
    args: &StartArgs,
    splitter: SplitterKind,
    size: usize,
    overlap: usize,
) -> Result<(), ShelfError> {
    let source = args.source_file_path();

    // Checked before loading the embedding model
    if !path_exists(&source).await? {
        return err!(
            NotFound,
            "The file {} does not exist. Please check the path.",
            source.display()
        );
    }

    let chunk = match splitter {
        SplitterKind::Character => ChunkConfig::character(size, overlap)?,
        SplitterKind::Recursive => ChunkConfig::recursive(size, overlap)?,
        SplitterKind::Sliding => ChunkConfig::sliding(size, overlap)?,
    };

    let provider = args.embedding_provider();
    let model = args.embedding_model();
    let state = AppState::new(args, &provider, model.as_deref()).await?;

    let config = IngestConfig {
        source,
        parse: None,
        chunk,
        model: state.model.clone(),
        db_dir: args.db_dir_path(),
        store_name: args.store_name(),
    };

    let (report, store) = Ingestion::new(&state.backend, state.embedder.as_ref())
        .run(&config)
        .await?;

    info!(
        "Store '{}' holds {} vectors",
        store.dir.display(),
        store.count().await?
    );
    store.db.close().await;

    println!("{}", map_err!(serde_json::to_string_pretty(&report)));

    Ok(())
}

async fn query(args: &StartArgs, kind: SearchKind) -> Result<(), ShelfError> {
    let dir = args.db_dir_path().join(args.store_name());
    let store: VectorStore<SqliteVectorDb> = VectorStore::open(&SqliteBackend, &dir).await?;
    let info = store.info().await?;

    let state = AppState::new(
        args,
        &info.embedding_provider,
        Some(info.embedding_model.as_str()),
    )
    .await?;

    let retriever = Retriever::new(&store, state.embedder.as_ref(), kind).await?;

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    query_loop(&retriever, stdin, stdout).await?;

    store.db.close().await;

    Ok(())
}

/// Answer queries read line by line from `input` until `exit` or the end of input.
pub async fn query_loop<Db, R, W>(
    retriever: &Retriever<'_, Db>,
    input: R,
    mut output: W,
) -> Result<(), ShelfError>
where
    Db: VectorDb + Send + Sync,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        map_err!(output.write_all(b"You: ").await);
        map_err!(output.flush().await);

        let Some(line) = map_err!(lines.next_line().await) else {
            break;
        };

        let query = line.trim();

        if query.eq_ignore_ascii_case("exit") {
            break;
        }

        if query.is_empty() {
            continue;
        }

        map_err!(output.write_all(b"Retrieving relevant documents...\n").await);

        let hits = retriever.invoke(query).await?;
        let formatted = format_hits(&hits)?;
        map_err!(output.write_all(formatted.as_bytes()).await);
    }

    map_err!(output.flush().await);

    Ok(())
}

fn format_hits(hits: &[SearchHit]) -> Result<String, ShelfError> {
    let mut out = String::new();

    if hits.is_empty() {
        map_err!(writeln!(out, "No relevant documents found.\n"));
        return Ok(out);
    }

    for (i, hit) in hits.iter().enumerate() {
        map_err!(writeln!(
            out,
            "Document {} ({}, chunk {}, score {:.4}):\n{}\n",
            i + 1,
            hit.source,
            hit.chunk_index,
            hit.score,
            hit.content
        ));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hits() {
        let hits = vec![SearchHit {
            content: "Cooking pasta".to_string(),
            source: "book.txt".to_string(),
            chunk_index: 2,
            score: 0.5,
        }];

        assert_eq!(
            "Document 1 (book.txt, chunk 2, score 0.5000):\nCooking pasta\n\n",
            format_hits(&hits).unwrap()
        );
        assert_eq!(
            "No relevant documents found.\n\n",
            format_hits(&[]).unwrap()
        );
    }
}
