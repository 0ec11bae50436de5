// [libs/domain/feeds/src/local_file.rs]
/*!
 * =================================================================
 * APARATO: LOCAL-FILE FEED
 * CLASIFICACION: DOMAIN LAYER (ESTRATO L2)
 * RESPONSABILIDAD: LEER HOSTNAMES DELIMITADOS POR LINEA DESDE UN ARCHIVO
 *                  LOCAL Y EMITIRLOS EN LOTES
 * =================================================================
 */

use crate::errors::FeedError;
use crate::feed::{Feed, FeedKind, UrlBatch};
use futures::stream::{self, BoxStream, StreamExt};
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Feed que enumera un archivo de texto con un hostname normalizado por
/// linea (lineas vacias se descartan).
pub struct LocalFileFeed {
    store_name: String,
    path: PathBuf,
    batch_size: usize,
}

impl LocalFileFeed {
    pub fn new(store_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            store_name: store_name.into(),
            path: path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Feed for LocalFileFeed {
    fn store_name(&self) -> &str {
        &self.store_name
    }

    fn kind(&self) -> FeedKind {
        FeedKind::LocalFile
    }

    fn stream(&self) -> BoxStream<'_, Result<UrlBatch, FeedError>> {
        let path = self.path.clone();
        let batch_size = self.batch_size;

        stream::once(async move {
            let file = File::open(&path).await.map_err(|source| FeedError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let reader = BufReader::new(file);
            let mut lines = reader.lines();

            let mut batches: Vec<Result<UrlBatch, FeedError>> = Vec::new();
            let mut current: UrlBatch = Default::default();

            loop {
                let next = lines.next_line().await.map_err(|source| FeedError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                match next {
                    Some(line) => {
                        let hostname = line.trim().to_lowercase();
                        if hostname.is_empty() {
                            continue;
                        }
                        current.insert(hostname);
                        if current.len() >= batch_size {
                            batches.push(Ok(std::mem::take(&mut current)));
                        }
                    }
                    None => break,
                }
            }
            if !current.is_empty() {
                batches.push(Ok(current));
            }
            Ok(batches)
        })
        .flat_map(|result: Result<Vec<Result<UrlBatch, FeedError>>, FeedError>| match result {
            Ok(batches) => stream::iter(batches).boxed(),
            Err(e) => stream::iter(vec![Err(e)]).boxed(),
        })
        .boxed()
    }
}
