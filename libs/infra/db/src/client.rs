// [libs/infra/db/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION HANDLE
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTION DE ENLACES FISICOS Y BOOTSTRAP WAL/AUTO-VACUUM
 *
 * Cada store (feed, ipv4, malicious) reside en su propio archivo fisico
 * bajo `databases/`, abierto en modo Write-Ahead Log con auto-vacuum
 * habilitado, para permitir lector concurrente + escritor unico
 * (CONCURRENCY & RESOURCE MODEL).
 * =================================================================
 */

use crate::errors::DbError;
use libsql::{Builder, Connection, Database};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// Conexion fisica a un archivo de base de datos local.
#[derive(Clone)]
pub struct DbHandle {
    database: Arc<Database>,
    path: PathBuf,
}

impl DbHandle {
    /// Abre (o crea) el archivo fisico en `databases_dir/{name}.db`, aplica
    /// las pragmas WAL/auto-vacuum y devuelve el handle listo para usar.
    #[instrument(skip(databases_dir))]
    pub async fn open(databases_dir: &Path, name: &str) -> Result<Self, DbError> {
        tokio::fs::create_dir_all(databases_dir)
            .await
            .map_err(|e| DbError::Connection {
                path: databases_dir.display().to_string(),
                source: libsql::Error::Misuse(e.to_string()),
            })?;

        let path = databases_dir.join(format!("{name}.db"));
        info!("opening store [{}] at {:?}", name, path);

        let database = Builder::new_local(&path)
            .build()
            .await
            .map_err(|source| DbError::Connection {
                path: path.display().to_string(),
                source,
            })?;

        let handle = Self {
            database: Arc::new(database),
            path,
        };

        handle.apply_durability_pragmas().await?;
        Ok(handle)
    }

    async fn apply_durability_pragmas(&self) -> Result<(), DbError> {
        let conn = self.connect()?;
        conn.execute("PRAGMA journal_mode = WAL", ())
            .await
            .map_err(DbError::Schema)?;
        conn.execute("PRAGMA auto_vacuum = 1", ())
            .await
            .map_err(DbError::Schema)?;
        Ok(())
    }

    pub fn connect(&self) -> Result<Connection, DbError> {
        self.database.connect().map_err(|source| DbError::Connection {
            path: self.path.display().to_string(),
            source,
        })
    }
}
