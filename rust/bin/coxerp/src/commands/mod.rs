//! Subcommand handlers.

pub mod request;

use std::sync::Arc;

use anyhow::Result;
use clap::ValueEnum;
use coxerp_blob::FileStore;
use coxerp_kv::RedbStore;
use coxerp_production::{RequestError, RequestStore};
use serde::Serialize;
use tracing::info;

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Output {
    Table,
    Json,
}

/// Everything a handler needs: the opened store and the output format.
pub struct Session {
    pub store: RequestStore,
    pub output: Output,
}

impl Session {
    pub fn open(config: AppConfig, output: Output) -> Result<Self> {
        let storage = &config.storage;
        if let Some(dir) = &storage.data_dir {
            std::fs::create_dir_all(dir)?;
        }

        let db_path = storage.resolve_db_path();
        let kv = RedbStore::open(&db_path).map_err(RequestError::from)?;
        let blobs = FileStore::open(&storage.resolve_blob_dir()).map_err(RequestError::from)?;
        info!("Opened request store at {}", db_path.display());

        let store = RequestStore::new(Arc::new(kv), config.request)?.with_blob_store(Arc::new(blobs));
        Ok(Self { store, output })
    }

    /// Print `value` as pretty JSON, or hand it to `table` in table mode.
    pub fn emit<T: Serialize>(&self, value: &T, table: impl FnOnce(&T)) -> Result<()> {
        match self.output {
            Output::Json => println!("{}", serde_json::to_string_pretty(value)?),
            Output::Table => table(value),
        }
        Ok(())
    }
}
