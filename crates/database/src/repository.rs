use crate::error::DbError;
use crate::store::BlobStore;
use chrono::NaiveDate;
use core_types::{PnlTable, RegionIndex};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Current on-disk format of every blob.
pub const FORMAT_VERSION: u32 = 1;

pub const REGION_INDEX_KEY: &str = "region-index";
pub const PNL_TABLE_KEY: &str = "pnl-table";
pub const PARTITION_TAGS_KEY: &str = "partition-tags";

/// Everything the pipeline persists between runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheState {
    pub index: RegionIndex,
    pub table: PnlTable,
    /// Ids of the alphas carrying the partition classification.
    pub partition_tags: BTreeSet<String>,
}

impl CacheState {
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() && self.table.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    payload: T,
}

/// Columnar form of the wide table.
#[derive(Serialize, Deserialize)]
struct TableBlob {
    dates: Vec<NaiveDate>,
    columns: Vec<ColumnBlob>,
}

#[derive(Serialize, Deserialize)]
struct ColumnBlob {
    id: String,
    values: Vec<Option<f64>>,
}

impl From<&PnlTable> for TableBlob {
    fn from(table: &PnlTable) -> Self {
        TableBlob {
            dates: table.dates().to_vec(),
            columns: table
                .iter_columns()
                .map(|(id, cells)| ColumnBlob {
                    id: id.clone(),
                    values: cells.to_vec(),
                })
                .collect(),
        }
    }
}

impl TryFrom<TableBlob> for PnlTable {
    type Error = DbError;

    fn try_from(blob: TableBlob) -> Result<Self, Self::Error> {
        let columns = blob.columns.into_iter().map(|c| (c.id, c.values)).collect();
        Ok(PnlTable::from_parts(blob.dates, columns)?)
    }
}

/// Loads and saves the cached universe through a [`BlobStore`].
#[derive(Debug, Clone)]
pub struct CacheStore<S> {
    store: S,
}

impl<S: BlobStore> CacheStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the cached state, falling back to an empty state on any failure.
    pub fn load(&self) -> CacheState {
        match self.try_load() {
            Ok(state) => {
                tracing::info!(
                    alphas = state.table.width(),
                    dates = state.table.dates().len(),
                    "Loaded cached universe."
                );
                state
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not load the cache; starting from an empty state.");
                CacheState::default()
            }
        }
    }

    /// Loads the cached state, propagating the first error.
    pub fn try_load(&self) -> Result<CacheState, DbError> {
        let index: RegionIndex = self.read(REGION_INDEX_KEY)?;
        let table: TableBlob = self.read(PNL_TABLE_KEY)?;
        let table = PnlTable::try_from(table)?;
        let partition_tags: BTreeSet<String> = self.read(PARTITION_TAGS_KEY)?;

        if !index.is_consistent_with(&table) {
            return Err(DbError::Inconsistent(format!(
                "{} indexed ids vs {} table columns",
                index.len(),
                table.width()
            )));
        }

        Ok(CacheState {
            index,
            table,
            partition_tags,
        })
    }

    /// Overwrites all three keys with `state`.
    pub fn save(&self, state: &CacheState) -> Result<(), DbError> {
        if !state.index.is_consistent_with(&state.table) {
            return Err(DbError::Inconsistent(
                "refusing to save an index that does not match the table".to_string(),
            ));
        }
        self.write(REGION_INDEX_KEY, &state.index)?;
        self.write(PNL_TABLE_KEY, &TableBlob::from(&state.table))?;
        self.write(PARTITION_TAGS_KEY, &state.partition_tags)?;
        tracing::info!(alphas = state.table.width(), "Saved cache.");
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T, DbError> {
        let bytes = self.store.get(key)?;
        let envelope: Envelope<serde_json::Value> = serde_json::from_slice(&bytes)?;
        if envelope.version != FORMAT_VERSION {
            return Err(DbError::VersionMismatch {
                key: key.to_string(),
                found: envelope.version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(serde_json::from_value(envelope.payload)?)
    }

    fn write<T: Serialize>(&self, key: &str, payload: &T) -> Result<(), DbError> {
        let bytes = serde_json::to_vec(&Envelope {
            version: FORMAT_VERSION,
            payload,
        })?;
        self.store.put(key, &bytes)
    }
}
