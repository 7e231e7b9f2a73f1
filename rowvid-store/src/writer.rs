//! Batching row writer for the encode path.
//!
//! Buffers rows up to a batch size before bulk-appending, and retries
//! transient store failures with exponential backoff up to a bounded
//! attempt count before giving up.

use std::time::Duration;

use rowvid_protocol::error::StoreError;
use rowvid_protocol::record::RowValues;

use crate::row_store::RowStore;

/// Writer tuning knobs.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Rows buffered before a bulk append is issued.
    pub batch_size: usize,
    /// Total attempts per batch (first try + retries).
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles per subsequent retry.
    pub base_backoff: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            max_attempts: 4,
            base_backoff: Duration::from_millis(200),
        }
    }
}

/// Buffers rows and bulk-appends them to a [`RowStore`].
pub struct RowWriter<'a, S: RowStore> {
    store: &'a S,
    config: WriterConfig,
    buffer: Vec<RowValues>,
    rows_written: u64,
    batches_flushed: u64,
    retries: u64,
}

impl<'a, S: RowStore> RowWriter<'a, S> {
    pub fn new(store: &'a S, config: WriterConfig) -> Self {
        Self {
            store,
            config,
            buffer: Vec::new(),
            rows_written: 0,
            batches_flushed: 0,
            retries: 0,
        }
    }

    /// Total rows successfully appended so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Retries performed across all batches.
    pub fn retries(&self) -> u64 {
        self.retries
    }

    /// Buffer rows, flushing whenever the batch size is reached.
    pub async fn push(&mut self, rows: Vec<RowValues>) -> Result<(), StoreError> {
        self.buffer.extend(rows);
        while self.buffer.len() >= self.config.batch_size {
            let batch: Vec<RowValues> = self.buffer.drain(..self.config.batch_size).collect();
            self.flush_batch(batch).await?;
        }
        Ok(())
    }

    /// Flush any buffered remainder and return the total rows written.
    pub async fn finish(mut self) -> Result<u64, StoreError> {
        if !self.buffer.is_empty() {
            let batch = std::mem::take(&mut self.buffer);
            self.flush_batch(batch).await?;
        }
        tracing::info!(
            rows_written = self.rows_written,
            batches = self.batches_flushed,
            retries = self.retries,
            "row writer finished"
        );
        Ok(self.rows_written)
    }

    async fn flush_batch(&mut self, batch: Vec<RowValues>) -> Result<(), StoreError> {
        let mut backoff = self.config.base_backoff;
        let mut attempt = 1;
        loop {
            match self.store.append(&batch).await {
                Ok(()) => {
                    self.rows_written += batch.len() as u64;
                    self.batches_flushed += 1;
                    tracing::debug!(
                        rows = batch.len(),
                        total = self.rows_written,
                        "batch appended"
                    );
                    return Ok(());
                }
                Err(e) if e.is_transient() && attempt < self.config.max_attempts => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.config.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "transient append failure, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                    self.retries += 1;
                }
                Err(e) => {
                    tracing::error!(attempt, error = %e, "append failed permanently");
                    return Err(e);
                }
            }
        }
    }
}
