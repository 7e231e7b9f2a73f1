//! Error taxonomy shared across the encode and playback paths.

use thiserror::Error;

use crate::record::RowError;

/// Invalid encoder parameters. Fatal to the job, raised before any frame
/// is processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("target width {got} below minimum {min}")]
    TargetWidthTooSmall { got: u32, min: u32 },
    #[error("target height {got} below minimum {min}")]
    TargetHeightTooSmall { got: u32, min: u32 },
    #[error("max duration {got}s below minimum {min}s")]
    MaxDurationTooSmall { got: u32, min: u32 },
    #[error("unrecognized mode: {0:?}")]
    UnknownMode(String),
}

/// Frame source unavailable or undecodable. Aborts the whole encode job;
/// rows already flushed stay in the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("could not open video source: {0}")]
    Unavailable(String),
    #[error("could not decode frame {frame_id}: {reason}")]
    Decode { frame_id: u64, reason: String },
}

/// Store connect/query failure.
///
/// Recoverable on the playback path (playback pauses and reports), retried
/// with backoff on the write path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    ConnectFailed(String),
    #[error("store query failed: {0}")]
    QueryFailed(String),
    #[error("store query timed out")]
    Timeout,
}

impl StoreError {
    /// Whether the write path should retry after backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::QueryFailed(_) | StoreError::Timeout)
    }
}

/// A malformed or out-of-range row encountered during assembly.
///
/// Never fatal: the offending row is skipped and logged, assembly continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("pixel ({x}, {y}) outside {width}x{height} frame")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("bad row: {0}")]
    BadRow(#[from] RowError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(StoreError::Timeout.is_transient());
        assert!(StoreError::QueryFailed("db busy".into()).is_transient());
        assert!(!StoreError::ConnectFailed("bad token".into()).is_transient());
    }
}
