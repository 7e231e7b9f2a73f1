//! Encode job: frame source through the encoder into the store.
//!
//! Frames are read one at a time, encoded into pixel rows, and pushed
//! through the batching [`RowWriter`]. The job truncates at the configured
//! duration cap rather than failing, and reports progress as it goes.

use anyhow::Context;

use rowvid_codec::Encoder;
use rowvid_protocol::config::EncoderConfig;
use rowvid_protocol::types::VideoId;
use rowvid_store::{RowStore, RowWriter, WriterConfig};

use crate::source::FrameSource;

/// Outcome of a completed encode job.
#[derive(Debug)]
pub struct IngestReport {
    pub video_id: VideoId,
    pub frames_encoded: u64,
    pub rows_written: u64,
}

/// Run one encode job to completion.
///
/// A source or store error aborts the job; rows already flushed stay in the
/// store.
pub async fn run_encode_job<S: RowStore, F: FrameSource>(
    store: &S,
    source: &mut F,
    config: EncoderConfig,
    writer_config: WriterConfig,
) -> anyhow::Result<IngestReport> {
    let encoder = Encoder::new(config).context("invalid encoder configuration")?;
    let fps = source.fps();
    anyhow::ensure!(fps > 0.0, "source fps must be positive, got {fps}");
    let max_duration_secs = encoder.config().max_duration_secs as f64;

    let mut writer = RowWriter::new(store, writer_config);
    let mut frames_encoded = 0u64;

    loop {
        let Some(frame) = source.next_frame().context("reading frame source")? else {
            break;
        };
        let timestamp_secs = frames_encoded as f64 / fps;
        if timestamp_secs > max_duration_secs {
            tracing::info!(
                frames_encoded,
                max_duration_secs,
                "duration cap reached, truncating"
            );
            break;
        }

        let rows: Vec<_> = encoder
            .encode(&frame, timestamp_secs)
            .iter()
            .map(|record| record.to_row())
            .collect();
        writer
            .push(rows)
            .await
            .with_context(|| format!("appending rows for frame {}", frame.frame_id))?;

        frames_encoded += 1;
        if frames_encoded % 10 == 0 {
            tracing::info!(
                frames_encoded,
                rows_written = writer.rows_written(),
                "encode progress"
            );
        }
    }

    let rows_written = writer.finish().await.context("flushing remaining rows")?;
    let report = IngestReport {
        video_id: encoder.video_id().clone(),
        frames_encoded,
        rows_written,
    };
    tracing::info!(
        video_id = %report.video_id,
        frames_encoded = report.frames_encoded,
        rows_written = report.rows_written,
        "encode job complete"
    );
    Ok(report)
}
