//! Offline replay of recorded detection logs.
//!
//! A recorded session is a directory of append-only CSV files named
//! `1.csv`, `2.csv`, … with one detection per row:
//! `frame_index, x, y, z, doppler, intensity, posix_ms`. Rows sharing a
//! `frame_index` belong to the same frame, and frame indices are monotone
//! across files.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;
use thiserror::Error;

use crate::integration::source::{FrameSource, SourceRead};
use crate::tracker::RawFrame;

/// Default read-ahead, in whole frames.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 40;

/// Errors surfaced by the offline replay source.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Default)]
struct BufferedFrame {
    frame: RawFrame,
    posix_ms: u64,
}

/// Replays a recorded session of numbered CSV detection logs.
///
/// Frames are read ahead in batches of up to the configured buffer size and
/// served in index order; indices absent from the logs come back as
/// [`SourceRead::Skip`], and the source reports exhaustion once the last
/// file is drained.
#[derive(Debug)]
pub struct OfflineReplay {
    dir: PathBuf,
    read_buffer_size: usize,
    frame_count: u64,
    row_pointer: usize,
    file_pointer: u32,
    frames: BTreeMap<u64, BufferedFrame>,
    last_frame: Option<u64>,
}

impl OfflineReplay {
    /// Open a session directory with the default read-ahead.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, ReplayError> {
        Self::with_read_buffer(dir, DEFAULT_READ_BUFFER_SIZE)
    }

    /// Open a session directory reading ahead up to `read_buffer_size`
    /// frames at a time.
    pub fn with_read_buffer(
        dir: impl AsRef<Path>,
        read_buffer_size: usize,
    ) -> Result<Self, ReplayError> {
        let mut replay = Self {
            dir: dir.as_ref().to_path_buf(),
            read_buffer_size: read_buffer_size.max(1),
            frame_count: 0,
            row_pointer: 0,
            file_pointer: 1,
            frames: BTreeMap::new(),
            last_frame: None,
        };
        replay.read_next_frames()?;
        Ok(replay)
    }

    /// Number of reads served so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Whether the session has no frames left to serve.
    pub fn is_finished(&self) -> bool {
        self.last_frame.is_none()
    }

    /// Refill the read-ahead buffer from the numbered files, continuing at
    /// the remembered row of the current file.
    fn read_next_frames(&mut self) -> Result<(), ReplayError> {
        self.frames.clear();
        self.last_frame = None;

        'files: while self.frames.len() < self.read_buffer_size {
            let path = self.dir.join(format!("{}.csv", self.file_pointer));
            if !path.exists() {
                // Source exhaustion: no further file in the session.
                break;
            }

            let file = File::open(&path).map_err(|source| ReplayError::Open {
                path: path.clone(),
                source,
            })?;
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(file);

            for (index, record) in reader.records().enumerate() {
                if index < self.row_pointer {
                    continue;
                }
                let record = record.map_err(|source| ReplayError::Read {
                    path: path.clone(),
                    source,
                })?;
                let Some(row) = parse_row(&record) else {
                    warn!("{}: dropping malformed row {}", path.display(), index + 1);
                    continue;
                };

                // Only whole frames enter the buffer: stop in front of a
                // row that would start one past the read-ahead cap.
                if !self.frames.contains_key(&row.frame_index)
                    && self.frames.len() >= self.read_buffer_size
                {
                    self.row_pointer = index;
                    break 'files;
                }

                let entry = self.frames.entry(row.frame_index).or_insert_with(|| {
                    BufferedFrame {
                        posix_ms: row.posix_ms,
                        ..BufferedFrame::default()
                    }
                });
                entry.frame.x.push(row.x);
                entry.frame.y.push(row.y);
                entry.frame.z.push(row.z);
                entry.frame.doppler.push(row.doppler);
                entry.frame.intensity.push(row.intensity);

                self.last_frame = Some(self.last_frame.unwrap_or(0).max(row.frame_index));
            }

            self.row_pointer = 0;
            self.file_pointer += 1;
        }

        Ok(())
    }
}

impl FrameSource for OfflineReplay {
    type Error = ReplayError;

    fn read(&mut self) -> Result<SourceRead, ReplayError> {
        self.frame_count += 1;

        match self.last_frame {
            None => return Ok(SourceRead::Exhausted),
            Some(last) if self.frame_count > last => {
                self.read_next_frames()?;
                if self.last_frame.is_none() {
                    return Ok(SourceRead::Exhausted);
                }
            }
            Some(_) => {}
        }

        match self.frames.remove(&self.frame_count) {
            Some(buffered) => Ok(SourceRead::Frame {
                index: self.frame_count,
                timestamp: Some(buffered.posix_ms as f64 / 1000.0),
                frame: buffered.frame,
            }),
            None => Ok(SourceRead::Skip {
                index: self.frame_count,
            }),
        }
    }
}

struct LogRow {
    frame_index: u64,
    x: f64,
    y: f64,
    z: f64,
    doppler: f64,
    intensity: f64,
    posix_ms: u64,
}

fn parse_row(record: &csv::StringRecord) -> Option<LogRow> {
    let mut fields = record.iter().map(str::trim);
    let frame_index = fields.next()?.parse().ok()?;
    let x: f64 = fields.next()?.parse().ok()?;
    let y: f64 = fields.next()?.parse().ok()?;
    let z: f64 = fields.next()?.parse().ok()?;
    let doppler: f64 = fields.next()?.parse().ok()?;
    let intensity: f64 = fields.next()?.parse().ok()?;
    let posix_ms = fields.next()?.parse().ok()?;

    if [x, y, z, doppler, intensity].iter().any(|v| !v.is_finite()) {
        return None;
    }

    Some(LogRow {
        frame_index,
        x,
        y,
        z,
        doppler,
        intensity,
        posix_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn session(name: &str, files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pointtrack_replay_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for (i, content) in files.iter().enumerate() {
            fs::write(dir.join(format!("{}.csv", i + 1)), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_frames_are_grouped_and_ordered() {
        let dir = session(
            "grouped",
            &["1,0.1,1.0,1.0,0.5,20,1000\n1,0.2,1.1,1.0,0.5,21,1000\n2,0.3,1.2,1.0,0.4,22,1100\n"],
        );
        let mut replay = OfflineReplay::new(&dir).unwrap();

        match replay.read().unwrap() {
            SourceRead::Frame {
                index,
                timestamp,
                frame,
            } => {
                assert_eq!(index, 1);
                assert_eq!(timestamp, Some(1.0));
                assert_eq!(frame.len(), 2);
            }
            other => panic!("expected frame, got {other:?}"),
        }

        match replay.read().unwrap() {
            SourceRead::Frame { index, frame, .. } => {
                assert_eq!(index, 2);
                assert_eq!(frame.len(), 1);
            }
            other => panic!("expected frame, got {other:?}"),
        }

        assert!(matches!(replay.read().unwrap(), SourceRead::Exhausted));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_frame_indices_are_skipped() {
        let dir = session(
            "skips",
            &["1,0.1,1.0,1.0,0.5,20,1000\n3,0.2,1.1,1.0,0.5,21,1200\n"],
        );
        let mut replay = OfflineReplay::new(&dir).unwrap();

        assert!(matches!(
            replay.read().unwrap(),
            SourceRead::Frame { index: 1, .. }
        ));
        assert!(matches!(replay.read().unwrap(), SourceRead::Skip { index: 2 }));
        assert!(matches!(
            replay.read().unwrap(),
            SourceRead::Frame { index: 3, .. }
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_files_consumed_in_numeric_order() {
        let dir = session(
            "files",
            &[
                "1,0.1,1.0,1.0,0.5,20,1000\n",
                "2,0.2,1.1,1.0,0.5,21,1100\n",
            ],
        );
        let mut replay = OfflineReplay::with_read_buffer(&dir, 1).unwrap();

        assert!(matches!(
            replay.read().unwrap(),
            SourceRead::Frame { index: 1, .. }
        ));
        assert!(matches!(
            replay.read().unwrap(),
            SourceRead::Frame { index: 2, .. }
        ));
        assert!(matches!(replay.read().unwrap(), SourceRead::Exhausted));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_rows_are_dropped() {
        let dir = session(
            "malformed",
            &["1,0.1,1.0,1.0,0.5,20,1000\n1,not-a-number,1.0\n1,0.2,NaN,1.0,0.5,21,1000\n"],
        );
        let mut replay = OfflineReplay::new(&dir).unwrap();

        match replay.read().unwrap() {
            SourceRead::Frame { frame, .. } => assert_eq!(frame.len(), 1),
            other => panic!("expected frame, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_session_is_exhausted_immediately() {
        let dir = session("empty", &[]);
        let mut replay = OfflineReplay::new(&dir).unwrap();
        assert!(replay.is_finished());
        assert!(matches!(replay.read().unwrap(), SourceRead::Exhausted));
        let _ = fs::remove_dir_all(&dir);
    }
}
