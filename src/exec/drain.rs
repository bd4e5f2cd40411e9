// src/exec/drain.rs

//! Output drains: keep a child's merged stdout/stderr pipe empty.
//!
//! Each launched process gets its own drain thread that copies the pipe to
//! the job's log file, or discards it when capture is off. Drains are plain
//! OS threads rather than runtime blocking tasks so a long simulation never
//! holds up runtime shutdown.

use std::fs::{self, File, OpenOptions};
use std::io::{self, PipeReader};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::config::LogConfig;
use crate::types::JobId;

/// Path of the log file for `job` inside `dir`: `<dir>/<job>.log`.
pub fn log_path(dir: &Path, job: JobId) -> PathBuf {
    dir.join(format!("{job}.log"))
}

/// Open the append-mode log file for a job, creating the directory on demand.
///
/// Returns `None` when capture is disabled or the file cannot be opened; in
/// the latter case output is discarded and the job still runs.
pub fn open_log_sink(logs: &LogConfig, job: JobId) -> Option<File> {
    if !logs.enabled {
        return None;
    }

    let path = log_path(&logs.dir, job);
    debug!(job, path = %path.display(), "logging process output");

    let opened = fs::create_dir_all(&logs.dir).and_then(|()| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    });

    match opened {
        Ok(file) => Some(file),
        Err(e) => {
            warn!(
                job,
                path = %path.display(),
                error = %e,
                "unable to create log file; discarding output"
            );
            None
        }
    }
}

/// Start draining `reader` on a dedicated thread until end of stream.
///
/// The thread yields the number of bytes copied.
pub fn spawn_drain(job: JobId, reader: PipeReader, sink: Option<File>) -> io::Result<JoinHandle<u64>> {
    thread::Builder::new()
        .name(format!("simrun-drain-{job}"))
        .spawn(move || drain(job, reader, sink))
}

fn drain(job: JobId, mut reader: PipeReader, sink: Option<File>) -> u64 {
    let copied = match sink {
        Some(mut file) => io::copy(&mut reader, &mut file),
        None => io::copy(&mut reader, &mut io::sink()),
    };

    match copied {
        Ok(bytes) => {
            debug!(job, bytes, "output drain reached end of stream");
            bytes
        }
        Err(e) => {
            warn!(job, error = %e, "output drain stopped early");
            0
        }
    }
}
