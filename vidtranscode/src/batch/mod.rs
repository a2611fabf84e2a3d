/*!
    Bulk mode: transcode every video in a directory, one job at a time.
*/

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::ffmpeg::{TranscodeError, Transcoder};

pub mod discovery;

/**
    Errors that abort a bulk run.
*/
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to list {}: {source}", .dir.display())]
    Discovery {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to create output directory {}: {source}", .dir.display())]
    OutputDir {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("input and output directory are the same ({}), outputs would overwrite inputs", .0.display())]
    SameDirectory(PathBuf),

    #[error("failed to transcode {}: {source}", .input.display())]
    Job {
        input: PathBuf,
        source: TranscodeError,
    },
}

/// One input file and the path its transcode is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

/**
    Plan one job per video in `input_dir`, writing to the same file name in
    `output_dir`.

    The output directory is created if needed. Planning fails before any job
    is returned when the listing fails or both directories are the same.
*/
pub fn plan_jobs(input_dir: &Path, output_dir: &Path) -> Result<Vec<Job>, BatchError> {
    let names = discovery::find_inputs(input_dir).map_err(|source| BatchError::Discovery {
        dir: input_dir.to_path_buf(),
        source,
    })?;

    std::fs::create_dir_all(output_dir).map_err(|source| BatchError::OutputDir {
        dir: output_dir.to_path_buf(),
        source,
    })?;

    if is_same_dir(input_dir, output_dir) {
        return Err(BatchError::SameDirectory(output_dir.to_path_buf()));
    }

    Ok(names
        .into_iter()
        .map(|name| Job {
            input: input_dir.join(&name),
            output: output_dir.join(&name),
        })
        .collect())
}

fn is_same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/**
    Run `jobs` in order, stopping at the first failure.

    Each job's process and reporter are gone before the next job starts.
*/
pub async fn run_jobs(transcoder: &Transcoder, jobs: &[Job]) -> Result<(), BatchError> {
    let total = jobs.len();
    for (index, job) in jobs.iter().enumerate() {
        if transcoder.is_interrupted() {
            return Err(BatchError::Job {
                input: job.input.clone(),
                source: TranscodeError::Interrupted,
            });
        }

        println!(
            "[{}/{}] Transcoding {} to {}",
            index + 1,
            total,
            job.input.display(),
            job.output.display()
        );

        transcoder
            .transcode(&job.input, &job.output)
            .await
            .map_err(|source| BatchError::Job {
                input: job.input.clone(),
                source,
            })?;
    }

    debug!(jobs = total, "bulk run finished");
    Ok(())
}
