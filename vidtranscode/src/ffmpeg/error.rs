use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/**
    Errors from running a single transcode job.
*/
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("could not capture standard output of {}", .program.display())]
    Stdout { program: PathBuf },

    #[error("failed waiting for ffmpeg to exit: {0}")]
    Wait(#[source] std::io::Error),

    #[error("ffmpeg exited with {0}")]
    Failed(ExitStatus),

    #[error("transcode interrupted")]
    Interrupted,

    #[error("progress reporter failed: {0}")]
    Reporter(#[from] tokio::task::JoinError),
}
