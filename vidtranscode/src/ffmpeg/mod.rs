/*!
    Everything that touches the ffmpeg process.

    * `args`: argument vector and mixdown filter graph for a profile.
    * `progress`: `-progress` protocol parsing into a running `ProgressState`.
    * `reporter`: stdout line feeder and the periodic progress reporter.
    * `transcoder`: spawns ffmpeg for one job and tears everything down after.
*/

pub mod args;
pub mod error;
pub mod progress;
pub mod reporter;
pub mod transcoder;

#[cfg(all(test, unix))]
pub(crate) mod testing;

pub use error::TranscodeError;
pub use transcoder::{DEFAULT_PROGRAM, DEFAULT_REPORT_INTERVAL, Transcoder};
