use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time;
use tracing::{debug, warn};

use crate::config::{Config, ConfigError};

use super::args::build_arguments;
use super::error::TranscodeError;
use super::progress::ProgressState;
use super::reporter::{ProgressReporter, feed_lines};

/// Default executable, resolved through `PATH`.
pub const DEFAULT_PROGRAM: &str = "ffmpeg";

pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(2);

/// Progress lines buffered between the stdout reader and the reporter.
const LINE_BUFFER: usize = 64;

/// How long to wait for stdout to reach EOF once ffmpeg has exited.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Callback invoked with the current state on every report tick.
pub type ReportHandler = Arc<dyn Fn(&ProgressState) + Send + Sync>;

/**
    Runs ffmpeg jobs with a fixed profile.

    Each call to [`Transcoder::transcode`] owns its child process, its stdout
    reader task and its progress reporter; none of them outlive the call.
*/
pub struct Transcoder {
    config: Config,
    program: PathBuf,
    report_interval: Duration,
    on_report: ReportHandler,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Transcoder {
    /**
        Create a transcoder for a profile, rejecting out-of-range settings.
    */
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            program: PathBuf::from(DEFAULT_PROGRAM),
            report_interval: DEFAULT_REPORT_INTERVAL,
            on_report: Arc::new(|state: &ProgressState| println!("{state}")),
            shutdown: None,
        })
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    pub fn with_report_handler(
        mut self,
        handler: impl Fn(&ProgressState) + Send + Sync + 'static,
    ) -> Self {
        self.on_report = Arc::new(handler);
        self
    }

    /**
        Kill the running job when `shutdown` flips to `true`.
    */
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Whether the shutdown flag has already been raised.
    pub fn is_interrupted(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|shutdown| *shutdown.borrow())
    }

    /**
        Transcode `input` into `output`, printing progress while ffmpeg runs.

        ffmpeg's stderr is passed straight through to ours. Returns once the
        process has exited and the reporter has stopped.
    */
    pub async fn transcode(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        if self.is_interrupted() {
            return Err(TranscodeError::Interrupted);
        }

        let args = build_arguments(&self.config, input, output);
        debug!(program = %self.program.display(), ?args, "spawning transcoder");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TranscodeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            return Err(TranscodeError::Stdout {
                program: self.program.clone(),
            });
        };
        debug!(pid = child.id(), "transcoder started");

        let (line_tx, line_rx) = mpsc::channel(LINE_BUFFER);
        let mut feeder = tokio::spawn(feed_lines(stdout, line_tx));

        let (stop_tx, stop_rx) = oneshot::channel();
        let on_report = Arc::clone(&self.on_report);
        let reporter = ProgressReporter::new(self.report_interval, move |state: &ProgressState| {
            on_report(state)
        });
        let reporter = tokio::spawn(reporter.run(line_rx, stop_rx));

        let exit = self.wait_for_exit(&mut child).await;

        // Let the last progress block through before stopping the reporter
        let drained = time::timeout(DRAIN_TIMEOUT, &mut feeder).await;
        match drained {
            Ok(Ok(Err(e))) => debug!("stdout reader stopped: {}", e),
            Ok(_) => {}
            Err(_) => {
                debug!("stdout still open after exit, discarding remaining progress");
                feeder.abort();
                let _ = feeder.await;
            }
        }

        let _ = stop_tx.send(());
        let final_state = reporter.await?;
        debug!(%final_state, "progress reporter stopped");

        let status = exit?;
        if !status.success() {
            return Err(TranscodeError::Failed(status));
        }
        if !final_state.is_finished() {
            warn!(
                "ffmpeg exited successfully without reporting completion for {}",
                output.display()
            );
        }

        Ok(())
    }

    async fn wait_for_exit(&self, child: &mut Child) -> Result<ExitStatus, TranscodeError> {
        let Some(mut shutdown) = self.shutdown.clone() else {
            return child.wait().await.map_err(TranscodeError::Wait);
        };

        tokio::select! {
            status = child.wait() => status.map_err(TranscodeError::Wait),
            _ = shutdown_requested(&mut shutdown) => {
                debug!(pid = child.id(), "interrupt received, killing transcoder");
                child.kill().await.map_err(TranscodeError::Wait)?;
                Err(TranscodeError::Interrupted)
            }
        }
    }
}

/// Resolves once the flag is set; never resolves if the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}
