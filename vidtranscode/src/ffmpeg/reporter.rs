use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};

use super::progress::ProgressState;

const MIN_INTERVAL: Duration = Duration::from_millis(10);
const MAX_INTERVAL: Duration = Duration::from_secs(3600);

/**
    Consumes progress lines for one job and periodically reports the state.

    The reporter is the only owner of the job's [`ProgressState`]. Applying a
    line and emitting a report both happen on the reporter's own task, one
    event at a time, so a report never observes a half-applied update.
*/
pub struct ProgressReporter<F> {
    interval: Duration,
    on_report: F,
}

impl<F> ProgressReporter<F>
where
    F: FnMut(&ProgressState),
{
    pub fn new(interval: Duration, on_report: F) -> Self {
        Self {
            interval: interval.clamp(MIN_INTERVAL, MAX_INTERVAL),
            on_report,
        }
    }

    /**
        Run until `shutdown` fires (or its sender is dropped).

        Reports are emitted every `interval`, the first one a full interval
        after start. When the line stream ends early the reporter keeps
        reporting the last state until shutdown. On shutdown, lines already
        queued in the channel are applied, the channel is closed, and the
        final state is returned.
    */
    pub async fn run(
        mut self,
        mut lines: mpsc::Receiver<String>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> ProgressState {
        let mut state = ProgressState::default();
        let mut lines_open = true;

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                line = lines.recv(), if lines_open => match line {
                    Some(line) => state.apply_line(&line),
                    None => lines_open = false,
                },
                _ = ticker.tick() => (self.on_report)(&state),
                _ = &mut shutdown => break,
            }
        }

        drop(ticker);
        lines.close();
        while let Ok(line) = lines.try_recv() {
            state.apply_line(&line);
        }

        state
    }
}

/**
    Read `reader` line by line and publish each line onto `lines`.

    Invalid UTF-8 is replaced rather than treated as an error so the pipe
    keeps being drained. Returns when the reader hits EOF or the receiving
    side has been closed.
*/
pub async fn feed_lines<R>(reader: R, lines: mpsc::Sender<String>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']).to_string();
        if lines.send(line).await.is_err() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    const INTERVAL: Duration = Duration::from_secs(1);

    fn collecting_reporter(
        reports: Arc<Mutex<Vec<String>>>,
    ) -> ProgressReporter<impl FnMut(&ProgressState) + Send + 'static> {
        ProgressReporter::new(INTERVAL, move |state: &ProgressState| {
            reports.lock().unwrap().push(state.to_string());
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_reflects_applied_lines() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let (line_tx, line_rx) = mpsc::channel(16);
        let (stop_tx, stop_rx) = oneshot::channel();

        for line in [
            "frame=1",
            "out_time=00:00:01.000000",
            "fps=30",
            "progress=continue",
        ] {
            line_tx.send(line.to_string()).await.unwrap();
        }

        let handle =
            tokio::spawn(collecting_reporter(Arc::clone(&reports)).run(line_rx, stop_rx));
        time::sleep(INTERVAL + Duration::from_millis(10)).await;
        stop_tx.send(()).unwrap();
        handle.await.unwrap();

        let reports = reports.lock().unwrap();
        assert_eq!(
            *reports,
            vec!["frame: 1, time: 00:00:01.000000, fps: 30, status: continue"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_report_before_first_interval() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let (_line_tx, line_rx) = mpsc::channel::<String>(16);
        let (stop_tx, stop_rx) = oneshot::channel();

        let handle =
            tokio::spawn(collecting_reporter(Arc::clone(&reports)).run(line_rx, stop_rx));
        time::sleep(INTERVAL / 2).await;
        stop_tx.send(()).unwrap();
        handle.await.unwrap();

        assert!(reports.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keeps_reporting_after_stream_ends() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let (line_tx, line_rx) = mpsc::channel(16);
        let (stop_tx, stop_rx) = oneshot::channel();

        line_tx.send("frame=42".to_string()).await.unwrap();
        drop(line_tx);

        let handle =
            tokio::spawn(collecting_reporter(Arc::clone(&reports)).run(line_rx, stop_rx));
        time::sleep(INTERVAL * 3 + Duration::from_millis(10)).await;
        stop_tx.send(()).unwrap();
        let state = handle.await.unwrap();

        assert_eq!(state.frame, "42");
        let reports = reports.lock().unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.starts_with("frame: 42,")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_shutdown_sender_stops_reporter() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let (_line_tx, line_rx) = mpsc::channel::<String>(16);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let handle =
            tokio::spawn(collecting_reporter(Arc::clone(&reports)).run(line_rx, stop_rx));
        drop(stop_tx);

        let state = time::timeout(INTERVAL * 10, handle)
            .await
            .expect("reporter did not stop")
            .unwrap();
        assert_eq!(state, ProgressState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_applies_queued_lines_and_closes_stream() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let (line_tx, line_rx) = mpsc::channel(16);
        let (stop_tx, stop_rx) = oneshot::channel();

        line_tx.send("frame=900".to_string()).await.unwrap();
        line_tx.send("progress=end".to_string()).await.unwrap();
        stop_tx.send(()).unwrap();

        let state = collecting_reporter(Arc::clone(&reports)).run(line_rx, stop_rx).await;

        assert_eq!(state.frame, "900");
        assert!(state.is_finished());
        assert!(line_tx.is_closed());
        assert!(line_tx.send("frame=901".to_string()).await.is_err());
        assert!(reports.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_interval_is_clamped() {
        let (_line_tx, line_rx) = mpsc::channel::<String>(16);
        let (stop_tx, stop_rx) = oneshot::channel();

        let reporter =
            ProgressReporter::new(Duration::from_secs(u64::MAX), |_: &ProgressState| {});
        assert_eq!(reporter.interval, MAX_INTERVAL);
        assert_eq!(
            ProgressReporter::new(Duration::ZERO, |_: &ProgressState| {}).interval,
            MIN_INTERVAL
        );

        let handle = tokio::spawn(reporter.run(line_rx, stop_rx));
        stop_tx.send(()).unwrap();
        assert_eq!(handle.await.unwrap(), ProgressState::default());
    }

    #[tokio::test]
    async fn test_feed_lines_preserves_order() {
        let input: &[u8] = b"frame=1\nfps=25\nprogress=continue\n";
        let (line_tx, mut line_rx) = mpsc::channel(16);

        feed_lines(input, line_tx).await.unwrap();

        let mut received = Vec::new();
        while let Some(line) = line_rx.recv().await {
            received.push(line);
        }
        assert_eq!(received, ["frame=1", "fps=25", "progress=continue"]);
    }

    #[tokio::test]
    async fn test_feed_lines_tolerates_invalid_utf8() {
        let input: &[u8] = b"frame=\xff7\r\nprogress=end";
        let (line_tx, mut line_rx) = mpsc::channel(16);

        feed_lines(input, line_tx).await.unwrap();

        assert_eq!(line_rx.recv().await.unwrap(), "frame=\u{fffd}7");
        assert_eq!(line_rx.recv().await.unwrap(), "progress=end");
        assert!(line_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_feed_lines_stops_when_receiver_closed() {
        let input: &[u8] = b"frame=1\nframe=2\n";
        let (line_tx, mut line_rx) = mpsc::channel(16);
        line_rx.close();

        feed_lines(input, line_tx).await.unwrap();
        assert!(line_rx.recv().await.is_none());
    }
}
