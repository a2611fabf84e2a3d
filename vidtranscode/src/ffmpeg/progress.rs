use std::fmt;

/// Value of the `progress` key once ffmpeg has finished writing the output.
pub const STATUS_END: &str = "end";

/**
    Running state of one job, built from ffmpeg's `-progress` output.

    Values are kept exactly as ffmpeg prints them; they are only ever
    displayed, never computed with.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    pub frame: String,
    pub out_time: String,
    pub fps: String,
    pub status: String,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            frame: "0".to_string(),
            out_time: "00:00:00.000000".to_string(),
            fps: "0".to_string(),
            status: String::new(),
        }
    }
}

impl ProgressState {
    /**
        Apply one `key=value` line of the progress protocol.

        Lines without `=` and keys that are not tracked are ignored; ffmpeg
        emits many more keys (bitrate, speed, dup_frames, ...) than we display.
    */
    pub fn apply_line(&mut self, line: &str) {
        let Some((key, value)) = line.split_once('=') else {
            return;
        };

        let field = match key.trim() {
            "frame" => &mut self.frame,
            "out_time" => &mut self.out_time,
            "fps" => &mut self.fps,
            "progress" => &mut self.status,
            _ => return,
        };
        *field = value.trim().to_string();
    }

    pub fn is_finished(&self) -> bool {
        self.status == STATUS_END
    }
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame: {}, time: {}, fps: {}, status: {}",
            self.frame, self.out_time, self.fps, self.status
        )
    }
}
