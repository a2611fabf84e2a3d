use std::ffi::OsString;
use std::path::Path;

use crate::config::{Config, MixdownConfig};

/// Output label of the merged audio stream in the filter graph.
const MIXED_AUDIO_LABEL: &str = "[a]";

/**
    Build the full ffmpeg argument vector for one job.

    The layout is fixed: input, container flags, H.264 video, AAC stereo audio,
    the optional mic mixdown graph with explicit stream mapping, then output
    flags and progress reporting on stdout. Without mixdown ffmpeg's default
    stream selection applies.
*/
pub fn build_arguments(config: &Config, input: &Path, output: &Path) -> Vec<OsString> {
    let video = &config.video;
    let audio = &config.audio;

    let mut args: Vec<OsString> = vec!["-i".into(), input.into()];

    // Faststart for quicker upload
    args.extend(["-movflags", "+faststart"].map(OsString::from));

    args.extend(
        [
            "-c:v".to_string(),
            "libx264".to_string(),
            "-vf".to_string(),
            format!("scale={}:{}", video.res_x, video.res_y),
            "-crf".to_string(),
            video.crf.to_string(),
            "-preset".to_string(),
            "slow".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]
        .map(OsString::from),
    );

    args.extend(
        [
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            audio.bitrate.clone(),
            "-ac".to_string(),
            "2".to_string(),
        ]
        .map(OsString::from),
    );

    if audio.channel_mixdown.enabled {
        args.extend(
            [
                "-filter_complex".to_string(),
                build_filter_graph(&audio.channel_mixdown),
                "-map".to_string(),
                "0:v:0".to_string(),
                "-map".to_string(),
                MIXED_AUDIO_LABEL.to_string(),
            ]
            .map(OsString::from),
        );
    }

    args.extend(["-y", "-loglevel", "error", "-progress", "pipe:1"].map(OsString::from));
    args.push(output.into());

    args
}

/**
    Build the filter graph that merges the mic track (`0:a:1`) into the
    primary track (`0:a:0`).

    The mic is optionally denoised with `afftdn`, attenuated with `volume`,
    then merged with `amerge` into the single output label `[a]`.
*/
pub fn build_filter_graph(mixdown: &MixdownConfig) -> String {
    let nr = &mixdown.noise_reduction;
    let denoise = if nr.enabled {
        format!(
            "afftdn=nr={}:nf={}:tn=1[n];[n]",
            nr.reduction_db, nr.noise_floor_db
        )
    } else {
        String::new()
    };

    format!(
        "[0:a:1]{denoise}volume={:.2}[l];[0:a:0][l]amerge=inputs=2{MIXED_AUDIO_LABEL}",
        mixdown.mic_volume
    )
}
