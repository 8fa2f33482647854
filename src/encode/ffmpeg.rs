use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    foundation::error::{FacelapseError, FacelapseResult},
    render::encode::OutputFormat,
};

/// Video assembly settings. The frames directory and output path come from the paths config.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    pub enabled: bool,
    /// Explicit ffmpeg executable; `ffmpeg` on `PATH` when unset.
    pub ffmpeg_path: Option<PathBuf>,
    /// Photos shown per second.
    pub fps: u32,
    pub codec: String,
    pub crf: u32,
    /// Joined with `,` into one `-vf` argument.
    pub video_filters: Vec<String>,
    /// Inserted after the input options, before the codec.
    pub extra_input_args: Vec<String>,
    /// Inserted just before the output path.
    pub extra_output_args: Vec<String>,
    pub overwrite: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ffmpeg_path: None,
            fps: 48,
            codec: "libx264".to_string(),
            crf: 23,
            video_filters: vec![
                "tpad=start_mode=clone:start_duration=1".to_string(),
                "tpad=stop_mode=clone:stop_duration=3".to_string(),
                "minterpolate=fps=60:mi_mode=blend".to_string(),
            ],
            extra_input_args: Vec::new(),
            extra_output_args: vec!["-pix_fmt".to_string(), "yuv420p".to_string()],
            overwrite: true,
        }
    }
}

impl VideoConfig {
    pub fn validate(&self) -> FacelapseResult<()> {
        if self.fps == 0 {
            return Err(FacelapseError::validation("video.fps must be non-zero"));
        }
        if self.codec.trim().is_empty() {
            return Err(FacelapseError::validation("video.codec must not be empty"));
        }
        if self.crf > 63 {
            return Err(FacelapseError::validation("video.crf must be in 0..=63"));
        }
        Ok(())
    }

    pub fn program(&self) -> PathBuf {
        self.ffmpeg_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("ffmpeg"))
    }
}

pub fn is_ffmpeg_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> FacelapseResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Arguments (without the program) that turn `<frames_dir>/1.<ext>, 2.<ext>, …` into `out_path`.
pub fn build_args(
    cfg: &VideoConfig,
    frames_dir: &Path,
    format: OutputFormat,
    out_path: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    let mut push = |s: &str| args.push(OsString::from(s));
    push("-hide_banner");
    push("-loglevel");
    push("error");
    push(if cfg.overwrite { "-y" } else { "-n" });
    push("-f");
    push("image2");
    push("-start_number");
    push("1");
    push("-framerate");
    push(&cfg.fps.to_string());
    push("-i");
    args.push(
        frames_dir
            .join(format!("%d.{}", format.extension()))
            .into_os_string(),
    );
    args.extend(cfg.extra_input_args.iter().map(OsString::from));
    args.extend(["-vcodec", cfg.codec.as_str()].map(OsString::from));
    args.extend(["-crf".to_string(), cfg.crf.to_string()].map(OsString::from));
    if !cfg.video_filters.is_empty() {
        args.push(OsString::from("-vf"));
        args.push(OsString::from(cfg.video_filters.join(",")));
    }
    args.extend(cfg.extra_output_args.iter().map(OsString::from));
    args.push(out_path.as_os_str().to_os_string());
    args
}

/// Run ffmpeg over the numbered frames in `frames_dir`, blocking until it exits.
#[tracing::instrument(skip(cfg), fields(frames = %frames_dir.display(), out = %out_path.display()))]
pub fn encode_frames_dir(
    cfg: &VideoConfig,
    frames_dir: &Path,
    format: OutputFormat,
    out_path: &Path,
) -> FacelapseResult<()> {
    cfg.validate()?;
    ensure_parent_dir(out_path)?;

    if !cfg.overwrite && out_path.exists() {
        return Err(FacelapseError::validation(format!(
            "output file '{}' already exists",
            out_path.display()
        )));
    }

    let program = cfg.program();
    let args = build_args(cfg, frames_dir, format, out_path);
    tracing::info!(program = %program.display(), "encoding video");

    let output = Command::new(&program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            FacelapseError::encode(format!(
                "failed to spawn ffmpeg '{}' (is it installed and on PATH?): {e}",
                program.display()
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FacelapseError::encode(format!(
            "ffmpeg exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
