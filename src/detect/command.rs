use std::{
    io::Read as _,
    path::PathBuf,
    process::{Command, Stdio},
    time::{Duration, Instant},
};

use crate::{
    detect::{DetectRequest, FaceCandidate, FaceDetector},
    foundation::error::{FacelapseError, FacelapseResult},
};

/// Placeholder in [`CommandDetector::args`] replaced by the path of the image to analyse.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Detector backed by an external program.
///
/// The program is handed a PNG of the decoded, EXIF-oriented photo (so its coordinates match the
/// pixels the pipeline warps) and must print a JSON array of [`FaceCandidate`] on stdout:
///
/// ```json
/// [{"bbox":{"x":10,"y":20,"width":100,"height":120},
///   "left_eye":{"x":40,"y":60},"right_eye":{"x":80,"y":61}}]
/// ```
///
/// A non-zero exit status, unparsable output, or exceeding `timeout` is a detection failure; on
/// timeout the child is killed.
#[derive(Clone, Debug)]
pub struct CommandDetector {
    pub program: PathBuf,
    /// Arguments; [`INPUT_PLACEHOLDER`] is substituted, otherwise the image path is appended.
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Free-form version tag folded into the cache fingerprint. Bump it when the model changes.
    pub version: String,
}

impl CommandDetector {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            version: String::new(),
        }
    }

    fn command_args(&self, input: &std::path::Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let mut substituted = false;
        let mut out: Vec<String> = self
            .args
            .iter()
            .map(|a| {
                if a.contains(INPUT_PLACEHOLDER) {
                    substituted = true;
                    a.replace(INPUT_PLACEHOLDER, &input)
                } else {
                    a.clone()
                }
            })
            .collect();
        if !substituted {
            out.push(input.into_owned());
        }
        out
    }
}

impl FaceDetector for CommandDetector {
    fn detect(&self, req: &DetectRequest) -> FacelapseResult<Vec<FaceCandidate>> {
        let tmp_path = temp_png_path();
        let _tmp = TempFileGuard(Some(tmp_path.clone()));
        let rgba = req.frame.as_ref().clone().into_rgba_image()?;
        rgba.save_with_format(&tmp_path, image::ImageFormat::Png)
            .map_err(|e| {
                FacelapseError::detection(format!(
                    "write detector input for '{}': {e}",
                    req.image.file_name
                ))
            })?;

        let mut child = Command::new(&self.program)
            .args(self.command_args(&tmp_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                FacelapseError::detection(format!(
                    "failed to spawn detector '{}': {e}",
                    self.program.display()
                ))
            })?;

        let stdout_drain = child.stdout.take().map(|mut out| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = out.read_to_end(&mut buf);
                buf
            })
        });
        let stderr_drain = child.stderr.take().map(|mut err| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = err.read_to_end(&mut buf);
                buf
            })
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(FacelapseError::detection(format!(
                        "detector timed out after {} ms on '{}'",
                        self.timeout.as_millis(),
                        req.image.file_name
                    )));
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(5)),
                Err(e) => {
                    let _ = child.kill();
                    return Err(FacelapseError::detection(format!(
                        "failed to wait for detector: {e}"
                    )));
                }
            }
        };

        let stdout = stdout_drain
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        let stderr = stderr_drain
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(FacelapseError::detection(format!(
                "detector exited with status {status} on '{}': {}",
                req.image.file_name,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        serde_json::from_slice::<Vec<FaceCandidate>>(&stdout).map_err(|e| {
            FacelapseError::detection(format!(
                "detector output for '{}' is not a face list: {e}",
                req.image.file_name
            ))
        })
    }

    fn fingerprint_source(&self) -> String {
        format!(
            "command:{}|{}|{}",
            self.program.display(),
            self.args.join("\u{1f}"),
            self.version
        )
    }
}

fn temp_png_path() -> PathBuf {
    static SEQ: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);
    let seq = SEQ.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "facelapse_detect_{}_{}_{seq}.png",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ))
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/detect/command.rs"]
mod tests;
