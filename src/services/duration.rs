//! Video duration probing.
//!
//! Only container metadata is read; nothing is decoded or transcoded.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::error::DurationDecodeError;
use crate::models::MediaFile;

/// Reports the duration of a video in seconds.
#[async_trait]
pub trait DurationProbe: Send + Sync {
    async fn probe_seconds(&self, file: &MediaFile) -> Result<f64, DurationDecodeError>;
}

/// Whole minutes, rounded half away from zero, never below one for a
/// positive duration.
pub fn to_minutes(seconds: f64) -> Result<i64, DurationDecodeError> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(DurationDecodeError::InvalidDuration(seconds.to_string()));
    }
    Ok(((seconds / 60.0).round() as i64).max(1))
}

/// Probes and converts to the stored minute value.
pub async fn probe_minutes(
    probe: &dyn DurationProbe,
    file: &MediaFile,
) -> Result<i64, DurationDecodeError> {
    let seconds = probe.probe_seconds(file).await?;
    to_minutes(seconds)
}

// ============ ffprobe ============

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Extracts `format.duration` from `ffprobe -print_format json -show_format`.
pub fn parse_ffprobe_duration(stdout: &str) -> Result<f64, DurationDecodeError> {
    let output: FfprobeOutput = serde_json::from_str(stdout)
        .map_err(|e| DurationDecodeError::Parse(format!("{e}: {stdout}")))?;

    let raw = output
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| DurationDecodeError::InvalidDuration("missing".to_string()))?;

    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| DurationDecodeError::Parse(format!("duration '{raw}'")))?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(DurationDecodeError::InvalidDuration(raw));
    }
    Ok(seconds)
}

/// ffprobe 默认超时
pub const DEFAULT_FFPROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// ffprobe 探测器
#[derive(Debug, Clone)]
pub struct FfprobeDurationProbe {
    binary: PathBuf,
    timeout: Duration,
}

impl FfprobeDurationProbe {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_FFPROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for FfprobeDurationProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn probe_seconds(&self, file: &MediaFile) -> Result<f64, DurationDecodeError> {
        let suffix = file
            .extension()
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        // 临时文件随 `temp` 释放而删除
        let temp = tempfile::Builder::new()
            .prefix("probe_")
            .suffix(&suffix)
            .tempfile()?;
        tokio::fs::write(temp.path(), &file.bytes).await?;

        let mut command = tokio::process::Command::new(&self.binary);
        command
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(temp.path())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(result) => result.map_err(DurationDecodeError::ProbeUnavailable)?,
            Err(_) => {
                tracing::warn!("ffprobe timed out after {:?} on {}", self.timeout, file.file_name);
                return Err(DurationDecodeError::ProbeFailed {
                    exit_code: None,
                    stderr: format!("timed out after {:?}", self.timeout),
                });
            }
        };

        if !output.status.success() {
            return Err(DurationDecodeError::ProbeFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let seconds = parse_ffprobe_duration(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!("Probed {} -> {:.2}s", file.file_name, seconds);
        Ok(seconds)
    }
}
