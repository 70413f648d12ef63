//! ffmpeg-backed clip extractor

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::Instant;

use visionproxy_core::constants::{CLIP_FPS, MAX_CLIP_HEIGHT};
use visionproxy_core::models::VideoRef;
use visionproxy_core::{ClipConfig, ExtractionError};

use super::{ClipArtifact, ClipRange, ClipSource};

const FFMPEG: &str = "ffmpeg";
const YTDLP: &str = "yt-dlp";
const STDERR_TAIL_CHARS: usize = 2000;

/// Cuts clips with ffmpeg, optionally resolving watch URLs through yt-dlp.
pub struct FfmpegClipExtractor {
    config: ClipConfig,
}

impl FfmpegClipExtractor {
    pub fn new(config: ClipConfig) -> Result<Self> {
        validate_tool_path("ffmpeg_path", &config.ffmpeg_path)?;
        if let Some(ytdlp) = &config.ytdlp_path {
            validate_tool_path("ytdlp_path", ytdlp)?;
        }
        Ok(Self { config })
    }

    /// Wall-clock budget for extracting a clip of `duration_ms`, covering
    /// locator resolution and the ffmpeg run together.
    pub fn timeout_for(&self, duration_ms: i64) -> Duration {
        let clip_secs = duration_ms.max(0) as f64 / 1000.0;
        let scaled = (clip_secs * self.config.timeout_factor).ceil() as u64;
        Duration::from_secs(scaled.max(self.config.timeout_floor_secs))
    }

    fn ffmpeg_args(&self, source: &str, range: ClipRange, output: &Path) -> Vec<String> {
        let filter = format!(
            "scale=-2:'min({},ih)',fps={}",
            MAX_CLIP_HEIGHT, CLIP_FPS
        );

        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-ss".to_string(),
            format_seconds(range.start_time_ms),
            "-i".to_string(),
            source.to_string(),
            "-t".to_string(),
            format_seconds(range.duration_ms()),
            "-an".to_string(),
            "-vf".to_string(),
            filter,
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Input locator for ffmpeg: the watch URL itself, or the direct media URL
    /// yt-dlp resolves it to.
    async fn resolve_source(
        &self,
        video: &VideoRef,
        deadline: Deadline,
    ) -> Result<String, ExtractionError> {
        let watch_url = video.source_url();
        let Some(ytdlp) = &self.config.ytdlp_path else {
            return Ok(watch_url);
        };

        let format = format!(
            "bv*[height<={h}]/b[height<={h}]/bv*/b",
            h = MAX_CLIP_HEIGHT
        );
        let args = vec![
            "-g".to_string(),
            "-f".to_string(),
            format,
            "--no-playlist".to_string(),
            watch_url,
        ];
        let output = run_tool(YTDLP, ytdlp, &args, deadline).await?;

        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(String::from)
            .ok_or_else(|| ExtractionError::ToolFailure {
                tool: YTDLP,
                status: output.status.to_string(),
                stderr: "no media URL in output".to_string(),
            })
    }
}

#[async_trait]
impl ClipSource for FfmpegClipExtractor {
    #[tracing::instrument(skip(self, video), fields(video_ref = %video, blocker_id = range.blocker_id))]
    async fn extract(
        &self,
        video: &VideoRef,
        range: ClipRange,
    ) -> Result<ClipArtifact, ExtractionError> {
        let deadline = Deadline::after(self.timeout_for(range.duration_ms()));
        let artifact = ClipArtifact::allocate(&self.config.scratch_dir, range.blocker_id)?;

        let source = self.resolve_source(video, deadline).await?;
        let args = self.ffmpeg_args(&source, range, artifact.path());
        run_tool(FFMPEG, &self.config.ffmpeg_path, &args, deadline).await?;

        // ffmpeg can exit 0 on an out-of-range seek and leave nothing behind
        let written = tokio::fs::metadata(artifact.path())
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if written == 0 {
            return Err(ExtractionError::ToolFailure {
                tool: FFMPEG,
                status: "exit status: 0".to_string(),
                stderr: "no clip was written".to_string(),
            });
        }

        tracing::debug!(
            path = %artifact.path().display(),
            bytes = written,
            "Clip extracted"
        );
        Ok(artifact)
    }
}

/// One extraction's time budget, shared by every tool it runs.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    limit: Duration,
}

impl Deadline {
    fn after(limit: Duration) -> Self {
        Self {
            at: Instant::now() + limit,
            limit,
        }
    }
}

/// Run an external tool to completion before `deadline`.
///
/// The child is killed if the deadline passes or the calling future is dropped.
async fn run_tool(
    tool: &'static str,
    program: &str,
    args: &[String],
    deadline: Deadline,
) -> Result<Output, ExtractionError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExtractionError::Spawn { tool, source })?;

    let output = match tokio::time::timeout_at(deadline.at, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(ExtractionError::Timeout {
                tool,
                after_secs: deadline.limit.as_secs(),
            })
        }
    };

    if !output.status.success() {
        return Err(ExtractionError::ToolFailure {
            tool,
            status: output.status.to_string(),
            stderr: stderr_tail(&output.stderr),
        });
    }
    Ok(output)
}

fn format_seconds(ms: i64) -> String {
    format!("{:.3}", ms.max(0) as f64 / 1000.0)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text.to_string();
    }
    text.chars().skip(count - STDERR_TAIL_CHARS).collect()
}

fn validate_tool_path(name: &str, path: &str) -> Result<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.trim().is_empty() {
        return Err(anyhow!("Invalid {}: empty", name));
    }
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("Invalid {}: contains dangerous characters", name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use visionproxy_core::models::Platform;

    fn config(scratch_dir: PathBuf) -> ClipConfig {
        ClipConfig {
            ffmpeg_path: "ffmpeg".into(),
            ytdlp_path: None,
            scratch_dir,
            crf: 28,
            preset: "veryfast".into(),
            timeout_factor: 10.0,
            timeout_floor_secs: 60,
        }
    }

    fn range(start_time_ms: i64, end_time_ms: i64) -> ClipRange {
        ClipRange {
            blocker_id: 7,
            start_time_ms,
            end_time_ms,
        }
    }

    #[test]
    fn timeout_scales_with_clip_length_above_floor() {
        let extractor = FfmpegClipExtractor::new(config(std::env::temp_dir())).unwrap();
        assert_eq!(extractor.timeout_for(4_500), Duration::from_secs(60));
        assert_eq!(extractor.timeout_for(12_000), Duration::from_secs(120));
        assert_eq!(extractor.timeout_for(7_000), Duration::from_secs(70));
    }

    #[test]
    fn ffmpeg_args_cut_scale_and_drop_audio() {
        let extractor = FfmpegClipExtractor::new(config(std::env::temp_dir())).unwrap();
        let args = extractor.ffmpeg_args(
            "https://www.youtube.com/watch?v=abc",
            range(10_000, 15_500),
            Path::new("/tmp/out.mp4"),
        );

        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-ss") + 1], "10.000");
        assert_eq!(args[pos("-t") + 1], "5.500");
        assert_eq!(args[pos("-i") + 1], "https://www.youtube.com/watch?v=abc");
        assert_eq!(args[pos("-vf") + 1], "scale=-2:'min(480,ih)',fps=24");
        assert_eq!(args[pos("-crf") + 1], "28");
        assert_eq!(args[pos("-preset") + 1], "veryfast");
        assert!(args.contains(&"-an".to_string()));
        assert!(pos("-ss") < pos("-i"));
        assert_eq!(args.last().unwrap(), "/tmp/out.mp4");
    }

    #[test]
    fn rejects_shell_metacharacters_in_tool_paths() {
        let mut cfg = config(std::env::temp_dir());
        cfg.ffmpeg_path = "ffmpeg; rm -rf /".into();
        assert!(FfmpegClipExtractor::new(cfg).is_err());

        let mut cfg = config(std::env::temp_dir());
        cfg.ytdlp_path = Some("$(yt-dlp)".into());
        assert!(FfmpegClipExtractor::new(cfg).is_err());
    }

    #[test]
    fn stderr_is_truncated_to_tail() {
        let long = "x".repeat(STDERR_TAIL_CHARS + 50) + "END";
        let tail = stderr_tail(long.as_bytes());
        assert_eq!(tail.chars().count(), STDERR_TAIL_CHARS);
        assert!(tail.ends_with("END"));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_failure_and_leaves_nothing_behind() {
        let scratch = tempfile::tempdir().unwrap();
        let mut cfg = config(scratch.path().to_path_buf());
        cfg.ffmpeg_path = "/nonexistent/visionproxy-ffmpeg".into();
        let extractor = FfmpegClipExtractor::new(cfg).unwrap();
        let video = VideoRef::new(Platform::Youtube, "abc").unwrap();

        let err = extractor
            .extract(&video, range(0, 6_000))
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::Spawn { tool: "ffmpeg", .. }));
        assert!(!err.is_retryable());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_a_tool_failure_with_stderr() {
        let err = run_tool(
            FFMPEG,
            "sh",
            &["-c".to_string(), "echo boom >&2; exit 3".to_string()],
            Deadline::after(Duration::from_secs(5)),
        )
        .await
        .unwrap_err();

        match err {
            ExtractionError::ToolFailure { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let err = run_tool(
            FFMPEG,
            "sleep",
            &["5".to_string()],
            Deadline::after(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ExtractionError::Timeout { .. }));
        assert!(err.is_retryable());
    }

    /// Write an executable shell script standing in for an external tool.
    #[cfg(unix)]
    fn stub_tool(dir: &Path, name: &str, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolution_and_cut_share_one_budget() {
        let tools = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let mut cfg = config(scratch.path().to_path_buf());
        cfg.ytdlp_path = Some(stub_tool(
            tools.path(),
            "yt-dlp",
            "sleep 1.5\necho https://media.example/clip.mp4",
        ));
        cfg.ffmpeg_path = stub_tool(tools.path(), "ffmpeg", "sleep 1.5");
        cfg.timeout_factor = 0.001;
        cfg.timeout_floor_secs = 2;
        let extractor = FfmpegClipExtractor::new(cfg).unwrap();
        let video = VideoRef::new(Platform::Youtube, "abc").unwrap();

        let started = std::time::Instant::now();
        let err = extractor
            .extract(&video, range(0, 6_000))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(
            matches!(err, ExtractionError::Timeout { tool: "ffmpeg", after_secs: 2 }),
            "unexpected error: {err:?}"
        );
        assert!(elapsed < Duration::from_millis(2_800), "took {elapsed:?}");
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
