//! FFmpeg Combiner - 调用外部 ffmpeg 进程拼接音频
//!
//! 等价于:
//! ffmpeg -i a.mp3 -i b.mp3 -filter_complex "[0:a][1:a]concat=n=2:v=0:a=1[out]" -map "[out]" out.mp3
//!
//! 输出编码由输出文件扩展名决定

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::application::ports::{AudioCombinerPort, CombineError, SegmentHandle};

/// FFmpeg 拼接器
#[derive(Debug, Clone)]
pub struct FfmpegCombiner {
    ffmpeg_path: PathBuf,
}

impl Default for FfmpegCombiner {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegCombiner {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// 检查 ffmpeg 是否可用
    pub async fn check_available(&self) -> Result<(), CombineError> {
        let status = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !status.success() {
            return Err(CombineError::ToolUnavailable(format!(
                "{} -version exited with {}",
                self.ffmpeg_path.display(),
                status
            )));
        }
        Ok(())
    }

    fn spawn_error(&self, e: std::io::Error) -> CombineError {
        match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => CombineError::ToolUnavailable(
                format!("{}: {}", self.ffmpeg_path.display(), e),
            ),
            _ => CombineError::IoError(e.to_string()),
        }
    }
}

/// concat 滤镜表达式
fn concat_filter(inputs: usize) -> String {
    let mut filter: String = (0..inputs).map(|i| format!("[{}:a]", i)).collect();
    filter.push_str(&format!("concat=n={}:v=0:a=1[out]", inputs));
    filter
}

#[async_trait]
impl AudioCombinerPort for FfmpegCombiner {
    async fn combine(
        &self,
        inputs: &[SegmentHandle],
        output: SegmentHandle,
    ) -> Result<SegmentHandle, CombineError> {
        if inputs.is_empty() {
            return Err(CombineError::NoInputs);
        }

        for input in inputs {
            if !tokio::fs::try_exists(input.path()).await.unwrap_or(false) {
                return Err(CombineError::MissingInput(input.to_string()));
            }
        }

        let mut command = Command::new(&self.ffmpeg_path);
        command.args(["-hide_banner", "-loglevel", "error", "-y"]);
        for input in inputs {
            command.arg("-i").arg(input.path());
        }
        command
            .args(["-filter_complex", &concat_filter(inputs.len()), "-map", "[out]"])
            .arg(output.path())
            .stdin(Stdio::null())
            // 请求被取消时不留下孤儿进程
            .kill_on_drop(true);

        tracing::debug!(
            ffmpeg = %self.ffmpeg_path.display(),
            inputs = inputs.len(),
            output = %output,
            "Running ffmpeg concat"
        );

        let result = command.output().await.map_err(|e| self.spawn_error(e))?;

        if !result.status.success() {
            return Err(CombineError::ToolFailed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(output.path()).await.unwrap_or(false) {
            return Err(CombineError::ToolFailed {
                status: result.status.to_string(),
                stderr: "ffmpeg produced no output file".to_string(),
            });
        }

        Ok(output)
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::combiner::build_wav;
    use tempfile::tempdir;

    #[test]
    fn test_concat_filter() {
        assert_eq!(concat_filter(1), "[0:a]concat=n=1:v=0:a=1[out]");
        assert_eq!(
            concat_filter(3),
            "[0:a][1:a][2:a]concat=n=3:v=0:a=1[out]"
        );
    }

    #[tokio::test]
    async fn test_no_inputs() {
        let temp_dir = tempdir().unwrap();
        let out = SegmentHandle::new(temp_dir.path().join("out.wav"));

        let err = FfmpegCombiner::default().combine(&[], out).await.unwrap_err();
        assert!(matches!(err, CombineError::NoInputs));
    }

    #[tokio::test]
    async fn test_missing_input_is_reported_before_spawning() {
        let temp_dir = tempdir().unwrap();
        let missing = SegmentHandle::new(temp_dir.path().join("missing.mp3"));
        let out = SegmentHandle::new(temp_dir.path().join("out.mp3"));

        // 路径不存在的 ffmpeg 也不会被调用
        let combiner = FfmpegCombiner::new("/nonexistent/ffmpeg");
        let err = combiner.combine(&[missing], out).await.unwrap_err();
        assert!(matches!(err, CombineError::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_unavailable_tool() {
        let temp_dir = tempdir().unwrap();
        let input = SegmentHandle::new(temp_dir.path().join("a.wav"));
        std::fs::write(input.path(), build_wav(1, 8000, 16, &[0; 16])).unwrap();
        let out = SegmentHandle::new(temp_dir.path().join("out.wav"));

        let combiner = FfmpegCombiner::new("/nonexistent/ffmpeg");
        assert!(matches!(
            combiner.check_available().await,
            Err(CombineError::ToolUnavailable(_))
        ));
        assert!(matches!(
            combiner.combine(&[input], out).await,
            Err(CombineError::ToolUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_combine_with_real_ffmpeg() {
        let combiner = FfmpegCombiner::default();
        if combiner.check_available().await.is_err() {
            println!("FFmpeg not available - skipping test");
            return;
        }

        let temp_dir = tempdir().unwrap();
        let a = SegmentHandle::new(temp_dir.path().join("a.wav"));
        let b = SegmentHandle::new(temp_dir.path().join("b.wav"));
        // 各 0.1 秒静音
        std::fs::write(a.path(), build_wav(1, 16000, 16, &vec![0; 3200])).unwrap();
        std::fs::write(b.path(), build_wav(1, 16000, 16, &vec![0; 3200])).unwrap();
        let out = SegmentHandle::new(temp_dir.path().join("out.wav"));

        let result = combiner.combine(&[a, b], out.clone()).await.unwrap();

        let data = std::fs::read(result.path()).unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        // 两段合计 6400 字节 PCM，容器头长度可能不同
        assert!(data.len() >= 6400);
    }

    #[tokio::test]
    async fn test_tool_failure_on_garbage_input() {
        let combiner = FfmpegCombiner::default();
        if combiner.check_available().await.is_err() {
            println!("FFmpeg not available - skipping test");
            return;
        }

        let temp_dir = tempdir().unwrap();
        let garbage = SegmentHandle::new(temp_dir.path().join("garbage.mp3"));
        std::fs::write(garbage.path(), b"definitely not audio").unwrap();
        let out = SegmentHandle::new(temp_dir.path().join("out.mp3"));

        let err = combiner.combine(&[garbage], out).await.unwrap_err();
        assert!(matches!(err, CombineError::ToolFailed { .. }));
    }
}
