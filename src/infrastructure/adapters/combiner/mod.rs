//! Audio Combiner Adapters
//!
//! - `FfmpegCombiner`: 外部 ffmpeg 进程，支持任意容器格式
//! - `WavConcatCombiner`: 进程内拼接 PCM WAV

mod ffmpeg_combiner;
mod wav_combiner;

pub use ffmpeg_combiner::FfmpegCombiner;
pub use wav_combiner::{build_wav, WavConcatCombiner};
