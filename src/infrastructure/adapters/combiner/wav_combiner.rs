//! WAV Combiner - 进程内拼接 PCM WAV 片段
//!
//! 只拼接 data chunk，不重采样、不转码；所有输入的声道数、采样率、位深必须一致

use async_trait::async_trait;
use std::io::ErrorKind;

use crate::application::ports::{AudioCombinerPort, CombineError, SegmentHandle};

/// WAVE_FORMAT_PCM
const FORMAT_PCM: u16 = 1;
/// WAVE_FORMAT_IEEE_FLOAT
const FORMAT_FLOAT: u16 = 3;

/// fmt chunk 中与拼接相关的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FmtChunk {
    audio_format: u16,
    num_channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
}

#[derive(Debug)]
struct WavHeader {
    fmt: FmtChunk,
    data_start: usize,
    data_size: usize,
}

fn read_u16(data: &[u8], pos: usize) -> Option<u16> {
    data.get(pos..pos + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(data: &[u8], pos: usize) -> Option<u32> {
    data.get(pos..pos + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// 解析 WAV 文件头
fn parse_wav_header(data: &[u8]) -> Result<WavHeader, String> {
    if data.len() < 12 {
        return Err("WAV data too short".to_string());
    }
    if &data[0..4] != b"RIFF" {
        return Err("missing RIFF header".to_string());
    }
    if &data[8..12] != b"WAVE" {
        return Err("missing WAVE identifier".to_string());
    }

    let mut pos = 12;
    let mut fmt_chunk: Option<FmtChunk> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32(data, pos + 4).unwrap_or(0) as usize;
        let body = pos + 8;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 {
                    return Err("invalid fmt chunk size".to_string());
                }
                let field = |offset: usize| read_u16(data, body + offset);
                let (Some(audio_format), Some(num_channels), Some(sample_rate), Some(bits_per_sample)) =
                    (field(0), field(2), read_u32(data, body + 4), field(14))
                else {
                    return Err("truncated fmt chunk".to_string());
                };
                // 写回头部时需要 block_align 与 byte_rate，二者都不能溢出
                let block_align = num_channels
                    .checked_mul(bits_per_sample / 8)
                    .filter(|&align| align > 0)
                    .ok_or_else(|| {
                        format!(
                            "invalid block alignment ({} ch, {} bit)",
                            num_channels, bits_per_sample
                        )
                    })?;
                if sample_rate.checked_mul(u32::from(block_align)).is_none() {
                    return Err(format!(
                        "byte rate overflows ({} Hz, block align {})",
                        sample_rate, block_align
                    ));
                }
                fmt_chunk = Some(FmtChunk {
                    audio_format,
                    num_channels,
                    sample_rate,
                    bits_per_sample,
                });
            }
            b"data" => {
                let fmt = fmt_chunk.ok_or("data chunk before fmt chunk")?;
                let available = data.len() - body;
                // 流式输出的 WAV 常把长度写成 0 或 0xFFFFFFFF，按实际剩余字节处理
                let data_size = if chunk_size == 0 || chunk_size > available {
                    available
                } else {
                    chunk_size
                };
                return Ok(WavHeader {
                    fmt,
                    data_start: body,
                    data_size,
                });
            }
            _ => {}
        }

        pos = body + chunk_size;
        // 对齐到偶数字节
        if chunk_size % 2 != 0 {
            pos += 1;
        }
    }

    Err(if fmt_chunk.is_none() {
        "missing fmt chunk".to_string()
    } else {
        "missing data chunk".to_string()
    })
}

fn write_wav(fmt: &FmtChunk, pcm: &[u8]) -> Vec<u8> {
    let block_align = fmt.num_channels * (fmt.bits_per_sample / 8);
    let byte_rate = fmt.sample_rate * block_align as u32;
    let data_size = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_size).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&fmt.audio_format.to_le_bytes());
    wav.extend_from_slice(&fmt.num_channels.to_le_bytes());
    wav.extend_from_slice(&fmt.sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&fmt.bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    wav.extend_from_slice(pcm);

    wav
}

/// 构造 PCM WAV（44 字节头 + 数据）
pub fn build_wav(num_channels: u16, sample_rate: u32, bits_per_sample: u16, pcm: &[u8]) -> Vec<u8> {
    let fmt = FmtChunk {
        audio_format: FORMAT_PCM,
        num_channels,
        sample_rate,
        bits_per_sample,
    };
    write_wav(&fmt, pcm)
}

/// 进程内 WAV 拼接器
#[derive(Debug, Default)]
pub struct WavConcatCombiner;

impl WavConcatCombiner {
    pub fn new() -> Self {
        Self
    }

    /// 拼接内存中的 WAV 数据（按给定顺序）
    fn concat(&self, inputs: &[(String, Vec<u8>)]) -> Result<Vec<u8>, CombineError> {
        let mut expected: Option<FmtChunk> = None;
        let mut pcm: Vec<u8> = Vec::new();

        for (path, data) in inputs {
            let header = parse_wav_header(data).map_err(|reason| CombineError::InvalidInput {
                path: path.clone(),
                reason,
            })?;

            if !matches!(header.fmt.audio_format, FORMAT_PCM | FORMAT_FLOAT) {
                return Err(CombineError::InvalidInput {
                    path: path.clone(),
                    reason: format!("unsupported WAV format tag {}", header.fmt.audio_format),
                });
            }

            if let Some(fmt) = expected {
                if fmt != header.fmt {
                    return Err(CombineError::FormatMismatch(format!(
                        "{}: {} ch / {} Hz / {} bit, expected {} ch / {} Hz / {} bit",
                        path,
                        header.fmt.num_channels,
                        header.fmt.sample_rate,
                        header.fmt.bits_per_sample,
                        fmt.num_channels,
                        fmt.sample_rate,
                        fmt.bits_per_sample,
                    )));
                }
            } else {
                expected = Some(header.fmt);
            }

            pcm.extend_from_slice(&data[header.data_start..header.data_start + header.data_size]);
        }

        let fmt = expected.ok_or(CombineError::NoInputs)?;
        if pcm.len() > (u32::MAX - 36) as usize {
            return Err(CombineError::FormatMismatch(
                "combined audio exceeds the 4 GB WAV limit".to_string(),
            ));
        }

        Ok(write_wav(&fmt, &pcm))
    }
}

#[async_trait]
impl AudioCombinerPort for WavConcatCombiner {
    async fn combine(
        &self,
        inputs: &[SegmentHandle],
        output: SegmentHandle,
    ) -> Result<SegmentHandle, CombineError> {
        if inputs.is_empty() {
            return Err(CombineError::NoInputs);
        }

        let mut loaded = Vec::with_capacity(inputs.len());
        for input in inputs {
            let data = tokio::fs::read(input.path()).await.map_err(|e| match e.kind() {
                ErrorKind::NotFound => CombineError::MissingInput(input.to_string()),
                _ => CombineError::IoError(e.to_string()),
            })?;
            loaded.push((input.to_string(), data));
        }

        let combined = self.concat(&loaded)?;

        tokio::fs::write(output.path(), &combined)
            .await
            .map_err(|e| CombineError::IoError(e.to_string()))?;

        tracing::debug!(
            inputs = inputs.len(),
            output_size = combined.len(),
            "WAV segments concatenated"
        );

        Ok(output)
    }

    fn name(&self) -> &'static str {
        "wav"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pcm_wav(sample_rate: u32, pcm: &[u8]) -> Vec<u8> {
        build_wav(1, sample_rate, 16, pcm)
    }

    #[test]
    fn test_parse_wav_header() {
        let wav = pcm_wav(16000, &[1, 0, 2, 0]);
        let header = parse_wav_header(&wav).unwrap();

        assert_eq!(header.fmt.sample_rate, 16000);
        assert_eq!(header.fmt.num_channels, 1);
        assert_eq!(header.fmt.bits_per_sample, 16);
        assert_eq!(header.data_start, 44);
        assert_eq!(header.data_size, 4);
    }

    #[test]
    fn test_parse_streaming_header_with_unknown_length() {
        let mut wav = pcm_wav(24000, &[7, 0, 8, 0]);
        wav[40..44].copy_from_slice(&u32::MAX.to_le_bytes());

        let header = parse_wav_header(&wav).unwrap();
        assert_eq!(header.data_size, 4);
    }

    #[test]
    fn test_parse_skips_unknown_chunks() {
        let mut wav = pcm_wav(16000, &[5, 0]);
        // 在 fmt 与 data 之间插入一个奇数长度的 LIST chunk
        let mut list = b"LIST".to_vec();
        list.extend_from_slice(&3u32.to_le_bytes());
        list.extend_from_slice(b"abc\0");
        wav.splice(36..36, list);

        let header = parse_wav_header(&wav).unwrap();
        assert_eq!(&wav[header.data_start..header.data_start + header.data_size], &[5, 0]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_wav_header(b"ID3\x04 not a wav file").is_err());
        assert!(parse_wav_header(b"RIFF\0\0\0\0WAVE").is_err());
    }

    #[test]
    fn test_parse_rejects_overflowing_fmt_fields() {
        // 65535 声道 × 4 字节超出 u16
        let mut wav = pcm_wav(16000, &[0, 0]);
        wav[22..24].copy_from_slice(&u16::MAX.to_le_bytes());
        wav[34..36].copy_from_slice(&32u16.to_le_bytes());
        assert!(parse_wav_header(&wav).is_err());

        // 采样率 × block_align 超出 u32
        let mut wav = pcm_wav(16000, &[0, 0]);
        wav[24..28].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(parse_wav_header(&wav).is_err());
    }

    #[test]
    fn test_parse_rejects_zero_block_align() {
        let mut wav = pcm_wav(16000, &[0, 0]);
        wav[22..24].copy_from_slice(&0u16.to_le_bytes());
        assert!(parse_wav_header(&wav).is_err());

        let mut wav = pcm_wav(16000, &[0, 0]);
        wav[34..36].copy_from_slice(&4u16.to_le_bytes());
        assert!(parse_wav_header(&wav).is_err());
    }

    #[test]
    fn test_concat_reports_overflowing_header_as_invalid_input() {
        let mut bad = pcm_wav(16000, &[0, 0]);
        bad[22..24].copy_from_slice(&u16::MAX.to_le_bytes());
        bad[34..36].copy_from_slice(&32u16.to_le_bytes());

        let inputs = vec![("bad".to_string(), bad)];
        assert!(matches!(
            WavConcatCombiner::new().concat(&inputs),
            Err(CombineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_concat_preserves_order() {
        let combiner = WavConcatCombiner::new();
        let inputs = vec![
            ("a".to_string(), pcm_wav(16000, &[1, 1])),
            ("b".to_string(), pcm_wav(16000, &[2, 2, 2, 2])),
            ("c".to_string(), pcm_wav(16000, &[3, 3])),
        ];

        let combined = combiner.concat(&inputs).unwrap();
        let header = parse_wav_header(&combined).unwrap();

        assert_eq!(header.data_size, 8);
        assert_eq!(&combined[44..], &[1, 1, 2, 2, 2, 2, 3, 3]);
        assert_eq!(read_u32(&combined, 4), Some(36 + 8));
    }

    #[test]
    fn test_concat_rejects_mismatched_formats() {
        let combiner = WavConcatCombiner::new();
        let inputs = vec![
            ("a".to_string(), pcm_wav(16000, &[1, 1])),
            ("b".to_string(), pcm_wav(24000, &[2, 2])),
        ];

        assert!(matches!(
            combiner.concat(&inputs),
            Err(CombineError::FormatMismatch(_))
        ));
    }

    #[tokio::test]
    async fn test_combine_files() {
        let temp_dir = tempdir().unwrap();
        let a = SegmentHandle::new(temp_dir.path().join("a.wav"));
        let b = SegmentHandle::new(temp_dir.path().join("b.wav"));
        let out = SegmentHandle::new(temp_dir.path().join("out.wav"));
        std::fs::write(a.path(), pcm_wav(8000, &[9, 9])).unwrap();
        std::fs::write(b.path(), pcm_wav(8000, &[4, 4])).unwrap();

        let combiner = WavConcatCombiner::new();
        let result = combiner.combine(&[a, b], out.clone()).await.unwrap();

        assert_eq!(result, out);
        let data = std::fs::read(out.path()).unwrap();
        assert_eq!(&data[44..], &[9, 9, 4, 4]);
    }

    #[tokio::test]
    async fn test_combine_missing_input() {
        let temp_dir = tempdir().unwrap();
        let missing = SegmentHandle::new(temp_dir.path().join("missing.wav"));
        let out = SegmentHandle::new(temp_dir.path().join("out.wav"));

        let err = WavConcatCombiner::new()
            .combine(&[missing], out.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, CombineError::MissingInput(_)));
        assert!(!out.path().exists());
    }

    #[tokio::test]
    async fn test_combine_no_inputs() {
        let temp_dir = tempdir().unwrap();
        let out = SegmentHandle::new(temp_dir.path().join("out.wav"));

        let err = WavConcatCombiner::new().combine(&[], out).await.unwrap_err();
        assert!(matches!(err, CombineError::NoInputs));
    }
}
