//! Synthesize Command Handler - 脚本到音频的编排
//!
//! 流程: 解析 → 逐轮合成并落盘 → 拼接 → 读取 → 清理
//!
//! 任一阶段失败都会先清理本次请求创建的全部临时产物，再原样返回错误；
//! 成功路径在合并结果读入内存之后才清理

use std::sync::Arc;

use crate::application::artifact_scope::ArtifactScope;
use crate::application::commands::synthesize_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioCombinerPort, SegmentHandle, SegmentStorePort, SpeechEnginePort, SpeechRequest,
};
use crate::domain::script::{ScriptParser, Turn};
use crate::domain::voice::{ConversationStyle, VoiceResolver};
use crate::domain::AudioFormat;

/// SynthesizeSpeech Handler
pub struct SynthesizeSpeechHandler {
    parser: ScriptParser,
    resolver: VoiceResolver,
    format: AudioFormat,
    speech_engine: Arc<dyn SpeechEnginePort>,
    segment_store: Arc<dyn SegmentStorePort>,
    combiner: Arc<dyn AudioCombinerPort>,
}

impl SynthesizeSpeechHandler {
    pub fn new(
        speech_engine: Arc<dyn SpeechEnginePort>,
        segment_store: Arc<dyn SegmentStorePort>,
        combiner: Arc<dyn AudioCombinerPort>,
    ) -> Self {
        Self {
            parser: ScriptParser::default(),
            resolver: VoiceResolver::default(),
            format: AudioFormat::default(),
            speech_engine,
            segment_store,
            combiner,
        }
    }

    pub fn with_parser(mut self, parser: ScriptParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_resolver(mut self, resolver: VoiceResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    pub async fn handle(
        &self,
        cmd: SynthesizeSpeech,
    ) -> Result<SynthesizeSpeechResponse, ApplicationError> {
        // 解析失败时尚未发生任何外部调用
        let turns = self.parser.parse(&cmd.script)?;
        let style = ConversationStyle::from_name(cmd.conversation_style.as_deref());

        tracing::info!(
            turns = turns.len(),
            style = %style,
            format = %self.format,
            combiner = self.combiner.name(),
            "Starting script synthesis"
        );

        let mut scope = ArtifactScope::new(self.segment_store.clone());
        let result = self.run_pipeline(&turns, &style, &mut scope).await;
        let artifacts = scope.handles().len();
        let report = scope.purge().await;

        if !report.is_clean() {
            tracing::warn!(
                artifacts,
                purge_failures = report.failed,
                "Some temporary artifacts could not be removed"
            );
        }

        match &result {
            Ok(audio_data) => tracing::info!(
                turns = turns.len(),
                audio_size = audio_data.len(),
                purged = report.removed,
                "Script synthesis completed"
            ),
            // 流水线失败只在这里记录一次 error，HTTP 层不再重复
            Err(e) => tracing::error!(
                error = %e,
                turn_index = ?e.turn_index(),
                artifacts,
                purged = report.removed,
                "Script synthesis failed"
            ),
        }

        let audio_data = result?;
        Ok(SynthesizeSpeechResponse {
            audio_data,
            format: self.format,
            turn_count: turns.len(),
        })
    }

    /// 合成 → 拼接 → 读取；所有临时产物登记到 scope，由调用方清理
    async fn run_pipeline(
        &self,
        turns: &[Turn],
        style: &ConversationStyle,
        scope: &mut ArtifactScope,
    ) -> Result<Vec<u8>, ApplicationError> {
        let mut segments: Vec<SegmentHandle> = Vec::with_capacity(turns.len());

        // 严格按顺序：第 i 轮落盘后才开始第 i+1 轮
        for turn in turns {
            let persona = self.resolver.resolve(&turn.speaker_id, style);

            tracing::debug!(
                turn_index = turn.index,
                speaker_id = %turn.speaker_id,
                voice = %persona.voice,
                text_len = turn.char_count(),
                "Synthesizing turn"
            );

            let request = SpeechRequest::new(turn.text.clone(), persona, self.format);
            let response = self
                .speech_engine
                .synthesize(request)
                .await
                .map_err(|source| ApplicationError::Synthesis {
                    turn_index: turn.index,
                    speaker_id: turn.speaker_id.clone(),
                    source,
                })?;

            let handle = scope.allocate(&format!("speaker_{}_{}", turn.speaker_id, turn.index));
            self.segment_store
                .write(&handle, &response.audio_data)
                .await?;
            segments.push(handle);
        }

        let output = scope.allocate("combined");
        let combined = self.combiner.combine(&segments, output).await?;
        scope.track(combined.clone());

        tracing::debug!(segments = segments.len(), output = %combined, "Segments combined");

        let audio_data = self.segment_store.read(&combined).await?;
        Ok(audio_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        CombineError, PurgeReport, SpeechError, SpeechResponse, StoreError,
    };
    use crate::domain::script::ScriptError;
    use crate::domain::voice::VoiceName;
    use crate::infrastructure::adapters::TempSegmentStore;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    /// 记录调用；第 `fail_at` 次调用返回错误；第 `hang_at` 次调用永不返回
    #[derive(Default)]
    struct ScriptedSpeechEngine {
        calls: Mutex<Vec<SpeechRequest>>,
        fail_at: Option<usize>,
        hang_at: Option<usize>,
    }

    impl ScriptedSpeechEngine {
        fn failing_at(call: usize) -> Self {
            Self {
                fail_at: Some(call),
                ..Default::default()
            }
        }

        fn hanging_at(call: usize) -> Self {
            Self {
                hang_at: Some(call),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<SpeechRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechEnginePort for ScriptedSpeechEngine {
        async fn synthesize(&self, request: SpeechRequest) -> Result<SpeechResponse, SpeechError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(request.clone());
                calls.len() - 1
            };

            if self.hang_at == Some(call) {
                std::future::pending::<()>().await;
            }
            if self.fail_at == Some(call) {
                return Err(SpeechError::Service {
                    status: 500,
                    body: "boom".to_string(),
                });
            }

            Ok(SpeechResponse {
                audio_data: format!("<{}:{}>", request.voice, request.text).into_bytes(),
                format: request.format,
            })
        }
    }

    /// 直接拼接字节
    struct ByteConcatCombiner;

    #[async_trait]
    impl AudioCombinerPort for ByteConcatCombiner {
        async fn combine(
            &self,
            inputs: &[SegmentHandle],
            output: SegmentHandle,
        ) -> Result<SegmentHandle, CombineError> {
            let mut combined = Vec::new();
            for input in inputs {
                let data = tokio::fs::read(input.path())
                    .await
                    .map_err(|_| CombineError::MissingInput(input.to_string()))?;
                combined.extend(data);
            }
            tokio::fs::write(output.path(), combined)
                .await
                .map_err(|e| CombineError::IoError(e.to_string()))?;
            Ok(output)
        }

        fn name(&self) -> &'static str {
            "bytes"
        }
    }

    /// 写出部分输出后失败
    struct FailingCombiner;

    #[async_trait]
    impl AudioCombinerPort for FailingCombiner {
        async fn combine(
            &self,
            _inputs: &[SegmentHandle],
            output: SegmentHandle,
        ) -> Result<SegmentHandle, CombineError> {
            tokio::fs::write(output.path(), b"partial").await.unwrap();
            Err(CombineError::ToolFailed {
                status: "exit status: 1".to_string(),
                stderr: "invalid data".to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    /// 包装真实存储，按需注入写入、读取或清理失败
    struct FlakyStore {
        inner: TempSegmentStore,
        writes: Mutex<usize>,
        fail_write_at: Option<usize>,
        fail_read: bool,
        fail_purge: bool,
    }

    impl FlakyStore {
        async fn new(dir: &Path) -> Self {
            Self {
                inner: TempSegmentStore::new(dir, AudioFormat::Mp3).await.unwrap(),
                writes: Mutex::new(0),
                fail_write_at: None,
                fail_read: false,
                fail_purge: false,
            }
        }
    }

    #[async_trait]
    impl SegmentStorePort for FlakyStore {
        fn allocate(&self, prefix: &str) -> SegmentHandle {
            self.inner.allocate(prefix)
        }

        async fn write(&self, handle: &SegmentHandle, data: &[u8]) -> Result<(), StoreError> {
            let write = {
                let mut writes = self.writes.lock().unwrap();
                *writes += 1;
                *writes - 1
            };
            if self.fail_write_at == Some(write) {
                return Err(StoreError::IoError("disk full".to_string()));
            }
            self.inner.write(handle, data).await
        }

        async fn read(&self, handle: &SegmentHandle) -> Result<Vec<u8>, StoreError> {
            if self.fail_read {
                return Err(StoreError::IoError("read failed".to_string()));
            }
            self.inner.read(handle).await
        }

        async fn purge_all(&self, handles: &[SegmentHandle]) -> PurgeReport {
            if self.fail_purge {
                return PurgeReport {
                    removed: 0,
                    failed: handles.len(),
                };
            }
            self.inner.purge_all(handles).await
        }

        fn purge_all_blocking(&self, handles: &[SegmentHandle]) -> PurgeReport {
            self.inner.purge_all_blocking(handles)
        }
    }

    async fn temp_store() -> (TempDir, Arc<TempSegmentStore>) {
        let temp_dir = tempdir().unwrap();
        let store = TempSegmentStore::new(temp_dir.path(), AudioFormat::Mp3)
            .await
            .unwrap();
        (temp_dir, Arc::new(store))
    }

    fn remaining_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    const EXAMPLE_SCRIPT: &str = "Speaker R: Hello there.\nSpeaker S: Indeed, hello.\n";

    #[tokio::test]
    async fn test_example_script_combines_in_order_and_cleans_up() {
        let (temp_dir, store) = temp_store().await;
        let engine = Arc::new(ScriptedSpeechEngine::default());
        let handler =
            SynthesizeSpeechHandler::new(engine.clone(), store, Arc::new(ByteConcatCombiner));

        let response = handler.handle(SynthesizeSpeech::new(EXAMPLE_SCRIPT)).await.unwrap();

        assert_eq!(response.turn_count, 2);
        assert_eq!(response.format, AudioFormat::Mp3);
        assert_eq!(
            String::from_utf8(response.audio_data).unwrap(),
            "<alloy:Hello there.><nova:Indeed, hello.>"
        );

        let calls = engine.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].voice, VoiceName::Alloy);
        assert_eq!(calls[1].voice, VoiceName::Nova);
        assert!(calls.iter().all(|c| c.instructions.is_some()));

        assert_eq!(remaining_files(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_order_is_preserved_for_many_turns() {
        let (temp_dir, store) = temp_store().await;
        let engine = Arc::new(ScriptedSpeechEngine::default());
        let handler =
            SynthesizeSpeechHandler::new(engine.clone(), store, Arc::new(ByteConcatCombiner));

        let script: String = (0..12)
            .map(|i| format!("Speaker {}: line {}\n", if i % 2 == 0 { "R" } else { "S" }, i))
            .collect();
        let response = handler
            .handle(SynthesizeSpeech::new(script).with_style("male-male"))
            .await
            .unwrap();

        let expected: String = (0..12)
            .map(|i| format!("<{}:line {}>", if i % 2 == 0 { "onyx" } else { "echo" }, i))
            .collect();
        assert_eq!(String::from_utf8(response.audio_data).unwrap(), expected);
        assert_eq!(remaining_files(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_empty_script_makes_no_external_calls() {
        let (temp_dir, store) = temp_store().await;
        let engine = Arc::new(ScriptedSpeechEngine::default());
        let handler =
            SynthesizeSpeechHandler::new(engine.clone(), store, Arc::new(ByteConcatCombiner));

        for script in ["", "\n\n   \n", "no speakers here\nat all"] {
            let err = handler.handle(SynthesizeSpeech::new(script)).await.unwrap_err();
            assert!(matches!(err, ApplicationError::Script(ScriptError::NoTurns)));
        }

        assert!(engine.calls().is_empty());
        assert_eq!(remaining_files(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_synthesis_failure_purges_previous_segments() {
        let (temp_dir, store) = temp_store().await;
        let engine = Arc::new(ScriptedSpeechEngine::failing_at(2));
        let handler =
            SynthesizeSpeechHandler::new(engine.clone(), store, Arc::new(ByteConcatCombiner));

        let script = "Speaker R: a\nSpeaker S: b\nSpeaker R: c\nSpeaker S: d\n";
        let err = handler.handle(SynthesizeSpeech::new(script)).await.unwrap_err();

        match err {
            ApplicationError::Synthesis {
                turn_index,
                ref speaker_id,
                source: SpeechError::Service { status, .. },
            } => {
                assert_eq!(turn_index, 2);
                assert_eq!(speaker_id, "R");
                assert_eq!(status, 500);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.turn_index(), Some(2));

        // 失败后不再继续后续轮次
        assert_eq!(engine.calls().len(), 3);
        assert_eq!(remaining_files(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_combine_failure_purges_segments_and_partial_output() {
        let (temp_dir, store) = temp_store().await;
        let handler = SynthesizeSpeechHandler::new(
            Arc::new(ScriptedSpeechEngine::default()),
            store,
            Arc::new(FailingCombiner),
        );

        let err = handler
            .handle(SynthesizeSpeech::new(EXAMPLE_SCRIPT))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Combine(CombineError::ToolFailed { .. })));
        assert_eq!(remaining_files(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_purges_written_segments() {
        let temp_dir = tempdir().unwrap();
        let store = Arc::new(FlakyStore {
            fail_write_at: Some(1),
            ..FlakyStore::new(temp_dir.path()).await
        });
        let handler = SynthesizeSpeechHandler::new(
            Arc::new(ScriptedSpeechEngine::default()),
            store,
            Arc::new(ByteConcatCombiner),
        );

        let err = handler
            .handle(SynthesizeSpeech::new(EXAMPLE_SCRIPT))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Storage(StoreError::IoError(_))));
        assert_eq!(remaining_files(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_final_read_failure_purges_everything() {
        let temp_dir = tempdir().unwrap();
        let store = Arc::new(FlakyStore {
            fail_read: true,
            ..FlakyStore::new(temp_dir.path()).await
        });
        let handler = SynthesizeSpeechHandler::new(
            Arc::new(ScriptedSpeechEngine::default()),
            store,
            Arc::new(ByteConcatCombiner),
        );

        let err = handler
            .handle(SynthesizeSpeech::new(EXAMPLE_SCRIPT))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Storage(StoreError::IoError(_))));
        // 两个片段和合并结果都已删除
        assert_eq!(remaining_files(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_replace_original_error() {
        let temp_dir = tempdir().unwrap();
        let store = Arc::new(FlakyStore {
            fail_purge: true,
            ..FlakyStore::new(temp_dir.path()).await
        });
        let engine = Arc::new(ScriptedSpeechEngine::failing_at(1));
        let handler =
            SynthesizeSpeechHandler::new(engine.clone(), store, Arc::new(ByteConcatCombiner));

        let script = "Speaker R: a\nSpeaker S: b\nSpeaker R: c\n";
        let err = handler.handle(SynthesizeSpeech::new(script)).await.unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Synthesis {
                turn_index: 1,
                source: SpeechError::Service { status: 500, .. },
                ..
            }
        ));
        assert_eq!(engine.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_request_still_purges() {
        let (temp_dir, store) = temp_store().await;
        let engine = Arc::new(ScriptedSpeechEngine::hanging_at(2));
        let handler =
            SynthesizeSpeechHandler::new(engine.clone(), store, Arc::new(ByteConcatCombiner));

        let script = "Speaker R: a\nSpeaker S: b\nSpeaker R: c\n";
        let outcome = tokio::time::timeout(
            Duration::from_millis(200),
            handler.handle(SynthesizeSpeech::new(script)),
        )
        .await;

        assert!(outcome.is_err(), "request should have been cancelled");
        assert_eq!(engine.calls().len(), 3);
        assert_eq!(remaining_files(temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_strict_parser_rejects_before_synthesis() {
        let (_temp_dir, store) = temp_store().await;
        let engine = Arc::new(ScriptedSpeechEngine::default());
        let handler =
            SynthesizeSpeechHandler::new(engine.clone(), store, Arc::new(ByteConcatCombiner))
                .with_parser(ScriptParser::strict());

        let err = handler
            .handle(SynthesizeSpeech::new("Speaker R: ok\nstray line"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Script(ScriptError::UnrecognizedLine { line_number: 2, .. })
        ));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_custom_resolver_and_format() {
        let (_temp_dir, store) = temp_store().await;
        let engine = Arc::new(ScriptedSpeechEngine::default());
        let handler =
            SynthesizeSpeechHandler::new(engine.clone(), store, Arc::new(ByteConcatCombiner))
                .with_resolver(VoiceResolver::new("A", "B"))
                .with_format(AudioFormat::Wav);

        let response = handler
            .handle(SynthesizeSpeech::new("Speaker A: one\nSpeaker B: two").with_style("femme-femme"))
            .await
            .unwrap();

        assert_eq!(response.format, AudioFormat::Wav);
        let calls = engine.calls();
        assert_eq!(calls[0].voice, VoiceName::Nova);
        assert_eq!(calls[1].voice, VoiceName::Coral);
        assert!(calls.iter().all(|c| c.format == AudioFormat::Wav));
    }
}
