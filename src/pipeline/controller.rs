//! The stage controller.

use super::events::{RunTrace, Stage};
use super::models::PipelineRequest;
use super::report::Report;
use crate::agent::{
    Agent, AgentRequest, AgentRole, DownloadResult, EditingResult, SearchResult, StageOutput,
    UnderstandingResult,
};
use crate::config::Settings;
use crate::error::{Result, StepreelError};
use crate::media::{self, ToolRunner};
use crate::transcription::{TranscriptArtifact, TranscriptionService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Drives one request through search, download, transcription,
/// understanding and editing, degrading to a partial report when a
/// non-fatal stage fails.
pub struct Pipeline {
    agent: Arc<dyn Agent>,
    transcriber: Arc<dyn TranscriptionService>,
    runner: ToolRunner,
    videos_dir: PathBuf,
    manager_max_turns: usize,
    stage_max_turns: usize,
    trace: RunTrace,
}

impl Pipeline {
    pub fn new(
        agent: Arc<dyn Agent>,
        transcriber: Arc<dyn TranscriptionService>,
        videos_dir: PathBuf,
    ) -> Self {
        Self {
            agent,
            transcriber,
            runner: ToolRunner::default(),
            videos_dir,
            manager_max_turns: 20,
            stage_max_turns: 10,
            trace: RunTrace::disabled(),
        }
    }

    pub fn from_settings(
        settings: &Settings,
        agent: Arc<dyn Agent>,
        transcriber: Arc<dyn TranscriptionService>,
    ) -> Self {
        Self::new(agent, transcriber, settings.videos_dir())
            .with_runner(ToolRunner::from_settings(&settings.media))
            .with_turn_budgets(
                settings.agents.manager_max_turns,
                settings.agents.stage_max_turns,
            )
    }

    pub fn with_runner(mut self, runner: ToolRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Turns for search/download and for understanding/editing.
    pub fn with_turn_budgets(mut self, manager: usize, stage: usize) -> Self {
        self.manager_max_turns = manager;
        self.stage_max_turns = stage;
        self
    }

    pub fn with_trace(mut self, trace: RunTrace) -> Self {
        self.trace = trace;
        self
    }

    /// Run one request to a report. Never fails: stage errors end up in the report.
    #[instrument(skip(self, request), fields(run_id = %self.trace.run_id()))]
    pub async fn run(&self, request: &PipelineRequest) -> Report {
        let download = match &request.video {
            Some(name) => match self.use_local_video(name).await {
                Ok(download) => download,
                Err(report) => return report,
            },
            None => {
                let found = match self.search(request).await {
                    Ok(found) => found,
                    Err(e) => return self.fail(Stage::Search, e),
                };
                match self.download(&found).await {
                    Ok(download) => download,
                    Err(e) => return self.fail(Stage::Download, e),
                }
            }
        };

        let report = self.continue_from_download(download, request).await;
        self.trace.complete(Stage::Report, "Report ready");
        report
    }

    fn fail(&self, stage: Stage, error: StepreelError) -> Report {
        warn!("{} stage failed: {}", stage, error);
        self.trace.fail(stage, error.to_string());
        Report::Failed {
            stage,
            reason: error.to_string(),
        }
    }

    async fn search(&self, request: &PipelineRequest) -> Result<SearchResult> {
        self.trace.begin(Stage::Search, "Searching for a video");

        let task = AgentRequest::new(AgentRole::Search, request.query.clone(), self.manager_max_turns)
            .with_context(format!("Maximum video duration: {} seconds", request.max_duration));

        let found = match self.agent.invoke(task).await? {
            StageOutput::Search(found) => found,
            StageOutput::Text(reply) => SearchResult::from_free_text(&reply)?,
            other => return Err(unexpected(AgentRole::Search, &other)),
        }
        .validate()?;

        info!("Search selected {}", found.url);
        self.trace.complete(Stage::Search, found.to_string());
        Ok(found)
    }

    async fn download(&self, found: &SearchResult) -> Result<DownloadResult> {
        self.trace.begin(Stage::Download, format!("Downloading {}", found.url));

        let task = AgentRequest::new(
            AgentRole::Download,
            format!(
                "Please download this video: {} and save it to the videos directory",
                found.url
            ),
            self.manager_max_turns,
        )
        .with_context(format!("I found this video: {}", found));

        let download = match self.agent.invoke(task).await? {
            StageOutput::Download(download) => download,
            other => return Err(unexpected(AgentRole::Download, &other)),
        };

        if !download.video_exists {
            return Err(StepreelError::DownloadFailed(
                "the download stage reported no video".to_string(),
            ));
        }
        // Out-of-process tools can exit 0 without writing anything.
        let Some(video_path) = download.existing_video().cloned() else {
            return Err(StepreelError::MissingArtifact(
                download.video_path.unwrap_or_default(),
            ));
        };

        self.trace.complete(Stage::Download, format!("Video at {}", video_path.display()));
        Ok(download)
    }

    /// Resolve `--video` against the videos directory, extracting audio if needed.
    async fn use_local_video(&self, name: &str) -> std::result::Result<DownloadResult, Report> {
        self.trace.skip(Stage::Search, "Using a local video");

        let video = match media::resolve_video(&self.videos_dir, name) {
            Ok(video) => video,
            Err(_) => {
                let available = media::list_available_videos(&self.videos_dir)
                    .map(|videos| videos.into_iter().map(|v| v.name).collect())
                    .unwrap_or_default();
                self.trace.fail(Stage::Download, format!("Video not found: {}", name));
                return Err(Report::VideoNotFound {
                    name: name.to_string(),
                    videos_dir: self.videos_dir.clone(),
                    available,
                });
            }
        };

        let sidecar = media::audio::default_audio_path(&video);
        let audio = if sidecar.exists() {
            Some(sidecar)
        } else {
            self.trace.progress(Stage::Download, "Extracting audio track");
            match media::extract_audio_track(&self.runner, &video, None).await {
                Ok(track) => Some(track.output_path),
                Err(e) => {
                    warn!("Audio extraction failed: {}", e);
                    self.trace.progress(Stage::Download, format!("Audio extraction failed: {}", e));
                    None
                }
            }
        };

        self.trace.skip(Stage::Download, format!("Using {}", video.display()));
        Ok(DownloadResult::from_paths(video, audio))
    }

    async fn continue_from_download(
        &self,
        download: DownloadResult,
        request: &PipelineRequest,
    ) -> Report {
        let audio_path = download
            .existing_audio()
            .filter(|_| download.audio_exists)
            .cloned();
        let Some(audio_path) = audio_path else {
            self.trace.skip(Stage::Transcription, "No audio track");
            return Report::DownloadOnly { download };
        };

        let transcript = match self.transcribe(&audio_path).await {
            Ok(transcript) => transcript,
            Err(e) => {
                self.trace.fail(Stage::Transcription, e.to_string());
                return Report::TranscriptionFailed {
                    download,
                    reason: e.to_string(),
                };
            }
        };

        let video_path = download.existing_video().cloned();
        let Some(video_path) = video_path.filter(|_| transcript.json_path.exists()) else {
            self.trace.skip(Stage::Understanding, "Video or transcript missing");
            return Report::Transcript {
                download,
                transcript: transcript.record,
            };
        };

        let understanding = match self.understand(&video_path, &transcript.json_path).await {
            Ok(understanding) => understanding,
            Err(e) => {
                self.trace.fail(Stage::Understanding, e.to_string());
                return Report::Transcript {
                    download,
                    transcript: transcript.record,
                };
            }
        };

        match self.edit(&understanding, request).await {
            Ok(editing) => Report::Full {
                understanding,
                editing,
            },
            Err(e) => {
                self.trace.fail(Stage::Editing, e.to_string());
                Report::Understanding(understanding)
            }
        }
    }

    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptArtifact> {
        self.trace.begin(
            Stage::Transcription,
            format!("Transcribing {}", audio_path.display()),
        );
        let transcript = self.transcriber.process_audio(audio_path).await?;
        self.trace.complete(
            Stage::Transcription,
            format!(
                "{} key points, saved to {}",
                transcript.record.key_points.len(),
                transcript.json_path.display()
            ),
        );
        Ok(transcript)
    }

    async fn understand(&self, video_path: &Path, json_path: &Path) -> Result<UnderstandingResult> {
        self.trace.begin(Stage::Understanding, "Analyzing video");

        let task = AgentRequest::new(
            AgentRole::Understanding,
            format!(
                "Please analyze this video: {} and use the transcript data from {} to extract key frames and summarize the process.",
                video_path.display(),
                json_path.display()
            ),
            self.stage_max_turns,
        );

        let understanding = match self.agent.invoke(task).await? {
            StageOutput::Understanding(understanding) => understanding,
            other => return Err(unexpected(AgentRole::Understanding, &other)),
        };

        if !understanding.frames_dir.is_dir() {
            return Err(StepreelError::MissingArtifact(understanding.frames_dir));
        }

        self.trace.complete(
            Stage::Understanding,
            format!(
                "{} key steps, frames in {}",
                understanding.key_steps.len(),
                understanding.frames_dir.display()
            ),
        );
        Ok(understanding)
    }

    async fn edit(
        &self,
        understanding: &UnderstandingResult,
        request: &PipelineRequest,
    ) -> Result<EditingResult> {
        self.trace.begin(Stage::Editing, "Creating highlight video");

        let steps: Vec<String> = understanding.key_steps.iter().map(|s| s.label()).collect();
        let task = AgentRequest::new(
            AgentRole::Editing,
            format!(
                "Please create a short video from the frames in {} with the following key steps: {}. The summary of the video is: {}",
                understanding.frames_dir.display(),
                serde_json::to_string(&steps)?,
                understanding.summary
            ),
            self.stage_max_turns,
        )
        .with_context(format!(
            "Maximum output duration: {} seconds",
            request.max_duration
        ));

        let editing = match self.agent.invoke(task).await? {
            StageOutput::Editing(editing) => editing,
            other => return Err(unexpected(AgentRole::Editing, &other)),
        };

        if !editing.output_video_path.exists() {
            return Err(StepreelError::MissingArtifact(editing.output_video_path));
        }

        self.trace.complete(
            Stage::Editing,
            format!("Video at {}", editing.output_video_path.display()),
        );
        Ok(editing)
    }
}

fn unexpected(role: AgentRole, output: &StageOutput) -> StepreelError {
    StepreelError::SchemaMismatch {
        schema: role.to_string(),
        reason: format!("got {} output", output.schema().name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::KeyStep;
    use crate::pipeline::events::EventKind;
    use crate::transcription::{persist_transcript, TranscriptRecord};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replies with a fixed output per role and records the roles invoked.
    #[derive(Default)]
    struct ScriptedAgent {
        replies: HashMap<AgentRole, StageOutput>,
        calls: Mutex<Vec<AgentRequest>>,
    }

    impl ScriptedAgent {
        fn reply(mut self, role: AgentRole, output: StageOutput) -> Self {
            self.replies.insert(role, output);
            self
        }

        fn roles(&self) -> Vec<AgentRole> {
            self.calls.lock().unwrap().iter().map(|r| r.role).collect()
        }
    }

    #[async_trait]
    impl Agent for ScriptedAgent {
        async fn invoke(&self, request: AgentRequest) -> Result<StageOutput> {
            let role = request.role;
            self.calls.lock().unwrap().push(request);
            self.replies
                .get(&role)
                .cloned()
                .ok_or_else(|| StepreelError::TurnBudgetExceeded(10))
        }
    }

    /// Writes a real sidecar without calling any service.
    #[derive(Default)]
    struct FakeTranscriber {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TranscriptionService for FakeTranscriber {
        async fn process_audio(&self, audio_path: &Path) -> Result<TranscriptArtifact> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StepreelError::Transcription("endpoint unavailable".into()));
            }
            let record = TranscriptRecord::new(
                audio_path.to_path_buf(),
                "[00:00] - [00:04] - First, grip the racket.\n[00:04] - [00:08] - Then swing.".into(),
                vec!["[00:00] - [00:04] - First, grip the racket.".into()],
            );
            let json_path = persist_transcript(&record).await?;
            Ok(TranscriptArtifact { record, json_path })
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        videos: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let videos = dir.path().join("videos");
            std::fs::create_dir_all(&videos).unwrap();
            Self { dir, videos }
        }

        fn with_local_video(self) -> Self {
            std::fs::write(self.videos.join("squash.mp4"), b"video").unwrap();
            std::fs::write(self.videos.join("squash.mp3"), b"audio").unwrap();
            self
        }

        fn frames_dir(&self) -> PathBuf {
            let frames = self.videos.join("squash_frames");
            std::fs::create_dir_all(&frames).unwrap();
            std::fs::write(frames.join("frame_01_5s.jpg"), b"jpg").unwrap();
            frames
        }

        fn output_video(&self) -> PathBuf {
            let out = self.videos.join("output");
            std::fs::create_dir_all(&out).unwrap();
            let path = out.join("summary_video.mp4");
            std::fs::write(&path, b"mp4").unwrap();
            path
        }

        fn pipeline(&self, agent: Arc<ScriptedAgent>, transcriber: Arc<FakeTranscriber>) -> Pipeline {
            Pipeline::new(agent, transcriber, self.videos.clone())
        }
    }

    fn understanding(frames_dir: PathBuf) -> StageOutput {
        StageOutput::Understanding(UnderstandingResult {
            summary: "A squash drive in three moves.".into(),
            key_steps: vec![
                KeyStep {
                    description: "Grip the racket".into(),
                    timestamp: Some("00:05".into()),
                    frame: Some("frame_01_5s.jpg".into()),
                },
                KeyStep {
                    description: "Swing through".into(),
                    timestamp: None,
                    frame: None,
                },
            ],
            frames_dir,
        })
    }

    #[tokio::test]
    async fn test_local_video_skips_search_and_download() {
        let fx = Fixture::new().with_local_video();
        let agent = Arc::new(ScriptedAgent::default());
        let transcriber = Arc::new(FakeTranscriber::default());

        let request = PipelineRequest::new("ignored").with_video("squash.mp4");
        let report = fx.pipeline(agent.clone(), transcriber.clone()).run(&request).await;

        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
        assert_eq!(agent.roles(), vec![AgentRole::Understanding]);
        assert!(matches!(report, Report::Transcript { .. }));
        assert!(fx.videos.join("transcripts/squash_transcript.json").exists());
    }

    #[tokio::test]
    async fn test_failed_download_stops_pipeline() {
        let fx = Fixture::new();
        let agent = Arc::new(
            ScriptedAgent::default()
                .reply(
                    AgentRole::Search,
                    StageOutput::Text(
                        "I found this video: 'Squash basics' by Coach. Download it from (https://www.youtube.com/watch?v=abcdefghijk)".into(),
                    ),
                )
                .reply(
                    AgentRole::Download,
                    StageOutput::Download(DownloadResult {
                        video_exists: false,
                        ..DownloadResult::default()
                    }),
                ),
        );
        let transcriber = Arc::new(FakeTranscriber::default());

        let report = fx
            .pipeline(agent.clone(), transcriber.clone())
            .run(&PipelineRequest::new("squash"))
            .await;

        assert!(matches!(report, Report::Failed { stage: Stage::Download, .. }));
        assert!(report.to_string().starts_with("Download failed"));
        assert_eq!(agent.roles(), vec![AgentRole::Search, AgentRole::Download]);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);

        let calls = agent.calls.lock().unwrap();
        assert!(calls[1].task.contains("https://www.youtube.com/watch?v=abcdefghijk"));
    }

    #[tokio::test]
    async fn test_missing_frames_dir_falls_back_to_transcript() {
        let fx = Fixture::new().with_local_video();
        let agent = Arc::new(ScriptedAgent::default().reply(
            AgentRole::Understanding,
            understanding(fx.videos.join("never_created_frames")),
        ));
        let transcriber = Arc::new(FakeTranscriber::default());

        let report = fx
            .pipeline(agent.clone(), transcriber)
            .run(&PipelineRequest::new("x").with_video("squash.mp4"))
            .await;

        let text = report.to_string();
        assert!(matches!(report, Report::Transcript { .. }));
        assert!(text.contains("--- TRANSCRIPT ---\n[00:00] - [00:04] - First, grip the racket."));
        assert!(text.contains("--- KEY POINTS ---\n- [00:00] - [00:04] - First, grip the racket."));
        assert!(!text.contains("Video Creation Summary"));
        assert!(!agent.roles().contains(&AgentRole::Editing));
    }

    #[tokio::test]
    async fn test_all_stages_succeed() {
        let fx = Fixture::new();
        let video = fx.videos.join("youtube_abcdefghijk.mp4");
        let audio = fx.videos.join("youtube_abcdefghijk.mp3");
        std::fs::write(&video, b"video").unwrap();
        std::fs::write(&audio, b"audio").unwrap();
        let frames_dir = fx.frames_dir();
        let output = fx.output_video();

        let agent = Arc::new(
            ScriptedAgent::default()
                .reply(
                    AgentRole::Search,
                    StageOutput::Search(SearchResult {
                        url: "https://www.youtube.com/watch?v=abcdefghijk".into(),
                        title: Some("Squash basics".into()),
                        uploader: Some("Coach".into()),
                        duration: Some(240),
                        view_count: Some(1000),
                    }),
                )
                .reply(
                    AgentRole::Download,
                    StageOutput::Download(DownloadResult::from_paths(video.clone(), Some(audio))),
                )
                .reply(AgentRole::Understanding, understanding(frames_dir.clone()))
                .reply(
                    AgentRole::Editing,
                    StageOutput::Editing(EditingResult {
                        output_video_path: output.clone(),
                        duration: 6.0,
                        frame_count: 2,
                    }),
                ),
        );
        let transcriber = Arc::new(FakeTranscriber::default());

        let report = fx
            .pipeline(agent.clone(), transcriber)
            .run(&PipelineRequest::new("squash").with_max_duration(120))
            .await;
        let text = report.to_string();

        assert!(report.is_complete());
        assert!(text.contains(&format!("Output video: {}", output.display())));
        assert!(text.contains("Duration: 6 seconds"));
        assert!(text.contains("Frame count: 2"));
        assert!(text.contains("A squash drive in three moves."));
        assert!(text.contains("\n1. Grip the racket (at 00:05) - Frame: frame_01_5s.jpg"));
        assert!(text.contains("\n2. Swing through"));
        assert!(text.contains(&format!("Frames extracted to: {}", frames_dir.display())));

        assert_eq!(
            agent.roles(),
            vec![
                AgentRole::Search,
                AgentRole::Download,
                AgentRole::Understanding,
                AgentRole::Editing
            ]
        );

        let calls = agent.calls.lock().unwrap();
        assert_eq!(calls[0].max_turns, 20);
        assert_eq!(calls[2].max_turns, 10);
        assert!(calls[2].task.contains(&video.display().to_string()));
        assert!(calls[2].task.contains("youtube_abcdefghijk_transcript.json"));
        assert!(calls[3].task.contains(r#"["Grip the racket (at 00:05)","Swing through"]"#));
        assert!(calls[3].context.as_deref().unwrap_or_default().contains("120"));
    }

    #[tokio::test]
    async fn test_transcription_failure_degrades() {
        let fx = Fixture::new().with_local_video();
        let agent = Arc::new(ScriptedAgent::default());
        let transcriber = Arc::new(FakeTranscriber {
            fail: true,
            ..FakeTranscriber::default()
        });

        let report = fx
            .pipeline(agent.clone(), transcriber)
            .run(&PipelineRequest::new("x").with_video("squash.mp4"))
            .await;

        assert!(report
            .to_string()
            .ends_with("Audio transcription failed: Transcription failed: endpoint unavailable"));
        assert!(agent.roles().is_empty());
    }

    #[tokio::test]
    async fn test_editing_failure_falls_back_to_analysis() {
        let fx = Fixture::new().with_local_video();
        let frames_dir = fx.frames_dir();
        let agent = Arc::new(
            ScriptedAgent::default().reply(AgentRole::Understanding, understanding(frames_dir)),
        );
        let transcriber = Arc::new(FakeTranscriber::default());

        let report = fx
            .pipeline(agent.clone(), transcriber)
            .run(&PipelineRequest::new("x").with_video("squash.mp4"))
            .await;

        assert!(matches!(report, Report::Understanding(_)));
        assert!(report.to_string().starts_with("Video Analysis Summary:\n\nA squash drive"));
        assert_eq!(agent.roles(), vec![AgentRole::Understanding, AgentRole::Editing]);
    }

    #[tokio::test]
    async fn test_editing_output_must_exist() {
        let fx = Fixture::new().with_local_video();
        let frames_dir = fx.frames_dir();
        let agent = Arc::new(
            ScriptedAgent::default()
                .reply(AgentRole::Understanding, understanding(frames_dir))
                .reply(
                    AgentRole::Editing,
                    StageOutput::Editing(EditingResult {
                        output_video_path: fx.dir.path().join("phantom.mp4"),
                        duration: 3.0,
                        frame_count: 1,
                    }),
                ),
        );

        let report = fx
            .pipeline(agent, Arc::new(FakeTranscriber::default()))
            .run(&PipelineRequest::new("x").with_video("squash.mp4"))
            .await;

        assert!(matches!(report, Report::Understanding(_)));
    }

    #[tokio::test]
    async fn test_unknown_local_video_lists_available() {
        let fx = Fixture::new().with_local_video();
        let agent = Arc::new(ScriptedAgent::default());

        let report = fx
            .pipeline(agent.clone(), Arc::new(FakeTranscriber::default()))
            .run(&PipelineRequest::new("x").with_video("tennis.mp4"))
            .await;

        let text = report.to_string();
        assert!(text.starts_with("Video not found: tennis.mp4"));
        assert!(text.contains("- squash.mp4"));
        assert!(agent.roles().is_empty());
    }

    #[tokio::test]
    async fn test_search_without_url_fails() {
        let fx = Fixture::new();
        let agent = Arc::new(ScriptedAgent::default().reply(
            AgentRole::Search,
            StageOutput::Text("I could not find anything suitable.".into()),
        ));

        let report = fx
            .pipeline(agent.clone(), Arc::new(FakeTranscriber::default()))
            .run(&PipelineRequest::new("underwater basket weaving"))
            .await;

        assert!(matches!(report, Report::Failed { stage: Stage::Search, .. }));
        assert_eq!(agent.roles(), vec![AgentRole::Search]);
    }

    #[tokio::test]
    async fn test_claimed_video_that_is_missing_fails_download() {
        let fx = Fixture::new();
        let agent = Arc::new(
            ScriptedAgent::default()
                .reply(
                    AgentRole::Search,
                    StageOutput::Search(SearchResult {
                        url: "https://www.youtube.com/watch?v=abcdefghijk".into(),
                        title: None,
                        uploader: None,
                        duration: None,
                        view_count: None,
                    }),
                )
                .reply(
                    AgentRole::Download,
                    StageOutput::Download(DownloadResult {
                        video_path: Some(fx.videos.join("ghost.mp4")),
                        audio_path: None,
                        video_exists: true,
                        audio_exists: false,
                    }),
                ),
        );

        let report = fx
            .pipeline(agent, Arc::new(FakeTranscriber::default()))
            .run(&PipelineRequest::new("squash"))
            .await;

        assert!(matches!(report, Report::Failed { stage: Stage::Download, .. }));
    }

    #[tokio::test]
    async fn test_video_without_audio_skips_transcription() {
        let fx = Fixture::new();
        let video = fx.videos.join("silent.mp4");
        std::fs::write(&video, b"video").unwrap();
        let agent = Arc::new(
            ScriptedAgent::default()
                .reply(
                    AgentRole::Search,
                    StageOutput::Text("https://www.youtube.com/watch?v=abcdefghijk".into()),
                )
                .reply(
                    AgentRole::Download,
                    StageOutput::Download(DownloadResult::from_paths(video, None)),
                ),
        );
        let transcriber = Arc::new(FakeTranscriber::default());

        let report = fx
            .pipeline(agent, transcriber.clone())
            .run(&PipelineRequest::new("squash"))
            .await;

        assert!(matches!(report, Report::DownloadOnly { .. }));
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_trace_reports_stages() {
        let fx = Fixture::new().with_local_video();
        let (trace, mut rx) = RunTrace::channel();
        let agent = Arc::new(ScriptedAgent::default());

        let pipeline = fx
            .pipeline(agent, Arc::new(FakeTranscriber::default()))
            .with_trace(trace.clone());
        pipeline
            .run(&PipelineRequest::new("x").with_video("squash.mp4"))
            .await;
        drop(pipeline);
        drop(trace);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push((event.stage, event.kind));
        }
        assert!(events.contains(&(Stage::Transcription, EventKind::Completed)));
        assert!(events.contains(&(Stage::Understanding, EventKind::Failed)));
        assert_eq!(events.last(), Some(&(Stage::Report, EventKind::Completed)));
    }
}
