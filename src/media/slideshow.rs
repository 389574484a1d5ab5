//! Slideshow assembly from a directory of still frames.

use super::process::ToolRunner;
use crate::error::{Result, StepreelError};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Caption drawn over the frame at the same index.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextOverlay {
    #[serde(default)]
    pub text: String,
}

/// Rendering knobs for `assemble_slideshow`.
#[derive(Debug, Clone)]
pub struct SlideshowOptions {
    pub fps: u32,
    pub seconds_per_frame: u32,
    pub transitions: bool,
    pub font_size: u32,
}

impl Default for SlideshowOptions {
    fn default() -> Self {
        Self::from(&crate::config::SlideshowSettings::default())
    }
}

impl From<&crate::config::SlideshowSettings> for SlideshowOptions {
    fn from(settings: &crate::config::SlideshowSettings) -> Self {
        Self {
            fps: settings.fps,
            seconds_per_frame: settings.seconds_per_frame,
            transitions: settings.transitions,
            font_size: settings.font_size,
        }
    }
}

/// The rendered video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slideshow {
    pub out_path: PathBuf,
    pub duration: f64,
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
}

/// `<frames dir parent>/output/summary_video.mp4`.
pub fn default_output_path(frames_dir: &Path) -> PathBuf {
    frames_dir
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("output")
        .join("summary_video.mp4")
}

/// Escape text for interpolation into an ffmpeg `drawtext` filter.
pub fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            ':' => escaped.push_str("\\:"),
            '%' => escaped.push_str("\\%"),
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Frame images in lexical order. JPEGs win; PNGs are used only when there
/// are no JPEGs.
pub fn list_frames(frames_dir: &Path) -> Result<Vec<PathBuf>> {
    let by_ext = |wanted: &[&str]| -> Result<Vec<PathBuf>> {
        let mut found: Vec<PathBuf> = std::fs::read_dir(frames_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| wanted.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        found.sort();
        Ok(found)
    };

    let jpgs = by_ext(&["jpg", "jpeg"])?;
    if !jpgs.is_empty() {
        return Ok(jpgs);
    }
    by_ext(&["png"])
}

/// ffmpeg concat-demuxer script. The last file is repeated so its duration
/// is honoured.
fn concat_script(frames: &[PathBuf], seconds_per_frame: u32) -> String {
    let mut script = String::new();
    for frame in frames {
        let quoted = frame.to_string_lossy().replace('\'', "'\\''");
        let _ = writeln!(script, "file '{}'", quoted);
        let _ = writeln!(script, "duration {}", seconds_per_frame);
    }
    if let Some(last) = frames.last() {
        let quoted = last.to_string_lossy().replace('\'', "'\\''");
        let _ = writeln!(script, "file '{}'", quoted);
    }
    script
}

fn video_filter(
    frame_count: usize,
    overlays: &[TextOverlay],
    options: &SlideshowOptions,
) -> String {
    let spf = options.seconds_per_frame.max(1);
    let total = frame_count as u32 * spf;

    let mut filters = vec![
        format!("fps={}", options.fps.max(1)),
        "format=yuv420p".to_string(),
        // libx264 needs even dimensions
        "scale=trunc(iw/2)*2:trunc(ih/2)*2".to_string(),
    ];

    for (i, overlay) in overlays.iter().take(frame_count).enumerate() {
        if overlay.text.trim().is_empty() {
            continue;
        }
        let start = i as u32 * spf;
        let end = start + spf;
        filters.push(format!(
            "drawtext=text='{}':fontcolor=white:fontsize={}:box=1:boxcolor=black@0.5:boxborderw=5:\
             x=(w-text_w)/2:y=h-text_h-20:enable='between(t,{},{})'",
            escape_drawtext(&overlay.text),
            options.font_size,
            start,
            end
        ));
    }

    // Clips shorter than two fades are left unfaded.
    if options.transitions && total >= 2 {
        filters.push("fade=t=in:st=0:d=1".to_string());
        filters.push(format!("fade=t=out:st={}:d=1", total - 1));
    }

    filters.join(",")
}

/// Render the frames in `frames_dir` into an H.264 video.
///
/// Every frame is shown for `seconds_per_frame`. An overlay at index `i`
/// captions frame `i`. A directory with no frames is an error.
#[instrument(skip(runner, out_path, overlays, options), fields(frames_dir = %frames_dir.display()))]
pub async fn assemble_slideshow(
    runner: &ToolRunner,
    frames_dir: &Path,
    out_path: Option<&Path>,
    overlays: Option<&[TextOverlay]>,
    options: &SlideshowOptions,
) -> Result<Slideshow> {
    if !frames_dir.is_dir() {
        return Err(StepreelError::MissingArtifact(frames_dir.to_path_buf()));
    }

    let frames = list_frames(frames_dir)?;
    if frames.is_empty() {
        return Err(StepreelError::Slideshow(format!(
            "No frames found in {}",
            frames_dir.display()
        )));
    }

    let out_path = out_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(frames_dir));
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // A video left by an earlier run must not pass for this one.
    if out_path.is_file() {
        std::fs::remove_file(&out_path)?;
    }

    // Removed together with the script when this goes out of scope.
    let scratch = tempfile::Builder::new().prefix("stepreel-slides-").tempdir()?;
    let script_path = scratch.path().join("frames.txt");
    tokio::fs::write(&script_path, concat_script(&frames, options.seconds_per_frame.max(1)))
        .await?;

    let filter = video_filter(frames.len(), overlays.unwrap_or_default(), options);
    debug!("Slideshow filter: {}", filter);

    runner
        .run(
            "ffmpeg",
            [
                OsStr::new("-f"),
                OsStr::new("concat"),
                OsStr::new("-safe"),
                OsStr::new("0"),
                OsStr::new("-i"),
                script_path.as_os_str(),
                OsStr::new("-vf"),
                OsStr::new(&filter),
                OsStr::new("-c:v"),
                OsStr::new("libx264"),
                OsStr::new("-pix_fmt"),
                OsStr::new("yuv420p"),
                OsStr::new("-y"),
                OsStr::new("-loglevel"),
                OsStr::new("error"),
                out_path.as_os_str(),
            ],
        )
        .await
        .map_err(|e| match e {
            StepreelError::ToolFailed { stderr, .. } => StepreelError::Slideshow(stderr),
            other => other,
        })?;

    if !out_path.exists() {
        return Err(StepreelError::MissingArtifact(out_path));
    }

    let expected = (frames.len() as u32 * options.seconds_per_frame.max(1)) as f64;
    let probe = probe_video(runner, &out_path).await?;

    info!("Created slideshow {} from {} frames", out_path.display(), frames.len());

    Ok(Slideshow {
        out_path,
        duration: if probe.duration > 0.0 { probe.duration } else { expected },
        frame_count: frames.len(),
        width: probe.width,
        height: probe.height,
    })
}

struct VideoProbe {
    width: u32,
    height: u32,
    duration: f64,
}

async fn probe_video(runner: &ToolRunner, path: &Path) -> Result<VideoProbe> {
    let output = runner
        .run(
            "ffprobe",
            [
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-select_streams"),
                OsStr::new("v:0"),
                OsStr::new("-show_entries"),
                OsStr::new("stream=width,height,duration,nb_frames"),
                OsStr::new("-of"),
                OsStr::new("json"),
                path.as_os_str(),
            ],
        )
        .await?;

    Ok(parse_video_probe(&output.stdout))
}

fn parse_video_probe(json_str: &str) -> VideoProbe {
    let parsed: serde_json::Value = serde_json::from_str(json_str).unwrap_or_default();
    let stream = &parsed["streams"][0];

    VideoProbe {
        width: stream["width"].as_u64().unwrap_or(0) as u32,
        height: stream["height"].as_u64().unwrap_or(0) as u32,
        duration: stream["duration"]
            .as_str()
            .and_then(|d| d.parse().ok())
            .or_else(|| stream["duration"].as_f64())
            .unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_drawtext() {
        assert_eq!(escape_drawtext("Step 1: grip"), "Step 1\\: grip");
        assert_eq!(escape_drawtext("don't"), "don\\'t");
        assert_eq!(escape_drawtext("a\\b"), "a\\\\b");
        assert_eq!(escape_drawtext("100%"), "100\\%");
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/w/videos/squash_frames")),
            PathBuf::from("/w/videos/output/summary_video.mp4")
        );
    }

    #[test]
    fn test_list_frames_prefers_jpg_in_lexical_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["frame_02_10s.jpg", "frame_01_5s.jpg", "cover.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let frames = list_frames(dir.path()).unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["frame_01_5s.jpg", "frame_02_10s.jpg"]);
    }

    #[test]
    fn test_list_frames_falls_back_to_png() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"x").unwrap();
        std::fs::write(dir.path().join("a.png"), b"x").unwrap();

        let frames = list_frames(dir.path()).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].ends_with("a.png"));
    }

    #[test]
    fn test_concat_script_repeats_last_frame() {
        let frames = vec![PathBuf::from("/f/a.jpg"), PathBuf::from("/f/b.jpg")];
        let script = concat_script(&frames, 3);
        assert_eq!(
            script,
            "file '/f/a.jpg'\nduration 3\nfile '/f/b.jpg'\nduration 3\nfile '/f/b.jpg'\n"
        );
    }

    #[test]
    fn test_video_filter_overlays_keyed_by_index() {
        let overlays = vec![
            TextOverlay { text: "Grip".into() },
            TextOverlay { text: String::new() },
            TextOverlay { text: "Swing: follow through".into() },
            TextOverlay { text: "ignored, no fourth frame".into() },
        ];
        let options = SlideshowOptions {
            fps: 25,
            seconds_per_frame: 3,
            transitions: false,
            font_size: 24,
        };

        let filter = video_filter(3, &overlays, &options);
        assert!(filter.starts_with("fps=25,format=yuv420p"));
        assert!(filter.contains("text='Grip'"));
        assert!(filter.contains("enable='between(t,0,3)'"));
        assert!(filter.contains("text='Swing\\: follow through'"));
        assert!(filter.contains("enable='between(t,6,9)'"));
        assert!(!filter.contains("ignored"));
        assert!(!filter.contains("fade"));
    }

    #[test]
    fn test_video_filter_transitions() {
        let options = SlideshowOptions {
            transitions: true,
            ..SlideshowOptions::default()
        };
        let filter = video_filter(2, &[], &options);
        assert!(filter.contains("fade=t=in:st=0:d=1"));
        assert!(filter.contains("fade=t=out:st=5:d=1"));
    }

    #[test]
    fn test_parse_video_probe() {
        let probe = parse_video_probe(
            r#"{"streams":[{"width":1280,"height":720,"duration":"9.000000","nb_frames":"225"}]}"#,
        );
        assert_eq!(probe.width, 1280);
        assert_eq!(probe.height, 720);
        assert!((probe.duration - 9.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_empty_frames_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ToolRunner::default();
        let err = assemble_slideshow(&runner, dir.path(), None, None, &SlideshowOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StepreelError::Slideshow(_)));
    }

    #[tokio::test]
    async fn test_missing_frames_dir() {
        let runner = ToolRunner::default();
        let err = assemble_slideshow(
            &runner,
            Path::new("/nonexistent/frames"),
            None,
            None,
            &SlideshowOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StepreelError::MissingArtifact(_)));
    }

    #[cfg(unix)]
    struct ShimmedFrames {
        _tools: tempfile::TempDir,
        _work: tempfile::TempDir,
        frames_dir: PathBuf,
        runner: ToolRunner,
    }

    #[cfg(unix)]
    fn frames_with_shim(ffmpeg: &str) -> ShimmedFrames {
        use crate::media::process::write_tool_shim;

        let tools = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let frames_dir = work.path().join("squash_frames");
        std::fs::create_dir_all(&frames_dir).unwrap();
        std::fs::write(frames_dir.join("frame_01_5s.jpg"), b"jpg").unwrap();
        write_tool_shim(tools.path(), "ffmpeg", ffmpeg);
        let runner = ToolRunner::new(std::time::Duration::from_secs(5), 0).with_tool_dir(tools.path());
        ShimmedFrames {
            _tools: tools,
            _work: work,
            frames_dir,
            runner,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ffmpeg_failure_is_slideshow_error_with_stderr() {
        let fx = frames_with_shim("echo 'Unknown encoder libx264' >&2; exit 1");
        let err = assemble_slideshow(&fx.runner, &fx.frames_dir, None, None, &SlideshowOptions::default())
            .await
            .unwrap_err();
        match err {
            StepreelError::Slideshow(stderr) => assert_eq!(stderr, "Unknown encoder libx264"),
            other => panic!("Expected Slideshow, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_previous_output_is_not_reused() {
        let fx = frames_with_shim("exit 0");
        let out = default_output_path(&fx.frames_dir);
        std::fs::create_dir_all(out.parent().unwrap()).unwrap();
        std::fs::write(&out, b"last run").unwrap();

        let err = assemble_slideshow(&fx.runner, &fx.frames_dir, None, None, &SlideshowOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StepreelError::MissingArtifact(p) if p == out));
    }
}
