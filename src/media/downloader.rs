//! Video search and download via yt-dlp.

use super::process::ToolRunner;
use crate::error::{Result, StepreelError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, instrument, warn};

/// A search hit returned by `search_videos`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoCandidate {
    pub title: String,
    pub url: String,
    pub id: String,
    pub duration: Option<u64>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
}

/// Metadata for a single, reachable video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoInfo {
    pub url: String,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub duration: Option<u64>,
    pub view_count: Option<u64>,
    pub description: Option<String>,
}

/// Result of a successful download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadedVideo {
    pub status: String,
    pub video_path: PathBuf,
    pub metadata: Option<VideoInfo>,
}

fn youtube_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:youtube\.com/(?:[^/\n\s]+/\S+/|(?:v|e(?:mbed)?)/|\S*?[?&]v=)|youtu\.be/)([a-zA-Z0-9_-]{11})",
        )
        .expect("Invalid regex")
    })
}

/// Extract an 11-character YouTube video ID from a URL.
pub fn youtube_id(url: &str) -> Option<String> {
    youtube_id_regex()
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Keep only characters that are safe in a file name.
pub fn sanitize_file_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Pick the file stem for a download: the requested one if usable, otherwise
/// `youtube_<id>` or a random `video_<hex>`.
pub fn choose_file_stem(url: &str, requested: Option<&str>) -> String {
    if let Some(stem) = requested.map(sanitize_file_stem).filter(|s| !s.is_empty()) {
        return stem;
    }
    match youtube_id(url) {
        Some(id) => format!("youtube_{}", id),
        None => format!("video_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]),
    }
}

fn parse_candidate(json: &serde_json::Value) -> Option<VideoCandidate> {
    let id = json["id"].as_str().unwrap_or_default().to_string();
    let url = json["webpage_url"]
        .as_str()
        .or_else(|| json["url"].as_str())
        .map(str::to_string)
        .or_else(|| (!id.is_empty()).then(|| format!("https://www.youtube.com/watch?v={}", id)))?;

    Some(VideoCandidate {
        title: json["title"].as_str().unwrap_or("Unknown title").to_string(),
        url,
        id,
        duration: json["duration"].as_f64().map(|d| d as u64),
        uploader: json["uploader"]
            .as_str()
            .or_else(|| json["channel"].as_str())
            .map(str::to_string),
        view_count: json["view_count"].as_u64(),
    })
}

fn parse_info(url: &str, json: &serde_json::Value) -> VideoInfo {
    VideoInfo {
        url: json["webpage_url"].as_str().unwrap_or(url).to_string(),
        title: json["title"].as_str().map(str::to_string),
        uploader: json["uploader"].as_str().map(str::to_string),
        duration: json["duration"].as_f64().map(|d| d as u64),
        view_count: json["view_count"].as_u64(),
        description: json["description"].as_str().map(str::to_string),
    }
}

/// Search YouTube and return up to `max_results` candidates in ranking order.
#[instrument(skip(runner))]
pub async fn search_videos(
    runner: &ToolRunner,
    query: &str,
    max_results: u32,
) -> Result<Vec<VideoCandidate>> {
    let search = format!("ytsearch{}:{}", max_results.max(1), query);
    let output = runner
        .run("yt-dlp", ["--flat-playlist", "--dump-json", "--no-warnings", search.as_str()])
        .await?;

    let candidates: Vec<VideoCandidate> = output
        .stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .filter_map(|json| parse_candidate(&json))
        .collect();

    info!("Found {} candidates", candidates.len());
    Ok(candidates)
}

/// Confirm a URL resolves to an available video and return its metadata.
#[instrument(skip(runner))]
pub async fn verify_video_url(runner: &ToolRunner, url: &str) -> Result<VideoInfo> {
    let output = runner
        .run(
            "yt-dlp",
            ["--dump-json", "--no-download", "--no-playlist", "--no-warnings", url],
        )
        .await?;

    let first = output.stdout.lines().find(|l| !l.trim().is_empty()).unwrap_or("{}");
    let json: serde_json::Value = serde_json::from_str(first)?;
    Ok(parse_info(url, &json))
}

/// Download a video no taller than `max_height` into `target_dir`.
///
/// The file name is restricted to safe characters. A zero exit status that
/// leaves no file behind is reported as `MissingArtifact`.
#[instrument(skip(runner, target_dir))]
pub async fn download_video(
    runner: &ToolRunner,
    url: &str,
    target_dir: &Path,
    max_height: u32,
    file_stem: Option<&str>,
) -> Result<DownloadedVideo> {
    std::fs::create_dir_all(target_dir)?;

    let stem = choose_file_stem(url, file_stem);
    let template = target_dir
        .join(format!("{}.%(ext)s", stem))
        .to_string_lossy()
        .into_owned();
    let format = format!("best[height<={h}][ext=mp4]/best[height<={h}]/best", h = max_height);

    info!("Downloading {} as {}", url, stem);

    let output = runner
        .run(
            "yt-dlp",
            [
                "-f",
                format.as_str(),
                "-o",
                template.as_str(),
                "--restrict-filenames",
                "--no-playlist",
                "--no-warnings",
                "--print",
                "after_move:filepath",
                url,
            ],
        )
        .await
        .map_err(|e| match e {
            StepreelError::ToolFailed { stderr, .. } => StepreelError::DownloadFailed(stderr),
            other => other,
        })?;

    let printed = output.stdout.lines().rev().find(|l| !l.trim().is_empty()).map(str::trim);
    let video_path = match printed {
        Some(p) => PathBuf::from(p),
        None => find_downloaded(target_dir, &stem)
            .ok_or_else(|| StepreelError::MissingArtifact(target_dir.join(&stem)))?,
    };

    if !video_path.exists() {
        return Err(StepreelError::MissingArtifact(video_path));
    }

    let video_path = std::fs::canonicalize(&video_path).unwrap_or(video_path);

    let metadata = match verify_video_url(runner, url).await {
        Ok(info) => Some(info),
        Err(e) => {
            warn!("Downloaded, but could not read metadata: {}", e);
            None
        }
    };

    Ok(DownloadedVideo {
        status: "success".to_string(),
        video_path,
        metadata,
    })
}

/// Locate a downloaded file by stem when yt-dlp did not print its path.
fn find_downloaded(dir: &Path, stem: &str) -> Option<PathBuf> {
    for ext in ["mp4", "webm", "mkv", "mov"] {
        let candidate = dir.join(format!("{}.{}", stem, ext));
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}
