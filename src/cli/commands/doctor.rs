//! Doctor command - verify external tools, credentials and directories.

use crate::cli::Output;
use crate::config::Settings;
use crate::media::{list_available_videos, tool_versions, ToolRunner, ToolVersion};
use crate::openai::API_KEY_ENV;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks. Exits with status 1 when any check errors.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Stepreel Doctor");
    println!();
    println!("Checking external tools, credentials and directories...\n");

    let runner = ToolRunner::from_settings(&settings.media);
    let tool_checks: Vec<CheckResult> = tool_versions(&runner).await.iter().map(check_tool).collect();
    print_section("External Tools", &tool_checks);

    let api_checks = vec![check_api_key(std::env::var(API_KEY_ENV).ok())];
    print_section("API Configuration", &api_checks);

    let dir_checks = check_directories(settings);
    print_section("Directories", &dir_checks);

    let config_checks = vec![check_config_file()];
    print_section("Configuration", &config_checks);

    let checks: Vec<&CheckResult> = tool_checks
        .iter()
        .chain(&api_checks)
        .chain(&dir_checks)
        .chain(&config_checks)
        .collect();
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before running Stepreel.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Stepreel is ready to use.");
    }

    Ok(())
}

fn check_tool(tool: &ToolVersion) -> CheckResult {
    let hint = match tool.name.as_str() {
        "yt-dlp" => install_hint_ytdlp(),
        _ => install_hint_ffmpeg(),
    };

    match (&tool.version, tool.installed) {
        (Some(version), true) => {
            let display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version.clone()
            };
            CheckResult::ok(&tool.name, &display)
        }
        _ => CheckResult::error(&tool.name, "not found or not working", hint),
    }
}

fn check_api_key(value: Option<String>) -> CheckResult {
    match value {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            let head: String = key.chars().take(7).collect();
            let tail: String = key.chars().skip(key.chars().count() - 4).collect();
            CheckResult::ok(API_KEY_ENV, &format!("configured ({}...{})", head, tail))
        }
        Some(key) if key.is_empty() => CheckResult::error(
            API_KEY_ENV,
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            API_KEY_ENV,
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            API_KEY_ENV,
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let work_dir = settings.work_dir();
    if work_dir.is_dir() {
        results.push(CheckResult::ok("Working directory", &work_dir.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Working directory",
            &format!("{} (will be created)", work_dir.display()),
            "Directory will be created on first run",
        ));
    }

    let videos_dir = settings.videos_dir();
    match list_available_videos(&videos_dir) {
        Ok(videos) if videos_dir.is_dir() => {
            let total: u64 = videos.iter().map(|v| v.size_bytes).sum();
            results.push(CheckResult::ok(
                "Videos",
                &format!(
                    "{} ({} video(s), {})",
                    videos_dir.display(),
                    videos.len(),
                    format_size(total)
                ),
            ));
        }
        Ok(_) => results.push(CheckResult::warning(
            "Videos",
            &format!("{} (not created yet)", videos_dir.display()),
            "Downloads land here on the first run",
        )),
        Err(e) => results.push(CheckResult::error(
            "Videos",
            &format!("{}: {}", videos_dir.display(), e),
            "Check the directory permissions",
        )),
    }

    results
}

fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override models and tool settings", config_path.display()),
        )
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}
