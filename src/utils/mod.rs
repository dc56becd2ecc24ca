use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::config::ToolPaths;

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f = bytes as f64;
    let unit_index = (bytes_f.log10() / THRESHOLD.log10()).floor() as usize;
    let unit_index = unit_index.min(UNITS.len() - 1);

    let size = bytes_f / THRESHOLD.powi(unit_index as i32);

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Size of a file on disk, or "unknown size"
pub fn file_size_of(path: &Path) -> String {
    fs_err::metadata(path)
        .map(|meta| format_file_size(meta.len()))
        .unwrap_or_else(|_| "unknown size".to_string())
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Spinner for a long external step; hidden when progress output is off
pub fn spinner(message: impl Into<String>, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    let template = "{spinner:.green} [{elapsed_precise}] {msg}";
    if let Ok(style) = ProgressStyle::default_spinner().template(template) {
        progress.set_style(style);
    }
    progress.set_message(message.into());
    progress.enable_steady_tick(Duration::from_millis(120));
    progress
}

/// Check that the external tools respond; returns a warning per missing tool
pub async fn check_dependencies(tools: &ToolPaths, with_separation: bool) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(&tools.yt_dlp).await {
        missing.push(format!("{} - required to download audio", tools.yt_dlp));
    }

    if !check_command_available(&tools.ffmpeg).await {
        missing.push(format!("{} - required for audio extraction and transcoding", tools.ffmpeg));
    }

    if with_separation && !check_command_available(&tools.demucs).await {
        missing.push(format!(
            "{} - required for vocal separation (or pass --no-vocals)",
            tools.demucs
        ));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(if command.ends_with("ffmpeg") { "-version" } else { "--version" })
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1024), "1.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1048576), "1.0 MB");
    }

    #[test]
    fn test_file_size_of() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs_err::write(&path, vec![0u8; 2048]).unwrap();
        assert_eq!(file_size_of(&path), "2.0 KB");
        assert_eq!(file_size_of(&dir.path().join("missing")), "unknown size");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.0), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
    }

    #[tokio::test]
    async fn test_check_dependencies_reports_missing_tools() {
        let tools = ToolPaths {
            yt_dlp: "/nonexistent/yt-dlp".to_string(),
            demucs: "/nonexistent/demucs".to_string(),
            ffmpeg: "/nonexistent/ffmpeg".to_string(),
            python: "/nonexistent/python".to_string(),
        };

        assert_eq!(check_dependencies(&tools, false).await.len(), 2);
        assert_eq!(check_dependencies(&tools, true).await.len(), 3);
    }
}
