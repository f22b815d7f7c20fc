//! `sdm download` – fetch one URL with a live progress line.

use anyhow::{Context, Result};
use sdm_core::config::SdmConfig;
use sdm_core::transfer::{self, Progress, ProgressStats, TransferMode, TransferRequest};
use sdm_core::url_model::derive_filename;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::format::{format_bytes, format_duration, format_speed};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

pub async fn run_download(
    cfg: &SdmConfig,
    url: &str,
    output: Option<&Path>,
    workers: usize,
) -> Result<()> {
    let destination = resolve_output(url, output);
    let request = TransferRequest {
        url: url.to_string(),
        destination,
        workers,
    };
    tracing::info!(url, path = %request.destination.display(), workers, "download requested");

    let progress = Progress::new();
    let printer = {
        let progress = progress.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
            let mut announced = false;
            loop {
                ticker.tick().await;
                let stats = progress.snapshot();
                if !announced {
                    if let Some(mode) = stats.mode {
                        for line in plan_lines(stats.total_bytes, mode) {
                            println!("{}", line);
                        }
                        announced = true;
                    }
                }
                if stats.state.is_terminal() {
                    break;
                }
                if !announced {
                    continue;
                }
                print!("\r{}", progress_line(&stats));
                let _ = std::io::stdout().flush();
            }
        })
    };

    let result = transfer::download(&request, cfg, &progress).await;
    let _ = printer.await;
    println!();

    let report =
        result.with_context(|| format!("download {} failed", request.destination.display()))?;

    let secs = report.elapsed.as_secs_f64();
    let speed = if secs > 0.0 {
        report.bytes_written as f64 / secs
    } else {
        0.0
    };
    println!("Download completed successfully!");
    println!("Saved to: {}", report.spec.destination.display());
    println!("Downloaded in: {}", format_duration(report.elapsed));
    println!("Average speed: {}/s", format_speed(speed));
    Ok(())
}

/// Destination path: explicit file, directory + derived name, or derived name in cwd.
pub(crate) fn resolve_output(url: &str, output: Option<&Path>) -> PathBuf {
    match output {
        Some(p) if p.is_dir() => p.join(derive_filename(url)),
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(derive_filename(url)),
    }
}

/// Printed once, as soon as the transfer knows how it will fetch the body.
fn plan_lines(total: Option<u64>, mode: TransferMode) -> Vec<String> {
    let mut lines = Vec::with_capacity(2);
    if let Some(total) = total {
        lines.push(format!("File size: {} bytes", total));
    }
    lines.push(match mode {
        TransferMode::Ranged { chunks: 1 } => "Using 1 worker...".to_string(),
        TransferMode::Ranged { chunks } => format!("Using {} workers...", chunks),
        TransferMode::SingleStream => {
            "Server does not support partial downloads, falling back to a single stream..."
                .to_string()
        }
    });
    lines
}

fn progress_line(stats: &ProgressStats) -> String {
    let rate = format_speed(stats.bytes_per_sec());
    match (stats.total_bytes, stats.fraction()) {
        (Some(total), Some(frac)) => {
            let eta = stats
                .eta_secs()
                .map(|s| format!("{:.0}s", s))
                .unwrap_or_else(|| "?".to_string());
            format!(
                "  {} / {} ({:.1}%)  {}/s  ETA {}  ",
                format_bytes(stats.bytes_done),
                format_bytes(total),
                frac * 100.0,
                rate,
                eta
            )
        }
        _ => format!("  {}  {}/s  ", format_bytes(stats.bytes_done), rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdm_core::transfer::TransferState;

    #[test]
    fn output_defaults_to_derived_name() {
        assert_eq!(
            resolve_output("https://example.com/a/file.iso", None),
            PathBuf::from("file.iso")
        );
        assert_eq!(
            resolve_output("https://example.com/get?filename=x.tar", None),
            PathBuf::from("x.tar")
        );
    }

    #[test]
    fn output_directory_gets_derived_name() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_output("https://example.com/file.iso", Some(dir.path())),
            dir.path().join("file.iso")
        );
    }

    #[test]
    fn explicit_output_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("custom.bin");
        assert_eq!(
            resolve_output("https://example.com/file.iso", Some(&target)),
            target
        );
    }

    #[test]
    fn progress_line_with_and_without_total() {
        let known = ProgressStats {
            bytes_done: 512,
            total_bytes: Some(1024),
            elapsed_secs: 1.0,
            state: TransferState::RangedExecuting,
            mode: Some(TransferMode::Ranged { chunks: 4 }),
        };
        let line = progress_line(&known);
        assert!(line.contains("50.0%"), "{line}");
        assert!(line.contains("ETA 1s"), "{line}");

        let unknown = ProgressStats {
            total_bytes: None,
            ..known
        };
        assert!(!progress_line(&unknown).contains('%'));
    }

    #[test]
    fn plan_is_announced_with_size_and_workers() {
        assert_eq!(
            plan_lines(Some(10_485_760), TransferMode::Ranged { chunks: 4 }),
            vec!["File size: 10485760 bytes", "Using 4 workers..."]
        );
        assert_eq!(
            plan_lines(Some(3), TransferMode::Ranged { chunks: 1 }),
            vec!["File size: 3 bytes", "Using 1 worker..."]
        );
        let fallback = plan_lines(None, TransferMode::SingleStream);
        assert_eq!(fallback.len(), 1);
        assert!(fallback[0].contains("single stream"));
    }
}
