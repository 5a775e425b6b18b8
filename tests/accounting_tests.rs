// Accounting source tests: tool resolution, bounded wait, fail-soft parsing.
// /bin/sh stands in for the traffic tool.

#![cfg(unix)]

use netspeed::accounting::{AccountingSource, NettopSource, parse_report};
use netspeed::error::SourceError;
use std::path::PathBuf;
use std::time::Duration;

fn sh(script: &str, timeout: Duration) -> NettopSource {
    NettopSource::new(
        vec![PathBuf::from("/nonexistent/nettop"), PathBuf::from("/bin/sh")],
        vec!["-c".to_string(), script.to_string()],
        timeout,
    )
}

#[test]
fn first_existing_candidate_wins() {
    let src = sh("true", Duration::from_secs(1));
    assert_eq!(src.resolve_binary(), Some(PathBuf::from("/bin/sh").as_path()));
}

#[tokio::test]
async fn parses_tool_report() {
    let src = sh(
        "printf 'time,,bytes_in,bytes_out,\\n10:00:00.1,curl.42,1500,20,\\n10:00:00.1,garbage\\n10:00:00.1,com.apple.Safari.7,9,1,\\n'",
        Duration::from_secs(5),
    );
    let records = src.snapshot().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].pid, 42);
    assert_eq!(records[0].rx_bytes, 1500);
    assert_eq!(records[0].tx_bytes, 20);
    assert_eq!(records[1].name, "com.apple.Safari");
}

#[tokio::test]
async fn missing_binary_is_unavailable() {
    let src = NettopSource::new(
        vec![PathBuf::from("/nonexistent/nettop")],
        vec![],
        Duration::from_secs(1),
    );
    assert!(matches!(
        src.snapshot().await,
        Err(SourceError::SourceUnavailable(_))
    ));
    assert!(src.snapshot_or_empty().await.is_empty());
}

#[tokio::test]
async fn nonzero_exit_without_output_is_unavailable() {
    let src = sh("exit 3", Duration::from_secs(5));
    assert!(src.snapshot().await.is_err());
}

#[tokio::test]
async fn nonzero_exit_with_output_is_still_parsed() {
    let src = sh("echo 't,app.5,1,2,'; exit 1", Duration::from_secs(5));
    let records = src.snapshot().await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn slow_tool_hits_bounded_wait() {
    let src = sh("sleep 5", Duration::from_millis(100));
    let started = std::time::Instant::now();
    let err = src.snapshot().await.unwrap_err();
    assert!(err.to_string().contains("did not exit"));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn empty_report_yields_no_records() {
    assert!(parse_report("").is_empty());
    assert!(parse_report("time,,bytes_in,bytes_out,\n").is_empty());
}
