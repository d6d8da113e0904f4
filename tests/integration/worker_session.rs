//! A complete worker session against a real child process.
//!
//! The worker is this test binary re-run with `--exact` on
//! [`scripted_worker`], which only acts when the socket variable is set.

use pagewatch::config::MonitorConfig;
use pagewatch::logging::LogSink;
use pagewatch::monitor::{run_with_worker, SessionOutcome};
use pagewatch::stop::StopSignal;
use pagewatch::worker::{Message, SOCKET_ENV};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;

/// Written by the scripted worker next to the socket.
const TRANSCRIPT: &str = "transcript.jsonl";

/// Stand-in worker: announce readiness, record two messages, then quit.
#[test]
fn scripted_worker() {
    let Ok(socket) = std::env::var(SOCKET_ENV) else {
        return;
    };
    let mut stream = UnixStream::connect(&socket).unwrap();
    stream.write_all(b"{\"type\":\"childReady\"}\n").unwrap();

    let mut lines = BufReader::new(stream.try_clone().unwrap()).lines();
    let received: Vec<String> = (0..2).map(|_| lines.next().unwrap().unwrap()).collect();
    fs::write(Path::new(&socket).with_file_name(TRANSCRIPT), received.join("\n")).unwrap();

    stream
        .write_all(b"{\"type\":\"log\",\"result\":\"quit\"}\n")
        .unwrap();
}

#[tokio::test]
async fn test_session_with_real_worker() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    fs::create_dir_all(out.join("blog")).unwrap();

    let config = MonitorConfig {
        output_dir: out.clone(),
        poll_interval_ms: 10,
        worker_path: Some(std::env::current_exe().unwrap()),
        worker_args: vec![
            "--exact".to_string(),
            "worker_session::scripted_worker".to_string(),
        ],
        log_dir: temp.path().join("logs"),
        ..MonitorConfig::default()
    };
    let sink = LogSink::new();
    let stop = StopSignal::never().with_timeout(Duration::from_secs(20));
    let pages = vec![PathBuf::from("../../pages/blog/first.md")];

    let session = run_with_worker(&config, &pages, &sink, &stop);
    let build = async {
        sleep(Duration::from_millis(300)).await;
        fs::create_dir(out.join("blog").join("first")).unwrap();
    };
    let (outcome, ()) = tokio::join!(session, build);

    assert_eq!(outcome.unwrap(), SessionOutcome::WorkerExited);
    assert!(!sink.is_redirected());
    assert!(config.log_path().exists());
    let socket = config
        .log_dir
        .join(format!("worker-{}.sock", std::process::id()));
    assert!(!socket.exists());

    let transcript = fs::read_to_string(config.log_dir.join(TRANSCRIPT)).unwrap();
    let messages: Vec<Message> = transcript
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(
        messages,
        vec![
            Message::Config {
                config_array: vec!["/blog".into(), " ".into(), "Quit".into()],
            },
            Message::DataFromParent {
                count: 1,
                dir: "/blog".into(),
            },
        ]
    );
}
