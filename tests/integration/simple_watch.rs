//! Simple-mode watching: one directory, one expected total.

use pagewatch::fs::EntryKind;
use pagewatch::stop::StopSignal;
use pagewatch::watcher::{watch_directory, WatchOptions};
use pagewatch::MonitorError;
use std::fs;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, timeout};

fn fast_options() -> WatchOptions {
    WatchOptions {
        count: EntryKind::All,
        poll_interval: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_progress_from_missing_directory_to_complete() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out").join("pages");

    let progress = Mutex::new(Vec::new());
    let completions = Mutex::new(0);
    let stop = StopSignal::never();

    let watch = timeout(
        Duration::from_secs(10),
        watch_directory(
            out.clone(),
            5,
            fast_options(),
            |percent| progress.lock().unwrap().push(percent),
            || *completions.lock().unwrap() += 1,
            &stop,
        ),
    );

    let build = async {
        sleep(Duration::from_millis(50)).await;
        fs::create_dir_all(&out).unwrap();
        sleep(Duration::from_millis(200)).await;

        for name in ["a.html", "b.html", "c.html"] {
            fs::write(out.join(name), "").unwrap();
        }
        sleep(Duration::from_millis(300)).await;
        assert_eq!(progress.lock().unwrap().last(), Some(&60));

        for name in ["d.html", "e.html"] {
            fs::write(out.join(name), "").unwrap();
        }
    };

    let (result, ()) = tokio::join!(watch, build);
    result.expect("watch timed out").unwrap();

    // Additions after completion reach nobody
    fs::write(out.join("f.html"), "").unwrap();
    sleep(Duration::from_millis(100)).await;

    let progress = progress.into_inner().unwrap();
    assert_eq!(progress.last(), Some(&100));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert!(progress.iter().all(|p| *p <= 100));
    assert_eq!(completions.into_inner().unwrap(), 1);
}

#[tokio::test]
async fn test_already_complete_reports_only_completion() {
    let temp = TempDir::new().unwrap();
    for name in ["one.html", "two.html"] {
        fs::write(temp.path().join(name), "").unwrap();
    }

    let progress = Mutex::new(Vec::new());
    let completions = Mutex::new(0);

    watch_directory(
        temp.path(),
        2,
        fast_options(),
        |percent| progress.lock().unwrap().push(percent),
        || *completions.lock().unwrap() += 1,
        &StopSignal::never(),
    )
    .await
    .unwrap();

    assert!(progress.into_inner().unwrap().is_empty());
    assert_eq!(completions.into_inner().unwrap(), 1);
}

#[tokio::test]
async fn test_counting_files_only() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("assets")).unwrap();
    fs::write(temp.path().join("index.html"), "").unwrap();

    let completions = Mutex::new(0);
    let options = WatchOptions {
        count: EntryKind::Files,
        ..fast_options()
    };

    watch_directory(
        temp.path(),
        1,
        options,
        |_| {},
        || *completions.lock().unwrap() += 1,
        &StopSignal::never(),
    )
    .await
    .unwrap();

    assert_eq!(completions.into_inner().unwrap(), 1);
}

#[tokio::test]
async fn test_missing_directory_stops_at_deadline() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("never-built");
    let stop = StopSignal::never().with_timeout(Duration::from_millis(100));

    let result = watch_directory(out.clone(), 3, fast_options(), |_| {}, || {}, &stop).await;

    match result {
        Err(MonitorError::Stopped(path)) => assert_eq!(path, out),
        other => panic!("expected Stopped, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancel_while_watching() {
    let temp = TempDir::new().unwrap();
    let (handle, stop) = StopSignal::cancellable();
    let completions = Mutex::new(0);

    let watch = watch_directory(
        temp.path(),
        10,
        fast_options(),
        |_| {},
        || *completions.lock().unwrap() += 1,
        &stop,
    );
    let cancel = async {
        sleep(Duration::from_millis(100)).await;
        handle.stop();
    };

    let (result, ()) = tokio::join!(watch, cancel);

    assert!(matches!(result, Err(MonitorError::Stopped(_))));
    assert_eq!(completions.into_inner().unwrap(), 0);
}
