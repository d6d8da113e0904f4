//! Per-directory watching driven by a resolved watch list.

use pagewatch::fs::{resolve_watch_list, EntryKind, DEFAULT_STRIP_LEADING};
use pagewatch::stop::StopSignal;
use pagewatch::watcher::{WatchOptions, WatchSpec, WatchUpdate, Watcher};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

fn fast_options() -> WatchOptions {
    WatchOptions {
        count: EntryKind::All,
        poll_interval: Duration::from_millis(10),
    }
}

/// Read updates until one matches, failing after a couple of seconds.
async fn expect_update(watcher: &mut Watcher, wanted: WatchUpdate) {
    let found = timeout(Duration::from_secs(5), async {
        while let Some(update) = watcher.next_update().await {
            if update == wanted {
                return true;
            }
        }
        false
    })
    .await;

    assert_eq!(found, Ok(true), "never received {wanted:?}");
}

fn count(dir: &str, count: usize) -> WatchUpdate {
    WatchUpdate::DirectoryCount {
        dir: dir.to_string(),
        count,
    }
}

#[tokio::test]
async fn test_counts_reported_per_directory() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("blog")).unwrap();
    fs::create_dir_all(root.path().join("docs")).unwrap();

    let pages = [
        "../../pages/blog/first.md",
        "../../pages/blog/second.md",
        "../../pages/docs/intro.md",
    ];
    let list = resolve_watch_list(root.path(), &pages, DEFAULT_STRIP_LEADING);
    assert_eq!(list.labels(), vec!["/blog", "/docs"]);

    let spec = WatchSpec::PerDirectory(list);
    let mut watcher = Watcher::start(spec, fast_options(), &StopSignal::never())
        .await
        .unwrap();
    assert!(watcher.is_watching());

    fs::create_dir(root.path().join("blog").join("first")).unwrap();
    expect_update(&mut watcher, count("/blog", 1)).await;

    fs::create_dir(root.path().join("docs").join("intro")).unwrap();
    expect_update(&mut watcher, count("/docs", 1)).await;

    fs::create_dir(root.path().join("blog").join("second")).unwrap();
    expect_update(&mut watcher, count("/blog", 2)).await;

    watcher.close();
    assert!(!watcher.is_watching());
    assert_eq!(watcher.next_update().await, None);
}

#[tokio::test]
async fn test_pending_directory_attached_when_created() {
    let root = TempDir::new().unwrap();

    let pages = ["../../pages/index.md", "../../pages/reports/q1.md"];
    let list = resolve_watch_list(root.path(), &pages, DEFAULT_STRIP_LEADING);
    assert_eq!(list.labels(), vec!["/"]);
    assert_eq!(list.pending.len(), 1);

    let spec = WatchSpec::PerDirectory(list);
    let mut watcher = Watcher::start(spec, fast_options(), &StopSignal::never())
        .await
        .unwrap();

    fs::create_dir(root.path().join("reports")).unwrap();
    expect_update(&mut watcher, count("/", 1)).await;
    expect_update(&mut watcher, count("/reports", 0)).await;

    fs::create_dir(root.path().join("reports").join("q1")).unwrap();
    expect_update(&mut watcher, count("/reports", 1)).await;
}

#[tokio::test]
async fn test_nested_creation_is_not_observed() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("blog").join("first")).unwrap();

    let list = resolve_watch_list(
        root.path(),
        &["../../pages/blog/first.md"],
        DEFAULT_STRIP_LEADING,
    );
    let spec = WatchSpec::PerDirectory(list);
    let mut watcher = Watcher::start(spec, fast_options(), &StopSignal::never())
        .await
        .unwrap();

    // Two levels below the watched directory
    fs::create_dir(root.path().join("blog").join("first").join("assets")).unwrap();
    let nested = timeout(Duration::from_millis(300), watcher.next_update()).await;
    assert!(nested.is_err(), "unexpected update {nested:?}");

    fs::create_dir(root.path().join("blog").join("second")).unwrap();
    expect_update(&mut watcher, count("/blog", 2)).await;
}
