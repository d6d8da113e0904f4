//! Filesystem helpers used by the watchers: counting, waiting and watch-list resolution.

pub mod counter;
pub mod pages;
pub mod wait;
pub mod watch_list;

pub use counter::{count_entries, EntryKind};
pub use pages::{discover_pages, expected_page_count};
pub use wait::{wait_for_existence, DEFAULT_POLL_INTERVAL};
pub use watch_list::{resolve_watch_list, WatchDir, WatchList, DEFAULT_STRIP_LEADING};
