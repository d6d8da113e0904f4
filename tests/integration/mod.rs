//! Integration tests for pagewatch
//!
//! These exercise the watchers against a real filesystem, the worker link
//! over an in-memory pipe, and a full session with a real worker process.

mod directory_watch;
mod simple_watch;
mod worker_protocol;
mod worker_session;
