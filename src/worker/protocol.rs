//! Message vocabulary between the monitor and the terminal worker.
//!
//! Messages are JSON objects tagged by `type`, one per line:
//!
//! ```text
//! {"type":"childReady"}                                  worker -> monitor
//! {"type":"config","configArray":["/a","/b"," ","Quit"]} monitor -> worker
//! {"type":"dataFromParent","count":4,"dir":"/a"}         monitor -> worker
//! {"type":"<anything else>","result":...}                worker -> monitor
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

use crate::error::MonitorError;

/// Environment variable carrying the IPC socket path to the worker.
pub const SOCKET_ENV: &str = "PAGEWATCH_IPC_SOCKET";

/// Menu entry separating directory labels from actions.
pub const MENU_SEPARATOR: &str = " ";

/// Menu action that ends the worker session.
pub const MENU_QUIT: &str = "Quit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    ChildReady,
    Config {
        #[serde(rename = "configArray")]
        config_array: Vec<String>,
    },
    DataFromParent {
        count: usize,
        dir: String,
    },
    /// Informational report from the worker.
    Log {
        #[serde(default)]
        result: Value,
    },
}

/// A message received from the worker, as far as the monitor cares.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    ChildReady,
    /// Any other message type; logged and otherwise ignored.
    Info { kind: String, result: Value },
}

/// Build the worker's menu: directory labels, then a separator and "Quit".
pub fn menu_entries(labels: &[String]) -> Vec<String> {
    let mut entries = labels.to_vec();
    entries.push(MENU_SEPARATOR.to_string());
    entries.push(MENU_QUIT.to_string());
    entries
}

/// Decode one line from the worker.
///
/// Unknown message types are not errors; only lines that are not JSON
/// objects with a string `type` are protocol violations.
pub fn decode_inbound(line: &str) -> Result<Inbound, MonitorError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| MonitorError::ProtocolViolation(format!("invalid JSON ({e}): {line}")))?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| MonitorError::ProtocolViolation(format!("missing message type: {line}")))?;

    if kind == "childReady" {
        return Ok(Inbound::ChildReady);
    }

    Ok(Inbound::Info {
        kind: kind.to_string(),
        result: value.get("result").cloned().unwrap_or(Value::Null),
    })
}

/// Writes newline-delimited messages.
pub struct MessageWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub async fn send(&mut self, message: &Message) -> io::Result<()> {
        let mut line = serde_json::to_string(message).map_err(io::Error::other)?;
        line.push('\n');
        self.inner.write_all(line.as_bytes()).await?;
        self.inner.flush().await
    }
}

/// Reads newline-delimited messages. Cancel safe.
pub struct MessageReader<R> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            lines: BufReader::new(inner).lines(),
        }
    }

    /// Next non-blank line, or `None` at end of stream.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            match self.lines.next_line().await? {
                Some(line) if line.trim().is_empty() => continue,
                other => return Ok(other),
            }
        }
    }
}
