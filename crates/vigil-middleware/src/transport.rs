//! [`Transport`] – the publish collaborator.
//!
//! The publisher thread hands every unconsumed result, wrapped in an
//! [`Event`], to exactly one `Transport::send` call.  Serialization, retry
//! and delivery are the transport's business.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;

use vigil_types::{Event, NodeError};

/// Sends events off the node.
pub trait Transport: Send {
    /// Short name used in logs, e.g. `"jsonl:stdout"`.
    fn name(&self) -> &str;

    /// Deliver one event.
    ///
    /// # Errors
    ///
    /// [`NodeError::Transport`] when the event could not be delivered.
    fn send(&mut self, event: &Event) -> Result<(), NodeError>;
}

/// Writes one JSON object per line and flushes after every event.
///
/// Each line reaches the writer in a single `write_all`, so several
/// transports sharing stdout (whose `write_all` holds the stdout lock) never
/// interleave inside a line.
pub struct JsonLinesTransport<W: Write + Send> {
    name: String,
    writer: W,
}

impl<W: Write + Send> JsonLinesTransport<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesTransport<Stdout> {
    pub fn stdout() -> Self {
        Self::new("jsonl:stdout", io::stdout())
    }
}

impl JsonLinesTransport<BufWriter<File>> {
    /// Append to `path`, creating it if needed.
    pub fn append_to(path: &Path) -> Result<Self, NodeError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                NodeError::Transport(format!("failed to open {}: {e}", path.display()))
            })?;
        Ok(Self::new(
            format!("jsonl:{}", path.display()),
            BufWriter::new(file),
        ))
    }
}

impl<W: Write + Send> Transport for JsonLinesTransport<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, event: &Event) -> Result<(), NodeError> {
        let mut line = serde_json::to_vec(event)
            .map_err(|e| NodeError::Transport(format!("serialization failed: {e}")))?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .and_then(|()| self.writer.flush())
            .map_err(|e| NodeError::Transport(format!("{}: {e}", self.name)))
    }
}
