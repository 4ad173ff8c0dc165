//! Append-only transcript (§3, §4.I, §5): `append(session_id, message)`.
//!
//! Each session gets a `<session_id>.jsonl` file; every `TranscriptEntry` is
//! appended as one JSON line, in turn-completion order (§5's ordering
//! guarantee), never rewritten.

use std::path::{Path, PathBuf};

use convo_domain::{Error, Result, TranscriptEntry};

pub struct TranscriptWriter {
    base_dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(base_dir: &Path) -> Self {
        Self { base_dir: base_dir.to_path_buf() }
    }

    /// Append one or more entries to a session's transcript.
    pub fn append(&self, session_id: &str, entries: &[TranscriptEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.base_dir).map_err(Error::Io)?;
        let path = self.base_dir.join(format!("{session_id}.jsonl"));
        let mut buf = String::new();
        for entry in entries {
            let json = serde_json::to_string(entry)
                .map_err(|e| Error::Persist(format!("serializing transcript entry: {e}")))?;
            buf.push_str(&json);
            buf.push('\n');
        }

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(Error::Io)?;
        file.write_all(buf.as_bytes()).map_err(Error::Io)?;

        tracing::debug!(session_id, entries = entries.len(), "transcript appended");

        Ok(())
    }

    /// Read back a transcript (for the CLI harness and tests).
    pub fn read(&self, session_id: &str) -> Result<Vec<TranscriptEntry>> {
        let path = self.base_dir.join(format!("{session_id}.jsonl"));
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
        let mut entries = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TranscriptEntry>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(session_id, error = %e, "skipping malformed transcript line");
                }
            }
        }
        Ok(entries)
    }
}
