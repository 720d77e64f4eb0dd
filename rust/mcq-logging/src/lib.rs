//! mcq-logging: NDJSON events, config hashing and atomic JSON state files.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Event schema version.
pub const EVENT_SCHEMA_VERSION: u32 = 1;

pub fn now_ms() -> u64 {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    d.as_millis() as u64
}

pub fn hash_config_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// `MCQ_DEBUG_LOG=1` echoes every event to stderr.
pub fn debug_enabled() -> bool {
    static ON: OnceLock<bool> = OnceLock::new();
    *ON.get_or_init(|| matches!(std::env::var("MCQ_DEBUG_LOG").as_deref(), Ok("1" | "true" | "yes")))
}

#[derive(Debug, Error)]
pub enum NdjsonError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a JSON document.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, NdjsonError> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice::<T>(&bytes)?)
}

/// Write a JSON document via a temp file + rename, so readers never see a partial file.
pub fn write_json_atomic<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), NdjsonError> {
    let path = path.as_ref();
    let tmp = path.with_extension("json.tmp");
    let bytes = serde_json::to_vec_pretty(value)?;
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Versioning block stamped on every event.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfoV1 {
    pub schema_version: u32,
    pub engine_version: &'static str,
    pub config_hash: Option<String>,
}

impl VersionInfoV1 {
    pub fn new(engine_version: &'static str, config_hash: Option<String>) -> Self {
        Self {
            schema_version: EVENT_SCHEMA_VERSION,
            engine_version,
            config_hash,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PartitionSizesV1 {
    pub head: u32,
    pub eligible: u32,
    pub islands: u32,
    pub tail: u32,
}

/// One render of a question instance. Never carries original ids.
#[derive(Debug, Clone, Serialize)]
pub struct RenderEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub v: VersionInfoV1,

    pub seed: String,
    pub n_choices: u32,
    pub partition: PartitionSizesV1,

    /// True when the layout came from a restored state instead of a fresh computation.
    pub cached: bool,
    pub masked: bool,
}

/// One submission resolved back to original ids.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveEventV1 {
    pub event: &'static str,
    pub ts_ms: u64,
    pub v: VersionInfoV1,

    pub n_tokens: u32,
    pub ok: bool,
    /// Error kind on failure ("unknown_token" / "unknown_id").
    pub error: Option<&'static str>,
}

/// Append-only NDJSON writer.
///
/// Contract: each call writes exactly one JSON object followed by a newline.
pub struct NdjsonWriter {
    w: BufWriter<File>,
    lines_since_flush: u64,
    flush_every_lines: u64,
}

impl NdjsonWriter {
    /// Open a file for append. Creates it if it doesn't exist.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, NdjsonError> {
        Self::open_append_with_flush(path, 0)
    }

    /// `flush_every_lines=0` disables periodic flushing.
    pub fn open_append_with_flush(
        path: impl AsRef<Path>,
        flush_every_lines: u64,
    ) -> Result<Self, NdjsonError> {
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            w: BufWriter::new(f),
            lines_since_flush: 0,
            flush_every_lines,
        })
    }

    pub fn write_event<T: Serialize>(&mut self, event: &T) -> Result<(), NdjsonError> {
        let mut buf = serde_json::to_vec(event)?;
        buf.push(b'\n');
        self.w.write_all(&buf)?;
        self.lines_since_flush += 1;
        if self.flush_every_lines > 0 && self.lines_since_flush >= self.flush_every_lines {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), NdjsonError> {
        self.w.flush()?;
        self.lines_since_flush = 0;
        Ok(())
    }
}

/// Optional event sink: an NDJSON file, a stderr echo, both, or neither.
#[derive(Default)]
pub struct EventLog {
    writer: Option<NdjsonWriter>,
    echo: bool,
}

impl EventLog {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn open(path: Option<&Path>, flush_every_lines: u64) -> Result<Self, NdjsonError> {
        let writer = match path {
            Some(p) => Some(NdjsonWriter::open_append_with_flush(p, flush_every_lines)?),
            None => None,
        };
        Ok(Self {
            writer,
            echo: debug_enabled(),
        })
    }

    pub fn is_active(&self) -> bool {
        self.writer.is_some() || self.echo
    }

    pub fn emit<T: Serialize>(&mut self, event: &T) -> Result<(), NdjsonError> {
        if self.echo {
            eprintln!("{}", serde_json::to_string(event)?);
        }
        if let Some(w) = self.writer.as_mut() {
            w.write_event(event)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), NdjsonError> {
        match self.writer.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use serde::Deserialize;
    use serde_json::Value;

    fn read_ndjson_lenient(path: &Path) -> Vec<Value> {
        let s = fs::read_to_string(path).expect("read");
        let mut out = Vec::new();
        for line in s.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(v) = serde_json::from_str::<Value>(line) {
                out.push(v);
            }
        }
        out
    }

    fn render_event(cached: bool) -> RenderEventV1 {
        RenderEventV1 {
            event: "render",
            ts_ms: now_ms(),
            v: VersionInfoV1::new("0.0.0", Some(hash_config_bytes(b"{}"))),
            seed: "341".to_string(),
            n_choices: 4,
            partition: PartitionSizesV1 {
                head: 0,
                eligible: 4,
                islands: 0,
                tail: 0,
            },
            cached,
            masked: true,
        }
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn writes_one_valid_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        let mut w = NdjsonWriter::open_append(&path).unwrap();

        w.write_event(&render_event(false)).unwrap();
        w.write_event(&render_event(true)).unwrap();
        w.flush().unwrap();

        let vals = read_ndjson_lenient(&path);
        assert_eq!(vals.len(), 2);
        assert_eq!(vals[0]["event"], "render");
        assert_eq!(vals[0]["cached"], false);
        assert_eq!(vals[1]["cached"], true);
        assert_eq!(vals[1]["partition"]["eligible"], 4);
        assert_eq!(vals[1]["v"]["schema_version"], EVENT_SCHEMA_VERSION);
    }

    #[test]
    fn periodic_flush_makes_lines_visible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        let mut w = NdjsonWriter::open_append_with_flush(&path, 1).unwrap();
        w.write_event(&render_event(false)).unwrap();
        // No explicit flush: flush_every_lines=1 already pushed it out.
        assert_eq!(read_ndjson_lenient(&path).len(), 1);
    }

    #[test]
    fn lenient_reader_tolerates_trailing_partial_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");

        {
            let mut w = NdjsonWriter::open_append(&path).unwrap();
            w.write_event(&render_event(false)).unwrap();
            w.flush().unwrap();
        }

        // Simulate crash: append a partial JSON line (no newline, invalid JSON).
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(br#"{"event":"resolve","n_tokens":"#).unwrap();
        f.flush().unwrap();

        let vals = read_ndjson_lenient(&path);
        assert_eq!(vals.len(), 1);
        assert_eq!(vals[0]["event"], "render");
    }

    #[test]
    fn event_log_without_path_writes_nothing() {
        let mut log = EventLog::disabled();
        assert!(!log.is_active());
        log.emit(&render_event(false)).unwrap();
        log.flush().unwrap();
    }

    #[test]
    fn event_log_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        for _ in 0..2 {
            let mut log = EventLog::open(Some(path.as_path()), 0).unwrap();
            log.emit(&ResolveEventV1 {
                event: "resolve",
                ts_ms: now_ms(),
                v: VersionInfoV1::new("0.0.0", None),
                n_tokens: 2,
                ok: false,
                error: Some("unknown_token"),
            })
            .unwrap();
            log.flush().unwrap();
        }
        let vals = read_ndjson_lenient(&path);
        assert_eq!(vals.len(), 2);
        assert_eq!(vals[1]["error"], "unknown_token");
    }

    #[test]
    fn config_hash_is_stable_hex() {
        let a = hash_config_bytes(b"masking: {}");
        assert_eq!(a, hash_config_bytes(b"masking: {}"));
        assert_ne!(a, hash_config_bytes(b"masking: {token_prefix: x}"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn json_write_is_atomic_wrt_tmp_file() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct State {
            seed: i64,
            layout: Vec<usize>,
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut s = State {
            seed: 0,
            layout: vec![1, 0, 2, 3],
        };
        write_json_atomic(&path, &s).unwrap();

        // Simulate crash leaving a corrupt tmp file around; state.json must remain readable.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, b"{not valid json").unwrap();

        let got: State = read_json(&path).unwrap();
        assert_eq!(got, s);

        // Update and ensure it overwrites cleanly.
        s.layout = vec![3, 0, 1, 2];
        write_json_atomic(&path, &s).unwrap();
        let got2: State = read_json(&path).unwrap();
        assert_eq!(got2.layout, vec![3, 0, 1, 2]);
    }
}
