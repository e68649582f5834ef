use std::env;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use chrono::Utc;
use clap::crate_version;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use super::queue::WriteQueue;
use super::RecordEngine;
use crate::error::{Result, StoreError};
use crate::record::{set_field, Fields, NewRecord, Record};

// one writer per document, so every store opened on the same path in this process shares it
static WRITERS: Lazy<DashMap<PathBuf, Weak<WriteQueue>>> = Lazy::new(DashMap::new);

/// The record store, backed by one JSON document on the local file system.
///
/// The document is the only source of truth. Nothing is cached, every operation reads the
/// whole document, and every mutation rewrites it in full. The path of the document is given
/// when creating the store; the file (and its directory) is created on the first write.
///
/// Records are kept as the raw JSON objects found in the document. A mutation only touches the
/// members it sets, every other record and member is written back as it was read.
///
/// Mutations are serialized through a single writer thread per document. Clones of a store,
/// and every store opened on the same path within this process, share that writer, so
/// concurrent `append` and `patch_field` calls never lose each other's updates. Writers in
/// other processes are not coordinated with. The document is replaced with an atomic rename,
/// so a concurrent [`read`](RecordEngine::read) never sees a half written file.
#[derive(Clone, Debug)]
pub struct JsonStore {
    // path to the JSON document
    path: Arc<PathBuf>,

    // every read-modify-write cycle on this document runs on this queue
    writer: Arc<WriteQueue>,
}

impl JsonStore {
    /// creates a [`JsonStore`] using the document at `path`. The document does not need to
    /// exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<JsonStore> {
        let path = path.as_ref().to_path_buf();
        info!(?path, "opening item store version {}", crate_version!());
        if path.is_dir() {
            return Err(StoreError::Parsing(format!(
                "the document path {:?} is a directory",
                &path
            )));
        }

        let writer = shared_writer(document_key(&path)?)?;
        Ok(JsonStore {
            path: Arc::new(path),
            writer,
        })
    }

    /// the path of the JSON document
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordEngine for JsonStore {
    fn read(&self) -> Vec<Record> {
        let records = load(&self.path).unwrap_or_else(|e| {
            warn!("reading {:?} as empty: {}", self.path, e);
            Vec::new()
        });
        view(&records)
    }

    #[instrument(skip(self))]
    fn append(&self, item: NewRecord) -> Result<Vec<Record>> {
        let path = Arc::clone(&self.path);
        self.writer.run(move || {
            let record = Record::submitted(item, Utc::now())?;
            let mut records = load(&path)?;
            records.push(record.to_fields()?);
            save(&path, &records)?;
            debug!(len = records.len(), "appended record");
            Ok(view(&records))
        })
    }

    #[instrument(skip(self, value))]
    fn patch_field(&self, index: i64, field: String, value: String) -> Result<Vec<Record>> {
        let path = Arc::clone(&self.path);
        self.writer.run(move || {
            let mut records = load(&path)?;
            let record = usize::try_from(index)
                .ok()
                .and_then(|i| records.get_mut(i))
                .ok_or(StoreError::InvalidIndex(index))?;

            set_field(record, &field, value)?;
            save(&path, &records)?;
            debug!(index, %field, "patched record");
            Ok(view(&records))
        })
    }
}

/// returns the writer already running for `key`, or starts one
fn shared_writer(key: PathBuf) -> Result<Arc<WriteQueue>> {
    WRITERS.retain(|_, writer| writer.strong_count() > 0);

    let mut entry = WRITERS.entry(key).or_insert_with(Weak::new);
    if let Some(writer) = entry.upgrade() {
        return Ok(writer);
    }
    let writer = Arc::new(WriteQueue::start()?);
    *entry = Arc::downgrade(&writer);
    Ok(writer)
}

/// the absolute path identifying the document at `path`. The parent directory is resolved
/// through symlinks when it already exists.
fn document_key(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    let file_name = absolute.file_name().ok_or_else(|| {
        StoreError::Parsing(format!("the document path {:?} has no file name", path))
    })?;

    Ok(match absolute.parent().map(fs::canonicalize) {
        Some(Ok(dir)) => dir.join(file_name),
        _ => absolute.clone(),
    })
}

fn view(records: &[Fields]) -> Vec<Record> {
    records.iter().map(Record::from).collect()
}

/// reads every record from the document at `path` as raw JSON objects.
///
/// A missing or blank document, or one holding `null`, is an empty sequence.
///
/// # Errors
/// returns `StoreError::Io` if the document could not be read, and
/// `StoreError::MalformedDocument` if it is not valid JSON or not an array of objects
fn load(path: &Path) -> Result<Vec<Fields>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let items = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Null) => return Ok(Vec::new()),
        Ok(other) => {
            return Err(StoreError::MalformedDocument(format!(
                "expected an array, found {}",
                kind_of(&other)
            )))
        }
        Err(e) => return Err(StoreError::MalformedDocument(format!("invalid JSON: {}", e))),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(fields) => Ok(fields),
            other => Err(StoreError::MalformedDocument(format!(
                "element {} is {}, not an object",
                i,
                kind_of(&other)
            ))),
        })
        .collect()
}

/// writes `records` as a pretty printed JSON array to a temporary file next to `path`, then
/// renames it over `path`. Missing parent directories are created.
fn save(path: &Path, records: &[Fields]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut writer = BufWriter::new(NamedTempFile::new_in(dir)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    let tmp = writer.into_inner().map_err(|e| e.into_error())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
