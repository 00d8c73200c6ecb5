//! Compact temperature snapshots
//!
//! A grid persists as one base64 string of 8-byte little-endian records
//! `{ i32 cell id, i32 round(T × 10000) }`, stored by the host under
//! [`STORAGE_KEY`]. Loading tolerates anything: a missing or corrupt blob is
//! treated as no data and unknown ids are skipped by the caller.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rustc_hash::FxHashMap;

/// Key the host stores the blob under
pub const STORAGE_KEY: &str = "f7cd64ae-9cd8-41f3-8e5d-3db992619343";

const RECORD_LEN: usize = 8;

/// Four decimal places of fixed-point precision
const FIXED_POINT_SCALE: f32 = 10_000.0;

/// One persisted cell temperature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRecord {
    pub id: i32,
    pub temperature: f32,
}

/// Encode records into the persisted blob
pub fn pack<I>(records: I) -> String
where
    I: IntoIterator<Item = CellRecord>,
{
    let mut bytes = Vec::new();
    for record in records {
        // float-to-int `as` saturates, NaN becomes 0
        let fixed = (record.temperature * FIXED_POINT_SCALE).round() as i32;
        bytes.extend_from_slice(&record.id.to_le_bytes());
        bytes.extend_from_slice(&fixed.to_le_bytes());
    }
    STANDARD.encode(bytes)
}

/// Decode a persisted blob
///
/// # Errors
/// Returns [`PersistenceError::InvalidEncoding`] when the text is not base64
/// and [`PersistenceError::TruncatedRecord`] when the payload is not a whole
/// number of records.
pub fn unpack(data: &str) -> Result<Vec<CellRecord>, PersistenceError> {
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| PersistenceError::InvalidEncoding(e.to_string()))?;

    if bytes.len() % RECORD_LEN != 0 {
        return Err(PersistenceError::TruncatedRecord { length: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(RECORD_LEN)
        .map(|chunk| {
            let id = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let fixed = i32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            CellRecord {
                id,
                temperature: fixed as f32 / FIXED_POINT_SCALE,
            }
        })
        .collect())
}

/// Keyed string storage attached to a structure by the host
pub trait BlobStorage {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: String);
}

/// [`BlobStorage`] kept in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: FxHashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStorage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

/// Errors that can occur with persistence operations
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// Blob is not valid base64
    InvalidEncoding(String),
    /// Payload length is not a multiple of the record size
    TruncatedRecord { length: usize },
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::InvalidEncoding(msg) => write!(f, "Invalid encoding: {msg}"),
            PersistenceError::TruncatedRecord { length } => {
                write!(f, "Truncated record: {length} bytes is not a multiple of {RECORD_LEN}")
            }
        }
    }
}

impl std::error::Error for PersistenceError {}
