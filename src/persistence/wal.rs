//! Write-Ahead Log (WAL) implementation
//!
//! Every follow-graph mutation is appended as a length-prefixed bincode
//! record before it is applied in memory. Files are named
//! `wal-<first sequence, hex>.log` and replayed in name order.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// WAL errors
#[derive(Error, Debug)]
pub enum WalError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Corruption detected
    #[error("WAL corruption detected at sequence {0}")]
    Corruption(u64),

    /// Invalid log entry
    #[error("Invalid log entry: {0}")]
    InvalidEntry(String),
}

pub type WalResult<T> = Result<T, WalError>;

/// Write-Ahead Log entry types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalEntry {
    /// Follow edge created (timestamp in Unix millis)
    Follow {
        follower: String,
        followee: String,
        at: i64,
    },
    /// Follow edge removed
    Unfollow {
        follower: String,
        followee: String,
    },
    /// User registered without edges
    RegisterUser {
        id: String,
    },
    /// User and all incident edges removed
    RemoveUser {
        id: String,
    },
}

/// WAL record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WalRecord {
    /// Sequence number (monotonically increasing)
    sequence: u64,
    /// Entry data
    entry: WalEntry,
    /// Checksum over the serialized entry
    checksum: u32,
}

impl WalRecord {
    fn new(sequence: u64, entry: WalEntry) -> WalResult<Self> {
        let checksum = checksum(&bincode::serialize(&entry)?);
        Ok(Self { sequence, entry, checksum })
    }

    fn verify_checksum(&self) -> bool {
        bincode::serialize(&self.entry)
            .map(|bytes| checksum(&bytes) == self.checksum)
            .unwrap_or(false)
    }
}

/// FNV-1a over the entry bytes
fn checksum(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811c_9dc5u32, |acc, &b| (acc ^ b as u32).wrapping_mul(0x0100_0193))
}

/// Write-Ahead Log manager
pub struct Wal {
    /// Path to WAL directory
    path: PathBuf,
    /// Current WAL file
    current_file: Option<BufWriter<File>>,
    /// Current sequence number
    sequence: u64,
    /// Sync mode (flush after every write)
    sync_mode: bool,
}

impl Wal {
    /// Open (or create) a WAL directory
    pub fn new(path: impl AsRef<Path>) -> WalResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Create directory if it doesn't exist
        std::fs::create_dir_all(&path)?;

        let mut wal = Self {
            path,
            current_file: None,
            sequence: 0,
            sync_mode: false, // Default to async for performance
        };
        wal.sequence = wal.replay(0, |_| Ok(()))?;

        info!("Initializing WAL at {:?}, sequence: {}", wal.path, wal.sequence);
        Ok(wal)
    }

    /// Set sync mode
    pub fn set_sync_mode(&mut self, sync: bool) {
        self.sync_mode = sync;
        debug!("WAL sync mode: {}", sync);
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Append an entry to the WAL, returning its sequence number
    pub fn append(&mut self, entry: WalEntry) -> WalResult<u64> {
        let sequence = self.sequence + 1;
        let record = WalRecord::new(sequence, entry)?;
        let data = bincode::serialize(&record)?;

        // Ensure we have an open file
        if self.current_file.is_none() {
            self.open_new_file(sequence)?;
        }

        if let Some(ref mut file) = self.current_file {
            // Write length prefix (4 bytes)
            file.write_all(&(data.len() as u32).to_le_bytes())?;
            file.write_all(&data)?;

            if self.sync_mode {
                file.flush()?;
                file.get_ref().sync_data()?;
            }
        }

        self.sequence = sequence;
        Ok(sequence)
    }

    /// Force flush the WAL
    pub fn flush(&mut self) -> WalResult<()> {
        if let Some(ref mut file) = self.current_file {
            file.flush()?;
        }
        Ok(())
    }

    /// Replay entries with sequence >= `from_sequence`, returning the last sequence seen.
    ///
    /// A record cut short at the end of a file (a write interrupted by a
    /// crash) ends that file's replay with a warning; a checksum mismatch
    /// is an error.
    pub fn replay<F>(&self, from_sequence: u64, mut callback: F) -> WalResult<u64>
    where
        F: FnMut(&WalEntry) -> WalResult<()>,
    {
        let files = self.get_wal_files()?;
        let mut replayed = 0u64;
        let mut last_sequence = 0u64;

        for file_path in files {
            let file = File::open(&file_path)?;
            let mut reader = BufReader::new(file);
            let mut buf = Vec::new();

            loop {
                // Read length prefix
                let mut len_bytes = [0u8; 4];
                match reader.read_exact(&mut len_bytes) {
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                    Err(e) => return Err(e.into()),
                }

                let len = u32::from_le_bytes(len_bytes) as usize;
                buf.resize(len, 0);
                match reader.read_exact(&mut buf) {
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                        warn!("Truncated WAL record in {:?}, ignoring tail", file_path);
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }

                let record: WalRecord = bincode::deserialize(&buf)?;
                if !record.verify_checksum() {
                    warn!("WAL corruption detected at sequence {}", record.sequence);
                    return Err(WalError::Corruption(record.sequence));
                }
                if record.sequence <= last_sequence {
                    return Err(WalError::InvalidEntry(format!(
                        "sequence {} after {}",
                        record.sequence, last_sequence
                    )));
                }
                last_sequence = record.sequence;

                // Skip if before from_sequence
                if record.sequence < from_sequence {
                    continue;
                }

                callback(&record.entry)?;
                replayed += 1;
            }
        }

        debug!("Replayed {} WAL entries, last sequence: {}", replayed, last_sequence);
        Ok(last_sequence)
    }

    /// Replace the whole log with `entries`.
    ///
    /// The new file is written and synced under a temporary name, renamed
    /// into place, and only then are the older files deleted.
    pub fn compact<I>(&mut self, entries: I) -> WalResult<u64>
    where
        I: IntoIterator<Item = WalEntry>,
    {
        self.flush()?;
        self.current_file = None;

        let old_files = self.get_wal_files()?;
        let first = self.sequence + 1;
        let final_path = self.path.join(Self::file_name(first));
        let tmp_path = final_path.with_extension("log.tmp");

        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        let mut sequence = self.sequence;
        let mut written = 0usize;
        for entry in entries {
            sequence += 1;
            let data = bincode::serialize(&WalRecord::new(sequence, entry)?)?;
            writer.write_all(&(data.len() as u32).to_le_bytes())?;
            writer.write_all(&data)?;
            written += 1;
        }
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);

        std::fs::rename(&tmp_path, &final_path)?;
        for old in old_files {
            std::fs::remove_file(&old)?;
        }

        self.sequence = sequence;
        info!("Compacted WAL into {} entries, sequence: {}", written, sequence);
        Ok(sequence)
    }

    fn file_name(first_sequence: u64) -> String {
        format!("wal-{:016x}.log", first_sequence)
    }

    /// Open a new WAL file
    fn open_new_file(&mut self, first_sequence: u64) -> WalResult<()> {
        let file_path = self.path.join(Self::file_name(first_sequence));

        debug!("Opening new WAL file: {:?}", file_path);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;

        self.current_file = Some(BufWriter::new(file));
        Ok(())
    }

    /// Get all WAL files in sequence order
    fn get_wal_files(&self) -> WalResult<Vec<PathBuf>> {
        let mut files = Vec::new();

        let entries = std::fs::read_dir(&self.path)?;

        for entry in entries.flatten() {
            if let Some(filename) = entry.file_name().to_str() {
                if filename.starts_with("wal-") && filename.ends_with(".log") {
                    files.push(entry.path());
                }
            }
        }

        // Sort by filename (which includes sequence)
        files.sort();

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn follow(a: &str, b: &str) -> WalEntry {
        WalEntry::Follow {
            follower: a.to_string(),
            followee: b.to_string(),
            at: 0,
        }
    }

    #[test]
    fn test_wal_creation() {
        let temp_dir = TempDir::new().unwrap();
        let wal = Wal::new(temp_dir.path()).unwrap();
        assert_eq!(wal.current_sequence(), 0);
    }

    #[test]
    fn test_wal_append() {
        let temp_dir = TempDir::new().unwrap();
        let mut wal = Wal::new(temp_dir.path()).unwrap();

        assert_eq!(wal.append(follow("a", "b")).unwrap(), 1);
        assert_eq!(wal.append(follow("b", "c")).unwrap(), 2);

        wal.flush().unwrap();
    }

    #[test]
    fn test_wal_replay() {
        let temp_dir = TempDir::new().unwrap();
        let mut wal = Wal::new(temp_dir.path()).unwrap();

        for i in 0..5 {
            wal.append(follow("a", &format!("u{}", i))).unwrap();
        }
        wal.flush().unwrap();

        let mut seen = Vec::new();
        let last = wal
            .replay(0, |entry| {
                seen.push(entry.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(last, 5);
        assert_eq!(seen.len(), 5);
        assert_eq!(seen[0], follow("a", "u0"));

        let mut count = 0;
        wal.replay(4, |_| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_wal_reopen_continues_sequence() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut wal = Wal::new(temp_dir.path()).unwrap();
            wal.append(follow("a", "b")).unwrap();
            wal.append(follow("a", "c")).unwrap();
            wal.flush().unwrap();
        }

        let mut wal = Wal::new(temp_dir.path()).unwrap();
        assert_eq!(wal.current_sequence(), 2);
        assert_eq!(wal.append(follow("a", "d")).unwrap(), 3);
        wal.flush().unwrap();

        let mut count = 0;
        wal.replay(0, |_| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_wal_truncated_tail_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let mut wal = Wal::new(temp_dir.path()).unwrap();
        wal.append(follow("a", "b")).unwrap();
        wal.flush().unwrap();

        // Length prefix promising more bytes than follow
        let file = wal.get_wal_files().unwrap().pop().unwrap();
        let mut handle = OpenOptions::new().append(true).open(file).unwrap();
        handle.write_all(&100u32.to_le_bytes()).unwrap();
        handle.write_all(&[1, 2, 3]).unwrap();

        let reopened = Wal::new(temp_dir.path()).unwrap();
        assert_eq!(reopened.current_sequence(), 1);
    }

    #[test]
    fn test_wal_compact() {
        let temp_dir = TempDir::new().unwrap();
        let mut wal = Wal::new(temp_dir.path()).unwrap();

        wal.append(follow("a", "b")).unwrap();
        wal.append(WalEntry::Unfollow { follower: "a".into(), followee: "b".into() }).unwrap();
        wal.append(follow("a", "c")).unwrap();

        let last = wal.compact(vec![follow("a", "c")]).unwrap();
        assert_eq!(last, 4);
        assert_eq!(wal.get_wal_files().unwrap().len(), 1);

        let mut seen = Vec::new();
        wal.replay(0, |entry| {
            seen.push(entry.clone());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![follow("a", "c")]);

        // Appends continue after the compacted range
        assert_eq!(wal.append(follow("c", "a")).unwrap(), 5);
    }
}
