use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rayon::prelude::*;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::GenerateError;
use crate::wallet::{Account, AccountRecord, PlainBytes, SecretKeyEncoder};

// Progress counter is bumped once per chunk to keep atomics off the hot path
const PROGRESS_CHUNK: usize = 256;

/// Batch key-pair generator.
///
/// Accounts are produced on a rayon pool and assembled in index order, so the
/// output preserves generation order regardless of thread count.
pub struct Generator<E: SecretKeyEncoder = PlainBytes> {
    threads: usize,
    encoder: E,
    progress: Arc<AtomicUsize>,
}

impl Generator<PlainBytes> {
    /// `threads == 0` uses one thread per CPU.
    pub fn new(threads: usize) -> Self {
        Self {
            threads,
            encoder: PlainBytes,
            progress: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<E: SecretKeyEncoder> Generator<E> {
    /// Swaps the strategy used to store secret key material.
    pub fn with_encoder<F: SecretKeyEncoder>(self, encoder: F) -> Generator<F> {
        Generator {
            threads: self.threads,
            encoder,
            progress: self.progress,
        }
    }

    /// Shared counter of accounts generated so far.
    pub fn progress(&self) -> Arc<AtomicUsize> {
        self.progress.clone()
    }

    pub fn thread_count(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            num_cpus::get()
        }
    }

    /// Generates `count` accounts in memory.
    pub fn generate(&self, count: usize) -> Result<Vec<Account>, GenerateError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let num_threads = self.thread_count().min(count);
        let per_thread = (count + num_threads - 1) / num_threads;
        debug!(count, num_threads, per_thread, "generating accounts");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;

        let batches: Vec<Vec<Account>> = pool.install(|| {
            (0..num_threads)
                .into_par_iter()
                .map(|thread_id| {
                    let start = thread_id * per_thread;
                    let len = per_thread.min(count.saturating_sub(start));
                    self.generate_batch(len)
                })
                .collect()
        });

        Ok(batches.concat())
    }

    fn generate_batch(&self, count: usize) -> Vec<Account> {
        let mut accounts = Vec::with_capacity(count);
        let mut rng = OsRng;

        for i in 0..count {
            let signing_key = SigningKey::generate(&mut rng);
            accounts.push(Account::new(&signing_key, &self.encoder));

            if (i + 1) % PROGRESS_CHUNK == 0 {
                self.progress.fetch_add(PROGRESS_CHUNK, Ordering::Relaxed);
            }
        }

        self.progress.fetch_add(count % PROGRESS_CHUNK, Ordering::Relaxed);
        accounts
    }

    /// Generates `count` accounts and atomically writes them to `output`,
    /// replacing whatever was there.
    pub fn generate_accounts(
        &self,
        count: usize,
        output: &Path,
    ) -> Result<AccountRecord, GenerateError> {
        let record = AccountRecord::new(self.generate(count)?);
        write_record(&record, output)?;
        info!(count = record.len(), path = %output.display(), "accounts saved");
        Ok(record)
    }
}

/// Generates `count` accounts with default settings and saves them to `output`.
pub fn generate_accounts(count: usize, output: &Path) -> Result<AccountRecord, GenerateError> {
    Generator::new(0).generate_accounts(count, output)
}

/// Writes the record as pretty-printed JSON.
///
/// The document goes to a temporary file next to `path` which is synced and
/// then renamed over the target, so readers see either the old file or the
/// complete new one.
pub fn write_record(record: &AccountRecord, path: &Path) -> Result<(), GenerateError> {
    let persist_err = |source: io::Error| GenerateError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(persist_err)?;

    let mut file = NamedTempFile::new_in(dir).map_err(persist_err)?;
    write_document(record, BufWriter::new(file.as_file_mut()), path)?;
    file.as_file().sync_all().map_err(persist_err)?;
    file.persist(path).map_err(|e| persist_err(e.error))?;

    debug!(path = %path.display(), "record persisted");
    Ok(())
}

// Encoding happens fully in memory so any error from `writer` is an I/O failure
fn write_document<W: Write>(
    record: &AccountRecord,
    mut writer: W,
    path: &Path,
) -> Result<(), GenerateError> {
    let bytes = serde_json::to_vec_pretty(record)?;
    writer
        .write_all(&bytes)
        .and_then(|()| writer.flush())
        .map_err(|source| GenerateError::Persist {
            path: path.to_path_buf(),
            source,
        })
}
