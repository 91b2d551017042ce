//! Dictionary: backend-selecting facade with newline-delimited batch loaders.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::bucketed::BucketedPerfectTable;
use crate::quadratic::{QuadraticPerfectTable, TableStats};

/// Which table implementation a [`Dictionary`] runs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Single-level [`QuadraticPerfectTable`]: one probe, quadratic space.
    Quadratic,
    /// Two-level [`BucketedPerfectTable`]: two probes, linear expected space.
    Linear,
}

impl BackendKind {
    /// Selects a backend from a configuration tag. `"quadratic"` (exact,
    /// case-sensitive) picks the single-level table; every other tag,
    /// `"linear"` included, picks the bucketed one.
    pub fn from_tag(tag: &str) -> Self {
        if tag == "quadratic" {
            Self::Quadratic
        } else {
            Self::Linear
        }
    }
}

enum Backend {
    Quadratic(QuadraticPerfectTable),
    Linear(BucketedPerfectTable),
}

/// Failure while streaming a batch file.
///
/// Keys applied by lines read before the failure stay in the table;
/// batch operations are not transactional.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("could not open batch file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read error in batch file {} at line {line}: {source}", .path.display())]
    Read {
        path: PathBuf,
        /// 1-based number of the line being read when the error hit.
        line: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome counts of [`Dictionary::batch_insert_file`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub newly_added: usize,
    pub already_present: usize,
}

/// Outcome counts of [`Dictionary::batch_delete_file`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: usize,
    pub missing: usize,
}

/// A string set behind a swappable perfect-hash backend.
///
/// The backend is chosen once at construction, by [`BackendKind`] or by
/// its string tag, and the set operations plus the batch file loaders
/// delegate to it. Both backends expose identical membership semantics;
/// they differ in space and rebuild behavior only.
pub struct Dictionary {
    backend: Backend,
}

impl Dictionary {
    /// Creates an empty dictionary on the given backend, seeded from OS
    /// entropy.
    pub fn new(kind: BackendKind) -> Self {
        let backend = match kind {
            BackendKind::Quadratic => Backend::Quadratic(QuadraticPerfectTable::new()),
            BackendKind::Linear => Backend::Linear(BucketedPerfectTable::new()),
        };
        Self { backend }
    }

    /// Creates an empty dictionary whose hash-function choices are
    /// fully determined by `seed`.
    pub fn with_seed(kind: BackendKind, seed: u64) -> Self {
        let backend = match kind {
            BackendKind::Quadratic => {
                Backend::Quadratic(QuadraticPerfectTable::with_rng(StdRng::seed_from_u64(seed)))
            }
            BackendKind::Linear => {
                Backend::Linear(BucketedPerfectTable::with_rng(StdRng::seed_from_u64(seed)))
            }
        };
        Self { backend }
    }

    /// Bulk-loads a dictionary from `keys`, inserting each in order.
    pub fn from_keys<I>(kind: BackendKind, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let backend = match kind {
            BackendKind::Quadratic => Backend::Quadratic(QuadraticPerfectTable::from_keys(keys)),
            BackendKind::Linear => Backend::Linear(BucketedPerfectTable::from_keys(keys)),
        };
        Self { backend }
    }

    pub fn kind(&self) -> BackendKind {
        match self.backend {
            Backend::Quadratic(_) => BackendKind::Quadratic,
            Backend::Linear(_) => BackendKind::Linear,
        }
    }

    /// Inserts `key`; returns `true` if it was newly added.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        match &mut self.backend {
            Backend::Quadratic(table) => table.insert(key),
            Backend::Linear(table) => table.insert(key),
        }
    }

    /// Removes `key`; returns `true` if it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        match &mut self.backend {
            Backend::Quadratic(table) => table.delete(key),
            Backend::Linear(table) => table.delete(key),
        }
    }

    /// Returns `true` if `key` is present.
    pub fn search(&self, key: &str) -> bool {
        match &self.backend {
            Backend::Quadratic(table) => table.search(key),
            Backend::Linear(table) => table.search(key),
        }
    }

    pub fn len(&self) -> usize {
        match &self.backend {
            Backend::Quadratic(table) => table.len(),
            Backend::Linear(table) => table.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Statistics snapshot of the active backend.
    pub fn stats(&self) -> TableStats {
        match &self.backend {
            Backend::Quadratic(table) => table.stats(),
            Backend::Linear(table) => table.stats(),
        }
    }

    /// Inserts every key from a newline-delimited UTF-8 file. Lines are
    /// trimmed and blank lines skipped; there is no escaping. Returns
    /// how many keys were newly added versus already present.
    pub fn batch_insert_file(&mut self, path: impl AsRef<Path>) -> Result<InsertReport, BatchError> {
        let path = path.as_ref();
        log::debug!("batch insert from {}", path.display());
        let mut report = InsertReport::default();
        self.stream_keys(path, |dict, key| {
            if dict.insert(key) {
                report.newly_added += 1;
            } else {
                report.already_present += 1;
            }
        })?;
        log::debug!(
            "batch insert from {} done: {} newly added, {} already present",
            path.display(),
            report.newly_added,
            report.already_present
        );
        Ok(report)
    }

    /// Deletes every key listed in a newline-delimited UTF-8 file, with
    /// the same line handling as [`Dictionary::batch_insert_file`].
    /// Returns how many keys were deleted versus not present.
    pub fn batch_delete_file(&mut self, path: impl AsRef<Path>) -> Result<DeleteReport, BatchError> {
        let path = path.as_ref();
        log::debug!("batch delete from {}", path.display());
        let mut report = DeleteReport::default();
        self.stream_keys(path, |dict, key| {
            if dict.delete(key) {
                report.deleted += 1;
            } else {
                report.missing += 1;
            }
        })?;
        log::debug!(
            "batch delete from {} done: {} deleted, {} missing",
            path.display(),
            report.deleted,
            report.missing
        );
        Ok(report)
    }

    /// Streams non-blank trimmed lines of `path` into `apply`. Lines
    /// already consumed stay applied when a later read fails.
    fn stream_keys<F>(&mut self, path: &Path, mut apply: F) -> Result<(), BatchError>
    where
        F: FnMut(&mut Self, &str),
    {
        let file = File::open(path).map_err(|source| BatchError::Open {
            path: path.to_owned(),
            source,
        })?;
        let mut line_no: u64 = 0;
        for line in BufReader::new(file).lines() {
            line_no += 1;
            let line = line.map_err(|source| BatchError::Read {
                path: path.to_owned(),
                line: line_no,
                source,
            })?;
            let key = line.trim();
            if key.is_empty() {
                continue;
            }
            apply(self, key);
        }
        Ok(())
    }
}
