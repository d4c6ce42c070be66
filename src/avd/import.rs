//! Loading parsed AVD spreadsheets into the repository.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::parse::parse_avd_file;
use crate::core::{DebitNoteHeader, DebitNoteItem, TustError, TustRepository};

/// Configuration for AVD imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Replace a debit note that already exists under the same number.
    pub overwrite: bool,
    /// Descend into subdirectories when an input is a directory.
    pub recursive: bool,
    /// File extension of spreadsheets picked up from directories.
    pub extension: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            recursive: false,
            extension: "xlsx".into(),
        }
    }
}

/// Builder for [`ImportConfig`].
///
/// ```
/// use tust::avd::ImportConfigBuilder;
///
/// let config = ImportConfigBuilder::new().overwrite(true).recursive(true).build();
/// assert!(config.overwrite);
/// assert_eq!(config.extension, "xlsx");
/// ```
#[derive(Debug, Default)]
pub struct ImportConfigBuilder {
    config: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace existing notes instead of skipping them.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.config.overwrite = overwrite;
        self
    }

    /// Search directories recursively.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    /// Spreadsheet extension, without the dot.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.config.extension = extension.into();
        self
    }

    pub fn build(self) -> ImportConfig {
        self.config
    }
}

/// Result of importing one debit note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Id of the stored note (new or pre-existing).
    pub note_id: i64,
    /// False when an existing note was kept untouched.
    pub created: bool,
}

/// Per-file entry of a batch import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub outcome: ImportOutcome,
}

/// Store a parsed debit note.
///
/// An existing note with the same number is returned unchanged unless
/// `overwrite` is set, in which case it is deleted with its items and stored
/// again. Unset item amounts are stored as zero.
pub fn import_debit_note<R: TustRepository + ?Sized>(
    repo: &mut R,
    header: &DebitNoteHeader,
    items: &[DebitNoteItem],
    overwrite: bool,
) -> Result<ImportOutcome, TustError> {
    if let Some(existing) = repo.find_debit_note_by_number(&header.debit_note_number)? {
        if !overwrite {
            info!(
                debit_note = %header.debit_note_number,
                note_id = existing.id,
                "debit note already imported, skipping"
            );
            return Ok(ImportOutcome {
                note_id: existing.id,
                created: false,
            });
        }
        warn!(
            debit_note = %header.debit_note_number,
            note_id = existing.id,
            "replacing existing debit note"
        );
        repo.delete_debit_note(existing.id)?;
    }

    let stored: Vec<DebitNoteItem> = items.iter().map(zero_unset_amounts).collect();
    let ons_code = items.first().map(|item| item.ons_code.as_str());
    let note_id = repo.insert_debit_note(header, ons_code, &stored)?;
    info!(
        debit_note = %header.debit_note_number,
        note_id,
        items = stored.len(),
        "debit note imported"
    );
    Ok(ImportOutcome {
        note_id,
        created: true,
    })
}

/// Parse one AVD file and import it.
pub fn import_avd_file<R: TustRepository + ?Sized>(
    repo: &mut R,
    path: impl AsRef<Path>,
    config: &ImportConfig,
) -> Result<ImportOutcome, TustError> {
    let (header, items) = parse_avd_file(path)?;
    import_debit_note(repo, &header, &items, config.overwrite)
}

/// Expand inputs into spreadsheet paths.
///
/// Files are taken as given. Directories contribute the files carrying the
/// configured extension, recursively if asked, sorted per input. Paths
/// that do not exist are skipped.
pub fn collect_spreadsheets(
    inputs: &[PathBuf],
    config: &ImportConfig,
) -> Result<Vec<PathBuf>, TustError> {
    let mut resolved = Vec::new();
    for input in inputs {
        if input.is_file() {
            resolved.push(input.clone());
        } else if input.is_dir() {
            let walker = WalkDir::new(input)
                .min_depth(1)
                .max_depth(if config.recursive { usize::MAX } else { 1 });
            let mut found = Vec::new();
            for entry in walker {
                let entry = entry.map_err(|e| TustError::Io(e.into()))?;
                if entry.file_type().is_file() && has_extension(entry.path(), &config.extension) {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            resolved.extend(found);
        } else {
            warn!(path = %input.display(), "input path does not exist");
        }
    }
    Ok(resolved)
}

/// Import every spreadsheet reachable from `inputs`.
///
/// Stops at the first file that fails to parse or store.
pub fn import_avd_batch<R: TustRepository + ?Sized>(
    repo: &mut R,
    inputs: &[PathBuf],
    config: &ImportConfig,
) -> Result<Vec<BatchEntry>, TustError> {
    let targets = collect_spreadsheets(inputs, config)?;
    if targets.is_empty() {
        warn!("no spreadsheet found in the given inputs");
    }
    let mut entries = Vec::with_capacity(targets.len());
    for path in targets {
        let outcome = import_avd_file(repo, &path, config)?;
        entries.push(BatchEntry { path, outcome });
    }
    Ok(entries)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

fn zero_unset_amounts(item: &DebitNoteItem) -> DebitNoteItem {
    let or_zero = |v: Option<Decimal>| Some(v.unwrap_or(Decimal::ZERO));
    DebitNoteItem {
        installment_1_amount: or_zero(item.installment_1_amount),
        installment_2_amount: or_zero(item.installment_2_amount),
        installment_3_amount: or_zero(item.installment_3_amount),
        total_amount: or_zero(item.total_amount),
        ..item.clone()
    }
}
