use crate::config::DateRange;
use crate::db::{self, DbError};
use crate::format;
use crate::models::{HighlightRow, NoteDocument};
use crate::settings::Settings;
use crate::vault::{NoteWriter, Vault, VaultError};
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

const DATABASE_EXTENSION: &str = "sqlite";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("No sqlite DB file selected")]
    MissingInput,
    #[error("Selected file is not a .sqlite file: {0}")]
    WrongFileType(PathBuf),
    #[error("Selected file is not readable: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Database(#[from] DbError),
    #[error(transparent)]
    Vault(#[from] VaultError),
}

/// Everything one run needs, fixed before the run starts.
#[derive(Debug, Clone)]
pub struct ImportRequest<'a> {
    pub database_path: Option<&'a Path>,
    pub settings: &'a Settings,
    pub date_range: Option<DateRange>,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub written: Vec<WrittenNote>,
    pub failed: Vec<FailedNote>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WrittenNote {
    pub title: String,
    pub path: PathBuf,
    pub highlights: usize,
}

#[derive(Debug)]
pub struct FailedNote {
    pub title: String,
    pub path: PathBuf,
    pub error: io::Error,
}

impl ImportReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Verifies the database path before anything is opened.
pub fn check_input(path: Option<&Path>) -> Result<&Path, ImportError> {
    let path = path.ok_or(ImportError::MissingInput)?;

    let is_sqlite = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(DATABASE_EXTENSION))
        .unwrap_or(false);
    if !is_sqlite {
        return Err(ImportError::WrongFileType(path.to_path_buf()));
    }

    File::open(path).map_err(|source| ImportError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(path)
}

pub fn filter_by_date(rows: Vec<HighlightRow>, range: DateRange) -> Vec<HighlightRow> {
    rows.into_iter()
        .filter(|row| match row.created_at() {
            Some(created) => range.contains(created.date()),
            None => {
                tracing::debug!(id = %row.content_id, date = %row.date_created, "unparseable creation date, skipping");
                false
            }
        })
        .collect()
}

/// Picks a note path no earlier book of this run already uses.
///
/// Paths are compared case-insensitively; a clash gets a ` (2)`, ` (3)`, ...
/// suffix on the file stem.
fn unique_note_path(
    storage_folder: &str,
    doc: &NoteDocument,
    taken: &mut HashSet<String>,
) -> Result<PathBuf, ImportError> {
    let mut stem = doc.file_stem.clone();
    let mut n = 1;
    loop {
        let path = Vault::note_path(storage_folder, &stem)?;
        if taken.insert(path.to_string_lossy().to_lowercase()) {
            if n > 1 {
                tracing::warn!(title = %doc.title, file = %stem, "file name already used by another book, renamed");
            }
            return Ok(path);
        }
        n += 1;
        stem = format!("{} ({})", doc.file_stem, n);
    }
}

/// Extracts, groups and writes one note per book.
///
/// Path errors and database errors abort the run before anything is written.
/// Once writing starts, each book is attempted and its outcome recorded in
/// the report; a failed book leaves the ones already written in place.
pub fn run_import(
    request: &ImportRequest<'_>,
    writer: &dyn NoteWriter,
) -> Result<ImportReport, ImportError> {
    let path = check_input(request.database_path)?;
    tracing::info!(path = ?path, "extracting highlights");

    let mut rows = db::extract_highlights(Some(path))?;
    if let Some(range) = request.date_range {
        let total = rows.len();
        rows = filter_by_date(rows, range);
        tracing::info!(kept = rows.len(), total, from = %range.from, to = %range.to, "filtered by date");
    }

    let documents = format::format_books(&rows);
    let mut planned = Vec::with_capacity(documents.len());
    let mut taken = HashSet::new();
    for doc in documents {
        if doc.file_stem != doc.title {
            tracing::warn!(title = %doc.title, file = %doc.file_stem, "book title is not a valid file name, sanitized");
        }
        let path = unique_note_path(&request.settings.storage_folder, &doc, &mut taken)?;
        planned.push((doc, path));
    }

    let mut report = ImportReport::default();
    for (doc, path) in planned {
        let highlights = rows.iter().filter(|r| r.book_title == doc.title).count();
        match writer.write_note(&path, &doc.content) {
            Ok(()) => {
                tracing::info!(book = %doc.title, path = ?path, highlights, "note written");
                report.written.push(WrittenNote {
                    title: doc.title,
                    path,
                    highlights,
                });
            }
            Err(error) => {
                tracing::error!(book = %doc.title, path = ?path, error = %error, "failed to write note");
                report.failed.push(FailedNote {
                    title: doc.title,
                    path,
                    error,
                });
            }
        }
    }

    Ok(report)
}
