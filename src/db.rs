use crate::models::{ChapterAggregate, HighlightRow};
use rusqlite::{Connection, OpenFlags};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const CHAPTERS_QUERY: &str = "SELECT ChapterIDBookmarked, BookTitle, Title, VolumeIndex
     FROM content
     WHERE ChapterIDBookmarked IS NOT NULL
     ORDER BY rowid";

const BOOKMARKS_QUERY: &str = "SELECT BookmarkID, ContentID, Text, DateCreated, DateModified,
            StartContainerPath, EndContainerPath
     FROM Bookmark
     ORDER BY ContentID, ChapterProgress, BookmarkID";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("No sqlite DB file selected")]
    MissingInput,
    #[error("Failed to open database: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(#[from] rusqlite::Error),
}

pub fn open_read_only(path: &Path) -> Result<Connection, DbError> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| DbError::ConnectionFailed(e.to_string()))
}

/// Groups `content` rows by `ChapterIDBookmarked` in natural row order.
pub fn fetch_chapters(conn: &Connection) -> Result<HashMap<String, ChapterAggregate>, DbError> {
    let mut stmt = conn.prepare(CHAPTERS_QUERY)?;
    let mut rows = stmt.query([])?;
    let mut chapters: HashMap<String, ChapterAggregate> = HashMap::new();

    while let Some(row) = rows.next()? {
        let key: String = row.get(0)?;
        let book_title: Option<String> = row.get(1)?;
        let title: Option<String> = row.get(2)?;
        let volume_index: Option<i64> = row.get(3)?;
        let title = title.unwrap_or_default();

        chapters
            .entry(key)
            .or_insert_with(|| ChapterAggregate {
                book_title: book_title.unwrap_or_default(),
                title: title.clone(),
                volume_index: volume_index.unwrap_or_default(),
                sub_chapter_titles: Vec::new(),
            })
            .sub_chapter_titles
            .push(title);
    }

    Ok(chapters)
}

/// Joins bookmarks to their chapter, one row per bookmark, ordered by chapter
/// then by progress within the chapter.
pub fn fetch_highlights(conn: &Connection) -> Result<Vec<HighlightRow>, DbError> {
    let chapters = fetch_chapters(conn)?;

    let mut stmt = conn.prepare(BOOKMARKS_QUERY)?;
    let mut rows = stmt.query([])?;
    let mut seen = HashSet::new();
    let mut highlights = Vec::new();

    while let Some(row) = rows.next()? {
        let bookmark_id: String = row.get(0)?;
        let content_id: Option<String> = row.get(1)?;
        let text: Option<String> = row.get(2)?;
        // dog-ear bookmarks carry no text; they still list their chapter
        let text = text.unwrap_or_default();

        let Some(content_id) = content_id else {
            continue;
        };
        let Some(chapter) = chapters.get(&content_id) else {
            continue;
        };
        if !seen.insert(bookmark_id) {
            continue;
        }

        highlights.push(HighlightRow {
            content_id,
            book_title: chapter.book_title.clone(),
            chapter_title: chapter.title.clone(),
            text,
            date_created: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            date_modified: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
            volume_index: chapter.volume_index,
            start_container_path: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            end_container_path: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            sub_chapters: chapter.sub_chapters(),
        });
    }

    tracing::debug!(
        chapters = chapters.len(),
        highlights = highlights.len(),
        "fetched highlights"
    );

    Ok(highlights)
}

pub fn extract_highlights(path: Option<&Path>) -> Result<Vec<HighlightRow>, DbError> {
    let path = path.ok_or(DbError::MissingInput)?;
    let conn = open_read_only(path)?;
    fetch_highlights(&conn)
}
