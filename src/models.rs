use chrono::NaiveDateTime;

const KOBO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// One highlight joined with the chapter it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightRow {
    pub content_id: String,
    pub book_title: String,
    pub chapter_title: String,
    pub text: String,
    pub date_created: String,
    pub date_modified: String,
    pub volume_index: i64,
    pub start_container_path: String,
    pub end_container_path: String,
    /// Titles of every `content` row sharing the chapter key, joined with `-`.
    pub sub_chapters: String,
}

impl HighlightRow {
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        parse_kobo_datetime(&self.date_created)
    }
}

pub fn parse_kobo_datetime(s: &str) -> Option<NaiveDateTime> {
    KOBO_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Aggregate of all `content` rows sharing one `ChapterIDBookmarked`.
///
/// The first row scanned is the representative and supplies the book title,
/// chapter title and volume index.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterAggregate {
    pub book_title: String,
    pub title: String,
    pub volume_index: i64,
    pub sub_chapter_titles: Vec<String>,
}

impl ChapterAggregate {
    pub fn sub_chapters(&self) -> String {
        self.sub_chapter_titles.join("-")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterGroup {
    pub title: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookGroup {
    pub title: String,
    pub chapters: Vec<ChapterGroup>,
}

/// A rendered note, ready to be written as `<file_stem>.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteDocument {
    pub title: String,
    pub file_stem: String,
    pub content: String,
}
