use crate::models::{BookGroup, ChapterGroup, HighlightRow, NoteDocument};
use std::collections::HashMap;

const ILLEGAL_FILE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
const UNTITLED: &str = "Untitled";

/// Book → chapter → highlight texts, in the order rows arrived.
#[derive(Debug, Default)]
pub struct GroupedHighlights {
    books: Vec<BookGroup>,
    book_index: HashMap<String, usize>,
    chapter_index: Vec<HashMap<String, usize>>,
}

impl GroupedHighlights {
    pub fn push(&mut self, book: &str, chapter: &str, text: &str) {
        let b = match self.book_index.get(book) {
            Some(&b) => b,
            None => {
                self.books.push(BookGroup {
                    title: book.to_string(),
                    chapters: Vec::new(),
                });
                self.chapter_index.push(HashMap::new());
                self.book_index.insert(book.to_string(), self.books.len() - 1);
                self.books.len() - 1
            }
        };

        let chapters = &mut self.books[b].chapters;
        let index = &mut self.chapter_index[b];
        let c = match index.get(chapter) {
            Some(&c) => c,
            None => {
                chapters.push(ChapterGroup {
                    title: chapter.to_string(),
                    highlights: Vec::new(),
                });
                index.insert(chapter.to_string(), chapters.len() - 1);
                chapters.len() - 1
            }
        };

        chapters[c].highlights.push(text.to_string());
    }

    pub fn books(&self) -> &[BookGroup] {
        &self.books
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

pub fn group_rows(rows: &[HighlightRow]) -> GroupedHighlights {
    let mut grouped = GroupedHighlights::default();
    for row in rows {
        grouped.push(&row.book_title, &row.chapter_title, &row.text);
    }
    grouped
}

pub fn render_book(book: &BookGroup) -> String {
    let mut content = format!("# {}\n\n", book.title);
    for chapter in &book.chapters {
        content.push_str(&format!("## {}\n\n", chapter.title));
        content.push_str(&chapter.highlights.join("\n\n"));
        content.push_str("\n\n");
    }
    content
}

pub fn format_books(rows: &[HighlightRow]) -> Vec<NoteDocument> {
    group_rows(rows)
        .books()
        .iter()
        .map(|book| NoteDocument {
            title: book.title.clone(),
            file_stem: sanitize_file_stem(&book.title),
            content: render_book(book),
        })
        .collect()
}

/// Replaces characters most filesystems reject in a file name.
pub fn sanitize_file_stem(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| {
            if c.is_control() || ILLEGAL_FILE_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches('.').trim_end();
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(book: &str, chapter: &str, text: &str) -> HighlightRow {
        HighlightRow {
            content_id: format!("{}/{}", book, chapter),
            book_title: book.to_string(),
            chapter_title: chapter.to_string(),
            text: text.to_string(),
            date_created: "2023-05-01T12:00:00.000".to_string(),
            date_modified: "2023-05-01T12:00:00.000".to_string(),
            volume_index: 0,
            start_container_path: String::new(),
            end_container_path: String::new(),
            sub_chapters: chapter.to_string(),
        }
    }

    fn scenario() -> Vec<HighlightRow> {
        vec![
            row("bookA", "ch1", "h1"),
            row("bookA", "ch1", "h2"),
            row("bookA", "ch2", "h3"),
            row("bookB", "ch1", "h4"),
        ]
    }

    #[test]
    fn test_two_books_rendered() {
        let docs = format_books(&scenario());

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "bookA");
        assert_eq!(
            docs[0].content,
            "# bookA\n\n## ch1\n\nh1\n\nh2\n\n## ch2\n\nh3\n\n"
        );
        assert_eq!(docs[1].title, "bookB");
        assert_eq!(docs[1].content, "# bookB\n\n## ch1\n\nh4\n\n");
    }

    #[test]
    fn test_empty_input_yields_no_documents() {
        assert!(format_books(&[]).is_empty());
        assert!(group_rows(&[]).is_empty());
    }

    #[test]
    fn test_formatting_is_idempotent() {
        let rows = scenario();

        assert_eq!(format_books(&rows), format_books(&rows));
    }

    #[test]
    fn test_order_preserved_within_chapter() {
        let rows = vec![
            row("book", "ch1", "z"),
            row("book", "ch2", "m"),
            row("book", "ch1", "a"),
            row("book", "ch1", "q"),
        ];

        let grouped = group_rows(&rows);

        let book = &grouped.books()[0];
        assert_eq!(book.chapters[0].title, "ch1");
        assert_eq!(book.chapters[0].highlights, vec!["z", "a", "q"]);
        assert_eq!(book.chapters[1].highlights, vec!["m"]);
    }

    #[test]
    fn test_new_book_does_not_touch_existing_groups() {
        let mut grouped = group_rows(&scenario()[..3]);
        let before = grouped.books()[0].clone();

        grouped.push("bookC", "ch1", "fresh");

        assert_eq!(grouped.books()[0], before);
        assert_eq!(grouped.books().len(), 2);
        assert_eq!(grouped.books()[1].chapters[0].highlights, vec!["fresh"]);
    }

    #[test]
    fn test_same_chapter_title_in_different_books_kept_apart() {
        let grouped = group_rows(&scenario());

        assert_eq!(grouped.books()[0].chapters[0].highlights, vec!["h1", "h2"]);
        assert_eq!(grouped.books()[1].chapters[0].highlights, vec!["h4"]);
    }

    #[test]
    fn test_one_heading_per_chapter() {
        let docs = format_books(&scenario());

        assert_eq!(docs[0].content.matches("## ").count(), 2);
        assert_eq!(docs[1].content.matches("## ").count(), 1);
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Dune"), "Dune");
        assert_eq!(sanitize_file_stem("AC/DC: Live?"), "AC_DC_ Live_");
        assert_eq!(sanitize_file_stem("  Trailing dots... "), "Trailing dots");
        assert_eq!(sanitize_file_stem("tab\there"), "tab_here");
        assert_eq!(sanitize_file_stem(""), "Untitled");
        assert_eq!(sanitize_file_stem(".."), "Untitled");
    }

    #[test]
    fn test_heading_keeps_unsanitized_title() {
        let docs = format_books(&[row("Who? Me", "ch1", "h")]);

        assert_eq!(docs[0].file_stem, "Who_ Me");
        assert!(docs[0].content.starts_with("# Who? Me\n\n"));
    }
}
