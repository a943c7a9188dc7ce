//! Turns ordered OCR texts into a [`TeiDocument`]

use crate::model::{Division, LineBreak, TeiDocument};
use tracing::debug;

/// Build a document with one division per text, in the given order.
///
/// Each text is split into lines, lines are trimmed and blank ones dropped.
/// The first remaining line becomes the division content and every other
/// line a [`LineBreak`]. A text with no remaining lines still yields an
/// (empty) division so positions line up with the regions.
pub fn assemble<S: AsRef<str>>(region_texts: &[S]) -> TeiDocument {
    let divisions: Vec<Division> = region_texts
        .iter()
        .map(|text| division_from_text(text.as_ref()))
        .collect();

    debug!(
        "Assembled {} divisions ({} empty)",
        divisions.len(),
        divisions.iter().filter(|d| d.is_empty()).count()
    );
    TeiDocument::new(divisions)
}

fn division_from_text(text: &str) -> Division {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let content = lines.next().map(str::to_string);
    let breaks = lines.map(LineBreak::new).collect();
    Division::new(content, breaks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_dropped() {
        let doc = assemble(&["Hello\n\nWorld\n"]);
        assert_eq!(doc.len(), 1);

        let div = &doc.divisions()[0];
        assert_eq!(div.content(), Some("Hello"));
        assert_eq!(div.breaks().len(), 1);
        assert_eq!(div.breaks()[0].tail(), " World");
    }

    #[test]
    fn test_lines_trimmed() {
        let doc = assemble(&["  first  \r\n\t second\t\n   \n third"]);
        let div = &doc.divisions()[0];
        assert_eq!(div.content(), Some("first"));
        let tails: Vec<&str> = div.breaks().iter().map(LineBreak::tail).collect();
        assert_eq!(tails, vec![" second", " third"]);
    }

    #[test]
    fn test_blank_text_gives_empty_division() {
        let doc = assemble(&["A", "", "  \n\n \t", "B"]);
        assert_eq!(doc.len(), 4);
        assert!(doc.divisions()[1].is_empty());
        assert!(doc.divisions()[2].is_empty());
        assert_eq!(doc.divisions()[3].content(), Some("B"));
    }

    #[test]
    fn test_no_texts() {
        let texts: [&str; 0] = [];
        assert!(assemble(&texts).is_empty());
    }

    #[test]
    fn test_idempotent() {
        let texts = vec![
            "Titre\nligne deux".to_string(),
            String::new(),
            "x".to_string(),
        ];
        assert_eq!(assemble(&texts), assemble(&texts));
    }
}
