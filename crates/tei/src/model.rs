//! Document tree: divisions in reading order, each with its line breaks

/// A line break marker and the text that follows it.
///
/// The tail always starts with one space separating it from the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBreak {
    tail: String,
}

impl LineBreak {
    pub(crate) fn new(line: &str) -> Self {
        Self {
            tail: format!(" {line}"),
        }
    }

    #[must_use]
    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// The line without its separating space
    #[must_use]
    pub fn line(&self) -> &str {
        self.tail.strip_prefix(' ').unwrap_or(&self.tail)
    }
}

/// One text region of the page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Division {
    content: Option<String>,
    breaks: Vec<LineBreak>,
}

impl Division {
    pub(crate) fn new(content: Option<String>, breaks: Vec<LineBreak>) -> Self {
        Self { content, breaks }
    }

    /// First non-empty line, if the region had any text
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    #[must_use]
    pub fn breaks(&self) -> &[LineBreak] {
        &self.breaks
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.breaks.is_empty()
    }

    /// All lines of the division, without break markers
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content
            .as_deref()
            .into_iter()
            .chain(self.breaks.iter().map(LineBreak::line))
    }
}

/// `TEI > text > body`, holding divisions in reading order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeiDocument {
    divisions: Vec<Division>,
}

impl TeiDocument {
    pub(crate) fn new(divisions: Vec<Division>) -> Self {
        Self { divisions }
    }

    #[must_use]
    pub fn divisions(&self) -> &[Division] {
        &self.divisions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.divisions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.divisions.is_empty()
    }

    /// Page text: lines joined with `\n`, divisions with a blank line
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.divisions
            .iter()
            .map(|div| div.lines().collect::<Vec<_>>().join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_break_tail() {
        let lb = LineBreak::new("World");
        assert_eq!(lb.tail(), " World");
        assert_eq!(lb.line(), "World");
    }

    #[test]
    fn test_division_lines() {
        let div = Division::new(
            Some("a".to_string()),
            vec![LineBreak::new("b"), LineBreak::new("c")],
        );
        assert_eq!(div.lines().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(!div.is_empty());
        assert!(Division::default().is_empty());
    }

    #[test]
    fn test_plain_text() {
        let doc = TeiDocument::new(vec![
            Division::new(Some("a".to_string()), vec![LineBreak::new("b")]),
            Division::default(),
            Division::new(Some("c".to_string()), Vec::new()),
        ]);
        assert_eq!(doc.plain_text(), "a\nb\n\n\n\nc");
        assert_eq!(TeiDocument::default().plain_text(), "");
    }
}
