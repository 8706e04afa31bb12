//! Line model for text files.
//!
//! A [`TextFile`] keeps the terminator of every line next to its content, so
//! rendering an unmodified file reproduces the input byte for byte (mixed
//! LF/CRLF files included).

use memchr::memchr_iter;

/// Line terminator style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// The terminator bytes.
    #[must_use]
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// A decoded text file split into lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFile {
    lines: Vec<String>,
    // None only for a last line without terminator.
    endings: Vec<Option<LineEnding>>,
    has_bom: bool,
}

impl TextFile {
    /// Split decoded text into lines.
    #[must_use]
    pub fn parse(text: &str, has_bom: bool) -> Self {
        let mut lines = Vec::new();
        let mut endings = Vec::new();
        let mut start = 0;

        for nl in memchr_iter(b'\n', text.as_bytes()) {
            let raw = &text[start..nl];
            match raw.strip_suffix('\r') {
                Some(content) => {
                    lines.push(content.to_string());
                    endings.push(Some(LineEnding::CrLf));
                }
                None => {
                    lines.push(raw.to_string());
                    endings.push(Some(LineEnding::Lf));
                }
            }
            start = nl + 1;
        }

        if start < text.len() {
            lines.push(text[start..].to_string());
            endings.push(None);
        }

        Self {
            lines,
            endings,
            has_bom,
        }
    }

    /// All lines, without terminators.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line at a 0-based index.
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Replace the content of one line, keeping its terminator.
    ///
    /// Returns `false` when the index is out of bounds.
    pub fn replace_line(&mut self, index: usize, content: impl Into<String>) -> bool {
        match self.lines.get_mut(index) {
            Some(line) => {
                *line = content.into();
                true
            }
            None => false,
        }
    }

    /// Whether the file started with a UTF-8 BOM.
    #[must_use]
    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    /// Render back to text (without the BOM; the writer adds it).
    #[must_use]
    pub fn render(&self) -> String {
        let capacity = self.lines.iter().map(|l| l.len() + 2).sum();
        let mut out = String::with_capacity(capacity);
        for (line, ending) in self.lines.iter().zip(&self.endings) {
            out.push_str(line);
            if let Some(ending) = ending {
                out.push_str(ending.as_str());
            }
        }
        out
    }
}
