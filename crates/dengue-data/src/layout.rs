//! Delimiter and header-row detection.
//!
//! Exports often start with report titles, filter descriptions or blank
//! lines before the real table. The header is the first line that names a
//! municipality column *and* at least one period column.

use dengue_core::text::{is_period, normalize_text};

/// Substrings marking a municipality-like column in a header candidate.
const HEADER_PLACE_MARKERS: [&str; 2] = ["municipio", "nome_rs"];

/// Field separator used by one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Semicolon,
}

impl Delimiter {
    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
        }
    }

    pub fn as_byte(self) -> u8 {
        self.as_char() as u8
    }
}

/// Comma when the first line has strictly more commas than semicolons.
pub fn detect_delimiter(first_line: &str) -> Delimiter {
    let commas = first_line.matches(',').count();
    let semicolons = first_line.matches(';').count();
    if commas > semicolons {
        Delimiter::Comma
    } else {
        Delimiter::Semicolon
    }
}

/// The row naming the table's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
    /// Line index inside the file.
    pub index: usize,
    /// Column names as written, trimmed.
    pub raw: Vec<String>,
    /// [`normalize_text`] of each raw name.
    pub normalized: Vec<String>,
}

impl HeaderRow {
    fn from_line(index: usize, line: &str, delimiter: Delimiter) -> Self {
        let raw: Vec<String> = line
            .split(delimiter.as_char())
            .map(|c| c.trim().to_string())
            .collect();
        let normalized = raw.iter().map(|c| normalize_text(c)).collect();
        Self {
            index,
            raw,
            normalized,
        }
    }

    fn names_place(&self) -> bool {
        self.normalized
            .iter()
            .any(|c| HEADER_PLACE_MARKERS.iter().any(|m| c.contains(m)))
    }

    fn names_period(&self) -> bool {
        self.normalized.iter().any(|c| is_period(c))
    }
}

/// First line that has both a municipality column and a period column.
pub fn locate_header<S: AsRef<str>>(lines: &[S], delimiter: Delimiter) -> Option<HeaderRow> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| HeaderRow::from_line(idx, line.as_ref(), delimiter))
        .find(|h| h.names_place() && h.names_period())
}

/// `true` for a decorative row made only of delimiters and whitespace.
pub fn is_separator_row(line: &str, delimiter: Delimiter) -> bool {
    line.chars()
        .all(|c| c == delimiter.as_char() || c.is_whitespace())
}

/// Lines following the header, minus a leading separator row.
pub fn data_lines<'a, S: AsRef<str>>(
    lines: &'a [S],
    header: &HeaderRow,
    delimiter: Delimiter,
) -> &'a [S] {
    let rest = &lines[(header.index + 1).min(lines.len())..];
    match rest.first() {
        Some(first) if is_separator_row(first.as_ref(), delimiter) => &rest[1..],
        _ => rest,
    }
}
