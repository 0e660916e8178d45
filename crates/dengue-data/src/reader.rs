//! Decoding and parsing of one source export.
//!
//! Converts a [`RawFile`] into its header and projected records. Exports
//! are written in ISO-8859-1: every byte is decoded to the code point of
//! the same value, so 0x80..=0x9F become C1 controls rather than the
//! `windows-1252` punctuation.

use csv::ReaderBuilder;
use dengue_core::error::{EtlError, Result};
use dengue_core::models::RawFile;
use encoding_rs::mem::decode_latin1;
use tracing::debug;

use crate::fields::ParsedRecord;
use crate::layout::{self, Delimiter, HeaderRow};

// ── Public API ────────────────────────────────────────────────────────────────

/// A file whose header was found, with its data rows projected.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub header: HeaderRow,
    pub records: Vec<ParsedRecord>,
}

/// Result of reading one file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Parsed(ParsedFile),
    /// No line names both a municipality and a period column.
    HeaderNotFound,
}

/// Characters that end a line. Besides `\n` and `\r` this covers the
/// vertical tab, form feed, the file/group/record separators, NEL (byte
/// 0x85 in ISO-8859-1) and the Unicode line and paragraph separators.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}',
    '\u{2029}',
];

/// Decode ISO-8859-1 text. Never fails.
pub fn decode(bytes: &[u8]) -> String {
    decode_latin1(bytes).into_owned()
}

/// Split on any of [`LINE_BREAKS`], treating `\r\n` as a single break.
/// A trailing break does not produce an empty last line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while let Some((pos, ch)) = rest.char_indices().find(|(_, c)| LINE_BREAKS.contains(c)) {
        lines.push(&rest[..pos]);
        let skip = if rest[pos..].starts_with("\r\n") { 2 } else { ch.len_utf8() };
        rest = &rest[pos + skip..];
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}

/// Decode, detect the layout and parse every data row of `file`.
///
/// Fails only when the file is empty or a record cannot be parsed; a
/// missing header is reported as [`FileOutcome::HeaderNotFound`].
pub fn read_file(file: &RawFile) -> Result<FileOutcome> {
    let text = decode(&file.bytes);
    let lines = split_lines(&text);

    let Some(first) = lines.first() else {
        return Err(processing_error(file, "arquivo vazio"));
    };
    let delimiter = layout::detect_delimiter(first);

    let Some(header) = layout::locate_header(&lines, delimiter) else {
        return Ok(FileOutcome::HeaderNotFound);
    };
    debug!(
        key = %file.key,
        header_line = header.index,
        delimiter = %delimiter.as_char(),
        "header located"
    );

    let body = layout::data_lines(&lines, &header, delimiter).join("\n");
    let records = parse_records(file, &body, &header, delimiter)?;

    Ok(FileOutcome::Parsed(ParsedFile {
        header,
        records,
    }))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_records(
    file: &RawFile,
    body: &str,
    header: &HeaderRow,
    delimiter: Delimiter,
) -> Result<Vec<ParsedRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter.as_byte())
        .from_reader(body.as_bytes());

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            processing_error(file, &format!("linha {} inválida: {}", index + 1, e))
        })?;
        records.push(ParsedRecord::project(header, record.iter()));
    }
    Ok(records)
}

fn processing_error(file: &RawFile, cause: &str) -> EtlError {
    EtlError::Processing {
        key: file.key.clone(),
        cause: cause.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(outcome: FileOutcome) -> ParsedFile {
        match outcome {
            FileOutcome::Parsed(p) => p,
            FileOutcome::HeaderNotFound => panic!("header not found"),
        }
    }

    #[test]
    fn test_decode_latin1_bytes() {
        // "Município" in ISO-8859-1.
        let bytes = b"Munic\xedpio;S\xe3o Jos\xe9";
        assert_eq!(decode(bytes), "Município;São José");
    }

    #[test]
    fn test_decode_c1_bytes_stay_control_characters() {
        assert_eq!(decode(b"Vila\x96Nova"), "Vila\u{96}Nova");
        assert_eq!(decode(b"\x80\x9f\xff"), "\u{80}\u{9f}\u{ff}");
    }

    #[test]
    fn test_split_lines_unicode_breaks() {
        assert_eq!(
            split_lines("a\u{85}b\u{0b}c\u{0c}d\u{1c}e\u{1d}f\u{1e}g\u{2028}h\u{2029}i"),
            vec!["a", "b", "c", "d", "e", "f", "g", "h", "i"]
        );
        assert_eq!(split_lines("a\tb\u{0}c"), vec!["a\tb\u{0}c"]);
    }

    #[test]
    fn test_split_lines_mixed_endings() {
        assert_eq!(split_lines("a\r\nb\nc\rd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_read_file_basic() {
        let file = RawFile::new(
            "dengue_data_raw/2024/municipios.csv",
            "Municipio;SE1;SE2\nCidade X;10;abc\n",
        );
        let p = parsed(read_file(&file).unwrap());
        assert_eq!(p.header.index, 0);
        assert_eq!(p.records.len(), 1);
        assert_eq!(p.records[0].get("se2"), Some("abc"));
    }

    #[test]
    fn test_read_file_preamble_and_separator() {
        let file = RawFile::new(
            "raw/2023/x.csv",
            b"Relat\xf3rio Anual\r\nMunicipio;SE1;SE2\r\n;;\r\nCidade Y;1;2\r\n",
        );
        let p = parsed(read_file(&file).unwrap());
        assert_eq!(p.header.index, 1);
        assert_eq!(p.records.len(), 1);
        assert_eq!(p.records[0].get("municipio"), Some("Cidade Y"));
    }

    #[test]
    fn test_read_file_latin1_header() {
        let mut bytes = b"C\xf3digo IBGE,Munic\xedpio,Mar\xe7o\n".to_vec();
        bytes.extend_from_slice(b"4205407,Florian\xf3polis,12\n");
        let file = RawFile::new("raw/2024/mes.csv", bytes);
        let p = parsed(read_file(&file).unwrap());
        assert_eq!(p.header.raw, vec!["Código IBGE", "Município", "Março"]);
        assert_eq!(p.records[0].get("marco"), Some("12"));
        assert_eq!(p.records[0].get("municipio"), Some("Florianópolis"));
    }

    #[test]
    fn test_read_file_keeps_c1_byte_in_name() {
        let file = RawFile::new("raw/2024/c1.csv", b"Municipio;SE1\nVila\x96Nova;3\n");
        let p = parsed(read_file(&file).unwrap());
        assert_eq!(p.records[0].get("municipio"), Some("Vila\u{96}Nova"));
    }

    #[test]
    fn test_read_file_nel_byte_ends_header_line() {
        let file = RawFile::new("raw/2024/nel.csv", b"Municipio;SE1\x85Cidade X;3");
        let p = parsed(read_file(&file).unwrap());
        assert_eq!(p.header.index, 0);
        assert_eq!(p.records.len(), 1);
        assert_eq!(p.records[0].get("municipio"), Some("Cidade X"));
        assert_eq!(p.records[0].get("se1"), Some("3"));
    }

    #[test]
    fn test_read_file_quoted_values() {
        let file = RawFile::new(
            "raw/2024/q.csv",
            "Municipio,SE1\n\"Cidade, Z\",7\n",
        );
        let p = parsed(read_file(&file).unwrap());
        assert_eq!(p.records[0].get("municipio"), Some("Cidade, Z"));
    }

    #[test]
    fn test_read_file_blank_lines_skipped() {
        let file = RawFile::new("raw/2024/b.csv", "Municipio;SE1\nA;1\n\nB;2\n");
        let p = parsed(read_file(&file).unwrap());
        assert_eq!(p.records.len(), 2);
    }

    #[test]
    fn test_read_file_header_not_found() {
        let file = RawFile::new("raw/2024/none.csv", "a;b\n1;2\n");
        assert!(matches!(read_file(&file).unwrap(), FileOutcome::HeaderNotFound));
    }

    #[test]
    fn test_read_file_empty_is_processing_error() {
        let file = RawFile::new("raw/2024/empty.csv", Vec::<u8>::new());
        match read_file(&file) {
            Err(EtlError::Processing { key, cause }) => {
                assert_eq!(key, "raw/2024/empty.csv");
                assert_eq!(cause, "arquivo vazio");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
