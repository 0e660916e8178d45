//! Column-name canonicalisation and period detection.
//!
//! Source exports spell the same column many ways (`Município`, `MUNICIPIO`,
//! `Munic-ípio`). Every comparison in the engine goes through
//! [`normalize_text`] first, and [`is_period`] is the single gate deciding
//! which normalized names are epidemiological weeks or calendar months.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Accent-free Portuguese month names, in calendar order.
pub const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "marco",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

// Week codes carry no upper bound: "se99" is accepted.
static WEEK_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^se\d{1,2}$").expect("week code pattern is valid"));

/// Canonical comparison key for a header or column string.
///
/// NFKD-decomposes, drops every non-ASCII character (diacritics included),
/// lowercases and removes spaces and hyphens. Idempotent.
pub fn normalize_text(text: &str) -> String {
    text.nfkd()
        .filter(|c| c.is_ascii())
        .filter(|c| *c != ' ' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// `true` when an already-normalized name is a week code (`se7`) or a month.
pub fn is_period(normalized: &str) -> bool {
    WEEK_CODE.is_match(normalized) || MONTHS.contains(&normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_accents_and_separators() {
        assert_eq!(normalize_text("Município-Teste"), "municipioteste");
        assert_eq!(normalize_text("Código IBGE"), "codigoibge");
        assert_eq!(normalize_text("  Março "), "marco");
    }

    #[test]
    fn test_normalize_keeps_underscores() {
        assert_eq!(normalize_text("NOME_RS"), "nome_rs");
    }

    #[test]
    fn test_normalize_drops_non_latin() {
        assert_eq!(normalize_text("SE1 ✓"), "se1");
        assert_eq!(normalize_text("日本"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Município-Teste",
            "SE 01",
            "Ação Nº 3",
            "  Tab\tAnd-Dash ",
            "",
            "ﬁ ligature",
            "São Paulo do Potengi",
        ];
        for s in samples {
            let once = normalize_text(s);
            assert_eq!(normalize_text(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_is_period_week_codes() {
        assert!(is_period("se1"));
        assert!(is_period("se7"));
        assert!(is_period("se52"));
        assert!(is_period("se53"));
        assert!(is_period("se99"));
        assert!(!is_period("se100"));
        assert!(!is_period("se"));
        assert!(!is_period("semana"));
        assert!(!is_period("xse1"));
    }

    #[test]
    fn test_is_period_months() {
        assert!(is_period("fevereiro"));
        assert!(is_period("marco"));
        assert!(is_period(&normalize_text("Março")));
        assert!(!is_period("março"));
        assert!(!is_period("totalgeral"));
        assert!(!is_period("municipio"));
    }
}
