//! Row projection and field discovery.
//!
//! A parsed CSV row is projected onto normalized column keys, then the
//! municipality and administrative-code fields are discovered with named
//! substring matchers. Different exports call the same column
//! `Município de residência`, `MunRes`, `NOME_RS`, `Código IBGE` or `CodRS`.

use dengue_core::text::is_period;

use crate::layout::HeaderRow;

// ── ParsedRecord ──────────────────────────────────────────────────────────────

/// One cell of a projected row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Normalized column name.
    pub key: String,
    /// Column name as written in the header.
    pub column: String,
    /// Trimmed cell value.
    pub value: String,
}

/// A data row keyed by normalized column name, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    fields: Vec<Field>,
}

impl ParsedRecord {
    /// Zip header columns with row values.
    ///
    /// Columns with an empty name are skipped, values past the last column
    /// are ignored and missing trailing values read as empty. When two
    /// columns normalize to the same key the later one wins but keeps the
    /// earlier position.
    pub fn project<'v>(header: &HeaderRow, values: impl IntoIterator<Item = &'v str>) -> Self {
        let mut values = values.into_iter();
        let mut record = ParsedRecord::default();

        for (raw, key) in header.raw.iter().zip(&header.normalized) {
            let value = values.next().unwrap_or("").trim().to_string();
            if raw.is_empty() {
                continue;
            }
            record.insert(Field {
                key: key.clone(),
                column: raw.clone(),
                value,
            });
        }

        record
    }

    fn insert(&mut self, field: Field) {
        match self.fields.iter_mut().find(|f| f.key == field.key) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }

    /// Fields whose normalized key is a week or month, in row order.
    pub fn periods(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .filter(|f| is_period(&f.key))
    }
}

// ── FieldMatcher ──────────────────────────────────────────────────────────────

/// A named set of substrings identifying one logical column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMatcher {
    pub name: &'static str,
    pub needles: &'static [&'static str],
}

/// Municipality (or regional health district) name column.
pub const MUNICIPALITY: FieldMatcher = FieldMatcher {
    name: "municipality",
    needles: &["municipio", "munres", "nome_rs"],
};

/// Administrative code column (IBGE municipality code or regional code).
pub const ADMIN_CODE: FieldMatcher = FieldMatcher {
    name: "admin_code",
    needles: &["codigo", "codrs"],
};

impl FieldMatcher {
    /// `true` when `key` contains any of the needles.
    pub fn matches(&self, key: &str) -> bool {
        self.needles.iter().any(|n| key.contains(n))
    }

    /// First field in row order whose key matches.
    pub fn find<'r>(&self, record: &'r ParsedRecord) -> Option<&'r Field> {
        record.fields().iter().find(|f| self.matches(&f.key))
    }
}

// ── Row classification ────────────────────────────────────────────────────────

/// Identity of a row that survived classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIdentity {
    pub municipality: String,
    pub code: Option<String>,
}

/// Result of classifying one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted(RowIdentity),
    /// No municipality column, or an empty municipality value.
    Rejected { matched_key: Option<String> },
}

/// Resolve the municipality and administrative code of a row.
pub fn classify_row(record: &ParsedRecord) -> RowOutcome {
    let municipality = MUNICIPALITY.find(record);
    let code = ADMIN_CODE.find(record).map(|f| f.value.clone());

    match municipality {
        Some(field) if !field.value.is_empty() => RowOutcome::Accepted(RowIdentity {
            municipality: field.value.clone(),
            code,
        }),
        other => RowOutcome::Rejected {
            matched_key: other.map(|f| f.key.clone()),
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
