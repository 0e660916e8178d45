use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::normalize_text;

/// Year key used when a storage key carries no `20dd` directory segment.
pub const UNKNOWN_YEAR: &str = "desconhecido";

/// Classification tag attached to every period record.
pub const CASE_TYPE: &str = "autóctone";

/// Token in a normalized storage key marking a monthly export.
const MONTHLY_MARKER: &str = "mes";

static YEAR_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^20\d{2}$").expect("year pattern is valid"));

/// One source object: its storage key and undecoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub key: String,
    pub bytes: Vec<u8>,
}

impl RawFile {
    pub fn new(key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            bytes: bytes.into(),
        }
    }

    /// Year inferred from the first directory segment that reads `2000`..`2099`,
    /// or [`UNKNOWN_YEAR`].
    pub fn year(&self) -> String {
        let mut segments: Vec<&str> = self.key.split('/').collect();
        // The last segment is the file name, never a year folder.
        segments.pop();
        segments
            .into_iter()
            .find(|s| YEAR_SEGMENT.is_match(s))
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_YEAR.to_string())
    }

    /// Frequency of every period in this file, taken from its key.
    pub fn frequency(&self) -> Frequency {
        Frequency::from_key(&self.key)
    }
}

/// Temporal granularity of a file's period columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Frequency {
    #[serde(rename = "semanal")]
    Weekly,
    #[serde(rename = "mensal")]
    Monthly,
}

impl Frequency {
    /// Monthly when the normalized key contains `mes`, weekly otherwise.
    pub fn from_key(key: &str) -> Self {
        if normalize_text(key).contains(MONTHLY_MARKER) {
            Frequency::Monthly
        } else {
            Frequency::Weekly
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "semanal",
            Frequency::Monthly => "mensal",
        }
    }
}

/// Case count for one municipality in one week or month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodEntry {
    /// Column name exactly as it appears in the source header.
    pub periodo: String,
    pub casos: i64,
    /// Administrative (IBGE or regional) code, when the row has one.
    pub codigo_ibge: Option<String>,
    pub tipo: String,
}

impl PeriodEntry {
    pub fn new(periodo: impl Into<String>, casos: i64, codigo_ibge: Option<String>) -> Self {
        Self {
            periodo: periodo.into(),
            casos,
            codigo_ibge,
            tipo: CASE_TYPE.to_string(),
        }
    }
}

/// `year → municipality → frequency → entries`.
pub type MunicipalityTree = BTreeMap<String, BTreeMap<Frequency, Vec<PeriodEntry>>>;

/// The whole output document.
///
/// Intermediate levels are created on demand by [`AggregateTree::push`];
/// leaf lists only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateTree {
    years: BTreeMap<String, MunicipalityTree>,
}

impl AggregateTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry` under `(year, municipality, frequency)`.
    pub fn push(
        &mut self,
        year: &str,
        municipality: &str,
        frequency: Frequency,
        entry: PeriodEntry,
    ) {
        self.years
            .entry(year.to_string())
            .or_default()
            .entry(municipality.to_string())
            .or_default()
            .entry(frequency)
            .or_default()
            .push(entry);
    }

    /// Entries recorded for one leaf, if any.
    pub fn entries(
        &self,
        year: &str,
        municipality: &str,
        frequency: Frequency,
    ) -> Option<&[PeriodEntry]> {
        self.years
            .get(year)?
            .get(municipality)?
            .get(&frequency)
            .map(Vec::as_slice)
    }

    pub fn years(&self) -> impl Iterator<Item = (&String, &MunicipalityTree)> {
        self.years.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Total number of period entries across all leaves.
    pub fn entry_count(&self) -> usize {
        self.years
            .values()
            .flat_map(|m| m.values())
            .flat_map(|f| f.values())
            .map(Vec::len)
            .sum()
    }

    /// UTF-8 JSON document with non-ASCII characters kept literal.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_year_from_folder() {
        let file = RawFile::new("dengue_data_raw/2024/municipios.csv", Vec::<u8>::new());
        assert_eq!(file.year(), "2024");
    }

    #[test]
    fn test_year_unknown_when_absent() {
        assert_eq!(RawFile::new("dengue_data_raw/a.csv", Vec::<u8>::new()).year(), UNKNOWN_YEAR);
        assert_eq!(RawFile::new("dengue_data_raw/1999/a.csv", Vec::<u8>::new()).year(), UNKNOWN_YEAR);
        assert_eq!(RawFile::new("dengue_data_raw/20245/a.csv", Vec::<u8>::new()).year(), UNKNOWN_YEAR);
    }

    #[test]
    fn test_year_ignores_file_name() {
        assert_eq!(RawFile::new("dengue_data_raw/2023", Vec::<u8>::new()).year(), UNKNOWN_YEAR);
        assert_eq!(RawFile::new("raw/2023/2021", Vec::<u8>::new()).year(), "2023");
    }

    #[test]
    fn test_frequency_from_key() {
        assert_eq!(Frequency::from_key("dengue_data_raw/2024/casos_mes.csv"), Frequency::Monthly);
        assert_eq!(Frequency::from_key("dengue_data_raw/2024/MESES.csv"), Frequency::Monthly);
        assert_eq!(Frequency::from_key("dengue_data_raw/2024/semana.csv"), Frequency::Weekly);
    }

    #[test]
    fn test_push_creates_levels_and_appends() {
        let mut tree = AggregateTree::new();
        tree.push("2024", "Cidade X", Frequency::Weekly, PeriodEntry::new("SE1", 3, None));
        tree.push("2024", "Cidade X", Frequency::Weekly, PeriodEntry::new("SE1", 4, None));
        tree.push("2024", "Cidade X", Frequency::Monthly, PeriodEntry::new("Janeiro", 1, None));

        let weekly = tree.entries("2024", "Cidade X", Frequency::Weekly).unwrap();
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[0].casos, 3);
        assert_eq!(weekly[1].casos, 4);
        assert_eq!(tree.entry_count(), 3);
        assert!(tree.entries("2023", "Cidade X", Frequency::Weekly).is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let mut tree = AggregateTree::new();
        tree.push(
            "2024",
            "São José",
            Frequency::Weekly,
            PeriodEntry::new("SE1", 10, Some("4216602".to_string())),
        );

        let value: serde_json::Value = serde_json::from_slice(&tree.to_json_bytes().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"2024": {"São José": {"semanal": [
                {"periodo": "SE1", "casos": 10, "codigo_ibge": "4216602", "tipo": "autóctone"}
            ]}}})
        );
    }

    #[test]
    fn test_serialization_keeps_non_ascii_literal() {
        let mut tree = AggregateTree::new();
        tree.push("2024", "Itajaí", Frequency::Monthly, PeriodEntry::new("Março", 0, None));
        let text = String::from_utf8(tree.to_json_bytes().unwrap()).unwrap();
        assert!(text.contains("Itajaí"));
        assert!(text.contains("autóctone"));
        assert!(text.contains("\"codigo_ibge\":null"));
        assert!(!text.contains("\\u"));
    }
}
