//! SKU parsing into an [`ExpectedSpec`].

use std::collections::BTreeMap;
use std::fmt;

use speccheck_model::{ExpectedSpec, SpecField, SpecSheet};

use crate::matcher::match_keyword;

/// Ordered keyword lists per spec field, plus the battery grade tokens.
///
/// Order within a list is match priority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTable {
    keywords: BTreeMap<SpecField, Vec<String>>,
    grades: Vec<String>,
}

impl KeywordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the keyword list for `field`. Entries are trimmed and empty entries
    /// dropped.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, field: SpecField, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords.insert(field, clean_keywords(keywords));
        self
    }

    #[must_use]
    pub fn with_grades<I, S>(mut self, grades: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.grades = clean_keywords(grades);
        self
    }

    pub fn keywords(&self, field: SpecField) -> &[String] {
        self.keywords.get(&field).map_or(&[], Vec::as_slice)
    }

    pub fn grade_keywords(&self) -> &[String] {
        &self.grades
    }
}

/// Split a comma-separated keyword list as stored in configuration.
pub fn split_keyword_list(raw: &str) -> Vec<String> {
    clean_keywords(raw.split(','))
}

fn clean_keywords<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|keyword| keyword.as_ref().trim().to_string())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

/// Minimum battery health tier encoded in a SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryGrade {
    A,
    B,
    C,
}

impl BatteryGrade {
    /// Interpret a grade token such as `AGRADE`, `GRADE-B` or `C`.
    pub fn from_token(token: &str) -> Option<Self> {
        let letters: String = token
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_uppercase()
            .replace("GRADE", "");
        match letters.as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            _ => None,
        }
    }

    pub const fn min_health_percent(&self) -> u32 {
        match self {
            Self::A => 70,
            Self::B => 45,
            Self::C => 5,
        }
    }

    /// Expected battery value, e.g. `≥70%`.
    pub fn threshold(&self) -> String {
        format!("≥{}%", self.min_health_percent())
    }
}

impl fmt::Display for BatteryGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        };
        write!(f, "grade {letter}")
    }
}

/// Parse a SKU into the configuration it promises.
///
/// Fields without a matching keyword stay unknown. The same grade threshold is
/// expected of every installed battery.
pub fn parse_sku(sku: &str, table: &KeywordTable) -> ExpectedSpec {
    let mut sheet = SpecSheet::new();
    let matched = |field: SpecField| match_keyword(table.keywords(field), sku);

    if let Some(model) = matched(SpecField::Model) {
        sheet.set(SpecField::Model, model);
    }
    if let Some(cpu) = matched(SpecField::Cpu) {
        sheet.set(SpecField::Cpu, cpu);
    }
    if let Some(storage) = matched(SpecField::Storage) {
        sheet.set(SpecField::Storage, storage_value(storage));
    }
    if let Some(memory) = matched(SpecField::Memory) {
        sheet.set(SpecField::Memory, memory_value(memory));
    }
    if let Some(resolution) = matched(SpecField::Resolution) {
        sheet.set(SpecField::Resolution, resolution);
    }
    if let Some(edition) = matched(SpecField::OsEdition) {
        sheet.set(SpecField::OsEdition, os_edition_value(edition));
    }
    if let Some(grade) = match_grade(table.grade_keywords(), sku) {
        let threshold = grade.threshold();
        sheet.set(SpecField::Battery, threshold.clone());
        sheet.set(SpecField::SecondaryBattery, threshold);
    }

    tracing::debug!(sku = %sku, fields = sheet.iter().count(), "parsed sku");
    ExpectedSpec::new(sku, sheet)
}

/// First grade keyword that is contained in the SKU and names a grade.
///
/// Grade tokens use plain substring containment, independent of the
/// field keyword matcher. Contained tokens that name no known grade are
/// skipped.
pub fn match_grade<S: AsRef<str>>(grades: &[S], sku: &str) -> Option<BatteryGrade> {
    let upper = sku.to_uppercase();
    grades
        .iter()
        .map(AsRef::as_ref)
        .filter(|token| !token.trim().is_empty())
        .filter(|token| upper.contains(&token.to_uppercase()))
        .find_map(BatteryGrade::from_token)
}

fn storage_value(keyword: &str) -> String {
    let stripped = remove_ascii_ci(keyword, "SSD");
    if keyword.to_ascii_uppercase().contains("TB") {
        compact(&stripped)
    } else {
        format!("{}GB", compact(&remove_ascii_ci(&stripped, "GB")))
    }
}

fn memory_value(keyword: &str) -> String {
    let stripped = remove_ascii_ci(&remove_ascii_ci(keyword, "RAM"), "GB");
    format!("{}GB", compact(&stripped))
}

fn os_edition_value(keyword: &str) -> &'static str {
    if keyword.contains("11") {
        "Windows 11"
    } else {
        "Windows 10"
    }
}

/// Remove every ASCII case-insensitive occurrence of `token`.
fn remove_ascii_ci(value: &str, token: &str) -> String {
    let lower = value.to_ascii_lowercase();
    let needle = token.to_ascii_lowercase();
    let mut out = String::with_capacity(value.len());
    let mut cursor = 0;
    while let Some(offset) = lower[cursor..].find(&needle) {
        out.push_str(&value[cursor..cursor + offset]);
        cursor += offset + needle.len();
    }
    out.push_str(&value[cursor..]);
    out
}

fn compact(value: &str) -> String {
    value.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use speccheck_model::UNKNOWN;

    fn table() -> KeywordTable {
        KeywordTable::new()
            .with_keywords(SpecField::Model, ["T480", "T490", "X1"])
            .with_keywords(SpecField::Cpu, ["i3", "i5", "i7"])
            .with_keywords(SpecField::Storage, ["128SSD", "256SSD", "512SSD", "1TBSSD"])
            .with_keywords(SpecField::Memory, ["8GB", "16GB", "32GBRAM"])
            .with_keywords(SpecField::Resolution, ["1920x1080", "1366x768"])
            .with_keywords(SpecField::OsEdition, ["W10", "W11"])
            .with_grades(["AGRADE", "BGRADE", "CGRADE"])
    }

    #[test]
    fn parses_full_sku() {
        let spec = parse_sku("T480-I5-8GB-256SSD-W11-AGRADE", &table());
        assert_eq!(spec.get(SpecField::Model), "T480");
        assert_eq!(spec.get(SpecField::Cpu), "i5");
        assert_eq!(spec.get(SpecField::Memory), "8GB");
        assert_eq!(spec.get(SpecField::Storage), "256GB");
        assert_eq!(spec.get(SpecField::OsEdition), "Windows 11");
        assert_eq!(spec.get(SpecField::Battery), "≥70%");
        assert_eq!(spec.get(SpecField::SecondaryBattery), "≥70%");
        assert_eq!(spec.get(SpecField::Resolution), UNKNOWN);
        assert_eq!(spec.sku(), "T480-I5-8GB-256SSD-W11-AGRADE");
    }

    #[test]
    fn terabyte_storage_keeps_unit() {
        let spec = parse_sku("I7-16GB-1TBSSD-W10", &table());
        assert_eq!(spec.get(SpecField::Storage), "1TB");
        assert_eq!(spec.get(SpecField::OsEdition), "Windows 10");
    }

    #[test]
    fn memory_noise_tokens_are_stripped() {
        let spec = parse_sku("I7-32GBRAM-512SSD", &table());
        assert_eq!(spec.get(SpecField::Memory), "32GB");
        assert_eq!(spec.get(SpecField::Storage), "512GB");
    }

    #[test]
    fn unmatched_fields_stay_unknown() {
        let spec = parse_sku("MYSTERY-UNIT", &table());
        for field in SpecField::ALL {
            assert_eq!(spec.get(field), UNKNOWN, "{field}");
        }
    }

    #[test]
    fn grades_map_to_thresholds() {
        assert_eq!(parse_sku("X-BGRADE", &table()).get(SpecField::Battery), "≥45%");
        assert_eq!(parse_sku("X-cgrade", &table()).get(SpecField::Battery), "≥5%");
    }

    #[test]
    fn unrecognized_grade_token_is_unknown() {
        let table = KeywordTable::new().with_grades(["REFURB"]);
        assert_eq!(parse_sku("X-REFURB", &table).get(SpecField::Battery), UNKNOWN);
    }

    #[test]
    fn unrecognized_grade_token_does_not_hide_a_later_grade() {
        let table = KeywordTable::new().with_grades(["REFURB", "BGRADE"]);
        assert_eq!(
            parse_sku("T480-REFURB-BGRADE", &table).get(SpecField::Battery),
            "≥45%"
        );
        assert_eq!(
            match_grade(&["REFURB", "AGRADE", "BGRADE"], "X-REFURB-BGRADE"),
            Some(BatteryGrade::B)
        );
    }

    #[test]
    fn grade_tokens_accept_separators() {
        assert_eq!(BatteryGrade::from_token("Grade-A"), Some(BatteryGrade::A));
        assert_eq!(BatteryGrade::from_token("b"), Some(BatteryGrade::B));
        assert_eq!(BatteryGrade::from_token("DGRADE"), None);
    }

    #[test]
    fn split_trims_and_drops_empty_entries() {
        assert_eq!(split_keyword_list(" i5, i7,,i3 ,"), vec!["i5", "i7", "i3"]);
    }

    #[test]
    fn parsing_is_idempotent() {
        let table = table();
        let sku = "T490-I7-16GB-512SSD-W10-BGRADE";
        assert_eq!(parse_sku(sku, &table), parse_sku(sku, &table));
    }
}
