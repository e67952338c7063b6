use super::normalizer::normalize_name;
use crate::market::dataset::{DataLoadError, TableKind};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::sync::OnceLock;

static BUILTIN_ALIASES: OnceLock<AliasTable> = OnceLock::new();

/// Known spelling variants between the property, census and crime sources.
const ALIAS_TO_REGION: &[(&str, &str)] = &[
    // City centre
    ("Adelaide CBD", "Adelaide"),
    ("Adelaide City", "Adelaide"),
    ("Adelaid", "Adelaide"),
    ("City of Adelaide", "Adelaide"),
    ("Nth Adelaide", "North Adelaide"),
    // Abbreviated prefixes
    ("Mt Barker", "Mount Barker"),
    ("Mt Osmond", "Mount Osmond"),
    ("Mt Compass", "Mount Compass"),
    ("Pt Adelaide", "Port Adelaide"),
    ("Pt Noarlunga", "Port Noarlunga"),
    ("Pt Willunga", "Port Willunga"),
    ("Saint Peters", "St Peters"),
    ("Saint Marys", "St Marys"),
    ("Saint Agnes", "St Agnes"),
    ("Saint Morris", "St Morris"),
    ("Saint Georges", "St Georges"),
    ("Saint Clair", "St Clair"),
    // Census locality suffixes
    ("Glenelg (SA)", "Glenelg"),
    ("Salisbury (SA)", "Salisbury"),
    ("Norwood (SA)", "Norwood"),
];

/// Maps normalized name variants onto normalized canonical names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    /// The compiled-in alias list.
    pub fn builtin() -> &'static AliasTable {
        BUILTIN_ALIASES.get_or_init(|| {
            let mut table = AliasTable::default();
            for (alias, region) in ALIAS_TO_REGION {
                table.insert(alias, region);
            }
            table
        })
    }

    /// Builtin aliases extended with rows from an `Alias,Region` CSV.
    pub fn with_overrides<R: Read>(reader: R) -> Result<Self, DataLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut table = Self::builtin().clone();

        for row in csv_reader.deserialize::<AliasRow>() {
            let row = row.map_err(|source| DataLoadError::Csv {
                table: TableKind::Aliases,
                source,
            })?;
            if row.alias.trim().is_empty() || row.region.trim().is_empty() {
                continue;
            }
            table.insert(&row.alias, &row.region);
        }

        Ok(table)
    }

    pub fn insert(&mut self, alias: &str, region: &str) {
        let alias = normalize_name(alias);
        let region = normalize_name(region);
        if alias != region {
            self.entries.insert(alias, region);
        }
    }

    /// Canonical target for an already-normalized name, if it is a known alias.
    pub fn lookup(&self, normalized: &str) -> Option<&str> {
        self.entries.get(normalized).map(String::as_str)
    }

    /// Normalizes a raw source name and follows one alias hop.
    pub fn canonical_key(&self, raw: &str) -> String {
        let normalized = normalize_name(raw);
        match self.lookup(&normalized) {
            Some(region) => region.to_string(),
            None => normalized,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct AliasRow {
    #[serde(rename = "Alias")]
    alias: String,
    #[serde(rename = "Region")]
    region: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn builtin_aliases_reconcile_abbreviations() {
        let aliases = AliasTable::builtin();
        assert_eq!(aliases.canonical_key("Adelaid"), "ADELAIDE");
        assert_eq!(aliases.canonical_key("MT  BARKER"), "MOUNT BARKER");
        assert_eq!(aliases.canonical_key("saint-peters"), "ST PETERS");
        assert_eq!(aliases.canonical_key("Unley"), "UNLEY");
    }

    #[test]
    fn overrides_extend_builtin_entries() {
        let csv = "Alias,Region\nGlenelg Beach,Glenelg\n,Ignored\n";
        let aliases = AliasTable::with_overrides(Cursor::new(csv)).expect("aliases parse");
        assert_eq!(aliases.canonical_key("glenelg beach"), "GLENELG");
        assert_eq!(aliases.canonical_key("Adelaide CBD"), "ADELAIDE");
        assert_eq!(aliases.len(), AliasTable::builtin().len() + 1);
    }

    #[test]
    fn overrides_reject_malformed_csv() {
        let csv = "Alias\nonly-one-column\n";
        let error = AliasTable::with_overrides(Cursor::new(csv)).expect_err("missing column");
        assert!(matches!(
            error,
            DataLoadError::Csv {
                table: TableKind::Aliases,
                ..
            }
        ));
    }
}
