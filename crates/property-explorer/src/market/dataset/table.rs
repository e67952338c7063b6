use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Identifies each static input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Master,
    TimeSeries,
    Predictions,
    Risk,
    Rental,
    Demographics,
    Communities,
    Crime,
    Coordinates,
    Boundaries,
    Aliases,
}

impl TableKind {
    pub const fn ordered() -> [Self; 11] {
        [
            Self::Master,
            Self::TimeSeries,
            Self::Predictions,
            Self::Risk,
            Self::Rental,
            Self::Demographics,
            Self::Communities,
            Self::Crime,
            Self::Coordinates,
            Self::Boundaries,
            Self::Aliases,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Master => "Suburb master table",
            Self::TimeSeries => "Quarterly price series",
            Self::Predictions => "Price predictions",
            Self::Risk => "Risk analysis",
            Self::Rental => "Rental analysis",
            Self::Demographics => "Census demographics",
            Self::Communities => "Cultural communities",
            Self::Crime => "Crime offences",
            Self::Coordinates => "Suburb coordinates",
            Self::Boundaries => "Suburb boundaries",
            Self::Aliases => "Region aliases",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("{table} source was not provided")]
    NotProvided { table: TableKind },
    #[error("{table} file {} could not be opened: {source}", path.display())]
    MissingFile {
        table: TableKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{table} is missing required column(s): {}", columns.join(", "))]
    MissingColumns {
        table: TableKind,
        columns: Vec<String>,
    },
    #[error("invalid CSV data in {table}: {source}")]
    Csv {
        table: TableKind,
        #[source]
        source: csv::Error,
    },
    #[error("invalid JSON data in {table}: {source}")]
    Json {
        table: TableKind,
        #[source]
        source: serde_json::Error,
    },
    #[error("{table} record {record}: {detail}")]
    Malformed {
        table: TableKind,
        record: u64,
        detail: String,
    },
    #[error("{table} lists {quarter} twice for {region}")]
    DuplicateQuarter {
        table: TableKind,
        region: String,
        quarter: String,
    },
}

impl DataLoadError {
    pub fn table(&self) -> TableKind {
        match self {
            Self::NotProvided { table }
            | Self::MissingFile { table, .. }
            | Self::MissingColumns { table, .. }
            | Self::Csv { table, .. }
            | Self::Json { table, .. }
            | Self::Malformed { table, .. }
            | Self::DuplicateQuarter { table, .. } => *table,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Keyed<T> {
    pub(crate) name: String,
    pub(crate) value: T,
}

/// Rows of one source indexed by canonical region key.
#[derive(Debug, Clone)]
pub struct RegionTable<T> {
    entries: BTreeMap<String, Keyed<T>>,
}

impl<T> Default for RegionTable<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> RegionTable<T> {
    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Source spelling of the region name for `key`.
    pub fn name(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|entry| entry.name.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.as_str(), &entry.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entry_or_insert_with(
        &mut self,
        key: String,
        name: &str,
        default: impl FnOnce() -> T,
    ) -> &mut T {
        &mut self
            .entries
            .entry(key)
            .or_insert_with(|| Keyed {
                name: name.to_string(),
                value: default(),
            })
            .value
    }

    /// Inserts unless the key exists; returns `false` for a duplicate.
    pub(crate) fn insert_first(&mut self, key: String, name: &str, value: T) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(
            key,
            Keyed {
                name: name.to_string(),
                value,
            },
        );
        true
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.entries
            .iter_mut()
            .map(|(key, entry)| (key.as_str(), &mut entry.value))
    }
}

/// Outcome of loading one source.
#[derive(Debug)]
pub enum TableSlot<T> {
    Loaded(RegionTable<T>),
    Failed(DataLoadError),
}

impl<T> TableSlot<T> {
    pub fn lookup(&self, key: &str) -> Availability<&T> {
        match self {
            TableSlot::Loaded(table) => match table.get(key) {
                Some(value) => Availability::Available(value),
                None => Availability::Missing,
            },
            TableSlot::Failed(error) => Availability::TableUnavailable(error),
        }
    }

    pub fn table(&self) -> Option<&RegionTable<T>> {
        match self {
            TableSlot::Loaded(table) => Some(table),
            TableSlot::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&DataLoadError> {
        match self {
            TableSlot::Loaded(_) => None,
            TableSlot::Failed(error) => Some(error),
        }
    }
}

impl<T> From<Result<RegionTable<T>, DataLoadError>> for TableSlot<T> {
    fn from(value: Result<RegionTable<T>, DataLoadError>) -> Self {
        match value {
            Ok(table) => TableSlot::Loaded(table),
            Err(error) => TableSlot::Failed(error),
        }
    }
}

/// What one source knows about a region.
#[derive(Debug)]
pub enum Availability<'a, T> {
    Available(T),
    /// The source loaded but has no rows for the region.
    Missing,
    /// The source itself failed to load.
    TableUnavailable(&'a DataLoadError),
}

impl<'a, T> Availability<'a, T> {
    pub fn available(&self) -> Option<&T> {
        match self {
            Availability::Available(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }
}

impl<'a, T: Copy> Clone for Availability<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: Copy> Copy for Availability<'a, T> {}
