//! Static dataset loading.
//!
//! Every source is parsed on its own so a broken file only disables the views
//! built on it. Rows are indexed by canonical region key (normalized name with
//! aliases applied), which is what lets the resolver join tables whose region
//! spellings differ.

mod cache;
pub mod domain;
mod geo;
mod parser;
mod table;

pub use cache::{shared, DatasetCache};
pub use domain::{
    CommunityRecord, Coordinate, CrimeRecord, DemographicProfile, PredictionRecord,
    PropertyProfile, Quarter, RentalRecord, RiskRecord, Scenario, TimeSeriesPoint,
};
pub use table::{Availability, DataLoadError, RegionTable, TableKind, TableSlot};

use crate::config::DataConfig;
use crate::market::resolver::AliasTable;
use parser::{
    CommunityRow, CrimeRow, DemographicRow, MasterRow, PredictionRow, RentalRow, RiskRow,
    SourceRow, TimeSeriesRow,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// All loaded sources. Immutable once built.
#[derive(Debug)]
pub struct DatasetBundle {
    pub(crate) aliases: AliasTable,
    pub(crate) alias_error: Option<DataLoadError>,
    regions: BTreeMap<String, String>,
    pub master: TableSlot<PropertyProfile>,
    pub time_series: TableSlot<Vec<TimeSeriesPoint>>,
    pub predictions: TableSlot<Vec<PredictionRecord>>,
    pub risk: TableSlot<RiskRecord>,
    pub rental: TableSlot<Vec<RentalRecord>>,
    pub demographics: TableSlot<DemographicProfile>,
    pub communities: TableSlot<Vec<CommunityRecord>>,
    pub crime: TableSlot<Vec<CrimeRecord>>,
    pub coordinates: TableSlot<Coordinate>,
    pub boundaries: TableSlot<Value>,
}

impl DatasetBundle {
    /// Reads every configured file. Never fails as a whole.
    pub fn load(config: &DataConfig) -> Self {
        info!(data_dir = %config.data_dir.display(), "loading property datasets");

        let mut builder = DatasetBuilder::new();
        let alias_path = config.resolve(&config.aliases);
        if alias_path.is_file() {
            builder = match open(TableKind::Aliases, &alias_path) {
                Ok(reader) => builder.aliases(reader),
                Err(error) => builder.alias_error(error),
            };
        } else {
            debug!(path = %alias_path.display(), "no alias override file; using builtin aliases");
        }

        let bundle = builder
            .source(TableKind::Master, open(TableKind::Master, &config.resolve(&config.master)))
            .source(
                TableKind::TimeSeries,
                open(TableKind::TimeSeries, &config.resolve(&config.time_series)),
            )
            .source(
                TableKind::Predictions,
                open(TableKind::Predictions, &config.resolve(&config.predictions)),
            )
            .source(TableKind::Risk, open(TableKind::Risk, &config.resolve(&config.risk)))
            .source(TableKind::Rental, open(TableKind::Rental, &config.resolve(&config.rental)))
            .source(
                TableKind::Demographics,
                open(TableKind::Demographics, &config.resolve(&config.demographics)),
            )
            .source(
                TableKind::Communities,
                open(TableKind::Communities, &config.resolve(&config.communities)),
            )
            .source(TableKind::Crime, open(TableKind::Crime, &config.resolve(&config.crime)))
            .source(
                TableKind::Coordinates,
                open(TableKind::Coordinates, &config.resolve(&config.coordinates)),
            )
            .source(
                TableKind::Boundaries,
                open(TableKind::Boundaries, &config.resolve(&config.boundaries)),
            )
            .build();

        bundle.log_summary();
        bundle
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Canonical key to display name for every region known to any table.
    pub fn regions(&self) -> &BTreeMap<String, String> {
        &self.regions
    }

    pub fn region_name(&self, key: &str) -> Option<&str> {
        self.regions.get(key).map(String::as_str)
    }

    pub fn summary(&self) -> LoadSummary {
        let tables = TableKind::ordered()
            .into_iter()
            .map(|table| self.table_status(table))
            .collect();

        LoadSummary {
            regions: self.regions.len(),
            tables,
        }
    }

    fn table_status(&self, table: TableKind) -> TableStatus {
        fn status<T>(table: TableKind, slot: &TableSlot<T>) -> TableStatus {
            TableStatus {
                table,
                label: table.label(),
                loaded: slot.table().is_some(),
                regions: slot.table().map(RegionTable::len).unwrap_or(0),
                error: slot.error().map(ToString::to_string),
            }
        }

        match table {
            TableKind::Master => status(table, &self.master),
            TableKind::TimeSeries => status(table, &self.time_series),
            TableKind::Predictions => status(table, &self.predictions),
            TableKind::Risk => status(table, &self.risk),
            TableKind::Rental => status(table, &self.rental),
            TableKind::Demographics => status(table, &self.demographics),
            TableKind::Communities => status(table, &self.communities),
            TableKind::Crime => status(table, &self.crime),
            TableKind::Coordinates => status(table, &self.coordinates),
            TableKind::Boundaries => status(table, &self.boundaries),
            TableKind::Aliases => TableStatus {
                table,
                label: table.label(),
                loaded: self.alias_error.is_none(),
                regions: self.aliases.len(),
                error: self.alias_error.as_ref().map(ToString::to_string),
            },
        }
    }

    fn log_summary(&self) {
        for status in self.summary().tables {
            match &status.error {
                None => info!(table = status.label, regions = status.regions, "table loaded"),
                Some(error) => warn!(table = status.label, %error, "table unavailable"),
            }
        }
    }
}

/// Per-table load outcome for status endpoints and CLI output.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub regions: usize,
    pub tables: Vec<TableStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableStatus {
    pub table: TableKind,
    pub label: &'static str,
    pub loaded: bool,
    pub regions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn open(table: TableKind, path: &Path) -> Result<BufReader<File>, DataLoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| DataLoadError::MissingFile {
            table,
            path: path.to_path_buf(),
            source,
        })
}

/// Assembles a [`DatasetBundle`] from readers. Sources never supplied are
/// recorded as [`DataLoadError::NotProvided`].
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    aliases: Option<AliasTable>,
    alias_error: Option<DataLoadError>,
    master: Option<Result<Vec<MasterRow>, DataLoadError>>,
    time_series: Option<Result<Vec<TimeSeriesRow>, DataLoadError>>,
    predictions: Option<Result<Vec<PredictionRow>, DataLoadError>>,
    risk: Option<Result<Vec<RiskRow>, DataLoadError>>,
    rental: Option<Result<Vec<RentalRow>, DataLoadError>>,
    demographics: Option<Result<Vec<DemographicRow>, DataLoadError>>,
    communities: Option<Result<Vec<CommunityRow>, DataLoadError>>,
    crime: Option<Result<Vec<CrimeRow>, DataLoadError>>,
    coordinates: Option<Result<BTreeMap<String, Coordinate>, DataLoadError>>,
    boundaries: Option<Result<Vec<(String, Value)>, DataLoadError>>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extends the builtin aliases with an `Alias,Region` CSV.
    pub fn aliases<R: Read>(mut self, reader: R) -> Self {
        match AliasTable::with_overrides(reader) {
            Ok(table) => self.aliases = Some(table),
            Err(error) => self.alias_error = Some(error),
        }
        self
    }

    fn alias_error(mut self, error: DataLoadError) -> Self {
        self.alias_error = Some(error);
        self
    }

    /// Supplies one source, or the error raised while opening it.
    pub fn source<R: Read>(self, table: TableKind, reader: Result<R, DataLoadError>) -> Self {
        match reader {
            Ok(reader) => self.with_reader(table, reader),
            Err(error) => self.with_error(table, error),
        }
    }

    pub fn master<R: Read>(self, reader: R) -> Self {
        self.with_reader(TableKind::Master, reader)
    }

    pub fn time_series<R: Read>(self, reader: R) -> Self {
        self.with_reader(TableKind::TimeSeries, reader)
    }

    pub fn predictions<R: Read>(self, reader: R) -> Self {
        self.with_reader(TableKind::Predictions, reader)
    }

    pub fn risk<R: Read>(self, reader: R) -> Self {
        self.with_reader(TableKind::Risk, reader)
    }

    pub fn rental<R: Read>(self, reader: R) -> Self {
        self.with_reader(TableKind::Rental, reader)
    }

    pub fn demographics<R: Read>(self, reader: R) -> Self {
        self.with_reader(TableKind::Demographics, reader)
    }

    pub fn communities<R: Read>(self, reader: R) -> Self {
        self.with_reader(TableKind::Communities, reader)
    }

    pub fn crime<R: Read>(self, reader: R) -> Self {
        self.with_reader(TableKind::Crime, reader)
    }

    pub fn coordinates<R: Read>(self, reader: R) -> Self {
        self.with_reader(TableKind::Coordinates, reader)
    }

    pub fn boundaries<R: Read>(self, reader: R) -> Self {
        self.with_reader(TableKind::Boundaries, reader)
    }

    fn with_reader<R: Read>(mut self, table: TableKind, reader: R) -> Self {
        match table {
            TableKind::Master => self.master = Some(parser::read_rows(reader)),
            TableKind::TimeSeries => self.time_series = Some(parser::read_rows(reader)),
            TableKind::Predictions => self.predictions = Some(parser::read_rows(reader)),
            TableKind::Risk => self.risk = Some(parser::read_rows(reader)),
            TableKind::Rental => self.rental = Some(parser::read_rows(reader)),
            TableKind::Demographics => self.demographics = Some(parser::read_rows(reader)),
            TableKind::Communities => self.communities = Some(parser::read_rows(reader)),
            TableKind::Crime => self.crime = Some(parser::read_rows(reader)),
            TableKind::Coordinates => self.coordinates = Some(geo::read_coordinates(reader)),
            TableKind::Boundaries => self.boundaries = Some(geo::read_boundaries(reader)),
            TableKind::Aliases => return self.aliases(reader),
        }
        self
    }

    fn with_error(mut self, table: TableKind, error: DataLoadError) -> Self {
        match table {
            TableKind::Master => self.master = Some(Err(error)),
            TableKind::TimeSeries => self.time_series = Some(Err(error)),
            TableKind::Predictions => self.predictions = Some(Err(error)),
            TableKind::Risk => self.risk = Some(Err(error)),
            TableKind::Rental => self.rental = Some(Err(error)),
            TableKind::Demographics => self.demographics = Some(Err(error)),
            TableKind::Communities => self.communities = Some(Err(error)),
            TableKind::Crime => self.crime = Some(Err(error)),
            TableKind::Coordinates => self.coordinates = Some(Err(error)),
            TableKind::Boundaries => self.boundaries = Some(Err(error)),
            TableKind::Aliases => self.alias_error = Some(error),
        }
        self
    }

    pub fn build(self) -> DatasetBundle {
        let aliases = self
            .aliases
            .unwrap_or_else(|| AliasTable::builtin().clone());

        let master = slot(TableKind::Master, self.master, |rows| {
            Ok(index_master(&aliases, rows))
        });
        let time_series = slot(TableKind::TimeSeries, self.time_series, |rows| {
            index_time_series(&aliases, rows)
        });
        let predictions = slot(TableKind::Predictions, self.predictions, |rows| {
            index_predictions(&aliases, rows)
        });
        let risk = slot(TableKind::Risk, self.risk, |rows| Ok(index_risk(&aliases, rows)));
        let rental = slot(TableKind::Rental, self.rental, |rows| {
            Ok(index_rental(&aliases, rows))
        });
        let demographics = slot(TableKind::Demographics, self.demographics, |rows| {
            Ok(index_demographics(&aliases, rows))
        });
        let communities = slot(TableKind::Communities, self.communities, |rows| {
            Ok(index_communities(&aliases, rows))
        });
        let crime = slot(TableKind::Crime, self.crime, |rows| {
            Ok(index_crime(&aliases, rows))
        });
        let coordinates = slot(TableKind::Coordinates, self.coordinates, |rows| {
            Ok(index_named(&aliases, rows))
        });
        let boundaries = slot(TableKind::Boundaries, self.boundaries, |rows| {
            Ok(index_named(&aliases, rows))
        });

        let mut regions = BTreeMap::new();
        collect_regions(&mut regions, &master);
        collect_regions(&mut regions, &time_series);
        collect_regions(&mut regions, &predictions);
        collect_regions(&mut regions, &risk);
        collect_regions(&mut regions, &rental);
        collect_regions(&mut regions, &demographics);
        collect_regions(&mut regions, &communities);
        collect_regions(&mut regions, &crime);
        // Map-only regions resolve last so data tables keep display-name priority.
        collect_regions(&mut regions, &coordinates);
        collect_regions(&mut regions, &boundaries);

        DatasetBundle {
            aliases,
            alias_error: self.alias_error,
            regions,
            master,
            time_series,
            predictions,
            risk,
            rental,
            demographics,
            communities,
            crime,
            coordinates,
            boundaries,
        }
    }
}

fn slot<S, T>(
    table: TableKind,
    rows: Option<Result<S, DataLoadError>>,
    index: impl FnOnce(S) -> Result<RegionTable<T>, DataLoadError>,
) -> TableSlot<T> {
    match rows {
        None => TableSlot::Failed(DataLoadError::NotProvided { table }),
        Some(Err(error)) => TableSlot::Failed(error),
        Some(Ok(rows)) => index(rows).into(),
    }
}

/// First spelling wins; the master table is collected first so its names are
/// the display names.
fn collect_regions<T>(regions: &mut BTreeMap<String, String>, slot: &TableSlot<T>) {
    if let Some(table) = slot.table() {
        for key in table.keys() {
            if !regions.contains_key(key) {
                let name = table.name(key).unwrap_or(key).to_string();
                regions.insert(key.to_string(), name);
            }
        }
    }
}

fn index_master(aliases: &AliasTable, rows: Vec<MasterRow>) -> RegionTable<PropertyProfile> {
    let mut table = RegionTable::default();
    for row in rows {
        let key = aliases.canonical_key(&row.suburb);
        let quarter_count = row
            .quarter_count
            .map(|count| u32::try_from(count).unwrap_or(u32::MAX));
        let profile = PropertyProfile {
            region: row.suburb.trim().to_string(),
            current_price: row.current_price,
            first_price: row.first_price,
            growth_amount: row.growth_amount,
            growth_percent: row.growth_percent,
            average_price: row.average_price,
            median_price: row.median_price,
            min_price: row.min_price,
            max_price: row.max_price,
            volatility: row.volatility,
            quarter_count,
        };
        if !table.insert_first(key, row.suburb.trim(), profile) {
            warn!(table = %MasterRow::TABLE, region = %row.suburb, "duplicate region row ignored");
        }
    }
    table
}

fn index_time_series(
    aliases: &AliasTable,
    rows: Vec<TimeSeriesRow>,
) -> Result<RegionTable<Vec<TimeSeriesPoint>>, DataLoadError> {
    let mut table: RegionTable<Vec<TimeSeriesPoint>> = RegionTable::default();
    for (index, row) in rows.into_iter().enumerate() {
        let record = index as u64 + 1;
        let label = row.period_label().ok_or_else(|| DataLoadError::Malformed {
            table: TableKind::TimeSeries,
            record,
            detail: "row has neither Period nor Year/Quarter".to_string(),
        })?;
        let quarter = Quarter::parse(&label).ok_or_else(|| DataLoadError::Malformed {
            table: TableKind::TimeSeries,
            record,
            detail: format!("'{label}' is not a recognizable quarter"),
        })?;
        let key = aliases.canonical_key(&row.suburb);
        let points = table.entry_or_insert_with(key, row.suburb.trim(), Vec::new);
        if points.iter().any(|point| point.quarter == quarter) {
            return Err(DataLoadError::DuplicateQuarter {
                table: TableKind::TimeSeries,
                region: row.suburb.trim().to_string(),
                quarter: quarter.to_string(),
            });
        }
        match row.median_price {
            Some(median_price) => points.push(TimeSeriesPoint {
                quarter,
                median_price,
            }),
            None => debug!(region = %row.suburb, %quarter, "quarter without a median price"),
        }
    }

    for (key, points) in table.values_mut() {
        points.sort_by_key(|point| point.quarter);
        for pair in points.windows(2) {
            let gap = pair[1].quarter.ordinal() - pair[0].quarter.ordinal();
            if gap > 1 {
                warn!(
                    region = key,
                    after = %pair[0].quarter,
                    missing = gap - 1,
                    "gap in quarterly price series"
                );
            }
        }
    }

    Ok(table)
}

fn index_predictions(
    aliases: &AliasTable,
    rows: Vec<PredictionRow>,
) -> Result<RegionTable<Vec<PredictionRecord>>, DataLoadError> {
    let mut table: RegionTable<Vec<PredictionRecord>> = RegionTable::default();
    for (index, row) in rows.into_iter().enumerate() {
        let record = index as u64 + 1;
        let (Some(year), Some(predicted_price)) = (row.year, row.predicted_price) else {
            continue;
        };
        let raw_scenario = row.scenario.as_deref().unwrap_or("base");
        let scenario = Scenario::parse(raw_scenario).ok_or_else(|| DataLoadError::Malformed {
            table: TableKind::Predictions,
            record,
            detail: format!("unknown scenario '{raw_scenario}'"),
        })?;
        let year = i32::try_from(year).map_err(|_| DataLoadError::Malformed {
            table: TableKind::Predictions,
            record,
            detail: format!("year {year} out of range"),
        })?;

        let key = aliases.canonical_key(&row.suburb);
        table
            .entry_or_insert_with(key, row.suburb.trim(), Vec::new)
            .push(PredictionRecord {
                year,
                scenario,
                predicted_price,
            });
    }

    for (_, records) in table.values_mut() {
        records.sort_by(|a, b| a.year.cmp(&b.year).then(a.scenario.cmp(&b.scenario)));
        records.dedup_by(|later, earlier| {
            later.year == earlier.year && later.scenario == earlier.scenario
        });
    }

    Ok(table)
}

fn index_risk(aliases: &AliasTable, rows: Vec<RiskRow>) -> RegionTable<RiskRecord> {
    let mut table = RegionTable::default();
    for row in rows {
        let Some(score) = row.score else {
            continue;
        };
        let key = aliases.canonical_key(&row.suburb);
        let record = RiskRecord {
            score,
            investment_strategy: row.investment_strategy,
            risk_adjusted_return: row.risk_adjusted_return,
            value_category: row.value_category,
        };
        if !table.insert_first(key, row.suburb.trim(), record) {
            warn!(table = %RiskRow::TABLE, region = %row.suburb, "duplicate region row ignored");
        }
    }
    table
}

fn index_rental(aliases: &AliasTable, rows: Vec<RentalRow>) -> RegionTable<Vec<RentalRecord>> {
    let mut table: RegionTable<Vec<RentalRecord>> = RegionTable::default();
    for row in rows {
        let (Some(fair_rent), Some(actual_rent)) = (row.fair_rent, row.actual_rent) else {
            continue;
        };
        let key = aliases.canonical_key(&row.suburb);
        table
            .entry_or_insert_with(key, row.suburb.trim(), Vec::new)
            .push(RentalRecord {
                property_type: row.property_type.unwrap_or_else(|| "All".to_string()),
                fair_rent,
                actual_rent,
            });
    }
    table
}

fn index_demographics(
    aliases: &AliasTable,
    rows: Vec<DemographicRow>,
) -> RegionTable<DemographicProfile> {
    let mut table = RegionTable::default();
    for row in rows {
        let key = aliases.canonical_key(&row.suburb);
        let profile = DemographicProfile {
            population: row.population,
            median_age: row.median_age,
            household_size: row.household_size,
            household_income_weekly: row.household_income_weekly,
            personal_income_weekly: row.personal_income_weekly,
            mortgage_monthly: row.mortgage_monthly,
            rent_weekly: row.rent_weekly,
        };
        if !table.insert_first(key, row.suburb.trim(), profile) {
            warn!(table = %DemographicRow::TABLE, region = %row.suburb, "duplicate region row ignored");
        }
    }
    table
}

fn index_communities(
    aliases: &AliasTable,
    rows: Vec<CommunityRow>,
) -> RegionTable<Vec<CommunityRecord>> {
    let mut table: RegionTable<Vec<CommunityRecord>> = RegionTable::default();
    for row in rows {
        let (Some(community), Some(population)) = (row.community, row.population) else {
            continue;
        };
        // Percent-style shares (e.g. 12.5) are stored as fractions.
        let share = row
            .share
            .map(|share| if share > 1.0 { share / 100.0 } else { share });
        let key = aliases.canonical_key(&row.suburb);
        table
            .entry_or_insert_with(key, row.suburb.trim(), Vec::new)
            .push(CommunityRecord {
                community,
                population,
                share,
            });
    }
    table
}

fn index_crime(aliases: &AliasTable, rows: Vec<CrimeRow>) -> RegionTable<Vec<CrimeRecord>> {
    let mut table: RegionTable<Vec<CrimeRecord>> = RegionTable::default();
    for row in rows {
        let (Some(category), Some(count)) = (row.category, row.count) else {
            continue;
        };
        let key = aliases.canonical_key(&row.suburb);
        let records = table.entry_or_insert_with(key, row.suburb.trim(), Vec::new);
        match records.iter_mut().find(|record| record.category == category) {
            Some(existing) => existing.count = existing.count.saturating_add(count),
            None => records.push(CrimeRecord { category, count }),
        }
    }
    table
}

fn index_named<T>(aliases: &AliasTable, rows: impl IntoIterator<Item = (String, T)>) -> RegionTable<T> {
    let mut table = RegionTable::default();
    for (name, value) in rows {
        let key = aliases.canonical_key(&name);
        table.insert_first(key, name.trim(), value);
    }
    table
}
