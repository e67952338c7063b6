use super::table::{DataLoadError, TableKind};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use std::io::Read;

/// A CSV row type for one of the region-keyed tables.
pub(crate) trait SourceRow: DeserializeOwned {
    const TABLE: TableKind;
    const REQUIRED_COLUMNS: &'static [&'static str];

    fn region(&self) -> &str;
}

/// Validates the header and deserializes every row, ignoring unknown columns.
pub(crate) fn read_rows<T: SourceRow, R: Read>(reader: R) -> Result<Vec<T>, DataLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|source| DataLoadError::Csv {
            table: T::TABLE,
            source,
        })?
        .clone();
    let missing: Vec<String> = T::REQUIRED_COLUMNS
        .iter()
        .filter(|column| {
            !headers
                .iter()
                .any(|header| header.trim_start_matches('\u{feff}') == **column)
        })
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataLoadError::MissingColumns {
            table: T::TABLE,
            columns: missing,
        });
    }

    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<T>() {
        let row = record.map_err(|source| DataLoadError::Csv {
            table: T::TABLE,
            source,
        })?;
        if row.region().trim().is_empty() {
            continue;
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Parses a numeric cell, tolerating thousands separators, currency and
/// percent signs. Blank and NaN-like cells are absent values.
pub(crate) fn parse_number(raw: &str) -> Result<Option<f64>, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("null")
    {
        return Ok(None);
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%' | ' '))
        .collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(format!("'{trimmed}' is not a number")),
    }
}

fn optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        Some(value) => parse_number(&value).map_err(D::Error::custom),
        None => Ok(None),
    }
}

fn optional_whole<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match optional_f64(deserializer)? {
        Some(value) if value >= 0.0 && value.fract() == 0.0 => Ok(Some(value as u64)),
        Some(value) => Err(D::Error::custom(format!(
            "'{value}' is not a non-negative whole number"
        ))),
        None => Ok(None),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| {
        let trimmed = value.trim();
        !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("nan")
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct MasterRow {
    #[serde(rename = "Suburb")]
    pub(crate) suburb: String,
    #[serde(
        rename = "Current_Price_2025",
        alias = "Current_Price",
        default,
        deserialize_with = "optional_f64"
    )]
    pub(crate) current_price: Option<f64>,
    #[serde(
        rename = "First_Price_2019",
        alias = "First_Price",
        default,
        deserialize_with = "optional_f64"
    )]
    pub(crate) first_price: Option<f64>,
    #[serde(rename = "Price_Growth_Amount", default, deserialize_with = "optional_f64")]
    pub(crate) growth_amount: Option<f64>,
    #[serde(rename = "Price_Growth_Percent", default, deserialize_with = "optional_f64")]
    pub(crate) growth_percent: Option<f64>,
    #[serde(rename = "Avg_Price_All_Time", default, deserialize_with = "optional_f64")]
    pub(crate) average_price: Option<f64>,
    #[serde(rename = "Median_Price_All_Time", default, deserialize_with = "optional_f64")]
    pub(crate) median_price: Option<f64>,
    #[serde(rename = "Min_Price_Ever", default, deserialize_with = "optional_f64")]
    pub(crate) min_price: Option<f64>,
    #[serde(rename = "Max_Price_Ever", default, deserialize_with = "optional_f64")]
    pub(crate) max_price: Option<f64>,
    #[serde(rename = "Price_Volatility", default, deserialize_with = "optional_f64")]
    pub(crate) volatility: Option<f64>,
    #[serde(rename = "Quarter_Count", default, deserialize_with = "optional_whole")]
    pub(crate) quarter_count: Option<u64>,
}

impl SourceRow for MasterRow {
    const TABLE: TableKind = TableKind::Master;
    const REQUIRED_COLUMNS: &'static [&'static str] = &["Suburb"];

    fn region(&self) -> &str {
        &self.suburb
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimeSeriesRow {
    #[serde(rename = "Suburb")]
    pub(crate) suburb: String,
    #[serde(rename = "Period", default, deserialize_with = "empty_string_as_none")]
    pub(crate) period: Option<String>,
    #[serde(rename = "Year", default, deserialize_with = "optional_whole")]
    pub(crate) year: Option<u64>,
    #[serde(rename = "Quarter", default, deserialize_with = "empty_string_as_none")]
    pub(crate) quarter: Option<String>,
    #[serde(rename = "Median_Price", default, deserialize_with = "optional_f64")]
    pub(crate) median_price: Option<f64>,
}

impl SourceRow for TimeSeriesRow {
    const TABLE: TableKind = TableKind::TimeSeries;
    const REQUIRED_COLUMNS: &'static [&'static str] = &["Suburb", "Median_Price"];

    fn region(&self) -> &str {
        &self.suburb
    }
}

impl TimeSeriesRow {
    /// `Period` wins; otherwise `Year` plus a `Quarter` of `Q3` or `3`.
    pub(crate) fn period_label(&self) -> Option<String> {
        if let Some(period) = &self.period {
            return Some(period.clone());
        }
        let year = self.year?;
        let quarter = self.quarter.as_deref()?.trim().trim_start_matches(['Q', 'q']);
        Some(format!("{year}-Q{quarter}"))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PredictionRow {
    #[serde(rename = "Suburb")]
    pub(crate) suburb: String,
    #[serde(rename = "Year", default, deserialize_with = "optional_whole")]
    pub(crate) year: Option<u64>,
    #[serde(rename = "Scenario", default, deserialize_with = "empty_string_as_none")]
    pub(crate) scenario: Option<String>,
    #[serde(rename = "Predicted_Price", default, deserialize_with = "optional_f64")]
    pub(crate) predicted_price: Option<f64>,
}

impl SourceRow for PredictionRow {
    const TABLE: TableKind = TableKind::Predictions;
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["Suburb", "Year", "Scenario", "Predicted_Price"];

    fn region(&self) -> &str {
        &self.suburb
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RiskRow {
    #[serde(rename = "Suburb")]
    pub(crate) suburb: String,
    #[serde(rename = "Total_Risk_Score", default, deserialize_with = "optional_f64")]
    pub(crate) score: Option<f64>,
    #[serde(
        rename = "Investment_Strategy",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) investment_strategy: Option<String>,
    #[serde(rename = "Risk_Adjusted_Return", default, deserialize_with = "optional_f64")]
    pub(crate) risk_adjusted_return: Option<f64>,
    #[serde(
        rename = "Value_Category",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) value_category: Option<String>,
}

impl SourceRow for RiskRow {
    const TABLE: TableKind = TableKind::Risk;
    const REQUIRED_COLUMNS: &'static [&'static str] = &["Suburb", "Total_Risk_Score"];

    fn region(&self) -> &str {
        &self.suburb
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RentalRow {
    #[serde(rename = "Suburb")]
    pub(crate) suburb: String,
    #[serde(rename = "Property_Type", default, deserialize_with = "empty_string_as_none")]
    pub(crate) property_type: Option<String>,
    #[serde(rename = "Fair_Rent", default, deserialize_with = "optional_f64")]
    pub(crate) fair_rent: Option<f64>,
    #[serde(rename = "Actual_Rent", default, deserialize_with = "optional_f64")]
    pub(crate) actual_rent: Option<f64>,
}

impl SourceRow for RentalRow {
    const TABLE: TableKind = TableKind::Rental;
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["Suburb", "Property_Type", "Fair_Rent", "Actual_Rent"];

    fn region(&self) -> &str {
        &self.suburb
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DemographicRow {
    #[serde(rename = "Suburb")]
    pub(crate) suburb: String,
    #[serde(
        rename = "Population",
        alias = "G01_Population_Total",
        default,
        deserialize_with = "optional_f64"
    )]
    pub(crate) population: Option<f64>,
    #[serde(
        rename = "Median_Age",
        alias = "G02_Median_age_persons",
        default,
        deserialize_with = "optional_f64"
    )]
    pub(crate) median_age: Option<f64>,
    #[serde(
        rename = "Household_Size",
        alias = "G02_Average_household_size",
        default,
        deserialize_with = "optional_f64"
    )]
    pub(crate) household_size: Option<f64>,
    #[serde(
        rename = "Household_Income_Weekly",
        alias = "G02_Median_tot_hhd_inc_weekly",
        default,
        deserialize_with = "optional_f64"
    )]
    pub(crate) household_income_weekly: Option<f64>,
    #[serde(
        rename = "Personal_Income_Weekly",
        alias = "G02_Median_tot_prsnl_inc_weekly",
        default,
        deserialize_with = "optional_f64"
    )]
    pub(crate) personal_income_weekly: Option<f64>,
    #[serde(
        rename = "Mortgage_Monthly",
        alias = "G02_Median_mortgage_repay_monthly",
        default,
        deserialize_with = "optional_f64"
    )]
    pub(crate) mortgage_monthly: Option<f64>,
    #[serde(
        rename = "Rent_Weekly",
        alias = "G02_Median_rent_weekly",
        default,
        deserialize_with = "optional_f64"
    )]
    pub(crate) rent_weekly: Option<f64>,
}

impl SourceRow for DemographicRow {
    const TABLE: TableKind = TableKind::Demographics;
    const REQUIRED_COLUMNS: &'static [&'static str] = &["Suburb", "Population"];

    fn region(&self) -> &str {
        &self.suburb
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommunityRow {
    #[serde(rename = "Suburb")]
    pub(crate) suburb: String,
    #[serde(rename = "Community", default, deserialize_with = "empty_string_as_none")]
    pub(crate) community: Option<String>,
    #[serde(rename = "Population", default, deserialize_with = "optional_f64")]
    pub(crate) population: Option<f64>,
    #[serde(rename = "Share", default, deserialize_with = "optional_f64")]
    pub(crate) share: Option<f64>,
}

impl SourceRow for CommunityRow {
    const TABLE: TableKind = TableKind::Communities;
    const REQUIRED_COLUMNS: &'static [&'static str] = &["Suburb", "Community", "Population"];

    fn region(&self) -> &str {
        &self.suburb
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CrimeRow {
    #[serde(rename = "Suburb")]
    pub(crate) suburb: String,
    #[serde(
        rename = "Offence_Category",
        alias = "Offense_Category",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) category: Option<String>,
    #[serde(
        rename = "Offence_Count",
        alias = "Offense_Count",
        default,
        deserialize_with = "optional_whole"
    )]
    pub(crate) count: Option<u64>,
}

impl SourceRow for CrimeRow {
    const TABLE: TableKind = TableKind::Crime;
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["Suburb", "Offence_Category", "Offence_Count"];

    fn region(&self) -> &str {
        &self.suburb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_number_accepts_formatted_values() {
        assert_eq!(parse_number("$1,250,000"), Ok(Some(1_250_000.0)));
        assert_eq!(parse_number(" 12.5% "), Ok(Some(12.5)));
        assert_eq!(parse_number(""), Ok(None));
        assert_eq!(parse_number("NaN"), Ok(None));
        assert!(parse_number("twelve").is_err());
    }

    #[test]
    fn read_rows_reports_missing_columns() {
        let error = read_rows::<RentalRow, _>(Cursor::new("Suburb,Fair_Rent\nUNLEY,500\n"))
            .expect_err("missing columns");
        match error {
            DataLoadError::MissingColumns { table, columns } => {
                assert_eq!(table, TableKind::Rental);
                assert_eq!(columns, vec!["Property_Type", "Actual_Rent"]);
            }
            other => panic!("expected missing columns, got {other:?}"),
        }
    }

    #[test]
    fn read_rows_rejects_non_numeric_cells() {
        let csv = "Suburb,Total_Risk_Score\nUNLEY,high\n";
        let error = read_rows::<RiskRow, _>(Cursor::new(csv)).expect_err("non numeric");
        assert!(matches!(
            error,
            DataLoadError::Csv {
                table: TableKind::Risk,
                ..
            }
        ));
    }

    #[test]
    fn read_rows_ignores_unknown_columns_and_blank_regions() {
        let csv = "Suburb,Extra_Column,Current_Price_2025,Quarter_Count\n\
UNLEY,ignored,\"1,200,000\",28\n\
,ignored,5,1\n";
        let rows = read_rows::<MasterRow, _>(Cursor::new(csv)).expect("rows parse");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].current_price, Some(1_200_000.0));
        assert_eq!(rows[0].quarter_count, Some(28));
        assert_eq!(rows[0].first_price, None);
    }

    #[test]
    fn time_series_period_falls_back_to_year_and_quarter() {
        let csv = "Suburb,Year,Quarter,Median_Price\nUNLEY,2021,Q3,900000\n";
        let rows = read_rows::<TimeSeriesRow, _>(Cursor::new(csv)).expect("rows parse");
        assert_eq!(rows[0].period_label().as_deref(), Some("2021-Q3"));
    }
}
