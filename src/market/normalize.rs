use super::types::*;
use chrono_tz::Tz;

/// Second-level column label of demand side series in generation reports.
pub const CONSUMPTION_CATEGORY: &str = "Actual Consumption";

/// Price policy: points without a value are dropped, order is kept.
pub fn series_to_points(series: &RawSeries) -> PriceSeries {
    series
        .points
        .iter()
        .filter_map(|point| {
            present(point.value).map(|value| SeriesPoint {
                timestamp: point.timestamp,
                value,
            })
        })
        .collect()
}

/// Generation policy: every index timestamp is kept, missing cells become 0.0
/// and consumption columns are filtered out of two-level tables.
pub fn table_to_series_map(table: &RawTable, timezone: Tz) -> GenerationTable {
    let timestamps: Vec<_> = table
        .index
        .iter()
        .map(|ts| ts.with_timezone(&timezone).fixed_offset())
        .collect();

    let mut result = GenerationTable::default();

    for column in &table.columns {
        let name = match &column.name {
            ColumnName::Single(name) => name,
            ColumnName::Pair(_, category) if category == CONSUMPTION_CATEGORY => continue,
            ColumnName::Pair(name, _) => name,
        };

        // Cells past the end of a short column count as missing
        let points = timestamps
            .iter()
            .enumerate()
            .map(|(row, timestamp)| SeriesPoint {
                timestamp: *timestamp,
                value: present(column.values.get(row).copied().flatten()).unwrap_or(0.0),
            })
            .collect();

        if !result.insert(name.clone(), points) {
            tracing::debug!("Skipping duplicate generation column {}", name);
        }
    }

    result
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn offset_ts(s: &str) -> DateTime<chrono::FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn utc(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 12, 31, h, 0, 0).unwrap()
    }

    #[test]
    fn test_series_drops_missing_values() {
        let series = RawSeries {
            points: vec![
                RawPoint {
                    timestamp: offset_ts("2024-01-01T00:00:00+01:00"),
                    value: None,
                },
                RawPoint {
                    timestamp: offset_ts("2024-01-01T01:00:00+01:00"),
                    value: Some(5.0),
                },
                RawPoint {
                    timestamp: offset_ts("2024-01-01T02:00:00+01:00"),
                    value: Some(f64::NAN),
                },
            ],
        };

        let points = series_to_points(&series);
        assert_eq!(
            points,
            vec![SeriesPoint {
                timestamp: offset_ts("2024-01-01T01:00:00+01:00"),
                value: 5.0
            }]
        );
    }

    #[test]
    fn test_empty_inputs_are_not_errors() {
        assert!(series_to_points(&RawSeries::default()).is_empty());
        assert_eq!(
            table_to_series_map(&RawTable::default(), chrono_tz::Europe::Brussels),
            GenerationTable::default()
        );
    }

    #[test]
    fn test_table_fills_missing_with_zero_and_converts_timezone() {
        let table = RawTable {
            index: vec![utc(23), utc(22)],
            columns: vec![RawColumn {
                name: ColumnName::Single("Solar".to_string()),
                values: vec![None, Some(12.5)],
            }],
        };

        let result = table_to_series_map(&table, chrono_tz::Europe::Brussels);
        let solar = result.get("Solar").unwrap();
        assert_eq!(solar.len(), 2);
        assert_eq!(solar[0].timestamp, offset_ts("2024-01-01T00:00:00+01:00"));
        assert_eq!(solar[0].value, 0.0);
        assert_eq!(solar[1].timestamp, offset_ts("2023-12-31T23:00:00+01:00"));
        assert_eq!(solar[1].value, 12.5);
    }

    #[test]
    fn test_short_column_is_zero_filled() {
        let table = RawTable {
            index: vec![utc(22), utc(23)],
            columns: vec![RawColumn {
                name: ColumnName::Single("Nuclear".to_string()),
                values: vec![Some(900.0)],
            }],
        };

        let result = table_to_series_map(&table, chrono_tz::Europe::Brussels);
        let values: Vec<f64> = result.get("Nuclear").unwrap().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![900.0, 0.0]);
    }

    #[test]
    fn test_two_level_columns_drop_consumption() {
        let table = RawTable {
            index: vec![utc(23)],
            columns: vec![
                RawColumn {
                    name: ColumnName::Pair("Solar".to_string(), "Actual Generation".to_string()),
                    values: vec![Some(1.0)],
                },
                RawColumn {
                    name: ColumnName::Pair("Load".to_string(), "Actual Consumption".to_string()),
                    values: vec![Some(2.0)],
                },
                RawColumn {
                    name: ColumnName::Pair("Hydro Pumped Storage".to_string(), "Actual Aggregated".to_string()),
                    values: vec![Some(3.0)],
                },
            ],
        };

        let result = table_to_series_map(&table, chrono_tz::Europe::Brussels);
        assert_eq!(
            result.names().collect::<Vec<_>>(),
            vec!["Solar", "Hydro Pumped Storage"]
        );
        assert_eq!(result.get("Solar").unwrap()[0].value, 1.0);
    }
}
