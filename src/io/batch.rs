//! Batch evaluation: houses from a CSV file in, per-model prices out.
//!
//! Input columns (header names are case-insensitive, `_` is ignored, so both
//! `gr_liv_area` and `GrLivArea` work):
//! `overall_qual, gr_liv_area, year_built, neighborhood_rank, garage_cars`.
//!
//! Rows that fail to parse or fail validation are kept and reported in the
//! `error` column instead of aborting the run.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::StringRecord;
use rayon::prelude::*;

use crate::domain::{Attribute, HouseAttributes, PredictionResult};
use crate::error::AppError;
use crate::estimator::{Estimator, UniformNoise, ZeroNoise, row_seed};

/// One input row.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseRow {
    /// 1-based line number in the source file.
    pub line: usize,
    /// Parsed attributes, or why the row could not be parsed.
    pub attributes: Result<HouseAttributes, String>,
}

/// How per-row noise is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchNoise {
    Off,
    /// Row `i` uses an RNG seeded from `row_seed(seed, i)`.
    Seeded(u64),
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub line: usize,
    pub attributes: Option<HouseAttributes>,
    pub result: Result<PredictionResult, String>,
}

/// Read house rows from a CSV file.
pub fn read_houses_file(path: &Path) -> Result<Vec<HouseRow>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open input CSV '{}': {e}", path.display())))?;
    read_houses(file)
}

/// Read house rows from any CSV source.
pub fn read_houses<R: Read>(source: R) -> Result<Vec<HouseRow>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let mut columns = Vec::with_capacity(Attribute::ALL.len());
    for attr in Attribute::ALL {
        let idx = header_map
            .get(&normalize_header_name(attr.field_name()))
            .copied()
            .ok_or_else(|| {
                AppError::new(
                    2,
                    format!("Input CSV is missing column '{}' (or '{}').", attr.field_name(), attr.dataset_name()),
                )
            })?;
        columns.push((attr, idx));
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Fallback assumes one line per record after the header.
        let fallback = idx + 2;
        let (line, attributes) = match result {
            Ok(record) => (
                record_line(record.position()).unwrap_or(fallback),
                parse_row(&record, &columns),
            ),
            Err(e) => (
                record_line(e.position()).unwrap_or(fallback),
                Err(format!("CSV parse error: {e}")),
            ),
        };
        rows.push(HouseRow { line, attributes });
    }

    tracing::debug!(rows = rows.len(), "read input CSV");
    Ok(rows)
}

/// Line on which a record starts (quoted fields may span lines).
fn record_line(position: Option<&csv::Position>) -> Option<usize> {
    position.and_then(|p| usize::try_from(p.line()).ok())
}

fn parse_row(record: &StringRecord, columns: &[(Attribute, usize)]) -> Result<HouseAttributes, String> {
    let mut attrs = HouseAttributes::default();
    for &(attr, idx) in columns {
        let raw = record
            .get(idx)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| format!("missing {}", attr.field_name()))?;
        let value = raw
            .parse::<i32>()
            .map_err(|_| format!("{} is not an integer: '{raw}'", attr.field_name()))?;
        attrs.set(attr, value);
    }
    Ok(attrs)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Strip a UTF-8 BOM that spreadsheet exports put on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Estimate every row in parallel.
///
/// Output order matches input order, and seeded runs are reproducible no
/// matter how rayon schedules the rows.
pub fn evaluate_batch(estimator: &Estimator, rows: &[HouseRow], noise: BatchNoise) -> Vec<BatchOutcome> {
    rows.par_iter()
        .enumerate()
        .map(|(i, row)| {
            let result = match &row.attributes {
                Ok(attrs) => {
                    let estimate = match noise {
                        BatchNoise::Off => estimator.estimate(attrs, &mut ZeroNoise),
                        BatchNoise::Seeded(seed) => {
                            estimator.estimate(attrs, &mut UniformNoise::seeded(row_seed(seed, i)))
                        }
                    };
                    estimate.map_err(|e| e.to_string())
                }
                Err(msg) => Err(msg.clone()),
            };
            BatchOutcome {
                line: row.line,
                attributes: row.attributes.as_ref().ok().copied(),
                result,
            }
        })
        .collect()
}

/// Write batch outcomes as CSV.
///
/// Columns: the five attributes, one price column per model, `final_price`, `error`.
pub fn write_predictions<W: Write>(sink: W, estimator: &Estimator, outcomes: &[BatchOutcome]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(sink);

    let mut header: Vec<String> = vec!["line".to_string()];
    header.extend(Attribute::ALL.iter().map(|a| a.field_name().to_string()));
    header.extend(estimator.models().iter().map(|m| m.name.clone()));
    header.push("final_price".to_string());
    header.push("error".to_string());
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(4, format!("Failed to write predictions header: {e}")))?;

    let n_models = estimator.models().len();
    for o in outcomes {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        record.push(o.line.to_string());
        for attr in Attribute::ALL {
            record.push(o.attributes.map(|a| a.get(attr).to_string()).unwrap_or_default());
        }
        match &o.result {
            Ok(r) => {
                record.extend(r.estimates.iter().map(|e| format!("{:.2}", e.price)));
                record.push(format!("{:.2}", r.final_price));
                record.push(String::new());
            }
            Err(msg) => {
                record.extend(std::iter::repeat_n(String::new(), n_models + 1));
                record.push(msg.clone());
            }
        }
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(4, format!("Failed to write predictions row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush predictions: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EstimatorConfig;

    const INPUT: &str = "\
OverallQual,GrLivArea,YearBuilt,NeighborhoodRank,GarageCars
7,1500,2003,3,2
11,1500,2003,3,2
9,2500,2008,five,3
";

    fn reference() -> Estimator {
        Estimator::new(EstimatorConfig::default()).unwrap()
    }

    #[test]
    fn reads_dataset_style_headers() {
        let rows = read_houses(INPUT.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[0].attributes, Ok(HouseAttributes::default()));
        assert!(rows[2].attributes.as_ref().unwrap_err().contains("neighborhood_rank"));
    }

    #[test]
    fn line_numbers_follow_multiline_fields() {
        let csv = "\
note,overall_qual,gr_liv_area,year_built,neighborhood_rank,garage_cars
\"two
line note\",7,1500,2003,3,2
plain,8,1600,2004,3,2
";
        let rows = read_houses(csv.as_bytes()).unwrap();
        assert_eq!(rows.iter().map(|r| r.line).collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(rows[0].attributes, Ok(HouseAttributes::default()));
    }

    #[test]
    fn snake_case_headers_in_any_order() {
        let csv = "garage_cars,neighborhood_rank,year_built,gr_liv_area,overall_qual\n2,3,2003,1500,7\n";
        let rows = read_houses(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].attributes, Ok(HouseAttributes::default()));
    }

    #[test]
    fn missing_column_is_usage_error() {
        let err = read_houses("overall_qual,gr_liv_area\n7,1500\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("year_built"));
    }

    #[test]
    fn batch_keeps_order_and_reports_bad_rows() {
        let est = reference();
        let rows = read_houses(INPUT.as_bytes()).unwrap();
        let outcomes = evaluate_batch(&est, &rows, BatchNoise::Off);

        assert_eq!(outcomes.iter().map(|o| o.line).collect::<Vec<_>>(), vec![2, 3, 4]);
        let first = outcomes[0].result.as_ref().unwrap();
        assert!((first.final_price - 208_268.5).abs() < 1e-6);
        assert!(outcomes[1].result.as_ref().unwrap_err().contains("overall_qual"));
        assert!(outcomes[2].result.is_err());
    }

    #[test]
    fn seeded_batches_are_reproducible() {
        let est = reference();
        let rows: Vec<HouseRow> = (0..64)
            .map(|i| HouseRow {
                line: i + 2,
                attributes: Ok(HouseAttributes::default()),
            })
            .collect();
        let a = evaluate_batch(&est, &rows, BatchNoise::Seeded(42));
        let b = evaluate_batch(&est, &rows, BatchNoise::Seeded(42));
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.result.as_ref().unwrap(), y.result.as_ref().unwrap());
        }
        // Different rows draw different noise.
        assert_ne!(
            a[0].result.as_ref().unwrap().final_price,
            a[1].result.as_ref().unwrap().final_price
        );
    }

    #[test]
    fn writes_one_column_per_model() {
        let est = reference();
        let rows = read_houses(INPUT.as_bytes()).unwrap();
        let outcomes = evaluate_batch(&est, &rows, BatchNoise::Off);

        let mut buf = Vec::new();
        write_predictions(&mut buf, &est, &outcomes).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "line,overall_qual,gr_liv_area,year_built,neighborhood_rank,garage_cars,\
Lasso,XGBoost,LightGBM,GBR,ElasticNet,KRR,final_price,error"
        );
        assert!(lines[1].starts_with("2,7,1500,2003,3,2,209000.00,209000.00,213180.00,204820.00,206910.00,198550.00,"));
        assert!(lines[1].ends_with(','));
        assert!(lines[3].starts_with("4,,,,,,,,,,,,,"));
    }
}
