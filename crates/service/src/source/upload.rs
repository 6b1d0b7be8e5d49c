//! File parsing, column type inference and batched concurrent inserts.

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use common::metrics;

use crate::errors::ServiceError;
use super::client::SourceClient;
use super::domain::{FileType, SourceConfig};
use super::sql::{self, ColumnSpec, SqlType};

const DATE_FMT: &str = "%Y-%m-%d";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const VARCHAR_LIMIT: usize = 255;

/// A parsed file: header row plus NULL-padded data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

fn normalize_cell(raw: &str) -> Option<String> {
    let v = raw.trim();
    if v.is_empty() { None } else { Some(v.to_string()) }
}

fn check_headers(headers: &[String]) -> Result<(), ServiceError> {
    if headers.is_empty() {
        return Err(ServiceError::Validation("file has no header row".into()));
    }
    let mut seen = HashSet::new();
    for (i, h) in headers.iter().enumerate() {
        if h.is_empty() {
            return Err(ServiceError::Validation(format!("header of column {} is empty", i + 1)));
        }
        if !seen.insert(h.as_str()) {
            return Err(ServiceError::Validation(format!("duplicate header: {h}")));
        }
    }
    Ok(())
}

/// Pad short rows with NULL; reject rows wider than the header.
fn push_row(sheet: &mut Sheet, mut row: Vec<Option<String>>, line: usize) -> Result<(), ServiceError> {
    let width = sheet.headers.len();
    // trailing empty cells do not count towards the width
    while row.len() > width && row.last().is_some_and(Option::is_none) {
        row.pop();
    }
    if row.len() > width {
        return Err(ServiceError::Validation(format!("row {line} has {} cells, header has {width}", row.len())));
    }
    if row.iter().all(Option::is_none) {
        return Ok(());
    }
    row.resize(width, None);
    sheet.rows.push(row);
    Ok(())
}

pub fn parse_csv(bytes: &[u8]) -> Result<Sheet, ServiceError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|e| ServiceError::Validation(format!("invalid csv: {e}")))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>();
    check_headers(&headers)?;

    let mut sheet = Sheet { headers, rows: Vec::new() };
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ServiceError::Validation(format!("invalid csv: {e}")))?;
        let row = record.iter().map(normalize_cell).collect();
        push_row(&mut sheet, row, i + 2)?;
    }
    Ok(sheet)
}

fn excel_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => normalize_cell(s),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 9.0e15 {
                Some(format!("{}", *f as i64))
            } else {
                Some(f.to_string())
            }
        }
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt.as_datetime().map(|d| {
            if d.time() == NaiveTime::MIN { d.format(DATE_FMT).to_string() } else { d.format(DATETIME_FMT).to_string() }
        }),
    }
}

/// First worksheet of an xlsx/xls workbook.
pub fn parse_excel(bytes: &[u8]) -> Result<Sheet, ServiceError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ServiceError::Validation(format!("invalid excel file: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ServiceError::Validation("excel file has no worksheet".into()))?
        .map_err(|e| ServiceError::Validation(format!("invalid excel file: {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| ServiceError::Validation("file has no header row".into()))?
        .iter()
        .map(|c| excel_cell(c).unwrap_or_default())
        .collect();
    // a range is as wide as its widest row; drop blank header cells on the right
    let mut headers = headers;
    while headers.last().is_some_and(String::is_empty) {
        headers.pop();
    }
    check_headers(&headers)?;

    let mut sheet = Sheet { headers, rows: Vec::new() };
    for (i, row) in rows.enumerate() {
        let row = row.iter().map(excel_cell).collect();
        push_row(&mut sheet, row, i + 2)?;
    }
    Ok(sheet)
}

pub fn parse(file_type: FileType, bytes: &[u8]) -> Result<Sheet, ServiceError> {
    if file_type.is_excel() { parse_excel(bytes) } else { parse_csv(bytes) }
}

fn infer_column(values: impl Iterator<Item = String>) -> SqlType {
    let mut any = false;
    let (mut int, mut num, mut date, mut datetime) = (true, true, true, true);
    let mut long = false;
    for v in values {
        any = true;
        int &= v.parse::<i64>().is_ok();
        num &= v.parse::<f64>().is_ok_and(f64::is_finite);
        date &= NaiveDate::parse_from_str(&v, DATE_FMT).is_ok();
        datetime &= NaiveDateTime::parse_from_str(&v, DATETIME_FMT).is_ok();
        long |= v.chars().count() > VARCHAR_LIMIT;
    }
    if !any {
        SqlType::Varchar
    } else if int {
        SqlType::BigInt
    } else if num {
        SqlType::Double
    } else if date {
        SqlType::Date
    } else if datetime {
        SqlType::DateTime
    } else if long {
        SqlType::Text
    } else {
        SqlType::Varchar
    }
}

/// Infer one SQL type per header over all non-null cells.
pub fn infer_columns(sheet: &Sheet) -> Vec<ColumnSpec> {
    sheet
        .headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values = sheet.rows.iter().filter_map(move |r| r[idx].clone());
            ColumnSpec { name: name.clone(), sql_type: infer_column(values) }
        })
        .collect()
}

/// Split a comma separated key list; every key must be a header.
pub fn split_keys(raw: Option<&str>, headers: &[String]) -> Result<Vec<String>, ServiceError> {
    let mut keys = Vec::new();
    for key in raw.unwrap_or_default().split(',').map(str::trim).filter(|k| !k.is_empty()) {
        if !headers.iter().any(|h| h == key) {
            return Err(ServiceError::Validation(format!("key column {key} is not in the file header")));
        }
        if !keys.iter().any(|k: &String| k == key) {
            keys.push(key.to_string());
        }
    }
    Ok(keys)
}

/// Insert all rows in pages of `batch_size`, at most `max_concurrency` pages in flight.
///
/// Every page is awaited. The first failure stops pages that have not
/// started yet and is returned. Returns (rows inserted, pages).
pub async fn insert_rows(
    client: Arc<dyn SourceClient>,
    config: &SourceConfig,
    table: &str,
    sheet: Sheet,
    batch_size: usize,
    max_concurrency: usize,
) -> Result<(u64, usize), ServiceError> {
    let started = Instant::now();
    let per_batch = sql::rows_per_batch(batch_size, sheet.headers.len());
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let failed = Arc::new(AtomicBool::new(false));
    let mut set = JoinSet::new();

    for (page, chunk) in sheet.rows.chunks(per_batch).enumerate() {
        let stmt = sql::insert_rows(table, &sheet.headers, chunk);
        let client = client.clone();
        let config = config.clone();
        let semaphore = semaphore.clone();
        let failed = failed.clone();
        set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| ServiceError::Source(e.to_string()))?;
            if failed.load(Ordering::Acquire) {
                return Ok(0);
            }
            debug!(page, rows = stmt.rows, "inserting page");
            let res = client.insert_batch(&config, stmt).await;
            if res.is_err() {
                failed.store(true, Ordering::Release);
            }
            res
        });
    }

    let batches = set.len();
    let mut inserted = 0u64;
    let mut first_error = None;
    while let Some(joined) = set.join_next().await {
        let outcome = joined.map_err(|e| ServiceError::Source(format!("insert task failed: {e}")))
            .and_then(|r| r);
        match outcome {
            Ok(n) => inserted += n,
            Err(e) => {
                metrics::UPLOAD_BATCHES_FAILED.inc();
                if first_error.is_none() {
                    warn!(table, error = %e, "insert page failed, stopping upload");
                    failed.store(true, Ordering::Release);
                    first_error = Some(e);
                }
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    metrics::UPLOAD_ROWS.inc_by(inserted);
    info!(table, rows = inserted, batches, elapsed_ms = started.elapsed().as_millis() as u64, "upload inserted");
    Ok((inserted, batches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::client::mock::MockSourceClient;

    fn sheet(headers: &[&str], rows: &[&[Option<&str>]]) -> Sheet {
        Sheet {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(|r| r.iter().map(|c| c.map(str::to_string)).collect()).collect(),
        }
    }

    #[test]
    fn csv_header_padding_and_nulls() {
        let data = "\u{feff}id, name ,day\n1,alice,2024-01-02\n2,,\n\n3\n";
        let s = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(s.headers, vec!["id", "name", "day"]);
        assert_eq!(s.rows.len(), 3);
        assert_eq!(s.rows[1], vec![Some("2".into()), None, None]);
        assert_eq!(s.rows[2], vec![Some("3".into()), None, None]);
    }

    #[test]
    fn csv_rejects_wide_rows_and_bad_headers() {
        assert!(parse_csv(b"a,b\n1,2,3\n").is_err());
        assert!(parse_csv(b"a,a\n1,2\n").is_err());
        assert!(parse_csv(b"a,,c\n1,2,3\n").is_err());
    }

    #[test]
    fn excel_first_sheet_numbers_and_dates() {
        let bytes = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/orders.xlsx"));
        let s = parse(FileType::Xlsx, bytes).unwrap();
        // trailing whitespace-only header is dropped; second sheet is ignored
        assert_eq!(s.headers, vec!["id", "price", "day", "at", "city"]);
        assert_eq!(s.rows.len(), 2);
        assert_eq!(
            s.rows[0],
            vec![
                Some("1".into()),
                Some("2.5".into()),
                Some("2024-01-01".into()),
                Some("2024-01-01 12:00:00".into()),
                Some("Paris".into()),
            ]
        );
        assert_eq!(
            s.rows[1],
            vec![Some("42".into()), Some("3".into()), Some("2024-01-02".into()), Some("2024-01-02 06:00:00".into()), None]
        );
        let columns = infer_columns(&s);
        assert_eq!(columns[0].sql_type, SqlType::BigInt);
        assert_eq!(columns[2].sql_type, SqlType::Date);
        assert_eq!(columns[3].sql_type, SqlType::DateTime);
    }

    #[test]
    fn invalid_excel_bytes_rejected() {
        assert!(matches!(parse_excel(b"not a workbook"), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn type_inference() {
        let long = "x".repeat(300);
        let s = sheet(
            &["i", "f", "d", "dt", "s", "t", "n"],
            &[
                &[Some("1"), Some("1.5"), Some("2024-01-01"), Some("2024-01-01 10:00:00"), Some("a"), Some(&long), None],
                &[Some("-2"), Some("3"), Some("2024-12-31"), Some("2024-02-29 23:59:59"), Some("7"), Some("b"), None],
            ],
        );
        let types: Vec<SqlType> = infer_columns(&s).into_iter().map(|c| c.sql_type).collect();
        assert_eq!(
            types,
            vec![SqlType::BigInt, SqlType::Double, SqlType::Date, SqlType::DateTime, SqlType::Varchar, SqlType::Text, SqlType::Varchar]
        );
    }

    #[test]
    fn keys_must_be_headers() {
        let headers = vec!["id".to_string(), "city".to_string()];
        assert_eq!(split_keys(Some(" id , city,id"), &headers).unwrap(), vec!["id", "city"]);
        assert!(split_keys(None, &headers).unwrap().is_empty());
        assert!(split_keys(Some("zip"), &headers).is_err());
    }

    fn config() -> SourceConfig {
        SourceConfig { url: "jdbc:mysql://h/db".into(), username: "u".into(), password: "p".into(), properties: None }
    }

    #[tokio::test]
    async fn inserts_every_page() {
        let client = Arc::new(MockSourceClient::default());
        let rows: Vec<Vec<Option<String>>> = (0..25).map(|i| vec![Some(i.to_string())]).collect();
        let s = Sheet { headers: vec!["n".into()], rows };
        let (n, batches) = insert_rows(client.clone(), &config(), "t", s, 10, 2).await.unwrap();
        assert_eq!(n, 25);
        assert_eq!(batches, 3);
        assert_eq!(client.inserted_rows("t"), 25);
    }

    #[tokio::test]
    async fn first_failure_is_returned() {
        let client = Arc::new(MockSourceClient::default().fail_inserts_after(1));
        let rows: Vec<Vec<Option<String>>> = (0..50).map(|i| vec![Some(i.to_string())]).collect();
        let s = Sheet { headers: vec!["n".into()], rows };
        let err = insert_rows(client.clone(), &config(), "t", s, 10, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Source(_)));
        assert!(client.inserted_rows("t") < 50);
    }

    #[tokio::test]
    async fn empty_sheet_inserts_nothing() {
        let client = Arc::new(MockSourceClient::default());
        let s = Sheet { headers: vec!["n".into()], rows: vec![] };
        assert_eq!(insert_rows(client, &config(), "t", s, 10, 2).await.unwrap(), (0, 0));
    }
}
