//! Aggregation transforms: query rows -> tabular result.
//!
//! Every transform groups rows in first-seen order, folds each group, then
//! applies a stable sort, so equal sort keys keep their grouping order.

use crate::config::CountryCodes;
use crate::error::ShapeError;
use crate::model::{Column, TabularResult};
use crate::query::{Row, Scalar};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

pub const COUNTRY: &str = "COUNTRY";
pub const COUNTRY_CODE: &str = "COUNTRY_CODE";
pub const TYPE: &str = "TYPE";
pub const TOTAL_QUANTITY: &str = "totalQuantity";
pub const TOTAL_SALES: &str = "totalSales";
pub const HOUR: &str = "hour";
pub const GENDER: &str = "gender";
pub const USER_COUNT: &str = "userCount";

// Date, then hour, then optional minutes / seconds / fraction.
//   2024-05-01T13
//   2024-05-01 13:45
//   2024-05-01T13:45:00.123
const HOUR_KEY_RE: &str =
    r"^(\d{4})-(\d{2})-(\d{2})[T ](\d{2})(?::(\d{2})(?::(\d{2})(?:\.\d+)?)?)?$";

static HOUR_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HOUR_KEY_RE).expect("HOUR_KEY_RE compiles"));

/// Sum price per country, descending, then attach ISO-3 codes.
///
/// Rows: (country, price). Countries missing from `codes` keep a null code.
pub fn by_country(rows: &[Row], codes: &CountryCodes) -> Result<TabularResult, ShapeError> {
    let mut groups = group_rows(
        rows,
        |i, row| {
            expect_arity(i, row, 2)?;
            Ok(text_at(i, row, 0, COUNTRY)?.to_string())
        },
        |total: &mut f64, i, row| {
            *total += number_at(i, row, 1, TOTAL_SALES)?;
            Ok(())
        },
    )?;
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut names = Vec::with_capacity(groups.len());
    let mut totals = Vec::with_capacity(groups.len());
    let mut iso = Vec::with_capacity(groups.len());
    for (country, total) in groups {
        match codes.lookup(&country) {
            Some(code) => iso.push(Scalar::text(code)),
            None => {
                debug!(country = %country, "no country code; panel will leave it unlocated");
                iso.push(Scalar::Null);
            }
        }
        names.push(Scalar::Text(country));
        totals.push(Scalar::Number(total));
    }

    TabularResult::new(vec![
        Column::new(COUNTRY, names),
        Column::new(TOTAL_SALES, totals),
        Column::new(COUNTRY_CODE, iso),
    ])
}

#[derive(Default)]
struct CategoryTotals {
    quantity: f64,
    sales: f64,
}

/// Sum quantity and price per product type, descending by quantity.
///
/// Rows: (type, quantity, price). Sales are rendered as 2-decimal strings.
pub fn by_category(rows: &[Row]) -> Result<TabularResult, ShapeError> {
    let mut groups = group_rows(
        rows,
        |i, row| {
            expect_arity(i, row, 3)?;
            Ok(text_at(i, row, 0, TYPE)?.to_string())
        },
        |acc: &mut CategoryTotals, i, row| {
            acc.quantity += number_at(i, row, 1, TOTAL_QUANTITY)?;
            acc.sales += number_at(i, row, 2, TOTAL_SALES)?;
            Ok(())
        },
    )?;
    groups.sort_by(|a, b| b.1.quantity.total_cmp(&a.1.quantity));

    let (mut types, mut quantities, mut sales) = (Vec::new(), Vec::new(), Vec::new());
    for (ty, acc) in groups {
        types.push(Scalar::Text(ty));
        quantities.push(Scalar::Number(acc.quantity));
        sales.push(Scalar::Text(format!("{:.2}", acc.sales)));
    }

    TabularResult::new(vec![
        Column::new(TYPE, types),
        Column::new(TOTAL_QUANTITY, quantities),
        Column::new(TOTAL_SALES, sales),
    ])
}

/// Sum price per hour, ascending by hour. Labels are `HH:00`.
///
/// Rows: (timestamp, price). The timestamp may already be truncated to
/// `YYYY-MM-DDTHH`; finer components are dropped.
pub fn by_hour(rows: &[Row]) -> Result<TabularResult, ShapeError> {
    let mut groups = group_rows(
        rows,
        |i, row| {
            expect_arity(i, row, 2)?;
            let raw = text_at(i, row, 0, HOUR)?;
            hour_key(raw).ok_or_else(|| ShapeError::Timestamp {
                row: i,
                value: raw.to_string(),
            })
        },
        |total: &mut f64, i, row| {
            *total += number_at(i, row, 1, TOTAL_SALES)?;
            Ok(())
        },
    )?;
    groups.sort_by(|a, b| a.0.cmp(&b.0));

    let (mut hours, mut totals) = (Vec::new(), Vec::new());
    for (key, total) in groups {
        hours.push(Scalar::Text(hour_label(&key)));
        totals.push(Scalar::Number(total));
    }

    TabularResult::new(vec![Column::new(HOUR, hours), Column::new(TOTAL_SALES, totals)])
}

/// Count users per gender, descending by count.
///
/// Rows are either raw `(gender)` rows, each counting once, or pre-counted
/// `(gender, count)` rows from a `GROUP BY` query.
pub fn by_gender(rows: &[Row]) -> Result<TabularResult, ShapeError> {
    let mut groups = group_rows(
        rows,
        |i, row| {
            if row.len() != 1 && row.len() != 2 {
                return Err(ShapeError::Arity {
                    row: i,
                    expected: 2,
                    got: row.len(),
                });
            }
            Ok(text_at(i, row, 0, GENDER)?.to_string())
        },
        |count: &mut f64, i, row| {
            *count += if row.len() == 2 {
                number_at(i, row, 1, USER_COUNT)?
            } else {
                1.0
            };
            Ok(())
        },
    )?;
    groups.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (mut labels, mut counts) = (Vec::new(), Vec::new());
    for (gender, count) in groups {
        labels.push(Scalar::Text(gender));
        counts.push(Scalar::Number(count));
    }

    TabularResult::new(vec![Column::new(GENDER, labels), Column::new(USER_COUNT, counts)])
}

/// Parse a timestamp and truncate it to the hour.
pub fn hour_key(raw: &str) -> Option<NaiveDateTime> {
    let caps = HOUR_KEY.captures(raw.trim())?;
    let field = |idx: usize| -> Option<u32> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let year: i32 = caps.get(1)?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?;
    // Validate the full time before dropping minutes and seconds.
    date.and_hms_opt(field(4)?, field(5)?, field(6)?)?;
    date.and_hms_opt(field(4)?, 0, 0)
}

pub fn hour_label(key: &NaiveDateTime) -> String {
    key.format("%H:00").to_string()
}

/// Group rows by key in first-seen order, folding each row into its group.
fn group_rows<K, A>(
    rows: &[Row],
    mut key_of: impl FnMut(usize, &Row) -> Result<K, ShapeError>,
    mut fold: impl FnMut(&mut A, usize, &Row) -> Result<(), ShapeError>,
) -> Result<Vec<(K, A)>, ShapeError>
where
    K: Ord + Clone,
    A: Default,
{
    let mut slots: BTreeMap<K, usize> = BTreeMap::new();
    let mut groups: Vec<(K, A)> = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let key = key_of(i, row)?;
        let slot = match slots.get(&key) {
            Some(&slot) => slot,
            None => {
                slots.insert(key.clone(), groups.len());
                groups.push((key, A::default()));
                groups.len() - 1
            }
        };
        fold(&mut groups[slot].1, i, row)?;
    }

    Ok(groups)
}

fn expect_arity(row_no: usize, row: &Row, expected: usize) -> Result<(), ShapeError> {
    if row.len() != expected {
        return Err(ShapeError::Arity {
            row: row_no,
            expected,
            got: row.len(),
        });
    }
    Ok(())
}

fn text_at<'a>(
    row_no: usize,
    row: &'a Row,
    idx: usize,
    column: &'static str,
) -> Result<&'a str, ShapeError> {
    row[idx].as_str().ok_or_else(|| ShapeError::NotText {
        row: row_no,
        column,
        value: row[idx].to_string(),
    })
}

fn number_at(row_no: usize, row: &Row, idx: usize, column: &'static str) -> Result<f64, ShapeError> {
    row[idx].as_f64().ok_or_else(|| ShapeError::NotNumeric {
        row: row_no,
        column,
        value: row[idx].to_string(),
    })
}
