//! Display helpers for callers that show the product list.
//! The store itself only computes raw numbers, formatting happens here.
use std::fmt::Write;

use crate::record::Record;

/// sum of `total_value` across all `records`
pub fn grand_total(records: &[Record]) -> f64 {
    records.iter().map(|r| r.total_value).sum()
}

/// formats `value` with two decimals and a `,` between groups of thousands,
/// e.g. `1234.5` becomes `1,234.50`
pub fn number_format(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, cents)
}

/// renders `records` as a text table, one row per record prefixed with its index, followed by
/// a `Total` row
pub fn render_table(records: &[Record]) -> String {
    let name_width = records
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Product Name".len());

    let mut out = String::new();
    // writing into a String cannot fail
    let _ = writeln!(
        out,
        "{:>3}  {:<nw$}  {:>10}  {:>12}  {:<19}  {:>14}",
        "#",
        "Product Name",
        "Quantity",
        "Price",
        "Datetime Submitted",
        "Total Value",
        nw = name_width
    );
    for (index, record) in records.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<nw$}  {:>10}  {:>12}  {:<19}  {:>14}",
            index,
            record.name,
            record.quantity,
            format!("${}", record.price),
            record.submitted_at,
            format!("${}", record.total_value),
            nw = name_width
        );
    }
    let _ = writeln!(
        out,
        "{:>3}  {:<nw$}  {:>10}  {:>12}  {:<19}  {:>14}",
        "",
        "Total",
        "",
        "",
        "",
        format!("${}", number_format(grand_total(records))),
        nw = name_width
    );
    out
}
