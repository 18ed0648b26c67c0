//! Query helpers that filter and aggregate the product table.
//!
//! The transaction and statistics endpoints filter by month-of-any-year and
//! free-text search ([ProductFilter]); the chart endpoints count within an
//! absolute date range ([ChartMonthRange]). All date interpretation happens in
//! SQLite, which normalizes stored UTC offsets away.

use rusqlite::{Connection, params_from_iter, types::Value};
use time::{Date, Month};

use crate::{
    Error,
    month::ChartMonthRange,
    product::{PRODUCT_COLUMNS, Product, map_product_row},
};

/// The filter shared by the transaction list and statistics queries.
///
/// Both conditions are optional and combine as AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ProductFilter {
    /// Keep records whose date of sale falls in this calendar month (in UTC),
    /// in any year.
    pub month: Option<Month>,
    /// Keep records whose title, description, or price (in decimal string
    /// form) contains this text, case-insensitively. The text is matched
    /// literally; LIKE wildcards in it are escaped.
    pub search: Option<String>,
}

impl ProductFilter {
    /// Build the WHERE clause and its parameters for this filter.
    ///
    /// Returns an empty string when no condition applies so the clause can be
    /// spliced into a query unconditionally.
    fn where_clause(&self) -> (String, Vec<Value>) {
        let mut where_clause_parts = vec![];
        let mut query_parameters = vec![];

        if let Some(month) = self.month {
            where_clause_parts.push(format!(
                "strftime('%m', date_of_sale) = ?{}",
                query_parameters.len() + 1
            ));
            query_parameters.push(Value::Text(format!("{:02}", u8::from(month))));
        }

        if let Some(search) = &self.search {
            let parameter_index = query_parameters.len() + 1;
            where_clause_parts.push(format!(
                "(title LIKE ?{parameter_index} ESCAPE '\\' \
                 OR description LIKE ?{parameter_index} ESCAPE '\\' \
                 OR CAST(price AS TEXT) LIKE ?{parameter_index} ESCAPE '\\')"
            ));
            query_parameters.push(Value::Text(format!("%{}%", escape_like_pattern(search))));
        }

        if where_clause_parts.is_empty() {
            (String::new(), query_parameters)
        } else {
            (
                String::from(" WHERE ") + &where_clause_parts.join(" AND "),
                query_parameters,
            )
        }
    }
}

/// Escape the characters LIKE treats as wildcards so `text` matches literally.
fn escape_like_pattern(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Count the products matching `filter`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn count_products(filter: &ProductFilter, connection: &Connection) -> Result<i64, Error> {
    let (where_clause, query_parameters) = filter.where_clause();
    let query = format!("SELECT COUNT(*) FROM product{where_clause}");

    let count = connection
        .prepare(&query)?
        .query_row(params_from_iter(query_parameters.iter()), |row| row.get(0))?;

    Ok(count)
}

/// Get one page of the products matching `filter`, in insertion order.
///
/// `page` is 1-based; the page slice skips `(page - 1) * per_page` records
/// and takes `per_page`. Pages past the end of the filtered set are empty.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn fetch_product_page(
    filter: &ProductFilter,
    page: u32,
    per_page: u32,
    connection: &Connection,
) -> Result<Vec<Product>, Error> {
    let (where_clause, query_parameters) = filter.where_clause();
    let offset = u64::from(page).saturating_sub(1) * u64::from(per_page);
    let query = format!(
        "SELECT {PRODUCT_COLUMNS} FROM product{where_clause} \
         ORDER BY rowid LIMIT {per_page} OFFSET {offset}"
    );

    connection
        .prepare(&query)?
        .query_map(params_from_iter(query_parameters.iter()), map_product_row)?
        .map(|maybe_product| maybe_product.map_err(Error::SqlError))
        .collect()
}

/// Sold and unsold totals over a filtered set of products.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SalesSummary {
    /// How many records matched the filter, sold or not.
    pub total_count: i64,
    /// The sum of `price` over all matched records, sold or not.
    pub total_amount: f64,
    /// How many matched records are sold.
    pub sold_count: i64,
    /// How many matched records are unsold.
    pub unsold_count: i64,
}

/// Compute sold/unsold totals over the products matching `filter` in a single
/// query.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn summarize_sales(
    filter: &ProductFilter,
    connection: &Connection,
) -> Result<SalesSummary, Error> {
    let (where_clause, query_parameters) = filter.where_clause();
    let query = format!(
        "SELECT COUNT(*), TOTAL(price), \
         COUNT(CASE WHEN sold THEN 1 END), \
         COUNT(CASE WHEN NOT sold THEN 1 END) \
         FROM product{where_clause}"
    );

    let summary = connection
        .prepare(&query)?
        .query_row(params_from_iter(query_parameters.iter()), |row| {
            Ok(SalesSummary {
                total_count: row.get(0)?,
                total_amount: row.get(1)?,
                sold_count: row.get(2)?,
                unsold_count: row.get(3)?,
            })
        })?;

    Ok(summary)
}

/// Count products within `range` whose price lies in `[min, max]`, with no
/// upper bound when `max` is `None`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn count_in_price_range(
    range: ChartMonthRange,
    min: f64,
    max: Option<f64>,
    connection: &Connection,
) -> Result<i64, Error> {
    let mut query = String::from(
        "SELECT COUNT(*) FROM product \
         WHERE unixepoch(date_of_sale) >= unixepoch(?1) \
         AND unixepoch(date_of_sale) < unixepoch(?2) \
         AND price >= ?3",
    );
    let mut query_parameters = vec![
        date_bound(range.start),
        date_bound(range.end),
        Value::Real(min),
    ];

    if let Some(max) = max {
        query.push_str(" AND price <= ?4");
        query_parameters.push(Value::Real(max));
    }

    let count = connection
        .prepare(&query)?
        .query_row(params_from_iter(query_parameters.iter()), |row| row.get(0))?;

    Ok(count)
}

/// Count products within `range`, grouped by category.
///
/// The group order is whatever SQLite produces; callers should not rely on
/// it.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn count_by_category(
    range: ChartMonthRange,
    connection: &Connection,
) -> Result<Vec<(String, i64)>, Error> {
    connection
        .prepare(
            "SELECT category, COUNT(*) FROM product \
             WHERE unixepoch(date_of_sale) >= unixepoch(?1) \
             AND unixepoch(date_of_sale) < unixepoch(?2) \
             GROUP BY category",
        )?
        .query_map(
            params_from_iter([date_bound(range.start), date_bound(range.end)].iter()),
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?
        .map(|maybe_group| maybe_group.map_err(Error::SqlError))
        .collect()
}

/// Midnight UTC on `date`, in the form SQLite's date functions accept.
fn date_bound(date: Date) -> Value {
    Value::Text(format!("{date}T00:00:00Z"))
}
