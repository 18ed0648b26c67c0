//! Sold and unsold sales totals for a calendar month.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    month::parse_month_number,
    query::{ProductFilter, summarize_sales},
};

/// The query parameters accepted by the statistics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatisticsQuery {
    /// Tally transactions sold in this calendar month (1-12), any year.
    /// Tallies the whole table when absent.
    pub month: Option<u8>,
}

/// Totals over the sold and unsold portions of the filtered transactions.
///
/// Each group is a list with at most one element, empty when no transaction
/// falls in the group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStatistics {
    /// The sale totals, absent when no transactions matched at all.
    pub item_sold: Vec<SoldTotals>,
    /// The unsold count, absent when every matching transaction is sold.
    pub item_not_sold: Vec<UnsoldTotals>,
}

/// Sale amounts across the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldTotals {
    /// The sum of `price` over every matching transaction, sold or not.
    pub total_amount: f64,
    /// How many matching transactions are sold.
    pub total_items_sold: i64,
}

/// The unsold side of the tally.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsoldTotals {
    /// How many matching transactions are unsold.
    pub total_items_not_sold: i64,
}

/// The statistics response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    /// A single-element list holding the tally.
    pub total_sales: Vec<SalesStatistics>,
}

/// Tally sold and unsold totals for the transactions in `month`, or over the
/// whole table when `month` is `None`.
///
/// # Errors
/// Returns [Error::MonthOutOfRange] if the month is not in 1-12, or
/// [Error::SqlError] if the query fails.
pub fn tally_statistics(
    month: Option<u8>,
    connection: &Connection,
) -> Result<StatisticsResponse, Error> {
    let month = month.map(parse_month_number).transpose()?;
    let filter = ProductFilter {
        month,
        search: None,
    };
    let summary = summarize_sales(&filter, connection)?;

    let item_sold = if summary.total_count == 0 {
        vec![]
    } else {
        vec![SoldTotals {
            total_amount: summary.total_amount,
            total_items_sold: summary.sold_count,
        }]
    };
    let item_not_sold = if summary.unsold_count == 0 {
        vec![]
    } else {
        vec![UnsoldTotals {
            total_items_not_sold: summary.unsold_count,
        }]
    };

    Ok(StatisticsResponse {
        total_sales: vec![SalesStatistics {
            item_sold,
            item_not_sold,
        }],
    })
}

/// The state needed for the [get_statistics] route handler.
#[derive(Debug, Clone)]
pub struct StatisticsState {
    /// The database connection holding the product table.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for StatisticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Serve the sold/unsold tally as JSON.
pub async fn get_statistics(
    State(state): State<StatisticsState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<StatisticsResponse>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let statistics = tally_statistics(query.month, &connection)
        .inspect_err(|error| tracing::error!("could not tally statistics: {error}"))?;

    Ok(Json(statistics))
}
