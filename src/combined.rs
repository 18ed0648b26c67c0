//! Combines the transaction listing, statistics, and both charts for one
//! month into a single response.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    bar_chart::{PriceBucketCount, count_price_buckets},
    pie_chart::{CategoryCount, count_categories},
    statistics::{StatisticsResponse, tally_statistics},
    transactions::{TransactionPage, TransactionQuery, list_transactions},
};

/// The query parameters accepted by the combined endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CombinedQuery {
    /// The calendar month (1-12) to build the dashboard for. Required.
    pub month: Option<u8>,
}

/// Everything the dashboard shows for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    /// The first page of the month's transactions, ten per page.
    pub transactions: TransactionPage,
    /// The sold/unsold tally for the month.
    pub statistics: StatisticsResponse,
    /// The month's price histogram.
    pub bar_chart: Vec<PriceBucketCount>,
    /// The month's per-category counts.
    pub pie_chart: Vec<CategoryCount>,
}

/// Build all four dashboard sections for `month` against the same
/// connection, sequentially. Any failing section fails the whole call.
///
/// The transaction section uses the default pagination (first page of ten).
/// The listing and statistics sections match the month in any year, while
/// the chart sections stay within the chart year.
///
/// # Errors
/// Returns [Error::MonthOutOfRange] if the month is not in 1-12, or
/// [Error::SqlError] if a query fails.
pub fn combine_dashboard_data(
    month: u8,
    connection: &Connection,
) -> Result<DashboardData, Error> {
    let transaction_query = TransactionQuery {
        month: Some(month),
        ..Default::default()
    };
    let month_text = month.to_string();

    let transactions = list_transactions(&transaction_query, connection)?;
    let statistics = tally_statistics(Some(month), connection)?;
    let bar_chart = count_price_buckets(&month_text, connection)?;
    let pie_chart = count_categories(&month_text, connection)?;

    Ok(DashboardData {
        transactions,
        statistics,
        bar_chart,
        pie_chart,
    })
}

/// The state needed for the [get_combined] route handler.
#[derive(Debug, Clone)]
pub struct CombinedState {
    /// The database connection holding the product table.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CombinedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Serve all four dashboard sections as one JSON object.
pub async fn get_combined(
    State(state): State<CombinedState>,
    Query(query): Query<CombinedQuery>,
) -> Result<Json<DashboardData>, Error> {
    let month = query.month.ok_or(Error::MissingMonth)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let dashboard = combine_dashboard_data(month, &connection)
        .inspect_err(|error| tracing::error!("could not build dashboard data: {error}"))?;

    Ok(Json(dashboard))
}
