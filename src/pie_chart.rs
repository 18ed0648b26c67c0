//! Per-category transaction counts for one month in the chart year.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    month::{chart_month_range, parse_chart_month},
    query::count_by_category,
};

/// The query parameters accepted by the pie chart endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PieChartQuery {
    /// The month to chart, as a name ("March"), three-letter abbreviation
    /// ("mar"), or number ("3").
    pub month: Option<String>,
}

/// How many of the month's transactions belong to one category.
///
/// The category is serialized under the key `_id` for compatibility with the
/// dashboard consuming this API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    /// The category name.
    #[serde(rename = "_id")]
    pub category: String,
    /// How many of the month's transactions are in the category.
    pub count: i64,
}

/// Count the month's transactions per category.
///
/// The order of the categories is not specified.
///
/// # Errors
/// Returns [Error::InvalidChartMonth] if `month_text` does not name a month,
/// or [Error::SqlError] if the query fails.
pub fn count_categories(
    month_text: &str,
    connection: &Connection,
) -> Result<Vec<CategoryCount>, Error> {
    let month = parse_chart_month(month_text)?;
    let range = chart_month_range(month);

    let groups = count_by_category(range, connection)?;

    Ok(groups
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect())
}

/// The state needed for the [get_pie_chart] route handler.
#[derive(Debug, Clone)]
pub struct PieChartState {
    /// The database connection holding the product table.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for PieChartState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Serve the per-category counts as JSON.
pub async fn get_pie_chart(
    State(state): State<PieChartState>,
    Query(query): Query<PieChartQuery>,
) -> Result<Json<Vec<CategoryCount>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = count_categories(query.month.as_deref().unwrap_or_default(), &connection)
        .inspect_err(|error| tracing::error!("could not count categories: {error}"))?;

    Ok(Json(categories))
}
