//! Price histogram for the transactions of one month in the chart year.
//!
//! The buckets are fixed: nine 100-wide ranges from 0 and an open-ended
//! 901-and-above range. Bucket bounds are inclusive on both ends, so prices
//! strictly between two buckets (for example 100.5) are not counted.

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
    query::count_in_price_range,
};

/// The histogram buckets, as (minimum, maximum, label). `None` means
/// unbounded above.
const PRICE_BUCKETS: [(f64, Option<f64>, &str); 10] = [
    (0.0, Some(100.0), "0-100"),
    (101.0, Some(200.0), "101-200"),
    (201.0, Some(300.0), "201-300"),
    (301.0, Some(400.0), "301-400"),
    (401.0, Some(500.0), "401-500"),
    (501.0, Some(600.0), "501-600"),
    (601.0, Some(700.0), "601-700"),
    (701.0, Some(800.0), "701-800"),
    (801.0, Some(900.0), "801-900"),
    (901.0, None, "901-above"),
];

/// The query parameters accepted by the bar chart endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BarChartQuery {
    /// The month to chart, as a name ("March"), three-letter abbreviation
    /// ("mar"), or number ("3").
    pub month: Option<String>,
}

/// How many transactions fell into one price bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBucketCount {
    /// The bucket label, such as "0-100" or "901-above".
    pub range: String,
    /// How many of the month's transactions have a price in the bucket.
    pub count: i64,
}

/// Count the month's transactions into the ten price buckets, in bucket
/// order.
///
/// Issues one query per bucket.
///
/// # Errors
/// Returns [Error::InvalidChartMonth] if `month_text` does not name a month,
/// or [Error::SqlError] if a query fails.
pub fn count_price_buckets(
    month_text: &str,
    connection: &Connection,
) -> Result<Vec<PriceBucketCount>, Error> {
    let month = parse_chart_month(month_text)?;
    let range = chart_month_range(month);

    PRICE_BUCKETS
        .iter()
        .map(|(min, max, label)| {
            count_in_price_range(range, *min, *max, connection).map(|count| PriceBucketCount {
                range: label.to_string(),
                count,
            })
        })
        .collect()
}

/// The state needed for the [get_bar_chart] route handler.
#[derive(Debug, Clone)]
pub struct BarChartState {
    /// The database connection holding the product table.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BarChartState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Serve the price histogram as JSON.
pub async fn get_bar_chart(
    State(state): State<BarChartState>,
    Query(query): Query<BarChartQuery>,
) -> Result<Json<Vec<PriceBucketCount>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let buckets = count_price_buckets(query.month.as_deref().unwrap_or_default(), &connection)
        .inspect_err(|error| tracing::error!("could not count price buckets: {error}"))?;

    Ok(Json(buckets))
}


#[cfg(test)]
mod get_bar_chart_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Query, State},
    };
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{BarChartQuery, BarChartState, get_bar_chart};

    fn get_test_state() -> BarChartState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        BarChartState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn returns_the_histogram_for_the_named_month() {
        let state = get_test_state();
        state
            .db_connection
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO product (id, title, description, price, category, date_of_sale, sold)
                    VALUES (1, 'Widget', '', 250.0, 'misc', '2023-06-15T00:00:00Z', 0)",
                (),
            )
            .expect("Could not insert product");

        let query = BarChartQuery {
            month: Some("June".to_string()),
        };
        let Json(got) = get_bar_chart(State(state), Query(query))
            .await
            .expect("Could not get bar chart");

        assert_eq!(got[2].count, 1, "want price 250 in 201-300");
    }

    #[tokio::test]
    async fn missing_month_is_reported_as_an_error() {
        let state = get_test_state();

        let got = get_bar_chart(State(state), Query(BarChartQuery::default()))
            .await
            .expect_err("want an error when month is missing");

        assert_eq!(got, Error::InvalidChartMonth(String::new()));
    }
}
