//! Lists product transactions as pages of JSON, with optional month and
//! free-text filters.

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
    product::Product,
    query::{ProductFilter, count_products, fetch_product_page},
};

/// The page served when the query does not name one.
const DEFAULT_PAGE: u32 = 1;
/// The page size used when the query does not name one.
const DEFAULT_PER_PAGE: u32 = 10;

/// The query parameters accepted by the transaction listing.
///
/// All parameters are optional. Parameters that are present but not numeric
/// where a number is expected are rejected by the extractor before the
/// handler runs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionQuery {
    /// Keep transactions sold in this calendar month (1-12), any year.
    pub month: Option<u8>,
    /// Keep transactions whose title, description, or price contains this
    /// text.
    pub search: Option<String>,
    /// The 1-based page to return. Defaults to 1.
    pub page: Option<u32>,
    /// How many transactions per page. Defaults to 10.
    #[serde(rename = "perPage")]
    pub per_page: Option<u32>,
}

/// One page of matching transactions plus the size of the full filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionPage {
    /// Always `true`. Errors are reported through the error response shape
    /// instead.
    pub success: bool,
    /// The transactions on the requested page, in insertion order.
    pub data: Vec<Product>,
    /// How many transactions matched the filter across all pages.
    pub count: i64,
}

/// Look up one page of the transactions matching `query`.
///
/// # Errors
/// Returns [Error::MonthOutOfRange] if the month is not in 1-12,
/// [Error::PageOutOfRange] if the page is zero, or [Error::SqlError] if a
/// query fails.
pub fn list_transactions(
    query: &TransactionQuery,
    connection: &Connection,
) -> Result<TransactionPage, Error> {
    let month = query.month.map(parse_month_number).transpose()?;
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);

    if page == 0 {
        return Err(Error::PageOutOfRange);
    }

    let filter = ProductFilter {
        month,
        search: query.search.clone(),
    };

    let count = count_products(&filter, connection)?;
    let data = fetch_product_page(&filter, page, per_page, connection)?;

    Ok(TransactionPage {
        success: true,
        data,
        count,
    })
}

/// The state needed for the [get_transactions] route handler.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection holding the product table.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Serve one page of transactions as JSON.
pub async fn get_transactions(
    State(state): State<TransactionState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<TransactionPage>, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let page = list_transactions(&query, &connection)
        .inspect_err(|error| tracing::error!("could not list transactions: {error}"))?;

    Ok(Json(page))
}

#[cfg(test)]
mod list_transactions_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{TransactionQuery, list_transactions};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_product_row(connection: &Connection, title: &str, date_of_sale: &str) {
        connection
            .execute(
                "INSERT INTO product (id, title, description, price, category, date_of_sale, sold)
                    VALUES (1, ?1, '', 10.0, 'misc', ?2, 0)",
                (title, date_of_sale),
            )
            .expect("Could not insert product");
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        let conn = get_test_connection();
        for i in 0..12 {
            insert_product_row(&conn, &format!("product #{i}"), "2022-03-09T00:00:00Z");
        }

        let got = list_transactions(&TransactionQuery::default(), &conn).unwrap();

        assert!(got.success);
        assert_eq!(got.count, 12, "want count 12, got {}", got.count);
        assert_eq!(got.data.len(), 10, "want 10 products, got {}", got.data.len());
        assert_eq!(got.data[0].title, "product #0");
    }

    #[test]
    fn count_covers_the_whole_filtered_set() {
        let conn = get_test_connection();
        for i in 0..7 {
            insert_product_row(&conn, &format!("product #{i}"), "2022-03-09T00:00:00Z");
        }

        let query = TransactionQuery {
            page: Some(2),
            per_page: Some(3),
            ..Default::default()
        };
        let got = list_transactions(&query, &conn).unwrap();

        assert_eq!(got.count, 7);
        assert_eq!(got.data.len(), 3);
        assert_eq!(got.data[0].title, "product #3");
    }

    #[test]
    fn month_and_search_filter_the_listing() {
        let conn = get_test_connection();
        insert_product_row(&conn, "Laptop", "2022-03-09T00:00:00Z");
        insert_product_row(&conn, "Laptop sleeve", "2022-04-09T00:00:00Z");
        insert_product_row(&conn, "Mug", "2022-03-09T00:00:00Z");

        let query = TransactionQuery {
            month: Some(3),
            search: Some("laptop".to_string()),
            ..Default::default()
        };
        let got = list_transactions(&query, &conn).unwrap();

        assert_eq!(got.count, 1);
        assert_eq!(got.data[0].title, "Laptop");
    }

    #[test]
    fn rejects_months_outside_the_calendar() {
        let conn = get_test_connection();

        for month in [0, 13, 255] {
            let query = TransactionQuery {
                month: Some(month),
                ..Default::default()
            };

            assert_eq!(
                list_transactions(&query, &conn),
                Err(Error::MonthOutOfRange(month))
            );
        }
    }

    #[test]
    fn rejects_page_zero() {
        let conn = get_test_connection();

        let query = TransactionQuery {
            page: Some(0),
            ..Default::default()
        };

        assert_eq!(list_transactions(&query, &conn), Err(Error::PageOutOfRange));
    }

    #[test]
    fn per_page_zero_gives_an_empty_page_with_a_real_count() {
        let conn = get_test_connection();
        insert_product_row(&conn, "Laptop", "2022-03-09T00:00:00Z");

        let query = TransactionQuery {
            per_page: Some(0),
            ..Default::default()
        };
        let got = list_transactions(&query, &conn).unwrap();

        assert!(got.data.is_empty());
        assert_eq!(got.count, 1);
    }
}
