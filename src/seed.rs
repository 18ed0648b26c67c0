//! Replaces the product table with a dataset fetched from a remote URL.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::extract::{FromRef, State};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    product::{Product, insert_product},
};

/// The response body sent once seeding succeeds.
const SEED_SUCCESS_MESSAGE: &str = "Database initialized with seed data";

/// How long to wait on the seed host before giving up.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Download and parse the product dataset at `seed_url`.
///
/// # Errors
/// Returns [Error::HttpClientError] if the HTTP client cannot be built,
/// [Error::SeedFetchError] if the request fails or the host responds with a
/// non-success status, or [Error::SeedDataError] if the body is not a JSON
/// array of products.
pub async fn fetch_seed_data(seed_url: &str) -> Result<Vec<Product>, Error> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|error| Error::HttpClientError(error.to_string()))?;

    let response = client
        .get(seed_url)
        .send()
        .await
        .map_err(|error| Error::SeedFetchError(error.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::SeedFetchError(format!(
            "the seed host responded with status {status}"
        )));
    }

    response
        .json()
        .await
        .map_err(|error| Error::SeedDataError(error.to_string()))
}

/// Delete every product and insert `products` in their place, keeping the
/// dataset order.
///
/// The delete and the inserts do not run inside a transaction, so a failed
/// insert leaves the table partially seeded.
///
/// # Errors
/// Returns [Error::SqlError] if the delete or an insert fails, or
/// [Error::InvalidDateFormat] if a product's date of sale cannot be stored.
pub fn replace_products(products: &[Product], connection: &Connection) -> Result<(), Error> {
    connection.execute("DELETE FROM product", ())?;

    for product in products {
        insert_product(product, connection)?;
    }

    Ok(())
}

/// The state needed for the [initialize_database] route handler.
#[derive(Debug, Clone)]
pub struct SeedState {
    /// The database connection holding the product table.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Where to fetch the product dataset from.
    pub seed_url: String,
}

impl FromRef<AppState> for SeedState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            seed_url: state.seed_url.clone(),
        }
    }
}

/// Fetch the seed dataset and replace the product table with it.
///
/// The fetch happens before the database lock is taken, so other requests
/// can still read the old data while the download runs.
pub async fn initialize_database(State(state): State<SeedState>) -> Result<&'static str, Error> {
    let products = fetch_seed_data(&state.seed_url)
        .await
        .inspect_err(|error| tracing::error!("could not fetch seed data: {error}"))?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    replace_products(&products, &connection)
        .inspect_err(|error| tracing::error!("could not replace products: {error}"))?;

    tracing::info!(
        "seeded {} products from {}",
        products.len(),
        state.seed_url
    );

    Ok(SEED_SUCCESS_MESSAGE)
}



#[cfg(test)]
mod initialize_database_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, Router, extract::State, routing::get};
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::db::initialize;

    use super::{SeedState, initialize_database};

    async fn spawn_fixture_server(body: Value) -> String {
        let app = Router::new().route(
            "/products",
            get(move || {
                let body = body.clone();
                async move { Json(body) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind fixture server");
        let address = listener.local_addr().expect("Could not get fixture address");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Could not serve fixture data");
        });

        format!("http://{address}/products")
    }

    fn seed_record(id: i64, title: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "price": 100.0,
            "description": "A product",
            "category": "misc",
            "sold": true,
            "dateOfSale": "2022-03-09T00:00:00Z"
        })
    }

    fn select_titles(connection: &Arc<Mutex<Connection>>) -> Vec<String> {
        connection
            .lock()
            .unwrap()
            .prepare("SELECT title FROM product ORDER BY rowid")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap()
    }

    #[tokio::test]
    async fn seeding_twice_keeps_only_the_latest_dataset() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let db_connection = Arc::new(Mutex::new(connection));

        let first_url = spawn_fixture_server(json!([
            seed_record(1, "first dataset A"),
            seed_record(2, "first dataset B"),
        ]))
        .await;
        let second_url = spawn_fixture_server(json!([seed_record(3, "second dataset")])).await;

        let first_state = SeedState {
            db_connection: db_connection.clone(),
            seed_url: first_url,
        };
        let got = initialize_database(State(first_state))
            .await
            .expect("Could not seed the database");
        assert_eq!(got, "Database initialized with seed data");
        assert_eq!(
            select_titles(&db_connection),
            vec!["first dataset A", "first dataset B"]
        );

        let second_state = SeedState {
            db_connection: db_connection.clone(),
            seed_url: second_url,
        };
        initialize_database(State(second_state))
            .await
            .expect("Could not reseed the database");

        assert_eq!(select_titles(&db_connection), vec!["second dataset"]);
    }
}
