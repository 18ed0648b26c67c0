//! Application router configuration wiring each API endpoint to its handler.

use axum::{
    Router,
    http::{Method, header},
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    AppState,
    bar_chart::get_bar_chart,
    combined::get_combined,
    endpoints,
    pie_chart::get_pie_chart,
    seed::initialize_database,
    statistics::get_statistics,
    transactions::get_transactions,
};

/// Return a router with all the app's routes.
///
/// Cross-origin requests are allowed from any origin so the dashboard can be
/// served separately from the API.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route(endpoints::INITIALIZE, get(initialize_database))
        .route(endpoints::TRANSACTIONS, get(get_transactions))
        .route(endpoints::STATISTICS, get(get_statistics))
        .route(endpoints::BAR_CHART, get(get_bar_chart))
        .route(endpoints::PIE_CHART, get(get_pie_chart))
        .route(endpoints::COMBINED, get(get_combined))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod transactions_route_tests {
    use std::sync::{Arc, Mutex};

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::Value;

    use crate::{AppState, endpoints, routing::build_router};

    fn get_test_server() -> (TestServer, Arc<Mutex<Connection>>) {
        let connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = AppState::new(connection, "http://127.0.0.1:1/products")
            .expect("Could not create app state.");
        let db_connection = state.db_connection.clone();
        let app = build_router(state);
        let server = TestServer::new(app);

        (server, db_connection)
    }

    fn insert_product_row(db_connection: &Arc<Mutex<Connection>>, title: &str, date_of_sale: &str) {
        db_connection
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO product (id, title, description, price, category, date_of_sale, sold)
                    VALUES (1, ?1, '', 10.0, 'misc', ?2, 0)",
                (title, date_of_sale),
            )
            .expect("Could not insert product");
    }

    #[tokio::test]
    async fn serves_a_page_of_transactions() {
        let (server, db_connection) = get_test_server();
        insert_product_row(&db_connection, "Laptop", "2022-03-09T00:00:00Z");
        insert_product_row(&db_connection, "Mug", "2022-03-10T00:00:00Z");

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", "3")
            .add_query_param("page", "2")
            .add_query_param("perPage", "1")
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["success"], Value::Bool(true));
        assert_eq!(body["count"], 2);
        let data = body["data"].as_array().expect("want a data array");
        assert_eq!(data.len(), 1, "want 1 product, got {}", data.len());
        assert_eq!(data[0]["title"], "Mug");
        assert_eq!(data[0]["dateOfSale"], "2022-03-10T00:00:00Z");
        assert_eq!(data[0]["month"], 3);
    }

    #[tokio::test]
    async fn non_numeric_month_is_rejected_before_the_handler() {
        let (server, _db_connection) = get_test_server();

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", "March")
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn out_of_range_month_gets_the_json_error_shape() {
        let (server, _db_connection) = get_test_server();

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("month", "13")
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["message"], "Invalid request parameters");
        assert!(body["error"].is_object(), "want an error object in {body}");
    }
}
