//! The API endpoint URIs.

/// The route that replaces the product table with the remote seed dataset.
pub const INITIALIZE: &str = "/api/initialize";
/// The route for the paginated transaction listing.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for the sold/unsold tally.
pub const STATISTICS: &str = "/api/statistics";
/// The route for the price histogram.
pub const BAR_CHART: &str = "/api/bar-chart";
/// The route for the per-category counts.
pub const PIE_CHART: &str = "/api/pie-chart";
/// The route that combines the four endpoints above into one response.
pub const COMBINED: &str = "/api/combined";

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::INITIALIZE);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS);
        assert_endpoint_is_valid_uri(endpoints::STATISTICS);
        assert_endpoint_is_valid_uri(endpoints::BAR_CHART);
        assert_endpoint_is_valid_uri(endpoints::PIE_CHART);
        assert_endpoint_is_valid_uri(endpoints::COMBINED);
    }
}
