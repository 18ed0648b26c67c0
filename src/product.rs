//! The product model and its JSON and database record mappings.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};

use crate::Error;

/// The product table columns in the order [map_product_row] expects them.
pub(crate) const PRODUCT_COLUMNS: &str =
    "id, title, description, price, category, date_of_sale, sold";

/// A single product sale record.
///
/// The JSON field names follow the seed dataset. Fields in the source JSON
/// that are not listed here (e.g. image URLs) are dropped during
/// deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// The identifier carried by the seed dataset. Not guaranteed unique.
    pub id: i64,
    /// The product title.
    pub title: String,
    /// The product description.
    pub description: String,
    /// The sale price.
    pub price: f64,
    /// The product category, e.g. "electronics".
    pub category: String,
    /// When the product was sold or listed for sale.
    #[serde(rename = "dateOfSale", with = "time::serde::rfc3339")]
    pub date_of_sale: OffsetDateTime,
    /// Whether the product has been sold.
    pub sold: bool,
    /// The calendar month (1-12) of the date of sale in UTC.
    ///
    /// Derived when a record is read from the database, never stored.
    #[serde(skip_deserializing)]
    pub month: u8,
}

/// Convert a row holding [PRODUCT_COLUMNS] into a [Product].
///
/// # Errors
/// Returns an error if a column cannot be converted into the corresponding
/// field type, or if the stored date of sale is not a valid RFC 3339 string.
pub(crate) fn map_product_row(row: &Row) -> Result<Product, rusqlite::Error> {
    let date_text: String = row.get(5)?;
    let date_of_sale = OffsetDateTime::parse(&date_text, &Rfc3339).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(error))
    })?;
    let month = u8::from(date_of_sale.to_offset(UtcOffset::UTC).month());

    Ok(Product {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        category: row.get(4)?,
        date_of_sale,
        sold: row.get(6)?,
        month,
    })
}

/// Insert `product` at the end of the product table.
///
/// # Errors
/// Returns [Error::InvalidDateFormat] if the date of sale cannot be written
/// as an RFC 3339 string, or [Error::SqlError] if the insert fails.
pub(crate) fn insert_product(product: &Product, connection: &Connection) -> Result<(), Error> {
    let date_of_sale = format_stored_date(product.date_of_sale)?;

    connection.execute(
        "INSERT INTO product (id, title, description, price, category, date_of_sale, sold)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            product.id,
            &product.title,
            &product.description,
            product.price,
            &product.category,
            date_of_sale,
            product.sold,
        ),
    )?;

    Ok(())
}

/// Format a date of sale as the RFC 3339 text stored in the date_of_sale
/// column. SQLite's date functions understand this form and normalize any
/// UTC offset away.
pub(crate) fn format_stored_date(date: OffsetDateTime) -> Result<String, Error> {
    date.format(&Rfc3339)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), date.to_string()))
}
