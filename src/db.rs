//! Database schema setup for the product table.

use rusqlite::Connection;

use crate::Error;

/// Create the tables used by the application if they do not already exist.
///
/// # Errors
/// Returns [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    create_product_table(connection)?;

    Ok(())
}

/// Create the product table.
///
/// `id` comes from the seed dataset and is not unique, so the table keeps its
/// own rowid and listing order relies on insertion (rowid) order.
pub(crate) fn create_product_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS product (
            id INTEGER NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            price REAL NOT NULL,
            category TEXT NOT NULL,
            date_of_sale TEXT NOT NULL,
            sold INTEGER NOT NULL
        )",
        (),
    )?;

    Ok(())
}
