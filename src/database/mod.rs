use diesel::connection::SimpleConnection as _;
use diesel::prelude::Connection as _;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::error::Error;
use std::path::Path;

pub mod models;
pub mod schema;

pub type Connection = diesel::sqlite::SqliteConnection;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn establish_connection(
    path: impl AsRef<Path>,
) -> Result<Connection, Box<dyn Error + Send + Sync + 'static>> {
    let path = path.as_ref().to_str().ok_or("non-UTF-8 database path")?;
    establish(path)
}

fn establish(url: &str) -> Result<Connection, Box<dyn Error + Send + Sync + 'static>> {
    let mut connection = Connection::establish(url)?;
    // sqlite leaves foreign keys off unless asked; the cascades depend on it
    connection.batch_execute("PRAGMA foreign_keys = ON;")?;
    connection.run_pending_migrations(MIGRATIONS)?;
    Ok(connection)
}

#[cfg(test)]
pub fn test_connection() -> Connection {
    establish(":memory:").unwrap()
}

#[cfg(test)]
mod tests {
    #[test]
    fn migrations_apply_and_revert() {
        use diesel_migrations::MigrationHarness as _;

        let mut conn = super::test_connection();
        conn.revert_all_migrations(super::MIGRATIONS).unwrap();
        conn.run_pending_migrations(super::MIGRATIONS).unwrap();
    }
}
