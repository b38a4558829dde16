/// Vector store kept in a single SQLite file per store directory.
pub mod sqlite;
