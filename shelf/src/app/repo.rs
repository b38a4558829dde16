/// Postgres connection helper.
pub mod pg;
