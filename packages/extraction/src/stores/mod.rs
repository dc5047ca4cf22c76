//! Postgres-backed implementation of [`crate::traits::CompetitorStore`].

mod postgres;

pub use postgres::PostgresCompetitorStore;
