//! Report store backends

mod memory;
mod postgres;

pub use memory::InMemoryReportStore;
pub use postgres::PostgresReportStore;
