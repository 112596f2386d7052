// Observability module: observation recorder and slow SQL logging

pub mod recorder;
pub mod slow_sql;

pub use recorder::*;
pub use slow_sql::*;
