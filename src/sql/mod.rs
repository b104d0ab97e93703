//! SQL batch generation for the PostGIS store.

mod batch;
mod escape;
mod schema;

pub use batch::{build_batch, BatchBuilder, BatchOptions};
pub use escape::{integer_literal, quote_literal};
pub use schema::schema_sql;
