//! Output layer for calsynth: CSV files, dialect-specific schema DDL and
//! the `@TODAY`/`@session_id`-parameterized INSERT scripts.

pub mod csv;
pub mod ddl;
pub mod errors;
pub mod script;
pub mod sql;

pub use self::csv::write_dataset_csv;
pub use ddl::schema_ddl;
pub use errors::EmitError;
pub use script::{split_statements, substitute_variables};
pub use sql::SqlEmitter;
