use std::path::Path;

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{error, info};

use calsynth_emit::{split_statements, substitute_variables};

use crate::errors::PipelineError;

/// Result of loading a script into SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub ddl_statements: usize,
    pub insert_statements: usize,
}

/// Apply the schema DDL and the emitted script to a local SQLite database,
/// resolving `@TODAY`/`@session_id` first. Failures are fatal and not
/// retried: a failing statement means the generated data or the schema is
/// wrong, not that the database hiccuped.
pub async fn execute_sqlite(
    db_path: &Path,
    ddl: &str,
    script: &str,
    today: NaiveDate,
    session_id: &str,
) -> Result<ExecutionSummary, PipelineError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    let ddl_statements = run_statements(&pool, ddl).await?;

    let substituted = substitute_variables(script, &today.to_string(), session_id);
    let insert_statements = run_statements(&pool, &substituted).await?;

    pool.close().await;
    info!(
        db = %db_path.display(),
        ddl_statements,
        insert_statements,
        "script executed"
    );
    Ok(ExecutionSummary {
        ddl_statements,
        insert_statements,
    })
}

async fn run_statements(pool: &sqlx::SqlitePool, sql: &str) -> Result<usize, PipelineError> {
    let statements = split_statements(sql);
    for statement in &statements {
        if let Err(err) = sqlx::query(statement).execute(pool).await {
            error!(
                statement = %statement.chars().take(120).collect::<String>(),
                %err,
                "statement failed"
            );
            return Err(err.into());
        }
    }
    Ok(statements.len())
}
