use calsynth_core::SqlDialect;

const SQLITE_DDL: &str = include_str!("../assets/schema_sqlite.sql");
const MYSQL_DDL: &str = include_str!("../assets/schema_mysql.sql");

/// Embedded table definitions for the target dialect. The variants differ
/// in autoincrement syntax, boolean encoding and the attendee status
/// domain (SQLite carries the 3-value subset).
pub fn schema_ddl(dialect: SqlDialect) -> &'static str {
    match dialect {
        SqlDialect::Sqlite => SQLITE_DDL,
        SqlDialect::MySql => MYSQL_DDL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialects_use_their_own_autoincrement_keyword() {
        assert!(schema_ddl(SqlDialect::Sqlite).contains("AUTOINCREMENT"));
        assert!(schema_ddl(SqlDialect::MySql).contains("AUTO_INCREMENT"));
    }

    #[test]
    fn status_domains_differ_by_dialect() {
        let sqlite = schema_ddl(SqlDialect::Sqlite);
        assert!(sqlite.contains("CHECK (status IN ('pending', 'accepted', 'declined'))"));
        let mysql = schema_ddl(SqlDialect::MySql);
        assert!(mysql.contains("ENUM('pending', 'accepted', 'declined', 'tentative', 'no_response')"));
    }

    #[test]
    fn both_variants_define_all_five_tables() {
        for dialect in [SqlDialect::Sqlite, SqlDialect::MySql] {
            let ddl = schema_ddl(dialect);
            for table in ["users", "calendars", "calendar_shares", "events", "attendees"] {
                assert!(
                    ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")),
                    "{dialect} missing {table}"
                );
            }
        }
    }
}
