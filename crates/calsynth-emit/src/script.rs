/// Replace `@TODAY` and `@session_id` with quoted literals. Used for the
/// SQLite script, which has no native user variables.
pub fn substitute_variables(sql: &str, today: &str, session_id: &str) -> String {
    sql.replace("@TODAY", &format!("'{today}'"))
        .replace("@session_id", &format!("'{session_id}'"))
}

/// Split a script into statements on `;`, honoring single-quoted strings
/// and backslash escapes inside them. Comment-only statements are dropped.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut escape_next = false;

    for ch in sql.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
        } else if ch == '\\' && in_string {
            current.push(ch);
            escape_next = true;
        } else if ch == '\'' {
            in_string = !in_string;
            current.push(ch);
        } else if ch == ';' && !in_string {
            push_statement(&mut statements, &current);
            current.clear();
        } else {
            current.push(ch);
        }
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let body: Vec<&str> = raw
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect();
    let statement = body.join("\n").trim().to_string();
    if !statement.is_empty() {
        statements.push(statement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semicolons_inside_strings_do_not_split() {
        let sql = "INSERT INTO t (a) VALUES ('x; y');\nINSERT INTO t (a) VALUES ('z');";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("'x; y'"));
    }

    #[test]
    fn escaped_quotes_keep_the_string_open() {
        let sql = r"INSERT INTO t (a) VALUES ('it\'s; fine');INSERT INTO t (a) VALUES (1);";
        let statements = split_statements(sql);
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn comments_and_blanks_are_dropped() {
        let sql = "-- header\n\nINSERT INTO t (a) VALUES (1);\n-- trailing comment\n";
        let statements = split_statements(sql);
        assert_eq!(statements, vec!["INSERT INTO t (a) VALUES (1)".to_string()]);
    }

    #[test]
    fn variables_become_quoted_literals() {
        let sql = "INSERT INTO t VALUES (datetime(@TODAY, '+1 days'), @session_id);";
        let replaced = substitute_variables(sql, "2024-01-15", "session_abc");
        assert_eq!(
            replaced,
            "INSERT INTO t VALUES (datetime('2024-01-15', '+1 days'), 'session_abc');"
        );
    }
}
