//! Logical query templates shared by both backends.
//!
//! Templates use `?` positional placeholders. [`Dialect::render`] turns them
//! into the placeholder syntax each engine expects.

/// Insert a record and hand back the engine-assigned id.
pub const INSERT_RESPONSE: &str =
    "INSERT INTO responses (prompt, response) VALUES (?, ?) RETURNING id";

pub const SELECT_RESPONSE_BY_ID: &str =
    "SELECT id, prompt, response, created_at FROM responses WHERE id = ?";

/// Newest first. `id` breaks ties between rows sharing a timestamp.
pub const SELECT_RESPONSE_PAGE: &str = "SELECT id, prompt, response, created_at
     FROM responses
     ORDER BY created_at DESC, id DESC
     LIMIT ? OFFSET ?";

pub const COUNT_RESPONSES: &str = "SELECT COUNT(*) FROM responses";

/// Placeholder flavour of a SQL engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `?` placeholders.
    Sqlite,
    /// `$1`, `$2`, ... placeholders.
    Postgres,
}

impl Dialect {
    /// Rewrite a `?`-style template for this dialect.
    ///
    /// Question marks inside single-quoted string literals are left alone.
    pub fn render(&self, template: &str) -> String {
        match self {
            Dialect::Sqlite => template.to_string(),
            Dialect::Postgres => {
                let mut out = String::with_capacity(template.len() + 8);
                let mut in_literal = false;
                let mut index = 0;
                for ch in template.chars() {
                    match ch {
                        '\'' => {
                            in_literal = !in_literal;
                            out.push(ch);
                        }
                        '?' if !in_literal => {
                            index += 1;
                            out.push('$');
                            out.push_str(&index.to_string());
                        }
                        _ => out.push(ch),
                    }
                }
                out
            }
        }
    }
}

/// The full statement set rendered for one dialect.
#[derive(Debug, Clone)]
pub struct Statements {
    pub insert: String,
    pub select_by_id: String,
    pub select_page: String,
    pub count: String,
}

impl Statements {
    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            insert: dialect.render(INSERT_RESPONSE),
            select_by_id: dialect.render(SELECT_RESPONSE_BY_ID),
            select_page: dialect.render(SELECT_RESPONSE_PAGE),
            count: dialect.render(COUNT_RESPONSES),
        }
    }
}
