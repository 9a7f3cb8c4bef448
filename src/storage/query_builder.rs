//! SELECT statement assembly from typed fragments.
//!
//! [`SelectBuilder`] collects a select list, a source relation, joins,
//! predicates and an ordering, each carrying its own parameter slots. Values
//! are never rendered into the SQL text: [`SelectBuilder::build`] produces a
//! [`Statement`] whose `?` placeholders line up with its `params` in render
//! order, whatever order the fragments were added in.
//!
//! Predicates combine strictly left to right (`a AND b OR c`). Each predicate
//! is wrapped in parentheses, so a predicate containing its own `OR` stays
//! grouped.
//!
//! # Example
//!
//! ```
//! use graphrel::storage::query_builder::SelectBuilder;
//! use graphrel::storage::value::SqlValue;
//!
//! let stmt = SelectBuilder::new()
//!     .select("e1.to_id")
//!     .from("edge e1")
//!     .and_where("e1.from_id = ?", [SqlValue::Integer(1)])
//!     .and_where("e1.provenance = 0", [])
//!     .build();
//!
//! assert_eq!(
//!     stmt.sql,
//!     "SELECT e1.to_id\nFROM edge e1\nWHERE (e1.from_id = ?) AND (e1.provenance = 0)"
//! );
//! assert_eq!(stmt.params, vec![SqlValue::Integer(1)]);
//! ```

use crate::storage::value::SqlValue;

/// A rendered statement ready for the storage adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// SQL text with positional `?` placeholders.
    pub sql: String,
    /// Parameter values in placeholder order.
    pub params: Vec<SqlValue>,
}

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `INNER JOIN`: rows without a match are dropped.
    Inner,
    /// `LEFT JOIN`: rows without a match are kept with NULL columns.
    Left,
}

impl JoinKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
        }
    }
}

/// How a predicate attaches to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

#[derive(Debug, Clone)]
struct Fragment {
    sql: String,
    params: Vec<SqlValue>,
}

impl Fragment {
    fn new(sql: impl Into<String>, params: impl IntoIterator<Item = SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params: params.into_iter().collect(),
        }
    }
}

/// Builder for a single SELECT statement.
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    select: Option<String>,
    from: Option<String>,
    joins: Vec<(JoinKind, Fragment)>,
    predicates: Vec<(Connective, Fragment)>,
    group_by: Vec<String>,
    order_by: Vec<String>,
}

impl SelectBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the select list. Defaults to `*`.
    #[must_use]
    pub fn select(mut self, fields: impl Into<String>) -> Self {
        self.select = Some(fields.into());
        self
    }

    /// Sets the source relation (table plus optional alias).
    #[must_use]
    pub fn from(mut self, source: impl Into<String>) -> Self {
        self.from = Some(source.into());
        self
    }

    /// Adds a join. `condition` is the text after the join keyword, e.g.
    /// `"edge e2 ON e2.from_id = e1.to_id AND e2.to_id <> ?"`.
    #[must_use]
    pub fn join(
        mut self,
        kind: JoinKind,
        condition: impl Into<String>,
        params: impl IntoIterator<Item = SqlValue>,
    ) -> Self {
        self.joins.push((kind, Fragment::new(condition, params)));
        self
    }

    /// Adds an `INNER JOIN`.
    #[must_use]
    pub fn inner_join(
        self,
        condition: impl Into<String>,
        params: impl IntoIterator<Item = SqlValue>,
    ) -> Self {
        self.join(JoinKind::Inner, condition, params)
    }

    /// Adds a `LEFT JOIN`.
    #[must_use]
    pub fn left_join(
        self,
        condition: impl Into<String>,
        params: impl IntoIterator<Item = SqlValue>,
    ) -> Self {
        self.join(JoinKind::Left, condition, params)
    }

    /// Replaces every predicate added so far with this one.
    #[must_use]
    pub fn where_clause(
        mut self,
        predicate: impl Into<String>,
        params: impl IntoIterator<Item = SqlValue>,
    ) -> Self {
        self.predicates.clear();
        self.predicates
            .push((Connective::And, Fragment::new(predicate, params)));
        self
    }

    /// Appends a predicate joined with `AND`.
    #[must_use]
    pub fn and_where(
        mut self,
        predicate: impl Into<String>,
        params: impl IntoIterator<Item = SqlValue>,
    ) -> Self {
        self.predicates
            .push((Connective::And, Fragment::new(predicate, params)));
        self
    }

    /// Appends a predicate joined with `OR`.
    #[must_use]
    pub fn or_where(
        mut self,
        predicate: impl Into<String>,
        params: impl IntoIterator<Item = SqlValue>,
    ) -> Self {
        self.predicates
            .push((Connective::Or, Fragment::new(predicate, params)));
        self
    }

    /// Appends a GROUP BY term.
    #[must_use]
    pub fn group_by(mut self, term: impl Into<String>) -> Self {
        self.group_by.push(term.into());
        self
    }

    /// Appends an ORDER BY term.
    #[must_use]
    pub fn order_by(mut self, term: impl Into<String>) -> Self {
        self.order_by.push(term.into());
        self
    }

    /// Renders the statement.
    ///
    /// Parameters are emitted joins first, then predicates, matching the
    /// placeholder order of the SQL text.
    #[must_use]
    pub fn build(self) -> Statement {
        let mut sql = format!(
            "SELECT {}\nFROM {}",
            self.select.as_deref().unwrap_or("*"),
            self.from.as_deref().unwrap_or_default()
        );
        let mut params = Vec::new();

        for (kind, fragment) in self.joins {
            sql.push('\n');
            sql.push_str(kind.keyword());
            sql.push(' ');
            sql.push_str(&fragment.sql);
            params.extend(fragment.params);
        }

        if !self.predicates.is_empty() {
            sql.push_str("\nWHERE ");
            for (idx, (connective, fragment)) in self.predicates.into_iter().enumerate() {
                if idx > 0 {
                    sql.push_str(match connective {
                        Connective::And => " AND ",
                        Connective::Or => " OR ",
                    });
                }
                sql.push('(');
                sql.push_str(&fragment.sql);
                sql.push(')');
                params.extend(fragment.params);
            }
        }

        if !self.group_by.is_empty() {
            sql.push_str("\nGROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            sql.push_str("\nORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        Statement { sql, params }
    }
}

/// Returns `n` comma-separated `?` placeholders.
#[must_use]
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
