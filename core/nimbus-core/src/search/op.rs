//! Predicate operators and connectives

/// Comparison operator of one predicate node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    NEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    In,
    NotIn,
    Null,
    NotNull,
}

/// How many values a node binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// `IS NULL` / `IS NOT NULL`
    None,
    Single,
    List,
}

impl Op {
    pub fn arity(self) -> Arity {
        match self {
            Op::Null | Op::NotNull => Arity::None,
            Op::In | Op::NotIn => Arity::List,
            _ => Arity::Single,
        }
    }

    /// Render the condition for `column` with `count` placeholders.
    pub(crate) fn render(self, column: &str, count: usize) -> String {
        match self {
            Op::Eq => format!("{column} = ?"),
            Op::NEq => format!("{column} != ?"),
            Op::Lt => format!("{column} < ?"),
            Op::LtEq => format!("{column} <= ?"),
            Op::Gt => format!("{column} > ?"),
            Op::GtEq => format!("{column} >= ?"),
            Op::Like => format!("{column} LIKE ? ESCAPE '\\'"),
            // IN () is not valid SQL
            Op::In if count == 0 => "1 = 0".to_string(),
            Op::NotIn if count == 0 => "1 = 1".to_string(),
            Op::In => format!("{column} IN ({})", placeholders(count)),
            Op::NotIn => format!("{column} NOT IN ({})", placeholders(count)),
            Op::Null => format!("{column} IS NULL"),
            Op::NotNull => format!("{column} IS NOT NULL"),
        }
    }
}

/// `%keyword%` with LIKE wildcards in `keyword` matched literally.
pub fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Logical connective joining a node to the nodes declared before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}
