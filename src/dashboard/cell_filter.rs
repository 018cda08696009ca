//! Per-column filter expressions typed into the table's filter row.
//!
//! `contains Lab`, `>= 26`, `!= Intact Male`, or a bare operand. A bare numeric
//! operand tests numeric cells for equality; anything else is a substring test.

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Contains,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellFilter {
    pub expression: String,
    pub operator: Operator,
    pub operand: String,
}

const PREFIXES: [(&str, Operator); 7] = [
    ("contains ", Operator::Contains),
    (">=", Operator::Ge),
    ("<=", Operator::Le),
    ("!=", Operator::Ne),
    ("=", Operator::Eq),
    (">", Operator::Gt),
    ("<", Operator::Lt),
];

impl CellFilter {
    /// `None` for a blank expression, which clears the column filter.
    pub fn parse(expression: &str) -> Option<Self> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return None;
        }
        let (operator, rest) = PREFIXES
            .iter()
            .find_map(|(prefix, op)| trimmed.strip_prefix(*prefix).map(|rest| (*op, rest)))
            .unwrap_or((Operator::Default, trimmed));
        let operand = unquote(rest.trim()).to_string();
        Some(Self {
            expression: trimmed.to_string(),
            operator,
            operand,
        })
    }

    pub fn matches(&self, cell: Option<&Value>) -> bool {
        let Some(cell) = cell.filter(|v| !v.is_null()) else {
            return false;
        };
        let text = display_value(cell);
        let numbers = cell.as_f64().zip(self.operand.parse::<f64>().ok());
        match self.operator {
            Operator::Contains => text.contains(&self.operand),
            Operator::Default => match numbers {
                Some((value, operand)) => value == operand,
                None => text.contains(&self.operand),
            },
            op => {
                let ordering = match numbers {
                    Some((value, operand)) => value.partial_cmp(&operand),
                    None => Some(text.as_str().cmp(self.operand.as_str())),
                };
                let Some(ordering) = ordering else {
                    return false;
                };
                match op {
                    Operator::Eq => ordering == Ordering::Equal,
                    Operator::Ne => ordering != Ordering::Equal,
                    Operator::Lt => ordering == Ordering::Less,
                    Operator::Le => ordering != Ordering::Greater,
                    Operator::Gt => ordering == Ordering::Greater,
                    Operator::Ge => ordering != Ordering::Less,
                    Operator::Contains | Operator::Default => false,
                }
            }
        }
    }
}

fn unquote(operand: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = operand
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    operand
}

/// Cell text as the table shows it.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
