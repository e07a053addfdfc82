//! Compiles one typed filter criterion into a SQL boolean expression.

use analytics_model::{Comparison, DateOp, FilterCriterion, MatchMode, NumericOp, StringOp};

use crate::QueryError;

/// Quote a literal for embedding in SQL: single quotes doubled, the
/// whole value wrapped in single quotes.
pub fn quote_literal(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

/// Compile a criterion into a boolean expression over its mapped column.
///
/// Pure function of (field, comparison, value). A family mismatch
/// between field and comparison is a contract violation and fails fast.
pub fn compile(criterion: &FilterCriterion) -> Result<String, QueryError> {
    if !criterion.matches_family() {
        return Err(QueryError::OperatorMismatch {
            field: criterion.field,
            comparison: criterion.comparison,
        });
    }

    let column = criterion.field.column();
    let value = criterion.value.as_str();

    let sql = match criterion.comparison {
        Comparison::Text(op) => {
            let literal = match op {
                StringOp::Equals => quote_literal(value),
                StringOp::Contains => quote_literal(&format!("%{value}%")),
                StringOp::BeginsWith => quote_literal(&format!("{value}%")),
                StringOp::EndsWith => quote_literal(&format!("%{value}")),
            };
            match op {
                StringOp::Equals => format!("{column} = {literal}"),
                _ => format!("{column} LIKE {literal}"),
            }
        }
        Comparison::Version(op) => {
            // Versions compare as stored strings, so '10.0' < '2.0'.
            let literal = quote_literal(value);
            let operator = match op {
                NumericOp::LessThan => "<",
                NumericOp::LessOrEqual => "<=",
                NumericOp::Equals => "=",
                NumericOp::GreaterThan => ">",
                NumericOp::GreaterOrEqual => ">=",
            };
            format!("{column} {operator} {literal}")
        }
        Comparison::Date(op) => {
            // Day granularity against a full timestamp column: same-day
            // is a LIKE prefix match, and the strict comparisons run
            // against the same prefix-quoted literal.
            let literal = quote_literal(&format!("{value}%"));
            match op {
                DateOp::Same => format!("{column} LIKE {literal}"),
                DateOp::Before => format!("{column} < {literal}"),
                DateOp::After => format!("{column} > {literal}"),
                DateOp::BeforeOrEqual => {
                    format!("({column} < {literal} OR {column} LIKE {literal})")
                }
                DateOp::AfterOrEqual => {
                    format!("({column} LIKE {literal} OR {column} > {literal})")
                }
            }
        }
    };

    Ok(sql)
}

/// Compile every criterion with a non-empty value and join the
/// fragments per the match mode. Errors if nothing remains to compile.
pub fn compile_all(criteria: &[FilterCriterion], mode: MatchMode) -> Result<String, QueryError> {
    let fragments = criteria
        .iter()
        .filter(|c| c.has_value())
        .map(compile)
        .collect::<Result<Vec<_>, _>>()?;

    if fragments.is_empty() {
        return Err(QueryError::EmptyFilter);
    }

    Ok(fragments.join(mode.separator()))
}
