//! The dynamic predicate compiler
//!
//! Turns a [`Dynamic`] into an executable [`Restriction`]: a restriction
//! clause with `@N` parameter placeholders, the parameter values in binding
//! order, and a composite ordering string. The concrete fragment syntax is
//! whatever the underlying query executor accepts; only the model and the
//! binding order are contractual.
//!
//! # Example
//!
//! ```rust
//! use bedrock_persistence::dynamics::{compile, Dynamic, Filter};
//!
//! let dynamic = Dynamic::filtered(
//!     Filter::gte("age", "18").and(vec![Filter::eq("status", "active")]),
//! );
//! let restriction = compile(&dynamic).unwrap();
//!
//! assert_eq!(restriction.clause.as_deref(), Some("age >= @0 AND (status = @1)"));
//! assert_eq!(restriction.params, vec!["18", "active"]);
//! ```

use crate::error::{PersistenceError, Result};

use super::{Dynamic, Filter, Sort};

/// A compiled query restriction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restriction {
    /// Restriction clause with `@N` placeholders; `None` when no filter was
    /// supplied or every node contributed an empty clause
    pub clause: Option<String>,
    /// Parameter values in placeholder order
    pub params: Vec<String>,
    /// Composite ordering, `"field dir"` entries joined by `", "`
    pub ordering: Option<String>,
}

/// How an operator renders into a clause fragment
enum Fragment {
    /// Comparison-operator syntax: `field <op> @N`
    Comparison(&'static str),
    /// Unary syntax, no parameter read: `field <suffix>`
    Unary(&'static str),
    /// Function-call syntax: `(func(field, @N))`
    Function(&'static str),
    /// Negated function-call syntax: `NOT (func(field, @N))`
    NegatedFunction(&'static str),
}

/// Resolve an operator string against the fixed operator table
fn resolve_operator(operator: &str) -> Result<Fragment> {
    match operator {
        "eq" => Ok(Fragment::Comparison("=")),
        "neq" => Ok(Fragment::Comparison("!=")),
        "lt" => Ok(Fragment::Comparison("<")),
        "lte" => Ok(Fragment::Comparison("<=")),
        "gt" => Ok(Fragment::Comparison(">")),
        "gte" => Ok(Fragment::Comparison(">=")),
        "isnull" => Ok(Fragment::Unary("IS NULL")),
        "isnotnull" => Ok(Fragment::Unary("IS NOT NULL")),
        "startswith" => Ok(Fragment::Function("starts_with")),
        "endswith" => Ok(Fragment::Function("ends_with")),
        "contains" => Ok(Fragment::Function("contains")),
        "doesnotcontain" => Ok(Fragment::NegatedFunction("contains")),
        other => Err(PersistenceError::unsupported_operator(other)),
    }
}

/// Compile a dynamic into a restriction
///
/// Validation is eager: an operator outside the fixed set fails with
/// [`PersistenceError::UnsupportedOperator`] before any store round-trip.
/// Field names are not validated here; an unknown field surfaces as the
/// store's native field-resolution error.
pub fn compile(dynamic: &Dynamic) -> Result<Restriction> {
    let mut params = Vec::new();
    let clause = match dynamic.filter {
        Some(ref filter) => {
            let mut next_index = 0;
            let clause = transform(filter, &mut next_index, &mut params)?;
            (!clause.is_empty()).then_some(clause)
        }
        None => None,
    };

    Ok(Restriction {
        clause,
        params,
        ordering: compile_sorts(&dynamic.sorts),
    })
}

/// Build the composite ordering string, most significant key first
pub fn compile_sorts(sorts: &[Sort]) -> Option<String> {
    if sorts.is_empty() {
        return None;
    }
    Some(
        sorts
            .iter()
            .map(Sort::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Transform one node and its subtree into a clause
///
/// Placeholder indices are assigned in pre-order as nodes are visited, and
/// each node's value is pushed onto `params` in the same visit. The clause
/// text and the parameter list therefore share one traversal; splitting them
/// would break the `@N` binding.
fn transform(filter: &Filter, next_index: &mut usize, params: &mut Vec<String>) -> Result<String> {
    let index = *next_index;
    *next_index += 1;
    // Null-check operators never read their parameter, but the slot is still
    // reserved so sibling indices line up.
    params.push(filter.value.clone().unwrap_or_default());

    let fragment = resolve_operator(&filter.operator)?;
    let field = &filter.field;

    let own = match fragment {
        Fragment::Unary(suffix) => format!("{field} {suffix}"),
        _ if filter.value.as_deref().is_none_or(str::is_empty) => {
            // A binary operator with an empty value contributes no
            // restriction at this node.
            String::new()
        }
        Fragment::Comparison(op) => format!("{field} {op} @{index}"),
        Fragment::Function(func) => format!("({func}({field}, @{index}))"),
        Fragment::NegatedFunction(func) => format!("NOT ({func}({field}, @{index}))"),
    };

    // Children are traversed even when they cannot be combined, so that
    // placeholder numbering stays in pre-order.
    let mut children = Vec::with_capacity(filter.filters.len());
    for child in &filter.filters {
        children.push(transform(child, next_index, params)?);
    }

    match filter.logic {
        Some(ref logic) if !filter.filters.is_empty() => {
            let joiner = logic.to_uppercase();
            let joined = children
                .into_iter()
                .filter(|clause| !clause.is_empty())
                .collect::<Vec<_>>()
                .join(&format!(" {joiner} "));
            Ok(match (own.is_empty(), joined.is_empty()) {
                (false, false) => format!("{own} {joiner} ({joined})"),
                (false, true) => own,
                (true, false) => format!("({joined})"),
                (true, true) => String::new(),
            })
        }
        _ => Ok(own),
    }
}
