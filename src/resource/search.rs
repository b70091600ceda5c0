use std::collections::HashMap;

use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ColumnTrait, Condition,
};

use crate::error::AppError;

pub const DEFAULT_LIMIT: u64 = 20;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Case-insensitive substring match.
    Contains,
    AtMost,
    AtLeast,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchField<C> {
    pub param: &'static str,
    pub column: C,
    pub op: Op,
}

impl<C> SearchField<C> {
    pub const fn contains(param: &'static str, column: C) -> Self {
        Self { param, column, op: Op::Contains }
    }

    pub const fn at_most(param: &'static str, column: C) -> Self {
        Self { param, column, op: Op::AtMost }
    }

    pub const fn at_least(param: &'static str, column: C) -> Self {
        Self { param, column, op: Op::AtLeast }
    }
}

/// Removes `limit` from the query parameters and bounds it.
pub fn take_limit(params: &mut HashMap<String, String>) -> Result<Option<u64>, AppError> {
    match params.remove("limit") {
        Some(raw) if !raw.trim().is_empty() => {
            let limit: u64 = raw
                .trim()
                .parse()
                .map_err(|_| AppError::BadRequest("limit must be a positive number".to_string()))?;
            Ok(Some(limit.clamp(1, MAX_LIMIT)))
        }
        _ => Ok(None),
    }
}

/// Builds the filter for a search request. `q` matches the first field.
pub fn build_condition<C: ColumnTrait>(
    fields: &[SearchField<C>],
    params: &HashMap<String, String>,
) -> Result<Condition, AppError> {
    let mut terms: Vec<(&String, &str)> = params
        .iter()
        .map(|(key, value)| (key, value.trim()))
        .filter(|(_, value)| !value.is_empty())
        .collect();
    if terms.is_empty() {
        return Err(AppError::BadRequest("No search parameters provided.".to_string()));
    }
    terms.sort_by(|a, b| a.0.cmp(b.0));

    let mut condition = Condition::all();
    for (key, value) in terms {
        let field = (if key == "q" {
            fields.first()
        } else {
            fields.iter().find(|field| field.param == key.as_str())
        })
        .ok_or_else(|| AppError::BadRequest(format!("Unknown search parameter: {key}")))?;

        condition = condition.add(match field.op {
            Op::Contains => Expr::expr(Func::lower(Expr::col(field.column.as_column_ref())))
                .like(contains_pattern(value)),
            Op::AtMost => field.column.lte(bound(key, value)?),
            Op::AtLeast => field.column.gte(bound(key, value)?),
        });
    }
    Ok(condition)
}

/// Case-folded `%value%` pattern. Wildcards typed by the client match literally.
pub fn contains_pattern(value: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(&value.to_lowercase()))).escape('\\')
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn bound(key: &str, value: &str) -> Result<f64, AppError> {
    value
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{key} must be a number")))
}
