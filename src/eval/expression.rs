use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::warn;

use super::context::Environment;
use super::value::Value;
use crate::ast::{BinaryOperator, Expression, StringPart, UnaryOperator};

/// Longest list a range expression evaluates to.
pub const MAX_RANGE_LEN: usize = 10_000;

/// Evaluates expressions against an [`Environment`].
///
/// Evaluation never fails: type mismatches coerce, unknown expression kinds
/// log a warning and yield [`Value::Null`]. The RNG behind `random` and
/// `pick_one` is injectable so runs can be reproduced.
pub struct ExpressionEvaluator<R: Rng = StdRng> {
    rng: R,
}

impl ExpressionEvaluator<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ExpressionEvaluator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates with the thread-local RNG.
pub fn evaluate(expr: &Expression, env: &dyn Environment) -> Value {
    ExpressionEvaluator::with_rng(rand::thread_rng()).evaluate(expr, env)
}

/// Rounded integer bounds of a range, in source order. `None` when either
/// side is not a number.
pub fn range_bounds(start: &Value, end: &Value) -> Option<(i64, i64)> {
    let start = start.to_number();
    let end = end.to_number();
    if start.is_finite() && end.is_finite() {
        Some((start.round() as i64, end.round() as i64))
    } else {
        None
    }
}

impl<R: Rng> ExpressionEvaluator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn evaluate(&mut self, expr: &Expression, env: &dyn Environment) -> Value {
        match expr {
            Expression::Number { value } => Value::Number(*value),
            Expression::String { value } => Value::String(value.clone()),
            Expression::Boolean { value } => Value::Bool(*value),
            Expression::Variable { name } => env.get_variable(name),
            Expression::BinaryOp { op, left, right } => {
                let left = self.evaluate(left, env);
                let right = self.evaluate(right, env);
                apply_binary(*op, left, right)
            }
            Expression::UnaryOp { op, operand } => {
                let operand = self.evaluate(operand, env);
                match op {
                    UnaryOperator::Negate => Value::Number(-operand.to_number()),
                    UnaryOperator::Not => Value::Bool(!operand.is_truthy()),
                }
            }
            Expression::Range { start, end } => {
                let start = self.evaluate(start, env);
                let end = self.evaluate(end, env);
                range_list(&start, &end)
            }
            Expression::Random { range } => self.random(range, env),
            Expression::PickOne { options } => {
                if options.is_empty() {
                    return Value::Null;
                }
                let index = self.rng.gen_range(0..options.len());
                self.evaluate(&options[index], env)
            }
            Expression::InterpolatedString { parts } => Value::String(interpolate(parts, env)),
            Expression::Unknown => {
                warn!("unknown expression kind, evaluating to null");
                Value::Null
            }
        }
    }

    /// Evaluates a range expression to its bounds, for `for` agents.
    pub fn range_bounds(&mut self, expr: &Expression, env: &dyn Environment) -> Option<(i64, i64)> {
        match expr {
            Expression::Range { start, end } => {
                let start = self.evaluate(start, env);
                let end = self.evaluate(end, env);
                range_bounds(&start, &end)
            }
            _ => None,
        }
    }

    fn random(&mut self, range: &Expression, env: &dyn Environment) -> Value {
        let Some((a, b)) = self.range_bounds(range, env) else {
            // `random list_var` picks an element
            return match self.evaluate(range, env) {
                Value::List(items) if !items.is_empty() => {
                    let index = self.rng.gen_range(0..items.len());
                    items[index].clone()
                }
                other => {
                    warn!(value = %other, "random needs a numeric range");
                    Value::Null
                }
            };
        };
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Value::Number(self.rng.gen_range(low..=high) as f64)
    }
}

/// Applies a binary operator to two already evaluated operands.
pub fn apply_binary(op: BinaryOperator, left: Value, right: Value) -> Value {
    use std::cmp::Ordering;
    use BinaryOperator::*;

    match op {
        Add => match (&left, &right) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(format!("{}{}", left, right))
            }
            _ => Value::Number(left.to_number() + right.to_number()),
        },
        Subtract => Value::Number(left.to_number() - right.to_number()),
        Multiply => Value::Number(left.to_number() * right.to_number()),
        Divide => Value::Number(left.to_number() / right.to_number()),
        Modulo => Value::Number(left.to_number() % right.to_number()),
        Equal => Value::Bool(left.strict_eq(&right)),
        NotEqual => Value::Bool(!left.strict_eq(&right)),
        LessThan => Value::Bool(matches!(left.compare(&right), Some(Ordering::Less))),
        GreaterThan => Value::Bool(matches!(left.compare(&right), Some(Ordering::Greater))),
        LessThanEqual => Value::Bool(matches!(
            left.compare(&right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        GreaterThanEqual => Value::Bool(matches!(
            left.compare(&right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        And => Value::Bool(left.is_truthy() && right.is_truthy()),
        Or => Value::Bool(left.is_truthy() || right.is_truthy()),
    }
}

/// Inclusive integer list; descending when `start > end`.
fn range_list(start: &Value, end: &Value) -> Value {
    let Some((start, end)) = range_bounds(start, end) else {
        warn!(start = %start, end = %end, "range bounds are not numbers");
        return Value::List(Vec::new());
    };
    let len = start.abs_diff(end).saturating_add(1);
    if len > MAX_RANGE_LEN as u64 {
        warn!(start, end, max = MAX_RANGE_LEN, "range truncated");
    }
    let step: i64 = if start <= end { 1 } else { -1 };
    let items = (0..len.min(MAX_RANGE_LEN as u64) as i64)
        .map(|i| Value::Number((start + i * step) as f64))
        .collect();
    Value::List(items)
}

fn interpolate(parts: &[StringPart], env: &dyn Environment) -> String {
    let mut out = String::new();
    for part in parts {
        match part {
            StringPart::Text(text) => out.push_str(text),
            StringPart::Variable(var) => out.push_str(&env.get_variable(&var.name).to_string()),
        }
    }
    out
}
