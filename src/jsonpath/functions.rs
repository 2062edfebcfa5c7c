use std::collections::HashMap;

use lazy_static::lazy_static;
use serde_json::{Number, Value};

/// A built-in aggregate over the values selected by a function argument.
pub type AggregateFn = fn(&[&Value]) -> Value;

lazy_static! {
    static ref FUNCTIONS: HashMap<&'static str, AggregateFn> = {
        let mut functions: HashMap<&'static str, AggregateFn> = HashMap::new();
        functions.insert("max", max);
        functions.insert("min", min);
        functions.insert("avg", avg);
        functions.insert("sum", sum);
        functions.insert("count", count);
        functions.insert("prod", prod);
        functions
    };
}

/// Looks up a built-in aggregate by name.
pub fn lookup(name: &str) -> Option<AggregateFn> {
    FUNCTIONS.get(name).copied()
}

fn number(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

/// Coerces every argument to a double, or bails out with `None` when one
/// of them has no numeric reading.
fn doubles(nodes: &[&Value]) -> Option<Vec<f64>> {
    nodes.iter().map(|v| v.as_f64()).collect()
}

fn max(nodes: &[&Value]) -> Value {
    match doubles(nodes) {
        Some(xs) => number(xs.into_iter().fold(f64::MIN, f64::max)),
        None => Value::Null,
    }
}

fn min(nodes: &[&Value]) -> Value {
    match doubles(nodes) {
        Some(xs) => number(xs.into_iter().fold(f64::MAX, f64::min)),
        None => Value::Null,
    }
}

fn avg(nodes: &[&Value]) -> Value {
    match doubles(nodes) {
        Some(xs) if !xs.is_empty() => {
            let total: f64 = xs.iter().sum();
            number(total / xs.len() as f64)
        }
        _ => Value::Null,
    }
}

fn sum(nodes: &[&Value]) -> Value {
    match doubles(nodes) {
        Some(xs) => number(xs.into_iter().sum()),
        None => Value::Null,
    }
}

fn count(nodes: &[&Value]) -> Value {
    Value::Number(Number::from(nodes.len() as u64))
}

// Seeds the accumulator with the first nonzero factor rather than with
// the multiplicative identity, so leading zeros are skipped outright.
fn prod(nodes: &[&Value]) -> Value {
    match doubles(nodes) {
        Some(xs) => {
            let mut v = 0.0;
            for x in xs {
                if v == 0.0 && x != 0.0 {
                    v = x;
                } else {
                    v *= x;
                }
            }
            number(v)
        }
        None => Value::Null,
    }
}
