//! Composable predicates over values
//!
//! Every builder is pure and returns a cheap-to-clone [`Predicate`]. Numeric
//! comparisons treat `Int` and `Float` alike and are false for non-numbers.

use crate::Value;
use std::fmt;
use std::sync::Arc;

/// A boolean test over a value
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    /// Wrap a closure as a predicate
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Evaluate the predicate
    pub fn test(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// A 2D point used by [`within`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Read a point from a record with numeric `x` and `y` fields
    pub fn from_value(value: &Value) -> Option<Self> {
        let x = value.get_key("x")?.as_float()?;
        let y = value.get_key("y")?.as_float()?;
        Some(Self { x, y })
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

fn numeric(value: &Value, cmp: impl Fn(f64) -> bool) -> bool {
    value.as_float().map(cmp).unwrap_or(false)
}

/// Equality where `Int` and `Float` with the same magnitude match
pub(crate) fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            a.as_float() == b.as_float()
        }
        _ => a == b,
    }
}

/// `value < n`
pub fn lt(n: f64) -> Predicate {
    Predicate::new(move |v| numeric(v, |x| x < n))
}

/// `value > n`
pub fn gt(n: f64) -> Predicate {
    Predicate::new(move |v| numeric(v, |x| x > n))
}

/// `value <= n`
pub fn lte(n: f64) -> Predicate {
    Predicate::new(move |v| numeric(v, |x| x <= n))
}

/// `value >= n`
pub fn gte(n: f64) -> Predicate {
    Predicate::new(move |v| numeric(v, |x| x >= n))
}

/// Equal to `expected`
pub fn eq(expected: impl Into<Value>) -> Predicate {
    let expected = expected.into();
    Predicate::new(move |v| loosely_equal(v, &expected))
}

/// Not equal to `expected`
pub fn neq(expected: impl Into<Value>) -> Predicate {
    let expected = expected.into();
    Predicate::new(move |v| !loosely_equal(v, &expected))
}

/// Member of `options`
pub fn one_of<V, I>(options: I) -> Predicate
where
    V: Into<Value>,
    I: IntoIterator<Item = V>,
{
    let options: Vec<Value> = options.into_iter().map(Into::into).collect();
    Predicate::new(move |v| options.iter().any(|o| loosely_equal(v, o)))
}

/// Position record `{x, y}` inside the circle around `center`, boundary
/// inclusive. Compares squared distances.
pub fn within(center: impl Into<Point>, radius: f64) -> Predicate {
    let center = center.into();
    let radius_sq = radius * radius;
    Predicate::new(move |v| match Point::from_value(v) {
        Some(p) => {
            let dx = p.x - center.x;
            let dy = p.y - center.y;
            dx * dx + dy * dy <= radius_sq
        }
        None => false,
    })
}

/// Every predicate holds (true when empty)
pub fn all_of(predicates: Vec<Predicate>) -> Predicate {
    Predicate::new(move |v| predicates.iter().all(|p| p.test(v)))
}

/// At least one predicate holds (false when empty)
pub fn any_of(predicates: Vec<Predicate>) -> Predicate {
    Predicate::new(move |v| predicates.iter().any(|p| p.test(v)))
}

/// Negation
pub fn not(predicate: Predicate) -> Predicate {
    Predicate::new(move |v| !predicate.test(v))
}
