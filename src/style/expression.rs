//! Style expressions.
//!
//! Covers the part of the renderer's expression language this map uses:
//! feature property access, equality tests, boolean combinators and
//! zoom-driven linear interpolation. Expressions travel as their JSON array
//! form and can be evaluated locally against a feature.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

/// A style expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    /// `["get", name]`
    Get(String),
    /// `["zoom"]`
    Zoom,
    /// `["==", a, b]`
    Equal(Box<Expression>, Box<Expression>),
    /// `["!=", a, b]`
    NotEqual(Box<Expression>, Box<Expression>),
    /// `["all", ...]`
    All(Vec<Expression>),
    /// `["any", ...]`
    Any(Vec<Expression>),
    /// `["!", a]`
    Not(Box<Expression>),
    /// `["interpolate", ["linear"], input, stop, output, ...]`
    Interpolate {
        input: Box<Expression>,
        stops: Vec<(f64, f64)>,
    },
}

/// Errors from parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionError {
    UnknownOperator(String),
    WrongArity {
        operator: &'static str,
        found: usize,
    },
    InvalidArgument(String),
    /// A boolean was required; holds what was found instead.
    NotBoolean(Value),
    /// A number was required; holds what was found instead.
    NotNumber(Value),
}

impl std::fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpressionError::UnknownOperator(op) => {
                write!(f, "Unknown expression operator: {}", op)
            }
            ExpressionError::WrongArity { operator, found } => {
                write!(f, "Wrong number of arguments to {:?}: {}", operator, found)
            }
            ExpressionError::InvalidArgument(msg) => {
                write!(f, "Invalid expression argument: {}", msg)
            }
            ExpressionError::NotBoolean(v) => write!(f, "Expected boolean, found {}", v),
            ExpressionError::NotNumber(v) => write!(f, "Expected number, found {}", v),
        }
    }
}

impl std::error::Error for ExpressionError {}

/// Inputs an expression can read while being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub zoom: f64,
    pub properties: &'a Map<String, Value>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(zoom: f64, properties: &'a Map<String, Value>) -> Self {
        Self { zoom, properties }
    }
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn get(property: impl Into<String>) -> Self {
        Expression::Get(property.into())
    }

    pub fn eq(a: Expression, b: Expression) -> Self {
        Expression::Equal(Box::new(a), Box::new(b))
    }

    pub fn ne(a: Expression, b: Expression) -> Self {
        Expression::NotEqual(Box::new(a), Box::new(b))
    }

    /// Linear interpolation of `input` over `(stop, output)` pairs.
    pub fn interpolate_linear(input: Expression, stops: Vec<(f64, f64)>) -> Self {
        Expression::Interpolate {
            input: Box::new(input),
            stops,
        }
    }

    /// Converts the expression to its JSON array form.
    pub fn to_json(&self) -> Value {
        match self {
            Expression::Literal(v @ (Value::Array(_) | Value::Object(_))) => json!(["literal", v]),
            Expression::Literal(v) => v.clone(),
            Expression::Get(name) => json!(["get", name]),
            Expression::Zoom => json!(["zoom"]),
            Expression::Equal(a, b) => json!(["==", a.to_json(), b.to_json()]),
            Expression::NotEqual(a, b) => json!(["!=", a.to_json(), b.to_json()]),
            Expression::All(args) => combinator_json("all", args),
            Expression::Any(args) => combinator_json("any", args),
            Expression::Not(a) => json!(["!", a.to_json()]),
            Expression::Interpolate { input, stops } => {
                let mut out = vec![json!("interpolate"), json!(["linear"]), input.to_json()];
                for (stop, output) in stops {
                    out.push(json!(stop));
                    out.push(json!(output));
                }
                Value::Array(out)
            }
        }
    }

    /// Parses an expression from its JSON form.
    pub fn from_json(value: &Value) -> Result<Self, ExpressionError> {
        let items = match value {
            Value::Array(items) => items,
            other => return Ok(Expression::Literal(other.clone())),
        };

        let (op, args) = match items.split_first() {
            Some((Value::String(op), args)) => (op.as_str(), args),
            Some((other, _)) => {
                return Err(ExpressionError::InvalidArgument(format!(
                    "operator must be a string, found {}",
                    other
                )))
            }
            None => return Err(ExpressionError::InvalidArgument("empty expression".into())),
        };

        match op {
            "literal" => {
                expect_arity("literal", args, 1)?;
                Ok(Expression::Literal(args[0].clone()))
            }
            "get" => {
                expect_arity("get", args, 1)?;
                match &args[0] {
                    Value::String(name) => Ok(Expression::Get(name.clone())),
                    other => Err(ExpressionError::InvalidArgument(format!(
                        "get expects a property name, found {}",
                        other
                    ))),
                }
            }
            "zoom" => {
                expect_arity("zoom", args, 0)?;
                Ok(Expression::Zoom)
            }
            "==" => {
                expect_arity("==", args, 2)?;
                Ok(Expression::eq(
                    Self::from_json(&args[0])?,
                    Self::from_json(&args[1])?,
                ))
            }
            "!=" => {
                expect_arity("!=", args, 2)?;
                Ok(Expression::ne(
                    Self::from_json(&args[0])?,
                    Self::from_json(&args[1])?,
                ))
            }
            "!" => {
                expect_arity("!", args, 1)?;
                Ok(Expression::Not(Box::new(Self::from_json(&args[0])?)))
            }
            "all" => Ok(Expression::All(parse_all(args)?)),
            "any" => Ok(Expression::Any(parse_all(args)?)),
            "interpolate" => parse_interpolate(args),
            other => Err(ExpressionError::UnknownOperator(other.to_string())),
        }
    }

    /// Evaluates the expression against a feature.
    ///
    /// `get` on a missing property yields `null`; equality never coerces types.
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Value, ExpressionError> {
        match self {
            Expression::Literal(v) => Ok(v.clone()),
            Expression::Get(name) => Ok(ctx.properties.get(name).cloned().unwrap_or(Value::Null)),
            Expression::Zoom => Ok(json!(ctx.zoom)),
            Expression::Equal(a, b) => Ok(Value::Bool(values_equal(
                &a.evaluate(ctx)?,
                &b.evaluate(ctx)?,
            ))),
            Expression::NotEqual(a, b) => Ok(Value::Bool(!values_equal(
                &a.evaluate(ctx)?,
                &b.evaluate(ctx)?,
            ))),
            Expression::All(args) => {
                for arg in args {
                    if !arg.evaluate_bool(ctx)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            Expression::Any(args) => {
                for arg in args {
                    if arg.evaluate_bool(ctx)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            Expression::Not(a) => Ok(Value::Bool(!a.evaluate_bool(ctx)?)),
            Expression::Interpolate { input, stops } => {
                Ok(json!(interpolate(input.evaluate_number(ctx)?, stops)))
            }
        }
    }

    pub fn evaluate_bool(&self, ctx: &EvaluationContext<'_>) -> Result<bool, ExpressionError> {
        match self.evaluate(ctx)? {
            Value::Bool(b) => Ok(b),
            other => Err(ExpressionError::NotBoolean(other)),
        }
    }

    pub fn evaluate_number(&self, ctx: &EvaluationContext<'_>) -> Result<f64, ExpressionError> {
        let value = self.evaluate(ctx)?;
        value.as_f64().ok_or(ExpressionError::NotNumber(value))
    }

    /// Evaluates the expression as a filter; errors count as a non-match.
    pub fn matches(&self, ctx: &EvaluationContext<'_>) -> bool {
        match self.evaluate_bool(ctx) {
            Ok(matched) => matched,
            Err(e) => {
                log::debug!("Filter evaluation failed: {}", e);
                false
            }
        }
    }
}

fn combinator_json(op: &str, args: &[Expression]) -> Value {
    let mut out = vec![json!(op)];
    out.extend(args.iter().map(Expression::to_json));
    Value::Array(out)
}

fn expect_arity(
    operator: &'static str,
    args: &[Value],
    expected: usize,
) -> Result<(), ExpressionError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ExpressionError::WrongArity {
            operator,
            found: args.len(),
        })
    }
}

fn parse_all(args: &[Value]) -> Result<Vec<Expression>, ExpressionError> {
    args.iter().map(Expression::from_json).collect()
}

fn parse_interpolate(args: &[Value]) -> Result<Expression, ExpressionError> {
    // interpolation type, input, then at least one stop/output pair
    if args.len() < 4 || args.len() % 2 != 0 {
        return Err(ExpressionError::WrongArity {
            operator: "interpolate",
            found: args.len(),
        });
    }

    if args[0] != json!(["linear"]) {
        return Err(ExpressionError::InvalidArgument(format!(
            "only linear interpolation is supported, found {}",
            args[0]
        )));
    }

    let input = Expression::from_json(&args[1])?;
    let mut stops: Vec<(f64, f64)> = Vec::with_capacity((args.len() - 2) / 2);
    for pair in args[2..].chunks(2) {
        let stop = pair[0]
            .as_f64()
            .ok_or_else(|| ExpressionError::NotNumber(pair[0].clone()))?;
        let output = pair[1]
            .as_f64()
            .ok_or_else(|| ExpressionError::NotNumber(pair[1].clone()))?;
        if let Some((previous, _)) = stops.last() {
            if stop <= *previous {
                return Err(ExpressionError::InvalidArgument(
                    "interpolation stops must be strictly ascending".into(),
                ));
            }
        }
        stops.push((stop, output));
    }

    Ok(Expression::interpolate_linear(input, stops))
}

/// Piecewise-linear interpolation, clamped outside the stop range.
fn interpolate(x: f64, stops: &[(f64, f64)]) -> f64 {
    let Some(&(first_stop, first_out)) = stops.first() else {
        return 0.0;
    };
    if x <= first_stop {
        return first_out;
    }

    for window in stops.windows(2) {
        let (lo, lo_out) = window[0];
        let (hi, hi_out) = window[1];
        if x <= hi {
            let t = (x - lo) / (hi - lo);
            return lo_out + t * (hi_out - lo_out);
        }
    }

    stops.last().map_or(first_out, |&(_, out)| out)
}

/// Value equality without type coercion; numbers compare numerically.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Expression::from_json(&value).map_err(de::Error::custom)
    }
}
