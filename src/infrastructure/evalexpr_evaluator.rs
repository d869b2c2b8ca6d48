// evalexpr-backed implementation of the evaluator port
use crate::application::evaluator::{EvaluationError, ExpressionEvaluator};
use evalexpr::{
    build_operator_tree, ContextWithMutableFunctions, ContextWithMutableVariables,
    EvalexprResult, Function, HashMapContext, Node, Value,
};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;
use std::f64::consts::{E, PI};

lazy_static! {
    /// Identifiers and numeric literals, so digits inside names are left alone.
    static ref LEXEME_REGEX: Regex =
        Regex::new(r"[A-Za-z_][A-Za-z0-9_]*|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap();
}

/// Value bound to every known variable when checking an expression.
const DRY_RUN_VALUE: f64 = 1.0;

/// Evaluates in floating point only, with a small math library registered.
#[derive(Debug, Clone)]
pub struct EvalexprEvaluator {
    base: HashMapContext,
}

impl Default for EvalexprEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalexprEvaluator {
    pub fn new() -> Self {
        let mut base = HashMapContext::new();

        let _ = base.set_value("pi".to_string(), Value::Float(PI));
        let _ = base.set_value("e".to_string(), Value::Float(E));

        let _ = base.set_function("sqrt".to_string(), unary(f64::sqrt));
        let _ = base.set_function("abs".to_string(), unary(f64::abs));
        let _ = base.set_function("exp".to_string(), unary(f64::exp));
        let _ = base.set_function("round".to_string(), unary(f64::round));
        let _ = base.set_function("floor".to_string(), unary(f64::floor));
        let _ = base.set_function("ceil".to_string(), unary(f64::ceil));
        let _ = base.set_function(
            "pow".to_string(),
            Function::new(|argument| {
                let (value, exponent) = pair(argument)?;
                Ok(Value::Float(value.powf(exponent)))
            }),
        );
        // Natural log, or log to the base given as second argument.
        let _ = base.set_function(
            "log".to_string(),
            Function::new(|argument| match argument {
                Value::Tuple(_) => {
                    let (value, log_base) = pair(argument)?;
                    Ok(Value::Float(value.ln() / log_base.ln()))
                }
                _ => Ok(Value::Float(argument.as_number()?.ln())),
            }),
        );

        Self { base }
    }

    fn build(&self, expression: &str) -> Result<Node, EvaluationError> {
        build_operator_tree(&float_literals(expression))
            .map_err(|e| EvaluationError::Parse(e.to_string()))
    }

    fn run(&self, tree: &Node, context: &HashMapContext) -> Result<f64, EvaluationError> {
        match tree.eval_with_context(context) {
            Ok(Value::Float(f)) => Ok(f),
            Ok(Value::Int(i)) => Ok(i as f64),
            Ok(other) => Err(EvaluationError::NotANumber(other.to_string())),
            Err(e) => Err(EvaluationError::Evaluation(e.to_string())),
        }
    }
}

fn unary(f: fn(f64) -> f64) -> Function {
    Function::new(move |argument| Ok(Value::Float(f(argument.as_number()?))))
}

fn pair(argument: &Value) -> EvalexprResult<(f64, f64)> {
    let values = argument.as_fixed_len_tuple(2)?;
    Ok((values[0].as_number()?, values[1].as_number()?))
}

/// Rewrite integer literals as floats (`1/4` must be 0.25) and `mod` as `%`.
fn float_literals(expression: &str) -> Cow<'_, str> {
    LEXEME_REGEX.replace_all(expression, |caps: &Captures| {
        let lexeme = &caps[0];
        if lexeme == "mod" {
            "%".to_string()
        } else if lexeme.starts_with(|c: char| c.is_ascii_digit())
            && !lexeme.contains(['.', 'e', 'E'])
        {
            format!("{}.0", lexeme)
        } else {
            lexeme.to_string()
        }
    })
}

impl ExpressionEvaluator for EvalexprEvaluator {
    fn check(&self, expression: &str, variables: &[String]) -> Result<(), EvaluationError> {
        let tree = self.build(expression)?;

        let mut context = self.base.clone();
        for name in variables {
            context
                .set_value(name.clone(), Value::Float(DRY_RUN_VALUE))
                .map_err(|e| EvaluationError::Evaluation(e.to_string()))?;
        }

        match tree.eval_with_context(&context) {
            Ok(Value::Float(_)) | Ok(Value::Int(_)) | Ok(Value::Empty) => Ok(()),
            Ok(other) => Err(EvaluationError::NotANumber(other.to_string())),
            Err(e) => Err(EvaluationError::Evaluation(e.to_string())),
        }
    }

    fn evaluate(
        &self,
        expression: &str,
        bindings: &HashMap<String, f64>,
    ) -> Result<f64, EvaluationError> {
        let tree = self.build(expression)?;

        let mut context = self.base.clone();
        for (name, value) in bindings {
            context
                .set_value(name.clone(), Value::Float(*value))
                .map_err(|e| EvaluationError::Evaluation(e.to_string()))?;
        }

        self.run(&tree, &context)
    }
}
