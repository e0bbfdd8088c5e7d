//! Numeric tower shared by the arithmetic and comparison built-ins.
//!
//! Integer arithmetic is checked: overflow is a fault, never a wrap. Mixing an
//! integer with a float promotes the integer.

use std::cmp::Ordering;

use crate::evaluator::RuntimeFault;
use crate::values::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Lt,
    Gt,
    Le,
    Ge,
}

/// Evaluate a binary operation on two integers.
pub(crate) fn eval_binary_int(
    op: ArithOp,
    function: &str,
    left: i64,
    right: i64,
) -> Result<i64, RuntimeFault> {
    let result = match op {
        ArithOp::Add => left.checked_add(right),
        ArithOp::Sub => left.checked_sub(right),
        ArithOp::Mul => left.checked_mul(right),
        ArithOp::Div => {
            if right == 0 {
                return Err(RuntimeFault::DivisionByZero);
            }
            // i64::MIN / -1
            left.checked_div(right)
        }
    };
    result.ok_or_else(|| RuntimeFault::overflow(function))
}

/// Evaluate a binary operation on two floats.
///
/// Follows IEEE 754 semantics (produces inf/nan rather than faulting).
pub(crate) fn eval_binary_float(op: ArithOp, left: f64, right: f64) -> f64 {
    match op {
        ArithOp::Add => left + right,
        ArithOp::Sub => left - right,
        ArithOp::Mul => left * right,
        ArithOp::Div => left / right,
    }
}

/// Apply `op` to two numbers, promoting to float when either side is one.
pub(crate) fn eval_binary(
    op: ArithOp,
    function: &str,
    left: &Value,
    right: &Value,
) -> Result<Value, RuntimeFault> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => eval_binary_int(op, function, *l, *r).map(Value::Int),
        _ => {
            let l = expect_number(function, left)?;
            let r = expect_number(function, right)?;
            Ok(Value::Float(eval_binary_float(op, l, r)))
        }
    }
}

/// Left fold of `op` over `args`, starting from the first argument.
pub(crate) fn fold(op: ArithOp, function: &str, args: &[Value]) -> Result<Value, RuntimeFault> {
    let Some((first, rest)) = args.split_first() else {
        return Err(RuntimeFault::ArityMismatch {
            function: function.into(),
            expected: crate::values::Arity::AtLeast(1),
            found: 0,
        });
    };
    expect_number(function, first)?;
    rest.iter()
        .try_fold(first.clone(), |acc, arg| eval_binary(op, function, &acc, arg))
}

/// Ordering comparison on two numbers, or on two strings.
pub(crate) fn eval_comparison(
    op: CompareOp,
    function: &str,
    left: &Value,
    right: &Value,
) -> Result<bool, RuntimeFault> {
    let ordering = match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
        _ => {
            let l = expect_number(function, left)?;
            let r = expect_number(function, right)?;
            l.partial_cmp(&r)
        }
    };
    // NaN compares false to everything.
    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match op {
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    })
}

/// Equality used by `=`: numbers compare by value across int and float,
/// everything else structurally.
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(l), Value::Float(r)) | (Value::Float(r), Value::Int(l)) => (*l as f64) == *r,
        (Value::List(l), Value::List(r)) => {
            l.len() == r.len() && l.iter().zip(r.iter()).all(|(a, b)| values_equal(a, b))
        }
        _ => left == right,
    }
}

pub(crate) fn expect_number(function: &str, value: &Value) -> Result<f64, RuntimeFault> {
    value
        .as_float()
        .ok_or_else(|| RuntimeFault::type_mismatch(function, "a number", value.type_name()))
}

pub(crate) fn expect_int(function: &str, value: &Value) -> Result<i64, RuntimeFault> {
    value
        .as_int()
        .ok_or_else(|| RuntimeFault::type_mismatch(function, "an integer", value.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_int_arith() {
        assert_eq!(eval_binary_int(ArithOp::Add, "+", 2, 3).unwrap(), 5);
        assert_eq!(eval_binary_int(ArithOp::Sub, "-", 3, 10).unwrap(), -7);
        assert_eq!(eval_binary_int(ArithOp::Mul, "*", -2, 5).unwrap(), -10);
        assert_eq!(eval_binary_int(ArithOp::Div, "/", 7, 3).unwrap(), 2);
    }

    #[test]
    fn test_int_div_by_zero() {
        assert_eq!(
            eval_binary_int(ArithOp::Div, "/", 10, 0),
            Err(RuntimeFault::DivisionByZero)
        );
    }

    #[test]
    fn test_int_overflow_faults() {
        assert_eq!(
            eval_binary_int(ArithOp::Add, "+", i64::MAX, 1),
            Err(RuntimeFault::overflow("+"))
        );
        assert_eq!(
            eval_binary_int(ArithOp::Mul, "*", i64::MAX, 2),
            Err(RuntimeFault::overflow("*"))
        );
        assert_eq!(
            eval_binary_int(ArithOp::Div, "/", i64::MIN, -1),
            Err(RuntimeFault::overflow("/"))
        );
    }

    #[test]
    fn test_float_div_by_zero() {
        let result = eval_binary_float(ArithOp::Div, 10.0, 0.0);
        assert!(result.is_infinite() && result.is_sign_positive());
    }

    #[test]
    fn test_promotion() {
        assert_eq!(
            eval_binary(ArithOp::Add, "+", &Value::Int(1), &Value::Float(0.5)),
            Ok(Value::Float(1.5))
        );
        assert_eq!(
            fold(ArithOp::Mul, "*", &[Value::Int(2), Value::Int(3), Value::Float(0.5)]),
            Ok(Value::Float(3.0))
        );
    }

    #[test]
    fn test_type_mismatch() {
        assert_eq!(
            eval_binary(ArithOp::Add, "+", &Value::Int(1), &Value::from("a")),
            Err(RuntimeFault::type_mismatch("+", "a number", "string"))
        );
        assert_eq!(
            fold(ArithOp::Add, "+", &[Value::Nil]),
            Err(RuntimeFault::type_mismatch("+", "a number", "nil"))
        );
    }

    #[test]
    fn test_comparison() {
        assert!(eval_comparison(CompareOp::Lt, "<", &Value::Int(1), &Value::Float(1.5)).unwrap());
        assert!(eval_comparison(CompareOp::Ge, ">=", &Value::Int(2), &Value::Int(2)).unwrap());
        assert!(eval_comparison(CompareOp::Lt, "<", &Value::from("a"), &Value::from("b")).unwrap());
        let nan = Value::Float(f64::NAN);
        assert!(!eval_comparison(CompareOp::Le, "<=", &nan, &Value::Int(1)).unwrap());
        assert!(eval_comparison(CompareOp::Lt, "<", &Value::from("a"), &Value::Int(1)).is_err());
    }

    #[test]
    fn test_values_equal() {
        assert!(values_equal(&Value::Int(1), &Value::Float(1.0)));
        assert!(values_equal(
            &Value::list([Value::Int(1), Value::from("x")]),
            &Value::list([Value::Float(1.0), Value::from("x")])
        ));
        assert!(!values_equal(&Value::Int(1), &Value::from("1")));
        assert!(values_equal(&Value::Nil, &Value::Nil));
    }
}
