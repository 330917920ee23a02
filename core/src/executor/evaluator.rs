use std::cmp::Ordering;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use super::properties::{FileProperties, Property, PropertyValue};
use super::{ExecutionError, ExecutionResult};
use crate::ql::ast::{BinaryOp, Expression};

/// Interprets WHERE trees against directory entries.
pub struct Evaluator;

impl Evaluator {
    /// Resolves the entry's properties once and evaluates `expr` against them.
    pub async fn evaluate(expr: &Expression, path: &Path) -> ExecutionResult<bool> {
        if let Expression::Literal(value) = expr {
            return Ok(contains(path, value));
        }

        let properties = FileProperties::resolve(path, Self::needs_content(expr))
            .await
            .map_err(|e| ExecutionError::io(path, e))?;

        Self::matches(expr, &properties, path)
    }

    pub fn matches(
        expr: &Expression,
        properties: &FileProperties,
        path: &Path,
    ) -> ExecutionResult<bool> {
        match expr {
            Expression::Literal(value) => Ok(contains(path, value)),
            Expression::BinaryOp { op, left, right } if op.is_logical() => {
                // Both sides run so a bad leaf is reported wherever it sits.
                let left = Self::matches(left, properties, path)?;
                let right = Self::matches(right, properties, path)?;

                Ok(match op {
                    BinaryOp::And => left && right,
                    _ => left || right,
                })
            }
            Expression::BinaryOp { op, left, right } => {
                let matched = Self::compare(*op, left, right, properties)?;
                debug!(path = %path.display(), condition = %expr, matched, "Evaluated comparison");
                Ok(matched)
            }
        }
    }

    /// Type-checks every comparison without touching the file system.
    pub fn check(expr: &Expression) -> ExecutionResult<()> {
        let mut result = Ok(());

        expr.for_each_comparison(&mut |op, left, right| {
            if result.is_ok() {
                result = check_comparison(op, left, right);
            }
        });

        result
    }

    pub fn needs_content(expr: &Expression) -> bool {
        let mut needed = false;

        expr.for_each_comparison(&mut |_, left, _| {
            if matches!(left, Expression::Literal(name) if name == Property::Content.as_str()) {
                needed = true;
            }
        });

        needed
    }

    fn compare(
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        properties: &FileProperties,
    ) -> ExecutionResult<bool> {
        let (property, literal) = operands(left, right)?;
        let actual = properties.get(property);

        match op {
            BinaryOp::Like | BinaryOp::Eq => Ok(pattern(literal)?.is_match(&actual.as_text())),
            BinaryOp::NotEq => Ok(!pattern(literal)?.is_match(&actual.as_text())),
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => {
                let expected = PropertyValue::coerce(property, literal)?;
                let ordering = actual.compare(&expected).ok_or_else(|| {
                    ExecutionError::InvalidValue {
                        property: property.to_string(),
                        value: literal.to_string(),
                    }
                })?;

                Ok(match op {
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    BinaryOp::LtEq => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                })
            }
            BinaryOp::And | BinaryOp::Or => Err(ExecutionError::UnsupportedOperator(op.to_string())),
        }
    }
}

fn check_comparison(op: BinaryOp, left: &Expression, right: &Expression) -> ExecutionResult<()> {
    let (property, literal) = operands(left, right)?;

    match op {
        BinaryOp::Like | BinaryOp::Eq | BinaryOp::NotEq => pattern(literal).map(|_| ()),
        _ if op.is_ordering() => PropertyValue::coerce(property, literal).map(|_| ()),
        _ => Err(ExecutionError::UnsupportedOperator(op.to_string())),
    }
}

fn operands<'e>(left: &'e Expression, right: &'e Expression) -> ExecutionResult<(Property, &'e str)> {
    match (left, right) {
        (Expression::Literal(name), Expression::Literal(literal)) => {
            Ok((name.parse::<Property>()?, literal.as_str()))
        }
        _ => Err(ExecutionError::InvalidExpression(format!("{} / {}", left, right))),
    }
}

fn pattern(literal: &str) -> ExecutionResult<Regex> {
    Regex::new(literal).map_err(|e| ExecutionError::InvalidPattern {
        pattern: literal.to_string(),
        reason: e.to_string(),
    })
}

fn contains(path: &Path, value: &str) -> bool {
    path.to_string_lossy().contains(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn cmp(property: &str, op: BinaryOp, value: &str) -> Expression {
        Expression::binary(
            op,
            Expression::Literal(property.to_string()),
            Expression::Literal(value.to_string()),
        )
    }

    fn sample() -> FileProperties {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        FileProperties {
            name: "test".to_string(),
            extension: "txt".to_string(),
            size: 1000,
            content: Some("needle in a haystack".to_string()),
            created: time,
            modified: time,
            accessed: time,
        }
    }

    fn eval(expr: &Expression) -> bool {
        Evaluator::matches(expr, &sample(), &PathBuf::from("/data/test.txt")).unwrap()
    }

    #[test]
    fn test_like_is_regex_search() {
        assert!(eval(&cmp("name", BinaryOp::Like, "es")));
        assert!(eval(&cmp("name", BinaryOp::Like, "^t.*t$")));
        assert!(!eval(&cmp("name", BinaryOp::Like, "hello")));
    }

    #[test]
    fn test_equals_uses_pattern_match() {
        assert!(eval(&cmp("size", BinaryOp::Eq, "1000")));
        assert!(eval(&cmp("extension", BinaryOp::Eq, "t")));
        assert!(!eval(&cmp("size", BinaryOp::Eq, "999")));
        assert!(eval(&cmp("size", BinaryOp::NotEq, "999")));
        assert!(!eval(&cmp("name", BinaryOp::NotEq, "test")));
    }

    #[test]
    fn test_ordering_on_numbers() {
        assert!(eval(&cmp("size", BinaryOp::Gt, "999")));
        assert!(!eval(&cmp("size", BinaryOp::Gt, "1000")));
        assert!(eval(&cmp("size", BinaryOp::GtEq, "1000")));
        assert!(eval(&cmp("size", BinaryOp::LtEq, "1000")));
        assert!(eval(&cmp("size", BinaryOp::Lt, "1000.5")));
        // Numeric, not lexicographic.
        assert!(eval(&cmp("size", BinaryOp::Gt, "200")));
    }

    #[test]
    fn test_ordering_on_dates() {
        assert!(eval(&cmp("modified", BinaryOp::Gt, "2024-01-01T00:00:00Z")));
        assert!(eval(&cmp("created", BinaryOp::Lt, "2025-01-01T00:00:00Z")));
        assert!(!eval(&cmp("accessed", BinaryOp::Lt, "2021-01-01T00:00:00Z")));
    }

    #[test]
    fn test_logical_combinations() {
        let yes = cmp("name", BinaryOp::Like, "test");
        let no = cmp("extension", BinaryOp::Eq, "json");

        let and = |l: &Expression, r: &Expression| Expression::binary(BinaryOp::And, l.clone(), r.clone());
        let or = |l: &Expression, r: &Expression| Expression::binary(BinaryOp::Or, l.clone(), r.clone());

        assert!(eval(&and(&yes, &yes)));
        assert!(!eval(&and(&yes, &no)));
        assert!(!eval(&and(&no, &yes)));
        assert!(eval(&or(&no, &yes)));
        assert!(!eval(&or(&no, &no)));
    }

    #[test]
    fn test_bad_leaf_fails_even_when_result_is_decided() {
        let decided = Expression::binary(
            BinaryOp::Or,
            cmp("name", BinaryOp::Like, "test"),
            cmp("owner", BinaryOp::Eq, "root"),
        );
        let err = Evaluator::matches(&decided, &sample(), Path::new("/data/test.txt")).unwrap_err();
        assert!(matches!(err, ExecutionError::UnsupportedProperty(name) if name == "owner"));
    }

    #[test]
    fn test_bare_literal_is_path_substring() {
        assert!(eval(&Expression::Literal("data/te".to_string())));
        assert!(!eval(&Expression::Literal("other".to_string())));
    }

    #[test]
    fn test_check_reports_static_mistakes() {
        assert!(Evaluator::check(&cmp("size", BinaryOp::Gt, "10")).is_ok());
        assert!(matches!(
            Evaluator::check(&cmp("size", BinaryOp::Gt, "ten")),
            Err(ExecutionError::InvalidValue { .. })
        ));
        assert!(matches!(
            Evaluator::check(&cmp("name", BinaryOp::Like, "(")),
            Err(ExecutionError::InvalidPattern { .. })
        ));
        assert!(matches!(
            Evaluator::check(&cmp("colour", BinaryOp::Eq, "red")),
            Err(ExecutionError::UnsupportedProperty(_))
        ));
    }

    #[test]
    fn test_needs_content() {
        assert!(!Evaluator::needs_content(&cmp("name", BinaryOp::Like, "x")));
        let expr = Expression::binary(
            BinaryOp::And,
            cmp("name", BinaryOp::Like, "x"),
            cmp("content", BinaryOp::Like, "needle"),
        );
        assert!(Evaluator::needs_content(&expr));
        assert!(eval(&cmp("content", BinaryOp::Like, "needle")));
    }
}
