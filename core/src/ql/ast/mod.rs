use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::ql::parser::TokenKind;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
	/// Root that every `FROM` and `TO` path resolves against.
	pub directory: PathBuf,
	pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
	Select(Selection),
	Delete(Selection),
	Move(TransferStmt),
	Copy(TransferStmt),
	Archive(TransferStmt),
	Unarchive(TransferStmt),
	Convert(TransferStmt),
}

/// Clauses shared by every statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
	/// Raw target literal, checked against `files`/`folders` at validation.
	pub target: String,
	pub from: String,
	pub where_clause: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferStmt {
	pub selection: Selection,
	pub to: String,
}

impl Statement {
	pub fn selection(&self) -> &Selection {
		match self {
			Statement::Select(s) | Statement::Delete(s) => s,
			Statement::Move(t)
			| Statement::Copy(t)
			| Statement::Archive(t)
			| Statement::Unarchive(t)
			| Statement::Convert(t) => &t.selection,
		}
	}

	pub fn destination(&self) -> Option<&str> {
		match self {
			Statement::Select(_) | Statement::Delete(_) => None,
			Statement::Move(t)
			| Statement::Copy(t)
			| Statement::Archive(t)
			| Statement::Unarchive(t)
			| Statement::Convert(t) => Some(&t.to),
		}
	}

	pub fn keyword(&self) -> &'static str {
		match self {
			Statement::Select(_) => "SELECT",
			Statement::Delete(_) => "DELETE",
			Statement::Move(_) => "MOVE",
			Statement::Copy(_) => "COPY",
			Statement::Archive(_) => "ARCHIVE",
			Statement::Unarchive(_) => "UNARCHIVE",
			Statement::Convert(_) => "CONVERT",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
	Literal(String),
	BinaryOp {
		op: BinaryOp,
		left: Box<Expression>,
		right: Box<Expression>,
	},
}

impl Expression {
	pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
		Expression::BinaryOp {
			op,
			left: Box::new(left),
			right: Box::new(right),
		}
	}

	/// Calls `f` on every leaf comparison, left to right.
	pub fn for_each_comparison<'a, F>(&'a self, f: &mut F)
	where
		F: FnMut(BinaryOp, &'a Expression, &'a Expression),
	{
		if let Expression::BinaryOp { op, left, right } = self {
			if op.is_logical() {
				left.for_each_comparison(f);
				right.for_each_comparison(f);
			} else {
				f(*op, left.as_ref(), right.as_ref());
			}
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
	Like,
	Eq,
	NotEq,
	Lt,
	Gt,
	LtEq,
	GtEq,
	And,
	Or,
}

impl BinaryOp {
	pub fn from_token(kind: TokenKind) -> Option<Self> {
		match kind {
			TokenKind::Like => Some(BinaryOp::Like),
			TokenKind::Equals => Some(BinaryOp::Eq),
			TokenKind::NotEquals => Some(BinaryOp::NotEq),
			TokenKind::LessThan => Some(BinaryOp::Lt),
			TokenKind::GreaterThan => Some(BinaryOp::Gt),
			TokenKind::LessThanOrEqual => Some(BinaryOp::LtEq),
			TokenKind::GreaterThanOrEqual => Some(BinaryOp::GtEq),
			TokenKind::And => Some(BinaryOp::And),
			TokenKind::Or => Some(BinaryOp::Or),
			_ => None,
		}
	}

	pub fn is_logical(&self) -> bool {
		matches!(self, BinaryOp::And | BinaryOp::Or)
	}

	pub fn is_ordering(&self) -> bool {
		matches!(
			self,
			BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq
		)
	}
}

impl fmt::Display for BinaryOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let text = match self {
			BinaryOp::Like => "LIKE",
			BinaryOp::Eq => "=",
			BinaryOp::NotEq => "!=",
			BinaryOp::Lt => "<",
			BinaryOp::Gt => ">",
			BinaryOp::LtEq => "<=",
			BinaryOp::GtEq => ">=",
			BinaryOp::And => "AND",
			BinaryOp::Or => "OR",
		};
		f.write_str(text)
	}
}

fn quoted(value: &str) -> String {
	if value.contains('\'') {
		format!("\"{}\"", value)
	} else {
		format!("'{}'", value)
	}
}

// Operators are printed without parentheses: the grammar folds AND/OR
// strictly left to right, so the flat form re-parses to the same tree.
impl fmt::Display for Expression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Expression::Literal(value) => f.write_str(&quoted(value)),
			Expression::BinaryOp { op, left, right } => write!(f, "{} {} {}", left, op, right),
		}
	}
}

impl fmt::Display for Statement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let selection = self.selection();
		write!(
			f,
			"{} {} FROM {}",
			self.keyword(),
			quoted(&selection.target),
			quoted(&selection.from)
		)?;

		if let Some(condition) = &selection.where_clause {
			write!(f, " WHERE {}", condition)?;
		}

		if let Some(to) = self.destination() {
			write!(f, " TO {}", quoted(to))?;
		}

		Ok(())
	}
}
