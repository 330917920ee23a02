use std::path::{Path, PathBuf};

use super::error::{ParseError, ParseResult};
use super::lexer::{Lexer, Token, TokenKind};
use crate::ql::ast::*;

const STATEMENT_START: &[TokenKind] = &[
	TokenKind::Select,
	TokenKind::Delete,
	TokenKind::Move,
	TokenKind::Copy,
	TokenKind::Archive,
	TokenKind::Unarchive,
	TokenKind::Convert,
	TokenKind::Semicolon,
];

const COMPARISON_OPS: &[TokenKind] = &[
	TokenKind::Like,
	TokenKind::Equals,
	TokenKind::NotEquals,
	TokenKind::GreaterThan,
	TokenKind::LessThan,
	TokenKind::GreaterThanOrEqual,
	TokenKind::LessThanOrEqual,
];

const LOGICAL_OPS: &[TokenKind] = &[TokenKind::And, TokenKind::Or];

/// Recursive-descent parser with a single token of lookahead.
pub struct Parser<'a> {
	directory: PathBuf,
	lexer: Lexer<'a>,
	lookahead: Option<Token>,
}

impl<'a> Parser<'a> {
	pub fn new(directory: impl AsRef<Path>) -> Self {
		Self {
			directory: directory.as_ref().to_path_buf(),
			lexer: Lexer::new(""),
			lookahead: None,
		}
	}

	pub fn parse(&mut self, input: &'a str) -> ParseResult<Query> {
		self.lexer.init(input);
		self.lookahead = self.lexer.next()?;

		self.parse_query()
	}

	fn parse_query(&mut self) -> ParseResult<Query> {
		let mut statements = Vec::new();

		while let Some(kind) = self.lookahead.as_ref().map(|token| token.kind) {
			let statement = match kind {
				TokenKind::Select => Statement::Select(self.parse_selection(TokenKind::Select)?),
				TokenKind::Delete => Statement::Delete(self.parse_selection(TokenKind::Delete)?),
				TokenKind::Move => Statement::Move(self.parse_transfer(TokenKind::Move)?),
				TokenKind::Copy => Statement::Copy(self.parse_transfer(TokenKind::Copy)?),
				TokenKind::Archive => Statement::Archive(self.parse_transfer(TokenKind::Archive)?),
				TokenKind::Unarchive => {
					Statement::Unarchive(self.parse_transfer(TokenKind::Unarchive)?)
				}
				TokenKind::Convert => Statement::Convert(self.parse_transfer(TokenKind::Convert)?),
				TokenKind::Semicolon => {
					self.consume(&[TokenKind::Semicolon])?;
					continue;
				}
				_ => return Err(self.unexpected(STATEMENT_START)),
			};

			statements.push(statement);
		}

		Ok(Query {
			directory: self.directory.clone(),
			statements,
		})
	}

	fn parse_selection(&mut self, keyword: TokenKind) -> ParseResult<Selection> {
		self.consume(&[keyword])?;

		let target = self.parse_string_literal()?;
		let from = self.parse_from_clause()?;
		let where_clause = self.parse_where_clause()?;

		Ok(Selection {
			target,
			from,
			where_clause,
		})
	}

	fn parse_transfer(&mut self, keyword: TokenKind) -> ParseResult<TransferStmt> {
		let selection = self.parse_selection(keyword)?;
		let to = self.parse_to_clause()?;

		Ok(TransferStmt { selection, to })
	}

	fn parse_from_clause(&mut self) -> ParseResult<String> {
		self.consume(&[TokenKind::From])?;
		self.parse_string_literal()
	}

	fn parse_to_clause(&mut self) -> ParseResult<String> {
		self.consume(&[TokenKind::To])?;
		self.parse_string_literal()
	}

	fn parse_where_clause(&mut self) -> ParseResult<Option<Expression>> {
		if !self.lookahead_is(&[TokenKind::Where]) {
			return Ok(None);
		}

		self.consume(&[TokenKind::Where])?;
		Ok(Some(self.parse_expression()?))
	}

	// AND and OR share one precedence level and fold left to right:
	// `a AND b OR c` is `(a AND b) OR c`, `a OR b AND c` is `(a OR b) AND c`.
	fn parse_expression(&mut self) -> ParseResult<Expression> {
		let mut left = self.parse_comparison()?;

		while self.lookahead_is(LOGICAL_OPS) {
			let token = self.consume(LOGICAL_OPS)?;
			let op = self.operator(&token)?;
			let right = self.parse_comparison()?;

			left = Expression::binary(op, left, right);
		}

		Ok(left)
	}

	fn parse_comparison(&mut self) -> ParseResult<Expression> {
		let left = Expression::Literal(self.parse_string_literal()?);

		let token = self.consume(COMPARISON_OPS)?;
		let op = self.operator(&token)?;

		let right = Expression::Literal(self.parse_string_literal()?);

		Ok(Expression::binary(op, left, right))
	}

	fn parse_string_literal(&mut self) -> ParseResult<String> {
		let token = self.consume(&[TokenKind::String])?;
		let raw = token.value.as_str();

		// Both quote characters are single bytes.
		Ok(raw[1..raw.len() - 1].to_string())
	}

	fn operator(&self, token: &Token) -> ParseResult<BinaryOp> {
		BinaryOp::from_token(token.kind).ok_or_else(|| ParseError::UnexpectedToken {
			expected: "operator".to_string(),
			found: token.value.clone(),
		})
	}

	fn lookahead_is(&self, kinds: &[TokenKind]) -> bool {
		self.lookahead
			.as_ref()
			.map(|token| kinds.contains(&token.kind))
			.unwrap_or(false)
	}

	fn consume(&mut self, expected: &[TokenKind]) -> ParseResult<Token> {
		if !self.lookahead_is(expected) {
			return Err(self.unexpected(expected));
		}

		let next = self.lexer.next()?;
		match std::mem::replace(&mut self.lookahead, next) {
			Some(token) => Ok(token),
			None => Err(self.unexpected(expected)),
		}
	}

	fn unexpected(&self, expected: &[TokenKind]) -> ParseError {
		let expected = expected
			.iter()
			.map(|kind| kind.to_string())
			.collect::<Vec<_>>()
			.join(" or ");

		match &self.lookahead {
			Some(token) => ParseError::UnexpectedToken {
				expected,
				found: token.value.clone(),
			},
			None => ParseError::UnexpectedEof { expected },
		}
	}
}
