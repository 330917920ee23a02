use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::ql::parser::{ParseError, ParseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
	// Statement keywords
	Select,
	Delete,
	Move,
	Copy,
	Archive,
	Unarchive,
	Convert,

	// Clause keywords
	From,
	Where,
	To,

	// Logical operators
	And,
	Or,

	// Comparison operators
	Like,
	Equals,             // =
	NotEquals,          // != or <>
	GreaterThan,        // >
	LessThan,           // <
	GreaterThanOrEqual, // >=
	LessThanOrEqual,    // <=

	// Literals
	String,

	// Symbols
	Semicolon,
}

impl fmt::Display for TokenKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let text = match self {
			TokenKind::Select => "SELECT",
			TokenKind::Delete => "DELETE",
			TokenKind::Move => "MOVE",
			TokenKind::Copy => "COPY",
			TokenKind::Archive => "ARCHIVE",
			TokenKind::Unarchive => "UNARCHIVE",
			TokenKind::Convert => "CONVERT",
			TokenKind::From => "FROM",
			TokenKind::Where => "WHERE",
			TokenKind::To => "TO",
			TokenKind::And => "AND",
			TokenKind::Or => "OR",
			TokenKind::Like => "LIKE",
			TokenKind::Equals => "'='",
			TokenKind::NotEquals => "'!='",
			TokenKind::GreaterThan => "'>'",
			TokenKind::LessThan => "'<'",
			TokenKind::GreaterThanOrEqual => "'>='",
			TokenKind::LessThanOrEqual => "'<='",
			TokenKind::String => "string",
			TokenKind::Semicolon => "';'",
		};
		f.write_str(text)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
	pub kind: TokenKind,
	/// Raw lexeme. String literals keep their quotes.
	pub value: String,
}

struct Rule {
	pattern: Regex,
	kind: Option<TokenKind>,
}

fn rule(pattern: &str, kind: Option<TokenKind>) -> Rule {
	Rule {
		pattern: Regex::new(pattern).expect("token rule must be a valid regex"),
		kind,
	}
}

lazy_static! {
	// Multi-character operators must precede their single-character prefixes.
	static ref RULES: Vec<Rule> = vec![
		rule(r"^\s+", None),
		rule(r"^--.*", None),
		rule(r"^;", Some(TokenKind::Semicolon)),
		rule(r"^\bSELECT\b", Some(TokenKind::Select)),
		rule(r"^\bDELETE\b", Some(TokenKind::Delete)),
		rule(r"^\bMOVE\b", Some(TokenKind::Move)),
		rule(r"^\bCOPY\b", Some(TokenKind::Copy)),
		rule(r"^\bARCHIVE\b", Some(TokenKind::Archive)),
		rule(r"^\bUNARCHIVE\b", Some(TokenKind::Unarchive)),
		rule(r"^\bCONVERT\b", Some(TokenKind::Convert)),
		rule(r"^\bFROM\b", Some(TokenKind::From)),
		rule(r"^\bWHERE\b", Some(TokenKind::Where)),
		rule(r"^\bTO\b", Some(TokenKind::To)),
		rule(r"^\bLIKE\b", Some(TokenKind::Like)),
		rule(r"^=", Some(TokenKind::Equals)),
		rule(r"^!=", Some(TokenKind::NotEquals)),
		rule(r"^<>", Some(TokenKind::NotEquals)),
		rule(r"^<=", Some(TokenKind::LessThanOrEqual)),
		rule(r"^<", Some(TokenKind::LessThan)),
		rule(r"^>=", Some(TokenKind::GreaterThanOrEqual)),
		rule(r"^>", Some(TokenKind::GreaterThan)),
		rule(r"^\bAND\b", Some(TokenKind::And)),
		rule(r"^\bOR\b", Some(TokenKind::Or)),
		rule(r#"^(?:'[^']*'|"[^"]*")"#, Some(TokenKind::String)),
	];
}

pub struct Lexer<'a> {
	input: &'a str,
	cursor: usize,
}

impl<'a> Lexer<'a> {
	pub fn new(input: &'a str) -> Self {
		Self { input, cursor: 0 }
	}

	/// Points the lexer at a new input and rewinds the cursor.
	pub fn init(&mut self, input: &'a str) {
		self.input = input;
		self.cursor = 0;
	}

	/// Byte offset of the next unread character.
	pub fn position(&self) -> usize {
		self.cursor
	}

	/// Returns the next token, or `None` once the input is exhausted.
	pub fn next(&mut self) -> ParseResult<Option<Token>> {
		loop {
			if self.cursor >= self.input.len() {
				return Ok(None);
			}

			let remaining = &self.input[self.cursor..];
			let matched = RULES
				.iter()
				.find_map(|rule| rule.pattern.find(remaining).map(|m| (rule.kind, m.as_str())));

			match matched {
				Some((kind, lexeme)) => {
					self.cursor += lexeme.len();

					if let Some(kind) = kind {
						return Ok(Some(Token {
							kind,
							value: lexeme.to_string(),
						}));
					}
				}
				None => {
					return Err(ParseError::UnexpectedInput {
						position: self.cursor,
						remaining: remaining.to_string(),
					});
				}
			}
		}
	}

	/// Lexes the whole input into a token vector.
	pub fn tokenize(input: &str) -> ParseResult<Vec<Token>> {
		let mut lexer = Lexer::new(input);
		let mut tokens = Vec::new();

		while let Some(token) = lexer.next()? {
			tokens.push(token);
		}

		Ok(tokens)
	}
}
