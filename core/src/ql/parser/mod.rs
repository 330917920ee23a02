mod error;
mod lexer;
mod parser;

pub use error::{ParseError, ParseResult};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;

use std::path::Path;

use crate::ql::{Error, Result, ast::Query};

/// Parses a whole query text rooted at `directory`.
///
/// Any lexical or syntax error rejects the entire text; no partial
/// statement list is ever returned.
pub fn parse(input: &str, directory: impl AsRef<Path>) -> Result<Query> {
	let mut parser = Parser::new(directory.as_ref());
	parser.parse(input).map_err(|e| match e {
		ParseError::UnexpectedInput { position, .. } => Error::LexicalError {
			pos: position,
			msg: e.to_string(),
		},
		other => Error::SyntaxError(other.to_string()),
	})
}
