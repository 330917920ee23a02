use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
	#[error("Lexical error at position {pos}: {msg}")]
	LexicalError { pos: usize, msg: String },

	#[error("Syntax error: {0}")]
	SyntaxError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
