use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
	#[error("Unexpected input at position {position}: \"{remaining}\"")]
	UnexpectedInput { position: usize, remaining: String },

	#[error("Unexpected token '{found}', expected {expected}")]
	UnexpectedToken { expected: String, found: String },

	#[error("Unexpected end of input, expected {expected}")]
	UnexpectedEof { expected: String },
}

pub type ParseResult<T> = Result<T, ParseError>;
