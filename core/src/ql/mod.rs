pub mod ast;
pub mod error;
pub mod parser;

pub use ast::Query;
pub use error::{Error, Result};
pub use parser::parse;

#[cfg(test)]
mod tests;
