pub mod builder;
pub mod error;
pub mod scanner;
pub mod token_kind;

pub use builder::tokenize;
pub use error::{LexerError, LexerErrorKind};
pub use token_kind::TokenKind;
