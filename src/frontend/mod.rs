//! Fixture Front-End
//!
//! Stand-in for the compiler front-end: just enough scanning to produce the
//! declarations and attribute instances that validation consumes.

pub mod lexer;
pub mod scanner;
pub mod types;

pub use lexer::{Lexer, Token, TokenKind};
pub use scanner::{ScannedSource, Scanner};
pub use types::TypeTable;

/// Scan fixture text with no externally known conformances
pub fn scan(text: &str) -> ScannedSource {
    Scanner::new().scan(text)
}
