//! Inline diagnostic expectations written in fixture comments.

pub mod parser;

pub use parser::{
    parse, Expectation, ExpectationParser, Expectations, MalformedExpectationError, MarkerPolicy,
};
