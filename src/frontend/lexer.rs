//! Fixture Lexer
//!
//! Fast, simple tokenization of fixture source, one line at a time.
//! Comments are dropped here, so expectation markers never reach the scanner.
//! Their spans are still available to the expectation parser.

use std::ops::Range;

use crate::declaration::Location;

/// Token types the declaration scanner cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `@Name`; the token text excludes the `@`
    Attribute,
    /// Identifier, keyword or number
    Word,
    /// Any single punctuation character
    Punct,
    /// String literal, quotes included
    Literal,
}

/// A token with its text and where it starts
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub location: Location,
}

impl Token {
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text == word
    }

    pub fn is_punct(&self, punct: char) -> bool {
        self.kind == TokenKind::Punct && self.text.len() == 1 && self.text.starts_with(punct)
    }
}

/// Line-by-line tokenizer. Only block comments carry state across lines.
#[derive(Debug, Clone, Default)]
pub struct Lexer {
    in_block_comment: bool,
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize one line; `line_num` is 1-based
    pub fn tokenize_line(&mut self, line: &str, line_num: usize) -> Vec<Token> {
        self.scan_line(line, line_num).0
    }

    /// Byte ranges of comment text on one line, delimiters excluded.
    /// Block comments carry over, so feed lines in order.
    pub fn comment_spans(&mut self, line: &str) -> Vec<Range<usize>> {
        self.scan_line(line, 0).1
    }

    fn scan_line(&mut self, line: &str, line_num: usize) -> (Vec<Token>, Vec<Range<usize>>) {
        let mut tokens = Vec::new();
        let mut comments = Vec::new();
        let mut comment_start = self.in_block_comment.then_some(0);
        let mut chars = line.char_indices().peekable();

        while let Some((start_idx, ch)) = chars.next() {
            if self.in_block_comment {
                if ch == '*' && matches!(chars.peek(), Some(&(_, '/'))) {
                    chars.next();
                    self.in_block_comment = false;
                    if let Some(start) = comment_start.take() {
                        comments.push(start..start_idx);
                    }
                }
                continue;
            }

            let location = Location::new(line_num, start_idx + 1);

            match ch {
                ' ' | '\t' | '\r' | '\n' => continue,

                '/' => match chars.peek() {
                    // Line comment: rest of line is ignored
                    Some(&(_, '/')) => {
                        comments.push(start_idx + 2..line.len());
                        break;
                    }
                    Some(&(_, '*')) => {
                        chars.next();
                        self.in_block_comment = true;
                        comment_start = Some(start_idx + 2);
                    }
                    _ => tokens.push(punct('/', location)),
                },

                '"' => {
                    let mut end_idx = line.len();
                    let mut escaped = false;
                    for (idx, c) in chars.by_ref() {
                        if escaped {
                            escaped = false;
                        } else if c == '\\' {
                            escaped = true;
                        } else if c == '"' {
                            end_idx = idx + 1;
                            break;
                        }
                    }
                    tokens.push(Token {
                        kind: TokenKind::Literal,
                        text: line[start_idx..end_idx].to_string(),
                        location,
                    });
                }

                '@' => {
                    let end_idx = consume_word(line, &mut chars, start_idx + 1);
                    if end_idx > start_idx + 1 {
                        tokens.push(Token {
                            kind: TokenKind::Attribute,
                            text: line[start_idx + 1..end_idx].to_string(),
                            location,
                        });
                    } else {
                        tokens.push(punct('@', location));
                    }
                }

                c if is_word_char(c) => {
                    let end_idx = consume_word(line, &mut chars, start_idx + c.len_utf8());
                    tokens.push(Token {
                        kind: TokenKind::Word,
                        text: line[start_idx..end_idx].to_string(),
                        location,
                    });
                }

                c => tokens.push(punct(c, location)),
            }
        }

        if let Some(start) = comment_start.filter(|_| self.in_block_comment) {
            comments.push(start..line.len());
        }
        (tokens, comments)
    }

    /// Tokenize a whole fixture
    pub fn tokenize(&mut self, text: &str) -> Vec<Token> {
        text.lines()
            .enumerate()
            .flat_map(|(idx, line)| self.tokenize_line(line, idx + 1))
            .collect()
    }
}

fn punct(c: char, location: Location) -> Token {
    Token {
        kind: TokenKind::Punct,
        text: c.to_string(),
        location,
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Advance past identifier characters, returning the end byte index
fn consume_word(
    line: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    mut end_idx: usize,
) -> usize {
    while let Some(&(idx, next_ch)) = chars.peek() {
        if is_word_char(next_ch) {
            end_idx = idx + next_ch.len_utf8();
            chars.next();
        } else {
            break;
        }
    }
    end_idx.min(line.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_attributed_property() {
        let tokens = Lexer::new().tokenize_line("  @NSCopying var p1 : CopyableClass", 4);

        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0].kind, TokenKind::Attribute);
        assert_eq!(tokens[0].text, "NSCopying");
        assert_eq!(tokens[0].location, Location::new(4, 3));
        assert!(tokens[1].is_word("var"));
        assert!(tokens[3].is_punct(':'));
        assert_eq!(tokens[4].text, "CopyableClass");
    }

    #[test]
    fn test_line_comment_dropped() {
        let tokens = Lexer::new()
            .tokenize_line("@NSCopying  // expected-error {{'NSCopying' may only be used}}", 1);
        assert_eq!(texts(&tokens), vec!["NSCopying"]);
    }

    #[test]
    fn test_wrappers_are_punct() {
        let tokens = Lexer::new().tokenize_line("var a : T? ; var b : T!", 1);
        assert_eq!(
            texts(&tokens),
            vec!["var", "a", ":", "T", "?", ";", "var", "b", ":", "T", "!"]
        );
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let tokens = Lexer::new().tokenize("var a /* start\n still comment */ : Int");
        assert_eq!(texts(&tokens), vec!["var", "a", ":", "Int"]);
    }

    #[test]
    fn test_string_literal() {
        let tokens = Lexer::new().tokenize_line(r#"let s = "a \" b" // c"#, 1);
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[3].kind, TokenKind::Literal);
        assert_eq!(tokens[3].text, r#""a \" b""#);
    }

    #[test]
    fn test_comment_spans() {
        let mut lexer = Lexer::new();
        let line = r#"let s = "// not" /* a */ x // b"#;
        let spans: Vec<&str> = lexer.comment_spans(line).into_iter().map(|r| &line[r]).collect();
        assert_eq!(spans, vec![" a ", " b"]);

        assert_eq!(lexer.comment_spans("x /* open"), vec![4..9]);
        assert_eq!(lexer.comment_spans("still */ y"), vec![0..6]);
        assert!(lexer.comment_spans("y").is_empty());
    }

    #[test]
    fn test_empty_line() {
        assert!(Lexer::new().tokenize_line("   ", 1).is_empty());
    }
}
