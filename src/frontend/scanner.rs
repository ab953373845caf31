//! Declaration Scanner
//!
//! Turns fixture tokens into declarations and the attributes written on them.
//! This is not a grammar: it recognizes declaration headers, brace nesting and
//! type annotations, and skips everything else.

use std::collections::HashMap;

use crate::declaration::{
    AttributeInstance, ContextKind, Declaration, Location, Mutability, StorageKind, Wrapper,
};
use crate::frontend::lexer::{Lexer, Token, TokenKind};
use crate::frontend::types::TypeTable;

/// Declaration modifiers that may sit between an attribute and its declaration
const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "fileprivate",
    "internal",
    "open",
    "final",
    "override",
    "static",
    "lazy",
    "dynamic",
    "mutating",
    "nonmutating",
    "required",
    "convenience",
    "optional",
    "indirect",
    "unowned",
    "nonisolated",
    "prefix",
    "postfix",
    "infix",
];

/// Words that may follow `class` when it is used as a modifier
const CLASS_MODIFIED: &[&str] = &["func", "var", "let", "subscript", "final", "override"];

/// Everything the scanner found in one fixture
#[derive(Debug, Clone, Default)]
pub struct ScannedSource {
    /// Every declaration seen, in source order
    pub declarations: Vec<Declaration>,
    /// Attribute instances in source order, each bound to its declaration
    pub attributes: Vec<AttributeInstance>,
    pub types: TypeTable,
}

/// Scans fixture text for declarations
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    known: TypeTable,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the type table with conformances of types the fixture doesn't declare
    pub fn with_known_conformances(mut self, known: &HashMap<String, Vec<String>>) -> Self {
        for (name, conformances) in known {
            self.known.declare(name, conformances.iter().cloned());
        }
        self
    }

    pub fn scan(&self, text: &str) -> ScannedSource {
        let tokens = Lexer::new().tokenize(text);

        let (types, kinds) = collect_types(&tokens, self.known.clone());
        let mut state = ScanState {
            cursor: Cursor::new(&tokens),
            types: &types,
            kinds: &kinds,
            stack: Vec::new(),
            pending_body: None,
            pending_attrs: Vec::new(),
            weak: false,
            out: ScannedSource::default(),
        };
        state.run();

        let mut out = state.out;
        out.types = types;
        out
    }
}

/// Pre-pass: nominal type kinds plus their inheritance and conformance lists
fn collect_types(tokens: &[Token], mut table: TypeTable) -> (TypeTable, HashMap<String, ContextKind>) {
    let mut kinds = HashMap::new();
    let mut cursor = Cursor::new(tokens);

    while let Some(tok) = cursor.next() {
        if tok.kind != TokenKind::Word {
            continue;
        }
        let kind = match tok.text.as_str() {
            "class" if cursor.peek().is_some_and(|t| CLASS_MODIFIED.contains(&t.text.as_str())) => {
                continue;
            }
            "class" => Some(ContextKind::Class),
            "struct" => Some(ContextKind::Struct),
            "enum" => Some(ContextKind::Enum),
            "protocol" => Some(ContextKind::Protocol),
            "extension" => None,
            _ => continue,
        };
        let Some(name) = cursor.eat_kind(TokenKind::Word).map(|t| t.text.clone()) else {
            continue;
        };
        cursor.skip_generics();
        let supertypes = cursor.inheritance_clause();
        table.declare(&name, supertypes);
        if let Some(kind) = kind {
            kinds.insert(name, kind);
        }
    }

    (table, kinds)
}

struct ScanState<'t> {
    cursor: Cursor<'t>,
    types: &'t TypeTable,
    kinds: &'t HashMap<String, ContextKind>,
    /// One context per open brace
    stack: Vec<ContextKind>,
    /// Context the next `{` opens, set by the declaration that owns it
    pending_body: Option<ContextKind>,
    pending_attrs: Vec<(String, Location)>,
    weak: bool,
    out: ScannedSource,
}

impl<'t> ScanState<'t> {
    fn run(&mut self) {
        while let Some(tok) = self.cursor.next() {
            match tok.kind {
                TokenKind::Attribute => {
                    self.pending_attrs.push((tok.text.clone(), tok.location));
                    // `@objc(name)` style arguments
                    if self.cursor.peek_adjacent_punct(tok, '(') {
                        self.cursor.skip_balanced('(', ')');
                    }
                }
                TokenKind::Punct if tok.is_punct('{') => {
                    let context = self.pending_body.take().unwrap_or(self.context());
                    self.stack.push(context);
                }
                TokenKind::Punct if tok.is_punct('}') => {
                    self.stack.pop();
                    self.discard_pending("closing brace");
                }
                TokenKind::Word => self.word(tok),
                _ => self.discard_pending(&tok.text),
            }
        }
        self.discard_pending("end of input");
    }

    fn context(&self) -> ContextKind {
        self.stack.last().copied().unwrap_or(ContextKind::TopLevel)
    }

    fn word(&mut self, tok: &'t Token) {
        match tok.text.as_str() {
            "class"
                if self
                    .cursor
                    .peek()
                    .is_some_and(|t| CLASS_MODIFIED.contains(&t.text.as_str())) => {}
            "class" => self.type_decl(tok, ContextKind::Class),
            "struct" => self.type_decl(tok, ContextKind::Struct),
            "enum" => self.type_decl(tok, ContextKind::Enum),
            "protocol" => self.type_decl(tok, ContextKind::Protocol),
            "extension" => self.extension(),
            "func" | "subscript" => self.function(tok),
            "init" | "deinit" => self.initializer(tok),
            "var" => self.variable(tok, Mutability::Mutable),
            "let" => self.variable(tok, Mutability::Immutable),
            "weak" => self.weak = true,
            // In a function body `case` is a switch label
            "case"
                if self.context() != ContextKind::Function || !self.pending_attrs.is_empty() =>
            {
                self.other_decl(tok)
            }
            "typealias" | "associatedtype" | "operator" | "precedencegroup" => self.other_decl(tok),
            "import" => self.import(tok),
            m if MODIFIERS.contains(&m) => {
                // `private(set)`
                if self.cursor.peek_adjacent_punct(tok, '(') {
                    self.cursor.skip_balanced('(', ')');
                }
            }
            other => self.discard_pending(other),
        }
    }

    fn discard_pending(&mut self, reason: &str) {
        for (name, location) in self.pending_attrs.drain(..) {
            log::debug!("attribute @{name} at {location} is not attached to a declaration ({reason})");
        }
        self.weak = false;
    }

    fn emit(&mut self, decl: Declaration) {
        for (name, location) in &self.pending_attrs {
            self.out
                .attributes
                .push(AttributeInstance::new(name.clone(), *location, decl.clone()));
        }
        self.out.declarations.push(decl);
    }

    fn finish_decl(&mut self) {
        self.pending_attrs.clear();
        self.weak = false;
    }

    /// Declarations with no body of interest: enum cases, aliases, operators
    fn other_decl(&mut self, tok: &'t Token) {
        let name = match self.cursor.peek() {
            Some(t)
                if t.location.line == tok.location.line
                    && t.kind != TokenKind::Literal
                    && !t.is_punct('{')
                    && !t.is_punct(':') =>
            {
                self.cursor.next();
                t.text.clone()
            }
            _ => tok.text.clone(),
        };
        let decl = Declaration::other(name, tok.location)
            .context(self.context())
            .build();
        self.emit(decl);
        self.finish_decl();
    }

    /// `import [kind] Module.Path`, named by its last component
    fn import(&mut self, tok: &'t Token) {
        let line = tok.location.line;
        let mut name = tok.text.clone();
        while let Some(next) = self.cursor.peek().filter(|t| t.location.line == line) {
            self.cursor.next();
            if next.kind == TokenKind::Word {
                name = next.text.clone();
            }
        }
        let decl = Declaration::other(name, tok.location)
            .context(self.context())
            .build();
        self.emit(decl);
        self.finish_decl();
    }

    fn type_decl(&mut self, tok: &'t Token, kind: ContextKind) {
        let Some(name) = self.cursor.eat_kind(TokenKind::Word) else {
            self.discard_pending(&tok.text);
            return;
        };
        self.cursor.skip_generics();
        // Already recorded by the pre-pass
        self.cursor.inheritance_clause();

        let decl = Declaration::type_decl(name.text.clone(), tok.location)
            .context(self.context())
            .build();
        self.emit(decl);
        self.finish_decl();
        self.pending_body = Some(kind);
    }

    fn extension(&mut self) {
        let context = self
            .cursor
            .eat_kind(TokenKind::Word)
            .and_then(|name| self.kinds.get(&name.text).copied())
            .unwrap_or(ContextKind::TopLevel);
        self.cursor.skip_generics();
        self.cursor.inheritance_clause();
        self.discard_pending("extension");
        self.pending_body = Some(context);
    }

    fn function(&mut self, tok: &'t Token) {
        let name = match self.cursor.peek() {
            Some(t) if t.kind == TokenKind::Word && tok.text == "func" => {
                self.cursor.next();
                t.text.clone()
            }
            _ => tok.text.clone(),
        };
        let decl = Declaration::function(name, tok.location)
            .context(self.context())
            .build();
        self.emit(decl);
        self.finish_decl();
        self.skip_signature(tok);
    }

    fn initializer(&mut self, tok: &'t Token) {
        let decl = Declaration::initializer(tok.location)
            .context(self.context())
            .build();
        self.emit(decl);
        self.finish_decl();
        self.skip_signature(tok);
    }

    /// Skip parameters, effects and return type, up to the body if there is one
    fn skip_signature(&mut self, start: &'t Token) {
        let mut line = start.location.line;
        while let Some(next) = self.cursor.peek() {
            if next.is_punct('{') {
                self.pending_body = Some(ContextKind::Function);
                return;
            }
            if next.is_punct('}') || next.is_punct(';') || next.location.line != line {
                return;
            }
            if next.is_punct('(') {
                self.cursor.skip_balanced('(', ')');
            } else if next.is_punct('<') {
                self.cursor.skip_generics();
            } else {
                self.cursor.next();
            }
            if let Some(last) = self.cursor.previous() {
                line = last.location.line;
            }
        }
    }

    fn variable(&mut self, tok: &'t Token, mutability: Mutability) {
        let context = self.context();
        let weak = self.weak;

        loop {
            let Some(name) = self.binding_name() else {
                break;
            };

            let mut declared = None;
            if self.cursor.eat_punct(':') {
                declared = self.cursor.type_annotation();
            }

            if self.cursor.peek().is_some_and(|t| t.is_punct('=')) {
                self.cursor.next();
                self.skip_initializer(tok.location.line);
            }

            let (storage, settable) = self.accessors();
            let mutability = match (mutability, storage, settable) {
                (Mutability::Mutable, StorageKind::Computed, false) => Mutability::Immutable,
                (m, _, _) => m,
            };

            let mut builder = Declaration::variable(name, tok.location)
                .context(context)
                .mutability(mutability)
                .storage(storage);
            if let Some((type_name, wrapper)) = declared {
                let wrapper = if weak { Wrapper::Weak } else { wrapper };
                builder = builder.typed(self.types.resolve(&type_name), wrapper);
            }
            self.emit(builder.build());

            if !self.cursor.eat_punct(',') {
                break;
            }
        }

        self.finish_decl();
    }

    fn binding_name(&mut self) -> Option<String> {
        let next = self.cursor.peek()?;
        match next.kind {
            TokenKind::Word => {
                self.cursor.next();
                Some(next.text.clone())
            }
            // Tuple pattern, e.g. `let (a, b) = pair`
            TokenKind::Punct if next.is_punct('(') => {
                let text = self.cursor.skip_balanced('(', ')');
                Some(text)
            }
            _ => None,
        }
    }

    /// Skip an initializer expression: to the end of the line, or further while
    /// brackets are open.
    fn skip_initializer(&mut self, line: usize) {
        let mut depth = 0usize;
        while let Some(next) = self.cursor.peek() {
            if depth == 0 {
                if next.location.line != line || next.is_punct(',') || next.is_punct(';') {
                    return;
                }
                if next.is_punct('}') {
                    return;
                }
                if next.is_punct('{') && self.cursor.block_starts_with(&["willSet", "didSet"]) {
                    return;
                }
            }
            match next.text.as_str() {
                "(" | "[" | "{" if next.kind == TokenKind::Punct => depth += 1,
                ")" | "]" | "}" if next.kind == TokenKind::Punct => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.cursor.next();
        }
    }

    /// Consume an accessor block if present: returns storage kind and whether
    /// the property has a setter.
    fn accessors(&mut self) -> (StorageKind, bool) {
        if !self.cursor.peek().is_some_and(|t| t.is_punct('{')) {
            return (StorageKind::Stored, true);
        }

        let observers = self.cursor.block_starts_with(&["willSet", "didSet"]);
        let words = self.cursor.block_words();

        if observers {
            (StorageKind::Stored, true)
        } else {
            let settable = words.iter().any(|w| w == "set" || w == "_modify");
            (StorageKind::Computed, settable)
        }
    }
}

/// Token cursor with the handful of lookahead helpers the scanner needs
struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn previous(&self) -> Option<&'t Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    fn next(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(tok)
    }

    fn eat_kind(&mut self, kind: TokenKind) -> Option<&'t Token> {
        match self.peek() {
            Some(t) if t.kind == kind => self.next(),
            _ => None,
        }
    }

    fn eat_punct(&mut self, punct: char) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Is the next token `punct`, written directly after `tok`?
    fn peek_adjacent_punct(&self, tok: &Token, punct: char) -> bool {
        let width = tok.text.len() + usize::from(tok.kind == TokenKind::Attribute);
        self.peek().is_some_and(|t| {
            t.is_punct(punct)
                && t.location.line == tok.location.line
                && t.location.column == tok.location.column + width
        })
    }

    /// Consume a balanced group starting at `open`, returning its text
    fn skip_balanced(&mut self, open: char, close: char) -> String {
        let mut text = String::new();
        let mut depth = 0usize;
        while let Some(tok) = self.next() {
            text.push_str(&tok.text);
            if tok.is_punct(open) {
                depth += 1;
            } else if tok.is_punct(close) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            }
        }
        text
    }

    fn skip_generics(&mut self) {
        if self.peek().is_some_and(|t| t.is_punct('<')) {
            self.skip_balanced('<', '>');
        }
    }

    /// `: A, B<C>, D` up to the body or a `where` clause
    fn inheritance_clause(&mut self) -> Vec<String> {
        let mut supertypes = Vec::new();
        if !self.eat_punct(':') {
            return supertypes;
        }
        while let Some((name, _)) = self.type_annotation() {
            supertypes.push(name);
            if !self.eat_punct(',') {
                break;
            }
        }
        if self.peek().is_some_and(|t| t.is_word("where")) {
            while self.peek().is_some_and(|t| !t.is_punct('{')) {
                self.next();
            }
        }
        supertypes
    }

    /// A type annotation: the base name (last path component) and its wrapper
    fn type_annotation(&mut self) -> Option<(String, Wrapper)> {
        while self
            .peek()
            .is_some_and(|t| t.is_word("some") || t.is_word("any") || t.is_word("inout"))
        {
            self.next();
        }

        let first = self.peek()?;
        let name = match first.kind {
            TokenKind::Word => {
                self.next();
                let mut name = first.text.clone();
                // `Foundation.NSString` resolves by its last component
                while self.peek().is_some_and(|t| t.is_punct('.'))
                    && self
                        .tokens
                        .get(self.pos + 1)
                        .is_some_and(|t| t.kind == TokenKind::Word)
                {
                    self.next();
                    if let Some(part) = self.next() {
                        name = part.text.clone();
                    }
                }
                self.skip_generics();
                name
            }
            TokenKind::Punct if first.is_punct('[') => self.skip_balanced('[', ']'),
            TokenKind::Punct if first.is_punct('(') => self.skip_balanced('(', ')'),
            _ => return None,
        };

        let wrapper = match self.peek() {
            Some(t) if t.is_punct('?') => Wrapper::Optional,
            Some(t) if t.is_punct('!') => Wrapper::Unwrapped,
            _ => Wrapper::Plain,
        };
        // `T??` is still an optional of T
        while self.peek().is_some_and(|t| t.is_punct('?') || t.is_punct('!')) {
            self.next();
        }

        Some((name, wrapper))
    }

    /// Does the block opening at the cursor start with one of `words`?
    fn block_starts_with(&self, words: &[&str]) -> bool {
        self.tokens
            .get(self.pos + 1)
            .is_some_and(|t| t.kind == TokenKind::Word && words.contains(&t.text.as_str()))
    }

    /// Consume the block at the cursor, returning the words at its top level
    fn block_words(&mut self) -> Vec<String> {
        let mut words = Vec::new();
        let mut depth = 0usize;
        while let Some(tok) = self.next() {
            if tok.is_punct('{') {
                depth += 1;
            } else if tok.is_punct('}') {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            } else if depth == 1 && tok.kind == TokenKind::Word {
                words.push(tok.text.clone());
            }
        }
        words
    }
}
