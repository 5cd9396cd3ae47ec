pub mod annotation;
pub mod class;
pub mod function;
pub mod statement;

#[cfg(test)]
pub mod test;

use crate::ast::{Span, Stmt, StubFile};
use crate::diagnostics::{Diagnostic, Rule};
use crate::lexer::{SpannedToken, Token, tokenize};

pub type ParseResult<T> = Result<T, Diagnostic>;

/// Lexes and parses one stub file. Syntax problems come back as
/// diagnostics next to whatever part of the file could be parsed.
pub fn parse_stub(file: &str, source: &str) -> (StubFile, Vec<Diagnostic>) {
    let (tokens, lex_errors) = tokenize(source);
    let mut parser = Parser::new(tokens, source, file.to_string());

    for error in lex_errors {
        parser
            .errors
            .push(Diagnostic::new(Rule::SyntaxError, file, error.span(), error.message()));
    }

    let stub = parser.parse_program();
    (stub, parser.errors)
}

pub struct Parser<'a> {
    tokens: Vec<SpannedToken>,
    pos: usize,
    source: &'a str,
    file: String,
    errors: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<SpannedToken>, source: &'a str, file: String) -> Self {
        Parser {
            tokens,
            pos: 0,
            source,
            file,
            errors: vec![],
        }
    }

    pub fn parse_program(&mut self) -> StubFile {
        let mut stmts = vec![];
        while let Some(token) = self.peek() {
            match token {
                // a stray dedent can only follow an inconsistent unindent
                Token::Newline | Token::Dedent => {
                    self.next();
                }
                _ => self.parse_statement_into(&mut stmts),
            }
        }
        StubFile { stmts }
    }

    /// Statements of an indented block, up to and including its `Dedent`.
    pub(crate) fn parse_block(&mut self) -> Vec<Stmt> {
        let mut body = vec![];
        while let Some(token) = self.peek() {
            match token {
                Token::Dedent => {
                    self.next();
                    break;
                }
                Token::Newline => {
                    self.next();
                }
                _ => self.parse_statement_into(&mut body),
            }
        }
        body
    }

    pub(crate) fn parse_statement_into(&mut self, out: &mut Vec<Stmt>) {
        match self.parse_statement() {
            Ok(stmt) => out.push(stmt),
            Err(error) => {
                let span = error.span.clone();
                self.errors.push(error);
                self.recover();
                out.push(Stmt::Error { span });
            }
        }
    }

    /// Skips to the start of the next statement at the current nesting level.
    fn recover(&mut self) {
        let mut nesting = 0usize;
        while let Some(token) = self.peek() {
            match token {
                Token::Indent => nesting += 1,
                Token::Dedent if nesting == 0 => return,
                Token::Dedent => {
                    nesting -= 1;
                    if nesting == 0 {
                        self.next();
                        return;
                    }
                }
                Token::Newline if nesting == 0 => {
                    self.next();
                    // a block opener's body was never parsed; skip it too
                    if let Some(Token::Indent) = self.peek() {
                        continue;
                    }
                    return;
                }
                _ => {}
            }
            self.next();
        }
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(token, _)| token)
    }

    /// Span of the next token, or an empty span at the end of the source.
    pub(crate) fn peek_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => span.clone(),
            None => self.source.len()..self.source.len(),
        }
    }

    pub(crate) fn next(&mut self) -> Option<SpannedToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// End offset of the most recently consumed token.
    pub(crate) fn last_end(&self) -> usize {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some((_, span)) => span.end,
            None => 0,
        }
    }

    pub(crate) fn eat(&mut self, expected: &Token) -> Option<Span> {
        if self.peek() == Some(expected) {
            self.next().map(|(_, span)| span)
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, expected: Token, what: &str) -> ParseResult<Span> {
        match self.eat(&expected) {
            Some(span) => Ok(span),
            None => Err(self.unexpected(what)),
        }
    }

    pub(crate) fn expect_name(&mut self, what: &str) -> ParseResult<(String, Span)> {
        if let Some(Token::Name(_)) = self.peek() {
            if let Some((Token::Name(name), span)) = self.next() {
                return Ok((name, span));
            }
        }
        Err(self.unexpected(what))
    }

    /// A syntax error at the next token.
    pub(crate) fn unexpected(&self, what: &str) -> Diagnostic {
        let found = match self.peek() {
            Some(token) => token.to_string(),
            None => "end of file".to_string(),
        };
        Diagnostic::new(
            Rule::SyntaxError,
            self.file.clone(),
            self.peek_span(),
            format!("expected {}, found {}", what, found),
        )
    }

    /// Consumes the end of a simple statement.
    pub(crate) fn end_of_statement(&mut self) -> ParseResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(Token::Newline) => {
                self.next();
                Ok(())
            }
            Some(Token::Semicolon) => {
                self.next();
                self.eat(&Token::Newline);
                Ok(())
            }
            // the dedent closes the enclosing block and is consumed there
            Some(Token::Dedent) => Ok(()),
            Some(_) => Err(self.unexpected("end of line")),
        }
    }

    /// Skips a balanced bracket group starting at the next token.
    pub(crate) fn skip_group(&mut self) -> ParseResult<Span> {
        let start = self.peek_span();
        let mut depth = 0usize;
        while let Some((token, span)) = self.next() {
            match token {
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(start.start..span.end);
                    }
                }
                _ => {}
            }
        }
        Err(Diagnostic::new(
            Rule::SyntaxError,
            self.file.clone(),
            start,
            "unclosed bracket",
        ))
    }

    pub(crate) fn text(&self, span: Span) -> &'a str {
        self.source.get(span).unwrap_or("").trim()
    }
}
