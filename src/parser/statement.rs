use crate::ast::{
    AttributeDecl, Branch, Conditional, Decorator, FromImport, Import, ImportedModule,
    ImportedName, QualName, Span, Stmt,
};
use crate::lexer::Token;
use crate::parser::{ParseResult, Parser};

impl Parser<'_> {
    pub fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("a statement"));
        };

        match token {
            Token::At => {
                let decorators = self.parse_decorators()?;
                match self.peek() {
                    Some(Token::KeywordClass) => self.parse_class(decorators),
                    Some(Token::KeywordDef) | Some(Token::KeywordAsync) => {
                        self.parse_function(decorators)
                    }
                    _ => Err(self.unexpected("`def` or `class` after decorators")),
                }
            }
            Token::KeywordDef | Token::KeywordAsync => self.parse_function(vec![]),
            Token::KeywordClass => self.parse_class(vec![]),
            Token::KeywordImport => self.parse_import(),
            Token::KeywordFrom => self.parse_from_import(),
            Token::KeywordIf => self.parse_conditional(),
            Token::KeywordPass => {
                let Some((_, span)) = self.next() else {
                    unreachable!()
                };
                self.end_of_statement()?;
                Ok(Stmt::Pass { span })
            }
            Token::Ellipsis => {
                let Some((_, span)) = self.next() else {
                    unreachable!()
                };
                self.end_of_statement()?;
                Ok(Stmt::Ellipsis { span })
            }
            Token::String(_) => self.parse_docstring(),
            Token::Name(_) => self.parse_attribute(),
            _ => Err(self.unexpected("a declaration")),
        }
    }

    /// Body after a `:`. Either an indented block or simple statements on
    /// the same line (`def f(): ...`).
    pub(crate) fn parse_suite(&mut self) -> ParseResult<Vec<Stmt>> {
        if self.eat(&Token::Newline).is_some() {
            self.expect(Token::Indent, "an indented block")?;
            return Ok(self.parse_block());
        }
        let stmt = self.parse_statement()?;
        Ok(vec![stmt])
    }

    pub(crate) fn parse_dotted_name(&mut self, what: &str) -> ParseResult<(QualName, Span)> {
        let (first, span) = self.expect_name(what)?;
        let mut parts = vec![first];
        let mut end = span.end;
        while let Some(Token::Dot) = self.peek() {
            self.next();
            let (part, part_span) = self.expect_name("a name after `.`")?;
            parts.push(part);
            end = part_span.end;
        }
        Ok((QualName(parts), span.start..end))
    }

    fn parse_decorators(&mut self) -> ParseResult<Vec<Decorator>> {
        let mut decorators = vec![];
        while let Some(at) = self.eat(&Token::At) {
            let (name, name_span) = self.parse_dotted_name("a decorator name")?;
            let mut end = name_span.end;
            if let Some(Token::LParen) = self.peek() {
                end = self.skip_group()?.end;
            }
            self.expect(Token::Newline, "end of line after decorator")?;
            decorators.push(Decorator {
                name,
                span: at.start..end,
            });
        }
        Ok(decorators)
    }

    fn parse_import(&mut self) -> ParseResult<Stmt> {
        let Some((_, span_import)) = self.next() else {
            unreachable!()
        };

        let mut names = vec![];
        loop {
            let (module, span) = self.parse_dotted_name("a module name after `import`")?;
            let (alias, end) = match self.eat(&Token::KeywordAs) {
                Some(_) => {
                    let (alias, alias_span) = self.expect_name("an alias after `as`")?;
                    (Some(alias), alias_span.end)
                }
                None => (None, span.end),
            };
            names.push(ImportedModule {
                module,
                alias,
                span: span.start..end,
            });
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }

        let end = self.last_end();
        self.end_of_statement()?;
        Ok(Stmt::Import(Import {
            names,
            span: span_import.start..end,
        }))
    }

    fn parse_from_import(&mut self) -> ParseResult<Stmt> {
        let Some((_, span_from)) = self.next() else {
            unreachable!()
        };

        let mut level = 0;
        loop {
            match self.peek() {
                Some(Token::Dot) => level += 1,
                // `from ... import x` lexes the dots as one token
                Some(Token::Ellipsis) => level += 3,
                _ => break,
            }
            self.next();
        }

        let module = match self.peek() {
            Some(Token::Name(_)) => Some(self.parse_dotted_name("a module name")?.0),
            _ if level > 0 => None,
            _ => return Err(self.unexpected("a module name after `from`")),
        };

        self.expect(Token::KeywordImport, "`import`")?;

        let mut names = vec![];
        let mut star = false;
        if self.eat(&Token::Star).is_some() {
            star = true;
        } else {
            let parenthesized = self.eat(&Token::LParen).is_some();
            loop {
                if parenthesized && self.peek() == Some(&Token::RParen) {
                    break;
                }
                let (name, span) = self.expect_name("an imported name")?;
                let (alias, end) = match self.eat(&Token::KeywordAs) {
                    Some(_) => {
                        let (alias, alias_span) = self.expect_name("an alias after `as`")?;
                        (Some(alias), alias_span.end)
                    }
                    None => (None, span.end),
                };
                names.push(ImportedName {
                    name,
                    alias,
                    span: span.start..end,
                });
                if self.eat(&Token::Comma).is_none() {
                    break;
                }
            }
            if parenthesized {
                self.expect(Token::RParen, "`)` to close the import list")?;
            }
        }

        let end = self.last_end();
        self.end_of_statement()?;
        Ok(Stmt::FromImport(FromImport {
            level,
            module,
            names,
            star,
            span: span_from.start..end,
        }))
    }

    fn parse_attribute(&mut self) -> ParseResult<Stmt> {
        let (name, span_name) = self.expect_name("a name")?;

        let mut annotation = None;
        let mut value = None;
        let mut augmented = false;

        match self.peek() {
            Some(Token::Colon) => {
                self.next();
                annotation = Some(self.parse_type_annotation()?);
                if self.eat(&Token::Assign).is_some() {
                    value = Some(self.parse_value()?);
                }
            }
            Some(Token::Assign) => {
                self.next();
                value = Some(self.parse_value()?);
            }
            Some(Token::PlusAssign) => {
                self.next();
                augmented = true;
                value = Some(self.parse_value()?);
            }
            _ => return Err(self.unexpected("`:` or `=` after a name")),
        }

        let end = self.last_end();
        self.end_of_statement()?;
        Ok(Stmt::Attribute(AttributeDecl {
            name: (name, span_name.clone()),
            annotation,
            value,
            augmented,
            span: span_name.start..end,
        }))
    }

    fn parse_docstring(&mut self) -> ParseResult<Stmt> {
        let start = self.peek_span().start;
        let mut text = String::new();
        while let Some(Token::String(_)) = self.peek() {
            if let Some((Token::String(part), _)) = self.next() {
                text.push_str(&part);
            }
        }
        let end = self.last_end();
        self.end_of_statement()?;
        Ok(Stmt::Docstring {
            text,
            span: start..end,
        })
    }

    fn parse_conditional(&mut self) -> ParseResult<Stmt> {
        let start = self.peek_span().start;
        let mut branches = vec![];

        // `if` first, then any number of `elif`, then an optional `else`
        while let Some(Token::KeywordIf) | Some(Token::KeywordElif) = self.peek() {
            if !branches.is_empty() && self.peek() == Some(&Token::KeywordIf) {
                break;
            }
            self.next();
            let condition = self.parse_condition()?;
            self.expect(Token::Colon, "`:` after the condition")?;
            let body = self.parse_suite()?;
            branches.push(Branch {
                condition: Some(condition),
                body,
            });
        }

        if self.eat(&Token::KeywordElse).is_some() {
            self.expect(Token::Colon, "`:` after `else`")?;
            let body = self.parse_suite()?;
            branches.push(Branch {
                condition: None,
                body,
            });
        }

        Ok(Stmt::Conditional(Conditional {
            branches,
            span: start..self.last_end(),
        }))
    }

    /// The condition up to the `:` that opens the branch, as source text.
    fn parse_condition(&mut self) -> ParseResult<String> {
        let start = self.peek_span().start;
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None | Some(Token::Newline) => {
                    return Err(self.unexpected("`:` after the condition"));
                }
                Some(Token::Colon) if depth == 0 => break,
                Some(Token::LParen) | Some(Token::LBracket) | Some(Token::LBrace) => depth += 1,
                Some(Token::RParen) | Some(Token::RBracket) | Some(Token::RBrace) => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.next();
        }
        let end = self.last_end().max(start);
        if end == start {
            return Err(self.unexpected("a condition"));
        }
        Ok(self.text(start..end).to_string())
    }
}
