use crate::ast::{QualName, Span, TypeAnnot, Value};
use crate::lexer::Token;
use crate::parser::{ParseResult, Parser};

impl Parser<'_> {
    /// `A | B[C, D] | None`, returned with the span it covers.
    pub fn parse_type_annotation(&mut self) -> ParseResult<(TypeAnnot, Span)> {
        let start = self.peek_span().start;
        let first = self.parse_annotation_primary()?;

        if self.peek() != Some(&Token::Pipe) {
            return Ok((first, start..self.last_end()));
        }

        let mut members = vec![first];
        while self.eat(&Token::Pipe).is_some() {
            members.push(self.parse_annotation_primary()?);
        }
        Ok((TypeAnnot::Union(members), start..self.last_end()))
    }

    fn parse_annotation_primary(&mut self) -> ParseResult<TypeAnnot> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("a type"));
        };

        match token {
            Token::Name(_) => {
                let (name, _) = self.parse_dotted_name("a type name")?;
                if self.eat(&Token::LBracket).is_some() {
                    let args = self.parse_annotation_list(Token::RBracket)?;
                    Ok(TypeAnnot::Generic(name, args))
                } else {
                    Ok(TypeAnnot::Name(name))
                }
            }
            Token::KeywordNone => {
                self.next();
                Ok(TypeAnnot::None)
            }
            Token::Ellipsis => {
                self.next();
                Ok(TypeAnnot::Ellipsis)
            }
            Token::String(_) => {
                let Some((Token::String(text), _)) = self.next() else {
                    unreachable!()
                };
                Ok(TypeAnnot::Literal(text))
            }
            Token::Number(_) => {
                let Some((Token::Number(text), _)) = self.next() else {
                    unreachable!()
                };
                Ok(TypeAnnot::Literal(text))
            }
            Token::Minus => {
                self.next();
                match self.next() {
                    Some((Token::Number(text), _)) => Ok(TypeAnnot::Literal(format!("-{}", text))),
                    _ => Err(self.unexpected("a number after `-`")),
                }
            }
            Token::Bool(_) => {
                let Some((Token::Bool(b), _)) = self.next() else {
                    unreachable!()
                };
                Ok(TypeAnnot::Literal(if b { "True" } else { "False" }.to_string()))
            }
            // `Callable[[int, str], None]`
            Token::LBracket => {
                self.next();
                Ok(TypeAnnot::List(self.parse_annotation_list(Token::RBracket)?))
            }
            // `tuple[()]` or a parenthesized annotation
            Token::LParen => {
                self.next();
                let mut items = self.parse_annotation_list(Token::RParen)?;
                if items.len() == 1 {
                    Ok(items.remove(0))
                } else {
                    Ok(TypeAnnot::List(items))
                }
            }
            // `*Ts` unpacking in variadic generics
            Token::Star => {
                self.next();
                self.parse_annotation_primary()
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    /// Comma separated annotations up to and including `close`.
    fn parse_annotation_list(&mut self, close: Token) -> ParseResult<Vec<TypeAnnot>> {
        let mut items = vec![];
        loop {
            if self.eat(&close).is_some() {
                return Ok(items);
            }
            items.push(self.parse_type_annotation()?.0);
            if self.eat(&Token::Comma).is_none() {
                let what = format!("`,` or {}", close);
                self.expect(close, &what)?;
                return Ok(items);
            }
        }
    }

    /// A default or assigned value. Only its shape is kept.
    pub fn parse_value(&mut self) -> ParseResult<(Value, Span)> {
        let start = self.peek_span().start;
        let mut value = self.parse_value_primary()?;

        // `A | B`, `1 + 2`, `x.y * 3`: anything compound is opaque
        while let Some(
            Token::Pipe | Token::Operator(_) | Token::Star | Token::DoubleStar | Token::Slash | Token::Minus,
        ) = self.peek()
        {
            self.next();
            self.parse_value_primary()?;
            value = Value::Other;
        }

        Ok((value, start..self.last_end()))
    }

    fn parse_value_primary(&mut self) -> ParseResult<Value> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected("a value"));
        };

        let value = match token {
            Token::Ellipsis => {
                self.next();
                Value::Ellipsis
            }
            Token::KeywordNone => {
                self.next();
                Value::None
            }
            Token::Bool(_) => {
                let Some((Token::Bool(b), _)) = self.next() else {
                    unreachable!()
                };
                Value::Bool(b)
            }
            Token::Number(_) => {
                let Some((Token::Number(n), _)) = self.next() else {
                    unreachable!()
                };
                Value::Number(n)
            }
            Token::Minus => {
                self.next();
                match self.parse_value_primary()? {
                    Value::Number(n) => Value::Number(format!("-{}", n)),
                    _ => Value::Other,
                }
            }
            Token::String(_) => {
                // implicit concatenation of adjacent literals
                let mut text = String::new();
                while let Some((Token::String(part), _)) = self.tokens.get(self.pos) {
                    text.push_str(part);
                    self.pos += 1;
                }
                Value::Str(text)
            }
            Token::Name(_) => {
                let (name, _) = self.parse_dotted_name("a name")?;
                match self.peek() {
                    Some(Token::LParen) => {
                        self.skip_group()?;
                        Value::Call(name)
                    }
                    Some(Token::LBracket) => {
                        self.skip_group()?;
                        Value::Other
                    }
                    _ => Value::Name(name),
                }
            }
            Token::LBracket | Token::LParen | Token::LBrace => {
                let close = match token {
                    Token::LBracket => Token::RBracket,
                    Token::LParen => Token::RParen,
                    _ => Token::RBrace,
                };
                self.next();
                Value::Collection(self.parse_value_items(close)?)
            }
            _ => return Err(self.unexpected("a value")),
        };

        Ok(value)
    }

    fn parse_value_items(&mut self, close: Token) -> ParseResult<Vec<Value>> {
        let mut items = vec![];
        loop {
            if self.eat(&close).is_some() {
                return Ok(items);
            }
            items.push(self.parse_value()?.0);
            // dict entries contribute both key and value
            if self.eat(&Token::Colon).is_some() {
                items.push(self.parse_value()?.0);
            }
            if self.eat(&Token::Comma).is_none() {
                let what = format!("`,` or {}", close);
                self.expect(close, &what)?;
                return Ok(items);
            }
        }
    }
}

/// The name a `Name` or `Call` value refers to, e.g. `_Base` in `Alias = _Base`.
pub fn value_name(value: &Value) -> Option<&QualName> {
    match value {
        Value::Name(name) | Value::Call(name) => Some(name),
        _ => None,
    }
}
