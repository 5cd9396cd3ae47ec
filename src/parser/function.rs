use yansi::Paint;

use crate::ast::{Decorator, FunctionSig, Param, ParamKind, Stmt};
use crate::lexer::Token;
use crate::parser::{ParseResult, Parser};

use ariadne::{Color, Fmt};

pub fn function_syntax() -> String {
    format!(
        "\
        The syntax for declaring a function signature is:
            {} function_name({}: {}, {}: {} = ..., *args, **kwargs) -> return_type: ...
        ",
        Fmt::fg("def", Color::Yellow).bold(),
        Fmt::fg("arg1", Color::Rgb(150, 200, 100)).bold(),
        Fmt::fg("type1", Color::Rgb(205, 150, 100)).bold(),
        Fmt::fg("arg2", Color::Rgb(150, 200, 100)).bold(),
        Fmt::fg("type2", Color::Rgb(205, 150, 100)).bold(),
    )
}

impl Parser<'_> {
    pub fn parse_function(&mut self, decorators: Vec<Decorator>) -> ParseResult<Stmt> {
        let start = match decorators.first() {
            Some(decorator) => decorator.span.start,
            None => self.peek_span().start,
        };

        let is_async = self.eat(&Token::KeywordAsync).is_some();
        self.expect(Token::KeywordDef, "`def`")
            .map_err(|e| e.with_note(function_syntax()))?;

        let name = self
            .expect_name("a function name after `def`")
            .map_err(|e| e.with_note(function_syntax()))?;

        // PEP 695 type parameters: `def f[T](x: T) -> T: ...`
        if let Some(Token::LBracket) = self.peek() {
            self.skip_group()?;
        }

        self.expect(Token::LParen, "`(` after the function name")
            .map_err(|e| e.with_note(function_syntax()))?;

        let mut params = vec![];
        loop {
            if self.eat(&Token::RParen).is_some() {
                break;
            }
            params.push(self.parse_param()?);
            if self.eat(&Token::Comma).is_none() {
                self.expect(Token::RParen, "`,` or `)` in the parameter list")
                    .map_err(|e| e.with_note(function_syntax()))?;
                break;
            }
        }

        let returns = match self.eat(&Token::Arrow) {
            Some(_) => Some(self.parse_type_annotation()?),
            None => None,
        };

        self.expect(Token::Colon, "`:` after the signature")
            .map_err(|e| e.with_note(function_syntax()))?;
        let span_end = self.last_end();

        // stub bodies are `...`, a docstring, or `pass`; their content is not kept
        self.parse_suite()?;

        Ok(Stmt::Function(FunctionSig {
            name,
            params,
            returns,
            decorators,
            is_async,
            span: start..span_end,
        }))
    }

    pub fn parse_param(&mut self) -> ParseResult<Param> {
        let start = self.peek_span().start;

        let kind = match self.peek() {
            Some(Token::Slash) => {
                let Some((_, span)) = self.next() else {
                    unreachable!()
                };
                return Ok(Param {
                    name: "/".to_string(),
                    kind: ParamKind::PositionalOnlyMarker,
                    annotation: None,
                    default: None,
                    span,
                });
            }
            Some(Token::Star) => {
                let Some((_, span)) = self.next() else {
                    unreachable!()
                };
                if !matches!(self.peek(), Some(Token::Name(_))) {
                    return Ok(Param {
                        name: "*".to_string(),
                        kind: ParamKind::KeywordOnlyMarker,
                        annotation: None,
                        default: None,
                        span,
                    });
                }
                ParamKind::VarPositional
            }
            Some(Token::DoubleStar) => {
                self.next();
                ParamKind::VarKeyword
            }
            _ => ParamKind::Regular,
        };

        let (name, _) = self
            .expect_name("a parameter name")
            .map_err(|e| e.with_note(function_syntax()))?;

        let annotation = match self.eat(&Token::Colon) {
            Some(_) => Some(self.parse_type_annotation()?),
            None => None,
        };

        let default = match self.eat(&Token::Assign) {
            Some(_) => Some(self.parse_value()?),
            None => None,
        };

        Ok(Param {
            name,
            kind,
            annotation,
            default,
            span: start..self.last_end(),
        })
    }
}
