use yansi::Paint;

use crate::ast::{ClassDecl, Decorator, Stmt, TypeAnnot};
use crate::lexer::Token;
use crate::parser::{ParseResult, Parser};

use ariadne::{Color, Fmt};

pub fn class_syntax() -> String {
    format!(
        "\
        The syntax for declaring a class is:
            {} ClassName({}, {}, {}={}):
                attribute: type
                {} method(self, ...) -> return_type: ...
        ",
        Fmt::fg("class", Color::Yellow).bold(),
        Fmt::fg("Base1", Color::Rgb(150, 200, 100)).bold(),
        Fmt::fg("Base2", Color::Rgb(150, 200, 100)).bold(),
        Fmt::fg("metaclass", Color::Rgb(205, 150, 100)).bold(),
        Fmt::fg("Meta", Color::Rgb(150, 200, 100)).bold(),
        Fmt::fg("def", Color::Yellow).bold(),
    )
}

impl Parser<'_> {
    pub fn parse_class(&mut self, decorators: Vec<Decorator>) -> ParseResult<Stmt> {
        let Some((_token, span_class)) = self.next() else {
            unreachable!()
        };
        let start = match decorators.first() {
            Some(decorator) => decorator.span.start,
            None => span_class.start,
        };

        let name = self
            .expect_name("a class name after `class`")
            .map_err(|e| e.with_note(class_syntax()))?;

        // PEP 695 type parameters: `class Box[T]: ...`
        if let Some(Token::LBracket) = self.peek() {
            self.skip_group()?;
        }

        let mut bases = vec![];
        let mut keywords = vec![];

        if self.eat(&Token::LParen).is_some() {
            loop {
                if self.eat(&Token::RParen).is_some() {
                    break;
                }

                match (self.peek(), self.peek_nth(1)) {
                    (Some(Token::Name(_)), Some(Token::Assign)) => {
                        let (keyword, span) = self.expect_name("a keyword")?;
                        self.next(); // eat '='
                        let (value, value_span) = self.parse_type_annotation()?;
                        keywords.push((keyword, value, span.start..value_span.end));
                    }
                    // `*bases` / `**kwargs` in a class header carry nothing checkable
                    (Some(Token::Star), _) | (Some(Token::DoubleStar), _) => {
                        self.next();
                        self.parse_type_annotation()?;
                    }
                    _ => {
                        let (base, span) = self.parse_type_annotation()?;
                        // `six.with_metaclass(M, B)` builds its base at runtime
                        if let Some(Token::LParen) = self.peek() {
                            let call = self.skip_group()?;
                            bases.push((TypeAnnot::Unknown, span.start..call.end));
                        } else {
                            bases.push((base, span));
                        }
                    }
                }

                if self.eat(&Token::Comma).is_none() {
                    self.expect(Token::RParen, "`,` or `)` in the base list")
                        .map_err(|e| e.with_note(class_syntax()))?;
                    break;
                }
            }
        }

        self.expect(Token::Colon, "`:` after the class header")
            .map_err(|e| e.with_note(class_syntax()))?;
        let span_end = self.last_end();

        let body = self.parse_suite()?;

        Ok(Stmt::Class(ClassDecl {
            name,
            bases,
            keywords,
            decorators,
            body,
            span: start..span_end,
        }))
    }
}
