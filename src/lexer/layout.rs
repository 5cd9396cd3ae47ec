use logos::Logos;

use std::ops::Range;

use crate::lexer::Token;

pub type SpannedToken = (Token, Range<usize>);

#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    InvalidToken(Range<usize>),
    InconsistentDedent(Range<usize>),
}

impl LexError {
    pub fn span(&self) -> Range<usize> {
        match self {
            LexError::InvalidToken(span) | LexError::InconsistentDedent(span) => span.clone(),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LexError::InvalidToken(_) => "invalid token",
            LexError::InconsistentDedent(_) => {
                "unindent does not match any outer indentation level"
            }
        }
    }
}

/// Lexes `source` and rewrites physical line breaks into the
/// `Newline`/`Indent`/`Dedent` structure the parser expects.
///
/// Line breaks inside brackets and blank lines vanish. The output always
/// ends with a `Newline` (unless empty) followed by enough `Dedent`s to
/// close every open block.
pub fn tokenize(source: &str) -> (Vec<SpannedToken>, Vec<LexError>) {
    let mut lexer = Token::lexer(source).spanned();
    let mut tokens: Vec<SpannedToken> = vec![];
    let mut errors = vec![];

    let mut indents: Vec<usize> = vec![0];
    let mut depth: usize = 0;
    let mut pending_line: Option<(usize, Range<usize>)> = None;

    while let Some((token, span)) = lexer.next() {
        let token = match token {
            Ok(token) => token,
            Err(_) => {
                errors.push(LexError::InvalidToken(span));
                continue;
            }
        };

        if let Token::Line(width) = token {
            if depth == 0 {
                pending_line = Some((width, span));
            }
            continue;
        }

        if let Some((width, line_span)) = pending_line.take() {
            if !tokens.is_empty() {
                let break_at = line_span.start..line_span.start + 1;
                tokens.push((Token::Newline, break_at));
                let token_at = span.start..span.start;
                adjust_indentation(&mut indents, width, token_at, &mut tokens, &mut errors);
            }
        }

        match token {
            Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
            Token::RParen | Token::RBracket | Token::RBrace => depth = depth.saturating_sub(1),
            _ => {}
        }

        tokens.push((token, span));
    }

    let end = source.len()..source.len();
    if !tokens.is_empty() {
        tokens.push((Token::Newline, end.clone()));
    }
    while indents.len() > 1 {
        indents.pop();
        tokens.push((Token::Dedent, end.clone()));
    }

    (tokens, errors)
}

fn adjust_indentation(
    indents: &mut Vec<usize>,
    width: usize,
    at: Range<usize>,
    tokens: &mut Vec<SpannedToken>,
    errors: &mut Vec<LexError>,
) {
    let current = *indents.last().unwrap_or(&0);
    if width > current {
        indents.push(width);
        tokens.push((Token::Indent, at));
        return;
    }

    while let Some(&top) = indents.last() {
        if width >= top || indents.len() == 1 {
            break;
        }
        indents.pop();
        tokens.push((Token::Dedent, at.clone()));
    }

    if indents.last().is_some_and(|&top| top != width) {
        // the line is kept at the enclosing level
        errors.push(LexError::InconsistentDedent(at));
    }
}
