pub mod layout;


use logos::{Lexer, Logos};

use std::fmt;

pub use layout::{LexError, SpannedToken, tokenize};

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\f]+")] // Ignore this regex pattern between tokens
#[logos(skip r"#[^\r\n]*")] // comments
#[logos(skip r"\\\r?\n")] // explicit line continuation
#[derive(Clone)]
pub enum Token {
    // physical newline followed by the indentation of the next line
    #[regex(r"\r?\n[ \t]*", indent_width)]
    Line(usize),

    // produced by the layout pass, never by logos directly
    Newline,
    Indent,
    Dedent,

    #[token("True", |_| true)]
    #[token("False", |_| false)]
    Bool(bool),

    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9]+)?[jJ]?", |lex| lex.slice().to_string())]
    #[regex(r"0[xXoObB][0-9a-fA-F_]+", |lex| lex.slice().to_string())]
    Number(String),

    #[regex(r#"[rRbBuUfF]{0,2}"([^"\\\r\n]|\\[^\r\n])*""#, |lex| unquote(lex.slice(), 1))]
    #[regex(r#"[rRbBuUfF]{0,2}'([^'\\\r\n]|\\[^\r\n])*'"#, |lex| unquote(lex.slice(), 1))]
    #[regex(r#"[rRbBuUfF]{0,2}""""#, |lex| triple_quoted(lex, "\"\"\""))]
    #[regex(r#"[rRbBuUfF]{0,2}'''"#, |lex| triple_quoted(lex, "'''"))]
    String(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex|{
        lex.slice().to_string()
    })]
    Name(String),

    #[token("def")]
    KeywordDef,

    #[token("async")]
    KeywordAsync,

    #[token("class")]
    KeywordClass,

    #[token("import")]
    KeywordImport,

    #[token("from")]
    KeywordFrom,

    #[token("as")]
    KeywordAs,

    #[token("if")]
    KeywordIf,

    #[token("elif")]
    KeywordElif,

    #[token("else")]
    KeywordElse,

    #[token("pass")]
    KeywordPass,

    #[token("None")]
    KeywordNone,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token(".")]
    Dot,

    #[token("...")]
    Ellipsis,

    #[token("->")]
    Arrow,

    #[token("=")]
    Assign,

    #[token("*")]
    Star,

    #[token("**")]
    DoubleStar,

    #[token("/")]
    Slash,

    #[token("|")]
    Pipe,

    #[token("@")]
    At,

    #[token("-")]
    Minus,

    #[token("+=")]
    PlusAssign,

    // anything else an `if` condition or a default value may contain
    #[regex(r"==|!=|<=|>=|<|>|\+|%|&|~|\^|//|<<|>>|:=", |lex| lex.slice().to_string())]
    Operator(String),
}

fn indent_width(lex: &mut Lexer<Token>) -> usize {
    let mut width = 0;
    for c in lex.slice().chars() {
        match c {
            ' ' => width += 1,
            '\t' => width = (width / 8 + 1) * 8,
            _ => {}
        }
    }
    width
}

fn unquote(slice: &str, quote_len: usize) -> String {
    let start = slice
        .find(|c: char| c == '"' || c == '\'')
        .unwrap_or(0)
        + quote_len;
    let end = slice.len().saturating_sub(quote_len).max(start);
    slice[start..end]
        .replace("\\\"", "\"")
        .replace("\\'", "'")
        .replace("\\\\", "\\")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
}

// Scans the remainder for the closing delimiter; an unterminated string is a lex error.
fn triple_quoted(lex: &mut Lexer<Token>, delimiter: &str) -> Option<String> {
    let rest = lex.remainder();
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }
        if rest[i..].starts_with(delimiter) {
            let content = rest[..i].to_string();
            lex.bump(i + delimiter.len());
            return Some(content);
        }
    }
    None
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Line(_) | Token::Newline => write!(f, "newline"),
            Token::Indent => write!(f, "indent"),
            Token::Dedent => write!(f, "dedent"),
            Token::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Token::Number(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "{:?}", s),
            Token::Name(n) => write!(f, "`{}`", n),
            Token::KeywordDef => write!(f, "`def`"),
            Token::KeywordAsync => write!(f, "`async`"),
            Token::KeywordClass => write!(f, "`class`"),
            Token::KeywordImport => write!(f, "`import`"),
            Token::KeywordFrom => write!(f, "`from`"),
            Token::KeywordAs => write!(f, "`as`"),
            Token::KeywordIf => write!(f, "`if`"),
            Token::KeywordElif => write!(f, "`elif`"),
            Token::KeywordElse => write!(f, "`else`"),
            Token::KeywordPass => write!(f, "`pass`"),
            Token::KeywordNone => write!(f, "`None`"),
            Token::LParen => write!(f, "`(`"),
            Token::RParen => write!(f, "`)`"),
            Token::LBracket => write!(f, "`[`"),
            Token::RBracket => write!(f, "`]`"),
            Token::LBrace => write!(f, "`{{`"),
            Token::RBrace => write!(f, "`}}`"),
            Token::Comma => write!(f, "`,`"),
            Token::Colon => write!(f, "`:`"),
            Token::Semicolon => write!(f, "`;`"),
            Token::Dot => write!(f, "`.`"),
            Token::Ellipsis => write!(f, "`...`"),
            Token::Arrow => write!(f, "`->`"),
            Token::Assign => write!(f, "`=`"),
            Token::Star => write!(f, "`*`"),
            Token::DoubleStar => write!(f, "`**`"),
            Token::Slash => write!(f, "`/`"),
            Token::Pipe => write!(f, "`|`"),
            Token::At => write!(f, "`@`"),
            Token::Minus => write!(f, "`-`"),
            Token::PlusAssign => write!(f, "`+=`"),
            Token::Operator(op) => write!(f, "`{}`", op),
        }
    }
}
