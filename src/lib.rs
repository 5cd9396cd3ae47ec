pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolve;
pub mod symbols;
pub mod validation;
pub mod workspace;
