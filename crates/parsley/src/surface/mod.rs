mod ast;
mod parser;

pub use ast::*;
pub use parser::{parse_program, parse_program_with_options, Parser};

#[cfg(test)]
mod tests;
