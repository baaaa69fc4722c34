//! Verilog frontend for HIRN designs.
//!
//! Reads the module-level structure of Verilog sources (module headers,
//! ports, nets and `(* ... *)` attributes). Every other module item is kept
//! as opaque text, so that it can be written back unchanged by
//! [`hirn::VerilogCodegen`].

pub mod lexer;
pub mod parse_error;
pub mod parser;
pub mod source_span;

pub use lexer::{tokenize, Token, TokenKind};
pub use parse_error::{ParseError, ParseErrorKind};
pub use parser::parse_design;
pub use source_span::SourceSpan;
