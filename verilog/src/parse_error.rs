use crate::SourceSpan;
use hirn::DesignError;
use miette::Diagnostic;
use thiserror::Error;

/// Kinds of errors reported by the lexer and the parser
#[derive(Clone, Debug, Error)]
pub enum ParseErrorKind {
	/// Lexer couldn't match token to any regex
	#[error("Invalid token")]
	InvalidToken,

	#[error("Invalid numeric literal")]
	InvalidNumber,

	#[error("Unterminated block comment")]
	UnterminatedBlockComment,

	#[error("Unexpected token, expected {0}")]
	UnexpectedToken(&'static str),

	#[error("Unexpected end of file, expected {0}")]
	UnexpectedEof(&'static str),

	#[error("Only constant bit ranges are supported")]
	UnsupportedRange,

	#[error("Parameterized modules are not supported")]
	UnsupportedParameters,

	#[error("`{0}` is not listed in the module port list")]
	UndeclaredPort(String),

	#[error("Port `{0}` has no direction declaration")]
	MissingPortDirection(String),

	#[error(transparent)]
	Design(#[from] DesignError),
}

/// Verilog frontend error with location in the source
#[derive(Clone, Debug, Error, Diagnostic)]
#[error("{kind}")]
#[diagnostic(code(verilog::parser))]
pub struct ParseError {
	pub kind: ParseErrorKind,

	#[label("here")]
	pub span: SourceSpan,
}

impl ParseError {
	pub fn new(kind: ParseErrorKind, span: SourceSpan) -> Self {
		Self { kind, span }
	}
}
