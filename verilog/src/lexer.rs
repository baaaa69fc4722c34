use crate::{ParseError, ParseErrorKind, SourceSpan};
use logos::{FilterResult, Logos, Skip};

/// Errors produced inside token callbacks, picked up by [`tokenize`]
#[derive(Default)]
pub struct LexerContext {
	last_err: Option<ParseErrorKind>,
}

/// Causes lexer to consume and ignore multi-line comments (/* */)
fn consume_block_comment(lex: &mut logos::Lexer<TokenKind>) -> FilterResult<(), ()> {
	match lex.remainder().find("*/") {
		Some(offset) => {
			lex.bump(offset + 2);
			FilterResult::Skip
		},
		None => {
			lex.extras.last_err = Some(ParseErrorKind::UnterminatedBlockComment);
			FilterResult::Error(())
		},
	}
}

/// Consumes the rest of the line. Used for comments and compiler directives.
fn consume_line(lex: &mut logos::Lexer<TokenKind>) -> Skip {
	match lex.remainder().find('\n') {
		Some(offset) => lex.bump(offset + 1),
		None => lex.bump(lex.remainder().len()),
	}
	Skip
}

fn parse_decimal(lex: &mut logos::Lexer<TokenKind>) -> Option<u64> {
	let value = lex.slice().replace('_', "").parse::<u64>().ok();
	if value.is_none() {
		lex.extras.last_err = Some(ParseErrorKind::InvalidNumber);
	}
	value
}

/// Keywords which matter for module structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordKind {
	Module,
	Endmodule,
	Input,
	Output,
	Inout,
	Wire,
	Reg,
	Logic,
	Signed,
	Begin,
	End,
	Case,
	Endcase,
	Function,
	Endfunction,
	Task,
	Endtask,
	Generate,
	Endgenerate,
	Fork,
	Join,
	Else,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunctuatorKind {
	AttrOpen,   // (*
	AttrClose,  // *)
	StarParen,  // (*) as in @(*)
	Assignment, // =
	Comma,      // ,
	Semicolon,  // ;
	Colon,      // :
	Dot,        // .
	Hash,       // #
	At,         // @
	LPar,       // (
	RPar,       // )
	LBracket,   // [
	RBracket,   // ]
	LBrace,     // {
	RBrace,     // }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(extras = LexerContext)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
	#[token("/*", consume_block_comment)]
	#[token("//", consume_line)]
	#[token("`", consume_line)]
	Ignored,

	#[regex(r"[a-zA-Z_][a-zA-Z0-9_$]*", |lex| lex.slice().to_owned())]
	Id(String),

	#[regex(r"\\[^ \t\r\n\f]+", |lex| lex.slice().to_owned())]
	EscapedId(String),

	#[regex(r"\$[a-zA-Z0-9_$]+", |lex| lex.slice().to_owned())]
	SystemId(String),

	#[regex(r"[0-9][0-9_]*", parse_decimal)]
	Number(u64),

	#[regex(r"([0-9][0-9_]*)?'[sS]?[bBoOdDhH][0-9a-fA-FxXzZ?_]+", |lex| lex.slice().to_owned())]
	SizedNumber(String),

	#[regex(r#""([^"\\\n]|\\.)*""#, |lex| lex.slice().to_owned())]
	Str(String),

	#[token("module",      |_| KeywordKind::Module)]
	#[token("macromodule", |_| KeywordKind::Module)]
	#[token("endmodule",   |_| KeywordKind::Endmodule)]
	#[token("input",       |_| KeywordKind::Input)]
	#[token("output",      |_| KeywordKind::Output)]
	#[token("inout",       |_| KeywordKind::Inout)]
	#[token("wire",        |_| KeywordKind::Wire)]
	#[token("reg",         |_| KeywordKind::Reg)]
	#[token("logic",       |_| KeywordKind::Logic)]
	#[token("signed",      |_| KeywordKind::Signed)]
	#[token("begin",       |_| KeywordKind::Begin)]
	#[token("end",         |_| KeywordKind::End)]
	#[token("case",        |_| KeywordKind::Case)]
	#[token("casex",       |_| KeywordKind::Case)]
	#[token("casez",       |_| KeywordKind::Case)]
	#[token("endcase",     |_| KeywordKind::Endcase)]
	#[token("function",    |_| KeywordKind::Function)]
	#[token("endfunction", |_| KeywordKind::Endfunction)]
	#[token("task",        |_| KeywordKind::Task)]
	#[token("endtask",     |_| KeywordKind::Endtask)]
	#[token("generate",    |_| KeywordKind::Generate)]
	#[token("endgenerate", |_| KeywordKind::Endgenerate)]
	#[token("fork",        |_| KeywordKind::Fork)]
	#[token("join",        |_| KeywordKind::Join)]
	#[token("join_any",    |_| KeywordKind::Join)]
	#[token("join_none",   |_| KeywordKind::Join)]
	#[token("else",        |_| KeywordKind::Else)]
	Keyword(KeywordKind),

	#[token("(*",  |_| PunctuatorKind::AttrOpen)]
	#[token("*)",  |_| PunctuatorKind::AttrClose)]
	#[token("(*)", |_| PunctuatorKind::StarParen)]
	#[token("=",   |_| PunctuatorKind::Assignment)]
	#[token(",",   |_| PunctuatorKind::Comma)]
	#[token(";",   |_| PunctuatorKind::Semicolon)]
	#[token(":",   |_| PunctuatorKind::Colon)]
	#[token(".",   |_| PunctuatorKind::Dot)]
	#[token("#",   |_| PunctuatorKind::Hash)]
	#[token("@",   |_| PunctuatorKind::At)]
	#[token("(",   |_| PunctuatorKind::LPar)]
	#[token(")",   |_| PunctuatorKind::RPar)]
	#[token("[",   |_| PunctuatorKind::LBracket)]
	#[token("]",   |_| PunctuatorKind::RBracket)]
	#[token("{",   |_| PunctuatorKind::LBrace)]
	#[token("}",   |_| PunctuatorKind::RBrace)]
	Punctuator(PunctuatorKind),

	/// Any other operator. Only relevant inside opaque module items.
	#[regex(r"[+\-*/%<>!=&|^~?']+", |lex| lex.slice().to_owned(), priority = 1)]
	Operator(String),
}

/// Lexer token with its location
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
	pub kind: TokenKind,
	pub span: SourceSpan,
}

/// Splits Verilog source into tokens, skipping whitespace, comments and directives
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
	let mut lexer = TokenKind::lexer(source);
	let mut tokens = Vec::new();

	while let Some(token_result) = lexer.next() {
		let span = SourceSpan::from(lexer.span());
		match token_result {
			Ok(TokenKind::Ignored) => {},
			Ok(kind) => tokens.push(Token { kind, span }),
			Err(()) => {
				let kind = lexer.extras.last_err.take().unwrap_or(ParseErrorKind::InvalidToken);
				return Err(ParseError::new(kind, span));
			},
		}
	}

	Ok(tokens)
}
