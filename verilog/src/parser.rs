use crate::lexer::{tokenize, KeywordKind, PunctuatorKind, Token, TokenKind};
use crate::{ParseError, ParseErrorKind, SourceSpan};
use hirn::{
	AttrValue, Attributes, BitRange, Design, DesignError, IdString, Module, NetNameConflictError, Port, PortDirection,
	Wire,
};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Parses every module in `source` into a new design
pub fn parse_design(source: &str) -> Result<Design, ParseError> {
	let mut parser = Parser::new(source, tokenize(source)?);
	let mut design = Design::new();

	while !parser.at_end() {
		let attributes = parser.attributes()?;
		let span = parser.peek_span();
		let module = parser.module(attributes)?;
		debug!("Parsed module {} ({} ports)", module.name(), module.ports().len());
		design
			.add_module(module)
			.map_err(|err| ParseError::new(err.into(), span))?;
	}

	Ok(design)
}

/// Net properties shared by a declaration list (`input signed [7:0] a, b`)
#[derive(Clone, Copy)]
struct NetDeclaration {
	direction: Option<PortDirection>,
	is_reg: bool,
	signed: bool,
	range: Option<BitRange>,
}

/// Ports of the module being parsed, collected until the whole body is seen
#[derive(Default)]
struct PortTable {
	/// Port names in header order
	order: Vec<(IdString, SourceSpan)>,
	declared: HashMap<IdString, Port>,
	reg_names: HashSet<IdString>,

	/// Attributes attached to names in a non-ANSI header
	header_attributes: HashMap<IdString, Attributes>,
}

impl PortTable {
	fn contains(&self, name: &IdString) -> bool {
		self.order.iter().any(|(n, _)| n == name)
	}

	/// Builds the final port list in header order
	fn into_ports(mut self) -> Result<Vec<Port>, ParseError> {
		let mut ports = vec![];
		for (name, span) in self.order {
			let mut port = self
				.declared
				.remove(&name)
				.ok_or_else(|| ParseError::new(ParseErrorKind::MissingPortDirection(name.to_string()), span))?;

			if self.reg_names.contains(&name) {
				port.is_reg = true;
			}
			if let Some(attributes) = self.header_attributes.remove(&name) {
				for (key, value) in attributes.iter() {
					port.attributes.set(key, value.clone());
				}
			}
			ports.push(port);
		}
		Ok(ports)
	}
}

fn unquote(literal: &str) -> String {
	let inner = &literal[1..literal.len() - 1];
	let mut result = String::with_capacity(inner.len());
	let mut chars = inner.chars();
	while let Some(c) = chars.next() {
		match c {
			'\\' => match chars.next() {
				Some('n') => result.push('\n'),
				Some('t') => result.push('\t'),
				Some(other) => result.push(other),
				None => {},
			},
			c => result.push(c),
		}
	}
	result
}

/// Parses sized literals such as `8'hff` or `32'sd7`
fn parse_sized_number(literal: &str) -> Option<i64> {
	let (_, value) = literal.split_once('\'')?;
	let value = value.trim_start_matches(['s', 'S']);
	let mut chars = value.chars();
	let radix = match chars.next()? {
		'b' | 'B' => 2,
		'o' | 'O' => 8,
		'd' | 'D' => 10,
		'h' | 'H' => 16,
		_ => return None,
	};
	let digits: String = chars.filter(|c| *c != '_').collect();
	i64::from_str_radix(&digits, radix).ok()
}

struct Parser<'src> {
	source: &'src str,
	tokens: Vec<Token>,
	pos: usize,
}

impl<'src> Parser<'src> {
	fn new(source: &'src str, tokens: Vec<Token>) -> Self {
		Self { source, tokens, pos: 0 }
	}

	fn at_end(&self) -> bool {
		self.pos >= self.tokens.len()
	}

	fn peek(&self) -> Option<&TokenKind> {
		self.tokens.get(self.pos).map(|t| &t.kind)
	}

	fn peek_span(&self) -> SourceSpan {
		match self.tokens.get(self.pos) {
			Some(t) => t.span,
			None => SourceSpan::empty_at(self.source.len()),
		}
	}

	fn peek_keyword(&self) -> Option<KeywordKind> {
		match self.peek() {
			Some(TokenKind::Keyword(k)) => Some(*k),
			_ => None,
		}
	}

	fn peek_punctuator(&self) -> Option<PunctuatorKind> {
		match self.peek() {
			Some(TokenKind::Punctuator(p)) => Some(*p),
			_ => None,
		}
	}

	fn next(&mut self, expected: &'static str) -> Result<Token, ParseError> {
		match self.tokens.get(self.pos) {
			Some(t) => {
				self.pos += 1;
				Ok(t.clone())
			},
			None => Err(self.error_eof(expected)),
		}
	}

	fn error_eof(&self, expected: &'static str) -> ParseError {
		ParseError::new(ParseErrorKind::UnexpectedEof(expected), self.peek_span())
	}

	fn error_unexpected(&self, expected: &'static str) -> ParseError {
		match self.at_end() {
			true => self.error_eof(expected),
			false => ParseError::new(ParseErrorKind::UnexpectedToken(expected), self.peek_span()),
		}
	}

	fn eat_punctuator(&mut self, kind: PunctuatorKind) -> bool {
		if self.peek_punctuator() == Some(kind) {
			self.pos += 1;
			return true;
		}
		false
	}

	fn eat_keyword(&mut self, kind: KeywordKind) -> bool {
		if self.peek_keyword() == Some(kind) {
			self.pos += 1;
			return true;
		}
		false
	}

	fn expect_punctuator(&mut self, kind: PunctuatorKind, expected: &'static str) -> Result<(), ParseError> {
		match self.eat_punctuator(kind) {
			true => Ok(()),
			false => Err(self.error_unexpected(expected)),
		}
	}

	fn identifier(&mut self) -> Result<(IdString, SourceSpan), ParseError> {
		let span = self.peek_span();
		let name = match self.peek() {
			Some(TokenKind::Id(name)) | Some(TokenKind::EscapedId(name)) => name.clone(),
			_ => return Err(self.error_unexpected("identifier")),
		};
		self.pos += 1;
		let id = IdString::new(&name).map_err(|err| ParseError::new(err.into(), span))?;
		Ok((id, span))
	}

	/// Parses any number of `(* ... *)` attribute lists
	fn attributes(&mut self) -> Result<Attributes, ParseError> {
		let mut attributes = Attributes::new();
		while self.eat_punctuator(PunctuatorKind::AttrOpen) {
			loop {
				let (key, _) = self.identifier()?;
				let value = match self.eat_punctuator(PunctuatorKind::Assignment) {
					true => self.attribute_value()?,
					false => AttrValue::Int(1),
				};
				attributes.set(key.unescaped(), value);

				if !self.eat_punctuator(PunctuatorKind::Comma) {
					break;
				}
			}
			self.expect_punctuator(PunctuatorKind::AttrClose, "`*)`")?;
		}
		Ok(attributes)
	}

	fn attribute_value(&mut self) -> Result<AttrValue, ParseError> {
		let negative = matches!(self.peek(), Some(TokenKind::Operator(op)) if op == "-");
		if negative {
			self.pos += 1;
		}

		let token = self.next("attribute value")?;
		let invalid = || ParseError::new(ParseErrorKind::InvalidNumber, token.span);
		let value = match &token.kind {
			TokenKind::Str(s) if !negative => return Ok(AttrValue::Str(unquote(s))),
			TokenKind::Number(n) => i64::try_from(*n).map_err(|_| invalid())?,
			TokenKind::SizedNumber(s) => parse_sized_number(s).ok_or_else(invalid)?,
			_ => return Err(ParseError::new(ParseErrorKind::UnexpectedToken("attribute value"), token.span)),
		};

		Ok(AttrValue::Int(if negative { -value } else { value }))
	}

	fn range_bound(&mut self, range_span: SourceSpan) -> Result<u64, ParseError> {
		match self.next("range bound")?.kind {
			TokenKind::Number(n) => Ok(n),
			_ => Err(ParseError::new(ParseErrorKind::UnsupportedRange, range_span)),
		}
	}

	/// Parses an optional constant `[msb:lsb]` range
	fn range(&mut self) -> Result<Option<BitRange>, ParseError> {
		let start = self.peek_span();
		if !self.eat_punctuator(PunctuatorKind::LBracket) {
			return Ok(None);
		}

		let msb = self.range_bound(start)?;
		if !self.eat_punctuator(PunctuatorKind::Colon) {
			return Err(ParseError::new(ParseErrorKind::UnsupportedRange, start));
		}
		let lsb = self.range_bound(start)?;
		self.expect_punctuator(PunctuatorKind::RBracket, "`]`")?;

		let range = BitRange::new(msb, lsb).map_err(|_| ParseError::new(ParseErrorKind::UnsupportedRange, start))?;
		Ok(Some(range))
	}

	/// Parses `[direction] [wire|reg|logic] [signed] [range]`
	fn net_declaration(&mut self) -> Result<NetDeclaration, ParseError> {
		let direction = match self.peek_keyword() {
			Some(KeywordKind::Input) => Some(PortDirection::Input),
			Some(KeywordKind::Output) => Some(PortDirection::Output),
			Some(KeywordKind::Inout) => Some(PortDirection::Inout),
			_ => None,
		};
		if direction.is_some() {
			self.pos += 1;
		}

		let is_reg = match self.peek_keyword() {
			Some(KeywordKind::Reg) => true,
			Some(KeywordKind::Wire) | Some(KeywordKind::Logic) => false,
			_ if direction.is_some() => {
				return self.net_tail(direction, false);
			},
			_ => return Err(self.error_unexpected("net declaration")),
		};
		self.pos += 1;
		self.net_tail(direction, is_reg)
	}

	fn net_tail(&mut self, direction: Option<PortDirection>, is_reg: bool) -> Result<NetDeclaration, ParseError> {
		let signed = self.eat_keyword(KeywordKind::Signed);
		let range = self.range()?;
		Ok(NetDeclaration {
			direction,
			is_reg,
			signed,
			range,
		})
	}

	fn make_port(
		&self,
		name: &IdString,
		decl: NetDeclaration,
		attributes: Attributes,
		span: SourceSpan,
	) -> Result<Port, ParseError> {
		let direction = decl
			.direction
			.ok_or_else(|| ParseError::new(ParseErrorKind::MissingPortDirection(name.to_string()), span))?;
		let mut port = Port::new(name.as_str(), direction, 1)
			.map_err(|err| ParseError::new(err.into(), span))?
			.with_range(decl.range);
		port.signed = decl.signed;
		port.is_reg = decl.is_reg;
		port.attributes = attributes;
		Ok(port)
	}

	/// Parses the port list in the module header (ANSI or non-ANSI style)
	fn port_list(&mut self, module: &IdString, table: &mut PortTable) -> Result<(), ParseError> {
		if self.eat_punctuator(PunctuatorKind::RPar) {
			return Ok(());
		}

		let mut current: Option<NetDeclaration> = None;
		loop {
			let attributes = self.attributes()?;
			if matches!(
				self.peek_keyword(),
				Some(KeywordKind::Input) | Some(KeywordKind::Output) | Some(KeywordKind::Inout)
			) {
				current = Some(self.net_declaration()?);
			}

			let (name, span) = self.identifier()?;
			if table.contains(&name) {
				let err = NetNameConflictError {
					module: module.clone(),
					net: name.clone(),
				};
				return Err(ParseError::new(DesignError::from(err).into(), span));
			}

			match current {
				Some(decl) => {
					let port = self.make_port(&name, decl, attributes, span)?;
					table.declared.insert(name.clone(), port);
				},
				None => {
					table.header_attributes.insert(name.clone(), attributes);
				},
			}
			table.order.push((name, span));

			if !self.eat_punctuator(PunctuatorKind::Comma) {
				break;
			}
		}

		self.expect_punctuator(PunctuatorKind::RPar, "`)`")
	}

	/// Checks whether the declaration starting at the current token only names
	/// plain nets, without initializers (`wire a = b;`) or unpacked
	/// dimensions (`reg [7:0] mem [0:3];`)
	fn is_plain_net_declaration(&self) -> bool {
		let kinds: Vec<&TokenKind> = self.tokens[self.pos..]
			.iter()
			.map(|t| &t.kind)
			.take_while(|k| **k != TokenKind::Punctuator(PunctuatorKind::Semicolon))
			.collect();

		let has_initializer = kinds
			.iter()
			.any(|k| **k == TokenKind::Punctuator(PunctuatorKind::Assignment));
		let has_array = kinds.windows(2).any(|pair| {
			matches!(pair[0], TokenKind::Id(_) | TokenKind::EscapedId(_))
				&& *pair[1] == TokenKind::Punctuator(PunctuatorKind::LBracket)
		});
		!has_initializer && !has_array
	}

	/// Consumes a module item of unknown structure and returns its span
	fn opaque_item(&mut self) -> Result<SourceSpan, ParseError> {
		use KeywordKind::*;
		use PunctuatorKind::*;

		let start = self.peek_span();
		let mut nesting = 0usize;
		let mut parens = 0usize;

		loop {
			let token = self.next("`;` or `end`")?;
			let mut item_done = false;
			match token.kind {
				TokenKind::Keyword(Endmodule) => {
					return Err(ParseError::new(ParseErrorKind::UnexpectedToken("`;` or `end`"), token.span))
				},
				TokenKind::Keyword(Begin | Case | Function | Task | Generate | Fork) => nesting += 1,
				TokenKind::Keyword(End | Endcase | Endfunction | Endtask | Endgenerate | Join) => {
					nesting = nesting.saturating_sub(1);
					item_done = nesting == 0 && parens == 0;
				},
				TokenKind::Punctuator(LPar | LBracket | LBrace | AttrOpen) => parens += 1,
				TokenKind::Punctuator(RPar | RBracket | RBrace | AttrClose) => parens = parens.saturating_sub(1),
				TokenKind::Punctuator(Semicolon) => item_done = nesting == 0 && parens == 0,
				_ => {},
			}

			if item_done && self.peek_keyword() != Some(Else) {
				return Ok(start.join(token.span));
			}
		}
	}

	/// Parses a single module, starting at the `module` keyword
	fn module(&mut self, attributes: Attributes) -> Result<Module, ParseError> {
		if !self.eat_keyword(KeywordKind::Module) {
			return Err(self.error_unexpected("`module`"));
		}

		let (name, name_span) = self.identifier()?;
		let mut module = Module::new(name.as_str()).map_err(|err| ParseError::new(err.into(), name_span))?;
		module.attributes = attributes;

		if self.peek_punctuator() == Some(PunctuatorKind::Hash) {
			return Err(ParseError::new(ParseErrorKind::UnsupportedParameters, self.peek_span()));
		}

		let mut table = PortTable::default();
		if self.eat_punctuator(PunctuatorKind::LPar) {
			self.port_list(&name, &mut table)?;
		}
		self.expect_punctuator(PunctuatorKind::Semicolon, "`;`")?;

		let mut wires = vec![];
		loop {
			if self.eat_keyword(KeywordKind::Endmodule) {
				break;
			}
			if self.at_end() {
				return Err(self.error_eof("`endmodule`"));
			}

			let item_start = self.pos;
			let attributes = self.attributes()?;
			match self.peek_keyword() {
				Some(KeywordKind::Input | KeywordKind::Output | KeywordKind::Inout) => {
					let decl = self.net_declaration()?;
					loop {
						let (name, span) = self.identifier()?;
						if !table.contains(&name) {
							return Err(ParseError::new(ParseErrorKind::UndeclaredPort(name.to_string()), span));
						}
						if table.declared.contains_key(&name) {
							let err = NetNameConflictError {
								module: module.name().clone(),
								net: name.clone(),
							};
							return Err(ParseError::new(DesignError::from(err).into(), span));
						}
						let port = self.make_port(&name, decl, attributes.clone(), span)?;
						table.declared.insert(name, port);

						if !self.eat_punctuator(PunctuatorKind::Comma) {
							break;
						}
					}
					self.expect_punctuator(PunctuatorKind::Semicolon, "`;`")?;
				},
				Some(KeywordKind::Wire | KeywordKind::Reg | KeywordKind::Logic) if self.is_plain_net_declaration() => {
					let decl = self.net_declaration()?;
					loop {
						let (name, span) = self.identifier()?;
						if table.contains(&name) {
							if decl.is_reg {
								table.reg_names.insert(name.clone());
							}
							let target = table.header_attributes.entry(name).or_default();
							for (key, value) in attributes.iter() {
								target.set(key, value.clone());
							}
						}
						else {
							let mut wire = Wire::new(name.as_str(), 1).map_err(|err| ParseError::new(err.into(), span))?;
							wire.range = decl.range;
							wire.signed = decl.signed;
							wire.is_reg = decl.is_reg;
							wire.attributes = attributes.clone();
							wires.push((wire, span));
						}

						if !self.eat_punctuator(PunctuatorKind::Comma) {
							break;
						}
					}
					self.expect_punctuator(PunctuatorKind::Semicolon, "`;`")?;
				},
				_ => {
					let last = self.opaque_item()?;
					let span = self.tokens[item_start].span.join(last);
					module.add_statement(span.text(self.source));
				},
			}
		}

		for port in table.into_ports()? {
			module.add_port(port).map_err(|err| ParseError::new(err.into(), name_span))?;
		}
		for (wire, span) in wires {
			module.add_wire(wire).map_err(|err| ParseError::new(err.into(), span))?;
		}

		Ok(module)
	}
}
