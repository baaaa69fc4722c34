use std::ops::Range;

/// Byte range of a token or construct in Verilog source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceSpan {
	start: usize,
	end: usize,
}

impl SourceSpan {
	pub fn new(offset: usize, len: usize) -> SourceSpan {
		SourceSpan {
			start: offset,
			end: offset + len,
		}
	}

	/// Zero-length span, used for errors at the end of input
	pub fn empty_at(offset: usize) -> SourceSpan {
		SourceSpan::new(offset, 0)
	}

	pub fn start(&self) -> usize {
		self.start
	}

	pub fn end(&self) -> usize {
		self.end
	}

	/// Span from the start of `self` to the end of `last`
	pub fn join(&self, last: SourceSpan) -> SourceSpan {
		SourceSpan {
			start: self.start.min(last.start),
			end: self.end.max(last.end),
		}
	}

	/// Source text covered by the span
	pub fn text<'src>(&self, source: &'src str) -> &'src str {
		&source[self.start..self.end]
	}
}

impl From<Range<usize>> for SourceSpan {
	fn from(range: Range<usize>) -> Self {
		SourceSpan {
			start: range.start,
			end: range.end,
		}
	}
}

impl From<SourceSpan> for miette::SourceSpan {
	fn from(span: SourceSpan) -> Self {
		(span.start, span.end - span.start).into()
	}
}
