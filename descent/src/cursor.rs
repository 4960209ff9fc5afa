//! Input tracking for the parser.

/// A span in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// The start of the span, inclusive
    pub start: usize,
    /// The end of the span, exclusive
    pub end: usize,
}

/// A saved location in the input.
///
/// `row` and `column` are 1-based, `column` counts symbols (not bytes) from the
/// start of the line. `line_start` is the byte offset of the first symbol of the
/// current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub offset: usize,
    pub row: usize,
    pub column: usize,
    pub line_start: usize,
}

impl Position {
    fn start() -> Self {
        Self {
            offset: 0,
            row: 1,
            column: 1,
            line_start: 0,
        }
    }
}

/// A cursor over the input of a single parse run.
///
/// Besides the current position, the cursor owns a stack of checkpoints used
/// for speculative parsing. Checkpoints nest strictly: every
/// [`checkpoint`](Cursor::checkpoint) must be paired with exactly one
/// [`backtrack`](Cursor::backtrack) (restore the saved position) or
/// [`commit`](Cursor::commit) (keep the current position).
///
/// ```
/// # use descent::Cursor;
/// let mut cursor = Cursor::new("ab");
/// cursor.checkpoint();
/// assert_eq!(cursor.advance(), Some('a'));
/// cursor.backtrack();
/// assert_eq!(cursor.peek(), Some('a'));
/// ```
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: Position,
    checkpoints: Vec<Position>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: Position::start(),
            checkpoints: Vec::new(),
        }
    }

    /// The current symbol, or `None` at the end of the input.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.input[self.pos.offset..].chars().next()
    }

    /// Consume one symbol and return it.
    ///
    /// A newline moves to the first column of the next row. At the end of the
    /// input this does nothing and returns `None`.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos.offset += c.len_utf8();
        if c == '\n' {
            self.pos.row += 1;
            self.pos.column = 1;
            self.pos.line_start = self.pos.offset;
        } else {
            self.pos.column += 1;
        }
        Some(c)
    }

    /// Advance symbol by symbol until the byte offset `offset` is reached.
    pub fn advance_to(&mut self, offset: usize) {
        while self.pos.offset < offset && self.advance().is_some() {}
    }

    /// Save the current position on the checkpoint stack.
    pub fn checkpoint(&mut self) {
        self.checkpoints.push(self.pos);
    }

    /// Pop the last checkpoint and return to it.
    ///
    /// # Panics
    /// Panics if there is no pending checkpoint.
    pub fn backtrack(&mut self) {
        match self.checkpoints.pop() {
            Some(pos) => self.pos = pos,
            None => panic!("backtrack without a pending checkpoint"),
        }
    }

    /// Pop the last checkpoint, keeping the current position.
    ///
    /// # Panics
    /// Panics if there is no pending checkpoint.
    pub fn commit(&mut self) {
        if self.checkpoints.pop().is_none() {
            panic!("commit without a pending checkpoint");
        }
    }

    /// Number of pending checkpoints.
    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// Byte offset of the current symbol.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos.offset
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    /// The whole input.
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// The input from the current symbol onwards.
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos.offset..]
    }

    /// Whether the cursor is at the end of the input.
    pub fn is_empty(&self) -> bool {
        self.pos.offset >= self.input.len()
    }

    /// The text of the line containing `pos`, without its line terminator.
    pub fn line(&self, pos: Position) -> &'a str {
        let line = &self.input[pos.line_start..];
        match line.find('\n') {
            Some(end) => &line[..end],
            None => line,
        }
    }

    /// The span between `start` and the current position.
    pub fn span_from(&self, start: Position) -> Span {
        Span {
            start: start.offset,
            end: self.pos.offset,
        }
    }
}
