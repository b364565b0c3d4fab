//! Fused source reader and scanner (spec §4.3, §4.4).
//!
//! `Reader` owns an append-only stack of source buffers (one per file opened
//! via `import`) and the cursor over whichever buffer is currently active.
//! Fusing the reader and scanner into one struct is what lets `save`/`jump`
//! resynchronize token position and indentation state atomically, per the
//! §4.3 invariant.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use unicode_xid::UnicodeXID;
use wick_common::{Position, Span, WickError, WickResult};

use crate::token::TokenType;

/// One opened source file. Buffers are never removed once read so that a
/// `ReaderPosition` captured while file `file_id` was active stays valid
/// (and jumpable) even after control returns to an outer file.
struct FileBuffer {
    path: PathBuf,
    content: Rc<str>,
}

/// A first-class, resumable point in the source stream (spec §3 `position`,
/// §4.3). Refcounted like any other value by `wick_values::Value::Position`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderPosition {
    pub file_id: usize,
    pub offset: usize,
    pub line: u32,
    pub column: u32,
    pub token: TokenType,
    pub lexeme: String,
    indent_stack: Vec<u32>,
    pending_dedents: u32,
    at_line_start: bool,
}

/// The fused reader/scanner. Exposes `token()`/`string()`/`next()` (the
/// "Scanner" interface of spec §4.4) and `reset`/`save`/`jump`/`import` (the
/// "Reader" interface of spec §4.3) on the same type.
pub struct Reader {
    files: Vec<FileBuffer>,
    active_file: usize,
    offset: usize,
    line: u32,
    column: u32,
    indent_stack: Vec<u32>,
    pending_dedents: u32,
    at_line_start: bool,
    token: TokenType,
    lexeme: String,
}

impl Reader {
    /// Start reading `path` as file 0.
    pub fn open(path: impl AsRef<Path>) -> WickResult<Self> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path).map_err(|e| {
            WickError::system(format!("failed to read {}: {e}", path.display()), Span::single(Position::start(), 0))
        })?;
        Ok(Self {
            files: vec![FileBuffer { path, content: Rc::from(content.as_str()) }],
            active_file: 0,
            offset: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            token: TokenType::EndMarker,
            lexeme: String::new(),
        })
    }

    /// Start reading already-loaded source text as file 0. Used by tests and
    /// by any embedder that doesn't want to go through the filesystem.
    pub fn from_source(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            files: vec![FileBuffer { path: path.into(), content: Rc::from(source.into().as_str()) }],
            active_file: 0,
            offset: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            token: TokenType::EndMarker,
            lexeme: String::new(),
        }
    }

    pub fn token(&self) -> &TokenType {
        &self.token
    }

    pub fn string(&self) -> &str {
        &self.lexeme
    }

    pub fn file_path(&self, file_id: usize) -> &Path {
        &self.files[file_id].path
    }

    /// The file currently under the cursor, for resolving `import` paths
    /// relative to the importing file (spec §4.5.13).
    pub fn active_file_id(&self) -> usize {
        self.active_file
    }

    pub fn current_span(&self) -> Span {
        Span::single(Position::new(self.line, self.column, self.offset as u32), self.active_file as u32)
    }

    /// Rewind the currently active file to its start (§4.3 `reset`).
    pub fn reset(&mut self) {
        self.offset = 0;
        self.line = 1;
        self.column = 1;
        self.indent_stack = vec![0];
        self.pending_dedents = 0;
        self.at_line_start = true;
        self.token = TokenType::EndMarker;
        self.lexeme.clear();
    }

    /// Snapshot enough state to resume tokenization at exactly this point
    /// (§4.3 `save`).
    pub fn save(&self) -> ReaderPosition {
        ReaderPosition {
            file_id: self.active_file,
            offset: self.offset,
            line: self.line,
            column: self.column,
            token: self.token.clone(),
            lexeme: self.lexeme.clone(),
            indent_stack: self.indent_stack.clone(),
            pending_dedents: self.pending_dedents,
            at_line_start: self.at_line_start,
        }
    }

    /// Restore the reader to a previously saved position (§4.3 `jump`). The
    /// *next* call to `next()` yields the token that was current when `save`
    /// ran, since `jump` restores `token`/`lexeme` directly.
    pub fn jump(&mut self, pos: &ReaderPosition) {
        self.active_file = pos.file_id;
        self.offset = pos.offset;
        self.line = pos.line;
        self.column = pos.column;
        self.token = pos.token.clone();
        self.lexeme = pos.lexeme.clone();
        self.indent_stack = pos.indent_stack.clone();
        self.pending_dedents = pos.pending_dedents;
        self.at_line_start = pos.at_line_start;
    }

    /// Push a new source file and switch the active cursor to it (§4.3
    /// `import`). The caller is responsible for resuming at the position it
    /// saved before calling this, once the imported file's `EndMarker` has
    /// been reached.
    pub fn import(&mut self, path: impl AsRef<Path>) -> WickResult<()> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path)
            .map_err(|e| WickError::system(format!("failed to import {}: {e}", path.display()), self.current_span()))?;
        self.files.push(FileBuffer { path, content: Rc::from(content.as_str()) });
        self.active_file = self.files.len() - 1;
        self.offset = 0;
        self.line = 1;
        self.column = 1;
        self.indent_stack = vec![0];
        self.pending_dedents = 0;
        self.at_line_start = true;
        self.token = TokenType::EndMarker;
        self.lexeme.clear();
        Ok(())
    }

    fn content(&self) -> &str {
        &self.files[self.active_file].content
    }

    fn is_at_end(&self) -> bool {
        self.offset >= self.content().len()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.content().as_bytes().get(self.offset).copied()
    }

    fn peek_byte_at(&self, delta: usize) -> Option<u8> {
        self.content().as_bytes().get(self.offset + delta).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.content()[self.offset..].chars().next()
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.offset += ch.len_utf8();
        self.column += 1;
        Some(ch)
    }

    fn advance_newline(&mut self) {
        self.offset += 1;
        self.line += 1;
        self.column = 1;
    }

    /// Advance past this logical line's `Newline`/`Indent`/`Dedent`
    /// bookkeeping and produce the next token (§4.4, indentation algorithm
    /// supplementing §4.4 per SPEC_FULL).
    pub fn next(&mut self) -> WickResult<()> {
        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            self.token = TokenType::Dedent;
            self.lexeme.clear();
            return Ok(());
        }

        if self.at_line_start {
            self.skip_blank_lines();
            if self.is_at_end() {
                return self.drain_to_end_marker();
            }
            return self.measure_indentation();
        }

        self.scan_token()
    }

    /// Skip lines that are empty or contain only whitespace; they never
    /// participate in indentation measurement.
    fn skip_blank_lines(&mut self) {
        loop {
            let line_start = self.offset;
            let mut cursor = self.offset;
            let bytes = self.content().as_bytes();
            while cursor < bytes.len() && (bytes[cursor] == b' ' || bytes[cursor] == b'\t') {
                cursor += 1;
            }
            if cursor < bytes.len() && bytes[cursor] == b'\n' {
                self.column += (cursor - line_start) as u32;
                self.offset = cursor;
                self.advance_newline();
                continue;
            }
            break;
        }
    }

    fn drain_to_end_marker(&mut self) -> WickResult<()> {
        if self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.token = TokenType::Dedent;
            self.lexeme.clear();
            return Ok(());
        }
        self.token = TokenType::EndMarker;
        self.lexeme.clear();
        Ok(())
    }

    fn measure_indentation(&mut self) -> WickResult<()> {
        let mut width = 0u32;
        let mut saw_space = false;
        let mut saw_tab = false;
        loop {
            match self.peek_byte() {
                Some(b' ') => {
                    saw_space = true;
                    width += 1;
                    self.offset += 1;
                    self.column += 1;
                }
                Some(b'\t') => {
                    saw_tab = true;
                    width += 8;
                    self.offset += 1;
                    self.column += 1;
                }
                _ => break,
            }
        }
        if saw_space && saw_tab {
            return Err(WickError::syntax("inconsistent tabs and spaces in indentation", self.current_span()));
        }
        self.at_line_start = false;

        let top = *self.indent_stack.last().unwrap();
        if width > top {
            self.indent_stack.push(width);
            self.token = TokenType::Indent;
            self.lexeme.clear();
            return Ok(());
        }
        if width < top {
            let mut pops = 0u32;
            while *self.indent_stack.last().unwrap() > width {
                self.indent_stack.pop();
                pops += 1;
            }
            if *self.indent_stack.last().unwrap() != width {
                return Err(WickError::syntax("dedent does not match any outer indentation level", self.current_span()));
            }
            self.pending_dedents = pops - 1;
            self.token = TokenType::Dedent;
            self.lexeme.clear();
            return Ok(());
        }
        self.scan_token()
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek_byte(), Some(b' ') | Some(b'\t') | Some(b'\r')) {
            self.offset += 1;
            self.column += 1;
        }
    }

    fn scan_token(&mut self) -> WickResult<()> {
        self.skip_inline_whitespace();

        if self.is_at_end() {
            return self.drain_to_end_marker();
        }

        let start_span = self.current_span();
        let ch = self.peek_char().unwrap();

        if ch == '\n' {
            self.advance_newline();
            self.at_line_start = true;
            self.token = TokenType::Newline;
            self.lexeme.clear();
            return Ok(());
        }

        if ch.is_ascii_digit() {
            return self.scan_number();
        }
        if ch.is_xid_start() || ch == '_' {
            return self.scan_identifier();
        }
        if ch == '"' {
            return self.scan_string(start_span);
        }
        if ch == '\'' {
            return self.scan_char(start_span);
        }

        self.advance_char();
        let tok = match ch {
            '+' => TokenType::Plus,
            '-' => TokenType::Minus,
            '*' => TokenType::Star,
            '/' => TokenType::Slash,
            '%' => TokenType::Percent,
            '(' => TokenType::LParen,
            ')' => TokenType::RParen,
            '[' => TokenType::LBracket,
            ']' => TokenType::RBracket,
            ':' => TokenType::Colon,
            ',' => TokenType::Comma,
            '!' => {
                if self.peek_byte() == Some(b'=') {
                    self.advance_char();
                    TokenType::NotEq
                } else {
                    TokenType::Bang
                }
            }
            '=' => {
                if self.peek_byte() == Some(b'=') {
                    self.advance_char();
                    TokenType::Eq
                } else {
                    TokenType::Assign
                }
            }
            '<' => {
                if self.peek_byte() == Some(b'=') {
                    self.advance_char();
                    TokenType::LtEq
                } else if self.peek_byte() == Some(b'>') {
                    self.advance_char();
                    TokenType::AltNotEq
                } else {
                    TokenType::Lt
                }
            }
            '>' => {
                if self.peek_byte() == Some(b'=') {
                    self.advance_char();
                    TokenType::GtEq
                } else {
                    TokenType::Gt
                }
            }
            other => return Err(WickError::syntax(format!("unexpected character '{other}'"), start_span)),
        };
        self.token = tok;
        self.lexeme.clear();
        Ok(())
    }

    fn scan_identifier(&mut self) -> WickResult<()> {
        let start = self.offset;
        while let Some(ch) = self.peek_char() {
            if ch.is_xid_continue() || ch == '_' {
                self.advance_char();
            } else {
                break;
            }
        }
        let word = &self.content()[start..self.offset];
        self.token = TokenType::keyword(word).unwrap_or_else(|| TokenType::Identifier(word.to_string()));
        self.lexeme = word.to_string();
        Ok(())
    }

    fn scan_number(&mut self) -> WickResult<()> {
        let start = self.offset;
        while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
            self.advance_char();
        }
        let is_float = self.peek_byte() == Some(b'.') && matches!(self.peek_byte_at(1), Some(b) if b.is_ascii_digit());
        if is_float {
            self.advance_char();
            while matches!(self.peek_byte(), Some(b) if b.is_ascii_digit()) {
                self.advance_char();
            }
            let text = &self.content()[start..self.offset];
            let value: f64 = text
                .parse()
                .map_err(|_| WickError::syntax(format!("invalid float literal '{text}'"), self.current_span()))?;
            self.lexeme = text.to_string();
            self.token = TokenType::Float(value);
        } else {
            let text = &self.content()[start..self.offset];
            let value: i64 = text
                .parse()
                .map_err(|_| WickError::syntax(format!("invalid integer literal '{text}'"), self.current_span()))?;
            self.lexeme = text.to_string();
            self.token = TokenType::Int(value);
        }
        Ok(())
    }

    /// The only legal escapes in char/string literals (spec §4.1).
    fn scan_escape(&mut self, span: Span) -> WickResult<u8> {
        let ch = self.advance_char().ok_or_else(|| WickError::value("unterminated escape sequence", span))?;
        Ok(match ch {
            '0' => 0,
            'b' => 0x08,
            'f' => 0x0c,
            'n' => b'\n',
            'r' => b'\r',
            't' => b'\t',
            'v' => 0x0b,
            '\\' => b'\\',
            '\'' => b'\'',
            '"' => b'"',
            other => return Err(WickError::value(format!("invalid escape sequence '\\{other}'"), span)),
        })
    }

    fn scan_char(&mut self, start_span: Span) -> WickResult<()> {
        self.advance_char(); // opening quote
        let byte = match self.peek_char() {
            Some('\\') => {
                self.advance_char();
                self.scan_escape(start_span)?
            }
            Some(c) => {
                self.advance_char();
                if !c.is_ascii() {
                    return Err(WickError::value("char literal must be one 8-bit code", start_span));
                }
                c as u8
            }
            None => return Err(WickError::value("unterminated char literal", start_span)),
        };
        if self.peek_char() != Some('\'') {
            return Err(WickError::value("char literal must contain exactly one character", start_span));
        }
        self.advance_char();
        self.token = TokenType::Char(byte);
        self.lexeme.clear();
        Ok(())
    }

    fn scan_string(&mut self, start_span: Span) -> WickResult<()> {
        self.advance_char(); // opening quote
        let mut value = Vec::new();
        loop {
            match self.peek_char() {
                None => return Err(WickError::value("unterminated string literal", start_span)),
                Some('"') => {
                    self.advance_char();
                    break;
                }
                Some('\\') => {
                    self.advance_char();
                    value.push(self.scan_escape(start_span)?);
                }
                Some('\n') => return Err(WickError::value("unterminated string literal", start_span)),
                Some(c) => {
                    self.advance_char();
                    let mut buf = [0u8; 4];
                    value.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                }
            }
        }
        self.lexeme = String::from_utf8_lossy(&value).into_owned();
        self.token = TokenType::Str(self.lexeme.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<TokenType> {
        let mut reader = Reader::from_source("test.wk", source);
        let mut out = Vec::new();
        loop {
            reader.next().unwrap();
            let tok = reader.token().clone();
            let done = tok == TokenType::EndMarker;
            out.push(tok);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn flat_block_has_no_indent_tokens() {
        let toks = tokens("int a = 1\nint b = 2\n");
        assert!(!toks.contains(&TokenType::Indent));
        assert!(!toks.contains(&TokenType::Dedent));
    }

    #[test]
    fn nested_block_brackets_with_indent_and_dedent() {
        let toks = tokens("if a\n    print a\nprint b\n");
        let indents = toks.iter().filter(|t| **t == TokenType::Indent).count();
        let dedents = toks.iter().filter(|t| **t == TokenType::Dedent).count();
        assert_eq!(indents, 1);
        assert_eq!(dedents, 1);
    }

    #[test]
    fn mismatched_dedent_is_syntax_error() {
        let mut reader = Reader::from_source("test.wk", "if a\n    if b\n        print a\n  print b\n");
        loop {
            match reader.next() {
                Ok(()) if *reader.token() == TokenType::EndMarker => panic!("expected a syntax error"),
                Ok(()) => continue,
                Err(WickError::SyntaxError { .. }) => return,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn save_then_jump_replays_the_same_token_stream() {
        let mut reader = Reader::from_source("test.wk", "int a = 1\nint b = 2\nint c = 3\n");
        reader.next().unwrap(); // int
        reader.next().unwrap(); // a
        let checkpoint = reader.save();

        reader.next().unwrap();
        reader.next().unwrap();
        reader.next().unwrap();
        reader.next().unwrap();

        reader.jump(&checkpoint);
        let mut replayed = vec![reader.token().clone()];
        for _ in 0..4 {
            reader.next().unwrap();
            replayed.push(reader.token().clone());
        }

        assert_eq!(
            replayed,
            vec![
                TokenType::Identifier("a".to_string()),
                TokenType::Assign,
                TokenType::Int(1),
                TokenType::Newline,
                TokenType::KwInt,
            ]
        );
    }

    #[test]
    fn open_reads_a_real_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("main.wk");
        std::fs::write(&path, "int a = 1\n").expect("write fixture");

        let mut reader = Reader::open(&path).expect("open");
        reader.next().unwrap();
        assert_eq!(*reader.token(), TokenType::KwInt);
    }

    #[test]
    fn import_pushes_a_new_file_and_reset_rewinds_only_the_active_one() {
        let dir = tempfile::tempdir().expect("tempdir");
        let main_path = dir.path().join("main.wk");
        let imported_path = dir.path().join("util.wk");
        std::fs::write(&main_path, "int a = 1\n").expect("write main");
        std::fs::write(&imported_path, "int b = 2\n").expect("write import");

        let mut reader = Reader::open(&main_path).expect("open");
        reader.next().unwrap(); // KwInt in main.wk
        assert_eq!(reader.active_file_id(), 0);

        reader.import(&imported_path).expect("import");
        assert_eq!(reader.active_file_id(), 1);
        reader.next().unwrap();
        assert_eq!(*reader.token(), TokenType::KwInt);
        assert_eq!(reader.string(), "int");
    }

    #[test]
    fn char_literal_accepts_only_the_legal_escapes() {
        let toks = tokens("char c = '\\n'\n");
        assert!(toks.contains(&TokenType::Char(b'\n')));

        let mut reader = Reader::from_source("test.wk", "char c = '\\q'\n");
        let mut saw_error = false;
        loop {
            match reader.next() {
                Ok(()) if *reader.token() == TokenType::EndMarker => break,
                Ok(()) => continue,
                Err(_) => {
                    saw_error = true;
                    break;
                }
            }
        }
        assert!(saw_error);
    }
}
