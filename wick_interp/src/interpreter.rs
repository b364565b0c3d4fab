//! The fused parser/evaluator (spec §4.5, §4.6): one method per grammar
//! production, walking tokens and executing as it goes rather than building
//! an intermediate AST. Function bodies are never parsed until called — the
//! pre-scan (§4.5.2) only records where each one starts.

use std::io::{self, Write};
use std::path::PathBuf;

use wick_common::{Span, WickError, WickResult};
use wick_lexer::{Reader, TokenType};
use wick_values::{convert, ops, Value};

use crate::flow::Flow;
use crate::scope::Scope;

pub struct Interpreter {
    reader: Reader,
    scope: Scope,
    debug: bool,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new(reader: Reader, debug: bool) -> Self {
        Self::with_output(reader, debug, Box::new(io::stdout()))
    }

    /// Same as `new`, but `print`/`input`-prompt output goes to `output`
    /// instead of the process's standard output. Used by tests that need to
    /// assert on produced text without spawning a subprocess.
    pub fn with_output(reader: Reader, debug: bool, output: Box<dyn Write>) -> Self {
        Self { reader, scope: Scope::new(), debug, output }
    }

    /// The entry sequence (spec §4.5.1): pre-scan the module for function
    /// definitions, then reset and execute its statements from the top.
    pub fn run(&mut self) -> WickResult<()> {
        self.prescan_current_file()?;
        self.reader.reset();
        self.reader.next()?;

        loop {
            if *self.reader.token() == TokenType::EndMarker {
                break;
            }
            if let Flow::Return(_) = self.parse_statement()? {
                break;
            }
        }

        if self.debug {
            if let Err(e) = std::fs::write("object.dsv", wick_values::registry::dump()) {
                log::warn!("failed to write object.dsv: {e}");
            }
        }
        Ok(())
    }

    // ---- function pre-scan (§4.5.2) and block skipping (§4.5.3) ----

    /// Scans the currently active file from its start, registering every
    /// `def` as a `Value::Position` bound in the module frame, and skipping
    /// each body without executing it.
    fn prescan_current_file(&mut self) -> WickResult<()> {
        log::debug!("pre-scanning {} for function definitions", self.reader.file_path(self.reader.active_file_id()).display());
        self.reader.reset();
        self.reader.next()?;
        loop {
            match self.reader.token() {
                TokenType::EndMarker => break,
                TokenType::KwDef => {
                    self.reader.next()?; // consume 'def'
                    let name = self.expect_identifier()?;
                    self.reader.next()?; // consume identifier; should land on '('
                    let span = self.reader.current_span();
                    self.expect(TokenType::LParen)?;
                    let position = self.reader.save();
                    log::debug!("registered function '{name}'");
                    self.scope.add_global(&name, span)?;
                    self.scope.bind_global(&name, Value::new_position(position));
                    self.skip_function()?;
                }
                _ => {
                    self.reader.next()?;
                }
            }
        }
        Ok(())
    }

    /// Skips from the current position (somewhere in a function's parameter
    /// list) past the signature's NEWLINE and then its body.
    fn skip_function(&mut self) -> WickResult<()> {
        loop {
            match self.reader.token() {
                TokenType::Newline => break,
                TokenType::EndMarker => {
                    return Err(WickError::syntax("unexpected end of file in function signature", self.reader.current_span()))
                }
                _ => self.reader.next()?,
            }
        }
        self.reader.next()?; // consume NEWLINE
        self.skip_block()
    }

    /// Expects the current token to be INDENT; consumes balanced
    /// INDENT/DEDENT pairs until the block's closing DEDENT, inclusive.
    fn skip_block(&mut self) -> WickResult<()> {
        self.expect(TokenType::Indent)?;
        self.reader.next()?;
        let mut depth = 1i32;
        loop {
            match self.reader.token() {
                TokenType::Indent => {
                    depth += 1;
                    self.reader.next()?;
                }
                TokenType::Dedent => {
                    depth -= 1;
                    self.reader.next()?;
                    if depth == 0 {
                        break;
                    }
                }
                TokenType::EndMarker => return Err(WickError::syntax("unexpected end of file inside block", self.reader.current_span())),
                _ => self.reader.next()?,
            }
        }
        Ok(())
    }

    /// Skips a whole `NEWLINE INDENT ... DEDENT` block that a construct
    /// decided not to execute (the untaken `if`/`else` arm, a loop that never
    /// ran its body).
    fn skip_full_block(&mut self) -> WickResult<()> {
        self.expect(TokenType::Newline)?;
        self.reader.next()?;
        self.skip_block()
    }

    // ---- block executor (§4.6) ----

    /// Expects `NEWLINE INDENT`, then executes statements until one produces
    /// a non-`Next` flow or the block's DEDENT/ENDMARKER is reached. The
    /// caller consumes the terminating DEDENT.
    fn parse_block(&mut self) -> WickResult<Flow> {
        self.expect(TokenType::Newline)?;
        self.reader.next()?;
        self.expect(TokenType::Indent)?;
        self.reader.next()?;
        loop {
            let flow = self.parse_statement()?;
            if !matches!(flow, Flow::Next) {
                self.fast_forward_to_block_end()?;
                return Ok(flow);
            }
            if matches!(self.reader.token(), TokenType::Dedent | TokenType::EndMarker) {
                return Ok(Flow::Next);
            }
        }
    }

    /// After a statement produced `break`/`continue`/`return` mid-block,
    /// skips the remaining statements up to (not including) the block's
    /// closing DEDENT.
    fn fast_forward_to_block_end(&mut self) -> WickResult<()> {
        let mut depth = 0i32;
        loop {
            match self.reader.token() {
                TokenType::Indent => {
                    depth += 1;
                    self.reader.next()?;
                }
                TokenType::Dedent => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                    self.reader.next()?;
                }
                TokenType::EndMarker => return Ok(()),
                _ => self.reader.next()?,
            }
        }
    }

    // ---- statement dispatch (§4.5.4) ----

    fn parse_statement(&mut self) -> WickResult<Flow> {
        match self.reader.token().clone() {
            TokenType::KwChar | TokenType::KwInt | TokenType::KwFloat | TokenType::KwStr | TokenType::KwList => {
                self.parse_declaration()
            }
            TokenType::KwDef => self.skip_nested_def(),
            TokenType::KwIf => self.parse_if(),
            TokenType::KwWhile => self.parse_while(),
            TokenType::KwDo => self.parse_do_while(),
            TokenType::KwFor => self.parse_for(),
            TokenType::KwPrint => self.parse_print(),
            TokenType::KwInput => self.parse_input(),
            TokenType::KwReturn => self.parse_return(),
            TokenType::KwBreak => {
                self.reader.next()?;
                self.expect(TokenType::Newline)?;
                self.reader.next()?;
                Ok(Flow::Break)
            }
            TokenType::KwContinue => {
                self.reader.next()?;
                self.expect(TokenType::Newline)?;
                self.reader.next()?;
                Ok(Flow::Continue)
            }
            TokenType::KwPass => {
                self.reader.next()?;
                self.expect(TokenType::Newline)?;
                self.reader.next()?;
                Ok(Flow::Next)
            }
            TokenType::KwImport => self.parse_import(),
            _ => {
                let _ = self.parse_comma_expr()?;
                self.expect(TokenType::Newline)?;
                self.reader.next()?;
                Ok(Flow::Next)
            }
        }
    }

    /// A `def` seen at statement-execution time is a nested function: its
    /// name was already registered by the pre-scan, so just consume its
    /// tokens without re-registering it.
    fn skip_nested_def(&mut self) -> WickResult<Flow> {
        self.reader.next()?; // consume 'def'
        let _ = self.expect_identifier()?;
        self.reader.next()?; // consume identifier
        self.skip_function()?;
        Ok(Flow::Next)
    }

    // ---- declarations (§4.5.5) ----

    fn parse_declaration(&mut self) -> WickResult<Flow> {
        let keyword = match self.reader.token() {
            TokenType::KwChar => "char",
            TokenType::KwInt => "int",
            TokenType::KwFloat => "float",
            TokenType::KwStr => "str",
            TokenType::KwList => "list",
            _ => unreachable!("caller matched a type keyword"),
        };
        self.reader.next()?;
        loop {
            let name = self.expect_identifier()?;
            let span = self.reader.current_span();
            self.reader.next()?;
            self.scope.add(&name, span)?;

            let mut value = Value::default_for_type_keyword(keyword);
            if *self.reader.token() == TokenType::Assign {
                self.reader.next()?;
                let rhs = self.parse_assignment_expr()?;
                value = convert::coerce_to_declared_type(keyword, &rhs, span)?;
            }
            self.scope.bind(&name, value);

            if *self.reader.token() == TokenType::Comma {
                self.reader.next()?;
                continue;
            }
            break;
        }
        self.expect(TokenType::Newline)?;
        self.reader.next()?;
        Ok(Flow::Next)
    }

    // ---- if/else (§4.5.6) ----

    fn parse_if(&mut self) -> WickResult<Flow> {
        self.reader.next()?; // consume 'if'
        let cond = self.parse_comma_expr()?;
        let span = self.reader.current_span();
        let taken = convert::as_bool(&cond, span)?;

        if taken {
            let flow = self.parse_block()?;
            self.reader.next()?; // consume the then-block's DEDENT
            if *self.reader.token() == TokenType::KwElse {
                self.reader.next()?;
                self.skip_full_block()?;
            }
            Ok(flow)
        } else {
            self.skip_full_block()?;
            if *self.reader.token() == TokenType::KwElse {
                self.reader.next()?;
                let flow = self.parse_block()?;
                self.reader.next()?; // consume the else-block's DEDENT
                Ok(flow)
            } else {
                Ok(Flow::Next)
            }
        }
    }

    // ---- while (§4.5.7) ----

    fn parse_while(&mut self) -> WickResult<Flow> {
        self.reader.next()?; // consume 'while'
        let cond_pos = self.reader.save();
        loop {
            let cond = self.parse_comma_expr()?;
            let span = self.reader.current_span();
            if !convert::as_bool(&cond, span)? {
                self.skip_full_block()?;
                return Ok(Flow::Next);
            }
            let flow = self.parse_block()?;
            self.reader.next()?; // consume DEDENT
            match flow {
                Flow::Next | Flow::Continue => self.reader.jump(&cond_pos),
                Flow::Break => return Ok(Flow::Next),
                Flow::Return(v) => return Ok(Flow::Return(v)),
            }
        }
    }

    // ---- do-while (§4.5.8) ----

    fn parse_do_while(&mut self) -> WickResult<Flow> {
        self.reader.next()?; // consume 'do'
        let body_pos = self.reader.save();
        loop {
            let flow = self.parse_block()?;
            self.reader.next()?; // consume DEDENT

            self.expect(TokenType::KwWhile)?;
            self.reader.next()?;
            let cond = self.parse_comma_expr()?;
            let span = self.reader.current_span();
            self.expect(TokenType::Newline)?;
            self.reader.next()?;

            match flow {
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Break => return Ok(Flow::Next),
                Flow::Next | Flow::Continue => {
                    if convert::as_bool(&cond, span)? {
                        self.reader.jump(&body_pos);
                        continue;
                    }
                    return Ok(Flow::Next);
                }
            }
        }
    }

    // ---- for-in (§4.5.9) ----

    fn parse_for(&mut self) -> WickResult<Flow> {
        self.reader.next()?; // consume 'for'
        let name = self.expect_identifier()?;
        let name_span = self.reader.current_span();
        self.reader.next()?;
        self.expect(TokenType::KwIn)?;
        self.reader.next()?;
        let seq = self.parse_comma_expr()?;
        let span = self.reader.current_span();
        let length = ops::len(&seq, span)?;

        if self.scope.search(&name).is_none() {
            self.scope.add(&name, name_span)?;
        }

        let block_pos = self.reader.save();
        for i in 0..length {
            let element = ops::item(&seq, i, span)?;
            self.scope.bind(&name, element);
            let flow = self.parse_block()?;
            self.reader.next()?; // consume DEDENT
            self.scope.unbind(&name);
            match flow {
                Flow::Break => return Ok(Flow::Next),
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Next | Flow::Continue => {
                    if i + 1 < length {
                        self.reader.jump(&block_pos);
                    }
                }
            }
        }
        if length == 0 {
            self.skip_full_block()?;
        }
        Ok(Flow::Next)
    }

    // ---- print / input (§4.5.10) ----

    fn parse_print(&mut self) -> WickResult<Flow> {
        self.reader.next()?; // consume 'print'
        let mut values = Vec::new();
        loop {
            values.push(self.parse_assignment_expr()?);
            if *self.reader.token() == TokenType::Comma {
                self.reader.next()?;
                continue;
            }
            break;
        }
        self.expect(TokenType::Newline)?;
        self.reader.next()?;

        let line: Vec<String> = values.iter().map(ToString::to_string).collect();
        let span = self.reader.current_span();
        writeln!(self.output, "{}", line.join(" ")).map_err(|e| WickError::system(format!("failed to write output: {e}"), span))?;
        Ok(Flow::Next)
    }

    fn parse_input(&mut self) -> WickResult<Flow> {
        self.reader.next()?; // consume 'input'
        loop {
            let prompt = if let TokenType::Str(s) = self.reader.token().clone() {
                self.reader.next()?;
                Some(s)
            } else {
                None
            };
            let span = self.reader.current_span();
            if let Some(prompt) = &prompt {
                write!(self.output, "{prompt}").map_err(|e| WickError::system(format!("failed to write output: {e}"), span))?;
                self.output.flush().ok();
            }

            let name = self.expect_identifier()?;
            let span = self.reader.current_span();
            self.reader.next()?;

            let current = self.scope.search(&name).ok_or_else(|| WickError::name(format!("'{name}' is not declared"), span))?;

            let mut line = String::new();
            io::stdin().read_line(&mut line).map_err(|e| WickError::system(format!("failed to read standard input: {e}"), span))?;
            let trimmed = line.trim_end_matches(['\n', '\r']);

            let parsed = match &current {
                Value::Char(_) => Value::Char(convert::as_char(&Value::new_str(trimmed.to_string()), span)?),
                Value::Int(_) => Value::Int(convert::as_int(&Value::new_str(trimmed.to_string()), span)?),
                Value::Float(_) => Value::Float(convert::as_float(&Value::new_str(trimmed.to_string()), span)?),
                Value::Str(_) => Value::new_str(trimmed.to_string()),
                other => return Err(WickError::ty(format!("cannot read input into a {} variable", other.type_name()), span)),
            };
            self.scope.bind(&name, parsed);

            if *self.reader.token() == TokenType::Comma {
                self.reader.next()?;
                continue;
            }
            break;
        }
        self.expect(TokenType::Newline)?;
        self.reader.next()?;
        Ok(Flow::Next)
    }

    // ---- return (§4.5.11) ----

    fn parse_return(&mut self) -> WickResult<Flow> {
        self.reader.next()?; // consume 'return'
        if *self.reader.token() == TokenType::Newline {
            self.reader.next()?;
            return Ok(Flow::Return(Value::Int(0)));
        }
        let value = self.parse_comma_expr()?;
        self.expect(TokenType::Newline)?;
        self.reader.next()?;
        Ok(Flow::Return(value))
    }

    // ---- function call (§4.5.12) ----

    fn parse_call(&mut self, name: String, span: Span) -> WickResult<Value> {
        log::debug!("calling '{name}'");
        self.expect(TokenType::LParen)?;
        self.reader.next()?; // consume '('

        let mut args = Vec::new();
        if *self.reader.token() != TokenType::RParen {
            loop {
                let arg = self.parse_assignment_expr()?;
                args.push(arg.deep_copy());
                if *self.reader.token() == TokenType::Comma {
                    self.reader.next()?;
                    continue;
                }
                break;
            }
        }
        self.expect(TokenType::RParen)?;
        self.reader.next()?; // consume ')'

        let callee_position = match self.scope.search(&name) {
            Some(Value::Position(position)) => position.value.clone(),
            Some(_) => return Err(WickError::ty(format!("'{name}' is not callable"), span)),
            None => return Err(WickError::name(format!("undefined function '{name}'"), span)),
        };

        let return_to = self.reader.save();
        self.scope.append_level();
        self.reader.jump(&callee_position);

        // `callee_position` points at the '(' captured by the pre-scan.
        self.expect(TokenType::LParen)?;
        self.reader.next()?;

        let mut args = args.into_iter();
        if *self.reader.token() != TokenType::RParen {
            loop {
                let formal = self.expect_identifier()?;
                let formal_span = self.reader.current_span();
                self.reader.next()?;
                let value = args
                    .next()
                    .ok_or_else(|| WickError::syntax(format!("missing argument for parameter '{formal}'"), formal_span))?;
                self.scope.add(&formal, formal_span)?;
                self.scope.bind(&formal, value);
                if *self.reader.token() == TokenType::Comma {
                    self.reader.next()?;
                    continue;
                }
                break;
            }
        }
        // Extra arguments beyond the declared parameters are discarded.
        self.expect(TokenType::RParen)?;
        self.reader.next()?;

        let flow = self.parse_block()?;
        self.reader.next()?; // consume the body's DEDENT

        let result = match flow {
            Flow::Return(value) => value,
            _ => Value::Int(0),
        };

        self.scope.remove_level();
        self.reader.jump(&return_to);

        log::debug!("returned from '{name}'");
        Ok(result)
    }

    // ---- import (§4.5.13) ----

    fn parse_import(&mut self) -> WickResult<Flow> {
        self.reader.next()?; // consume 'import'
        loop {
            let path_value = self.parse_assignment_expr()?;
            let span = self.reader.current_span();
            let path = match &path_value {
                Value::Str(body) => body.borrow().value.clone(),
                other => return Err(WickError::ty(format!("import path must be a string, found {}", other.type_name()), span)),
            };
            self.exec_import(&path)?;
            if *self.reader.token() == TokenType::Comma {
                self.reader.next()?;
                continue;
            }
            break;
        }
        self.expect(TokenType::Newline)?;
        self.reader.next()?;
        Ok(Flow::Next)
    }

    /// Resolves `path` relative to the importing file's directory, then
    /// executes its statements in the same scope (textual inclusion). The
    /// imported file gets its own function pre-scan, registering its `def`s
    /// into the same module frame as the importer's.
    fn exec_import(&mut self, path: &str) -> WickResult<()> {
        let importer_dir = self.reader.file_path(self.reader.active_file_id()).parent().map(ToOwned::to_owned);
        let resolved: PathBuf = match importer_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(path),
            _ => PathBuf::from(path),
        };
        log::debug!("importing {}", resolved.display());

        let return_to = self.reader.save();
        self.reader.import(&resolved)?;
        self.prescan_current_file()?;
        self.reader.reset();
        self.reader.next()?;

        loop {
            if *self.reader.token() == TokenType::EndMarker {
                break;
            }
            if let Flow::Return(_) = self.parse_statement()? {
                break;
            }
        }

        self.reader.jump(&return_to);
        Ok(())
    }

    // ---- expression grammar (§4.5.14) ----

    fn parse_comma_expr(&mut self) -> WickResult<Value> {
        let mut value = self.parse_assignment_expr()?;
        while *self.reader.token() == TokenType::Comma {
            self.reader.next()?;
            value = self.parse_assignment_expr()?;
        }
        Ok(value)
    }

    /// Assignment targets are `identifier` or `identifier[expr]` (spec §9
    /// resolved open question). Anything else falls through to the ordinary
    /// precedence chain; `save`/`jump` back out of a failed lookahead.
    ///
    /// The `identifier[expr]` shape is only distinguished from an ordinary
    /// subscript read by whether `=` follows the closing `]` — and that must
    /// be settled *before* `expr` is evaluated, since evaluating it twice
    /// (once here, once again through the fallback parse) would run a
    /// side-effecting index expression (`arr[f()]`) twice. `index_assignment_follows`
    /// answers that by skipping tokens, never evaluating them.
    fn parse_assignment_expr(&mut self) -> WickResult<Value> {
        if let TokenType::Identifier(name) = self.reader.token().clone() {
            let checkpoint = self.reader.save();
            let span = self.reader.current_span();
            self.reader.next()?; // consume identifier

            if *self.reader.token() == TokenType::Assign {
                self.reader.next()?;
                let rhs = self.parse_assignment_expr()?;
                if self.scope.search(&name).is_none() {
                    return Err(WickError::name(format!("assignment to undeclared identifier '{name}'"), span));
                }
                let value = rhs.deep_copy();
                self.scope.bind(&name, value.clone());
                return Ok(value);
            }

            if *self.reader.token() == TokenType::LBracket && self.index_assignment_follows()? {
                self.reader.next()?; // consume '['
                let index_value = self.parse_comma_expr()?;
                self.expect(TokenType::RBracket)?;
                self.reader.next()?; // consume ']'
                self.expect(TokenType::Assign)?;
                self.reader.next()?; // consume '='
                let rhs = self.parse_assignment_expr()?;
                let target = self
                    .scope
                    .search(&name)
                    .ok_or_else(|| WickError::name(format!("assignment to undeclared identifier '{name}'"), span))?;
                let idx = convert::as_int(&index_value, span)?;
                let value = rhs.deep_copy();
                ops::set_index(&target, idx, value.clone(), span)?;
                return Ok(value);
            }

            // Not an assignment after all: rewind and let the ordinary
            // precedence chain parse it (plain loads, indexing, calls).
            self.reader.jump(&checkpoint);
        }
        self.parse_or_expr()
    }

    /// Pure lookahead: the current token must be `[`. Skips tokens by
    /// bracket-depth counting alone (no expression evaluation, so no
    /// side effect runs twice) up to the matching `]`, checks whether `=`
    /// follows, then restores the reader to exactly the `[` it started
    /// from regardless of the answer.
    fn index_assignment_follows(&mut self) -> WickResult<bool> {
        let before_bracket = self.reader.save();
        let mut depth = 0i32;
        loop {
            match self.reader.token() {
                TokenType::LBracket => {
                    depth += 1;
                    self.reader.next()?;
                }
                TokenType::RBracket => {
                    depth -= 1;
                    self.reader.next()?;
                    if depth == 0 {
                        break;
                    }
                }
                TokenType::Newline | TokenType::EndMarker => {
                    return Err(WickError::syntax("unterminated '[' in expression", self.reader.current_span()))
                }
                _ => self.reader.next()?,
            }
        }
        let is_assignment = *self.reader.token() == TokenType::Assign;
        self.reader.jump(&before_bracket);
        Ok(is_assignment)
    }

    fn parse_or_expr(&mut self) -> WickResult<Value> {
        let mut left = self.parse_and_expr()?;
        while *self.reader.token() == TokenType::KwOr {
            let span = self.reader.current_span();
            self.reader.next()?;
            let right = self.parse_and_expr()?;
            left = ops::logical_or(&left, &right, span)?;
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> WickResult<Value> {
        let mut left = self.parse_equality_expr()?;
        while *self.reader.token() == TokenType::KwAnd {
            let span = self.reader.current_span();
            self.reader.next()?;
            let right = self.parse_equality_expr()?;
            left = ops::logical_and(&left, &right, span)?;
        }
        Ok(left)
    }

    fn parse_equality_expr(&mut self) -> WickResult<Value> {
        let mut left = self.parse_relational_expr()?;
        loop {
            let span = self.reader.current_span();
            match self.reader.token() {
                TokenType::Eq => {
                    self.reader.next()?;
                    let right = self.parse_relational_expr()?;
                    left = ops::eq(&left, &right, span)?;
                }
                TokenType::NotEq | TokenType::AltNotEq => {
                    self.reader.next()?;
                    let right = self.parse_relational_expr()?;
                    left = ops::ne(&left, &right, span)?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_relational_expr(&mut self) -> WickResult<Value> {
        let mut left = self.parse_additive_expr()?;
        loop {
            let span = self.reader.current_span();
            match self.reader.token() {
                TokenType::Lt => {
                    self.reader.next()?;
                    let right = self.parse_additive_expr()?;
                    left = ops::lt(&left, &right, span)?;
                }
                TokenType::LtEq => {
                    self.reader.next()?;
                    let right = self.parse_additive_expr()?;
                    left = ops::le(&left, &right, span)?;
                }
                TokenType::Gt => {
                    self.reader.next()?;
                    let right = self.parse_additive_expr()?;
                    left = ops::gt(&left, &right, span)?;
                }
                TokenType::GtEq => {
                    self.reader.next()?;
                    let right = self.parse_additive_expr()?;
                    left = ops::ge(&left, &right, span)?;
                }
                TokenType::KwIn => {
                    self.reader.next()?;
                    let right = self.parse_additive_expr()?;
                    left = ops::contains(&left, &right, span)?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_additive_expr(&mut self) -> WickResult<Value> {
        let mut left = self.parse_multiplicative_expr()?;
        loop {
            let span = self.reader.current_span();
            match self.reader.token() {
                TokenType::Plus => {
                    self.reader.next()?;
                    let right = self.parse_multiplicative_expr()?;
                    left = ops::add(&left, &right, span)?;
                }
                TokenType::Minus => {
                    self.reader.next()?;
                    let right = self.parse_multiplicative_expr()?;
                    left = ops::sub(&left, &right, span)?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> WickResult<Value> {
        let mut left = self.parse_unary_expr()?;
        loop {
            let span = self.reader.current_span();
            match self.reader.token() {
                TokenType::Star => {
                    self.reader.next()?;
                    let right = self.parse_unary_expr()?;
                    left = ops::mul(&left, &right, span)?;
                }
                TokenType::Slash => {
                    self.reader.next()?;
                    let right = self.parse_unary_expr()?;
                    left = ops::div(&left, &right, span)?;
                }
                TokenType::Percent => {
                    self.reader.next()?;
                    let right = self.parse_unary_expr()?;
                    left = ops::rem(&left, &right, span)?;
                }
                _ => break,
            }
        }
        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> WickResult<Value> {
        let span = self.reader.current_span();
        match self.reader.token() {
            TokenType::Minus => {
                self.reader.next()?;
                let value = self.parse_unary_expr()?;
                ops::neg(&value, span)
            }
            TokenType::Plus => {
                self.reader.next()?;
                let value = self.parse_unary_expr()?;
                ops::pos(&value, span)
            }
            TokenType::Bang => {
                self.reader.next()?;
                let value = self.parse_unary_expr()?;
                ops::not(&value, span)
            }
            _ => self.parse_postfix_expr(),
        }
    }

    fn parse_postfix_expr(&mut self) -> WickResult<Value> {
        let mut value = self.parse_primary()?;
        while *self.reader.token() == TokenType::LBracket {
            let span = self.reader.current_span();
            self.reader.next()?; // consume '['

            if *self.reader.token() == TokenType::Colon {
                self.reader.next()?;
                let b_idx = if *self.reader.token() == TokenType::RBracket {
                    ops::len(&value, span)?
                } else {
                    let b = self.parse_assignment_expr()?;
                    convert::as_int(&b, span)?
                };
                self.expect(TokenType::RBracket)?;
                self.reader.next()?;
                value = ops::slice(&value, 0, b_idx, span)?;
                continue;
            }

            let first = self.parse_assignment_expr()?;
            if *self.reader.token() == TokenType::Colon {
                self.reader.next()?;
                let b_idx = if *self.reader.token() == TokenType::RBracket {
                    ops::len(&value, span)?
                } else {
                    let b = self.parse_assignment_expr()?;
                    convert::as_int(&b, span)?
                };
                self.expect(TokenType::RBracket)?;
                self.reader.next()?;
                let a_idx = convert::as_int(&first, span)?;
                value = ops::slice(&value, a_idx, b_idx, span)?;
            } else {
                self.expect(TokenType::RBracket)?;
                self.reader.next()?;
                let idx = convert::as_int(&first, span)?;
                value = ops::index(&value, idx, span)?;
            }
        }
        Ok(value)
    }

    fn parse_primary(&mut self) -> WickResult<Value> {
        let span = self.reader.current_span();
        match self.reader.token().clone() {
            TokenType::Int(n) => {
                self.reader.next()?;
                Ok(Value::Int(n))
            }
            TokenType::Float(x) => {
                self.reader.next()?;
                Ok(Value::Float(x))
            }
            TokenType::Char(c) => {
                self.reader.next()?;
                Ok(Value::Char(c))
            }
            TokenType::Str(s) => {
                self.reader.next()?;
                Ok(Value::new_str(s))
            }
            TokenType::LParen => {
                self.reader.next()?;
                let value = self.parse_comma_expr()?;
                self.expect(TokenType::RParen)?;
                self.reader.next()?;
                Ok(value)
            }
            TokenType::LBracket => {
                self.reader.next()?;
                let mut items = Vec::new();
                if *self.reader.token() != TokenType::RBracket {
                    loop {
                        items.push(self.parse_assignment_expr()?.deep_copy());
                        if *self.reader.token() == TokenType::Comma {
                            self.reader.next()?;
                            continue;
                        }
                        break;
                    }
                }
                self.expect(TokenType::RBracket)?;
                self.reader.next()?;
                Ok(Value::new_list(items))
            }
            TokenType::Identifier(name) => {
                self.reader.next()?;
                if *self.reader.token() == TokenType::LParen {
                    self.parse_call(name, span)
                } else {
                    self.scope.search(&name).ok_or_else(|| WickError::name(format!("undefined identifier '{name}'"), span))
                }
            }
            other => Err(WickError::syntax(format!("unexpected token '{other}' in expression"), span)),
        }
    }

    // ---- small helpers ----

    fn expect(&self, expected: TokenType) -> WickResult<()> {
        if *self.reader.token() == expected {
            Ok(())
        } else {
            Err(WickError::syntax(format!("expected '{expected}', found '{}'", self.reader.token()), self.reader.current_span()))
        }
    }

    fn expect_identifier(&self) -> WickResult<String> {
        match self.reader.token() {
            TokenType::Identifier(name) => Ok(name.clone()),
            other => Err(WickError::syntax(format!("expected an identifier, found '{other}'"), self.reader.current_span())),
        }
    }
}
