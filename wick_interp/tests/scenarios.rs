//! End-to-end scenarios from the specification's testable properties: each
//! program's full `stdout` is captured and compared against the expected
//! transcript.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use pretty_assertions::assert_eq;

use wick_interp::Interpreter;
use wick_lexer::Reader;

/// A `Write` sink that keeps its bytes reachable after being boxed into the
/// interpreter, so the test can inspect what was printed once `run()` returns.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn run(source: &str) -> String {
    let reader = Reader::from_source("scenario.wk", source);
    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(reader, false, Box::new(buffer.clone()));
    interpreter.run().expect("program should run without error");
    String::from_utf8(buffer.0.borrow().clone()).expect("output is valid utf-8")
}

#[test]
fn s1_arithmetic_with_promotion() {
    let source = "int a = 3\nfloat b = 2.0\nprint a + b\n";
    assert_eq!(run(source), "5\n");
}

#[test]
fn s2_list_iteration_and_slicing() {
    let source = "list xs = [1,2,3,4,5]\nfor x in xs\n    print x\nprint xs[1:4]\n";
    assert_eq!(run(source), "1\n2\n3\n4\n5\n[2, 3, 4]\n");
}

#[test]
fn s3_function_with_forward_reference() {
    let source = "print f(10)\ndef f(n)\n    if n <= 1\n        return 1\n    return n * f(n-1)\n";
    assert_eq!(run(source), "3628800\n");
}

#[test]
fn s4_break_and_continue() {
    let source = "int i = 0\nwhile i < 10\n    i = i + 1\n    if i == 3\n        continue\n    if i == 6\n        break\n    print i\n";
    assert_eq!(run(source), "1\n2\n4\n5\n");
}

#[test]
fn s5_string_concatenation_and_in() {
    let source = "str s = \"abc\"\nprint s + \"de\"\nprint \"b\" in s\n";
    assert_eq!(run(source), "abcde\n1\n");
}

#[test]
fn s6_return_short_circuits_from_deep_nesting() {
    let source = "def g()\n    int i = 0\n    while i < 100\n        if i == 5\n            return i\n        i = i + 1\n    return -1\nprint g()\n";
    assert_eq!(run(source), "5\n");
}

#[test]
fn list_assignment_deep_copies_so_mutation_does_not_alias() {
    let source = "list a = [1,2,3]\nlist b = a\nb[0] = 99\nprint a\nprint b\n";
    assert_eq!(run(source), "[1, 2, 3]\n[99, 2, 3]\n");
}

#[test]
fn subscript_read_evaluates_a_side_effecting_index_exactly_once() {
    let source = "list arr = [10,20,30]\nint i = 0\nprint arr[i = i + 1]\nprint i\n";
    assert_eq!(run(source), "20\n1\n");
}

#[test]
fn for_loop_variable_is_unbound_after_the_loop() {
    let reader = Reader::from_source("scenario.wk", "list xs = [1,2,3]\nfor x in xs\n    print x\nprint x\n");
    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(reader, false, Box::new(buffer));
    let err = interpreter.run().expect_err("x should not be visible after the for loop");
    assert!(matches!(err, wick_common::WickError::NameError { .. }));
}

#[test]
fn undeclared_identifier_is_a_name_error() {
    let reader = Reader::from_source("scenario.wk", "print missing\n");
    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(reader, false, Box::new(buffer));
    let err = interpreter.run().expect_err("undeclared identifier should fail");
    assert!(matches!(err, wick_common::WickError::NameError { .. }));
}

#[test]
fn import_executes_the_imported_files_statements_and_registers_its_functions() {
    let dir = tempfile::tempdir().expect("tempdir");
    let util_path = dir.path().join("util.wk");
    let main_path = dir.path().join("main.wk");
    std::fs::write(&util_path, "print \"loaded\"\n").expect("write util.wk");
    std::fs::write(
        &main_path,
        "import \"util.wk\"\nprint double(21)\ndef double(n)\n    return n * 2\n",
    )
    .expect("write main.wk");

    let reader = Reader::open(&main_path).expect("open main.wk");
    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(reader, false, Box::new(buffer.clone()));
    interpreter.run().expect("program should run without error");
    assert_eq!(String::from_utf8(buffer.0.borrow().clone()).unwrap(), "loaded\n42\n");
}

#[test]
fn integer_division_by_zero_is_a_zero_division_error() {
    let reader = Reader::from_source("scenario.wk", "int a = 1\nint b = 0\nprint a / b\n");
    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(reader, false, Box::new(buffer));
    let err = interpreter.run().expect_err("division by zero should fail");
    assert!(matches!(err, wick_common::WickError::ZeroDivisionError { .. }));
}
