//! 失败分类测试：每种错误都以结构化数据返回

mod common;
use bhasha_core::ErrorKind;
use common::{failure_of, run_code};

fn assert_failure(code: &str, kind: ErrorKind, exception: &str, detail: &str) {
    let failure = failure_of(code);
    assert_eq!(failure.kind, kind, "kind for {code:?}");
    assert_eq!(failure.exception, exception, "exception for {code:?}");
    assert_eq!(failure.detail, detail, "detail for {code:?}");
}

#[test]
fn test_unresolved_name() {
    assert_failure("print(x)", ErrorKind::UnresolvedName, "NameError", "name 'x' is not defined");
    assert_failure(
        "x = 1\ndef f():\n    print(x)\n    x = 2\nf()",
        ErrorKind::UnresolvedName,
        "UnboundLocalError",
        "cannot access local variable 'x' where it is not associated with a value",
    );
}

#[test]
fn test_type_mismatch() {
    assert_failure(
        "print('a' + 1)",
        ErrorKind::TypeMismatch,
        "TypeError",
        "can only concatenate str (not \"int\") to str",
    );
    assert_failure(
        "print(1 + 'a')",
        ErrorKind::TypeMismatch,
        "TypeError",
        "unsupported operand type(s) for +: 'int' and 'str'",
    );
    assert_failure(
        "def f(a, b):\n    pass\nf(1)",
        ErrorKind::TypeMismatch,
        "TypeError",
        "f() missing 1 required positional argument: 'b'",
    );
    assert_failure("x = 5\nx()", ErrorKind::TypeMismatch, "TypeError", "'int' object is not callable");
    assert_failure("len(5)", ErrorKind::TypeMismatch, "TypeError", "object of type 'int' has no len()");
}

#[test]
fn test_division_by_zero() {
    assert_failure("print(1 / 0)", ErrorKind::DivisionByZero, "ZeroDivisionError", "division by zero");
    assert_failure(
        "print(5 // 0)",
        ErrorKind::DivisionByZero,
        "ZeroDivisionError",
        "integer division or modulo by zero",
    );
}

#[test]
fn test_index_out_of_bounds() {
    assert_failure(
        "xs = [1, 2]\nprint(xs[5])",
        ErrorKind::IndexOutOfBounds,
        "IndexError",
        "list index out of range",
    );
    assert_failure("[].pop()", ErrorKind::IndexOutOfBounds, "IndexError", "pop from empty list");
}

#[test]
fn test_key_not_found() {
    assert_failure("d = {}\nprint(d['k'])", ErrorKind::KeyNotFound, "KeyError", "'k'");
}

#[test]
fn test_unresolved_attribute() {
    assert_failure(
        "x = 5\nx.foo()",
        ErrorKind::UnresolvedAttribute,
        "AttributeError",
        "'int' object has no attribute 'foo'",
    );
}

#[test]
fn test_import_failure() {
    assert_failure(
        "import math",
        ErrorKind::ImportFailure,
        "ModuleNotFoundError",
        "No module named 'math'",
    );
    assert_failure(
        "from os import path",
        ErrorKind::ImportFailure,
        "ModuleNotFoundError",
        "No module named 'os'",
    );
}

#[test]
fn test_resource_not_found() {
    assert_failure(
        "open('data.txt')",
        ErrorKind::ResourceNotFound,
        "FileNotFoundError",
        "[Errno 2] No such file or directory: 'data.txt'",
    );
}

#[test]
fn test_invalid_value() {
    assert_failure(
        "int('abc')",
        ErrorKind::InvalidValue,
        "ValueError",
        "invalid literal for int() with base 10: 'abc'",
    );
    assert_failure(
        "a, b = [1, 2, 3]",
        ErrorKind::InvalidValue,
        "ValueError",
        "too many values to unpack (expected 2)",
    );
}

#[test]
fn test_syntax_failures() {
    assert_failure("print(\"hi\"", ErrorKind::UnclosedDelimiter, "SyntaxError", "'(' was never closed");
    assert_failure(
        "if x = 1:\n    pass",
        ErrorKind::MalformedSyntax,
        "SyntaxError",
        "invalid syntax. Maybe you meant '==' or ':=' instead of '='?",
    );
    assert_failure(
        "if True:\nprint(1)",
        ErrorKind::IndentationFault,
        "IndentationError",
        "expected an indented block after 'if' statement on line 1",
    );
    assert_failure("  x = 1", ErrorKind::IndentationFault, "IndentationError", "unexpected indent");
}

#[test]
fn test_failure_line_numbers() {
    let failure = failure_of("x = 1\ny = 2\nprint(z)\n");
    assert_eq!(failure.line, Some(3));
    let failure = failure_of("def f():\n    return 1 / 0\n\nf()\n");
    assert_eq!(failure.line, Some(2));
}

#[test]
fn test_output_before_failure_is_kept() {
    let result = run_code("print('start')\nprint(1 / 0)\nprint('never')");
    assert_eq!(result.captured_output, "start\n");
    assert_eq!(result.failure.unwrap().kind, ErrorKind::DivisionByZero);
}

#[test]
fn test_raw_message() {
    let failure = failure_of("print(undefined_name)");
    assert_eq!(failure.raw_message(), "NameError: name 'undefined_name' is not defined");
}
