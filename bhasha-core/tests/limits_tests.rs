//! 资源限制测试

mod common;
use bhasha_core::{ErrorKind, LimitConfig};
use common::run_with_limits;

#[test]
fn test_step_limit_stops_infinite_loop() {
    let limits = LimitConfig {
        max_steps: 10_000,
        timeout_ms: 0,
        ..LimitConfig::default()
    };
    let result = run_with_limits("while True:\n    pass", limits);
    let failure = result.failure.unwrap();
    assert_eq!(failure.kind, ErrorKind::ResourceExceeded);
    assert_eq!(failure.exception, "TimeoutError");
}

#[test]
fn test_wall_clock_limit() {
    let limits = LimitConfig {
        max_steps: 0,
        timeout_ms: 50,
        ..LimitConfig::default()
    };
    let result = run_with_limits("while True:\n    pass", limits);
    let failure = result.failure.unwrap();
    assert_eq!(failure.kind, ErrorKind::ResourceExceeded);
    assert_eq!(failure.detail, "execution timed out after 50 ms");
}

#[test]
fn test_recursion_limit() {
    let limits = LimitConfig {
        max_recursion_depth: 50,
        ..LimitConfig::default()
    };
    let result = run_with_limits("def f(n):\n    return f(n + 1)\nf(0)", limits);
    let failure = result.failure.unwrap();
    assert_eq!(failure.exception, "RecursionError");
    assert_eq!(failure.detail, "maximum recursion depth exceeded");
}

#[test]
fn test_output_limit_keeps_prefix() {
    let limits = LimitConfig {
        max_output_bytes: 10,
        ..LimitConfig::default()
    };
    let result = run_with_limits("for i in range(100):\n    print('abc')", limits);
    assert_eq!(result.captured_output, "abc\nabc\nab");
    assert_eq!(result.failure.unwrap().kind, ErrorKind::ResourceExceeded);
}

#[test]
fn test_collection_limit() {
    let limits = LimitConfig {
        max_collection_len: 1000,
        ..LimitConfig::default()
    };
    let result = run_with_limits("xs = list(range(5000))", limits);
    let failure = result.failure.unwrap();
    assert_eq!(failure.exception, "MemoryError");
    assert_eq!(failure.kind, ErrorKind::ResourceExceeded);
}

#[test]
fn test_string_limit() {
    let limits = LimitConfig {
        max_string_len: 100,
        ..LimitConfig::default()
    };
    let result = run_with_limits("s = 'x' * 1000", limits);
    assert_eq!(result.failure.unwrap().exception, "MemoryError");
}

#[test]
fn test_integer_overflow_is_resource_exceeded() {
    let result = run_with_limits("print(2 ** 100)", LimitConfig::default());
    let failure = result.failure.unwrap();
    assert_eq!(failure.exception, "OverflowError");
    assert_eq!(failure.kind, ErrorKind::ResourceExceeded);
}

#[test]
fn test_huge_range_unpack_is_not_materialized() {
    let result = run_with_limits("a, b = range(10**12)", LimitConfig::default());
    let failure = result.failure.unwrap();
    assert_eq!(failure.exception, "ValueError");
    assert_eq!(failure.detail, "too many values to unpack (expected 2)");

    let result = run_with_limits("a, b, c = range(2)", LimitConfig::default());
    assert_eq!(
        result.failure.unwrap().detail,
        "not enough values to unpack (expected 3, got 2)"
    );
}

#[test]
fn test_huge_range_extend_hits_collection_limit() {
    let result = run_with_limits("x = []\nx += range(10**12)", LimitConfig::default());
    let failure = result.failure.unwrap();
    assert_eq!(failure.exception, "MemoryError");
    assert_eq!(failure.kind, ErrorKind::ResourceExceeded);

    let result = run_with_limits("x = [1, 2]\nx[0:1] = range(10**12)", LimitConfig::default());
    assert_eq!(result.failure.unwrap().exception, "MemoryError");

    let result = run_with_limits("x = [1, 2]\nx[0:1] = 5", LimitConfig::default());
    assert_eq!(result.failure.unwrap().detail, "can only assign an iterable");
}

#[test]
fn test_mutually_referencing_lists_compare_with_recursion_error() {
    let code = "a = []\nb = []\na.append(b)\nb.append(a)\nprint(a == b)";
    let result = run_with_limits(code, LimitConfig::default());
    let failure = result.failure.unwrap();
    assert_eq!(failure.exception, "RecursionError");
    assert_eq!(failure.kind, ErrorKind::ResourceExceeded);
    assert_eq!(failure.detail, "maximum recursion depth exceeded in comparison");
    assert_eq!(failure.line, Some(5));
}

#[test]
fn test_deeply_nested_list_repr_is_bounded() {
    let code = "x = []\nfor i in range(5000):\n    x = [x]\nprint(str(x))";
    let result = run_with_limits(code, LimitConfig::default());
    let failure = result.failure.unwrap();
    assert_eq!(failure.exception, "RecursionError");
    assert_eq!(
        failure.detail,
        "maximum recursion depth exceeded while getting the repr of an object"
    );

    let code = "x = []\ny = []\nfor i in range(5000):\n    x = [x]\n    y = [y]\nprint(x == y)";
    let result = run_with_limits(code, LimitConfig::default());
    assert_eq!(result.failure.unwrap().exception, "RecursionError");
}

#[test]
fn test_deeply_nested_expression_is_resource_exceeded() {
    let code = format!("x = {}1", "-".repeat(200_000));
    let result = run_with_limits(&code, LimitConfig::default());
    let failure = result.failure.unwrap();
    assert_eq!(failure.exception, "RecursionError");
    assert_eq!(failure.kind, ErrorKind::ResourceExceeded);
}
