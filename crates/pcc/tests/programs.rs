//! End-to-end tests: P source in, printed lines out

mod support;

use pretty_assertions::assert_eq;
use support::{run, run_with_input};

fn lines(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_integer_sum() {
    let output = run(
        "var a, b : integer;
         a := 3;
         b := 4;
         print a + b;",
    );
    assert_eq!(output, lines(&["7"]));
}

#[test]
fn test_mixed_arithmetic_promotes_to_real() {
    assert_eq!(run("print 1.5 + 2;"), lines(&["3.5"]));
    assert_eq!(run("var r : real; r := 3; print r / 2;"), lines(&["1.5"]));
    let output = run(
        "var x : real; var y : integer;
         x := 1.5;
         y := 2;
         print(x + y);",
    );
    assert_eq!(output, lines(&["3.5"]));
}

#[test]
fn test_operator_precedence() {
    let output = run(
        "print 1 + 2 * 3;
         print (1 + 2) * 3;
         print 7 mod 3;
         print 7 / 2;
         print -4 + 1;",
    );
    assert_eq!(output, lines(&["7", "9", "1", "3", "-3"]));
}

#[test]
fn test_relational_and_logical() {
    let output = run(
        "print 1 < 2;
         print 2 <= 1;
         print 3 = 3;
         print 3 <> 3;
         print 1.5 > 0.5;
         print not (1 >= 2) and true;
         print false or 2 > 1;",
    );
    assert_eq!(output, lines(&["1", "0", "1", "0", "1", "1", "1"]));
}

#[test]
fn test_for_loop_is_half_open() {
    assert_eq!(run("for i := 0 to 3 do print i;"), lines(&["0", "1", "2"]));
}

#[test]
fn test_nested_loops_over_constant_bounds() {
    let output = run(
        "var n : 2;
         for i := 0 to n do
           for j := 1 to 3 do
             print i * 10 + j;",
    );
    assert_eq!(output, lines(&["1", "2", "11", "12"]));
}

#[test]
fn test_while_and_if() {
    let output = run(
        "var i, s : integer;
         i := 0;
         s := 0;
         while i < 5 do begin
           if i mod 2 = 0 then s := s + i; else s := s - 1;
           i := i + 1;
         end
         print s;",
    );
    // 0 - 1 + 2 - 1 + 4
    assert_eq!(output, lines(&["4"]));
}

#[test]
fn test_recursive_function() {
    let output = run(
        "function fact(n : integer) : integer
         begin
           if n <= 1 then return 1;
           return n * fact(n - 1);
         end
         print fact(5);
         print fact(1);",
    );
    assert_eq!(output, lines(&["120", "1"]));
}

#[test]
fn test_arguments_arrive_in_order() {
    let output = run(
        "function sub(a, b : integer) : integer begin return a - b; end
         function scale(x : real; k : integer) : real begin return x * k; end
         print sub(10, 3);
         print scale(1.5, 4);",
    );
    assert_eq!(output, lines(&["7", "6"]));
}

#[test]
fn test_procedure_call_statement() {
    let output = run(
        "var total : integer;
         function bump(by : integer) begin total := total + by; end
         total := 1;
         bump(2);
         bump(3);
         print total;",
    );
    assert_eq!(output, lines(&["6"]));
}

#[test]
fn test_discarded_function_result() {
    let output = run(
        "function one() : integer begin print 9; return 1; end
         one();
         print 2;",
    );
    assert_eq!(output, lines(&["9", "2"]));
}

#[test]
fn test_global_two_dimensional_array() {
    let output = run(
        "var m : array[2][3] of integer;
         for i := 0 to 2 do
           for j := 0 to 3 do
             m[i][j] := i * 10 + j;
         print m[1][2];
         print m[0][1];",
    );
    assert_eq!(output, lines(&["12", "1"]));
}

#[test]
fn test_local_array_and_computed_index() {
    let output = run(
        "function sum() : integer
         begin
           var v : array[4] of integer;
           var i, s : integer;
           i := 0;
           while i < 4 do begin v[i] := i * i; i := i + 1; end
           s := 0;
           i := 0;
           while i < 4 do begin s := s + v[i]; i := i + 1; end
           return s;
         end
         print sum();",
    );
    assert_eq!(output, lines(&["14"]));
}

#[test]
fn test_array_parameter_is_by_reference() {
    let output = run(
        "var data : array[3] of integer;
         function fill(a : array[3] of integer; k : integer)
         begin
           for i := 0 to 3 do a[i] := k + i;
         end
         fill(data, 5);
         print data[0];
         print data[2];",
    );
    assert_eq!(output, lines(&["5", "7"]));
}

#[test]
fn test_constants() {
    let output = run(
        "var limit : 3;
         var greeting : \"hello\";
         var half : 0.5;
         print limit;
         print greeting;
         print half;
         function f() : integer begin var k : -2; return k * limit; end
         print f();",
    );
    assert_eq!(output, lines(&["3", "hello", "0.5", "-6"]));
}

#[test]
fn test_string_literals() {
    assert_eq!(
        run("print \"a \\\"quoted\\\" word\"; print \"x\";"),
        lines(&["a \"quoted\" word", "x"])
    );
}

#[test]
fn test_block_scopes_shadow_globals() {
    let output = run(
        "var x : integer;
         x := 1;
         begin
           var x : integer;
           x := 2;
           print x;
         end
         print x;",
    );
    assert_eq!(output, lines(&["2", "1"]));
}

#[test]
fn test_read_statements() {
    let output = run_with_input(
        "var n : integer; var r : real;
         read n;
         read r;
         print n * 2;
         print r + 1;",
        &["21", "0.25"],
    );
    assert_eq!(output, lines(&["42", "1.25"]));
}

#[test]
fn test_real_comparison_and_negation() {
    let output = run(
        "var r : real;
         r := -2.5;
         print -r;
         if r < 0.0 then print \"negative\"; else print \"positive\";",
    );
    assert_eq!(output, lines(&["2.5", "negative"]));
}

#[test]
fn test_partially_indexed_row_as_argument() {
    let output = run(
        "var m : array[2][3] of integer;
         function first(row : array[3] of integer) : integer begin return row[0]; end
         m[1][0] := 42;
         print first(m[1]);",
    );
    assert_eq!(output, lines(&["42"]));
}

#[test]
fn test_runtime_calls_with_values_on_stack() {
    // reads and prints run with operands still pushed
    let output = run_with_input(
        "var a : array[2] of integer;
         function echo(n : integer) : integer begin print n; return n; end
         read a[1];
         print 1 + echo(2 + echo(a[1]));",
        &["5"],
    );
    assert_eq!(output, lines(&["5", "7", "8"]));
}
