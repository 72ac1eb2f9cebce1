// End-to-end tests: complete CODE programs run against in-memory input
// and output.

use codei::interpreter::{Config, Interpreter};
use codei::runner::{self, VALID_MESSAGE};
use codei::value::Value;
use codei::ErrorKind;
use pretty_assertions::assert_eq;
use std::io::{self, Cursor, Write};

type TestInterpreter = Interpreter<Cursor<Vec<u8>>, Vec<u8>>;

fn interpreter(input: &str, config: Config) -> TestInterpreter {
    Interpreter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new(), config)
}

fn quiet() -> Config {
    Config {
        scan_prompts: false,
        ..Config::default()
    }
}

fn program(body: &str) -> String {
    format!("BEGIN CODE\n{}\nEND CODE\n", body)
}

/// Run a program body and return (exit code, output).
fn run(body: &str, input: &str) -> (i32, String) {
    let (code, interpreter) = run_source(&program(body), input, quiet());
    (code, output(interpreter))
}

fn run_source(source: &str, input: &str, config: Config) -> (i32, TestInterpreter) {
    let mut interpreter = interpreter(input, config);
    let code = runner::run_with(source, None, &mut interpreter);
    (code, interpreter)
}

fn output(interpreter: TestInterpreter) -> String {
    String::from_utf8(interpreter.into_output()).unwrap()
}

fn valid(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        format!("{}{}\n", text, VALID_MESSAGE)
    } else {
        format!("{}\n{}\n", text, VALID_MESSAGE)
    }
}

// ============================================================================
// Declarations and values
// ============================================================================

#[test]
fn adds_declared_integers() {
    assert_eq!(run("INT x = 5, y = 3\nDISPLAY: x + y", ""), (0, valid("8")));
}

#[test]
fn booleans_display_upper_case() {
    assert_eq!(run("BOOL b = TRUE\nDISPLAY: b", ""), (0, valid("TRUE")));
    assert_eq!(run("BOOL b = \"FALSE\"\nDISPLAY: b", ""), (0, valid("FALSE")));
}

#[test]
fn concatenation_renders_booleans() {
    assert_eq!(
        run("STRING s = \"a\" & TRUE\nDISPLAY: s", ""),
        (0, valid("aTRUE"))
    );
}

#[test]
fn classic_sample_program() {
    let body = "\
INT x, y, z=5
CHAR a_1='n'
BOOL t=\"TRUE\"
x=y=4
a_1='c'
# this is a comment
DISPLAY: x & t & z & $ & a_1 & [#] & \"last\"";
    assert_eq!(run(body, ""), (0, valid("4TRUE5\nc#last")));
}

#[test]
fn mixed_arithmetic_is_float() {
    assert_eq!(
        run("FLOAT f = 2 * 1.5\nDISPLAY: f & \" \" & 7 / 2 & \" \" & 7 / 2.0", ""),
        (0, valid("3.0 3 3.5"))
    );
}

#[test]
fn precedence_and_grouping() {
    assert_eq!(
        run("DISPLAY: 2 + 3 * 4 & \",\" & (2 + 3) * 4 & \",\" & -2 * -3 & \",\" & 10 % 4", ""),
        (0, valid("14,20,6,2"))
    );
}

#[test]
fn logic_and_comparison() {
    let body = "\
INT a = 100, b = 200, c = 300
BOOL d = FALSE
DISPLAY: (a < b AND c <> 200)
DISPLAY: $ & NOT d OR a > c
DISPLAY: $ & ('x' == 'x') & (\"ab\" <> \"ab\")";
    assert_eq!(run(body, ""), (0, valid("TRUE\nTRUE\nTRUEFALSE")));
}

#[test]
fn escapes_and_newlines() {
    assert_eq!(
        run("DISPLAY: [[] & \"x\" & []] & $ & \"a\" & [\\t] & \"b\"", ""),
        (0, valid("[x]\na\tb"))
    );
}

#[test]
fn backslash_escapes_cover_brackets() {
    assert_eq!(
        run("DISPLAY: [\\[] & \"x\" & [\\]] & [\\]", ""),
        (0, valid("[x]\\"))
    );
}

#[test]
fn unknown_escape_is_a_lex_error() {
    let (code, out) = run("DISPLAY: 1\nDISPLAY: [\\q]", "");
    assert_eq!(code, ErrorKind::Lex.exit_code());
    assert_eq!(out, "");
}

#[test]
fn redeclaration_stops_the_run() {
    let (code, out) = run(
        "INT x\nDISPLAY: \"before\"\nINT x\nDISPLAY: \"after\"",
        "",
    );
    assert_eq!(code, ErrorKind::Declaration.exit_code());
    assert_eq!(out, "before");
}

#[test]
fn redeclaration_is_reported_before_the_initializer_runs() {
    let (code, _) = run("INT x\nINT x = 1 / 0", "");
    assert_eq!(code, ErrorKind::Declaration.exit_code());
}

#[test]
fn redeclaration_within_one_statement() {
    let (code, _) = run("INT x, x", "");
    assert_eq!(code, 3);
}

#[test]
fn unknown_type_keyword_is_a_declaration_error() {
    let (code, out) = run("DOUBLE d = 1.0\nDISPLAY: \"never\"", "");
    assert_eq!(code, 3);
    assert_eq!(out, "");
}

#[test]
fn unset_variables_have_no_value() {
    let (code, interpreter) = run_source(&program("INT x\nFLOAT y"), "", quiet());
    assert_eq!(code, 0);
    assert_eq!(interpreter.environment().read("x"), Ok(None));
    assert_eq!(interpreter.environment().read("y"), Ok(None));

    let (code, out) = run("INT x\nDISPLAY: x", "");
    assert_eq!(code, ErrorKind::Runtime.exit_code());
    assert_eq!(out, "");
}

#[test]
fn assignment_skips_type_checks() {
    assert_eq!(
        run("INT n = 1\nn = \"hello\"\nDISPLAY: n", ""),
        (0, valid("hello"))
    );
}

#[test]
fn conversion_failure_keeps_the_original_value() {
    let (code, interpreter) = run_source(&program("INT x = 2.5\nDISPLAY: x"), "", quiet());
    assert_eq!(code, 0);
    assert_eq!(interpreter.warnings().len(), 1);
    assert_eq!(interpreter.warnings()[0].kind, ErrorKind::Conversion);
    assert_eq!(
        output(interpreter),
        valid("Cannot assign FLOAT to INT variable 'x': cannot convert FLOAT to INT\n2.5")
    );
}

#[test]
fn exact_conversions_are_silent() {
    assert_eq!(
        run("FLOAT f = 4\nINT i = 6.0\nSTRING s = 'c'\nDISPLAY: f & \" \" & i & \" \" & s", ""),
        (0, valid("4.0 6 c"))
    );
}

#[test]
fn undeclared_variables_are_runtime_errors() {
    assert_eq!(run("DISPLAY: y", "").0, 4);
    assert_eq!(run("y = 1", "").0, 4);
    assert_eq!(run("SCAN: y", "1\n").0, 4);
}

#[test]
fn invalid_operands_are_runtime_errors() {
    assert_eq!(run("DISPLAY: 1 + \"a\"", "").0, 4);
    assert_eq!(run("DISPLAY: NOT 1", "").0, 4);
    assert_eq!(run("DISPLAY: -TRUE", "").0, 4);
    assert_eq!(run("DISPLAY: 'a' < 'b'", "").0, 4);
    assert_eq!(run("DISPLAY: TRUE AND 1", "").0, 4);
    assert_eq!(run("DISPLAY: 1 / 0", "").0, 4);
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn if_takes_first_true_branch() {
    let body = "\
INT n = 5
IF (n > 10)
BEGIN IF
DISPLAY: \"big\"
END IF
ELSE IF (n > 3)
BEGIN IF
DISPLAY: \"medium\"
END IF
ELSE IF (n > 1)
BEGIN IF
DISPLAY: \"small\"
END IF
ELSE
BEGIN IF
DISPLAY: \"tiny\"
END IF";
    assert_eq!(run(body, ""), (0, valid("medium")));
}

#[test]
fn if_falls_back_to_else() {
    let body = "IF (FALSE)\nBEGIN IF\nDISPLAY: 1\nEND IF\nELSE\nBEGIN IF\nDISPLAY: 2\nEND IF";
    assert_eq!(run(body, ""), (0, valid("2")));
}

#[test]
fn if_condition_must_be_boolean() {
    assert_eq!(run("IF (1)\nBEGIN IF\nDISPLAY: 1\nEND IF", "").0, 4);
}

#[test]
fn while_counts_up() {
    let body = "\
INT i = 1
WHILE (i <= 5)
BEGIN WHILE
DISPLAY: i
i = i + 1
END WHILE";
    assert_eq!(run(body, ""), (0, valid("12345")));
}

#[test]
fn while_may_run_exactly_the_limit() {
    let body = "INT i = 0\nWHILE (i < 1000)\nBEGIN WHILE\ni = i + 1\nEND WHILE";
    let (code, interpreter) = run_source(&program(body), "", quiet());
    assert_eq!(code, 0);
    assert_eq!(interpreter.environment().read("i"), Ok(Some(&Value::Int(1000))));
}

#[test]
fn endless_while_trips_on_iteration_1001() {
    let body = "INT i = 0\nWHILE (TRUE)\nBEGIN WHILE\ni = i + 1\nEND WHILE\nDISPLAY: \"unreachable\"";
    let (code, interpreter) = run_source(&program(body), "", quiet());
    assert_eq!(code, ErrorKind::LoopLimit.exit_code());
    assert_eq!(interpreter.environment().read("i"), Ok(Some(&Value::Int(1000))));
    assert_eq!(output(interpreter), "");
}

#[test]
fn loop_limit_is_configurable() {
    let body = "INT i = 0\nWHILE (i < 20)\nBEGIN WHILE\ni = i + 1\nEND WHILE";
    let config = Config {
        max_loop_iterations: 10,
        ..quiet()
    };
    let (code, interpreter) = run_source(&program(body), "", config);
    assert_eq!(code, 5);
    assert_eq!(interpreter.environment().read("i"), Ok(Some(&Value::Int(10))));
}

#[test]
fn switch_runs_one_case_without_fallthrough() {
    let body = "\
INT n = 2
SWITCH (n)
BEGIN SWITCH
CASE 1:
DISPLAY: \"one\"
CASE 2:
DISPLAY: \"two\"
CASE 2:
DISPLAY: \"again\"
DEFAULT:
DISPLAY: \"other\"
END SWITCH";
    assert_eq!(run(body, ""), (0, valid("two")));
}

#[test]
fn switch_uses_default() {
    let body = "CHAR c = 'z'\nSWITCH (c)\nBEGIN SWITCH\nCASE 'a':\nDISPLAY: 1\nDEFAULT:\nDISPLAY: 0\nEND SWITCH";
    assert_eq!(run(body, ""), (0, valid("0")));
}

#[test]
fn switch_case_type_mismatch_aborts() {
    let body = "\
INT n = 1
SWITCH (n)
BEGIN SWITCH
CASE \"1\":
DISPLAY: \"text\"
CASE 1:
DISPLAY: \"int\"
END SWITCH";
    let (code, out) = run(body, "");
    assert_eq!(code, 4);
    assert_eq!(out, "");
}

// ============================================================================
// Scan
// ============================================================================

#[test]
fn scan_reads_one_line_per_variable() {
    let body = "\
INT a
FLOAT f
CHAR c
BOOL b
STRING s
SCAN: a, f
SCAN: c, b, s
DISPLAY: a & \"|\" & f & \"|\" & c & \"|\" & b & \"|\" & s";
    assert_eq!(
        run(body, "7\n2.5\nq\nTRUE\nhello world\n"),
        (0, valid("7|2.5|q|TRUE|hello world"))
    );
}

#[test]
fn bad_scan_input_keeps_the_previous_value() {
    let (code, interpreter) = run_source(
        &program("INT a = 1\nSCAN: a\nDISPLAY: a"),
        "abc\n",
        quiet(),
    );
    assert_eq!(code, 0);
    assert_eq!(interpreter.warnings().len(), 1);
    assert_eq!(interpreter.warnings()[0].kind, ErrorKind::Input);
    assert_eq!(
        output(interpreter),
        valid("Invalid input 'abc' for INT variable 'a'\n1")
    );
}

#[test]
fn float_scan_rejects_integers() {
    let (code, interpreter) = run_source(&program("FLOAT f\nSCAN: f"), "5\n", quiet());
    assert_eq!(code, 0);
    assert_eq!(interpreter.environment().read("f"), Ok(None));
}

#[test]
fn scan_prompts_precede_each_read() {
    let (code, interpreter) = run_source(
        &program("INT a, b\nSCAN: a, b\nDISPLAY: a + b"),
        "1\n2\n",
        Config::default(),
    );
    assert_eq!(code, 0);
    assert_eq!(
        output(interpreter),
        format!("Enter value for a: Enter value for b: 3\n{}\n", VALID_MESSAGE)
    );
}

#[test]
fn scan_at_end_of_input_fails() {
    assert_eq!(run("INT a\nSCAN: a", "").0, 4);
}

// ============================================================================
// Program envelope
// ============================================================================

#[test]
fn missing_envelope_runs_nothing() {
    let (code, interpreter) = run_source("DISPLAY: \"hi\"\nEND CODE\n", "", quiet());
    assert_eq!(code, ErrorKind::Structure.exit_code());
    assert_eq!(output(interpreter), "");

    let (code, _) = run_source("BEGIN CODE\nDISPLAY: \"hi\"\n", "", quiet());
    assert_eq!(code, 2);
}

#[test]
fn content_after_end_code_is_rejected() {
    let (code, interpreter) =
        run_source("BEGIN CODE\nDISPLAY: 1\nEND CODE\nDISPLAY: 2\n", "", quiet());
    assert_eq!(code, 2);
    assert_eq!(output(interpreter), "");
}

#[test]
fn comments_around_the_envelope_are_fine() {
    let source = "# header\nBEGIN CODE\nDISPLAY: 1\nEND CODE\n# trailer\n";
    let (code, interpreter) = run_source(source, "", quiet());
    assert_eq!(code, 0);
    assert_eq!(output(interpreter), valid("1"));
}

#[test]
fn syntax_errors_exit_before_running() {
    let (code, interpreter) = run_source(&program("DISPLAY: 1\nDISPLAY: (2"), "", quiet());
    assert_eq!(code, ErrorKind::Parse.exit_code());
    assert_eq!(output(interpreter), "");
}

#[test]
fn parse_errors_name_the_offending_token() {
    let error = runner::parse(&program("1 = x")).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Parse);
    assert_eq!(error.message, "Expected statement, found '1'");

    let error = runner::parse(&program("DISPLAY: 1 )")).unwrap_err();
    assert_eq!(error.message, "Unexpected ')' after statement");
}

/// Holds writes until `flush`, like a line-buffered terminal.
#[derive(Default)]
struct HeldOutput {
    pending: Vec<u8>,
    flushed: Vec<u8>,
}

impl Write for HeldOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushed.append(&mut self.pending);
        Ok(())
    }
}

#[test]
fn output_before_a_fatal_error_is_flushed() {
    let source = program("INT x = 1\nDISPLAY: \"before\"\nDISPLAY: x / 0");
    let mut interpreter = Interpreter::new(Cursor::new(Vec::new()), HeldOutput::default(), quiet());
    let code = runner::run_with(&source, None, &mut interpreter);
    assert_eq!(code, ErrorKind::Runtime.exit_code());

    let output = interpreter.into_output();
    assert_eq!(String::from_utf8(output.flushed).unwrap(), "before");
    assert!(output.pending.is_empty());
}

#[test]
fn interpreters_do_not_share_state() {
    let source = program("INT x = 1\nDISPLAY: x");
    let (first, _) = run_source(&source, "", quiet());
    let (second, _) = run_source(&source, "", quiet());
    assert_eq!((first, second), (0, 0));
}
