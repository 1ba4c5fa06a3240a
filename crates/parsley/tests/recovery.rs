use parsley::surface::{Expr, Pattern, Stmt};
use parsley::Program;
use parsley::{
    format_program, parse_program, parse_program_with_options, render_diagnostics, FormatOptions,
    ParseOptions,
};

fn codes_in_order(src: &str) -> Vec<String> {
    parse_program(src)
        .diagnostics
        .into_iter()
        .map(|diag| diag.code)
        .collect()
}

fn let_names(statements: &[Stmt]) -> Vec<String> {
    statements
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::Let {
                pattern: Pattern::Ident(name),
                ..
            } => Some(name.name.clone()),
            _ => None,
        })
        .collect()
}

fn codes_by_line(program: &Program) -> Vec<(usize, &str)> {
    program
        .diagnostics
        .iter()
        .map(|d| (d.line(), d.code.as_str()))
        .collect()
}

/// Parses on a thread with the 8 MiB stack a command-line run gets.
fn parse_on_main_sized_stack(src: String) -> Program {
    std::thread::Builder::new()
        .stack_size(8 << 20)
        .spawn(move || parse_program(&src))
        .expect("spawn parser thread")
        .join()
        .expect("parser thread")
}

#[test]
fn error_inside_a_function_body_stays_inside_it() {
    let src = "let f = fn(x) {\n    let y = x +\n}\nlet g = 2\n";
    let program = parse_program(src);
    assert_eq!(
        program.diagnostics.iter().map(|d| d.code.as_str()).collect::<Vec<_>>(),
        vec!["E1500"]
    );
    assert_eq!(program.diagnostics[0].line(), 3);
    assert_eq!(let_names(&program.statements), vec!["f", "g"]);
}

#[test]
fn error_inside_a_tag_body_keeps_the_close_tag() {
    let program = parse_program("<div>\nlet = 1\n</div>\nlet ok = 2");
    let codes: Vec<&str> = program.diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["E1501"]);
    assert_eq!(program.statements.len(), 2);
    assert_eq!(let_names(&program.statements), vec!["ok"]);
}

#[test]
fn mismatched_tag_does_not_hide_later_statements() {
    let program = parse_program("<a>\"x\"</b>\nlet z = 1");
    assert_eq!(program.diagnostics.len(), 1);
    assert_eq!(let_names(&program.statements), vec!["z"]);
}

#[test]
fn keyword_typo_skips_the_whole_braced_body() {
    assert_eq!(
        codes_in_order("fucntion add(a, b) { return a + b }\nlet r = try value"),
        vec!["E1506", "E1507"]
    );
}

#[test]
fn lexer_and_parser_diagnostics_are_merged_by_position() {
    let program = parse_program("let b = 1 +\nlet a = \"open\nlet c = 3");
    let lines: Vec<(usize, &str)> = program
        .diagnostics
        .iter()
        .map(|d| (d.line(), d.code.as_str()))
        .collect();
    assert_eq!(lines, vec![(2, "E1500"), (2, "E1001")]);
    assert!(let_names(&program.statements).contains(&"c".to_string()));
}

#[test]
fn diagnostic_count_is_capped_by_options() {
    let src = "let = 1\n".repeat(10);
    let options = ParseOptions {
        max_diagnostics: 3,
        ..ParseOptions::default()
    };
    let program = parse_program_with_options(&src, &options);
    assert_eq!(program.diagnostics.len(), 3);
    assert!(program.diagnostics.iter().all(|d| d.code == "E1501"));
    assert_eq!(program.diagnostics[2].line(), 3);
}

#[test]
fn rendered_report_names_file_line_and_hint() {
    let program = parse_program("let x = 1\nfucntion f() { x }");
    let rendered = render_diagnostics("main.pars", &program.diagnostics);
    assert_eq!(
        rendered,
        "error[E1506] main.pars:2:1 unknown keyword 'fucntion'\n  hint: did you mean 'function'?"
    );
}

#[test]
fn malformed_input_never_panics() {
    let inputs = [
        "", "}", ")))", "]]", "<", "</", "</>", "<a", "<a b=", "<a {", "@", "@(", "@{", "`${",
        "`{", "'@{", "'", "\"", "\"\\", "/", "/[", "let", "let x", "let x =", "fn(", "fn(a,",
        "for (", "for x in", "if", "if (", "if x", "else", "[1,", "{a:", "{...", "<style>",
        "<style>@{", "@query(", "@schema", "@schema X {", "@table", "@table(S) [", "$", "#",
        "USD#", "$1.2.3", "1..", "a.", "x[?", "x[1:", "import", "import @std/", "export",
        "export computed", "<=/=", "==>", "a ==>", "<==", "check", "check x", "return",
        "not", "a not", "is", "a is not", "try", "@2024-13-45", "@now(", "@-", "@./",
        "@https://", "<!--", "<!DOCTYPE", "<![CDATA[", "<?xml", "@transaction {", "a ~",
        "\u{feff}x", "ä = 1", "let 🙂 = 1",
    ];
    for input in inputs {
        let program = parse_program(input);
        let _ = format_program(&program, &FormatOptions::default());
        for window in program.diagnostics.windows(2) {
            assert!(
                window[0].span.start <= window[1].span.start,
                "{input:?}: diagnostics out of order"
            );
        }
    }
}

#[test]
fn recovery_resumes_on_the_next_line() {
    let program = parse_program("x = )\ny = ]\nz = )");
    assert_eq!(
        codes_by_line(&program),
        vec![(1, "E1500"), (2, "E1500"), (3, "E1500")]
    );
}

#[test]
fn call_after_a_broken_statement_is_kept() {
    let program = parse_program("let a = )\nlog(\"ok\")\nlet b = 2");
    assert_eq!(codes_by_line(&program), vec![(1, "E1500")]);
    assert_eq!(program.statements.len(), 2);
    assert!(matches!(&program.statements[0], Stmt::Expr(Expr::Call { .. })));
    assert_eq!(let_names(&program.statements), vec!["b"]);
}

#[test]
fn recovery_stops_in_front_of_if_and_for() {
    let program = parse_program(
        "let a = )\nif (x > 0) { let b = ] }\nfor (i in xs) { let c = ) }",
    );
    assert_eq!(
        codes_by_line(&program),
        vec![(1, "E1500"), (2, "E1500"), (3, "E1500")]
    );
    assert!(matches!(
        program.statements.as_slice(),
        [Stmt::Expr(Expr::If { .. }), Stmt::Expr(Expr::For { .. })]
    ));
}

#[test]
fn leading_keyword_on_the_same_line_ends_recovery() {
    let program = parse_program("let a = ) ] if (ok) { 1 }");
    assert_eq!(codes_by_line(&program), vec![(1, "E1500")]);
    assert!(matches!(
        program.statements.as_slice(),
        [Stmt::Expr(Expr::If { .. })]
    ));
}

#[test]
fn deep_parentheses_report_nesting_instead_of_overflowing() {
    let depth = 100_000;
    let src = format!("let x = {}1{}\nlet y = 2", "(".repeat(depth), ")".repeat(depth));
    let program = parse_on_main_sized_stack(src);
    assert_eq!(codes_by_line(&program), vec![(1, "E1518")]);
    assert!(program.diagnostics[0].message.contains("nesting is too deep"));
    assert_eq!(let_names(&program.statements), vec!["x", "y"]);
}

#[test]
fn deep_input_of_every_shape_is_reported() {
    let sources = vec![
        "[".repeat(50_000),
        "{".repeat(50_000),
        format!("{}x", "!".repeat(50_000)),
        format!("let {} = v", "[".repeat(50_000)),
        format!("{}{}", "<div>".repeat(5_000), "</div>".repeat(5_000)),
        format!("{}x", "if (a) 1 else ".repeat(5_000)),
    ];
    for src in sources {
        let head: String = src.chars().take(12).collect();
        let program = parse_on_main_sized_stack(src);
        assert!(
            program.diagnostics.iter().any(|d| d.code == "E1518"),
            "{head:?}: {:?}",
            program.diagnostics.first()
        );
        let _ = format_program(&program, &FormatOptions::default());
    }
}

#[test]
fn moderate_nesting_parses_cleanly() {
    let src = format!(
        "let x = {}1{}\n{}\"in\"{}",
        "[".repeat(40),
        "]".repeat(40),
        "<b>".repeat(20),
        "</b>".repeat(20)
    );
    let program = parse_on_main_sized_stack(src);
    assert!(program.diagnostics.is_empty(), "{:?}", program.diagnostics);
    assert_eq!(program.statements.len(), 2);
}
