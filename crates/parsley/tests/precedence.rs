use parsley::parse_program;
use parsley::surface::{Expr, PrefixOp, Stmt};

/// Fully parenthesized prefix form of an expression, e.g. `(+ 1 (* 2 3))`.
fn sexpr(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.name.clone(),
        Expr::Literal(_) => literal_text(expr),
        Expr::Prefix { op, operand, .. } => {
            let symbol = match op {
                PrefixOp::Not => "!",
                PrefixOp::Neg => "-",
            };
            format!("({symbol} {})", sexpr(operand))
        }
        Expr::Infix {
            op, left, right, ..
        } => format!("({} {} {})", op.symbol(), sexpr(left), sexpr(right)),
        Expr::Call { callee, args, .. } => {
            let mut text = format!("(call {}", sexpr(callee));
            for arg in args {
                text.push(' ');
                text.push_str(&sexpr(arg));
            }
            text.push(')');
            text
        }
        Expr::Index { target, index, .. } => format!("([] {} {})", sexpr(target), sexpr(index)),
        Expr::Member {
            target, property, ..
        } => format!("(. {} {})", sexpr(target), property.name),
        Expr::Group { inner, .. } => sexpr(inner),
        Expr::Read { source, .. } => format!("(<== {})", sexpr(source)),
        Expr::Try { call, .. } => format!("(try {})", sexpr(call)),
        other => panic!("no s-expression form for {other:?}"),
    }
}

fn literal_text(expr: &Expr) -> String {
    use parsley::surface::Literal;
    match expr {
        Expr::Literal(Literal::Int { value, .. }) => value.to_string(),
        Expr::Literal(Literal::Bool { value, .. }) => value.to_string(),
        Expr::Literal(Literal::String { value, .. }) => format!("{value:?}"),
        Expr::Literal(Literal::Regex { pattern, .. }) => format!("/{pattern}/"),
        other => panic!("unexpected literal {other:?}"),
    }
}

fn parse_expr(src: &str) -> String {
    let program = parse_program(src);
    assert!(
        program.diagnostics.is_empty(),
        "{src:?}: unexpected diagnostics: {:?}",
        program.diagnostics
    );
    assert_eq!(program.statements.len(), 1, "{src:?}");
    match &program.statements[0] {
        Stmt::Expr(expr) => sexpr(expr),
        other => panic!("{src:?}: expected expression statement, got {other:?}"),
    }
}

#[test]
fn arithmetic_levels() {
    let cases = [
        ("1 + 2 * 3", "(+ 1 (* 2 3))"),
        ("1 * 2 + 3", "(+ (* 1 2) 3)"),
        ("a % b + c", "(+ (% a b) c)"),
        ("a / b * c", "(* (/ a b) c)"),
        ("a - b - c", "(- (- a b) c)"),
        ("(a - b) * c", "(* (- a b) c)"),
        ("a ++ b + c", "(+ (++ a b) c)"),
        ("a + b ++ c", "(+ a (++ b c))"),
        ("1..n + 1", "(+ (.. 1 n) 1)"),
    ];
    for (src, expected) in cases {
        assert_eq!(parse_expr(src), expected, "{src}");
    }
}

#[test]
fn comparison_and_logic_levels() {
    let cases = [
        ("a or b and c", "(or a (and b c))"),
        ("a and b or c", "(or (and a b) c)"),
        ("a ?? b or c", "(or (?? a b) c)"),
        ("a == b < c", "(== a (< b c))"),
        ("a < b == c", "(== (< a b) c)"),
        ("a == b == c", "(== (== a b) c)"),
        ("a in b and c", "(and (in a b) c)"),
        ("a not in b or c", "(or (not in a b) c)"),
        ("a is B or c", "(or (is a B) c)"),
        ("x is not Y and z", "(and (is not x Y) z)"),
        ("a ~ /x/ and b", "(and (~ a /x/) b)"),
        ("a !~ /x/", "(!~ a /x/)"),
        ("x <=?=> q", "(<=?=> x q)"),
    ];
    for (src, expected) in cases {
        assert_eq!(parse_expr(src), expected, "{src}");
    }
}

#[test]
fn prefix_binds_tighter_than_infix_but_looser_than_postfix() {
    let cases = [
        ("not a and b", "(and (! a) b)"),
        ("!a == b", "(== (! a) b)"),
        ("-a * b", "(* (- a) b)"),
        ("-x.y", "(- (. x y))"),
        ("-f(1)", "(- (call f 1))"),
        ("<== file(p) ++ x", "(++ (<== (call file p)) x)"),
        ("try load(x) ?? y", "(?? (try (call load x)) y)"),
    ];
    for (src, expected) in cases {
        assert_eq!(parse_expr(src), expected, "{src}");
    }
}

#[test]
fn postfix_chains_left_to_right() {
    assert_eq!(parse_expr("f(x)[0].y"), "(. ([] (call f x) 0) y)");
    assert_eq!(parse_expr("a.b.c(1, 2)"), "(call (. (. a b) c) 1 2)");
    assert_eq!(parse_expr("m[k][j]"), "([] ([] m k) j)");
}

#[test]
fn call_does_not_cross_into_a_parenthesized_statement() {
    let program = parse_program("let a = 1\n(a + 1)");
    assert!(program.diagnostics.is_empty());
    assert_eq!(program.statements.len(), 2);
}
