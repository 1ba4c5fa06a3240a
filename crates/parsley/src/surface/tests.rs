use crate::config::ParseOptions;
use crate::diagnostics::Diagnostic;
use crate::surface::{
    import_binding, parse_program, parse_program_with_options, AssignTarget, AttrValue,
    Attribute, Branch, ComputedBody, DatetimeKind, DictKey, DslKind, ExportItem, Expr, InfixOp,
    Literal, NowKind, Pattern, PrefixOp, Stmt, TemplateKind, TemplatePart, WriteMode,
};

fn diag_codes(diags: &[Diagnostic]) -> Vec<String> {
    let mut codes: Vec<String> = diags.iter().map(|d| d.code.clone()).collect();
    codes.sort();
    codes
}

fn parse_ok(src: &str) -> Vec<Stmt> {
    let program = parse_program(src);
    assert!(
        program.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        program.diagnostics
    );
    program.statements
}

fn single_expr(src: &str) -> Expr {
    let mut statements = parse_ok(src);
    assert_eq!(statements.len(), 1, "statements: {statements:?}");
    match statements.remove(0) {
        Stmt::Expr(expr) => expr,
        other => panic!("expected an expression statement, got {other:?}"),
    }
}

fn let_value(src: &str) -> Expr {
    let mut statements = parse_ok(src);
    match statements.remove(0) {
        Stmt::Let { value, .. } => value,
        other => panic!("expected let, got {other:?}"),
    }
}

fn infix_parts(expr: &Expr) -> (InfixOp, &Expr, &Expr) {
    match expr {
        Expr::Infix {
            op, left, right, ..
        } => (*op, left, right),
        other => panic!("expected infix, got {other:?}"),
    }
}

fn ident_name(expr: &Expr) -> &str {
    match expr {
        Expr::Ident(name) => &name.name,
        other => panic!("expected identifier, got {other:?}"),
    }
}

#[test]
fn let_binds_sum_with_product_on_the_right() {
    let statements = parse_ok("let x = 1 + 2 * 3");
    let Stmt::Let { pattern, value, .. } = &statements[0] else {
        panic!("expected let");
    };
    assert!(matches!(pattern, Pattern::Ident(name) if name.name == "x"));
    let (op, left, right) = infix_parts(value);
    assert_eq!(op, InfixOp::Add);
    assert!(matches!(left, Expr::Literal(Literal::Int { value: 1, .. })));
    let (inner, _, _) = infix_parts(right);
    assert_eq!(inner, InfixOp::Mul);
}

#[test]
fn logical_and_binds_tighter_than_or() {
    let expr = single_expr("a and b or c");
    let (op, left, right) = infix_parts(&expr);
    assert_eq!(op, InfixOp::Or);
    assert_eq!(infix_parts(left).0, InfixOp::And);
    assert_eq!(ident_name(right), "c");
}

#[test]
fn subtraction_is_left_associative() {
    let expr = single_expr("a - b - c");
    let (op, left, right) = infix_parts(&expr);
    assert_eq!(op, InfixOp::Sub);
    assert_eq!(infix_parts(left).0, InfixOp::Sub);
    assert_eq!(ident_name(right), "c");
}

#[test]
fn if_with_parentheses_takes_expression_branches() {
    let expr = single_expr(r#"if (x > 0) "yes" else "no""#);
    let Expr::If {
        condition,
        consequence,
        alternative,
        ..
    } = expr
    else {
        panic!("expected if");
    };
    assert_eq!(infix_parts(&condition).0, InfixOp::Gt);
    assert!(matches!(consequence, Branch::Expr(_)));
    assert!(matches!(alternative, Some(Branch::Expr(_))));
}

#[test]
fn else_if_chains_nest_in_the_alternative() {
    let expr = single_expr("if (a) 1 else if (b) 2 else 3");
    let Expr::If { alternative, .. } = expr else {
        panic!("expected if");
    };
    let Some(Branch::Expr(nested)) = alternative else {
        panic!("expected else-if");
    };
    assert!(matches!(*nested, Expr::If { alternative: Some(_), .. }));
}

#[test]
fn if_without_parentheses_requires_braces() {
    let program = parse_program(r#"if x > 0 "yes""#);
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1509"]);
    let braced = single_expr("if x > 0 { 1 }");
    assert!(matches!(braced, Expr::If { consequence: Branch::Block(_), .. }));
}

#[test]
fn assignment_inside_if_condition_is_reported() {
    let program = parse_program("if (x = 1) { 2 }");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1510"]);
    assert!(program.diagnostics[0].message.contains("did you mean '=='"));
}

#[test]
fn for_loop_body_holds_a_paired_tag() {
    let expr = single_expr("for (item in items) { <li>item</li> }");
    let Expr::For {
        key, value, body, ..
    } = expr
    else {
        panic!("expected for");
    };
    assert!(key.is_none());
    assert!(matches!(value, Pattern::Ident(ref name) if name.name == "item"));
    assert_eq!(body.len(), 1);
    let Stmt::Expr(Expr::Tag(tag)) = &body[0] else {
        panic!("expected tag statement, got {:?}", body[0]);
    };
    assert_eq!(tag.name, "li");
    let children = tag.children.as_ref().expect("paired tag");
    assert_eq!(children.len(), 1);
    assert!(matches!(&children[0], Stmt::Expr(Expr::Ident(name)) if name.name == "item"));
}

#[test]
fn for_accepts_key_value_and_unparenthesized_headers() {
    let pair = single_expr("for (k, v in dict) { k }");
    assert!(matches!(pair, Expr::For { key: Some(_), .. }));
    let bare = single_expr("for x in xs { x }");
    assert!(matches!(bare, Expr::For { key: None, .. }));
}

#[test]
fn for_with_source_and_function_is_a_map() {
    let expr = single_expr("for (xs) fn(x) { x * 2 }");
    let Expr::ForMap {
        iterable, mapper, ..
    } = expr
    else {
        panic!("expected for-map");
    };
    assert_eq!(ident_name(&iterable), "xs");
    assert!(matches!(*mapper, Expr::Function { .. }));
}

#[test]
fn slash_is_division_after_an_operand_and_regex_elsewhere() {
    let division = single_expr("a / b");
    assert_eq!(infix_parts(&division).0, InfixOp::Div);

    let regex = single_expr("/abc/i");
    assert!(matches!(
        regex,
        Expr::Literal(Literal::Regex { ref pattern, ref flags, .. }) if pattern == "abc" && flags == "i"
    ));

    let mixed = single_expr("a / /abc/");
    let (op, _, right) = infix_parts(&mixed);
    assert_eq!(op, InfixOp::Div);
    assert!(matches!(right, Expr::Literal(Literal::Regex { .. })));
}

#[test]
fn invalid_regex_pattern_is_reported() {
    let program = parse_program("let r = /a(/");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1511"]);
    assert!(matches!(
        program.statements[0],
        Stmt::Let {
            value: Expr::Literal(Literal::Regex { .. }),
            ..
        }
    ));
}

#[test]
fn mismatched_close_tag_is_one_diagnostic() {
    let program = parse_program(r#"<Foo>"x"</Bar>"#);
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1502"]);
    let diag = &program.diagnostics[0];
    assert!(diag.message.contains("<Foo>") && diag.message.contains("</Bar>"));
    assert_eq!(diag.labels.len(), 1);
}

#[test]
fn matching_tags_parse_cleanly() {
    let expr = single_expr(r#"<Foo>"x"</Foo>"#);
    assert!(matches!(expr, Expr::Tag(ref tag) if tag.name == "Foo"));
}

#[test]
fn missing_close_tag_is_reported() {
    let program = parse_program(r#"<div>"x""#);
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1503"]);
}

#[test]
fn open_void_element_suggests_self_closing() {
    let program = parse_program("<div><br></div>");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1504"]);
    assert_eq!(program.diagnostics[0].hint.as_deref(), Some("write <br/>"));
}

#[test]
fn raw_text_body_keeps_braces_as_text() {
    let expr = single_expr("<style>a { color: red; </style>");
    let Expr::Tag(tag) = expr else {
        panic!("expected tag");
    };
    let children = tag.children.expect("paired");
    assert_eq!(children.len(), 1);
    assert!(matches!(
        &children[0],
        Stmt::Expr(Expr::Text { value, .. }) if value == "a { color: red; "
    ));
}

#[test]
fn raw_text_interpolation_holds_statements() {
    let expr = single_expr("<script>let n = @{count + 1};</script>");
    let Expr::Tag(tag) = expr else {
        panic!("expected tag");
    };
    let children = tag.children.expect("paired");
    assert_eq!(children.len(), 3);
    let Stmt::Expr(Expr::Interpolation { statements, .. }) = &children[1] else {
        panic!("expected interpolation, got {:?}", children[1]);
    };
    assert_eq!(statements.len(), 1);
    assert!(matches!(&children[2], Stmt::Expr(Expr::Text { value, .. }) if value == ";"));
}

#[test]
fn tag_attributes_cover_every_form() {
    let expr = single_expr(r#"<a href="/x" class={cls} ...rest disabled/>"#);
    let Expr::Tag(tag) = expr else {
        panic!("expected tag");
    };
    assert!(tag.children.is_none());
    assert_eq!(tag.attributes.len(), 4);
    assert!(matches!(
        &tag.attributes[0],
        Attribute::Named { name, value: Some(AttrValue::Literal(_)), .. } if name.name == "href"
    ));
    assert!(matches!(
        &tag.attributes[1],
        Attribute::Named { value: Some(AttrValue::Hole(Expr::Ident(_))), .. }
    ));
    assert!(matches!(&tag.attributes[2], Attribute::Spread { .. }));
    assert!(matches!(&tag.attributes[3], Attribute::Named { value: None, .. }));
}

#[test]
fn three_broken_statements_give_three_diagnostics() {
    let program = parse_program("let a = 1 +\nlet b = (2\nlet c = [3,\n");
    assert_eq!(program.diagnostics.len(), 3, "{:?}", program.diagnostics);
    assert_eq!(program.diagnostics[0].line(), 2);
    assert_eq!(program.diagnostics[1].line(), 3);
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1500", "E1501", "E1501"]);
}

#[test]
fn recovery_resumes_at_the_next_statement() {
    let program = parse_program("let = 5\nlet ok = 1");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1501"]);
    assert!(matches!(
        program.statements.last(),
        Some(Stmt::Let { pattern: Pattern::Ident(name), .. }) if name.name == "ok"
    ));
}

#[test]
fn stray_semicolons_are_skipped() {
    let statements = parse_ok("let x = 1;;; let y = 2;\n;\n{ ; let z = 3 }");
    assert_eq!(statements.len(), 3);
    assert!(matches!(&statements[2], Stmt::Block { statements, .. } if statements.len() == 1));
}

#[test]
fn diagnostics_are_capped_by_options() {
    let options = ParseOptions {
        max_diagnostics: 2,
        ..ParseOptions::default()
    };
    let program = parse_program_with_options("let a = )\nlet b = )\nlet c = )\n", &options);
    assert_eq!(program.diagnostics.len(), 2);
}

#[test]
fn brace_statement_tries_pattern_then_dict_then_block() {
    let statements = parse_ok("{a, b as c} = obj\n{k: 1}\n{ let y = 2 }");
    assert!(matches!(
        &statements[0],
        Stmt::Assign { target: AssignTarget::Pattern(Pattern::Dict { entries, .. }), .. }
            if entries.len() == 2 && entries[1].alias.is_some()
    ));
    assert!(matches!(&statements[1], Stmt::Expr(Expr::Dict { .. })));
    assert!(matches!(&statements[2], Stmt::Block { statements, .. } if statements.len() == 1));
}

#[test]
fn array_pattern_takes_a_trailing_rest() {
    let statements = parse_ok("let [first, ...others] = xs");
    assert!(matches!(
        &statements[0],
        Stmt::Let { pattern: Pattern::Array { elements, rest: Some(rest), .. }, .. }
            if elements.len() == 1 && rest.name == "others"
    ));
    let program = parse_program("let [...others, last] = xs");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1513"]);
}

#[test]
fn function_parameters_take_defaults_and_rest() {
    let value = let_value("let f = fn(a, b = 2, ...more) { return a }");
    let Expr::Function { params, body, .. } = value else {
        panic!("expected function");
    };
    assert_eq!(params.len(), 3);
    assert!(params[1].default.is_some());
    assert!(params[2].rest);
    assert!(matches!(&body[0], Stmt::Return { value: Some(_), .. }));

    let program = parse_program("let g = fn(...a, b) { a }");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1513"]);
}

#[test]
fn try_requires_a_call() {
    let value = let_value("let r = try obj.load(1)");
    assert!(matches!(value, Expr::Try { ref call, .. } if call.is_call()));
    let program = parse_program("let r = try x");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1507"]);
}

#[test]
fn keyword_typo_gets_a_hint_and_one_diagnostic() {
    let program = parse_program("fucntion add(a, b) { return a + b }");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1506"]);
    assert_eq!(
        program.diagnostics[0].hint.as_deref(),
        Some("did you mean 'function'?")
    );
}

#[test]
fn membership_and_identity_compounds() {
    let not_in = single_expr("a not in b");
    assert_eq!(infix_parts(&not_in).0, InfixOp::NotIn);
    let is_not = single_expr("x is not User");
    assert_eq!(infix_parts(&is_not).0, InfixOp::IsNot);
    let mixed = single_expr("a is B and c");
    let (op, left, _) = infix_parts(&mixed);
    assert_eq!(op, InfixOp::And);
    assert_eq!(infix_parts(left).0, InfixOp::Is);
}

#[test]
fn prefix_not_binds_tighter_than_equality() {
    let expr = single_expr("not a == b");
    let (op, left, _) = infix_parts(&expr);
    assert_eq!(op, InfixOp::Eq);
    assert!(matches!(left, Expr::Prefix { op: PrefixOp::Not, .. }));
}

#[test]
fn call_only_attaches_to_callable_heads() {
    let statements = parse_ok("let a = \"s\"\n(1 + 2)");
    assert_eq!(statements.len(), 2);
    assert!(matches!(&statements[1], Stmt::Expr(Expr::Group { .. })));
    let call = single_expr("f(1, 2,)");
    assert!(matches!(call, Expr::Call { ref args, .. } if args.len() == 2));
}

#[test]
fn index_slice_and_optional_index() {
    assert!(matches!(
        single_expr("xs[1:3]"),
        Expr::Slice { start: Some(_), end: Some(_), .. }
    ));
    assert!(matches!(
        single_expr("xs[:2]"),
        Expr::Slice { start: None, end: Some(_), .. }
    ));
    assert!(matches!(
        single_expr("xs[1:]"),
        Expr::Slice { start: Some(_), end: None, .. }
    ));
    assert!(matches!(single_expr("xs[?0]"), Expr::Index { optional: true, .. }));
}

#[test]
fn member_access_accepts_keyword_properties() {
    let expr = single_expr("row.for.name");
    let Expr::Member {
        target, property, ..
    } = expr
    else {
        panic!("expected member");
    };
    assert_eq!(property.name, "name");
    assert!(matches!(*target, Expr::Member { ref property, .. } if property.name == "for"));
}

#[test]
fn imports_bind_alias_or_last_segment() {
    let plain = single_expr("import @std/math");
    let Expr::Import { source, alias, .. } = &plain else {
        panic!("expected import");
    };
    assert_eq!(import_binding(source, alias.as_ref()).as_deref(), Some("math"));

    let aliased = single_expr("import @./lib/util.pars as U");
    let Expr::Import { source, alias, .. } = &aliased else {
        panic!("expected import");
    };
    assert!(matches!(**source, Expr::Literal(Literal::Path { ref value, .. }) if value == "./lib/util.pars"));
    assert_eq!(import_binding(source, alias.as_ref()).as_deref(), Some("U"));
    assert_eq!(import_binding(source, None).as_deref(), Some("util"));
}

#[test]
fn schema_fields_carry_types_defaults_metadata_and_links() {
    let src = r#"@schema User {
    name: string
    email: string? = "none" | {title: "Email"}
    role: enum["admin", "user"](required)
    posts: [Post] via author_id
}"#;
    let expr = single_expr(src);
    let Expr::Schema(schema) = expr else {
        panic!("expected schema");
    };
    assert_eq!(schema.name.name, "User");
    assert_eq!(schema.fields.len(), 4);
    let email = &schema.fields[1];
    assert!(email.nullable);
    assert!(email.default.is_some());
    assert!(matches!(email.metadata, Some(Expr::Dict { .. })));
    let role = &schema.fields[2];
    assert_eq!(role.enum_values, vec!["admin", "user"]);
    assert_eq!(role.options[0].0.name, "required");
    let posts = &schema.fields[3];
    assert!(posts.is_array);
    assert_eq!(posts.type_name.name, "Post");
    assert_eq!(posts.via.as_ref().map(|v| v.name.as_str()), Some("author_id"));
}

#[test]
fn table_rows_must_share_the_first_rows_columns() {
    let ok = single_expr("@table(Person) [{name: \"a\", age: 1}, {name: \"b\", age: 2}]");
    assert!(matches!(ok, Expr::Table { schema: Some(_), ref rows, .. } if rows.len() == 2));

    let program = parse_program("@table [{a: 1, b: 2}, {a: 3}, {a: 4, b: 5, c: 6}]");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1515", "E1515"]);
    assert!(program.diagnostics[0].message.contains("row 2: missing columns: b"));
    assert!(program.diagnostics[1].message.contains("row 3: extra columns not in first row: c"));
}

#[test]
fn query_body_is_kept_verbatim() {
    let value = let_value("let rows = @query(Users | age<limit ??-> *)");
    assert!(matches!(
        value,
        Expr::Dsl { kind: DslKind::Query, ref body, .. } if body == "Users | age<limit ??-> *"
    ));
}

#[test]
fn transaction_parses_its_block() {
    let expr = single_expr("@transaction { let a = 1\n a }");
    assert!(matches!(expr, Expr::Transaction { ref statements, .. } if statements.len() == 2));
}

#[test]
fn money_literals_keep_currency_and_scale() {
    let value = let_value("let total = $5 + €3.5");
    let (_, left, right) = infix_parts(&value);
    let Expr::Literal(Literal::Money { currency, amount, .. }) = left else {
        panic!("expected money");
    };
    assert_eq!(currency, "USD");
    assert_eq!(amount.to_string(), "5.00");
    assert!(matches!(right, Expr::Literal(Literal::Money { currency, .. }) if currency == "EUR"));
}

#[test]
fn datetime_literals_are_classified_and_validated() {
    let value = let_value("let d = @2024-02-29");
    assert!(matches!(
        value,
        Expr::Literal(Literal::Datetime { kind: DatetimeKind::Date, .. })
    ));
    let stamp = let_value("let t = @2024-01-15T10:30:00Z");
    assert!(matches!(
        stamp,
        Expr::Literal(Literal::Datetime { kind: DatetimeKind::DateTime, .. })
    ));
    let program = parse_program("let bad = @2023-02-30");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1512"]);
}

#[test]
fn now_and_duration_literals() {
    assert!(matches!(
        let_value("let a = @today"),
        Expr::Literal(Literal::Now { kind: NowKind::Date { today: true }, .. })
    ));
    assert!(matches!(
        let_value("let b = @1h30m"),
        Expr::Literal(Literal::Duration { ref value, .. }) if value == "1h30m"
    ));
}

#[test]
fn malformed_url_is_only_a_warning() {
    let program = parse_program("let u = @https://");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1517"]);
    assert!(!program.has_errors());
}

#[test]
fn integer_overflow_becomes_an_error_node() {
    let program = parse_program("let n = 99999999999999999999");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1514"]);
    assert!(matches!(program.statements[0], Stmt::Let { value: Expr::Error(_), .. }));
}

#[test]
fn templates_split_into_text_and_holes() {
    let expr = single_expr("`hello {name}!`");
    let Expr::Template { kind, parts, .. } = expr else {
        panic!("expected template");
    };
    assert_eq!(kind, TemplateKind::Backtick);
    assert_eq!(parts.len(), 3);
    assert!(matches!(&parts[0], TemplatePart::Text(text) if text == "hello "));
    assert!(matches!(&parts[1], TemplatePart::Hole(_)));
}

#[test]
fn export_forms() {
    let statements = parse_ok(
        "export let a = 1\nexport b = 2\nexport computed total = a + b\nexport computed page { 1 }\nexport Name",
    );
    let items: Vec<&ExportItem> = statements
        .iter()
        .map(|stmt| match stmt {
            Stmt::Export { item, .. } => item,
            other => panic!("expected export, got {other:?}"),
        })
        .collect();
    assert!(matches!(items[0], ExportItem::Binding(stmt) if matches!(**stmt, Stmt::Let { .. })));
    assert!(matches!(items[1], ExportItem::Binding(stmt) if matches!(**stmt, Stmt::Assign { .. })));
    assert!(matches!(items[2], ExportItem::Computed { body: ComputedBody::Expr(_), .. }));
    assert!(matches!(items[3], ExportItem::Computed { body: ComputedBody::Block(_), .. }));
    assert!(matches!(items[4], ExportItem::Name(name) if name.name == "Name"));
}

#[test]
fn write_statements_and_read_sugar() {
    let statements = parse_ok("data ==>> file(@./log.txt)\nlet text <== file(@./a.txt)");
    assert!(matches!(&statements[0], Stmt::Write { mode: WriteMode::Append, .. }));
    assert!(matches!(
        &statements[1],
        Stmt::Let { value: Expr::Read { source, .. }, .. } if source.is_call()
    ));
}

#[test]
fn place_assignment_and_invalid_targets() {
    let statements = parse_ok("obj.name = \"x\"\nxs[0] = 1");
    assert!(matches!(
        &statements[0],
        Stmt::Assign { target: AssignTarget::Place(Expr::Member { .. }), .. }
    ));
    assert!(matches!(
        &statements[1],
        Stmt::Assign { target: AssignTarget::Place(Expr::Index { .. }), .. }
    ));
    let program = parse_program("1 = 2");
    assert_eq!(diag_codes(&program.diagnostics), vec!["E1505"]);
}

#[test]
fn check_stop_and_skip() {
    let statements = parse_ok("check user else null_user\nfor (x in xs) { if (x) skip\nstop }");
    assert!(matches!(&statements[0], Stmt::Check { .. }));
    let Stmt::Expr(Expr::For { body, .. }) = &statements[1] else {
        panic!("expected for");
    };
    assert!(matches!(
        &body[0],
        Stmt::Expr(Expr::If { consequence: Branch::Expr(inner), .. }) if matches!(**inner, Expr::Skip(_))
    ));
    assert!(matches!(&body[1], Stmt::Stop(_)));
}

#[test]
fn return_without_value_ends_at_the_line() {
    let value = let_value("let f = fn() { return\n1 }");
    let Expr::Function { body, .. } = value else {
        panic!("expected function");
    };
    assert_eq!(body.len(), 2);
    assert!(matches!(&body[0], Stmt::Return { value: None, .. }));
}

#[test]
fn dictionary_keys_accept_strings_and_computed_expressions() {
    let expr = single_expr(r#"{name: 1, "full name": 2; [key]: 3}"#);
    let Expr::Dict { entries, .. } = expr else {
        panic!("expected dict");
    };
    assert!(matches!(entries[0].key, DictKey::Ident(_)));
    assert!(matches!(entries[1].key, DictKey::String { .. }));
    assert!(matches!(entries[2].key, DictKey::Computed(_)));
}

#[test]
fn garbage_input_never_panics() {
    for src in ["}{)(][<<>>@@@", "<div", "`unterminated {", "let x = @(./a/{b", "<>", "fn("] {
        let program = parse_program(src);
        assert!(program.has_errors(), "expected errors for {src:?}");
    }
}
