use {
    super::parse,
    crate::{
        ast::{Ast, NodeId, NodeKind, NodeValue},
        lexer::{lex, Number},
    },
};

fn parse_str(template: &str) -> Ast {
    let tokens = lex(template).expect("should be a valid template");
    parse(&tokens).expect("should be a parsable template")
}

/// Renders the tree as nested `Kind(value)[children]` for compact assertions.
fn dump(ast: &Ast, id: NodeId) -> String {
    let node = &ast[id];
    let mut out = format!("{}", node.kind());
    match node.value() {
        NodeValue::Text(s) => out += &format!("({:?})", s),
        NodeValue::Number(n) => out += &format!("({})", n),
        NodeValue::None => {}
    }
    if !node.children().is_empty() {
        let children: Vec<_> = node.children().iter().map(|&ch| dump(ast, ch)).collect();
        out += &format!("[{}]", children.join(", "));
    }
    out
}

macro_rules! t {
    ($(
        $name:ident ($input:expr, $expected:expr);
    )*) => {$(
        #[test]
        fn $name() {
            let ast = parse_str($input);
            assert_eq!(dump(&ast, NodeId::root()), $expected);
        }
    )*};
}

t! [
    parse_empty("", "Root");
    parse_text("/foo/bar", r#"Root[Text("/foo/bar")]"#);
    parse_variable(
        "/users/:id",
        r#"Root[Text("/users/"), Variable("id")]"#
    );
    parse_variable_with_default(
        "/:page=1",
        r#"Root[Text("/"), Variable("page")[VariableDefaultValue("1")]]"#
    );
    parse_variable_with_rules(
        "/:id(int, between(1, 100))",
        r#"Root[Text("/"), Variable("id")[VariableRule("int"), VariableRule("between")[VariableRuleParameters[Number(1), Number(100)]]]]"#
    );
    parse_rule_with_string_parameters(
        "/:c(in(\"red\", 'blue'))",
        r#"Root[Text("/"), Variable("c")[VariableRule("in")[VariableRuleParameters[Text("red"), Text("blue")]]]]"#
    );
    parse_rule_with_nested_call_parameter(
        "/:x(regex(foo(1)))",
        r#"Root[Text("/"), Variable("x")[VariableRule("regex")[VariableRuleParameters[Text("foo(1)")]]]]"#
    );
    parse_rule_with_empty_parameters(
        "/:c(alpha())",
        r#"Root[Text("/"), Variable("c")[VariableRule("alpha")[VariableRuleParameters]]]"#
    );
    parse_rules_then_default(
        "/:page(int)=1",
        r#"Root[Text("/"), Variable("page")[VariableRule("int"), VariableDefaultValue("1")]]"#
    );
    parse_optional_part(
        "/posts[/:page=1(int)]",
        r#"Root[Text("/posts"), OptionalRoutePart[Text("/"), Variable("page")[VariableDefaultValue("1"), VariableRule("int")]]]"#
    );
    parse_nested_optional_parts(
        "/a[/b[/c]]",
        r#"Root[Text("/a"), OptionalRoutePart[Text("/b"), OptionalRoutePart[Text("/c")]]]"#
    );
    parse_stray_closing_bracket_as_text(
        "/a]b",
        r#"Root[Text("/a"), Text("]"), Text("b")]"#
    );
    parse_mixed_segment(
        "/files/:name.:ext",
        r#"Root[Text("/files/"), Variable("name"), Text("."), Variable("ext")]"#
    );
];

#[test]
fn parse_parent_links_follow_structure() {
    let ast = parse_str("/posts[/:page]");
    let (opt, _) = ast
        .find_child(NodeId::root(), NodeKind::OptionalRoutePart)
        .expect("should have an optional part");
    let (var, _) = ast
        .find_child(opt, NodeKind::Variable)
        .expect("should have a variable");
    assert_eq!(ast[var].parent(), Some(opt));
    assert_eq!(ast[opt].parent(), Some(NodeId::root()));
}

#[test]
fn parse_float_parameter() {
    let ast = parse_str("/:n(between(0.5, 1.5))");
    let numbers: Vec<_> = ast
        .descendants(NodeId::root())
        .filter_map(|(_, node)| match node.value() {
            NodeValue::Number(n) => Some(*n),
            _ => None,
        })
        .collect();
    assert_eq!(numbers, vec![Number::Float(0.5), Number::Float(1.5)]);
}

#[test]
fn parse_failcase_unclosed_optional_part() {
    let tokens = lex("/posts[/:page").unwrap();
    let err = parse(&tokens).unwrap_err();
    assert_eq!(err.template(), "/posts[/:page");
    assert_eq!(err.position(), 13);
}

#[test]
fn parse_failcase_trailing_comma_in_parameters() {
    let tokens = lex("/:c(in(a,))").unwrap();
    assert!(parse(&tokens).is_err());
}

#[test]
fn parse_failcase_missing_comma_between_parameters() {
    let tokens = lex("/:c(in(a b))").unwrap();
    assert!(parse(&tokens).is_err());
}
