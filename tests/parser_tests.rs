// tests/parser_tests.rs

use formula_lang::ast::{BinOp, Builtin, Expr, StringLiteral, UnaryOp, WhereBinding};
use formula_lang::parser::{ParseError, Parser, parse};
use formula_lang::LexError;
use pretty_assertions::assert_eq;

fn int(n: i64) -> Expr {
    Expr::Integer(n)
}

fn ident(name: &str) -> Expr {
    Expr::Identifier(name.to_string())
}

fn bin(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
    }
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_multiplication_binds_tighter() {
    assert_eq!(
        parse("3+4*2").unwrap(),
        bin(BinOp::Add, int(3), bin(BinOp::Multiply, int(4), int(2)))
    );
}

#[test]
fn test_parentheses() {
    assert_eq!(
        parse("(3+4)*2").unwrap(),
        bin(BinOp::Multiply, bin(BinOp::Add, int(3), int(4)), int(2))
    );
}

#[test]
fn test_power_binds_tighter_than_product() {
    assert_eq!(
        parse("2*3^3+2").unwrap(),
        bin(
            BinOp::Add,
            bin(BinOp::Multiply, int(2), bin(BinOp::Power, int(3), int(3))),
            int(2)
        )
    );
}

#[test]
fn test_comparison_below_arithmetic() {
    assert_eq!(
        parse("a + 1 > b").unwrap(),
        bin(BinOp::GreaterThan, bin(BinOp::Add, ident("a"), int(1)), ident("b"))
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    assert_eq!(
        parse("a or b and c").unwrap(),
        bin(BinOp::Or, ident("a"), bin(BinOp::And, ident("b"), ident("c")))
    );
}

#[test]
fn test_dice_binds_tighter_than_power() {
    assert_eq!(
        parse("3d6 + 1").unwrap(),
        bin(BinOp::Add, bin(BinOp::Dice, int(3), int(6)), int(1))
    );
}

// ============================================================================
// Associativity
// ============================================================================

#[test]
fn test_subtraction_is_left_associative() {
    assert_eq!(
        parse("10 - 3 - 2").unwrap(),
        bin(BinOp::Subtract, bin(BinOp::Subtract, int(10), int(3)), int(2))
    );
}

#[test]
fn test_mixed_additive_chain() {
    assert_eq!(
        parse("1 - 2 + 3").unwrap(),
        bin(BinOp::Add, bin(BinOp::Subtract, int(1), int(2)), int(3))
    );
}

#[test]
fn test_power_is_right_associative() {
    assert_eq!(
        parse("2^3^2").unwrap(),
        bin(BinOp::Power, int(2), bin(BinOp::Power, int(3), int(2)))
    );
}

#[test]
fn test_member_access_chains_left() {
    assert_eq!(
        parse("a.b.c").unwrap(),
        Expr::Dot {
            object: Box::new(Expr::Dot {
                object: Box::new(ident("a")),
                member: Box::new(ident("b")),
            }),
            member: Box::new(ident("c")),
        }
    );
}

// ============================================================================
// Unary operators
// ============================================================================

#[test]
fn test_negative_literal() {
    assert_eq!(parse("-5").unwrap(), unary(UnaryOp::Negate, int(5)));
}

#[test]
fn test_negation_then_addition() {
    assert_eq!(
        parse("-3+4").unwrap(),
        bin(BinOp::Add, unary(UnaryOp::Negate, int(3)), int(4))
    );
}

#[test]
fn test_unary_after_binary_operator() {
    assert_eq!(
        parse("2 * -3").unwrap(),
        bin(BinOp::Multiply, int(2), unary(UnaryOp::Negate, int(3)))
    );
}

#[test]
fn test_not_covers_whole_condition() {
    assert_eq!(
        parse("not a and b").unwrap(),
        unary(UnaryOp::Not, bin(BinOp::And, ident("a"), ident("b")))
    );
}

#[test]
fn test_not_inside_comparison_operand() {
    assert_eq!(
        parse("x = not y").unwrap(),
        bin(BinOp::Equal, ident("x"), unary(UnaryOp::Not, ident("y")))
    );
}

#[test]
fn test_invalid_prefix_operator() {
    assert_eq!(
        parse("* 3"),
        Err(ParseError::InvalidUnaryOperator("*".to_string()))
    );
    assert_eq!(
        parse("and"),
        Err(ParseError::InvalidUnaryOperator("and".to_string()))
    );
}

#[test]
fn test_not_is_not_binary() {
    assert_eq!(
        parse("a not b"),
        Err(ParseError::InvalidBinaryOperator("not".to_string()))
    );
}

// ============================================================================
// Atoms, lists and calls
// ============================================================================

#[test]
fn test_atoms() {
    assert_eq!(parse("42").unwrap(), int(42));
    assert_eq!(parse("strength").unwrap(), ident("strength"));
    assert_eq!(
        parse("'hello'").unwrap(),
        Expr::String(StringLiteral::plain("hello"))
    );
}

#[test]
fn test_integer_out_of_range() {
    assert_eq!(
        parse("99999999999999999999"),
        Err(ParseError::InvalidInteger("99999999999999999999".to_string()))
    );
}

#[test]
fn test_list_literal() {
    assert_eq!(
        parse("[1, [2, 3], x]").unwrap(),
        Expr::List(vec![int(1), Expr::List(vec![int(2), int(3)]), ident("x")])
    );
    assert_eq!(parse("[]").unwrap(), Expr::List(vec![]));
}

#[test]
fn test_function_call() {
    assert_eq!(
        parse("if(strength > 12, 7, 2)").unwrap(),
        Expr::Call {
            function: Builtin::If,
            args: vec![
                bin(BinOp::GreaterThan, ident("strength"), int(12)),
                int(7),
                int(2),
            ],
        }
    );
}

#[test]
fn test_nested_call_arguments() {
    let expr = parse("min(4, 5, [2, 18, 7])").unwrap();
    match expr {
        Expr::Call {
            function: Builtin::Min,
            args,
        } => assert_eq!(args.len(), 3),
        other => panic!("expected a call, got {:?}", other),
    }
}

#[test]
fn test_call_then_member() {
    let expr = parse("choose(members, strength).strength").unwrap();
    assert!(matches!(expr, Expr::Dot { .. }));
}

#[test]
fn test_adjacent_groups_are_not_one_atom() {
    assert!(matches!(
        parse("(1)(2)"),
        Err(ParseError::Unparseable(_))
    ));
}

// ============================================================================
// Where clauses
// ============================================================================

#[test]
fn test_where_clause() {
    assert_eq!(
        parse("x*5 where x=1").unwrap(),
        Expr::Where {
            body: Box::new(bin(BinOp::Multiply, ident("x"), int(5))),
            bindings: vec![WhereBinding {
                name: "x".to_string(),
                value: int(1),
            }],
        }
    );
}

#[test]
fn test_where_with_several_bindings() {
    let expr = parse("a*b where a=2, b=1+1").unwrap();
    match expr {
        Expr::Where { bindings, .. } => {
            let names: Vec<_> = bindings.iter().map(|b| b.name.as_str()).collect();
            assert_eq!(names, ["a", "b"]);
            assert_eq!(bindings[1].value, bin(BinOp::Add, int(1), int(1)));
        }
        other => panic!("expected where, got {:?}", other),
    }
}

#[test]
fn test_nested_where() {
    let expr = parse("x*(a*b where a=2,b=1) where x=5").unwrap();
    match expr {
        Expr::Where { body, bindings } => {
            assert_eq!(bindings.len(), 1);
            assert!(matches!(*body, Expr::Binary { op: BinOp::Multiply, .. }));
        }
        other => panic!("expected where, got {:?}", other),
    }
}

#[test]
fn test_malformed_where() {
    for source in ["x where", "x where y", "x where 1=2", "x where y=", "x where y=1,"] {
        assert!(
            matches!(parse(source), Err(ParseError::MalformedWhere(_))),
            "{} should be a malformed where clause",
            source
        );
    }
}

#[test]
fn test_duplicate_where_binding() {
    assert_eq!(
        parse("x where x=1, x=2"),
        Err(ParseError::DuplicateBinding("x".to_string()))
    );
}

// ============================================================================
// String interpolation
// ============================================================================

#[test]
fn test_interpolated_string() {
    match parse("'hi {1+1}'").unwrap() {
        Expr::String(literal) => {
            assert_eq!(literal.text, "hi ");
            assert_eq!(literal.substitutions.len(), 1);
            assert_eq!(literal.substitutions[0].offset, 3);
            assert_eq!(literal.substitutions[0].expr, bin(BinOp::Add, int(1), int(1)));
        }
        other => panic!("expected a string, got {:?}", other),
    }
}

#[test]
fn test_substitutions_stored_back_to_front() {
    match parse("'{a} and {b}!'").unwrap() {
        Expr::String(literal) => {
            assert_eq!(literal.text, " and !");
            let offsets: Vec<_> = literal.substitutions.iter().map(|s| s.offset).collect();
            assert_eq!(offsets, [5, 0]);
        }
        other => panic!("expected a string, got {:?}", other),
    }
}

#[test]
fn test_bad_substitution() {
    assert!(matches!(
        parse("'total: {1 +}'"),
        Err(ParseError::Interpolation { fragment, .. }) if fragment == "1 +"
    ));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_empty_source() {
    assert_eq!(parse(""), Err(ParseError::EmptyExpression));
    assert_eq!(parse("   "), Err(ParseError::EmptyExpression));
    assert_eq!(parse("()"), Err(ParseError::EmptyExpression));
}

#[test]
fn test_unbalanced() {
    assert!(matches!(parse("foo("), Err(ParseError::Unbalanced { .. })));
    assert!(matches!(parse("(1 + 2"), Err(ParseError::Unbalanced { .. })));
    assert!(matches!(parse("1 + 2)"), Err(ParseError::Unbalanced { .. })));
    assert!(matches!(parse("[1, 2)"), Err(ParseError::Unbalanced { .. })));
}

#[test]
fn test_unknown_function() {
    assert_eq!(
        parse("bogus_fn(1,2)"),
        Err(ParseError::UnknownFunction("bogus_fn".to_string()))
    );
}

#[test]
fn test_wrong_arity() {
    assert!(matches!(
        parse("abs(1, 2)"),
        Err(ParseError::Arity { function: "abs", got: 2, .. })
    ));
    assert!(matches!(
        parse("color_transition(1, 2, 3, 4)"),
        Err(ParseError::Arity { function: "color_transition", got: 4, .. })
    ));
    assert!(matches!(
        parse("sort()"),
        Err(ParseError::Arity { function: "sort", got: 0, .. })
    ));
}

#[test]
fn test_empty_argument_slot() {
    assert_eq!(parse("max(1,)"), Err(ParseError::EmptyExpression));
    assert_eq!(parse("[1,,2]"), Err(ParseError::EmptyExpression));
}

#[test]
fn test_dangling_operator() {
    assert_eq!(parse("1 +"), Err(ParseError::EmptyExpression));
}

#[test]
fn test_lex_errors_surface() {
    assert_eq!(
        parse("'open"),
        Err(ParseError::Lex(LexError::UnterminatedString { position: 0 }))
    );
}

#[test]
fn test_parser_from_source() {
    let parser = Parser::new("1 + 1").unwrap();
    assert_eq!(parser.parse().unwrap(), bin(BinOp::Add, int(1), int(1)));
}
