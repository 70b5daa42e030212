use ldap_filter::expr::{CompareOp, Expr, Pattern};
use ldap_filter::parse;

fn canonical(s: &str) -> String {
    parse(s)
        .unwrap_or_else(|e| panic!("failed to parse {s:?}: {e}"))
        .to_string()
}

// ==============================================================================

#[test]
fn test_well_formed_filters() {
    for s in [
        "(cn=Babs Jensen)",
        "(!(cn=Tim Howes))",
        "(&(objectClass=Person)(|(sn=Jensen)(cn=Babs J*)))",
        "(o=univ*of*mich*)",
        "(le<=4.1)",
        "(ge>=-3)",
        "(approx~=Approx)",
        "(presence=*)",
    ] {
        assert_eq!(canonical(s), s, "canonical filters render unchanged");
    }
}

#[test]
fn test_whitespace_is_normalized() {
    assert_eq!(canonical("  ( |(cn=Babs *)(sn=1) )"), "(|(cn=Babs *)(sn=1))");
    assert_eq!(
        canonical("(&(service.testproperty = YES)(service.fakeproperty = YES))"),
        "(&(service.testproperty=YES)(service.fakeproperty=YES))"
    );
    assert_eq!(canonical("(service.numericproperty <= 10)"), "(service.numericproperty<=10)");
    assert_eq!(canonical("(service.falseproperty =*)"), "(service.falseproperty=*)");
    // interior whitespace in a value is kept
    assert_eq!(canonical("(cn=Babs   Jensen)"), "(cn=Babs   Jensen)");
}

#[test]
fn test_presence_node() {
    let f = parse("(cn=*)").unwrap();
    assert_eq!(f.expr(), &Expr::present("cn"));

    // an escaped star is a literal value, not a presence test
    let f = parse(r"(cn=\*)").unwrap();
    assert_eq!(
        f.expr(),
        &Expr::compare("cn", CompareOp::Equal, Pattern::literal("*"))
    );
}

#[test]
fn test_operators_are_not_split() {
    let f = parse("(a~=b)").unwrap();
    let Expr::Compare(c) = f.expr() else {
        panic!("expected comparison, got {:?}", f.expr())
    };
    assert_eq!(c.op(), CompareOp::Approx);
    assert_eq!(c.value().text(), "b");

    let f = parse("(a>==b)").unwrap();
    let Expr::Compare(c) = f.expr() else {
        panic!("expected comparison, got {:?}", f.expr())
    };
    assert_eq!(c.op(), CompareOp::GreaterOrEqual);
    assert_eq!(c.value().text(), "=b");
}

#[test]
fn test_escaped_values() {
    let f = parse(r"(func=f\(x\) \\ y\*)").unwrap();
    let Expr::Compare(c) = f.expr() else {
        panic!("expected comparison")
    };
    assert_eq!(c.value().segments(), [r"f(x) \ y*"]);
    assert_eq!(f.to_string(), r"(func=f\(x\) \\ y\*)");

    // escaped edge whitespace survives trimming
    let f = parse(r"(a=\ padded\ )").unwrap();
    let Expr::Compare(c) = f.expr() else {
        panic!("expected comparison")
    };
    assert_eq!(c.value().text(), " padded ");
}

#[test]
fn test_empty_value_is_equality_with_empty_string() {
    let f = parse("(a=)").unwrap();
    assert_eq!(
        f.expr(),
        &Expr::compare("a", CompareOp::Equal, Pattern::literal(""))
    );
    assert_eq!(f.to_string(), "(a=)");
}

#[test]
fn test_multi_operand_groups_keep_order() {
    let f = parse("(|(c=3)(a=1)(b=2))").unwrap();
    let Expr::Or(xs) = f.expr() else {
        panic!("expected or")
    };
    assert_eq!(xs.len(), 3);
    assert_eq!(f.to_string(), "(|(c=3)(a=1)(b=2))");
}

#[test]
fn test_reparse_is_identity() {
    for s in [
        "(&(a=1)(!(|(b<=2)(c>=3)(d~=Four))))",
        r"(x=a\(b\)*c)",
        r"(x=a&\&b)",
        "(x=Babs J*)",
    ] {
        let once = canonical(s);
        assert_eq!(canonical(&once), once);
    }
}
