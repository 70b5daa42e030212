use recursion::{Collapsible, MappableFrame, PartiallyApplied};

use super::{Comparison, Expr};

/// short-lived single layer of a filter expression, used for expressing
/// recursive algorithms over a single layer of a borrowed Expr
pub enum ExprFrame<'a, X> {
    // leaves
    Compare(&'a Comparison),
    Present(&'a str),
    // boolean operators
    And(Vec<X>),
    Or(Vec<X>),
    Not(X),
}

impl<'a> MappableFrame for ExprFrame<'a, PartiallyApplied> {
    type Frame<X> = ExprFrame<'a, X>;

    fn map_frame<A, B>(input: Self::Frame<A>, mut f: impl FnMut(A) -> B) -> Self::Frame<B> {
        use ExprFrame::*;
        match input {
            Compare(c) => Compare(c),
            Present(a) => Present(a),
            And(xs) => And(xs.into_iter().map(f).collect()),
            Or(xs) => Or(xs.into_iter().map(f).collect()),
            Not(x) => Not(f(x)),
        }
    }
}

impl<'a> Collapsible for &'a Expr {
    type FrameToken = ExprFrame<'a, PartiallyApplied>;

    fn into_frame(self) -> ExprFrame<'a, Self> {
        match self {
            Expr::Compare(c) => ExprFrame::Compare(c),
            Expr::Present(a) => ExprFrame::Present(a),
            Expr::And(xs) => ExprFrame::And(xs.iter().collect()),
            Expr::Or(xs) => ExprFrame::Or(xs.iter().collect()),
            Expr::Not(x) => ExprFrame::Not(&**x),
        }
    }
}
