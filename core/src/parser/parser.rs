use bumpalo::Bump;
use lazy_static::lazy_static;
use pest::Parser;
use pest::Span;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use super::error::{ParseError, ParseErrorKind, convert_pest_error};
use crate::{ToString, Vec};
use crate::ast::{ArenaExpr, BinaryOp, Expr, UnaryOp};

/// Default limit on how deeply parentheses and conditionals may nest.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Limit on the depth of a parsed tree, operators included. Later stages
/// recurse once per level.
pub const MAX_TREE_DEPTH: usize = 512;

lazy_static! {
    // Note: precedence is defined lowest to highest. Conditionals are handled
    // by the grammar and bind more loosely than everything here.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        .op(Op::infix(Rule::or, Assoc::Left))            // `||`
        .op(Op::infix(Rule::and, Assoc::Left))           // `&&`
        .op(Op::infix(Rule::bit_or, Assoc::Left))        // `|`
        .op(Op::infix(Rule::bit_xor, Assoc::Left))       // `^`
        .op(Op::infix(Rule::bit_and, Assoc::Left))       // `&`
        .op(
            Op::infix(Rule::eq, Assoc::Left) |
            Op::infix(Rule::ne, Assoc::Left)
        )                                               // `==`, `!=`
        .op(
            Op::infix(Rule::lt, Assoc::Left) |
            Op::infix(Rule::gt, Assoc::Left) |
            Op::infix(Rule::le, Assoc::Left) |
            Op::infix(Rule::ge, Assoc::Left)
        )                                               // `<`, `>`, `<=`, `>=`
        .op(
            Op::infix(Rule::shl, Assoc::Left) |
            Op::infix(Rule::shr, Assoc::Left)
        )                                               // `<<`, `>>`
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                               // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::rem, Assoc::Left)
        )                                               // `*`, `/`, `%`
        .op(
            Op::prefix(Rule::neg) |
            Op::prefix(Rule::bit_not) |
            Op::prefix(Rule::not) |
            Op::prefix(Rule::plus)
        )                                               // `-`, `~`, `!`, `+`
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "parser/expression.pest"]
pub struct ExpressionParser;

/// Node constructors for one of the two tree representations.
trait Builder {
    type Node;

    fn int(&self, value: i32) -> Self::Node;
    fn var(&self, name: &str) -> Self::Node;
    fn unary(&self, op: UnaryOp, expr: Self::Node) -> Self::Node;
    fn binary(&self, op: BinaryOp, left: Self::Node, right: Self::Node) -> Self::Node;
    fn if_else(&self, cond: Self::Node, then: Self::Node, otherwise: Self::Node) -> Self::Node;
}

struct Heap;

impl Builder for Heap {
    type Node = Expr;

    fn int(&self, value: i32) -> Expr {
        Expr::int(value)
    }

    fn var(&self, name: &str) -> Expr {
        Expr::var(name)
    }

    fn unary(&self, op: UnaryOp, expr: Expr) -> Expr {
        Expr::unary(op, expr)
    }

    fn binary(&self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::binary(op, left, right)
    }

    fn if_else(&self, cond: Expr, then: Expr, otherwise: Expr) -> Expr {
        Expr::if_else(cond, then, otherwise)
    }
}

struct Arena<'a>(&'a Bump);

impl<'a> Builder for Arena<'a> {
    type Node = &'a ArenaExpr<'a>;

    fn int(&self, value: i32) -> Self::Node {
        ArenaExpr::int(self.0, value)
    }

    fn var(&self, name: &str) -> Self::Node {
        ArenaExpr::var(self.0, name)
    }

    fn unary(&self, op: UnaryOp, expr: Self::Node) -> Self::Node {
        ArenaExpr::unary(self.0, op, expr)
    }

    fn binary(&self, op: BinaryOp, left: Self::Node, right: Self::Node) -> Self::Node {
        ArenaExpr::binary(self.0, op, left, right)
    }

    fn if_else(&self, cond: Self::Node, then: Self::Node, otherwise: Self::Node) -> Self::Node {
        ArenaExpr::if_else(self.0, cond, then, otherwise)
    }
}

/// Parse `source` into a heap-allocated tree.
///
/// ```
/// use minmath_core::parser;
///
/// let expr = parser::parse("a + b * 2 > 10 ? a : -1").unwrap();
/// assert_eq!(expr.to_string(), "(((a + (b * 2)) > 10) ? a : -1)");
/// ```
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

/// Parse with a custom nesting limit.
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<Expr, ParseError> {
    build_tree(&Heap, source, max_depth)
}

/// Parse `source` into a tree allocated in `arena`.
pub fn parse_in<'a>(arena: &'a Bump, source: &str) -> Result<&'a ArenaExpr<'a>, ParseError> {
    build_tree(&Arena(arena), source, DEFAULT_MAX_DEPTH)
}

fn build_tree<B: Builder>(builder: &B, source: &str, max_depth: usize) -> Result<B::Node, ParseError> {
    check_nesting(source, max_depth)?;

    let main = ExpressionParser::parse(Rule::main, source)
        .map_err(|err| convert_pest_error(err, source))?
        .next()
        .and_then(|main| main.into_inner().next())
        .ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::UnexpectedToken {
                    expected: "expression".to_string(),
                    found: "end of input".to_string(),
                },
                0..0,
            )
        })?;

    let tree = TreeBuilder {
        builder,
        max_depth: MAX_TREE_DEPTH,
    }
    .expression(main)?;
    tracing::trace!(len = source.len(), depth = tree.depth, "Parsed expression");
    Ok(tree.node)
}

fn depth_exceeded(depth: usize, max_depth: usize, span: Span<'_>) -> ParseError {
    ParseError::new(
        ParseErrorKind::MaxDepthExceeded { depth, max_depth },
        span.start()..span.end(),
    )
}

/// Reject input whose parentheses and conditionals nest deeper than
/// `max_depth` before handing it to the recursive descent.
///
/// A conditional stays open until the group that contains it closes, so
/// `(a ? 1 : 2) + (b ? 3 : 4)` nests two levels deep, not three.
fn check_nesting(source: &str, max_depth: usize) -> Result<(), ParseError> {
    let mut depth = 0usize;
    // Conditionals opened in the innermost group, and the counts of the
    // groups around it.
    let mut conditionals = 0usize;
    let mut enclosing: Vec<usize> = Vec::new();
    let mut in_comment = false;

    for (pos, byte) in source.bytes().enumerate() {
        if in_comment {
            in_comment = byte != b'\n';
            continue;
        }
        match byte {
            b'#' => in_comment = true,
            b'(' => {
                enclosing.push(conditionals);
                conditionals = 0;
                depth += 1;
            }
            b')' => {
                if let Some(outer) = enclosing.pop() {
                    depth -= 1 + conditionals;
                    conditionals = outer;
                }
            }
            b'?' => {
                conditionals += 1;
                depth += 1;
            }
            _ => {}
        }
        if depth > max_depth {
            return Err(ParseError::new(
                ParseErrorKind::MaxDepthExceeded { depth, max_depth },
                pos..pos + 1,
            ));
        }
    }
    Ok(())
}

/// A subtree and the number of nodes on its longest path.
struct Built<N> {
    node: N,
    depth: usize,
}

/// Turns parse pairs into tree nodes, refusing to build a tree deeper than
/// `max_depth`.
struct TreeBuilder<'b, B> {
    builder: &'b B,
    max_depth: usize,
}

impl<B: Builder> TreeBuilder<'_, B> {
    fn grow(&self, depth: usize, span: Span<'_>) -> Result<usize, ParseError> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(depth_exceeded(depth, self.max_depth, span));
        }
        Ok(depth)
    }

    /// `expression = { binary ~ conditional? }`
    fn expression(&self, pair: Pair<Rule>) -> Result<Built<B::Node>, ParseError> {
        let mut inner = pair.into_inner();
        let (Some(binary), conditional) = (inner.next(), inner.next()) else {
            unreachable!("expression always contains a binary operand");
        };

        let cond = self.binary(binary)?;
        let Some(conditional) = conditional else {
            return Ok(cond);
        };

        let span = conditional.as_span();
        let mut branches = conditional.into_inner();
        let (Some(then_branch), Some(else_branch)) = (branches.next(), branches.next()) else {
            unreachable!("conditional always has two branches");
        };
        let then_branch = self.expression(then_branch)?;
        let else_branch = self.expression(else_branch)?;
        let depth = self.grow(
            cond.depth.max(then_branch.depth).max(else_branch.depth),
            span,
        )?;
        Ok(Built {
            node: self
                .builder
                .if_else(cond.node, then_branch.node, else_branch.node),
            depth,
        })
    }

    fn binary(&self, pair: Pair<Rule>) -> Result<Built<B::Node>, ParseError> {
        // The Pratt parser recurses once per prefix operator.
        let mut prefixes = 0usize;
        for item in pair.clone().into_inner() {
            match item.as_rule() {
                Rule::neg | Rule::bit_not | Rule::not | Rule::plus => {
                    prefixes += 1;
                    if prefixes > self.max_depth {
                        return Err(depth_exceeded(prefixes, self.max_depth, item.as_span()));
                    }
                }
                _ => prefixes = 0,
            }
        }

        PRATT_PARSER
            .map_primary(|primary| self.primary(primary))
            .map_prefix(|op, rhs| {
                let span = op.as_span();
                let op = match op.as_rule() {
                    Rule::neg => UnaryOp::Neg,
                    Rule::bit_not => UnaryOp::BitNot,
                    Rule::not => UnaryOp::Not,
                    Rule::plus => return rhs,
                    rule => unreachable!("Unknown prefix operator: {:?}", rule),
                };
                let rhs = rhs?;
                let depth = self.grow(rhs.depth, span)?;
                Ok(Built {
                    node: self.builder.unary(op, rhs.node),
                    depth,
                })
            })
            .map_infix(|lhs, op, rhs| {
                let (lhs, rhs) = (lhs?, rhs?);
                let depth = self.grow(lhs.depth.max(rhs.depth), op.as_span())?;
                let op = match op.as_rule() {
                    Rule::or => BinaryOp::Or,
                    Rule::and => BinaryOp::And,
                    Rule::bit_or => BinaryOp::BitOr,
                    Rule::bit_xor => BinaryOp::BitXor,
                    Rule::bit_and => BinaryOp::BitAnd,
                    Rule::eq => BinaryOp::Eq,
                    Rule::ne => BinaryOp::Ne,
                    Rule::lt => BinaryOp::Lt,
                    Rule::gt => BinaryOp::Gt,
                    Rule::le => BinaryOp::Le,
                    Rule::ge => BinaryOp::Ge,
                    Rule::shl => BinaryOp::Shl,
                    Rule::shr => BinaryOp::Shr,
                    Rule::add => BinaryOp::Add,
                    Rule::sub => BinaryOp::Sub,
                    Rule::mul => BinaryOp::Mul,
                    Rule::div => BinaryOp::Div,
                    Rule::rem => BinaryOp::Mod,
                    rule => unreachable!("Unknown binary operator: {:?}", rule),
                };
                Ok(Built {
                    node: self.builder.binary(op, lhs.node, rhs.node),
                    depth,
                })
            })
            .parse(pair.into_inner())
    }

    fn primary(&self, pair: Pair<Rule>) -> Result<Built<B::Node>, ParseError> {
        let node = match pair.as_rule() {
            Rule::integer | Rule::neg_integer => {
                let text = pair.as_str();
                let value = text.parse::<i32>().map_err(|_| {
                    let span = pair.as_span();
                    ParseError::new(
                        ParseErrorKind::InvalidNumber {
                            text: text.to_string(),
                        },
                        span.start()..span.end(),
                    )
                })?;
                self.builder.int(value)
            }
            Rule::ident => self.builder.var(pair.as_str()),
            Rule::expression => return self.expression(pair),
            rule => unreachable!("Unknown primary: {:?}", rule),
        };
        Ok(Built { node, depth: 1 })
    }
}
