use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{cut, map, not, opt, value},
    error::context,
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};
use tracing::instrument;

use super::core::*;
use super::literal::*;
use crate::ast::{BinaryOperator, Expression, UnaryOperator};

#[instrument(level = "debug", skip(input))]
pub fn parse_expression(input: Span) -> PResult<Expression> {
    parse_logical_or(input)
}

fn fold_binary(first: Expression, rest: Vec<(BinaryOperator, Expression)>) -> Expression {
    rest.into_iter()
        .fold(first, |left, (op, right)| Expression::binary(op, left, right))
}

#[instrument(level = "debug", skip(input))]
fn parse_logical_or(input: Span) -> PResult<Expression> {
    let (input, first) = parse_logical_and(input)?;
    let (input, rest) = many0(pair(
        value(BinaryOperator::Or, symbol("||")),
        cut(parse_logical_and),
    ))(input)?;
    Ok((input, fold_binary(first, rest)))
}

#[instrument(level = "debug", skip(input))]
fn parse_logical_and(input: Span) -> PResult<Expression> {
    let (input, first) = parse_comparison(input)?;
    let (input, rest) = many0(pair(
        value(BinaryOperator::And, symbol("&&")),
        cut(parse_comparison),
    ))(input)?;
    Ok((input, fold_binary(first, rest)))
}

fn comparison_operator(input: Span) -> PResult<BinaryOperator> {
    ws(alt((
        value(BinaryOperator::Equal, tag("==")),
        value(BinaryOperator::NotEqual, tag("!=")),
        value(BinaryOperator::LessThanEqual, tag("<=")),
        value(BinaryOperator::GreaterThanEqual, tag(">=")),
        value(BinaryOperator::LessThan, tag("<")),
        value(BinaryOperator::GreaterThan, tag(">")),
    )))(input)
}

#[instrument(level = "debug", skip(input))]
fn parse_comparison(input: Span) -> PResult<Expression> {
    let (input, left) = parse_range(input)?;
    let (input, right) = opt(pair(comparison_operator, cut(parse_range)))(input)?;
    Ok(match right {
        Some((op, right)) => (input, Expression::binary(op, left, right)),
        None => (input, left),
    })
}

/// `additive (".." additive)?`
#[instrument(level = "debug", skip(input))]
pub fn parse_range(input: Span) -> PResult<Expression> {
    let (input, start) = parse_additive(input)?;
    let (input, end) = opt(preceded(symbol(".."), cut(parse_additive)))(input)?;
    Ok(match end {
        Some(end) => (input, Expression::range(start, end)),
        None => (input, start),
    })
}

#[instrument(level = "debug", skip(input))]
fn parse_additive(input: Span) -> PResult<Expression> {
    let (input, first) = parse_multiplicative(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOperator::Add, char('+')),
            value(BinaryOperator::Subtract, char('-')),
        ))),
        cut(parse_multiplicative),
    ))(input)?;
    Ok((input, fold_binary(first, rest)))
}

#[instrument(level = "debug", skip(input))]
fn parse_multiplicative(input: Span) -> PResult<Expression> {
    let (input, first) = parse_unary(input)?;
    let (input, rest) = many0(pair(
        ws(alt((
            value(BinaryOperator::Multiply, char('*')),
            // `//` starts a comment
            value(BinaryOperator::Divide, terminated(char('/'), not(char('/')))),
            value(BinaryOperator::Modulo, char('%')),
        ))),
        cut(parse_unary),
    ))(input)?;
    Ok((input, fold_binary(first, rest)))
}

#[instrument(level = "debug", skip(input))]
fn parse_unary(input: Span) -> PResult<Expression> {
    let (rest, op) = opt(ws(alt((
        value(UnaryOperator::Negate, char('-')),
        value(UnaryOperator::Not, terminated(char('!'), not(char('=')))),
    ))))(input)?;
    match op {
        Some(op) => {
            let (rest, operand) = cut(nested("expression", parse_unary))(rest)?;
            let expr = match (op, operand) {
                (UnaryOperator::Negate, Expression::Number { value }) => Expression::number(-value),
                (op, operand) => Expression::unary(op, operand),
            };
            Ok((rest, expr))
        }
        None => parse_primary(rest),
    }
}

#[instrument(level = "debug", skip(input))]
fn parse_primary(input: Span) -> PResult<Expression> {
    context(
        "expression",
        ws(alt((
            map(number, Expression::number),
            map(string_literal, Expression::string),
            map(boolean, Expression::boolean),
            parse_random,
            parse_pick_one,
            delimited(
                char('('),
                cut(nested("expression", parse_expression)),
                cut(symbol(")")),
            ),
            map(variable_name, Expression::variable),
        ))),
    )(input)
}

/// `random 1..6` or `random(1..6)`
fn parse_random(input: Span) -> PResult<Expression> {
    let (input, _) = keyword("random")(input)?;
    let (input, range) = cut(ws(alt((
        delimited(symbol("("), required_range, symbol(")")),
        required_range,
    ))))(input)?;
    Ok((
        input,
        Expression::Random {
            range: Box::new(range),
        },
    ))
}

fn required_range(input: Span) -> PResult<Expression> {
    let (rest, start) = parse_additive(input)?;
    let (rest, _) = context("'..'", symbol(".."))(rest)?;
    let (rest, end) = cut(parse_additive)(rest)?;
    Ok((rest, Expression::range(start, end)))
}

fn parse_pick_one(input: Span) -> PResult<Expression> {
    let (input, _) = keyword("pick_one")(input)?;
    let (input, options) = cut(delimited(
        symbol("["),
        separated_list0(symbol(","), parse_expression),
        symbol("]"),
    ))(input)?;
    Ok((input, Expression::PickOne { options }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Expression {
        let (rest, expr) = parse_expression(Span::new(source)).unwrap();
        assert_eq!(*rest.fragment(), "", "unparsed input in {source:?}");
        expr
    }

    fn num(value: f64) -> Expression {
        Expression::number(value)
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(
            parse("5 + 3 * 2"),
            Expression::binary(
                BinaryOperator::Add,
                num(5.0),
                Expression::binary(BinaryOperator::Multiply, num(3.0), num(2.0)),
            )
        );
    }

    #[test]
    fn test_additive_is_left_associative() {
        assert_eq!(
            parse("10 - 4 - 3"),
            Expression::binary(
                BinaryOperator::Subtract,
                Expression::binary(BinaryOperator::Subtract, num(10.0), num(4.0)),
                num(3.0),
            )
        );
    }

    #[test]
    fn test_logical_precedence() {
        let expr = parse("a || b && c == 1");
        let Expression::BinaryOp { op, right, .. } = expr else {
            panic!("expected binary op");
        };
        assert_eq!(op, BinaryOperator::Or);
        assert!(matches!(
            *right,
            Expression::BinaryOp {
                op: BinaryOperator::And,
                ..
            }
        ));
    }

    #[test]
    fn test_unary() {
        assert_eq!(parse("-3"), num(-3.0));
        assert_eq!(
            parse("!done"),
            Expression::unary(UnaryOperator::Not, Expression::variable("done"))
        );
        assert_eq!(
            parse("-x"),
            Expression::unary(UnaryOperator::Negate, Expression::variable("x"))
        );
    }

    #[test]
    fn test_random_forms() {
        let expected = Expression::Random {
            range: Box::new(Expression::range(num(1.0), num(6.0))),
        };
        assert_eq!(parse("random 1..6"), expected);
        assert_eq!(parse("random(1..6)"), expected);
    }

    #[test]
    fn test_pick_one() {
        assert_eq!(
            parse(r#"pick_one ["a", "b"]"#),
            Expression::PickOne {
                options: vec![Expression::string("a"), Expression::string("b")],
            }
        );
        assert_eq!(parse("pick_one []"), Expression::PickOne { options: vec![] });
    }

    #[test]
    fn test_division_is_not_a_comment() {
        let (rest, expr) = parse_expression(Span::new("a / 2 // half")).unwrap();
        assert_eq!(
            expr,
            Expression::binary(BinaryOperator::Divide, Expression::variable("a"), num(2.0))
        );
        assert_eq!(*rest.fragment(), "");
    }

    #[test]
    fn test_expression_stops_at_keyword() {
        let (rest, expr) = parse_expression(Span::new("score > 3 do")).unwrap();
        assert!(matches!(expr, Expression::BinaryOp { .. }));
        assert_eq!(*rest.fragment(), "do");
    }

    #[test]
    fn test_dangling_operator_is_failure() {
        let result = parse_expression(Span::new("1 + "));
        assert!(matches!(result, Err(nom::Err::Failure(_))));
    }
}
