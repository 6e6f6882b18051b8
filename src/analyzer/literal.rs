use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1},
    combinator::{map, map_res, opt, recognize, value},
    error::context,
    sequence::{pair, preceded, separated_pair, tuple},
    InputTake,
};
use tracing::instrument;

use super::core::*;
use super::syntax::{Duration, DurationUnit};

pub const RESERVED_WORDS: &[&str] = &[
    "true", "false", "random", "pick_one", "do", "end", "to", "from", "in", "else",
];

pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.contains(&word)
}

#[instrument(level = "debug", skip(input))]
pub fn identifier(input: Span) -> PResult<String> {
    context(
        "identifier",
        map(
            recognize(pair(
                take_while1(is_ident_start),
                take_while(is_ident_char),
            )),
            |s: Span| s.fragment().to_string(),
        ),
    )(input)
}

/// Identifier that may name a variable.
pub fn variable_name(input: Span) -> PResult<String> {
    let (rest, name) = identifier(input)?;
    if is_reserved(&name) {
        return Err(nom::Err::Error(SyntaxError::expected(
            input,
            "variable name",
        )));
    }
    Ok((rest, name))
}

pub fn integer(input: Span) -> PResult<i64> {
    context(
        "integer",
        map_res(recognize(pair(opt(char('-')), digit1)), |s: Span| {
            s.fragment().parse::<i64>()
        }),
    )(input)
}

fn unsigned(input: Span) -> PResult<u64> {
    map_res(digit1, |s: Span| s.fragment().parse::<u64>())(input)
}

/// Unsigned decimal number; the sign belongs to unary minus in expressions.
pub fn number(input: Span) -> PResult<f64> {
    context(
        "number",
        map_res(
            recognize(pair(digit1, opt(pair(char('.'), digit1)))),
            |s: Span| s.fragment().parse::<f64>(),
        ),
    )(input)
}

pub fn signed_number(input: Span) -> PResult<f64> {
    context(
        "number",
        map(pair(opt(char('-')), number), |(sign, n)| {
            if sign.is_some() {
                -n
            } else {
                n
            }
        }),
    )(input)
}

pub fn boolean(input: Span) -> PResult<bool> {
    context(
        "boolean",
        alt((
            value(true, keyword("true")),
            value(false, keyword("false")),
        )),
    )(input)
}

/// Double-quoted string with `\"`, `\\`, `\n` and `\t` escapes.
#[instrument(level = "debug", skip(input))]
pub fn string_literal(input: Span) -> PResult<String> {
    let (rest, _) = tag::<_, _, SyntaxError>("\"")(input)
        .map_err(|_| nom::Err::Error(SyntaxError::expected(input, "string")))?;

    let mut value = String::new();
    let mut chars = rest.fragment().char_indices();
    while let Some((index, c)) = chars.next() {
        match c {
            '"' => {
                let (rest, _) = rest.take_split(index + 1);
                return Ok((rest, value));
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c => value.push(c),
        }
    }
    Err(nom::Err::Failure(SyntaxError::custom(
        input,
        "unterminated string literal",
    )))
}

/// `<integer>ms` or `<integer>s`.
pub fn duration(input: Span) -> PResult<Duration> {
    let (rest, (amount, unit)) = context(
        "duration",
        pair(
            unsigned,
            alt((
                value(DurationUnit::Milliseconds, tag("ms")),
                value(DurationUnit::Seconds, tag("s")),
            )),
        ),
    )(input)?;
    if rest.fragment().chars().next().is_some_and(is_ident_char) {
        return Err(nom::Err::Error(SyntaxError::expected(input, "duration")));
    }
    Ok((rest, Duration { amount, unit }))
}

/// `[x, y]` with literal numbers.
pub fn position(input: Span) -> PResult<[f64; 2]> {
    map(
        tuple((
            symbol("["),
            separated_pair(ws(signed_number), symbol(","), ws(signed_number)),
            symbol("]"),
        )),
        |(_, (x, y), _)| [x, y],
    )(input)
}

/// `#name` reference to an agent.
pub fn target(input: Span) -> PResult<String> {
    context("target", preceded(char('#'), identifier))(input)
}
