use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{multispace1, not_line_ending},
    combinator::{recognize, value},
    error::{ContextError, ErrorKind, FromExternalError, ParseError as NomParseError},
    multi::many0_count,
    sequence::{delimited, pair},
    IResult,
};
use nom_locate::LocatedSpan;
use std::cell::Cell;

/// Source text with offset/line/column tracking.
pub type Span<'a> = LocatedSpan<&'a str>;

pub type PResult<'a, O> = IResult<Span<'a>, O, SyntaxError<'a>>;

/// Grammar failure at a source location.
///
/// Alternatives are merged by keeping the failure that got furthest into the
/// input, so the reported location is the deepest point the grammar reached.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError<'a> {
    pub input: Span<'a>,
    pub kind: Option<ErrorKind>,
    pub expected: Option<String>,
    pub message: Option<String>,
}

impl<'a> SyntaxError<'a> {
    pub fn expected(input: Span<'a>, expected: impl Into<String>) -> Self {
        Self {
            input,
            kind: None,
            expected: Some(expected.into()),
            message: None,
        }
    }

    pub fn custom(input: Span<'a>, message: impl Into<String>) -> Self {
        Self {
            input,
            kind: None,
            expected: None,
            message: Some(message.into()),
        }
    }

    pub fn offset(&self) -> usize {
        self.input.location_offset()
    }

    pub fn line(&self) -> usize {
        self.input.location_line() as usize
    }

    pub fn column(&self) -> usize {
        self.input.get_utf8_column()
    }

    pub fn describe(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        let found = describe_found(self.input.fragment());
        match &self.expected {
            Some(expected) => format!("expected {}, found {}", expected, found),
            None => format!("unexpected {}", found),
        }
    }
}

fn describe_found(rest: &str) -> String {
    if rest.is_empty() {
        return "end of input".to_string();
    }
    let word: String = rest
        .chars()
        .take_while(|c| !c.is_whitespace())
        .take(20)
        .collect();
    if word.is_empty() {
        let c = rest.chars().next().unwrap_or(' ');
        format!("{:?}", c)
    } else {
        format!("'{}'", word)
    }
}

impl<'a> NomParseError<Span<'a>> for SyntaxError<'a> {
    fn from_error_kind(input: Span<'a>, kind: ErrorKind) -> Self {
        Self {
            input,
            kind: Some(kind),
            expected: None,
            message: None,
        }
    }

    fn append(_input: Span<'a>, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    fn or(self, other: Self) -> Self {
        if other.offset() >= self.offset() {
            other
        } else {
            self
        }
    }
}

impl<'a> ContextError<Span<'a>> for SyntaxError<'a> {
    // A context names what was expected only when the failure sits where the
    // context started; deeper failures keep their own description.
    fn add_context(input: Span<'a>, ctx: &'static str, mut other: Self) -> Self {
        let start = match skip(input) {
            Ok((rest, _)) => rest.location_offset(),
            Err(_) => input.location_offset(),
        };
        if other.offset() <= start || (other.expected.is_none() && other.message.is_none()) {
            other.expected = Some(ctx.to_string());
        }
        other
    }
}

impl<'a, E: std::fmt::Display> FromExternalError<Span<'a>, E> for SyntaxError<'a> {
    fn from_external_error(input: Span<'a>, kind: ErrorKind, e: E) -> Self {
        Self {
            input,
            kind: Some(kind),
            expected: None,
            message: Some(e.to_string()),
        }
    }
}

/// Line/column of a syntax node, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn of(span: &Span) -> Self {
        Self {
            line: span.location_line() as usize,
            column: span.get_utf8_column(),
        }
    }
}

/// Skips whitespace and `//` line comments.
pub fn skip(input: Span) -> PResult<()> {
    value(
        (),
        many0_count(alt((
            multispace1,
            recognize(pair(tag("//"), not_line_ending)),
        ))),
    )(input)
}

pub fn ws<'a, F, O>(inner: F) -> impl FnMut(Span<'a>) -> PResult<'a, O>
where
    F: FnMut(Span<'a>) -> PResult<'a, O>,
{
    delimited(skip, inner, skip)
}

pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Matches `word` only on a word boundary, so `to` does not match `total`.
pub fn keyword<'a>(word: &'static str) -> impl FnMut(Span<'a>) -> PResult<'a, Span<'a>> {
    move |input: Span<'a>| {
        let expected = || nom::Err::Error(SyntaxError::expected(input, format!("'{}'", word)));
        let (rest, matched) =
            tag::<_, _, SyntaxError<'a>>(word)(input).map_err(|_| expected())?;
        if rest.fragment().chars().next().is_some_and(is_ident_char) {
            return Err(expected());
        }
        Ok((rest, matched))
    }
}

/// Punctuation token surrounded by optional whitespace.
pub fn symbol<'a>(text: &'static str) -> impl FnMut(Span<'a>) -> PResult<'a, Span<'a>> {
    ws(move |input: Span<'a>| {
        tag::<_, _, SyntaxError<'a>>(text)(input)
            .map_err(|_| nom::Err::Error(SyntaxError::expected(input, format!("'{}'", text))))
    })
}

/// Records the position of the first token of `inner`.
pub fn positioned<'a, F, O>(mut inner: F) -> impl FnMut(Span<'a>) -> PResult<'a, (Pos, O)>
where
    F: FnMut(Span<'a>) -> PResult<'a, O>,
{
    move |input: Span<'a>| {
        let (input, _) = skip(input)?;
        let pos = Pos::of(&input);
        let (rest, output) = inner(input)?;
        Ok((rest, (pos, output)))
    }
}

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Deepest nesting of parenthesized expressions, unary operators and blocks
/// the grammar accepts.
pub const MAX_NESTING: usize = 40;

/// Runs a recursive rule one nesting level deeper. Past [`MAX_NESTING`] the
/// rule fails with `what nested too deeply` instead of recursing further.
pub fn nested<'a, F, O>(
    what: &'static str,
    mut inner: F,
) -> impl FnMut(Span<'a>) -> PResult<'a, O>
where
    F: FnMut(Span<'a>) -> PResult<'a, O>,
{
    move |input: Span<'a>| {
        let depth = DEPTH.with(|d| {
            let depth = d.get() + 1;
            d.set(depth);
            depth
        });
        let result = if depth > MAX_NESTING {
            Err(nom::Err::Failure(SyntaxError::custom(
                input,
                format!("{} nested too deeply", what),
            )))
        } else {
            inner(input)
        };
        DEPTH.with(|d| d.set(d.get() - 1));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_whitespace_and_comments() {
        let input = Span::new("  // note\n\t  // another\n  page");
        let (rest, _) = skip(input).unwrap();
        assert_eq!(*rest.fragment(), "page");
        assert_eq!(rest.location_line(), 3);
        assert_eq!(rest.get_utf8_column(), 3);
    }

    #[test]
    fn test_keyword_respects_word_boundary() {
        assert!(keyword("to")(Span::new("to 5")).is_ok());
        assert!(keyword("to")(Span::new("total")).is_err());
        assert!(keyword("to")(Span::new("to[")).is_ok());
    }

    #[test]
    fn test_or_keeps_furthest_failure() {
        let source = Span::new("abcdef");
        let (near, _) = nom::bytes::complete::take::<_, _, SyntaxError>(1usize)(source).unwrap();
        let (far, _) = nom::bytes::complete::take::<_, _, SyntaxError>(4usize)(source).unwrap();
        let near = SyntaxError::expected(near, "x");
        let far = SyntaxError::expected(far, "y");
        assert_eq!(near.clone().or(far.clone()), far);
        assert_eq!(far.clone().or(near), far);
    }

    #[test]
    fn test_describe_found() {
        let error = SyntaxError::expected(Span::new("blah rest"), "'end'");
        assert_eq!(error.describe(), "expected 'end', found 'blah'");
        let error = SyntaxError::expected(Span::new(""), "'end'");
        assert_eq!(error.describe(), "expected 'end', found end of input");
    }

    #[test]
    fn test_nested_limit_resets() {
        fn parens(input: Span) -> PResult<()> {
            alt((
                value((), delimited(tag("("), nested("group", parens), tag(")"))),
                value((), tag("x")),
            ))(input)
        }
        let ok = format!("{}x{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(parens(Span::new(&ok)).is_ok());

        let deep = format!(
            "{}x{}",
            "(".repeat(MAX_NESTING + 1),
            ")".repeat(MAX_NESTING + 1)
        );
        match parens(Span::new(&deep)) {
            Err(nom::Err::Failure(error)) => {
                assert_eq!(error.describe(), "group nested too deeply")
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(parens(Span::new(&ok)).is_ok());
    }
}
