//! Source text to [`Story`].
//!
//! The grammar ([`story`], [`expression`], [`literal`]) produces a
//! [`syntax`] tree carrying source positions; the
//! [`AstBuilder`](crate::builder::AstBuilder) then turns it into the public
//! AST. Both stages report problems as a positioned [`ParseError`].

pub mod core;
pub mod expression;
pub mod literal;
pub mod story;
pub mod syntax;

use nom::{combinator::eof, error::context, sequence::terminated};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use self::core::{ws, Pos, Span, SyntaxError};
use self::syntax::SyntaxStory;
use crate::ast::Story;
use crate::builder::{AstBuilder, IdGenerator, SequentialIdGenerator, UuidIdGenerator};

/// A fatal problem in a story source. Line and column are 1-based.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn at(pos: Pos, message: impl Into<String>) -> Self {
        Self::new(message, pos.line, pos.column)
    }
}

impl From<SyntaxError<'_>> for ParseError {
    fn from(error: SyntaxError<'_>) -> Self {
        ParseError::new(error.describe(), error.line(), error.column())
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parses a story, assigning random (uuid v4) ids to agents without an
/// explicit `#id`.
pub fn parse(source: &str) -> Result<Story, ParseError> {
    parse_with(source, &mut UuidIdGenerator)
}

#[instrument(level = "debug", skip(source, ids))]
pub fn parse_with(source: &str, ids: &mut dyn IdGenerator) -> Result<Story, ParseError> {
    let syntax = parse_syntax(source)?;
    let story = AstBuilder::new(ids).build(syntax)?;
    debug!(
        title = %story.title,
        pages = story.pages.len(),
        "parsed story"
    );
    Ok(story)
}

/// Runs the grammar only.
pub fn parse_syntax(source: &str) -> Result<SyntaxStory, ParseError> {
    let input = Span::new(source);
    match terminated(story::parse_story, context("end of input", ws(eof)))(input) {
        Ok((_, story)) => Ok(story),
        Err(nom::Err::Error(error)) | Err(nom::Err::Failure(error)) => Err(error.into()),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::new("incomplete input", 1, 1)),
    }
}

/// Checks a source without keeping the AST. Never fails;
/// `validate(s).valid == parse(s).is_ok()`.
pub fn validate(source: &str) -> Validation {
    match parse_with(source, &mut SequentialIdGenerator::default()) {
        Ok(_) => Validation {
            valid: true,
            error: None,
        },
        Err(error) => Validation {
            valid: false,
            error: Some(error.to_string()),
        },
    }
}
