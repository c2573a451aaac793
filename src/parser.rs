//! # Grid Layout Parser
//!
//! Parses grid layout strings such as `3x3` or `1 x 3` into a
//! `(columns, rows)` pair. The separator may be `x`, `X` or `×`, and
//! whitespace is allowed around every token.
//!
//! Only the syntax is checked here; which layouts are actually supported is
//! decided by [`GridSize`](crate::schema::GridSize).
//!
//! ```rust
//! # use postcraft::parser::parse_grid_size;
//! assert_eq!((1, 3), parse_grid_size("1 x 3").unwrap());
//! ```

use nom::{
    IResult, Parser,
    branch::alt,
    character::complete::{char, multispace0, u32 as number},
    sequence::{delimited, separated_pair},
};

// <grid> ::= <cols> <sep> <rows>
// <sep>  ::= "x" | "X" | "×"
pub fn parse_grid_size(input: &str) -> Result<(u32, u32), ParseErrorDetail> {
    let (rest, size) = grid_expr(input).map_err(|e| match e {
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
        nom::Err::Incomplete(_) => ParseErrorDetail {
            kind: ParseErrorKind::UnexpectedToken,
            location: "<incomplete>".to_string(),
        },
    })?;

    if !rest.trim().is_empty() {
        return Err(ParseErrorDetail {
            kind: ParseErrorKind::UnexpectedToken,
            location: rest.to_string(),
        });
    }

    Ok(size)
}

fn grid_expr(input: &str) -> IResult<&str, (u32, u32), ParseErrorDetail> {
    separated_pair(
        ws(number),
        ws(alt((char('x'), char('X'), char('×')))),
        ws(number),
    )
    .parse(input)
}

fn ws<'a, F: 'a>(inner: F) -> impl Parser<&'a str, Output = F::Output, Error = F::Error>
where
    F: Parser<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnexpectedToken,
    /// Well-formed, but not one of the layouts a grid can be cut into.
    UnsupportedLayout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrorDetail {
    pub kind: ParseErrorKind,
    pub location: String,
}

impl std::fmt::Display for ParseErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ParseErrorKind::UnexpectedToken => write!(f, "unexpected token at {:?}", self.location),
            ParseErrorKind::UnsupportedLayout => write!(f, "unsupported layout {}", self.location),
        }
    }
}

impl nom::error::ParseError<&str> for ParseErrorDetail {
    fn from_error_kind(input: &str, _kind: nom::error::ErrorKind) -> Self {
        ParseErrorDetail {
            kind: ParseErrorKind::UnexpectedToken,
            location: input.to_string(),
        }
    }

    fn append(_input: &str, _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{ParseErrorKind, parse_grid_size};

    #[test]
    fn test_parse_grid_size() {
        assert_eq!(Ok((3, 3)), parse_grid_size("3x3"));
        assert_eq!(Ok((1, 3)), parse_grid_size(" 1 X 3 "));
        assert_eq!(Ok((3, 1)), parse_grid_size("3×1"));
        assert_eq!(Ok((12, 4)), parse_grid_size("12x4"));
    }

    #[test]
    fn test_parse_grid_size_errors() {
        let err = parse_grid_size("3x3x3").unwrap_err();
        assert_eq!(ParseErrorKind::UnexpectedToken, err.kind);
        assert_eq!("x3", err.location);

        assert!(parse_grid_size("3 by 3").is_err());
        assert!(parse_grid_size("x3").is_err());
        assert!(parse_grid_size("").is_err());
    }
}
