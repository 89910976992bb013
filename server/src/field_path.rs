//! Parser for field paths addressing a location inside a document tree
//!
//! This module uses nom to parse paths like:
//! - `coupons` (top-level field)
//! - `coupons.freebies` (field inside each coupon component)
//! - `coupons[0,2].freebies` (same, restricted to coupons 0 and 2)
//! - `blocks[1].items.discount` (two levels of component nesting)
//!
//! Bracket indices bind only to the first segment, and total depth is capped
//! at three dot-separated segments.

use itertools::Itertools;
use nom::bytes::complete::{take_while, take_while1};
use nom::character::complete::{char, digit1};
use nom::combinator::{map_res, opt, recognize};
use nom::multi::{many0, separated_list1};
use nom::sequence::{delimited, pair, preceded};
use nom::{IResult, Parser};

use crate::error::{Error, Result};

/// Newtype for a single path segment (`[a-zA-Z_][a-zA-Z0-9_]*`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldName(String);

impl FieldName {
    /// Get the segment as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FieldName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A parsed, immutable field path
///
/// `indices`, when present, is a non-empty ascending deduplicated list of
/// 0-based entries of the first-level component array to target; `None`
/// means "all entries".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    /// A top-level document field
    Top {
        /// The field to clear
        field: FieldName,
    },
    /// A field one component level down
    Nested {
        /// First-level component field on the document
        field:    FieldName,
        /// Field inside each targeted component entry
        subfield: FieldName,
        /// Restriction to specific first-level entries
        indices:  Option<Vec<usize>>,
    },
    /// A field two component levels down
    DeepNested {
        /// First-level component field on the document
        field:    FieldName,
        /// Component field inside each first-level entry
        midfield: FieldName,
        /// Field inside each second-level entry
        subfield: FieldName,
        /// Restriction to specific first-level entries
        indices:  Option<Vec<usize>>,
    },
}

/// Parse a path segment (alphanumeric + underscore, not starting with a digit)
fn segment(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// Parse a bracketed index list: `[0]` or `[0,2,5]`
fn index_list(input: &str) -> IResult<&str, Vec<usize>> {
    delimited(
        char('['),
        separated_list1(char(','), map_res(digit1, str::parse::<usize>)),
        char(']'),
    )
    .parse(input)
}

/// Parse the whole path: first segment with optional index list, then up to
/// two further dot-separated segments (enforced after parsing)
#[allow(clippy::type_complexity, reason = "shape mirrors the grammar")]
fn path_parts(input: &str) -> IResult<&str, ((&str, Option<Vec<usize>>), Vec<&str>)> {
    pair(
        pair(segment, opt(index_list)),
        many0(preceded(char('.'), segment)),
    )
    .parse(input)
}

impl FieldPath {
    /// Parse a path string into a `FieldPath`.
    ///
    /// Fails with `InvalidPath` when the string does not match the grammar
    /// or uses more than three segments. Duplicate indices are deduplicated
    /// and echoed back in ascending order.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("Field path cannot be empty".to_string()).into());
        }

        let Ok(("", ((field, indices), rest))) = path_parts(trimmed) else {
            return Err(Error::invalid_path(trimmed).into());
        };

        let indices = indices.map(|mut list| {
            list.sort_unstable();
            list.dedup();
            list
        });

        match rest.as_slice() {
            // Indices on a bare field have no effect: the whole field is
            // cleared either way.
            [] => Ok(Self::Top {
                field: field.into(),
            }),
            [subfield] => Ok(Self::Nested {
                field: field.into(),
                subfield: (*subfield).into(),
                indices,
            }),
            [midfield, subfield] => Ok(Self::DeepNested {
                field: field.into(),
                midfield: (*midfield).into(),
                subfield: (*subfield).into(),
                indices,
            }),
            _ => Err(Error::invalid_path(trimmed).into()),
        }
    }

    /// The first-level field this path addresses
    pub fn field(&self) -> &FieldName {
        match self {
            Self::Top { field }
            | Self::Nested { field, .. }
            | Self::DeepNested { field, .. } => field,
        }
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let render_indices = |indices: &Option<Vec<usize>>| -> String {
            indices
                .as_ref()
                .map(|list| format!("[{}]", list.iter().join(",")))
                .unwrap_or_default()
        };
        match self {
            Self::Top { field } => write!(f, "{field}"),
            Self::Nested {
                field,
                subfield,
                indices,
            } => write!(f, "{field}{}.{subfield}", render_indices(indices)),
            Self::DeepNested {
                field,
                midfield,
                subfield,
                indices,
            } => write!(
                f,
                "{field}{}.{midfield}.{subfield}",
                render_indices(indices)
            ),
        }
    }
}
