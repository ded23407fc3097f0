//! Tokenizer for the entity lump.
//!
//! The lump is a sequence of `{ "key" "value" ... }` blocks. Anything that is
//! not a brace, a quoted string or whitespace is a hard parse error, as is an
//! unterminated string.

use std::collections::HashMap;

use nom::{
    character::complete::{char, multispace0},
    combinator::{all_consuming, map},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};

use crate::{
    error::BspError,
    utils::{SResult, ws_quoted_text},
};

/// One raw entity record. Typed interpretation happens a layer up, keyed by
/// the `classname` value.
pub type Entity = HashMap<String, String>;

fn key_value(i: &str) -> SResult<'_, (&str, &str)> {
    pair(ws_quoted_text, ws_quoted_text)(i)
}

fn block(i: &str) -> SResult<'_, Entity> {
    map(
        delimited(
            preceded(multispace0, char('{')),
            many0(key_value),
            preceded(multispace0, char('}')),
        ),
        |pairs| {
            pairs
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect()
        },
    )(i)
}

pub fn parse_entities(input: &str) -> Result<Vec<Entity>, BspError> {
    let (_, entities) = all_consuming(terminated(many0(block), multispace0))(input)
        .map_err(|_| BspError::ParseEntities)?;

    Ok(entities)
}
