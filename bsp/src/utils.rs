use nom::{
    IResult,
    bytes::complete::take_till,
    character::complete::{char, multispace0},
    sequence::{delimited, preceded},
};

pub type SResult<'a, T> = IResult<&'a str, T>;

/// `"some text"` without escapes, a quote can never appear inside.
pub fn quoted_text(i: &str) -> SResult<'_, &str> {
    delimited(char('"'), take_till(|c| c == '"'), char('"'))(i)
}

pub fn ws_quoted_text(i: &str) -> SResult<'_, &str> {
    preceded(multispace0, quoted_text)(i)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quoted() {
        assert_eq!(quoted_text("\"classname\" rest"), Ok((" rest", "classname")));
        assert_eq!(quoted_text("\"\"x"), Ok(("x", "")));
        assert!(quoted_text("\"unterminated").is_err());
        assert!(quoted_text("bare").is_err());
    }
}
