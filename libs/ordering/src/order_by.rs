//! Sort clause model and parser
//!
//! ```text
//! order_by   := field_path [WS direction] {"," [WS] field_path [WS direction]}
//! field_path := ident {"." ident}
//! direction  := "asc" | "desc"   (case insensitive)
//! ```

use aip_schema::MessageDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn is_descending(self) -> bool {
        self == Direction::Desc
    }

    fn from_keyword(word: &str) -> Option<Direction> {
        if word.eq_ignore_ascii_case("asc") {
            Some(Direction::Asc)
        } else if word.eq_ignore_ascii_case("desc") {
            Some(Direction::Desc)
        } else {
            None
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        })
    }
}

/// One sort key: a dotted field path and its direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderField {
    pub path: String,
    #[serde(default)]
    pub direction: Direction,
}

impl OrderField {
    pub fn new(path: impl Into<String>, direction: Direction) -> Self {
        Self {
            path: path.into(),
            direction,
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.')
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if self.direction.is_descending() {
            f.write_str(" desc")?;
        }
        Ok(())
    }
}

/// Parsed `order_by` clause. The empty clause means "service default order".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OrderBy {
    pub fields: Vec<OrderField>,
}

impl OrderBy {
    pub fn parse(input: &str) -> Result<OrderBy> {
        let result = Scanner::new(input).order_by();
        if let Err(error) = &result {
            tracing::debug!(%error, input, "rejected order_by");
        }
        result
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OrderField> {
        self.fields.iter()
    }

    /// Check every path against `message`. Each segment before the last must be a
    /// singular message field.
    pub fn validate(&self, message: &dyn MessageDescriptor) -> Result<()> {
        for field in &self.fields {
            validate_path(message, field)?;
        }
        Ok(())
    }
}

fn validate_path(root: &dyn MessageDescriptor, field: &OrderField) -> Result<()> {
    let unknown = |message: &dyn MessageDescriptor| Error::UnknownField {
        path: field.path.clone(),
        message: message.full_name().to_string(),
    };

    let mut segments = field.segments();
    let mut current = match segments.next() {
        Some(name) => root.field(name).ok_or_else(|| unknown(root))?,
        None => return Err(unknown(root)),
    };
    for name in segments {
        let traversable = current.kind().is_message() && !current.is_repeated() && !current.is_map();
        let message = current.message().filter(|_| traversable).ok_or_else(|| {
            Error::NotTraversable {
                path: field.path.clone(),
                segment: current.name().to_string(),
            }
        })?;
        current = message.field(name).ok_or_else(|| unknown(message.as_ref()))?;
    }
    Ok(())
}

impl FromStr for OrderBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        OrderBy::parse(s)
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a OrderBy {
    type Item = &'a OrderField;
    type IntoIter = std::slice::Iter<'a, OrderField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

// ============================================
// Scanner
// ============================================

struct Scanner<'a> {
    input: &'a str,
    offset: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, offset: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.offset..]
    }

    fn current_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.offset;
        let len = self
            .rest()
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(self.rest().len());
        self.offset += len;
        self.offset > start
    }

    fn order_by(&mut self) -> Result<OrderBy> {
        let mut fields = Vec::new();
        self.skip_ws();
        if self.rest().is_empty() {
            return Ok(OrderBy { fields });
        }

        loop {
            self.skip_ws();
            fields.push(self.field()?);
            self.skip_ws();
            match self.current_char() {
                None => break,
                Some(',') => self.offset += 1,
                Some(c) => {
                    return Err(Error::syntax(
                        self.offset,
                        format!("expected ',' or end of input, found '{c}'"),
                    ))
                }
            }
        }
        Ok(OrderBy { fields })
    }

    fn field(&mut self) -> Result<OrderField> {
        let start = self.offset;
        self.ident()?;
        while self.current_char() == Some('.') {
            self.offset += 1;
            self.ident()?;
        }
        let path = self.input[start..self.offset].to_string();

        let before_direction = self.offset;
        if !self.skip_ws() {
            return Ok(OrderField::new(path, Direction::Asc));
        }
        let word_len = self
            .rest()
            .find(|c: char| !is_ident_char(c))
            .unwrap_or(self.rest().len());
        if word_len == 0 {
            self.offset = before_direction;
            return Ok(OrderField::new(path, Direction::Asc));
        }
        let word = &self.rest()[..word_len];
        match Direction::from_keyword(word) {
            Some(direction) => {
                self.offset += word_len;
                Ok(OrderField::new(path, direction))
            }
            None => Err(Error::syntax(
                self.offset,
                format!("expected 'asc' or 'desc', found '{word}'"),
            )),
        }
    }

    fn ident(&mut self) -> Result<()> {
        match self.current_char() {
            Some(c) if c.is_alphabetic() || c == '_' => {}
            Some(c) => {
                return Err(Error::syntax(
                    self.offset,
                    format!("expected a field name, found '{c}'"),
                ))
            }
            None => return Err(Error::syntax(self.offset, "expected a field name")),
        }
        let len = self
            .rest()
            .find(|c: char| !is_ident_char(c))
            .unwrap_or(self.rest().len());
        self.offset += len;
        Ok(())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_field() {
        let order = OrderBy::parse("title").unwrap();
        assert_eq!(order.fields, vec![OrderField::new("title", Direction::Asc)]);
    }

    #[test]
    fn test_directions_case_insensitive() {
        let order = OrderBy::parse("a DESC, b Asc,c desc").unwrap();
        let directions: Vec<Direction> = order.iter().map(|f| f.direction).collect();
        assert_eq!(
            directions,
            vec![Direction::Desc, Direction::Asc, Direction::Desc]
        );
        assert_eq!(order.to_string(), "a desc, b, c desc");
    }

    #[test]
    fn test_empty_clause() {
        assert!(OrderBy::parse("").unwrap().is_empty());
        assert!(OrderBy::parse("   ").unwrap().is_empty());
        assert_eq!(OrderBy::default().to_string(), "");
    }

    #[test]
    fn test_syntax_errors() {
        let cases = [
            ("a,", 2),
            (",a", 0),
            ("a,,b", 2),
            ("a up", 2),
            ("a.", 2),
            ("a..b", 2),
            ("1a", 0),
            ("a desc desc", 7),
            ("a; b", 1),
        ];
        for (input, pos) in cases {
            match OrderBy::parse(input) {
                Err(Error::Syntax { pos: at, .. }) => assert_eq!(at, pos, "{input:?}"),
                other => panic!("expected syntax error for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_trailing_whitespace() {
        let order = OrderBy::parse("  a.b   desc  ,  c  ").unwrap();
        assert_eq!(order.to_string(), "a.b desc, c");
    }
}
