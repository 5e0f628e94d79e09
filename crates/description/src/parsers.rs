//! Minimal element scanner for cache description documents
//!
//! Only the element structure and attribute values matter for a cache
//! description, so text content, comments, processing instructions and
//! DOCTYPE declarations are recognised and dropped.

// crate modules
use crate::error::{Error, Result};

// nom parser combinators
use nom::branch::alt;
use nom::bytes::complete::{tag, take_till, take_till1, take_until, take_while1};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::{all_consuming, map, value};
use nom::multi::many0;
use nom::sequence::{delimited, preceded, separated_pair, terminated, tuple};
use nom::{self, IResult};

/// A single element of the document tree
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
}

impl Element {
    /// Value of a named attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of the first attribute in document order
    pub fn first_attribute(&self) -> Option<&str> {
        self.attributes.first().map(|(_, value)| value.as_str())
    }
}

/// Lexical units of the document
#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Open(Element),
    SelfClosing(Element),
    Close(&'a str),
    Skip,
}

/// Build the element tree for a whole document
pub(crate) fn document(i: &str) -> Result<Element> {
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut rest = i;

    while !rest.is_empty() {
        let (remainder, token) = token(rest).map_err(|_| {
            Error::invalid(format!(
                "unexpected content near {:?}",
                rest.chars().take(32).collect::<String>()
            ))
        })?;
        rest = remainder;

        match token {
            Token::Skip => {}
            Token::Open(element) => stack.push(element),
            Token::SelfClosing(element) => attach(&mut stack, &mut root, element)?,
            Token::Close(name) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::invalid(format!("unmatched closing tag </{name}>")))?;
                if element.name != name {
                    return Err(Error::invalid(format!(
                        "expected </{}>, found </{name}>",
                        element.name
                    )));
                }
                attach(&mut stack, &mut root, element)?;
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::invalid(format!("unclosed element <{}>", open.name)));
    }

    root.ok_or_else(|| Error::invalid("document has no root element"))
}

/// Parse a `"start-end"` time range, allowing a negative start
pub(crate) fn time_range(i: &str) -> Result<(i32, i32)> {
    all_consuming(range)(i.trim())
        .map(|(_, r)| r)
        .map_err(|_| Error::invalid(format!("unable to parse time range {i:?}")))
}

fn range(i: &str) -> IResult<&str, (i32, i32)> {
    separated_pair(
        nom::character::complete::i32,
        char('-'),
        nom::character::complete::i32,
    )(i)
}

/// Decode the predefined entities of an attribute value
pub(crate) fn unescape(i: &str) -> String {
    i.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Attach a completed element to its parent, or make it the root
fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(Error::invalid(format!(
                "second root element <{}>",
                element.name
            )))
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn token(i: &str) -> IResult<&str, Token<'_>> {
    alt((comment, processing_instruction, declaration, close_tag, start_tag, text))(i)
}

fn comment(i: &str) -> IResult<&str, Token<'_>> {
    value(
        Token::Skip,
        delimited(tag("<!--"), take_until("-->"), tag("-->")),
    )(i)
}

fn processing_instruction(i: &str) -> IResult<&str, Token<'_>> {
    value(Token::Skip, delimited(tag("<?"), take_until("?>"), tag("?>")))(i)
}

fn declaration(i: &str) -> IResult<&str, Token<'_>> {
    value(Token::Skip, delimited(tag("<!"), take_until(">"), char('>')))(i)
}

fn text(i: &str) -> IResult<&str, Token<'_>> {
    value(Token::Skip, take_till1(|c: char| c == '<'))(i)
}

fn close_tag(i: &str) -> IResult<&str, Token<'_>> {
    map(
        delimited(tag("</"), terminated(name, multispace0), char('>')),
        Token::Close,
    )(i)
}

fn start_tag(i: &str) -> IResult<&str, Token<'_>> {
    let (i, (_, name, attributes, _, end)) = tuple((
        char('<'),
        name,
        many0(preceded(multispace1, attribute)),
        multispace0,
        alt((tag("/>"), tag(">"))),
    ))(i)?;

    let element = Element {
        name: name.to_string(),
        attributes,
        children: Vec::new(),
    };

    match end {
        "/>" => Ok((i, Token::SelfClosing(element))),
        _ => Ok((i, Token::Open(element))),
    }
}

fn attribute(i: &str) -> IResult<&str, (String, String)> {
    map(
        separated_pair(name, tuple((multispace0, char('='), multispace0)), quoted),
        |(key, value)| (key.to_string(), unescape(value)),
    )(i)
}

fn quoted(i: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), take_till(|c: char| c == '"'), char('"')),
        delimited(char('\''), take_till(|c: char| c == '\''), char('\'')),
    ))(i)
}

fn name(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))(i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_quotes() {
        assert_eq!(quoted("\"1\" b"), Ok((" b", "1")));
        assert_eq!(quoted("'x y'"), Ok(("", "x y")));
        assert_eq!(quoted("\"\""), Ok(("", "")));
        assert_eq!(
            attribute(r#"Range = "0-250""#),
            Ok(("", ("Range".to_string(), "0-250".to_string())))
        );
    }

    #[test]
    fn test_tags() {
        assert!(matches!(close_tag("</Channels >"), Ok(("", Token::Close("Channels")))));
        assert!(matches!(start_tag("<Channels>"), Ok(("", Token::Open(_)))));
        assert!(matches!(
            start_tag("<cacheType Type=\"OneFile\" Format=\"mcc\"/>"),
            Ok(("", Token::SelfClosing(_)))
        ));
        assert_eq!(comment("<!-- <not> a tag -->rest"), Ok(("rest", Token::Skip)));
        assert_eq!(processing_instruction("<?xml version=\"1.0\"?>"), Ok(("", Token::Skip)));
    }

    #[test]
    fn test_document_tree() {
        let root = document(
            "<?xml version=\"1.0\"?>\n<a x=\"1\">\n  <!-- c -->\n  <b/>\n  <c y='2'>text</c>\n</a>\n",
        )
        .unwrap();
        assert_eq!(root.name, "a");
        assert_eq!(root.first_attribute(), Some("1"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[1].attribute("y"), Some("2"));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(document("<a><b></a>").is_err());
        assert!(document("<a>").is_err());
        assert!(document("<a/><b/>").is_err());
        assert!(document("just text").is_err());
        assert!(document("<a x=1/>").is_err());
    }

    #[test]
    fn test_time_range() {
        assert_eq!(time_range("250-1000").unwrap(), (250, 1000));
        assert_eq!(time_range(" -250-1000 ").unwrap(), (-250, 1000));
        assert!(time_range("250").is_err());
        assert!(time_range("a-b").is_err());
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("a &amp;&lt;b&gt; &quot;c&quot;"), "a &<b> \"c\"");
        assert_eq!(unescape("&amp;lt;"), "&lt;");
    }
}
