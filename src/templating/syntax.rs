//! Compilation of template source into a node tree.
//!
//! Templates are compiled once into a [`CompiledTemplate`] and then expanded
//! any number of times against different variable scopes. Compilation only
//! splits the source into literal text and tags and parses each tag; no
//! variable is looked up and no file is touched.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{escaped_transform, tag},
    character::complete::{alpha1, alphanumeric1, anychar, char, digit1, multispace0, multispace1, none_of, one_of},
    combinator::{all_consuming, cut, map, map_opt, map_res, not, opt, recognize, value},
    error::{VerboseError, VerboseErrorKind, context},
    multi::{many0, many1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};
use serde_json::{Number, Value};
use std::str::FromStr;

use super::wrap::WrapKind;
use crate::core::PgJbuilderError;

const OPEN_TAG: &str = "<%";
const CLOSE_TAG: &str = "%>";

/// A value position inside a tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal written in the template (`'text'`, `42`, `true`, `null`)
    Literal(Value),
    /// A variable reference, split on `.` (`user.id` becomes `["user", "id"]`)
    Path(Vec<String>),
}

/// One `key: value` pair passed to `include`, `object` or `array`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Variable name introduced in the child scope
    pub key: String,
    /// Value, evaluated in the caller's scope
    pub value: Expr,
}

/// A compiled template construct.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text copied to the output unchanged
    Text(String),
    /// `<%= expr %>`: the stringified value of `expr`
    Output(Expr),
    /// `<%= quote expr %>`: the value passed through the connection's quoting
    Quote(Expr),
    /// `<%= include 'name', key: value %>`
    Include {
        /// Template to expand
        name: Expr,
        /// Extra bindings layered over the current scope
        bindings: Vec<Binding>,
    },
    /// `<%= object 'name' %>` / `<%= array 'name' %>`
    Wrap {
        /// Aggregation applied to the template's rows
        kind: WrapKind,
        /// Template to expand
        name: Expr,
        /// Extra bindings layered over the current scope
        bindings: Vec<Binding>,
    },
    /// `<% object do %> ... <% end %>` / `<% array do %> ... <% end %>`
    Block {
        /// Aggregation applied to the block's rows
        kind: WrapKind,
        /// Block body, expanded in the enclosing scope
        body: Vec<Node>,
    },
}

/// The compiled form of one template.
///
/// Immutable once built. The cache hands out shared references, so an
/// expansion in progress keeps its template alive even if the cache is
/// cleared underneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    name: String,
    nodes: Vec<Node>,
}

impl CompiledTemplate {
    /// Compile `source`, reporting errors against `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PgJbuilderError::TemplateSyntax`] for unclosed tags, unbalanced
    /// blocks, unterminated strings and malformed expressions.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pgjbuilder::templating::CompiledTemplate;
    ///
    /// let template = CompiledTemplate::compile("greeting", "Hello <%= name %>")?;
    /// assert_eq!(template.nodes().len(), 2);
    /// # Ok::<(), pgjbuilder::core::PgJbuilderError>(())
    /// ```
    pub fn compile(name: &str, source: &str) -> Result<Self, PgJbuilderError> {
        compile(name, source)
    }

    /// Name the template was compiled under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-level nodes in source order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

enum Tag {
    Node(Node),
    Open(WrapKind),
    End,
}

struct OpenBlock {
    kind: WrapKind,
    line: usize,
    outer: Vec<Node>,
}

fn compile(name: &str, source: &str) -> Result<CompiledTemplate, PgJbuilderError> {
    let mut nodes = Vec::new();
    let mut blocks: Vec<OpenBlock> = Vec::new();
    let mut text = String::new();
    let mut rest = source;
    let mut line = 1;

    while let Some(start) = rest.find(OPEN_TAG) {
        let before = &rest[..start];
        let after_open = &rest[start + OPEN_TAG.len()..];
        text.push_str(before);
        line += count_newlines(before);

        // `<%%` is an escaped opening delimiter
        if let Some(after_escape) = after_open.strip_prefix('%') {
            text.push_str(OPEN_TAG);
            rest = after_escape;
            continue;
        }

        let Some(end) = after_open.find(CLOSE_TAG) else {
            return Err(syntax_error(name, line, "unclosed tag, expected '%>'"));
        };
        let body = &after_open[..end];
        rest = &after_open[end + CLOSE_TAG.len()..];
        let tag_line = line;
        line += count_newlines(body);

        if body.starts_with('#') {
            continue;
        }
        let body = body.strip_prefix('=').unwrap_or(body);
        let tag = parse_tag(body).map_err(|message| syntax_error(name, tag_line, &message))?;

        flush_text(&mut text, &mut nodes);
        match tag {
            Tag::Node(node) => nodes.push(node),
            Tag::Open(kind) => blocks.push(OpenBlock {
                kind,
                line: tag_line,
                outer: std::mem::take(&mut nodes),
            }),
            Tag::End => {
                let Some(block) = blocks.pop() else {
                    return Err(syntax_error(
                        name,
                        tag_line,
                        "'end' without an open object or array block",
                    ));
                };
                let body = std::mem::replace(&mut nodes, block.outer);
                nodes.push(Node::Block {
                    kind: block.kind,
                    body,
                });
            }
        }
    }

    text.push_str(rest);
    flush_text(&mut text, &mut nodes);

    if let Some(block) = blocks.pop() {
        return Err(syntax_error(
            name,
            block.line,
            &format!("'{} do' block is never closed with 'end'", block.kind.keyword()),
        ));
    }

    Ok(CompiledTemplate {
        name: name.to_string(),
        nodes,
    })
}

fn flush_text(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(std::mem::take(text)));
    }
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

fn syntax_error(name: &str, line: usize, message: &str) -> PgJbuilderError {
    PgJbuilderError::TemplateSyntax {
        name: name.to_string(),
        line,
        message: message.to_string(),
    }
}

type ParseResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Debug, Clone, Copy)]
enum Helper {
    Include,
    Quote,
    Wrap(WrapKind),
}

fn parse_tag(body: &str) -> Result<Tag, String> {
    match all_consuming(delimited(multispace0, tag_body, multispace0))(body) {
        Ok((_, parsed)) => Ok(parsed),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(describe_error(&e)),
        Err(nom::Err::Incomplete(_)) => Err("incomplete tag".to_string()),
    }
}

/// Turns the innermost failure into a one-line message.
fn describe_error(error: &VerboseError<&str>) -> String {
    let label = error.errors.iter().find_map(|(_, kind)| match kind {
        VerboseErrorKind::Context(label) => Some(*label),
        _ => None,
    });
    let expected_char = error.errors.first().and_then(|(_, kind)| match kind {
        VerboseErrorKind::Char(c) => Some(format!("'{c}'")),
        _ => None,
    });
    let at = error.errors.first().map_or("", |(rest, _)| rest.trim());

    match (label.map(str::to_string).or(expected_char), at.is_empty()) {
        (Some(expected), true) => format!("expected {expected} at end of tag"),
        (Some(expected), false) => format!("expected {expected} at '{at}'"),
        (None, true) => "unexpected end of tag".to_string(),
        (None, false) => format!("unexpected '{at}'"),
    }
}

fn tag_body(input: &str) -> ParseResult<'_, Tag> {
    alt((block_tag, map(node, Tag::Node)))(input)
}

/// `end`, `object do` and `array do`.
fn block_tag(input: &str) -> ParseResult<'_, Tag> {
    map_opt(pair(path, opt(preceded(multispace1, path))), |(word, next)| {
        let next = next.map(|segments| segments.join("."));
        match (word.join(".").as_str(), next.as_deref()) {
            ("end", None) => Some(Tag::End),
            ("object", Some("do")) => Some(Tag::Open(WrapKind::Object)),
            ("array", Some("do")) => Some(Tag::Open(WrapKind::Array)),
            _ => None,
        }
    })(input)
}

fn node(input: &str) -> ParseResult<'_, Node> {
    alt((helper_call, map(expr, Node::Output)))(input)
}

fn helper_call(input: &str) -> ParseResult<'_, Node> {
    let (rest, helper) = map_opt(terminated(identifier, not(char('.'))), |word| match word {
        "include" => Some(Helper::Include),
        "quote" => Some(Helper::Quote),
        "object" => Some(Helper::Wrap(WrapKind::Object)),
        "array" => Some(Helper::Wrap(WrapKind::Array)),
        _ => None,
    })(input)?;
    let (rest, _) = multispace0(rest)?;

    let (rest, open_paren) = opt(char('('))(rest)?;
    if open_paren.is_none() {
        return helper_args(helper, rest);
    }
    let (rest, node) = delimited(multispace0, |i| helper_args(helper, i), multispace0)(rest)?;
    let (rest, _) = cut(char(')'))(rest)?;
    Ok((rest, node))
}

fn helper_args(helper: Helper, input: &str) -> ParseResult<'_, Node> {
    let (rest, name) = cut(expr)(input)?;
    match helper {
        Helper::Quote => Ok((rest, Node::Quote(name))),
        Helper::Include => map(bindings, |bindings| Node::Include {
            name: name.clone(),
            bindings,
        })(rest),
        Helper::Wrap(kind) => map(bindings, |bindings| Node::Wrap {
            kind,
            name: name.clone(),
            bindings,
        })(rest),
    }
}

/// Zero or more `key: value` / `key = value` pairs, commas optional.
fn bindings(input: &str) -> ParseResult<'_, Vec<Binding>> {
    many0(preceded(pair(multispace0, opt(pair(char(','), multispace0))), binding))(input)
}

fn binding(input: &str) -> ParseResult<'_, Binding> {
    let (rest, key) = identifier(input)?;
    let (rest, _) = delimited(multispace0, one_of(":="), multispace0)(rest)?;
    let (rest, value) = cut(expr)(rest)?;
    Ok((
        rest,
        Binding {
            key: key.to_string(),
            value,
        },
    ))
}

fn expr(input: &str) -> ParseResult<'_, Expr> {
    context(
        "a value",
        alt((
            map(quoted('\''), |text| Expr::Literal(Value::String(text))),
            map(quoted('"'), |text| Expr::Literal(Value::String(text))),
            map(number, |n| Expr::Literal(Value::Number(n))),
            map(path, word),
        )),
    )(input)
}

fn word(segments: Vec<String>) -> Expr {
    if let [single] = segments.as_slice() {
        match single.as_str() {
            "true" => return Expr::Literal(Value::Bool(true)),
            "false" => return Expr::Literal(Value::Bool(false)),
            "null" | "nil" => return Expr::Literal(Value::Null),
            _ => {}
        }
    }
    Expr::Path(segments)
}

fn identifier(input: &str) -> ParseResult<'_, &str> {
    recognize(pair(alt((alpha1, tag("_"))), many0(alt((alphanumeric1, tag("_"))))))(input)
}

/// `user.id`, `rows.0.name`: an identifier followed by dotted segments.
fn path(input: &str) -> ParseResult<'_, Vec<String>> {
    let segment = recognize(many1(alt((alphanumeric1, tag("_")))));
    let (rest, head) = identifier(input)?;
    let (rest, tail) = many0(preceded(char('.'), cut(context("a path segment", segment))))(rest)?;

    let mut segments = Vec::with_capacity(tail.len() + 1);
    segments.push(head.to_string());
    segments.extend(tail.into_iter().map(str::to_string));
    Ok((rest, segments))
}

fn number(input: &str) -> ParseResult<'_, Number> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        Number::from_str,
    )(input)
}

/// A string in `quote_char`; `\n` and `\t` are escapes, any other escaped
/// character stands for itself.
fn quoted<'a>(quote_char: char) -> impl FnMut(&'a str) -> ParseResult<'a, String> {
    let plain = if quote_char == '\'' { "'\\" } else { "\"\\" };
    move |input| {
        let (rest, _) = char(quote_char)(input)?;
        let (rest, text) = opt(escaped_transform(
            none_of(plain),
            '\\',
            alt((value('\n', char('n')), value('\t', char('t')), anychar)),
        ))(rest)?;
        let (rest, _) = cut(context("a closing quote", char(quote_char)))(rest)?;
        Ok((rest, text.unwrap_or_default()))
    }
}
