//! Stylesheet reader.
//!
//! Tokenizes with `cssparser` and produces flat rule blocks with a selector tree
//! and the raw declaration text. It is only as smart as sprite generation needs:
//! `@media` and `@supports` bodies are flattened, other at-rules are skipped, and
//! each member of a selector group (`a, b { .. }`) becomes its own block.

use crate::error::{Result, SpriteError};
use crate::selector::SelectorNode;
use cssparser::{ParseError, Parser, ParserInput, SourceLocation, SourcePosition, Token};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One `property: value` pair, value kept verbatim (trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn is_background(&self) -> bool {
        self.property.contains("background")
    }
}

/// A rule: one selector and its declarations in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleBlock {
    pub selector: SelectorNode,
    pub declarations: Vec<Declaration>,
}

impl StyleBlock {
    pub fn new(selector: SelectorNode, declarations: Vec<Declaration>) -> Self {
        Self {
            selector,
            declarations,
        }
    }

    /// Declarations whose property name contains `background`.
    pub fn background_declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(|d| d.is_background())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stylesheet {
    pub blocks: Vec<StyleBlock>,
}

impl FromStr for Stylesheet {
    type Err = SpriteError;
    fn from_str(s: &str) -> Result<Self> {
        parse_stylesheet(s)
    }
}

/// Parses stylesheet text into blocks.
pub fn parse_stylesheet(src: &str) -> Result<Stylesheet> {
    let mut input = ParserInput::new(src);
    let mut parser = Parser::new(&mut input);
    let mut blocks = Vec::new();
    parse_rule_list(&mut parser, &mut blocks)?;
    Ok(Stylesheet { blocks })
}

/// Parses a single selector. Returns `None` for blank input; only the first
/// member of a group is kept.
pub fn parse_selector(text: &str) -> Option<SelectorNode> {
    let mut input = ParserInput::new(text);
    let mut parser = Parser::new(&mut input);
    let mut group = SelectorGroup::default();
    read_selectors(&mut parser, &mut group).ok()?;
    group.finish().into_iter().next()
}

fn parse_error(loc: SourceLocation, message: impl Into<String>) -> SpriteError {
    SpriteError::Parse {
        line: loc.line as usize + 1,
        message: message.into(),
    }
}

fn parse_rule_list(parser: &mut Parser<'_, '_>, out: &mut Vec<StyleBlock>) -> Result<()> {
    loop {
        let state = parser.state();
        let loc = parser.current_source_location();
        let before = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };
        match token {
            Token::WhiteSpace(_) | Token::CDO | Token::CDC => {}
            Token::Comment(_) => {
                let raw = parser.slice_from(before);
                if raw.len() < 4 || !raw.ends_with("*/") {
                    return Err(parse_error(loc, "unterminated comment"));
                }
            }
            Token::AtKeyword(name) => {
                let name = name.to_ascii_lowercase();
                parse_at_rule(parser, &name, loc, out)?;
            }
            Token::CloseCurlyBracket => return Err(parse_error(loc, "unexpected '}'")),
            _ => {
                parser.reset(&state);
                parse_style_rule(parser, loc, out)?;
            }
        }
    }
}

fn parse_style_rule(
    parser: &mut Parser<'_, '_>,
    loc: SourceLocation,
    out: &mut Vec<StyleBlock>,
) -> Result<()> {
    let mut group = SelectorGroup::default();
    let Some(open) = read_selectors(parser, &mut group)? else {
        return Err(parse_error(loc, "expected '{' after selector"));
    };
    let mut declarations = Vec::new();
    within_block(parser, |block| parse_declaration_list(block, &mut declarations))?;
    ensure_closed(parser, open, loc)?;
    for selector in group.finish() {
        out.push(StyleBlock::new(selector, declarations.clone()));
    }
    Ok(())
}

fn parse_at_rule(
    parser: &mut Parser<'_, '_>,
    name: &str,
    loc: SourceLocation,
    out: &mut Vec<StyleBlock>,
) -> Result<()> {
    loop {
        let before = parser.position();
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => return Err(parse_error(loc, format!("unterminated @{name} rule"))),
        };
        match token {
            Token::Semicolon => return Ok(()),
            Token::CurlyBracketBlock => {
                if matches!(name, "media" | "supports") {
                    within_block(parser, |block| parse_rule_list(block, out))?;
                } else {
                    within_block(parser, |_| Ok(()))?;
                }
                return ensure_closed(parser, before, loc);
            }
            Token::CloseCurlyBracket => return Err(parse_error(loc, "unexpected '}'")),
            _ => {}
        }
    }
}

/// Runs `f` over the contents of the block token just consumed. Tokens `f`
/// leaves behind are skipped.
fn within_block<'i>(
    parser: &mut Parser<'i, '_>,
    f: impl for<'tt> FnOnce(&mut Parser<'i, 'tt>) -> Result<()>,
) -> Result<()> {
    let mut outcome = Ok(());
    let _ = parser.parse_nested_block(|nested| {
        outcome = f(nested);
        Ok::<(), ParseError<'i, ()>>(())
    });
    outcome
}

/// The tokenizer closes blocks at end of input; a block opened at `open` must
/// end with its own `}`.
fn ensure_closed(parser: &Parser<'_, '_>, open: SourcePosition, loc: SourceLocation) -> Result<()> {
    if parser.slice_from(open).trim_end().ends_with('}') {
        Ok(())
    } else {
        Err(parse_error(loc, "unterminated block"))
    }
}

fn parse_declaration_list(parser: &mut Parser<'_, '_>, out: &mut Vec<Declaration>) -> Result<()> {
    loop {
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };
        match token {
            Token::Semicolon => {}
            Token::Ident(name) if parser.try_parse(|p| p.expect_colon()).is_ok() => {
                let value = read_value(parser)?;
                out.push(Declaration::new(name.to_ascii_lowercase(), value));
            }
            // nested rules and stray tokens
            _ => {
                read_value(parser)?;
            }
        }
    }
}

/// Consumes tokens up to and including the next `;` (or a nested block) and
/// returns the raw text before it, trimmed.
fn read_value<'i>(parser: &mut Parser<'i, '_>) -> Result<&'i str> {
    let start = parser.position();
    loop {
        let end = parser.position();
        let loc = parser.current_source_location();
        let token = match parser.next() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(parser.slice_from(start).trim()),
        };
        match token {
            Token::Semicolon | Token::CurlyBracketBlock => {
                return Ok(parser.slice(start..end).trim());
            }
            Token::BadString(_) => return Err(parse_error(loc, "unterminated string")),
            Token::BadUrl(_) => return Err(parse_error(loc, "malformed url")),
            _ => {}
        }
    }
}

/// Selector group under construction: finished selectors, the compounds of the
/// current selector, and the simple selectors of the current compound.
#[derive(Default)]
struct SelectorGroup {
    done: Vec<SelectorNode>,
    compounds: Vec<Vec<SelectorNode>>,
    simples: Vec<SelectorNode>,
}

impl SelectorGroup {
    fn push(&mut self, node: SelectorNode) {
        self.simples.push(node);
    }

    /// Pseudo-classes, attribute selectors and other trailing text stay attached
    /// to the preceding name.
    fn attach(&mut self, raw: &str) {
        if let Some(last) = self.simples.last_mut() {
            match last {
                SelectorNode::ClassName(name)
                | SelectorNode::Id(name)
                | SelectorNode::ElementName(name) => {
                    name.push_str(raw);
                    return;
                }
                SelectorNode::Wildcard => {
                    *last = SelectorNode::ElementName(format!("*{raw}"));
                    return;
                }
                _ => {}
            }
        }
        self.simples.push(SelectorNode::ElementName(raw.to_string()));
    }

    fn end_compound(&mut self) {
        if !self.simples.is_empty() {
            self.compounds.push(std::mem::take(&mut self.simples));
        }
    }

    fn end_selector(&mut self) {
        self.end_compound();
        if let Some(selector) = chain(std::mem::take(&mut self.compounds)) {
            self.done.push(selector);
        }
    }

    fn finish(mut self) -> Vec<SelectorNode> {
        self.end_selector();
        self.done
    }
}

fn chain(mut compounds: Vec<Vec<SelectorNode>>) -> Option<SelectorNode> {
    let mut simples = compounds.pop()?;
    if compounds.is_empty() {
        return if simples.len() == 1 {
            simples.pop()
        } else {
            Some(SelectorNode::Composite(simples))
        };
    }
    let mut parts = Vec::with_capacity(simples.len() + 1);
    if let Some(ancestor) = chain(compounds) {
        parts.push(SelectorNode::Descendant(Box::new(ancestor)));
    }
    parts.extend(simples);
    Some(SelectorNode::Composite(parts))
}

/// Reads a selector group up to its `{`. Returns the position of the `{`, or
/// `None` when the input ends first. Combinators other than whitespace are read
/// as descendant combinators.
fn read_selectors(
    parser: &mut Parser<'_, '_>,
    group: &mut SelectorGroup,
) -> Result<Option<SourcePosition>> {
    loop {
        let before = parser.position();
        let loc = parser.current_source_location();
        let token = match parser.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(None),
        };
        match token {
            Token::CurlyBracketBlock => return Ok(Some(before)),
            Token::WhiteSpace(_) | Token::Delim('>') | Token::Delim('+') | Token::Delim('~') => {
                group.end_compound()
            }
            Token::Comma => group.end_selector(),
            Token::Delim('.') => {
                let name_start = parser.position();
                if !matches!(parser.next_including_whitespace(), Ok(Token::Ident(_))) {
                    return Err(parse_error(loc, "expected class name after '.'"));
                }
                let name = parser.slice_from(name_start);
                group.push(SelectorNode::ClassName(name.to_string()));
            }
            Token::IDHash(_) | Token::Hash(_) => {
                let raw = parser.slice_from(before);
                group.push(SelectorNode::Id(raw.trim_start_matches('#').to_string()));
            }
            Token::Delim('*') if group.simples.is_empty() => group.push(SelectorNode::Wildcard),
            Token::Ident(_) if group.simples.is_empty() => {
                let raw = parser.slice_from(before);
                group.push(SelectorNode::ElementName(raw.to_string()));
            }
            Token::Function(_) | Token::SquareBracketBlock | Token::ParenthesisBlock => {
                within_block(parser, |_| Ok(()))?;
                group.attach(parser.slice_from(before));
            }
            Token::CloseCurlyBracket => return Err(parse_error(loc, "unexpected '}'")),
            Token::BadString(_) => return Err(parse_error(loc, "unterminated string")),
            Token::BadUrl(_) => return Err(parse_error(loc, "malformed url")),
            _ => group.attach(parser.slice_from(before)),
        }
    }
}
