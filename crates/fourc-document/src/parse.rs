//! # Parser
//!
//! A line-oriented parser for the block-structured YAML subset used by 4C
//! input files. It records everything the emitter needs to reproduce the
//! text: comment and blank lines are collected as pending trivia and
//! attached to the next entry, and every value keeps its source token.
//!
//! A `- ` indicator followed by a mapping key or another `- ` on the same
//! line starts a compact collection. The parser handles it by re-reading the
//! current line from the column after the indicator (`offset`), so compact
//! and regular collections share one code path.

use std::borrow::Cow;

use tracing::debug;

use crate::document::Document;
use crate::error::SyntaxError;
use crate::node::{
    CollectionStyle, Decor, DocumentNode, Key, MapEntry, MappingNode, ScalarNode, ScalarRepr,
    SeqItem, SequenceNode,
};
use crate::scalar::{decode_quoted, quoted_len, resolve_plain, Scalar};

type Result<T> = std::result::Result<T, SyntaxError>;

/// Deepest collection nesting accepted, block and flow levels combined.
pub const MAX_DEPTH: usize = 128;

/// Parse document text.
///
/// # Errors
///
/// [`SyntaxError`] for malformed text, or for well-formed YAML that uses a
/// feature the document model cannot reproduce (anchors, aliases, tags,
/// complex keys, multiple documents, multi-line plain or quoted scalars,
/// mixed LF and CRLF line endings, nesting deeper than [`MAX_DEPTH`]).
pub fn parse(text: &str) -> Result<Document> {
    let crlf = line_endings(text)?;
    let normalized: Cow<'_, str> = if crlf {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    };
    let final_newline = normalized.is_empty() || normalized.ends_with('\n');
    let lines: Vec<&str> = if normalized.is_empty() {
        Vec::new()
    } else {
        normalized
            .strip_suffix('\n')
            .unwrap_or(&normalized)
            .split('\n')
            .collect()
    };

    let line_count = lines.len();
    let mut parser = Parser {
        lines,
        pos: 0,
        offset: None,
        trivia: Vec::new(),
        depth: 0,
    };
    let mut document = parser.document()?;
    document.crlf = crlf;
    document.final_newline = final_newline;
    debug!(lines = line_count, crlf, "parsed document");
    Ok(document)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Root,
    MapValue,
    SeqItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomp {
    Clip,
    Strip,
    Keep,
}

/// A value parsed after `key:` or `-`, with the text around it.
struct Parsed {
    node: DocumentNode,
    value_ws: String,
    suffix: String,
    compact: bool,
}

impl Parsed {
    fn inline(node: DocumentNode, value_ws: &str, suffix: &str) -> Self {
        Self {
            node,
            value_ws: value_ws.to_string(),
            suffix: suffix.to_string(),
            compact: false,
        }
    }
}

struct KeySplit<'a> {
    key: &'a str,
    key_ws: &'a str,
    rest: &'a str,
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    /// Column from which the current line is read after a `- ` indicator.
    offset: Option<usize>,
    trivia: Vec<String>,
    /// Open collections around the current position.
    depth: usize,
}

impl<'a> Parser<'a> {
    fn line_no(&self) -> usize {
        self.pos + 1
    }

    fn advance(&mut self) {
        self.pos += 1;
        self.offset = None;
    }

    fn skip_trivia(&mut self) {
        if self.offset.is_some() {
            return;
        }
        while let Some(line) = self.lines.get(self.pos) {
            if !is_trivia(line) {
                break;
            }
            self.trivia.push(line.to_string());
            self.pos += 1;
        }
    }

    /// Indentation and content of the current line.
    fn current(&self) -> Result<Option<(usize, &'a str)>> {
        let Some(line) = self.lines.get(self.pos).copied() else {
            return Ok(None);
        };
        if let Some(col) = self.offset {
            return Ok(Some((col, &line[col..])));
        }
        let indent = indentation(line);
        let content = &line[indent..];
        if content.starts_with('\t') && !is_trivia(line) {
            return Err(SyntaxError::malformed(
                self.line_no(),
                "tab character in indentation",
            ));
        }
        Ok(Some((indent, content)))
    }

    fn document(&mut self) -> Result<Document> {
        let leading = self.directives()?;
        self.skip_trivia();

        let mut root_decor = Decor::default();
        let root = match self.current()? {
            None => DocumentNode::Mapping(MappingNode::with_style(
                Vec::new(),
                CollectionStyle::Block { indent: Some(0) },
            )),
            Some((indent, content)) if is_seq_entry(content) => {
                DocumentNode::Sequence(self.block_sequence(indent)?)
            }
            Some((indent, content)) if split_key(content, self.line_no())?.is_some() => {
                DocumentNode::Mapping(self.block_mapping(indent)?)
            }
            Some((indent, content)) => {
                let line = self.lines[self.pos];
                root_decor.prefix = std::mem::take(&mut self.trivia);
                let parsed = self.inline_value(indent, &line[..indent], content, Context::Root)?;
                root_decor.value_ws = parsed.value_ws;
                root_decor.suffix = parsed.suffix;
                parsed.node
            }
        };

        let trailing = self.trailer()?;
        Ok(Document {
            root,
            root_decor,
            leading,
            trailing,
            crlf: false,
            final_newline: true,
        })
    }

    /// Directives and the `---` line, if the document has one.
    fn directives(&mut self) -> Result<Vec<String>> {
        let mut saw_directive = false;
        for (i, line) in self.lines.iter().enumerate() {
            if line.starts_with('%') {
                saw_directive = true;
                continue;
            }
            if is_trivia(line) {
                continue;
            }
            if is_marker(line, "---") {
                let rest = line[3..].trim_start_matches([' ', '\t']);
                if !rest.is_empty() && !rest.starts_with('#') {
                    return Err(SyntaxError::unsupported(
                        i + 1,
                        "content on the document start line",
                    ));
                }
                self.pos = i + 1;
                return Ok(self.lines[..=i].iter().map(|l| l.to_string()).collect());
            }
            if saw_directive {
                return Err(SyntaxError::malformed(
                    i + 1,
                    "directives must be followed by '---'",
                ));
            }
            break;
        }
        Ok(Vec::new())
    }

    /// Everything after the root: trivia and at most a `...` end marker.
    fn trailer(&mut self) -> Result<Vec<String>> {
        self.skip_trivia();
        let mut ended = false;
        while let Some((indent, content)) = self.current()? {
            let line_no = self.line_no();
            if indent == 0 && is_marker(content, "...") {
                ended = true;
            } else if ended || (indent == 0 && is_marker(content, "---")) {
                return Err(SyntaxError::unsupported(line_no, "multiple documents"));
            } else {
                return Err(SyntaxError::malformed(
                    line_no,
                    "unexpected content after the document root",
                ));
            }
            self.trivia.push(self.lines[self.pos].to_string());
            self.advance();
            self.skip_trivia();
        }
        Ok(std::mem::take(&mut self.trivia))
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(too_deep(self.line_no()));
        }
        Ok(())
    }

    fn block_mapping(&mut self, indent: usize) -> Result<MappingNode> {
        self.enter()?;
        let mut entries = Vec::new();
        loop {
            self.skip_trivia();
            let Some((ind, content)) = self.current()? else {
                break;
            };
            if ind < indent || (ind == 0 && is_document_marker(content)) {
                break;
            }
            let line_no = self.line_no();
            if ind > indent {
                return Err(SyntaxError::malformed(line_no, "unexpected indentation"));
            }
            if is_seq_entry(content) {
                return Err(SyntaxError::malformed(
                    line_no,
                    "expected a mapping key, found a sequence entry",
                ));
            }
            let Some(split) = split_key(content, line_no)? else {
                return Err(SyntaxError::malformed(line_no, "expected a mapping key"));
            };

            let prefix = std::mem::take(&mut self.trivia);
            let name = decode_key(split.key, line_no)?;
            let parsed = self.after_indicator(indent, split.rest, Context::MapValue)?;
            entries.push(MapEntry {
                key: Key {
                    name,
                    repr: Some(split.key.to_string()),
                },
                value: parsed.node,
                decor: Decor {
                    prefix,
                    key_ws: split.key_ws.to_string(),
                    value_ws: parsed.value_ws,
                    suffix: parsed.suffix,
                },
            });
        }
        self.depth -= 1;
        Ok(MappingNode::with_style(
            entries,
            CollectionStyle::Block {
                indent: Some(indent),
            },
        ))
    }

    fn block_sequence(&mut self, indent: usize) -> Result<SequenceNode> {
        self.enter()?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            let Some((ind, content)) = self.current()? else {
                break;
            };
            if ind > indent {
                return Err(SyntaxError::malformed(
                    self.line_no(),
                    "unexpected indentation",
                ));
            }
            if ind < indent || !is_seq_entry(content) {
                break;
            }

            let prefix = std::mem::take(&mut self.trivia);
            let parsed = self.after_indicator(indent, &content[1..], Context::SeqItem)?;
            items.push(SeqItem {
                value: parsed.node,
                decor: Decor {
                    prefix,
                    key_ws: String::new(),
                    value_ws: parsed.value_ws,
                    suffix: parsed.suffix,
                },
                compact: parsed.compact,
            });
        }
        self.depth -= 1;
        Ok(SequenceNode::with_style(
            items,
            CollectionStyle::Block {
                indent: Some(indent),
            },
        ))
    }

    /// Parse what follows `key:` or `-` on the current line, plus any
    /// nested block below it.
    fn after_indicator(
        &mut self,
        parent_indent: usize,
        rest: &'a str,
        ctx: Context,
    ) -> Result<Parsed> {
        let body = rest.trim_start_matches([' ', '\t']);
        let ws = &rest[..rest.len() - body.len()];

        if body.is_empty() || body.starts_with('#') {
            self.advance();
            return self.nested_block(parent_indent, rest, ctx);
        }

        if ctx == Context::SeqItem {
            let line_no = self.line_no();
            let line = self.lines[self.pos];
            let col = line.len() - body.len();
            let node: Option<DocumentNode> = if is_seq_entry(body) {
                self.offset = Some(col);
                Some(self.block_sequence(col)?.into())
            } else if split_key(body, line_no)?.is_some() {
                self.offset = Some(col);
                Some(self.block_mapping(col)?.into())
            } else {
                None
            };
            if let Some(node) = node {
                return Ok(Parsed {
                    node,
                    value_ws: ws.to_string(),
                    suffix: String::new(),
                    compact: true,
                });
            }
        }

        self.inline_value(parent_indent, ws, body, ctx)
    }

    /// The indicator line had no value: either a block collection follows
    /// on more-indented lines, or the value is an empty null.
    fn nested_block(&mut self, parent_indent: usize, rest: &str, ctx: Context) -> Result<Parsed> {
        self.skip_trivia();
        if let Some((ind, content)) = self.current()? {
            let nested = ind > parent_indent;
            let same_level_seq =
                ctx == Context::MapValue && ind == parent_indent && is_seq_entry(content);
            if nested || same_level_seq {
                let line_no = self.line_no();
                let node: DocumentNode = if is_seq_entry(content) {
                    self.block_sequence(ind)?.into()
                } else if split_key(content, line_no)?.is_some() {
                    self.block_mapping(ind)?.into()
                } else {
                    return Err(SyntaxError::unsupported(
                        line_no,
                        "scalar values on the line after their key",
                    ));
                };
                return Ok(Parsed {
                    node,
                    value_ws: String::new(),
                    suffix: rest.to_string(),
                    compact: false,
                });
            }
        }

        let comment = rest.trim_start_matches([' ', '\t']);
        let ws = &rest[..rest.len() - comment.len()];
        let node = ScalarNode::parsed(Scalar::Null, ScalarRepr::Inline(String::new()));
        Ok(Parsed::inline(node.into(), ws, comment))
    }

    /// A value that starts on the current line: scalar, flow collection, or
    /// block scalar header.
    fn inline_value(
        &mut self,
        parent_indent: usize,
        ws: &str,
        body: &'a str,
        ctx: Context,
    ) -> Result<Parsed> {
        let line_no = self.line_no();
        match body.as_bytes().first().copied().unwrap_or(b' ') {
            b'&' => Err(SyntaxError::unsupported(line_no, "anchors")),
            b'*' => Err(SyntaxError::unsupported(line_no, "aliases")),
            b'!' => Err(SyntaxError::unsupported(line_no, "tags")),
            b'@' | b'`' | b'%' => Err(SyntaxError::malformed(
                line_no,
                "reserved indicator at the start of a plain scalar",
            )),
            b',' | b']' | b'}' => Err(SyntaxError::malformed(
                line_no,
                "unexpected flow indicator",
            )),
            b'|' | b'>' if ctx == Context::Root => Err(SyntaxError::unsupported(
                line_no,
                "block scalars at the document root",
            )),
            b'|' | b'>' => self.block_scalar(parent_indent, ws, body),
            b'[' | b'{' => self.flow_value(parent_indent, ws, body, ctx),
            b'"' | b'\'' => {
                let Some(len) = quoted_len(body) else {
                    return Err(SyntaxError::unsupported(line_no, "multi-line quoted scalars"));
                };
                let (token, after) = body.split_at(len);
                let tail = after.trim_start_matches([' ', '\t']);
                if !tail.is_empty() && !tail.starts_with('#') {
                    return Err(SyntaxError::malformed(
                        line_no,
                        "unexpected text after quoted scalar",
                    ));
                }
                let value = decode_quoted(token).map_err(|m| SyntaxError::malformed(line_no, m))?;
                self.advance();
                self.reject_continuation(parent_indent, ctx, "multi-line scalars")?;
                let node = ScalarNode::parsed(
                    Scalar::String(value),
                    ScalarRepr::Inline(token.to_string()),
                );
                Ok(Parsed::inline(node.into(), ws, after))
            }
            _ => {
                let (token, suffix) = split_plain(body);
                if token == "?" || token.starts_with("? ") {
                    return Err(SyntaxError::unsupported(line_no, "complex mapping keys"));
                }
                if ctx != Context::SeqItem && is_seq_entry(token) {
                    return Err(SyntaxError::malformed(
                        line_no,
                        "sequence entries are not allowed here",
                    ));
                }
                if token.contains(": ") || token.contains(":\t") || token.ends_with(':') {
                    return Err(SyntaxError::malformed(
                        line_no,
                        "mapping values are not allowed here",
                    ));
                }
                self.advance();
                self.reject_continuation(parent_indent, ctx, "multi-line plain scalars")?;
                let node =
                    ScalarNode::parsed(resolve_plain(token), ScalarRepr::Inline(token.to_string()));
                Ok(Parsed::inline(node.into(), ws, suffix))
            }
        }
    }

    /// A more-indented line after a single-line value means the value
    /// continues, which the model cannot represent.
    fn reject_continuation(&self, parent_indent: usize, ctx: Context, feature: &str) -> Result<()> {
        if ctx == Context::Root {
            return Ok(());
        }
        let next = self
            .lines
            .iter()
            .enumerate()
            .skip(self.pos)
            .find(|(_, line)| !is_trivia(line));
        match next {
            Some((i, line)) if indentation(line) > parent_indent => {
                Err(SyntaxError::unsupported(i + 1, feature))
            }
            _ => Ok(()),
        }
    }

    fn flow_value(
        &mut self,
        parent_indent: usize,
        ws: &str,
        body: &'a str,
        ctx: Context,
    ) -> Result<Parsed> {
        let start_line = self.pos;
        let line: &'a str = self.lines[start_line];
        let start_col = line.len() - body.len();
        let (end_line, end_col) = find_flow_end(&self.lines, start_line, start_col)?;

        let raw = if end_line == start_line {
            line[start_col..end_col].to_string()
        } else {
            let mut raw = line[start_col..].to_string();
            for middle in &self.lines[start_line + 1..end_line] {
                raw.push('\n');
                raw.push_str(middle);
            }
            raw.push('\n');
            raw.push_str(&self.lines[end_line][..end_col]);
            raw
        };

        let end_text: &'a str = self.lines[end_line];
        let after = &end_text[end_col..];
        let tail = after.trim_start_matches([' ', '\t']);
        if !tail.is_empty() && !tail.starts_with('#') {
            return Err(SyntaxError::malformed(
                end_line + 1,
                "unexpected text after flow collection",
            ));
        }

        let node = FlowParser::new(&raw, start_line + 1, self.depth).parse()?;
        self.pos = end_line;
        self.advance();
        self.reject_continuation(parent_indent, ctx, "multi-line scalars")?;
        Ok(Parsed::inline(node, ws, after))
    }

    fn block_scalar(&mut self, parent_indent: usize, ws: &str, header: &'a str) -> Result<Parsed> {
        let line_no = self.line_no();
        let literal = header.starts_with('|');

        let mut chomp = Chomp::Clip;
        let mut explicit: Option<usize> = None;
        let mut rest = &header[1..];
        for _ in 0..2 {
            match rest.as_bytes().first().copied() {
                Some(b'-') if chomp == Chomp::Clip => chomp = Chomp::Strip,
                Some(b'+') if chomp == Chomp::Clip => chomp = Chomp::Keep,
                Some(d @ b'1'..=b'9') if explicit.is_none() => {
                    explicit = Some(usize::from(d - b'0'));
                }
                _ => break,
            }
            rest = &rest[1..];
        }
        let tail = rest.trim_start_matches([' ', '\t']);
        let comment_ok = tail.starts_with('#') && tail.len() < rest.len();
        if !tail.is_empty() && !comment_ok {
            return Err(SyntaxError::malformed(line_no, "invalid block scalar header"));
        }
        self.advance();

        let start = self.pos;
        let mut content_indent = explicit.map(|d| parent_indent + d);
        let mut end_of_content = start;
        let mut i = start;
        while let Some(line) = self.lines.get(i) {
            let spaces = indentation(line);
            if line[spaces..].is_empty() {
                i += 1;
                continue;
            }
            match content_indent {
                None if spaces > parent_indent => content_indent = Some(spaces),
                None => break,
                Some(ci) if spaces < ci => break,
                Some(_) => {}
            }
            i += 1;
            end_of_content = i;
        }
        let end = if chomp == Chomp::Keep { i } else { end_of_content };

        let lines = &self.lines[start..end];
        let value = block_scalar_value(
            lines,
            content_indent.unwrap_or(parent_indent + 1),
            literal,
            chomp,
        );
        let body = lines.iter().map(|l| l.to_string()).collect();
        self.pos = end;

        let node = ScalarNode::parsed(
            Scalar::String(value),
            ScalarRepr::Block {
                header: header.to_string(),
                body,
            },
        );
        Ok(Parsed::inline(node.into(), ws, ""))
    }
}

/// Recursive-descent parser for one flow collection's text.
struct FlowParser<'s> {
    src: &'s str,
    pos: usize,
    first_line: usize,
    depth: usize,
}

impl<'s> FlowParser<'s> {
    fn new(src: &'s str, first_line: usize, depth: usize) -> Self {
        Self {
            src,
            pos: 0,
            first_line,
            depth,
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(too_deep(self.line()));
        }
        Ok(())
    }

    fn parse(mut self) -> Result<DocumentNode> {
        let mut node = self.value()?;
        self.skip_space();
        if self.pos < self.src.len() {
            return Err(self.malformed("unexpected text after flow collection"));
        }
        let repr = Some(self.src.to_string());
        match &mut node {
            DocumentNode::Mapping(m) => m.style = CollectionStyle::Flow { repr },
            DocumentNode::Sequence(s) => s.style = CollectionStyle::Flow { repr },
            DocumentNode::Scalar(_) => {}
        }
        Ok(node)
    }

    fn line(&self) -> usize {
        self.first_line + self.src[..self.pos].matches('\n').count()
    }

    fn malformed(&self, message: &str) -> SyntaxError {
        SyntaxError::malformed(self.line(), message)
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_space(&mut self) {
        let bytes = self.src.as_bytes();
        while let Some(&b) = bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\n' => self.pos += 1,
                b'#' if self.pos == 0 || matches!(bytes[self.pos - 1], b' ' | b'\t' | b'\n') => {
                    while self.pos < bytes.len() && bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn value(&mut self) -> Result<DocumentNode> {
        self.skip_space();
        match self.peek() {
            Some(b'[') => self.sequence(),
            Some(b'{') => self.mapping(),
            Some(b'&') => Err(SyntaxError::unsupported(self.line(), "anchors")),
            Some(b'*') => Err(SyntaxError::unsupported(self.line(), "aliases")),
            Some(b'!') => Err(SyntaxError::unsupported(self.line(), "tags")),
            Some(b'"' | b'\'') => {
                let (token, value) = self.quoted()?;
                Ok(ScalarNode::parsed(Scalar::String(value), ScalarRepr::Inline(token)).into())
            }
            Some(_) => {
                let token = self.plain();
                if token.is_empty() {
                    return Err(self.malformed("expected a value"));
                }
                Ok(
                    ScalarNode::parsed(resolve_plain(token), ScalarRepr::Inline(token.to_string()))
                        .into(),
                )
            }
            None => Err(self.malformed("unterminated flow collection")),
        }
    }

    fn sequence(&mut self) -> Result<DocumentNode> {
        self.enter()?;
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_space();
            if self.peek() == Some(b']') {
                self.pos += 1;
                break;
            }
            let value = self.value()?;
            items.push(SeqItem {
                value,
                decor: Decor::default(),
                compact: false,
            });
            self.skip_space();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(b':') => {
                    return Err(SyntaxError::unsupported(
                        self.line(),
                        "single-pair mappings in flow sequences",
                    ))
                }
                _ => return Err(self.malformed("expected ',' or ']' in flow sequence")),
            }
        }
        self.depth -= 1;
        Ok(SequenceNode::with_style(items, CollectionStyle::Flow { repr: None }).into())
    }

    fn mapping(&mut self) -> Result<DocumentNode> {
        self.enter()?;
        self.pos += 1;
        let mut entries = Vec::new();
        loop {
            self.skip_space();
            if self.peek() == Some(b'}') {
                self.pos += 1;
                break;
            }
            let key = self.key()?;
            self.skip_space();
            let value = match self.peek() {
                Some(b':') => {
                    self.pos += 1;
                    self.skip_space();
                    if matches!(self.peek(), Some(b',' | b'}')) {
                        DocumentNode::null()
                    } else {
                        self.value()?
                    }
                }
                Some(b',' | b'}') => DocumentNode::null(),
                _ => return Err(self.malformed("expected ':' in flow mapping")),
            };
            entries.push(MapEntry {
                key,
                value,
                decor: Decor::default(),
            });
            self.skip_space();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.malformed("expected ',' or '}' in flow mapping")),
            }
        }
        self.depth -= 1;
        Ok(MappingNode::with_style(entries, CollectionStyle::Flow { repr: None }).into())
    }

    fn key(&mut self) -> Result<Key> {
        match self.peek() {
            Some(b'"' | b'\'') => {
                let (token, name) = self.quoted()?;
                Ok(Key {
                    name,
                    repr: Some(token),
                })
            }
            Some(b'[' | b'{' | b'?') => {
                Err(SyntaxError::unsupported(self.line(), "complex mapping keys"))
            }
            Some(b'&' | b'*' | b'!') => Err(SyntaxError::unsupported(
                self.line(),
                "anchors, aliases, and tags",
            )),
            _ => {
                let token = self.plain();
                if token.is_empty() {
                    return Err(self.malformed("empty mapping key"));
                }
                Ok(Key {
                    name: token.to_string(),
                    repr: Some(token.to_string()),
                })
            }
        }
    }

    fn quoted(&mut self) -> Result<(String, String)> {
        let src = self.src;
        let rest = &src[self.pos..];
        let len = quoted_len(rest).ok_or_else(|| self.malformed("unterminated quoted scalar"))?;
        let token = &rest[..len];
        let value = decode_quoted(token).map_err(|m| self.malformed(&m))?;
        self.pos += len;
        Ok((token.to_string(), value))
    }

    /// A plain scalar ends at a flow indicator, a `: ` separator, a comment,
    /// or the end of the line.
    fn plain(&mut self) -> &'s str {
        let src = self.src;
        let bytes = src.as_bytes();
        let start = self.pos;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b',' | b'[' | b']' | b'{' | b'}' | b'\n' => break,
                b':' if matches!(
                    bytes.get(i + 1),
                    None | Some(b' ' | b'\t' | b'\n' | b',' | b']' | b'}')
                ) =>
                {
                    break
                }
                b'#' if i > start && matches!(bytes[i - 1], b' ' | b'\t') => break,
                _ => i += 1,
            }
        }
        self.pos = i;
        src[start..i].trim_end_matches([' ', '\t'])
    }
}

fn too_deep(line: usize) -> SyntaxError {
    SyntaxError::unsupported(line, format!("nesting deeper than {MAX_DEPTH} levels"))
}

/// True if the text uses CRLF line endings. Every line break must use the
/// same ending, since only one style is recorded.
fn line_endings(text: &str) -> Result<bool> {
    let mut crlf = None;
    for (i, line) in text.split_inclusive('\n').enumerate() {
        if !line.ends_with('\n') {
            break;
        }
        let this = line.ends_with("\r\n");
        match crlf {
            None => crlf = Some(this),
            Some(first) if first != this => {
                return Err(SyntaxError::unsupported(i + 1, "mixed line endings"))
            }
            Some(_) => {}
        }
    }
    Ok(crlf.unwrap_or(false))
}

/// Position just past the bracket closing the flow collection that opens at
/// `(start_line, start_col)`.
fn find_flow_end(lines: &[&str], start_line: usize, start_col: usize) -> Result<(usize, usize)> {
    let mut depth = 0usize;
    for (line_idx, line) in lines.iter().enumerate().skip(start_line) {
        let bytes = line.as_bytes();
        let mut i = if line_idx == start_line { start_col } else { 0 };
        while i < bytes.len() {
            let prev = if i == 0 { b' ' } else { bytes[i - 1] };
            match bytes[i] {
                b'"' | b'\'' if matches!(prev, b' ' | b'\t' | b'[' | b'{' | b',' | b':') => {
                    match quoted_len(&line[i..]) {
                        Some(len) => {
                            i += len;
                            continue;
                        }
                        None => {
                            return Err(SyntaxError::unsupported(
                                line_idx + 1,
                                "multi-line quoted scalars",
                            ))
                        }
                    }
                }
                b'#' if matches!(prev, b' ' | b'\t') => break,
                b'[' | b'{' => depth += 1,
                b']' | b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok((line_idx, i + 1));
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }
    Err(SyntaxError::malformed(
        start_line + 1,
        "unterminated flow collection",
    ))
}

fn block_scalar_value(lines: &[&str], indent: usize, literal: bool, chomp: Chomp) -> String {
    let texts: Vec<&str> = lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or(""))
        .collect();
    let last = texts.iter().rposition(|t| !t.is_empty());
    let (content, trailing_blank) = match last {
        Some(k) => (&texts[..=k], texts.len() - k - 1),
        None => (&texts[..0], texts.len()),
    };

    let mut out = if literal {
        content.join("\n")
    } else {
        fold(content)
    };
    if chomp != Chomp::Strip && !content.is_empty() {
        out.push('\n');
    }
    if chomp == Chomp::Keep {
        out.push_str(&"\n".repeat(trailing_blank));
    }
    out
}

/// Folded-style line joining: single breaks between normal lines become
/// spaces, runs of empty lines become newlines, and breaks around
/// more-indented lines are kept.
fn fold(lines: &[&str]) -> String {
    let mut out = String::new();
    let mut breaks = 0usize;
    let mut prev_more: Option<bool> = None;
    for line in lines {
        if line.is_empty() {
            breaks += 1;
            continue;
        }
        let more = line.starts_with([' ', '\t']);
        match prev_more {
            None => out.push_str(&"\n".repeat(breaks)),
            Some(false) if !more && breaks == 0 => out.push(' '),
            Some(false) if !more => out.push_str(&"\n".repeat(breaks)),
            Some(_) => out.push_str(&"\n".repeat(breaks + 1)),
        }
        out.push_str(line);
        breaks = 0;
        prev_more = Some(more);
    }
    out
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_trivia(line: &str) -> bool {
    let t = line.trim_start_matches([' ', '\t']);
    t.is_empty() || t.starts_with('#')
}

fn is_seq_entry(content: &str) -> bool {
    content == "-" || content.starts_with("- ") || content.starts_with("-\t")
}

fn is_marker(content: &str, marker: &str) -> bool {
    content
        .strip_prefix(marker)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
}

fn is_document_marker(content: &str) -> bool {
    is_marker(content, "---") || is_marker(content, "...")
}

/// Split `key: rest` at the mapping-value indicator. `Ok(None)` means the
/// content is not a mapping entry.
fn split_key(content: &str, line_no: usize) -> Result<Option<KeySplit<'_>>> {
    let Some(first) = content.chars().next() else {
        return Ok(None);
    };
    match first {
        '[' | '{' | '|' | '>' | '#' => return Ok(None),
        '"' | '\'' => {
            let Some(len) = quoted_len(content) else {
                return Ok(None);
            };
            let after = &content[len..];
            let trimmed = after.trim_start_matches([' ', '\t']);
            let split = trimmed
                .strip_prefix(':')
                .filter(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
                .map(|rest| KeySplit {
                    key: &content[..len],
                    key_ws: &after[..after.len() - trimmed.len()],
                    rest,
                });
            return Ok(split);
        }
        '?' if content.len() == 1 || content[1..].starts_with([' ', '\t']) => {
            return Err(SyntaxError::unsupported(line_no, "complex mapping keys"));
        }
        _ => {}
    }

    let bytes = content.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'#' if i > 0 && matches!(bytes[i - 1], b' ' | b'\t') => return Ok(None),
            b':' if matches!(bytes.get(i + 1), None | Some(b' ' | b'\t')) => {
                let raw = &content[..i];
                let key = raw.trim_end_matches([' ', '\t']);
                if key.is_empty() {
                    return Err(SyntaxError::malformed(line_no, "empty mapping key"));
                }
                if key.starts_with(['&', '*', '!']) {
                    return Err(SyntaxError::unsupported(
                        line_no,
                        "anchors, aliases, and tags",
                    ));
                }
                return Ok(Some(KeySplit {
                    key,
                    key_ws: &raw[key.len()..],
                    rest: &content[i + 1..],
                }));
            }
            _ => {}
        }
    }
    Ok(None)
}

fn decode_key(raw: &str, line_no: usize) -> Result<String> {
    if raw.starts_with(['"', '\'']) {
        decode_quoted(raw).map_err(|m| SyntaxError::malformed(line_no, m))
    } else {
        Ok(raw.to_string())
    }
}

/// Split a plain value from the whitespace and comment after it.
fn split_plain(body: &str) -> (&str, &str) {
    let bytes = body.as_bytes();
    let end = (1..bytes.len())
        .find(|&i| bytes[i] == b'#' && matches!(bytes[i - 1], b' ' | b'\t'))
        .unwrap_or(bytes.len());
    let token = body[..end].trim_end_matches([' ', '\t']);
    (token, &body[token.len()..])
}
