//! XML reading and writing for document fragments.
//!
//! The reader keeps local element names as tags and remembers namespace
//! prefixes for writing back. Attribute names are kept exactly as written
//! (`xmlns:edmx`, `store:Type`). Whitespace-only text is dropped.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use smol_str::SmolStr;

use super::InterchangeError;
use crate::base::{Position, Span};
use crate::syntax::Fragment;

/// Turns byte offsets into positions, reading forward.
struct PositionTracker<'a> {
    text: &'a [u8],
    offset: usize,
    position: Position,
}

impl<'a> PositionTracker<'a> {
    fn new(text: &'a [u8]) -> Self {
        Self {
            text,
            offset: 0,
            position: Position::default(),
        }
    }

    fn at(&mut self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        if offset < self.offset {
            self.offset = 0;
            self.position = Position::default();
        }
        self.position = self.position.advance(&self.text[self.offset..offset]);
        self.offset = offset;
        self.position
    }

    fn span(&mut self, start: usize, end: usize) -> Span {
        let start = self.at(start);
        Span::new(start, self.at(end))
    }
}

/// Parse a document into its root fragment.
pub fn read_fragment(input: &[u8]) -> Result<Fragment, InterchangeError> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut tracker = PositionTracker::new(input);
    let mut stack: Vec<Fragment> = Vec::new();
    let mut root: Option<Fragment> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let end = reader.buffer_position() as usize;
                let span = tracker.span(end.saturating_sub(e.len() + 2), end);
                stack.push(start_fragment(e, span)?);
            }
            Ok(Event::Empty(ref e)) => {
                let end = reader.buffer_position() as usize;
                let span = tracker.span(end.saturating_sub(e.len() + 3), end);
                close(&mut stack, &mut root, start_fragment(e, span)?)?;
            }
            Ok(Event::End(_)) => {
                let fragment = stack
                    .pop()
                    .ok_or_else(|| InterchangeError::xml("unbalanced end tag"))?;
                close(&mut stack, &mut root, fragment)?;
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| InterchangeError::xml(format!("Text error: {e}")))?;
                append_text(&mut stack, &text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append_text(&mut stack, &text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(InterchangeError::xml(format!(
                    "XML parse error at byte {}: {e}",
                    reader.error_position()
                )));
            }
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(InterchangeError::xml(format!(
            "document ended inside <{}>",
            open.qualified_tag()
        )));
    }
    root.ok_or_else(|| InterchangeError::missing_element("document root"))
}

fn start_fragment(e: &BytesStart<'_>, span: Span) -> Result<Fragment, InterchangeError> {
    let name = e.name();
    let local = name.local_name();
    let tag = std::str::from_utf8(local.as_ref())
        .map_err(|e| InterchangeError::xml(format!("Element name error: {e}")))?;
    let prefix = name
        .prefix()
        .map(|p| std::str::from_utf8(p.as_ref()).map(SmolStr::new))
        .transpose()
        .map_err(|e| InterchangeError::xml(format!("Element prefix error: {e}")))?;

    let mut fragment = Fragment::new(tag).with_span(span);
    fragment.prefix = prefix;
    for attr_result in e.attributes() {
        let attr =
            attr_result.map_err(|e| InterchangeError::xml(format!("Attribute error: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| InterchangeError::xml(format!("Attribute key error: {e}")))?;
        let value = attr
            .unescape_value()
            .map_err(|e| InterchangeError::xml(format!("Attribute value error: {e}")))?;
        fragment
            .attributes
            .insert(SmolStr::new(key), value.into_owned());
    }
    Ok(fragment)
}

fn close(
    stack: &mut [Fragment],
    root: &mut Option<Fragment>,
    fragment: Fragment,
) -> Result<(), InterchangeError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(fragment),
        None if root.is_none() => *root = Some(fragment),
        None => {
            return Err(InterchangeError::invalid_document(
                "more than one root element",
            ));
        }
    }
    Ok(())
}

fn append_text(stack: &mut [Fragment], text: &str) {
    if let Some(current) = stack.last_mut() {
        current.text.get_or_insert_with(String::new).push_str(text);
    }
}

/// Serialize a fragment tree as an indented XML document.
pub fn write_fragment(root: &Fragment) -> Result<Vec<u8>, InterchangeError> {
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|e| InterchangeError::xml(format!("Write error: {e}")))?;
    write_element(&mut writer, root)?;

    let mut output = buffer.into_inner();
    output.push(b'\n');
    Ok(output)
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    fragment: &Fragment,
) -> Result<(), InterchangeError> {
    let name = fragment.qualified_tag();
    let mut start = BytesStart::new(name.as_str());
    for (key, value) in &fragment.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if fragment.children.is_empty() && fragment.text.is_none() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| InterchangeError::xml(format!("Write error: {e}")))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| InterchangeError::xml(format!("Write error: {e}")))?;
    if let Some(text) = &fragment.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| InterchangeError::xml(format!("Write error: {e}")))?;
    }
    for child in &fragment.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(|e| InterchangeError::xml(format!("Write error: {e}")))?;
    Ok(())
}
