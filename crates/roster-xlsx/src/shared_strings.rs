//! The shared string table (`xl/sharedStrings.xml`).

use std::collections::HashMap;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::Result;
use crate::sheet_xml::{local_name, needs_space_preserve};

/// One `<si>` item, flattened to its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedString {
    pub text: String,
    /// True when the item carries formatting runs (`<r>`).
    pub rich: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStrings {
    items: Vec<SharedString>,
}

impl SharedStrings {
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);
        let mut buf = Vec::new();

        let mut items = Vec::new();
        let mut current: Option<SharedString> = None;
        let mut in_text = false;
        // Phonetic runs are not part of the displayed value.
        let mut phonetic_depth = 0usize;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match local_name(e.name().as_ref()) {
                    b"si" => {
                        current = Some(SharedString {
                            text: String::new(),
                            rich: false,
                        });
                    }
                    b"r" if phonetic_depth == 0 => {
                        if let Some(item) = current.as_mut() {
                            item.rich = true;
                        }
                    }
                    b"rPh" => phonetic_depth += 1,
                    b"t" => in_text = phonetic_depth == 0,
                    _ => {}
                },
                Event::Empty(e) if local_name(e.name().as_ref()) == b"si" => {
                    items.push(SharedString {
                        text: String::new(),
                        rich: false,
                    });
                }
                Event::Text(e) if in_text => {
                    if let Some(item) = current.as_mut() {
                        item.text.push_str(&e.unescape()?);
                    }
                }
                Event::CData(e) if in_text => {
                    if let Some(item) = current.as_mut() {
                        item.text.push_str(&String::from_utf8(e.into_inner().into_owned())?);
                    }
                }
                Event::End(e) => match local_name(e.name().as_ref()) {
                    b"si" => {
                        if let Some(item) = current.take() {
                            items.push(item);
                        }
                    }
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SharedString> {
        self.items.get(index)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(|item| item.text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &SharedString> {
        self.items.iter()
    }
}

/// Hands out shared string indices for rewritten cells.
///
/// Existing plain items are reused; new text is appended after the last
/// existing item so every index already in use keeps its meaning.
#[derive(Debug)]
pub(crate) struct SharedStringAppender {
    plain_index: HashMap<String, u32>,
    next_index: u32,
    appended: Vec<String>,
}

impl SharedStringAppender {
    pub(crate) fn new(existing: &SharedStrings) -> Self {
        let mut plain_index = HashMap::new();
        for (idx, item) in existing.iter().enumerate() {
            if !item.rich {
                plain_index.entry(item.text.clone()).or_insert(idx as u32);
            }
        }
        Self {
            plain_index,
            next_index: existing.len() as u32,
            appended: Vec::new(),
        }
    }

    pub(crate) fn index_for(&mut self, text: &str) -> u32 {
        if let Some(&idx) = self.plain_index.get(text) {
            return idx;
        }
        let idx = self.next_index;
        self.next_index += 1;
        self.plain_index.insert(text.to_string(), idx);
        self.appended.push(text.to_string());
        idx
    }

    pub(crate) fn is_dirty(&self) -> bool {
        !self.appended.is_empty()
    }

    pub(crate) fn appended_count(&self) -> usize {
        self.appended.len()
    }

    /// Rewrites the original part with the new items appended and the
    /// `uniqueCount`/`count` attributes updated. Existing items are copied as-is.
    pub(crate) fn apply(&self, original: &[u8]) -> Result<Vec<u8>> {
        let mut reader = Reader::from_reader(original);
        reader.config_mut().trim_text(false);
        let mut writer = Writer::new(Vec::with_capacity(original.len() + self.appended.len() * 32));
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) if local_name(e.name().as_ref()) == b"sst" => {
                    writer.write_event(Event::Start(self.updated_root(&e)?))?;
                }
                Event::Empty(e) if local_name(e.name().as_ref()) == b"sst" => {
                    let root = self.updated_root(&e)?;
                    let end = String::from_utf8(root.name().as_ref().to_vec())?;
                    writer.write_event(Event::Start(root))?;
                    self.write_items(&mut writer)?;
                    writer.write_event(Event::End(BytesEnd::new(end)))?;
                }
                Event::End(e) if local_name(e.name().as_ref()) == b"sst" => {
                    self.write_items(&mut writer)?;
                    writer.write_event(Event::End(e.into_owned()))?;
                }
                Event::Eof => break,
                event => writer.write_event(event.into_owned())?,
            }
            buf.clear();
        }

        Ok(writer.into_inner())
    }

    fn updated_root(&self, root: &BytesStart<'_>) -> Result<BytesStart<'static>> {
        let name = String::from_utf8(root.name().as_ref().to_vec())?;
        let unique = self.next_index;
        let mut updated = BytesStart::new(name);
        for attr in root.attributes() {
            let attr = attr?;
            match local_name(attr.key.as_ref()) {
                b"uniqueCount" => {}
                b"count" => {
                    let old: u32 = attr.unescape_value()?.trim().parse().unwrap_or(0);
                    let count = (old + self.appended.len() as u32).max(unique);
                    updated.push_attribute(("count", count.to_string().as_str()));
                }
                _ => updated.push_attribute(attr),
            }
        }
        updated.push_attribute(("uniqueCount", unique.to_string().as_str()));
        Ok(updated)
    }

    fn write_items(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        for text in &self.appended {
            writer.write_event(Event::Start(BytesStart::new("si")))?;
            let mut t = BytesStart::new("t");
            if needs_space_preserve(text) {
                t.push_attribute(("xml:space", "preserve"));
            }
            writer.write_event(Event::Start(t))?;
            writer.write_event(Event::Text(BytesText::new(text)))?;
            writer.write_event(Event::End(BytesEnd::new("t")))?;
            writer.write_event(Event::End(BytesEnd::new("si")))?;
        }
        Ok(())
    }
}
