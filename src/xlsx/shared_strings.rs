//! Shared string table (xl/sharedStrings.xml).
//!
//! Cells with `t="s"` store an index into this table instead of inline text.
//! Rich-text entries are flattened by concatenating their runs.

use crate::error::{Error, Result};

/// Parsed shared string table.
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    /// Parse the table from sharedStrings.xml content.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut strings = Vec::new();
        // Text is collected untrimmed: `<t xml:space="preserve">` entries
        // carry significant leading/trailing whitespace.
        let mut reader = quick_xml::Reader::from_str(xml);

        let mut buf = Vec::new();
        let mut in_entry = false;
        let mut in_text = false;
        let mut current = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_entry = true;
                        current.clear();
                    }
                    b"t" if in_entry => in_text = true,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Text(e)) => {
                    if in_text {
                        current.push_str(&e.unescape().unwrap_or_default());
                    }
                }
                Ok(quick_xml::events::Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(std::mem::take(&mut current));
                        in_entry = false;
                    }
                    b"t" => in_text = false,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(Error::XmlParse(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { strings })
    }

    /// Look up a string by table index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    /// Resolve the raw `<v>` text of a `t="s"` cell to its string. Returns
    /// the raw text unchanged when it is not a valid index.
    pub fn resolve<'a>(&'a self, raw: &'a str) -> &'a str {
        raw.parse::<usize>()
            .ok()
            .and_then(|i| self.get(i))
            .unwrap_or(raw)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
