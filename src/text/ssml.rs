//! SSML document construction.
//!
//! Documents are written with `xml-rs`, so text is always escaped and the
//! output is well-formed. Only the subset of SSML needed for timestamped
//! scripts is exposed: plain text, `<mark>` and `<break>`.

use std::string::FromUtf8Error;
use std::time::Duration;

use xml::writer::{EmitterConfig, EventWriter, XmlEvent};

#[derive(thiserror::Error, Debug)]
pub enum SsmlError {
    #[error("Failed to write SSML: {0}")]
    Xml(#[from] xml::writer::Error),
    #[error("SSML output is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Builds a single `<speak>` document from a sequence of instructions.
///
/// Write errors are latched: the first one is returned from
/// [`build`](SsmlBuilder::build) and later instructions are ignored.
pub struct SsmlBuilder {
    writer: EventWriter<Vec<u8>>,
    error: Option<xml::writer::Error>,
}

impl Default for SsmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SsmlBuilder {
    /// Starts a new document with an open `<speak>` element.
    pub fn new() -> Self {
        let writer = EventWriter::new_with_config(
            Vec::new(),
            EmitterConfig::new()
                .write_document_declaration(false)
                .perform_indent(false),
        );
        let mut builder = Self {
            writer,
            error: None,
        };
        builder.append(XmlEvent::start_element("speak").into());
        builder
    }

    /// Appends text to speak. Markup characters are escaped.
    pub fn text<S: AsRef<str>>(&mut self, text: S) -> &mut Self {
        let text = text.as_ref();
        if text.is_empty() {
            return self;
        }
        self.append(XmlEvent::characters(text))
    }

    /// Appends a named `<mark>` the engine can report timepoints for.
    pub fn mark<S: AsRef<str>>(&mut self, name: S) -> &mut Self {
        self.append(XmlEvent::start_element("mark").attr("name", name.as_ref()).into())
            .append(XmlEvent::end_element().name("mark").into())
    }

    /// Appends a pause. Sub-millisecond precision is dropped; zero is a no-op.
    pub fn pause(&mut self, duration: Duration) -> &mut Self {
        let millis = duration.as_millis();
        if millis == 0 {
            return self;
        }
        let time = format!("{millis}ms");
        self.append(XmlEvent::start_element("break").attr("time", &time).into())
            .append(XmlEvent::end_element().name("break").into())
    }

    /// Closes the document and returns it as a string.
    pub fn build(mut self) -> Result<String, SsmlError> {
        self.append(XmlEvent::end_element().name("speak").into());
        if let Some(err) = self.error.take() {
            return Err(err.into());
        }
        Ok(String::from_utf8(self.writer.into_inner())?)
    }

    fn append(&mut self, event: XmlEvent) -> &mut Self {
        if self.error.is_none() {
            if let Err(err) = self.writer.write(event) {
                self.error = Some(err);
            }
        }
        self
    }
}
