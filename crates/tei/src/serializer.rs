//! XML output for [`TeiDocument`]

use crate::model::{Division, TeiDocument};
use crate::{TeiError, TEI_NAMESPACE};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

const INDENT_SIZE: usize = 2;

impl TeiDocument {
    /// Serialize to indented UTF-8 XML with an XML declaration.
    ///
    /// Division text is written inline, so the space starting each line
    /// break tail is kept exactly.
    pub fn to_xml_string(&self) -> Result<String, TeiError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("TEI").with_attributes([("xmlns", TEI_NAMESPACE)]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("text")))?;

        if self.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("body")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("body")))?;
            for division in self.divisions() {
                write_division(&mut writer, division)?;
            }
            writer.write_event(Event::End(BytesEnd::new("body")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("text")))?;
        writer.write_event(Event::End(BytesEnd::new("TEI")))?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|e| TeiError::Xml(e.to_string()))
    }

    /// Write the XML to `path`, replacing any existing file.
    ///
    /// The document is written to a temporary file in the same directory
    /// and renamed over `path`, so readers never see a partial file.
    pub fn write_to(&self, path: &Path) -> Result<(), TeiError> {
        let xml = self.to_xml_string()?;
        write_atomic(path, xml.as_bytes())?;
        info!("Wrote {} divisions to {}", self.len(), path.display());
        Ok(())
    }
}

fn write_division<W: Write>(writer: &mut Writer<W>, division: &Division) -> Result<(), TeiError> {
    let Some(content) = division.content() else {
        writer.write_event(Event::Empty(BytesStart::new("div")))?;
        return Ok(());
    };

    writer.write_event(Event::Start(BytesStart::new("div")))?;
    writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(content))))?;
    for lb in division.breaks() {
        writer.write_event(Event::Empty(BytesStart::new("lb")))?;
        writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(lb.tail()))))?;
    }
    writer.write_event(Event::End(BytesEnd::new("div")))?;
    Ok(())
}

/// Replace `path` with `contents` via a temporary file and rename
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), TeiError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| TeiError::Persist {
        path: path.to_path_buf(),
        error: e.error.to_string(),
    })?;
    Ok(())
}
