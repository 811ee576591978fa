//! Parsing of legacy XML sidecar metadata files
//!
//! Expected shape:
//!
//! ```xml
//! <meta>
//!   <title>...</title>
//!   <description>...</description>
//!   <tags><tag>...</tag><tag>...</tag></tags>
//!   <speaker>...</speaker>
//! </meta>
//! ```

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::encoding::decode_to_utf8;

const ROOT: &str = "meta";

/// Failure to turn sidecar bytes into [`SidecarMeta`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SidecarError {
    #[error("cannot transcode sidecar from {encoding} to UTF-8")]
    Transcode { encoding: String },

    #[error("malformed XML: {0}")]
    Xml(String),

    #[error("expected root element <meta>, found <{0}>")]
    UnexpectedRoot(String),

    #[error("document has no root element")]
    MissingRoot,

    #[error("required element <{0}> is missing")]
    MissingElement(&'static str),
}

/// Sidecar contents before title cleaning and id assignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarMeta {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub people: Vec<String>,
}

impl SidecarMeta {
    /// Detect the encoding of raw file bytes, transcode and parse
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SidecarError> {
        let (xml, _) = decode_to_utf8(bytes)?;
        parse_sidecar(&xml)
    }
}

/// Open element and the text collected directly inside it
struct OpenElement {
    name: String,
    text: String,
}

/// Parse UTF-8 sidecar XML.
///
/// Text is trimmed, the first `<title>`/`<description>` wins, only the first
/// `<tags>` container is read, and unknown elements and attributes are ignored.
pub fn parse_sidecar(xml: &str) -> Result<SidecarMeta, SidecarError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut seen_root = false;
    let mut tag_containers = 0usize;

    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    let mut tags = Vec::new();
    let mut people = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SidecarError::Xml(e.to_string()))?;

        // Empty elements are handled as an open immediately followed by a close
        let (opened, closes_now) = match &event {
            Event::Start(e) => (Some(local_name(e.local_name().as_ref())), false),
            Event::Empty(e) => (Some(local_name(e.local_name().as_ref())), true),
            _ => (None, false),
        };

        if let Some(name) = opened {
            if stack.is_empty() {
                if seen_root {
                    return Err(SidecarError::Xml("multiple root elements".to_string()));
                }
                if name != ROOT {
                    return Err(SidecarError::UnexpectedRoot(name));
                }
                seen_root = true;
            }
            if stack.len() == 1 && stack[0].name == ROOT && name == "tags" {
                tag_containers += 1;
            }
            stack.push(OpenElement {
                name,
                text: String::new(),
            });
            if !closes_now {
                continue;
            }
        }

        match event {
            Event::Text(t) => {
                let text = t.unescape().map_err(|e| SidecarError::Xml(e.to_string()))?;
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) | Event::Empty(_) => {
                let Some(closed) = stack.pop() else {
                    continue;
                };
                let value = closed.text.trim().to_string();
                let parents: Vec<&str> = stack.iter().map(|open| open.name.as_str()).collect();

                match (parents.as_slice(), closed.name.as_str()) {
                    ([ROOT], "title") => {
                        title.get_or_insert(value);
                    }
                    ([ROOT], "description") => {
                        description.get_or_insert(value);
                    }
                    ([ROOT], "speaker") => people.push(value),
                    ([ROOT, "tags"], "tag") if tag_containers == 1 => tags.push(value),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(SidecarError::MissingRoot);
    }
    if let Some(open) = stack.last() {
        return Err(SidecarError::Xml(format!("unclosed element <{}>", open.name)));
    }

    Ok(SidecarMeta {
        title: title.ok_or(SidecarError::MissingElement("title"))?,
        description: description.unwrap_or_default(),
        tags,
        people,
    })
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_document() {
        let meta = parse_sidecar(
            "<meta><title>Foo</title><description>Bar</description>\
             <tags><tag>x</tag><tag>y</tag></tags><speaker>Alice</speaker></meta>",
        )
        .unwrap();

        assert_eq!(meta.title, "Foo");
        assert_eq!(meta.description, "Bar");
        assert_eq!(meta.tags, vec!["x", "y"]);
        assert_eq!(meta.people, vec!["Alice"]);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let meta = parse_sidecar(
            "<?xml version=\"1.0\"?>\n<meta>\n  <title>\n    Foo Bar\n  </title>\n  \
             <speaker> Alice </speaker>\n  <speaker>Bob</speaker>\n</meta>\n",
        )
        .unwrap();

        assert_eq!(meta.title, "Foo Bar");
        assert_eq!(meta.people, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_optional_elements_default_to_empty() {
        let meta = parse_sidecar("<meta><title>Only title</title></meta>").unwrap();
        assert_eq!(meta.description, "");
        assert!(meta.tags.is_empty());
        assert!(meta.people.is_empty());
    }

    #[test]
    fn test_empty_elements() {
        let meta = parse_sidecar("<meta><title>T</title><description/><tags/></meta>").unwrap();
        assert_eq!(meta.description, "");
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn test_entities_and_cdata() {
        let meta = parse_sidecar(
            "<meta><title>Q&amp;A</title><description><![CDATA[<b>bold</b>]]></description></meta>",
        )
        .unwrap();
        assert_eq!(meta.title, "Q&A");
        assert_eq!(meta.description, "<b>bold</b>");
    }

    #[test]
    fn test_attributes_and_unknown_elements_are_ignored() {
        let meta = parse_sidecar(
            "<meta version=\"2\"><duration>12:00</duration><title lang=\"en\">Talk</title>\
             <tags><tag>a</tag><other>b</other></tags></meta>",
        )
        .unwrap();
        assert_eq!(meta.title, "Talk");
        assert_eq!(meta.tags, vec!["a"]);
    }

    #[test]
    fn test_only_first_tags_container_is_used() {
        let meta = parse_sidecar(
            "<meta><title>T</title><tags><tag>a</tag></tags><tags><tag>b</tag></tags></meta>",
        )
        .unwrap();
        assert_eq!(meta.tags, vec!["a"]);
    }

    #[test]
    fn test_missing_title() {
        assert_eq!(
            parse_sidecar("<meta><description>x</description></meta>"),
            Err(SidecarError::MissingElement("title"))
        );
    }

    #[test]
    fn test_wrong_root() {
        assert_eq!(
            parse_sidecar("<video><title>x</title></video>"),
            Err(SidecarError::UnexpectedRoot("video".to_string()))
        );
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(parse_sidecar(""), Err(SidecarError::MissingRoot));
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            parse_sidecar("<meta><title>x</description></meta>"),
            Err(SidecarError::Xml(_))
        ));
    }

    #[test]
    fn test_second_root_element_is_rejected() {
        assert_eq!(
            parse_sidecar(
                "<meta><title>A</title><speaker>Alice</speaker></meta>\
                 <meta><speaker>Bob</speaker></meta>"
            ),
            Err(SidecarError::Xml("multiple root elements".to_string()))
        );
        assert!(parse_sidecar("<meta><title>A</title></meta><extra/>").is_err());
    }

    #[test]
    fn test_unclosed_root() {
        assert!(matches!(
            parse_sidecar("<meta><title>x</title>"),
            Err(SidecarError::Xml(_))
        ));
    }

    #[test]
    fn test_from_bytes_transcodes_first() {
        let (bytes, _, _) = encoding_rs::WINDOWS_1252
            .encode("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><meta><title>Café</title></meta>");
        let meta = SidecarMeta::from_bytes(&bytes).unwrap();
        assert_eq!(meta.title, "Café");
    }
}
