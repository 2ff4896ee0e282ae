use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use crate::util::unescape_html;

/// Errors produced while turning a response body into a [`FeedDocument`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body is not well-formed XML.
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// The document ended with elements still open.
    #[error("Unexpected end of document inside <{0}>")]
    Truncated(String),

    /// Well-formed XML, but no `<channel>` under the root element.
    #[error("Document has no <channel> element")]
    MissingChannel,
}

/// One fetched RSS channel. Lives only for a single ingestion cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDocument {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Items in document order
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Raw `pubDate` text; interpreted by the ingestion pipeline
    pub pub_date: String,
}

impl FeedDocument {
    /// Decode HTML character references in every human-readable field.
    ///
    /// Titles and descriptions routinely arrive entity-encoded on top of XML
    /// escaping (`&amp;amp;`). Runs exactly one unescape pass per field; links
    /// and dates are left as they are.
    pub fn unescape_html(mut self) -> Self {
        fn unescape_in_place(field: &mut String) {
            let decoded = unescape_html(field).into_owned();
            *field = decoded;
        }

        unescape_in_place(&mut self.title);
        unescape_in_place(&mut self.description);
        for item in &mut self.items {
            unescape_in_place(&mut item.title);
            unescape_in_place(&mut item.description);
        }
        self
    }
}

/// Which text field the reader is currently inside, if any.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    ChannelTitle,
    ChannelLink,
    ChannelDescription,
    ItemTitle,
    ItemLink,
    ItemDescription,
    ItemPubDate,
}

/// Match the open-element path against the RSS channel schema.
///
/// The root element's own name is not checked: `<rss><channel>` is the norm,
/// but any root wrapping a `<channel>` is accepted.
fn field_for(path: &[Vec<u8>]) -> Option<Field> {
    match path {
        [_, channel, field] if channel.as_slice() == b"channel" => match field.as_slice() {
            b"title" => Some(Field::ChannelTitle),
            b"link" => Some(Field::ChannelLink),
            b"description" => Some(Field::ChannelDescription),
            _ => None,
        },
        [_, channel, item, field] if channel.as_slice() == b"channel" && item.as_slice() == b"item" => {
            match field.as_slice() {
                b"title" => Some(Field::ItemTitle),
                b"link" => Some(Field::ItemLink),
                b"description" => Some(Field::ItemDescription),
                b"pubDate" => Some(Field::ItemPubDate),
                _ => None,
            }
        }
        _ => None,
    }
}

fn is_channel(path: &[Vec<u8>]) -> bool {
    matches!(path, [_, channel] if channel.as_slice() == b"channel")
}

fn is_item(path: &[Vec<u8>]) -> bool {
    matches!(path, [_, channel, item] if channel.as_slice() == b"channel" && item.as_slice() == b"item")
}

/// Parses an RSS 2.0 document into channel metadata and ordered items.
///
/// Element names are matched exactly, so namespaced siblings such as
/// `<atom:link>` or `<content:encoded>` never overwrite the plain fields.
/// Text is taken only from the field element itself (nested markup is
/// skipped), XML entities and CDATA are decoded, and surrounding whitespace
/// is trimmed. HTML entities are NOT decoded here; see
/// [`FeedDocument::unescape_html`].
///
/// # Security
///
/// SEC-002: quick-xml (0.37) never expands `<!ENTITY>` declarations; a custom
/// entity reference fails with an XML error instead of being resolved.
pub fn parse_document(content: &str) -> Result<FeedDocument, ParseError> {
    let mut reader = Reader::from_str(content.trim_start_matches('\u{feff}'));

    let mut doc = FeedDocument::default();
    let mut found_channel = false;
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut text = String::new();

    loop {
        let event = reader.read_event().map_err(|e| ParseError::Xml {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(e) => {
                path.push(e.name().as_ref().to_vec());
                if is_channel(&path) {
                    found_channel = true;
                } else if is_item(&path) {
                    doc.items.push(FeedItem::default());
                } else if field_for(&path).is_some() {
                    text.clear();
                }
            }
            Event::Empty(e) => {
                path.push(e.name().as_ref().to_vec());
                if is_channel(&path) {
                    found_channel = true;
                } else if is_item(&path) {
                    doc.items.push(FeedItem::default());
                } else if let Some(field) = field_for(&path) {
                    store_field(&mut doc, field, String::new());
                }
                path.pop();
            }
            Event::Text(e) => {
                let unescaped = e.unescape().map_err(|err| ParseError::Xml {
                    position: reader.buffer_position() as u64,
                    message: err.to_string(),
                })?;
                if field_for(&path).is_some() {
                    text.push_str(&unescaped);
                }
            }
            Event::CData(e) => {
                if field_for(&path).is_some() {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(field) = field_for(&path) {
                    store_field(&mut doc, field, text.trim().to_string());
                    text.clear();
                }
                path.pop();
            }
            Event::Eof => {
                if let Some(open) = path.last() {
                    return Err(ParseError::Truncated(
                        String::from_utf8_lossy(open).into_owned(),
                    ));
                }
                break;
            }
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if !found_channel {
        return Err(ParseError::MissingChannel);
    }
    Ok(doc)
}

fn store_field(doc: &mut FeedDocument, field: Field, value: String) {
    match field {
        Field::ChannelTitle => doc.title = value,
        Field::ChannelLink => doc.link = value,
        Field::ChannelDescription => doc.description = value,
        item_field => {
            // field_for only reports item fields while an <item> is open
            let Some(item) = doc.items.last_mut() else {
                return;
            };
            match item_field {
                Field::ItemTitle => item.title = value,
                Field::ItemLink => item.link = value,
                Field::ItemDescription => item.description = value,
                _ => item.pub_date = value,
            }
        }
    }
}
