//! Dataset loading: walks the archive tree and parses XML message logs into
//! the nested [`Dataset`] mapping.
//!
//! Expected layout:
//!
//! ```text
//! <root>/
//!   <community>/
//!     <year>/
//!       <anything>.xml
//! ```
//!
//! Each record file holds `<message conversation_id="...">` elements with
//! `<ts>`, `<user>`, and `<text>` children. Missing `<ts>`/`<user>` default
//! to the empty string; a missing or blank `<text>` becomes `None`. Messages
//! without a `conversation_id` attribute are skipped with a warning, since
//! there is no conversation to attach them to. Unreadable or malformed files
//! are fatal and abort startup.

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::{Dataset, Message};

/// Walks `<root>/<community>/<year>/*.xml` and parses every record file.
///
/// Record files are visited in sorted path order, and conversations split
/// across multiple files within the same community/year are merged in
/// file-encounter order (the document builder re-sorts by timestamp), so
/// the resulting dataset is reproducible.
pub fn load_dataset(root: &Path) -> Result<Dataset> {
    if !root.is_dir() {
        bail!("dataset root does not exist: {}", root.display());
    }

    let mut dataset = Dataset::new();
    let mut file_count = 0usize;

    let walker = WalkDir::new(root)
        .min_depth(3)
        .max_depth(3)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("xml") {
            continue;
        }

        // At this depth the path shape is <root>/<community>/<year>/<file>.
        let (community, year) = match archive_keys(root, path) {
            Some(keys) => keys,
            None => continue,
        };

        debug!(file = %path.display(), "parsing record file");
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read record file: {}", path.display()))?;
        let conversations = parse_records(&xml)
            .with_context(|| format!("failed to parse record file: {}", path.display()))?;

        let year_map = dataset
            .entry(community)
            .or_default()
            .entry(year)
            .or_default();
        for (conversation_id, mut messages) in conversations {
            year_map
                .entry(conversation_id)
                .or_default()
                .append(&mut messages);
        }
        file_count += 1;
    }

    let conversation_count: usize = dataset
        .values()
        .flat_map(|years| years.values())
        .map(|conversations| conversations.len())
        .sum();
    info!(
        files = file_count,
        communities = dataset.len(),
        conversations = conversation_count,
        "dataset loaded"
    );

    Ok(dataset)
}

/// Extracts the community and year directory names for a record file.
fn archive_keys(root: &Path, file: &Path) -> Option<(String, String)> {
    let relative = file.strip_prefix(root).ok()?;
    let mut parts = relative.iter();
    let community = parts.next()?.to_string_lossy().into_owned();
    let year = parts.next()?.to_string_lossy().into_owned();
    Some((community, year))
}

/// Fields of a `<message>` element the parser is currently inside.
#[derive(Clone, Copy)]
enum MessageField {
    Ts,
    User,
    Text,
}

/// An open `<message>` element being accumulated.
struct PendingMessage {
    conversation_id: Option<String>,
    message: Message,
}

impl PendingMessage {
    fn new(conversation_id: Option<String>) -> Self {
        PendingMessage {
            conversation_id,
            message: Message {
                ts: String::new(),
                user: String::new(),
                text: None,
            },
        }
    }
}

/// Parses one XML message log into conversation id → messages.
fn parse_records(xml: &str) -> Result<BTreeMap<String, Vec<Message>>> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut conversations: BTreeMap<String, Vec<Message>> = BTreeMap::new();
    let mut buf = Vec::new();
    let mut current: Option<PendingMessage> = None;
    let mut field: Option<MessageField> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"message" => {
                    current = Some(PendingMessage::new(conversation_id_attr(&e)?));
                }
                b"ts" if current.is_some() => field = Some(MessageField::Ts),
                b"user" if current.is_some() => field = Some(MessageField::User),
                b"text" if current.is_some() => field = Some(MessageField::Text),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let (Some(pending), Some(f)) = (current.as_mut(), field) {
                    let value = t.unescape()?.into_owned();
                    match f {
                        MessageField::Ts => pending.message.ts = value,
                        MessageField::User => pending.message.user = value,
                        MessageField::Text => pending.message.text = Some(value),
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"message" => {
                    if let Some(pending) = current.take() {
                        push_message(&mut conversations, pending);
                    }
                }
                b"ts" | b"user" | b"text" => field = None,
                _ => {}
            },
            // Self-closing <message .../> carries attributes but no children.
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"message" {
                    push_message(
                        &mut conversations,
                        PendingMessage::new(conversation_id_attr(&e)?),
                    );
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(e.into()),
        }
        buf.clear();
    }

    Ok(conversations)
}

fn push_message(conversations: &mut BTreeMap<String, Vec<Message>>, pending: PendingMessage) {
    match pending.conversation_id {
        Some(id) => conversations.entry(id).or_default().push(pending.message),
        None => warn!("skipping message without conversation_id"),
    }
}

fn conversation_id_attr(e: &BytesStart<'_>) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"conversation_id" {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
