//! Streaming reader for YML/XML marketplace feeds.
//!
//! Categories are collected from `<categories>`, offers are produced one
//! `<offer>` element at a time so memory stays bounded by a single offer.
//!
//! Text, attribute values and tag names are decoded with the encoding named
//! in the XML declaration (UTF-8 when absent). Text is kept verbatim,
//! surrounding whitespace included.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, trace, warn};

use crate::domain::{RawCategory, RawOffer};
use crate::infrastructure::traits::{FeedSource, OfferStream};

const CATEGORY: &[u8] = b"category";
const CATEGORIES: &[u8] = b"categories";
const OFFER: &[u8] = b"offer";
const PARAM: &[u8] = b"param";

/// Feed document on disk.
#[derive(Debug, Clone)]
pub struct XmlFeed {
    path: PathBuf,
}

impl XmlFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> io::Result<Reader<BufReader<File>>> {
        let file = File::open(&self.path)?;
        Ok(new_reader(BufReader::new(file)))
    }
}

impl FeedSource for XmlFeed {
    fn location(&self) -> &Path {
        &self.path
    }

    fn read_categories(&self) -> io::Result<Vec<RawCategory>> {
        let mut reader = self.open()?;
        let categories = read_categories_from(&mut reader)?;
        debug!("read {} categories from {}", categories.len(), self.path.display());
        Ok(categories)
    }

    fn offers(&self) -> io::Result<OfferStream<'_>> {
        Ok(Box::new(OfferIter::new(self.open()?)))
    }
}

fn new_reader<R: BufRead>(source: R) -> Reader<R> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(false);
    reader
}

/// Collect every `<category>` up to the end of `<categories>`.
pub fn read_categories_from<R: BufRead>(reader: &mut Reader<R>) -> io::Result<Vec<RawCategory>> {
    let mut categories = Vec::new();
    let mut buf = Vec::new();
    let mut text_buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(reader, e))?;
        match event {
            Event::Start(e) if e.name().as_ref() == CATEGORY => {
                let (id, parent_id) = category_attributes(reader, &e)?;
                let name = read_text(reader, CATEGORY, &mut text_buf)?;
                push_category(&mut categories, id, parent_id, name);
            }
            Event::Empty(e) if e.name().as_ref() == CATEGORY => {
                let (id, parent_id) = category_attributes(reader, &e)?;
                push_category(&mut categories, id, parent_id, String::new());
            }
            Event::End(e) if e.name().as_ref() == CATEGORIES => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(categories)
}

fn push_category(
    categories: &mut Vec<RawCategory>,
    id: Option<String>,
    parent_id: String,
    name: String,
) {
    match id {
        Some(id) => categories.push(RawCategory { id, parent_id, name }),
        None => warn!("skipping category without id: {:?}", name),
    }
}

fn category_attributes<R>(
    reader: &Reader<R>,
    e: &BytesStart<'_>,
) -> io::Result<(Option<String>, String)> {
    let mut id = None;
    let mut parent_id = String::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| xml_error(reader, e.into()))?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| xml_error(reader, e))?
            .into_owned();
        match attr.key.as_ref() {
            b"id" => id = Some(value),
            b"parentId" => parent_id = value,
            _ => {}
        }
    }
    Ok((id, parent_id))
}

fn attribute<R>(
    reader: &Reader<R>,
    e: &BytesStart<'_>,
    key: &[u8],
) -> io::Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| xml_error(reader, e.into()))?;
        if attr.key.as_ref() == key {
            let value = attr
                .decode_and_unescape_value(reader.decoder())
                .map_err(|e| xml_error(reader, e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Concatenated text of the element just opened, up to its matching end tag.
/// Text of nested elements is included.
fn read_text<R: BufRead>(
    reader: &mut Reader<R>,
    end: &[u8],
    buf: &mut Vec<u8>,
) -> io::Result<String> {
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        buf.clear();
        let event = reader.read_event_into(buf).map_err(|e| xml_error(reader, e))?;
        match event {
            Event::Text(t) => text.push_str(&t.unescape().map_err(|e| xml_error(reader, e))?),
            Event::CData(c) => {
                let decoded = reader
                    .decoder()
                    .decode(&c)
                    .map_err(|e| xml_error(reader, e.into()))?;
                text.push_str(&decoded);
            }
            Event::Start(_) => depth += 1,
            Event::End(e) => {
                if depth == 0 {
                    if e.name().as_ref() != end {
                        return Err(invalid_data(reader, "mismatched end tag"));
                    }
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(invalid_data(reader, "unexpected end of document")),
            _ => {}
        }
    }
    Ok(text)
}

/// Iterator over the `<offer>` elements of a feed.
pub struct OfferIter<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    text_buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> OfferIter<R> {
    pub fn new(reader: Reader<R>) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            text_buf: Vec::new(),
            done: false,
        }
    }

    pub fn from_source(source: R) -> Self {
        Self::new(new_reader(source))
    }

    fn next_offer(&mut self) -> io::Result<Option<RawOffer>> {
        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| xml_error(&self.reader, e))?;
            match event {
                Event::Start(e) if e.name().as_ref() == OFFER => {
                    let id = attribute(&self.reader, &e, b"id")?;
                    return self.read_offer_body(id).map(Some);
                }
                Event::Empty(e) if e.name().as_ref() == OFFER => {
                    let id = attribute(&self.reader, &e, b"id")?;
                    return Ok(Some(RawOffer {
                        id,
                        ..RawOffer::default()
                    }));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    fn read_offer_body(&mut self, id: Option<String>) -> io::Result<RawOffer> {
        let mut offer = RawOffer {
            id,
            ..RawOffer::default()
        };
        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|e| xml_error(&self.reader, e))?;
            match event {
                Event::Start(e) => {
                    let raw_tag = e.name().as_ref().to_vec();
                    let tag = decode_name(&self.reader, &raw_tag)?;
                    let param_name = if e.name().as_ref() == PARAM {
                        Some(attribute(&self.reader, &e, b"name")?.unwrap_or_default())
                    } else {
                        None
                    };
                    let text = read_text(&mut self.reader, &raw_tag, &mut self.text_buf)?;
                    match param_name {
                        Some(name) => offer.params.push((name, text)),
                        None => offer.fields.push((tag, text)),
                    }
                }
                Event::Empty(e) => {
                    let tag = decode_name(&self.reader, e.name().as_ref())?;
                    if e.name().as_ref() == PARAM {
                        let name = attribute(&self.reader, &e, b"name")?.unwrap_or_default();
                        offer.params.push((name, String::new()));
                    } else {
                        offer.fields.push((tag, String::new()));
                    }
                }
                Event::End(e) if e.name().as_ref() == OFFER => break,
                Event::Eof => return Err(invalid_data(&self.reader, "unterminated <offer>")),
                _ => {}
            }
        }
        trace!(
            "offer {:?}: {} fields, {} params",
            offer.id,
            offer.fields.len(),
            offer.params.len()
        );
        Ok(offer)
    }
}

impl<R: BufRead> Iterator for OfferIter<R> {
    type Item = io::Result<RawOffer>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_offer() {
            Ok(Some(offer)) => Some(Ok(offer)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn decode_name<R>(reader: &Reader<R>, name: &[u8]) -> io::Result<String> {
    reader
        .decoder()
        .decode(name)
        .map(|name| name.into_owned())
        .map_err(|e| xml_error(reader, e.into()))
}

fn xml_error<R>(reader: &Reader<R>, e: quick_xml::Error) -> io::Error {
    invalid_data(reader, &e.to_string())
}

fn invalid_data<R>(reader: &Reader<R>, message: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("malformed feed at byte {}: {}", reader.buffer_position(), message),
    )
}
