//! I/O boundary traits for testability
//!
//! These traits abstract the feed document and the record store, allowing
//! services to be tested with in-memory implementations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::domain::{OfferRecord, RawCategory, RawOffer};

/// Lazily produced offers of a feed.
pub type OfferStream<'a> = Box<dyn Iterator<Item = io::Result<RawOffer>> + 'a>;

/// Source of a marketplace feed.
pub trait FeedSource: Send + Sync {
    /// Where the feed comes from, for messages.
    fn location(&self) -> &Path;

    /// Read the whole category section.
    fn read_categories(&self) -> io::Result<Vec<RawCategory>>;

    /// Stream the offers one at a time.
    fn offers(&self) -> io::Result<OfferStream<'_>>;
}

/// Destination for finished offer records.
pub trait OfferSink {
    fn write(&mut self, record: &OfferRecord) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Writes one JSON object per record and line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OfferSink for JsonLinesSink<W> {
    fn write(&mut self, record: &OfferRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record).map_err(io::Error::from)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<OfferRecord>,
}

impl OfferSink for MemorySink {
    fn write(&mut self, record: &OfferRecord) -> io::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Feed held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeed {
    pub location: PathBuf,
    pub categories: Vec<RawCategory>,
    pub offers: Vec<RawOffer>,
}

impl MemoryFeed {
    pub fn new(categories: Vec<RawCategory>, offers: Vec<RawOffer>) -> Self {
        Self {
            location: PathBuf::from("<memory>"),
            categories,
            offers,
        }
    }
}

impl FeedSource for MemoryFeed {
    fn location(&self) -> &Path {
        &self.location
    }

    fn read_categories(&self) -> io::Result<Vec<RawCategory>> {
        Ok(self.categories.clone())
    }

    fn offers(&self) -> io::Result<OfferStream<'_>> {
        Ok(Box::new(self.offers.iter().cloned().map(Ok)))
    }
}
