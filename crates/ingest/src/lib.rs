//! Document ingestion for riskiq.
//!
//! Turns a corpus folder into [`Chunk`](riskiq_core::Chunk)s:
//! 1. each file is dispatched to the first [`Extractor`] that supports it,
//! 2. extractors yield [`RawUnit`](riskiq_core::RawUnit)s (a page, a row, a technique),
//! 3. the [`Splitter`] cuts every unit into overlapping character windows.
//!
//! Extraction is synchronous (it shells out to `pdftotext` and reads files);
//! async callers should run [`DocumentIngester::ingest`] on a blocking thread.

pub mod extractor;
pub mod ingester;
pub mod pdf;
pub mod spreadsheet;
pub mod splitter;
pub mod stix;

pub use extractor::Extractor;
pub use ingester::DocumentIngester;
pub use pdf::PdfExtractor;
pub use spreadsheet::SpreadsheetExtractor;
pub use splitter::Splitter;
pub use stix::StixExtractor;
