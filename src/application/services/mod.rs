//! Application services

pub mod assembler;
pub mod catalog;
pub mod ingest;

pub use assembler::{AssemblyOutcome, OfferAssembler, UnknownCategoryPolicy};
pub use catalog::CatalogService;
pub use ingest::{IngestReport, IngestService};
