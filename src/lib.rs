//! # linksift
//!
//! High-performance URL sifting for reconnaissance.
//!
//! ## Features
//!
//! - **Scan targets**: full URL, decoded path, raw path, filename or raw query
//! - **Match modes**: substring, exact equality or regular expression
//! - **Case folding**: lowercase the target, or target and patterns
//! - **Deduplication**: URL and pattern lists are deduplicated in file order
//! - **Bounded parallelism**: a fixed-size worker pool caps concurrent tasks
//!
//! ## Usage
//!
//! ```bash
//! # URLs whose path contains a pattern
//! linksift -i urls.txt -w words.txt -o hits.txt --path
//!
//! # Exact file names, case-insensitive
//! linksift -i urls.txt -w files.txt -o hits.txt --filename -e -L
//! ```
//!
//! ## Example
//!
//! ```rust
//! use linksift::extract::ScanMode;
//! use linksift::filter::MatchMode;
//! use linksift::output::MemorySink;
//! use linksift::processor::{Processor, ProcessorConfig};
//!
//! let config = ProcessorConfig {
//!     scan_mode: ScanMode::Filename,
//!     match_mode: MatchMode::Equal,
//!     concurrency: 4,
//!     ..ProcessorConfig::default()
//! };
//!
//! let processor = Processor::new(config).unwrap();
//! let loaded = processor.prepare_patterns(vec!["web.config".to_string()]);
//! let urls = vec![
//!     "https://example.com/app/web.config".to_string(),
//!     "https://example.com/index.html".to_string(),
//! ];
//!
//! let sink = MemorySink::new();
//! let summary = processor.run(&urls, &loaded.patterns, &sink).unwrap();
//! assert_eq!(summary.matched, 1);
//! ```

pub mod cli;
pub mod dedup;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod filter;
pub mod output;
pub mod processor;
pub mod progress;

pub use cli::Args;
pub use error::{SiftError, SiftResult};
pub use processor::{Processor, ProcessorConfig};
