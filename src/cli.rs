//! Command-line interface definition for linksift
//!
//! Provides argument parsing and path handling for the URL sifter.

use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};

use crate::processor::DEFAULT_CONCURRENCY;

/// Sift large URL lists against pattern wordlists
///
/// Every URL that matches at least one pattern is appended to the output file.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "linksift",
    author = "m0h1nd4",
    version,
    about = "Check a list of URLs against a list of patterns and save the matches",
    long_about = r#"
Check a list of URLs against a list of patterns and append every match to the
output file. Patterns can be tested against the full URL or against a single
component: the path, the undecoded path, the filename or the query string.

EXAMPLES:
    # URLs containing any of the words
    linksift -i urls.txt -w words.txt -o hits.txt

    # Interesting file names, case-insensitive, exact match
    linksift -i urls.txt -w files.txt -o hits.txt --filename -e -L

    # Regex against the query string
    linksift -i urls.txt -w params.txt -o hits.txt --rawquery -r

PATTERN FILE EXAMPLES:
    admin              - contains mode (default)
    web.config         - with --filename -e, only that exact file name
    (?i)redirect=http  - with -r, case-insensitive regex
"#
)]
#[command(group(
    ArgGroup::new("scan")
        .args(["path", "rawpath", "filename", "rawquery"])
        .multiple(false)
))]
pub struct Args {
    /// File containing a list of URLs
    #[arg(short, long, required = true, value_name = "FILE")]
    pub input: PathBuf,

    /// File to save results to (appended)
    #[arg(short, long, required = true, value_name = "FILE")]
    pub output: PathBuf,

    /// File containing a list of patterns
    #[arg(short, long, required = true, value_name = "FILE")]
    pub wordlist: PathBuf,

    /// Number of concurrent matching tasks
    #[arg(
        short,
        long,
        value_name = "NUM",
        default_value_t = DEFAULT_CONCURRENCY,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub threads: usize,

    /// Enable verbose mode
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Quiet mode - no banner, progress or summary
    #[arg(short, long, default_value_t = false, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Check using regex from the pattern file
    #[arg(short, long, default_value_t = false)]
    pub regex: bool,

    /// Check if patterns are equal to the compared value
    /// (useful with --path, --filename or --rawquery)
    #[arg(short, long, default_value_t = false)]
    pub equal: bool,

    /// Convert all URLs to lowercase
    #[arg(short, long, default_value_t = false)]
    pub lowercase: bool,

    /// Convert URLs and patterns to lowercase
    #[arg(short = 'L', long, default_value_t = false)]
    pub all2lowercase: bool,

    /// Check URL path only (includes the filename)
    #[arg(long, default_value_t = false)]
    pub path: bool,

    /// Check URL path only without decoding (includes the filename)
    #[arg(long, default_value_t = false)]
    pub rawpath: bool,

    /// Check the filename from the URL path only
    #[arg(long, default_value_t = false)]
    pub filename: bool,

    /// Check the URL query only
    #[arg(long, default_value_t = false)]
    pub rawquery: bool,
}

impl Args {
    pub fn input_path(&self) -> PathBuf {
        expand_home(&self.input)
    }

    pub fn output_path(&self) -> PathBuf {
        expand_home(&self.output)
    }

    pub fn wordlist_path(&self) -> PathBuf {
        expand_home(&self.wordlist)
    }
}

/// Expand a leading `~/` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}
