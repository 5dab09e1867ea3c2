//! Core processing engine
//!
//! Fans the URL list out over a fixed-size worker pool, one matching task per
//! URL, and streams every hit to the result sink.

use crate::cli::Args;
use crate::dedup::dedup_lines_with_stats;
use crate::encoding::read_lines;
use crate::error::{SiftError, SiftResult};
use crate::extract::{extract, ScanMode};
use crate::filter::{CasePolicy, MatchMode, PatternSet};
use crate::output::ResultSink;
use crate::progress::{create_progress_bar, print_match, print_warning, ScanStats};

use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Default number of concurrent matching tasks
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Immutable engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorConfig {
    pub scan_mode: ScanMode,
    pub match_mode: MatchMode,
    pub case_policy: CasePolicy,
    /// Upper bound on tasks executing at once
    pub concurrency: usize,
    pub verbose: bool,
    pub quiet: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            scan_mode: ScanMode::Full,
            match_mode: MatchMode::Contains,
            case_policy: CasePolicy::Preserve,
            concurrency: DEFAULT_CONCURRENCY,
            verbose: false,
            quiet: true,
        }
    }
}

impl ProcessorConfig {
    pub fn from_args(args: &Args) -> Self {
        let match_mode = MatchMode::from_flags(args.equal, args.regex);
        Self {
            scan_mode: ScanMode::from_flags(args.path, args.rawpath, args.filename, args.rawquery),
            match_mode,
            case_policy: CasePolicy::new(args.lowercase, args.all2lowercase, match_mode),
            concurrency: args.threads,
            verbose: args.verbose,
            quiet: args.quiet,
        }
    }
}

/// Tracks how many tasks are executing and the highest count seen
#[derive(Debug, Default)]
pub struct TaskGauge {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl TaskGauge {
    /// Mark a task as started. The returned guard marks it finished on drop.
    pub fn enter(&self) -> TaskGuard<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        TaskGuard { gauge: self }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

pub struct TaskGuard<'a> {
    gauge: &'a TaskGauge,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.gauge.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub processed: u64,
    pub matched: u64,
    /// URLs whose scan target was too short to match
    pub skipped: u64,
    pub malformed: u64,
    pub write_errors: u64,
    /// Highest number of tasks observed executing at once
    pub peak_in_flight: usize,
    pub elapsed: Duration,
}

/// Outcome of preparing the pattern list
#[derive(Debug)]
pub struct LoadedPatterns {
    pub patterns: PatternSet,
    pub duplicates: usize,
    pub rejected: usize,
}

/// Main processor
pub struct Processor {
    config: ProcessorConfig,
    pool: rayon::ThreadPool,
}

impl Processor {
    /// Build a processor and its worker pool.
    ///
    /// The pool has exactly `config.concurrency` workers; a task holds one
    /// worker from start to finish.
    pub fn new(config: ProcessorConfig) -> SiftResult<Self> {
        if config.concurrency == 0 {
            return Err(SiftError::InvalidConcurrency(config.concurrency));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .thread_name(|i| format!("linksift-worker-{}", i))
            .build()
            .map_err(|e| SiftError::WorkerPool(e.to_string()))?;

        Ok(Self { config, pool })
    }

    /// Read and deduplicate the URL list
    pub fn load_urls(&self, path: &Path) -> SiftResult<Vec<String>> {
        let (urls, stats) = dedup_lines_with_stats(read_lines(path)?);
        log::debug!(
            "{:?}: {} unique URLs, {} duplicates dropped",
            path,
            stats.unique,
            stats.duplicates
        );

        if urls.is_empty() {
            return Err(SiftError::EmptyUrls(path.to_path_buf()));
        }
        Ok(urls)
    }

    /// Read the pattern list and turn it into the active pattern set
    pub fn load_patterns(&self, path: &Path) -> SiftResult<LoadedPatterns> {
        let loaded = self.prepare_patterns(read_lines(path)?);
        if loaded.patterns.is_empty() {
            return Err(SiftError::EmptyPatterns(path.to_path_buf()));
        }
        Ok(loaded)
    }

    /// Deduplicate, case-normalize and compile pattern sources.
    ///
    /// Malformed regexes are dropped here, once, rather than failing inside
    /// every task.
    pub fn prepare_patterns(&self, sources: Vec<String>) -> LoadedPatterns {
        let (sources, stats) = dedup_lines_with_stats(sources);
        let sources = self.config.case_policy.normalize_patterns(sources);

        let (patterns, rejected) = PatternSet::compile(sources, self.config.match_mode);

        for bad in &rejected {
            log::debug!("Rejected pattern '{}': {}", bad.pattern, bad.reason);
            if self.config.verbose {
                print_warning(&format!("Malformed regex: '{}'", bad.pattern));
            }
        }
        if !rejected.is_empty() && !self.config.verbose && !self.config.quiet {
            print_warning(&format!(
                "{} malformed regex pattern(s) ignored (use --verbose to list them)",
                rejected.len()
            ));
        }

        LoadedPatterns {
            patterns,
            duplicates: stats.duplicates,
            rejected: rejected.len(),
        }
    }

    /// Match every URL against the pattern set and record hits in `sink`.
    ///
    /// Returns only once every task has finished; the sink is flushed before
    /// returning. Output order is not related to input order.
    pub fn run(
        &self,
        urls: &[String],
        patterns: &PatternSet,
        sink: &dyn ResultSink,
    ) -> SiftResult<ScanSummary> {
        if urls.is_empty() {
            return Err(SiftError::EmptyInput("URLs"));
        }
        if patterns.is_empty() {
            return Err(SiftError::EmptyInput("patterns"));
        }

        let stats = ScanStats::new();
        let gauge = TaskGauge::default();

        let pb = if self.config.quiet || self.config.verbose {
            ProgressBar::hidden()
        } else {
            create_progress_bar(urls.len() as u64, "Sifting...")
        };

        self.pool.install(|| {
            urls.par_iter().for_each(|line| {
                let _guard = gauge.enter();
                self.scan_one(line, patterns, sink, &stats);
                stats.add_processed();
                pb.inc(1);
            });
        });

        pb.finish_and_clear();

        if let Err(e) = sink.flush() {
            log::error!("Failed to flush output: {:#}", e);
            stats.add_write_error();
        }

        Ok(ScanSummary {
            processed: stats.get_processed(),
            matched: stats.get_matched(),
            skipped: stats.get_skipped(),
            malformed: stats.get_malformed(),
            write_errors: stats.get_write_errors(),
            peak_in_flight: gauge.peak(),
            elapsed: stats.elapsed(),
        })
    }

    /// One matching task. Never fails: every problem is counted and logged.
    fn scan_one(
        &self,
        line: &str,
        patterns: &PatternSet,
        sink: &dyn ResultSink,
        stats: &ScanStats,
    ) {
        let target = match extract(line, self.config.scan_mode) {
            Ok(target) => target,
            Err(e) => {
                log::debug!("{}", e);
                stats.add_malformed();
                return;
            }
        };

        // Empty and single-character targets match almost anything
        if target.len() <= 1 {
            stats.add_skipped();
            return;
        }

        let target = self.config.case_policy.normalize_target(target);

        if patterns.first_match(&target).is_none() {
            return;
        }

        stats.add_match();
        if self.config.verbose {
            print_match(line);
        }
        if let Err(e) = sink.record(line) {
            log::error!("Failed to record '{}': {:#}", line, e);
            stats.add_write_error();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{FileSink, MemorySink};
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::thread;
    use tempfile::TempDir;

    fn config(scan_mode: ScanMode, match_mode: MatchMode, concurrency: usize) -> ProcessorConfig {
        ProcessorConfig {
            scan_mode,
            match_mode,
            concurrency,
            ..ProcessorConfig::default()
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sift(
        config: ProcessorConfig,
        urls: &[&str],
        patterns: &[&str],
    ) -> (HashSet<String>, ScanSummary) {
        let processor = Processor::new(config).unwrap();
        let loaded = processor.prepare_patterns(strings(patterns));
        let sink = MemorySink::new();
        let summary = processor.run(&strings(urls), &loaded.patterns, &sink).unwrap();
        (sink.into_lines().into_iter().collect(), summary)
    }

    /// Sink that sleeps on every write and records how many writers overlap
    struct SlowSink {
        delay: Duration,
        lines: Mutex<Vec<String>>,
        gauge: TaskGauge,
    }

    impl ResultSink for SlowSink {
        fn record(&self, url: &str) -> anyhow::Result<()> {
            let _guard = self.gauge.enter();
            thread::sleep(self.delay);
            self.lines.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let result = Processor::new(config(ScanMode::Full, MatchMode::Contains, 0));
        assert!(matches!(result, Err(SiftError::InvalidConcurrency(0))));
    }

    #[test]
    fn test_contains_full_url() {
        let (hits, summary) = sift(
            config(ScanMode::Full, MatchMode::Contains, 4),
            &[
                "https://a.example/admin/index.php",
                "https://b.example/static/app.js",
                "https://c.example/wp-login.php?redirect=1",
            ],
            &["admin", "login"],
        );

        assert_eq!(hits.len(), 2);
        assert!(hits.contains("https://a.example/admin/index.php"));
        assert!(hits.contains("https://c.example/wp-login.php?redirect=1"));
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.matched, 2);
    }

    #[test]
    fn test_sink_receives_verbatim_url() {
        let mut cfg = config(ScanMode::Path, MatchMode::Contains, 2);
        cfg.case_policy = CasePolicy::LowercaseTarget;

        let (hits, _) = sift(cfg, &["HTTPS://Example.COM/Backup/DB.sql"], &["backup"]);
        assert!(hits.contains("HTTPS://Example.COM/Backup/DB.sql"));
    }

    #[test]
    fn test_equal_on_filename() {
        let mut cfg = config(ScanMode::Filename, MatchMode::Equal, 2);
        cfg.case_policy = CasePolicy::LowercaseTarget;

        let urls = ["http://EXAMPLE.com/A/B.txt?x=1", "http://example.com/A/B.txt.bak"];
        let (hits, _) = sift(cfg, &urls, &["b.txt"]);

        assert_eq!(hits.len(), 1);
        assert!(hits.contains("http://EXAMPLE.com/A/B.txt?x=1"));

        // Path target is not exactly equal to the pattern
        let mut cfg = config(ScanMode::Path, MatchMode::Equal, 2);
        cfg.case_policy = CasePolicy::LowercaseTarget;
        let (hits, _) = sift(cfg, &urls, &["b.txt"]);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_lowercase_both() {
        let mut cfg = config(ScanMode::RawQuery, MatchMode::Contains, 2);
        cfg.case_policy = CasePolicy::LowercaseBoth;

        let (hits, _) = sift(
            cfg,
            &["https://a.example/?Token=abc", "https://b.example/?page=2"],
            &["TOKEN="],
        );
        assert_eq!(hits.len(), 1);
        assert!(hits.contains("https://a.example/?Token=abc"));
    }

    #[test]
    fn test_regex_ignores_case_flags() {
        let cfg = ProcessorConfig {
            scan_mode: ScanMode::Path,
            match_mode: MatchMode::Regex,
            case_policy: CasePolicy::new(true, true, MatchMode::Regex),
            concurrency: 2,
            ..ProcessorConfig::default()
        };

        let (hits, _) = sift(
            cfg,
            &["https://a.example/ADMIN", "https://b.example/admin"],
            &["^/admin$"],
        );
        assert_eq!(hits.len(), 1);
        assert!(hits.contains("https://b.example/admin"));
    }

    #[test]
    fn test_short_target_is_skipped() {
        let (hits, summary) = sift(
            config(ScanMode::RawQuery, MatchMode::Contains, 2),
            &[
                "https://a.example/x?a",
                "https://b.example/x",
                "https://c.example/x?ab",
            ],
            &["a"],
        );

        assert_eq!(hits.len(), 1);
        assert!(hits.contains("https://c.example/x?ab"));
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn test_malformed_urls_do_not_stop_the_run() {
        let (hits, summary) = sift(
            config(ScanMode::Path, MatchMode::Contains, 3),
            &["http://[::1/admin", "https://a.example/admin", "https://exa mple.com/admin"],
            &["admin"],
        );

        assert_eq!(hits.len(), 1);
        assert_eq!(summary.malformed, 2);
        assert_eq!(summary.processed, 3);
    }

    #[test]
    fn test_malformed_regex_resilience() {
        let processor = Processor::new(config(ScanMode::Path, MatchMode::Regex, 4)).unwrap();
        let loaded = processor.prepare_patterns(strings(&[r"\.git/", "(?P<broken", r"\.env$"]));

        assert_eq!(loaded.rejected, 1);
        assert_eq!(loaded.patterns.len(), 2);

        let sink = MemorySink::new();
        let urls = strings(&[
            "https://a.example/.git/config",
            "https://b.example/app/.env",
            "https://c.example/index.html",
        ]);
        let summary = processor.run(&urls, &loaded.patterns, &sink).unwrap();

        assert_eq!(summary.matched, 2);
        let hits: HashSet<_> = sink.into_lines().into_iter().collect();
        assert!(hits.contains("https://a.example/.git/config"));
        assert!(hits.contains("https://b.example/app/.env"));
    }

    #[test]
    fn test_only_invalid_regexes_is_fatal() {
        let processor = Processor::new(config(ScanMode::Full, MatchMode::Regex, 1)).unwrap();
        let loaded = processor.prepare_patterns(strings(&["(", "[z-a]"]));
        assert!(loaded.patterns.is_empty());
        assert_eq!(loaded.rejected, 2);

        let urls = strings(&["https://a.example/"]);
        let result = processor.run(&urls, &loaded.patterns, &MemorySink::new());
        assert!(matches!(result, Err(SiftError::EmptyInput("patterns"))));
    }

    #[test]
    fn test_empty_urls_is_fatal() {
        let processor = Processor::new(config(ScanMode::Full, MatchMode::Contains, 1)).unwrap();
        let loaded = processor.prepare_patterns(strings(&["admin"]));
        let result = processor.run(&[], &loaded.patterns, &MemorySink::new());
        assert!(matches!(result, Err(SiftError::EmptyInput("URLs"))));
    }

    #[test]
    fn test_same_matches_regardless_of_concurrency() {
        let urls: Vec<String> = (0..10_000)
            .map(|i| {
                let ext = ["php", "js", "bak"][i % 3];
                format!("https://host{}.example/dir{}/file{}.{}", i % 97, i % 13, i, ext)
            })
            .collect();
        let sources = strings(&[".bak", "dir7/", "file42."]);

        let run_with = |concurrency| {
            let cfg = config(ScanMode::Full, MatchMode::Contains, concurrency);
            let processor = Processor::new(cfg).unwrap();
            let loaded = processor.prepare_patterns(sources.clone());
            let sink = MemorySink::new();
            let summary = processor.run(&urls, &loaded.patterns, &sink).unwrap();
            (sink.into_lines().into_iter().collect::<HashSet<_>>(), summary)
        };

        let (serial, serial_summary) = run_with(1);
        let (parallel, parallel_summary) = run_with(10);

        assert!(!serial.is_empty());
        assert_eq!(serial, parallel);
        assert_eq!(serial_summary.matched, parallel_summary.matched);
        assert_eq!(serial_summary.peak_in_flight, 1);
        assert!(parallel_summary.peak_in_flight <= 10);
        assert_eq!(parallel_summary.processed, 10_000);
    }

    #[test]
    fn test_concurrent_writers_bounded_by_limit() {
        let processor = Processor::new(config(ScanMode::Full, MatchMode::Contains, 3)).unwrap();
        let loaded = processor.prepare_patterns(strings(&["example"]));
        let urls: Vec<String> = (0..60).map(|i| format!("https://example.com/{}", i)).collect();

        let sink = SlowSink {
            delay: Duration::from_millis(2),
            lines: Mutex::new(Vec::new()),
            gauge: TaskGauge::default(),
        };
        let summary = processor.run(&urls, &loaded.patterns, &sink).unwrap();

        assert!(sink.gauge.peak() <= 3);
        assert!(summary.peak_in_flight <= 3);
        assert_eq!(sink.gauge.in_flight(), 0);
    }

    #[test]
    fn test_run_waits_for_every_task() {
        let processor = Processor::new(config(ScanMode::Path, MatchMode::Contains, 8)).unwrap();
        let loaded = processor.prepare_patterns(strings(&["/hit/"]));
        let urls: Vec<String> = (0..400)
            .map(|i| {
                if i % 2 == 0 {
                    format!("https://a.example/hit/{}", i)
                } else {
                    format!("https://a.example/miss/{}", i)
                }
            })
            .collect();

        let sink = SlowSink {
            delay: Duration::from_millis(3),
            lines: Mutex::new(Vec::new()),
            gauge: TaskGauge::default(),
        };
        let summary = processor.run(&urls, &loaded.patterns, &sink).unwrap();

        let lines = sink.lines.into_inner().unwrap();
        assert_eq!(lines.len(), 200);
        assert_eq!(summary.matched, 200);
        let expected: HashSet<_> = urls.iter().step_by(2).cloned().collect();
        assert_eq!(lines.into_iter().collect::<HashSet<_>>(), expected);
    }

    #[test]
    fn test_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let urls_path = temp_dir.path().join("urls.txt");
        let patterns_path = temp_dir.path().join("patterns.txt");
        let out_path = temp_dir.path().join("out").join("hits.txt");

        std::fs::write(
            &urls_path,
            concat!(
                "https://a.example/admin\nhttps://a.example/admin\n\n",
                "https://b.example/config.bak\nhttps://c.example/\n",
            ),
        )
        .unwrap();
        std::fs::write(&patterns_path, "admin\n.bak\nadmin\n").unwrap();

        let processor = Processor::new(config(ScanMode::Path, MatchMode::Contains, 4)).unwrap();
        let urls = processor.load_urls(&urls_path).unwrap();
        assert_eq!(urls.len(), 3);

        let loaded = processor.load_patterns(&patterns_path).unwrap();
        assert_eq!(loaded.patterns.len(), 2);
        assert_eq!(loaded.duplicates, 1);

        let sink = FileSink::open(&out_path).unwrap();
        processor.run(&urls, &loaded.patterns, &sink).unwrap();

        let content = std::fs::read_to_string(&out_path).unwrap();
        let mut lines: Vec<_> = content.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["https://a.example/admin", "https://b.example/config.bak"]);
    }

    #[test]
    fn test_empty_files_are_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let empty = temp_dir.path().join("empty.txt");
        std::fs::write(&empty, "\n\n").unwrap();

        let processor = Processor::new(ProcessorConfig::default()).unwrap();
        assert!(matches!(processor.load_urls(&empty), Err(SiftError::EmptyUrls(_))));
        assert!(matches!(processor.load_patterns(&empty), Err(SiftError::EmptyPatterns(_))));
    }
}
