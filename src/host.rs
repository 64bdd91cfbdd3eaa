//! Batch scanning host
//!
//! The engine scans one text at a time. The host turns paths into documents:
//! directory walking, the extension filter, the size gate, cancellation, parallel
//! dispatch and severity filtering. A file that cannot be read is logged and
//! counted, and the batch moves on.

use crate::diagnostic::{Diagnostic, Severity};
use crate::engine::Engine;
use crate::scanner::is_supported_file;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Documents above this size are not scanned
pub const DEFAULT_MAX_FILE_BYTES: u64 = 500 * 1024;

/// Directories never descended into
pub const SKIPPED_DIRS: [&str; 6] = ["node_modules", ".git", "target", "dist", "build", ".next"];

/// Why a file produced no report
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is {size} bytes, above the {limit} byte limit")]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("{0} is not a supported file type")]
    Unsupported(PathBuf),

    #[error("scan cancelled before {0}")]
    Cancelled(PathBuf),
}

impl ScanError {
    /// Skips are expected; everything else is a failure
    pub fn is_skip(&self) -> bool {
        !matches!(self, ScanError::Io { .. })
    }
}

/// Host settings
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Size gate in bytes
    pub max_file_bytes: u64,
    /// Worker threads (0 = one per CPU)
    pub jobs: usize,
    /// Findings below this severity are dropped
    pub min_severity: Severity,
    /// Codes dropped from every report
    pub disabled_rules: Vec<String>,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            jobs: 0,
            min_severity: Severity::Info,
            disabled_rules: Vec::new(),
        }
    }
}

impl HostOptions {
    pub fn is_rule_disabled(&self, code: &str) -> bool {
        self.disabled_rules
            .iter()
            .any(|c| c.eq_ignore_ascii_case(code))
    }

    fn keeps(&self, diagnostic: &Diagnostic) -> bool {
        diagnostic.severity >= self.min_severity && !self.is_rule_disabled(&diagnostic.code)
    }
}

/// Findings for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of a batch scan
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Reports of scanned files, in input order
    pub results: Vec<FileReport>,
    pub files_scanned: usize,
    /// Files skipped by the size gate, the extension filter or cancellation
    pub files_skipped: usize,
    /// Files that could not be read
    pub files_failed: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub duration: Duration,
}

impl ScanReport {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }

    /// No errors or warnings
    pub fn is_clean(&self) -> bool {
        self.error_count == 0 && self.warning_count == 0
    }

    /// Exit code (0 = clean, 1 = warnings, 2 = errors)
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() {
            2
        } else if self.has_warnings() {
            1
        } else {
            0
        }
    }

    pub fn diagnostic_count(&self) -> usize {
        self.results.iter().map(|r| r.diagnostics.len()).sum()
    }

    /// Add one file's findings
    pub fn record(&mut self, report: FileReport) {
        for diag in &report.diagnostics {
            match diag.severity {
                Severity::Error => self.error_count += 1,
                Severity::Warning => self.warning_count += 1,
                Severity::Info => self.info_count += 1,
            }
        }
        self.files_scanned += 1;
        self.results.push(report);
    }
}

/// Runs the engine over files on disk
pub struct Host {
    engine: Engine,
    options: HostOptions,
    cancel: Arc<AtomicBool>,
}

impl Host {
    pub fn new(engine: Engine, options: HostOptions) -> Self {
        Self {
            engine,
            options,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a cancellation flag; files not yet started when it is set are skipped
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    /// Expand paths into the supported files below them, sorted per directory
    pub fn collect_files(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in paths {
            if path.is_file() {
                if is_supported_file(&path.to_string_lossy()) {
                    files.push(path.clone());
                } else {
                    log::debug!("Ignoring unsupported file {}", path.display());
                }
                continue;
            }

            for entry in WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
            {
                match entry {
                    Ok(entry) => {
                        if entry.file_type().is_file()
                            && is_supported_file(&entry.path().to_string_lossy())
                        {
                            files.push(entry.into_path());
                        }
                    }
                    Err(e) => log::warn!("Skipping unreadable entry: {}", e),
                }
            }
        }

        files
    }

    /// Scan one file through the size gate and the severity filter
    pub fn scan_path(&self, path: &Path) -> Result<FileReport, ScanError> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(ScanError::Cancelled(path.to_path_buf()));
        }

        let file_name = path.to_string_lossy();
        if !is_supported_file(&file_name) {
            return Err(ScanError::Unsupported(path.to_path_buf()));
        }

        let io_error = |source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        };

        let size = std::fs::metadata(path).map_err(io_error)?.len();
        if size > self.options.max_file_bytes {
            return Err(ScanError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.options.max_file_bytes,
            });
        }

        let text = std::fs::read_to_string(path).map_err(io_error)?;
        let diagnostics = self
            .engine
            .scan(&text, &file_name)
            .into_iter()
            .filter(|d| self.options.keeps(d))
            .collect();

        Ok(FileReport {
            path: path.to_path_buf(),
            diagnostics,
        })
    }

    /// Scan a list of files in parallel
    pub fn scan_files(&self, files: &[PathBuf]) -> ScanReport {
        let start = Instant::now();

        let jobs = if self.options.jobs > 0 {
            self.options.jobs
        } else {
            num_cpus::get()
        };

        let outcomes: Vec<Result<FileReport, ScanError>> =
            match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
                Ok(pool) => pool.install(|| files.par_iter().map(|f| self.scan_path(f)).collect()),
                Err(e) => {
                    log::warn!("Falling back to sequential scan: {}", e);
                    files.iter().map(|f| self.scan_path(f)).collect()
                }
            };

        let mut report = ScanReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(file_report) => report.record(file_report),
                Err(e) if e.is_skip() => {
                    log::warn!("Skipped: {}", e);
                    report.files_skipped += 1;
                }
                Err(e) => {
                    log::warn!("{}", e);
                    report.files_failed += 1;
                }
            }
        }

        report.duration = start.elapsed();
        log::debug!(
            "Scanned {} files ({} skipped, {} failed) in {:?}",
            report.files_scanned,
            report.files_skipped,
            report.files_failed,
            report.duration
        );
        report
    }

    /// Collect and scan
    pub fn scan_paths(&self, paths: &[PathBuf]) -> ScanReport {
        let files = self.collect_files(paths);
        self.scan_files(&files)
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;
    use std::fs;
    use tempfile::TempDir;

    fn host(options: HostOptions) -> Host {
        Host::new(Engine::new(Policy::default()), options)
    }

    #[test]
    fn test_collect_files_skips_vendor_dirs() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::create_dir_all(temp.path().join("node_modules/pkg")).unwrap();
        fs::write(temp.path().join("index.html"), "<p></p>").unwrap();
        fs::write(temp.path().join("src/App.tsx"), "<div />").unwrap();
        fs::write(temp.path().join("src/style.css"), "p {}").unwrap();
        fs::write(temp.path().join("node_modules/pkg/index.js"), "").unwrap();

        let files = host(HostOptions::default()).collect_files(&[temp.path().to_path_buf()]);
        let names: Vec<_> = files
            .iter()
            .map(|f| f.strip_prefix(temp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("index.html"), PathBuf::from("src/App.tsx")]);
    }

    #[test]
    fn test_size_gate() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.html");
        fs::write(&path, "x".repeat(2048)).unwrap();

        let options = HostOptions {
            max_file_bytes: 1024,
            ..HostOptions::default()
        };
        let err = host(options).scan_path(&path).unwrap_err();
        assert!(matches!(err, ScanError::TooLarge { size: 2048, limit: 1024, .. }));
        assert!(err.is_skip());
    }

    #[test]
    fn test_missing_file_is_isolated() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("index.html");
        fs::write(&good, "<head><title>Short</title></head>").unwrap();
        let missing = temp.path().join("missing.html");

        let report = host(HostOptions::default()).scan_files(&[missing, good.clone()]);
        assert_eq!(report.files_failed, 1);
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.results[0].path, good);
        assert!(report.has_warnings());
        assert_eq!(
            report.diagnostic_count(),
            report.error_count + report.warning_count + report.info_count
        );
    }

    #[test]
    fn test_min_severity_and_disabled_codes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.html");
        fs::write(&path, "<head><title>Short</title></head><img src=a.png>").unwrap();

        let options = HostOptions {
            min_severity: Severity::Warning,
            disabled_rules: vec!["perf_img_missing_alt".to_string()],
            ..HostOptions::default()
        };
        let report = host(options).scan_files(&[path]);
        let codes: Vec<_> = report.results[0]
            .diagnostics
            .iter()
            .map(|d| d.code.as_str())
            .collect();
        assert!(codes.contains(&"SEO_TITLE_LENGTH"));
        assert!(!codes.contains(&"PERF_IMG_MISSING_ALT"));
        assert!(!codes.contains(&"PERF_IMG_MISSING_LOADING"));
        assert_eq!(report.info_count, 0);
    }

    #[test]
    fn test_cancelled_scan_skips_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.html");
        fs::write(&path, "<p></p>").unwrap();

        let cancel = Arc::new(AtomicBool::new(true));
        let host = host(HostOptions::default()).with_cancel_flag(cancel);
        let report = host.scan_files(&[path]);
        assert_eq!(report.files_scanned, 0);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_scan_paths_walks_directories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("pages")).unwrap();
        fs::write(temp.path().join("pages/a.html"), "<p></p>").unwrap();
        fs::write(temp.path().join("pages/b.vue"), "<template><p /></template>").unwrap();
        fs::write(temp.path().join("notes.txt"), "<p></p>").unwrap();

        let options = HostOptions {
            disabled_rules: vec!["SEO_CANONICAL_MISSING".to_string()],
            ..HostOptions::default()
        };
        let host = host(options);
        assert!(host.engine().policy().require_canonical);
        assert_eq!(host.options().max_file_bytes, DEFAULT_MAX_FILE_BYTES);

        let report = host.scan_paths(&[temp.path().to_path_buf()]);
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.diagnostic_count(), 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_exit_code() {
        let mut report = ScanReport::default();
        assert!(report.is_clean());
        assert_eq!(report.exit_code(), 0);
        report.warning_count = 1;
        assert!(!report.is_clean());
        assert!(!report.has_errors());
        assert_eq!(report.exit_code(), 1);
        report.error_count = 1;
        assert!(report.has_errors());
        assert_eq!(report.exit_code(), 2);
    }
}
