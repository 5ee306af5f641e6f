//! Configuration loading and parsing for on-demand lists.
//!
//! Parses `ondemand.toml` (or an override path provided by the binary)
//! extracting the `[list]` table. Every field has a default so an absent file,
//! an absent table, or a partially filled table all yield a usable config.
//!
//! The raw parsed values are retained in `Config::file`; `Config::effective`
//! returns the validated copy the engine actually runs with (zero page sizes
//! and degenerate fallback row heights are clamped and logged on target
//! `config`). Unknown fields are ignored to allow forward evolution.

use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

/// Row height assumed for spacer sizing until a real measurement exists.
pub const DEFAULT_ROW_HEIGHT: f64 = 20.0;
/// Delay applied to the paging method when none is configured.
pub const DEFAULT_PAGING_DELAY_MS: u64 = 15;

/// How raw scroll signals are coalesced before the window is recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingMethod {
    /// Wait until scrolling pauses for `paging_delay_ms` before paging.
    #[default]
    Debounce,
    /// Page at most once per `paging_delay_ms`, always with a trailing call.
    #[serde(alias = "throttleDelayed")]
    ThrottleDelayed,
}

/// Comparator used to decide whether the rendered window already covers the
/// rows needed for the current scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageRule {
    /// `current_start < needed_start && current_end > needed_end`: the window
    /// must extend past the needed range on both sides.
    #[default]
    Strict,
    /// `current_start <= needed_start && current_end >= needed_end`.
    Inclusive,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ListConfig {
    /// Number of rows requested at one time.
    #[serde(default = "ListConfig::default_rows_per_page")]
    pub rows_per_page: usize,
    /// Rows kept ready on each side of the viewport so local scrolling does
    /// not expose unbuilt rows.
    #[serde(default = "ListConfig::default_buffer_rows")]
    pub buffer_rows: usize,
    #[serde(default)]
    pub paging_method: PagingMethod,
    #[serde(default = "ListConfig::default_paging_delay_ms")]
    pub paging_delay_ms: u64,
    /// Whether `refresh` preserves the scroll offset (overridable per call).
    #[serde(default)]
    pub keep_scroll_position: bool,
    #[serde(default)]
    pub coverage: CoverageRule,
    #[serde(default = "ListConfig::default_row_height")]
    pub default_row_height: f64,
    /// Upper bound for a single range fetch. `None` waits indefinitely.
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            rows_per_page: Self::default_rows_per_page(),
            buffer_rows: Self::default_buffer_rows(),
            paging_method: PagingMethod::default(),
            paging_delay_ms: Self::default_paging_delay_ms(),
            keep_scroll_position: false,
            coverage: CoverageRule::default(),
            default_row_height: Self::default_row_height(),
            fetch_timeout_ms: None,
        }
    }
}

impl ListConfig {
    const fn default_rows_per_page() -> usize {
        25
    }
    const fn default_buffer_rows() -> usize {
        10
    }
    const fn default_paging_delay_ms() -> u64 {
        DEFAULT_PAGING_DELAY_MS
    }
    const fn default_row_height() -> f64 {
        DEFAULT_ROW_HEIGHT
    }

    pub fn paging_delay(&self) -> Duration {
        Duration::from_millis(self.paging_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// Return a copy with out-of-range values clamped. Each clamp is logged.
    pub fn validated(&self) -> ListConfig {
        let mut out = self.clone();
        if out.rows_per_page == 0 {
            info!(
                target: "config",
                raw = self.rows_per_page,
                clamped = 1usize,
                "rows_per_page_clamped"
            );
            out.rows_per_page = 1;
        }
        if !out.default_row_height.is_finite() || out.default_row_height <= 0.0 {
            info!(
                target: "config",
                raw = self.default_row_height,
                clamped = DEFAULT_ROW_HEIGHT,
                "default_row_height_clamped"
            );
            out.default_row_height = DEFAULT_ROW_HEIGHT;
        }
        out
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub list: ListConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub file: ConfigFile,    // parsed (or default) data
}

impl Config {
    /// Validated list settings ready to hand to an engine instance.
    pub fn effective(&self) -> ListConfig {
        self.file.list.validated()
    }
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("ondemand.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("ondemand").join("ondemand.toml");
    }
    PathBuf::from("ondemand.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => Ok(Config {
            raw: Some(content),
            file,
        }),
        Err(e) => {
            // Fall back to defaults rather than refusing to start.
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), body).unwrap();
        tmp
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert!(cfg.raw.is_none());
        assert_eq!(cfg.file.list, ListConfig::default());
        let list = cfg.effective();
        assert_eq!(list.rows_per_page, 25);
        assert_eq!(list.buffer_rows, 10);
        assert_eq!(list.paging_method, PagingMethod::Debounce);
        assert_eq!(list.paging_delay_ms, DEFAULT_PAGING_DELAY_MS);
        assert!(!list.keep_scroll_position);
        assert_eq!(list.coverage, CoverageRule::Strict);
        assert_eq!(list.fetch_timeout(), None);
    }

    #[test]
    fn parses_list_table() {
        let tmp = write_config(
            "[list]\nrows_per_page = 50\nbuffer_rows = 4\npaging_method = \"throttle_delayed\"\n\
             paging_delay_ms = 40\nkeep_scroll_position = true\ncoverage = \"inclusive\"\n\
             fetch_timeout_ms = 2000\n",
        );
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let list = cfg.effective();
        assert_eq!(list.rows_per_page, 50);
        assert_eq!(list.buffer_rows, 4);
        assert_eq!(list.paging_method, PagingMethod::ThrottleDelayed);
        assert_eq!(list.paging_delay(), Duration::from_millis(40));
        assert!(list.keep_scroll_position);
        assert_eq!(list.coverage, CoverageRule::Inclusive);
        assert_eq!(list.fetch_timeout(), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn accepts_camel_case_throttle_alias() {
        let tmp = write_config("[list]\npaging_method = \"throttleDelayed\"\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.list.paging_method, PagingMethod::ThrottleDelayed);
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let tmp = write_config("[list]\nbuffer_rows = 2\nunknown_field = 1\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.list.buffer_rows, 2);
        assert_eq!(cfg.file.list.rows_per_page, 25);
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let tmp = write_config("[list]\nrows_per_page = \"many\"\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(cfg.raw.is_none());
        assert_eq!(cfg.file.list.rows_per_page, 25);
    }

    #[test]
    fn zero_rows_per_page_and_bad_row_height_are_clamped() {
        let tmp = write_config("[list]\nrows_per_page = 0\ndefault_row_height = -3.0\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.list.rows_per_page, 0, "raw value retained");
        let list = cfg.effective();
        assert_eq!(list.rows_per_page, 1);
        assert_eq!(list.default_row_height, DEFAULT_ROW_HEIGHT);
    }

    #[test]
    fn clamp_logging_uses_config_target() {
        let tmp = write_config("[list]\nrows_per_page = 0\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let list = with_default(subscriber, || cfg.effective());

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("rows_per_page_clamped"));
        assert_eq!(list.rows_per_page, 1);
    }
}
