//! Memory compression.
//!
//! Memory is a `|`-delimited list of fragments. Compression keeps only the
//! decision-relevant tail: error records are dropped, only the most recent
//! raw fragments are considered, and of those only fragments carrying a
//! signal marker survive.
//!
//! The function is pure and idempotent: `compress(compress(m)) == compress(m)`.

/// Fragment delimiter.
pub const DELIMITER: &str = " | ";

/// Substrings that mark a fragment as worth keeping.
pub const SIGNAL_MARKERS: &[&str] = &[
    "proj_", "emp_", "cust_", "→", "salary", "logged", "updated", "✓",
];

/// Fragments containing this are error records.
const ERROR_MARKER: &str = "ERR";

/// Raw-fragment window and signal cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressorLimits {
    pub window: usize,
    pub keep: usize,
}

impl Default for CompressorLimits {
    fn default() -> Self {
        Self {
            window: 20,
            keep: 12,
        }
    }
}

fn is_signal(fragment: &str) -> bool {
    SIGNAL_MARKERS.iter().any(|m| fragment.contains(m))
}

/// Compress with the default window (20) and cap (12).
pub fn compress(memory: &str) -> String {
    compress_with(memory, CompressorLimits::default())
}

pub fn compress_with(memory: &str, limits: CompressorLimits) -> String {
    let fragments: Vec<&str> = memory
        .split('|')
        .map(str::trim)
        .filter(|f| !f.is_empty() && !f.contains(ERROR_MARKER))
        .collect();

    let window_start = fragments.len().saturating_sub(limits.window);
    let signal: Vec<&str> = fragments[window_start..]
        .iter()
        .copied()
        .filter(|f| is_signal(f))
        .collect();

    let keep_start = signal.len().saturating_sub(limits.keep);
    signal[keep_start..].join(DELIMITER)
}

/// Append a fragment and compress the result.
pub fn append(memory: &str, fragment: &str, limits: CompressorLimits) -> String {
    if memory.is_empty() {
        compress_with(fragment, limits)
    } else {
        compress_with(&format!("{memory}{DELIMITER}{fragment}"), limits)
    }
}
