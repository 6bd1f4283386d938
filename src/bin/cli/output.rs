//! Output formatting for CLI operations.

use byte_unit::Byte;
use serde_json::json;
use tarsplitter::format::ArchiveLayout;
use tarsplitter::{ArchiveResult, SplitResult};

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats the parts produced by a split
    fn format_split_result(&self, result: &SplitResult) -> String;

    /// Formats the outcome of an archive run
    fn format_archive_result(&self, result: &ArchiveResult) -> String;

    /// Formats the structure check of a finished archive
    fn format_layout(&self, layout: &ArchiveLayout) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_split_result(&self, result: &SplitResult) -> String {
        let mut output = String::new();

        output.push_str(&format!("{:>6} {:>10} {:>12} {}\n", "Part", "Entries", "Size", "Path"));
        output.push_str(&"-".repeat(70));
        output.push('\n');

        for part in &result.parts {
            output.push_str(&format!(
                "{:>6} {:>10} {:>12} {}\n",
                part.index,
                part.entries,
                humanize_bytes(part.bytes),
                part.path.display()
            ));
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "{} parts, {} entries, {} total (threshold {})\n",
            result.parts.len(),
            result.entries,
            humanize_bytes(result.total_bytes()),
            humanize_bytes(result.threshold)
        ));

        output
    }

    fn format_archive_result(&self, result: &ArchiveResult) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Archived {} entries into {} ({})\n",
            result.entries(),
            result.output.display(),
            humanize_bytes(result.bytes_written)
        ));
        let sizes: Vec<String> = result
            .fragments
            .iter()
            .map(|f| f.entries.to_string())
            .collect();
        output.push_str(&format!(
            "  Workers:        {} ({} entries each)\n",
            result.fragments.len(),
            sizes.join("/")
        ));
        if result.skipped() > 0 {
            output.push_str(&format!("  Skipped:        {}\n", result.skipped()));
        }

        output
    }

    fn format_layout(&self, layout: &ArchiveLayout) -> String {
        if layout.has_single_trailer() {
            format!(
                "OK - {} entries, data ends at byte {}, single end-of-archive trailer\n",
                layout.entries, layout.data_end
            )
        } else {
            let mut output = String::from("Archive structure problems:\n");
            if !layout.is_terminated() {
                output.push_str("  missing end-of-archive trailer\n");
            }
            if layout.embedded_trailers > 0 {
                output.push_str(&format!(
                    "  {} embedded trailers before the last entry\n",
                    layout.embedded_trailers
                ));
            }
            output
        }
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_split_result(&self, result: &SplitResult) -> String {
        let obj = json!({
            "threshold": result.threshold,
            "entries": result.entries,
            "total_bytes": result.total_bytes(),
            "parts": result.parts.iter().map(|p| json!({
                "index": p.index,
                "path": p.path.display().to_string(),
                "entries": p.entries,
                "bytes": p.bytes,
            })).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_archive_result(&self, result: &ArchiveResult) -> String {
        let obj = json!({
            "output": result.output.display().to_string(),
            "entries": result.entries(),
            "skipped": result.skipped(),
            "bytes_written": result.bytes_written,
            "fragments": result.fragments.iter().map(|f| json!({
                "index": f.index,
                "entries": f.entries,
                "skipped": f.skipped,
                "bytes": f.bytes,
            })).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_layout(&self, layout: &ArchiveLayout) -> String {
        let obj = json!({
            "valid": layout.has_single_trailer(),
            "entries": layout.entries,
            "extension_headers": layout.extension_headers,
            "data_end": layout.data_end,
            "embedded_trailers": layout.embedded_trailers,
            "trailing_zero_bytes": layout.trailing_zero_bytes,
            "total_len": layout.total_len,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Converts bytes to a human-readable string in binary units
pub fn humanize_bytes(bytes: u64) -> String {
    Byte::from_bytes(u128::from(bytes))
        .get_appropriate_unit(true)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_bytes() {
        assert_eq!(humanize_bytes(0), "0 B");
        assert_eq!(humanize_bytes(1024), "1024 B");
        assert_eq!(humanize_bytes(1024 + 512), "1.50 KiB");
        assert_eq!(humanize_bytes((1 << 20) + 1), "1.00 MiB");
        assert_eq!(humanize_bytes((1 << 30) + 1), "1.00 GiB");
    }
}
