// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Desired settings from a `key=value` property file.
//!
//! Parsing is lenient: comment lines, blank lines and lines without `=` are
//! skipped without an error. Values are trimmed, except `log_line_prefix`
//! whose spaces are significant to the engine.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

/// Key whose value keeps its whitespace and escape marker.
pub const LOG_LINE_PREFIX: &str = "log_line_prefix";

/// Desired parameter values, ordered by name.
pub type DesiredSettings = BTreeMap<String, String>;

/// Parse property lines into desired settings. Later keys overwrite earlier ones.
pub fn parse<'a, I>(lines: I) -> DesiredSettings
where
    I: IntoIterator<Item = &'a str>,
{
    let mut result = DesiredSettings::new();

    for line in lines {
        if line.trim_start().starts_with('#') {
            continue;
        }
        let Some((raw_name, raw_value)) = line.split_once('=') else {
            continue;
        };

        let name = raw_name.trim();
        let value = if name == LOG_LINE_PREFIX {
            normalize_log_line_prefix(raw_value)
        } else {
            raw_value.trim().to_string()
        };

        result.insert(name.to_string(), value);
    }

    result
}

/// Read and parse a property file.
pub fn read_property_file(path: impl AsRef<Path>) -> Result<DesiredSettings> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let settings = parse(content.lines());
    debug!(path = %path.display(), count = settings.len(), "Read property file");
    Ok(settings)
}

fn normalize_log_line_prefix(raw: &str) -> String {
    let value = raw.trim_end_matches('\n');
    if raw.starts_with('%') {
        format!("\\{}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_key_value_lines() {
        let settings = parse("max_connections=200\n#comment\nwork_mem=64MB".lines());

        assert_eq!(settings.len(), 2);
        assert_eq!(settings["max_connections"], "200");
        assert_eq!(settings["work_mem"], "64MB");
    }

    #[test]
    fn test_parse_trims_keys_and_values() {
        let settings = parse(["  shared_buffers =  1GB  \t"]);
        assert_eq!(settings["shared_buffers"], "1GB");
    }

    #[test]
    fn test_parse_splits_on_first_equals() {
        let settings = parse(["search_path = a=b"]);
        assert_eq!(settings["search_path"], "a=b");
    }

    #[test]
    fn test_parse_skips_comments_and_malformed_lines() {
        let settings = parse([
            "# max_connections=1",
            "    # work_mem=1MB",
            "",
            "not a setting",
            "port=5432",
        ]);

        assert_eq!(settings.len(), 1);
        assert_eq!(settings["port"], "5432");
    }

    #[test]
    fn test_parse_later_duplicate_wins() {
        let settings = parse(["work_mem=4MB", "work_mem=8MB"]);
        assert_eq!(settings["work_mem"], "8MB");
    }

    #[test]
    fn test_parse_empty_value() {
        let settings = parse(["archive_command="]);
        assert_eq!(settings["archive_command"], "");
    }

    #[test]
    fn test_log_line_prefix_gets_escape_backslash() {
        let settings = parse(["log_line_prefix=%t [%p]: "]);
        assert_eq!(settings[LOG_LINE_PREFIX], "\\%t [%p]: ");
    }

    #[test]
    fn test_log_line_prefix_strips_only_trailing_newline() {
        let settings = parse(["log_line_prefix= [%p] %m \n"]);
        assert_eq!(settings[LOG_LINE_PREFIX], " [%p] %m ");
    }

    #[test]
    fn test_log_line_prefix_from_crlf_file_keeps_trailing_space() {
        let settings = parse("log_line_prefix=%m \r\nport=5432\r\n".lines());

        assert_eq!(settings[LOG_LINE_PREFIX], "\\%m ");
        assert_eq!(settings["port"], "5432");
    }

    #[test]
    fn test_log_line_prefix_with_existing_backslash_is_kept() {
        let settings = parse(["log_line_prefix=\\%m "]);
        assert_eq!(settings[LOG_LINE_PREFIX], "\\%m ");
    }

    #[test]
    fn test_read_property_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_connections=200").unwrap();
        writeln!(file, "  # commented=out").unwrap();
        writeln!(file, "log_line_prefix=%m [%p] ").unwrap();

        let settings = read_property_file(file.path()).unwrap();

        assert_eq!(settings.len(), 2);
        assert_eq!(settings["max_connections"], "200");
        assert_eq!(settings[LOG_LINE_PREFIX], "\\%m [%p] ");
    }

    #[test]
    fn test_read_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_property_file(dir.path().join("missing.conf")).is_err());
    }
}
