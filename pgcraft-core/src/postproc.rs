//! Post-phase formatter pipeline.
//!
//! Each emitted file runs through a pluggable chain of processors: first
//! import resolution, which splices the `use` lines the rendered body
//! needs into the header, then a light style pass. Failures are reported
//! with the destination file name attached.

/// One stage of the post-processing pipeline.
pub trait PostProcessor {
    fn name(&self) -> &'static str;

    /// Transform the file content; errors are plain messages, the
    /// generator attaches file and formatter context.
    fn process(&self, dest: &str, src: String) -> Result<String, String>;
}

/// The default pipeline: import resolution then style normalization.
pub fn default_pipeline() -> Vec<Box<dyn PostProcessor>> {
    vec![Box::new(ImportResolver), Box::new(StyleFormatter)]
}

/// Known external types and the imports they require.
const IMPORT_TABLE: &[(&str, &str)] = &[
    ("DateTime<Utc>", "use chrono::DateTime;"),
    ("DateTime<Utc>", "use chrono::Utc;"),
    ("DateTime::<Utc>", "use chrono::DateTime;"),
    ("DateTime::<Utc>", "use chrono::Utc;"),
    ("NaiveDate", "use chrono::NaiveDate;"),
    ("NaiveDateTime", "use chrono::NaiveDateTime;"),
    ("NaiveTime", "use chrono::NaiveTime;"),
    ("HashMap<", "use std::collections::HashMap;"),
    (".try_get(", "use sqlx::Row;"),
    ("NullBool", "use pgcraft_row::NullBool;"),
    ("NullText", "use pgcraft_row::NullText;"),
    ("NullInt2", "use pgcraft_row::NullInt2;"),
    ("NullInt4", "use pgcraft_row::NullInt4;"),
    ("NullInt8", "use pgcraft_row::NullInt8;"),
    ("NullByte", "use pgcraft_row::NullByte;"),
    ("NullFloat4", "use pgcraft_row::NullFloat4;"),
    ("NullFloat8", "use pgcraft_row::NullFloat8;"),
    ("NullDate", "use pgcraft_row::NullDate;"),
    ("NullTime", "use pgcraft_row::NullTime;"),
    ("NullTimestamp", "use pgcraft_row::NullTimestamp;"),
    ("NullTimestamptz", "use pgcraft_row::NullTimestamptz;"),
    ("NullUuid", "use pgcraft_row::NullUuid;"),
];

/// Splices required `use` lines into the header block.
pub struct ImportResolver;

impl PostProcessor for ImportResolver {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn process(&self, _dest: &str, src: String) -> Result<String, String> {
        let mut needed: Vec<&str> = Vec::new();
        for &(token, import) in IMPORT_TABLE {
            if !contains_token(&src, token) {
                continue;
            }
            if src.contains(import) || needed.contains(&import) {
                continue;
            }
            needed.push(import);
        }
        if needed.is_empty() {
            return Ok(src);
        }
        needed.sort_unstable();

        let lines: Vec<&str> = src.lines().collect();
        let mut insert_at = 0;
        for (i, line) in lines.iter().enumerate() {
            let header = line.is_empty()
                || line.starts_with("//")
                || line.starts_with("#![")
                || line.starts_with("use ");
            if !header {
                break;
            }
            insert_at = i + 1;
        }

        let mut out = Vec::with_capacity(lines.len() + needed.len() + 1);
        out.extend_from_slice(&lines[..insert_at]);
        out.extend_from_slice(&needed);
        out.push("");
        out.extend_from_slice(&lines[insert_at..]);
        Ok(out.join("\n"))
    }
}

/// Matches a token with identifier boundaries on each side, so
/// `NaiveDate` does not fire inside `NaiveDateTime`.
fn contains_token(src: &str, token: &str) -> bool {
    let ident_token = token.chars().all(|c| c.is_alphanumeric() || c == '_');
    if !ident_token {
        return src.contains(token);
    }
    let bytes = src.as_bytes();
    let mut from = 0;
    while let Some(pos) = src[from..].find(token) {
        let start = from + pos;
        let end = start + token.len();
        let before_ok = start == 0 || !is_ident_byte(bytes[start - 1]);
        let after_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        if before_ok && after_ok {
            return true;
        }
        from = start + 1;
    }
    false
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Normalizes whitespace: no trailing spaces, no doubled blank lines, one
/// trailing newline.
pub struct StyleFormatter;

impl PostProcessor for StyleFormatter {
    fn name(&self) -> &'static str {
        "style"
    }

    fn process(&self, _dest: &str, src: String) -> Result<String, String> {
        let mut out = String::with_capacity(src.len());
        let mut blank_run = 0usize;
        for line in src.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                blank_run += 1;
                if blank_run > 1 {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            out.push_str(line);
            out.push('\n');
        }
        while out.ends_with("\n\n") {
            out.pop();
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_resolution() {
        let src = "// Code generated by pgcraft. DO NOT EDIT.\n\
                   #![allow(unused_imports, dead_code, clippy::all)]\n\
                   \n\
                   use super::*;\n\
                   \n\
                   pub struct X {\n    pub at: NaiveDate,\n    pub name: NullText,\n}\n";
        let out = ImportResolver.process("x.gen.rs", src.to_owned()).unwrap();
        assert!(out.contains("use chrono::NaiveDate;"));
        assert!(out.contains("use pgcraft_row::NullText;"));
        // Inserted into the header, before the struct.
        let imports_at = out.find("use chrono::NaiveDate;").unwrap();
        assert!(imports_at < out.find("pub struct X").unwrap());
    }

    #[test]
    fn test_token_boundaries() {
        assert!(contains_token("a: NaiveDate,", "NaiveDate"));
        assert!(!contains_token("a: NaiveDateTime,", "NaiveDate"));
        assert!(contains_token("a: NaiveDateTime,", "NaiveDateTime"));
        assert!(!contains_token("NullTimestamptz", "NullTimestamp"));
    }

    #[test]
    fn test_no_duplicate_imports() {
        let src = "use chrono::NaiveDate;\n\npub a: NaiveDate\n";
        let out = ImportResolver.process("x.gen.rs", src.to_owned()).unwrap();
        assert_eq!(out.matches("use chrono::NaiveDate;").count(), 1);
    }

    #[test]
    fn test_style_pass() {
        let src = "line one   \n\n\n\nline two\n\n\n";
        let out = StyleFormatter.process("x.gen.rs", src.to_owned()).unwrap();
        assert_eq!(out, "line one\n\nline two\n");
    }
}
