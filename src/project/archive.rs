//! In-memory zip assembly for recovered project files.
//!
//! One malformed path in a batch must not discard the good files around it,
//! so every entry is validated and written in isolation: failures land in
//! the error list and the loop moves on.

use std::io::{Cursor, Write};

use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::parser::ParsedFile;

/// Terminal output of the materialization pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildResult {
    pub zip_base64: String,
    pub success: bool,
    pub errors: Vec<String>,
}

impl BuildResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            zip_base64: String::new(),
            success: false,
            errors: vec![message.into()],
        }
    }
}

/// Packages the recovered files into a base64-encoded zip.
///
/// Success means at least one entry was written; per-entry failures are
/// reported alongside. An empty input list is a contract violation and
/// produces no archive at all.
pub fn create_zip_base64(files: &[ParsedFile]) -> BuildResult {
    if files.is_empty() {
        return BuildResult::failure("file list must not be empty");
    }

    let mut errors = Vec::new();
    let mut written = 0usize;

    let bytes = match write_entries(files, &mut errors, &mut written) {
        Ok(bytes) => bytes,
        Err(e) => return BuildResult::failure(format!("failed to assemble archive: {}", e)),
    };

    if written == 0 {
        return BuildResult {
            zip_base64: String::new(),
            success: false,
            errors,
        };
    }

    BuildResult {
        zip_base64: BASE64.encode(bytes),
        success: true,
        errors,
    }
}

fn write_entries(
    files: &[ParsedFile],
    errors: &mut Vec<String>,
    written: &mut usize,
) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        if let Err(reason) = validate_entry_path(&file.path) {
            errors.push(format!("skipping '{}': {}", file.path, reason));
            continue;
        }

        match add_entry(&mut writer, &file.path, &file.content, options) {
            Ok(()) => *written += 1,
            Err(e) => errors.push(format!("failed to write '{}': {}", file.path, e)),
        }
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

fn add_entry(
    writer: &mut ZipWriter<Cursor<Vec<u8>>>,
    path: &str,
    content: &str,
    options: SimpleFileOptions,
) -> Result<()> {
    writer.start_file(path, options)?;
    // UTF-8 without a byte-order mark.
    writer.write_all(content.as_bytes())?;
    Ok(())
}

/// Rejects entry names that cannot become sane files on extraction: empty
/// names, NUL bytes, parent-directory escapes, and directory-shaped names.
fn validate_entry_path(path: &str) -> Result<(), &'static str> {
    if path.is_empty() {
        return Err("entry path is empty");
    }
    if path.contains('\0') {
        return Err("entry path contains a NUL byte");
    }
    if path.ends_with('/') {
        return Err("entry path names a directory");
    }
    if path.split('/').any(|component| component == "..") {
        return Err("entry path escapes the archive root");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn file(path: &str, content: &str) -> ParsedFile {
        ParsedFile {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    fn read_archive(result: &BuildResult) -> zip::ZipArchive<Cursor<Vec<u8>>> {
        let bytes = BASE64.decode(&result.zip_base64).expect("valid base64");
        zip::ZipArchive::new(Cursor::new(bytes)).expect("valid zip")
    }

    #[test]
    fn empty_input_is_a_contract_violation() {
        let result = create_zip_base64(&[]);

        assert!(!result.success);
        assert!(result.zip_base64.is_empty());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn round_trip_preserves_names_and_bytes() {
        let files = vec![
            file("src/main.rs", "fn main() {}\n"),
            file("README.md", "# demo\nunicode: héllo\n"),
        ];
        let result = create_zip_base64(&files);

        assert!(result.success);
        assert!(result.errors.is_empty());

        let mut archive = read_archive(&result);
        assert_eq!(archive.len(), 2);

        for expected in &files {
            let mut entry = archive.by_name(&expected.path).expect("entry present");
            let mut contents = String::new();
            entry.read_to_string(&mut contents).unwrap();
            assert_eq!(contents, expected.content);
        }
    }

    #[test]
    fn bad_entry_is_isolated_from_the_batch() {
        let files = vec![
            file("good/a.txt", "a"),
            file("../escape.txt", "bad"),
            file("good/b.txt", "b"),
        ];
        let result = create_zip_base64(&files);

        assert!(result.success);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("../escape.txt"));

        let mut archive = read_archive(&result);
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name("good/a.txt").is_ok());
    }

    #[test]
    fn all_entries_failing_reports_failure_with_reasons() {
        let files = vec![file("", "x"), file("dir/", "y"), file("a/../../z", "z")];
        let result = create_zip_base64(&files);

        assert!(!result.success);
        assert!(result.zip_base64.is_empty());
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn duplicate_paths_are_appended_in_order() {
        let files = vec![file("same.txt", "v1"), file("same.txt", "v2")];
        let result = create_zip_base64(&files);

        assert!(result.success);
        let archive = read_archive(&result);
        assert_eq!(archive.len(), 2);
    }
}
