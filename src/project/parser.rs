//! Parser for model output that claims to follow the project grammar.
//!
//! The model is asked to emit `## relative/path` headers followed by fenced
//! code blocks, but real responses drift: absolute-looking paths, numbered
//! lists instead of headers, missing fences. Each drift variant is one
//! header grammar tried in priority order; the first grammar that yields at
//! least one file wins and results from different grammars are never merged.

use once_cell::sync::Lazy;
use regex::Regex;

/// One file recovered from model output.
///
/// Path uniqueness is not enforced here; duplicate paths ride through to
/// archive assembly, where insertion order decides.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub path: String,
    pub content: String,
}

/// Header grammars in priority order: absolute-looking heading, relative
/// heading, numbered list item. Compiled once, shared read-only.
static HEADER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // ## /path/to/file
        Regex::new(r"(?m)^##\s+(/[^\n]*)").unwrap(),
        // ## path/to/file
        Regex::new(r"(?m)^##\s+([^\n/][^\n]*)").unwrap(),
        // 1. path/to/file
        Regex::new(r"(?m)^\d+\.\s+([^\n]*)").unwrap(),
    ]
});

static CODE_BLOCK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:\w+)?\r?\n(.*?)```").unwrap());

static NUMBERED_LINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s+(.+)$").unwrap());

/// Recovers the ordered file list from raw model output.
///
/// Never fails: input that matches no grammar produces an empty list, which
/// the orchestrator maps to a user-visible failure.
pub fn parse(markdown: &str) -> Vec<ParsedFile> {
    if markdown.trim().is_empty() {
        return Vec::new();
    }

    let markdown = markdown.replace("\r\n", "\n").replace('\r', "\n");

    let files = try_header_patterns(&markdown);
    if !files.is_empty() {
        return files;
    }

    parse_numbered_format(&markdown)
}

fn try_header_patterns(markdown: &str) -> Vec<ParsedFile> {
    for pattern in HEADER_PATTERNS.iter() {
        let files = parse_with_pattern(markdown, pattern);
        if !files.is_empty() {
            return files;
        }
    }
    Vec::new()
}

fn parse_with_pattern(markdown: &str, pattern: &Regex) -> Vec<ParsedFile> {
    let matches: Vec<_> = pattern.captures_iter(markdown).collect();
    let mut files = Vec::new();

    for (i, capture) in matches.iter().enumerate() {
        let whole = capture.get(0).unwrap();
        let path = capture.get(1).map(|m| m.as_str().trim()).unwrap_or("");

        // Content spans from the end of this header to the start of the next.
        let content_start = whole.end();
        let content_end = matches
            .get(i + 1)
            .map(|next| next.get(0).unwrap().start())
            .unwrap_or(markdown.len());

        let section = &markdown[content_start..content_end];
        let content = extract_file_content(section);

        if !content.is_empty() {
            files.push(ParsedFile {
                path: normalize_path(path),
                content: content.trim().to_string(),
            });
        }
    }

    files
}

/// Fallback for responses that only use `N. path` numbering, scanned line by
/// line as a small state machine. Once a path is active, a fence opens
/// capture; failing that, the first non-blank line does. Capturing plain
/// text can swallow prose between files; that over-capture matches the
/// observed behavior of the responses this was built against.
fn parse_numbered_format(markdown: &str) -> Vec<ParsedFile> {
    let mut files = Vec::new();
    let mut current_path: Option<String> = None;
    let mut content_lines: Vec<&str> = Vec::new();
    let mut in_code_block = false;
    let mut collecting = false;

    for raw_line in markdown.split('\n') {
        let line = raw_line.trim();

        if let Some(capture) = NUMBERED_LINE_PATTERN.captures(line) {
            flush_numbered_file(&mut files, current_path.take(), &content_lines);
            current_path = Some(capture[1].to_string());
            content_lines.clear();
            collecting = false;
            in_code_block = false;
            continue;
        }

        if current_path.is_none() {
            continue;
        }

        if line.starts_with("```") {
            if !in_code_block {
                in_code_block = true;
                collecting = true;
            } else {
                in_code_block = false;
            }
            continue;
        }

        if collecting {
            // Keep the raw line so indentation survives.
            content_lines.push(raw_line);
        } else if !in_code_block && !line.is_empty() {
            collecting = true;
            content_lines.push(raw_line);
        }
    }

    flush_numbered_file(&mut files, current_path, &content_lines);
    files
}

fn flush_numbered_file(files: &mut Vec<ParsedFile>, path: Option<String>, lines: &[&str]) {
    if let Some(path) = path {
        let content = lines.join("\n");
        if !content.trim().is_empty() {
            files.push(ParsedFile {
                path: normalize_path(&path),
                content: content.trim().to_string(),
            });
        }
    }
}

/// Pulls the actual file body out of a header's section. Fenced blocks win;
/// otherwise raw text is captured from the first non-blank line on, with
/// fence markers acting as capture toggles.
fn extract_file_content(section: &str) -> String {
    if section.trim().is_empty() {
        return String::new();
    }

    if let Some(capture) = CODE_BLOCK_PATTERN.captures(section) {
        return capture[1].to_string();
    }

    let mut content_lines: Vec<&str> = Vec::new();
    let mut capturing = false;

    for line in section.split('\n') {
        let trimmed = line.trim();

        if !capturing && trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("```") {
            capturing = !capturing;
            continue;
        }

        if capturing || !trimmed.is_empty() {
            capturing = true;
            content_lines.push(line);
        }
    }

    content_lines.join("\n")
}

/// Name substituted when the model emits a header with no usable path.
pub const PLACEHOLDER_FILE_NAME: &str = "unknown_file.txt";

/// Canonicalizes a recovered path to a safe relative form: backslashes
/// become forward slashes, leading slashes are stripped, blank input gets a
/// placeholder name. Total and idempotent.
pub fn normalize_path(path: &str) -> String {
    if path.trim().is_empty() {
        return PLACEHOLDER_FILE_NAME.to_string();
    }

    let normalized = path.replace('\\', "/");
    let normalized = normalized.trim_start_matches('/');

    if normalized.is_empty() {
        return PLACEHOLDER_FILE_NAME.to_string();
    }

    normalized.to_string()
}
