//! Incremental project construction for the function-calling path.
//!
//! Instead of emitting markdown, the model drives three narrow verbs:
//! initialize, create file, finalize. Files are kept as an ordered list
//! keyed by normalized path with last-write-wins semantics. Each verb
//! returns a status message meant to be read back by the model.

use super::archive::{create_zip_base64, BuildResult};
use super::parser::{normalize_path, ParsedFile};

/// One file registered by the model.
#[derive(Debug, Clone)]
pub struct ProjectFile {
    pub path: String,
    pub content: String,
    pub file_type: String,
}

/// Accumulates files reported by the model one call at a time.
#[derive(Debug, Default)]
pub struct ProjectBuilder {
    files: Vec<ProjectFile>,
    project_name: String,
    description: String,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh project, discarding anything registered so far.
    pub fn initialize_project(&mut self, project_name: &str, description: &str) -> String {
        self.project_name = project_name.to_string();
        self.description = description.to_string();
        self.files.clear();
        format!("project '{}' initialized", project_name)
    }

    /// Registers a file. A path that normalizes to an existing entry
    /// replaces it (case-insensitive), keeping last-write-wins semantics.
    pub fn create_file(&mut self, path: &str, content: &str, file_type: &str) -> String {
        if path.trim().is_empty() {
            return "error: file path must not be empty".to_string();
        }

        let path = normalize_path(path);
        let replaced = self.remove_by_path(&path);

        self.files.push(ProjectFile {
            path: path.clone(),
            content: content.to_string(),
            file_type: file_type.to_string(),
        });

        if replaced {
            format!("file {} already existed and was overwritten", path)
        } else {
            format!("file {} created ({} characters)", path, content.len())
        }
    }

    /// Registers a directory by materializing a README.md inside it.
    pub fn create_directory(&mut self, directory_path: &str, description: &str) -> String {
        let readme_path = format!("{}/README.md", directory_path.trim_end_matches('/'));
        let content = format!("# {}\n\n{}", directory_path, description);
        self.create_file(&readme_path, &content, "markdown")
    }

    /// Human-readable snapshot of what the model has registered so far.
    pub fn project_status(&self) -> String {
        let mut status = String::new();
        status.push_str(&format!("project name: {}\n", self.project_name));
        status.push_str(&format!("file count: {}\n", self.files.len()));
        status.push_str("files:\n");

        let mut sorted: Vec<&ProjectFile> = self.files.iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));
        for file in sorted {
            status.push_str(&format!(
                "  - {} ({} characters, {})\n",
                file.path,
                file.content.len(),
                file.type_label()
            ));
        }

        status
    }

    pub fn finalize_project(&self) -> String {
        if self.files.is_empty() {
            return "error: the project contains no files".to_string();
        }
        format!(
            "project complete: {} file(s) registered, ready to package",
            self.files.len()
        )
    }

    /// Packages the registered files through the shared archive builder.
    pub fn export_to_zip(&self) -> BuildResult {
        if self.files.is_empty() {
            return BuildResult::failure("the project contains no files");
        }

        let entries: Vec<ParsedFile> = self
            .files
            .iter()
            .map(|f| ParsedFile {
                path: f.path.clone(),
                content: f.content.clone(),
            })
            .collect();

        create_zip_base64(&entries)
    }

    pub fn files(&self) -> &[ProjectFile] {
        &self.files
    }

    fn remove_by_path(&mut self, path: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| !f.path.eq_ignore_ascii_case(path));
        before != self.files.len()
    }
}

impl ProjectFile {
    fn type_label(&self) -> &str {
        if self.file_type.is_empty() {
            "text"
        } else {
            &self.file_type
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_file_normalizes_and_reports() {
        let mut builder = ProjectBuilder::new();
        builder.initialize_project("demo", "");

        let status = builder.create_file("/src/Main.java", "class Main {}", "java");

        assert!(status.contains("src/Main.java"));
        assert_eq!(builder.files()[0].path, "src/Main.java");
    }

    #[test]
    fn last_write_wins_per_path_case_insensitive() {
        let mut builder = ProjectBuilder::new();
        builder.initialize_project("demo", "");
        builder.create_file("src/app.py", "v1", "python");

        let status = builder.create_file("SRC/APP.PY", "v2", "python");

        assert!(status.contains("overwritten"));
        assert_eq!(builder.files().len(), 1);
        assert_eq!(builder.files()[0].content, "v2");
    }

    #[test]
    fn empty_path_is_rejected_with_a_message() {
        let mut builder = ProjectBuilder::new();

        let status = builder.create_file("  ", "x", "text");

        assert!(status.starts_with("error"));
        assert!(builder.files().is_empty());
    }

    #[test]
    fn create_directory_materializes_a_readme() {
        let mut builder = ProjectBuilder::new();
        builder.create_directory("docs/", "project documentation");

        assert_eq!(builder.files()[0].path, "docs/README.md");
        assert!(builder.files()[0].content.contains("project documentation"));
    }

    #[test]
    fn initialize_discards_previous_files() {
        let mut builder = ProjectBuilder::new();
        builder.initialize_project("one", "");
        builder.create_file("a.txt", "a", "text");
        builder.initialize_project("two", "");

        assert!(builder.files().is_empty());
        assert!(builder.finalize_project().starts_with("error"));
    }

    #[test]
    fn export_shares_archive_semantics() {
        let mut builder = ProjectBuilder::new();
        builder.initialize_project("demo", "");
        builder.create_file("src/main.rs", "fn main() {}", "rust");
        builder.create_file("README.md", "# demo", "markdown");

        let result = builder.export_to_zip();

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert!(!result.zip_base64.is_empty());
    }

    #[test]
    fn export_of_empty_project_fails() {
        let builder = ProjectBuilder::new();
        let result = builder.export_to_zip();

        assert!(!result.success);
        assert!(!result.errors.is_empty());
    }
}
