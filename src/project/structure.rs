//! Structured-JSON project schema.
//!
//! One prompt variant asks the model for a JSON project description instead
//! of markdown. The field names here are part of that documented schema and
//! must stay stable.

use serde::{Deserialize, Serialize};

use super::archive::{create_zip_base64, BuildResult};
use super::parser::{normalize_path, ParsedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    File,
    Directory,
}

impl Default for ItemType {
    fn default() -> Self {
        ItemType::File
    }
}

/// One entry of the JSON project schema. Directories carry no content and
/// are skipped at archive time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectItem {
    #[serde(rename = "type", default)]
    pub item_type: ItemType,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "isEntryPoint", default)]
    pub is_entry_point: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectStructure {
    #[serde(rename = "ProjectName", default)]
    pub project_name: String,
    #[serde(rename = "Items", default)]
    pub items: Vec<ProjectItem>,
}

/// Packages the file items of a structure through the shared archive
/// builder, skipping directory entries. Item paths go through the same
/// normalization as parsed markdown paths.
pub fn export_structure(structure: &ProjectStructure) -> BuildResult {
    let entries: Vec<ParsedFile> = structure
        .items
        .iter()
        .filter(|item| item.item_type == ItemType::File)
        .map(|item| ParsedFile {
            path: normalize_path(&item.path),
            content: item.content.clone(),
        })
        .collect();

    if entries.is_empty() {
        return BuildResult::failure("the project structure contains no files");
    }

    create_zip_base64(&entries)
}
