use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use spdlog::info;
use walkdir::WalkDir;

use crate::content::markdown_renderer::MarkdownRenderer;
use crate::content::SourceDocument;

pub struct PostList {
    pub root_dir: PathBuf,
    /// Extension without the leading dot
    pub extension: String,
}

impl PostList {
    /// Every file under `root_dir` with the configured extension, relative to
    /// `root_dir` and in a stable order.
    pub fn retrieve_files(&self) -> Result<Vec<PathBuf>> {
        let mut posts = vec![];
        for entry in WalkDir::new(&self.root_dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Error listing {}", self.root_dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let has_extension = entry.path().extension()
                .map(|ext| ext == self.extension.as_str())
                .unwrap_or(false);
            if has_extension {
                // strip_prefix cannot fail, walkdir yields paths below root_dir
                if let Ok(relative) = entry.path().strip_prefix(&self.root_dir) {
                    posts.push(relative.to_path_buf());
                }
            }
        }
        Ok(posts)
    }

    pub fn load(&self, relative: &Path, renderer: &MarkdownRenderer) -> Result<SourceDocument> {
        let full_path = self.root_dir.join(relative);
        info!("Processing {}", full_path.display());
        let source = fs::read_to_string(&full_path)
            .with_context(|| format!("Error reading {}", full_path.display()))?;
        let rendered = renderer.render(&source)
            .with_context(|| format!("Error rendering {}", full_path.display()))?;
        Ok(SourceDocument::from_rendered(relative.to_path_buf(), rendered))
    }

    pub fn load_all(&self, renderer: &MarkdownRenderer) -> Result<Vec<SourceDocument>> {
        self.retrieve_files()?
            .iter()
            .map(|relative| self.load(relative, renderer))
            .collect()
    }
}
