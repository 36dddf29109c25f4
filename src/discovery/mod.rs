//! Artifact discovery: walks a target directory and classifies each file
//! so the engine can decide which rules apply where. Respects `.gitignore`
//! through the `ignore` crate, so vendored dependencies and build output
//! stay out of scan results.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Coarse file classification used for reporting and rule scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Source,
    Config,
    Lockfile,
    Container,
    AiComponent,
    Unknown,
}

/// One scannable file found under the target directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Path relative to the scan root, with `/` separators.
    pub path: String,
    /// Absolute path for reading content.
    pub abs_path: PathBuf,
    pub kind: ArtifactKind,
    pub size: u64,
}

const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "go", "py", "js", "ts", "jsx", "tsx", "java", "kt", "rb", "php", "c", "cpp", "h", "cs",
    "swift", "sh", "bash", "zsh",
];

const CONFIG_EXTENSIONS: &[&str] = &[
    "yaml", "yml", "json", "toml", "ini", "cfg", "conf", "env", "xml", "properties",
];

const LOCKFILE_NAMES: &[&str] = &[
    "Cargo.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Pipfile.lock",
    "go.sum",
    "Gemfile.lock",
    "composer.lock",
];

const AI_COMPONENT_NAMES: &[&str] = &[
    "prompt.md",
    "system_prompt.md",
    "agent.yaml",
    "agent.yml",
    "mcp.json",
    ".mcp.json",
];

/// Classifies a file by name first, then extension. Dotfiles named
/// `.env` or `.env.*` count as config even without an extension match.
pub fn classify(path: &Path) -> ArtifactKind {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if LOCKFILE_NAMES.contains(&name) {
        return ArtifactKind::Lockfile;
    }
    if AI_COMPONENT_NAMES.contains(&name) {
        return ArtifactKind::AiComponent;
    }
    if name == "Dockerfile" || name.starts_with("Dockerfile.") || name.starts_with("docker-compose")
    {
        return ArtifactKind::Container;
    }
    if name == ".env" || name.starts_with(".env.") {
        return ArtifactKind::Config;
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if SOURCE_EXTENSIONS.contains(&ext) => ArtifactKind::Source,
        Some(ext) if CONFIG_EXTENSIONS.contains(&ext) => ArtifactKind::Config,
        _ => ArtifactKind::Unknown,
    }
}

/// Walks `root` and returns all scannable artifacts, sorted by relative
/// path for deterministic downstream output.
pub struct Walker {
    root: PathBuf,
}

impl Walker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn collect(&self) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        let walk = WalkBuilder::new(&self.root)
            .hidden(false)
            .require_git(false)
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(%err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let abs_path = entry.path().to_path_buf();
            let rel = abs_path.strip_prefix(&self.root).unwrap_or(&abs_path);
            let path = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

            artifacts.push(Artifact {
                kind: classify(&abs_path),
                path,
                abs_path,
                size,
            });
        }

        artifacts.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(artifacts)
    }
}
