//! # Content Manifest
//!
//! Lists what an archive contains in the terms the classifier needs: class
//! names under `WEB-INF/classes`, libraries under `WEB-INF/lib`, and text
//! descriptors (`WEB-INF/*.xml`, anything under `META-INF`, HTML pages)
//! together with their contents. Entries are kept sorted so two reads of the
//! same content compare equal.

use super::errors::{DeploymentError, DeploymentResult};
use crate::classifier::sniffers::html::is_html_file;
use crate::constants::archive;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;
use zip::ZipArchive;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DescriptorFile {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentManifest {
    pub classes: Vec<String>,
    pub libraries: Vec<String>,
    pub descriptors: Vec<DescriptorFile>,
}

enum EntryKind {
    Class(String),
    Library,
    Descriptor,
    Ignored,
}

fn classify_entry(path: &str) -> EntryKind {
    if let Some(class_path) = path
        .strip_prefix(archive::WEB_INF_CLASSES)
        .and_then(|p| p.strip_suffix(archive::CLASS_EXTENSION))
    {
        let simple = class_path.rsplit('/').next().unwrap_or(class_path);
        if simple == "module-info" || simple == "package-info" {
            return EntryKind::Ignored;
        }
        return EntryKind::Class(class_path.replace('/', "."));
    }

    if let Some(lib) = path.strip_prefix(archive::WEB_INF_LIB) {
        if !lib.contains('/') && lib.ends_with(archive::JAR_EXTENSION) {
            return EntryKind::Library;
        }
        return EntryKind::Ignored;
    }

    if let Some(rest) = path.strip_prefix(archive::WEB_INF) {
        if !rest.contains('/') && rest.ends_with(".xml") {
            return EntryKind::Descriptor;
        }
        return EntryKind::Ignored;
    }

    if path.starts_with(archive::META_INF) || is_html_file(path) {
        return EntryKind::Descriptor;
    }

    EntryKind::Ignored
}

impl ContentManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, name: impl Into<String>) -> Self {
        self.classes.push(name.into());
        self
    }

    pub fn with_library(mut self, name: impl Into<String>) -> Self {
        self.libraries.push(name.into());
        self
    }

    pub fn with_descriptor(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.descriptors.push(DescriptorFile {
            name: name.into(),
            content: content.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.libraries.is_empty() && self.descriptors.is_empty()
    }

    pub fn descriptor(&self, name: &str) -> Option<&DescriptorFile> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    fn sorted(mut self) -> Self {
        self.classes.sort();
        self.libraries.sort();
        self.descriptors.sort();
        self
    }

    /// Read the manifest of an expanded deployment directory.
    pub fn from_directory(root: &Path) -> DeploymentResult<Self> {
        if !root.is_dir() {
            return Err(DeploymentError::SourceMissing(root.to_path_buf()));
        }

        let mut manifest = Self::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|e| DeploymentError::Io {
                path: root.to_path_buf(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            match classify_entry(&name) {
                EntryKind::Class(class) => manifest.classes.push(class),
                EntryKind::Library => manifest.libraries.push(name),
                EntryKind::Descriptor => {
                    let content = if entry.metadata().map(|m| m.len()).unwrap_or(0)
                        > archive::MAX_DESCRIPTOR_BYTES
                    {
                        String::new()
                    } else {
                        let bytes = std::fs::read(entry.path()).map_err(|source| {
                            DeploymentError::Io {
                                path: entry.path().to_path_buf(),
                                source,
                            }
                        })?;
                        String::from_utf8_lossy(&bytes).into_owned()
                    };
                    manifest.descriptors.push(DescriptorFile { name, content });
                }
                EntryKind::Ignored => {}
            }
        }

        Ok(manifest.sorted())
    }

    /// Read the manifest of a `.war` (zip) archive.
    pub fn from_archive(path: &Path) -> DeploymentResult<Self> {
        let file = File::open(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                DeploymentError::SourceMissing(path.to_path_buf())
            } else {
                DeploymentError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let invalid = |e: zip::result::ZipError| DeploymentError::InvalidArchive {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let mut zip = ZipArchive::new(file).map_err(invalid)?;

        let mut manifest = Self::new();
        for index in 0..zip.len() {
            let mut entry = zip.by_index(index).map_err(invalid)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().trim_start_matches('/').to_string();

            match classify_entry(&name) {
                EntryKind::Class(class) => manifest.classes.push(class),
                EntryKind::Library => manifest.libraries.push(name),
                EntryKind::Descriptor => {
                    let content = if entry.size() > archive::MAX_DESCRIPTOR_BYTES {
                        String::new()
                    } else {
                        let mut bytes = Vec::with_capacity(entry.size() as usize);
                        entry
                            .read_to_end(&mut bytes)
                            .map_err(|source| DeploymentError::Io {
                                path: path.join(&name),
                                source,
                            })?;
                        String::from_utf8_lossy(&bytes).into_owned()
                    };
                    manifest.descriptors.push(DescriptorFile { name, content });
                }
                EntryKind::Ignored => {}
            }
        }

        Ok(manifest.sorted())
    }

    /// Read from a directory or an archive, whichever `path` is
    pub fn read(path: &Path) -> DeploymentResult<Self> {
        if path.is_dir() {
            Self::from_directory(path)
        } else {
            Self::from_archive(path)
        }
    }
}
