use super::class_descriptor::ClassDescriptor;
use super::class_file::{parse_class, ClassFileError};
use crate::constants::archive;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;

#[derive(Debug, Error)]
pub enum ClassLoadError {
    #[error("Class not found: {0}")]
    NotFound(String),
    #[error("Failed to read class {class}: {source}")]
    Io {
        class: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to open archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },
    #[error("Malformed class {class}: {source}")]
    Malformed {
        class: String,
        #[source]
        source: ClassFileError,
    },
}

/// Loads class descriptors by binary name for the classifier.
pub trait ClassLoader: Send + Sync {
    fn load_class(&self, name: &str) -> Result<ClassDescriptor, ClassLoadError>;
}

/// Serves descriptors registered up front; used for in-memory content.
#[derive(Debug, Default, Clone)]
pub struct StaticClassLoader {
    classes: HashMap<String, ClassDescriptor>,
}

impl StaticClassLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: ClassDescriptor) -> Self {
        self.insert(class);
        self
    }

    pub fn insert(&mut self, class: ClassDescriptor) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

impl FromIterator<ClassDescriptor> for StaticClassLoader {
    fn from_iter<I: IntoIterator<Item = ClassDescriptor>>(iter: I) -> Self {
        let mut loader = Self::new();
        for class in iter {
            loader.insert(class);
        }
        loader
    }
}

impl ClassLoader for StaticClassLoader {
    fn load_class(&self, name: &str) -> Result<ClassDescriptor, ClassLoadError> {
        self.classes
            .get(name)
            .cloned()
            .ok_or_else(|| ClassLoadError::NotFound(name.to_string()))
    }
}

/// Path of a class inside the web archive layout
pub fn class_entry_path(name: &str) -> String {
    format!(
        "{}{}{}",
        archive::WEB_INF_CLASSES,
        name.replace('.', "/"),
        archive::CLASS_EXTENSION
    )
}

enum ClassSource {
    Directory(PathBuf),
    Archive(Mutex<ZipArchive<File>>),
}

/// Reads and parses class files from an expanded directory or a `.war`.
pub struct ArchiveClassLoader {
    location: PathBuf,
    source: ClassSource,
}

impl ArchiveClassLoader {
    pub fn for_directory(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            location: root.clone(),
            source: ClassSource::Directory(root),
        }
    }

    pub fn for_archive(path: impl AsRef<Path>) -> Result<Self, ClassLoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ClassLoadError::Archive {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let zip = ZipArchive::new(file).map_err(|e| ClassLoadError::Archive {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            location: path.to_path_buf(),
            source: ClassSource::Archive(Mutex::new(zip)),
        })
    }

    /// Pick the loader matching what `path` is on disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClassLoadError> {
        let path = path.as_ref();
        if path.is_dir() {
            Ok(Self::for_directory(path))
        } else {
            Self::for_archive(path)
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    fn read_bytes(&self, name: &str) -> Result<Vec<u8>, ClassLoadError> {
        let entry = class_entry_path(name);
        match &self.source {
            ClassSource::Directory(root) => {
                let path = root.join(&entry);
                std::fs::read(&path).map_err(|source| {
                    if source.kind() == std::io::ErrorKind::NotFound {
                        ClassLoadError::NotFound(name.to_string())
                    } else {
                        ClassLoadError::Io {
                            class: name.to_string(),
                            source,
                        }
                    }
                })
            }
            ClassSource::Archive(zip) => {
                let mut zip = zip.lock();
                let mut file = zip
                    .by_name(&entry)
                    .map_err(|_| ClassLoadError::NotFound(name.to_string()))?;
                let mut bytes = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut bytes)
                    .map_err(|source| ClassLoadError::Io {
                        class: name.to_string(),
                        source,
                    })?;
                Ok(bytes)
            }
        }
    }
}

impl ClassLoader for ArchiveClassLoader {
    fn load_class(&self, name: &str) -> Result<ClassDescriptor, ClassLoadError> {
        let bytes = self.read_bytes(name)?;
        parse_class(&bytes).map_err(|source| ClassLoadError::Malformed {
            class: name.to_string(),
            source,
        })
    }
}

impl std::fmt::Debug for ArchiveClassLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.source {
            ClassSource::Directory(_) => "directory",
            ClassSource::Archive(_) => "archive",
        };
        f.debug_struct("ArchiveClassLoader")
            .field("location", &self.location)
            .field("kind", &kind)
            .finish()
    }
}
