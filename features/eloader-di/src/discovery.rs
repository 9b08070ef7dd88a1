use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::DiscoveryError;

/// What the units found below a root are used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKind {
    /// Units are loaded and their entry point invoked
    Route,
    /// Units are registered as lazily resolved bindings
    Service,
}

/// A discovered, loadable file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitDescriptor {
    pub path: PathBuf,
    pub kind: RootKind,
}

impl UnitDescriptor {
    /// Binding name of the unit: its file stem
    pub fn name(&self) -> Option<&str> {
        self.path.file_stem().and_then(|stem| stem.to_str())
    }
}

/// Produces the units to load, in load order
pub trait Discovery {
    fn discover(&self) -> Result<Vec<UnitDescriptor>, DiscoveryError>;

    /// Configured roots which do not exist and are skipped
    fn missing_roots(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Extension matched by default
pub const DEFAULT_EXTENSION: &str = "rs";

/// A directory searched for units
#[derive(Debug, Clone)]
pub struct Directory {
    /// None if the configured path is not an existing directory
    path: Option<PathBuf>,
    configured: PathBuf,
    recursive: bool,
    kind: RootKind,
    extensions: Vec<String>,
}

impl Directory {
    pub fn new(path: impl AsRef<Path>, recursive: bool, kind: RootKind) -> Self {
        let configured = path.as_ref().to_path_buf();
        Directory {
            path: check(&configured),
            configured,
            recursive,
            kind,
            extensions: vec![DEFAULT_EXTENSION.to_string()],
        }
    }

    pub fn route(path: impl AsRef<Path>, recursive: bool) -> Self {
        Self::new(path, recursive, RootKind::Route)
    }

    pub fn service(path: impl AsRef<Path>, recursive: bool) -> Self {
        Self::new(path, recursive, RootKind::Service)
    }

    /// Replaces the matched file extensions, compared case-insensitively
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|extension| extension.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// The resolved directory, if it exists
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The path as it was configured
    pub fn configured(&self) -> &Path {
        &self.configured
    }

    pub fn kind(&self) -> RootKind {
        self.kind
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// All matching files below the directory, sorted by name per level
    ///
    /// A missing directory yields nothing.
    pub fn search(&self) -> Result<Vec<PathBuf>, DiscoveryError> {
        let Some(root) = &self.path else {
            tracing::debug!("'{}' is not a directory", self.configured.display());
            return Ok(Vec::new());
        };

        let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name();
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|source| DiscoveryError::Walk {
                root: root.clone(),
                source,
            })?;

            // Skip directories
            if !entry.file_type().is_file() {
                continue;
            }

            if self.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }

        tracing::debug!("Found {} units in '{}'", files.len(), root.display());
        Ok(files)
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(extension) = path.extension() else {
            return false;
        };
        let extension = extension.to_string_lossy().to_lowercase();
        self.extensions.iter().any(|allowed| *allowed == extension)
    }
}

/// Resolve and check if it is a directory
fn check(path: &Path) -> Option<PathBuf> {
    let resolved = std::fs::canonicalize(path).ok()?;
    resolved.is_dir().then_some(resolved)
}

impl Discovery for Directory {
    fn discover(&self) -> Result<Vec<UnitDescriptor>, DiscoveryError> {
        Ok(self
            .search()?
            .into_iter()
            .map(|path| UnitDescriptor {
                path,
                kind: self.kind,
            })
            .collect())
    }

    fn missing_roots(&self) -> Vec<PathBuf> {
        match self.path {
            Some(_) => Vec::new(),
            None => vec![self.configured.clone()],
        }
    }
}

impl Discovery for [Directory] {
    fn discover(&self) -> Result<Vec<UnitDescriptor>, DiscoveryError> {
        let mut units = Vec::new();
        for directory in self {
            units.extend(directory.discover()?);
        }
        Ok(units)
    }

    fn missing_roots(&self) -> Vec<PathBuf> {
        self.iter().flat_map(Discovery::missing_roots).collect()
    }
}

impl Discovery for Vec<Directory> {
    fn discover(&self) -> Result<Vec<UnitDescriptor>, DiscoveryError> {
        self.as_slice().discover()
    }

    fn missing_roots(&self) -> Vec<PathBuf> {
        self.as_slice().missing_roots()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.rs"), "").unwrap();
        fs::write(dir.path().join("A.RS"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.rs"), "").unwrap();
        dir
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|file| file.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn flat_search_filters_by_extension() {
        let dir = tree();

        let files = Directory::route(dir.path(), false).search().unwrap();

        assert_eq!(names(&files), vec!["A.RS", "b.rs"]);
    }

    #[test]
    fn recursive_search_descends() {
        let dir = tree();

        let files = Directory::service(dir.path(), true).search().unwrap();

        assert_eq!(names(&files), vec!["A.RS", "b.rs", "c.rs"]);
    }

    #[test]
    fn custom_extensions() {
        let dir = tree();

        let files = Directory::route(dir.path(), false)
            .with_extensions([".TXT"])
            .search()
            .unwrap();

        assert_eq!(names(&files), vec!["notes.txt"]);
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let directory = Directory::route("/definitely/not/here", true);

        assert!(directory.path().is_none());
        assert!(directory.search().unwrap().is_empty());
    }

    #[test]
    fn missing_roots_are_listed() {
        let dir = tree();
        let roots = vec![
            Directory::route(dir.path(), false),
            Directory::service("/definitely/not/here", false),
        ];

        let missing = roots.missing_roots();

        assert_eq!(missing, vec![PathBuf::from("/definitely/not/here")]);
    }

    #[test]
    fn descriptors_carry_the_root_kind() {
        let dir = tree();
        let roots = vec![Directory::service(dir.path(), false)];

        let units = roots.discover().unwrap();

        assert!(units.iter().all(|unit| unit.kind == RootKind::Service));
        assert_eq!(units[0].name(), Some("A"));
    }
}
