use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

pub const ROOT_FOLDER: &str = ".";
const NOTE_EXTENSION: &str = "md";

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Cannot create new files: vault not found at {0}")]
    Unavailable(PathBuf),
    #[error("Folder '{0}' is outside the vault")]
    OutsideVault(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Destination for rendered notes. Paths are relative to the vault root.
pub trait NoteWriter {
    fn write_note(&self, relative_path: &Path, content: &str) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
}

impl Vault {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, VaultError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(VaultError::Unavailable(root));
        }
        Ok(Vault { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<storage_folder>/<stem>.md`, relative to the root.
    pub fn note_path(storage_folder: &str, stem: &str) -> Result<PathBuf, VaultError> {
        let mut path = normalize_folder(storage_folder)?;
        path.push(format!("{}.{}", stem, NOTE_EXTENSION));
        Ok(path)
    }

    /// Top-level, non-hidden folders of the vault, preceded by the root itself.
    pub fn list_folders(&self) -> Result<Vec<String>, VaultError> {
        let mut folders = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| VaultError::Io(e.into()))?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            folders.push(name);
        }
        folders.sort();
        folders.insert(0, ROOT_FOLDER.to_string());
        Ok(folders)
    }

    pub fn resolve(&self, relative_path: &Path) -> PathBuf {
        self.root.join(relative_path)
    }
}

impl NoteWriter for Vault {
    fn write_note(&self, relative_path: &Path, content: &str) -> io::Result<()> {
        let target = self.resolve(relative_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content)
    }
}

fn normalize_folder(folder: &str) -> Result<PathBuf, VaultError> {
    let mut normalized = PathBuf::new();
    for component in Path::new(folder.trim()).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            _ => return Err(VaultError::OutsideVault(folder.to_string())),
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_root_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let result = Vault::open(&missing);

        assert!(matches!(result, Err(VaultError::Unavailable(p)) if p == missing));
    }

    #[test]
    fn test_note_path_at_root() {
        assert_eq!(Vault::note_path("", "Dune").unwrap(), PathBuf::from("Dune.md"));
        assert_eq!(Vault::note_path(".", "Dune").unwrap(), PathBuf::from("Dune.md"));
    }

    #[test]
    fn test_note_path_in_folder() {
        assert_eq!(
            Vault::note_path("Reading/Kobo", "Dune").unwrap(),
            PathBuf::from("Reading/Kobo/Dune.md")
        );
        assert_eq!(
            Vault::note_path("./Books", "Dune").unwrap(),
            PathBuf::from("Books/Dune.md")
        );
    }

    #[test]
    fn test_note_path_rejects_escape() {
        assert!(matches!(
            Vault::note_path("../elsewhere", "Dune"),
            Err(VaultError::OutsideVault(_))
        ));
        assert!(matches!(
            Vault::note_path("/tmp", "Dune"),
            Err(VaultError::OutsideVault(_))
        ));
    }

    #[test]
    fn test_write_note_creates_folder_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::open(dir.path()).unwrap();
        let path = Vault::note_path("Books", "Dune").unwrap();

        vault.write_note(&path, "old").unwrap();
        vault.write_note(&path, "new").unwrap();

        let written = fs::read_to_string(dir.path().join("Books/Dune.md")).unwrap();
        assert_eq!(written, "new");
    }

    #[test]
    fn test_list_folders_skips_hidden_and_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Reading")).unwrap();
        fs::create_dir(dir.path().join("Archive")).unwrap();
        fs::create_dir_all(dir.path().join("Reading/Nested")).unwrap();
        fs::create_dir(dir.path().join(".obsidian")).unwrap();
        fs::write(dir.path().join("note.md"), "x").unwrap();
        let vault = Vault::open(dir.path()).unwrap();

        let folders = vault.list_folders().unwrap();

        assert_eq!(folders, vec![".", "Archive", "Reading"]);
    }
}
