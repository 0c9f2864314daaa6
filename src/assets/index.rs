//! Directory listing behind the asset browser.
//!
//! The index only reflects the filesystem as of the last `refresh`; callers
//! rebuild it explicitly after imports or when the user asks for it.

use super::AssetError;
use image::RgbaImage;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

const TEXTURE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tga", "bmp"];
const MODEL_EXTENSIONS: &[&str] = &["obj", "fbx", "gltf", "glb", "dae", "3ds"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Folder,
    Texture,
    Model,
    Other,
}

impl AssetKind {
    pub fn classify(path: &Path, is_dir: bool) -> Self {
        if is_dir {
            return Self::Folder;
        }
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if TEXTURE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Texture
        } else if MODEL_EXTENSIONS.contains(&ext.as_str()) {
            Self::Model
        } else {
            Self::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Folder => "Folder",
            Self::Texture => "Texture",
            Self::Model => "Model",
            Self::Other => "File",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: AssetKind,
    /// Key into the thumbnail cache; only set for textures that decoded.
    pub thumbnail: Option<String>,
}

pub struct AssetIndex {
    root: PathBuf,
    current: PathBuf,
    entries: Vec<AssetEntry>,
    thumbnails: HashMap<String, Arc<RgbaImage>>,
    thumbnail_size: u32,
}

impl AssetIndex {
    pub fn new(root: &Path, thumbnail_size: u32) -> Self {
        Self {
            root: root.to_path_buf(),
            current: root.to_path_buf(),
            entries: Vec::new(),
            thumbnails: HashMap::new(),
            thumbnail_size: thumbnail_size.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_dir(&self) -> &Path {
        &self.current
    }

    pub fn entries(&self) -> &[AssetEntry] {
        &self.entries
    }

    pub fn at_root(&self) -> bool {
        self.current == self.root
    }

    pub fn thumbnail(&self, entry: &AssetEntry) -> Option<Arc<RgbaImage>> {
        entry
            .thumbnail
            .as_ref()
            .and_then(|key| self.thumbnails.get(key))
            .cloned()
    }

    pub fn cached_thumbnail_count(&self) -> usize {
        self.thumbnails.len()
    }

    /// Re-reads the current directory. Folders sort first, then names case-insensitively.
    pub fn refresh(&mut self) -> Result<(), AssetError> {
        let read_dir = std::fs::read_dir(&self.current).map_err(|source| AssetError::Io {
            path: self.current.display().to_string(),
            source,
        })?;

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = match dir_entry {
                Ok(dir_entry) => dir_entry,
                Err(err) => {
                    log::warn!("Skipping unreadable entry in {}: {err}", self.current.display());
                    continue;
                }
            };
            let path = dir_entry.path();
            let metadata = match dir_entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    log::warn!("Skipping {}: {err}", path.display());
                    continue;
                }
            };
            let kind = AssetKind::classify(&path, metadata.is_dir());
            let thumbnail = if kind == AssetKind::Texture {
                self.ensure_thumbnail(&path, &metadata)
            } else {
                None
            };
            entries.push(AssetEntry {
                name: dir_entry.file_name().to_string_lossy().to_string(),
                path,
                kind,
                thumbnail,
            });
        }

        entries.sort_by(|a, b| {
            (a.kind != AssetKind::Folder)
                .cmp(&(b.kind != AssetKind::Folder))
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        log::debug!("Indexed {} entries in {}", entries.len(), self.current.display());
        self.entries = entries;
        Ok(())
    }

    pub fn enter(&mut self, folder: &Path) -> Result<(), AssetError> {
        if !folder.starts_with(&self.root) || !folder.is_dir() {
            return Err(AssetError::Io {
                path: folder.display().to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "not a folder inside the assets root",
                ),
            });
        }
        self.current = folder.to_path_buf();
        self.refresh()
    }

    /// Returns `false` when already at the assets root.
    pub fn go_up(&mut self) -> Result<bool, AssetError> {
        if self.at_root() {
            return Ok(false);
        }
        match self.current.parent() {
            Some(parent) if parent.starts_with(&self.root) => {
                self.current = parent.to_path_buf();
            }
            _ => self.current = self.root.clone(),
        }
        self.refresh()?;
        Ok(true)
    }

    /// Copies `source` into the current folder and refreshes the listing.
    pub fn import(&mut self, source: &Path) -> Result<PathBuf, AssetError> {
        let file_name = source.file_name().ok_or_else(|| AssetError::Io {
            path: source.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
        })?;
        let destination = self.current.join(file_name);
        std::fs::copy(source, &destination).map_err(|err| AssetError::Io {
            path: destination.display().to_string(),
            source: err,
        })?;
        log::info!("Imported {} into {}", source.display(), self.current.display());
        self.refresh()?;
        Ok(destination)
    }

    fn ensure_thumbnail(&mut self, path: &Path, metadata: &std::fs::Metadata) -> Option<String> {
        let key = thumbnail_key(path, metadata);
        if self.thumbnails.contains_key(&key) {
            return Some(key);
        }
        match image::open(path) {
            Ok(image) => {
                let thumbnail = image
                    .thumbnail(self.thumbnail_size, self.thumbnail_size)
                    .to_rgba8();
                self.thumbnails.insert(key.clone(), Arc::new(thumbnail));
                Some(key)
            }
            Err(err) => {
                log::warn!("No thumbnail for {}: {err}", path.display());
                None
            }
        }
    }
}

/// Stable while the file is unchanged; a rewrite changes size or mtime.
fn thumbnail_key(path: &Path, metadata: &std::fs::Metadata) -> String {
    let modified = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|duration| duration.as_nanos())
        .unwrap_or(0);
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(metadata.len().to_le_bytes());
    hasher.update(modified.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{AssetIndex, AssetKind};
    use image::RgbaImage;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_root(name: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|value| value.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!("stagehand_assets_{name}_{nonce}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn classifies_by_extension() {
        assert_eq!(AssetKind::classify(Path::new("a/B.PNG"), false), AssetKind::Texture);
        assert_eq!(AssetKind::classify(Path::new("monitor.obj"), false), AssetKind::Model);
        assert_eq!(AssetKind::classify(Path::new("readme"), false), AssetKind::Other);
        assert_eq!(AssetKind::classify(Path::new("Textures"), true), AssetKind::Folder);
    }

    #[test]
    fn refresh_lists_folders_first_and_caches_thumbnails() {
        let root = temp_root("listing");
        std::fs::create_dir_all(root.join("Textures")).expect("mkdir");
        RgbaImage::from_pixel(128, 32, image::Rgba([10, 20, 30, 255]))
            .save(root.join("brick.png"))
            .expect("write png");
        std::fs::write(root.join("Monitor.obj"), "v 0 0 0\n").expect("write obj");
        std::fs::write(root.join("notes.txt"), "hello").expect("write txt");

        let mut index = AssetIndex::new(&root, 64);
        index.refresh().expect("refresh");
        let names: Vec<&str> = index.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Textures", "brick.png", "Monitor.obj", "notes.txt"]);

        let brick = &index.entries()[1];
        let thumbnail = index.thumbnail(brick).expect("thumbnail");
        assert!(thumbnail.width() <= 64 && thumbnail.height() <= 64);
        assert_eq!(index.cached_thumbnail_count(), 1);

        index.refresh().expect("second refresh");
        assert_eq!(index.cached_thumbnail_count(), 1);

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn navigation_stays_inside_root() {
        let root = temp_root("navigation");
        std::fs::create_dir_all(root.join("Models")).expect("mkdir");

        let mut index = AssetIndex::new(&root, 64);
        index.refresh().expect("refresh");
        assert!(!index.go_up().expect("go up at root"));

        index.enter(&root.join("Models")).expect("enter");
        assert_eq!(index.current_dir(), root.join("Models"));
        assert!(index.entries().is_empty());
        assert!(index.go_up().expect("go up"));
        assert!(index.at_root());

        assert!(index.enter(&std::env::temp_dir()).is_err());

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn import_copies_into_current_folder() {
        let root = temp_root("import_dst");
        let source_dir = temp_root("import_src");
        let source = source_dir.join("crate.obj");
        std::fs::write(&source, "v 0 0 0\n").expect("write source");

        let mut index = AssetIndex::new(&root, 64);
        let destination = index.import(&source).expect("import");
        assert!(destination.exists());
        assert_eq!(index.entries().len(), 1);
        assert_eq!(index.entries()[0].kind, AssetKind::Model);

        let _ = std::fs::remove_dir_all(root);
        let _ = std::fs::remove_dir_all(source_dir);
    }
}
