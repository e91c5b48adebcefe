use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Local filesystem storage (rooted at the host filesystem).
///
/// Writes go through a sibling temp file that is fsynced and then renamed over
/// the target, so readers only ever see the old bytes or the new bytes.
#[derive(Debug, Clone, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }

    pub fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| Error::Storage(format!("mkparent: {e}")))?;

        let tmp = temp_path_for(path);
        let written = (|| -> std::io::Result<()> {
            let mut f = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp)?;
            f.write_all(bytes)?;
            f.flush()?;
            f.sync_all()
        })();
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(Error::Storage(format!("write {}: {e}", tmp.display())));
        }

        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::Storage(format!("rename into {}: {e}", path.display())));
        }

        sync_dir(&parent);
        Ok(())
    }

    /// Whole-file read; `Ok(None)` when the file does not exist.
    pub fn read_optional(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match File::open(path) {
            Ok(mut f) => {
                let mut buf = Vec::new();
                f.read_to_end(&mut buf)
                    .map_err(|e| Error::Storage(format!("read: {e}")))?;
                Ok(Some(buf))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!("open: {e}"))),
        }
    }

    /// Idempotent (no error if the path doesn't exist).
    pub fn delete(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("delete: {e}"))),
        }
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapload".to_string());
    path.with_file_name(format!(".{}.tmp-{}", name, std::process::id()))
}

// Persist the rename itself. Directories cannot be opened for sync on every
// platform, so failures here are ignored.
fn sync_dir(dir: &Path) {
    if let Ok(d) = File::open(dir) {
        let _ = d.sync_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("snapload-fs-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn write_then_read() {
        let dir = temp_dir("rw");
        let path = dir.join("nested").join("file.txt");
        let storage = FsStorage::new();

        storage.write_atomic(&path, b"hello").unwrap();
        assert_eq!(storage.read_optional(&path).unwrap().as_deref(), Some(&b"hello"[..]));

        storage.write_atomic(&path, b"world!").unwrap();
        assert_eq!(storage.read_optional(&path).unwrap().as_deref(), Some(&b"world!"[..]));

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = temp_dir("missing");
        let storage = FsStorage::new();
        assert!(storage.read_optional(&dir.join("nope")).unwrap().is_none());
        storage.delete(&dir.join("nope")).unwrap();
    }
}
