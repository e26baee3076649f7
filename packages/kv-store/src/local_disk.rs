//! Key-value store persisted to a local directory.
//!
//! Layout: one directory per bucket, one file per key, both named with the
//! URL-safe unpadded base64 encoding of the raw bytes so any byte string is
//! a legal file name. A commit stages every changed value in a hidden
//! temporary file inside the bucket directory and then renames the staged
//! files into place. Leftover hidden files from an interrupted commit are
//! ignored when the store is opened.
//!
//! A commit is atomic per key, not across keys. Every fallible step except
//! the final renames happens before the first rename, so a commit that
//! fails while staging leaves the disk untouched. If a rename itself fails,
//! the keys renamed before it are on disk while the in-memory snapshot keeps
//! the old state; reopening the store brings the two back in line.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::Bytes;
use walkdir::{DirEntry, WalkDir};

use crate::engine::{ChangeSet, Durability, Snapshot, TxnEngine};
use crate::{KvError, KvStore, ReadTxn, WriteTxn};

pub struct LocalDiskKv {
    root: PathBuf,
    engine: TxnEngine<DiskLayout>,
}

impl LocalDiskKv {
    /// Open a store rooted at an existing, writable directory.
    ///
    /// Everything already under the root is loaded into memory; reads are
    /// served from memory and only commits touch the disk.
    pub fn open(root: impl Into<PathBuf>) -> Result<LocalDiskKv, KvError> {
        let root = root.into();
        let attr = fs::metadata(&root).map_err(|source| KvError::InvalidRoot {
            path: root.clone(),
            source,
        })?;

        if !attr.is_dir() {
            return Err(KvError::InvalidRoot {
                path: root,
                source: io::Error::other("Root path must be a directory."),
            });
        }

        if attr.permissions().readonly() {
            return Err(KvError::InvalidRoot {
                path: root,
                source: io::Error::other("Root directory must be writable"),
            });
        }

        let root = root
            .canonicalize()
            .map_err(|source| KvError::InvalidRoot {
                path: root.clone(),
                source,
            })?;

        let layout = DiskLayout { root: root.clone() };
        let snapshot = layout.load()?;
        log::debug!(
            "Opened {} ({} key(s))",
            root.display(),
            snapshot.key_count()
        );

        Ok(LocalDiskKv {
            root,
            engine: TxnEngine::new(snapshot, layout),
        })
    }

    /// Create the root directory (and parents) if needed, then open it.
    pub fn create(root: impl Into<PathBuf>) -> Result<LocalDiskKv, KvError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| KvError::InvalidRoot {
            path: root.clone(),
            source,
        })?;
        Self::open(root)
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl KvStore for LocalDiskKv {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, KvError> {
        Ok(Box::new(self.engine.begin_read()?))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, KvError> {
        Ok(Box::new(self.engine.begin_write()?))
    }
}

struct DiskLayout {
    root: PathBuf,
}

impl DiskLayout {
    fn encode_name(name: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(name)
    }

    fn decode_name(path: &Path) -> Result<Bytes, KvError> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| KvError::Corrupt {
                path: path.to_path_buf(),
                message: "file name is not valid UTF-8".to_string(),
            })?;

        URL_SAFE_NO_PAD
            .decode(name)
            .map(Bytes::from)
            .map_err(|err| KvError::Corrupt {
                path: path.to_path_buf(),
                message: format!("file name is not an encoded store name: {}", err),
            })
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
    }

    fn bucket_dir(&self, bucket: &[u8]) -> PathBuf {
        self.root.join(Self::encode_name(bucket))
    }

    fn key_path(&self, bucket: &[u8], key: &[u8]) -> PathBuf {
        self.bucket_dir(bucket).join(Self::encode_name(key))
    }

    fn load(&self) -> Result<Snapshot, KvError> {
        let mut snapshot = Snapshot::default();

        // Sorted, depth-first: a bucket directory is always visited before
        // the key files inside it.
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !Self::is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            let path = entry.path();
            let is_dir = entry.file_type().is_dir();

            match (entry.depth(), is_dir) {
                (1, true) => {
                    snapshot.create_bucket(&Self::decode_name(path)?)?;
                }
                (2, false) => {
                    let bucket_path = path.parent().ok_or_else(|| KvError::Corrupt {
                        path: path.to_path_buf(),
                        message: "key file has no bucket directory".to_string(),
                    })?;
                    let bucket = Self::decode_name(bucket_path)?;
                    let key = Self::decode_name(path)?;
                    log::debug!("Reading {}...", path.display());
                    let value = fs::read(path)?;
                    snapshot.put(&bucket, &key, Bytes::from(value))?;
                }
                _ => {
                    log::warn!("Ignoring unexpected entry {}", path.display());
                }
            }
        }

        Ok(snapshot)
    }
}

impl Durability for DiskLayout {
    fn persist(&self, changes: &ChangeSet) -> Result<(), KvError> {
        for bucket in &changes.buckets {
            let dir = self.bucket_dir(bucket);
            log::debug!("Creating bucket directory {}...", dir.display());
            fs::create_dir_all(&dir)?;
        }

        let mut staged = Vec::new();
        let mut removals = Vec::new();
        for ((bucket, key), value) in &changes.entries {
            let file_path = self.key_path(bucket, key);
            match value {
                Some(bytes) => {
                    let mut file = tempfile::NamedTempFile::new_in(self.bucket_dir(bucket))?;
                    file.write_all(bytes)?;
                    file.as_file().sync_all()?;
                    staged.push((file, file_path));
                }
                None => removals.push(file_path),
            }
        }

        let total = staged.len() + removals.len();
        let mut applied = 0;
        let partial = |applied: usize, err: io::Error| -> KvError {
            if applied > 0 {
                log::error!(
                    "Commit failed after {} of {} file change(s); reopen {} to resync",
                    applied,
                    total,
                    self.root.display()
                );
            }
            err.into()
        };

        for (file, file_path) in staged {
            log::debug!("Writing {}...", file_path.display());
            file.persist(&file_path)
                .map_err(|err| partial(applied, err.error))?;
            applied += 1;
        }

        for file_path in removals {
            log::debug!("Removing {}...", file_path.display());
            match fs::remove_file(&file_path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(partial(applied, err)),
            }
            applied += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(store: &LocalDiskKv, bucket: &[u8], key: &[u8], value: &'static [u8]) {
        let mut txn = store.begin_write().unwrap();
        txn.create_bucket_if_absent(bucket).unwrap();
        txn.put(bucket, key, Bytes::from_static(value)).unwrap();
        txn.commit().unwrap();
    }

    #[test]
    fn rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = LocalDiskKv::open(dir.path().join("absent"));
        assert!(matches!(result, Err(KvError::InvalidRoot { .. })));
    }

    #[test]
    fn rejects_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, b"not a directory").unwrap();

        let result = LocalDiskKv::open(&file);
        assert!(matches!(result, Err(KvError::InvalidRoot { .. })));
    }

    #[test]
    fn create_makes_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("a/b/c");

        let store = LocalDiskKv::create(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.canonicalize().unwrap());
    }

    #[test]
    fn commits_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = LocalDiskKv::open(dir.path()).unwrap();
            put(&store, b"bucket", b"key", b"value");
        }

        let store = LocalDiskKv::open(dir.path()).unwrap();
        let read = store.begin_read().unwrap();
        assert_eq!(
            read.get(b"bucket", b"key").unwrap(),
            Some(Bytes::from_static(b"value"))
        );
    }

    #[test]
    fn aborted_writes_never_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskKv::open(dir.path()).unwrap();

        let mut txn = store.begin_write().unwrap();
        txn.create_bucket_if_absent(b"bucket").unwrap();
        txn.put(b"bucket", b"key", Bytes::from_static(b"value"))
            .unwrap();
        txn.abort();

        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn awkward_names_round_trip() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = LocalDiskKv::open(dir.path()).unwrap();
            put(&store, b"../escape", b"a/b.c\0", b"ok");
        }

        // Nothing may land outside the root.
        assert!(!dir.path().parent().unwrap().join("escape").exists());

        let store = LocalDiskKv::open(dir.path()).unwrap();
        let read = store.begin_read().unwrap();
        assert_eq!(
            read.get(b"../escape", b"a/b.c\0").unwrap(),
            Some(Bytes::from_static(b"ok"))
        );
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskKv::open(dir.path()).unwrap();
        put(&store, b"bucket", b"key", b"value");

        let mut txn = store.begin_write().unwrap();
        txn.delete(b"bucket", b"key").unwrap();
        txn.commit().unwrap();

        let reopened = LocalDiskKv::open(dir.path()).unwrap();
        let read = reopened.begin_read().unwrap();
        assert!(read.has_bucket(b"bucket"));
        assert_eq!(read.get(b"bucket", b"key").unwrap(), None);
    }

    #[test]
    fn leftover_temp_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalDiskKv::open(dir.path()).unwrap();
            put(&store, b"bucket", b"key", b"value");
        }

        let bucket_dir = dir.path().join(DiskLayout::encode_name(b"bucket"));
        fs::write(bucket_dir.join(".tmpXYZ"), b"half written").unwrap();

        let store = LocalDiskKv::open(dir.path()).unwrap();
        let read = store.begin_read().unwrap();
        assert_eq!(
            read.get(b"bucket", b"key").unwrap(),
            Some(Bytes::from_static(b"value"))
        );
    }

    #[test]
    fn failed_staging_leaves_disk_and_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDiskKv::open(dir.path()).unwrap();
        put(&store, b"a", b"k", b"old");

        // A plain file where bucket "b"'s directory would go.
        let blocker = dir.path().join(DiskLayout::encode_name(b"b"));
        fs::write(&blocker, b"in the way").unwrap();

        let mut txn = store.begin_write().unwrap();
        txn.put(b"a", b"k", Bytes::from_static(b"new")).unwrap();
        txn.create_bucket_if_absent(b"b").unwrap();
        txn.put(b"b", b"k", Bytes::from_static(b"new")).unwrap();
        assert!(matches!(txn.commit(), Err(KvError::Io(_))));

        let read = store.begin_read().unwrap();
        assert_eq!(read.get(b"a", b"k").unwrap(), Some(Bytes::from_static(b"old")));
        assert!(!read.has_bucket(b"b"));
        drop(read);

        fs::remove_file(&blocker).unwrap();
        let reopened = LocalDiskKv::open(dir.path()).unwrap();
        let read = reopened.begin_read().unwrap();
        assert_eq!(read.get(b"a", b"k").unwrap(), Some(Bytes::from_static(b"old")));
        assert!(!read.has_bucket(b"b"));
    }

    #[test]
    fn undecodable_names_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("not*base64")).unwrap();

        let result = LocalDiskKv::open(dir.path());
        assert!(matches!(result, Err(KvError::Corrupt { .. })));
    }
}
