/// Content hashing with a path-keyed memo cache.
///
/// Digests are BLAKE3 over the file bytes, rendered as lowercase hex. They
/// are a change/duplicate signal only. The cache remembers the modification
/// stamp each digest was computed for, so a rewritten file is re-hashed
/// even between explicit [`HashCache::clear`] calls.
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const READ_CHUNK: usize = 64 * 1024;

/// Modification time of `path`, or `None` if it is not an existing file.
pub fn file_stamp(path: &Path) -> Option<DateTime<Utc>> {
    let meta = std::fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    meta.modified().ok().map(DateTime::<Utc>::from)
}

/// Hash the whole file at `path`.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

#[derive(Debug, Clone)]
struct CachedDigest {
    stamp: Option<DateTime<Utc>>,
    digest: String,
}

/// Memoised digests keyed by path.
///
/// Owned by the orchestrator and cleared at the start of every full scan.
#[derive(Debug, Default)]
pub struct HashCache {
    entries: HashMap<PathBuf, CachedDigest>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached digest for `path`, if it was computed for the same stamp.
    pub fn get(&self, path: &Path, stamp: Option<DateTime<Utc>>) -> Option<&str> {
        self.entries
            .get(path)
            .filter(|c| c.stamp == stamp)
            .map(|c| c.digest.as_str())
    }

    pub fn insert(&mut self, path: PathBuf, stamp: Option<DateTime<Utc>>, digest: String) {
        self.entries.insert(path, CachedDigest { stamp, digest });
    }

    /// Digest of `path`, from the cache when still valid.
    ///
    /// `None` when the path does not resolve to a readable file.
    pub fn digest(&mut self, path: &Path) -> Option<String> {
        let stamp = file_stamp(path)?;
        if let Some(hit) = self.get(path, Some(stamp)) {
            return Some(hit.to_string());
        }
        let digest = hash_file(path).ok()?;
        self.insert(path.to_path_buf(), Some(stamp), digest.clone());
        Some(digest)
    }
}

/// [`HashCache::digest`] for a cache shared behind a mutex.
///
/// The lock is held only for the lookup and the insert, never while the
/// file is being read.
pub fn digest_shared(cache: &Mutex<HashCache>, path: &Path) -> Option<String> {
    let stamp = file_stamp(path)?;
    if let Some(hit) = cache.lock().get(path, Some(stamp)) {
        return Some(hit.to_string());
    }
    let digest = hash_file(path).ok()?;
    cache
        .lock()
        .insert(path.to_path_buf(), Some(stamp), digest.clone());
    Some(digest)
}
