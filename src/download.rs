/*!
Content-addressed download cache (spec.md §5). Every fetched URL is cached
on disk forever, keyed by its own content, under `cache_dir`; the cache never
expires or evicts, matching the on-disk `requests-cache` session this engine
is derived from. A non-2xx response is fatal — archive URLs that don't exist
signal a configuration error, not a transient one worth retrying around.
*/
use crate::error::{Error, Result};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

pub struct Downloader {
    cache_dir: PathBuf,
    agent: ureq::Agent,
}

impl Downloader {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;
        Ok(Downloader {
            cache_dir,
            agent: ureq::AgentBuilder::new().build(),
        })
    }

    fn cache_path(&self, url: &str) -> PathBuf {
        let digest = fnv1a(url.as_bytes());
        self.cache_dir.join(format!("{digest:016x}"))
    }

    /// Fetch `url`, serving from the on-disk cache when present.
    pub fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.cache_path(url);
        if path.exists() {
            log::debug!("cache hit for {url}");
            return Ok(fs::read(&path)?);
        }

        log::debug!("cache miss, fetching {url}");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| Error::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| Error::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        fs::write(&path, &body)?;
        Ok(body)
    }

    /// Fetch `url` and persist it to a fresh temporary file, returning the
    /// path. The external decoder expects a real file on disk, not a byte
    /// buffer, so every caller routes through this rather than `fetch`.
    pub fn fetch_to_tempfile(&self, url: &str, suffix: &str) -> Result<tempfile::TempPath> {
        let body = self.fetch(url)?;
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile()?;
        use std::io::Write;
        file.write_all(&body)?;
        Ok(file.into_temp_path())
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

pub fn file_extension_for(url: &str) -> &str {
    Path::new(url)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| match ext {
            "gz" => ".gz",
            "bz2" => ".bz2",
            _ => ".bin",
        })
        .unwrap_or(".bin")
}
