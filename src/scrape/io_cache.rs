use crate::scrape::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

/// Stores the results of the slow operations (crawling, table extraction) on disk,
/// keyed by the operation and its arguments.
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: Option<PathBuf>,
}

impl ResultCache {
    pub fn new<P: Into<PathBuf>>(dir: P) -> ResultCache {
        ResultCache {
            dir: Some(dir.into()),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> ResultCache {
        ResultCache { dir: None }
    }

    pub fn key(operation: &str, args: &[&str]) -> String {
        let canonical = json!([operation, args]).to_string();
        sha256::digest(canonical)
    }

    /// Returns the stored result of `operation` on `args`, or computes and stores it.
    /// Failures are not stored.
    pub fn get_or_compute<T, F>(&self, operation: &str, args: &[&str], compute: F) -> ScrapeResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> ScrapeResult<T>,
    {
        let dir = match &self.dir {
            Some(d) => d,
            None => return compute(),
        };
        let path = dir.join(format!("{}.json", ResultCache::key(operation, args)));
        let path_s = path.display().to_string();
        if path.exists() {
            let contents = fs::read_to_string(&path).context(CacheSnafu { path: &path_s })?;
            match serde_json::from_str(&contents) {
                Ok(res) => {
                    debug!("get_or_compute: {} {:?}: hit {}", operation, args, path_s);
                    return Ok(res);
                }
                Err(e) => {
                    warn!(
                        "get_or_compute: {} {:?}: unreadable entry {}, recomputing: {}",
                        operation, args, path_s, e
                    );
                }
            }
        }
        debug!("get_or_compute: {} {:?}: miss", operation, args);
        let res = compute()?;
        fs::create_dir_all(dir).context(CacheSnafu {
            path: dir.display().to_string(),
        })?;
        let contents = serde_json::to_string(&res).context(SerializingJsonSnafu { what: &path_s })?;
        fs::write(&path, contents).context(CacheSnafu { path: &path_s })?;
        Ok(res)
    }
}
