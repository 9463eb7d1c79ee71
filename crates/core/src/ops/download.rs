//! Object store to local downloads

use std::io::ErrorKind;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::sync::Arc;

use super::Operations;
use crate::error::{Error, Result};
use crate::lister::{ListParams, Lister};
use crate::path::{ObjectPath, derive_local_destination, local_file_name, parse_object_path};
use crate::pool::JobPool;

impl Operations {
    /// Download one object, or every object under a prefix
    ///
    /// A source ending in `/` or `*` selects a prefix; the `*` is dropped
    /// before listing.
    pub async fn download(&self, source: &str, dest: &Path) -> Result<()> {
        if !source.ends_with('/') && !source.ends_with('*') {
            let object = parse_object_path(source)?;
            let target = resolve_download_target(dest, &object.key).await?;
            self.store.get_object(&object, &target).await?;
            self.printer.line(&download_line(&object, &target));
            return Ok(());
        }

        let prefix = parse_object_path(source.strip_suffix('*').unwrap_or(source))?;
        if self.options.flatten {
            tokio::fs::create_dir_all(dest).await?;
        }

        let pool = JobPool::new(self.options.parallel, Arc::clone(&self.printer));
        let listed = self.submit_listing(&pool, &prefix, dest).await;
        let finished = pool.finish().await;
        listed?;
        finished
    }

    /// List `prefix` and queue one download per object
    async fn submit_listing(&self, pool: &JobPool, prefix: &ObjectPath, dest: &Path) -> Result<()> {
        let params = ListParams::flat(&prefix.bucket, &prefix.key);
        let mut lister = Lister::new(Arc::clone(&self.store), params, pool.cancellation_token())
            .with_page_size(self.options.page_size);

        while let Some(page) = lister.next_page().await? {
            for entry in page.entries {
                if entry.is_dir || entry.key.ends_with('/') {
                    continue;
                }

                let target = match self.local_target(&prefix.key, &entry.key, dest) {
                    Ok(target) => target,
                    Err(e) => {
                        tracing::warn!(key = %entry.key, "skipping download: {e}");
                        self.printer.error(&e.to_string());
                        continue;
                    }
                };
                let object = prefix.with_key(entry.key);
                let store = Arc::clone(&self.store);

                let queued = pool
                    .submit(move |out| async move {
                        if let Some(parent) = target.parent() {
                            tokio::fs::create_dir_all(parent).await?;
                        }
                        store.get_object(&object, &target).await?;
                        out.send(download_line(&object, &target)).await;
                        Ok(())
                    })
                    .await;
                if !queued {
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    fn local_target(&self, prefix: &str, key: &str, dest: &Path) -> Result<PathBuf> {
        if self.options.flatten {
            return Ok(dest.join(local_file_name(key)?));
        }

        let target = derive_local_destination(prefix, key, dest)?;
        if target == dest {
            Ok(dest.join(local_file_name(key)?))
        } else {
            Ok(target)
        }
    }
}

/// Resolve where a single object lands
///
/// An existing directory receives the key's last segment. A missing path
/// that ends in a separator is an error rather than a file name.
async fn resolve_download_target(dest: &Path, key: &str) -> Result<PathBuf> {
    match tokio::fs::metadata(dest).await {
        Ok(metadata) if metadata.is_dir() => Ok(dest.join(local_file_name(key)?)),
        Ok(_) => Ok(dest.to_path_buf()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let raw = dest.to_string_lossy();
            if raw.ends_with(MAIN_SEPARATOR) || raw.ends_with('/') {
                Err(Error::DirectoryExpected(raw.into_owned()))
            } else {
                Ok(dest.to_path_buf())
            }
        }
        Err(e) => Err(e.into()),
    }
}

fn download_line(object: &ObjectPath, target: &Path) -> String {
    format!("download {} to {}", object, target.display())
}
