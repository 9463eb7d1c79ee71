//! Local to object store uploads

use std::path::{MAIN_SEPARATOR, Path};
use std::sync::Arc;

use walkdir::WalkDir;

use super::Operations;
use crate::error::Result;
use crate::path::{ObjectPath, append_base_name, derive_destination_key, parse_object_path};
use crate::pool::JobPool;
use crate::traits::ObjectStore;

impl Operations {
    /// Upload a file, or every regular file below a directory
    pub async fn upload(&self, source: &Path, destination: &str) -> Result<()> {
        let dest = parse_object_path(destination)?;
        let metadata = tokio::fs::metadata(source).await?;

        if !metadata.is_dir() {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let target = dest.with_key(append_base_name(&dest.key, &name));
            upload_one(self.store.as_ref(), source, &target).await?;
            self.printer.line(&upload_line(source, &target));
            return Ok(());
        }

        let pool = JobPool::new(self.options.parallel, Arc::clone(&self.printer));
        let walked = self.submit_tree(&pool, source, &dest).await;
        let finished = pool.finish().await;
        walked?;
        finished
    }

    /// Walk `root` depth-first and queue one upload per regular file
    ///
    /// Stops quietly once the pool is cancelled.
    async fn submit_tree(&self, pool: &JobPool, root: &Path, dest: &ObjectPath) -> Result<()> {
        let root_str = root.to_string_lossy().into_owned();

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            if pool.is_cancelled() {
                tracing::debug!("upload walk stopped by cancellation");
                break;
            }

            let key = derive_destination_key(
                &root_str,
                &dest.key,
                &entry.path().to_string_lossy(),
                MAIN_SEPARATOR,
            );
            let target = dest.with_key(key);
            let local = entry.into_path();
            let store = Arc::clone(&self.store);

            let queued = pool
                .submit(move |out| async move {
                    upload_one(store.as_ref(), &local, &target).await?;
                    out.send(upload_line(&local, &target)).await;
                    Ok(())
                })
                .await;
            if !queued {
                break;
            }
        }

        Ok(())
    }
}

async fn upload_one(store: &dyn ObjectStore, source: &Path, target: &ObjectPath) -> Result<()> {
    let info = store.put_object(target, source).await?;
    tracing::debug!(key = %target, size = info.size_bytes.unwrap_or_default(), "uploaded");
    Ok(())
}

fn upload_line(source: &Path, target: &ObjectPath) -> String {
    format!("upload {} {}", source.display(), target)
}
