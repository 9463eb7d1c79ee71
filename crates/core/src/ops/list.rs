//! Listing

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::Operations;
use crate::error::Result;
use crate::lister::{ListParams, list_objects};
use crate::path::parse_object_path;
use crate::traits::ObjectInfo;

impl Operations {
    /// List an object store path
    ///
    /// - `s3://b/prefix*` lists everything under `prefix`
    /// - `s3://b/` and `s3://b/dir/` list one level, showing common prefixes
    /// - anything else describes the single object
    pub async fn list(&self, path: &str) -> Result<()> {
        let target = parse_object_path(path)?;

        let params = if let Some(prefix) = target.key.strip_suffix('*') {
            ListParams::flat(&target.bucket, prefix)
        } else if target.is_dir() {
            ListParams::one_level(&target.bucket, &target.key)
        } else {
            let info = self.store.head_object(&target).await?;
            self.printer.object(&info);
            return Ok(());
        };

        let cancel = CancellationToken::new();
        list_objects(
            Arc::clone(&self.store),
            &cancel,
            params,
            self.options.page_size,
            |page| {
                for prefix in page.common_prefixes {
                    self.printer.object(&ObjectInfo::dir(prefix));
                }
                for entry in &page.entries {
                    self.printer.object(entry);
                }
                Ok(())
            },
        )
        .await
    }
}
