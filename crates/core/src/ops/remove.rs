//! Object removal
//!
//! Exact keys are grouped per bucket and deleted with multi-key calls.
//! Paths ending in `*` are globs: each one becomes a pool job that lists the
//! prefix and deletes every listed page in one call.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::Operations;
use crate::error::Result;
use crate::lister::{ListParams, Lister};
use crate::path::{format_object_path, parse_object_path};
use crate::pool::{JobPool, OutputSender};
use crate::traits::DeleteOutcome;

/// Largest number of keys the store accepts in one delete call
pub const MAX_DELETE_BATCH: usize = 1000;

/// Bucket name to keys, in the order the keys were given
pub type BucketKeyGroup = BTreeMap<String, Vec<String>>;

/// Partition paths into globs (trailing `*`) and exact paths
pub fn split_globs_and_regulars(paths: &[String]) -> (Vec<String>, Vec<String>) {
    paths.iter().cloned().partition(|p| p.ends_with('*'))
}

/// Group paths by bucket, i.e. `b1: [k1, k2], b2: [k3]`
pub fn group_by_bucket(paths: &[String]) -> Result<BucketKeyGroup> {
    let mut groups = BucketKeyGroup::new();
    for path in paths {
        let object = parse_object_path(path)?;
        groups.entry(object.bucket).or_default().push(object.key);
    }
    Ok(groups)
}

impl Operations {
    /// Remove exact keys first, then expand and remove globs
    ///
    /// Every path is parsed before anything is deleted.
    pub async fn remove(&self, paths: &[String]) -> Result<()> {
        let (globs, regulars) = split_globs_and_regulars(paths);
        let regulars = group_by_bucket(&regulars)?;
        let globs = group_by_bucket(&globs)?;

        self.remove_regulars(regulars).await?;
        self.remove_globs(globs).await
    }

    async fn remove_regulars(&self, groups: BucketKeyGroup) -> Result<()> {
        for (bucket, keys) in groups {
            for batch in keys.chunks(MAX_DELETE_BATCH) {
                let outcome = self.store.delete_objects(&bucket, batch.to_vec()).await?;
                for line in deleted_lines(&bucket, &outcome) {
                    self.printer.line(&line);
                }
                for line in failure_lines(&bucket, &outcome) {
                    self.printer.error(&line);
                }
            }
        }
        Ok(())
    }

    async fn remove_globs(&self, groups: BucketKeyGroup) -> Result<()> {
        if groups.is_empty() {
            return Ok(());
        }

        let pool = JobPool::new(self.options.parallel, Arc::clone(&self.printer));

        'submit: for (bucket, patterns) in groups {
            for pattern in patterns {
                let prefix = pattern.strip_suffix('*').unwrap_or(&pattern).to_string();
                let params = ListParams::flat(bucket.clone(), prefix);
                let lister = Lister::new(Arc::clone(&self.store), params, pool.cancellation_token())
                    .with_page_size(self.options.page_size);
                let store = Arc::clone(&self.store);
                let bucket = bucket.clone();

                let queued = pool
                    .submit(move |out| async move {
                        let mut lister = lister;
                        while let Some(page) = lister.next_page().await? {
                            let keys: Vec<String> = page
                                .entries
                                .into_iter()
                                .filter(|e| !e.is_dir)
                                .map(|e| e.key)
                                .collect();
                            for batch in keys.chunks(MAX_DELETE_BATCH) {
                                let outcome = store.delete_objects(&bucket, batch.to_vec()).await?;
                                report(&out, &bucket, &outcome).await;
                            }
                        }
                        Ok(())
                    })
                    .await;
                if !queued {
                    break 'submit;
                }
            }
        }

        pool.finish().await
    }
}

async fn report(out: &OutputSender, bucket: &str, outcome: &DeleteOutcome) {
    for line in deleted_lines(bucket, outcome) {
        out.send(line).await;
    }
    for line in failure_lines(bucket, outcome) {
        out.send_error(line).await;
    }
}

fn deleted_lines(bucket: &str, outcome: &DeleteOutcome) -> Vec<String> {
    outcome
        .deleted
        .iter()
        .map(|key| format!("{} deleted", format_object_path(bucket, key)))
        .collect()
}

fn failure_lines(bucket: &str, outcome: &DeleteOutcome) -> Vec<String> {
    outcome
        .errors
        .iter()
        .map(|failure| {
            tracing::warn!(bucket, key = %failure.key, "delete failed: {}", failure.message);
            format!(
                "failed to delete {}: {}",
                format_object_path(bucket, &failure.key),
                failure.message
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DeleteFailure;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_globs_and_regulars() {
        let cases = [
            (
                "all globs",
                strings(&["s3://a/foo/*", "s3://a/bar/*"]),
                strings(&["s3://a/foo/*", "s3://a/bar/*"]),
                strings(&[]),
            ),
            (
                "all regulars",
                strings(&["s3://a/foo/", "s3://a/bar/"]),
                strings(&[]),
                strings(&["s3://a/foo/", "s3://a/bar/"]),
            ),
            (
                "mixed",
                strings(&["s3://a/foo/*", "s3://a/bar/"]),
                strings(&["s3://a/foo/*"]),
                strings(&["s3://a/bar/"]),
            ),
        ];

        for (name, input, want_globs, want_regulars) in cases {
            let (globs, regulars) = split_globs_and_regulars(&input);
            assert_eq!(globs, want_globs, "{name}");
            assert_eq!(regulars, want_regulars, "{name}");
        }
    }

    #[test]
    fn test_group_by_bucket() {
        let paths = strings(&["s3://b1/k1", "s3://b1/k2", "s3://b1/k3", "s3://b2/k4", "s3://b2/k5"]);
        let got = group_by_bucket(&paths).unwrap();

        let mut want = BucketKeyGroup::new();
        want.insert("b1".into(), strings(&["k1", "k2", "k3"]));
        want.insert("b2".into(), strings(&["k4", "k5"]));
        assert_eq!(got, want);
    }

    #[test]
    fn test_group_by_bucket_rejects_local_path() {
        let paths = strings(&["s3://b1/k1", "/tmp/file"]);
        assert!(group_by_bucket(&paths).is_err());
    }

    #[test]
    fn test_report_lines() {
        let outcome = DeleteOutcome {
            deleted: strings(&["a", "b"]),
            errors: vec![DeleteFailure {
                key: "c".into(),
                message: "AccessDenied".into(),
            }],
        };
        assert_eq!(
            deleted_lines("bk", &outcome),
            strings(&["s3://bk/a deleted", "s3://bk/b deleted"])
        );
        assert_eq!(
            failure_lines("bk", &outcome),
            strings(&["failed to delete s3://bk/c: AccessDenied"])
        );
    }
}
