//! Recursive template-tree copy with token substitution.

use crate::{config::Preference, substitute::substitute_file, Error, Result};
use std::{future::Future, path::Path, path::PathBuf, pin::Pin};

/// Copy `src_dir` under `dest_parent` (as `dest_parent/<basename>`),
/// substituting preferences in every copied file.
///
/// Existing destination directories are reused and files are overwritten, so
/// a re-run converges; files that vanished from the source are never
/// deleted from the destination.
pub(crate) async fn copy_tree(
    src_dir: &Path,
    dest_parent: &Path,
    preferences: &[Preference],
) -> Result<()> {
    if !src_dir.is_dir() {
        return Err(Error::NotFound(format!(
            "missing extension project folder in {}",
            src_dir.display()
        )));
    }

    copy_folder(src_dir.to_path_buf(), dest_parent.to_path_buf(), preferences).await
}

// Boxed for async recursion.
fn copy_folder<'a>(
    source: PathBuf,
    dest_parent: PathBuf,
    preferences: &'a [Preference],
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        let base_name = source
            .file_name()
            .ok_or_else(|| Error::Unique(format!("no base name for {}", source.display())))?;
        let target_folder = dest_parent.join(base_name);

        if !target_folder.is_dir() {
            tokio::fs::create_dir_all(&target_folder).await?;
        }

        let mut entries = tokio::fs::read_dir(&source).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            if entry.file_type().await?.is_dir() {
                copy_folder(path, target_folder.clone(), preferences).await?;
            } else {
                let target_file = target_folder.join(entry.file_name());
                tokio::fs::copy(&path, &target_file).await?;
                substitute_file(&target_file, preferences).await?;
            }
        }

        Ok(())
    })
}
