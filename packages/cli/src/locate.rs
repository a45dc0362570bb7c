//! Locating the native Xcode project container.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

const PROJECT_SUFFIX: &str = ".xcodeproj";

/// A resolved `<Name>.xcodeproj` container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct XcodeProject {
    /// Full path of the `.xcodeproj` folder.
    pub(crate) folder_path: PathBuf,

    /// The container name with the `.xcodeproj` suffix stripped.
    pub(crate) project_name: String,
}

/// Scan `ios_dir` for the app's `.xcodeproj` container.
///
/// Exactly one container must exist: zero matches means the platform was
/// never prepared, and more than one means we cannot tell which project the
/// hook should patch, so both abort the run.
pub(crate) async fn find_xcodeproj(ios_dir: &Path) -> Result<XcodeProject> {
    let mut entries = tokio::fs::read_dir(ios_dir)
        .await
        .map_err(|e| Error::Unique(format!("failed to list {}: {e}", ios_dir.display())))?;

    let mut found: Option<XcodeProject> = None;

    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };

        let Some(project_name) = name.strip_suffix(PROJECT_SUFFIX) else {
            continue;
        };

        if let Some(previous) = &found {
            return Err(Error::Unique(format!(
                "ambiguous project containers in {}: both {}.xcodeproj and {name} match",
                ios_dir.display(),
                previous.project_name,
            )));
        }

        found = Some(XcodeProject {
            folder_path: entry.path(),
            project_name: project_name.to_string(),
        });
    }

    found.ok_or_else(|| {
        Error::NotFound(format!(
            "could not find an {PROJECT_SUFFIX} folder in {}",
            ios_dir.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_match_strips_the_suffix_exactly() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("MyApp.xcodeproj"))
            .await
            .unwrap();
        tokio::fs::create_dir(dir.path().join("MyApp")).await.unwrap();

        let project = find_xcodeproj(dir.path()).await.unwrap();
        assert_eq!(project.project_name, "MyApp");
        assert_eq!(project.folder_path, dir.path().join("MyApp.xcodeproj"));
    }

    #[tokio::test]
    async fn no_match_is_a_not_found_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_xcodeproj(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn multiple_matches_are_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("One.xcodeproj"))
            .await
            .unwrap();
        tokio::fs::create_dir(dir.path().join("Two.xcodeproj"))
            .await
            .unwrap();

        let err = find_xcodeproj(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }
}
