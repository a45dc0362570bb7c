use super::*;
use crate::{
    config, locate,
    pbxproj::{BuildPhase, PbxProject},
    substitute,
};
use std::path::Path;

const TARGET_NAME: &str = "ShareExt";
const EXTENSION_FOLDER: &str = "ShareExtension";
const PARENT_GROUP: &str = "CustomTemplate";
const ENTITLEMENTS_PATH: &str = "ShareExtension/ShareExtension.entitlements";

/// How a discovered extension file participates in the build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FileKind {
    /// Compiled code and headers; goes in the group and the sources phase.
    Source,
    /// Property lists and entitlements; goes in the group only.
    Config,
    /// Everything else; goes in the group and the resources phase.
    Resource,
}

#[derive(Clone, Debug)]
struct FileEntry {
    name: String,
    path: std::path::PathBuf,
    kind: FileKind,
}

fn classify(name: &str) -> FileKind {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("h") | Some("m") | Some("swift") => FileKind::Source,
        Some("plist") | Some("entitlements") => FileKind::Config,
        _ => FileKind::Resource,
    }
}

/// List the extension's files, skipping dot-junk like `.DS_Store`.
async fn collect_extension_files(dir: &Path) -> Result<Vec<FileEntry>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| crate::Error::Unique(format!("failed to list {}: {e}", dir.display())))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if name.starts_with('.') || !entry.file_type().await?.is_file() {
            continue;
        }

        files.push(FileEntry {
            name: name.to_string(),
            path: entry.path(),
            kind: classify(name),
        });
    }

    // directory order is platform-dependent; keep runs deterministic
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

/// Add the ShareExt app-extension target to the Xcode project.
#[derive(Clone, Debug, Default, Parser)]
#[clap(name = "ios-add-target")]
pub(crate) struct IosAddTarget {
    #[clap(flatten)]
    pub(crate) args: HookArgs,
}

impl IosAddTarget {
    pub(crate) async fn run(self) -> Result<()> {
        tracing::info!("Adding {TARGET_NAME} target to the Xcode project");

        let ios_dir = self.args.ios_dir();
        let project = locate::find_xcodeproj(&ios_dir).await?;
        let preferences = config::resolve_preferences(
            &self.args.project_root,
            &ios_dir,
            &project.project_name,
            &self.args.vars,
        )
        .await?;

        let pbxproj_path = project.folder_path.join("project.pbxproj");
        tracing::debug!("Parsing existing project at {}", pbxproj_path.display());
        let mut pbx = PbxProject::open(&pbxproj_path).await?;

        let files = collect_extension_files(&ios_dir.join(EXTENSION_FOLDER)).await?;

        // Tokens must be resolved before the files are wired into the build.
        // This writes the files in place and is not rolled back if a later
        // step fails; a rerun converges since substitution is a fixed point.
        for file in files
            .iter()
            .filter(|f| matches!(f.kind, FileKind::Config | FileKind::Source))
        {
            substitute::substitute_file(&file.path, &preferences).await?;
        }

        let target_id = match pbx.target_by_name(TARGET_NAME) {
            Some(id) => {
                tracing::info!("{TARGET_NAME} target already exists");
                id
            }
            None => {
                let id = pbx.add_target(TARGET_NAME, EXTENSION_FOLDER)?;
                // An extension builds as its own little app, so it gets its
                // own sources and resources phases.
                pbx.add_build_phase(&id, BuildPhase::Sources)?;
                pbx.add_build_phase(&id, BuildPhase::Resources)?;
                id
            }
        };

        let group_id = match pbx.group_by_name(EXTENSION_FOLDER) {
            Some(id) => {
                tracing::info!("{EXTENSION_FOLDER} group already exists");
                id
            }
            None => {
                let id = pbx.create_group(EXTENSION_FOLDER, EXTENSION_FOLDER);
                let parent = match pbx.group_by_name(PARENT_GROUP) {
                    Some(parent) => parent,
                    None => pbx.main_group()?,
                };
                pbx.add_to_group(&id, &parent)?;
                id
            }
        };

        for file in &files {
            match file.kind {
                FileKind::Config => pbx.add_file(&file.name, &group_id)?,
                FileKind::Source => pbx.add_source_file(&file.name, &group_id, &target_id)?,
                FileKind::Resource => pbx.add_resource_file(&file.name, &group_id, &target_id)?,
            }
        }

        pbx.set_code_sign_entitlements(TARGET_NAME, ENTITLEMENTS_PATH);

        pbx.write(&pbxproj_path).await?;
        tracing::info!("Added {TARGET_NAME} target to the Xcode project");

        Ok(())
    }
}
