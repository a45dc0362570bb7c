use super::*;
use crate::{config, copy, locate};

/// Where the plugin's template tree lives, relative to the project root.
const TEMPLATE_DIR: &str = "templates/ios/ShareExtension";

/// Copy the ShareExtension template tree into `platforms/ios`, substituting
/// preference tokens in every copied file.
#[derive(Clone, Debug, Default, Parser)]
#[clap(name = "ios-copy-files")]
pub(crate) struct IosCopyFiles {
    #[clap(flatten)]
    pub(crate) args: HookArgs,
}

impl IosCopyFiles {
    pub(crate) async fn run(self) -> Result<()> {
        tracing::info!("Copying ShareExtension files to the iOS project");

        let ios_dir = self.args.ios_dir();
        let project = locate::find_xcodeproj(&ios_dir).await?;
        let preferences = config::resolve_preferences(
            &self.args.project_root,
            &ios_dir,
            &project.project_name,
            &self.args.vars,
        )
        .await?;

        let src_folder = self.args.project_root.join(TEMPLATE_DIR);
        copy::copy_tree(&src_folder, &ios_dir, &preferences).await?;

        tracing::info!("Copied ShareExtension into {}", ios_dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::scaffold_ios_project;

    #[tokio::test]
    async fn copies_and_substitutes_the_template_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        scaffold_ios_project(root).await;

        let template = root.join(TEMPLATE_DIR);
        tokio::fs::create_dir_all(&template).await.unwrap();
        tokio::fs::write(
            template.join("ShareExtension-Info.plist"),
            "<string>__BUNDLE_IDENTIFIER__ v__BUNDLE_VERSION__</string>",
        )
        .await
        .unwrap();

        let hook = IosCopyFiles {
            args: HookArgs {
                project_root: root.to_path_buf(),
                vars: Vec::new(),
            },
        };
        hook.run().await.unwrap();

        let copied = root.join("platforms/ios/ShareExtension/ShareExtension-Info.plist");
        let contents = tokio::fs::read_to_string(&copied).await.unwrap();
        assert_eq!(contents, "<string>com.example.app.shareextension v3</string>");
    }

    #[tokio::test]
    async fn missing_template_tree_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        scaffold_ios_project(dir.path()).await;

        let hook = IosCopyFiles {
            args: HookArgs {
                project_root: dir.path().to_path_buf(),
                vars: Vec::new(),
            },
        };
        assert!(hook.run().await.is_err());
    }
}
