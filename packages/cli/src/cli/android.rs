use super::*;
use crate::{
    config::{self, Preference},
    custom_error, substitute,
};

/// Path of the generated activity source, relative to the project root.
const ACTIVITY_PATH: &str =
    "platforms/android/app/src/main/java/com/missiveapp/openwith/OpenWithActivity.java";

const PACKAGE_TOKEN: &str = "##ANDROID_PACKAGE_NAME##";

/// Embed the computed Android package name into the open-with activity.
#[derive(Clone, Debug, Default, Parser)]
#[clap(name = "android-package")]
pub(crate) struct AndroidPackage {
    #[clap(flatten)]
    pub(crate) args: HookArgs,
}

impl AndroidPackage {
    pub(crate) async fn run(self) -> Result<()> {
        let config_xml = config::read_config_xml(&self.args.project_root).await?;
        let package_name = config::android_package_name(&config_xml, &self.args.vars)?;

        let activity = self.args.project_root.join(ACTIVITY_PATH);
        if !activity.is_file() {
            return custom_error!(
                "missing open-with activity at {}; was the android platform prepared?",
                activity.display()
            );
        }

        tracing::info!("Embedding package name {package_name} into {ACTIVITY_PATH}");

        let preferences = vec![Preference {
            key: PACKAGE_TOKEN.to_string(),
            value: package_name,
        }];
        substitute::substitute_file(&activity, &preferences).await?;

        Ok(())
    }
}
