pub(crate) mod add_target;
pub(crate) mod android;
pub(crate) mod copy_files;

use crate::error::Result;
use clap::Parser;
use std::{fmt::Display, path::PathBuf};

/// Package share-extension support into iOS & Android app projects.
#[derive(Parser)]
#[clap(name = "openwith", version)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub(crate) action: Commands,

    /// Enable verbose logging.
    #[clap(short, long, global = true)]
    pub(crate) verbose: bool,
}

#[derive(Parser)]
pub(crate) enum Commands {
    /// Embed the app's Android package name into the generated open-with activity.
    AndroidPackage(android::AndroidPackage),

    /// Add the ShareExt target, phases, group and entitlements to the Xcode project.
    IosAddTarget(add_target::IosAddTarget),

    /// Copy the ShareExtension template files into the iOS project tree.
    IosCopyFiles(copy_files::IosCopyFiles),
}

impl Display for Commands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Commands::AndroidPackage(_) => write!(f, "android-package"),
            Commands::IosAddTarget(_) => write!(f, "ios-add-target"),
            Commands::IosCopyFiles(_) => write!(f, "ios-copy-files"),
        }
    }
}

/// Arguments every hook shares.
#[derive(Clone, Debug, Default, Parser)]
pub(crate) struct HookArgs {
    /// The packaged app's root directory (holds config.xml and platforms/).
    #[clap(long, default_value = ".")]
    pub(crate) project_root: PathBuf,

    /// Override a configuration value, e.g. `--var IOS_URL_SCHEME=myapp`.
    /// Overrides win over config.xml preferences.
    #[clap(long = "var", value_name = "KEY=VALUE")]
    pub(crate) vars: Vec<String>,
}

impl HookArgs {
    /// The iOS platform folder holding the `.xcodeproj` container.
    pub(crate) fn ios_dir(&self) -> PathBuf {
        self.project_root.join("platforms").join("ios")
    }
}
