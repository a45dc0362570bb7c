//! Placeholder substitution over template files.
//!
//! Template sources carry literal tokens (`__BUNDLE_IDENTIFIER__`,
//! `##ANDROID_PACKAGE_NAME##`, ...) that get rewritten in place with values
//! resolved from the app's configuration. Replacement is plain text with no
//! awareness of the file's own syntax; the token set is chosen to never
//! collide with real Java/plist/pbxproj contents.

use crate::{config::Preference, Result};
use std::path::Path;

/// Rewrite every literal occurrence of each preference key in `path` with
/// its value, overwriting the file in place.
///
/// Preferences apply in list order over the whole text, so a value that
/// itself contains a later key token will be rewritten again by that later
/// pass. Callers rely on the token set being non-overlapping.
pub(crate) async fn substitute_file(path: &Path, preferences: &[Preference]) -> Result<()> {
    let contents = tokio::fs::read_to_string(path).await?;
    tokio::fs::write(path, replace_all(&contents, preferences)).await?;
    Ok(())
}

fn replace_all(text: &str, preferences: &[Preference]) -> String {
    let mut out = text.to_string();
    for pref in preferences {
        out = out.replace(&pref.key, &pref.value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preference;

    fn prefs(pairs: &[(&str, &str)]) -> Vec<Preference> {
        pairs
            .iter()
            .map(|(k, v)| Preference {
                key: k.to_string(),
                value: v.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn replaces_every_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("OpenWithActivity.java");
        tokio::fs::write(
            &file,
            "package ##ANDROID_PACKAGE_NAME##;\n// reopen ##ANDROID_PACKAGE_NAME## later\nclass A {}\n",
        )
        .await
        .unwrap();

        let preferences = prefs(&[("##ANDROID_PACKAGE_NAME##", "com.foo.bar")]);
        substitute_file(&file, &preferences).await.unwrap();

        let result = tokio::fs::read_to_string(&file).await.unwrap();
        assert_eq!(
            result,
            "package com.foo.bar;\n// reopen com.foo.bar later\nclass A {}\n"
        );
    }

    #[tokio::test]
    async fn substitution_is_a_fixed_point_for_non_overlapping_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Info.plist");
        tokio::fs::write(&file, "<string>__BUNDLE_IDENTIFIER__</string>")
            .await
            .unwrap();

        let preferences = prefs(&[("__BUNDLE_IDENTIFIER__", "com.example.app.shareextension")]);
        substitute_file(&file, &preferences).await.unwrap();
        let once = tokio::fs::read_to_string(&file).await.unwrap();

        substitute_file(&file, &preferences).await.unwrap();
        let twice = tokio::fs::read_to_string(&file).await.unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn replacement_follows_list_order() {
        let preferences = prefs(&[("__A__", "x __B__ x"), ("__B__", "y")]);
        // later keys rewrite text introduced by earlier values
        assert_eq!(replace_all("__A__", &preferences), "x y x");
    }

    #[test]
    fn untouched_text_survives() {
        let preferences = prefs(&[("__URL_SCHEME__", "openwith-demo")]);
        assert_eq!(
            replace_all("<key>CFBundleURLName</key>", &preferences),
            "<key>CFBundleURLName</key>"
        );
    }
}
