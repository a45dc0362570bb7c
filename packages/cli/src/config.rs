//! Preference resolution.
//!
//! Hook runs pull their values from three places, in precedence order:
//! explicit `--var KEY=value` overrides, `name="KEY" value="..."` preference
//! elements in the app's `config.xml`, and the platform `Info.plist` (bundle
//! version fields come from the plist only). Resolution is a pure function
//! of those inputs; nothing here reads process-wide state.

use crate::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

/// Appended to the app's bundle identifier to form the extension's.
pub(crate) const BUNDLE_SUFFIX: &str = ".shareextension";

/// One placeholder token and the text that replaces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Preference {
    pub(crate) key: String,
    pub(crate) value: String,
}

/// The bundle version fields of `<ProjectName>-Info.plist`.
#[derive(Debug, Deserialize)]
struct InfoPlist {
    #[serde(rename = "CFBundleShortVersionString")]
    short_version: String,

    #[serde(rename = "CFBundleVersion")]
    version: String,
}

/// Read `config.xml` at the project root, skipping any junk bytes (BOM,
/// editor artifacts) ahead of the first element.
pub(crate) async fn read_config_xml(project_root: &Path) -> Result<String> {
    let path = project_root.join("config.xml");
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| Error::Unique(format!("failed to read {}: {e}", path.display())))?;

    match raw.find('<') {
        Some(start) => Ok(raw[start..].to_string()),
        None => Ok(raw),
    }
}

/// Extract a named preference from the configuration document, matching the
/// `name="X" value="Y"` attribute pair case-insensitively.
fn preference_value(config_xml: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"(?i)name="{}" value="(.*?)""#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(config_xml)
        .map(|caps| caps[1].to_string())
}

/// Resolve a single named value: a `NAME=value` override wins, else the
/// config-document preference.
pub(crate) fn resolve_parameter(
    config_xml: &str,
    overrides: &[String],
    name: &str,
) -> Option<String> {
    let prefix = format!("{name}=");
    if let Some(arg) = overrides.iter().find(|arg| arg.starts_with(&prefix)) {
        return Some(arg[prefix.len()..].to_string());
    }

    preference_value(config_xml, name)
}

fn required_parameter(config_xml: &str, overrides: &[String], name: &str) -> Result<String> {
    resolve_parameter(config_xml, overrides, name).ok_or_else(|| {
        Error::NotFound(format!(
            "preference `{name}` (set it in config.xml or pass --var {name}=...)"
        ))
    })
}

/// The Android package name: the widget's `android-packageName` attribute,
/// falling back to its `id`. An `ANDROID_PACKAGE_NAME=` override wins over
/// both.
pub(crate) fn android_package_name(config_xml: &str, overrides: &[String]) -> Result<String> {
    const OVERRIDE: &str = "ANDROID_PACKAGE_NAME=";
    if let Some(arg) = overrides.iter().find(|arg| arg.starts_with(OVERRIDE)) {
        return Ok(arg[OVERRIDE.len()..].to_string());
    }

    widget_attribute(config_xml, "android-packageName")
        .or_else(|| widget_attribute(config_xml, "id"))
        .ok_or_else(|| {
            Error::NotFound("widget id in config.xml (no package name to embed)".to_string())
        })
}

/// An attribute of the document's `<widget ...>` element.
fn widget_attribute(config_xml: &str, attr: &str) -> Option<String> {
    let start = config_xml.find("<widget")?;
    let tag = &config_xml[start..start + config_xml[start..].find('>')?];

    let pattern = format!(r#"{}="([^"]*)""#, regex::escape(attr));
    let re = Regex::new(&pattern).ok()?;
    re.captures(tag).map(|caps| caps[1].to_string())
}

fn read_info_plist(ios_dir: &Path, project_name: &str) -> Result<InfoPlist> {
    let path = ios_dir
        .join(project_name)
        .join(format!("{project_name}-Info.plist"));

    tracing::debug!("Reading bundle versions from {}", path.display());
    Ok(plist::from_file(&path)?)
}

/// Produce the ordered preference list for the share extension templates.
///
/// `ios_dir` is the platform folder holding `<project_name>.xcodeproj`;
/// `overrides` is the explicit `--var` list from the command line.
pub(crate) async fn resolve_preferences(
    project_root: &Path,
    ios_dir: &Path,
    project_name: &str,
    overrides: &[String],
) -> Result<Vec<Preference>> {
    let config_xml = read_config_xml(project_root).await?;
    let info = read_info_plist(ios_dir, project_name)?;

    let bundle_identifier =
        required_parameter(&config_xml, overrides, "IOS_BUNDLE_IDENTIFIER")?;

    Ok(vec![
        Preference {
            key: "__DISPLAY_NAME__".to_string(),
            value: resolve_parameter(&config_xml, overrides, "DISPLAY_NAME")
                .unwrap_or_else(|| project_name.to_string()),
        },
        Preference {
            key: "__BUNDLE_IDENTIFIER__".to_string(),
            value: format!("{bundle_identifier}{BUNDLE_SUFFIX}"),
        },
        Preference {
            key: "__BUNDLE_SHORT_VERSION_STRING__".to_string(),
            value: info.short_version,
        },
        Preference {
            key: "__BUNDLE_VERSION__".to_string(),
            value: info.version,
        },
        Preference {
            key: "__URL_SCHEME__".to_string(),
            value: required_parameter(&config_xml, overrides, "IOS_URL_SCHEME")?,
        },
    ])
}
