//! A narrow handle over the Xcode project's object graph.
//!
//! The descriptor holds a flat `objects` dictionary of 24-hex-char IDs to
//! typed dictionaries (`isa` discriminates), plus a `rootObject` pointing at
//! the `PBXProject`. This module exposes only the operations the hooks
//! need: find-or-create of targets, phases and groups, file wiring, the
//! entitlements build setting, and serialization.
//!
//! Creation is look-up-before-create throughout, which is what makes a
//! second hook run converge instead of duplicating objects.

use super::value::{self, Dict, Value};
use crate::{Error, Result};
use std::path::Path;

/// The extension target's two build phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BuildPhase {
    Sources,
    Resources,
}

impl BuildPhase {
    fn isa(self) -> &'static str {
        match self {
            BuildPhase::Sources => "PBXSourcesBuildPhase",
            BuildPhase::Resources => "PBXResourcesBuildPhase",
        }
    }
}

pub(crate) struct PbxProject {
    root: Dict,
}

impl PbxProject {
    /// Open and parse the descriptor at `path`.
    pub(crate) async fn open(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Unique(format!("failed to read {}: {e}", path.display())))?;
        Self::parse_str(&text)
    }

    pub(crate) fn parse_str(text: &str) -> Result<Self> {
        let root = value::parse(text)?;

        if !matches!(root.get("objects"), Some(Value::Dict(_))) {
            return Err(Error::Parse("descriptor has no objects table".to_string()));
        }
        if root.get_str("rootObject").is_none() {
            return Err(Error::Parse("descriptor has no rootObject".to_string()));
        }

        Ok(Self { root })
    }

    /// Serialize the mutated graph back over the descriptor file.
    pub(crate) async fn write(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, self.serialize()).await?;
        Ok(())
    }

    pub(crate) fn serialize(&self) -> String {
        value::serialize(&self.root)
    }

    fn objects(&self) -> &Dict {
        match self.root.get("objects") {
            Some(Value::Dict(d)) => d,
            _ => unreachable!("validated in parse_str"),
        }
    }

    fn objects_mut(&mut self) -> &mut Dict {
        match self.root.get_mut("objects") {
            Some(Value::Dict(d)) => d,
            _ => unreachable!("validated in parse_str"),
        }
    }

    fn object_mut(&mut self, id: &str) -> Result<&mut Dict> {
        self.objects_mut()
            .get_mut(id)
            .and_then(Value::as_dict_mut)
            .ok_or_else(|| Error::NotFound(format!("project object {id}")))
    }

    fn find_object(&self, pred: impl Fn(&Dict) -> bool) -> Option<String> {
        self.objects().entries().find_map(|(id, v)| {
            v.as_dict()
                .filter(|dict| pred(dict))
                .map(|_| id.to_string())
        })
    }

    fn project_object_id(&self) -> Result<String> {
        self.root
            .get_str("rootObject")
            .map(str::to_string)
            .ok_or_else(|| Error::Parse("descriptor has no rootObject".to_string()))
    }

    /// The ID of the named native target, if present.
    ///
    /// Older runs of the original tooling stored target names with literal
    /// surrounding quotes, so both spellings are accepted.
    pub(crate) fn target_by_name(&self, name: &str) -> Option<String> {
        self.find_object(|dict| {
            dict.get_str("isa") == Some("PBXNativeTarget")
                && dict.get_str("name").is_some_and(|n| name_matches(n, name))
        })
    }

    /// Create an app-extension native target with its product reference and
    /// Debug/Release configuration list, and register it with the project.
    pub(crate) fn add_target(&mut self, name: &str, subfolder: &str) -> Result<String> {
        let product_ref_id = generate_id();
        let mut product_ref = Dict::new();
        product_ref.insert("isa", Value::string("PBXFileReference"));
        product_ref.insert("explicitFileType", Value::string("wrapper.app-extension"));
        product_ref.insert("includeInIndex", Value::string("0"));
        product_ref.insert("path", Value::string(format!("{name}.appex")));
        product_ref.insert("sourceTree", Value::string("BUILT_PRODUCTS_DIR"));
        self.objects_mut()
            .insert(product_ref_id.clone(), Value::Dict(product_ref));

        let mut configuration_ids = Vec::new();
        for configuration_name in ["Debug", "Release"] {
            let mut settings = Dict::new();
            settings.insert(
                "INFOPLIST_FILE",
                Value::string(format!("{subfolder}/{subfolder}-Info.plist")),
            );
            settings.insert("PRODUCT_NAME", Value::string(name));
            settings.insert("SKIP_INSTALL", Value::string("YES"));

            let mut configuration = Dict::new();
            configuration.insert("isa", Value::string("XCBuildConfiguration"));
            configuration.insert("buildSettings", Value::Dict(settings));
            configuration.insert("name", Value::string(configuration_name));

            let id = generate_id();
            self.objects_mut()
                .insert(id.clone(), Value::Dict(configuration));
            configuration_ids.push(Value::String(id));
        }

        let list_id = generate_id();
        let mut list = Dict::new();
        list.insert("isa", Value::string("XCConfigurationList"));
        list.insert("buildConfigurations", Value::Array(configuration_ids));
        list.insert("defaultConfigurationIsVisible", Value::string("0"));
        list.insert("defaultConfigurationName", Value::string("Release"));
        self.objects_mut().insert(list_id.clone(), Value::Dict(list));

        let target_id = generate_id();
        let mut target = Dict::new();
        target.insert("isa", Value::string("PBXNativeTarget"));
        target.insert("buildConfigurationList", Value::string(list_id));
        target.insert("buildPhases", Value::Array(Vec::new()));
        target.insert("buildRules", Value::Array(Vec::new()));
        target.insert("dependencies", Value::Array(Vec::new()));
        target.insert("name", Value::string(name));
        target.insert("productName", Value::string(name));
        target.insert("productReference", Value::string(product_ref_id.clone()));
        target.insert(
            "productType",
            Value::string("com.apple.product-type.app-extension"),
        );
        self.objects_mut()
            .insert(target_id.clone(), Value::Dict(target));

        let project_id = self.project_object_id()?;
        let project = self.object_mut(&project_id)?;
        project
            .ensure_array("targets")
            .push(Value::string(&*target_id));

        // keep the product artifact visible under the Products group
        if let Some(products) = self.group_by_name("Products") {
            self.add_to_group(&product_ref_id, &products)?;
        }

        Ok(target_id)
    }

    /// Create an empty build phase and attach it to the target.
    pub(crate) fn add_build_phase(&mut self, target_id: &str, phase: BuildPhase) -> Result<String> {
        let phase_id = generate_id();
        let mut dict = Dict::new();
        dict.insert("isa", Value::string(phase.isa()));
        dict.insert("buildActionMask", Value::string("2147483647"));
        dict.insert("files", Value::Array(Vec::new()));
        dict.insert("runOnlyForDeploymentPostprocessing", Value::string("0"));
        self.objects_mut()
            .insert(phase_id.clone(), Value::Dict(dict));

        let target = self.object_mut(target_id)?;
        target
            .ensure_array("buildPhases")
            .push(Value::string(&*phase_id));

        Ok(phase_id)
    }

    /// The named build phase of a target.
    pub(crate) fn target_phase(&self, target_id: &str, phase: BuildPhase) -> Result<String> {
        let target = self
            .objects()
            .get(target_id)
            .and_then(Value::as_dict)
            .ok_or_else(|| Error::NotFound(format!("project object {target_id}")))?;

        let phases = target
            .get("buildPhases")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::NotFound(format!("build phases of target {target_id}")))?;

        for id in phases.iter().filter_map(Value::as_str) {
            let isa = self
                .objects()
                .get(id)
                .and_then(Value::as_dict)
                .and_then(|d| d.get_str("isa"));
            if isa == Some(phase.isa()) {
                return Ok(id.to_string());
            }
        }

        Err(Error::NotFound(format!(
            "{} phase of target {target_id}",
            phase.isa()
        )))
    }

    /// The ID of the named group, if present.
    pub(crate) fn group_by_name(&self, name: &str) -> Option<String> {
        self.find_object(|dict| {
            dict.get_str("isa") == Some("PBXGroup")
                && dict.get_str("name").is_some_and(|n| name_matches(n, name))
        })
    }

    /// The project's main group.
    pub(crate) fn main_group(&self) -> Result<String> {
        let project_id = self.project_object_id()?;
        self.objects()
            .get(&project_id)
            .and_then(Value::as_dict)
            .and_then(|d| d.get_str("mainGroup"))
            .map(str::to_string)
            .ok_or_else(|| Error::NotFound("main group of the project".to_string()))
    }

    pub(crate) fn create_group(&mut self, name: &str, path: &str) -> String {
        let group_id = generate_id();
        let mut dict = Dict::new();
        dict.insert("isa", Value::string("PBXGroup"));
        dict.insert("children", Value::Array(Vec::new()));
        dict.insert("name", Value::string(name));
        dict.insert("path", Value::string(path));
        dict.insert("sourceTree", Value::string("<group>"));
        self.objects_mut().insert(group_id.clone(), Value::Dict(dict));
        group_id
    }

    /// Attach `child_id` to a group, once.
    pub(crate) fn add_to_group(&mut self, child_id: &str, group_id: &str) -> Result<()> {
        let group = self.object_mut(group_id)?;
        let children = group.ensure_array("children");

        if !children.iter().any(|c| c.as_str() == Some(child_id)) {
            children.push(Value::string(child_id));
        }

        Ok(())
    }

    fn file_reference_by_path(&self, path: &str) -> Option<String> {
        self.find_object(|dict| {
            dict.get_str("isa") == Some("PBXFileReference")
                && dict.get_str("path").is_some_and(|p| name_matches(p, path))
        })
    }

    fn ensure_file_reference(&mut self, name: &str) -> String {
        if let Some(id) = self.file_reference_by_path(name) {
            return id;
        }

        let id = generate_id();
        let mut dict = Dict::new();
        dict.insert("isa", Value::string("PBXFileReference"));
        dict.insert("lastKnownFileType", Value::string(last_known_file_type(name)));
        dict.insert("path", Value::string(name));
        dict.insert("sourceTree", Value::string("<group>"));
        self.objects_mut().insert(id.clone(), Value::Dict(dict));
        id
    }

    fn ensure_build_file(&mut self, file_ref_id: &str) -> String {
        let existing = self.find_object(|dict| {
            dict.get_str("isa") == Some("PBXBuildFile")
                && dict.get_str("fileRef") == Some(file_ref_id)
        });
        if let Some(id) = existing {
            return id;
        }

        let id = generate_id();
        let mut dict = Dict::new();
        dict.insert("isa", Value::string("PBXBuildFile"));
        dict.insert("fileRef", Value::string(file_ref_id));
        self.objects_mut().insert(id.clone(), Value::Dict(dict));
        id
    }

    fn add_to_phase(&mut self, build_file_id: &str, phase_id: &str) -> Result<()> {
        let phase = self.object_mut(phase_id)?;
        let files = phase
            .get_mut("files")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| Error::Parse(format!("phase {phase_id} has no files array")))?;

        if !files.iter().any(|f| f.as_str() == Some(build_file_id)) {
            files.push(Value::string(build_file_id));
        }

        Ok(())
    }

    /// A file that belongs to the group but to no build phase (plists,
    /// entitlements).
    pub(crate) fn add_file(&mut self, name: &str, group_id: &str) -> Result<()> {
        let file_ref = self.ensure_file_reference(name);
        self.add_to_group(&file_ref, group_id)
    }

    /// A compiled source: group plus the target's sources phase.
    pub(crate) fn add_source_file(
        &mut self,
        name: &str,
        group_id: &str,
        target_id: &str,
    ) -> Result<()> {
        let file_ref = self.ensure_file_reference(name);
        self.add_to_group(&file_ref, group_id)?;

        let phase = self.target_phase(target_id, BuildPhase::Sources)?;
        let build_file = self.ensure_build_file(&file_ref);
        self.add_to_phase(&build_file, &phase)
    }

    /// A resource: group plus the target's resources phase.
    pub(crate) fn add_resource_file(
        &mut self,
        name: &str,
        group_id: &str,
        target_id: &str,
    ) -> Result<()> {
        let file_ref = self.ensure_file_reference(name);
        self.add_to_group(&file_ref, group_id)?;

        let phase = self.target_phase(target_id, BuildPhase::Resources)?;
        let build_file = self.ensure_build_file(&file_ref);
        self.add_to_phase(&build_file, &phase)
    }

    /// Point `CODE_SIGN_ENTITLEMENTS` at `entitlements_path` in every build
    /// configuration whose product name contains `product_contains`.
    pub(crate) fn set_code_sign_entitlements(
        &mut self,
        product_contains: &str,
        entitlements_path: &str,
    ) {
        for (_, object) in self.objects_mut().entries_mut() {
            let Some(dict) = object.as_dict_mut() else {
                continue;
            };
            if dict.get_str("isa") != Some("XCBuildConfiguration") {
                continue;
            }
            let Some(settings) = dict.get_mut("buildSettings").and_then(Value::as_dict_mut)
            else {
                continue;
            };

            let product_matches = settings
                .get_str("PRODUCT_NAME")
                .is_some_and(|p| p.trim_matches('"').contains(product_contains));

            if product_matches {
                settings.insert(
                    "CODE_SIGN_ENTITLEMENTS",
                    Value::string(entitlements_path),
                );
            }
        }
    }
}

/// Target/group names written by earlier tooling sometimes carry literal
/// surrounding quotes; both spellings count as the same name.
fn name_matches(stored: &str, wanted: &str) -> bool {
    stored == wanted || stored.trim_matches('"') == wanted
}

/// New object IDs use the pbxproj convention of 24 uppercase hex chars.
fn generate_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    hex[..24].to_string()
}

fn last_known_file_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("h") => "sourcecode.c.h",
        Some("m") => "sourcecode.c.objc",
        Some("swift") => "sourcecode.swift",
        Some("plist") => "text.plist.xml",
        Some("entitlements") => "text.plist.entitlements",
        Some("storyboard") => "file.storyboard",
        Some("xib") => "file.xib",
        Some("png") => "image.png",
        _ => "text",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = include_str!("../../fixtures/base.pbxproj");

    #[test]
    fn finds_existing_targets_with_and_without_quotes() {
        let project = PbxProject::parse_str(BASE).unwrap();
        assert!(project.target_by_name("Example").is_some());
        assert!(project.target_by_name("ShareExt").is_none());

        let quoted = BASE.replace("name = Example;", r#"name = "\"Example\"";"#);
        let project = PbxProject::parse_str(&quoted).unwrap();
        assert!(project.target_by_name("Example").is_some());
    }

    #[test]
    fn add_target_registers_with_the_project() {
        let mut project = PbxProject::parse_str(BASE).unwrap();
        let target_id = project.add_target("ShareExt", "ShareExtension").unwrap();

        assert_eq!(project.target_by_name("ShareExt").as_deref(), Some(&*target_id));

        let serialized = project.serialize();
        assert!(serialized.contains("com.apple.product-type.app-extension"));
        assert!(serialized.contains("ShareExt.appex"));

        // registered in the PBXProject targets list
        let reparsed = PbxProject::parse_str(&serialized).unwrap();
        assert!(reparsed.target_by_name("ShareExt").is_some());
    }

    #[test]
    fn build_phases_attach_to_the_target() {
        let mut project = PbxProject::parse_str(BASE).unwrap();
        let target_id = project.add_target("ShareExt", "ShareExtension").unwrap();
        project.add_build_phase(&target_id, BuildPhase::Sources).unwrap();
        project.add_build_phase(&target_id, BuildPhase::Resources).unwrap();

        assert!(project.target_phase(&target_id, BuildPhase::Sources).is_ok());
        assert!(project.target_phase(&target_id, BuildPhase::Resources).is_ok());
    }

    #[test]
    fn groups_and_files_wire_up_once() {
        let mut project = PbxProject::parse_str(BASE).unwrap();
        let target_id = project.add_target("ShareExt", "ShareExtension").unwrap();
        project.add_build_phase(&target_id, BuildPhase::Sources).unwrap();

        let group_id = project.create_group("ShareExtension", "ShareExtension");
        let parent = project.group_by_name("CustomTemplate").unwrap();
        project.add_to_group(&group_id, &parent).unwrap();

        project
            .add_source_file("ShareViewController.m", &group_id, &target_id)
            .unwrap();
        project
            .add_source_file("ShareViewController.m", &group_id, &target_id)
            .unwrap();

        let text = project.serialize();
        assert_eq!(text.matches("ShareViewController.m").count(), 1);
    }

    #[test]
    fn entitlements_land_on_matching_configurations_only() {
        let mut project = PbxProject::parse_str(BASE).unwrap();
        let target_id = project.add_target("ShareExt", "ShareExtension").unwrap();
        project.set_code_sign_entitlements(
            "ShareExt",
            "ShareExtension/ShareExtension.entitlements",
        );

        let text = project.serialize();
        // the two new configurations match, the app's own does not
        assert_eq!(text.matches("CODE_SIGN_ENTITLEMENTS").count(), 2);
        assert!(project.target_by_name("ShareExt").as_deref() == Some(&*target_id));
    }
}
