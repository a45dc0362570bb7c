//! Reading, mutating and rewriting `project.pbxproj` descriptors.

mod project;
mod value;

pub(crate) use project::{BuildPhase, PbxProject};
