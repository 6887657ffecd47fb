//! Xcode project descriptor access
//!
//! - `plist`: OpenStep property list codec for `project.pbxproj`
//! - `groups`: arena index over the group tree
//! - `descriptor`: the [`ProjectHandle`] used by the rest of the engine

pub mod descriptor;
pub mod groups;
pub mod plist;

#[cfg(test)]
pub(crate) mod fixtures;

pub use descriptor::{
    discover, Era, GroupLookup, PackageOutcome, ProjectHandle, ReferenceOutcome,
};
pub use groups::{GroupArena, GroupId};
