//! Xcode project handle
//!
//! Loads `project.pbxproj` into memory, answers era and group queries, and
//! applies idempotent mutations. Every mutation that changes the document is
//! written back to disk before the call returns.

use super::groups::{GroupArena, GroupId};
use super::plist::{self, Dictionary, Value};
use crate::error::{IntegrationError, Result};
use crate::manifest::LibraryDeclaration;
use crate::version::parse_minimum_version;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PROJECT_EXTENSION: &str = "xcodeproj";
const DESCRIPTOR_FILE: &str = "project.pbxproj";
const BUILD_ACTION_MASK: &str = "2147483647";

/// Structural era of the project index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    /// Xcode 15 and earlier: groups and file references are explicit
    Legacy,
    /// Xcode 16+: folders are synchronized by Xcode itself
    Modern,
}

impl Era {
    pub fn classify(object_version: u32, legacy_ceiling: u32) -> Self {
        if object_version > legacy_ceiling {
            Era::Modern
        } else {
            Era::Legacy
        }
    }

    pub fn needs_index_sync(&self) -> bool {
        matches!(self, Era::Legacy)
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Era::Legacy => write!(f, "Xcode 15 or earlier"),
            Era::Modern => write!(f, "Xcode 16+"),
        }
    }
}

/// Outcome of a group lookup-or-create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupLookup {
    Found(GroupId),
    Created(GroupId),
}

impl GroupLookup {
    pub fn id(&self) -> GroupId {
        match self {
            GroupLookup::Found(id) | GroupLookup::Created(id) => *id,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, GroupLookup::Created(_))
    }
}

/// Outcome of registering a file reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceOutcome {
    Added,
    AlreadyPresent,
}

/// Outcome of registering a Swift package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    Added,
    /// A package with the same repository URL (ignoring case) exists
    AlreadyPresent { existing_url: String },
}

/// Build phase a file reference is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Sources,
    Headers,
    Resources,
    Frameworks,
}

impl Phase {
    fn isa(&self) -> &'static str {
        match self {
            Phase::Sources => "PBXSourcesBuildPhase",
            Phase::Headers => "PBXHeadersBuildPhase",
            Phase::Resources => "PBXResourcesBuildPhase",
            Phase::Frameworks => "PBXFrameworksBuildPhase",
        }
    }

    fn for_file(file_name: &str) -> Self {
        match extension_of(file_name).as_str() {
            "h" | "hh" | "hpp" | "hxx" => Phase::Headers,
            "swift" | "m" | "mm" | "c" | "cc" | "cpp" | "cxx" | "metal" => Phase::Sources,
            _ => Phase::Resources,
        }
    }
}

fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// `lastKnownFileType` for a file name
pub fn file_type(file_name: &str) -> &'static str {
    match extension_of(file_name).as_str() {
        "swift" => "sourcecode.swift",
        "m" => "sourcecode.c.objc",
        "mm" => "sourcecode.cpp.objcpp",
        "c" => "sourcecode.c.c",
        "cc" | "cpp" | "cxx" => "sourcecode.cpp.cpp",
        "h" => "sourcecode.c.h",
        "hh" | "hpp" | "hxx" => "sourcecode.cpp.h",
        "metal" => "sourcecode.metal",
        "storyboard" => "file.storyboard",
        "xib" => "file.xib",
        "xcassets" => "folder.assetcatalog",
        "json" => "text.json",
        "plist" => "text.plist.xml",
        "strings" => "text.plist.strings",
        "xcstrings" => "text.json.xcstrings",
        "png" => "image.png",
        "jpg" | "jpeg" => "image.jpeg",
        "pdf" => "image.pdf",
        "ttf" | "otf" => "file",
        "md" => "net.daringfireball.markdown",
        _ => "text",
    }
}

/// Locate the single `.xcodeproj` bundle in `dir`
pub fn discover(dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(dir).map_err(|e| IntegrationError::io(dir, e))?;

    let mut bundles = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IntegrationError::io(dir, e))?;
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == PROJECT_EXTENSION) {
            continue;
        }
        if path.join(DESCRIPTOR_FILE).is_file() {
            bundles.push(path);
        } else {
            debug!("Ignoring {}: no {}", path.display(), DESCRIPTOR_FILE);
        }
    }
    bundles.sort();

    if bundles.len() > 1 {
        warn!(
            "Found {} Xcode projects in {}, using {}",
            bundles.len(),
            dir.display(),
            bundles[0].display()
        );
    }

    bundles
        .into_iter()
        .next()
        .ok_or_else(|| IntegrationError::ProjectNotFound {
            dir: dir.to_path_buf(),
        })
}

/// An opened Xcode project
#[derive(Debug)]
pub struct ProjectHandle {
    bundle: PathBuf,
    descriptor: PathBuf,
    app_name: String,
    document: Dictionary,
    groups: GroupArena,
}

impl ProjectHandle {
    /// Open the project found in `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        let bundle = discover(dir)?;
        let app_name = bundle
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let descriptor = bundle.join(DESCRIPTOR_FILE);

        let text =
            fs::read_to_string(&descriptor).map_err(|e| IntegrationError::io(&descriptor, e))?;
        let document = plist::parse(&text).map_err(|e| IntegrationError::MalformedProject {
            path: descriptor.clone(),
            line: e.line,
            message: e.message,
        })?;

        let main_group = main_group_of(&document)?;
        let groups = GroupArena::build(objects_of(&document)?, &main_group)?;
        let handle = ProjectHandle {
            bundle,
            descriptor,
            app_name,
            document,
            groups,
        };

        info!(
            "Found Xcode project: {} (app: {})",
            handle.bundle.display(),
            handle.app_name
        );
        Ok(handle)
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn bundle_path(&self) -> &Path {
        &self.bundle
    }

    pub fn descriptor_path(&self) -> &Path {
        &self.descriptor
    }

    /// Directory holding the bundle and the app sources
    pub fn project_root(&self) -> &Path {
        self.bundle.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn groups(&self) -> &GroupArena {
        &self.groups
    }

    pub fn object_count(&self) -> usize {
        self.objects().map(Dictionary::len).unwrap_or(0)
    }

    /// Numeric `objectVersion` marker
    pub fn object_version(&self) -> Result<u32> {
        let missing = || IntegrationError::VersionMarkerMissing {
            path: self.descriptor.clone(),
        };
        let raw = self.document.get_str("objectVersion").ok_or_else(missing)?;
        let digits: String = raw
            .trim()
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().map_err(|_| missing())
    }

    pub fn classify_era(&self, legacy_ceiling: u32) -> Result<Era> {
        let version = self.object_version()?;
        let era = Era::classify(version, legacy_ceiling);
        info!("Object version {} ({})", version, era);
        Ok(era)
    }

    /// The project's main group
    pub fn main_group(&self) -> GroupId {
        self.groups.root()
    }

    pub fn find_group(&self, parent: GroupId, name: &str) -> Option<GroupId> {
        self.groups.child(parent, name)
    }

    /// Look up the child group `name` under `parent`, creating it if absent
    pub fn find_or_create_group(&mut self, parent: GroupId, name: &str) -> Result<GroupLookup> {
        if let Some(existing) = self.groups.child(parent, name) {
            return Ok(GroupLookup::Found(existing));
        }

        let parent_object = self.groups.node(parent).object_id.clone();
        let group = Dictionary::new()
            .with("isa", "PBXGroup")
            .with("children", Vec::<Value>::new())
            .with("path", name)
            .with("sourceTree", "<group>");
        let object_id = self.insert_object(&format!("group:{}/{}", parent_object, name), group)?;
        self.append_to_array(&parent_object, "children", &object_id)?;

        let id = self.groups.insert(parent, name, &object_id);
        self.save()?;
        debug!("Created group {}", self.groups.path(id));
        Ok(GroupLookup::Created(id))
    }

    /// Add a file reference named after `file_path` to `group` and the first target
    pub fn add_file_reference(&mut self, group: GroupId, file_path: &Path) -> Result<ReferenceOutcome> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                IntegrationError::structure(format!("{} has no file name", file_path.display()))
            })?;

        if self.groups.has_file(group, &file_name) {
            return Ok(ReferenceOutcome::AlreadyPresent);
        }

        let group_object = self.groups.node(group).object_id.clone();
        let reference = Dictionary::new()
            .with("isa", "PBXFileReference")
            .with("lastKnownFileType", file_type(&file_name))
            .with("path", file_name.as_str())
            .with("sourceTree", "<group>");
        let reference_id =
            self.insert_object(&format!("file:{}/{}", group_object, file_name), reference)?;
        self.append_to_array(&group_object, "children", &reference_id)?;

        let target = self.first_target()?;
        let phase = self.build_phase(&target, Phase::for_file(&file_name))?;
        let build_file = Dictionary::new()
            .with("isa", "PBXBuildFile")
            .with("fileRef", reference_id.as_str());
        let build_file_id = self.insert_object(&format!("build:{}", reference_id), build_file)?;
        self.append_to_array(&phase, "files", &build_file_id)?;

        self.groups.add_file(group, &file_name);
        self.save()?;
        Ok(ReferenceOutcome::Added)
    }

    /// Repository URLs of every registered Swift package
    pub fn package_urls(&self) -> Result<Vec<String>> {
        let objects = self.objects()?;
        let project = self.project_object()?;
        let urls = project
            .get("packageReferences")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_str())
            .filter_map(|id| objects.get(id).and_then(|o| o.as_dictionary()))
            .filter_map(|o| o.get_str("repositoryURL"))
            .map(str::to_string)
            .collect();
        Ok(urls)
    }

    /// Register a Swift package and link its product into the first target
    ///
    /// Packages are identified by repository URL, compared case-insensitively.
    /// An existing package is never modified.
    pub fn add_package_reference(&mut self, library: &LibraryDeclaration) -> Result<PackageOutcome> {
        if let Some(existing_url) = self
            .package_urls()?
            .into_iter()
            .find(|url| url.eq_ignore_ascii_case(&library.url))
        {
            return Ok(PackageOutcome::AlreadyPresent { existing_url });
        }

        if library.name.trim().is_empty() {
            return Err(IntegrationError::InvalidLibrary {
                name: library.url.clone(),
                message: "missing product name".to_string(),
            });
        }
        url::Url::parse(&library.url).map_err(|e| IntegrationError::InvalidLibrary {
            name: library.name.clone(),
            message: format!("invalid url '{}': {}", library.url, e),
        })?;
        let version = parse_minimum_version(&library.version).map_err(|message| {
            IntegrationError::InvalidLibrary {
                name: library.name.clone(),
                message,
            }
        })?;

        let requirement = Dictionary::new()
            .with("kind", "upToNextMajorVersion")
            .with("minimumVersion", version.to_string());
        let package = Dictionary::new()
            .with("isa", "XCRemoteSwiftPackageReference")
            .with("repositoryURL", library.url.as_str())
            .with("requirement", requirement);
        let package_id = self.insert_object(&format!("package:{}", library.url), package)?;
        let project_id = self.root_object_id()?;
        self.append_to_array(&project_id, "packageReferences", &package_id)?;

        let target = self.first_target()?;
        let dependency = Dictionary::new()
            .with("isa", "XCSwiftPackageProductDependency")
            .with("package", package_id.as_str())
            .with("productName", library.name.as_str());
        let dependency_id = self.insert_object(&format!("product:{}", library.name), dependency)?;
        self.append_to_array(&target, "packageProductDependencies", &dependency_id)?;

        let frameworks = self.build_phase(&target, Phase::Frameworks)?;
        let build_file = Dictionary::new()
            .with("isa", "PBXBuildFile")
            .with("productRef", dependency_id.as_str());
        let build_file_id = self.insert_object(&format!("build:{}", dependency_id), build_file)?;
        self.append_to_array(&frameworks, "files", &build_file_id)?;

        self.save()?;
        Ok(PackageOutcome::Added)
    }

    /// Write the document back to `project.pbxproj`
    pub fn save(&self) -> Result<()> {
        fs::write(&self.descriptor, plist::write(&self.document))
            .map_err(|e| IntegrationError::io(&self.descriptor, e))
    }

    fn objects(&self) -> Result<&Dictionary> {
        objects_of(&self.document)
    }

    fn objects_mut(&mut self) -> Result<&mut Dictionary> {
        self.document
            .get_mut("objects")
            .and_then(|v| v.as_dictionary_mut())
            .ok_or_else(|| IntegrationError::structure("descriptor has no objects table"))
    }

    fn object(&self, id: &str) -> Result<&Dictionary> {
        self.objects()?
            .get(id)
            .and_then(|v| v.as_dictionary())
            .ok_or_else(|| IntegrationError::structure(format!("object {} not found", id)))
    }

    fn object_mut(&mut self, id: &str) -> Result<&mut Dictionary> {
        self.objects_mut()?
            .get_mut(id)
            .and_then(|v| v.as_dictionary_mut())
            .ok_or_else(|| IntegrationError::structure(format!("object {} not found", id)))
    }

    fn root_object_id(&self) -> Result<String> {
        root_object_of(&self.document)
    }

    fn project_object(&self) -> Result<&Dictionary> {
        self.object(&self.root_object_id()?)
    }

    fn first_target(&self) -> Result<String> {
        self.project_object()?
            .get("targets")
            .and_then(|v| v.as_array())
            .and_then(|targets| targets.first())
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| IntegrationError::structure("project has no build target"))
    }

    /// Identifier of the target's phase of the given kind, created if missing
    fn build_phase(&mut self, target: &str, phase: Phase) -> Result<String> {
        let existing = self
            .object(target)?
            .get("buildPhases")
            .and_then(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|v| v.as_str())
            .find(|id| {
                self.object(id)
                    .is_ok_and(|o| o.get_str("isa") == Some(phase.isa()))
            })
            .map(str::to_string);
        if let Some(id) = existing {
            return Ok(id);
        }

        let object = Dictionary::new()
            .with("isa", phase.isa())
            .with("buildActionMask", BUILD_ACTION_MASK)
            .with("files", Vec::<Value>::new())
            .with("runOnlyForDeploymentPostprocessing", "0");
        let id = self.insert_object(&format!("phase:{}/{}", target, phase.isa()), object)?;
        self.append_to_array(target, "buildPhases", &id)?;
        Ok(id)
    }

    /// Insert a new object under a deterministic, collision-free identifier
    fn insert_object(&mut self, seed: &str, object: Dictionary) -> Result<String> {
        let objects = self.objects_mut()?;
        let id = generate_id(seed, |candidate| objects.contains_key(candidate));
        objects.insert(id.clone(), object);
        Ok(id)
    }

    fn append_to_array(&mut self, object_id: &str, key: &str, item: &str) -> Result<()> {
        let object = self.object_mut(object_id)?;
        if !object.contains_key(key) {
            object.insert(key, Vec::<Value>::new());
        }
        object
            .get_mut(key)
            .and_then(|v| v.as_array_mut())
            .ok_or_else(|| {
                IntegrationError::structure(format!("{}.{} is not an array", object_id, key))
            })?
            .push(Value::from(item));
        Ok(())
    }
}

fn objects_of(document: &Dictionary) -> Result<&Dictionary> {
    document
        .get("objects")
        .and_then(|v| v.as_dictionary())
        .ok_or_else(|| IntegrationError::structure("descriptor has no objects table"))
}

fn root_object_of(document: &Dictionary) -> Result<String> {
    document
        .get_str("rootObject")
        .map(str::to_string)
        .ok_or_else(|| IntegrationError::structure("descriptor has no rootObject"))
}

fn main_group_of(document: &Dictionary) -> Result<String> {
    let root = root_object_of(document)?;
    objects_of(document)?
        .get(&root)
        .and_then(|v| v.as_dictionary())
        .and_then(|project| project.get_str("mainGroup"))
        .map(str::to_string)
        .ok_or_else(|| IntegrationError::structure("project has no mainGroup"))
}

/// 24 uppercase hex characters from SHA-256 of the seed, re-seeded on collision
pub fn generate_id(seed: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut counter: u32 = 0;
    loop {
        let digest = Sha256::digest(format!("{}#{}", seed, counter).as_bytes());
        let id = hex::encode_upper(&digest[..12]);
        if !taken(&id) {
            return id;
        }
        counter += 1;
    }
}
