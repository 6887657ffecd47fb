//! Minimal Xcode projects for tests

use std::fs;
use std::path::{Path, PathBuf};

/// A project with one app target and an empty `MyApp` group
pub(crate) fn pbxproj(object_version: u32) -> String {
    format!(
        r#"// !$*UTF8*$!
{{
	archiveVersion = 1;
	classes = {{
	}};
	objectVersion = {object_version};
	objects = {{

/* Begin PBXGroup section */
		A10000000000000000000002 = {{
			isa = PBXGroup;
			children = (
				A10000000000000000000004 /* MyApp */,
			);
			sourceTree = "<group>";
		}};
		A10000000000000000000004 /* MyApp */ = {{
			isa = PBXGroup;
			children = (
			);
			path = MyApp;
			sourceTree = "<group>";
		}};
/* End PBXGroup section */

/* Begin PBXNativeTarget section */
		A10000000000000000000003 /* MyApp */ = {{
			isa = PBXNativeTarget;
			buildPhases = (
				A10000000000000000000005 /* Sources */,
			);
			name = MyApp;
			productName = MyApp;
		}};
/* End PBXNativeTarget section */

/* Begin PBXProject section */
		A10000000000000000000001 /* Project object */ = {{
			isa = PBXProject;
			mainGroup = A10000000000000000000002;
			targets = (
				A10000000000000000000003 /* MyApp */,
			);
		}};
/* End PBXProject section */

/* Begin PBXSourcesBuildPhase section */
		A10000000000000000000005 /* Sources */ = {{
			isa = PBXSourcesBuildPhase;
			buildActionMask = 2147483647;
			files = (
			);
			runOnlyForDeploymentPostprocessing = 0;
		}};
/* End PBXSourcesBuildPhase section */
	}};
	rootObject = A10000000000000000000001 /* Project object */;
}}
"#
    )
}

/// Write `MyApp.xcodeproj/project.pbxproj` under `root` and return its path
pub(crate) fn create_project(root: &Path, object_version: u32) -> PathBuf {
    let bundle = root.join("MyApp.xcodeproj");
    fs::create_dir_all(&bundle).unwrap();
    let descriptor = bundle.join("project.pbxproj");
    fs::write(&descriptor, pbxproj(object_version)).unwrap();
    fs::create_dir_all(root.join("MyApp")).unwrap();
    descriptor
}

/// Write `content` to `path`, creating parent directories
pub(crate) fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
