/// Page generation from a prebuilt tree and merging of human-written docs.

use std::fs;
use std::path::Path;

use stubdoc::application::{DuplicateDocsError, GeneratePagesUsecase};
use stubdoc::config::PagesConfig;
use tempfile::tempdir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn prebuild(root: &Path) {
    write(root, "transport/__init__.py", "");
    write(root, "transport/__control.py", "");
    write(root, "flpianoroll/__init__.py", "");
    write(root, "flpianoroll/__score.py", "");
}

#[test]
fn test_generate_and_merge() {
    let dir = tempdir().unwrap();
    let pre = dir.path().join("prebuild_docs");
    let docs = dir.path().join("docs");
    let out = dir.path().join("build_docs");
    prebuild(&pre);
    write(&docs, "index.md", "# Home");
    write(&docs, "tutorials/event_mapping.md", "# Events");

    let config = PagesConfig::default();
    let report = GeneratePagesUsecase { config: &config }
        .run(&pre, &docs, &out)
        .unwrap();

    assert_eq!(report.generated, 3);
    assert_eq!(report.merged, 2);

    let section = out.join("MIDI Controller Scripting");
    assert_eq!(
        fs::read_to_string(section.join("transport/control.md")).unwrap(),
        "::: transport.__control\n"
    );
    assert_eq!(
        fs::read_to_string(section.join("transport/.pages")).unwrap(),
        "nav:\n  - Transport: index.md\n  - ...\n"
    );
    assert!(!section.join("flpianoroll").exists());
    assert_eq!(fs::read_to_string(out.join("index.md")).unwrap(), "# Home");
}

#[test]
fn test_duplicate_docs_are_refused() {
    let dir = tempdir().unwrap();
    let pre = dir.path().join("prebuild_docs");
    let docs = dir.path().join("docs");
    let out = dir.path().join("build_docs");
    prebuild(&pre);
    write(&docs, "MIDI Controller Scripting/transport/index.md", "# Clash");

    let config = PagesConfig::default();
    let err = GeneratePagesUsecase { config: &config }
        .run(&pre, &docs, &out)
        .unwrap_err();

    let DuplicateDocsError(duplicates) = err.downcast::<DuplicateDocsError>().unwrap();
    assert_eq!(
        duplicates,
        vec![out.join("MIDI Controller Scripting/transport/index.md")]
    );
}
