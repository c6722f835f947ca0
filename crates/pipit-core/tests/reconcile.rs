//! Integration tests for the reconciler workflows
//!
//! The installer and provisioner are in-memory fakes that record every call,
//! and the manifest lives in a temporary project directory.

use pipit_core::{
    Entry, Error, Installed, Installer, ManifestStore, Provisioner, Reconciler, Result, Section,
    MANIFEST_FILE,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Install(Vec<String>),
    Uninstall(Vec<String>),
    Update(Vec<String>),
    Installed,
    Outdated,
    List,
    ListOutdated,
    Interpreter,
}

#[derive(Default)]
struct FakeInstaller {
    calls: RefCell<Vec<Call>>,
    /// Versions reported by `installed()`, after any install or update
    installed: BTreeMap<String, String>,
    outdated: BTreeMap<String, String>,
    python: String,
    fail: bool,
}

impl FakeInstaller {
    fn new() -> Self {
        Self {
            python: "3.10.1 (main, Jan 1 2024)".to_string(),
            ..Default::default()
        }
    }

    fn with_installed(mut self, name: &str, version: &str) -> Self {
        self.installed.insert(name.to_string(), version.to_string());
        self
    }

    fn with_outdated(mut self, name: &str, version: &str) -> Self {
        self.outdated.insert(name.to_string(), version.to_string());
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) -> Result<()> {
        let mutating = matches!(call, Call::Install(_) | Call::Uninstall(_) | Call::Update(_));
        self.calls.borrow_mut().push(call);
        if self.fail && mutating {
            return Err(Error::InstallerFailure {
                program: "pip".to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }
}

impl Installer for FakeInstaller {
    fn install(&self, args: &[String]) -> Result<()> {
        self.record(Call::Install(args.to_vec()))
    }

    fn uninstall(&self, names: &[String]) -> Result<()> {
        self.record(Call::Uninstall(names.to_vec()))
    }

    fn update(&self, names: &[String]) -> Result<()> {
        self.record(Call::Update(names.to_vec()))
    }

    fn installed(&self) -> Result<Installed> {
        self.record(Call::Installed)?;
        Ok(self.installed.clone())
    }

    fn outdated(&self) -> Result<Installed> {
        self.record(Call::Outdated)?;
        Ok(self.outdated.clone())
    }

    fn list(&self) -> Result<()> {
        self.record(Call::List)
    }

    fn list_outdated(&self) -> Result<()> {
        self.record(Call::ListOutdated)
    }

    fn interpreter_version(&self) -> Result<String> {
        self.record(Call::Interpreter)?;
        Ok(self.python.clone())
    }
}

#[derive(Default)]
struct FakeProvisioner {
    existing: RefCell<HashSet<PathBuf>>,
    created: RefCell<Vec<(PathBuf, Option<String>)>>,
}

impl FakeProvisioner {
    fn existing(path: PathBuf) -> Self {
        let provisioner = Self::default();
        provisioner.existing.borrow_mut().insert(path);
        provisioner
    }
}

impl Provisioner for FakeProvisioner {
    fn exists(&self, path: &Path) -> bool {
        self.existing.borrow().contains(path)
    }

    fn create(&self, path: &Path, interpreter: Option<&str>) -> Result<()> {
        self.existing.borrow_mut().insert(path.to_path_buf());
        self.created
            .borrow_mut()
            .push((path.to_path_buf(), interpreter.map(String::from)));
        Ok(())
    }
}

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn with_manifest(content: &str) -> Self {
        let project = Self::new();
        std::fs::write(project.manifest_path(), content).unwrap();
        project
    }

    fn store(&self) -> ManifestStore {
        ManifestStore::new(self.dir.path(), MANIFEST_FILE)
    }

    fn env_path(&self) -> PathBuf {
        self.dir.path().join(".pipit")
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.path().join(MANIFEST_FILE)
    }

    fn manifest(&self) -> String {
        std::fs::read_to_string(self.manifest_path()).unwrap()
    }

    fn manifest_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.manifest()).unwrap()
    }

    /// A provisioner that already has this project's environment
    fn provisioned(&self) -> FakeProvisioner {
        FakeProvisioner::existing(self.env_path())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// new
// ---------------------------------------------------------------------------

#[test]
fn test_new_creates_environment_and_manifest() {
    let project = Project::new();
    let installer = FakeInstaller::new();
    let provisioner = FakeProvisioner::default();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let outcome = reconciler.new_environment(None, Some("python3.11")).unwrap();

    assert!(outcome.manifest_written);
    assert_eq!(project.manifest(), "{}\n");
    let created = provisioner.created.borrow();
    assert_eq!(created.len(), 1);
    assert!(created[0].0.ends_with(".pipit"));
    assert_eq!(created[0].1.as_deref(), Some("python3.11"));
    assert!(installer.calls().is_empty());
}

#[test]
fn test_new_is_idempotent() {
    let project = Project::with_manifest(r#"{"dependencies": {"requests": "2.0"}}"#);
    let installer = FakeInstaller::new();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let outcome = reconciler.new_environment(None, None).unwrap();

    assert!(!outcome.manifest_written);
    assert!(provisioner.created.borrow().is_empty());
    assert!(project.manifest().contains("requests"));
}

#[test]
fn test_new_in_subdirectory_with_custom_env_dir() {
    let project = Project::new();
    std::fs::create_dir(project.dir.path().join("app")).unwrap();
    let installer = FakeInstaller::new();
    let provisioner = FakeProvisioner::default();
    let reconciler =
        Reconciler::new(&installer, &provisioner, project.store()).with_env_dir("venv");

    reconciler
        .new_environment(Some(Path::new("app")), None)
        .unwrap();

    let created = provisioner.created.borrow();
    assert_eq!(created[0].0, project.dir.path().join("app").join("venv"));
    assert!(project.dir.path().join("app").join(MANIFEST_FILE).exists());
}

// ---------------------------------------------------------------------------
// install with packages
// ---------------------------------------------------------------------------

#[test]
fn test_install_packages_records_constraints() {
    let project = Project::new();
    let installer = FakeInstaller::new()
        .with_installed("requests", "2.31.0")
        .with_installed("flask", "2.0.0");
    let provisioner = FakeProvisioner::default();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let outcome = reconciler
        .install(
            &[
                "Requests",
                "flask==2.0",
                "git+https://x.com/y.git#egg=foo",
            ],
            false,
        )
        .unwrap();

    assert!(outcome.manifest_written);
    assert_eq!(
        installer.calls(),
        vec![
            Call::Install(strings(&[
                "Requests",
                "flask==2.0",
                "git+https://x.com/y.git#egg=foo"
            ])),
            Call::Installed,
        ]
    );
    assert_eq!(
        project.manifest_json(),
        serde_json::json!({
            "dependencies": {
                "flask": "2.0",
                "foo": "git+https://x.com/y.git",
                "requests": "~=2.31.0"
            }
        })
    );
}

#[test]
fn test_install_dev_packages() {
    let project = Project::with_manifest(r#"{"dependencies": {"requests": "2.0"}}"#);
    let installer = FakeInstaller::new().with_installed("pytest", "7.4.0");
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    reconciler.install(&["pytest"], true).unwrap();

    assert_eq!(
        project.manifest_json(),
        serde_json::json!({
            "dependencies": {"requests": "2.0"},
            "dev-dependencies": {"pytest": "~=7.4.0"}
        })
    );
}

#[test]
fn test_install_keeps_structured_entry_shape() {
    let project = Project::with_manifest(
        r#"{"dependencies": {"pywin32": {"version": "300", "system": "nt"}, "six": "1.0"}}"#,
    );
    let installer = FakeInstaller::new()
        .with_installed("pywin32", "306")
        .with_installed("six", "1.16.0");
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    reconciler.install(&["pywin32", "six"], false).unwrap();

    assert_eq!(
        project.manifest_json(),
        serde_json::json!({
            "dependencies": {
                "pywin32": {"version": "~=306", "system": "nt"},
                "six": "~=1.16.0"
            }
        })
    );
}

#[test]
fn test_install_duplicate_arguments_last_wins() {
    let project = Project::new();
    let installer = FakeInstaller::new();
    let provisioner = FakeProvisioner::default();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    reconciler
        .install(&["requests==2.0", "Requests>=2.1"], false)
        .unwrap();

    assert_eq!(
        project.manifest_json(),
        serde_json::json!({"dependencies": {"requests": ">=2.1"}})
    );
}

#[test]
fn test_install_malformed_argument_has_no_side_effects() {
    let project = Project::new();
    let installer = FakeInstaller::new();
    let provisioner = FakeProvisioner::default();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let err = reconciler.install(&["requests", "==2.0"], false).unwrap_err();

    assert!(matches!(err, Error::MalformedSpecifier(_)));
    assert!(installer.calls().is_empty());
    assert!(provisioner.created.borrow().is_empty());
    assert!(!project.manifest_path().exists());
}

#[test]
fn test_install_failure_leaves_manifest_untouched() {
    let original = r#"{"dependencies": {"Requests": "2.0"}, "dev-dependencies": {}}"#;
    let project = Project::with_manifest(original);
    let installer = FakeInstaller::new().failing();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let err = reconciler.install(&["flask"], false).unwrap_err();

    assert!(matches!(err, Error::InstallerFailure { .. }));
    assert_eq!(project.manifest(), original);
}

#[test]
fn test_install_unreported_package_is_an_error() {
    let original = r#"{"dependencies": {"requests": "2.0"}}"#;
    let project = Project::with_manifest(original);
    let installer = FakeInstaller::new();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let err = reconciler.install(&["flask"], false).unwrap_err();

    assert!(matches!(err, Error::Unknown(_)));
    assert_eq!(project.manifest(), original);
}

// ---------------------------------------------------------------------------
// install from the manifest
// ---------------------------------------------------------------------------

#[test]
fn test_install_from_manifest_renders_entries() {
    let project = Project::with_manifest(
        r#"{
            "dependencies": {
                "any": "*",
                "exact": "1.2.3",
                "compat": "~=2.0",
                "foo": "git+https://x.com/y.git",
                "structured": {"version": ">=1,<2"}
            },
            "dev-dependencies": {"pytest": "7.0"}
        }"#,
    );
    let installer = FakeInstaller::new();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let before = project.manifest();
    let outcome = reconciler.install::<&str>(&[], false).unwrap();

    assert!(!outcome.manifest_written);
    assert_eq!(
        installer.calls(),
        vec![Call::Install(strings(&[
            "any",
            "compat~=2.0",
            "exact==1.2.3",
            "git+https://x.com/y.git#egg=foo",
            "structured>=1,<2",
        ]))]
    );
    assert_eq!(project.manifest(), before);
}

#[test]
fn test_install_from_manifest_with_dev() {
    let project = Project::with_manifest(
        r#"{"dependencies": {"requests": "*"}, "dev-dependencies": {"pytest": "7.0"}}"#,
    );
    let installer = FakeInstaller::new();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    reconciler.install::<&str>(&[], true).unwrap();

    assert_eq!(
        installer.calls(),
        vec![Call::Install(strings(&["requests", "pytest==7.0"]))]
    );
}

#[test]
fn test_install_from_manifest_skips_other_systems() {
    let project = Project::with_manifest(
        r#"{"dependencies": {
            "pywin32": {"version": "306", "system": "nt"},
            "uvloop": {"system": "posix"}
        }}"#,
    );
    let installer = FakeInstaller::new();
    let provisioner = project.provisioned();
    let reconciler =
        Reconciler::new(&installer, &provisioner, project.store()).with_system("posix");

    reconciler.install::<&str>(&[], false).unwrap();

    assert_eq!(installer.calls(), vec![Call::Install(strings(&["uvloop"]))]);
}

#[test]
fn test_install_from_manifest_empty_batch_skips_installer() {
    let project = Project::with_manifest(
        r#"{"dependencies": {"pywin32": {"version": "306", "system": "nt"}}}"#,
    );
    let installer = FakeInstaller::new();
    let provisioner = project.provisioned();
    let reconciler =
        Reconciler::new(&installer, &provisioner, project.store()).with_system("posix");

    let outcome = reconciler.install::<&str>(&[], false).unwrap();

    assert_eq!(outcome, Default::default());
    assert!(installer.calls().is_empty());
}

#[test]
fn test_install_from_manifest_filters_by_interpreter() {
    let project = Project::with_manifest(
        r#"{"dependencies": {
            "old": {"version": "1.0", "python": "3.8,3.9"},
            "new": {"version": "2.0", "python": "3.9,3.10"}
        }}"#,
    );
    let installer = FakeInstaller::new();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    reconciler.install::<&str>(&[], false).unwrap();

    assert_eq!(
        installer.calls(),
        vec![Call::Interpreter, Call::Install(strings(&["new==2.0"]))]
    );
}

#[test]
fn test_install_from_manifest_rejects_empty_constraint() {
    let project = Project::with_manifest(r#"{"dependencies": {"requests": ""}}"#);
    let installer = FakeInstaller::new();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let err = reconciler.install::<&str>(&[], false).unwrap_err();

    assert!(matches!(err, Error::ManifestMalformed { .. }));
    assert!(installer.calls().is_empty());
}

#[test]
fn test_install_creates_missing_manifest() {
    let project = Project::new();
    let installer = FakeInstaller::new();
    let provisioner = FakeProvisioner::default();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let outcome = reconciler.install::<&str>(&[], false).unwrap();

    assert!(!outcome.manifest_written);
    assert_eq!(project.manifest(), "{}\n");
    assert_eq!(provisioner.created.borrow().len(), 1);
    assert!(installer.calls().is_empty());
}

// ---------------------------------------------------------------------------
// uninstall
// ---------------------------------------------------------------------------

#[test]
fn test_uninstall_removes_from_both_sections() {
    let project = Project::with_manifest(
        r#"{"dependencies": {"six": "*", "requests": "2.0"}, "dev-dependencies": {"six": "1.0"}}"#,
    );
    let installer = FakeInstaller::new();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let outcome = reconciler.uninstall(&["SIX", "missing"]).unwrap();

    assert!(outcome.manifest_written);
    assert_eq!(
        installer.calls(),
        vec![Call::Uninstall(strings(&["SIX", "missing"]))]
    );
    assert_eq!(
        project.manifest_json(),
        serde_json::json!({"dependencies": {"requests": "2.0"}})
    );
}

#[test]
fn test_uninstall_requires_manifest() {
    let project = Project::new();
    let installer = FakeInstaller::new();
    let provisioner = FakeProvisioner::default();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let err = reconciler.uninstall(&["six"]).unwrap_err();

    assert!(matches!(err, Error::ManifestNotFound(_)));
    assert!(installer.calls().is_empty());
}

#[test]
fn test_uninstall_failure_leaves_manifest_untouched() {
    let original = r#"{"dependencies": {"six": "*"}}"#;
    let project = Project::with_manifest(original);
    let installer = FakeInstaller::new().failing();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    assert!(reconciler.uninstall(&["six"]).is_err());
    assert_eq!(project.manifest(), original);
}

// ---------------------------------------------------------------------------
// update
// ---------------------------------------------------------------------------

#[test]
fn test_update_repins_outdated_dependency() {
    let project = Project::with_manifest(r#"{"dependencies": {"requests": "2.0"}}"#);
    let installer = FakeInstaller::new()
        .with_outdated("requests", "2.0")
        .with_installed("requests", "2.1.0");
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let outcome = reconciler.update::<&str>(&[]).unwrap();

    assert_eq!(outcome.installer_args, strings(&["requests"]));
    assert_eq!(
        installer.calls(),
        vec![
            Call::Outdated,
            Call::Update(strings(&["requests"])),
            Call::Installed
        ]
    );
    assert_eq!(
        project.manifest(),
        "{\n  \"dependencies\": {\n    \"requests\": \"~=2.1.0\"\n  }\n}\n"
    );
}

#[test]
fn test_update_skips_external_packages() {
    let project = Project::with_manifest(
        r#"{
            "dependencies": {"foo": "git+https://x.com/y.git", "six": {"version": "1.0", "python": "3"}},
            "dev-dependencies": {"pytest": "~=7.0", "six": "1.0"}
        }"#,
    );
    let installer = FakeInstaller::new()
        .with_outdated("foo", "0.1")
        .with_outdated("six", "1.0")
        .with_outdated("pytest", "7.0")
        .with_installed("six", "1.16.0")
        .with_installed("pytest", "7.4.0");
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    reconciler.update::<&str>(&[]).unwrap();

    assert!(installer
        .calls()
        .contains(&Call::Update(strings(&["pytest", "six"]))));
    assert_eq!(
        project.manifest_json(),
        serde_json::json!({
            "dependencies": {
                "foo": "git+https://x.com/y.git",
                "six": {"version": "~=1.16.0", "python": "3"}
            },
            "dev-dependencies": {"pytest": "~=7.4.0", "six": "~=1.16.0"}
        })
    );
}

#[test]
fn test_update_named_packages_intersects() {
    let project = Project::with_manifest(
        r#"{"dependencies": {"requests": "2.0", "flask": "1.0", "foo": "git+https://x.com/y.git"}}"#,
    );
    let installer = FakeInstaller::new()
        .with_outdated("requests", "2.0")
        .with_outdated("foo", "0.1")
        .with_installed("requests", "2.1.0");
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    // flask is not outdated, foo is external, unknown is not in the manifest
    let outcome = reconciler
        .update(&["Requests", "flask", "foo", "unknown", "requests"])
        .unwrap();

    assert_eq!(outcome.installer_args, strings(&["requests"]));
    assert_eq!(
        project.manifest_json(),
        serde_json::json!({"dependencies": {
            "requests": "~=2.1.0",
            "flask": "1.0",
            "foo": "git+https://x.com/y.git"
        }})
    );
}

#[test]
fn test_update_nothing_outdated_writes_nothing() {
    let original = r#"{"dependencies": {"Requests": "2.0"}, "dev-dependencies": {}}"#;
    let project = Project::with_manifest(original);
    let installer = FakeInstaller::new();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let outcome = reconciler.update::<&str>(&[]).unwrap();

    assert_eq!(outcome, Default::default());
    assert_eq!(installer.calls(), vec![Call::Outdated]);
    assert_eq!(project.manifest(), original);
}

#[test]
fn test_update_failure_leaves_manifest_untouched() {
    let original = r#"{"dependencies": {"requests": "2.0"}}"#;
    let project = Project::with_manifest(original);
    let installer = FakeInstaller::new()
        .with_outdated("requests", "2.0")
        .failing();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let err = reconciler.update::<&str>(&[]).unwrap_err();

    assert!(matches!(err, Error::InstallerFailure { .. }));
    assert_eq!(project.manifest(), original);
}

#[test]
fn test_update_malformed_manifest() {
    let project = Project::with_manifest(r#"{"dependencies": ["requests"]}"#);
    let installer = FakeInstaller::new();
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    let err = reconciler.update::<&str>(&[]).unwrap_err();

    assert!(matches!(err, Error::ManifestMalformed { .. }));
    assert!(installer.calls().is_empty());
}

// ---------------------------------------------------------------------------
// list / outdated
// ---------------------------------------------------------------------------

#[test]
fn test_list_and_outdated_pass_through() {
    let project = Project::new();
    let installer = FakeInstaller::new();
    let provisioner = FakeProvisioner::default();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    reconciler.list().unwrap();
    reconciler.outdated().unwrap();

    assert_eq!(installer.calls(), vec![Call::List, Call::ListOutdated]);
    assert!(!project.manifest_path().exists());
}

#[test]
fn test_entries_untouched_by_install_survive() {
    let project = Project::with_manifest(
        r#"{
            "name": "demo",
            "dependencies": {"Django": {"version": "3.0", "python": "3", "note": "pinned"}},
            "dev-dependencies": {"pytest": "7.0"}
        }"#,
    );
    let installer = FakeInstaller::new().with_installed("requests", "2.31.0");
    let provisioner = project.provisioned();
    let reconciler = Reconciler::new(&installer, &provisioner, project.store());

    reconciler.install(&["requests"], false).unwrap();

    let manifest = project.store().load().unwrap();
    assert!(matches!(
        manifest.get(Section::Runtime, "django"),
        Some(Entry::Structured(info)) if info.extra.contains_key("note")
    ));
    assert_eq!(manifest.get(Section::Dev, "pytest").unwrap().version(), "7.0");
    assert_eq!(project.manifest_json()["name"], "demo");
}
