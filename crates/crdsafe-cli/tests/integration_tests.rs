//! Integration tests for the crdsafe binary

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
  - name: test
    cluster:
      server: http://127.0.0.1:6443
contexts:
  - name: test
    context:
      cluster: test
      user: test
current-context: test
users:
  - name: test
    user:
      token: abc123
"#;

/// Run crdsafe with exactly these arguments
fn crdsafe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crdsafe"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute crdsafe")
}

/// Get the fixtures path
fn fixtures_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures")
}

fn fixture(name: &str) -> String {
    format!("{}/{}", fixtures_path(), name)
}

/// Temporary kubeconfig pointing at a cluster that is never contacted
struct Kubeconfig {
    _dir: TempDir,
    path: PathBuf,
}

impl Kubeconfig {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, KUBECONFIG).unwrap();
        Self { _dir: dir, path }
    }

    fn path(&self) -> &str {
        self.path.to_str().unwrap()
    }
}

/// Compare two fixtures with a valid kubeconfig
fn check(old: &str, new: &str, extra: &[&str]) -> Output {
    let kubeconfig = Kubeconfig::new();
    let old = fixture(old);
    let new = fixture(new);
    let mut args = vec![
        "--oldCRD",
        old.as_str(),
        "--newCRD",
        new.as_str(),
        "--kubeconfig",
        kubeconfig.path(),
    ];
    args.extend_from_slice(extra);
    crdsafe(&args)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

mod compatible {
    use super::*;

    #[test]
    fn test_identical_crds() {
        let output = check("widgets-v1.yaml", "widgets-v1.yaml", &[]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("CRDs are compatible for upgrade"));
    }

    #[test]
    fn test_loosened_constraints_and_new_version() {
        let output = check("widgets-v1.yaml", "widgets-v2-compatible.yaml", &[]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("CRDs are compatible for upgrade"));
    }

    #[test]
    fn test_kebab_case_aliases() {
        let kubeconfig = Kubeconfig::new();
        let output = crdsafe(&[
            "--old-crd",
            &fixture("widgets-v1.yaml"),
            "--new-crd",
            &fixture("widgets-v1.yaml"),
            "--kubeconfig",
            kubeconfig.path(),
        ]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
    }

    #[test]
    fn test_json_output() {
        let output = check("widgets-v1.yaml", "widgets-v1.yaml", &["--output", "json"]);

        assert!(output.status.success());
        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        assert_eq!(json["compatible"], true);
        assert_eq!(json["crd"], "widgets.example.com");
    }
}

mod incompatible {
    use super::*;

    #[test]
    fn test_required_field_added() {
        let output = check("widgets-v1.yaml", "widgets-required-added.yaml", &[]);

        assert_eq!(output.status.code(), Some(1));
        let stderr = stderr(&output);
        assert!(stderr.contains("CRDs are not compatible for upgrade"));
        assert!(stderr.contains(
            r#"ServedVersionValidator: version "v1", field "spec": new required fields [name] added"#
        ));
    }

    #[test]
    fn test_scope_changed() {
        let output = check("widgets-v1.yaml", "widgets-cluster-scope.yaml", &[]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output)
            .contains(r#"NoScopeChange: scope changed from "Namespaced" to "Cluster""#));
    }

    #[test]
    fn test_every_failure_reported() {
        let output = check("widgets-v1.yaml", "widgets-breaking.yaml", &[]);

        assert_eq!(output.status.code(), Some(1));
        insta::assert_snapshot!(stderr(&output).trim_end(), @r#"
        ✗ CRDs are not compatible for upgrade: validating upgrade for CRD "widgets.example.com" failed:
        NoScopeChange: scope changed from "Namespaced" to "Cluster"
        NoExistingFieldRemoved: version "v1", field "spec.ports" may not be removed
        NoExistingFieldRemoved: version "v1", field "spec.ports[*].port" may not be removed
        ServedVersionValidator: version "v1", field "spec.mode": enums ["fast"] removed from the set of previously allowed values
        ServedVersionValidator: version "v1", field "spec.replicas": maximum: constraint decreased from 10 to 5
          → 5 failure(s) from 3 rule(s)
        "#);
    }

    #[test]
    fn test_json_report() {
        let output = check(
            "widgets-v1.yaml",
            "widgets-breaking.yaml",
            &["--output", "json"],
        );

        assert_eq!(output.status.code(), Some(1));
        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        assert_eq!(json["compatible"], false);

        let rules: Vec<&str> = json["failures"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["rule"].as_str().unwrap())
            .collect();
        assert_eq!(
            rules,
            vec![
                "NoScopeChange",
                "NoExistingFieldRemoved",
                "NoExistingFieldRemoved",
                "ServedVersionValidator",
                "ServedVersionValidator",
            ]
        );
    }

    #[test]
    fn test_downgrade_removes_stored_version() {
        let output = check("widgets-v2-compatible.yaml", "widgets-v1.yaml", &[]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output)
            .contains(r#"NoStoredVersionRemoved: stored version "v2" removed"#));
    }
}

mod loading {
    use super::*;

    #[test]
    fn test_missing_old_crd_file() {
        let output = check("does-not-exist.yaml", "widgets-v1.yaml", &[]);

        assert_eq!(output.status.code(), Some(1));
        let stderr = stderr(&output);
        assert!(stderr.contains("Error loading oldCRD: File"));
        assert!(stderr.contains("does-not-exist.yaml does not exist."));
    }

    #[test]
    fn test_new_crd_not_a_crd() {
        let output = check("widgets-v1.yaml", "not-a-crd.yaml", &[]);

        assert_eq!(output.status.code(), Some(1));
        let stderr = stderr(&output);
        assert!(stderr.contains("Error loading newCRD"));
        assert!(stderr.contains("expected CustomResourceDefinition, got ConfigMap"));
    }

    #[test]
    fn test_missing_flags_exit_with_one() {
        let output = crdsafe(&["--newCRD", &fixture("widgets-v1.yaml")]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("--oldCRD"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let output = check("widgets-v1.yaml", "widgets-v1.yaml", &["--timeout", "0"]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("--timeout must be greater than zero"));
    }

    #[test]
    fn test_help_exits_with_zero() {
        let output = crdsafe(&["--help"]);

        assert!(output.status.success());
        let stdout = stdout(&output);
        assert!(stdout.contains("--oldCRD"));
        assert!(stdout.contains("--from-cluster"));
    }
}

mod kubeconfig {
    use super::*;

    #[test]
    fn test_explicit_kubeconfig_missing() {
        let dir = TempDir::new().unwrap();
        let absent = dir.path().join("absent");
        let output = crdsafe(&[
            "--oldCRD",
            &fixture("widgets-v1.yaml"),
            "--newCRD",
            &fixture("widgets-v1.yaml"),
            "--kubeconfig",
            absent.to_str().unwrap(),
        ]);

        assert_eq!(output.status.code(), Some(1));
        let stderr = stderr(&output);
        assert!(stderr.contains("Error getting kubeconfig"));
        assert!(stderr.contains("hint:"));
    }

    #[test]
    fn test_malformed_kubeconfig() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "clusters: [not, a, config").unwrap();

        let output = crdsafe(&[
            "--oldCRD",
            &fixture("widgets-v1.yaml"),
            "--newCRD",
            &fixture("widgets-v1.yaml"),
            "--kubeconfig",
            path.to_str().unwrap(),
        ]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("failed to build config from kubeconfig path"));
    }

    #[test]
    fn test_kubeconfig_from_environment() {
        let kubeconfig = Kubeconfig::new();
        let output = Command::new(env!("CARGO_BIN_EXE_crdsafe"))
            .args([
                "--oldCRD",
                &fixture("widgets-v1.yaml"),
                "--newCRD",
                &fixture("widgets-v1.yaml"),
            ])
            .env("KUBECONFIG", kubeconfig.path())
            .output()
            .expect("Failed to execute crdsafe");

        assert!(output.status.success(), "stderr: {}", stderr(&output));
    }

    #[test]
    fn test_no_kubeconfig_anywhere() {
        let home = TempDir::new().unwrap();
        let output = Command::new(env!("CARGO_BIN_EXE_crdsafe"))
            .args([
                "--oldCRD",
                &fixture("widgets-v1.yaml"),
                "--newCRD",
                &fixture("widgets-v1.yaml"),
            ])
            .env_remove("KUBECONFIG")
            .env("HOME", home.path())
            .output()
            .expect("Failed to execute crdsafe");

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("Error getting kubeconfig"));
        assert!(is_under(home.path(), &stderr(&output)));
    }

    fn is_under(dir: &Path, message: &str) -> bool {
        message.contains(&dir.join(".kube").join("config").display().to_string())
    }
}
