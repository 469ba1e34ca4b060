//! End-to-end checks of the subcommand handlers against files on disk.

use std::path::{Path, PathBuf};

use fourc_cli::config::{run_config, ConfigArgs, ConfigCommand};
use fourc_cli::edit::{run_get, run_set, GetArgs, SetArgs};
use fourc_cli::roundtrip::{run_roundtrip, RoundtripArgs};
use fourc_cli::schema::SchemaArgs;
use fourc_cli::validate::{run_validate, ValidateArgs};

const METADATA: &str = r#"metadata:
  version: "2025.2.0"
sections:
  - name: Solver
    type: group
    specs:
      - {name: tolerance, type: float, required: true}
  - name: PROBLEM SIZE
    type: group
    specs:
      - {name: DIM, type: int, default: 3}
"#;

const SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "Solver": {"type": "object", "required": ["tolerance"]},
    "PROBLEM SIZE": {"type": "object"}
  }
}"#;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("metadata.yaml"), METADATA).unwrap();
        std::fs::write(dir.path().join("schema.json"), SCHEMA).unwrap();
        std::fs::write(
            dir.path().join("fourc.yaml"),
            "profile: local\nprofiles:\n  local:\n    metadata_path: metadata.yaml\n    json_schema_path: schema.json\n  bare:\n    metadata_path: metadata.yaml\n",
        )
        .unwrap();
        Self { dir }
    }

    fn file(&self, name: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("fourc.yaml")
    }

    fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }
}

fn validate_args(files: Vec<PathBuf>) -> ValidateArgs {
    ValidateArgs {
        files,
        schema: SchemaArgs::default(),
        audit: true,
    }
}

#[test]
fn validate_exit_codes() {
    let ws = Workspace::new();
    let good = ws.file("good.4C.yaml", "Solver:\n  tolerance: 1e-6\n");
    let bad = ws.file("bad.4C.yaml", "Solver: {}\n");
    let broken = ws.file("broken.4C.yaml", "Solver: [1,\n");
    let config = ws.config();

    assert_eq!(run_validate(&validate_args(vec![good.clone()]), Some(&config)).unwrap(), 0);
    assert_eq!(
        run_validate(&validate_args(vec![good.clone(), bad]), Some(&config)).unwrap(),
        1
    );
    assert_eq!(run_validate(&validate_args(vec![good, broken]), Some(&config)).unwrap(), 1);
}

#[test]
fn validate_with_explicit_metadata_needs_no_config() {
    let ws = Workspace::new();
    let input = ws.file("in.4C.yaml", "PROBLEM SIZE:\n  DIM: 2\n");
    let args = ValidateArgs {
        files: vec![input],
        schema: SchemaArgs {
            metadata: Some(ws.dir.path().join("metadata.yaml")),
            ..SchemaArgs::default()
        },
        audit: false,
    };
    let missing = ws.dir.path().join("missing.yaml");
    assert_eq!(run_validate(&args, Some(&missing)).unwrap(), 0);
}

#[test]
fn validate_operational_errors() {
    let ws = Workspace::new();
    let input = ws.file("in.4C.yaml", "PROBLEM SIZE:\n  DIM: 2\n");

    let missing = ws.dir.path().join("missing.yaml");
    assert!(run_validate(&validate_args(vec![input.clone()]), Some(&missing)).is_err());

    let args = ValidateArgs {
        files: vec![input],
        schema: SchemaArgs {
            profile: Some("nope".into()),
            ..SchemaArgs::default()
        },
        audit: false,
    };
    assert!(run_validate(&args, Some(&ws.config())).is_err());
}

#[test]
fn roundtrip_reports_unchanged_files() {
    let ws = Workspace::new();
    let input = ws.file(
        "in.4C.yaml",
        "# header\nSolver:\n  tolerance: 1.0e-06   # tight\n\nPROBLEM SIZE: {DIM: 3}\n",
    );
    let broken = ws.file("broken.4C.yaml", "a: &anchor 1\n");

    assert_eq!(run_roundtrip(&RoundtripArgs { files: vec![input.clone()] }).unwrap(), 0);
    assert_eq!(
        run_roundtrip(&RoundtripArgs {
            files: vec![input, broken]
        })
        .unwrap(),
        1
    );
}

#[test]
fn get_and_set() {
    let ws = Workspace::new();
    let text = "# run\nSolver:\n  tolerance: 1e-6 # tight\n";
    let input = ws.file("in.4C.yaml", text);
    let config = ws.config();

    let get = |path: &str| GetArgs {
        file: input.clone(),
        path: path.to_string(),
        schema: SchemaArgs::default(),
    };
    assert_eq!(run_get(&get("Solver.tolerance"), Some(&config)).unwrap(), 0);
    assert_eq!(run_get(&get("PROBLEM SIZE.DIM"), Some(&config)).unwrap(), 0);
    assert_eq!(run_get(&get("Solver.other"), Some(&config)).unwrap(), 1);
    assert!(run_get(&get("Solver..x"), Some(&config)).is_err());

    let output = ws.dir.path().join("out.4C.yaml");
    let set = SetArgs {
        file: input.clone(),
        path: "PROBLEM SIZE.DIM".into(),
        value: "\"2\"".into(),
        output: Some(output.clone()),
        schema: SchemaArgs::default(),
    };
    assert_eq!(run_set(&set, Some(&config)).unwrap(), 0);
    assert_eq!(ws.read(&input), text);
    assert_eq!(ws.read(&output), format!("{text}PROBLEM SIZE:\n  DIM: 2\n"));

    let set = SetArgs {
        file: input.clone(),
        path: "Solver.tolerance".into(),
        value: "abc".into(),
        output: None,
        schema: SchemaArgs::default(),
    };
    assert!(run_set(&set, Some(&config)).is_err());
    assert_eq!(ws.read(&input), text);
}

#[test]
fn config_use_switches_profile() {
    let ws = Workspace::new();
    let config = ws.config();
    let before = ws.read(&config);

    let args = ConfigArgs {
        command: ConfigCommand::Use {
            name: "bare".into(),
        },
    };
    assert_eq!(run_config(&args, Some(&config)).unwrap(), 0);
    assert_eq!(
        ws.read(&config),
        before.replace("profile: local", "profile: bare")
    );

    let args = ConfigArgs {
        command: ConfigCommand::Use {
            name: "nope".into(),
        },
    };
    assert!(run_config(&args, Some(&config)).is_err());

    for command in [ConfigCommand::Show, ConfigCommand::Profiles] {
        assert_eq!(run_config(&ConfigArgs { command }, Some(&config)).unwrap(), 0);
    }
}
