//! Validation of whole documents against the fixture metadata artifact.

use std::path::PathBuf;

use fourc_core::DocPath;
use fourc_document::{Document, DocumentNode};
use fourc_schema::{load_path, validate, IssueKind, SchemaModel, ValidationIssues};
use proptest::prelude::*;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn model() -> SchemaModel {
    load_path(fixture("metadata.yaml")).unwrap()
}

fn check(model: &SchemaModel, text: &str) -> ValidationIssues {
    let doc = Document::parse(text).unwrap();
    validate(doc.root(), model)
}

fn summary(issues: &ValidationIssues) -> Vec<(String, IssueKind)> {
    issues
        .iter()
        .map(|issue| (issue.path.to_string(), issue.kind))
        .collect()
}

const VALID_INPUT: &str = r#"TITLE:
  - "Cantilever beam"
PROBLEM SIZE:
  DIM: 3
PROBLEM TYPE:
  PROBLEMTYPE: Structure
STRUCTURAL DYNAMIC:
  DYNAMICTYPE: Statics
  TIMESTEP: 0.5
  NUMSTEP: 2
  LINEAR_SOLVER: 1
  OUTPUT_DIR: ~
SOLVER 1:
  SOLVER: Superlu
  NAME: "Structure_Solver"
MATERIALS:
  - MAT: 1
    MAT_ElastHyper:
      NUMMAT: 1
      MATIDS: [10]
  - MAT: 10
    ELAST_CoupNeoHooke: {YOUNG: 100, NUE: 0.3}
FUNCT1:
  - SYMBOLIC_FUNCTION_OF_SPACE_TIME: "t"
DESIGN POINT DIRICH CONDITIONS:
  - E: 1
    NUMDOF: 3
    ONOFF: [1, 1, 1]
    VAL: [0.0, 0.0, 0.0]
    FUNCT: [null, null, 1]
NODE COORDS:
  - "NODE 1 COORD 0.0 0.0 0.0"
PARAMETERS:
  alpha: 0.5
  beta: 2
"#;

#[test]
fn fixture_loads() {
    let model = model();
    assert_eq!(model.version(), Some("2025.2.0"));
    assert!(model.is_known_section("FUNCT7"));
    assert!(model.is_known_section("NODE COORDS"));
    assert_eq!(
        model
            .lookup(&"SOLVER 2.SOLVER".parse().unwrap())
            .unwrap()
            .resolved_from(),
        None
    );
    assert_eq!(
        model.lookup(&"SOLVER 2".parse().unwrap()).unwrap().resolved_from(),
        Some("linear_solver")
    );
}

#[test]
fn realistic_input_is_valid() {
    let issues = check(&model(), VALID_INPUT);
    assert!(issues.is_empty(), "unexpected issues:\n{issues}");
}

#[test]
fn solver_scenario() {
    let model = model();
    let cases: [(&str, Vec<(&str, IssueKind)>); 4] = [
        (
            "Solver: {}\n",
            vec![("Solver.tolerance", IssueKind::MissingRequiredField)],
        ),
        (
            "Solver: {tolerance: \"abc\"}\n",
            vec![("Solver.tolerance", IssueKind::TypeMismatch)],
        ),
        (
            "Solver: {tolerance: 1e-6, extra: 1}\n",
            vec![("Solver.extra", IssueKind::UnknownField)],
        ),
        ("Solver: {tolerance: 1e-6}\n", vec![]),
    ];
    for (text, expected) in cases {
        let expected: Vec<(String, IssueKind)> = expected
            .into_iter()
            .map(|(path, kind)| (path.to_string(), kind))
            .collect();
        assert_eq!(summary(&check(&model, text)), expected, "{text}");
    }
}

#[test]
fn validation_is_idempotent() {
    let model = model();
    let doc = Document::parse(
        "Solver: {tolerance: x}\nSOLVER 1:\n  SOLVER: Superl\n  EXTRA: 1\nMATERIALS:\n  - {}\n",
    )
    .unwrap();
    let first = validate(doc.root(), &model);
    let second = validate(doc.root(), &model);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn every_missing_required_field_is_reported() {
    let model = model();
    let issues = check(
        &model,
        "SOLVER 1: {}\nSOLVER 2: {NAME: x}\nMATERIALS:\n  - MAT_ElastHyper: {}\nDESIGN POINT DIRICH CONDITIONS:\n  - {E: 1}\n",
    );
    let missing: Vec<String> = issues
        .of_kind(IssueKind::MissingRequiredField)
        .map(|issue| issue.path.to_string())
        .collect();
    assert_eq!(
        missing,
        [
            "SOLVER 1.SOLVER",
            "SOLVER 2.SOLVER",
            "MATERIALS[0].MAT_ElastHyper.NUMMAT",
            "MATERIALS[0].MAT_ElastHyper.MATIDS",
            "MATERIALS[0].MAT",
            "DESIGN POINT DIRICH CONDITIONS[0].NUMDOF",
            "DESIGN POINT DIRICH CONDITIONS[0].ONOFF",
            "DESIGN POINT DIRICH CONDITIONS[0].VAL",
            "DESIGN POINT DIRICH CONDITIONS[0].FUNCT",
        ]
    );
    assert_eq!(issues.len(), missing.len(), "{issues}");
}

#[test]
fn issues_render_with_paths() {
    let issues = check(&model(), "PROBLEM TYPE:\n  PROBLEMTYPE: Structur\n");
    assert_eq!(
        issues.to_string(),
        "  PROBLEM TYPE.PROBLEMTYPE: 'Structur' is not one of [Fluid, Scalar_Transport, Structure]; did you mean 'Structure'?"
    );
}

/// Mapping paths of the valid input, each paired with the mapping node.
fn mapping_paths(node: &DocumentNode, path: DocPath, out: &mut Vec<DocPath>) {
    match node {
        DocumentNode::Mapping(mapping) => {
            out.push(path.clone());
            for (key, value) in mapping.iter() {
                mapping_paths(value, path.child(key), out);
            }
        }
        DocumentNode::Sequence(sequence) => {
            for (i, item) in sequence.iter().enumerate() {
                mapping_paths(item, path.index(i), out);
            }
        }
        DocumentNode::Scalar(_) => {}
    }
}

proptest! {
    /// An undeclared key added to any mapping yields exactly one
    /// UnknownField issue, at that key.
    #[test]
    fn undeclared_key_is_one_unknown_field(pick in any::<prop::sample::Index>(), suffix in "[a-z]{1,6}") {
        let model = model();
        let mut doc = Document::parse(VALID_INPUT).unwrap();
        let mut targets = Vec::new();
        mapping_paths(doc.root(), DocPath::root(), &mut targets);
        // PARAMETERS accepts any key.
        targets.retain(|p| p.to_string() != "PARAMETERS");
        let target = pick.get(&targets).clone();

        let key = format!("zz_undeclared_{suffix}");
        let path = target.child(key);
        doc.set(&path, DocumentNode::scalar(1)).unwrap();

        let issues = validate(doc.root(), &model);
        prop_assert_eq!(issues.len(), 1, "{}", issues);
        prop_assert_eq!(issues.issues()[0].kind, IssueKind::UnknownField);
        prop_assert_eq!(&issues.issues()[0].path, &path);
    }
}
