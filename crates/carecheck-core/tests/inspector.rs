//! Method-body inspection against source artifacts on disk.

use std::io::Write;
use std::path::Path;

use carecheck_core::{
    Expectations, Inspection, Inspector, NormalizedResponse, ResultShape, Validator,
    check_implementation,
};
use proptest::prelude::*;

const STEPS: &[&str] = &["given", "then", "extract", "response"];

fn artifact(source: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

#[test]
fn complete_method_passes() {
    let file = artifact("public Response op(){ given(); then(); extract(); response(); }");
    assert!(check_implementation(file.path(), "op", STEPS));
}

#[test]
fn each_missing_step_is_reported() {
    for &dropped in STEPS {
        let calls: String = STEPS
            .iter()
            .filter(|&&step| step != dropped)
            .map(|step| format!("{step}(); "))
            .collect();
        let file = artifact(&format!("public Response op(){{ {calls}}}"));
        assert!(!check_implementation(file.path(), "op", STEPS), "{dropped}");
        assert_eq!(
            Inspector::new(STEPS.iter().copied()).inspect_file(file.path(), "op"),
            Inspection::MissingTokens(vec![dropped.to_string()])
        );
    }
}

#[test]
fn called_but_never_defined_is_not_found() {
    let file = artifact(
        "public void other() {\n if (op()) { given(); then(); extract(); response(); }\n}",
    );
    assert!(!check_implementation(file.path(), "op", STEPS));
    assert_eq!(
        Inspector::new(STEPS.iter().copied()).inspect_file(file.path(), "op"),
        Inspection::DefinitionNotFound
    );
}

#[test]
fn absent_method_fails() {
    let file = artifact("public Response other(){ given(); then(); extract(); response(); }");
    assert!(!check_implementation(file.path(), "op", STEPS));
}

#[test]
fn nested_blocks_stay_in_body() {
    let file = artifact(
        "Response op(String id) {\n  if (id != null) { given(); }\n  then(); extract(); response();\n}\nvoid next() {}",
    );
    assert!(check_implementation(file.path(), "op", STEPS));
}

#[test]
fn unreadable_artifact_fails_without_panicking() {
    let path = Path::new("definitely/not/here/facade.rs");
    assert!(!check_implementation(path, "op", STEPS));
    assert!(matches!(
        Inspector::default().inspect_file(path, "op"),
        Inspection::ArtifactUnreadable(_)
    ));
}

proptest! {
    #[test]
    fn inspector_never_panics(source in ".{0,400}", method in "[a-z_]{1,12}") {
        let _ = Inspector::default().inspect_source(&source, &method);
    }

    #[test]
    fn validator_never_panics(body in ".{0,400}", status in 100u16..600) {
        let validator = Validator::builtin();
        for shape in [ResultShape::List, ResultShape::Record, ResultShape::EmbeddedList] {
            let response = NormalizedResponse::from_body(status, body.clone(), shape);
            let report = validator.validate("getAllItems", &response, &Expectations::new());
            prop_assert!(!report.is_valid() || report.records_checked > 0);
        }
    }
}
