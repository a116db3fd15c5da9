use std::fs;

use tdata_core::config::ModelSettings;
use tdata_core::contract::{CompletionError, CompletionRequest, MockCompletionClient, Role};
use tdata_core::error::{GenerationFailed, InputError, InputKind};
use tdata_core::summary::{Summary, SummaryArtifact};
use tdata_core::synthesise::{
    build_messages, GeneratedDataset, SynthesisRequest, Synthesizer, TrainingRecord,
    ASSISTANT_TRANSITION,
};
use tdata_core::taxonomy::Category;
use tempfile::tempdir;

const REFERENCE_SOURCE: &str = "int ais328dq_power_up(struct device *dev) { return 0; }\n";

const DATASET_REPLY: &str = r#"{
    "message": [
        {
            "role": "user",
            "TaskName": "Power up the AIS328DQ accelerometer",
            "Instruction": "Write a C function that powers up the AIS328DQ.",
            "Information": "Sets the power mode bits in CTRL_REG1."
        },
        {
            "role": "assistant",
            "content": {
                "text": "The driver code will contain all these parts in order -",
                "Solution": "int ais328dq_power_up(struct device *dev) { return 0; }"
            }
        }
    ]
}"#;

fn structured_request() -> SynthesisRequest {
    let mut summary = Summary::new();
    summary.record(Category::Registers, "20h CTRL_REG1");
    SynthesisRequest::new(REFERENCE_SOURCE, &SummaryArtifact::Structured(summary)).unwrap()
}

#[test]
fn test_prompt_carries_reference_and_summary_verbatim() {
    let request = structured_request();
    let messages = build_messages(&request);

    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::System, Role::User, Role::User, Role::Assistant]);
    assert!(messages[0].content.contains("C and C++"));
    assert!(messages[1].content.contains("TEMPLATE"));
    assert!(messages[1].content.contains("DocumentWordsProvider"));
    assert_eq!(messages[2].content, REFERENCE_SOURCE);
    assert_eq!(messages[3].content, request.summary_text);
    assert!(request.summary_text.contains("20h CTRL_REG1"));
}

#[test]
fn test_raw_summary_artifact_is_accepted() {
    let request = SynthesisRequest::new(
        REFERENCE_SOURCE,
        &SummaryArtifact::Raw("Device Name: AIS328DQ".to_string()),
    )
    .unwrap();
    assert_eq!(request.summary_text, "\"Device Name: AIS328DQ\"");
}

#[tokio::test]
async fn test_synthesise_returns_reply_verbatim_without_validation() {
    let mut client = MockCompletionClient::new();
    client
        .expect_complete()
        .withf(|req: &CompletionRequest| req.model == "gpt-4o" && req.max_tokens == 4096)
        .times(1)
        .returning(|_| Ok("\nSure! Here is not quite JSON: {\"message\": [\n".to_string()));

    let synthesizer = Synthesizer::new(&client, ModelSettings::synthesis());
    let dataset = synthesizer.synthesise(&structured_request()).await.unwrap();

    assert_eq!(dataset.raw, "Sure! Here is not quite JSON: {\"message\": [");
    assert!(dataset.records().is_err());
}

#[tokio::test]
async fn test_synthesise_maps_transport_failure_to_generation_failed() {
    let mut client = MockCompletionClient::new();
    client
        .expect_complete()
        .times(1)
        .returning(|_| Err(CompletionError::Quota("insufficient_quota".into())));

    let synthesizer = Synthesizer::new(&client, ModelSettings::synthesis());
    let err = synthesizer.synthesise(&structured_request()).await.unwrap_err();
    assert!(matches!(err, GenerationFailed(CompletionError::Quota(_))));
}

#[test]
fn test_generated_dataset_parses_into_training_records() {
    let dataset = GeneratedDataset {
        raw: DATASET_REPLY.to_string(),
    };
    let parsed = dataset.records().expect("well-formed reply parses");

    assert_eq!(parsed.message.len(), 2);
    assert_eq!(parsed.pair_count(), 1);
    match &parsed.message[0] {
        TrainingRecord::User { task_name, .. } => {
            assert_eq!(task_name, "Power up the AIS328DQ accelerometer")
        }
        other => panic!("expected user record, got {other:?}"),
    }
    match &parsed.message[1] {
        TrainingRecord::Assistant { content } => {
            assert_eq!(content.text, ASSISTANT_TRANSITION);
            assert!(content.solution.contains("ais328dq_power_up"));
        }
        other => panic!("expected assistant record, got {other:?}"),
    }
}

#[test]
fn test_from_paths_reports_missing_reference_source() {
    let tmp = tempdir().unwrap();
    let summary_path = tmp.path().join("summary.json");
    fs::write(&summary_path, "{}").unwrap();

    let err =
        SynthesisRequest::from_paths(&tmp.path().join("missing.c"), &summary_path).unwrap_err();
    match err {
        InputError::Missing(missing) => assert_eq!(missing.input, InputKind::ReferenceSource),
        other => panic!("expected missing input, got {other:?}"),
    }
}

#[test]
fn test_from_paths_reports_missing_summary() {
    let tmp = tempdir().unwrap();
    let reference_path = tmp.path().join("driver.c");
    fs::write(&reference_path, REFERENCE_SOURCE).unwrap();

    let err = SynthesisRequest::from_paths(&reference_path, &tmp.path().join("summary.json"))
        .unwrap_err();
    assert!(matches!(
        err,
        InputError::Missing(ref m) if m.input == InputKind::Summary
    ));
}

#[test]
fn test_from_paths_reports_unreadable_reference_as_read_error() {
    let tmp = tempdir().unwrap();
    let reference_path = tmp.path().join("driver.c");
    let summary_path = tmp.path().join("summary.json");
    fs::write(&reference_path, [0xff, 0xfe, 0x00, 0xc3]).unwrap();
    fs::write(&summary_path, "{}").unwrap();

    let err = SynthesisRequest::from_paths(&reference_path, &summary_path).unwrap_err();
    match err {
        InputError::Read { path, .. } => assert_eq!(path, reference_path),
        other => panic!("expected read error, got {other:?}"),
    }
}

#[test]
fn test_from_paths_reads_both_files_verbatim() {
    let tmp = tempdir().unwrap();
    let reference_path = tmp.path().join("driver.c");
    let summary_path = tmp.path().join("summary.json");
    fs::write(&reference_path, REFERENCE_SOURCE).unwrap();
    fs::write(&summary_path, "\"raw enrichment text\"").unwrap();

    let request = SynthesisRequest::from_paths(&reference_path, &summary_path).unwrap();
    assert_eq!(request.reference_source, REFERENCE_SOURCE);
    assert_eq!(request.summary_text, "\"raw enrichment text\"");
}
