use serde_json::json;
use std::fs;
use tdata::partition::UnstructuredClient;
use tdata_core::contract::{PartitionError, PartitionOptions, Partitioner};
use tempfile::tempdir;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const API_PATH: &str = "/general/v0/general";

#[tokio::test]
async fn test_partition_returns_elements_and_extracts_images() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("unstructured-api-key", "unstructured-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "type": "Title",
                "element_id": "e1",
                "text": "Register mapping",
                "metadata": {"page_number": 3}
            },
            {
                "type": "Image",
                "element_id": "e2",
                "text": "",
                "metadata": {
                    "page_number": 4,
                    "image_base64": "aGVsbG8=",
                    "image_mime_type": "image/png"
                }
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempdir().unwrap();
    let pdf = tmp.path().join("sensor.pdf");
    fs::write(&pdf, b"%PDF-1.4 test").unwrap();
    let options = PartitionOptions {
        image_output_dir: tmp.path().join("images"),
        ..PartitionOptions::default()
    };

    let client = UnstructuredClient::new(
        format!("{}{API_PATH}", server.uri()),
        Some("unstructured-test".to_string()),
    )
    .unwrap();
    let elements = client.partition(&pdf, &options).await.unwrap();

    assert_eq!(elements.len(), 2);
    assert_eq!(elements[0].text, "Register mapping");
    assert_eq!(elements[0].category_hint, "Title");
    assert_eq!(elements[0].page_number(), Some(3));

    let image_path = tmp.path().join("images/image-4-2.png");
    assert_eq!(fs::read(&image_path).unwrap(), b"hello");
    let metadata = elements[1].metadata.as_object().unwrap();
    assert!(metadata.get("image_base64").is_none());
    assert_eq!(
        metadata.get("image_path").and_then(|p| p.as_str()),
        Some(&*image_path.to_string_lossy())
    );
}

#[tokio::test]
async fn test_partition_without_extraction_leaves_metadata_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"type": "Table", "text": "Pin 1 VDD", "metadata": {"image_base64": "aGVsbG8="}}
        ])))
        .mount(&server)
        .await;

    let tmp = tempdir().unwrap();
    let pdf = tmp.path().join("sensor.pdf");
    fs::write(&pdf, b"%PDF-1.4 test").unwrap();
    let options = PartitionOptions {
        extract_images: false,
        image_output_dir: tmp.path().join("images"),
        ..PartitionOptions::default()
    };

    let client = UnstructuredClient::new(format!("{}{API_PATH}", server.uri()), None).unwrap();
    let elements = client.partition(&pdf, &options).await.unwrap();

    assert_eq!(elements[0].metadata["image_base64"], "aGVsbG8=");
    assert!(!tmp.path().join("images").exists());
}

#[tokio::test]
async fn test_partition_rejected_request_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("unsupported file"))
        .mount(&server)
        .await;

    let tmp = tempdir().unwrap();
    let pdf = tmp.path().join("sensor.pdf");
    fs::write(&pdf, b"not really a pdf").unwrap();

    let client = UnstructuredClient::new(format!("{}{API_PATH}", server.uri()), None).unwrap();
    let err = client
        .partition(&pdf, &PartitionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PartitionError::Api { status: 422, .. }));
}

#[tokio::test]
async fn test_partition_missing_document_is_an_io_error() {
    let client = UnstructuredClient::new("http://127.0.0.1:9/general/v0/general", None).unwrap();
    let tmp = tempdir().unwrap();

    let err = client
        .partition(&tmp.path().join("absent.pdf"), &PartitionOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PartitionError::Io { .. }));
}
