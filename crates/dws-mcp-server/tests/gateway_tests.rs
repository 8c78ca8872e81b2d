// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end gateway tests against a mock processing API.

use std::sync::Arc;

use async_trait::async_trait;
use dws_config::model::ApiConfig;
use dws_core::{CreditUsage, DwsError, UsageRecorder};
use dws_credits::CreditLedger;
use dws_mcp_server::{
    AiRedactorParams, CheckCreditsParams, CreditAction, DirectoryTreeParams,
    DocumentProcessorParams, DocumentSignerParams, DwsServer, OperationGateway,
};
use dws_processor::DwsClient;
use dws_sandbox::PathJail;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn client(server: &MockServer) -> DwsClient {
    let config = ApiConfig {
        base_url: server.uri(),
        ..ApiConfig::default()
    };
    DwsClient::new(&config, &SecretString::from("test-api-key")).unwrap()
}

fn jailed(dir: &tempfile::TempDir) -> PathJail {
    PathJail::new(Some(dir.path().to_str().unwrap())).unwrap()
}

fn build_params(value: Value) -> DocumentProcessorParams {
    serde_json::from_value(value).unwrap()
}

async fn pdf_endpoint(server: &MockServer, endpoint: &str, body: &'static [u8]) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-credits-cost", "2")
                .insert_header("x-credits-remaining", "98")
                .set_body_bytes(body.to_vec()),
        )
        .mount(&server)
        .await;
}

fn content_type(request: &Request) -> String {
    request
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn multipart_names(request: &Request) -> Vec<String> {
    let body = String::from_utf8_lossy(&request.body);
    body.split("form-data; name=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn jailed_build_uploads_local_file_and_writes_output() {
    let server = MockServer::start().await;
    pdf_endpoint(&server, "/build", b"%PDF-result").await;
    let dir = tempfile::tempdir().unwrap();
    let jail = jailed(&dir);
    let root = jail.root().unwrap().to_path_buf();
    std::fs::write(root.join("a.pdf"), b"%PDF-input").unwrap();

    let gateway = OperationGateway::new(jail, client(&server));
    let output = gateway
        .build(build_params(json!({
            "instructions": {"parts": [{"file": "a.pdf"}], "output": {"type": "pdf"}},
            "outputPath": "out.pdf"
        })))
        .await;

    assert!(!output.is_error, "{}", output.content);
    let expected = root.join("out.pdf");
    assert!(output.content.contains(&expected.display().to_string()));
    assert_eq!(std::fs::read(&expected).unwrap(), b"%PDF-result");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(content_type(&requests[0]).starts_with("multipart/form-data"));
    assert_eq!(multipart_names(&requests[0]), vec!["instructions", "a_pdf"]);
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(r#"{"parts":[{"file":"a_pdf"}],"output":{"type":"pdf"}}"#));
    assert!(body.contains("%PDF-input"));
}

#[tokio::test]
async fn url_only_build_sends_original_instructions_as_json() {
    let server = MockServer::start().await;
    let instructions = json!({"parts": [{"file": "https://example.com/a.pdf"}]});
    Mock::given(method("POST"))
        .and(path("/build"))
        .and(body_json(&instructions))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let out_dir = tempfile::tempdir().unwrap();
    let output_path = out_dir.path().join("out.pdf");
    let gateway = OperationGateway::new(PathJail::disabled(), client(&server));
    let output = gateway
        .build(build_params(json!({
            "instructions": instructions,
            "outputPath": output_path.to_str().unwrap()
        })))
        .await;

    assert!(!output.is_error, "{}", output.content);
    assert!(output.content.contains(output_path.to_str().unwrap()));
    assert!(output_path.exists());
}

#[tokio::test]
async fn escape_attempt_never_reaches_the_network() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let gateway = OperationGateway::new(jailed(&dir), client(&server));

    let output = gateway
        .build(build_params(json!({
            "instructions": {"parts": [{"file": "../../etc/passwd"}]},
            "outputPath": "out.pdf"
        })))
        .await;

    assert!(output.is_error);
    assert!(output.content.contains("../../etc/passwd"));
    assert!(output.content.contains("within the sandbox"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn bad_output_path_fails_before_references_are_read() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let gateway = OperationGateway::new(jailed(&dir), client(&server));

    let output = gateway
        .build(build_params(json!({
            "instructions": {"parts": [{"file": "missing.pdf"}]},
            "outputPath": "../out.pdf"
        })))
        .await;

    assert!(output.is_error);
    assert!(output.content.contains("'../out.pdf'"), "{}", output.content);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn instructions_without_files_fail_without_network() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let gateway = OperationGateway::new(jailed(&dir), client(&server));

    let output = gateway
        .build(build_params(json!({
            "instructions": {"parts": [{"html": "index.html"}]},
            "outputPath": "out.pdf"
        })))
        .await;

    assert!(output.is_error);
    assert_eq!(output.content, "No valid files or urls found in instructions");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn json_content_build_returns_inline_text() {
    let server = MockServer::start().await;
    let extracted = r#"{"pages":[{"pageIndex":0,"plainText":"Hello"}]}"#;
    Mock::given(method("POST"))
        .and(path("/build"))
        .respond_with(ResponseTemplate::new(200).set_body_string(extracted))
        .mount(&server)
        .await;

    let gateway = OperationGateway::new(PathJail::disabled(), client(&server));
    let output = gateway
        .build(build_params(json!({
            "instructions": {
                "parts": [{"file": "https://example.com/a.pdf"}],
                "output": {"type": "json-content", "plainText": true}
            }
        })))
        .await;

    assert!(!output.is_error, "{}", output.content);
    assert_eq!(output.content, extracted);
}

#[tokio::test]
async fn missing_output_path_is_rejected_for_file_outputs() {
    let server = MockServer::start().await;
    let gateway = OperationGateway::new(PathJail::disabled(), client(&server));
    let output = gateway
        .build(build_params(json!({
            "instructions": {"parts": [{"file": "https://example.com/a.pdf"}]}
        })))
        .await;
    assert!(output.is_error);
    assert!(output.content.contains("outputPath is required"));
}

#[tokio::test]
async fn hosted_error_is_passed_through_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/build"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "details": "x",
            "status": 400,
            "requestId": "r1",
            "failingPaths": [{"path": "$.a", "details": "y"}]
        })))
        .mount(&server)
        .await;

    let out_dir = tempfile::tempdir().unwrap();
    let gateway = OperationGateway::new(PathJail::disabled(), client(&server));
    let output = gateway
        .build(build_params(json!({
            "instructions": {"parts": [{"file": "https://example.com/a.pdf"}]},
            "outputPath": out_dir.path().join("out.pdf").to_str().unwrap()
        })))
        .await;

    assert!(output.is_error);
    let payload: Value = serde_json::from_str(&output.content).unwrap();
    assert_eq!(payload["status"], 400);
    assert_eq!(payload["requestId"], "r1");
    assert_eq!(payload["failingPaths"].as_array().unwrap().len(), 1);
    assert!(!out_dir.path().join("out.pdf").exists());
}

#[tokio::test]
async fn sign_uploads_document_images_and_options() {
    let server = MockServer::start().await;
    pdf_endpoint(&server, "/sign", b"%PDF-signed").await;
    let dir = tempfile::tempdir().unwrap();
    let jail = jailed(&dir);
    let root = jail.root().unwrap().to_path_buf();
    for file in ["doc.pdf", "w.png", "g.png"] {
        std::fs::write(root.join(file), file.as_bytes()).unwrap();
    }

    let gateway = OperationGateway::new(jail, client(&server));
    let params: DocumentSignerParams = serde_json::from_value(json!({
        "filePath": "doc.pdf",
        "signatureOptions": {"signatureType": "cms"},
        "watermarkImagePath": "w.png",
        "graphicImagePath": "g.png",
        "outputPath": "signed/doc.pdf"
    }))
    .unwrap();
    let output = gateway.sign(params).await;

    assert!(!output.is_error, "{}", output.content);
    assert_eq!(std::fs::read(root.join("signed/doc.pdf")).unwrap(), b"%PDF-signed");
    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        multipart_names(&requests[0]),
        vec!["file", "image", "graphicImage", "data"]
    );
    assert!(String::from_utf8_lossy(&requests[0].body).contains(r#"{"signatureType":"cms"}"#));
}

#[tokio::test]
async fn ai_redact_rejects_stage_and_apply_together() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let gateway = OperationGateway::new(jailed(&dir), client(&server));

    let params: AiRedactorParams = serde_json::from_value(json!({
        "filePath": "does-not-exist.pdf",
        "outputPath": "out/redacted.pdf",
        "stage": true,
        "apply": true
    }))
    .unwrap();
    let output = gateway.ai_redact(params).await;

    assert!(output.is_error);
    assert!(output.content.contains("stage and apply cannot both be true"));
    assert!(!dir.path().join("out").exists());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn ai_redact_refuses_to_overwrite_its_input() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let jail = jailed(&dir);
    let root = jail.root().unwrap().to_path_buf();
    std::fs::write(root.join("doc.pdf"), b"%PDF").unwrap();
    let gateway = OperationGateway::new(jail, client(&server));

    let params: AiRedactorParams = serde_json::from_value(json!({
        "filePath": "doc.pdf",
        "outputPath": root.join("doc.pdf").to_str().unwrap()
    }))
    .unwrap();
    let output = gateway.ai_redact(params).await;

    assert!(output.is_error);
    assert!(output.content.contains("resolves to the input document"));
    assert_eq!(std::fs::read(root.join("doc.pdf")).unwrap(), b"%PDF");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn ai_redact_stages_with_criteria() {
    let server = MockServer::start().await;
    pdf_endpoint(&server, "/ai/redact", b"%PDF-redacted").await;
    let dir = tempfile::tempdir().unwrap();
    let jail = jailed(&dir);
    let root = jail.root().unwrap().to_path_buf();
    std::fs::write(root.join("doc.pdf"), b"%PDF").unwrap();
    let gateway = OperationGateway::new(jail, client(&server));

    let params: AiRedactorParams = serde_json::from_value(json!({
        "filePath": "doc.pdf",
        "criteria": "Email addresses",
        "outputPath": "doc-redacted.pdf",
        "stage": true
    }))
    .unwrap();
    let output = gateway.ai_redact(params).await;

    assert!(!output.is_error, "{}", output.content);
    assert_eq!(std::fs::read(root.join("doc-redacted.pdf")).unwrap(), b"%PDF-redacted");
    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(r#""criteria":"Email addresses""#));
    assert!(body.contains(r#""redaction_state":"stage""#));
}

struct FailingRecorder;

#[async_trait]
impl UsageRecorder for FailingRecorder {
    async fn record_usage(&self, _usage: &CreditUsage) -> Result<(), DwsError> {
        Err(DwsError::Internal("ledger unavailable".into()))
    }
}

#[tokio::test]
async fn recorder_failure_does_not_affect_the_result() {
    let server = MockServer::start().await;
    pdf_endpoint(&server, "/build", b"%PDF").await;
    let out_dir = tempfile::tempdir().unwrap();
    let output_path = out_dir.path().join("out.pdf");

    let gateway = OperationGateway::new(PathJail::disabled(), client(&server))
        .with_recorder(Arc::new(FailingRecorder));
    let output = gateway
        .build(build_params(json!({
            "instructions": {"parts": [{"file": "https://example.com/a.pdf"}]},
            "outputPath": output_path.to_str().unwrap()
        })))
        .await;

    assert!(!output.is_error, "{}", output.content);
    assert!(output_path.exists());
}

#[tokio::test]
async fn credit_usage_is_recorded_and_reported() {
    let server = MockServer::start().await;
    pdf_endpoint(&server, "/build", b"%PDF").await;
    let ledger = Arc::new(CreditLedger::open_in_memory().await.unwrap());
    let out_dir = tempfile::tempdir().unwrap();

    let gateway = OperationGateway::new(PathJail::disabled(), client(&server)).with_ledger(ledger);
    let output = gateway
        .build(build_params(json!({
            "instructions": {
                "parts": [{"file": "https://example.com/a.pdf"}],
                "actions": [{"type": "ocr", "language": "english"}]
            },
            "outputPath": out_dir.path().join("out.pdf").to_str().unwrap()
        })))
        .await;
    assert!(!output.is_error, "{}", output.content);

    let usage = gateway
        .check_credits(CheckCreditsParams {
            action: CreditAction::Usage,
            period_days: None,
        })
        .await;
    assert!(!usage.is_error, "{}", usage.content);
    let report: Value = serde_json::from_str(&usage.content).unwrap();
    assert_eq!(report["period_days"], 30);
    assert_eq!(report["total_credits"], 2.0);
    assert_eq!(report["operations"][0]["operation"], "ocr");

    let forecast = gateway
        .check_credits(CheckCreditsParams {
            action: CreditAction::Forecast,
            period_days: Some(7),
        })
        .await;
    let forecast: Value = serde_json::from_str(&forecast.content).unwrap();
    assert_eq!(forecast["remaining_balance"], 98.0);
}

#[tokio::test]
async fn oversized_usage_period_is_an_error_result() {
    let server = MockServer::start().await;
    let ledger = Arc::new(CreditLedger::open_in_memory().await.unwrap());
    let gateway = OperationGateway::new(PathJail::disabled(), client(&server)).with_ledger(ledger);

    for action in [CreditAction::Usage, CreditAction::Forecast] {
        let output = gateway
            .check_credits(CheckCreditsParams {
                action,
                period_days: Some(u32::MAX),
            })
            .await;
        assert!(output.is_error);
        assert!(output.content.contains("out of range"), "{}", output.content);
    }
}

#[tokio::test]
async fn usage_report_requires_a_ledger() {
    let server = MockServer::start().await;
    let gateway = OperationGateway::new(PathJail::disabled(), client(&server));
    let output = gateway
        .check_credits(CheckCreditsParams {
            action: CreditAction::Usage,
            period_days: None,
        })
        .await;
    assert!(output.is_error);
    assert!(output.content.contains("Credit tracking is disabled"));
}

#[tokio::test]
async fn balance_comes_from_the_service() {
    let server = MockServer::start().await;
    let info = r#"{"subscriptionType":"free","usage":{"totalCredits":100,"usedCredits":2}}"#;
    Mock::given(method("GET"))
        .and(path("/account/info"))
        .respond_with(ResponseTemplate::new(200).set_body_string(info))
        .mount(&server)
        .await;

    let gateway = OperationGateway::new(PathJail::disabled(), client(&server));
    let output = gateway
        .check_credits(CheckCreditsParams {
            action: CreditAction::Balance,
            period_days: None,
        })
        .await;
    assert!(!output.is_error, "{}", output.content);
    assert_eq!(output.content, info);
}

#[tokio::test]
async fn directory_tree_lists_the_sandbox() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let jail = jailed(&dir);
    std::fs::write(jail.root().unwrap().join("a.pdf"), b"a").unwrap();
    let gateway = OperationGateway::new(jail, client(&server));

    let output = gateway
        .directory_tree(DirectoryTreeParams {
            path: ".".into(),
            max_depth: None,
        })
        .await;
    assert!(!output.is_error, "{}", output.content);
    assert!(output.content.ends_with("└── a.pdf\n"));
}

#[tokio::test]
async fn server_registers_every_tool() {
    let server = MockServer::start().await;
    let gateway = OperationGateway::new(PathJail::disabled(), client(&server));
    let _mcp = DwsServer::new(gateway);

    let mut names: Vec<String> = DwsServer::tool_router()
        .list_all()
        .into_iter()
        .map(|tool| tool.name.to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "ai_redactor",
            "check_credits",
            "directory_tree",
            "document_processor",
            "document_signer"
        ]
    );
}
