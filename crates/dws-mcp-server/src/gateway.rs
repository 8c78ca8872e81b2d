// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-operation orchestration.
//!
//! Every operation runs the same linear sequence: validate arguments,
//! resolve the output path (before any network I/O), collect file
//! references, dispatch, record credit usage, and materialize the response.
//! Errors never escape: each public method returns a [`ToolOutput`].

use std::sync::Arc;

use dws_core::{CreditUsage, DwsError, OperationKind, ToolOutput, UsageRecorder};
use dws_credits::CreditLedger;
use dws_processor::{
    DwsClient, Endpoint, Instructions, RedactionState, ReferenceResolver, ReportedCredits,
    SignRequest, classify_build, collect_references, dispatch, is_remote_url, materialize_file,
    materialize_json,
};
use dws_sandbox::{EntryKind, PathJail, tree};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::redact::Redactor;

/// Default reporting period for credit usage and forecasts.
pub const DEFAULT_CREDIT_PERIOD_DAYS: u32 = 30;

/// Default AI redaction criteria when none are given.
pub const DEFAULT_REDACTION_CRITERIA: &str = "All personally identifiable information";

/// Arguments for the build tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentProcessorParams {
    /// Build instructions: `parts`, optional `actions`, optional `output`.
    pub instructions: Instructions,
    /// Where to write the result. Required unless the output type is
    /// `json-content`, in which case the content is returned inline.
    #[serde(default)]
    pub output_path: Option<String>,
}

/// Arguments for the signing tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSignerParams {
    /// Document to sign: a local path or an http(s) URL.
    pub file_path: String,
    /// Signature options (signature type, appearance, position, ...).
    #[serde(default)]
    pub signature_options: Option<Map<String, Value>>,
    /// Image for the signature's watermark appearance.
    #[serde(default)]
    pub watermark_image_path: Option<String>,
    /// Graphic image for the signature appearance.
    #[serde(default)]
    pub graphic_image_path: Option<String>,
    /// Where to write the signed document.
    pub output_path: String,
}

/// Arguments for the AI redaction tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiRedactorParams {
    /// Document to redact: a local path or an http(s) URL.
    pub file_path: String,
    /// What to redact, in plain language.
    #[serde(default)]
    pub criteria: Option<String>,
    /// Where to write the redacted document. Must differ from `filePath`.
    pub output_path: String,
    /// Stage redactions as annotations for review instead of applying them.
    #[serde(default)]
    pub stage: bool,
    /// Apply redactions directly. Mutually exclusive with `stage`.
    #[serde(default)]
    pub apply: bool,
}

/// What the credits tool reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CreditAction {
    /// Current account balance, from the service.
    Balance,
    /// Credits used per operation, from the local ledger.
    Usage,
    /// Projected days until the balance runs out.
    Forecast,
}

/// Arguments for the credits tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckCreditsParams {
    pub action: CreditAction,
    /// Reporting window in days (default 30).
    #[serde(default)]
    pub period_days: Option<u32>,
}

/// Arguments for the directory listing tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryTreeParams {
    /// Directory to list.
    pub path: String,
    /// How many levels to descend (default 5).
    #[serde(default)]
    pub max_depth: Option<usize>,
}

/// Runs operations against the processing API inside the path jail.
pub struct OperationGateway {
    jail: PathJail,
    client: DwsClient,
    recorder: Option<Arc<dyn UsageRecorder>>,
    ledger: Option<Arc<CreditLedger>>,
    redactor: Redactor,
}

impl OperationGateway {
    pub fn new(jail: PathJail, client: DwsClient) -> Self {
        Self {
            jail,
            client,
            recorder: None,
            ledger: None,
            redactor: Redactor::default(),
        }
    }

    /// Records usage to `ledger` and serves usage reports from it.
    pub fn with_ledger(mut self, ledger: Arc<CreditLedger>) -> Self {
        self.recorder = Some(ledger.clone());
        self.ledger = Some(ledger);
        self
    }

    /// Records usage to `recorder` without enabling usage reports.
    pub fn with_recorder(mut self, recorder: Arc<dyn UsageRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Scrubs secrets from logged error text.
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn jail(&self) -> &PathJail {
        &self.jail
    }

    /// Builds, converts, or extracts from documents.
    pub async fn build(&self, params: DocumentProcessorParams) -> ToolOutput {
        self.finish("build", self.try_build(params).await)
    }

    /// Digitally signs a document.
    pub async fn sign(&self, params: DocumentSignerParams) -> ToolOutput {
        self.finish("sign", self.try_sign(params).await)
    }

    /// Redacts sensitive content detected by the service's AI.
    pub async fn ai_redact(&self, params: AiRedactorParams) -> ToolOutput {
        self.finish("ai_redact", self.try_ai_redact(params).await)
    }

    /// Reports the account balance, local usage, or a forecast.
    pub async fn check_credits(&self, params: CheckCreditsParams) -> ToolOutput {
        self.finish("check_credits", self.try_check_credits(params).await)
    }

    /// Lists a directory inside the jail.
    pub async fn directory_tree(&self, params: DirectoryTreeParams) -> ToolOutput {
        let depth = params.max_depth.unwrap_or(tree::DEFAULT_MAX_DEPTH);
        let result = tree::build_tree(&self.jail, &params.path, depth)
            .await
            .map(|node| node.render());
        self.finish("directory_tree", result)
    }

    fn finish(&self, operation: &str, result: Result<String, DwsError>) -> ToolOutput {
        if let Err(e) = &result {
            warn!(operation, error = %self.redactor.redact(&e.to_string()), "operation failed");
        }
        ToolOutput::from(result)
    }

    async fn try_build(&self, params: DocumentProcessorParams) -> Result<String, DwsError> {
        let json_content = params.instructions.wants_json_content();
        let output_path = match (&params.output_path, json_content) {
            (Some(path), false) => Some(path.as_str()),
            (None, false) => {
                return Err(DwsError::Validation(
                    "outputPath is required unless the output type is json-content".into(),
                ));
            }
            (_, true) => None,
        };
        if let Some(path) = output_path {
            self.jail.resolve_for_write(path).await?;
        }

        let operation = classify_build(&params.instructions);
        let (instructions, references) = collect_references(&self.jail, params.instructions).await?;
        let body = dispatch::plan_build(&instructions, &references)?;
        debug!(
            %operation,
            references = references.len(),
            multipart = body.is_multipart(),
            "dispatching build"
        );

        let remote = self.client.post(Endpoint::Build, body).await?;
        self.account(operation, remote.credits).await;

        match output_path {
            None => materialize_json(remote.response).await,
            Some(path) => {
                let written = materialize_file(&self.jail, remote.response, path).await?;
                info!(%operation, path = %written.display(), "build completed");
                Ok(format!("Processed document saved to {}", written.display()))
            }
        }
    }

    async fn try_sign(&self, params: DocumentSignerParams) -> Result<String, DwsError> {
        self.jail.resolve_for_write(&params.output_path).await?;

        let mut resolver = ReferenceResolver::new(&self.jail);
        let document = resolver.resolve(&params.file_path).await?;
        let watermark_image = match &params.watermark_image_path {
            Some(raw) => Some(resolver.resolve(raw).await?),
            None => None,
        };
        let graphic_image = match &params.graphic_image_path {
            Some(raw) => Some(resolver.resolve(raw).await?),
            None => None,
        };
        let references = resolver.finish()?;

        let request = SignRequest {
            document,
            options: params.signature_options,
            watermark_image,
            graphic_image,
        };
        let body = dispatch::plan_sign(&request, &references)?;

        let remote = self.client.post(Endpoint::Sign, body).await?;
        self.account(OperationKind::Sign, remote.credits).await;
        let written = materialize_file(&self.jail, remote.response, &params.output_path).await?;
        info!(path = %written.display(), "sign completed");
        Ok(format!("Signed document saved to {}", written.display()))
    }

    async fn try_ai_redact(&self, params: AiRedactorParams) -> Result<String, DwsError> {
        let state = match (params.stage, params.apply) {
            (true, true) => {
                return Err(DwsError::Validation(
                    "stage and apply cannot both be true; choose one (or neither for the default behavior)"
                        .into(),
                ));
            }
            (true, false) => Some(RedactionState::Stage),
            (false, true) => Some(RedactionState::Apply),
            (false, false) => None,
        };

        let output = self.jail.resolve_for_write(&params.output_path).await?;
        if !is_remote_url(&params.file_path) {
            let input = self
                .jail
                .resolve_for_read(&params.file_path, EntryKind::File)
                .await
                .map_err(|e| DwsError::reference(&params.file_path, e.into()))?;
            if input == output {
                return Err(DwsError::Validation(format!(
                    "outputPath '{}' resolves to the input document {}; choose a different output path",
                    params.output_path,
                    output.display()
                )));
            }
        }

        let mut resolver = ReferenceResolver::new(&self.jail);
        let key = resolver.resolve(&params.file_path).await?;
        let references = resolver.finish()?;
        let criteria = params
            .criteria
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_REDACTION_CRITERIA);
        let body = dispatch::plan_ai_redact(&key, criteria, state, &references)?;

        let remote = self.client.post(Endpoint::AiRedact, body).await?;
        self.account(OperationKind::AiRedact, remote.credits).await;
        let written = materialize_file(&self.jail, remote.response, &params.output_path).await?;
        info!(path = %written.display(), ?state, "AI redaction completed");
        Ok(format!("Redacted document saved to {}", written.display()))
    }

    async fn try_check_credits(&self, params: CheckCreditsParams) -> Result<String, DwsError> {
        let period = params.period_days.unwrap_or(DEFAULT_CREDIT_PERIOD_DAYS);
        if params.action == CreditAction::Balance {
            return self.client.account_info().await;
        }

        let ledger = self.ledger.as_ref().ok_or_else(|| {
            DwsError::Validation(
                "Credit tracking is disabled; set credits.enabled = true to record usage locally"
                    .into(),
            )
        })?;
        let report = match params.action {
            CreditAction::Usage => serde_json::to_string_pretty(&ledger.summary(period).await?),
            _ => serde_json::to_string_pretty(&ledger.forecast(period).await?),
        };
        report.map_err(|e| DwsError::Internal(format!("failed to serialize credit report: {e}")))
    }

    /// Records reported credits. Recorder failures are logged and ignored.
    async fn account(&self, operation: OperationKind, credits: Option<ReportedCredits>) {
        let (Some(recorder), Some(credits)) = (&self.recorder, credits) else {
            return;
        };
        let usage = CreditUsage {
            operation,
            cost: credits.cost,
            remaining: credits.remaining,
        };
        if let Err(e) = recorder.record_usage(&usage).await {
            warn!(%operation, error = %self.redactor.redact(&e.to_string()), "failed to record credit usage");
        }
    }
}
