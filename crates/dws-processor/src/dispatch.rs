// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport selection for outbound requests.
//!
//! When every reference is a URL the service fetches them itself, so the
//! request is plain JSON. As soon as one reference is local the request is
//! multipart: a JSON field with the instructions (URLs stay embedded in it)
//! plus one file field per local reference.
//!
//! Plans are plain data so they can be inspected without a network; the
//! client converts them into `reqwest` bodies.

use serde::Serialize;
use serde_json::{Map, Value, json};

use dws_core::DwsError;

use crate::instructions::Instructions;
use crate::references::{FileReference, FileSource, ReferenceMap};

/// An outbound request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Multipart(Vec<MultipartField>),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }

    /// Names of the multipart fields, in order. Empty for JSON bodies.
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            RequestBody::Json(_) => Vec::new(),
            RequestBody::Multipart(fields) => fields.iter().map(|f| f.name.as_str()).collect(),
        }
    }
}

/// One multipart form field.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartField {
    pub name: String,
    pub content: FieldContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldContent {
    Text(String),
    File { file_name: String, bytes: Vec<u8> },
}

impl MultipartField {
    fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: FieldContent::Text(text.into()),
        }
    }

    fn file(reference: &FileReference, bytes: &[u8]) -> Self {
        Self {
            name: reference.key.clone(),
            content: FieldContent::File {
                file_name: reference.name.clone(),
                bytes: bytes.to_vec(),
            },
        }
    }

    /// A field named `name` carrying `reference`: the bytes for a local
    /// file, the URL text otherwise.
    fn reference(name: &str, reference: &FileReference) -> Self {
        match &reference.source {
            FileSource::Local { bytes, .. } => Self {
                name: name.to_string(),
                content: FieldContent::File {
                    file_name: reference.name.clone(),
                    bytes: bytes.clone(),
                },
            },
            FileSource::Url { url } => Self::text(name, url.clone()),
        }
    }
}

fn to_json<T: Serialize>(value: &T, what: &str) -> Result<String, DwsError> {
    serde_json::to_string(value)
        .map_err(|e| DwsError::Internal(format!("failed to serialize {what}: {e}")))
}

/// Plans a build request from rewritten instructions and their references.
pub fn plan_build(instructions: &Instructions, references: &ReferenceMap) -> Result<RequestBody, DwsError> {
    if references.all_urls() {
        let value = serde_json::to_value(instructions)
            .map_err(|e| DwsError::Internal(format!("failed to serialize instructions: {e}")))?;
        return Ok(RequestBody::Json(value));
    }

    let mut fields = vec![MultipartField::text(
        "instructions",
        to_json(instructions, "instructions")?,
    )];
    for reference in references.local() {
        if let FileSource::Local { bytes, .. } = &reference.source {
            fields.push(MultipartField::file(reference, bytes));
        }
    }
    Ok(RequestBody::Multipart(fields))
}

/// A signing request after reference resolution. Each field holds a key
/// into the accompanying [`ReferenceMap`].
#[derive(Debug, Clone, Default)]
pub struct SignRequest {
    pub document: String,
    pub options: Option<Map<String, Value>>,
    pub watermark_image: Option<String>,
    pub graphic_image: Option<String>,
}

/// Field names expected by the signing endpoint.
const SIGN_FILE_FIELD: &str = "file";
const SIGN_DATA_FIELD: &str = "data";
const SIGN_WATERMARK_FIELD: &str = "image";
const SIGN_GRAPHIC_FIELD: &str = "graphicImage";

fn lookup<'r>(references: &'r ReferenceMap, key: &str) -> Result<&'r FileReference, DwsError> {
    references
        .get(key)
        .ok_or_else(|| DwsError::Internal(format!("reference key {key} was not collected")))
}

/// Plans a signing request: document, signature options, and the optional
/// watermark and graphic images.
pub fn plan_sign(request: &SignRequest, references: &ReferenceMap) -> Result<RequestBody, DwsError> {
    let slots = [
        (SIGN_FILE_FIELD, Some(&request.document)),
        (SIGN_WATERMARK_FIELD, request.watermark_image.as_ref()),
        (SIGN_GRAPHIC_FIELD, request.graphic_image.as_ref()),
    ];
    let options = Value::Object(request.options.clone().unwrap_or_default());

    if references.all_urls() {
        let mut body = Map::new();
        for (field, key) in slots {
            if let Some(key) = key {
                let reference = lookup(references, key)?;
                body.insert(field.to_string(), json!({ "url": reference.name }));
            }
        }
        body.insert(SIGN_DATA_FIELD.to_string(), options);
        return Ok(RequestBody::Json(Value::Object(body)));
    }

    let mut fields = Vec::with_capacity(4);
    for (field, key) in slots {
        if let Some(key) = key {
            fields.push(MultipartField::reference(field, lookup(references, key)?));
        }
    }
    fields.push(MultipartField::text(SIGN_DATA_FIELD, to_json(&options, "signature options")?));
    Ok(RequestBody::Multipart(fields))
}

/// Whether an AI redaction is staged for review or applied directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RedactionState {
    Stage,
    Apply,
}

/// Plans an AI redaction request for the document under `key`.
pub fn plan_ai_redact(
    key: &str,
    criteria: &str,
    state: Option<RedactionState>,
    references: &ReferenceMap,
) -> Result<RequestBody, DwsError> {
    let reference = lookup(references, key)?;

    let document = match &reference.source {
        FileSource::Url { url } => json!({ "url": url }),
        FileSource::Local { .. } => json!({ "documentId": reference.key }),
    };
    let mut data = json!({
        "documents": [document],
        "criteria": criteria,
    });
    if let Some(state) = state {
        data["redaction_state"] = json!(state);
    }

    match &reference.source {
        FileSource::Url { .. } => Ok(RequestBody::Json(json!({ "data": data }))),
        FileSource::Local { bytes, .. } => Ok(RequestBody::Multipart(vec![
            MultipartField::file(reference, bytes),
            MultipartField::text("data", to_json(&data, "redaction request")?),
        ])),
    }
}
