// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The build instruction graph.
//!
//! Only fields that name a file or URL are modelled explicitly; everything
//! else is carried in flattened `extra` maps and serialized back unchanged.

use std::borrow::Cow;

use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Output type that returns extracted content inline instead of a file.
pub const JSON_CONTENT_OUTPUT: &str = "json-content";

/// A complete build request: document parts, top-level actions, and output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Instructions {
    /// Documents to assemble, in order.
    pub parts: Vec<Part>,

    /// Actions applied to the assembled document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,

    /// Output format. Defaults to PDF on the service side when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Output>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Instructions {
    /// Whether the build returns JSON content rather than a document.
    pub fn wants_json_content(&self) -> bool {
        self.output.as_ref().is_some_and(Output::is_json_content)
    }
}

/// One input document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Part {
    /// Local path (sandbox-relative or absolute) or an http(s) URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Page ranges, passwords, per-part actions, and other options.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The output descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Output {
    /// `pdf`, `pdfa`, `pdfua`, `image`, `docx`, `xlsx`, `pptx`, `html`,
    /// `markdown`, or `json-content`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Output {
    pub fn is_json_content(&self) -> bool {
        self.kind.as_deref() == Some(JSON_CONTENT_OUTPUT)
    }
}

/// A top-level action.
///
/// Only the kinds that carry a file field get their own variant; every
/// other action is kept as its raw JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Watermark(WatermarkAction),
    ApplyXfdf(FileAction),
    ApplyInstantJson(FileAction),
    Other(Map<String, Value>),
}

impl Action {
    /// The action's `type` discriminator.
    pub fn kind(&self) -> &str {
        let extra = match self {
            Action::Watermark(a) => &a.extra,
            Action::ApplyXfdf(a) | Action::ApplyInstantJson(a) => &a.extra,
            Action::Other(map) => map,
        };
        extra.get("type").and_then(Value::as_str).unwrap_or_default()
    }

    /// Mutable access to the file-bearing field, if this kind has one.
    pub fn file_field_mut(&mut self) -> Option<&mut String> {
        match self {
            Action::Watermark(a) => a.image.as_mut(),
            Action::ApplyXfdf(a) | Action::ApplyInstantJson(a) => Some(&mut a.file),
            Action::Other(_) => None,
        }
    }
}

/// A watermark action. Text watermarks have no `image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatermarkAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An `applyXfdf` or `applyInstantJson` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAction {
    pub file: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn from_map<T: DeserializeOwned, E: de::Error>(map: Map<String, Value>) -> Result<T, E> {
    serde_json::from_value(Value::Object(map)).map_err(E::custom)
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let kind = match map.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(_) => return Err(de::Error::custom("action `type` must be a string")),
            None => return Err(de::Error::missing_field("type")),
        };
        match kind.as_str() {
            "watermark" => from_map(map).map(Action::Watermark),
            "applyXfdf" => from_map(map).map(Action::ApplyXfdf),
            "applyInstantJson" => from_map(map).map(Action::ApplyInstantJson),
            _ => Ok(Action::Other(map)),
        }
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Action::Watermark(a) => a.serialize(serializer),
            Action::ApplyXfdf(a) | Action::ApplyInstantJson(a) => a.serialize(serializer),
            Action::Other(map) => map.serialize(serializer),
        }
    }
}

impl JsonSchema for Action {
    fn schema_name() -> Cow<'static, str> {
        "Action".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "object",
            "description": "A document action. `watermark` may take an `image` path or URL; \
                            `applyXfdf` and `applyInstantJson` take a `file` path or URL. \
                            Other kinds (ocr, rotate, flatten, createRedactions, \
                            applyRedactions, ...) pass through unchanged.",
            "required": ["type"],
            "properties": {
                "type": { "type": "string" },
                "image": { "type": "string" },
                "file": { "type": "string" }
            },
            "additionalProperties": true
        })
    }
}
