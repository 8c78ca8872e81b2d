// SPDX-FileCopyrightText: 2026 dws-mcp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coarse operation classification for credit accounting.

use dws_core::OperationKind;

use crate::instructions::{Action, Instructions};

/// Classifies a build by its most significant action or output.
///
/// Precedence: OCR, redaction, watermark, form import, then the output type
/// (`json-content` is extraction, anything but PDF is conversion), then
/// plain build.
pub fn classify_build(instructions: &Instructions) -> OperationKind {
    let has = |pred: fn(&Action) -> bool| instructions.actions.iter().any(pred);

    if has(|a| a.kind() == "ocr") {
        return OperationKind::Ocr;
    }
    if has(|a| matches!(a.kind(), "createRedactions" | "applyRedactions")) {
        return OperationKind::Redaction;
    }
    if has(|a| matches!(a, Action::Watermark(_))) {
        return OperationKind::Watermark;
    }
    if has(|a| matches!(a, Action::ApplyXfdf(_) | Action::ApplyInstantJson(_))) {
        return OperationKind::FormImport;
    }

    match instructions.output.as_ref().and_then(|o| o.kind.as_deref()) {
        Some("json-content") => OperationKind::Extraction,
        None | Some("pdf") => OperationKind::Build,
        Some(_) => OperationKind::Conversion,
    }
}
