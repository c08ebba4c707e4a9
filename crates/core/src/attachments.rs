//! Inline appointment attachments.
//!
//! Uploads are same-process base64 data URLs stored on the appointment
//! document, not a separate binary store. Validation happens once, at
//! booking time: the data URL must parse, decode, and stay under the
//! ceilings below, and the declared media type must be one the clinic
//! accepts (PDFs, presentations, images).

use crate::{ClinicError, ClinicResult};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Maximum attachments per appointment.
pub const MAX_ATTACHMENTS: usize = 5;

/// Maximum decoded size per attachment: 5 MiB.
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

const ACCEPTED_MEDIA_TYPES: [&str; 7] = [
    "application/pdf",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
];

/// One uploaded health-record file, stored inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    /// Byte size as reported by the uploader.
    pub size: u64,
    /// Declared media type.
    #[serde(rename = "type")]
    pub media_type: String,
    /// `data:<media type>;base64,<payload>`
    pub data_url: String,
}

/// Validates a batch of attachments at booking time.
pub fn validate_attachments(files: &[UploadedFile]) -> ClinicResult<()> {
    if files.len() > MAX_ATTACHMENTS {
        return Err(ClinicError::Validation(format!(
            "at most {MAX_ATTACHMENTS} attachments per appointment"
        )));
    }
    for file in files {
        validate_attachment(file)?;
    }
    Ok(())
}

fn validate_attachment(file: &UploadedFile) -> ClinicResult<()> {
    if file.name.trim().is_empty() {
        return Err(ClinicError::Validation("attachment name is required".into()));
    }

    if !ACCEPTED_MEDIA_TYPES.contains(&file.media_type.as_str()) {
        return Err(ClinicError::Validation(format!(
            "unsupported attachment type: {}",
            file.media_type
        )));
    }

    let payload = file
        .data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| {
            ClinicError::Validation(format!("attachment {} is not a base64 data URL", file.name))
        })?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| {
            ClinicError::Validation(format!("attachment {} has invalid base64 content", file.name))
        })?;

    if decoded.len() > MAX_ATTACHMENT_BYTES {
        return Err(ClinicError::Validation(format!(
            "attachment {} exceeds the {} MiB limit",
            file.name,
            MAX_ATTACHMENT_BYTES / (1024 * 1024)
        )));
    }

    Ok(())
}
