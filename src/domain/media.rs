//! Media library rules.

use crate::domain::{entities::MediaRecord, error::DomainError, types::MediaKind};

/// Client file name without any directory part. Browsers on Windows used to
/// send the full local path, so both separators are honoured.
pub fn client_file_name(raw: &str) -> &str {
    raw.rsplit(['\\', '/']).next().unwrap_or(raw)
}

/// `Content-Disposition` value that forces a download under `name`.
pub fn attachment_disposition(name: &str) -> String {
    let escaped: String = name
        .chars()
        .filter(|ch| !ch.is_control())
        .map(|ch| if ch == '"' { '\'' } else { ch })
        .collect();
    format!("attachment; filename=\"{escaped}\"")
}

/// IMAGE rows always carry a thumbnail; FILE rows never have dimensions.
pub fn check_invariants(record: &MediaRecord) -> Result<(), DomainError> {
    match record.kind {
        MediaKind::Image if record.thumbnail.is_none() => {
            Err(DomainError::media_invariant("image without thumbnail"))
        }
        MediaKind::Image if record.width <= 0 || record.height <= 0 => {
            Err(DomainError::media_invariant("image without dimensions"))
        }
        MediaKind::File if record.width != 0 || record.height != 0 => {
            Err(DomainError::media_invariant("file with dimensions"))
        }
        _ => Ok(()),
    }
}
