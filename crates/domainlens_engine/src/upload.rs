//! Two-phase CSV upload: preview first, then an explicit confirm.
//!
//! The confirm step routes by size: small uploads go straight to the
//! direct processing endpoint, larger ones are queued as a batch job.

use std::path::Path;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::types::{ClientError, ConfirmAck, EmailPreview};

/// Upload ceiling enforced before any bytes are read.
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;
/// Only CSV files are accepted.
pub const UPLOAD_EXTENSION: &str = "csv";
/// Uploads with at most this many new emails skip the batch queue.
pub const SMALL_BATCH_LIMIT: u64 = 50;
/// Worker concurrency requested for queued batches.
pub const DEFAULT_BATCH_CONCURRENCY: u32 = 4;

#[derive(Debug, Clone)]
pub struct BatchUploadController {
    api: Arc<ApiClient>,
    session_id: String,
}

impl BatchUploadController {
    pub fn new(api: Arc<ApiClient>, session_id: impl Into<String>) -> Self {
        Self {
            api,
            session_id: session_id.into(),
        }
    }

    /// Phase one: validate locally, then ask the service what the file
    /// contains. Nothing is queued by a preview.
    pub async fn preview(&self, path: &Path) -> Result<EmailPreview, ClientError> {
        validate_upload_file(path)?;
        let bytes = read_file(path).await?;
        self.api
            .preview_csv(&self.session_id, &file_name_of(path), bytes)
            .await
    }

    /// Phase two: submit a previously previewed file. `new_emails` comes
    /// from the preview; zero means there is nothing worth submitting.
    pub async fn confirm(&self, path: &Path, new_emails: u64) -> Result<ConfirmAck, ClientError> {
        if new_emails == 0 {
            return Err(ClientError::Validation(
                "the preview found no new emails to submit".into(),
            ));
        }
        validate_upload_file(path)?;
        let bytes = read_file(path).await?;
        let file_name = file_name_of(path);
        if new_emails <= SMALL_BATCH_LIMIT {
            let ack = self
                .api
                .upload_csv(&self.session_id, &file_name, bytes)
                .await?;
            Ok(ConfirmAck::Accepted {
                message: ack.message,
                total: ack.total_emails,
            })
        } else {
            let job = self
                .api
                .submit_batch(
                    &self.session_id,
                    &file_name,
                    bytes,
                    DEFAULT_BATCH_CONCURRENCY,
                )
                .await?;
            Ok(ConfirmAck::Queued(job))
        }
    }
}

/// Extension and size gate, checked against file metadata so oversized
/// files are refused without reading them.
pub fn validate_upload_file(path: &Path) -> Result<(), ClientError> {
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(UPLOAD_EXTENSION));
    if !supported {
        return Err(ClientError::Validation(format!(
            "{} is not a .{UPLOAD_EXTENSION} file",
            path.display()
        )));
    }
    let metadata = std::fs::metadata(path).map_err(|e| {
        ClientError::Validation(format!("cannot read {}: {e}", path.display()))
    })?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(ClientError::Validation(format!(
            "{} is {} bytes; the ceiling is {MAX_UPLOAD_BYTES}",
            path.display(),
            metadata.len()
        )));
    }
    Ok(())
}

async fn read_file(path: &Path) -> Result<Vec<u8>, ClientError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ClientError::Validation(format!("cannot read {}: {e}", path.display())))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload.csv")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn non_csv_files_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.xlsx");
        std::fs::File::create(&path).unwrap();
        assert!(matches!(
            validate_upload_file(&path),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn missing_files_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(matches!(
            validate_upload_file(&path),
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn csv_extension_check_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LEADS.CSV");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "email").unwrap();
        assert!(validate_upload_file(&path).is_ok());
    }
}
