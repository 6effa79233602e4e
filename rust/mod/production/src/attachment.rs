use std::sync::Arc;

use coxerp_blob::BlobStore;
use coxerp_core::new_id;
use tracing::{debug, info, warn};

use crate::error::RequestError;
use crate::model::Attachment;
use crate::store::RequestStore;

const BLOB_PREFIX: &str = "production";

/// MIME type for the extensions the intake form offers.
fn guess_mime(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "csv" => "text/csv",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

impl RequestStore {
    fn blob_store(&self) -> Result<&Arc<dyn BlobStore>, RequestError> {
        self.blobs
            .as_ref()
            .ok_or_else(|| RequestError::Validation("no attachment store is configured".into()))
    }

    /// Store `data` as the request's attachment, replacing any previous one.
    ///
    /// `filename` must be a bare name whose extension is in the configured
    /// allow-list. `mime_type` is guessed from the extension when not given.
    pub fn attach(
        &self,
        request_no: &str,
        filename: &str,
        mime_type: Option<&str>,
        data: &[u8],
    ) -> Result<Attachment, RequestError> {
        let blobs = self.blob_store()?;

        let filename = filename.trim();
        if filename.is_empty() || filename.contains(['/', '\\']) {
            return Err(RequestError::Validation(format!(
                "attachment name must be a plain file name, got {:?}",
                filename
            )));
        }
        let ext = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext,
            _ => "",
        };
        if !self.config.allows_extension(ext) {
            return Err(RequestError::Validation(format!(
                "file type {:?} is not accepted (allowed: {})",
                ext,
                self.config.attachment_extensions.join(", ")
            )));
        }
        if data.is_empty() {
            return Err(RequestError::Validation("attachment is empty".into()));
        }

        // Fail before touching the blob store if the request is unknown.
        self.get(request_no)?;

        let reference = format!("{}/{}/{}-{}", BLOB_PREFIX, request_no, new_id(), filename);
        blobs.put(&reference, data)?;

        let attachment = Attachment {
            filename: filename.to_string(),
            mime_type: mime_type
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| guess_mime(ext))
                .to_string(),
            size: data.len() as u64,
            reference: reference.clone(),
        };

        let result = self.mutate(request_no, |request, _| {
            Ok(request.attachment.replace(attachment.clone()))
        });
        let previous = match result {
            Ok((_, previous)) => previous,
            Err(e) => {
                if let Err(cleanup) = blobs.delete(&reference) {
                    warn!("failed to remove orphaned blob {}: {}", reference, cleanup);
                }
                return Err(e);
            }
        };

        if let Some(old) = previous {
            if let Err(e) = blobs.delete(&old.reference) {
                warn!("failed to remove replaced attachment {}: {}", old.reference, e);
            }
        }
        info!(
            "{}: attached {} ({} bytes, {})",
            request_no, attachment.filename, attachment.size, attachment.mime_type
        );
        Ok(attachment)
    }

    /// The request's attachment and its bytes, or `None` if it has none.
    pub fn attachment_bytes(
        &self,
        request_no: &str,
    ) -> Result<Option<(Attachment, Vec<u8>)>, RequestError> {
        let blobs = self.blob_store()?;
        let Some(attachment) = self.get(request_no)?.attachment else {
            return Ok(None);
        };
        debug!("{}: reading attachment {}", request_no, attachment.reference);
        match blobs.get(&attachment.reference)? {
            Some(bytes) => Ok(Some((attachment, bytes))),
            None => Err(RequestError::Storage(format!(
                "attachment blob {} is missing",
                attachment.reference
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use coxerp_blob::MemoryBlobStore;
    use coxerp_kv::MemoryStore;

    use super::*;
    use crate::config::RequestConfig;
    use crate::model::NewRequest;

    fn setup() -> (RequestStore, Arc<MemoryBlobStore>, String) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let store = RequestStore::new(Arc::new(MemoryStore::new()), RequestConfig::default())
            .unwrap()
            .with_blob_store(blobs.clone());
        let no = store
            .create(NewRequest::new(
                "Acme",
                "M1",
                1,
                NaiveDate::from_ymd_opt(2024, 11, 25).unwrap(),
            ))
            .unwrap();
        (store, blobs, no)
    }

    #[test]
    fn attach_and_read_back() {
        let (store, _, no) = setup();
        let att = store.attach(&no, "drawing.pdf", None, b"%PDF-1.7").unwrap();
        assert_eq!(att.mime_type, "application/pdf");
        assert_eq!(att.size, 8);
        assert!(att.reference.starts_with(&format!("production/{}/", no)));
        assert!(att.reference.ends_with("-drawing.pdf"));

        let (meta, bytes) = store.attachment_bytes(&no).unwrap().unwrap();
        assert_eq!(meta, att);
        assert_eq!(bytes, b"%PDF-1.7");
        assert_eq!(store.get(&no).unwrap().attachment, Some(att));
    }

    #[test]
    fn replacing_deletes_old_blob() {
        let (store, blobs, no) = setup();
        let first = store.attach(&no, "a.png", None, b"one").unwrap();
        let second = store.attach(&no, "b.JPG", Some("image/jpeg"), b"two").unwrap();

        assert!(!blobs.exists(&first.reference).unwrap());
        assert!(blobs.exists(&second.reference).unwrap());
        assert_eq!(blobs.list(&format!("production/{}/", no)).unwrap().len(), 1);
    }

    #[test]
    fn rejects_bad_files() {
        let (store, blobs, no) = setup();
        for name in ["", "run.exe", "noext", ".pdf", "../x.pdf", "dir/x.pdf"] {
            let err = store.attach(&no, name, None, b"x").unwrap_err();
            assert!(matches!(err, RequestError::Validation(_)), "{:?}", name);
        }
        let err = store.attach(&no, "empty.pdf", None, b"").unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));
        assert!(blobs.list("production/").unwrap().is_empty());
    }

    #[test]
    fn unknown_request_leaves_no_blob() {
        let (store, blobs, _) = setup();
        let err = store.attach("REQ-20991231-001", "a.pdf", None, b"x").unwrap_err();
        assert!(matches!(err, RequestError::NotFound(_)));
        assert!(blobs.list("production/").unwrap().is_empty());
    }

    #[test]
    fn needs_blob_store() {
        let store =
            RequestStore::new(Arc::new(MemoryStore::new()), RequestConfig::default()).unwrap();
        let err = store.attach("REQ-1", "a.pdf", None, b"x").unwrap_err();
        assert!(matches!(err, RequestError::Validation(_)));
        assert!(store.attachment_bytes("REQ-1").is_err());
    }

    #[test]
    fn no_attachment_is_none() {
        let (store, _, no) = setup();
        assert_eq!(store.attachment_bytes(&no).unwrap(), None);
    }
}
