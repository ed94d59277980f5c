use super::blob::{StagedBlob, PNG_MIME, SCENE_MIME};
use super::{Delivery, ExportError};

/// Where a finished export goes.
pub trait DownloadSink {
    fn deliver(&mut self, file_name: &str, blob: &StagedBlob) -> Result<Delivery, ExportError>;
}

// ---------------------------------------------------------------------------
// Save dialog
// ---------------------------------------------------------------------------

/// Asks for a destination with a native save dialog, then writes the file.
#[derive(Debug, Default)]
pub struct SaveDialogSink;

impl DownloadSink for SaveDialogSink {
    fn deliver(&mut self, file_name: &str, blob: &StagedBlob) -> Result<Delivery, ExportError> {
        let (label, ext) = save_filter(blob.mime());
        let Some(path) = rfd::FileDialog::new()
            .set_title("Save export")
            .set_file_name(file_name)
            .add_filter(label, &[ext])
            .save_file()
        else {
            return Ok(Delivery::Dismissed);
        };

        std::fs::write(&path, blob.bytes())?;
        log::debug!("Wrote {} bytes from {}", blob.len(), blob.url());
        Ok(Delivery::Saved(path))
    }
}

/// Dialog filter name and extension for a payload type.
fn save_filter(mime: &str) -> (&'static str, &'static str) {
    match mime {
        PNG_MIME => ("PNG image", "png"),
        SCENE_MIME => ("Chart scene", "json"),
        _ => ("CSV", "csv"),
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Keeps every delivered file, newest last.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl DownloadSink for MemorySink {
    fn deliver(&mut self, file_name: &str, blob: &StagedBlob) -> Result<Delivery, ExportError> {
        self.files.push((file_name.to_string(), blob.bytes().to_vec()));
        Ok(Delivery::Saved(file_name.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::blob::{BlobRegistry, CSV_MIME};

    #[test]
    fn dialog_filter_follows_payload_type() {
        let registry = BlobRegistry::new();
        let png = registry.stage(PNG_MIME, Vec::new());
        let csv = registry.stage(CSV_MIME, Vec::new());
        assert_eq!(save_filter(png.mime()), ("PNG image", "png"));
        assert_eq!(save_filter(csv.mime()), ("CSV", "csv"));
    }
}
