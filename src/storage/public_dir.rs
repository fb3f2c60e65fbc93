use crate::error::Result;
use crate::slack::FileAttachment;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Directory served by the dashboard host, holding downloaded attachments
#[derive(Debug, Clone)]
pub struct PublicDir {
    base_path: PathBuf,
}

impl PublicDir {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the local path for an attachment: {base}/{millis}-{file_id}.{ext}
    pub fn file_path(&self, file: &FileAttachment, timestamp_ms: i64) -> PathBuf {
        let stem = match file.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => format!("{}-{}", timestamp_ms, sanitize(id)),
            None => timestamp_ms.to_string(),
        };

        self.base_path
            .join(format!("{}.{}", stem, sanitize(file.extension())))
    }

    /// Ensure the directory exists
    pub async fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }
}

/// Keep path components to a safe character set
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
