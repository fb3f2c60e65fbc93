//! Authenticated streaming download of Slack-hosted files

use crate::error::{Result, SlackFeedError};
use crate::slack::FileAttachment;
use crate::storage::PublicDir;
use async_compression::tokio::bufread::{GzipDecoder, ZlibDecoder};
use futures::TryStreamExt;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING, HeaderMap};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tokio_util::io::StreamReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentEncoding {
    Gzip,
    Deflate,
    Identity,
}

impl ContentEncoding {
    fn from_headers(headers: &HeaderMap) -> Self {
        let value = headers
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase());

        match value.as_deref() {
            Some("gzip") | Some("x-gzip") => Self::Gzip,
            Some("deflate") => Self::Deflate,
            _ => Self::Identity,
        }
    }
}

pub struct FileDownloader {
    http: reqwest::Client,
    token: String,
    public_dir: PublicDir,
}

impl FileDownloader {
    pub fn new(token: impl Into<String>, public_dir: PublicDir) -> Result<Self> {
        // Bodies are decoded by hand so gzip and deflate both stream to disk
        let http = reqwest::Client::builder().no_gzip().no_deflate().build()?;

        Ok(Self {
            http,
            token: token.into(),
            public_dir,
        })
    }

    /// Download an attachment into the public directory and return its path
    pub async fn fetch_attachment(&self, file: &FileAttachment) -> Result<PathBuf> {
        let url = file.download_url().ok_or_else(|| {
            SlackFeedError::Download(format!("{} has no download URL", file.label()))
        })?;
        let output_path = self
            .public_dir
            .file_path(file, chrono::Utc::now().timestamp_millis());

        self.download(url, &output_path).await?;

        tracing::info!(
            file = %file.label(),
            path = %output_path.display(),
            "Downloaded file"
        );
        Ok(output_path)
    }

    /// Stream `url` to `output_path`, decoding gzip/deflate bodies
    ///
    /// Completes once the whole body has been written. A partially written
    /// file is removed when the transfer fails.
    pub async fn download(&self, url: &str, output_path: &Path) -> Result<()> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT_ENCODING, "gzip,deflate")
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SlackFeedError::Download(format!(
                "unexpected status {} for {}",
                status, url
            )));
        }

        let encoding = ContentEncoding::from_headers(response.headers());
        tracing::debug!(url = %url, encoding = ?encoding, "Streaming file download");

        let body = StreamReader::new(response.bytes_stream().map_err(std::io::Error::other));
        tokio::pin!(body);

        let mut file = File::create(output_path).await?;
        let written = match copy_decoded(encoding, body, &mut file).await {
            Ok(written) => written,
            Err(e) => {
                drop(file);
                if let Err(remove_err) = fs::remove_file(output_path).await {
                    tracing::debug!(
                        path = %output_path.display(),
                        error = %remove_err,
                        "Could not remove partial download"
                    );
                }
                return Err(e.into());
            }
        };

        tracing::debug!(path = %output_path.display(), bytes = written, "Download complete");
        Ok(())
    }
}

async fn copy_decoded<R, W>(
    encoding: ContentEncoding,
    reader: R,
    writer: &mut W,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let written = match encoding {
        ContentEncoding::Gzip => tokio::io::copy(&mut GzipDecoder::new(reader), writer).await?,
        ContentEncoding::Deflate => tokio::io::copy(&mut ZlibDecoder::new(reader), writer).await?,
        ContentEncoding::Identity => {
            let mut reader = reader;
            tokio::io::copy(&mut reader, writer).await?
        }
    };
    writer.flush().await?;
    Ok(written)
}
