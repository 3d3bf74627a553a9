use crate::render::RenderError;
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Converts an HTML document into a fixed-layout PDF document.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, html: &str) -> Result<Vec<u8>, RenderError>;
}

/// Pipes the document through the `wkhtmltopdf` executable.
#[derive(Debug)]
pub struct Wkhtmltopdf {
    binary: String,
}

impl Wkhtmltopdf {
    pub fn new(binary: &str) -> Self {
        Wkhtmltopdf { binary: binary.to_string() }
    }
}

#[async_trait]
impl PdfConverter for Wkhtmltopdf {
    #[instrument(skip_all, fields(binary = %self.binary))]
    async fn convert(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let mut child = Command::new(&self.binary)
            .args(["--quiet", "--encoding", "utf-8", "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => RenderError::ConverterUnavailable { binary: self.binary.clone() },
                _ => RenderError::Io(e),
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| RenderError::Io(io::Error::other("converter stdin unavailable")))?;
        let input = html.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(RenderError::Conversion {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        writer.await.map_err(io::Error::other)??;

        if !output.stdout.starts_with(PDF_MAGIC) {
            return Err(RenderError::InvalidOutput);
        }

        debug!("Converted {} bytes of HTML into {} bytes of PDF", html.len(), output.stdout.len());
        Ok(output.stdout)
    }
}
