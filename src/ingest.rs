//! Turning user-picked files into inline data URLs.

use std::path::Path;

use anyhow::Context as _;
use base64::Engine as _;
use serde::Serialize;

/// Largest decoded file accepted into the aggregate.
pub const MAX_FILE_SIZE_BYTES: usize = 5 * 1024 * 1024;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSizeCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Estimates the decoded size of `data_url` from its encoded length and
/// rejects anything over [`MAX_FILE_SIZE_BYTES`].
pub fn validate_file_size(data_url: &str) -> FileSizeCheck {
    let size_bytes = (data_url.len() * 3).div_ceil(4);
    if size_bytes <= MAX_FILE_SIZE_BYTES {
        return FileSizeCheck {
            valid: true,
            error: None,
        };
    }

    FileSizeCheck {
        valid: false,
        error: Some(too_large_message(size_bytes as u64)),
    }
}

fn too_large_message(size_bytes: u64) -> String {
    let size_mb = size_bytes as f64 / BYTES_PER_MIB;
    let max_mb = MAX_FILE_SIZE_BYTES as f64 / BYTES_PER_MIB;
    format!(
        "File is too large ({size_mb:.1}MB). Maximum size is {max_mb:.1}MB. Please choose a smaller file."
    )
}

pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("avif") => "image/avif",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Reads a file and embeds it as a base64 `data:` URL.
pub async fn file_to_data_url(path: impl AsRef<Path>) -> anyhow::Result<String> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read file: {}", path.display()))?;
    let mime_type = mime_type_for_path(path);
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:{mime_type};base64,{encoded}"))
}

/// [`file_to_data_url`] followed by [`validate_file_size`]. Files already
/// over the limit on disk are refused before any byte is read.
pub async fn read_validated_file(path: impl AsRef<Path>) -> anyhow::Result<String> {
    let path = path.as_ref();
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("read file: {}", path.display()))?;
    if metadata.len() > MAX_FILE_SIZE_BYTES as u64 {
        anyhow::bail!("{}: {}", path.display(), too_large_message(metadata.len()));
    }

    let data_url = file_to_data_url(path).await?;
    let check = validate_file_size(&data_url);
    if !check.valid {
        let message = check.error.unwrap_or_else(|| "File is too large".to_owned());
        anyhow::bail!("{}: {message}", path.display());
    }
    tracing::debug!(path = %path.display(), bytes = data_url.len(), "ingested file");
    Ok(data_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_data_url_is_valid() {
        let check = validate_file_size("data:image/png;base64,AAAA");
        assert!(check.valid);
        assert_eq!(check.error, None);
    }

    #[test]
    fn ceiling_is_inclusive() {
        let at_limit = "A".repeat(MAX_FILE_SIZE_BYTES / 3 * 4);
        assert!(validate_file_size(&at_limit).valid);
        let over = "A".repeat(MAX_FILE_SIZE_BYTES / 3 * 4 + 8);
        assert!(!validate_file_size(&over).valid);
    }

    #[test]
    fn six_mib_is_rejected_with_sizes_in_message() {
        let data_url = "A".repeat(6 * 1024 * 1024 / 3 * 4);
        let check = validate_file_size(&data_url);
        assert!(!check.valid);
        let error = check.error.expect("error message");
        assert!(error.contains("6.0MB"), "{error}");
        assert!(error.contains("5.0MB"), "{error}");
    }

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(mime_type_for_path(Path::new("cert.PDF")), "application/pdf");
        assert_eq!(mime_type_for_path(Path::new("me.jpeg")), "image/jpeg");
        assert_eq!(
            mime_type_for_path(Path::new("notes")),
            "application/octet-stream"
        );
    }

    #[tokio::test]
    async fn file_is_embedded_as_base64_data_url() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("photo.png");
        std::fs::write(&path, b"hello")?;

        let data_url = file_to_data_url(&path).await?;
        assert_eq!(data_url, "data:image/png;base64,aGVsbG8=");
        assert_eq!(crate::normalize::infer_mime_type(&data_url), "image/png");
        Ok(())
    }

    #[tokio::test]
    async fn oversized_file_is_refused_from_its_length() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("huge.pdf");
        // Sparse: the length is set without writing any content.
        std::fs::File::create(&path)?.set_len(MAX_FILE_SIZE_BYTES as u64 + 1)?;

        let err = read_validated_file(&path).await.unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("huge.pdf"), "{message}");
        assert!(message.contains("(5.0MB)"), "{message}");
        assert!(message.contains("Maximum size is 5.0MB"), "{message}");
        Ok(())
    }

    #[tokio::test]
    async fn file_at_limit_is_still_checked_after_encoding() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("edge.png");
        std::fs::write(&path, vec![0u8; MAX_FILE_SIZE_BYTES])?;

        let err = read_validated_file(&path).await.unwrap_err();
        assert!(format!("{err:#}").contains("Maximum size is 5.0MB"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = file_to_data_url(dir.path().join("absent.png"))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("read file"));
    }
}
