//! Per-iteration attachment resolution for the Delta Chat → Telegram path.

use std::{io::Write, path::Path, process::Stdio};

use {
    tempfile::NamedTempFile,
    tokio::process::Command,
    tracing::{debug, warn},
};

use crate::types::DcMessage;

/// An attachment resolved for outbound delivery. Temporary variants own
/// their file and delete it on drop, which ends the relay iteration's
/// resource scope.
#[derive(Debug)]
pub enum OutboundFile {
    /// The source attachment, sent as-is.
    Original(std::path::PathBuf),
    /// A file created for this iteration (re-encoded audio, materialized
    /// HTML).
    Temporary(NamedTempFile),
}

impl OutboundFile {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Original(p) => p,
            Self::Temporary(t) => t.path(),
        }
    }
}

/// Resolve the file to attach for `message`, if any.
///
/// AAC audio is re-encoded to MP3 since Telegram clients do not render AAC;
/// a failed re-encode falls back to the original file. Messages without an
/// attachment but with an HTML body get the body materialized as a `.html`
/// file.
pub async fn resolve_outbound_file(message: &DcMessage) -> Option<OutboundFile> {
    if let Some(file) = &message.file {
        let is_aac = file
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("aac"));
        if is_aac {
            match transcode_aac_to_mp3(file).await {
                Ok(tmp) => return Some(OutboundFile::Temporary(tmp)),
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "aac transcode failed, sending original");
                    return Some(OutboundFile::Original(file.clone()));
                },
            }
        }
        return Some(OutboundFile::Original(file.clone()));
    }

    if let Some(html) = &message.html {
        match materialize_html(html) {
            Ok(tmp) => return Some(OutboundFile::Temporary(tmp)),
            Err(e) => {
                warn!(msg_id = message.id, error = %e, "failed to materialize html body");
                return None;
            },
        }
    }

    None
}

/// Re-encode an AAC file to MP3 with ffmpeg.
async fn transcode_aac_to_mp3(src: &Path) -> anyhow::Result<NamedTempFile> {
    let tmp = tempfile::Builder::new().suffix(".mp3").tempfile()?;

    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(src)
        .arg("-codec:a")
        .arg("libmp3lame")
        .arg(tmp.path())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("failed to spawn ffmpeg: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ffmpeg exited with {}: {stderr}", output.status);
    }

    debug!(src = %src.display(), "transcoded aac to mp3");
    Ok(tmp)
}

/// Write an HTML body to a temp file so it can travel as an attachment.
fn materialize_html(html: &str) -> anyhow::Result<NamedTempFile> {
    let mut tmp = tempfile::Builder::new().suffix(".html").tempfile()?;
    tmp.write_all(html.as_bytes())?;
    tmp.flush()?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> DcMessage {
        DcMessage {
            id: 1,
            chat_id: 1,
            text: String::new(),
            html: None,
            file: None,
            quote_id: None,
            sender_name: "alice".into(),
            override_sender_name: None,
        }
    }

    #[tokio::test]
    async fn no_file_no_html_yields_none() {
        assert!(resolve_outbound_file(&message()).await.is_none());
    }

    #[tokio::test]
    async fn plain_file_passes_through() {
        let mut msg = message();
        msg.file = Some("/blobs/photo.jpg".into());
        let resolved = resolve_outbound_file(&msg).await.unwrap();
        assert!(matches!(resolved, OutboundFile::Original(ref p) if p.ends_with("photo.jpg")));
    }

    #[tokio::test]
    async fn html_body_materialized_as_temp_file() {
        let mut msg = message();
        msg.html = Some("<p>hello</p>".into());
        let resolved = resolve_outbound_file(&msg).await.unwrap();
        let path = resolved.path().to_path_buf();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("html"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>hello</p>");
        drop(resolved);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn file_takes_precedence_over_html() {
        let mut msg = message();
        msg.file = Some("/blobs/doc.pdf".into());
        msg.html = Some("<p>ignored</p>".into());
        let resolved = resolve_outbound_file(&msg).await.unwrap();
        assert!(matches!(resolved, OutboundFile::Original(_)));
    }
}
