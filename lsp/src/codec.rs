//! `Content-Length` framing for JSON-RPC over byte streams.
//!
//! LSP frames look like `Content-Length: N\r\n\r\n{json}`. The reader and
//! writer here are the only code that touches the raw transport.

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Frames above this size are rejected rather than buffered.
const MAX_FRAME_BYTES: usize = 8 * 1024 * 1024;

/// Reads framed JSON-RPC values from an async byte stream.
pub struct FrameReader<R> {
    input: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: BufReader::new(input),
        }
    }

    /// Read the next frame. `Ok(None)` means the peer closed the stream
    /// between frames (clean shutdown); EOF anywhere else is an error.
    pub async fn read_frame(&mut self) -> Result<Option<serde_json::Value>> {
        let mut line = String::new();
        let mut length: Option<usize> = None;
        let mut header_count = 0usize;

        loop {
            line.clear();
            let n = self
                .input
                .read_line(&mut line)
                .await
                .context("reading frame header")?;
            if n == 0 {
                if header_count == 0 {
                    return Ok(None);
                }
                bail!("stream ended mid-headers");
            }
            let header = line.trim_ascii();
            if header.is_empty() {
                break;
            }
            header_count += 1;

            // Headers other than Content-Length (e.g. Content-Type) are
            // legal and ignored. Matching is case-insensitive.
            if let Some((name, value)) = header.split_once(':')
                && name.trim().eq_ignore_ascii_case("content-length")
            {
                length = Some(
                    value
                        .trim()
                        .parse()
                        .context("unparseable Content-Length header")?,
                );
            }
        }

        let length = length.context("frame missing Content-Length header")?;
        if length > MAX_FRAME_BYTES {
            bail!("frame of {length} bytes exceeds the {MAX_FRAME_BYTES} byte cap");
        }

        let mut body = vec![0u8; length];
        self.input
            .read_exact(&mut body)
            .await
            .context("reading frame body")?;
        serde_json::from_slice(&body)
            .context("frame body is not valid JSON")
            .map(Some)
    }
}

/// Writes framed JSON-RPC values to an async byte stream.
pub struct FrameWriter<W> {
    output: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub async fn write_frame(&mut self, frame: &serde_json::Value) -> Result<()> {
        let body = serde_json::to_vec(frame).context("serializing frame")?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        self.output
            .write_all(header.as_bytes())
            .await
            .context("writing frame header")?;
        self.output
            .write_all(&body)
            .await
            .context("writing frame body")?;
        self.output.flush().await.context("flushing frame")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read_roundtrip() {
        let frame = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "textDocument/publishDiagnostics",
            "params": { "uri": "file:///ws/src/lib.rs", "diagnostics": [] }
        });

        let mut buf = Vec::new();
        FrameWriter::new(&mut buf).write_frame(&frame).await.unwrap();

        let read = FrameReader::new(buf.as_slice())
            .read_frame()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read, frame);
    }

    #[tokio::test]
    async fn test_consecutive_frames() {
        let a = serde_json::json!({"id": 1});
        let b = serde_json::json!({"id": 2});
        let mut buf = Vec::new();
        let mut writer = FrameWriter::new(&mut buf);
        writer.write_frame(&a).await.unwrap();
        writer.write_frame(&b).await.unwrap();

        let mut reader = FrameReader::new(buf.as_slice());
        assert_eq!(reader.read_frame().await.unwrap().unwrap(), a);
        assert_eq!(reader.read_frame().await.unwrap().unwrap(), b);
        assert!(reader.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clean_eof_is_none() {
        let mut reader = FrameReader::new(&b""[..]);
        assert!(reader.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eof_mid_headers_is_an_error() {
        let mut reader = FrameReader::new(&b"Content-Length: 10\r\n"[..]);
        assert!(reader.read_frame().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_content_length_is_an_error() {
        let mut reader = FrameReader::new(&b"Content-Type: application/json\r\n\r\n{}"[..]);
        assert!(reader.read_frame().await.is_err());
    }

    #[tokio::test]
    async fn test_short_body_is_an_error() {
        let mut reader = FrameReader::new(&b"Content-Length: 50\r\n\r\n{}"[..]);
        assert!(reader.read_frame().await.is_err());
    }

    #[tokio::test]
    async fn test_header_matching_is_case_insensitive() {
        let body = r#"{"ok":true}"#;
        let stream = format!("content-length: {}\r\n\r\n{body}", body.len());
        let frame = FrameReader::new(stream.as_bytes())
            .read_frame()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame["ok"], true);
    }

    #[tokio::test]
    async fn test_extra_headers_are_ignored() {
        let body = r#"{"ok":true}"#;
        let stream = format!(
            "Content-Type: application/vscode-jsonrpc\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let frame = FrameReader::new(stream.as_bytes())
            .read_frame()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(frame["ok"], true);
    }

    #[tokio::test]
    async fn test_oversized_frame_is_rejected() {
        let stream = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_BYTES + 1);
        assert!(
            FrameReader::new(stream.as_bytes())
                .read_frame()
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_content_length_counts_bytes_not_chars() {
        let frame = serde_json::json!({"msg": "expected `©`"});
        let mut buf = Vec::new();
        FrameWriter::new(&mut buf).write_frame(&frame).await.unwrap();

        let body = serde_json::to_vec(&frame).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with(&format!("Content-Length: {}\r\n\r\n", body.len())));

        let read = FrameReader::new(buf.as_slice())
            .read_frame()
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read, frame);
    }
}
