//! Content-Length framed JSON-RPC messages.
//!
//! ```text
//! Content-Length: 52\r\n
//! \r\n
//! {"jsonrpc":"2.0","id":1,"method":"initialize",...}
//! ```

use crate::{LspError, LspResult};

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const CONTENT_LENGTH: &str = "content-length";
const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

/// Write one framed message and flush.
pub async fn write_message<W>(writer: &mut W, message: &Value) -> LspResult<()>
where
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(message)?;
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message. `Ok(None)` on a clean EOF between messages.
pub async fn read_message<R>(reader: &mut R) -> LspResult<Option<Value>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length: Option<usize> = None;
    let mut line = String::new();
    let mut saw_header = false;

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            if saw_header {
                return Err(LspError::protocol("connection closed inside message header"));
            }
            return Ok(None);
        }

        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            if saw_header {
                break;
            }
            continue;
        }
        saw_header = true;

        // Other headers (Content-Type) are accepted and ignored
        if let Some((name, value)) = header.split_once(':')
            && name.trim().eq_ignore_ascii_case(CONTENT_LENGTH)
        {
            let length = value
                .trim()
                .parse()
                .map_err(|_| LspError::protocol(format!("invalid Content-Length '{value}'")))?;
            content_length = Some(length);
        }
    }

    let length = content_length.ok_or_else(|| LspError::protocol("missing Content-Length"))?;
    if length > MAX_MESSAGE_BYTES {
        return Err(LspError::protocol(format!(
            "message of {length} bytes exceeds limit"
        )));
    }

    let mut body = vec![0; length];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}
