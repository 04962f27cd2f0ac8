//! Turns raw object bytes into text the detectors can run over.

use async_compression::tokio::bufread::GzipDecoder;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

/// Objects larger than this are only inspected up to this many bytes.
pub const DEFAULT_MAX_BYTES: u64 = 16 * 1024 * 1024;

/// Shortest printable run kept when pulling text out of binary data.
const MIN_RUN: usize = 4;

/// Inspectable text extracted from an object body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectContent {
    pub text: String,
    /// True when the body was not UTF-8 text and `text` holds its printable runs.
    pub binary: bool,
    /// True when reading stopped at the byte limit.
    pub truncated: bool,
    /// Decoded bytes consumed, after gzip decompression.
    pub bytes_read: u64,
}

/**
    Reads an object body, decompressing it when `gzip` is set.

    # Arguments

    * `body` - Async reader over the object body.
    * `gzip` - Whether the body is gzip-compressed.
    * `max_bytes` - Limit on decoded bytes to keep.

    # Returns

    The extracted text along with binary and truncation flags.
*/
pub async fn read_content<R>(body: R, gzip: bool, max_bytes: u64) -> std::io::Result<ObjectContent>
where
    R: AsyncRead + Unpin,
{
    let mut data = Vec::new();
    // One extra byte tells a body of exactly max_bytes apart from a longer one.
    let limit = max_bytes.saturating_add(1);
    if gzip {
        GzipDecoder::new(BufReader::new(body))
            .take(limit)
            .read_to_end(&mut data)
            .await?;
    } else {
        body.take(limit).read_to_end(&mut data).await?;
    }

    let truncated = data.len() as u64 > max_bytes;
    if truncated {
        data.truncate(max_bytes as usize);
    }
    let bytes_read = data.len() as u64;
    let (text, binary) = decode(data, truncated);

    Ok(ObjectContent {
        text,
        binary,
        truncated,
        bytes_read,
    })
}

/// Checks for NUL bytes in the first 1024 bytes.
pub fn looks_binary(data: &[u8]) -> bool {
    data.iter().take(1024).any(|&b| b == 0)
}

fn decode(data: Vec<u8>, truncated: bool) -> (String, bool) {
    if looks_binary(&data) {
        return (printable_runs(&data, MIN_RUN), true);
    }
    match String::from_utf8(data) {
        Ok(text) => (text, false),
        // A cut at the byte limit can split a multi-byte character.
        Err(e) if truncated && e.utf8_error().error_len().is_none() => {
            let valid = e.utf8_error().valid_up_to();
            let mut bytes = e.into_bytes();
            bytes.truncate(valid);
            (String::from_utf8_lossy(&bytes).into_owned(), false)
        }
        Err(e) => (printable_runs(e.as_bytes(), MIN_RUN), true),
    }
}

/**
    Collects runs of printable ASCII of at least `min_len` bytes, one per line.

    # Examples

    ```
    use s3inspect::content::printable_runs;
    let data = b"\x89PNG\r\n\x1a\n\x00\x00tEXtComment\x00mail jack@example.org\x00\x01";
    let text = printable_runs(data, 4);
    assert!(text.contains("mail jack@example.org"));
    ```
*/
pub fn printable_runs(data: &[u8], min_len: usize) -> String {
    let mut out = String::new();
    let mut run = String::new();
    for &b in data {
        if b == b'\t' || (0x20..=0x7e).contains(&b) {
            run.push(b as char);
            continue;
        }
        if run.len() >= min_len {
            out.push_str(&run);
            out.push('\n');
        }
        run.clear();
    }
    if run.len() >= min_len {
        out.push_str(&run);
        out.push('\n');
    }
    out
}
