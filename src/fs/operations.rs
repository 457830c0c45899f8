use std::io::SeekFrom;

use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// Reads the last non-empty line of a file by walking backwards from its end in
/// `buffer`-sized chunks. Trailing line breaks are skipped and not returned.
/// An empty file, or one that only has line breaks, yields an empty string.
pub async fn read_last_line(
    file: &mut (impl AsyncRead + AsyncSeek + Unpin),
    buffer: &mut [u8],
) -> Result<String, io::Error> {
    if buffer.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "buffer for reading a line can't be empty",
        ));
    }

    let mut position = file.seek(SeekFrom::End(0)).await?;
    let mut line_end = None;
    let mut line_start = 0u64;

    'chunks: while position > 0 {
        let chunk = u64::min(position, buffer.len() as u64) as usize;
        position -= chunk as u64;
        file.seek(SeekFrom::Start(position)).await?;
        file.read_exact(&mut buffer[..chunk]).await?;

        for (index, value) in buffer[..chunk].iter().enumerate().rev() {
            let offset = position + index as u64;
            match (line_end, *value) {
                (None, b'\n' | b'\r') => (),
                (None, _) => line_end = Some(offset + 1),
                (Some(_), b'\n') => {
                    line_start = offset + 1;
                    break 'chunks;
                }
                (Some(_), _) => (),
            }
        }
    }

    let Some(line_end) = line_end else {
        return Ok(String::new());
    };

    file.seek(SeekFrom::Start(line_start)).await?;
    let mut line = vec![0; (line_end - line_start) as usize];
    file.read_exact(&mut line).await?;
    String::from_utf8(line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
