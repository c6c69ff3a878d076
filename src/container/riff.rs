/*---------------------------------------------------------------------------------------------
 *  RIFF chunk walker: the outermost layer every encode wraps its bitstream in
 *  and every decode unwraps before touching VP8/VP8L.
 *--------------------------------------------------------------------------------------------*/

use crate::error::WebPError;

pub struct Chunk<'a> {
    pub id: [u8; 4],
    pub payload: &'a [u8],
}

/// Parses a top-level `RIFF....WEBP` container into its child chunks. Stops consuming at the
/// declared RIFF size rather than requiring the input to end there, so trailing garbage after a
/// valid container is simply ignored.
pub fn parse_chunks(data: &[u8]) -> anyhow::Result<Vec<Chunk<'_>>> {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WEBP" {
        anyhow::bail!(WebPError::MalformedContainer("missing RIFF/WEBP signature"));
    }
    let riff_size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let end = (8 + riff_size).min(data.len());

    let mut chunks = Vec::new();
    let mut pos = 12;
    while pos + 8 <= end {
        let id = [data[pos], data[pos + 1], data[pos + 2], data[pos + 3]];
        let size = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]]) as usize;
        let payload_start = pos + 8;
        let payload_end = payload_start + size;
        if payload_end > data.len() {
            anyhow::bail!(WebPError::MalformedContainer("chunk size exceeds available bytes"));
        }
        chunks.push(Chunk {
            id,
            payload: &data[payload_start..payload_end],
        });
        pos = payload_end + (size & 1);
    }
    Ok(chunks)
}

/// Finds the first chunk with the given four-character code, if any.
pub fn find<'a, 'b>(chunks: &'b [Chunk<'a>], id: &[u8; 4]) -> Option<&'b Chunk<'a>> {
    chunks.iter().find(|c| &c.id == id)
}

/// Accumulates chunks in insertion order and assembles them into a complete RIFF/WEBP byte
/// stream, padding every payload to an even length
#[derive(Default)]
pub struct RiffWriter {
    chunks: Vec<([u8; 4], Vec<u8>)>,
}

impl RiffWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, id: [u8; 4], payload: Vec<u8>) {
        self.chunks.push((id, payload));
    }

    pub fn finish(self) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(b"WEBP");
        for (id, payload) in &self.chunks {
            body.extend_from_slice(id);
            body.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            body.extend_from_slice(payload);
            if payload.len() % 2 == 1 {
                body.push(0);
            }
        }

        let mut out = Vec::with_capacity(8 + body.len());
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_two_chunks() {
        let mut writer = RiffWriter::new();
        writer.push_chunk(*b"VP8L", vec![1, 2, 3]);
        writer.push_chunk(*b"EXIF", vec![9, 9, 9, 9]);
        let bytes = writer.finish();

        assert_eq!(bytes.len() % 2, 0);
        let chunks = parse_chunks(&bytes).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[0].id, b"VP8L");
        assert_eq!(chunks[0].payload, &[1, 2, 3]);
        assert_eq!(&chunks[1].id, b"EXIF");
        assert_eq!(chunks[1].payload, &[9, 9, 9, 9]);
    }

    #[test]
    fn rejects_a_missing_signature() {
        assert!(parse_chunks(b"not a webp file").is_err());
    }
}
