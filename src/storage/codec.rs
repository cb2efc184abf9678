//! Gzip framing for segment files.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::error::Result;
use crate::models::Segment;

/// Gzip-compress `bytes`.
pub fn compress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Inflate a gzip payload.
pub fn decompress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Serialize a segment, gzipped when `compressed` is set.
pub fn encode_segment(segment: &Segment, compressed: bool) -> Result<Vec<u8>> {
    if compressed {
        let json = serde_json::to_vec(segment)?;
        Ok(compress(&json)?)
    } else {
        Ok(serde_json::to_vec_pretty(segment)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SegmentEntry;

    #[test]
    fn test_compressed_segment_inflates_to_json() {
        let mut segment = Segment::new("data:image/png;base64,");
        segment.emojis.insert(
            "grinning-face".into(),
            SegmentEntry {
                unicode: "U+1F600".into(),
                payload: "AAA".into(),
            },
        );

        let bytes = encode_segment(&segment, true).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

        let json = decompress(&bytes).unwrap();
        let parsed: Segment = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed, segment);
    }

    #[test]
    fn test_decompress_rejects_plain_text() {
        assert!(decompress(b"not gzip at all").is_err());
    }
}
