//! Character encoding detection and transcoding of legacy sidecar files

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use tracing::debug;

use crate::sidecar::SidecarError;

/// How far into the file an XML declaration is searched for
const DECLARATION_WINDOW: usize = 256;

/// Bytes inspected when sniffing BOM-less UTF-16
const UTF16_SNIFF_WINDOW: usize = 512;

/// Detect the encoding of raw sidecar bytes.
///
/// Returns the encoding and the length of the byte-order mark to skip.
/// Detection order: BOM, BOM-less UTF-16 (from the NUL byte pattern), valid
/// UTF-8, the label of an XML declaration, and finally a statistical guess.
pub fn detect_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return (encoding, bom_len);
    }

    if let Some(encoding) = sniff_utf16(bytes) {
        return (encoding, 0);
    }

    if std::str::from_utf8(bytes).is_ok() {
        return (UTF_8, 0);
    }

    if let Some(encoding) = declared_encoding(bytes) {
        return (encoding, 0);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    (detector.guess(None, true), 0)
}

/// Transcode raw bytes to UTF-8, failing on malformed input
pub fn decode_to_utf8(bytes: &[u8]) -> Result<(String, &'static Encoding), SidecarError> {
    let (encoding, bom_len) = detect_encoding(bytes);
    debug!("Detected sidecar encoding: {}", encoding.name());

    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .map(|text| (text.into_owned(), encoding))
        .ok_or_else(|| SidecarError::Transcode {
            encoding: encoding.name().to_string(),
        })
}

/// UTF-16 without a BOM, recognised by NULs clustering on one byte parity.
///
/// Mostly-ASCII markup in UTF-16 has a zero high byte in nearly every code
/// unit: odd offsets for little endian, even offsets for big endian.
fn sniff_utf16(bytes: &[u8]) -> Option<&'static Encoding> {
    let window = &bytes[..bytes.len().min(UTF16_SNIFF_WINDOW)];
    let units = window.len() / 2;
    if units == 0 {
        return None;
    }

    let (mut even_nuls, mut odd_nuls) = (0usize, 0usize);
    for (i, _) in window.iter().enumerate().filter(|(_, b)| **b == 0) {
        if i % 2 == 0 {
            even_nuls += 1;
        } else {
            odd_nuls += 1;
        }
    }

    if odd_nuls * 2 > units && even_nuls * 4 < odd_nuls {
        Some(UTF_16LE)
    } else if even_nuls * 2 > units && odd_nuls * 4 < even_nuls {
        Some(UTF_16BE)
    } else {
        None
    }
}

/// Encoding named by `<?xml ... encoding="..."?>`, ignoring labels that
/// resolve to UTF-8 or UTF-16 since those were already ruled out
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    if !bytes.starts_with(b"<?xml") {
        return None;
    }

    let window = &bytes[..bytes.len().min(DECLARATION_WINDOW)];
    let end = find(window, b"?>")?;
    let declaration = &window[..end];

    let after_key = &declaration[find(declaration, b"encoding")? + b"encoding".len()..];
    let after_eq = after_key
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .filter(|&i| after_key[i] == b'=')
        .map(|i| &after_key[i + 1..])?;

    let quote_at = after_eq.iter().position(|b| !b.is_ascii_whitespace())?;
    let quote = after_eq[quote_at];
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = &after_eq[quote_at + 1..];
    let label = &value[..value.iter().position(|&b| b == quote)?];

    Encoding::for_label(label).filter(|encoding| {
        *encoding != UTF_8 && *encoding != UTF_16LE && *encoding != UTF_16BE
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
