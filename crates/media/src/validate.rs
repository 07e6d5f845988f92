//! Content Validation Pipeline.
//!
//! Pure checks applied to a fetched buffer, in order, stopping at the first
//! failure: byte length, leading signature, declared width/height (two
//! little-endian `u16`s right after the signature).

use serde::Serialize;

/// Largest payload the display accepts.
pub const DEFAULT_MAX_BYTES: usize = 40 * 1024;
pub const DEFAULT_WIDTH: u16 = 32;
pub const DEFAULT_HEIGHT: u16 = 16;

pub const GIF87A: &[u8] = b"GIF87a";
pub const GIF89A: &[u8] = b"GIF89a";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("content too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("invalid content header")]
    BadSignature,

    #[error(
        "invalid content dimensions: {width}x{height} (expected {expected_width}x{expected_height})"
    )]
    BadDimensions {
        width: u16,
        height: u16,
        expected_width: u16,
        expected_height: u16,
    },
}

/// Limits a buffer must satisfy.
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub max_bytes: usize,
    pub signatures: Vec<&'static [u8]>,
    pub width: u16,
    pub height: u16,
    pub mime: &'static str,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            signatures: vec![GIF87A, GIF89A],
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            mime: "image/gif",
        }
    }
}

impl ValidationRules {
    #[must_use]
    pub fn with_limits(mut self, max_bytes: usize, width: u16, height: u16) -> Self {
        self.max_bytes = max_bytes;
        self.width = width;
        self.height = height;
        self
    }
}

/// A buffer that passed every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedContent {
    pub size: usize,
    pub width: u16,
    pub height: u16,
    pub mime: String,
}

pub fn validate(buf: &[u8], rules: &ValidationRules) -> Result<ValidatedContent, ValidationError> {
    if buf.len() > rules.max_bytes {
        return Err(ValidationError::TooLarge {
            size: buf.len(),
            max: rules.max_bytes,
        });
    }

    let sig_len = rules
        .signatures
        .iter()
        .find(|sig| buf.starts_with(sig))
        .map(|sig| sig.len())
        .ok_or(ValidationError::BadSignature)?;

    // Too short to carry the dimension fields.
    let dims = buf
        .get(sig_len..sig_len + 4)
        .ok_or(ValidationError::BadSignature)?;
    let width = u16::from_le_bytes([dims[0], dims[1]]);
    let height = u16::from_le_bytes([dims[2], dims[3]]);

    if width != rules.width || height != rules.height {
        return Err(ValidationError::BadDimensions {
            width,
            height,
            expected_width: rules.width,
            expected_height: rules.height,
        });
    }

    Ok(ValidatedContent {
        size: buf.len(),
        width,
        height,
        mime: rules.mime.to_string(),
    })
}

/// Build a signature-prefixed buffer of `len` bytes declaring `width`x`height`.
#[cfg(test)]
pub(crate) fn sample(sig: &[u8], width: u16, height: u16, len: usize) -> Vec<u8> {
    let mut buf = sig.to_vec();
    buf.extend_from_slice(&width.to_le_bytes());
    buf.extend_from_slice(&height.to_le_bytes());
    buf.resize(len.max(buf.len()), 0);
    buf
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case::exact_limit(sample(GIF89A, 32, 16, 40 * 1024), None)]
    #[case::gif87a(sample(GIF87A, 32, 16, 512), None)]
    #[case::one_kib_over(sample(GIF89A, 32, 16, 41 * 1024), Some(ValidationError::TooLarge { size: 41 * 1024, max: 40 * 1024 }))]
    #[case::one_byte_over(sample(GIF89A, 32, 16, 40 * 1024 + 1), Some(ValidationError::TooLarge { size: 40 * 1024 + 1, max: 40 * 1024 }))]
    #[case::png(sample(b"\x89PNG\r\n", 32, 16, 64), Some(ValidationError::BadSignature))]
    #[case::truncated(b"GIF89a\x20\x00".to_vec(), Some(ValidationError::BadSignature))]
    #[case::empty(Vec::new(), Some(ValidationError::BadSignature))]
    #[case::double_size(sample(GIF89A, 64, 32, 1024), Some(ValidationError::BadDimensions { width: 64, height: 32, expected_width: 32, expected_height: 16 }))]
    #[case::swapped(sample(GIF89A, 16, 32, 1024), Some(ValidationError::BadDimensions { width: 16, height: 32, expected_width: 32, expected_height: 16 }))]
    fn pipeline(#[case] buf: Vec<u8>, #[case] expected: Option<ValidationError>) {
        let result = validate(&buf, &ValidationRules::default());
        match expected {
            None => {
                let ok = result.unwrap();
                assert_eq!((ok.width, ok.height), (32, 16));
                assert_eq!(ok.size, buf.len());
                assert_eq!(ok.mime, "image/gif");
            },
            Some(err) => assert_eq!(result.unwrap_err(), err),
        }
    }

    #[test]
    fn size_is_checked_before_signature() {
        let buf = vec![0u8; 50 * 1024];
        assert!(matches!(
            validate(&buf, &ValidationRules::default()),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn custom_limits() {
        let rules = ValidationRules::default().with_limits(2048, 64, 32);
        let ok = validate(&sample(GIF89A, 64, 32, 2048), &rules).unwrap();
        assert_eq!(ok.width, 64);
    }
}
