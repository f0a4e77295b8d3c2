//! Text recognition seam.
//!
//! Image acquisition and recognition live outside this crate. A recognizer
//! hands back one best-effort transcript plus the raw blocks it was built
//! from; parsing only ever reads `full_text`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VouchError};

/// Output of a text recognizer for one receipt image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrText {
    /// Full transcript, blocks joined with newlines.
    pub full_text: String,

    /// Recognized text blocks in reading order.
    #[serde(default)]
    pub blocks: Vec<String>,
}

impl OcrText {
    /// Build from blocks, joining them into the full transcript.
    pub fn from_blocks(blocks: Vec<String>) -> Self {
        Self {
            full_text: blocks.join("\n"),
            blocks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty()
    }
}

/// Anything that turns receipt bytes into text.
pub trait TextRecognizer {
    /// Recognize the text in one receipt.
    fn recognize(&self, input: &[u8]) -> Result<OcrText>;
}

/// Recognizer for receipts that were already transcribed.
///
/// The input must be UTF-8; every non-blank line becomes a block.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRecognizer;

impl TextRecognizer for PlainTextRecognizer {
    fn recognize(&self, input: &[u8]) -> Result<OcrText> {
        let text = std::str::from_utf8(input)
            .map_err(|e| VouchError::Ocr(format!("transcript is not valid UTF-8: {}", e)))?;

        let blocks = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Ok(OcrText::from_blocks(blocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_blocks() {
        let ocr = PlainTextRecognizer.recognize(b"BBVA\n\n  Monto transferido  \r\nS/ 10.00\n").unwrap();
        assert_eq!(ocr.blocks, vec!["BBVA", "Monto transferido", "S/ 10.00"]);
        assert_eq!(ocr.full_text, "BBVA\nMonto transferido\nS/ 10.00");
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = PlainTextRecognizer.recognize(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, VouchError::Ocr(_)));
    }

    #[test]
    fn test_empty_transcript() {
        assert!(PlainTextRecognizer.recognize(b"  \n").unwrap().is_empty());
    }
}
