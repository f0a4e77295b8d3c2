//! WASM bindings for bank transfer receipt parsing.
//!
//! Parsing is pure, so the whole receipt engine runs in browsers and Node.js.
//! Storage stays on the host side.

use std::sync::Arc;

use wasm_bindgen::prelude::*;

use vouch_core::models::receipt::ParseOutput;
use vouch_core::receipt::rules;
use vouch_core::{OcrText, ReceiptParser, RuleTable};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn embedded_parser() -> Result<ReceiptParser, JsValue> {
    ReceiptParser::with_embedded_rules().map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Parse a receipt transcript with the embedded rule table.
///
/// Returns the parse output: one `{ value, confidence }` pair per field plus
/// origin-account extras.
#[wasm_bindgen]
pub fn parse_receipt(text: &str) -> Result<JsValue, JsValue> {
    to_js(&embedded_parser()?.parse(text))
}

/// Normalize a raw amount (e.g. `"S/ 1,250.5"`) to `CUR NNN.NN`.
#[wasm_bindgen]
pub fn normalize_amount(raw: &str) -> Option<String> {
    rules::normalize_amount(raw)
}

/// Normalize a raw date to `YYYY-MM-DD`.
#[wasm_bindgen]
pub fn normalize_date(raw: &str) -> Option<String> {
    rules::normalize_date(raw)
}

/// Normalize a raw time to 24-hour `HH:MM`.
#[wasm_bindgen]
pub fn normalize_time(raw: &str) -> Option<String> {
    rules::normalize_time(raw)
}

/// Display name of the issuer detected in the text, if any.
#[wasm_bindgen]
pub fn detect_bank(text: &str) -> Option<String> {
    rules::detect_bank(&rules::normalize_text(text)).map(|bank| bank.name().to_string())
}

/// Receipt extractor class for browser use.
///
/// Holds a compiled rule table so repeated parses skip pattern compilation.
#[wasm_bindgen]
pub struct ReceiptExtractor {
    parser: ReceiptParser,
}

#[wasm_bindgen]
impl ReceiptExtractor {
    /// Create an extractor over the embedded rule table.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<ReceiptExtractor, JsValue> {
        Ok(Self {
            parser: embedded_parser()?,
        })
    }

    /// Create an extractor over a rule table given as JSON.
    #[wasm_bindgen]
    pub fn with_rules(json: &str) -> Result<ReceiptExtractor, JsValue> {
        let table = RuleTable::from_json(json).map_err(|e| {
            let message = JsValue::from_str(&e.to_string());
            web_sys::console::error_1(&message);
            message
        })?;
        Ok(Self {
            parser: ReceiptParser::new(Arc::new(table)),
        })
    }

    /// Extract fields from a transcript.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.parse(text))
    }

    /// Extract fields and return the pre-filled form submission.
    #[wasm_bindgen]
    pub fn extract_form(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.parse(text).to_form())
    }

    /// Extract fields from browser-side OCR blocks.
    #[wasm_bindgen]
    pub fn extract_ocr(&self, ocr: &OcrTextJs) -> Result<JsValue, JsValue> {
        to_js(&self.parser.parse_ocr(&ocr.to_ocr_text()))
    }

    /// Schema field names left empty by a parse of this transcript.
    #[wasm_bindgen]
    pub fn missing_fields(&self, text: &str) -> js_sys::Array {
        missing(&self.parser.parse(text))
    }
}

fn missing(output: &ParseOutput) -> js_sys::Array {
    output
        .missing_fields()
        .into_iter()
        .map(JsValue::from_str)
        .collect()
}

/// OCR result assembled by browser-side text recognition.
#[wasm_bindgen]
#[derive(Default)]
pub struct OcrTextJs {
    blocks: Vec<String>,
    text: String,
}

#[wasm_bindgen]
impl OcrTextJs {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recognized text block.
    #[wasm_bindgen]
    pub fn add_block(&mut self, text: &str) {
        self.blocks.push(text.to_string());
    }

    /// Set the full text.
    #[wasm_bindgen]
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    /// Get the full text, joining the blocks when none was set.
    #[wasm_bindgen]
    pub fn get_text(&self) -> String {
        self.to_ocr_text().full_text
    }
}

impl OcrTextJs {
    fn to_ocr_text(&self) -> OcrText {
        if self.text.is_empty() {
            OcrText::from_blocks(self.blocks.clone())
        } else {
            OcrText {
                full_text: self.text.clone(),
                blocks: self.blocks.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_normalizers() {
        assert_eq!(normalize_amount("S/ 1,250.5").as_deref(), Some("PEN 1250.50"));
        assert_eq!(normalize_date("17/06/2023").as_deref(), Some("2023-06-17"));
        assert_eq!(normalize_time("7:22 p.m.").as_deref(), Some("19:22"));
    }

    #[wasm_bindgen_test]
    fn test_detect_bank() {
        assert_eq!(detect_bank("Constancia de transferencia").as_deref(), Some("BBVA"));
        assert_eq!(detect_bank("Banco de Crédito del Perú").as_deref(), Some("BCP"));
        assert_eq!(detect_bank("Pagaste a Ana"), None);
    }

    #[wasm_bindgen_test]
    fn test_ocr_blocks_join() {
        let mut ocr = OcrTextJs::new();
        ocr.add_block("BCP");
        ocr.add_block("Fecha 17/06/2023");
        assert_eq!(ocr.get_text(), "BCP\nFecha 17/06/2023");
    }

    #[wasm_bindgen_test]
    fn test_missing_fields() {
        let extractor = ReceiptExtractor::new().unwrap();
        let missing: Vec<String> = extractor
            .missing_fields("BCP\nFecha 17/06/2023")
            .iter()
            .filter_map(|v| v.as_string())
            .collect();
        assert!(missing.contains(&"importe".to_string()));
        assert!(!missing.contains(&"fecha".to_string()));
    }
}
