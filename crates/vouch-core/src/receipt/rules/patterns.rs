//! Fixed regex patterns shared by the hand-tuned extractor and the heuristics.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE_RUN_INNER: Regex = Regex::new(r"\s+").unwrap();

    // Spanish long-form date: "Sábado, 17 Junio 2023"
    pub static ref DATE_WEEKDAY_LONG: Regex = Regex::new(
        r"(?i)(?:lunes|martes|mi[ée]rcoles|jueves|viernes|s[áa]bado|domingo),?\s*(\d{1,2})\s+(?:de\s+)?(enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|setiembre|octubre|noviembre|diciembre)\s+(?:de\s+|del\s+)?(\d{4})"
    ).unwrap();

    // "17 junio 2023" / "17 de junio de 2023", accent-stripped lowercase input
    pub static ref DATE_DAY_MONTH_YEAR: Regex = Regex::new(
        r"(\d{1,2})\s+(?:de\s+)?([a-z]+)\s+(?:de\s+|del\s+)?(\d{4})"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap();

    pub static ref DATE_DMY: Regex = Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap();

    // 12-hour clock: "07:22 p.m.", "7:22pm", "12:05 a. m."
    pub static ref TIME_12H: Regex = Regex::new(
        r"(?i)(\d{1,2}):(\d{2})\s*([ap])\.?\s?m\.?"
    ).unwrap();

    // Matched against lowercase input with spaces and periods removed
    pub static ref TIME_COMPACT: Regex = Regex::new(r"(\d{1,2}):(\d{2})(am|pm)?").unwrap();

    pub static ref OPERATION_NUMBER: Regex = Regex::new(
        r"(?i)n[úu]mero\s+de\s+operaci[óo]n\s*:?\s*(\d{6,12})"
    ).unwrap();

    // "Cuenta de destino: **** 7042 Ramirez Guerrero W."
    pub static ref DESTINATION_LABELED: Regex = Regex::new(
        r"(?i)cuenta\s+de\s+destino\s*:?\s*\*{2,}\s*(\d{4})\s*([A-Za-zÁÉÍÓÚÜÑáéíóúüñ\s.'&-]{3,})"
    ).unwrap();

    // "Cuenta de origen: **** 0035 Comercial Andina S.A.C."
    pub static ref ORIGIN_LABELED: Regex = Regex::new(
        r"(?i)cuenta\s+de\s+origen\s*:?\s*\*{2,}\s*(\d{4})\s*([A-Za-zÁÉÍÓÚÜÑáéíóúüñ\s.'&-]{3,})"
    ).unwrap();

    // Any masked account followed by a holder name
    pub static ref MASKED_BLOCK: Regex = Regex::new(
        r"\*{2,}\s*(\d{4})\s*([A-Za-zÁÉÍÓÚÜÑáéíóúüñ][A-Za-zÁÉÍÓÚÜÑáéíóúüñ\s.'&-]{2,})"
    ).unwrap();

    // Any masked account number, name or not
    pub static ref MASKED_NUMBER: Regex = Regex::new(r"[*•]{2,}\s*(\d{4})").unwrap();

    // "S/ 921.88", "Monto transferido: S/ 1,234.50"
    pub static ref AMOUNT_SOLES: Regex = Regex::new(
        r"(?i)(?:monto\s+transferido\s*:?\s*)?S\s?/\.?\s*(\d+(?:[.,\s]\d{3})*(?:[.,]\d{1,2})?)"
    ).unwrap();

    pub static ref CURRENCY_SOLES: Regex = Regex::new(r"(?i)\bS\s?/\.?").unwrap();

    pub static ref CURRENCY_DOLLARS: Regex = Regex::new(r"(?i)\bUS\s?\$|\$").unwrap();

    pub static ref AMOUNT_CANONICAL_LOOSE: Regex = Regex::new(
        r"(?i)\b(PEN|USD|EUR)\s?(\d+)(?:\.(\d{1,2}))?"
    ).unwrap();

    // Anchors for the masked-number heuristic
    pub static ref DESTINATION_ANCHOR: Regex = Regex::new(
        r"(?i)cuenta\s+(?:de\s+)?destino|destino|beneficiario|abonad[oa]\s+a|enviado\s+a"
    ).unwrap();

    pub static ref ORIGIN_ANCHOR: Regex = Regex::new(
        r"(?i)cuenta\s+(?:de\s+)?origen|origen|cargad[oa]\s+a|ordenante|desde"
    ).unwrap();

    // Receipt labels that end a greedy holder-name run
    pub static ref RECEIPT_LABEL: Regex = Regex::new(
        r"(?i)\b(?:cuenta|n[úu]mero|monto|fecha|hora|importe|operaci[óo]n|c[óo]digo|banco|titular|destino|origen|pen|usd)\b"
    ).unwrap();

    // Lone "S" / "US" at the end of a name run, the start of "S/" or "US$"
    pub static ref CURRENCY_TAIL: Regex = Regex::new(r"(?i)(?:^|\s)(?:S|US)\s*$").unwrap();
}

/// Collapse every run of whitespace into one space.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN_INNER.replace_all(s, " ").into_owned()
}
