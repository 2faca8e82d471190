//! Decoder for the obfuscated download sections served by snapsave-style sites
//!
//! The response body of snapsave.app and snaptik.app is a script of the form
//! `eval(function(h,u,n,t,e,r){...return decodeURIComponent(escape(r))}(h,u,n,t,e,r))`.
//! The argument list carries a ciphertext whose separator-delimited groups are
//! numbers written in radix `e` with a substituted digit alphabet `n`, each
//! shifted by `t`. Decoding yields a script that assigns the real download
//! HTML to an element's `innerHTML`; the last step slices that HTML out.

use crate::error::SnapError;
use tracing::debug;

/// Digit symbols shared by every radix window, in significance order
const CANONICAL_ALPHABET: &[u8; 64] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+/";

/// Text right before the packed argument list
const PAYLOAD_MARKER: &str = "decodeURIComponent(escape(r))}(";

/// End of the packed argument list
const PAYLOAD_END: &str = "))";

/// Radix of the intermediate rendering of each group
const OUTPUT_RADIX: u32 = 10;

/// Statement that follows the `innerHTML` string literal on both sites
const FRAGMENT_TERMINATOR: &str = "\"; document.getElementById(\"inputData\").remove(); ";

/// Number of positional arguments in the packed call
const PAYLOAD_ARITY: usize = 6;

/// Parsed `(h, u, n, t, e, r)` argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    ciphertext: String,
    unused: String,
    alphabet: Vec<char>,
    offset: i64,
    radix: u32,
    variable: String,
}

impl EncodedPayload {
    /// Build a payload from its meaningful fields.
    ///
    /// `alphabet[radix]` must exist: it is the group separator.
    pub fn new(
        ciphertext: impl Into<String>,
        alphabet: &str,
        offset: i64,
        radix: u32,
    ) -> Result<Self, SnapError> {
        let alphabet: Vec<char> = alphabet.chars().collect();
        alphabet_window(radix)?;
        if alphabet.len() <= radix as usize {
            return Err(SnapError::DecodeError(format!(
                "separator index {} outside alphabet of {} symbols",
                radix,
                alphabet.len()
            )));
        }

        Ok(Self {
            ciphertext: ciphertext.into(),
            unused: String::new(),
            alphabet,
            offset,
            radix,
            variable: String::new(),
        })
    }

    /// Build a payload from the positional tokens of the packed call
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, SnapError> {
        if tokens.len() < PAYLOAD_ARITY {
            return Err(SnapError::DecodeError(format!(
                "expected {} payload tokens, found {}",
                PAYLOAD_ARITY,
                tokens.len()
            )));
        }

        let offset_token = tokens[3].as_ref();
        let offset = offset_token.parse::<i64>().map_err(|_| {
            SnapError::DecodeError(format!("offset is not numeric: {:?}", offset_token))
        })?;

        let radix_token = tokens[4].as_ref();
        let radix = radix_token.parse::<u32>().map_err(|_| {
            SnapError::DecodeError(format!("radix is not numeric: {:?}", radix_token))
        })?;

        let mut payload = Self::new(tokens[0].as_ref(), tokens[2].as_ref(), offset, radix)?;
        payload.unused = tokens[1].as_ref().to_string();
        payload.variable = tokens[5].as_ref().to_string();
        Ok(payload)
    }

    /// Locate and parse the payload inside a raw response body
    pub fn from_page(page: &str) -> Result<Self, SnapError> {
        Self::from_tokens(&extract_tokens(page)?)
    }

    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn radix(&self) -> u32 {
        self.radix
    }

    /// Name of the JS variable the script assigns to
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Character that closes every digit group
    pub fn separator(&self) -> char {
        self.alphabet[self.radix as usize]
    }
}

/// Outcome of the UTF-8 repair step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Utf8Repair {
    /// Character codes formed valid UTF-8 and were re-decoded
    Repaired(String),
    /// Text kept as decoded
    Original(String),
}

impl Utf8Repair {
    pub fn is_repaired(&self) -> bool {
        matches!(self, Utf8Repair::Repaired(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Utf8Repair::Repaired(text) | Utf8Repair::Original(text) => text,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Utf8Repair::Repaired(text) | Utf8Repair::Original(text) => text,
        }
    }
}

/// Site-specific `innerHTML` assignment that holds the download HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentMarker {
    /// snapsave.app
    DownloadSection,
    /// snaptik.app
    Download,
}

impl FragmentMarker {
    /// Source text up to and including the opening quote of the literal
    pub fn assignment(&self) -> &'static str {
        match self {
            FragmentMarker::DownloadSection => {
                "getElementById(\"download-section\").innerHTML = \""
            }
            FragmentMarker::Download => "$(\"#download\").innerHTML = \"",
        }
    }
}

/// Pull the packed argument list out of a page.
///
/// Tokens are returned in call order with surrounding quotes and whitespace
/// removed.
pub fn extract_tokens(page: &str) -> Result<Vec<String>, SnapError> {
    let start = page
        .find(PAYLOAD_MARKER)
        .ok_or_else(|| SnapError::ExtractionError("obfuscated payload not found".to_string()))?
        + PAYLOAD_MARKER.len();

    let rest = &page[start..];
    let args = match rest.find(PAYLOAD_END) {
        Some(end) => &rest[..end],
        None => rest,
    };

    Ok(args
        .split(',')
        .map(|token| {
            token
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .trim()
                .to_string()
        })
        .collect())
}

/// Split the ciphertext into digit groups.
///
/// Data after the last separator never forms a group.
pub fn split_groups(ciphertext: &str, separator: char) -> Vec<&str> {
    let mut groups: Vec<&str> = ciphertext.split(separator).collect();
    groups.pop();
    groups
}

/// Replace every alphabet symbol in a group with its decimal index, symbol by
/// symbol in ascending index order.
pub fn substitute_symbols(group: &str, alphabet: &[char]) -> String {
    let mut digits = group.to_string();
    for (index, symbol) in alphabet.iter().enumerate() {
        if digits.contains(*symbol) {
            digits = digits.replace(*symbol, &index.to_string());
        }
    }
    digits
}

/// Reinterpret `digits` written in radix `from` and render it in radix `to`.
///
/// Characters outside the `from` window contribute nothing. An empty result
/// renders as `"0"`.
pub fn convert_radix(digits: &str, from: u32, to: u32) -> Result<String, SnapError> {
    let source = alphabet_window(from)?;
    let target = alphabet_window(to)?;

    let mut value: u64 = 0;
    for (position, ch) in digits.chars().rev().enumerate() {
        let index = match source.iter().position(|&symbol| symbol as char == ch) {
            Some(index) => index as u64,
            None => continue,
        };
        if index == 0 {
            continue;
        }

        let term = u32::try_from(position)
            .ok()
            .and_then(|position| u64::from(from).checked_pow(position))
            .and_then(|weight| weight.checked_mul(index));
        value = term
            .and_then(|term| value.checked_add(term))
            .ok_or_else(|| {
                SnapError::DecodeError(format!("digit group {:?} overflows", digits))
            })?;
    }

    let mut rendered = Vec::new();
    while value > 0 {
        rendered.push(target[(value % u64::from(to)) as usize] as char);
        value /= u64::from(to);
    }

    if rendered.is_empty() {
        return Ok("0".to_string());
    }
    Ok(rendered.into_iter().rev().collect())
}

/// Decode the ciphertext into raw text, one character per digit group
pub fn decode_raw(payload: &EncodedPayload) -> Result<String, SnapError> {
    split_groups(payload.ciphertext(), payload.separator())
        .into_iter()
        .map(|group| decode_group(group, payload))
        .collect()
}

/// Decode the ciphertext and repair its UTF-8
pub fn decode_payload(payload: &EncodedPayload) -> Result<Utf8Repair, SnapError> {
    Ok(repair_utf8(decode_raw(payload)?))
}

/// Reinterpret character codes as bytes and decode them as UTF-8.
///
/// Falls back to the input when a code does not fit a byte or the bytes are
/// not valid UTF-8.
pub fn repair_utf8(raw: String) -> Utf8Repair {
    let bytes: Option<Vec<u8>> = raw
        .chars()
        .map(|ch| u8::try_from(u32::from(ch)).ok())
        .collect();

    match bytes.map(String::from_utf8) {
        Some(Ok(text)) => Utf8Repair::Repaired(text),
        _ => {
            debug!("Decoded payload is not a UTF-8 byte string, keeping it as decoded");
            Utf8Repair::Original(raw)
        }
    }
}

/// Slice the download HTML out of the decoded script and undo its escaping
pub fn extract_fragment(decoded: &str, marker: FragmentMarker) -> Result<String, SnapError> {
    let assignment = marker.assignment();
    let start = decoded.find(assignment).ok_or_else(|| {
        SnapError::ExtractionError(format!("download section not found ({:?})", marker))
    })? + assignment.len();

    let rest = &decoded[start..];
    let end = rest.find(FRAGMENT_TERMINATOR).ok_or_else(|| {
        SnapError::ExtractionError(format!("download section not terminated ({:?})", marker))
    })?;

    // single and doubled escapes both vanish
    Ok(rest[..end].replace('\\', ""))
}

/// Run the whole pipeline on a response body
pub fn decode_page(page: &str, marker: FragmentMarker) -> Result<String, SnapError> {
    let payload = EncodedPayload::from_page(page)?;
    debug!(
        "Decoding payload: radix={}, offset={}, {} ciphertext bytes",
        payload.radix(),
        payload.offset(),
        payload.ciphertext().len()
    );

    let text = decode_payload(&payload)?;
    extract_fragment(text.as_str(), marker)
}

/// Decode a snapsave.app `action.php` response into its download HTML
pub fn decrypt_snapsave(page: &str) -> Result<String, SnapError> {
    decode_page(page, FragmentMarker::DownloadSection)
}

/// Decode a snaptik.app `abc2.php` response into its download HTML
pub fn decrypt_snaptik(page: &str) -> Result<String, SnapError> {
    decode_page(page, FragmentMarker::Download)
}

fn decode_group(group: &str, payload: &EncodedPayload) -> Result<char, SnapError> {
    let digits = substitute_symbols(group, payload.alphabet());
    let decimal = convert_radix(&digits, payload.radix(), OUTPUT_RADIX)?;
    let value = decimal
        .parse::<i64>()
        .map_err(|_| SnapError::DecodeError(format!("group value {} out of range", decimal)))?;

    value
        .checked_sub(payload.offset())
        .and_then(|code| u32::try_from(code).ok())
        .and_then(char::from_u32)
        .ok_or_else(|| {
            SnapError::DecodeError(format!(
                "group {:?} yields invalid character code {} - {}",
                group,
                value,
                payload.offset()
            ))
        })
}

fn alphabet_window(radix: u32) -> Result<&'static [u8], SnapError> {
    if !(2..=CANONICAL_ALPHABET.len() as u32).contains(&radix) {
        return Err(SnapError::DecodeError(format!(
            "radix {} outside 2..=64",
            radix
        )));
    }
    Ok(&CANONICAL_ALPHABET[..radix as usize])
}
