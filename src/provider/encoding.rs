use encoding_rs::{Encoding, SHIFT_JIS, UTF_8, UTF_16LE};

use crate::prelude::*;
use wmic_parser::SENTINEL_KEY;

/// Encodings tried, in order, when the output carries no byte-order mark.
///
/// WMIC writes in the console code page when redirected (UTF-8 or cp932 on Japanese systems),
/// and in UTF-16LE when asked for Unicode output.
const CANDIDATE_ENCODINGS: [&Encoding; 3] = [UTF_8, SHIFT_JIS, UTF_16LE];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    /// `false` when no candidate produced plausible output and lossy UTF-8 was used.
    pub plausible: bool,
}

impl DecodedText {
    /// Log how the output of `origin` was decoded and hand back the text.
    pub fn into_logged_text(self, origin: &str) -> String {
        if self.plausible {
            debug!("Decoded {origin} as {}", self.encoding.name());
        } else {
            warn!(
                "Could not detect the encoding of {origin}, undecodable bytes were replaced while reading it as {}",
                self.encoding.name()
            );
        }
        self.text
    }
}

/// Decode raw utility output into text.
///
/// A byte-order mark wins. Otherwise the first candidate encoding that decodes without
/// errors into text containing a `ProcessId=` line is used.
pub fn decode_output(bytes: &[u8]) -> DecodedText {
    if let Some((encoding, bom_length)) = Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_length..]);
        trace!("Found a {} byte-order mark", encoding.name());
        return DecodedText {
            text: text.into_owned(),
            encoding,
            plausible: !had_errors,
        };
    }

    let marker = format!("{SENTINEL_KEY}=");
    for encoding in CANDIDATE_ENCODINGS {
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            trace!("Output is not valid {}", encoding.name());
            continue;
        }
        if !text.contains(&marker) {
            trace!("Output decoded as {} has no {marker} line", encoding.name());
            continue;
        }
        return DecodedText {
            text: text.into_owned(),
            encoding,
            plausible: true,
        };
    }

    trace!("No candidate encoding matched, falling back to lossy UTF-8");
    DecodedText {
        text: String::from_utf8_lossy(bytes).into_owned(),
        encoding: UTF_8,
        plausible: false,
    }
}
