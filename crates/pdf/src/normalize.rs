use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(char, &str); 7] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// Normalise a decoded text run before it reaches the merger.
///
/// NFC composition, ligature expansion, non-breaking spaces turned into plain
/// spaces, and removal of replacement characters and C0 controls. Leading and
/// trailing whitespace is kept; it marks word boundaries between runs.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.nfc() {
        match ch {
            '\u{FFFD}' => {}
            '\u{00A0}' | '\u{202F}' => out.push(' '),
            c if c.is_control() && c != '\t' => {}
            c => match LIGATURES.iter().find(|(lig, _)| *lig == c) {
                Some((_, expanded)) => out.push_str(expanded),
                None => out.push(c),
            },
        }
    }
    out
}
