//! Case and diacritic folding for pattern matching.
//!
//! Matching is case- and diacritic-insensitive: `PÉNALTY` and `penalty`
//! hit the same phrase. Folding maps text to lowercase ASCII where a Latin
//! base letter exists and keeps a byte-offset map back into the source so
//! matches can be reported against the original text.

/// A folded copy of a source string with per-byte source offsets.
#[derive(Debug, Clone)]
pub struct Folded {
    text: String,
    /// For each byte of `text`, the byte offset of the source character
    /// that produced it.
    starts: Vec<usize>,
    src_len: usize,
}

impl Folded {
    pub fn fold(src: &str) -> Self {
        let mut text = String::with_capacity(src.len());
        let mut starts = Vec::with_capacity(src.len());

        for (i, ch) in src.char_indices() {
            let before = text.len();
            for lower in ch.to_lowercase() {
                fold_char_into(lower, &mut text);
            }
            for _ in before..text.len() {
                starts.push(i);
            }
        }

        Self {
            text,
            starts,
            src_len: src.len(),
        }
    }

    /// Fold a phrase for lookups; offset tracking is not needed.
    pub fn phrase(src: &str) -> String {
        Self::fold(src).text
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Map a folded byte range back to the source byte range.
    pub fn source_range(&self, start: usize, end: usize) -> (usize, usize) {
        let s = self.starts[start];
        let e = if end < self.starts.len() {
            self.starts[end]
        } else {
            self.src_len
        };
        (s, e)
    }
}

/// Append the folded form of one lowercase character.
///
/// Latin letters with diacritics fold to their base letter; ligatures
/// expand; anything else passes through unchanged.
fn fold_char_into(ch: char, out: &mut String) {
    match ch {
        'à'..='å' | 'ā' | 'ă' | 'ą' => out.push('a'),
        'ç' | 'ć' | 'č' => out.push('c'),
        'è'..='ë' | 'ē' | 'ė' | 'ę' => out.push('e'),
        'ì'..='ï' | 'ī' | 'į' => out.push('i'),
        'ñ' | 'ń' => out.push('n'),
        'ò'..='ö' | 'ø' | 'ō' => out.push('o'),
        'ù'..='ü' | 'ū' | 'ů' => out.push('u'),
        'ý' | 'ÿ' => out.push('y'),
        'š' | 'ś' => out.push('s'),
        'ž' | 'ź' | 'ż' => out.push('z'),
        'æ' => out.push_str("ae"),
        'œ' => out.push_str("oe"),
        'ß' => out.push_str("ss"),
        _ => out.push(ch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_ascii() {
        assert_eq!(Folded::phrase("PENALTY Clause"), "penalty clause");
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(Folded::phrase("pénalité"), "penalite");
        assert_eq!(Folded::phrase("PÉNALTY"), "penalty");
        assert_eq!(Folded::phrase("naïve señor"), "naive senor");
    }

    #[test]
    fn expands_ligatures() {
        assert_eq!(Folded::phrase("vitæ"), "vitae");
        assert_eq!(Folded::phrase("straße"), "strasse");
    }

    #[test]
    fn source_range_round_trips_ascii() {
        let folded = Folded::fold("The PENALTY applies");
        let pos = folded.text().find("penalty").unwrap();
        let (s, e) = folded.source_range(pos, pos + "penalty".len());
        assert_eq!(&"The PENALTY applies"[s..e], "PENALTY");
    }

    #[test]
    fn source_range_spans_multibyte_input() {
        let src = "une PÉNALITÉ due";
        let folded = Folded::fold(src);
        let pos = folded.text().find("penalite").unwrap();
        let (s, e) = folded.source_range(pos, pos + "penalite".len());
        assert_eq!(&src[s..e], "PÉNALITÉ");
    }
}
