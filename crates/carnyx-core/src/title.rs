use deunicode::deunicode_char;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Reduce a remote title to plain ASCII so it can serve as a stable file
/// name on filesystems with differing Unicode normalization.
///
/// Latin letters lose their diacritics; other scripts are romanized.
pub fn transliterate(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.nfkd() {
        if c.is_ascii() {
            out.push(c);
        } else if is_combining_mark(c) {
            continue;
        } else if let Some(replacement) = fold(c) {
            out.push_str(replacement);
        } else if c.is_whitespace() {
            out.push(' ');
        } else if let Some(romanized) = deunicode_char(c) {
            // CJK syllables come back as separate words
            out.push_str(romanized);
        }
    }
    collapse_whitespace(&out)
}

fn fold(c: char) -> Option<&'static str> {
    let folded = match c {
        'ß' => "ss",
        'ẞ' => "SS",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        'ł' => "l",
        'Ł' => "L",
        'đ' => "d",
        'Đ' => "D",
        'ð' => "d",
        'Ð' => "D",
        'þ' => "th",
        'Þ' => "Th",
        'ı' => "i",
        '‘' | '’' | '‚' | '′' => "'",
        '“' | '”' | '„' | '″' | '«' | '»' => "\"",
        '‐' | '‑' | '‒' | '–' | '—' | '―' | '−' => "-",
        '…' => "...",
        '•' | '·' => "-",
        '×' => "x",
        '¡' => "!",
        '¿' => "?",
        _ => return None,
    };
    Some(folded)
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics() {
        assert_eq!(transliterate("Beyoncé"), "Beyonce");
        assert_eq!(transliterate("Sigur Rós – Hoppípolla"), "Sigur Ros - Hoppipolla");
        assert_eq!(transliterate("Motörhead"), "Motorhead");
    }

    #[test]
    fn folds_letters_without_decomposition() {
        assert_eq!(transliterate("Straße"), "Strasse");
        assert_eq!(transliterate("Ørjan Nilsen"), "Orjan Nilsen");
        assert_eq!(transliterate("Łódź"), "Lodz");
    }

    #[test]
    fn normalizes_presentation_characters() {
        assert_eq!(transliterate("“Quoted” …"), "\"Quoted\" ...");
        assert_eq!(transliterate("ﬁre"), "fire");
        assert_eq!(transliterate("Ｆｕｌｌｗｉｄｔｈ"), "Fullwidth");
    }

    #[test]
    fn trims_and_collapses_whitespace() {
        assert_eq!(transliterate("  Song\u{00a0}\u{00a0}A \n"), "Song A");
    }

    #[test]
    fn romanizes_cyrillic() {
        assert_eq!(transliterate("Кино - Группа крови"), "Kino - Gruppa krovi");
        assert_eq!(transliterate("Звезда"), "Zvezda");
    }

    #[test]
    fn romanizes_greek() {
        assert_eq!(transliterate("Ελλάδα"), "Ellada");
    }

    #[test]
    fn romanizes_cjk_to_non_empty_ascii() {
        for title in ["夜に駆ける", "音楽", "안녕"] {
            let out = transliterate(title);
            assert!(!out.trim().is_empty(), "{title:?} -> {out:?}");
            assert!(out.is_ascii(), "{title:?} -> {out:?}");
        }
        assert_ne!(transliterate("夜に駆ける"), transliterate("音楽"));
    }

    #[test]
    fn output_is_always_ascii() {
        for title in ["Song 🎵", "مرحبا", "Ölüm – Ψ"] {
            assert!(transliterate(title).is_ascii());
        }
    }

    #[test]
    fn plain_ascii_is_unchanged() {
        assert_eq!(transliterate("Song A (Live)"), "Song A (Live)");
    }
}
