//! Text and attribute normalisation shared by the search filters.

use rust_decimal::Decimal;

/// Fold locale-specific letters to their base Latin form, lower-case, trim and collapse
/// internal whitespace.
///
/// Turkish letters (`ç ğ ı İ ö ş ü`) and the common Latin accents are folded, `ß` becomes
/// `ss`, and combining marks from decomposed input are dropped.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            'ß' | 'ẞ' => folded.push_str("ss"),
            '\u{0300}'..='\u{036f}' => {}
            other => folded.extend(fold_char(other).to_lowercase()),
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_char(c: char) -> char {
    match c {
        'â' | 'Â' | 'á' | 'Á' | 'à' | 'À' | 'ä' | 'Ä' | 'ã' | 'Ã' | 'å' | 'Å' => 'a',
        'ç' | 'Ç' | 'ć' | 'Ć' | 'č' | 'Č' => 'c',
        'é' | 'É' | 'è' | 'È' | 'ê' | 'Ê' | 'ë' | 'Ë' => 'e',
        'ğ' | 'Ğ' => 'g',
        'ı' | 'İ' | 'î' | 'Î' | 'í' | 'Í' | 'ì' | 'Ì' | 'ï' | 'Ï' => 'i',
        'ñ' | 'Ñ' => 'n',
        'ö' | 'Ö' | 'ó' | 'Ó' | 'ò' | 'Ò' | 'ô' | 'Ô' | 'õ' | 'Õ' | 'ø' | 'Ø' => 'o',
        'ş' | 'Ş' | 'ś' | 'Ś' | 'š' | 'Š' => 's',
        'ü' | 'Ü' | 'û' | 'Û' | 'ú' | 'Ú' | 'ù' | 'Ù' => 'u',
        'ý' | 'Ý' | 'ÿ' => 'y',
        'ž' | 'Ž' | 'ź' | 'Ź' | 'ż' | 'Ż' => 'z',
        other => other,
    }
}

/// Parse the leading number of an attribute value.
///
/// Unit suffixes are ignored (`"12V"` is 12) and a decimal comma is accepted (`"0,1"` is
/// 0.1). Returns `None` when the value does not start with a number.
pub fn parse_numeric(value: &str) -> Option<Decimal> {
    let mut number = String::new();
    let mut seen_digit = false;
    let mut seen_separator = false;

    for (index, c) in value.trim().char_indices() {
        match c {
            '-' if index == 0 => number.push(c),
            '0'..='9' => {
                seen_digit = true;
                number.push(c);
            }
            '.' | ',' if seen_digit && !seen_separator => {
                seen_separator = true;
                number.push('.');
            }
            _ => break,
        }
    }

    if !seen_digit {
        return None;
    }

    if number.ends_with('.') {
        number.pop();
    }

    number.parse().ok()
}
