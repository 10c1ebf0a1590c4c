// List item markers
use serde::{Deserialize, Serialize};

/// CSS list-style-type values the painter knows how to number
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListStyleType {
    None,
    #[default]
    Disc,
    Circle,
    Square,
    Decimal,
    DecimalLeadingZero,
    LowerRoman,
    UpperRoman,
    LowerAlpha,
    UpperAlpha,
    LowerGreek,
}

impl ListStyleType {
    /// Marker text for a list item (1-based index).
    ///
    /// Alphabetic, roman and greek counters have no zero, so index 0 falls
    /// back to decimal.
    pub fn marker(&self, index: usize) -> String {
        let counter = match self {
            ListStyleType::None => return String::new(),
            ListStyleType::Disc => return "•".to_string(),
            ListStyleType::Circle => return "◦".to_string(),
            ListStyleType::Square => return "▪".to_string(),
            ListStyleType::Decimal => Some(index.to_string()),
            ListStyleType::DecimalLeadingZero => Some(format!("{:02}", index)),
            ListStyleType::LowerRoman => roman(index).map(|numeral| numeral.to_lowercase()),
            ListStyleType::UpperRoman => roman(index),
            ListStyleType::LowerAlpha => alphabetic(index, b'a'),
            ListStyleType::UpperAlpha => alphabetic(index, b'A'),
            ListStyleType::LowerGreek => greek(index),
        };
        format!("{}.", counter.unwrap_or_else(|| index.to_string()))
    }
}

/// The `::marker` box of a list item
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListMarker {
    pub style_type: ListStyleType,
    pub index: usize,
    /// `list-style-image` url, painted instead of the text marker when it loads
    pub image: Option<String>,
}

impl ListMarker {
    pub fn text(&self) -> String {
        self.style_type.marker(self.index)
    }
}

/// Bijective base-26: a..z, aa, ab, ...
fn alphabetic(num: usize, first: u8) -> Option<String> {
    if num == 0 {
        return None;
    }
    let mut digits = Vec::new();
    let mut rest = num;
    while rest > 0 {
        rest -= 1;
        digits.push((first + (rest % 26) as u8) as char);
        rest /= 26;
    }
    Some(digits.into_iter().rev().collect())
}

fn roman(num: usize) -> Option<String> {
    const NUMERALS: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    if num == 0 {
        return None;
    }
    let (numeral, _) = NUMERALS.iter().fold((String::new(), num), |(mut numeral, rest), (value, symbol)| {
        numeral.push_str(&symbol.repeat(rest / value));
        (numeral, rest % value)
    });
    Some(numeral)
}

/// Greek letters, with a cycle suffix past omega
fn greek(num: usize) -> Option<String> {
    const LETTERS: [char; 24] = [
        'α', 'β', 'γ', 'δ', 'ε', 'ζ', 'η', 'θ', 'ι', 'κ', 'λ', 'μ',
        'ν', 'ξ', 'ο', 'π', 'ρ', 'σ', 'τ', 'υ', 'φ', 'χ', 'ψ', 'ω',
    ];
    let position = num.checked_sub(1)?;
    let letter = LETTERS[position % LETTERS.len()];
    let cycle = position / LETTERS.len();
    Some(if cycle == 0 {
        letter.to_string()
    } else {
        format!("{}{}", letter, cycle + 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_markers() {
        assert_eq!(ListStyleType::Decimal.marker(3), "3.");
        assert_eq!(ListStyleType::UpperRoman.marker(14), "XIV.");
        assert_eq!(ListStyleType::LowerAlpha.marker(28), "ab.");
        assert_eq!(ListStyleType::None.marker(1), "");
        assert_eq!(ListStyleType::LowerGreek.marker(26), "β2.");
        assert_eq!(ListStyleType::LowerRoman.marker(1994), "mcmxciv.");
    }

    #[test]
    fn zero_falls_back_to_decimal() {
        assert_eq!(ListStyleType::UpperRoman.marker(0), "0.");
        assert_eq!(ListStyleType::LowerAlpha.marker(0), "0.");
        assert_eq!(ListStyleType::LowerGreek.marker(0), "0.");
        assert_eq!(ListStyleType::DecimalLeadingZero.marker(0), "00.");
    }
}
