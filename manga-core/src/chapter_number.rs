use std::{
    cmp::Ordering,
    convert::Infallible,
    fmt::{self, Display},
    hash::{Hash, Hasher},
    str::FromStr,
};

/// Label used for chapters without any number, usually oneshots
pub static UNNUMBERED_LABEL: &str = "oneshot";
/// Percent-escape marker. Escaped labels only contain it followed by two hex digits,
/// so a trailing lone marker can tag labels that would otherwise be unusable.
static ESCAPE: char = '%';

#[derive(Debug, Clone)]
enum Kind {
    /// Normalized decimal: no leading zeros in `integer`, no trailing zeros in `fraction`
    Numeric { integer: String, fraction: String },
    Other,
}

/// A chapter number as found in the catalog.
///
/// Decimal numbers are compared by value, so `"10"`, `"010"` and `"10.0"` are all equal,
/// and `"10.5"` sorts between `"10"` and `"11"`. Anything else (`"Oneshot"`, empty)
/// sorts after every decimal number, by its raw text.
#[derive(Debug, Clone)]
pub struct ChapterNumber {
    raw: String,
    kind: Kind,
}

impl ChapterNumber {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        let (integer, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let is_numeric = !integer.is_empty()
            && integer.bytes().all(|b| b.is_ascii_digit())
            && fraction.bytes().all(|b| b.is_ascii_digit());
        let kind = if is_numeric {
            let integer = integer.trim_start_matches('0');
            Kind::Numeric {
                integer: if integer.is_empty() { "0" } else { integer }.to_string(),
                fraction: fraction.trim_end_matches('0').to_string(),
            }
        } else {
            Kind::Other
        };
        Self { raw, kind }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, Kind::Numeric { .. })
    }

    /// Returns the value if this is a whole number that fits a `u32`
    pub fn as_integer(&self) -> Option<u32> {
        match &self.kind {
            Kind::Numeric { integer, fraction } if fraction.is_empty() => integer.parse().ok(),
            _ => None,
        }
    }

    /// The directory segment used to store this chapter locally, never empty.
    /// Two numbers share a label if and only if they are equal.
    ///
    /// Characters that can't appear in a file name are percent-escaped. Labels that are
    /// still not usable as is (`..`, a reserved name, the unnumbered label) get a
    /// trailing `%`.
    pub fn label(&self) -> String {
        match &self.kind {
            Kind::Numeric { .. } => self.to_string(),
            Kind::Other if self.raw.trim().is_empty() => UNNUMBERED_LABEL.to_string(),
            Kind::Other => {
                let escaped = escape_label(self.raw.trim());
                if escaped == UNNUMBERED_LABEL || sanitize_filename::sanitize(&escaped) != escaped
                {
                    format!("{escaped}{ESCAPE}")
                } else {
                    escaped
                }
            }
        }
    }
}

fn escape_label(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == ESCAPE
            || c.is_control()
            || matches!(c, '/' | '\\' | '?' | '<' | '>' | ':' | '*' | '|' | '"')
        {
            let mut buffer = [0; 4];
            for byte in c.encode_utf8(&mut buffer).bytes() {
                escaped.push_str(&format!("{ESCAPE}{byte:02X}"));
            }
        } else {
            escaped.push(c);
        }
    }
    escaped
}

impl Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Numeric { integer, fraction } if fraction.is_empty() => write!(f, "{integer}"),
            Kind::Numeric { integer, fraction } => write!(f, "{integer}.{fraction}"),
            Kind::Other => write!(f, "{}", self.raw.trim()),
        }
    }
}

impl FromStr for ChapterNumber {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<u32> for ChapterNumber {
    fn from(value: u32) -> Self {
        Self::parse(value.to_string())
    }
}

impl From<Option<String>> for ChapterNumber {
    fn from(value: Option<String>) -> Self {
        Self::parse(value.unwrap_or_default())
    }
}

impl PartialEq for ChapterNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ChapterNumber {}

impl PartialOrd for ChapterNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ChapterNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.kind, &other.kind) {
            (
                Kind::Numeric { integer, fraction },
                Kind::Numeric {
                    integer: other_integer,
                    fraction: other_fraction,
                },
            ) => integer
                .len()
                .cmp(&other_integer.len())
                .then_with(|| integer.cmp(other_integer))
                .then_with(|| fraction.cmp(other_fraction)),
            (Kind::Numeric { .. }, Kind::Other) => Ordering::Less,
            (Kind::Other, Kind::Numeric { .. }) => Ordering::Greater,
            (Kind::Other, Kind::Other) => self.raw.trim().cmp(other.raw.trim()),
        }
    }
}

impl Hash for ChapterNumber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_numeric().hash(state);
        self.to_string().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_decimal_forms_are_equal() {
        assert_eq!(ChapterNumber::parse("10"), ChapterNumber::parse("10.0"));
        assert_eq!(ChapterNumber::parse("10"), ChapterNumber::parse("010"));
        assert_eq!(ChapterNumber::parse("10.5"), ChapterNumber::parse("10.50"));
        assert_eq!(ChapterNumber::parse("0"), ChapterNumber::parse("00.0"));
        assert_ne!(ChapterNumber::parse("10"), ChapterNumber::parse("10.5"));
    }

    #[test]
    fn ordering_is_numeric_then_textual() {
        let mut numbers = ["11", "Oneshot", "10.5", "2", "10", "", "10.25"]
            .into_iter()
            .map(ChapterNumber::parse)
            .collect::<Vec<_>>();
        numbers.sort();
        let labels = numbers.iter().map(ChapterNumber::label).collect::<Vec<_>>();
        assert_eq!(
            labels,
            ["2", "10", "10.25", "10.5", "11", "oneshot", "Oneshot"]
        );
    }

    #[test]
    fn labels_are_canonical() {
        assert_eq!(ChapterNumber::parse("007").label(), "7");
        assert_eq!(ChapterNumber::parse("7.10").label(), "7.1");
        assert_eq!(ChapterNumber::parse(" ").label(), UNNUMBERED_LABEL);
        assert_eq!(ChapterNumber::parse("a/b").label(), "a%2Fb");
        assert_eq!(ChapterNumber::parse("100%").label(), "100%25");
        assert_eq!(ChapterNumber::parse("..").label(), "..%");
        assert_eq!(ChapterNumber::parse("oneshot").label(), "oneshot%");
        assert_eq!(ChapterNumber::parse("Extra").label(), "Extra");
    }

    #[test]
    fn distinct_numbers_never_share_a_label() {
        let pairs = [
            ("a/b", "ab"),
            ("a/b", "a%2Fb"),
            ("", "oneshot"),
            ("oneshot", "oneshot%"),
            ("..", ".."),
            (".", ".."),
            ("Extra.", "Extra"),
            ("a:b", "a_b"),
        ];
        for (a, b) in pairs {
            let (a, b) = (ChapterNumber::parse(a), ChapterNumber::parse(b));
            assert!(!a.label().is_empty());
            assert_eq!(a == b, a.label() == b.label(), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn only_whole_numbers_are_integers() {
        assert_eq!(ChapterNumber::parse("1050").as_integer(), Some(1050));
        assert_eq!(ChapterNumber::parse("12.0").as_integer(), Some(12));
        assert_eq!(ChapterNumber::parse("12.5").as_integer(), None);
        assert_eq!(ChapterNumber::parse("Extra").as_integer(), None);
        assert_eq!(ChapterNumber::from(3).as_integer(), Some(3));
    }
}
