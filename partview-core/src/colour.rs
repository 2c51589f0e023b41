/// Display colours for parts and actors
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown colour `{0}` (expected #rrggbb or a colour name)")]
pub struct ParseColourError(pub String);

/// 8-bit RGB colour, black by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const NAMED: &[(&str, Rgb)] = &[
    ("black", Rgb::new(0, 0, 0)),
    ("white", Rgb::new(255, 255, 255)),
    ("grey", Rgb::new(128, 128, 128)),
    ("red", Rgb::new(255, 0, 0)),
    ("green", Rgb::new(0, 128, 0)),
    ("blue", Rgb::new(0, 0, 255)),
    ("yellow", Rgb::new(255, 255, 0)),
    ("cyan", Rgb::new(0, 255, 255)),
    ("magenta", Rgb::new(255, 0, 255)),
    ("orange", Rgb::new(255, 165, 0)),
    ("tomato", Rgb::new(255, 99, 71)),
];

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn named(name: &str) -> Option<Self> {
        NAMED
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| *c)
    }

    /// The palette names, in cycling order
    pub fn names() -> impl Iterator<Item = &'static str> {
        NAMED.iter().map(|(n, _)| *n)
    }

    /// Channels as 0.0..=1.0
    pub fn to_f32(self) -> [f32; 3] {
        [self.r, self.g, self.b].map(|c| f32::from(c) / 255.0)
    }

    /// Multiply every channel by `factor`, clamped to 0..=1
    pub fn scale(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let apply = |c: u8| (f32::from(c) * factor).round() as u8;
        Self::new(apply(self.r), apply(self.g), apply(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseColourError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::named(s)
            .or_else(|| Self::from_hex(s))
            .ok_or_else(|| ParseColourError(s.to_string()))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseColourError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_black() {
        assert_eq!(Rgb::default(), Rgb::BLACK);
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!("tomato".parse::<Rgb>().unwrap(), Rgb::new(255, 99, 71));
        assert_eq!("Tomato".parse::<Rgb>().unwrap(), Rgb::new(255, 99, 71));
        assert_eq!("#0a0B0c".parse::<Rgb>().unwrap(), Rgb::new(10, 11, 12));
        assert_eq!("ff0000".parse::<Rgb>().unwrap(), Rgb::new(255, 0, 0));
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("#zzzzzz".parse::<Rgb>().is_err());
        assert!("#ééé".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(Rgb::new(255, 99, 71).to_string(), "#ff6347");
        assert_eq!(Rgb::new(255, 0, 51).to_f32(), [1.0, 0.0, 0.2]);
    }

    #[test]
    fn test_scale() {
        assert_eq!(Rgb::WHITE.scale(0.5), Rgb::new(128, 128, 128));
        assert_eq!(Rgb::WHITE.scale(2.0), Rgb::WHITE);
        assert_eq!(Rgb::WHITE.scale(-1.0), Rgb::BLACK);
    }
}
