//! Hex colors as used in style paint properties.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// A color string that is not `#rgb`, `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorError(pub String);

impl std::fmt::Display for ColorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid color: {:?}", self.0)
    }
}

impl std::error::Error for ColorError {}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ColorError(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let short = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|_| invalid())
        };

        match hex.len() {
            3 => Ok(Color::rgb(short(0)?, short(1)?, short(2)?)),
            6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => Err(invalid()),
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!("#FFFFFF".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!("#199EF3".parse::<Color>().unwrap(), Color::rgb(0x19, 0x9e, 0xf3));
        assert_eq!("#f0f8ff".parse::<Color>().unwrap(), Color::rgb(240, 248, 255));
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert_eq!(
            "#2c7fb880".parse::<Color>().unwrap(),
            Color {
                r: 0x2c,
                g: 0x7f,
                b: 0xb8,
                a: 0x80
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "FFFFFF", "#FFFFF", "#GGGGGG", "#ffffffffff", "#ｆｆｆ"] {
            assert!(bad.parse::<Color>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_serializes_as_lowercase_hex() {
        let json = serde_json::to_string(&Color::rgb(0x19, 0x9e, 0xf3)).unwrap();
        assert_eq!(json, "\"#199ef3\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(0x19, 0x9e, 0xf3));
    }
}
