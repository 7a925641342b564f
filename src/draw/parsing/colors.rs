//! Color parsing for palettes and overlay colors given as hex strings

use crate::draw::geometry::Color;

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional)
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);

    match digits.len() {
        3 => {
            let mut rgb = digits.chars().map(|c| channel(&format!("{c}{c}")));
            Some([rgb.next()??, rgb.next()??, rgb.next()??, 1.0])
        }
        6 | 8 => {
            let r = channel(&digits[0..2])?;
            let g = channel(&digits[2..4])?;
            let b = channel(&digits[4..6])?;
            let a = if digits.len() == 8 { channel(&digits[6..8])? } else { 1.0 };
            Some([r, g, b, a])
        }
        _ => None,
    }
}

/// Parse a palette, dropping unparseable entries
pub fn parse_palette(hexes: &[String]) -> Vec<Color> {
    hexes
        .iter()
        .filter_map(|h| {
            let color = parse_hex_color(h);
            if color.is_none() {
                tracing::warn!("[Colors] ignoring invalid palette entry '{}'", h);
            }
            color
        })
        .collect()
}

/// Format as `#rrggbb` (alpha dropped when opaque)
pub fn to_hex(color: &Color) -> String {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    if color[3] >= 1.0 {
        format!("#{:02x}{:02x}{:02x}", c(color[0]), c(color[1]), c(color[2]))
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", c(color[0]), c(color[1]), c(color[2]), c(color[3]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(parse_hex_color("#ff0000"), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(parse_hex_color("00ff00"), Some([0.0, 1.0, 0.0, 1.0]));
        assert_eq!(parse_hex_color("#fff"), Some([1.0, 1.0, 1.0, 1.0]));
        assert_eq!(parse_hex_color("#00000000"), Some([0.0, 0.0, 0.0, 0.0]));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }

    #[test]
    fn test_hex_round_trip() {
        for hex in ["#ffffcc", "#bd0026", "#80808080"] {
            assert_eq!(to_hex(&parse_hex_color(hex).unwrap()), hex);
        }
    }

    #[test]
    fn test_palette_skips_invalid() {
        let palette = parse_palette(&["#000".to_string(), "nope".to_string(), "#fff".to_string()]);
        assert_eq!(palette.len(), 2);
    }
}
