// crates/proofdesk-core/src/helpers/path.rs
//
// SVG path utilities for freehand annotations.
//
// Capture only ever emits absolute `M x y` / `L x y` sequences, so that is
// all the scaler understands. Curves, relative commands and H/V pass
// through byte-for-byte unscaled.
//
// Layout guarantees of scale_path:
//   - command letters, separators and whitespace are copied verbatim
//   - only numeric tokens following M/L are rewritten, alternating x / y
//   - an axis whose factor is exactly 1.0 keeps its original token text, so
//     scale_path(d, 1.0, 1.0) == d for every input

use super::geometry::Point;

// ── Tokenizer ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token<'a> {
    Command(char),
    Number(&'a str),
    Other(&'a str),
}

struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }
}

fn starts_number(bytes: &[u8], i: usize) -> bool {
    let digit_at = |j: usize| bytes.get(j).is_some_and(u8::is_ascii_digit);
    match bytes.get(i) {
        Some(b) if b.is_ascii_digit() => true,
        Some(b'.') => digit_at(i + 1),
        Some(b'-') | Some(b'+') => {
            digit_at(i + 1) || (bytes.get(i + 1) == Some(&b'.') && digit_at(i + 2))
        }
        _ => false,
    }
}

fn number_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    if matches!(bytes.get(i), Some(b'-') | Some(b'+')) {
        i += 1;
    }
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
    }
    // Exponent only when digits actually follow, otherwise `e` is left alone.
    if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'-') | Some(b'+')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            while bytes.get(j).is_some_and(u8::is_ascii_digit) {
                j += 1;
            }
            i = j;
        }
    }
    i
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let first = *bytes.get(start)?;

        if first.is_ascii_alphabetic() {
            self.pos += 1;
            return Some(Token::Command(first as char));
        }
        if starts_number(bytes, start) {
            self.pos = number_end(bytes, start);
            return Some(Token::Number(&self.src[start..self.pos]));
        }

        // Everything else (whitespace, commas, non-ASCII) up to the next token.
        // Multibyte UTF-8 bytes are >= 0x80 and never match the ASCII checks,
        // so the slice boundaries always land on char boundaries.
        let mut i = start + 1;
        while i < bytes.len() && !bytes[i].is_ascii_alphabetic() && !starts_number(bytes, i) {
            i += 1;
        }
        self.pos = i;
        Some(Token::Other(&self.src[start..i]))
    }
}

// ── Formatting ────────────────────────────────────────────────────────────────

/// Shortest round-trip text for a coordinate. `-0` is normalised to `0`.
///
/// ```
/// use proofdesk_core::helpers::path::format_coord;
/// assert_eq!(format_coord(12.0), "12");
/// assert_eq!(format_coord(12.5), "12.5");
/// assert_eq!(format_coord(-0.0), "0");
/// ```
pub fn format_coord(v: f64) -> String {
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{v}")
}

/// Round to two decimals.
pub fn round_coord(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn is_scalable(cmd: Option<char>) -> bool {
    matches!(cmd, Some('M') | Some('L'))
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Multiply every absolute `M`/`L` coordinate pair in `d` by `(sx, sy)`.
///
/// ```
/// use proofdesk_core::helpers::path::scale_path;
/// assert_eq!(scale_path("M 10 20 L 30 40", 2.0, 0.5), "M 20 10 L 60 20");
/// assert_eq!(scale_path("M 1.25 3 L 4 5", 1.0, 1.0), "M 1.25 3 L 4 5");
/// ```
pub fn scale_path(d: &str, sx: f64, sy: f64) -> String {
    let mut out  = String::with_capacity(d.len() + 8);
    let mut cmd  = None;
    let mut axis = 0usize; // 0 = x, 1 = y

    for token in Tokens::new(d) {
        match token {
            Token::Command(c) => {
                cmd  = Some(c);
                axis = 0;
                out.push(c);
            }
            Token::Number(text) if is_scalable(cmd) => {
                let factor = if axis == 0 { sx } else { sy };
                axis ^= 1;
                if factor == 1.0 {
                    out.push_str(text);
                    continue;
                }
                match text.parse::<f64>() {
                    Ok(v)  => out.push_str(&format_coord(v * factor)),
                    Err(_) => out.push_str(text),
                }
            }
            Token::Number(text) | Token::Other(text) => out.push_str(text),
        }
    }
    out
}

/// Parse the `M`/`L` commands of `d` into polylines, one per `M`.
///
/// Used by the overlay renderer, which paints line segments rather than
/// SVG. Unsupported commands end the current polyline and their numbers are
/// skipped. A dangling x without its y is dropped.
pub fn polylines(d: &str) -> Vec<Vec<Point>> {
    let mut lines: Vec<Vec<Point>> = Vec::new();
    let mut cmd: Option<char> = None;
    let mut pending_x: Option<f64> = None;

    for token in Tokens::new(d) {
        match token {
            Token::Command(c) => {
                cmd = Some(c);
                pending_x = None;
                if c == 'M' {
                    lines.push(Vec::new());
                }
            }
            Token::Number(text) if is_scalable(cmd) => {
                let Ok(v) = text.parse::<f64>() else { continue };
                match pending_x.take() {
                    None    => pending_x = Some(v),
                    Some(x) => {
                        if lines.is_empty() {
                            lines.push(Vec::new());
                        }
                        if let Some(line) = lines.last_mut() {
                            line.push(Point::new(x, v));
                        }
                    }
                }
            }
            _ => {}
        }
    }
    lines.retain(|l| !l.is_empty());
    lines
}

/// Incrementally builds a capture path: the first point is a move, every
/// following point a line-to. Coordinates are rounded to two decimals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathBuilder {
    d: String,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, p: Point) {
        let x = format_coord(round_coord(p.x));
        let y = format_coord(round_coord(p.y));
        if self.d.is_empty() {
            self.d = format!("M {x} {y}");
        } else {
            self.d.push_str(&format!(" L {x} {y}"));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.d.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.d
    }

    pub fn clear(&mut self) {
        self.d.clear();
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coords(d: &str) -> Vec<f64> {
        polylines(d).into_iter().flatten().flat_map(|p| [p.x, p.y]).collect()
    }

    #[test]
    fn scales_axes_independently() {
        assert_eq!(scale_path("M 100 200 L 50 10", 0.5, 2.0), "M 50 400 L 25 20");
    }

    #[test]
    fn keeps_separators_and_commas() {
        assert_eq!(scale_path("M10,20L30,40", 2.0, 2.0), "M20,40L60,80");
    }

    #[test]
    fn unsupported_commands_pass_through() {
        let d = "M 1 1 C 2 2 3 3 4 4 l 5 5 L 6 6";
        assert_eq!(scale_path(d, 10.0, 10.0), "M 10 10 C 2 2 3 3 4 4 l 5 5 L 60 60");
    }

    #[test]
    fn one_axis_identity_keeps_original_text() {
        assert_eq!(scale_path("M 1.50 2.50", 1.0, 2.0), "M 1.50 5");
    }

    #[test]
    fn exponent_numbers_are_scaled() {
        assert_eq!(scale_path("M 1e2 2.5E1", 2.0, 2.0), "M 200 50");
    }

    #[test]
    fn empty_path_stays_empty() {
        assert_eq!(scale_path("", 3.0, 3.0), "");
        assert!(polylines("").is_empty());
    }

    #[test]
    fn polylines_split_on_move() {
        let lines = polylines("M 0 0 L 1 1 M 5 5 L 6 6 L 7 7");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], vec![Point::new(5.0, 5.0), Point::new(6.0, 6.0), Point::new(7.0, 7.0)]);
    }

    #[test]
    fn polylines_drop_dangling_x() {
        let lines = polylines("M 0 0 L 3");
        assert_eq!(lines, vec![vec![Point::new(0.0, 0.0)]]);
    }

    #[test]
    fn builder_emits_move_then_lines() {
        let mut b = PathBuilder::new();
        b.push(Point::new(1.004, 2.0));
        b.push(Point::new(3.5, 4.126));
        assert_eq!(b.as_str(), "M 1 2 L 3.5 4.13");
        assert_eq!(b.take(), "M 1 2 L 3.5 4.13");
        assert!(b.is_empty());
    }

    fn arb_path() -> impl Strategy<Value = String> {
        prop::collection::vec((-5000.0f64..5000.0, -5000.0f64..5000.0), 1..24).prop_map(|pts| {
            let mut b = PathBuilder::new();
            for (x, y) in pts {
                b.push(Point::new(x, y));
            }
            b.take()
        })
    }

    proptest! {
        #[test]
        fn identity_scale_is_idempotent(d in arb_path()) {
            prop_assert_eq!(scale_path(&d, 1.0, 1.0), d);
        }

        #[test]
        fn composition_matches_product(
            d   in arb_path(),
            sx1 in 0.1f64..8.0, sy1 in 0.1f64..8.0,
            sx2 in 0.1f64..8.0, sy2 in 0.1f64..8.0,
        ) {
            let twice = coords(&scale_path(&scale_path(&d, sx1, sy1), sx2, sy2));
            let once  = coords(&scale_path(&d, sx1 * sx2, sy1 * sy2));
            prop_assert_eq!(twice.len(), once.len());
            for (a, b) in twice.iter().zip(once.iter()) {
                let tol = 1e-9 * a.abs().max(b.abs()).max(1.0);
                prop_assert!((a - b).abs() <= tol, "{} vs {}", a, b);
            }
        }

        #[test]
        fn structure_is_preserved(d in arb_path(), s in 0.1f64..8.0) {
            let scaled = scale_path(&d, s, s);
            let letters = |p: &str| p.chars().filter(|c| c.is_ascii_alphabetic()).collect::<String>();
            prop_assert_eq!(letters(&scaled), letters(&d));
            prop_assert_eq!(polylines(&scaled).len(), polylines(&d).len());
        }
    }
}
