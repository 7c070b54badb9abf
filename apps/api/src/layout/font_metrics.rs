//! Static font metrics for the standard PDF Helvetica face.
//!
//! Widths come from the Adobe Core 14 AFM for Helvetica, stored in em units
//! (AFM value / 1000). Helvetica is one of the base-14 fonts every PDF reader
//! ships, so nothing is embedded and these tables are exact for what gets drawn.
//! ASCII 0x20..=0x7E is a direct table lookup; Latin-1 letters reuse the width
//! of their unaccented base letter (true for every accented glyph in the AFM),
//! and the remaining Latin-1 symbols have their own entries. Characters past
//! Latin-1 are drawn as `?` and measured as `?`.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Measurement trait
// ────────────────────────────────────────────────────────────────────────────

/// Text-measurement capability supplied by the rendering side.
///
/// The justifier only sees this trait; it never holds font metrics itself.
pub trait TextMeasure {
    /// Width of `s` in the caller's unit.
    fn measure(&self, s: &str) -> f32;

    fn space_width(&self) -> f32 {
        self.measure(" ")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

pub const PT_PER_CM: f32 = 72.0 / 2.54;

/// Page geometry in points. Origin is the top-left corner; the PDF writer
/// flips y when it emits operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageConfig {
    pub fn a4_portrait() -> Self {
        Self {
            width_pt: 21.0 * PT_PER_CM,
            height_pt: 29.7 * PT_PER_CM,
        }
    }
}

pub fn cm(value: f32) -> f32 {
    value * PT_PER_CM
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Character-width table, in em units.
///
/// `widths[i]` = width of ASCII character `(i + 32)`.
pub struct FontMetricTable {
    /// PostScript name used as the PDF `BaseFont`.
    pub base_font: &'static str,
    widths: [f32; 95],
    /// Latin-1 glyphs that neither the ASCII table nor accent folding cover.
    symbol_widths: &'static [(char, f32)],
    /// Fallback for characters outside the table and its Latin-1 folding.
    pub average_char_width: f32,
}

impl FontMetricTable {
    /// Width of `s` in em units.
    pub fn measure_em(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    fn char_width(&self, c: char) -> f32 {
        let c = if (c as u32) > 0xFF { '?' } else { fold_latin1(c) };
        let code = c as usize;
        if (32..=126).contains(&code) {
            return self.widths[code - 32];
        }
        self.symbol_widths
            .iter()
            .find(|(symbol, _)| *symbol == c)
            .map_or(self.average_char_width, |(_, width)| *width)
    }

    /// Binds the table to a font size, giving a [`TextMeasure`] in points.
    pub fn at_size(&'static self, size_pt: f32) -> SizedFont {
        SizedFont {
            metrics: self,
            size_pt,
        }
    }
}

/// Maps accented Latin-1 letters onto the ASCII base letter with the same AFM width.
fn fold_latin1(c: char) -> char {
    match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'Ç' => 'C',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'Ñ' => 'N',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'Ý' => 'Y',
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        '\u{a0}' => ' ',
        other => other,
    }
}

/// A metric table at a concrete font size. Measures in points.
#[derive(Clone, Copy)]
pub struct SizedFont {
    pub metrics: &'static FontMetricTable,
    pub size_pt: f32,
}

impl TextMeasure for SizedFont {
    fn measure(&self, s: &str) -> f32 {
        self.metrics.measure_em(s) * self.size_pt
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables
// ────────────────────────────────────────────────────────────────────────────

pub static HELVETICA: FontMetricTable = FontMetricTable {
    base_font: "Helvetica",
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    #[rustfmt::skip]
    symbol_widths: &[
        ('¡', 0.333), ('¢', 0.556), ('£', 0.556), ('¤', 0.556), ('¥', 0.556), ('¦', 0.260),
        ('§', 0.556), ('¨', 0.333), ('©', 0.737), ('ª', 0.370), ('«', 0.556), ('¬', 0.584),
        ('\u{ad}', 0.333), ('®', 0.737), ('¯', 0.333), ('°', 0.400), ('±', 0.584), ('²', 0.333),
        ('³', 0.333), ('´', 0.333), ('µ', 0.556), ('¶', 0.537), ('·', 0.278), ('¸', 0.333),
        ('¹', 0.333), ('º', 0.365), ('»', 0.556), ('¼', 0.834), ('½', 0.834), ('¾', 0.834),
        ('¿', 0.611), ('Æ', 1.000), ('Ð', 0.722), ('×', 0.584), ('Ø', 0.778), ('Þ', 0.667),
        ('ß', 0.611), ('æ', 0.889), ('ð', 0.556), ('÷', 0.584), ('ø', 0.611), ('þ', 0.556),
    ],
    average_char_width: 0.556,
};

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
