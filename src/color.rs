use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

fn to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Category colours: dominant colour value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a categorical column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the distinct non-null values in `values`.
    pub fn new<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let unique: std::collections::BTreeSet<&str> = values.into_iter().collect();
        let palette = generate_palette(unique.len());
        let mapping = unique
            .into_iter()
            .zip(palette)
            .map(|(v, c)| (v.to_string(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a category; unknown or missing → grey.
    pub fn color_for(&self, value: Option<&str>) -> Color32 {
        value
            .and_then(|v| self.mapping.get(v))
            .copied()
            .unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Sequential scale for the heatmap
// ---------------------------------------------------------------------------

/// Dark purple → teal → yellow, `t` clamped to `[0, 1]`.
pub fn heat_color(t: f64) -> Color32 {
    let t = t.clamp(0.0, 1.0) as f32;
    let low = Hsl::new(275.0, 0.6, 0.25);
    let mid = Hsl::new(175.0, 0.55, 0.42);
    let high = Hsl::new(55.0, 0.95, 0.55);
    let hsl = if t < 0.5 {
        low.mix(mid, t * 2.0)
    } else {
        mid.mix(high, (t - 0.5) * 2.0)
    };
    to_color32(hsl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(7).len(), 7);
    }

    #[test]
    fn color_map_dedups_and_defaults() {
        let cm = ColorMap::new(["red", "blue", "red"]);
        assert_eq!(cm.mapping.len(), 2);
        assert_ne!(cm.color_for(Some("red")), cm.color_for(Some("blue")));
        assert_eq!(cm.color_for(None), Color32::GRAY);
        assert_eq!(cm.color_for(Some("green")), Color32::GRAY);
    }

    #[test]
    fn heat_scale_endpoints_differ() {
        assert_ne!(heat_color(0.0), heat_color(1.0));
        assert_eq!(heat_color(-3.0), heat_color(0.0));
    }
}
