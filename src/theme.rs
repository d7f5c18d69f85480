//! Colour palette and colour helpers for the dashboard.
//!
//! Panels use a dark palette; the graph canvas stays light so that PNG
//! exports read like the printed reports.

use egui::Color32;

/// Background colors for different layers
pub mod bg {
    use super::*;

    /// Community graph canvas, light so exports match the web export
    pub const GRAPH: Color32 = Color32::from_rgb(250, 250, 252);

    /// Side and top panel backgrounds
    pub const PANEL: Color32 = Color32::from_rgb(20, 22, 28);

    /// Card/elevated surface backgrounds
    pub const SURFACE: Color32 = Color32::from_rgb(28, 30, 38);
}

/// Accent colors for buttons, markers and status
pub mod accent {
    use super::*;

    /// Primary accent, used for the selected node
    pub const ORANGE: Color32 = Color32::from_rgb(255, 149, 0);

    /// Links and data-type tags
    pub const CYAN: Color32 = Color32::from_rgb(6, 182, 212);

    /// Green for success states
    pub const GREEN: Color32 = Color32::from_rgb(34, 197, 94);

    /// Blue for info and primary actions
    pub const BLUE: Color32 = Color32::from_rgb(59, 130, 246);

    /// Red for errors and destructive actions
    pub const RED: Color32 = Color32::from_rgb(239, 68, 68);

    /// Yellow for CSV issue markers
    pub const YELLOW: Color32 = Color32::from_rgb(255, 220, 80);
}

/// Text colors at different emphasis levels
pub mod text {
    use super::*;

    /// Primary text - high contrast
    pub const PRIMARY: Color32 = Color32::from_rgb(240, 240, 245);

    /// Secondary text - medium contrast
    pub const SECONDARY: Color32 = Color32::from_rgb(180, 180, 190);

    /// Muted text - low contrast for less important info
    pub const MUTED: Color32 = Color32::from_rgb(120, 125, 135);

    /// Labels drawn on the light graph canvas
    pub const ON_GRAPH: Color32 = Color32::from_rgb(40, 44, 52);
}

/// Border colors
pub mod border {
    use super::*;

    /// Subtle border for separators and file lists
    pub const SUBTLE: Color32 = Color32::from_rgb(45, 48, 55);
}

/// State colors for interactive elements
pub mod state {
    use super::*;

    /// Hovered node outline
    pub const HOVER: Color32 = Color32::from_rgb(40, 44, 52);

    /// Selected node outline
    pub const SELECTED: Color32 = super::accent::ORANGE;

    /// Success indicator
    pub const SUCCESS: Color32 = super::accent::GREEN;

    /// Error indicator
    pub const ERROR: Color32 = super::accent::RED;

    /// Warning indicator
    pub const WARNING: Color32 = Color32::from_rgb(245, 158, 11);

    /// Info indicator
    pub const INFO: Color32 = super::accent::BLUE;
}

/// Node rendering stroke widths
pub mod stroke_width {
    /// Normal node border
    pub const NORMAL: f32 = 0.5;

    /// Hovered node border
    pub const HOVER: f32 = 1.5;

    /// Selected node border
    pub const SELECTED: f32 = 2.5;
}

/// Skeleton loading placeholder colors
pub mod skeleton {
    use super::*;

    /// Base skeleton background
    pub const BASE: Color32 = Color32::from_rgb(35, 38, 48);

    /// Animated shimmer highlight
    pub const SHIMMER: Color32 = Color32::from_rgb(50, 53, 63);
}

/// HSL (h in degrees, s and l in 0..1) to an opaque colour
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color32 {
    let h = h.rem_euclid(360.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let channel = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color32::from_rgb(channel(r), channel(g), channel(b))
}

/// Stable FNV-1a hash so colours do not change between runs
fn stable_hash(s: &str) -> u32 {
    s.bytes().fold(0x811c9dc5u32, |h, b| (h ^ b as u32).wrapping_mul(0x01000193))
}

/// Deterministic colour for a chart series label
pub fn label_color(label: &str) -> Color32 {
    let hue = (stable_hash(label) % 360) as f32;
    hsl_to_rgb(hue, 0.65, 0.55)
}

/// Colour for a community id. Numeric ids are spread by the golden angle.
pub fn community_color(group: Option<&str>) -> Color32 {
    let Some(group) = group else {
        return Color32::from_rgb(150, 155, 165);
    };
    let hue = match group.trim().parse::<u32>() {
        Ok(n) => (n as f32 * 137.5) % 360.0,
        Err(_) => (stable_hash(group) % 360) as f32,
    };
    hsl_to_rgb(hue, 0.7, 0.5)
}

/// Parse `#rrggbb`, `#rgb`, `rgb(r, g, b)` or `rgba(r, g, b, a)`
pub fn parse_css_color(s: &str) -> Option<Color32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        let digits: Vec<u8> = match hex.len() {
            6 => (0..3)
                .map(|i| u8::from_str_radix(hex.get(i * 2..i * 2 + 2)?, 16).ok())
                .collect::<Option<_>>()?,
            3 => hex
                .chars()
                .map(|c| c.to_digit(16).map(|d| (d * 17) as u8))
                .collect::<Option<_>>()?,
            _ => return None,
        };
        return Some(Color32::from_rgb(digits[0], digits[1], digits[2]));
    }

    let inner = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |p: &str| p.parse::<f32>().ok().map(|v| v.round().clamp(0.0, 255.0) as u8);
    let (r, g, b) = (channel(parts[0])?, channel(parts[1])?, channel(parts[2])?);
    match parts.get(3) {
        Some(a) => {
            let alpha = a.parse::<f32>().ok()?.clamp(0.0, 1.0);
            Some(Color32::from_rgba_unmultiplied(r, g, b, (alpha * 255.0).round() as u8))
        }
        None => Some(Color32::from_rgb(r, g, b)),
    }
}

/// Create a skeleton rectangle for loading placeholders
pub fn skeleton_rect(ui: &mut egui::Ui, width: f32, height: f32) {
    let (rect, _) = ui.allocate_exact_size(egui::Vec2::new(width, height), egui::Sense::hover());

    let time = ui.ctx().input(|i| i.time);
    let phase = ((time * 2.0).sin() * 0.5 + 0.5) as f32;

    let color = Color32::from_rgb(
        lerp_u8(skeleton::BASE.r(), skeleton::SHIMMER.r(), phase),
        lerp_u8(skeleton::BASE.g(), skeleton::SHIMMER.g(), phase),
        lerp_u8(skeleton::BASE.b(), skeleton::SHIMMER.b(), phase),
    );

    ui.painter().rect_filled(rect, 4.0, color);
    ui.ctx().request_repaint();
}

/// Placeholder lines of varying width
pub fn skeleton_lines(ui: &mut egui::Ui, count: usize, base_width: f32) {
    for i in 0..count {
        let width_factor = match i % 3 {
            0 => 1.0,
            1 => 0.85,
            _ => 0.7,
        };
        skeleton_rect(ui, base_width * width_factor, 14.0);
        if i + 1 < count {
            ui.add_space(4.0);
        }
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let result = a as f32 + (b as f32 - a as f32) * t;
    result.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), Color32::from_rgb(255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), Color32::from_rgb(0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), Color32::from_rgb(0, 0, 255));
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), Color32::from_rgb(255, 0, 0));
    }

    #[test]
    fn label_colors_are_stable() {
        assert_eq!(label_color("climat"), label_color("climat"));
        assert_ne!(label_color("climat"), label_color("agriculture"));
    }

    #[test]
    fn community_colors() {
        assert_eq!(community_color(Some("3")), community_color(Some(" 3 ")));
        assert_ne!(community_color(Some("0")), community_color(Some("1")));
        assert_eq!(community_color(None), Color32::from_rgb(150, 155, 165));
    }

    #[test]
    fn parses_css_colors() {
        assert_eq!(parse_css_color("#ff8000"), Some(Color32::from_rgb(255, 128, 0)));
        assert_eq!(parse_css_color("#0f0"), Some(Color32::from_rgb(0, 255, 0)));
        assert_eq!(parse_css_color("rgb(10, 20, 30)"), Some(Color32::from_rgb(10, 20, 30)));
        assert_eq!(
            parse_css_color("rgba(255,255,255,0)"),
            Some(Color32::from_rgba_unmultiplied(255, 255, 255, 0))
        );
        assert_eq!(parse_css_color("#12345"), None);
        assert_eq!(parse_css_color("blue"), None);
        assert_eq!(parse_css_color("rgb(1,2)"), None);
    }
}
