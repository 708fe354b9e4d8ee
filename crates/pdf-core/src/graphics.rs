//! Vector path operators (lines, rectangles, ellipses)
//!
//! All functions take PDF user-space coordinates (bottom-left origin) and
//! return content stream bytes, in the same style as the text and image
//! operator generators.

use crate::document::Color;

/// Bezier control point factor for quarter-circle arcs
const KAPPA: f64 = 0.552_284_749_8;

/// Stroke and fill settings for a path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathStyle {
    /// Stroke color, `None` for no outline
    pub stroke: Option<Color>,
    /// Stroke width in points
    pub line_width: f64,
    /// Fill color, `None` for no fill
    pub fill: Option<Color>,
    /// Dash pattern in points (on, off, ...)
    pub dash: Option<Vec<f64>>,
}

impl PathStyle {
    /// Outline-only style
    pub fn stroked(color: Color, line_width: f64) -> Self {
        Self {
            stroke: Some(color),
            line_width,
            ..Default::default()
        }
    }

    /// Fill-only style
    pub fn filled(color: Color) -> Self {
        Self {
            fill: Some(color),
            ..Default::default()
        }
    }

    fn is_visible(&self) -> bool {
        self.fill.is_some() || (self.stroke.is_some() && self.line_width > 0.0)
    }

    /// Graphics state setup operators
    fn setup(&self) -> String {
        let mut ops = String::new();
        if let Some(c) = self.stroke {
            ops.push_str(&format!("{} {} {} RG\n", c.r, c.g, c.b));
            ops.push_str(&format!("{:.3} w\n", self.line_width));
            match &self.dash {
                Some(dash) if !dash.is_empty() => {
                    let parts: Vec<String> = dash.iter().map(|d| format!("{d:.3}")).collect();
                    ops.push_str(&format!("[{}] 0 d\n", parts.join(" ")));
                }
                _ => ops.push_str("[] 0 d\n"),
            }
        }
        if let Some(c) = self.fill {
            ops.push_str(&format!("{} {} {} rg\n", c.r, c.g, c.b));
        }
        ops
    }

    /// Painting operator closing the path
    fn paint(&self) -> &'static str {
        let stroke = self.stroke.is_some() && self.line_width > 0.0;
        match (self.fill.is_some(), stroke) {
            (true, true) => "B",
            (true, false) => "f",
            (false, true) => "S",
            (false, false) => "n",
        }
    }
}

/// Generate operators for a straight line
pub fn line_operators(x1: f64, y1: f64, x2: f64, y2: f64, style: &PathStyle) -> Vec<u8> {
    if style.stroke.is_none() || style.line_width <= 0.0 {
        return Vec::new();
    }
    let mut ops = String::from("q\n");
    ops.push_str(&style.setup());
    ops.push_str(&format!("{x1:.3} {y1:.3} m\n{x2:.3} {y2:.3} l\nS\nQ\n"));
    ops.into_bytes()
}

/// Generate operators for a rectangle, optionally with rounded corners
///
/// `x`, `y` is the bottom-left corner in PDF coordinates.
pub fn rect_operators(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    radius: f64,
    style: &PathStyle,
) -> Vec<u8> {
    if !style.is_visible() || width <= 0.0 || height <= 0.0 {
        return Vec::new();
    }

    let mut ops = String::from("q\n");
    ops.push_str(&style.setup());

    let r = radius.max(0.0).min(width / 2.0).min(height / 2.0);
    if r <= 0.0 {
        ops.push_str(&format!("{x:.3} {y:.3} {width:.3} {height:.3} re\n"));
    } else {
        let k = r * KAPPA;
        let (x0, y0, x1, y1) = (x, y, x + width, y + height);
        ops.push_str(&format!("{:.3} {:.3} m\n", x0 + r, y0));
        ops.push_str(&format!("{:.3} {:.3} l\n", x1 - r, y0));
        ops.push_str(&format!(
            "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c\n",
            x1 - r + k,
            y0,
            x1,
            y0 + r - k,
            x1,
            y0 + r
        ));
        ops.push_str(&format!("{:.3} {:.3} l\n", x1, y1 - r));
        ops.push_str(&format!(
            "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c\n",
            x1,
            y1 - r + k,
            x1 - r + k,
            y1,
            x1 - r,
            y1
        ));
        ops.push_str(&format!("{:.3} {:.3} l\n", x0 + r, y1));
        ops.push_str(&format!(
            "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c\n",
            x0 + r - k,
            y1,
            x0,
            y1 - r + k,
            x0,
            y1 - r
        ));
        ops.push_str(&format!("{:.3} {:.3} l\n", x0, y0 + r));
        ops.push_str(&format!(
            "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c\n",
            x0,
            y0 + r - k,
            x0 + r - k,
            y0,
            x0 + r,
            y0
        ));
        ops.push_str("h\n");
    }

    ops.push_str(style.paint());
    ops.push_str("\nQ\n");
    ops.into_bytes()
}

/// Generate operators for an ellipse inscribed in the given box
///
/// `x`, `y` is the bottom-left corner of the bounding box in PDF coordinates.
pub fn ellipse_operators(x: f64, y: f64, width: f64, height: f64, style: &PathStyle) -> Vec<u8> {
    if !style.is_visible() || width <= 0.0 || height <= 0.0 {
        return Vec::new();
    }

    let rx = width / 2.0;
    let ry = height / 2.0;
    let cx = x + rx;
    let cy = y + ry;
    let kx = rx * KAPPA;
    let ky = ry * KAPPA;

    let mut ops = String::from("q\n");
    ops.push_str(&style.setup());
    ops.push_str(&format!("{:.3} {:.3} m\n", cx + rx, cy));
    ops.push_str(&format!(
        "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c\n",
        cx + rx,
        cy + ky,
        cx + kx,
        cy + ry,
        cx,
        cy + ry
    ));
    ops.push_str(&format!(
        "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c\n",
        cx - kx,
        cy + ry,
        cx - rx,
        cy + ky,
        cx - rx,
        cy
    ));
    ops.push_str(&format!(
        "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c\n",
        cx - rx,
        cy - ky,
        cx - kx,
        cy - ry,
        cx,
        cy - ry
    ));
    ops.push_str(&format!(
        "{:.3} {:.3} {:.3} {:.3} {:.3} {:.3} c\n",
        cx + kx,
        cy - ry,
        cx + rx,
        cy - ky,
        cx + rx,
        cy
    ));
    ops.push_str("h\n");
    ops.push_str(style.paint());
    ops.push_str("\nQ\n");
    ops.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(ops: Vec<u8>) -> String {
        String::from_utf8(ops).unwrap()
    }

    #[test]
    fn test_line_operators() {
        let ops = as_text(line_operators(
            0.0,
            0.0,
            10.0,
            20.0,
            &PathStyle::stroked(Color::black(), 1.0),
        ));
        assert!(ops.contains("0.000 0.000 m"));
        assert!(ops.contains("10.000 20.000 l"));
        assert!(ops.contains("1.000 w"));
        assert!(ops.starts_with("q\n"));
        assert!(ops.ends_with("Q\n"));
    }

    #[test]
    fn test_line_without_stroke_is_empty() {
        assert!(line_operators(0.0, 0.0, 1.0, 1.0, &PathStyle::default()).is_empty());
    }

    #[test]
    fn test_rect_operators_fill_and_stroke() {
        let style = PathStyle {
            stroke: Some(Color::black()),
            line_width: 0.5,
            fill: Some(Color::white()),
            dash: None,
        };
        let ops = as_text(rect_operators(10.0, 20.0, 30.0, 40.0, 0.0, &style));
        assert!(ops.contains("10.000 20.000 30.000 40.000 re"));
        assert!(ops.contains("\nB\n"));
    }

    #[test]
    fn test_rounded_rect_uses_curves() {
        let ops = as_text(rect_operators(
            0.0,
            0.0,
            30.0,
            20.0,
            4.0,
            &PathStyle::filled(Color::black()),
        ));
        assert_eq!(ops.matches(" c\n").count(), 4);
        assert!(ops.contains("\nf\n"));
    }

    #[test]
    fn test_ellipse_operators() {
        let ops = as_text(ellipse_operators(
            0.0,
            0.0,
            20.0,
            10.0,
            &PathStyle::stroked(Color::black(), 1.0),
        ));
        assert!(ops.contains("20.000 5.000 m"));
        assert_eq!(ops.matches(" c\n").count(), 4);
        assert!(ops.contains("\nS\n"));
    }

    #[test]
    fn test_dash_pattern() {
        let style = PathStyle {
            stroke: Some(Color::black()),
            line_width: 1.0,
            fill: None,
            dash: Some(vec![3.0, 2.0]),
        };
        let ops = as_text(rect_operators(0.0, 0.0, 5.0, 5.0, 0.0, &style));
        assert!(ops.contains("[3.000 2.000] 0 d"));
    }
}
