//! Encapsulated PostScript backend.
//!
//! PostScript has y growing upwards, so every coordinate is flipped against
//! the page height. Text alignment is left to the interpreter through
//! `stringwidth`, which measures the real Helvetica glyphs.

use crate::layout::{Element, Scene};
use crate::style::Rgb;

/// Escape a string for a PostScript/PDF literal; non-ASCII becomes '?'.
fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Colour components as `r g b` in [0, 1].
fn color_operands((r, g, b): Rgb) -> String {
    format!(
        "{:.4} {:.4} {:.4}",
        r as f64 / 255.0,
        g as f64 / 255.0,
        b as f64 / 255.0
    )
}

fn font_name(bold: bool) -> &'static str {
    if bold {
        "Helvetica-Bold"
    } else {
        "Helvetica"
    }
}

/// Serialize `scene` as a single-page EPS document.
pub fn render_eps(scene: &Scene) -> String {
    let (w, h) = (scene.width, scene.height);
    let mut ps = String::new();
    ps.push_str("%!PS-Adobe-3.0 EPSF-3.0\n");
    ps.push_str(&format!(
        "%%BoundingBox: 0 0 {} {}\n",
        w.ceil() as i64,
        h.ceil() as i64
    ));
    ps.push_str(&format!("%%HiResBoundingBox: 0 0 {w:.3} {h:.3}\n"));
    ps.push_str("%%Creator: recovery_heatmap\n");
    ps.push_str("%%Pages: 1\n");
    ps.push_str("%%EndComments\n");

    ps.push_str(&format!(
        "{} setrgbcolor 0 0 {w:.3} {h:.3} rectfill\n",
        color_operands(scene.background)
    ));

    for element in &scene.elements {
        match element {
            Element::Rect(r) => {
                ps.push_str(&format!(
                    "{} setrgbcolor {:.3} {:.3} {:.3} {:.3} rectfill\n",
                    color_operands(r.fill),
                    r.x,
                    h - r.y - r.h,
                    r.w,
                    r.h
                ));
            }
            Element::Text(t) => {
                let (x, y) = t.baseline_anchor();
                ps.push_str(&format!(
                    "/{} findfont {} scalefont setfont {} setrgbcolor\n",
                    font_name(t.bold),
                    t.size,
                    color_operands(t.color)
                ));
                ps.push_str(&format!("gsave {:.3} {:.3} translate", x, h - y));
                if t.vertical {
                    ps.push_str(" 90 rotate");
                }
                ps.push_str(&format!(" 0 0 moveto ({})", escape_string(&t.text)));
                let fraction = t.along.fraction();
                if fraction > 0.0 {
                    ps.push_str(&format!(" dup stringwidth pop {fraction} mul neg 0 rmoveto"));
                }
                ps.push_str(" show grestore\n");
            }
        }
    }

    ps.push_str("showpage\n%%EOF\n");
    ps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontMetrics;
    use crate::layout::{Align, Text};

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string(r"a(b)\c"), r"a\(b\)\\c");
        assert_eq!(escape_string("gène"), "g?ne");
    }

    #[test]
    fn test_eps_document() {
        let mut scene = Scene::new(100.5, 50.0, (255, 255, 255));
        scene.rect(10.0, 5.0, 20.0, 10.0, (0, 0, 0));
        scene.text(Text {
            text: "geneA".into(),
            x: 20.0,
            y: 40.0,
            size: 10.0,
            bold: false,
            vertical: true,
            along: Align::End,
            across: Align::Middle,
            color: (38, 38, 38),
            metrics: FontMetrics::Helvetica,
        });
        let eps = render_eps(&scene);
        assert!(eps.starts_with("%!PS-Adobe-3.0 EPSF-3.0\n"));
        assert!(eps.contains("%%BoundingBox: 0 0 101 50\n"));
        // y is flipped: top 5 with height 10 on a 50 pt page
        assert!(eps.contains("0.0000 0.0000 0.0000 setrgbcolor 10.000 35.000 20.000 10.000 rectfill"));
        assert!(eps.contains("/Helvetica findfont 10 scalefont setfont"));
        assert!(eps.contains("90 rotate"));
        assert!(eps.contains("(geneA) dup stringwidth pop 1 mul neg 0 rmoveto show"));
        assert!(eps.ends_with("%%EOF\n"));
    }
}
