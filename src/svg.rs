use crate::layout::{Align, Element, Scene};

/// Escape special XML characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Serialize `scene` as an SVG document sized in points.
pub fn render_svg(scene: &Scene) -> String {
    let (w, h) = (scene.width, scene.height);
    let (br, bg, bb) = scene.background;
    let mut svg = String::new();

    svg.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w:.2}pt" height="{h:.2}pt" viewBox="0 0 {w:.2} {h:.2}">
<style>
  text {{ font-family: Helvetica, Arial, 'Liberation Sans', sans-serif; }}
</style>
<rect width="100%" height="100%" fill="rgb({br},{bg},{bb})"/>
"#
    ));

    for element in &scene.elements {
        match element {
            Element::Rect(r) => {
                let (cr, cg, cb) = r.fill;
                svg.push_str(&format!(
                    r#"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="rgb({},{},{})"/>"#,
                    r.x, r.y, r.w, r.h, cr, cg, cb
                ));
            }
            Element::Text(t) => {
                let (x, y) = t.baseline_anchor();
                let anchor = match t.along {
                    Align::Start => "start",
                    Align::Middle => "middle",
                    Align::End => "end",
                };
                let weight = if t.bold { r#" font-weight="bold""# } else { "" };
                let rotate = if t.vertical {
                    format!(r#" transform="rotate(-90 {x:.3} {y:.3})""#)
                } else {
                    String::new()
                };
                let (cr, cg, cb) = t.color;
                svg.push_str(&format!(
                    r#"<text x="{:.3}" y="{:.3}" font-size="{}"{} text-anchor="{}" fill="rgb({},{},{})"{}>{}</text>"#,
                    x, y, t.size, weight, anchor, cr, cg, cb, rotate, escape_xml(&t.text)
                ));
            }
        }
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}
