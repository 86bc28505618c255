use crate::kernel::{Sketch, SketchCut};
use crate::types::Drawing;
use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;

/// Bulge for a 90 degree arc, tan(22.5deg).
const QUARTER_BULGE: f64 = 0.414213562;

/// Convert a plate sketch to a DXF drawing.
///
/// DXF is y-up, so sketch y values are negated.
pub fn post_process_dxf(sketch: &Sketch) -> Drawing {
    let mut lines = Vec::new();

    // Header
    push_pair(&mut lines, 0, "SECTION");
    push_pair(&mut lines, 2, "HEADER");
    push_pair(&mut lines, 9, "$ACADVER");
    push_pair(&mut lines, 1, "AC1009");
    push_pair(&mut lines, 9, "$INSUNITS");
    push_pair(&mut lines, 70, "4"); // Millimetres
    push_pair(&mut lines, 0, "ENDSEC");

    push_pair(&mut lines, 0, "SECTION");
    push_pair(&mut lines, 2, "ENTITIES");

    push_outline(&mut lines, sketch);
    for cut in &sketch.cuts {
        match cut {
            SketchCut::Polygon(points) => {
                let open = &points[..points.len().saturating_sub(1)];
                let vertices: Vec<(f64, f64, f64)> =
                    open.iter().map(|&(x, y)| (x, -y, 0.0)).collect();
                push_lwpolyline(&mut lines, &vertices);
            }
            SketchCut::Circle { center, diameter } => {
                push_pair(&mut lines, 0, "CIRCLE");
                push_pair(&mut lines, 8, "0");
                push_pair(&mut lines, 10, &format!("{:.6}", center.0));
                push_pair(&mut lines, 20, &format!("{:.6}", -center.1));
                push_pair(&mut lines, 40, &format!("{:.6}", diameter / 2.0));
            }
        }
    }

    push_pair(&mut lines, 0, "ENDSEC");
    push_pair(&mut lines, 0, "EOF");

    Drawing { lines }
}

fn push_pair(lines: &mut Vec<String>, code: u16, value: &str) {
    lines.push(code.to_string());
    lines.push(value.to_string());
}

/// Closed polyline; each vertex is (x, y, bulge to the next vertex).
fn push_lwpolyline(lines: &mut Vec<String>, vertices: &[(f64, f64, f64)]) {
    push_pair(lines, 0, "LWPOLYLINE");
    push_pair(lines, 8, "0");
    push_pair(lines, 90, &vertices.len().to_string());
    push_pair(lines, 70, "1");
    for &(x, y, bulge) in vertices {
        push_pair(lines, 10, &format!("{x:.6}"));
        push_pair(lines, 20, &format!("{y:.6}"));
        if bulge != 0.0 {
            push_pair(lines, 42, &format!("{bulge:.9}"));
        }
    }
}

/// Plate boundary, with rounded corners when the sketch was filleted.
fn push_outline(lines: &mut Vec<String>, sketch: &Sketch) {
    let (x1, y1) = (-sketch.width / 2.0, -sketch.height / 2.0);
    let (x2, y2) = (sketch.width / 2.0, sketch.height / 2.0);
    let r = sketch.corner_radius;

    let vertices = if r > 0.0 {
        vec![
            (x1 + r, y1, 0.0),
            (x2 - r, y1, QUARTER_BULGE),
            (x2, y1 + r, 0.0),
            (x2, y2 - r, QUARTER_BULGE),
            (x2 - r, y2, 0.0),
            (x1 + r, y2, QUARTER_BULGE),
            (x1, y2 - r, 0.0),
            (x1, y1 + r, QUARTER_BULGE),
        ]
    } else {
        vec![(x1, y1, 0.0), (x2, y1, 0.0), (x2, y2, 0.0), (x1, y2, 0.0)]
    };
    push_lwpolyline(lines, &vertices);
}

/// Render a plate sketch as an SVG document sized in millimetres.
pub fn post_process_svg(sketch: &Sketch) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .context("write svg declaration")?;

    let width = format!("{:.4}", sketch.width);
    let height = format!("{:.4}", sketch.height);
    let view_box = format!(
        "{:.4} {:.4} {width} {height}",
        -sketch.width / 2.0,
        -sketch.height / 2.0
    );
    let mut root = BytesStart::new("svg");
    root.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
    root.push_attribute(("width", format!("{width}mm").as_str()));
    root.push_attribute(("height", format!("{height}mm").as_str()));
    root.push_attribute(("viewBox", view_box.as_str()));
    writer
        .write_event(Event::Start(root))
        .context("open svg element")?;

    let mut group = BytesStart::new("g");
    group.push_attribute(("fill", "none"));
    group.push_attribute(("stroke", "#000000"));
    group.push_attribute(("stroke-width", "0.1"));
    writer
        .write_event(Event::Start(group))
        .context("open svg group")?;

    let radius = format!("{:.4}", sketch.corner_radius);
    let mut outline = BytesStart::new("rect");
    outline.push_attribute(("x", format!("{:.4}", -sketch.width / 2.0).as_str()));
    outline.push_attribute(("y", format!("{:.4}", -sketch.height / 2.0).as_str()));
    outline.push_attribute(("width", width.as_str()));
    outline.push_attribute(("height", height.as_str()));
    outline.push_attribute(("rx", radius.as_str()));
    outline.push_attribute(("ry", radius.as_str()));
    writer
        .write_event(Event::Empty(outline))
        .context("write plate outline")?;

    for cut in &sketch.cuts {
        let element = match cut {
            SketchCut::Polygon(points) => {
                let points = points
                    .iter()
                    .map(|(x, y)| format!("{x:.4},{y:.4}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                let mut polygon = BytesStart::new("polygon");
                polygon.push_attribute(("points", points.as_str()));
                polygon
            }
            SketchCut::Circle { center, diameter } => {
                let mut circle = BytesStart::new("circle");
                circle.push_attribute(("cx", format!("{:.4}", center.0).as_str()));
                circle.push_attribute(("cy", format!("{:.4}", center.1).as_str()));
                circle.push_attribute(("r", format!("{:.4}", diameter / 2.0).as_str()));
                circle
            }
        };
        writer
            .write_event(Event::Empty(element))
            .context("write cutout")?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("g")))
        .context("close svg group")?;
    writer
        .write_event(Event::End(BytesEnd::new("svg")))
        .context("close svg element")?;

    String::from_utf8(writer.into_inner()).context("svg output is not UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rect_points;

    fn sketch() -> Sketch {
        Sketch {
            width: 40.0,
            height: 20.0,
            thickness: 1.5,
            corner_radius: 0.0,
            cursor: (0.0, 0.0),
            cuts: vec![
                SketchCut::Polygon(rect_points((-7.0, -7.0), (7.0, 7.0))),
                SketchCut::Circle {
                    center: (10.0, 5.0),
                    diameter: 3.0,
                },
            ],
        }
    }

    #[test]
    fn test_dxf_structure() {
        let drawing = post_process_dxf(&sketch());

        assert_eq!(drawing.lines[0], "0", "Should open with a group code");
        assert_eq!(drawing.lines[1], "SECTION", "Should open a section");
        assert_eq!(drawing.lines.last().map(String::as_str), Some("EOF"));
        let polylines = drawing.lines.iter().filter(|l| *l == "LWPOLYLINE").count();
        assert_eq!(polylines, 2, "Outline plus one cutout");
        assert!(drawing.lines.iter().any(|l| l == "CIRCLE"));
        assert!(drawing.lines.iter().any(|l| l == "1.500000"), "Circle radius");
        assert!(drawing.lines.iter().any(|l| l == "-5.000000"), "Y is flipped");
    }

    #[test]
    fn test_dxf_cutout_drops_closing_vertex() {
        let drawing = post_process_dxf(&sketch());
        let second = drawing
            .lines
            .iter()
            .enumerate()
            .filter(|(_, l)| *l == "LWPOLYLINE")
            .nth(1)
            .map(|(i, _)| i)
            .expect("cutout polyline");
        // 0/LWPOLYLINE, 8/0, 90/count
        assert_eq!(drawing.lines[second + 3], "90");
        assert_eq!(drawing.lines[second + 4], "4");
    }

    #[test]
    fn test_dxf_filleted_outline_has_bulges() {
        let mut rounded = sketch();
        rounded.corner_radius = 2.0;
        let drawing = post_process_dxf(&rounded);
        let bulges = drawing.lines.iter().filter(|l| *l == "42").count();
        assert_eq!(bulges, 4);
    }

    #[test]
    fn test_svg_document() {
        let svg = post_process_svg(&sketch()).expect("render svg");
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("viewBox=\"-20.0000 -10.0000 40.0000 20.0000\""));
        assert!(svg.contains("width=\"40.0000mm\""));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("<circle cx=\"10.0000\" cy=\"5.0000\" r=\"1.5000\"/>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
