use kbplate::*;
use serde_json::json;
use std::fs;
use std::path::Path;

fn config_in(dir: &Path) -> BuilderConfig {
    BuilderConfig {
        export_dir: dir.to_path_buf(),
        ..BuilderConfig::default()
    }
}

fn request(value: serde_json::Value) -> BuildRequest {
    BuildRequest::from_value(value).expect("valid request")
}

fn count_lines(path: &Path, needle: &str) -> usize {
    fs::read_to_string(path)
        .expect("read export")
        .lines()
        .filter(|line| *line == needle)
        .count()
}

fn full_row() -> serde_json::Value {
    json!(["1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "-", "=", "[", "]", "\\"])
}

#[test]
fn test_plain_plate_exports_switch_layer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    let result = build(
        "plain",
        &request(json!({"layout": [full_row(), full_row()], "kerf": 0.2})),
        &config,
    )
    .expect("build");

    assert!((result.width - (15.0 * 19.05 + 0.2)).abs() < 1e-9);
    assert!(!result.has_layers);
    assert_eq!(result.plates, vec![Layer::Switch]);
    assert_eq!(result.exports.len(), 1);

    let dxf = dir.path().join("switch_plain.dxf");
    assert_eq!(count_lines(&dxf, "LWPOLYLINE"), 31, "outline plus 30 switches");
    assert_eq!(
        result.exports_for(Layer::Switch)[0].url,
        "/static/exports/switch_plain.dxf"
    );
}

#[test]
fn test_sandwich_exports_every_layer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    let result = build(
        "stack",
        &request(json!({
            "layout": [full_row(), full_row(), full_row()],
            "case-type": "sandwich",
            "mount-holes-num": 8,
            "mount-holes-size": 3,
            "width-padding": 10,
            "height-padding": 10,
            "fillet": 2
        })),
        &config,
    )
    .expect("build");

    assert!(result.has_layers);
    assert_eq!(
        result.plates,
        vec![Layer::Switch, Layer::Open, Layer::Closed, Layer::Bottom]
    );
    for layer in [Layer::Switch, Layer::Open, Layer::Closed, Layer::Bottom] {
        assert!(
            !result.exports_for(layer).is_empty(),
            "{layer} layer should be exported"
        );
    }

    let bottom = dir.path().join("bottom_stack.dxf");
    assert_eq!(count_lines(&bottom, "CIRCLE"), 8);
    assert_eq!(count_lines(&bottom, "LWPOLYLINE"), 1, "bottom has no switch cutouts");
    assert_eq!(count_lines(&bottom, "42"), 4, "filleted corners");

    let switch = dir.path().join("switch_stack.dxf");
    assert_eq!(count_lines(&switch, "CIRCLE"), 8);
    assert_eq!(count_lines(&switch, "LWPOLYLINE"), 46);

    let closed = dir.path().join("closed_stack.dxf");
    let open = dir.path().join("open_stack.dxf");
    assert_eq!(count_lines(&closed, "LWPOLYLINE"), 47);
    assert_eq!(count_lines(&open, "LWPOLYLINE"), 48);

    // Settings are only written for the switch layer.
    assert!(dir.path().join("switch_stack.json").exists());
    assert!(!dir.path().join("open_stack.json").exists());
    let settings: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.path().join("switch_stack.json")).expect("read"))
            .expect("settings json");
    assert_eq!(settings["case_type_and_holes"]["type"], "sandwich");
    assert_eq!(
        settings["case_type_and_holes"]["x_holes"].as_u64().unwrap_or(0)
            + settings["case_type_and_holes"]["y_holes"].as_u64().unwrap_or(0),
        2
    );
}

#[test]
fn test_sandwich_without_enough_holes_skips_bottom() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    let result = build(
        "few",
        &request(json!({
            "layout": [["A", "B"]],
            "case-type": "sandwich",
            "mount-holes-num": 2,
            "mount-holes-size": 3
        })),
        &config,
    )
    .expect("build");

    assert!(result.plates.contains(&Layer::Bottom));
    assert!(result.exports_for(Layer::Bottom).is_empty());
    assert!(!result.exports_for(Layer::Open).is_empty());
}

#[test]
fn test_poker_case_cuts_six_holes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    let result = build(
        "poker",
        &request(json!({
            "layout": [full_row(), full_row(), full_row(), full_row(), full_row()],
            "case-type": "poker",
            "mount-holes-size": 2.5
        })),
        &config,
    )
    .expect("build");

    assert!(!result.has_layers);
    let svg = fs::read_to_string(dir.path().join("switch_poker.svg")).expect("svg");
    assert_eq!(svg.matches("<circle").count(), 6);
    assert_eq!(svg.matches("<polygon").count(), 75 + 2);
}

#[test]
fn test_export_svg_false_drops_svg() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    let result = build(
        "nosvg",
        &request(json!({"layout": [["A"]], "export_svg": false})),
        &config,
    )
    .expect("build");

    assert!(!result.formats.contains(&ExportFormat::Svg));
    assert!(!dir.path().join("switch_nosvg.svg").exists());
}

#[test]
fn test_unsupported_formats_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = BuilderConfig {
        formats: vec![ExportFormat::Stl, ExportFormat::Stp, ExportFormat::Dxf],
        ..config_in(dir.path())
    };
    let result = build("mesh", &request(json!({"layout": [["A"]]})), &config).expect("build");

    let names: Vec<_> = result
        .exports_for(Layer::Switch)
        .iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, vec![ExportFormat::Dxf]);
    assert_eq!(result.formats.len(), 3, "requested formats are still reported");
}

#[test]
fn test_concurrent_builds_do_not_collide() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    let small = request(json!({"layout": [["A"]]}));
    let large = request(json!({"layout": [full_row()]}));

    let (a, b) = std::thread::scope(|scope| {
        let a = scope.spawn(|| build("aaaa", &small, &config));
        let b = scope.spawn(|| build("bbbb", &large, &config));
        (a.join().expect("thread a"), b.join().expect("thread b"))
    });
    let a = a.expect("build a");
    let b = b.expect("build b");

    assert!(a.width < b.width);
    assert_eq!(count_lines(&dir.path().join("switch_aaaa.dxf"), "LWPOLYLINE"), 2);
    assert_eq!(count_lines(&dir.path().join("switch_bbbb.dxf"), "LWPOLYLINE"), 16);
}

fn assert_close(actual: (f64, f64), expected: (f64, f64), what: &str) {
    assert!(
        (actual.0 - expected.0).abs() < 1e-9 && (actual.1 - expected.1).abs() < 1e-9,
        "{what}: expected {expected:?}, got {actual:?}"
    );
}

#[test]
fn test_sandwich_layer_outlines_land_in_place() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    let request = request(json!({
        "layout": [["A", "B", "C"]],
        "case-type": "sandwich",
        "mount-holes-num": 6,
        "mount-holes-size": 3,
        "width-padding": 10,
        "height-padding": 8,
        "kerf": 0.2
    }));
    let mut kernel = SketchKernel::new();
    let result = build_plate(&mut kernel, &config, "outline", &request).expect("build");

    let (w, h, k) = (result.width, result.height, 0.1);
    assert!((w - (3.0 * 19.05 + 20.0 + 0.2)).abs() < 1e-9);
    assert!((h - (19.05 + 16.0 + 0.2)).abs() < 1e-9);

    let sketches: Vec<&Sketch> = kernel.sketches().collect();
    assert_eq!(sketches.len(), 1, "only the final solid stays alive");
    let sketch = sketches[0];

    // Six holes: one extra on each long edge, walked clockwise from the top-left.
    let holes: Vec<((f64, f64), f64)> = sketch
        .cuts
        .iter()
        .filter_map(|cut| match cut {
            SketchCut::Circle { center, diameter } => Some((*center, *diameter)),
            SketchCut::Polygon(_) => None,
        })
        .collect();
    assert_eq!(holes.len(), 6);
    let x0 = -w / 2.0 + k + 5.0;
    let y0 = -h / 2.0 + k + 4.0;
    let x_gap = (w - 10.0 - 2.0 * k) / 2.0;
    let y_gap = h - 8.0 - 2.0 * k;
    let expected = [
        (x0 + x_gap, y0),
        (x0 + 2.0 * x_gap, y0),
        (x0 + 2.0 * x_gap, y0 + y_gap),
        (x0 + x_gap, y0 + y_gap),
        (x0, y0 + y_gap),
        (x0, y0),
    ];
    for (i, ((center, diameter), want)) in holes.iter().zip(expected).enumerate() {
        assert_close(*center, want, &format!("hole {i}"));
        assert!((diameter - 2.8).abs() < 1e-9, "hole {i} loses the kerf");
    }
    assert_close(holes[0].0, (0.0, -13.525), "first hole");

    let polygons: Vec<&Vec<(f64, f64)>> = sketch
        .cuts
        .iter()
        .filter_map(|cut| match cut {
            SketchCut::Polygon(points) => Some(points),
            SketchCut::Circle { .. } => None,
        })
        .collect();
    assert_eq!(polygons.len(), 3 + 2, "three switches, then closed and open outlines");

    let closed = bounding_box(polygons[3]).expect("closed outline");
    let half_w = w / 2.0 - 10.0 - 2.0 * k;
    let half_h = h / 2.0 - 8.0 - 2.0 * k;
    assert_close((closed.x0, closed.y0), (-half_w, -half_h), "closed outline min");
    assert_close((closed.x1, closed.y1), (half_w, half_h), "closed outline max");

    let slot = bounding_box(polygons[4]).expect("usb slot");
    assert_close((slot.center().x, slot.center().y), (0.0, -h / 2.0 + 4.0 + k), "slot centre");
    assert!((slot.width() - (10.0 - 2.0 * k)).abs() < 1e-9);
    assert!((slot.height() - (8.0 + 2.0 * k)).abs() < 1e-9);
    assert!((slot.y0 + h / 2.0).abs() < 1e-9, "slot opens onto the top edge");
}
