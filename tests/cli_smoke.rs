use std::path::PathBuf;

use scrawl::{CanvasSize, InputEvent, StrokeStyle, Trace};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_scrawl")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) { "scrawl.exe" } else { "scrawl" });
            p
        })
}

fn write_trace(dir: &std::path::Path) -> PathBuf {
    let mut events = vec![InputEvent::Began {
        x: 4.0,
        y: 32.0,
        t: 0.0,
    }];
    for i in 1..=8 {
        events.push(InputEvent::Moved {
            x: 4.0 + i as f64 * 6.0,
            y: 32.0,
            t: i as f64 * 0.02,
        });
    }
    events.push(InputEvent::Ended);

    let trace = Trace {
        canvas: CanvasSize::new(64, 64).unwrap(),
        style: StrokeStyle::default(),
        config: None,
        events,
    };
    let path = dir.join("trace.json");
    let f = std::fs::File::create(&path).unwrap();
    serde_json::to_writer_pretty(f, &trace).unwrap();
    path
}

#[test]
fn cli_render_writes_png() {
    let dir = PathBuf::from("target").join("cli_smoke_render");
    std::fs::create_dir_all(&dir).unwrap();
    let trace_path = write_trace(&dir);
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);

    let status = std::process::Command::new(exe())
        .args(["render", "--in"])
        .arg(&trace_path)
        .arg("--out")
        .arg(&out_path)
        .args(["--color", "ffffff"])
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (64, 64));
    assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
}

#[test]
fn cli_segments_prints_json() {
    let dir = PathBuf::from("target").join("cli_smoke_segments");
    std::fs::create_dir_all(&dir).unwrap();
    let trace_path = write_trace(&dir);

    let output = std::process::Command::new(exe())
        .args(["segments", "--in"])
        .arg(&trace_path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let segments: Vec<scrawl::PathSegment> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(segments.len(), 2);
    assert!(segments.iter().all(|s| s.as_bezier().is_some()));
}

#[test]
fn cli_rejects_missing_trace() {
    let status = std::process::Command::new(exe())
        .args(["segments", "--in", "target/does-not-exist.json"])
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap();
    assert!(!status.success());
}
