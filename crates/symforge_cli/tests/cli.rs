use std::path::Path;
use std::process::Command;

use symforge_font::synth::SynthFont;

fn write_inputs(dir: &Path) {
    for name in ["c64l.png", "c64u.png", "c64e1.png", "c64e2.png"] {
        image::RgbaImage::from_pixel(271, 271, image::Rgba([255, 255, 255, 255]))
            .save(dir.join(name))
            .unwrap();
    }
    std::fs::write(dir.join("tui.txt"), "AB─\n\n😀 ⭐\n").unwrap();
    std::fs::write(dir.join("3500C.txt"), "中\n文\n").unwrap();
    let font = SynthFont::new(1000, 800, -200)
        .rect('M', 500, 50, 0, 450, 700)
        .rect('A', 500, 50, 0, 450, 700)
        .rect('B', 500, 50, 0, 450, 700)
        .rect('─', 500, 0, 300, 500, 400)
        .rect('中', 1000, 50, -100, 950, 750)
        .rect('😀', 1000, 50, -100, 950, 750)
        .blank(' ', 500)
        .build();
    std::fs::write(dir.join("synth.ttf"), font).unwrap();
}

#[test]
fn builds_atlas_and_symbol_map() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path());
    let font = dir.path().join("synth.ttf");
    let out = dir.path().join("out");
    let status = Command::new(env!("CARGO_BIN_EXE_symforge"))
        .arg("--size")
        .arg("4096")
        .arg("--inputs")
        .arg(dir.path())
        .arg("--output")
        .arg(&out)
        .arg("--font")
        .arg(&font)
        .arg("--cjk-font")
        .arg(&font)
        .arg("--emoji-font")
        .arg(&font)
        .status()
        .unwrap();
    assert!(status.success());

    let atlas = image::open(out.join("symbols.png")).unwrap().to_rgba8();
    assert_eq!(atlas.dimensions(), (4096, 4096));
    // white sprite sheets fill the first 1024 sprite slots
    assert_eq!(atlas.get_pixel(0, 0).0, [255, 255, 255, 255]);

    let json = std::fs::read_to_string(out.join("symbol_map.json")).unwrap();
    assert!(json.contains("\"symbols\": \" AB─\""));
    assert!(json.contains("\"cjk_base\": 44288"));
    assert!(json.contains("\"中\""));
}

#[test]
fn bad_size_fails_with_a_message() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_symforge"))
        .arg("--size")
        .arg("1000")
        .arg("--inputs")
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("1000"));
}
