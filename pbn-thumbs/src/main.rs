use std::env;
use std::error::Error;
use std::fs;
use std::path::Path;

use pbn_core::{FillState, RegionMap, VectorArt};
use pbn_render::{Theme, label_options, picture_svg, render_png};

const DEFAULT_MAX_SIDE: u32 = 480;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: pbn-thumbs <assets_dir> <output_dir> [max_side_px]");
        std::process::exit(2);
    }
    let assets = Path::new(&args[1]);
    let out = Path::new(&args[2]);
    let max_side: u32 = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_SIDE);
    fs::create_dir_all(out)?;

    let opt = label_options(true);

    let mut written = 0;
    for name in picture_names(assets)? {
        match render_picture(assets, out, &name, max_side, &opt) {
            Ok(()) => written += 1,
            Err(e) => log::warn!("skipping {name}: {e}"),
        }
    }
    log::info!("wrote previews for {written} pictures to {}", out.display());
    Ok(())
}

/// Base names that have both a region map and vector art.
fn picture_names(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if !path.with_extension("svg").is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}

// Writes <name>-blank.png (as the user first sees it) and <name>-solved.png.
fn render_picture(
    assets: &Path,
    out: &Path,
    name: &str,
    max_side: u32,
    opt: &usvg::Options,
) -> Result<(), Box<dyn Error>> {
    let map = RegionMap::from_json(&fs::read(assets.join(format!("{name}.json")))?)?;
    let art = VectorArt::from_bytes(fs::read(assets.join(format!("{name}.svg")))?)?;
    let theme = Theme::default();
    let mut fill = FillState::new(map);

    let blank = render_png(&picture_svg(&art, &fill, &theme), max_side, opt)?;
    fs::write(out.join(format!("{name}-blank.png")), blank)?;

    fill.fill_all();
    let solved = render_png(&picture_svg(&art, &fill, &theme), max_side, opt)?;
    fs::write(out.join(format!("{name}-solved.png")), solved)?;
    log::debug!("{name}: {} regions", fill.region_map().shape_count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"[{"color": "(0, 0, 0)", "shapes": ["0"]}, {"color": "(9, 200, 9)", "shapes": ["1"]}]"#;
    const ART: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 8 4"><g id="0"><rect width="4" height="4"/></g><g id="1"><rect x="4" width="4" height="4"/></g></svg>"#;

    #[test]
    fn finds_complete_pairs_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("panda.json"), MAP).unwrap();
        fs::write(dir.path().join("panda.svg"), ART).unwrap();
        fs::write(dir.path().join("lonely.json"), MAP).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert_eq!(picture_names(dir.path()).unwrap(), vec!["panda".to_string()]);
    }

    #[test]
    fn writes_blank_and_solved_previews() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(dir.path().join("flower.json"), MAP).unwrap();
        fs::write(dir.path().join("flower.svg"), ART).unwrap();

        render_picture(dir.path(), &out, "flower", 16, &label_options(true)).unwrap();
        let blank = fs::read(out.join("flower-blank.png")).unwrap();
        let solved = fs::read(out.join("flower-solved.png")).unwrap();
        assert_eq!(&blank[1..4], b"PNG");
        assert_ne!(blank, solved);
    }

    #[test]
    fn broken_maps_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{").unwrap();
        fs::write(dir.path().join("bad.svg"), ART).unwrap();
        assert!(render_picture(dir.path(), dir.path(), "bad", 16, &usvg::Options::default()).is_err());
    }
}
