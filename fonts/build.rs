use std::env;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use zip::ZipArchive;

const ZIP_URL: &str =
    "https://github.com/adobe-fonts/source-han-sans/releases/download/2.005R/09_SourceHanSansSC.zip";
const ZIP_ENTRY: &str = "SourceHanSansSC-Regular.otf";

// Tried when neither FONT_TTF nor the download is available.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=FONT_TTF");
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("cargo sets OUT_DIR"));
    let target = out_dir.join("label-font");

    // Incremental build with a font already in place
    if fs::metadata(&target).is_ok_and(|m| m.len() > 0) {
        return;
    }

    let bytes = from_env()
        .or_else(|| download(&out_dir))
        .or_else(from_system)
        .unwrap_or_else(|| {
            println!(
                "cargo:warning=no label font found; set FONT_TTF to embed one, region numbers fall back to system fonts"
            );
            Vec::new()
        });
    fs::write(&target, bytes).expect("write label font");
}

fn from_env() -> Option<Vec<u8>> {
    let path = env::var("FONT_TTF").ok()?;
    match fs::read(&path) {
        Ok(b) => Some(b),
        Err(e) => {
            println!("cargo:warning=failed to read FONT_TTF {path}: {e}");
            None
        }
    }
}

fn from_system() -> Option<Vec<u8>> {
    SYSTEM_FONTS
        .iter()
        .map(Path::new)
        .find(|p| p.is_file())
        .and_then(|p| fs::read(p).ok())
}

// Pinned release zip, fetched with curl or wget, then the Regular OTF is
// extracted.
fn download(out_dir: &Path) -> Option<Vec<u8>> {
    let zip_path = out_dir.join("SourceHanSansSC.zip");
    let zip_str = zip_path.to_str()?;
    let fetched = Command::new("curl")
        .args(["-L", "-f", "--max-time", "120", "-o", zip_str, ZIP_URL])
        .status()
        .is_ok_and(|s| s.success())
        || Command::new("wget")
            .args(["-T", "120", "-O", zip_str, ZIP_URL])
            .status()
            .is_ok_and(|s| s.success());
    if !fetched {
        return None;
    }

    let mut data = Vec::new();
    fs::File::open(&zip_path).ok()?.read_to_end(&mut data).ok()?;
    let mut zip = ZipArchive::new(std::io::Cursor::new(data)).ok()?;
    for i in 0..zip.len() {
        let mut file = zip.by_index(i).ok()?;
        if file.name().ends_with(ZIP_ENTRY) {
            let mut buf = Vec::new();
            std::io::copy(&mut file, &mut buf).ok()?;
            return Some(buf);
        }
    }
    println!("cargo:warning={ZIP_ENTRY} not found in {ZIP_URL}");
    None
}
