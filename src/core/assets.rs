//! Bundled template assets.
//!
//! The `template/` directory is baked into the binary so that a fresh install
//! can scaffold a project without any external files. A project can replace
//! it wholesale with a local `.sop-engine/` directory (see
//! [`crate::core::config::resolve_source`]).

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "template/"]
#[exclude = "*.DS_Store"]
#[exclude = "*~"]
struct BundledTemplate;

/// All bundled template paths, `/`-separated and sorted.
pub fn list_template_files() -> Vec<String> {
    let mut files: Vec<String> = BundledTemplate::iter().map(|p| p.into_owned()).collect();
    files.sort();
    files
}

pub fn get_template_file(path: &str) -> Option<Vec<u8>> {
    BundledTemplate::get(path).map(|file| file.data.into_owned())
}

pub fn get_template_text(path: &str) -> Option<String> {
    get_template_file(path).and_then(|bytes| String::from_utf8(bytes).ok())
}
