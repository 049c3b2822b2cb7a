use std::fs;
use std::path::{Path, PathBuf};

use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use tracing::info;

use crate::core::models::{UserRecord, UserTable};
use crate::error::{QrRedirectError, Result};

#[derive(Debug, Clone)]
pub struct QrOptions {
    pub base_url: String,
    pub min_size: u32,
    pub dark_color: String,
    pub light_color: String,
}

impl QrOptions {
    pub fn new(base_url: impl Into<String>, min_size: u32) -> Self {
        Self {
            base_url: base_url.into(),
            min_size,
            dark_color: "#000000".to_string(),
            light_color: "#FFFFFF".to_string(),
        }
    }
}

/// `<base_url>/<hash>/`, the path the resolver is routed on.
pub fn payload_url(base_url: &str, hash: &str) -> String {
    format!("{}/{}/", base_url.trim_end_matches('/'), hash)
}

/// `<hash>_<name>.svg` with whitespace runs in the name collapsed to `_`.
pub fn file_name(record: &UserRecord) -> String {
    let name = record.name.split_whitespace().collect::<Vec<_>>().join("_");
    if name.is_empty() {
        format!("{}.svg", record.hash)
    } else {
        format!("{}_{}.svg", record.hash, name)
    }
}

pub fn render_svg(payload: &str, options: &QrOptions) -> Result<String> {
    let code = QrCode::with_error_correction_level(payload, EcLevel::M)
        .map_err(|e| QrRedirectError::QrCode(e.to_string()))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(options.min_size, options.min_size)
        .dark_color(svg::Color(&options.dark_color))
        .light_color(svg::Color(&options.light_color))
        .build())
}

/// Write one SVG per record into `out_dir`. Returns the written paths.
pub fn generate_all(table: &UserTable, out_dir: &Path, options: &QrOptions) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;

    let mut written = Vec::with_capacity(table.len());
    for record in &table.records {
        let url = payload_url(&options.base_url, &record.hash);
        let svg = render_svg(&url, options)?;
        let path = out_dir.join(file_name(record));
        fs::write(&path, svg)?;
        info!(hash = %record.hash, url = %url, file = %path.display(), "generated QR code");
        written.push(path);
    }
    Ok(written)
}
