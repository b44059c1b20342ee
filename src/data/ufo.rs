//! UFO file I/O operations

use super::conversions::to_norad_font;
use crate::font::FontModel;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Write the font model as a UFO directory, replacing an existing one
pub fn save_ufo(model: &FontModel, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let font = to_norad_font(model);
    font.save(path)
        .with_context(|| format!("can't write UFO to {}", path.display()))?;
    info!(glyphs = model.glyphs.len(), "wrote {}", path.display());
    Ok(())
}
