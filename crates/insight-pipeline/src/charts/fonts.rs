//! One-time font registration for chart text.

use once_cell::sync::OnceCell;
use plotters::style::{FontStyle, register_font};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Family name every text style in the renderer refers to.
pub(crate) const FONT_FAMILY: &str = "sans-serif";

static REGISTERED: OnceCell<Option<PathBuf>> = OnceCell::new();

/// Register the first readable font of `candidates`, once per process.
///
/// Returns whether a font is available. Later calls reuse the first result
/// regardless of their candidate list.
pub(crate) fn ensure_font(candidates: &[PathBuf]) -> bool {
    REGISTERED
        .get_or_init(|| register_first(candidates))
        .is_some()
}

fn register_first(candidates: &[PathBuf]) -> Option<PathBuf> {
    for path in candidates {
        if try_register(path) {
            debug!("Registered chart font {}", path.display());
            return Some(path.clone());
        }
    }

    warn!("No usable font found, charts will be drawn without text");
    None
}

fn try_register(path: &Path) -> bool {
    let Ok(bytes) = fs::read(path) else {
        return false;
    };

    // plotters keeps a reference for the lifetime of the process
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
        Ok(()) => true,
        Err(_) => {
            warn!("Ignoring unreadable font {}", path.display());
            false
        }
    }
}
