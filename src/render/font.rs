//! TrueType font lookup and registration for chart text.
//!
//! Plotters is built with the `ab_glyph` text backend, which draws nothing
//! until a font is registered. Registration is process-wide: the first font
//! that loads wins, and a failed attempt leaves the slot open for a later one.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::style::{FontStyle, register_font};
use tracing::{debug, warn};

/// Family name charts ask for.
pub const FONT_FAMILY: &str = "sans-serif";

const WELL_KNOWN_FONTS: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<PathBuf> = OnceLock::new();

/// First well-known system font that exists on this machine.
pub fn discover_font() -> Option<PathBuf> {
    WELL_KNOWN_FONTS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Make `font` available to Plotters; returns whether text can be drawn.
pub fn enable_text(font: Option<&Path>) -> bool {
    let Some(font) = font else {
        return false;
    };

    if let Some(active) = REGISTERED.get() {
        if active != font {
            debug!(requested = %font.display(), active = %active.display(), "font already registered");
        }
        return true;
    }

    match register(font) {
        Some(path) => {
            // A concurrent registration may have won; either font is usable.
            let _ = REGISTERED.set(path);
            true
        }
        None => false,
    }
}

fn register(path: &Path) -> Option<PathBuf> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            warn!(font = %path.display(), error = %e, "failed to read font; charts will have no text");
            return None;
        }
    };

    // Plotters keeps a reference for the rest of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
        Ok(()) => {
            debug!(font = %path.display(), "registered chart font");
            Some(path.to_path_buf())
        }
        Err(_) => {
            warn!(font = %path.display(), "not a usable TrueType font; charts will have no text");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_font_means_no_text() {
        assert!(!enable_text(None));
    }

    #[test]
    fn unreadable_font_does_not_block_a_later_one() {
        assert!(!enable_text(Some(Path::new("/nonexistent/covplot-font.ttf"))));
        assert!(REGISTERED.get().is_none());

        if let Some(font) = discover_font() {
            assert!(enable_text(Some(&font)));
            assert_eq!(REGISTERED.get(), Some(&font));
        }
    }

    #[test]
    fn discovered_font_is_an_existing_file() {
        if let Some(path) = discover_font() {
            assert!(path.is_file());
        }
    }
}
