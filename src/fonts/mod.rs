//! Font discovery for invoice rendering.
//!
//! `genpdf` embeds TrueType fonts, so a complete family (regular, bold, italic
//! and bold italic) has to be found on disk before a document can be built.
//! The bundled family is searched for first; when it is missing a system
//! family is used instead.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Environment variable pointing at a directory with the bundled family.
pub const FONTS_DIR_ENV: &str = "INVOICE_FONTS_DIR";

/// Environment variable pointing at a directory with the system fallback family.
pub const SYSTEM_FONTS_DIR_ENV: &str = "INVOICE_SYSTEM_FONTS_DIR";

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

const BUNDLED_FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

/// File names of one system font family.
struct SystemFamily {
    name: &'static str,
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
    directories: &'static [&'static str],
}

const SYSTEM_FAMILIES: &[SystemFamily] = &[
    SystemFamily {
        name: "Liberation Sans",
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
        directories: &[
            "/usr/share/fonts/truetype/liberation",
            "/usr/share/fonts/truetype/liberation2",
            "/usr/share/fonts/liberation-sans",
            "/usr/share/fonts/TTF",
        ],
    },
    SystemFamily {
        name: "DejaVu Sans",
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
        italic: "DejaVuSans-Oblique.ttf",
        bold_italic: "DejaVuSans-BoldOblique.ttf",
        directories: &["/usr/share/fonts/truetype/dejavu", "/usr/share/fonts/TTF"],
    },
    SystemFamily {
        name: "Arial",
        regular: "arial.ttf",
        bold: "arialbd.ttf",
        italic: "ariali.ttf",
        bold_italic: "arialbi.ttf",
        directories: &[],
    },
];

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

/// Returns the crate's own `assets/fonts` directory.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn bundled_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        candidates.push(path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            candidates.push(bin_dir.join("assets/fonts"));
        }
    }

    candidates.push(bundled_fonts_source_dir());
    candidates.dedup();
    candidates
}

fn missing_files(directory: &Path, files: &[&str]) -> Vec<String> {
    files
        .iter()
        .filter(|name| !directory.join(name).is_file())
        .map(|name| name.to_string())
        .collect()
}

fn resolve_bundled_directory() -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in bundled_directory_candidates() {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }
        let missing = missing_files(&candidate, BUNDLED_FONT_FILES);
        if missing.is_empty() {
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    Err(Error::new(
        format!(
            "Unable to locate the {} font family. Checked: {}. See assets/fonts/README.md or set {}.",
            DEFAULT_FONT_FAMILY_NAME,
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts directory not found"),
    ))
}

fn load_bundled_family() -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_bundled_directory()?;
    debug!(
        "fonts: loading {} from {}",
        DEFAULT_FONT_FAMILY_NAME,
        directory.display()
    );

    fonts::from_files(&directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                DEFAULT_FONT_FAMILY_NAME,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn system_directories(family: &SystemFamily) -> Vec<PathBuf> {
    let mut directories = Vec::new();

    if let Some(path) = env_path(SYSTEM_FONTS_DIR_ENV) {
        directories.push(path);
    }

    directories.extend(family.directories.iter().map(PathBuf::from));

    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(root) = env_path(var) {
                directories.push(root.join("Fonts"));
            }
        }
    }

    directories
}

fn load_font_file(directory: &Path, file: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        Error::new(
            format!("Failed to load font {}: {}", path.display(), err),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn load_system_family() -> Result<(FontFamily<FontData>, &'static str), Error> {
    for family in SYSTEM_FAMILIES {
        let files = [family.regular, family.bold, family.italic, family.bold_italic];
        let Some(directory) = system_directories(family)
            .into_iter()
            .find(|directory| missing_files(directory, &files).is_empty())
        else {
            continue;
        };

        let loaded = FontFamily {
            regular: load_font_file(&directory, family.regular)?,
            bold: load_font_file(&directory, family.bold)?,
            italic: load_font_file(&directory, family.italic)?,
            bold_italic: load_font_file(&directory, family.bold_italic)?,
        };
        return Ok((loaded, family.name));
    }

    Err(Error::new(
        "No system font family found for fallback",
        io::Error::new(io::ErrorKind::NotFound, "system fonts not found"),
    ))
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Returns the bundled font family, falling back to a system family when the
/// bundled files are missing.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    match load_bundled_family() {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => match load_system_family() {
            Ok((family, name)) => {
                warn!("{}; falling back to system '{}' family.", err, name);
                Ok(family)
            }
            Err(fallback_err) => {
                warn!("{}; system fallback failed: {}", err, fallback_err);
                Err(Error::new(
                    format!(
                        "Bundled fonts unavailable and system fallback failed: {}",
                        fallback_err
                    ),
                    io::Error::new(io::ErrorKind::NotFound, "invoice fonts are not available"),
                ))
            }
        },
        Err(err) => Err(err),
    }
}

/// Indicates whether any usable font family can be found.
pub fn fonts_available() -> bool {
    resolve_bundled_directory().is_ok()
        || SYSTEM_FAMILIES.iter().any(|family| {
            let files = [family.regular, family.bold, family.italic, family.bold_italic];
            system_directories(family)
                .iter()
                .any(|directory| missing_files(directory, &files).is_empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_lists_absent_names() {
        let directory = Path::new("/__invoice_missing_fonts__");
        let missing = missing_files(directory, BUNDLED_FONT_FILES);
        assert_eq!(missing.len(), BUNDLED_FONT_FILES.len());
    }

    #[test]
    fn manifest_directory_is_searched_last() {
        let candidates = bundled_directory_candidates();
        assert_eq!(candidates.last(), Some(&bundled_fonts_source_dir()));
    }
}
