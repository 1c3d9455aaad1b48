//! Font discovery for report rendering.
//!
//! `genpdf` embeds TrueType fonts, so a complete family (regular, bold, italic, bold italic) has
//! to be found on disk before a document can be built. Directories are searched in this order:
//!
//! 1. an explicit directory passed by the caller (the CLI's `--fonts-dir`),
//! 2. the directory named by [`FONTS_DIR_ENV`],
//! 3. `assets/fonts` next to the running executable,
//! 4. `assets/fonts` inside the crate,
//! 5. well-known system font directories.
//!
//! Inside each directory the families in [`KNOWN_FAMILIES`] are tried in order.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use log::{debug, warn};

/// Environment variable that points at a directory containing a font family.
pub const FONTS_DIR_ENV: &str = "SPIRE_DECK_FONTS_DIR";

/// File names of the four styles of a font family.
#[derive(Debug, Clone, Copy)]
pub struct FamilyFiles {
    pub name: &'static str,
    pub regular: &'static str,
    pub bold: &'static str,
    pub italic: &'static str,
    pub bold_italic: &'static str,
}

impl FamilyFiles {
    fn files(&self) -> [&'static str; 4] {
        [self.regular, self.bold, self.italic, self.bold_italic]
    }

    fn missing_in(&self, directory: &Path) -> Vec<&'static str> {
        self.files()
            .into_iter()
            .filter(|file| !directory.join(file).is_file())
            .collect()
    }
}

/// Families recognised in every searched directory, most preferred first.
pub const KNOWN_FAMILIES: &[FamilyFiles] = &[
    FamilyFiles {
        name: "Roboto",
        regular: "Roboto-Regular.ttf",
        bold: "Roboto-Bold.ttf",
        italic: "Roboto-Italic.ttf",
        bold_italic: "Roboto-BoldItalic.ttf",
    },
    FamilyFiles {
        name: "DejaVu Sans",
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
        italic: "DejaVuSans-Oblique.ttf",
        bold_italic: "DejaVuSans-BoldOblique.ttf",
    },
    FamilyFiles {
        name: "Liberation Sans",
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
    },
    FamilyFiles {
        name: "Arial",
        regular: "arial.ttf",
        bold: "arialbd.ttf",
        italic: "ariali.ttf",
        bold_italic: "arialbi.ttf",
    },
];

const SYSTEM_FONT_DIRECTORIES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/liberation",
    "/usr/local/share/fonts",
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

fn push_unique(candidates: &mut Vec<PathBuf>, candidate: PathBuf) {
    if !candidates.iter().any(|existing| existing == &candidate) {
        candidates.push(candidate);
    }
}

/// Directories searched for fonts, in priority order.
pub fn font_directory_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = explicit {
        push_unique(&mut candidates, path.to_path_buf());
    }
    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push_unique(&mut candidates, path);
    }
    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push_unique(&mut candidates, bin_dir.join("assets/fonts"));
        }
    }
    push_unique(&mut candidates, bundled_fonts_dir());

    for dir in SYSTEM_FONT_DIRECTORIES {
        push_unique(&mut candidates, PathBuf::from(dir));
    }
    for var in ["WINDIR", "SystemRoot"] {
        if let Some(root) = env_path(var) {
            push_unique(&mut candidates, root.join("Fonts"));
        }
    }

    candidates
}

/// Location of the optional fonts directory shipped with the crate.
pub fn bundled_fonts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

/// A complete font family located on disk.
#[derive(Debug, Clone)]
pub struct ResolvedFamily {
    pub directory: PathBuf,
    pub family: FamilyFiles,
}

/// Finds the first directory holding a complete known family.
pub fn resolve_font_family(explicit: Option<&Path>) -> Result<ResolvedFamily, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates(explicit) {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }
        for family in KNOWN_FAMILIES {
            let missing = family.missing_in(&candidate);
            if missing.is_empty() {
                debug!(
                    "using font family '{}' from {}",
                    family.name,
                    candidate.display()
                );
                return Ok(ResolvedFamily {
                    directory: candidate,
                    family: *family,
                });
            }
        }
        attempts.push(format!("{} (no complete family)", candidate.display()));
    }

    Err(Error::new(
        format!(
            "Unable to locate a usable font family. Checked: {}. Set {} or pass --fonts-dir.",
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "no font family found"),
    ))
}

fn load_font(directory: &Path, file: &str, style: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load {} font at {}: {}",
                style,
                path.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

/// Loads the font family used for reports.
pub fn load_font_family(explicit: Option<&Path>) -> Result<FontFamily<FontData>, Error> {
    let resolved = resolve_font_family(explicit)?;
    if explicit.is_some() && Some(resolved.directory.as_path()) != explicit {
        warn!(
            "No complete font family in the requested directory; falling back to '{}' from {}",
            resolved.family.name,
            resolved.directory.display()
        );
    }

    let directory = resolved.directory.as_path();
    let files = resolved.family;
    Ok(FontFamily {
        regular: load_font(directory, files.regular, "regular")?,
        bold: load_font(directory, files.bold, "bold")?,
        italic: load_font(directory, files.italic, "italic")?,
        bold_italic: load_font(directory, files.bold_italic, "bold italic")?,
    })
}

/// Indicates whether any font family can be located without an explicit directory.
pub fn default_fonts_available() -> bool {
    resolve_font_family(None).is_ok()
}
