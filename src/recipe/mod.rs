//! PKGBUILD documents
//!
//! [`PkgbuildDocument`] is an in-memory model of a PKGBUILD that can read and
//! rewrite individual top-level fields while reproducing every other byte of
//! the file exactly: comments, blank lines, function bodies, field ordering
//! and line endings.
//!
//! # Field Grammar
//!
//! A field is a column-0 assignment `name=value`. Array fields are written in
//! single-element form, `name=('value')`. The document keeps a line index of
//! top-level assignments (see [`Field`]) and mutations replace whole indexed
//! lines, then re-index.
//!
//! # Replacement Rules
//!
//! - Setting a field replaces every declaration of it with one line; reading
//!   returns the first declaration.
//! - A multi-element array such as `source_x86_64=('a' 'b')`, or an array split
//!   over several lines, is replaced wholesale by the single-element form.
//!   Recipes that need several sources per architecture lose the extra
//!   entries. This is intended behavior for the binary-repack recipes this
//!   tool maintains.
//! - Setting a field the recipe does not declare changes nothing, except for
//!   `epoch`, which is inserted immediately before the first `pkgver` line.
//!
//! Nothing reaches disk until [`PkgbuildDocument::save`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use aur_updater::core::Architecture;
//! use aur_updater::recipe::{Field, PkgbuildDocument};
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut doc = PkgbuildDocument::load("linuxqq/PKGBUILD")?;
//! doc.set(Field::Pkgver, "3.2.19_250904");
//! doc.set(Field::Pkgrel, "1");
//! doc.set(Field::Source(Some(Architecture::X86_64)), "https://x/QQ_3.2.19_250904_amd64_01.deb");
//! doc.save()?;
//! # Ok(())
//! # }
//! ```

mod grammar;

use crate::checksum::{ChecksumRecord, HashAlgorithm, checksum_field_name, hash_file};
use crate::core::{Architecture, UpdaterError};
use crate::utils::fs::atomic_write;
use grammar::{Assignment, array_elements, index, split_terminator};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A PKGBUILD field the updater knows how to read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// `pkgver`
    Pkgver,
    /// `pkgrel`
    Pkgrel,
    /// `epoch`
    Epoch,
    /// `source` or `source_<arch>`
    Source(Option<Architecture>),
    /// `<algo>sums` or `<algo>sums_<arch>`
    Checksums(HashAlgorithm, Option<Architecture>),
}

impl Field {
    /// The per-architecture `sha512sums_<arch>` field.
    #[must_use]
    pub const fn sha512sums(arch: Architecture) -> Self {
        Field::Checksums(HashAlgorithm::Sha512, Some(arch))
    }

    /// The variable name as written in the PKGBUILD.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Field::Pkgver => "pkgver".to_string(),
            Field::Pkgrel => "pkgrel".to_string(),
            Field::Epoch => "epoch".to_string(),
            Field::Source(None) => "source".to_string(),
            Field::Source(Some(arch)) => format!("source_{arch}"),
            Field::Checksums(algorithm, arch) => checksum_field_name(*algorithm, *arch),
        }
    }

    /// Whether values of this field are written as `name=('value')`.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Field::Source(_) | Field::Checksums(..))
    }

    /// Recognize a variable name, e.g. `sha256sums_aarch64`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pkgver" => return Some(Field::Pkgver),
            "pkgrel" => return Some(Field::Pkgrel),
            "epoch" => return Some(Field::Epoch),
            "source" => return Some(Field::Source(None)),
            _ => {}
        }

        if let Some(arch) = name.strip_prefix("source_") {
            return arch.parse().ok().map(|arch| Field::Source(Some(arch)));
        }

        HashAlgorithm::ALL.into_iter().find_map(|algorithm| {
            let rest = name.strip_prefix(&algorithm.field_prefix())?;
            if rest.is_empty() {
                return Some(Field::Checksums(algorithm, None));
            }
            let arch = rest.strip_prefix('_')?.parse().ok()?;
            Some(Field::Checksums(algorithm, Some(arch)))
        })
    }

    fn render(&self, value: &str) -> String {
        if self.is_array() {
            format!("{}=('{value}')", self.name())
        } else {
            format!("{}={value}", self.name())
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A batch of field changes applied together by [`PkgbuildDocument::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeUpdate {
    /// New `pkgver`
    pub version: Option<String>,
    /// New `pkgrel`
    pub pkgrel: Option<String>,
    /// New `epoch`, inserted before `pkgver` when absent
    pub epoch: Option<String>,
    /// New generic `sha512sums` digest
    pub generic_checksum: Option<String>,
    /// New `source_<arch>` URLs
    pub sources: BTreeMap<Architecture, String>,
    /// New checksums, each written to its own algorithm/arch field
    pub checksums: Vec<ChecksumRecord>,
}

/// A PKGBUILD loaded into memory.
#[derive(Debug, Clone)]
pub struct PkgbuildDocument {
    path: PathBuf,
    /// Lines with their terminators, so joining them reproduces the file
    lines: Vec<String>,
    assignments: Vec<Assignment>,
}

impl PkgbuildDocument {
    /// Read the PKGBUILD at `path`.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::FileNotFound`] if `path` does not exist, or an I/O error
    /// if it cannot be read as UTF-8 text.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, UpdaterError> {
        let path = path.as_ref();
        let content = read_recipe(path)?;
        Ok(Self::parse(path, &content))
    }

    /// Build a document from text; `path` is where [`save`](Self::save) writes.
    #[must_use]
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        let lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();
        let assignments = index(&lines);
        Self {
            path: path.into(),
            lines,
            assignments,
        }
    }

    /// The file this document was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current text, including unsaved edits.
    #[must_use]
    pub fn content(&self) -> String {
        self.lines.concat()
    }

    fn declarations(&self, name: &str) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter().filter(move |a| a.name == name)
    }

    /// Raw text after `=` on the first declaration of `field`.
    ///
    /// `None` if the field is absent or its first declaration spans several lines.
    #[must_use]
    pub fn get_raw(&self, field: Field) -> Option<&str> {
        let assignment = self.declarations(&field.name()).next()?;
        (!assignment.is_multiline()).then_some(assignment.value.as_str())
    }

    /// Value of `field`.
    ///
    /// Scalars are returned as written. Array fields yield their element when
    /// the array has exactly one, and `None` otherwise.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<String> {
        let raw = self.get_raw(field)?;
        if !field.is_array() || !raw.starts_with('(') {
            return Some(raw.to_string());
        }
        let mut elements = array_elements(raw)?;
        if elements.len() == 1 { elements.pop() } else { None }
    }

    /// All elements of a single-line array field.
    #[must_use]
    pub fn get_all(&self, field: Field) -> Option<Vec<String>> {
        array_elements(self.get_raw(field)?)
    }

    /// Replace every declaration of `field` with a single `field=value` line.
    ///
    /// Returns `false`, leaving the document unchanged, if the field is not
    /// declared. `epoch` is the exception: see [`set_epoch`](Self::set_epoch).
    pub fn set(&mut self, field: Field, value: &str) -> bool {
        if field == Field::Epoch {
            return self.set_epoch(value);
        }
        self.replace(field, value)
    }

    fn replace(&mut self, field: Field, value: &str) -> bool {
        let name = field.name();
        let targets: Vec<(usize, usize)> =
            self.declarations(&name).map(|a| (a.first_line, a.line_count)).collect();
        if targets.is_empty() {
            return false;
        }

        let rendered = field.render(value);
        // Back to front so earlier line indices stay valid
        for (first_line, line_count) in targets.into_iter().rev() {
            let last = first_line + line_count - 1;
            let (_, terminator) = split_terminator(&self.lines[last]);
            let replacement = format!("{rendered}{terminator}");
            self.lines.splice(first_line..=last, std::iter::once(replacement));
        }

        self.assignments = index(&self.lines);
        true
    }

    /// Set `epoch`, inserting `epoch=value` before the first `pkgver` line if
    /// the recipe has no epoch yet.
    ///
    /// Returns `false` only when neither `epoch` nor `pkgver` is declared.
    pub fn set_epoch(&mut self, value: &str) -> bool {
        if self.replace(Field::Epoch, value) {
            return true;
        }

        let Some(pkgver_line) = self.declarations("pkgver").map(|a| a.first_line).next() else {
            return false;
        };
        let terminator = if self.lines[pkgver_line].ends_with("\r\n") { "\r\n" } else { "\n" };
        self.lines
            .insert(pkgver_line, format!("{}{terminator}", Field::Epoch.render(value)));
        self.assignments = index(&self.lines);
        true
    }

    /// Current `pkgver`.
    #[must_use]
    pub fn pkgver(&self) -> Option<String> {
        self.get(Field::Pkgver)
    }

    /// Current `pkgrel`, `"1"` when the recipe does not declare one.
    #[must_use]
    pub fn pkgrel(&self) -> String {
        self.get(Field::Pkgrel).unwrap_or_else(|| "1".to_string())
    }

    /// Current `epoch`, if declared.
    #[must_use]
    pub fn epoch(&self) -> Option<String> {
        self.get(Field::Epoch)
    }

    /// Every checksum declaration line (`sha256sums*`, `sha512sums*`), in file order.
    #[must_use]
    pub fn checksum_lines(&self) -> Vec<(Field, String)> {
        self.assignments
            .iter()
            .filter_map(|a| {
                let field = Field::from_name(&a.name)?;
                if !matches!(field, Field::Checksums(..)) {
                    return None;
                }
                let text: String = self.lines[a.first_line..a.first_line + a.line_count].concat();
                Some((field, text.trim_end_matches(['\r', '\n']).to_string()))
            })
            .collect()
    }

    /// Apply every change in `update`.
    ///
    /// Returns the fields that could not be written because the recipe does
    /// not declare them.
    pub fn apply(&mut self, update: &RecipeUpdate) -> Vec<Field> {
        let mut missing = Vec::new();
        let mut write = |doc: &mut Self, field: Field, value: &str| {
            if !doc.set(field, value) {
                missing.push(field);
            }
        };

        if let Some(epoch) = &update.epoch {
            write(self, Field::Epoch, epoch.as_str());
        }
        if let Some(version) = &update.version {
            write(self, Field::Pkgver, version.as_str());
        }
        if let Some(pkgrel) = &update.pkgrel {
            write(self, Field::Pkgrel, pkgrel.as_str());
        }
        if let Some(digest) = &update.generic_checksum {
            write(self, Field::Checksums(HashAlgorithm::Sha512, None), digest.as_str());
        }
        for (&arch, url) in &update.sources {
            write(self, Field::Source(Some(arch)), url.as_str());
        }
        for record in &update.checksums {
            write(self, Field::Checksums(record.algorithm, record.arch), record.digest.as_str());
        }

        missing
    }

    /// Hash `file` and write the digest into the matching checksum field.
    ///
    /// Returns the digest; whether the field existed can be checked with
    /// [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Any failure hashing `file`.
    pub async fn update_checksum_from_file(
        &mut self,
        file: &Path,
        algorithm: HashAlgorithm,
        arch: Option<Architecture>,
    ) -> Result<String, UpdaterError> {
        let digest = hash_file(file, algorithm).await?;
        self.set(Field::Checksums(algorithm, arch), &digest);
        Ok(digest)
    }

    /// Atomically overwrite the source file with the current content.
    ///
    /// # Errors
    ///
    /// [`UpdaterError::PersistFailed`] if the file cannot be written.
    pub fn save(&self) -> Result<(), UpdaterError> {
        atomic_write(&self.path, self.content().as_bytes()).map_err(|e| {
            UpdaterError::PersistFailed {
                path: self.path.display().to_string(),
                reason: format!("{e:#}"),
            }
        })
    }

    /// Discard in-memory edits and re-read the file.
    ///
    /// # Errors
    ///
    /// As [`load`](Self::load).
    pub fn reload(&mut self) -> Result<(), UpdaterError> {
        let content = read_recipe(&self.path)?;
        self.lines = content.split_inclusive('\n').map(str::to_string).collect();
        self.assignments = index(&self.lines);
        Ok(())
    }
}

fn read_recipe(path: &Path) -> Result<String, UpdaterError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => UpdaterError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => UpdaterError::IoError(e),
    })
}
