//! Sample PKGBUILDs, upstream pages and configuration files.

use crate::core::Architecture;
use std::path::{Path, PathBuf};

/// Debian architecture tag used in upstream file names.
#[must_use]
pub const fn debian_tag(arch: Architecture) -> &'static str {
    match arch {
        Architecture::X86_64 => "amd64",
        Architecture::Aarch64 => "arm64",
        Architecture::Loong64 => "loongarch64",
        Architecture::Mips64el => "mips64el",
    }
}

/// The URL the sample QQ page advertises for `version` on `arch`.
#[must_use]
pub fn qq_artifact_url(version: &str, arch: Architecture) -> String {
    format!("https://dl.example.com/linuxqq/QQ_{version}_{}_01.deb", debian_tag(arch))
}

/// A QQ download page advertising `version` for `archs` only.
///
/// x86_64 and aarch64 use the `{"deb": ...}` object form, the others the bare
/// string form, as the real page does.
#[must_use]
pub fn qq_page(version: &str, archs: &[Architecture]) -> String {
    let entries: Vec<String> = archs
        .iter()
        .map(|&arch| {
            let url = qq_artifact_url(version, arch);
            match arch {
                Architecture::X86_64 => format!(r#""x64DownloadUrl":{{"deb":"{url}","rpm":"x.rpm"}}"#),
                Architecture::Aarch64 => format!(r#""armDownloadUrl":{{"deb":"{url}"}}"#),
                Architecture::Loong64 => format!(r#""loongarchDownloadUrl":"{url}""#),
                Architecture::Mips64el => format!(r#""mipsDownloadUrl":"{url}""#),
            }
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n<html><head><script>\n  var params = {{{}}};\n</script></head><body></body></html>\n",
        entries.join(",\n    ")
    )
}

/// A PKGBUILD fixture
#[derive(Clone, Debug)]
pub struct PkgbuildFixture {
    pub content: String,
}

impl PkgbuildFixture {
    /// A recipe at `version` with `source_*`/`sha512sums_*` fields for `archs`.
    pub fn with_version(version: &str, archs: &[Architecture]) -> Self {
        let arch_list: Vec<String> = archs.iter().map(|a| format!("'{a}'")).collect();
        let mut content = format!(
            "# Maintainer: Example <maint@example.com>\n\
             pkgname=linuxqq\n\
             pkgver={version}\n\
             pkgrel=3\n\
             pkgdesc=\"QQ for Linux\"\n\
             arch=({})\n\
             license=('custom')\n\
             \n",
            arch_list.join(" ")
        );
        for &arch in archs {
            content.push_str(&format!("source_{arch}=('{}')\n", qq_artifact_url(version, arch)));
        }
        for &arch in archs {
            content.push_str(&format!("sha512sums_{arch}=('{}')\n", "0".repeat(128)));
        }
        content.push_str("\npackage() {\n  bsdtar -xf data.tar.xz -C \"$pkgdir\"\n}\n");
        Self { content }
    }

    /// Write the recipe to `dir/name/PKGBUILD`, returning its path.
    pub fn write_to(&self, dir: &Path, name: &str) -> std::io::Result<PathBuf> {
        let package_dir = dir.join(name);
        std::fs::create_dir_all(&package_dir)?;
        let path = package_dir.join("PKGBUILD");
        std::fs::write(&path, &self.content)?;
        Ok(path)
    }
}

/// `packages.yaml` content describing one QQ-parsed package.
#[must_use]
pub fn packages_yaml(name: &str, fetch_url: &str, archs: &[Architecture]) -> String {
    let arch_list: Vec<String> = archs.iter().map(ToString::to_string).collect();
    format!(
        "packages:\n  {name}:\n    name: {name}\n    source: aur\n    fetch_url: {fetch_url}\n    parser: QQParser\n    pkgbuild: {name}/PKGBUILD\n    arch: [{}]\n",
        arch_list.join(", ")
    )
}
