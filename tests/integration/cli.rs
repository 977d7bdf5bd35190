use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = "\
packages:
  linuxqq:
    name: linuxqq
    fetch_url: https://im.qq.com/linuxqq/index.shtml
    parser: QQParser
    pkgbuild: linuxqq/PKGBUILD
    arch: [x86_64, aarch64, i686]
  wechat:
    fetch_url: https://example.com/wechat
    parser: qq
    pkgbuild: wechat/PKGBUILD
    arch: [x86_64]
";

fn updater(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("aur-updater").unwrap();
    cmd.arg("--config")
        .arg(config)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("AUR_UPDATER_CONFIG");
    cmd
}

fn write_config(content: &str) -> (TempDir, std::path::PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("packages.yaml");
    std::fs::write(&path, content).unwrap();
    (temp, path)
}

#[test]
fn test_list_packages() {
    let (temp, config) = write_config(CONFIG);

    updater(&config)
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configured packages (2)"))
        .stdout(predicate::str::contains("linuxqq"))
        .stdout(predicate::str::contains("wechat"))
        .stdout(predicate::str::contains("x86_64, aarch64"))
        .stdout(predicate::str::contains("i686").not())
        .stdout(predicate::str::contains(
            temp.path().join("linuxqq/PKGBUILD").display().to_string(),
        ));
}

#[test]
fn test_unknown_package() {
    let (_temp, config) = write_config(CONFIG);

    updater(&config)
        .args(["--package", "firefox"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Package 'firefox' is not configured"))
        .stderr(predicate::str::contains("--list"));
}

#[test]
fn test_unknown_parser_rejected() {
    let (_temp, config) = write_config(
        "packages:\n  x:\n    fetch_url: https://example.com\n    parser: NoSuchParser\n    pkgbuild: x/PKGBUILD\n",
    );

    updater(&config)
        .arg("--list")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("NoSuchParser"));
}

#[test]
fn test_missing_config_file() {
    let temp = TempDir::new().unwrap();

    updater(&temp.path().join("absent.yaml"))
        .arg("--list")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("absent.yaml"));
}

#[test]
fn test_conflicting_modes() {
    let (_temp, config) = write_config(CONFIG);

    updater(&config).args(["--list", "--package", "linuxqq"]).assert().failure().code(2);
}

#[test]
fn test_empty_configuration() {
    let (_temp, config) = write_config("packages: {}\n");

    updater(&config)
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages configured."));
}
