use aur_updater::config::{PackagesConfig, UpdaterConfig};
use aur_updater::core::Architecture;
use aur_updater::recipe::{Field, PkgbuildDocument};
use aur_updater::test_utils::fixtures::{PkgbuildFixture, packages_yaml, qq_artifact_url, qq_page};
use aur_updater::test_utils::{MockFetcher, init_test_logging};
use aur_updater::updater::{FailureStage, PackageUpdater, UpdateOutcome};
use tempfile::TempDir;

const PAGE_URL: &str = "https://im.qq.com/linuxqq/index.shtml";
const ARCHS: [Architecture; 3] = [Architecture::X86_64, Architecture::Aarch64, Architecture::Loong64];

fn fetcher_for(version: &str, offered: &[Architecture]) -> MockFetcher {
    let mut fetcher = MockFetcher::new().with_text(PAGE_URL, qq_page(version, offered));
    for &arch in offered {
        let payload = format!("{arch} build of {version}").into_bytes();
        fetcher = fetcher.with_bytes(&qq_artifact_url(version, arch), payload);
    }
    fetcher
}

#[tokio::test]
async fn test_update_then_rerun_is_noop() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("packages.yaml");
    std::fs::write(&config_path, packages_yaml("linuxqq", PAGE_URL, &ARCHS)).unwrap();
    let recipe = PkgbuildFixture::with_version("3.2.18_250818", &ARCHS)
        .write_to(temp.path(), "linuxqq")
        .unwrap();

    let packages = PackagesConfig::load_from(&config_path).await.unwrap();
    let config = UpdaterConfig {
        download_dir: temp.path().join("downloads"),
        recipe_root: temp.path().to_path_buf(),
        ..UpdaterConfig::default()
    };

    let updater = PackageUpdater::new(config.clone(), fetcher_for("3.2.19_250904", &ARCHS));
    let report = updater.update_all(&packages).await;
    assert!(report.all_succeeded(), "{:?}", report.results);
    assert_eq!(report.summary(), "1/1 packages updated successfully");

    let doc = PkgbuildDocument::load(&recipe).unwrap();
    assert_eq!(doc.pkgver().as_deref(), Some("3.2.19_250904"));
    assert_eq!(doc.pkgrel(), "1");
    for arch in ARCHS {
        assert_eq!(
            doc.get(Field::Source(Some(arch))),
            Some(qq_artifact_url("3.2.19_250904", arch))
        );
        let artifact = temp.path().join("downloads").join(format!("linuxqq_3.2.19_250904_{arch}.deb"));
        assert!(artifact.exists(), "missing {}", artifact.display());
    }
    let updated = std::fs::read(&recipe).unwrap();

    // Same upstream version again: nothing is downloaded or written
    let updater = PackageUpdater::new(config, fetcher_for("3.2.19_250904", &ARCHS));
    let report = updater.update_all(&packages).await;
    assert!(matches!(report.results[0], Ok(UpdateOutcome::UpToDate { .. })));
    assert_eq!(std::fs::read(&recipe).unwrap(), updated);
}

#[tokio::test]
async fn test_interrupted_artifact_keeps_recipe() {
    init_test_logging(None);
    let temp = TempDir::new().unwrap();
    let recipe = PkgbuildFixture::with_version("3.2.18_250818", &ARCHS)
        .write_to(temp.path(), "linuxqq")
        .unwrap();
    let before = std::fs::read(&recipe).unwrap();
    let packages =
        PackagesConfig::from_yaml_str(&packages_yaml("linuxqq", PAGE_URL, &ARCHS)).unwrap();

    let fetcher = fetcher_for("3.2.19_250904", &ARCHS).with_truncated(
        &qq_artifact_url("3.2.19_250904", Architecture::Loong64),
        b"partial".to_vec(),
    );
    let config = UpdaterConfig {
        download_dir: temp.path().join("downloads"),
        recipe_root: temp.path().to_path_buf(),
        ..UpdaterConfig::default()
    };
    let updater = PackageUpdater::new(config, fetcher);

    let report = updater.update_all(&packages).await;
    let failure = report.failures().next().unwrap();
    assert_eq!(failure.stage, FailureStage::Download(Architecture::Loong64));
    assert_eq!(failure.stage.to_string(), "download:loong64");

    assert_eq!(std::fs::read(&recipe).unwrap(), before);
    assert!(!temp.path().join("downloads/linuxqq_3.2.19_250904_loong64.deb").exists());
}
