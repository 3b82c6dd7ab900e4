mod common;

use std::sync::{Arc, Mutex};

use common::*;
use quarry_fetch::Control;
use quarry_install::{
    ArtifactKey, InstallManifest, InstallNotifier, InstallReport, InstallRequest, JobOutcome, NotifyError, Stage, Status,
    display_image_url,
};

fn install(fixture: &Fixture, key: &ArtifactKey, full: bool) -> JobOutcome {
    fixture
        .installer()
        .execute(&InstallRequest::new(key.clone(), full), &Control::new())
}

#[test]
fn full_install_produces_launchable_directory() {
    let fixture = Fixture::new();
    let image = display_image_url("1.20.1", "release", false).unwrap();
    fixture.http.insert(image, b"png".to_vec());
    let key = ArtifactKey::release("1.20.1").unwrap();

    let outcome = install(&fixture, &key, true);
    let JobOutcome::Installed(report) = outcome else {
        panic!("expected installed, got {outcome:?}");
    };

    let dir = fixture.client_dir(&key);
    assert_eq!(report.install_dir, dir);
    assert_eq!(std::fs::read(dir.join("client.jar")).unwrap(), client_body());
    assert!(dir.join("lwjgl-3.2.2.jar").exists());
    assert!(dir.join("gson-2.10.jar").exists());
    assert!(!dir.join("lwjgl-3.2.1.jar").exists());
    assert_eq!(fixture.http.request_count(LWJGL_OLD_URL), 0);

    assert!(dir.join("native/linux/liblwjgl.so").exists());
    assert!(!dir.join("native/linux/META-INF").exists());
    assert!(dir.join("native/windows/lwjgl.dll").exists());
    assert_eq!(std::fs::read(dir.join("display.png")).unwrap(), b"png");

    for body in [RESOURCE_A, RESOURCE_B] {
        let object = fixture.layout.asset_object(&sha1_hex(body));
        assert_eq!(std::fs::read(object).unwrap(), body);
    }

    let manifest = InstallManifest::read_from(&dir).unwrap();
    assert_eq!(manifest.classpath, ["client.jar", "lwjgl-3.2.2.jar", "gson-2.10.jar"]);
    assert_eq!(manifest.main_class, "net.minecraft.client.main.Main");
    assert_eq!(manifest.asset_index, "5");
    assert_eq!(manifest.version_type, "release");
    assert!(manifest.full_assets);
    assert_eq!(manifest.extra_args.as_deref(), Some("--username ${auth_player_name}"));
    assert_eq!(manifest, report.manifest);

    let record = fixture.installer().store().read(&key).unwrap();
    assert_eq!(record.status, Status::Installed);
    assert_eq!(record.overall_percent, 100);
    assert_eq!(record.bytes_done, report.bytes_done);
}

#[test]
fn cached_libraries_are_not_downloaded_again() {
    let fixture = Fixture::new();
    let first = ArtifactKey::release("1.20.1").unwrap();
    let second = ArtifactKey::new("1.20.1", "modded").unwrap();

    assert!(matches!(install(&fixture, &first, false), JobOutcome::Installed(_)));
    assert!(matches!(install(&fixture, &second, false), JobOutcome::Installed(_)));

    assert_eq!(fixture.http.request_count(LWJGL_NEW_URL), 1);
    assert_eq!(fixture.http.request_count(NATIVES_LINUX_URL), 1);
    assert_eq!(fixture.http.request_count(INDEX_URL), 1);
    assert_eq!(fixture.http.request_count(CLIENT_URL), 2);
    assert!(fixture.client_dir(&second).join("gson-2.10.jar").exists());
}

#[test]
fn lite_install_skips_resource_bodies() {
    let fixture = Fixture::new();
    let key = ArtifactKey::release("1.20.1").unwrap();

    assert!(matches!(install(&fixture, &key, false), JobOutcome::Installed(_)));

    assert!(fixture.layout.asset_index("5").unwrap().exists());
    assert!(!fixture.layout.asset_object(&sha1_hex(RESOURCE_A)).exists());
    assert!(!fixture.http.requests().iter().any(|u| u.starts_with(RESOURCE_BASE)));

    let manifest = InstallManifest::read_from(fixture.client_dir(&key)).unwrap();
    assert!(!manifest.full_assets);
    assert_eq!(manifest.asset_index, "5");
}

#[test]
fn legacy_version_skips_resources() {
    let fixture = Fixture::new();
    let key = ArtifactKey::release("1.5.2").unwrap();

    assert!(matches!(install(&fixture, &key, true), JobOutcome::Installed(_)));
    assert_eq!(fixture.http.request_count(LEGACY_CLIENT_URL), 1);
    assert_eq!(fixture.http.request_count(LEGACY_INDEX_URL), 0);
    assert!(!fixture.layout.asset_index("pre-1.6").unwrap().exists());
    assert!(!fixture.http.requests().iter().any(|u| u.starts_with(RESOURCE_BASE)));

    let record = fixture.installer().store().read(&key).unwrap();
    assert_eq!(record.status, Status::Installed);

    let manifest = InstallManifest::read_from(fixture.client_dir(&key)).unwrap();
    assert_eq!(manifest.classpath, ["client.jar"]);
    assert_eq!(manifest.main_class, quarry_install::DEFAULT_MAIN_CLASS);
    assert_eq!(manifest.version_type, "release");
    assert_eq!(manifest.asset_index, "pre-1.6");
    assert_eq!(manifest.extra_args.as_deref(), Some("${auth_player_name} ${auth_session}"));
}

#[test]
fn falls_back_to_the_next_catalog() {
    let fixture = Fixture::new();
    let key = ArtifactKey::release("1.20.1").unwrap();
    let installer = fixture.installer_with_catalogs(&["https://down.test/catalog.json", CATALOG_URL]);

    let outcome = installer.execute(&InstallRequest::new(key.clone(), false), &Control::new());
    assert!(matches!(outcome, JobOutcome::Installed(_)));
    assert!(fixture.http.request_count("https://down.test/catalog.json") >= 1);
}

#[test]
fn unknown_version_fails_without_partial_directory() {
    let fixture = Fixture::new();
    let key = ArtifactKey::release("9.9.9").unwrap();

    let outcome = install(&fixture, &key, false);
    let JobOutcome::Failed(message) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(message.contains("9.9.9"));
    assert!(!fixture.client_dir(&key).exists());

    let record = fixture.installer().store().read(&key).unwrap();
    assert_eq!(record.status, Status::Error);
    assert_eq!(record.stage, Stage::VersionMetadata);
    assert_eq!(record.message, message);
}

#[test]
fn checksum_failure_keeps_partial_directory() {
    let fixture = Fixture::new();
    fixture.http.insert(CLIENT_URL, b"tampered".to_vec());
    let key = ArtifactKey::release("1.20.1").unwrap();

    let outcome = install(&fixture, &key, false);
    assert!(matches!(outcome, JobOutcome::Failed(_)));

    let dir = fixture.client_dir(&key);
    assert!(dir.exists());
    assert!(!dir.join("client.jar").exists());
    assert_eq!(fixture.http.request_count(CLIENT_URL), 3);

    let record = fixture.installer().store().read(&key).unwrap();
    assert_eq!(record.status, Status::Error);
    assert_eq!(record.stage, Stage::Client);
    assert!(record.overall_percent >= 5);
    assert!(record.message.contains("checksum mismatch"));
}

#[test]
fn cancelled_before_start_removes_directory() {
    let fixture = Fixture::new();
    let key = ArtifactKey::release("1.20.1").unwrap();
    let control = Control::new();
    control.cancel();

    let outcome = fixture.installer().execute(&InstallRequest::new(key.clone(), true), &control);
    assert_eq!(outcome, JobOutcome::Cancelled);
    assert!(!fixture.client_dir(&key).exists());
    assert_eq!(fixture.installer().store().read(&key).unwrap().status, Status::Cancelled);
}

#[derive(Default)]
struct Recording(Mutex<Vec<String>>);

impl InstallNotifier for Recording {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn installed(&self, report: &InstallReport) -> Result<(), NotifyError> {
        self.0.lock().unwrap().push(report.key.to_string());
        Err(NotifyError("desktop unavailable".into()))
    }
}

#[test]
fn notifier_errors_do_not_fail_the_install() {
    let fixture = Fixture::new();
    let notifier = Arc::new(Recording::default());
    let installer = fixture.installer().with_notifier(notifier.clone());
    let key = ArtifactKey::release("1.20.1").unwrap();

    let outcome = installer.execute(&InstallRequest::new(key.clone(), false), &Control::new());
    assert!(matches!(outcome, JobOutcome::Installed(_)));
    assert_eq!(*notifier.0.lock().unwrap(), ["Release/1.20.1"]);
}
