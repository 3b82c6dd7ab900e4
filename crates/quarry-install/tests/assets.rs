mod common;

use std::sync::Mutex;

use common::*;
use quarry_fetch::Control;
use quarry_install::{AssetPool, InstallError, PoolProgress, ResourceItem};

fn item(key: &str, body: &[u8]) -> ResourceItem {
    ResourceItem {
        key:  key.to_string(),
        hash: sha1_hex(body),
        size: body.len() as u64,
    }
}

fn items() -> Vec<ResourceItem> {
    vec![item("icons/a.png", RESOURCE_A), item("sounds/b.ogg", RESOURCE_B)]
}

fn no_progress(_: PoolProgress) {}

#[test]
fn downloads_every_object_and_reports_each_completion() {
    let fixture = Fixture::new();
    let fetcher = fixture.fetcher();
    let pool = AssetPool::new(&fetcher, &fixture.layout).threads(2).base_url(RESOURCE_BASE);
    let seen = Mutex::new(Vec::new());

    let progress = pool
        .run(&items(), &Control::new(), &|p: PoolProgress| seen.lock().unwrap().push(p.done))
        .unwrap();

    assert_eq!(progress.done, 2);
    assert_eq!(progress.bytes, (RESOURCE_A.len() + RESOURCE_B.len()) as u64);
    let mut seen = seen.into_inner().unwrap();
    seen.sort();
    assert_eq!(seen, [1, 2]);
    for body in [RESOURCE_A, RESOURCE_B] {
        assert_eq!(std::fs::read(fixture.layout.asset_object(&sha1_hex(body))).unwrap(), body);
    }
}

#[test]
fn malformed_object_hash_is_fatal_and_fetches_nothing() {
    let fixture = Fixture::new();
    let fetcher = fixture.fetcher();
    let pool = AssetPool::new(&fetcher, &fixture.layout).threads(2).base_url(RESOURCE_BASE);
    let escaped = fixture.root.path().join("escaped");
    let mut items = items();
    items.push(ResourceItem {
        key:  "evil".into(),
        hash: "../../../escaped".into(),
        size: 4,
    });
    fixture.http.insert(format!("{RESOURCE_BASE}/../../../escaped"), b"evil".to_vec());

    let result = pool.run(&items, &Control::new(), &no_progress);

    assert!(matches!(result, Err(InstallError::InvalidResourceHash { ref key, .. }) if key == "evil"));
    assert!(fixture.http.requests().is_empty());
    assert!(!escaped.exists());
    assert!(!fixture.layout.asset_objects_dir().exists());
}

#[test]
fn empty_object_hash_is_rejected() {
    let fixture = Fixture::new();
    let fetcher = fixture.fetcher();
    let pool = AssetPool::new(&fetcher, &fixture.layout).base_url(RESOURCE_BASE);
    let items = [ResourceItem {
        key:  "blank".into(),
        hash: String::new(),
        size: 0,
    }];

    let result = pool.run(&items, &Control::new(), &no_progress);
    assert!(matches!(result, Err(InstallError::InvalidResourceHash { .. })));
}

#[test]
fn first_failure_stops_the_remaining_work() {
    let fixture = Fixture::new();
    let fetcher = fixture.fetcher();
    let pool = AssetPool::new(&fetcher, &fixture.layout).threads(1).base_url(RESOURCE_BASE);
    let missing: &[u8] = b"not on the server";
    let items = vec![item("a/missing", missing), item("icons/a.png", RESOURCE_A), item("sounds/b.ogg", RESOURCE_B)];

    let result = pool.run(&items, &Control::new(), &no_progress);

    assert!(matches!(result, Err(InstallError::Fetch(_))));
    assert_eq!(fixture.http.request_count(&resource_url(missing)), 3);
    assert_eq!(fixture.http.request_count(&resource_url(RESOURCE_A)), 0);
    assert_eq!(fixture.http.request_count(&resource_url(RESOURCE_B)), 0);
}

#[test]
fn present_objects_are_trusted_without_verification() {
    let fixture = Fixture::new();
    let fetcher = fixture.fetcher();
    let pool = AssetPool::new(&fetcher, &fixture.layout).threads(2).base_url(RESOURCE_BASE);
    let object = fixture.layout.asset_object(&sha1_hex(RESOURCE_A));
    std::fs::create_dir_all(object.parent().unwrap()).unwrap();
    std::fs::write(&object, b"corrupt").unwrap();

    let progress = pool.run(&items(), &Control::new(), &no_progress).unwrap();

    assert_eq!(progress.done, 2);
    assert_eq!(fixture.http.request_count(&resource_url(RESOURCE_A)), 0);
    assert_eq!(fixture.http.request_count(&resource_url(RESOURCE_B)), 1);
    assert_eq!(std::fs::read(&object).unwrap(), b"corrupt");
}

#[test]
fn verified_reuse_refetches_corrupt_objects() {
    let fixture = Fixture::new();
    let fetcher = fixture.fetcher();
    let pool = AssetPool::new(&fetcher, &fixture.layout)
        .threads(2)
        .base_url(RESOURCE_BASE)
        .verify_cached(true);
    let corrupt = fixture.layout.asset_object(&sha1_hex(RESOURCE_A));
    let intact = fixture.layout.asset_object(&sha1_hex(RESOURCE_B));
    for (path, body) in [(&corrupt, &b"corrupt"[..]), (&intact, RESOURCE_B)] {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    pool.run(&items(), &Control::new(), &no_progress).unwrap();

    assert_eq!(fixture.http.request_count(&resource_url(RESOURCE_A)), 1);
    assert_eq!(fixture.http.request_count(&resource_url(RESOURCE_B)), 0);
    assert_eq!(std::fs::read(&corrupt).unwrap(), RESOURCE_A);
}

#[test]
fn cancelled_pool_reports_cancellation() {
    let fixture = Fixture::new();
    let fetcher = fixture.fetcher();
    let pool = AssetPool::new(&fetcher, &fixture.layout).threads(2).base_url(RESOURCE_BASE);
    let control = Control::new();
    control.cancel();

    let result = pool.run(&items(), &control, &no_progress);

    assert!(matches!(result, Err(InstallError::Cancelled)));
    assert!(fixture.http.requests().is_empty());
}
