use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::io::Cursor;
use std::path::PathBuf;

use cdcflat_api::transform::RecordTransform;
use cdcflat_debezium::FlattenConfig;
use cdcflat_host::plugin_host::{load_transform, PluginLib};
use cdcflat_host::{HostError, RunStats, Runner};
use serde_json::json;

const DELETE_EVENT: &str =
    r#"{"payload":{"op":"d","ts_ms":200,"before":{"id":1},"source":{"ts_ms":190}}}"#;

/// The debezium cdylib built alongside this test binary (`target/<profile>/deps`
/// or the uplifted copy one level up).
fn debezium_so() -> PathBuf {
    let name = format!("{DLL_PREFIX}cdcflat_debezium{DLL_SUFFIX}");
    let exe = std::env::current_exe().unwrap();
    let deps = exe.parent().unwrap();
    [deps.join(&name), deps.parent().unwrap().join(&name)]
        .into_iter()
        .find(|p| p.exists())
        .unwrap_or_else(|| panic!("{name} not found next to {}", exe.display()))
}

#[test]
fn plugin_declares_flatten_params() {
    let lib = PluginLib::load(&debezium_so()).unwrap();
    let names: Vec<String> = lib.config_params().into_iter().map(|p| p.name).collect();
    let expected: Vec<String> = FlattenConfig::config_params()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, expected);
}

#[test]
fn plugin_transform_flattens_across_the_boundary() {
    let config = json!({"log_rejected": false});
    let transform = load_transform(&debezium_so(), Some(&config)).unwrap();

    assert_eq!(transform.name(), "debezium-flatten");
    assert_eq!(
        transform.transform(DELETE_EVENT),
        r#"{"id":1,"_deleted":true,"_op":"d","_ts_ms":200,"_source_ts_ms":190}"#
    );
    assert_eq!(transform.transform("not json"), "{}");

    drop(transform);
}

#[test]
fn plugin_transform_drives_the_runner() {
    let transform = load_transform(&debezium_so(), None).unwrap();
    let input = format!("{DELETE_EVENT}\n\n{{\"payload\":{{\"op\":\"t\"}}}}\n");

    let mut out = Vec::new();
    let stats = Runner::new(&transform)
        .run(Cursor::new(input), &mut out)
        .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "{\"id\":1,\"_deleted\":true,\"_op\":\"d\",\"_ts_ms\":200,\"_source_ts_ms\":190}\n{}\n"
    );
    assert_eq!(stats, RunStats { lines: 2, accepted: 1, rejected: 1, skipped: 1 });
}

#[test]
fn plugin_rejects_undeclared_parameter() {
    let so = debezium_so();
    let err = load_transform(&so, Some(&json!({"zzz": 1}))).err().unwrap();
    assert!(matches!(
        err,
        HostError::Config(msg) if msg.contains("unknown parameter 'zzz'")
            && msg.contains("cdcflat_debezium")
    ));
}

#[test]
fn plugin_rejects_mistyped_parameter() {
    let err = load_transform(&debezium_so(), Some(&json!({"log_input_limit": "all"})))
        .err()
        .unwrap();
    assert!(matches!(err, HostError::Config(msg) if msg.contains("expected non-negative integer")));
}
