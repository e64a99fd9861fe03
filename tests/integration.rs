use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_ddigen")))
}

fn fixture_path(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn read(dir: &Path, rel: &str) -> String {
    fs::read_to_string(dir.join(rel)).unwrap_or_else(|e| panic!("{}: {}", rel, e))
}

fn generate(dir: &TempDir, extra: &[&str]) -> assert_cmd::assert::Assert {
    cmd()
        .arg("generate")
        .arg("--api")
        .arg(fixture_path("core.yaml"))
        .args(extra)
        .arg(dir.path())
        .assert()
}

// -- generate --

#[test]
fn generate_writes_every_family() {
    let dir = TempDir::new().unwrap();
    generate(&dir, &[]).success();

    for rel in [
        "include/core_ddi.h",
        "source/lib/core_libapi.cpp",
        "source/lib/core_libddi.cpp",
        "source/wrapper/core_wprapi.cpp",
        "source/loader/core_ldrddi.h",
        "source/loader/core_ldrddi.cpp",
        "source/loader/core_loader_internal.h",
        "source/layers/validation/core_valddi.cpp",
        "source/layers/validation/common/core_entry_points.h",
        "source/layers/validation/parameter_validation/core_parameter_validation.cpp",
        "source/layers/validation/handle_lifetime_tracking/core_handle_lifetime.cpp",
        "source/layers/tracing/core_trcddi.cpp",
        "source/layers/tracing/core_tracing_cb_structs.h",
        "include/layers/corel_tracing_register_cb.h",
        "source/drivers/null/core_nullddi.cpp",
    ] {
        assert!(dir.path().join(rel).is_file(), "missing {}", rel);
    }
    assert!(!dir.path().join("generated.json").exists());
}

#[test]
fn libapi_forwards_through_the_dispatch_table() {
    let dir = TempDir::new().unwrap();
    generate(&dir, &[]).success();

    let libapi = read(dir.path(), "source/lib/core_libapi.cpp");
    assert_eq!(libapi.matches("CORE_APICALL\ncoreDeviceGetProperties(").count(), 1);
    assert!(libapi.contains("core_lib::context->coreDdiTable.Device.pfnGetProperties"));
    assert!(libapi.contains("return pfnGetProperties( hDevice, pProperties );"));
    assert!(!libapi.contains("coreDeviceSetMode"));
}

#[test]
fn null_driver_stubs_the_c_signature() {
    let dir = TempDir::new().unwrap();
    generate(&dir, &[]).success();

    let null = read(dir.path(), "source/drivers/null/core_nullddi.cpp");
    assert!(null.contains("coreDeviceGetProperties(\n        core_device_handle_t hDevice,"));
    assert!(null.contains("core_device_properties_t* pProperties"));
    assert!(null.contains("return CORE_RESULT_SUCCESS;"));
    assert!(null.contains("coreGetDeviceProcAddrTable("));
    assert!(null.contains("pDdiTable->pfnGetProperties = driver::coreDeviceGetProperties;"));
    assert!(!null.contains('\r'));
}

#[test]
fn ddi_header_declares_table_and_export() {
    let dir = TempDir::new().unwrap();
    generate(&dir, &[]).success();

    let ddi = read(dir.path(), "include/core_ddi.h");
    assert!(ddi.contains("typedef core_result_t (CORE_APICALL *core_pfnDeviceGetProperties_t)("));
    assert!(ddi.contains("} core_device_dditable_t;"));
    assert!(ddi.contains("core_pfnGetDeviceProcAddrTable_t"));
    assert!(ddi
        .lines()
        .any(|l| l.trim_start().starts_with("core_device_dditable_t") && l.trim_end().ends_with(" Device;")));
}

#[test]
fn parameter_validation_uses_return_conditions() {
    let dir = TempDir::new().unwrap();
    generate(&dir, &["--ver", "1.1"]).success();

    let param = read(
        dir.path(),
        "source/layers/validation/parameter_validation/core_parameter_validation.cpp",
    );
    assert!(param.contains("if( nullptr == hDevice )\n            return CORE_RESULT_ERROR_INVALID_NULL_HANDLE;"));
    assert!(param.contains("if( nullptr == pProperties )"));
    assert!(param.contains("CORE_DEVICE_MODE_FAST < mode"));
}

#[test]
fn loader_factories_are_merged_into_internal_header() {
    let dir = TempDir::new().unwrap();
    generate(&dir, &[]).success();

    let internal = read(dir.path(), "source/loader/core_loader_internal.h");
    assert!(internal.contains("#include \"core_ldrddi.h\""));
    assert!(internal.contains(
        "        /// factories\n        core_device_factory_t core_device_factory;\n        /// end factories"
    ));
}

#[test]
fn newer_handles_get_factories_only_at_their_version() {
    let dir = TempDir::new().unwrap();
    generate(&dir, &[]).success();
    let ldrddi = read(dir.path(), "source/loader/core_ldrddi.h");
    assert!(ldrddi.contains("core_device_factory_t core_device_factory;"));
    assert!(!ldrddi.contains("core_queue"));

    let dir = TempDir::new().unwrap();
    generate(&dir, &["--ver", "1.1"]).success();
    let internal = read(dir.path(), "source/loader/core_loader_internal.h");
    assert!(internal.contains("core_queue_factory_t core_queue_factory;"));
}

#[test]
fn skipped_families_are_not_written() {
    let dir = TempDir::new().unwrap();
    generate(&dir, &["--skip-layers", "--skip-loader"]).success();

    assert!(dir.path().join("source/lib/core_libapi.cpp").is_file());
    assert!(!dir.path().join("source/loader").exists());
    assert!(!dir.path().join("source/layers").exists());
}

#[test]
fn debug_writes_manifest_in_emission_order() {
    let dir = TempDir::new().unwrap();
    generate(&dir, &["--debug"]).success();

    let manifest: Vec<String> = serde_json::from_str(&read(dir.path(), "generated.json")).unwrap();
    assert_eq!(manifest.first().map(String::as_str), Some("include/core_ddi.h"));
    assert!(manifest.contains(&"source/drivers/null/core_nullddi.cpp".to_string()));
    assert_eq!(
        manifest.last().map(String::as_str),
        Some("source/loader/core_loader_internal.h")
    );
}

#[test]
fn generate_reads_stdin() {
    let dir = TempDir::new().unwrap();
    let input = fs::read_to_string(fixture_path("core.yaml")).unwrap();
    cmd()
        .args(["generate", "--api", "-", "--skip-layers"])
        .arg(dir.path())
        .write_stdin(input)
        .assert()
        .success();
    assert!(dir.path().join("include/core_ddi.h").is_file());
}

#[test]
fn unresolved_types_fail_in_strict_mode() {
    let dir = TempDir::new().unwrap();
    let spec = fs::read_to_string(fixture_path("core.yaml"))
        .unwrap()
        .replace("type: $x_device_properties_t*", "type: $x_device_missing_t*");
    cmd()
        .args(["generate", "--api", "-"])
        .arg(dir.path())
        .write_stdin(spec.clone())
        .assert()
        .failure()
        .stderr(predicate::str::contains("$x_device_missing_t"));

    cmd()
        .args(["generate", "--api", "-", "--mode", "best-effort"])
        .arg(dir.path())
        .write_stdin(spec)
        .assert()
        .success();
    let libapi = read(dir.path(), "source/lib/core_libapi.cpp");
    assert!(!libapi.contains("coreDeviceGetProperties"));
}

#[test]
fn failed_artifact_keeps_siblings() {
    let dir = TempDir::new().unwrap();
    // A directory in place of the null driver source makes that write fail.
    let blocked = dir.path().join("source/drivers/null/core_nullddi.cpp");
    fs::create_dir_all(&blocked).unwrap();
    fs::write(blocked.join("keep"), "").unwrap();

    generate(&dir, &["--debug"])
        .failure()
        .stderr(predicate::str::contains("1 artifact(s) failed"));

    assert!(dir.path().join("include/core_ddi.h").is_file());
    assert!(dir.path().join("source/loader/core_loader_internal.h").is_file());
    let manifest: Vec<String> = serde_json::from_str(&read(dir.path(), "generated.json")).unwrap();
    assert!(manifest.contains(&"source/lib/core_libapi.cpp".to_string()));
    assert!(!manifest.contains(&"source/drivers/null/core_nullddi.cpp".to_string()));
}

#[test]
fn invalid_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    generate(&dir, &["--ver", "one"])
        .failure()
        .stderr(predicate::str::contains("invalid --ver"));
}

// -- merge --

#[test]
fn merge_replaces_base_region_with_union() {
    let out = NamedTempFile::new().unwrap();
    cmd()
        .args(["merge", "--region", "factories", "--base"])
        .arg(fixture_path("internal.h"))
        .arg("-o")
        .arg(out.path())
        .arg(fixture_path("ldrddi_a.h"))
        .arg(fixture_path("ldrddi_b.h"))
        .assert()
        .success();

    let merged = fs::read_to_string(out.path()).unwrap();
    assert_eq!(
        merged,
        "class context_t\n{\npublic:\n    /// factories\n        a_device_factory_t a_device_factory;\n        b_sched_factory_t b_sched_factory;\n    /// end factories\n};\n"
    );
}

#[test]
fn merge_follows_argument_order() {
    cmd()
        .args(["merge", "--region", "factories", "--base"])
        .arg(fixture_path("internal.h"))
        .arg(fixture_path("ldrddi_b.h"))
        .arg(fixture_path("ldrddi_a.h"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "    /// factories\n        b_sched_factory_t b_sched_factory;\n        a_device_factory_t a_device_factory;\n    /// end factories",
        ));
}

#[test]
fn merge_warns_on_missing_inputs() {
    cmd()
        .args(["merge", "--region", "factories", "--base"])
        .arg(fixture_path("internal.h"))
        .arg(fixture_path("no_such_*.h"))
        .assert()
        .success()
        .stdout(predicate::str::contains("/// factories"))
        .stderr(predicate::str::contains("no files matched"));
}

#[test]
fn merge_warns_when_base_lacks_region() {
    cmd()
        .args(["merge", "--region", "missing", "--base"])
        .arg(fixture_path("internal.h"))
        .arg(fixture_path("ldrddi_a.h"))
        .assert()
        .success()
        .stdout(predicate::str::contains("stale_factory_t"))
        .stderr(predicate::str::contains("missing"));
}
