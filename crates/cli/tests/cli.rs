//! Tests for the wrf-runner binary.
//!
//! The WPS and WRF programs are replaced by shell scripts started through an
//! `sh` launcher configured in the system configuration.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const WPS_CONFIG: &str = r#"{
    "domains": [
        {
            "parent_id": 1, "parent_ratio": 1, "parent_start": [1, 1],
            "size": [74, 61], "step_size": [30000, 30000]
        },
        {"parent_id": 1, "parent_ratio": 3, "parent_start": [31, 17], "size": [112, 97]}
    ],
    "projection": {
        "type": "lambert", "ref_location": [34.83, -81.03],
        "truelat": [30.0, 60.0], "stand_lot": -98.0
    },
    "data_path": "/data/geog",
    "start_date": "2016-01-01 00:00:00",
    "end_date": "2016-01-01 06:00:00",
    "interval": 21600,
    "prefix": "FILE"
}"#;

fn wrf_runner() -> Command {
    let mut cmd = Command::cargo_bin("wrf-runner").expect("Binary should be built");
    cmd.env_remove("WPS_PATH")
        .env_remove("WRF_PATH")
        .env("RUST_LOG", "warn").env("NO_COLOR", "1");
    cmd
}

/// A WPS directory with fake programs plus a system config pointing at it.
fn fake_install(ungrib_fails: bool) -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let wps = root.path().join("WPS");
    fs::create_dir(&wps).unwrap();

    fs::write(
        wps.join("geogrid.exe"),
        concat!(
            "echo 'Processing domain 1 of 2'\n",
            "echo 'Processing domain 2 of 2'\n",
            "echo 'Successful completion of geogrid.'\n",
        ),
    )
    .unwrap();
    let ungrib = if ungrib_fails {
        "echo 'ERROR: missing input'\nexit 1\n"
    } else {
        concat!(
            "echo 'Inventory for date = 2016-01-01 00:00:00'\n",
            "echo 'Inventory for date = 2016-01-01 06:00:00'\n",
            "echo 'Successful completion of ungrib.'\n",
        )
    };
    fs::write(wps.join("ungrib.exe"), ungrib).unwrap();
    fs::write(
        wps.join("metgrid.exe"),
        concat!(
            "echo 'Processing domain 1 of 2'\n",
            "echo 'Processing domain 2 of 2'\n",
            "touch met_em.d01.2016-01-01_00:00:00.nc met_em.d01.2016-01-01_06:00:00.nc\n",
            "echo 'Successful completion of metgrid.'\n",
        ),
    )
    .unwrap();

    let wrf = root.path().join("WRF");
    fs::create_dir(&wrf).unwrap();
    fs::write(
        wrf.join("real.exe"),
        concat!(
            "test -L met_em.d01.2016-01-01_06:00:00.nc || exit 2\n",
            "echo 'Domain  1: Current date being processed: 2016-01-01_00:00:00.0000,",
            " which is loop #   1 out of    2' > rsl.error.0000\n",
            "echo 'real_em: SUCCESS COMPLETE REAL_EM INIT' >> rsl.error.0000\n",
        ),
    )
    .unwrap();
    fs::write(
        wrf.join("wrf.exe"),
        concat!(
            "grep -q 'start_hour = 0' namelist.input || exit 2\n",
            "echo 'Timing for main: time 2016-01-01_03:00:00 on domain   1:    2.61'",
            " > rsl.error.0000\n",
            "echo 'wrf: SUCCESS COMPLETE WRF' >> rsl.error.0000\n",
        ),
    )
    .unwrap();

    let config = root.path().join("wps.json");
    fs::write(&config, WPS_CONFIG).unwrap();

    let system = root.path().join("system.toml");
    fs::write(
        &system,
        format!(
            concat!(
                "wps_path = \"{}\"\nwrf_path = \"{}\"\nlog_dir = \"{}\"\n",
                "launcher = [\"sh\"]\nwrf_launcher = [\"sh\"]\n",
            ),
            wps.display(),
            wrf.display(),
            root.path().join("logs").display()
        ),
    )
    .unwrap();

    (root, config, system)
}

#[test]
fn test_generate_wps_namelist() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("wps.json");
    fs::write(&config, WPS_CONFIG).unwrap();

    wrf_runner()
        .args(["generate", "wps-namelist"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("&share\n"))
        .stdout(predicate::str::contains(" max_dom = 2\n"))
        .stdout(predicate::str::contains(" stand_lon = -98\n"));
}

#[test]
fn test_generate_wps_namelist_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("wps.json");
    fs::write(&config, WPS_CONFIG.replace("\"interval\": 21600", "\"interval\": 0")).unwrap();

    wrf_runner()
        .args(["generate", "wps-namelist", "--debug"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Interval has to be positive"));
}

#[test]
fn test_run_geogrid_success() {
    let (root, config, system) = fake_install(false);

    wrf_runner()
        .args(["run", "geogrid"])
        .arg(&config)
        .arg("--system-config")
        .arg(&system)
        .arg("--no-progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("Success."));

    let log = fs::read_to_string(root.path().join("logs").join("geogrid.log")).unwrap();
    assert!(log.contains(" - geogrid.exe - INFO - Processing domain 2 of 2"));
    assert!(root.path().join("WPS").join("namelist.wps").exists());
}

#[test]
fn test_run_wps_success() {
    let (_root, config, system) = fake_install(false);

    wrf_runner()
        .args(["run", "wps"])
        .arg(&config)
        .arg("--system-config")
        .arg(&system)
        .arg("--no-progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("Success."));
}

#[test]
fn test_run_real_and_wrf() {
    let (root, config, system) = fake_install(false);
    let wrf = root.path().join("WRF");
    let wps = root.path().join("WPS");
    fs::write(wps.join("met_em.d01.2016-01-01_06:00:00.nc"), b"").unwrap();
    std::os::unix::fs::symlink(
        wps.join("met_em.d01.2016-01-01_06:00:00.nc"),
        wrf.join("met_em.d01.2016-01-01_06:00:00.nc"),
    )
    .unwrap();

    for program in ["real", "wrf"] {
        wrf_runner()
            .args(["run", program])
            .arg(&config)
            .arg("--system-config")
            .arg(&system)
            .arg("--no-progress")
            .assert()
            .success()
            .stdout(predicate::str::contains("Success."));
    }

    let namelist = fs::read_to_string(wrf.join("namelist.input")).unwrap();
    assert!(namelist.contains(" end_hour = 6, 6\n"));
    let log = fs::read_to_string(root.path().join("logs").join("wrf.log")).unwrap();
    assert!(log.contains("SUCCESS COMPLETE WRF"));
}

#[test]
fn test_run_all() {
    let (root, config, system) = fake_install(false);

    wrf_runner()
        .args(["run", "all"])
        .arg(&config)
        .arg("--system-config")
        .arg(&system)
        .arg("--no-progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("Success."));

    let linked = root.path().join("WRF").join("met_em.d01.2016-01-01_00:00:00.nc");
    assert!(fs::symlink_metadata(linked).unwrap().file_type().is_symlink());
}

#[test]
fn test_run_real_without_metgrid_output() {
    let (_root, config, system) = fake_install(false);

    wrf_runner()
        .args(["run", "real"])
        .arg(&config)
        .arg("--system-config")
        .arg(&system)
        .arg("--no-progress")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Failure."))
        .stderr(predicate::str::contains("real failed: exit code 2"));
}

#[test]
fn test_run_wps_failure_stops_at_ungrib() {
    let (root, config, system) = fake_install(true);
    let log = root.path().join("all.log");

    wrf_runner()
        .args(["run", "wps"])
        .arg(&config)
        .arg("--system-config")
        .arg(&system)
        .arg("--log")
        .arg(&log)
        .arg("--no-progress")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Failure."))
        .stderr(predicate::str::contains("ungrib failed"));

    let content = fs::read_to_string(&log).unwrap();
    assert!(content.contains(" - geogrid.exe - "));
    assert!(content.contains(" - ungrib.exe - INFO - ERROR: missing input"));
    assert!(!content.contains(" - metgrid.exe - "));
}

#[test]
fn test_run_without_wps_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("wps.json");
    fs::write(&config, WPS_CONFIG).unwrap();

    wrf_runner()
        .args(["run", "geogrid"])
        .arg(&config)
        .arg("--no-progress")
        .assert()
        .failure()
        .stderr(predicate::str::contains("WPS directory is not configured"));
}

#[test]
fn test_link_grib() {
    let wps = tempfile::tempdir().unwrap();
    let data = tempfile::tempdir().unwrap();
    let files = ["nam_218_20160101_0600_000.grb2", "nam_218_20160101_0000_000.grb2"];
    for name in files {
        fs::write(data.path().join(name), b"GRIB").unwrap();
    }

    wrf_runner()
        .arg("link-grib")
        .arg("--wps-path")
        .arg(wps.path())
        .args(files.iter().map(|name| data.path().join(name)))
        .assert()
        .success()
        .stdout(predicate::str::contains("Linked 2 files"));

    assert_link(wps.path(), "GRIBFILE.AAA", "nam_218_20160101_0000_000.grb2");
    assert_link(wps.path(), "GRIBFILE.AAB", "nam_218_20160101_0600_000.grb2");
}

fn assert_link(wps: &Path, link: &str, target_name: &str) {
    let target = fs::read_link(wps.join(link)).expect("Link should exist");
    assert!(target.ends_with(target_name), "{link} points to {}", target.display());
}

#[test]
fn test_dataset_nam() {
    let data = tempfile::tempdir().unwrap();
    for name in ["nam_218_20160101_0000_000.grb2", "nam_218_20160101_0600_000.grb2"] {
        fs::write(data.path().join(name), b"GRIB").unwrap();
    }

    wrf_runner()
        .args(["dataset", "nam"])
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Dataset timestep: 6 h"))
        .stdout(predicate::str::contains("Dataset grid:     12 km"))
        .stdout(predicate::str::contains("Dataset start:    2016-01-01 00:00:00"))
        .stdout(predicate::str::contains("Dataset end:      2016-01-01 06:00:00"));
}

#[test]
fn test_dataset_nam_incomplete() {
    let data = tempfile::tempdir().unwrap();
    for name in ["nam_218_20160101_0000_000.grb2", "nam_218_20160101_1200_000.grb2"] {
        fs::write(data.path().join(name), b"GRIB").unwrap();
    }

    wrf_runner()
        .args(["dataset", "nam"])
        .arg(data.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("2016-01-01 06:00:00 is missing"));
}
