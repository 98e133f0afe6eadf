//! Test fixtures for sample configurations and fake WPS installs.
//!
//! The fake programs are shell scripts run through an `sh` launcher, so no
//! test depends on a real WPS build.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wr_core::notifier::Notifier;

/// Two domains, four input times (00, 06, 12, 18 UTC).
#[allow(dead_code)]
pub const SAMPLE_WPS_CONFIG: &str = r#"{
    "domains": [
        {
            "parent_id": 1, "parent_ratio": 1, "parent_start": [1, 1],
            "size": [74, 61], "step_size": [30000, 30000]
        },
        {"parent_id": 1, "parent_ratio": 3, "parent_start": [31, 17], "size": [112, 97]}
    ],
    "projection": {
        "type": "lambert", "ref_location": [34.83, -81.03],
        "truelat": [30.0, 60.0], "stand_lon": -98.0
    },
    "data_path": "/data/geog",
    "start_date": "2016-01-01 00:00:00",
    "end_date": "2016-01-01 18:00:00",
    "interval": 21600,
    "prefix": "FILE"
}"#;

/// geogrid processing both sample domains.
#[allow(dead_code)]
pub const GEOGRID_OK: &str = r#"
echo "Parsed 22 entries in GEOGRID.TBL"
echo "Processing domain 1 of 2"
echo "  Processing XLAT_M" >&2
echo "Processing domain 2 of 2"
echo "!  Successful completion of geogrid.        !"
"#;

/// ungrib processing the four sample input times.
#[allow(dead_code)]
pub const UNGRIB_OK: &str = r#"
for hour in 00 06 12 18; do
    echo "Inventory for date = 2016-01-01 $hour:00:00"
done
echo "!  Successful completion of ungrib.   !"
"#;

/// ungrib reporting an error but exiting 0.
#[allow(dead_code)]
pub const UNGRIB_ERROR: &str = r#"
echo "Inventory for date = 2016-01-01 00:00:00"
echo "ERROR: Data not found: 2016-01-01_06:00:00.0000"
"#;

/// metgrid processing both sample domains.
#[allow(dead_code)]
pub const METGRID_OK: &str = r#"
echo "Processing domain 1 of 2"
echo "Processing domain 2 of 2"
echo "!  Successful completion of metgrid.  !"
"#;

/// Create a temporary WPS directory holding the three fake programs.
///
/// Each script also records its own name in `runs.txt` so tests can check
/// which programs were started.
#[allow(dead_code)]
pub fn create_fake_wps(geogrid: &str, ungrib: &str, metgrid: &str) -> std::io::Result<TempDir> {
    let dir = tempfile::tempdir()?;
    for (program, body) in [("geogrid", geogrid), ("ungrib", ungrib), ("metgrid", metgrid)] {
        let script = format!("echo {program} >> runs.txt\n{body}");
        std::fs::write(dir.path().join(format!("{program}.exe")), script)?;
    }
    Ok(dir)
}

/// Programs started in a fake WPS directory, in start order.
#[allow(dead_code)]
pub fn started_programs(wps_dir: &Path) -> Vec<String> {
    std::fs::read_to_string(wps_dir.join("runs.txt"))
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Write `content` to `dir/name` and return the path.
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write fixture file");
    path
}

/// Records every progress update it receives.
#[derive(Debug, Default)]
pub struct ProgressRecorder {
    calls: Mutex<Vec<(u32, u32)>>,
}

#[allow(dead_code)]
impl ProgressRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl Notifier for ProgressRecorder {
    fn on_progress(&self, current: u32, total: u32) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((current, total));
        }
    }
}
