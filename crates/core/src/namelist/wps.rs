//! `namelist.wps` generation from a validated WPS configuration.

use crate::config::ValidatedWpsConfig;
use crate::namelist::{Namelist, NamelistValue};
use chrono::NaiveDateTime;

/// File name the WPS programs read their configuration from.
pub const WPS_NAMELIST_FILE: &str = "namelist.wps";

const WPS_DATE_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Build the `share`, `ungrib`, `metgrid` and `geogrid` sections.
pub fn wps_namelist(validated: &ValidatedWpsConfig) -> Namelist {
    let config = validated.config();
    let domains = &config.domains;
    let per_domain = |date: NaiveDateTime| {
        NamelistValue::List(vec![
            NamelistValue::from(date.format(WPS_DATE_FORMAT).to_string());
            domains.len()
        ])
    };
    let [dx, dy] = validated.step_size();

    let mut namelist = Namelist::new();

    namelist
        .section_mut("share")
        .set("start_date", per_domain(validated.start()))
        .set("end_date", per_domain(validated.end()))
        .set("interval_seconds", config.interval)
        .set("wrf_core", "ARW")
        .set("max_dom", validated.domain_count())
        .set("io_form_geogrid", 2u32);

    namelist
        .section_mut("ungrib")
        .set("out_format", "WPS")
        .set("prefix", config.prefix.as_str());

    namelist
        .section_mut("metgrid")
        .set("fg_name", config.prefix.as_str())
        .set("io_form_metgrid", 2u32);

    namelist
        .section_mut("geogrid")
        .set("parent_id", domains.iter().map(|d| d.parent_id).collect::<Vec<_>>())
        .set("parent_grid_ratio", domains.iter().map(|d| d.parent_ratio).collect::<Vec<_>>())
        .set("i_parent_start", domains.iter().map(|d| d.parent_start[0]).collect::<Vec<_>>())
        .set("j_parent_start", domains.iter().map(|d| d.parent_start[1]).collect::<Vec<_>>())
        .set("e_we", domains.iter().map(|d| d.size[0]).collect::<Vec<_>>())
        .set("e_sn", domains.iter().map(|d| d.size[1]).collect::<Vec<_>>())
        .set("geog_data_res", "default")
        .set("dx", dx)
        .set("dy", dy)
        .set("map_proj", config.projection.kind.as_str())
        .set("ref_lat", config.projection.ref_location[0])
        .set("ref_lon", config.projection.ref_location[1])
        .set("truelat1", config.projection.truelat[0])
        .set("truelat2", config.projection.truelat[1])
        .set("stand_lon", config.projection.stand_lon)
        .set("geog_data_path", config.data_path.as_str());

    namelist
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use wr_protocol::config_models::{Domain, Projection, WpsConfig, WrfSettings};

    pub(crate) fn two_domain_config() -> ValidatedWpsConfig {
        ValidatedWpsConfig::new(WpsConfig {
            domains: vec![
                Domain {
                    parent_id: 1,
                    parent_ratio: 1,
                    parent_start: [1, 1],
                    size: [74, 61],
                    step_size: Some([30000.0, 30000.0]),
                },
                Domain {
                    parent_id: 1,
                    parent_ratio: 3,
                    parent_start: [31, 17],
                    size: [112, 97],
                    step_size: None,
                },
            ],
            projection: Projection {
                kind: "lambert".to_string(),
                ref_location: [34.83, -81.03],
                truelat: [30.0, 60.0],
                stand_lon: -98.5,
            },
            data_path: "/data/geog".to_string(),
            start_date: "2016-01-01 00:00:00".to_string(),
            end_date: "2016-01-02 00:00:00".to_string(),
            interval: 21600,
            prefix: "FILE".to_string(),
            wrf: WrfSettings::default(),
        })
        .unwrap()
    }

    #[test]
    fn test_wps_namelist_rendering() {
        let rendered = wps_namelist(&two_domain_config()).render();

        insta::assert_snapshot!(rendered, @r"
        &share
         start_date = '2016-01-01_00:00:00', '2016-01-01_00:00:00'
         end_date = '2016-01-02_00:00:00', '2016-01-02_00:00:00'
         interval_seconds = 21600
         wrf_core = 'ARW'
         max_dom = 2
         io_form_geogrid = 2
        /

        &ungrib
         out_format = 'WPS'
         prefix = 'FILE'
        /

        &metgrid
         fg_name = 'FILE'
         io_form_metgrid = 2
        /

        &geogrid
         parent_id = 1, 1
         parent_grid_ratio = 1, 3
         i_parent_start = 1, 31
         j_parent_start = 1, 17
         e_we = 74, 112
         e_sn = 61, 97
         geog_data_res = 'default'
         dx = 30000
         dy = 30000
         map_proj = 'lambert'
         ref_lat = 34.83
         ref_lon = -81.03
         truelat1 = 30
         truelat2 = 60
         stand_lon = -98.5
         geog_data_path = '/data/geog'
        /
        ");
    }

    #[test]
    fn test_wps_namelist_section_order() {
        let namelist = wps_namelist(&two_domain_config());
        let names: Vec<_> = namelist.sections().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["share", "ungrib", "metgrid", "geogrid"]);
        assert!(namelist.render().ends_with("/\n"));
    }
}
