/*!
Collector naming and URL construction (spec.md §6). A collector name starting
with `rrc` is RIPE RIS; one containing `route-views` is RouteViews; anything
else is a configuration error.
*/
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};

pub const RIS_UPDATE_RES_SECS: i64 = 5 * 60;
pub const RV_UPDATE_RES_SECS: i64 = 15 * 60;

/// RIB publication cadence, in hours.
pub const RIS_RIB_CADENCE_HOURS: i64 = 8;
pub const RV_RIB_CADENCE_HOURS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Project {
    Ris,
    Rv,
}

pub fn classify_collector(rc: &str) -> Result<Project> {
    if rc.starts_with("rrc") {
        Ok(Project::Ris)
    } else if rc.contains("route-views") {
        Ok(Project::Rv)
    } else {
        Err(Error::config(format!("collector not recognized: {rc}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Rib,
    Update,
}

/// `https://data.ris.ripe.net/<rc>/<YYYY.MM>/<bview|updates>.<YYYYMMDD.HHMM>.gz`
pub fn ris_url(rc: &str, ts: DateTime<Utc>, kind: FileKind) -> String {
    let type_in_url = match kind {
        FileKind::Rib => "bview",
        FileKind::Update => "updates",
    };
    format!(
        "https://data.ris.ripe.net/{}/{}/{}.{}.gz",
        rc,
        ts.format("%Y.%m"),
        type_in_url,
        ts.format("%Y%m%d.%H%M"),
    )
}

/// `https://routeviews.org/<rc>/bgpdata/<YYYY.MM>/<RIBS|UPDATES>/<rib|updates>.<YYYYMMDD.HHMM>.bz2`
/// with `route-views2` dropping the `<rc>/` path segment.
pub fn rv_url(rc: &str, ts: DateTime<Utc>, kind: FileKind) -> String {
    let (dir_in_url, file_prefix) = match kind {
        FileKind::Rib => ("RIBS", "rib"),
        FileKind::Update => ("UPDATES", "updates"),
    };
    let rc_segment = if rc == "route-views2" {
        String::new()
    } else {
        format!("{rc}/")
    };
    format!(
        "https://routeviews.org/{}bgpdata/{}/{}/{}.{}.bz2",
        rc_segment,
        ts.format("%Y.%m"),
        dir_in_url,
        file_prefix,
        ts.format("%Y%m%d.%H%M"),
    )
}

pub fn url_for(rc: &str, ts: DateTime<Utc>, kind: FileKind) -> Result<String> {
    match classify_collector(rc)? {
        Project::Ris => Ok(ris_url(rc, ts, kind)),
        Project::Rv => Ok(rv_url(rc, ts, kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn classifies_collectors() {
        assert_eq!(classify_collector("rrc00").unwrap(), Project::Ris);
        assert_eq!(classify_collector("route-views2").unwrap(), Project::Rv);
        assert_eq!(classify_collector("route-views.linx").unwrap(), Project::Rv);
        assert!(classify_collector("bogus").is_err());
    }

    #[test]
    fn builds_ris_rib_url() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let url = ris_url("rrc00", ts, FileKind::Rib);
        assert_eq!(url, "https://data.ris.ripe.net/rrc00/2024.02/bview.20240201.0000.gz");
    }

    #[test]
    fn builds_rv_update_url_with_rc_segment() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let url = rv_url("route-views.linx", ts, FileKind::Update);
        assert_eq!(
            url,
            "https://routeviews.org/route-views.linx/bgpdata/2024.02/UPDATES/updates.20240201.0000.bz2"
        );
    }

    #[test]
    fn route_views2_drops_rc_segment() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let url = rv_url("route-views2", ts, FileKind::Rib);
        assert_eq!(
            url,
            "https://routeviews.org/bgpdata/2024.02/RIBS/rib.20240201.0000.bz2"
        );
    }
}
