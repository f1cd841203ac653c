/*!
Textual record types matching the external MRT decoder's `|`-delimited output
contract (spec.md §6):

```text
field [1] unix timestamp (fractional seconds)
field [2] type ('A' or 'W')
field [3] peer_ip
field [4] peer_asn
field [5] prefix
field [6] as_path
```

RIB records reuse fields `[3..6]` (peer_ip, peer_asn, prefix, as_path); update
records additionally carry the timestamp and type in fields `[1]` and `[2]`.
*/
use crate::error::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};

/// A single RIB-dump entry: `(peer_ip, peer_asn, prefix, as_path)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RibRecord {
    pub peer_ip: String,
    pub peer_asn: u32,
    pub prefix: String,
    pub as_path: String,
}

impl RibRecord {
    /// Parse a single `|`-delimited RIB line produced by the external
    /// decoder. RIB records reuse fields `[3..6]`: peer_ip, peer_asn, prefix,
    /// as_path (the same indices update records use, since fields `[1]`/`[2]`
    /// are still the timestamp and the `B` entry-type marker).
    pub fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.trim_end().split('|').collect();
        if fields.len() < 7 {
            return Err(Error::MalformedRecord(line.to_string()));
        }
        let peer_ip = fields[3].to_string();
        let peer_asn = fields[4]
            .parse::<u32>()
            .map_err(|_| Error::MalformedRecord(line.to_string()))?;
        let prefix = fields[5].to_string();
        let as_path = fields[6].to_string();
        Ok(RibRecord {
            peer_ip,
            peer_asn,
            prefix,
            as_path,
        })
    }
}

/// Announcement (`A`) or withdrawal (`W`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Announcement,
    Withdrawal,
}

/// A single update-stream entry.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRecord {
    pub ts: DateTime<Utc>,
    pub kind: RecordKind,
    pub peer_ip: String,
    pub peer_asn: u32,
    pub prefix: String,
    pub as_path: String,
}

impl UpdateRecord {
    /// Parse a single `|`-delimited update line produced by the external
    /// decoder. Withdrawals carry 6 fields, announcements 15; this parser
    /// only requires the fields the reconstruction engine actually reads.
    pub fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.trim_end().split('|').collect();
        if fields.len() < 6 {
            return Err(Error::MalformedRecord(line.to_string()));
        }

        let ts_secs: f64 = fields[1]
            .parse()
            .map_err(|_| Error::MalformedRecord(line.to_string()))?;
        let ts = Utc
            .timestamp_opt(ts_secs.floor() as i64, 0)
            .single()
            .ok_or_else(|| Error::MalformedRecord(line.to_string()))?;

        let kind = match fields[2] {
            "A" => RecordKind::Announcement,
            "W" => RecordKind::Withdrawal,
            other => return Err(Error::MalformedRecord(format!("unknown type {other}"))),
        };

        let peer_ip = fields[3].to_string();
        let prefix = fields[5].to_string();

        match kind {
            RecordKind::Withdrawal => Ok(UpdateRecord {
                ts,
                kind,
                peer_ip,
                peer_asn: 0,
                prefix,
                as_path: String::new(),
            }),
            RecordKind::Announcement => {
                if fields.len() < 7 {
                    return Err(Error::MalformedRecord(line.to_string()));
                }
                let peer_asn = fields[4]
                    .parse::<u32>()
                    .map_err(|_| Error::MalformedRecord(line.to_string()))?;
                let as_path = fields[6].to_string();
                Ok(UpdateRecord {
                    ts,
                    kind,
                    peer_ip,
                    peer_asn,
                    prefix,
                    as_path,
                })
            }
        }
    }
}

/// Classify a prefix or peer IP as IPv4 or IPv6, per spec.md §3 ("classified
/// IPv4 if it contains `.` else IPv6 if it contains `:`"). Decoded records
/// are well-formed in practice, so `ipnet::IpNet` parsing (the teacher's own
/// representation for a prefix, see `models/network/prefix.rs`) is tried
/// first; the textual rule is the fallback for bare IPs and anything that
/// fails to parse as a `/len` network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

pub fn classify(text: &str) -> AddressFamily {
    if let Ok(net) = text.parse::<ipnet::IpNet>() {
        return match net {
            ipnet::IpNet::V4(_) => AddressFamily::V4,
            ipnet::IpNet::V6(_) => AddressFamily::V6,
        };
    }
    if text.contains('.') {
        AddressFamily::V4
    } else {
        AddressFamily::V6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rib_line() {
        let line = "TABLE_DUMP2|1234567890|B|1.2.3.4|100|10.0.0.0/24|100 200 300|IGP|||||";
        let rec = RibRecord::parse_line(line).unwrap();
        assert_eq!(rec.peer_ip, "1.2.3.4");
        assert_eq!(rec.peer_asn, 100);
        assert_eq!(rec.prefix, "10.0.0.0/24");
        assert_eq!(rec.as_path, "100 200 300");
    }

    #[test]
    fn parses_announcement() {
        let line = "BGP4MP|1000.5|A|1.2.3.4|100|10.0.0.0/24|100 200 300|IGP|1.2.3.4|0|0|||";
        let rec = UpdateRecord::parse_line(line).unwrap();
        assert_eq!(rec.kind, RecordKind::Announcement);
        assert_eq!(rec.peer_asn, 100);
        assert_eq!(rec.as_path, "100 200 300");
        assert_eq!(rec.ts.timestamp(), 1000);
    }

    #[test]
    fn parses_withdrawal() {
        let line = "BGP4MP|1000|W|1.2.3.4|100|10.0.0.0/8|";
        let rec = UpdateRecord::parse_line(line).unwrap();
        assert_eq!(rec.kind, RecordKind::Withdrawal);
        assert_eq!(rec.prefix, "10.0.0.0/8");
    }

    #[test]
    fn classifies_family() {
        assert_eq!(classify("10.0.0.0/24"), AddressFamily::V4);
        assert_eq!(classify("2001:db8::/32"), AddressFamily::V6);
    }
}
