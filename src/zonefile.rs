/*!
Loading zone data from a simple line-oriented master file into a
[`Namedb`]. One record per line:

```text
<owner> <TYPE> <ttl> <rdata...>
```

This is a deliberately small subset of RFC 1035 master file syntax —
type mnemonics instead of a full zone-file grammar with `$ORIGIN`,
multi-line parenthesized records, or relative-name inheritance between
lines. Full master-file parsing is a parser project in its own right;
this loader exists to get zone content into the db for the record
types this nameserver supports.
*/

use crate::db::rdata::{MxData, RData, SoaData};
use crate::db::types::*;
use crate::db::Namedb;
use crate::name::Name;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZoneFileError {
    #[error("reading {0}: {1}")]
    Io(String, std::io::Error),
    #[error("line {0}: {1}")]
    Line(usize, String),
}

pub fn load_zone(db: &mut Namedb, origin: &str, path: &Path) -> Result<ZoneId, ZoneFileError> {
    let text = std::fs::read_to_string(path).map_err(|e| ZoneFileError::Io(path.display().to_string(), e))?;
    let apex_name = Name::from_text(origin).map_err(|_| ZoneFileError::Line(0, format!("bad origin {origin}")))?;
    let zone_id = db.add_zone(&apex_name);

    for (lineno, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        parse_line(db, zone_id, &fields).map_err(|e| ZoneFileError::Line(lineno + 1, e))?;
    }
    Ok(zone_id)
}

fn parse_line(db: &mut Namedb, zone_id: ZoneId, fields: &[&str]) -> Result<(), String> {
    let owner_text = fields.first().ok_or("missing owner")?;
    let rtype_text = fields.get(1).ok_or("missing type")?;
    let ttl: u32 = fields.get(2).ok_or("missing ttl")?.parse().map_err(|_| "bad ttl".to_string())?;
    let rdata_fields = &fields[3.min(fields.len())..];

    let owner = Name::from_text(owner_text).map_err(|_| format!("bad owner name {owner_text}"))?;
    let rtype = type_from_mnemonic(rtype_text).ok_or_else(|| format!("unsupported type {rtype_text}"))?;

    let rdata = parse_rdata(db, rtype, rdata_fields)?;
    db.insert_rr(zone_id, &owner, rtype, CLASS_IN, ttl, rdata);

    if owner == *db.name_of(db.zone(zone_id).apex) {
        db.note_apex_rrset(zone_id, rtype);
    }
    Ok(())
}

fn type_from_mnemonic(s: &str) -> Option<RrType> {
    Some(match s.to_ascii_uppercase().as_str() {
        "A" => TYPE_A,
        "AAAA" => TYPE_AAAA,
        "NS" => TYPE_NS,
        "CNAME" => TYPE_CNAME,
        "DNAME" => TYPE_DNAME,
        "SOA" => TYPE_SOA,
        "PTR" => TYPE_PTR,
        "MX" => TYPE_MX,
        "TXT" => TYPE_TXT,
        "HINFO" => TYPE_HINFO,
        _ => return None,
    })
}

fn parse_rdata(db: &mut Namedb, rtype: RrType, fields: &[&str]) -> Result<RData, String> {
    let name_field = |s: &str| -> Result<NodeId, String> {
        let n = Name::from_text(s).map_err(|_| format!("bad name {s}"))?;
        Ok(db.ensure_node(&n))
    };

    Ok(match rtype {
        TYPE_A => {
            let addr = Ipv4Addr::from_str(fields.first().ok_or("missing address")?).map_err(|e| e.to_string())?;
            RData::A(addr)
        }
        TYPE_AAAA => {
            let addr = Ipv6Addr::from_str(fields.first().ok_or("missing address")?).map_err(|e| e.to_string())?;
            RData::Aaaa(addr)
        }
        TYPE_NS => RData::Ns(name_field(fields.first().ok_or("missing nsdname")?)?),
        TYPE_CNAME => RData::Cname(name_field(fields.first().ok_or("missing cname")?)?),
        TYPE_DNAME => RData::Dname(name_field(fields.first().ok_or("missing target")?)?),
        TYPE_PTR => RData::Ptr(name_field(fields.first().ok_or("missing ptrdname")?)?),
        TYPE_MX => {
            let preference: u16 = fields.first().ok_or("missing preference")?.parse().map_err(|_| "bad preference")?;
            let exchange = name_field(fields.get(1).ok_or("missing exchange")?)?;
            RData::Mx(MxData { preference, exchange })
        }
        TYPE_SOA => {
            if fields.len() < 7 {
                return Err("SOA needs mname rname serial refresh retry expire minimum".to_string());
            }
            let mname = name_field(fields[0])?;
            let rname = name_field(fields[1])?;
            let parse_u32 = |s: &str| s.parse::<u32>().map_err(|_| format!("bad integer {s}"));
            RData::Soa(SoaData {
                mname,
                rname,
                serial: parse_u32(fields[2])?,
                refresh: parse_u32(fields[3])?,
                retry: parse_u32(fields[4])?,
                expire: parse_u32(fields[5])?,
                minimum: parse_u32(fields[6])?,
            })
        }
        TYPE_TXT => RData::Txt(vec![fields.join(" ").into_bytes()]),
        TYPE_HINFO => {
            let cpu = fields.first().ok_or("missing cpu")?.as_bytes().to_vec();
            let os = fields.get(1).ok_or("missing os")?.as_bytes().to_vec();
            RData::Hinfo { cpu, os }
        }
        other => RData::Unknown { rtype: other, raw: Vec::new() },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_minimal_zone() {
        let mut file = tempfile();
        writeln!(file, "example.com. SOA 3600 ns.example.com. hostmaster.example.com. 1 3600 900 604800 86400").unwrap();
        writeln!(file, "example.com. NS 3600 ns.example.com.").unwrap();
        writeln!(file, "ns.example.com. A 3600 192.0.2.1").unwrap();
        writeln!(file, "www.example.com. A 3600 192.0.2.2").unwrap();
        file.flush().unwrap();

        let mut db = Namedb::new();
        let zone_id = load_zone(&mut db, "example.com", file.path()).unwrap();
        assert!(db.zone(zone_id).is_ok());

        let www = Name::from_text("www.example.com").unwrap();
        match db.find_closest(&www) {
            crate::db::Encloser::Exact(id) => assert!(db.node(id).rrset(zone_id, TYPE_A, CLASS_IN).is_some()),
            _ => panic!("expected www.example.com to exist"),
        }
    }

    fn tempfile() -> std::fs::File {
        let path = std::env::temp_dir().join(format!("authdns-test-{:?}.zone", std::thread::current().id()));
        std::fs::File::create(path).unwrap()
    }
}
