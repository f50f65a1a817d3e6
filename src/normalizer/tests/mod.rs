//! Normalizer tests against small hand-written dataset extracts
//!
//! Each fixture goes through the real parser first so the tests see the
//! same string table the pipeline produces.


use crate::models::{DatasetKind, ParseHints, ParsedTable, RawPayload};
use crate::parser::parse_payload;
use chrono::{NaiveDate, NaiveDateTime};

/// Parse `text` with the hints of `kind`, minus any header skip
pub fn parse_fixture(kind: DatasetKind, text: &str) -> ParsedTable {
    let hints: ParseHints = kind.parse_hints().with_skip_rows(0);
    parse_payload(&RawPayload::new(kind, text), &hints).unwrap()
}

pub fn hour(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

pub const BANCROFT_FIXTURE: &str = "\
TIMESTAMP,STARTING_DATETIME,MIDPOINT_DATETIME,ENDING_DATETIME,AirT_C,RH_pct,Station
TS,,,,Deg C,%,text
2024-01-01 00:30,2024-01-01 00:15,2024-01-01 00:22,2024-01-01 00:30,1.5,80,bancroft
2024-01-01 00:45,2024-01-01 00:30,2024-01-01 00:37,2024-01-01 00:45,2.5,NAN,bancroft
2024-01-01 01:00,2024-01-01 00:45,2024-01-01 00:52,2024-01-01 01:00,4.0,90,bancroft
";

pub const SOLAR_FIXTURE: &str = "\
Unnamed: 0,date,time,W/m2
0,2024-01-01,00:17,100
1,2024-01-01,00:42,200
2,2024-01-01,01:05,50
";

pub const PRECIP_FIXTURE: &str = "\
date,time,mm
2024-01-01,02:10,0.5
2024-01-01,02:40,1.5
2024-01-01,03:00,
";

pub const TREATMENT_FIXTURE: &str = "\
date,time,treatment,zone,temp,WC
2024-01-01,00:00,A,1,10,0.1
2024-01-01,00:00,A,2,11,0.2
2024-01-01,00:00,B,1,12,0.3
2024-01-01,00:00,B,2,13,0.4
2024-01-01,01:00,A,1,20,0.25
2024-01-01,01:30,A,1,22,0.35
2024-01-01,01:00,B,2,30,
";
