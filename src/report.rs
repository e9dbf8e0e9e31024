//! Ownship (0x0A) and Traffic (0x14) reports
//!
//! Both reports share one 28-byte layout:
//!
//! | bytes  | field                                             |
//! |--------|---------------------------------------------------|
//! | 0      | message ID                                        |
//! | 1      | alert status (high nibble), address type (low)    |
//! | 2..5   | ICAO address                                      |
//! | 5..8   | latitude, 24-bit signed                           |
//! | 8..11  | longitude, 24-bit signed                          |
//! | 11..13 | altitude (12 bits), misc indicators (4 bits)      |
//! | 13     | NIC (high nibble), NACp (low nibble)              |
//! | 14..17 | ground speed (12 bits), vertical velocity (12)    |
//! | 17     | track/heading                                     |
//! | 18     | emitter category                                  |
//! | 19..27 | callsign                                          |
//! | 27     | emergency/priority code (high nibble)             |

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::frame::frame;
use crate::gdl90::{
    encode_altitude12, encode_lat_lon24, encode_track8, encode_u12, encode_vvel12, msg_id,
    put_speed_vvel, sanitize_callsign,
};
use crate::icao::Icao;

/// Length of an Ownship or Traffic report, message ID included.
pub const REPORT_LEN: usize = 28;

/// Default emitter category: light aircraft (< 15 500 lbs).
pub const EMITTER_LIGHT: u8 = 0x01;

// Misc indicator bits, low nibble of byte 12.
const MISC_TRUE_TRACK: u8 = 0x01;
const MISC_EXTRAPOLATED: u8 = 0x04;
const MISC_AIRBORNE: u8 = 0x08;

/// This aircraft's own state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ownship {
    pub icao: Icao,
    pub lat_deg: f64,
    pub lon_deg: f64,
    /// Pressure altitude in feet
    pub alt_feet: i32,
    /// `(nic, nacp)`; 8/8 is sent when unknown
    pub nic_nacp: Option<(u8, u8)>,
    pub ground_kt: i32,
    pub track_deg: f64,
    pub on_ground: bool,
    /// Vertical velocity in ft/min, `None` when unavailable
    pub vvel_fpm: Option<i32>,
    pub callsign: String,
    pub emitter: u8,
    pub emergency: u8,
}

/// Another aircraft's state, as held by the store and sent in a Traffic
/// Report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Traffic {
    /// Address type (0 = ADS-B with ICAO address)
    pub addr_type: u8,
    pub icao: Icao,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_feet: i32,
    pub nic: u8,
    pub nacp: u8,
    pub ground_kt: i32,
    pub track_deg: f64,
    /// Vertical velocity in ft/min
    pub vvel_fpm: i32,
    pub on_ground: bool,
    pub extrapolated: bool,
    pub emitter_category: u8,
    pub tail: String,
    pub priority_status: u8,
}

impl Traffic {
    /// A position of exactly (0, 0) is treated as "no fix".
    pub fn has_position(&self) -> bool {
        !(self.lat_deg == 0.0 && self.lon_deg == 0.0)
    }
}

/// Fields that differ between the two report kinds.
struct ReportHeader {
    id: u8,
    status_addr: u8,
    misc: u8,
    nic_nacp: u8,
    emitter: u8,
    priority: u8,
}

/// Shared body fields of both report kinds.
struct ReportBody<'a> {
    icao: Icao,
    lat_deg: f64,
    lon_deg: f64,
    alt_feet: i32,
    ground_kt: i32,
    vvel: u16,
    track_deg: f64,
    callsign: &'a str,
}

fn encode_report(h: ReportHeader, b: ReportBody<'_>) -> Bytes {
    let alt = encode_altitude12(b.alt_feet);

    let mut msg = BytesMut::with_capacity(REPORT_LEN);
    msg.put_u8(h.id);
    msg.put_u8(h.status_addr);
    msg.put_slice(&b.icao.0);
    msg.put_slice(&encode_lat_lon24(b.lat_deg));
    msg.put_slice(&encode_lat_lon24(b.lon_deg));
    msg.put_u8(((alt & 0xFF0) >> 4) as u8);
    msg.put_u8((((alt & 0x00F) << 4) as u8) | (h.misc & 0x0F));
    msg.put_u8(h.nic_nacp);
    put_speed_vvel(&mut msg, encode_u12(b.ground_kt), b.vvel);
    msg.put_u8(encode_track8(b.track_deg));
    msg.put_u8(if h.emitter == 0 { EMITTER_LIGHT } else { h.emitter });
    msg.put_slice(&sanitize_callsign(b.callsign));
    msg.put_u8((h.priority & 0x0F) << 4);
    debug_assert_eq!(msg.len(), REPORT_LEN);
    frame(&msg)
}

fn nic_nacp_byte(nic: u8, nacp: u8) -> u8 {
    ((nic & 0x0F) << 4) | (nacp & 0x0F)
}

/// Ownship Report (0x0A).
///
/// Address type is ADS-B with ICAO address, no alert. The track is always
/// flagged as true track.
pub fn ownship_report(o: &Ownship) -> Bytes {
    let mut misc = MISC_TRUE_TRACK;
    if !o.on_ground {
        misc |= MISC_AIRBORNE;
    }
    let nic_nacp = match o.nic_nacp {
        Some((nic, nacp)) => nic_nacp_byte(nic, nacp),
        None => 0x88,
    };

    encode_report(
        ReportHeader {
            id: msg_id::OWNSHIP_REPORT,
            status_addr: 0x00,
            misc,
            nic_nacp,
            emitter: o.emitter,
            priority: o.emergency,
        },
        ReportBody {
            icao: o.icao,
            lat_deg: o.lat_deg,
            lon_deg: o.lon_deg,
            alt_feet: o.alt_feet,
            ground_kt: o.ground_kt,
            vvel: encode_vvel12(o.vvel_fpm),
            track_deg: o.track_deg,
            callsign: &o.callsign,
        },
    )
}

/// Traffic Report (0x14).
///
/// The alert bit is never set; the extrapolated indicator follows
/// [`Traffic::extrapolated`].
pub fn traffic_report(t: &Traffic) -> Bytes {
    let mut misc = MISC_TRUE_TRACK;
    if t.extrapolated {
        misc |= MISC_EXTRAPOLATED;
    }
    if !t.on_ground {
        misc |= MISC_AIRBORNE;
    }

    encode_report(
        ReportHeader {
            id: msg_id::TRAFFIC_REPORT,
            status_addr: t.addr_type & 0x0F,
            misc,
            nic_nacp: nic_nacp_byte(t.nic, t.nacp),
            emitter: t.emitter_category,
            priority: t.priority_status,
        },
        ReportBody {
            icao: t.icao,
            lat_deg: t.lat_deg,
            lon_deg: t.lon_deg,
            alt_feet: t.alt_feet,
            ground_kt: t.ground_kt,
            vvel: encode_vvel12(Some(t.vvel_fpm)),
            track_deg: t.track_deg,
            callsign: &t.tail,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::unframe;
    use hex_literal::hex;

    fn unframe_ok(f: &[u8]) -> Vec<u8> {
        let u = unframe(f).unwrap();
        assert!(u.crc_ok);
        u.message.to_vec()
    }

    fn golden_ownship() -> Ownship {
        Ownship {
            icao: Icao([0x01, 0x02, 0x03]),
            lat_deg: 45.0,
            lon_deg: -90.0,
            alt_feet: 0,
            nic_nacp: Some((8, 8)),
            ground_kt: 100,
            track_deg: 90.0,
            callsign: "N12345".to_string(),
            emitter: 0x01,
            ..Default::default()
        }
    }

    #[test]
    fn test_golden_ownship_report() {
        let msg = unframe_ok(&ownship_report(&golden_ownship()));
        let want = hex!(
            "0A"
            "00"
            "01 02 03"
            "20 00 00" // lat 45
            "C0 00 00" // lon -90
            "02 89"    // alt 0 ft => 0x028, airborne + true track
            "88"
            "06 48 00" // gs 100, vvel unknown
            "40"       // track 90
            "01"
            "4E 31 32 33 34 35 20 20" // "N12345  "
            "00"
        );
        assert_eq!(msg, want);
    }

    #[test]
    fn test_ownship_defaults_and_flags() {
        let o = Ownship {
            on_ground: true,
            nic_nacp: None,
            emitter: 0,
            emergency: 0x03,
            vvel_fpm: Some(-128),
            callsign: String::new(),
            ..golden_ownship()
        };
        let msg = unframe_ok(&ownship_report(&o));
        assert_eq!(msg.len(), REPORT_LEN);
        assert_eq!(msg[12] & 0x0F, MISC_TRUE_TRACK);
        assert_eq!(msg[13], 0x88);
        // gs low nibble 0x4, vvel -2 => 0xFFE
        assert_eq!(&msg[14..17], &[0x06, 0x4F, 0xFE]);
        assert_eq!(msg[18], EMITTER_LIGHT);
        assert_eq!(&msg[19..27], b"STRATUX ");
        assert_eq!(msg[27], 0x30);
    }

    #[test]
    fn test_golden_traffic_report() {
        let msg = unframe_ok(&traffic_report(&Traffic {
            addr_type: 0x00,
            icao: Icao([0x0A, 0x0B, 0x0C]),
            lat_deg: 45.0,
            lon_deg: -90.0,
            alt_feet: 0,
            nic: 8,
            nacp: 7,
            ground_kt: 120,
            track_deg: 90.0,
            vvel_fpm: 0,
            on_ground: false,
            extrapolated: false,
            emitter_category: 0x01,
            tail: "TGT0001".to_string(),
            priority_status: 0,
        }));
        let want = hex!(
            "14"
            "00"
            "0A 0B 0C"
            "20 00 00"
            "C0 00 00"
            "02 89"
            "87"
            "07 80 00" // spd 120, vvel 0
            "40"
            "01"
            "54 47 54 30 30 30 31 20" // "TGT0001 "
            "00"
        );
        assert_eq!(msg, want);
    }

    #[test]
    fn test_traffic_indicator_bits() {
        let t = Traffic {
            icao: Icao([0xA1, 0xB2, 0xC3]),
            addr_type: 0x12,
            extrapolated: true,
            on_ground: true,
            alt_feet: -5000,
            vvel_fpm: -1000,
            ground_kt: 66,
            tail: "test123".to_string(),
            priority_status: 0x01,
            ..Default::default()
        };
        let msg = unframe_ok(&traffic_report(&t));
        // Alert nibble is masked off.
        assert_eq!(msg[1], 0x02);
        assert_eq!(msg[11], 0xFF);
        assert_eq!(msg[12], 0xF0 | MISC_TRUE_TRACK | MISC_EXTRAPOLATED);
        assert_eq!(&msg[14..17], &[0x04, 0x2F, 0xF0]);
        assert_eq!(&msg[19..27], b"TEST123 ");
        assert_eq!(msg[27], 0x10);
    }

    #[test]
    fn test_has_position() {
        assert!(!Traffic::default().has_position());
        assert!(Traffic { lat_deg: 0.0, lon_deg: 1.0, ..Default::default() }.has_position());
    }
}
