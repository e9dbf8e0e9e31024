//! GDL90 field encoders and the fixed-layout status messages
//!
//! Every encoder here is a pure function returning a complete frame. Numeric
//! fields never fail: out-of-range values clamp or become the protocol's
//! "unavailable" sentinel.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Timelike, Utc};

use crate::frame::frame;

/// Message IDs produced by this crate.
pub mod msg_id {
    pub const HEARTBEAT: u8 = 0x00;
    pub const UPLINK: u8 = 0x07;
    pub const OWNSHIP_REPORT: u8 = 0x0A;
    pub const OWNSHIP_GEO_ALTITUDE: u8 = 0x0B;
    pub const TRAFFIC_REPORT: u8 = 0x14;
    pub const FOREFLIGHT: u8 = 0x65;
    pub const FOREFLIGHT_ID: u8 = 0x00;
    pub const FOREFLIGHT_AHRS: u8 = 0x01;
    pub const VENDOR_HEARTBEAT: u8 = 0xCC;
    /// Prefix of the "LE" AHRS report.
    pub const AHRS_LE_PREFIX: [u8; 4] = [0x4C, 0x45, 0x01, 0x01];
}

/// Degrees per LSB of a 24-bit latitude/longitude.
pub const LAT_LON_RESOLUTION: f64 = 180.0 / 8_388_608.0; // 2^23
/// Degrees per LSB of an 8-bit track.
pub const TRACK_RESOLUTION: f64 = 360.0 / 256.0;
/// Altitude sentinel for "invalid or unavailable".
pub const ALTITUDE_UNAVAILABLE: u16 = 0xFFF;
/// Vertical velocity sentinel for "no information".
pub const VVEL_UNAVAILABLE: u16 = 0x800;
/// Used when a callsign or tail is empty.
pub const FALLBACK_CALLSIGN: &str = "STRATUX";
/// Size of a UAT uplink block relayed in an Uplink message.
pub const UPLINK_PAYLOAD_LEN: usize = 432;

const LAT_LON_MAX: i32 = 0x7F_FFFF;
const LAT_LON_MIN: i32 = -0x80_0000;

/// Encode degrees as a signed 24-bit big-endian value, truncating toward zero.
pub fn encode_lat_lon24(deg: f64) -> [u8; 3] {
    // `as` truncates toward zero and saturates, NaN becomes 0.
    let wk = ((deg / LAT_LON_RESOLUTION) as i32).clamp(LAT_LON_MIN, LAT_LON_MAX);
    let [_, b0, b1, b2] = (wk as u32 & 0x00FF_FFFF).to_be_bytes();
    [b0, b1, b2]
}

/// Encode pressure altitude: 25 ft steps offset by +1000 ft.
pub fn encode_altitude12(alt_feet: i32) -> u16 {
    if !(-1000..=101_350).contains(&alt_feet) {
        return ALTITUDE_UNAVAILABLE;
    }
    ((alt_feet + 1000) / 25) as u16 & 0x0FFF
}

/// Clamp a value into an unsigned 12-bit field.
pub fn encode_u12(v: i32) -> u16 {
    v.clamp(0, 0xFFF) as u16
}

/// Encode a track or heading in 360/256 degree steps.
///
/// Input is normalized into [0, 360) first; the top half-bucket below 360
/// stays at 255 so the result never wraps to 256.
pub fn encode_track8(deg: f64) -> u8 {
    let deg = deg.rem_euclid(360.0);
    let idx = ((deg + TRACK_RESOLUTION / 2.0) / TRACK_RESOLUTION).floor();
    idx.min(255.0) as u8
}

/// Encode a vertical velocity in 64 fpm steps as a 12-bit two's complement.
pub fn encode_vvel12(fpm: Option<i32>) -> u16 {
    match fpm {
        Some(fpm) => {
            let steps = (fpm as f64 / 64.0).round().clamp(-2047.0, 2047.0) as i16;
            steps as u16 & 0x0FFF
        }
        None => VVEL_UNAVAILABLE,
    }
}

/// Normalize a callsign/tail into the 8-byte `[0-9A-Z ]` field.
pub fn sanitize_callsign(s: &str) -> [u8; 8] {
    let s = if s.is_empty() { FALLBACK_CALLSIGN } else { s };
    let mut out = [b' '; 8];
    for (dst, b) in out.iter_mut().zip(s.bytes()) {
        let c = b.to_ascii_uppercase();
        if c.is_ascii_digit() || c.is_ascii_uppercase() || c == b' ' {
            *dst = c;
        }
    }
    out
}

/// Degrees to tenths of a degree, rounded and clamped to i16.
pub fn deg10(deg: f64) -> i16 {
    (deg * 10.0).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Write a 12-bit ground speed and a 12-bit vertical velocity into the
/// three bytes they share.
pub(crate) fn put_speed_vvel(buf: &mut BytesMut, speed: u16, vvel: u16) {
    buf.put_u8(((speed & 0xFF0) >> 4) as u8);
    buf.put_u8((((speed & 0x00F) << 4) as u8) | ((vvel & 0xF00) >> 8) as u8);
    buf.put_u8((vvel & 0x0FF) as u8);
}

/// Heartbeat (0x00) for the given UTC time.
///
/// Status byte 1: UAT initialized (bit 0), address talkback (bit 4),
/// maintenance required (bit 6), GPS position valid (bit 7).
pub fn heartbeat(now: DateTime<Utc>, gps_valid: bool, maintenance_required: bool) -> Bytes {
    let mut status1 = 0x01 | 0x10;
    if gps_valid {
        status1 |= 0x80;
    }
    if maintenance_required {
        status1 |= 0x40;
    }

    let seconds = now.num_seconds_from_midnight();

    let mut msg = BytesMut::with_capacity(7);
    msg.put_u8(msg_id::HEARTBEAT);
    msg.put_u8(status1);
    // Status byte 2: timestamp bit 16 in bit 7, UTC OK in bit 0.
    msg.put_u8((((seconds >> 16) & 0x01) << 7) as u8 | 0x01);
    msg.put_u16_le((seconds & 0xFFFF) as u16);
    // Uplink/basic-long message counts.
    msg.put_u16(0);
    frame(&msg)
}

/// Vendor heartbeat (0xCC) advertising AHRS/GPS validity.
pub fn vendor_heartbeat(gps_valid: bool, ahrs_valid: bool) -> Bytes {
    const PROTOCOL_VERSION: u8 = 1;

    let mut b = PROTOCOL_VERSION << 2;
    if ahrs_valid {
        b |= 0x01;
    }
    if gps_valid {
        b |= 0x02;
    }
    frame(&[msg_id::VENDOR_HEARTBEAT, b])
}

/// Device names reported in the ID message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Up to 8 bytes; EFBs key AHRS support off this name
    pub short_name: String,
    /// Up to 16 bytes
    pub long_name: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            short_name: "Stratux".to_string(),
            long_name: "GDL90-Relay".to_string(),
        }
    }
}

fn put_name(buf: &mut BytesMut, name: &str, fallback: &str, width: usize) {
    let name = match name.trim() {
        "" => fallback,
        n => n,
    };
    let bytes = &name.as_bytes()[..name.len().min(width)];
    buf.put_slice(bytes);
    buf.put_bytes(0, width - bytes.len());
}

/// ForeFlight ID message (0x65, sub-ID 0x00).
pub fn id_message(identity: &Identity) -> Bytes {
    let defaults = Identity::default();

    let mut msg = BytesMut::with_capacity(39);
    msg.put_u8(msg_id::FOREFLIGHT);
    msg.put_u8(msg_id::FOREFLIGHT_ID);
    msg.put_u8(0x01); // version
    msg.put_bytes(0xFF, 8); // serial number unknown
    put_name(&mut msg, &identity.short_name, &defaults.short_name, 8);
    put_name(&mut msg, &identity.long_name, &defaults.long_name, 16);
    msg.put_bytes(0, 3);
    // Capabilities: geometric altitude datum is MSL.
    msg.put_u8(0x01);
    frame(&msg)
}

/// Ownship Geometric Altitude (0x0B) in 5 ft steps.
pub fn ownship_geometric_altitude(alt_feet: i32) -> Bytes {
    let alt = (alt_feet / 5).clamp(i16::MIN as i32, i16::MAX as i32) as i16;

    let mut msg = BytesMut::with_capacity(5);
    msg.put_u8(msg_id::OWNSHIP_GEO_ALTITUDE);
    msg.put_i16(alt);
    // No vertical warning, VFOM 10 m.
    msg.put_u16(0x000A);
    frame(&msg)
}

/// Uplink (0x07) carrying a UAT uplink block unexamined.
///
/// The time-of-reception field is left zero (not available).
pub fn uplink(payload: &[u8; UPLINK_PAYLOAD_LEN]) -> Bytes {
    let mut msg = BytesMut::with_capacity(4 + UPLINK_PAYLOAD_LEN);
    msg.put_u8(msg_id::UPLINK);
    msg.put_bytes(0, 3);
    msg.put_slice(payload);
    frame(&msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::unframe;
    use chrono::TimeZone;
    use hex_literal::hex;

    fn unframe_ok(f: &[u8]) -> Vec<u8> {
        let u = unframe(f).unwrap();
        assert!(u.crc_ok);
        u.message.to_vec()
    }

    fn decode24(b: [u8; 3]) -> f64 {
        let v = i32::from_be_bytes([b[0], b[1], b[2], 0]) >> 8;
        v as f64 * LAT_LON_RESOLUTION
    }

    #[test]
    fn test_lat_lon_truncates() {
        assert_eq!(encode_lat_lon24(45.0), [0x20, 0x00, 0x00]);
        assert_eq!(encode_lat_lon24(-90.0), [0xC0, 0x00, 0x00]);
        assert_eq!(encode_lat_lon24(0.0), [0x00, 0x00, 0x00]);
        // Just under one LSB truncates to zero from either side.
        assert_eq!(encode_lat_lon24(LAT_LON_RESOLUTION * 0.99), [0x00, 0x00, 0x00]);
        assert_eq!(encode_lat_lon24(-LAT_LON_RESOLUTION * 0.99), [0x00, 0x00, 0x00]);
        assert_eq!(encode_lat_lon24(f64::NAN), [0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_lat_lon_precision() {
        let mut d = -180.0;
        while d <= 180.0 {
            let back = decode24(encode_lat_lon24(d));
            assert!((back - d).abs() <= LAT_LON_RESOLUTION, "{} decoded as {}", d, back);
            d += 0.123_457;
        }
        for d in [-180.0, -90.0, 90.0, 180.0, 37.750374, -122.52676] {
            let back = decode24(encode_lat_lon24(d));
            assert!((back - d).abs() <= LAT_LON_RESOLUTION, "{} decoded as {}", d, back);
        }
    }

    #[test]
    fn test_encode_altitude12() {
        assert_eq!(encode_altitude12(-2000), 0xFFF);
        assert_eq!(encode_altitude12(-1001), 0xFFF);
        assert_eq!(encode_altitude12(-1000), 0x000);
        assert_eq!(encode_altitude12(-975), 0x001);
        assert_eq!(encode_altitude12(0), 0x028);
        assert_eq!(encode_altitude12(1024), 0x050);
        assert_eq!(encode_altitude12(1025), 0x051);
        assert_eq!(encode_altitude12(101_350), 0xFFE);
        assert_eq!(encode_altitude12(101_351), 0xFFF);
        assert_eq!(encode_altitude12(200_000), 0xFFF);
    }

    #[test]
    fn test_encode_track8() {
        assert_eq!(encode_track8(0.0), 0);
        assert_eq!(encode_track8(90.0), 64);
        assert_eq!(encode_track8(180.0), 128);
        assert_eq!(encode_track8(359.0), 255);
        assert_eq!(encode_track8(359.9), 255);
        assert_eq!(encode_track8(360.0), 0);
        assert_eq!(encode_track8(-0.1), 255);
        assert_eq!(encode_track8(-90.0), 192);
        assert_eq!(encode_track8(720.0 + 90.0), 64);
    }

    #[test]
    fn test_encode_u12() {
        assert_eq!(encode_u12(-5), 0);
        assert_eq!(encode_u12(100), 100);
        assert_eq!(encode_u12(5000), 0xFFF);
    }

    #[test]
    fn test_encode_vvel12() {
        assert_eq!(encode_vvel12(None), 0x800);
        assert_eq!(encode_vvel12(Some(0)), 0x000);
        assert_eq!(encode_vvel12(Some(640)), 0x00A);
        assert_eq!(encode_vvel12(Some(-64)), 0xFFF);
        assert_eq!(encode_vvel12(Some(-1000)), 0xFF0);
        // Clamped instead of colliding with the 0x800 sentinel.
        assert_eq!(encode_vvel12(Some(1_000_000)), 0x7FF);
        assert_eq!(encode_vvel12(Some(-1_000_000)), 0x801);
    }

    #[test]
    fn test_sanitize_callsign() {
        assert_eq!(&sanitize_callsign("N12345"), b"N12345  ");
        assert_eq!(&sanitize_callsign("n12345"), b"N12345  ");
        assert_eq!(&sanitize_callsign("ABCDEFGHIJ"), b"ABCDEFGH");
        assert_eq!(&sanitize_callsign("AB-1_c"), b"AB 1 C  ");
        assert_eq!(&sanitize_callsign(""), b"STRATUX ");
    }

    #[test]
    fn test_deg10() {
        assert_eq!(deg10(90.0), 900);
        assert_eq!(deg10(-12.34), -123);
        assert_eq!(deg10(1e9), i16::MAX);
        assert_eq!(deg10(-1e9), i16::MIN);
    }

    #[test]
    fn test_golden_heartbeat() {
        let now = Utc.with_ymd_and_hms(2020, 1, 1, 1, 2, 3).unwrap();
        let msg = unframe_ok(&heartbeat(now, true, false));
        assert_eq!(msg, hex!("00 91 01 8B 0E 00 00"));
    }

    #[test]
    fn test_heartbeat_flags_and_high_second_bit() {
        // 23:59:59 = 86399 s, bit 16 set.
        let now = Utc.with_ymd_and_hms(2021, 6, 1, 23, 59, 59).unwrap();
        let msg = unframe_ok(&heartbeat(now, false, true));
        assert_eq!(msg, hex!("00 51 81 7F 51 00 00"));
    }

    #[test]
    fn test_vendor_heartbeat() {
        assert_eq!(unframe_ok(&vendor_heartbeat(false, false)), hex!("CC 04"));
        assert_eq!(unframe_ok(&vendor_heartbeat(true, false)), hex!("CC 06"));
        assert_eq!(unframe_ok(&vendor_heartbeat(true, true)), hex!("CC 07"));
    }

    #[test]
    fn test_id_message_layout() {
        let msg = unframe_ok(&id_message(&Identity::default()));
        assert_eq!(msg.len(), 39);
        assert_eq!(&msg[..3], &[0x65, 0x00, 0x01]);
        assert_eq!(&msg[3..11], &[0xFF; 8]);
        assert_eq!(&msg[11..19], b"Stratux\0");
        assert_eq!(&msg[19..35], b"GDL90-Relay\0\0\0\0\0");
        assert_eq!(msg[38], 0x01);
    }

    #[test]
    fn test_id_message_truncates_and_defaults() {
        let msg = unframe_ok(&id_message(&Identity {
            short_name: "  ".to_string(),
            long_name: "A very long device name indeed".to_string(),
        }));
        assert_eq!(msg.len(), 39);
        assert_eq!(&msg[11..19], b"Stratux\0");
        assert_eq!(&msg[19..35], b"A very long devi");
    }

    #[test]
    fn test_ownship_geometric_altitude() {
        assert_eq!(unframe_ok(&ownship_geometric_altitude(1000)), hex!("0B 00 C8 00 0A"));
        assert_eq!(unframe_ok(&ownship_geometric_altitude(-100)), hex!("0B FF EC 00 0A"));
        assert_eq!(unframe_ok(&ownship_geometric_altitude(10_000_000)), hex!("0B 7F FF 00 0A"));
    }

    #[test]
    fn test_uplink_round_trip_payload() {
        let mut payload = [0u8; UPLINK_PAYLOAD_LEN];
        for (i, b) in payload.iter_mut().enumerate() {
            *b = i as u8;
        }
        let msg = unframe_ok(&uplink(&payload));
        assert_eq!(msg.len(), 1 + 3 + UPLINK_PAYLOAD_LEN);
        assert_eq!(&msg[..4], &[0x07, 0x00, 0x00, 0x00]);
        assert_eq!(&msg[4..], &payload[..]);
    }
}
