//! Best-effort decoding of produced frames
//!
//! Used for status views and for summarizing recorded streams. Only the
//! fields needed to display a target or an attitude are recovered.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::ahrs::{AHRS_INVALID, AHRS_INVALID_U16};
use crate::frame::unframe;
use crate::gdl90::{msg_id, ALTITUDE_UNAVAILABLE, LAT_LON_RESOLUTION, TRACK_RESOLUTION};
use crate::icao::Icao;
use crate::report::{Traffic, REPORT_LEN};

/// Decode a signed 24-bit big-endian latitude/longitude into degrees.
pub fn decode_lat_lon24(b: [u8; 3]) -> f64 {
    // Sign-extend via the top byte of an i32.
    let v = i32::from_be_bytes([b[0], b[1], b[2], 0]) >> 8;
    v as f64 * LAT_LON_RESOLUTION
}

fn sign_extend12(v: u16) -> i32 {
    (((v & 0x0FFF) as i16) << 4 >> 4) as i32
}

/// Decode an unframed Traffic (0x14) or Ownship (0x0A) report.
///
/// An unavailable altitude decodes to 0. The callsign is returned with
/// trailing padding removed.
pub fn decode_traffic_report(msg: &[u8]) -> Option<Traffic> {
    if msg.len() < REPORT_LEN {
        return None;
    }
    if msg[0] != msg_id::TRAFFIC_REPORT && msg[0] != msg_id::OWNSHIP_REPORT {
        return None;
    }

    let alt12 = ((msg[11] as u16) << 4) | ((msg[12] as u16) >> 4);
    let alt_feet = if alt12 == ALTITUDE_UNAVAILABLE {
        0
    } else {
        alt12 as i32 * 25 - 1000
    };
    let misc = msg[12] & 0x0F;
    let speed = ((msg[14] as u16) << 4) | ((msg[15] as u16) >> 4);
    let vvel = (((msg[15] & 0x0F) as u16) << 8) | msg[16] as u16;

    Some(Traffic {
        addr_type: msg[1] & 0x0F,
        icao: Icao([msg[2], msg[3], msg[4]]),
        lat_deg: decode_lat_lon24([msg[5], msg[6], msg[7]]),
        lon_deg: decode_lat_lon24([msg[8], msg[9], msg[10]]),
        alt_feet,
        nic: msg[13] >> 4,
        nacp: msg[13] & 0x0F,
        ground_kt: speed as i32,
        track_deg: msg[17] as f64 * TRACK_RESOLUTION,
        vvel_fpm: sign_extend12(vvel) * 64,
        on_ground: misc & 0x08 == 0,
        extrapolated: misc & 0x04 != 0,
        emitter_category: msg[18],
        tail: String::from_utf8_lossy(&msg[19..27]).trim_end().to_string(),
        priority_status: msg[27] >> 4,
    })
}

/// Decode every CRC-valid Traffic Report in `frames`.
///
/// A later report for the same ICAO replaces an earlier one; the result is
/// ordered by ICAO.
pub fn decode_traffic_frames<I, F>(frames: I) -> Vec<Traffic>
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut by_icao = BTreeMap::new();
    for f in frames {
        let Ok(u) = unframe(f.as_ref()) else { continue };
        if !u.crc_ok || u.message.first() != Some(&msg_id::TRAFFIC_REPORT) {
            continue;
        }
        if let Some(t) = decode_traffic_report(&u.message) {
            by_icao.insert(t.icao, t);
        }
    }
    by_icao.into_values().collect()
}

/// Attitude recovered from a batch of frames. Sentinel fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttitudeReading {
    /// AHRS-valid bit of the vendor heartbeat
    pub valid: bool,
    pub roll_deg: Option<f64>,
    pub pitch_deg: Option<f64>,
    pub heading_deg: Option<f64>,
    pub pressure_alt_ft: Option<f64>,
}

fn be_i16(msg: &[u8], at: usize) -> i16 {
    i16::from_be_bytes([msg[at], msg[at + 1]])
}

fn tenths(v: i16) -> Option<f64> {
    (v != AHRS_INVALID).then(|| v as f64 / 10.0)
}

/// Fold the vendor heartbeat and both AHRS reports of `frames` into one
/// reading. Frames failing CRC are ignored; later frames win.
pub fn decode_attitude<I, F>(frames: I) -> AttitudeReading
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut out = AttitudeReading::default();

    for f in frames {
        let Ok(u) = unframe(f.as_ref()) else { continue };
        let msg = &u.message[..];
        if !u.crc_ok || msg.is_empty() {
            continue;
        }

        if msg[0] == msg_id::VENDOR_HEARTBEAT && msg.len() >= 2 {
            out.valid = msg[1] & 0x01 != 0;
        } else if msg[0] == msg_id::FOREFLIGHT
            && msg.len() >= 12
            && msg[1] == msg_id::FOREFLIGHT_AHRS
        {
            if let Some(v) = tenths(be_i16(msg, 2)) {
                out.roll_deg = Some(v);
            }
            if let Some(v) = tenths(be_i16(msg, 4)) {
                out.pitch_deg = Some(v);
            }
        } else if msg.len() >= 24 && msg.starts_with(&msg_id::AHRS_LE_PREFIX) {
            if let Some(v) = tenths(be_i16(msg, 4)) {
                out.roll_deg = Some(v);
            }
            if let Some(v) = tenths(be_i16(msg, 6)) {
                out.pitch_deg = Some(v);
            }
            if let Some(v) = tenths(be_i16(msg, 8)) {
                out.heading_deg = Some(v);
            }
            let palt = u16::from_be_bytes([msg[18], msg[19]]);
            if palt != AHRS_INVALID_U16 {
                out.pressure_alt_ft = Some(palt as f64 - 5000.0);
            }
        }
    }
    out
}

/// Message ID of a frame, without checking the CRC.
pub fn message_id(frame: &[u8]) -> Option<u8> {
    unframe(frame).ok()?.message.first().copied()
}

/// Counts over a sequence of frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameSummary {
    pub frames: usize,
    /// Frames that could not be unstuffed or carried no message
    pub malformed: usize,
    pub crc_failures: usize,
    /// Frames per message ID, ordered by ID
    pub msg_id_counts: BTreeMap<u8, usize>,
}

impl FrameSummary {
    pub fn from_frames<I, F>(frames: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        let mut s = FrameSummary::default();
        for f in frames {
            s.frames += 1;
            let u = match unframe(f.as_ref()) {
                Ok(u) if !u.message.is_empty() => u,
                _ => {
                    s.malformed += 1;
                    continue;
                }
            };
            if !u.crc_ok {
                s.crc_failures += 1;
            }
            *s.msg_id_counts.entry(u.message[0]).or_insert(0) += 1;
        }
        s
    }
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames: {}", self.frames)?;
        writeln!(f, "malformed_frames: {}", self.malformed)?;
        writeln!(f, "crc_failures: {}", self.crc_failures)?;
        writeln!(f, "msg_id_counts:")?;
        for (id, count) in &self.msg_id_counts {
            writeln!(f, "  0x{:02X}: {}", id, count)?;
        }
        Ok(())
    }
}
