//! AHRS reports: ForeFlight (0x65/0x01) and the "LE" report
//!
//! Both reports are sent even when the attitude is invalid; every field then
//! carries its "invalid" sentinel.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::frame::frame;
use crate::gdl90::{deg10, msg_id};

/// Sentinel for an invalid signed AHRS field.
pub const AHRS_INVALID: i16 = 0x7FFF;
/// Sentinel for an invalid unsigned AHRS field.
pub const AHRS_INVALID_U16: u16 = 0xFFFF;

/// Offset added to pressure altitude in the "LE" report.
const PALT_OFFSET_FT: f64 = 5000.5;

/// Attitude and air data for one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub valid: bool,
    pub roll_deg: f64,
    pub pitch_deg: f64,
    pub heading_deg: f64,
    pub slip_skid_deg: f64,
    pub yaw_rate_dps: f64,
    pub g_load: f64,
    pub indicated_airspeed_kt: i32,
    pub true_airspeed_kt: i32,
    /// `None` when no pressure altitude is available
    pub pressure_altitude_ft: Option<f64>,
    pub vertical_speed_fpm: Option<i32>,
}

/// ForeFlight AHRS message.
///
/// Only roll and pitch are populated; heading, IAS and TAS are always sent as
/// unavailable.
pub fn foreflight_ahrs(a: &Attitude) -> Bytes {
    let (roll, pitch) = if a.valid {
        (deg10(a.roll_deg), deg10(a.pitch_deg))
    } else {
        (AHRS_INVALID, AHRS_INVALID)
    };

    let mut msg = BytesMut::with_capacity(12);
    msg.put_u8(msg_id::FOREFLIGHT);
    msg.put_u8(msg_id::FOREFLIGHT_AHRS);
    msg.put_i16(roll);
    msg.put_i16(pitch);
    msg.put_u16(AHRS_INVALID_U16); // heading
    msg.put_u16(AHRS_INVALID_U16); // IAS
    msg.put_u16(AHRS_INVALID_U16); // TAS
    frame(&msg)
}

/// "LE" AHRS report, 24 bytes.
///
/// Angles are tenths of a degree, slip/skid is sent negated, and g-load is
/// also scaled by 10. Pressure altitude is `alt + 5000.5` as u16.
pub fn ahrs_le_report(a: &Attitude) -> Bytes {
    let mut msg = BytesMut::with_capacity(24);
    msg.put_slice(&msg_id::AHRS_LE_PREFIX);

    if a.valid {
        msg.put_i16(deg10(a.roll_deg));
        msg.put_i16(deg10(a.pitch_deg));
        msg.put_i16(deg10(a.heading_deg));
        msg.put_i16(deg10(-a.slip_skid_deg));
        msg.put_i16(deg10(a.yaw_rate_dps));
        msg.put_i16(deg10(a.g_load));
        msg.put_i16(a.indicated_airspeed_kt.clamp(0, i16::MAX as i32) as i16);
        // f64 -> u16 saturates.
        msg.put_u16(
            a.pressure_altitude_ft
                .map_or(AHRS_INVALID_U16, |alt| (alt + PALT_OFFSET_FT) as u16),
        );
        msg.put_i16(
            a.vertical_speed_fpm
                .map_or(AHRS_INVALID, |vs| vs.clamp(i16::MIN as i32, i16::MAX as i32) as i16),
        );
    } else {
        for _ in 0..7 {
            msg.put_i16(AHRS_INVALID);
        }
        msg.put_u16(AHRS_INVALID_U16);
        msg.put_i16(AHRS_INVALID);
    }

    // Reserved.
    msg.put_u16(0x7FFF);
    frame(&msg)
}
