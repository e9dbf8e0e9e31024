//! Per-tick frame assembly

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::ahrs::{ahrs_le_report, foreflight_ahrs, Attitude};
use crate::gdl90::{heartbeat, id_message, ownship_geometric_altitude, vendor_heartbeat, Identity};
use crate::report::{ownship_report, traffic_report, Ownship, Traffic};

/// Everything that goes out in one broadcast tick.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub identity: Identity,
    /// `None` without a GPS fix
    pub ownship: Option<Ownship>,
    /// Geometric altitude for the 0x0B message; ownship pressure altitude
    /// is used when absent
    pub geo_alt_feet: Option<i32>,
    pub attitude: Option<Attitude>,
    pub maintenance_required: bool,
    pub traffic: Vec<Traffic>,
}

/// Build the frames of one tick in send order: heartbeat, vendor heartbeat,
/// ID, ownship and geometric altitude, AHRS reports, then one Traffic Report
/// per target.
pub fn tick_frames(now: DateTime<Utc>, input: &TickInput) -> Vec<Bytes> {
    let gps_valid = input.ownship.is_some();
    let ahrs_valid = input.attitude.as_ref().is_some_and(|a| a.valid);

    let mut out = Vec::with_capacity(7 + input.traffic.len());
    out.push(heartbeat(now, gps_valid, input.maintenance_required));
    out.push(vendor_heartbeat(gps_valid, ahrs_valid));
    out.push(id_message(&input.identity));

    if let Some(own) = &input.ownship {
        out.push(ownship_report(own));
        out.push(ownship_geometric_altitude(
            input.geo_alt_feet.unwrap_or(own.alt_feet),
        ));
    }
    if let Some(att) = &input.attitude {
        out.push(foreflight_ahrs(att));
        out.push(ahrs_le_report(att));
    }
    out.extend(input.traffic.iter().map(traffic_report));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode_attitude, decode_traffic_frames, message_id, FrameSummary};
    use crate::icao::Icao;
    use crate::store::{StoreConfig, TrafficStore};
    use crate::update::{MetadataUpdate, Source, TrafficUpdate};
    use chrono::TimeZone;
    use std::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_minimal_tick() {
        let frames = tick_frames(now(), &TickInput::default());
        let ids: Vec<Option<u8>> = frames.iter().map(|f| message_id(f)).collect();
        assert_eq!(ids, vec![Some(0x00), Some(0xCC), Some(0x65)]);

        let s = FrameSummary::from_frames(&frames);
        assert_eq!(s.crc_failures, 0);
        assert_eq!(s.malformed, 0);
    }

    #[test]
    fn test_full_tick_order() {
        let input = TickInput {
            ownship: Some(Ownship {
                icao: Icao([0xF0, 0x00, 0x01]),
                lat_deg: 47.0,
                lon_deg: -122.0,
                alt_feet: 2000,
                ..Default::default()
            }),
            attitude: Some(Attitude { valid: true, ..Default::default() }),
            traffic: vec![Traffic { icao: Icao([0, 0, 1]), lat_deg: 1.0, ..Default::default() }],
            ..Default::default()
        };
        let frames = tick_frames(now(), &input);
        let ids: Vec<u8> = frames.iter().filter_map(|f| message_id(f)).collect();
        assert_eq!(ids, vec![0x00, 0xCC, 0x65, 0x0A, 0x0B, 0x65, 0x4C, 0x14]);
        assert!(decode_attitude(&frames).valid);

        // GPS valid in heartbeat status byte 1.
        let hb = crate::frame::unframe(&frames[0]).unwrap().message;
        assert_eq!(hb[1] & 0x80, 0x80);
    }

    #[test]
    fn test_store_to_frames_end_to_end() {
        let store = TrafficStore::new(StoreConfig {
            max_targets: 10,
            ttl: Duration::from_secs(30),
        });
        let a: Icao = "ABC123".parse().unwrap();
        let b: Icao = "00ABCD".parse().unwrap();

        store.upsert(
            now(),
            Traffic {
                icao: a,
                lat_deg: 45.0,
                lon_deg: -122.0,
                alt_feet: 3000,
                ground_kt: 120,
                ..Default::default()
            },
        );
        store.apply(
            now(),
            TrafficUpdate {
                icao: a,
                meta: MetadataUpdate { tail: Some("N12345".into()), ..Default::default() },
                source: Source::Source978,
                ..Default::default()
            },
        );
        store.upsert(
            now(),
            Traffic {
                icao: b,
                lat_deg: 46.0,
                lon_deg: -121.0,
                tail: "DAL42".into(),
                ..Default::default()
            },
        );

        let input = TickInput {
            traffic: store.snapshot(now()),
            ..Default::default()
        };
        let decoded = decode_traffic_frames(tick_frames(now(), &input));
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].icao, b);
        assert_eq!(decoded[0].tail, "DAL42");
        assert_eq!(decoded[1].icao, a);
        assert_eq!(decoded[1].tail, "N12345");
        assert_eq!(decoded[1].alt_feet, 3000);
        assert_eq!(decoded[1].ground_kt, 120);
    }
}
