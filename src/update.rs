//! Canonical, source-agnostic traffic updates
//!
//! Receiver adapters turn their own wire formats into a [`TrafficUpdate`]:
//! an optional full position-bearing [`Traffic`] record plus a
//! [`MetadataUpdate`] whose fields are individually present or absent.

use serde::{Deserialize, Serialize};

use crate::icao::Icao;
use crate::report::Traffic;

/// Which receiver produced an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "1090")]
    Source1090,
    #[serde(rename = "978")]
    Source978,
    #[default]
    #[serde(rename = "")]
    Unknown,
}

/// Supplemental fields about one aircraft. `None` means "not carried";
/// zero is a real value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataUpdate {
    pub icao: Icao,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_kt: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vvel_fpm: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_feet: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_ground: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub squawk: Option<String>,
}

impl MetadataUpdate {
    /// True when no field is carried.
    pub fn is_empty(&self) -> bool {
        self.tail.is_none()
            && self.ground_kt.is_none()
            && self.track_deg.is_none()
            && self.vvel_fpm.is_none()
            && self.alt_feet.is_none()
            && self.on_ground.is_none()
            && self.squawk.is_none()
    }

    /// Overwrite the fields of `t` this update carries. Squawk is not part of
    /// the record and is left to the caller.
    pub fn apply_to(&self, t: &mut Traffic) {
        if let Some(tail) = &self.tail {
            t.tail.clone_from(tail);
        }
        if let Some(v) = self.ground_kt {
            t.ground_kt = v;
        }
        if let Some(v) = self.track_deg {
            t.track_deg = v;
        }
        if let Some(v) = self.vvel_fpm {
            t.vvel_fpm = v;
        }
        if let Some(v) = self.alt_feet {
            t.alt_feet = v;
        }
        if let Some(v) = self.on_ground {
            t.on_ground = v;
        }
    }

    /// Copy from `prev` into `t` every metadata field this update does not
    /// carry.
    pub fn carry_forward(&self, t: &mut Traffic, prev: &Traffic) {
        if self.tail.is_none() {
            t.tail.clone_from(&prev.tail);
        }
        if self.ground_kt.is_none() {
            t.ground_kt = prev.ground_kt;
        }
        if self.track_deg.is_none() {
            t.track_deg = prev.track_deg;
        }
        if self.vvel_fpm.is_none() {
            t.vvel_fpm = prev.vvel_fpm;
        }
        if self.alt_feet.is_none() {
            t.alt_feet = prev.alt_feet;
        }
        if self.on_ground.is_none() {
            t.on_ground = prev.on_ground;
        }
    }
}

/// New information about one aircraft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficUpdate {
    pub icao: Icao,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic: Option<Traffic>,
    pub meta: MetadataUpdate,
    pub source: Source,
}

impl TrafficUpdate {
    /// True when the update carries neither a position nor any metadata.
    pub fn is_empty(&self) -> bool {
        self.traffic.is_none() && self.meta.is_empty()
    }

    /// The first non-zero ICAO of update, record, metadata.
    pub fn resolved_icao(&self) -> Option<Icao> {
        [
            Some(self.icao),
            self.traffic.as_ref().map(|t| t.icao),
            Some(self.meta.icao),
        ]
        .into_iter()
        .flatten()
        .find(|icao| !icao.is_zero())
    }

    /// Normalize the three ICAO carriers to the resolved address. Returns
    /// `None` when the update has no identity.
    pub fn with_defaults(mut self) -> Option<Self> {
        let icao = self.resolved_icao()?;
        self.icao = icao;
        if let Some(t) = self.traffic.as_mut() {
            t.icao = icao;
        }
        self.meta.icao = icao;
        Some(self)
    }
}

impl From<Traffic> for TrafficUpdate {
    /// Treat every field of a full record as authoritative. An empty tail is
    /// "not carried" so it cannot blank out a known one.
    fn from(t: Traffic) -> Self {
        let meta = MetadataUpdate {
            icao: t.icao,
            tail: (!t.tail.is_empty()).then(|| t.tail.clone()),
            ground_kt: Some(t.ground_kt),
            track_deg: Some(t.track_deg),
            vvel_fpm: Some(t.vvel_fpm),
            alt_feet: Some(t.alt_feet),
            on_ground: Some(t.on_ground),
            squawk: None,
        };
        TrafficUpdate {
            icao: t.icao,
            traffic: Some(t),
            meta,
            source: Source::Unknown,
        }
    }
}
