//! Breaker insertion between devices and their voltage points.
//!
//! Every device link is split in two: the device moves onto a fresh voltage
//! point, and a breaker joins that point to the original one. The breaker
//! carries the device's on/off state so it can change without touching the
//! bus topology.

use mp2grg_core::case::Status;
use mp2grg_core::grg::{Component, StatusValue, Switch, SwitchStatus};

use super::ids::ComponentIds;

/// Running switch number for one encoding pass.
#[derive(Debug, Default)]
pub struct SwitchCounter {
    issued: usize,
}

impl SwitchCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issued(&self) -> usize {
        self.issued
    }

    fn next(&mut self, ids: &ComponentIds) -> (String, String) {
        self.issued += 1;
        ids.switch(self.issued)
    }
}

/// A breaker created for one link of a device.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertedSwitch {
    pub switch: Switch,
    /// The voltage point the device was linked to before insertion
    pub original_point: String,
    /// The new voltage point now shared by the device and the breaker
    pub new_point: String,
}

/// A device rewired onto new voltage points, with its breakers in link order.
#[derive(Debug, Clone, PartialEq)]
pub struct Inserted {
    pub device: Component,
    pub switches: Vec<InsertedSwitch>,
}

/// Put a breaker on every link of `device`.
pub fn insert_switches(
    device: Component,
    counter: &mut SwitchCounter,
    ids: &ComponentIds,
) -> Inserted {
    let mut switches = Vec::new();
    let device = device.map_links(|original_point| {
        let (switch_id, new_point) = counter.next(ids);
        switches.push(InsertedSwitch {
            switch: Switch {
                id: switch_id,
                subtype: Some("breaker".to_string()),
                link_1: original_point.clone(),
                link_2: new_point.clone(),
                status: StatusValue::binary(),
            },
            original_point,
            new_point: new_point.clone(),
        });
        new_point
    });
    Inserted { device, switches }
}

/// Breaker status for a device: off when the device or any bus it touches is off.
pub fn combined_status(parts: impl IntoIterator<Item = Status>) -> SwitchStatus {
    Status::all(parts).into()
}
