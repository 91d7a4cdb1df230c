//! Deterministic identifiers for encoded components.
//!
//! Identifiers are `<prefix><n>` with `n` counted from 1 and zero-padded to
//! the width of the largest count of that kind, so lexical order matches
//! numeric order. They are assigned once per encoding and shared by every
//! component, group, mapping key and cost key built afterwards.

use std::collections::{BTreeMap, BTreeSet};

use mp2grg_core::case::Case;
use mp2grg_core::{TranslateError, TranslateResult};

/// Identifier tables for one case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentIds {
    /// Keyed by bus number
    pub bus: BTreeMap<usize, String>,
    pub voltage_point: BTreeMap<usize, String>,
    pub voltage_level: BTreeMap<usize, String>,
    /// Only buses with a load / shunt appear here
    pub load: BTreeMap<usize, String>,
    pub shunt: BTreeMap<usize, String>,
    /// By row index; generators and condensers share this table
    pub generator: Vec<String>,
    /// By row index; lines and transformers share this table
    pub branch: Vec<String>,
    pub dc_line: Vec<String>,
    pub area: BTreeMap<i64, String>,
    pub zone: BTreeMap<i64, String>,
    bus_width: usize,
    switch_width: usize,
}

impl ComponentIds {
    pub fn assign(case: &Case) -> Self {
        let bus_width = digits(case.bus.len());
        let gen_width = digits(case.gen.len());
        let branch_width = digits(case.branch.len());
        let dclines = case.dcline.as_deref().unwrap_or_default();
        let dc_width = digits(dclines.len());

        let mut ids = ComponentIds {
            bus_width,
            switch_width: digits(
                3 * case.bus.len() + case.gen.len() + 2 * case.branch.len() + 2 * dclines.len(),
            ),
            ..Default::default()
        };

        let mut loads = 0;
        let mut shunts = 0;
        for (i, bus) in case.bus.iter().enumerate() {
            ids.bus.insert(bus.bus_i, format_id("bus_", i + 1, bus_width));
            ids.voltage_point
                .insert(bus.bus_i, format_id("voltage_point_", i + 1, bus_width));
            ids.voltage_level
                .insert(bus.bus_i, format_id("voltage_level_", i + 1, bus_width));
            if bus.has_load() {
                loads += 1;
                ids.load.insert(bus.bus_i, format_id("load_", loads, bus_width));
            }
            if bus.has_shunt() {
                shunts += 1;
                ids.shunt.insert(bus.bus_i, format_id("shunt_", shunts, bus_width));
            }
        }

        let mut generators = 0;
        let mut condensers = 0;
        for gen in &case.gen {
            let id = if gen.is_synchronous_condenser() {
                condensers += 1;
                format_id("sync_cond_", condensers, gen_width)
            } else {
                generators += 1;
                format_id("gen_", generators, gen_width)
            };
            ids.generator.push(id);
        }

        let mut lines = 0;
        let mut transformers = 0;
        for branch in &case.branch {
            let id = if branch.is_transformer() {
                transformers += 1;
                format_id("transformer_", transformers, branch_width)
            } else {
                lines += 1;
                format_id("line_", lines, branch_width)
            };
            ids.branch.push(id);
        }

        ids.dc_line = dclines
            .iter()
            .enumerate()
            .map(|(i, _)| format_id("dc_line_", i + 1, dc_width))
            .collect();

        let areas: BTreeSet<i64> = case.bus.iter().map(|b| b.area).collect();
        let area_width = digits(areas.len());
        ids.area = areas
            .into_iter()
            .enumerate()
            .map(|(i, code)| (code, format_id("area_", i + 1, area_width)))
            .collect();

        let zones: BTreeSet<i64> = case.bus.iter().map(|b| b.zone).collect();
        let zone_width = digits(zones.len());
        ids.zone = zones
            .into_iter()
            .enumerate()
            .map(|(i, code)| (code, format_id("zone_", i + 1, zone_width)))
            .collect();

        ids
    }

    /// Substation `n` (1-based), sized like bus ids since there is at most one per bus.
    pub fn substation(&self, n: usize) -> String {
        format_id("substation_", n, self.bus_width)
    }

    /// Switch `n` (1-based) and the voltage point it creates.
    pub fn switch(&self, n: usize) -> (String, String) {
        (
            format_id("switch_", n, self.switch_width),
            format_id("voltage_point_switch_", n, self.switch_width),
        )
    }

    pub fn bus_id(&self, bus_i: usize) -> TranslateResult<&str> {
        lookup(&self.bus, bus_i, "bus")
    }

    pub fn voltage_point_id(&self, bus_i: usize) -> TranslateResult<&str> {
        lookup(&self.voltage_point, bus_i, "voltage point")
    }

    pub fn voltage_level_id(&self, bus_i: usize) -> TranslateResult<&str> {
        lookup(&self.voltage_level, bus_i, "voltage level")
    }
}

fn lookup<'a, K: Ord + std::fmt::Display>(
    table: &'a BTreeMap<K, String>,
    key: K,
    what: &str,
) -> TranslateResult<&'a str> {
    table
        .get(&key)
        .map(String::as_str)
        .ok_or_else(|| TranslateError::internal(format!("no {} id assigned for {}", what, key)))
}

fn format_id(prefix: &str, n: usize, width: usize) -> String {
    format!("{}{:0width$}", prefix, n, width = width)
}

fn digits(count: usize) -> usize {
    count.max(1).to_string().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp2grg_core::case::{fixtures, BusType};

    fn twelve_bus_case() -> Case {
        let mut buses: Vec<_> = (1..=12).map(|i| fixtures::bus(i * 10, BusType::Pq)).collect();
        buses[3].pd = 5.0;
        buses[7].pd = 5.0;
        buses[7].bs = 1.0;
        buses[0].area = 7;
        buses[1].area = 3;

        let mut condenser = fixtures::generator(1, 20);
        condenser.pg = 0.0;
        condenser.pmax = 0.0;
        condenser.pmin = 0.0;

        let mut transformer = fixtures::branch(1, 20, 30);
        transformer.tap = 1.05;

        fixtures::case(
            buses,
            vec![fixtures::generator(0, 10), condenser, fixtures::generator(2, 30)],
            vec![fixtures::branch(0, 10, 20), transformer, fixtures::branch(2, 30, 40)],
        )
    }

    #[test]
    fn test_padding_follows_counts() {
        let ids = ComponentIds::assign(&twelve_bus_case());
        assert_eq!(ids.bus[&10], "bus_01");
        assert_eq!(ids.bus[&120], "bus_12");
        assert_eq!(ids.voltage_point[&30], "voltage_point_03");
        assert_eq!(ids.voltage_level[&30], "voltage_level_03");
        assert_eq!(ids.substation(2), "substation_02");
        // 3*12 + 3 + 2*3 = 45 possible switches
        assert_eq!(ids.switch(7), ("switch_07".to_string(), "voltage_point_switch_07".to_string()));
    }

    #[test]
    fn test_loads_and_shunts_count_separately() {
        let ids = ComponentIds::assign(&twelve_bus_case());
        assert_eq!(ids.load.len(), 2);
        assert_eq!(ids.load[&40], "load_01");
        assert_eq!(ids.load[&80], "load_02");
        assert_eq!(ids.shunt[&80], "shunt_01");
    }

    #[test]
    fn test_generator_and_branch_streams() {
        let ids = ComponentIds::assign(&twelve_bus_case());
        assert_eq!(ids.generator, vec!["gen_1", "sync_cond_1", "gen_2"]);
        assert_eq!(ids.branch, vec!["line_1", "transformer_1", "line_2"]);
        assert!(ids.dc_line.is_empty());
    }

    #[test]
    fn test_groups_sorted_by_code() {
        let ids = ComponentIds::assign(&twelve_bus_case());
        let areas: Vec<_> = ids.area.iter().map(|(k, v)| (*k, v.as_str())).collect();
        assert_eq!(areas, vec![(1, "area_1"), (3, "area_2"), (7, "area_3")]);
        assert_eq!(ids.zone[&1], "zone_1");
    }

    #[test]
    fn test_missing_lookup_is_internal() {
        let ids = ComponentIds::assign(&twelve_bus_case());
        assert!(ids.bus_id(10).is_ok());
        assert!(matches!(ids.bus_id(11), Err(TranslateError::Internal(_))));
    }
}
