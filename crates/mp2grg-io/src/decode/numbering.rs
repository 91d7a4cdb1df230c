//! Bus numbers and record indices for decoded components.

use std::collections::BTreeMap;

use mp2grg_core::topology::ComponentsByType;

/// Bus number of every voltage point.
///
/// `collapsed` numbers electrical nodes from 0 with bus-owning nodes first.
/// When every bus component carries a numeric `source_id` those numbers are
/// reused, and nodes without a bus continue after the largest one;
/// otherwise nodes are numbered from 1.
pub fn bus_numbers<'a>(
    cbt: &ComponentsByType<'a>,
    collapsed: &BTreeMap<&'a str, usize>,
) -> BTreeMap<&'a str, usize> {
    let sources: Option<Vec<(usize, usize)>> = cbt
        .bus
        .iter()
        .map(|bus| {
            let node = *collapsed.get(bus.link.as_str())?;
            let number = bus.source_id.as_deref()?.parse::<usize>().ok()?;
            Some((node, number))
        })
        .collect();

    let Some(sources) = sources else {
        return collapsed.iter().map(|(vp, node)| (*vp, node + 1)).collect();
    };

    let mut renumber: BTreeMap<usize, usize> = BTreeMap::new();
    for (node, number) in sources {
        renumber.entry(node).or_insert(number);
    }
    let next = renumber.values().max().map_or(1, |max| max + 1);

    let mut spare: BTreeMap<usize, usize> = BTreeMap::new();
    for node in collapsed.values() {
        if !renumber.contains_key(node) {
            let k = spare.len();
            spare.entry(*node).or_insert(next + k);
        }
    }

    collapsed
        .iter()
        .map(|(vp, node)| {
            let number = renumber
                .get(node)
                .or_else(|| spare.get(node))
                .copied()
                .unwrap_or(next);
            (*vp, number)
        })
        .collect()
}

/// Record index of each component id.
///
/// When every component carries a numeric `source_id` it is the index.
/// Otherwise each stream is sorted by id and numbered after the streams
/// before it.
pub fn index_lookup<'a>(streams: &[Vec<(&'a str, Option<&'a str>)>]) -> BTreeMap<&'a str, usize> {
    let sources: Option<BTreeMap<&str, usize>> = streams
        .iter()
        .flatten()
        .map(|(id, source)| Some((*id, source.as_deref()?.parse::<usize>().ok()?)))
        .collect();
    if let Some(sources) = sources {
        return sources;
    }

    let mut lookup = BTreeMap::new();
    let mut offset = 0;
    for stream in streams {
        let mut ids: Vec<&str> = stream.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        for (i, id) in ids.iter().enumerate() {
            lookup.insert(*id, offset + i);
        }
        offset += ids.len();
    }
    lookup
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp2grg_core::grg::{Bus, BusVoltage, Range};

    fn bus(id: &str, link: &str, source: Option<&str>) -> Bus {
        Bus {
            id: id.to_string(),
            source_id: source.map(str::to_string),
            link: link.to_string(),
            voltage: BusVoltage {
                magnitude: Range::new(0.9, 1.1),
                angle: Range::unbounded(),
            },
            reference: None,
            matpower_bus_type: None,
        }
    }

    fn collapsed() -> BTreeMap<&'static str, usize> {
        [("a", 0), ("a2", 0), ("b", 1), ("c", 2)].into_iter().collect()
    }

    #[test]
    fn test_source_ids_reused() {
        let buses = [bus("bus_1", "a", Some("10")), bus("bus_2", "b", Some("4"))];
        let cbt = ComponentsByType {
            bus: buses.iter().collect(),
            ..Default::default()
        };
        let numbers = bus_numbers(&cbt, &collapsed());
        assert_eq!(numbers["a"], 10);
        assert_eq!(numbers["a2"], 10);
        assert_eq!(numbers["b"], 4);
        // a node without a bus continues after the largest source id
        assert_eq!(numbers["c"], 11);
    }

    #[test]
    fn test_sequential_without_source_ids() {
        let buses = [bus("bus_1", "a", Some("10")), bus("bus_2", "b", None)];
        let cbt = ComponentsByType {
            bus: buses.iter().collect(),
            ..Default::default()
        };
        let numbers = bus_numbers(&cbt, &collapsed());
        assert_eq!(numbers["a"], 1);
        assert_eq!(numbers["b"], 2);
        assert_eq!(numbers["c"], 3);
    }

    #[test]
    fn test_index_lookup() {
        let with_sources = vec![
            vec![("line_2", Some("0")), ("line_1", Some("2"))],
            vec![("transformer_1", Some("1"))],
        ];
        let lookup = index_lookup(&with_sources);
        assert_eq!(lookup["line_1"], 2);
        assert_eq!(lookup["transformer_1"], 1);

        let partial = vec![
            vec![("line_2", Some("0")), ("line_1", None)],
            vec![("transformer_1", Some("1"))],
        ];
        let lookup = index_lookup(&partial);
        assert_eq!(lookup["line_1"], 0);
        assert_eq!(lookup["line_2"], 1);
        assert_eq!(lookup["transformer_1"], 2);
    }
}
