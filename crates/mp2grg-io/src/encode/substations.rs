//! Substation clustering over transformer endpoints.

use std::collections::{BTreeMap, HashMap};

use mp2grg_core::case::{Branch, Bus};
use mp2grg_core::{TranslateError, TranslateResult};
use petgraph::unionfind::UnionFind;

/// Buses partitioned into substations.
#[derive(Debug, Clone, PartialEq)]
pub struct Substations {
    /// Bus number to 0-based substation index
    pub by_bus: BTreeMap<usize, usize>,
    /// Member buses of each substation, ascending
    pub members: Vec<Vec<usize>>,
}

impl Substations {
    pub fn of_bus(&self, bus_i: usize) -> TranslateResult<usize> {
        self.by_bus
            .get(&bus_i)
            .copied()
            .ok_or_else(|| TranslateError::internal(format!("bus {} has no substation", bus_i)))
    }

    /// Every transformer must join two different buses of one substation.
    pub fn check(&self, branches: &[Branch]) -> TranslateResult<()> {
        for branch in branches.iter().filter(|b| b.is_transformer()) {
            if branch.f_bus == branch.t_bus {
                return Err(TranslateError::internal(format!(
                    "transformer {} connects bus {} to itself",
                    branch.index, branch.f_bus
                )));
            }
            if self.of_bus(branch.f_bus)? != self.of_bus(branch.t_bus)? {
                return Err(TranslateError::internal(format!(
                    "transformer {} spans two substations",
                    branch.index
                )));
            }
        }
        Ok(())
    }
}

/// Group buses joined directly or transitively by transformers.
///
/// Buses without transformers form singleton substations. Substations are
/// numbered by their smallest bus number.
pub fn cluster_substations(buses: &[Bus], branches: &[Branch]) -> Substations {
    let index: HashMap<usize, usize> = buses
        .iter()
        .enumerate()
        .map(|(i, b)| (b.bus_i, i))
        .collect();

    let mut uf = UnionFind::<usize>::new(buses.len());
    for branch in branches.iter().filter(|b| b.is_transformer()) {
        if let (Some(&f), Some(&t)) = (index.get(&branch.f_bus), index.get(&branch.t_bus)) {
            uf.union(f, t);
        }
    }

    let mut classes: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, bus) in buses.iter().enumerate() {
        classes.entry(uf.find(i)).or_default().push(bus.bus_i);
    }

    let mut members: Vec<Vec<usize>> = classes
        .into_values()
        .map(|mut group| {
            group.sort_unstable();
            group
        })
        .collect();
    members.sort_by_key(|group| group[0]);

    let by_bus = members
        .iter()
        .enumerate()
        .flat_map(|(k, group)| group.iter().map(move |bus_i| (*bus_i, k)))
        .collect();

    Substations { by_bus, members }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp2grg_core::case::{fixtures, BusType};

    fn transformer(index: usize, f_bus: usize, t_bus: usize) -> Branch {
        Branch {
            tap: 0.98,
            ..fixtures::branch(index, f_bus, t_bus)
        }
    }

    fn buses(ids: &[usize]) -> Vec<Bus> {
        ids.iter().map(|i| fixtures::bus(*i, BusType::Pq)).collect()
    }

    #[test]
    fn test_transitive_transformers_share_a_substation() {
        let buses = buses(&[5, 1, 2, 3, 4]);
        let branches = vec![
            transformer(0, 5, 3),
            fixtures::branch(1, 1, 2),
            transformer(2, 3, 4),
        ];
        let subs = cluster_substations(&buses, &branches);

        assert_eq!(subs.members, vec![vec![1], vec![2], vec![3, 4, 5]]);
        assert_eq!(subs.of_bus(5).unwrap(), subs.of_bus(4).unwrap());
        assert_ne!(subs.of_bus(1).unwrap(), subs.of_bus(2).unwrap());
        assert!(subs.check(&branches).is_ok());
    }

    #[test]
    fn test_lines_do_not_merge() {
        let buses = buses(&[1, 2]);
        let subs = cluster_substations(&buses, &[fixtures::branch(0, 1, 2)]);
        assert_eq!(subs.members.len(), 2);
    }

    #[test]
    fn test_check_rejects_self_loop() {
        let buses = buses(&[1]);
        let branches = vec![transformer(0, 1, 1)];
        let subs = cluster_substations(&buses, &branches);
        assert!(matches!(subs.check(&branches), Err(TranslateError::Internal(_))));
    }

    #[test]
    fn test_check_rejects_split_transformer() {
        let buses = buses(&[1, 2]);
        let subs = cluster_substations(&buses, &[]);
        let err = subs.check(&[transformer(0, 1, 2)]).unwrap_err();
        assert!(err.to_string().contains("spans two substations"));
    }
}
