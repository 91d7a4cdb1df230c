//! Flat, array-indexed case model (MATPOWER version 2 layout).
//!
//! Records keep the column order of the MATPOWER matrices. Generators,
//! branches and dc lines carry their 0-based row index so that cost records
//! and hierarchical `source_id` fields can refer back to them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{TranslateError, TranslateResult};

/// MATPOWER bus type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BusType {
    /// PQ bus
    Pq = 1,
    /// PV bus (has active generation)
    Pv = 2,
    Reference = 3,
    /// Isolated / disconnected
    Isolated = 4,
}

impl BusType {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for BusType {
    type Error = TranslateError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(BusType::Pq),
            2 => Ok(BusType::Pv),
            3 => Ok(BusType::Reference),
            4 => Ok(BusType::Isolated),
            other => Err(TranslateError::InvalidCase(format!(
                "unknown bus type code {}",
                other
            ))),
        }
    }
}

/// On/off state shared by every device record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    On,
    Off,
}

impl Status {
    fn from_code(code: i32) -> Self {
        if code == 1 {
            Status::On
        } else {
            Status::Off
        }
    }

    /// Combined status of several parts: off as soon as one part is off.
    pub fn all(parts: impl IntoIterator<Item = Status>) -> Status {
        if parts.into_iter().any(|s| s == Status::Off) {
            Status::Off
        } else {
            Status::On
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub bus_i: usize,
    pub bus_type: BusType,
    pub pd: f64,
    pub qd: f64,
    pub gs: f64,
    pub bs: f64,
    pub area: i64,
    pub vm: f64,
    pub va: f64,
    pub base_kv: f64,
    pub zone: i64,
    pub vmax: f64,
    pub vmin: f64,
}

impl Bus {
    pub fn has_load(&self) -> bool {
        !(self.pd == 0.0 && self.qd == 0.0)
    }

    pub fn has_shunt(&self) -> bool {
        !(self.gs == 0.0 && self.bs == 0.0)
    }

    /// A bus is off only when it is marked isolated.
    pub fn status(&self) -> Status {
        if self.bus_type == BusType::Isolated {
            Status::Off
        } else {
            Status::On
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    pub index: usize,
    pub gen_bus: usize,
    pub pg: f64,
    pub qg: f64,
    pub qmax: f64,
    pub qmin: f64,
    pub vg: f64,
    pub mbase: f64,
    pub gen_status: i32,
    pub pmax: f64,
    pub pmin: f64,
    /// Area participation factor (column 21, optional in the text format)
    pub apf: f64,
}

impl Generator {
    /// Zero active bounds and zero active setpoint. The setpoint check keeps
    /// cases with an out-of-bounds `pg` classified as generators.
    pub fn is_synchronous_condenser(&self) -> bool {
        self.pmin == 0.0 && self.pmax == 0.0 && self.pg == 0.0
    }

    pub fn status(&self) -> Status {
        Status::from_code(self.gen_status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub index: usize,
    pub f_bus: usize,
    pub t_bus: usize,
    pub br_r: f64,
    pub br_x: f64,
    pub br_b: f64,
    pub rate_a: f64,
    pub rate_b: f64,
    pub rate_c: f64,
    pub tap: f64,
    /// Phase shift in degrees
    pub shift: f64,
    pub br_status: i32,
    /// Angle difference bounds in degrees
    pub angmin: f64,
    pub angmax: f64,
}

impl Branch {
    pub fn is_transformer(&self) -> bool {
        !(self.tap == 0.0 && self.shift == 0.0)
    }

    pub fn status(&self) -> Status {
        Status::from_code(self.br_status)
    }

    /// Number of populated MATPOWER ratings (0 to 3).
    pub fn rates(&self) -> u8 {
        if self.rate_c != 0.0 {
            3
        } else if self.rate_b != 0.0 {
            2
        } else if self.rate_a != 0.0 {
            1
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcLine {
    pub index: usize,
    pub f_bus: usize,
    pub t_bus: usize,
    pub br_status: i32,
    pub pf: f64,
    pub pt: f64,
    pub qf: f64,
    pub qt: f64,
    pub vf: f64,
    pub vt: f64,
    pub pmin: f64,
    pub pmax: f64,
    pub qminf: f64,
    pub qmaxf: f64,
    pub qmint: f64,
    pub qmaxt: f64,
    pub loss0: f64,
    pub loss1: f64,
}

impl DcLine {
    pub fn status(&self) -> Status {
        Status::from_code(self.br_status)
    }
}

/// Cost model codes of the `gencost` matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostModelKind {
    PiecewiseLinear = 1,
    Polynomial = 2,
}

impl CostModelKind {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for CostModelKind {
    type Error = TranslateError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(CostModelKind::PiecewiseLinear),
            2 => Ok(CostModelKind::Polynomial),
            other => Err(TranslateError::UnsupportedCostModel(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorCost {
    /// Row index; rows at or past the generator count hold reactive costs
    pub index: usize,
    pub model: CostModelKind,
    pub startup: f64,
    pub shutdown: f64,
    pub ncost: usize,
    /// Breakpoints `p0, f0, p1, f1, ...` or coefficients highest degree first
    pub cost: Vec<f64>,
}

impl GeneratorCost {
    /// Number of cost values implied by the model and point count.
    pub fn expected_len(model: CostModelKind, ncost: usize) -> usize {
        match model {
            CostModelKind::PiecewiseLinear => 2 * ncost,
            CostModelKind::Polynomial => ncost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusName {
    pub bus_i: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub name: String,
    pub version: String,
    pub base_mva: f64,
    pub bus: Vec<Bus>,
    pub gen: Vec<Generator>,
    pub branch: Vec<Branch>,
    pub gencost: Option<Vec<GeneratorCost>>,
    pub dcline: Option<Vec<DcLine>>,
    pub bus_name: Option<Vec<BusName>>,
}

impl Case {
    pub fn bus_by_id(&self, bus_i: usize) -> Option<&Bus> {
        self.bus.iter().find(|b| b.bus_i == bus_i)
    }

    /// Check that the records reference each other consistently.
    pub fn validate(&self) -> TranslateResult<()> {
        let mut ids = HashSet::new();
        for bus in &self.bus {
            if !ids.insert(bus.bus_i) {
                return Err(TranslateError::InvalidCase(format!(
                    "duplicate bus id {}",
                    bus.bus_i
                )));
            }
        }

        let check_bus = |what: &str, index: usize, bus_i: usize| {
            if ids.contains(&bus_i) {
                Ok(())
            } else {
                Err(TranslateError::InvalidCase(format!(
                    "{} {} references unknown bus {}",
                    what, index, bus_i
                )))
            }
        };

        for gen in &self.gen {
            check_bus("generator", gen.index, gen.gen_bus)?;
        }
        for branch in &self.branch {
            check_bus("branch", branch.index, branch.f_bus)?;
            check_bus("branch", branch.index, branch.t_bus)?;
        }
        if let Some(dclines) = &self.dcline {
            for dcline in dclines {
                check_bus("dc line", dcline.index, dcline.f_bus)?;
                check_bus("dc line", dcline.index, dcline.t_bus)?;
            }
        }

        if let Some(costs) = &self.gencost {
            let n = self.gen.len();
            if costs.len() != n && costs.len() != 2 * n {
                return Err(TranslateError::InvalidCase(format!(
                    "gencost has {} rows, expected {} or {}",
                    costs.len(),
                    n,
                    2 * n
                )));
            }
            for cost in costs {
                let expected = GeneratorCost::expected_len(cost.model, cost.ncost);
                if cost.cost.len() != expected {
                    return Err(TranslateError::InvalidCase(format!(
                        "gencost row {} has {} values, expected {}",
                        cost.index,
                        cost.cost.len(),
                        expected
                    )));
                }
            }
        }

        if let Some(names) = &self.bus_name {
            if names.len() != self.bus.len() {
                return Err(TranslateError::InvalidCase(format!(
                    "bus_name has {} entries for {} buses",
                    names.len(),
                    self.bus.len()
                )));
            }
        }

        Ok(())
    }
}

/// Small hand-built records for tests in this workspace
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures {
    use super::*;

    pub fn bus(bus_i: usize, bus_type: BusType) -> Bus {
        Bus {
            bus_i,
            bus_type,
            pd: 0.0,
            qd: 0.0,
            gs: 0.0,
            bs: 0.0,
            area: 1,
            vm: 1.0,
            va: 0.0,
            base_kv: 230.0,
            zone: 1,
            vmax: 1.1,
            vmin: 0.9,
        }
    }

    pub fn branch(index: usize, f_bus: usize, t_bus: usize) -> Branch {
        Branch {
            index,
            f_bus,
            t_bus,
            br_r: 0.01,
            br_x: 0.1,
            br_b: 0.02,
            rate_a: 100.0,
            rate_b: 100.0,
            rate_c: 100.0,
            tap: 0.0,
            shift: 0.0,
            br_status: 1,
            angmin: -30.0,
            angmax: 30.0,
        }
    }

    pub fn generator(index: usize, gen_bus: usize) -> Generator {
        Generator {
            index,
            gen_bus,
            pg: 10.0,
            qg: 0.0,
            qmax: 30.0,
            qmin: -30.0,
            vg: 1.0,
            mbase: 100.0,
            gen_status: 1,
            pmax: 40.0,
            pmin: 0.0,
            apf: 0.0,
        }
    }

    pub fn case(bus: Vec<Bus>, gen: Vec<Generator>, branch: Vec<Branch>) -> Case {
        Case {
            name: "test".to_string(),
            version: "2".to_string(),
            base_mva: 100.0,
            bus,
            gen,
            branch,
            gencost: None,
            dcline: None,
            bus_name: None,
        }
    }
}
