//! Hierarchical document to flat case.
//!
//! [`decode_document`] merges the selected mapping layers, collapses voltage
//! points joined by closed switches into buses, and rebuilds the bus,
//! branch, generator, cost and dc line tables. Everything a flat case
//! cannot express (merged buses, abstract values, missing costs) is
//! reported as a warning and the nearest flat value is used.
//!
//! ```no_run
//! use mp2grg_core::Diagnostics;
//! use mp2grg_io::decode::{decode_document, DecodeOptions};
//! use mp2grg_io::grg_json::read_grg_file;
//!
//! let doc = read_grg_file("case14.json")?;
//! let mut diag = Diagnostics::new();
//! let case = decode_document(&doc, &DecodeOptions::default(), &mut diag)?;
//! assert_eq!(case.name, doc.network.id);
//! # Ok::<(), mp2grg_core::TranslateError>(())
//! ```

pub mod branches;
pub mod buses;
pub mod dclines;
pub mod generators;
pub mod mapping;
pub mod numbering;

use std::collections::{BTreeMap, BTreeSet};

use mp2grg_core::grg::{GrgDocument, Mapping, VoltageLevel};
use mp2grg_core::topology::{
    active_voltage_points, collapse_voltage_points, components_by_type,
    voltage_level_by_voltage_point, ComponentsByType,
};
use mp2grg_core::units::round_to;
use mp2grg_core::{BaseMva, Case, Diagnostics, TranslateError, TranslateResult};
use tracing::{debug, info};

pub const DEFAULT_FLOAT_PRECISION: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Mapping layers to merge, in order; `None` merges every layer
    pub mappings: Option<Vec<String>>,
    /// Give every generator a linear cost when the document has none
    pub add_generator_costs: bool,
    /// Emit `bus_name` from the ids of the merged bus components
    pub add_bus_names: bool,
    /// Decimal places kept on values scaled back from per unit
    pub float_precision: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            mappings: None,
            add_generator_costs: false,
            add_bus_names: false,
            float_precision: DEFAULT_FLOAT_PRECISION,
        }
    }
}

/// Document state shared by the table decoders.
pub struct DecodeContext<'a> {
    pub doc: &'a GrgDocument,
    pub cbt: ComponentsByType<'a>,
    pub mapping: Mapping,
    /// Bus number of every voltage point
    pub bus_of_point: BTreeMap<&'a str, usize>,
    pub active: BTreeSet<&'a str>,
    pub levels: BTreeMap<&'a str, &'a VoltageLevel>,
    pub base: BaseMva,
    pub precision: u32,
}

impl<'a> DecodeContext<'a> {
    pub fn new(doc: &'a GrgDocument, options: &DecodeOptions, diag: &mut Diagnostics) -> Self {
        let mapping = mapping::merge_layers(doc, options.mappings.as_deref(), diag);
        let status = mapping::status_assignment(&mapping, diag);
        let cbt = components_by_type(doc);
        let collapsed = collapse_voltage_points(doc, &status);
        let bus_of_point = numbering::bus_numbers(&cbt, &collapsed);
        Self {
            doc,
            cbt,
            mapping,
            bus_of_point,
            active: active_voltage_points(doc, &status),
            levels: voltage_level_by_voltage_point(doc),
            base: BaseMva(doc.network.base_mva),
            precision: options.float_precision,
        }
    }

    pub fn bus_number(&self, voltage_point: &str) -> TranslateResult<usize> {
        self.bus_of_point.get(voltage_point).copied().ok_or_else(|| {
            TranslateError::internal(format!("voltage point {} has no bus", voltage_point))
        })
    }

    pub fn is_active(&self, voltage_point: &str) -> bool {
        self.active.contains(voltage_point)
    }

    /// Per-unit value scaled back to MW, Mvar or MVA.
    pub fn physical(&self, per_unit: f64) -> f64 {
        round_to(self.base.from_pu(per_unit), self.precision)
    }

    pub fn round(&self, value: f64) -> f64 {
        round_to(value, self.precision)
    }
}

/// Translate a hierarchical document into a flat case.
pub fn decode_document(
    doc: &GrgDocument,
    options: &DecodeOptions,
    diag: &mut Diagnostics,
) -> TranslateResult<Case> {
    if !doc.network.per_unit {
        return Err(TranslateError::NotPerUnit);
    }

    let ctx = DecodeContext::new(doc, options, diag);
    debug!(
        mapping_entries = ctx.mapping.len(),
        voltage_points = ctx.bus_of_point.len(),
        "prepared document for decoding"
    );

    let (bus, bus_name) = buses::decode_buses(&ctx, diag)?;
    let branch = branches::decode_branches(&ctx, &bus, diag)?;
    let (gen, gencost) = generators::decode_generators(&ctx, options.add_generator_costs, diag)?;
    let dcline = dclines::decode_dc_lines(&ctx)?;

    let case = Case {
        name: doc.network.id.clone(),
        version: "2".to_string(),
        base_mva: doc.network.base_mva,
        bus,
        gen,
        branch,
        gencost,
        dcline,
        bus_name: if options.add_bus_names { Some(bus_name) } else { None },
    };

    info!(
        case = %case.name,
        buses = case.bus.len(),
        generators = case.gen.len(),
        branches = case.branch.len(),
        warnings = diag.warning_count(),
        "decoded document"
    );
    Ok(case)
}
