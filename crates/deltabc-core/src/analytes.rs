use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;

pub const TOTAL_KJELDAHL_NITROGEN: &str = "TKN";
pub const DISSOLVED_ORGANIC_NITROGEN: &str = "DON";
pub const NITRATE_NITRITE: &str = "DissNitrateNitrite";
pub const ORTHOPHOSPHATE: &str = "DissOrthoPhos";

/// Which long-format dataset an analyte is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyteSchema {
    Lab,
    Field,
}

impl AnalyteSchema {
    pub fn analytes(&self) -> &'static [Analyte] {
        match self {
            AnalyteSchema::Lab => &LAB_ANALYTES,
            AnalyteSchema::Field => &FIELD_ANALYTES,
        }
    }

    /// Number of fields in one output row of this schema.
    pub fn field_count(&self) -> usize {
        match self {
            AnalyteSchema::Lab => 12,
            AnalyteSchema::Field => 14,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyteSchema::Lab => "lab",
            AnalyteSchema::Field => "field",
        }
    }
}

impl fmt::Display for AnalyteSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Analyte {
    /// Column name in the wide survey export.
    pub code: &'static str,
    /// Name used by the legacy long-format dataset.
    pub long_name: &'static str,
    pub schema: AnalyteSchema,
}

const fn lab(code: &'static str, long_name: &'static str) -> Analyte {
    Analyte {
        code,
        long_name,
        schema: AnalyteSchema::Lab,
    }
}

const fn field(code: &'static str, long_name: &'static str) -> Analyte {
    Analyte {
        code,
        long_name,
        schema: AnalyteSchema::Field,
    }
}

pub static LAB_ANALYTES: [Analyte; 10] = [
    lab("TotPhos", "Phosphorus (Total)"),
    lab(TOTAL_KJELDAHL_NITROGEN, "Kjeldahl Nitrogen (Total)"),
    lab(ORTHOPHOSPHATE, "Ortho-phosphate (Dissolved)"),
    lab("Chla", "Chlorophyll a"),
    lab("TSS", "Solids (Total Suspended)"),
    lab("TDS", "Solids (Total Dissolved)"),
    lab(DISSOLVED_ORGANIC_NITROGEN, "Organic Nitrogen (Dissolved)"),
    lab("DissAmmonia", "Ammonia (Total)"),
    lab(NITRATE_NITRITE, "Nitrite + Nitrate (Dissolved)"),
    lab("DissSilica", "Silica (SiO2) (Dissolved)"),
];

pub static FIELD_ANALYTES: [Analyte; 6] = [
    field("Secchi", "Secchi Depth"),
    field("WTSurface", "Temperature"),
    field("DOSurface", "Oxygen"),
    field("TurbiditySurface", "Turbidity"),
    field("pHSurface", "pH"),
    field("SpCndSurface", "Conductance (EC)"),
];

static BY_CODE: Lazy<HashMap<&'static str, &'static Analyte>> = Lazy::new(|| {
    LAB_ANALYTES
        .iter()
        .chain(FIELD_ANALYTES.iter())
        .map(|analyte| (analyte.code, analyte))
        .collect()
});

static BY_LONG_NAME: Lazy<HashMap<&'static str, &'static Analyte>> = Lazy::new(|| {
    LAB_ANALYTES
        .iter()
        .chain(FIELD_ANALYTES.iter())
        .map(|analyte| (analyte.long_name, analyte))
        .collect()
});

pub fn by_code(code: &str) -> Option<&'static Analyte> {
    BY_CODE.get(code).copied()
}

pub fn by_long_name(long_name: &str) -> Option<&'static Analyte> {
    BY_LONG_NAME.get(long_name).copied()
}
