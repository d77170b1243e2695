use std::collections::HashMap;

use compact_str::CompactString;

/// Which revenue-growth series a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Month-over-month revenue growth, in percent.
    MonthOverMonth,
    /// Year-over-year revenue growth, in percent.
    YearOverYear,
}

/// A directed relation edge, pre-filtered to the company of interest.
/// The upstream/downstream split happens in the ingestion layer; by the time
/// edges reach the core they carry only a relation-type label and a partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEdge {
    /// Relation-type label shared by a group, e.g. "Upstream Materials".
    pub relation: CompactString,
    /// Partner company code, e.g. "2330".
    pub partner: CompactString,
}

impl RelationEdge {
    pub fn new(relation: &str, partner: &str) -> Self {
        Self {
            relation: CompactString::new(relation),
            partner: CompactString::new(partner),
        }
    }
}

/// Company directory entry.
#[derive(Debug, Clone)]
pub struct CompanyInfo {
    pub name: CompactString,
    pub industry: CompactString,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MetricKey {
    code: CompactString,
    period: CompactString,
    kind: MetricKind,
}

/// Per-load data context: company directory plus resolved growth metrics.
///
/// Rebuilt from scratch on every data load and passed into the render entry
/// point; nothing in the core reads module-level state. Only finite metric
/// values are stored, so every successful lookup yields a usable number.
#[derive(Default)]
pub struct Session {
    companies: HashMap<CompactString, CompanyInfo>,
    growth: HashMap<MetricKey, f64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_company(&mut self, code: &str, name: &str, industry: &str) {
        self.companies.insert(
            CompactString::new(code),
            CompanyInfo {
                name: CompactString::new(name),
                industry: CompactString::new(industry),
            },
        );
    }

    /// Record a resolved growth reading. Non-finite values are a data-quality
    /// problem in the source sheet; they are rejected here so that every
    /// stored reading is finite.
    pub fn insert_growth(&mut self, code: &str, period: &str, kind: MetricKind, value: f64) {
        if !value.is_finite() {
            tracing::warn!(
                "Rejecting non-finite {:?} reading for {} in {}: {}",
                kind,
                code,
                period,
                value
            );
            return;
        }
        self.growth.insert(
            MetricKey {
                code: CompactString::new(code),
                period: CompactString::new(period),
                kind,
            },
            value,
        );
    }

    /// Resolved growth value for a company, or `None` when unavailable.
    pub fn growth(&self, code: &str, period: &str, kind: MetricKind) -> Option<f64> {
        let key = MetricKey {
            code: CompactString::new(code),
            period: CompactString::new(period),
            kind,
        };
        self.growth.get(&key).copied()
    }

    /// Display name for a code, falling back to the bare code when the
    /// directory has no entry (the source sheet sometimes leaves names blank).
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        match self.companies.get(code) {
            Some(info) if !info.name.is_empty() => info.name.as_str(),
            _ => code,
        }
    }

    pub fn industry(&self, code: &str) -> Option<&str> {
        self.companies.get(code).map(|info| info.industry.as_str())
    }

    pub fn company_count(&self) -> usize {
        self.companies.len()
    }

    pub fn metric_count(&self) -> usize {
        self.growth.len()
    }
}
