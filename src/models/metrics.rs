use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Architectural smell kinds, labelled exactly as the analysis tool reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SmellKind {
    AmbiguousInterface,
    CyclicDependency,
    DenseStructure,
    FeatureConcentration,
    GodComponent,
    ScatteredFunctionality,
    UnstableDependency,
}

impl SmellKind {
    pub const ALL: [SmellKind; 7] = [
        SmellKind::AmbiguousInterface,
        SmellKind::CyclicDependency,
        SmellKind::DenseStructure,
        SmellKind::FeatureConcentration,
        SmellKind::GodComponent,
        SmellKind::ScatteredFunctionality,
        SmellKind::UnstableDependency,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SmellKind::AmbiguousInterface => "Ambiguous Interface",
            SmellKind::CyclicDependency => "Cyclic Dependency",
            SmellKind::DenseStructure => "Dense Structure",
            SmellKind::FeatureConcentration => "Feature Concentration",
            SmellKind::GodComponent => "God Component",
            SmellKind::ScatteredFunctionality => "Scattered Functionality",
            SmellKind::UnstableDependency => "Unstable Dependency",
        }
    }

    pub fn from_label(label: &str) -> Option<SmellKind> {
        SmellKind::ALL.into_iter().find(|kind| kind.label() == label)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Occurrence counter over the fixed smell vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmellCounts([u32; 7]);

impl SmellCounts {
    pub fn get(&self, kind: SmellKind) -> u32 {
        self.0[kind.index()]
    }

    pub fn increment(&mut self, kind: SmellKind) {
        self.0[kind.index()] += 1;
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Counts in `SmellKind::ALL` order.
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl AddAssign<&SmellCounts> for SmellCounts {
    fn add_assign(&mut self, other: &SmellCounts) {
        for (mine, theirs) in self.0.iter_mut().zip(other.0.iter()) {
            *mine += theirs;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub package: String,
    pub class: String,
    pub loc: u64,
    pub fan_in: u64,
    pub fan_out: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRow {
    pub package: String,
    pub class: String,
    pub instructions_covered: u64,
    pub instructions_missed: u64,
}

/// Covered/missed instruction totals for some set of classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionTotals {
    pub covered: u64,
    pub missed: u64,
}

impl InstructionTotals {
    pub fn add(&mut self, row: &CoverageRow) {
        self.covered += row.instructions_covered;
        self.missed += row.instructions_missed;
    }

    /// `covered * 100 / (covered + missed)`, or `None` when nothing was instrumented.
    pub fn percentage(&self) -> Option<f64> {
        let total = self.covered + self.missed;
        if total == 0 {
            return None;
        }
        Some((self.covered * 100) as f64 / total as f64)
    }
}

/// Whole-project values scraped from the architecture reports of one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectScalars {
    pub decoupling_level: f64,
    pub propagation_cost: f64,
    pub dense_structure_average_degree: f64,
}

pub type SmellTable = BTreeMap<String, SmellCounts>;
pub type ClassTable = BTreeMap<String, Vec<ClassMetrics>>;
pub type CoverageTable = BTreeMap<String, Vec<CoverageRow>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_vocabulary() {
        for kind in SmellKind::ALL {
            assert_eq!(SmellKind::from_label(kind.label()), Some(kind));
        }
        assert_eq!(SmellKind::from_label("cyclic dependency"), None);
    }

    #[test]
    fn counts_accumulate_per_kind() {
        let mut a = SmellCounts::default();
        a.increment(SmellKind::CyclicDependency);
        a.increment(SmellKind::CyclicDependency);
        let mut b = SmellCounts::default();
        b.increment(SmellKind::GodComponent);

        a += &b;
        assert_eq!(a.get(SmellKind::CyclicDependency), 2);
        assert_eq!(a.get(SmellKind::GodComponent), 1);
        assert_eq!(a.total(), 3);
    }

    #[test]
    fn coverage_percentage_is_absent_without_instructions() {
        assert_eq!(InstructionTotals::default().percentage(), None);
        let totals = InstructionTotals {
            covered: 8,
            missed: 2,
        };
        assert_eq!(totals.percentage(), Some(80.0));
    }
}
