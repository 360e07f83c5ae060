//! Map a patient's free-text reason to a procedure and its chair time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A bookable procedure with a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Procedure {
    GeneralCheckup,
    Cleaning,
    Filling,
    Extraction,
    RootCanal,
    EmergencyVisit,
}

/// Keywords per procedure, checked in order; the first hit wins.
const CATALOG: &[(Procedure, &[&str])] = &[
    (
        Procedure::GeneralCheckup,
        &["checkup", "consult", "tooth pain", "toothache", "sensitivity"],
    ),
    (Procedure::Cleaning, &["cleaning", "scaling", "polish"]),
    (Procedure::Filling, &["filling", "cavity"]),
    (Procedure::Extraction, &["extraction", "remove tooth"]),
    (Procedure::RootCanal, &["root canal", "rct"]),
    (Procedure::EmergencyVisit, &["emergency", "bleeding", "swelling"]),
];

impl Procedure {
    /// Match a reason like "my tooth is bleeding" against the catalog.
    pub fn from_reason(reason: &str) -> Option<Procedure> {
        let lowered = reason.to_lowercase();
        CATALOG
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(procedure, _)| *procedure)
    }

    pub fn duration_minutes(self) -> i64 {
        match self {
            Procedure::GeneralCheckup => 15,
            Procedure::Cleaning | Procedure::Filling | Procedure::EmergencyVisit => 30,
            Procedure::Extraction => 45,
            Procedure::RootCanal => 60,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Procedure::GeneralCheckup => "General Checkup",
            Procedure::Cleaning => "Cleaning / Scaling",
            Procedure::Filling => "Filling",
            Procedure::Extraction => "Extraction",
            Procedure::RootCanal => "Root Canal Treatment",
            Procedure::EmergencyVisit => "Emergency Visit",
        }
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
