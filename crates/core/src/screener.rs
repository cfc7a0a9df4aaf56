//! Medication safety screening.
//!
//! Checks a medication list against the reference interaction table (every unordered pair) and
//! against a patient's allergies. Names are compared case-insensitively. The tables are built once
//! from [`ReferenceData`] and never change afterwards, so a screener can be shared freely between
//! threads.

use crate::reference::{ReferenceData, Severity};
use medintel_types::LookupKey;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One interaction between two medications in the query.
///
/// `medication1` and `medication2` follow the order of the reference rule, not the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionFinding {
    pub medication1: String,
    pub medication2: String,
    pub warning: String,
    pub severity: Severity,
}

/// One medication the patient should not take because of a known allergy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllergyFinding {
    pub allergy: String,
    pub medication: String,
    pub warning: String,
    pub severity: Severity,
}

/// Combined result of both checks for one medication list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningReport {
    pub drug_interactions: Vec<InteractionFinding>,
    pub allergy_warnings: Vec<AllergyFinding>,
    pub medications_checked: Vec<String>,
}

#[derive(Debug, Clone)]
struct InteractionEntry {
    medications: [LookupKey; 2],
    warning: String,
    severity: Severity,
}

/// Order-independent key for a medication pair.
fn pair_key(a: &LookupKey, b: &LookupKey) -> (LookupKey, LookupKey) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MedicationSafetyScreener {
    interactions: HashMap<(LookupKey, LookupKey), InteractionEntry>,
    allergies: HashMap<LookupKey, HashSet<LookupKey>>,
}

impl MedicationSafetyScreener {
    pub fn from_reference(reference: &ReferenceData) -> Self {
        let interactions = reference
            .interactions
            .iter()
            .map(|rule| {
                let [first, second] = &rule.medications;
                (
                    pair_key(first, second),
                    InteractionEntry {
                        medications: rule.medications.clone(),
                        warning: rule.warning.as_str().to_owned(),
                        severity: rule.severity,
                    },
                )
            })
            .collect();

        let allergies = reference
            .allergies
            .iter()
            .map(|rule| {
                (
                    rule.allergy.clone(),
                    rule.medications.iter().cloned().collect(),
                )
            })
            .collect();

        Self {
            interactions,
            allergies,
        }
    }

    /// Finds every listed interaction between two positions of `medications`.
    ///
    /// Pairs are visited as `(i, j)` with `i < j`, so no medication is paired with itself and no
    /// pair of positions is visited twice. Repeating a medication in the input repeats its
    /// findings.
    pub fn check_interactions<S: AsRef<str>>(&self, medications: &[S]) -> Vec<InteractionFinding> {
        let keys: Vec<LookupKey> = medications.iter().map(LookupKey::normalise).collect();

        let mut findings = Vec::new();
        for (i, first) in keys.iter().enumerate() {
            for second in &keys[i + 1..] {
                if let Some(entry) = self.interactions.get(&pair_key(first, second)) {
                    let [m1, m2] = &entry.medications;
                    findings.push(InteractionFinding {
                        medication1: m1.as_str().to_owned(),
                        medication2: m2.as_str().to_owned(),
                        warning: entry.warning.clone(),
                        severity: entry.severity,
                    });
                }
            }
        }
        findings
    }

    /// Finds every medication that conflicts with one of the patient's allergies.
    ///
    /// Findings are ordered by allergy, then by medication, both in input order. Allergies missing
    /// from the reference table are skipped.
    pub fn check_allergies<A: AsRef<str>, M: AsRef<str>>(
        &self,
        allergies: &[A],
        medications: &[M],
    ) -> Vec<AllergyFinding> {
        let medications: Vec<LookupKey> = medications.iter().map(LookupKey::normalise).collect();

        let mut findings = Vec::new();
        for allergy in allergies.iter().map(LookupKey::normalise) {
            let Some(unsafe_medications) = self.allergies.get(&allergy) else {
                continue;
            };
            for medication in medications.iter().filter(|m| unsafe_medications.contains(*m)) {
                findings.push(AllergyFinding {
                    warning: format!(
                        "Patient is allergic to {allergy} and should not take {medication}."
                    ),
                    allergy: allergy.as_str().to_owned(),
                    medication: medication.as_str().to_owned(),
                    severity: Severity::High,
                });
            }
        }
        findings
    }

    /// Runs both checks and echoes the medications back unchanged.
    pub fn screen<M: AsRef<str>, A: AsRef<str>>(
        &self,
        medications: &[M],
        allergies: &[A],
    ) -> ScreeningReport {
        ScreeningReport {
            drug_interactions: self.check_interactions(medications),
            allergy_warnings: self.check_allergies(allergies, medications),
            medications_checked: medications.iter().map(|m| m.as_ref().to_owned()).collect(),
        }
    }

    /// Known allergen categories.
    pub fn allergy_categories(&self) -> impl Iterator<Item = &str> {
        self.allergies.keys().map(LookupKey::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screener() -> MedicationSafetyScreener {
        MedicationSafetyScreener::from_reference(&ReferenceData::embedded().unwrap())
    }

    const NONE: [&str; 0] = [];

    #[test]
    fn test_interaction_is_order_independent() {
        let screener = screener();
        for query in [["aspirin", "warfarin"], ["warfarin", "aspirin"]] {
            let findings = screener.check_interactions(&query);
            assert_eq!(findings.len(), 1);
            assert_eq!(findings[0].medication1, "aspirin");
            assert_eq!(findings[0].medication2, "warfarin");
            assert_eq!(findings[0].severity, Severity::High);
            assert_eq!(findings[0].warning, "High risk of bleeding. Avoid combination.");
        }
    }

    #[test]
    fn test_interaction_reports_table_order_not_sorted_order() {
        let findings = screener().check_interactions(&["Clarithromycin", "SIMVASTATIN"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].medication1, "simvastatin");
        assert_eq!(findings[0].medication2, "clarithromycin");
    }

    #[test]
    fn test_empty_and_singleton_lists_have_no_findings() {
        let screener = screener();
        assert!(screener.check_interactions(&NONE).is_empty());
        assert!(screener.check_interactions(&["aspirin"]).is_empty());
    }

    #[test]
    fn test_unmatched_pairs_produce_nothing() {
        let findings = screener().check_interactions(&["aspirin", "metformin", "ibuprofen"]);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_same_medication_twice_is_not_an_interaction() {
        assert!(screener().check_interactions(&["aspirin", "aspirin"]).is_empty());
    }

    #[test]
    fn test_duplicate_medication_repeats_findings() {
        let findings = screener().check_interactions(&["aspirin", "warfarin", "aspirin"]);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.medication1 == "aspirin"));
    }

    #[test]
    fn test_multiple_interactions_follow_pair_order() {
        let findings =
            screener().check_interactions(&["tramadol", "aspirin", "fluoxetine", "warfarin"]);
        let pairs: Vec<(&str, &str)> = findings
            .iter()
            .map(|f| (f.medication1.as_str(), f.medication2.as_str()))
            .collect();
        assert_eq!(pairs, vec![("fluoxetine", "tramadol"), ("aspirin", "warfarin")]);
    }

    #[test]
    fn test_allergy_flags_only_unsafe_medication() {
        let findings = screener().check_allergies(&["penicillin"], &["amoxicillin", "metformin"]);
        assert_eq!(
            findings,
            vec![AllergyFinding {
                allergy: "penicillin".into(),
                medication: "amoxicillin".into(),
                warning: "Patient is allergic to penicillin and should not take amoxicillin."
                    .into(),
                severity: Severity::High,
            }]
        );
    }

    #[test]
    fn test_allergy_check_is_case_insensitive() {
        let screener = screener();
        let upper = screener.check_allergies(&["PENICILLIN"], &["Amoxicillin"]);
        let lower = screener.check_allergies(&["penicillin"], &["amoxicillin"]);
        assert_eq!(upper, lower);
        assert_eq!(upper.len(), 1);
    }

    #[test]
    fn test_unknown_allergy_is_skipped() {
        let findings = screener().check_allergies(&["pollen", "latex"], &["aspirin", "amoxicillin"]);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_allergy_findings_ordered_by_allergy_then_medication() {
        let findings = screener().check_allergies(
            &["nsaids", "penicillin"],
            &["ampicillin", "naproxen", "aspirin"],
        );
        let pairs: Vec<(&str, &str)> = findings
            .iter()
            .map(|f| (f.allergy.as_str(), f.medication.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("nsaids", "naproxen"),
                ("nsaids", "aspirin"),
                ("penicillin", "ampicillin")
            ]
        );
    }

    #[test]
    fn test_multi_word_medication_matches() {
        let findings =
            screener().check_allergies(&["Shellfish"], &["Iodinated Contrast Media"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].medication, "iodinated contrast media");
    }

    #[test]
    fn test_screen_combines_both_checks() {
        let report = screener().screen(&["Aspirin", "Warfarin"], &["nsaids"]);
        assert_eq!(report.drug_interactions.len(), 1);
        assert_eq!(report.allergy_warnings.len(), 1);
        assert_eq!(report.allergy_warnings[0].medication, "aspirin");
        assert_eq!(report.medications_checked, vec!["Aspirin", "Warfarin"]);
    }

    #[test]
    fn test_screen_without_allergies() {
        let report = screener().screen(&["aspirin"], &NONE);
        assert!(report.drug_interactions.is_empty());
        assert!(report.allergy_warnings.is_empty());
    }

    #[test]
    fn test_allergy_categories_listed() {
        let screener = screener();
        let mut categories: Vec<&str> = screener.allergy_categories().collect();
        categories.sort_unstable();
        assert_eq!(categories, vec!["nsaids", "penicillin", "shellfish", "sulfa"]);
    }
}
