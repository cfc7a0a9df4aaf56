//! Symptom observations.
//!
//! An observation records which symptoms a patient presents with. It is built from whatever the
//! caller supplies and never fails: names outside the canonical symptom list are carried along
//! but ignored when the observation is encoded, and symptoms that are not mentioned count as
//! absent.

use std::collections::BTreeSet;

/// The set of symptom names flagged as present in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomObservation {
    present: BTreeSet<String>,
}

impl SymptomObservation {
    /// An observation with no symptoms present.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds an observation from `(name, present)` flags. Later flags for the same name win.
    pub fn from_flags<I, K>(flags: I) -> Self
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        let mut present = BTreeSet::new();
        for (name, flag) in flags {
            let name = name.into();
            if flag {
                present.insert(name);
            } else {
                present.remove(&name);
            }
        }
        Self { present }
    }

    /// Builds an observation in which every listed name is present.
    pub fn from_names<I, K>(names: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::from_flags(names.into_iter().map(|n| (n, true)))
    }

    /// Builds an observation from a JSON object, reading each value by truthiness.
    ///
    /// `true`, non-zero numbers and non-empty strings, arrays and objects mark a symptom present.
    /// `false`, `0`, `""`, `null` and empty containers mark it absent.
    pub fn from_json_map(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        Self::from_flags(map.iter().map(|(k, v)| (k.clone(), is_truthy(v))))
    }

    /// Whether `symptom` was flagged present.
    pub fn is_present(&self, symptom: &str) -> bool {
        self.present.contains(symptom)
    }

    /// Names flagged present, including any the classifier does not know.
    pub fn flagged(&self) -> impl Iterator<Item = &str> {
        self.present.iter().map(String::as_str)
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_keys_default_to_false() {
        let observation = SymptomObservation::from_names(["fever"]);
        assert!(observation.is_present("fever"));
        assert!(!observation.is_present("cough"));
    }

    #[test]
    fn test_false_flag_overrides_earlier_true() {
        let observation = SymptomObservation::from_flags([("fever", true), ("fever", false)]);
        assert!(!observation.is_present("fever"));
    }

    #[test]
    fn test_json_truthiness() {
        let value = json!({
            "fever": true,
            "cough": 1,
            "fatigue": "yes",
            "headache": false,
            "nausea": 0,
            "diarrhea": "",
            "sore_throat": null,
            "body_ache": [],
            "loss_of_taste": {"since": "monday"}
        });
        let observation = SymptomObservation::from_json_map(value.as_object().unwrap());

        let flagged: Vec<&str> = observation.flagged().collect();
        assert_eq!(flagged, vec!["cough", "fatigue", "fever", "loss_of_taste"]);
    }

    #[test]
    fn test_unknown_names_are_kept_for_inspection() {
        let observation = SymptomObservation::from_names(["fever", "third_eye"]);
        assert!(observation.is_present("third_eye"));
    }
}
