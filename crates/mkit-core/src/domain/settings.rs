//! Settings - the configuration document handed to the engine.
//!
//! The document is a JSON object:
//!
//! ```text
//! { name, log_level?, output_filepath?, log_filepath?,
//!   options: {k: scalar}, annotations: {k: scalar},
//!   inputs?: [string], input_filepaths?: [string] }
//! ```
//!
//! `name` is written once in [`Settings::new`] and there is no setter for it.
//! Empty sections are left out of the serialized document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Value accepted by options and annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::String(s) => Value::String(s),
            Scalar::Integer(i) => Value::from(i),
            Scalar::Float(f) => Value::from(f),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<&String> for Scalar {
    fn from(s: &String) -> Self {
        Scalar::String(s.clone())
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Scalar::Integer(i64::from(i))
    }
}

impl From<u32> for Scalar {
    fn from(i: u32) -> Self {
        Scalar::Integer(i64::from(i))
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<f32> for Scalar {
    fn from(f: f32) -> Self {
        Scalar::Float(f64::from(f))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    name: String,
    log_level: Option<String>,
    output_filepath: Option<String>,
    log_filepath: Option<String>,
    options: BTreeMap<String, Scalar>,
    annotations: BTreeMap<String, Scalar>,
    inputs: Vec<String>,
    input_filepaths: Vec<String>,
}

impl Settings {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            log_level: None,
            output_filepath: None,
            log_filepath: None,
            options: BTreeMap::new(),
            annotations: BTreeMap::new(),
            inputs: Vec::new(),
            input_filepaths: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_output_filepath(&mut self, path: impl Into<String>) {
        self.output_filepath = Some(path.into());
    }

    pub fn set_log_filepath(&mut self, path: impl Into<String>) {
        self.log_filepath = Some(path.into());
    }

    /// `None` drops the field: the engine then uses its own default.
    pub fn set_log_level(&mut self, level: Option<&str>) {
        self.log_level = level.map(str::to_string);
    }

    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        self.options.insert(key.into(), value.into());
    }

    pub fn add_annotation(&mut self, key: impl Into<String>, value: impl Into<Scalar>) {
        self.annotations.insert(key.into(), value.into());
    }

    pub fn push_input(&mut self, input: impl Into<String>) {
        self.inputs.push(input.into());
    }

    pub fn push_input_filepath(&mut self, path: impl Into<String>) {
        self.input_filepaths.push(path.into());
    }

    pub fn log_level(&self) -> Option<&str> {
        self.log_level.as_deref()
    }

    pub fn output_filepath(&self) -> Option<&str> {
        self.output_filepath.as_deref()
    }

    pub fn log_filepath(&self) -> Option<&str> {
        self.log_filepath.as_deref()
    }

    pub fn option(&self, key: &str) -> Option<&Scalar> {
        self.options.get(key)
    }

    pub fn annotation(&self, key: &str) -> Option<&Scalar> {
        self.annotations.get(key)
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn input_filepaths(&self) -> &[String] {
        &self.input_filepaths
    }

    /// The document as a JSON object. Unset and empty sections are left out.
    pub fn to_value(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("name".into(), Value::from(self.name.as_str()));
        let paths = [
            ("log_level", &self.log_level),
            ("output_filepath", &self.output_filepath),
            ("log_filepath", &self.log_filepath),
        ];
        for (key, field) in paths {
            if let Some(v) = field {
                doc.insert(key.into(), Value::from(v.as_str()));
            }
        }
        for (key, section) in [("options", &self.options), ("annotations", &self.annotations)] {
            if !section.is_empty() {
                let entries = section
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                    .collect();
                doc.insert(key.into(), Value::Object(entries));
            }
        }
        for (key, list) in [("inputs", &self.inputs), ("input_filepaths", &self.input_filepaths)] {
            if !list.is_empty() {
                doc.insert(key.into(), Value::from(list.clone()));
            }
        }
        Value::Object(doc)
    }

    /// Serialized form passed to `TaskEngine::start`.
    pub fn to_json_string(&self) -> String {
        self.to_value().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_document_only_carries_name() {
        let s = Settings::new("Ndt");
        assert_eq!(s.to_value(), json!({ "name": "Ndt" }));
    }

    #[test]
    fn option_is_last_write_wins_across_value_types() {
        let mut s = Settings::new("Ndt");
        s.set_option("server", "a.example");
        s.set_option("server", 7_i64);
        s.set_option("server", 1.5);
        assert_eq!(s.option("server"), Some(&Scalar::Float(1.5)));

        s.set_option("port", 3001);
        s.set_option("port", "3010");
        assert_eq!(s.option("port"), Some(&Scalar::from("3010")));
    }

    #[test]
    fn annotation_is_last_write_wins() {
        let mut s = Settings::new("Ndt");
        s.add_annotation("scope", "example");
        s.add_annotation("scope", "production");
        s.add_annotation("run", 2);
        assert_eq!(
            s.to_value()["annotations"],
            json!({ "scope": "production", "run": 2 })
        );
    }

    #[test]
    fn inputs_keep_call_order() {
        let mut s = Settings::new("WebConnectivity");
        s.push_input("https://a.example/");
        s.push_input("https://b.example/");
        s.push_input("https://a.example/");
        assert_eq!(
            s.inputs(),
            vec!["https://a.example/", "https://b.example/", "https://a.example/"]
        );
        assert!(s.input_filepaths().is_empty());
    }

    #[test]
    fn log_level_none_removes_field() {
        let mut s = Settings::new("Ndt");
        s.set_log_level(Some("INFO"));
        assert_eq!(s.log_level(), Some("INFO"));
        s.set_log_level(None);
        assert!(s.to_value().get("log_level").is_none());
    }

    #[test]
    fn document_is_always_an_object() {
        let mut s = Settings::new("Dash");
        s.set_option("ratio", f64::NAN);
        s.set_option("server", "a.example");
        let doc = s.to_value();
        assert_eq!(doc["name"], "Dash");
        assert!(doc["options"]["ratio"].is_null());
        assert_eq!(doc["options"]["server"], "a.example");
    }

    #[test]
    fn serialized_document_parses_back() {
        let mut s = Settings::new("TcpConnect");
        s.set_output_filepath("report.njson");
        s.set_log_filepath("log.txt");
        s.push_input_filepath("inputs.txt");
        let parsed: Value = serde_json::from_str(&s.to_json_string()).unwrap();
        assert_eq!(
            parsed,
            json!({
                "name": "TcpConnect",
                "output_filepath": "report.njson",
                "log_filepath": "log.txt",
                "input_filepaths": ["inputs.txt"],
            })
        );
    }

    #[test]
    fn scalar_accepts_only_string_int_float() {
        let ok: Vec<Scalar> = serde_json::from_value(json!(["x", 3, 2.5])).unwrap();
        assert_eq!(
            ok,
            vec![Scalar::from("x"), Scalar::Integer(3), Scalar::Float(2.5)]
        );
        assert!(serde_json::from_value::<Scalar>(json!(true)).is_err());
        assert!(serde_json::from_value::<Scalar>(json!({ "a": 1 })).is_err());
    }
}
