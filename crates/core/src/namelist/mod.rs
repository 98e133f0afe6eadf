//! Fortran namelist rendering.
//!
//! A [`Namelist`] is an ordered list of sections, each an ordered list of
//! `key = value` entries. Rendering produces the text the WPS and WRF
//! programs read:
//!
//! ```text
//! &share
//!  max_dom = 2
//!  wrf_core = 'ARW'
//! /
//!
//! &geogrid
//!  e_we = 74, 112
//! /
//! ```

pub mod wps;
pub mod wrf;

pub use wps::wps_namelist;
pub use wrf::wrf_namelist;

use std::fmt;

/// One namelist value.
#[derive(Debug, Clone, PartialEq)]
pub enum NamelistValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<NamelistValue>),
}

impl fmt::Display for NamelistValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamelistValue::Str(value) => write!(f, "'{value}'"),
            NamelistValue::Int(value) => write!(f, "{value}"),
            NamelistValue::Float(value) => write!(f, "{value}"),
            NamelistValue::Bool(true) => f.write_str(".true."),
            NamelistValue::Bool(false) => f.write_str(".false."),
            NamelistValue::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for NamelistValue {
    fn from(value: &str) -> Self {
        NamelistValue::Str(value.to_string())
    }
}

impl From<String> for NamelistValue {
    fn from(value: String) -> Self {
        NamelistValue::Str(value)
    }
}

impl From<i64> for NamelistValue {
    fn from(value: i64) -> Self {
        NamelistValue::Int(value)
    }
}

impl From<u32> for NamelistValue {
    fn from(value: u32) -> Self {
        NamelistValue::Int(i64::from(value))
    }
}

impl From<f64> for NamelistValue {
    fn from(value: f64) -> Self {
        NamelistValue::Float(value)
    }
}

impl From<bool> for NamelistValue {
    fn from(value: bool) -> Self {
        NamelistValue::Bool(value)
    }
}

impl<T: Into<NamelistValue>> From<Vec<T>> for NamelistValue {
    fn from(items: Vec<T>) -> Self {
        NamelistValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// A named group of entries, `&name ... /`.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    name: String,
    entries: Vec<(String, NamelistValue)>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set `key`, replacing an existing value in place so the key keeps its
    /// position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<NamelistValue>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&NamelistValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &NamelistValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "&{}", self.name)?;
        for (key, value) in &self.entries {
            writeln!(f, " {key} = {value}")?;
        }
        f.write_str("/")
    }
}

/// Ordered sections of a namelist file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namelist {
    sections: Vec<Section>,
}

impl Namelist {
    pub fn new() -> Self {
        Self::default()
    }

    /// The section called `name`, appended if missing.
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        let index = match self.sections.iter().position(|section| section.name == name) {
            Some(index) => index,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Overlay `other` on top of `self`. Values in `other` win; new sections
    /// and keys are appended.
    pub fn merge(&mut self, other: &Namelist) {
        for section in &other.sections {
            let target = self.section_mut(&section.name);
            for (key, value) in &section.entries {
                target.set(key.clone(), value.clone());
            }
        }
    }

    /// Text of the namelist file, ending with a newline.
    pub fn render(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Namelist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, section) in self.sections.iter().enumerate() {
            if index > 0 {
                f.write_str("\n\n")?;
            }
            write!(f, "{section}")?;
        }
        Ok(())
    }
}
