//! Typed route records
//!
//! A `Route` is one row of the spreadsheet. `RouteField` is the table that
//! maps spreadsheet column names onto the typed fields; anything the table
//! does not know about is carried in `Route::extra` so saving never drops a
//! column.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::errors::{RouteError, RouteResult};

/// Known spreadsheet columns, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteField {
    Bus,
    Number,
    Name,
    Schools,
    Shift,
    Monitor,
    Driver,
    Company,
    Distance,
    Plate,
    StartDate,
}

impl RouteField {
    /// All fields in spreadsheet column order.
    pub const ALL: [RouteField; 11] = [
        RouteField::Bus,
        RouteField::Number,
        RouteField::Name,
        RouteField::Schools,
        RouteField::Shift,
        RouteField::Monitor,
        RouteField::Driver,
        RouteField::Company,
        RouteField::Distance,
        RouteField::Plate,
        RouteField::StartDate,
    ];

    /// Header markers that identify the route number column.
    pub const KEY_MARKERS: [&'static str; 3] = ["N° ROTA", "Nº ROTA", "NUMERO"];

    /// Canonical column name written to the spreadsheet.
    pub fn header(&self) -> &'static str {
        match self {
            RouteField::Bus => "ÔNIBUS",
            RouteField::Number => "N° ROTA",
            RouteField::Name => "ROTA",
            RouteField::Schools => "ESCOLAS ATENDIDAS",
            RouteField::Shift => "TURNO QUE O ÔNIBUS ATENDE",
            RouteField::Monitor => "MONITOR",
            RouteField::Driver => "MOTORISTAS / CONTATO",
            RouteField::Company => "EMPRESA",
            RouteField::Distance => "KM",
            RouteField::Plate => "PLACAS - ÔNIBUS",
            RouteField::StartDate => "DATA DE INÍCIO",
        }
    }

    /// Resolves a column name, ignoring surrounding whitespace and case.
    pub fn from_header(name: &str) -> Option<Self> {
        let name = name.trim().to_uppercase();
        if name.is_empty() {
            return None;
        }
        if Self::KEY_MARKERS.contains(&name.as_str()) {
            return Some(RouteField::Number);
        }
        Self::ALL.into_iter().find(|field| field.header() == name)
    }

    /// Whether `!updrota` may change this field.
    ///
    /// The route number is the registry key and never changes in place.
    pub fn is_updatable(&self) -> bool {
        !matches!(self, RouteField::Number)
    }

    /// Fields accepted by `!updrota`, in column order.
    pub fn updatable() -> impl Iterator<Item = RouteField> {
        Self::ALL.into_iter().filter(RouteField::is_updatable)
    }
}

impl fmt::Display for RouteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One school bus route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Route {
    pub bus: String,
    pub number: String,
    pub name: String,
    pub schools: String,
    pub shift: String,
    pub monitor: String,
    pub driver: String,
    pub company: String,
    pub distance: String,
    pub plate: String,
    pub start_date: String,
    /// Columns with no typed counterpart, keyed by column slot name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Route {
    /// Builds a route from values in spreadsheet column order.
    pub fn from_values(values: [String; 11]) -> Self {
        let mut route = Route::default();
        for (field, value) in RouteField::ALL.into_iter().zip(values) {
            route.set(field, value);
        }
        route
    }

    /// Registry key, trimmed.
    pub fn key(&self) -> &str {
        self.number.trim()
    }

    /// Whether this route's key matches `key`, ignoring case.
    pub fn has_key(&self, key: &str) -> bool {
        !self.key().is_empty() && self.key().to_uppercase() == key.trim().to_uppercase()
    }

    pub fn get(&self, field: RouteField) -> &str {
        match field {
            RouteField::Bus => &self.bus,
            RouteField::Number => &self.number,
            RouteField::Name => &self.name,
            RouteField::Schools => &self.schools,
            RouteField::Shift => &self.shift,
            RouteField::Monitor => &self.monitor,
            RouteField::Driver => &self.driver,
            RouteField::Company => &self.company,
            RouteField::Distance => &self.distance,
            RouteField::Plate => &self.plate,
            RouteField::StartDate => &self.start_date,
        }
    }

    pub fn set(&mut self, field: RouteField, value: String) {
        let slot = match field {
            RouteField::Bus => &mut self.bus,
            RouteField::Number => &mut self.number,
            RouteField::Name => &mut self.name,
            RouteField::Schools => &mut self.schools,
            RouteField::Shift => &mut self.shift,
            RouteField::Monitor => &mut self.monitor,
            RouteField::Driver => &mut self.driver,
            RouteField::Company => &mut self.company,
            RouteField::Distance => &mut self.distance,
            RouteField::Plate => &mut self.plate,
            RouteField::StartDate => &mut self.start_date,
        };
        *slot = value;
    }

    /// Case-insensitive substring match on one field.
    pub fn field_contains(&self, field: RouteField, needle: &str) -> bool {
        let value = self.get(field);
        !value.is_empty() && value.to_uppercase().contains(&needle.to_uppercase())
    }
}

/// A set of field changes for an existing route.
///
/// Only updatable fields can be added; the route number is rejected here,
/// at the boundary, instead of deep inside the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePatch {
    changes: Vec<(RouteField, String)>,
}

impl RoutePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a change, replacing an earlier change to the same field.
    pub fn set(mut self, field: RouteField, value: impl Into<String>) -> RouteResult<Self> {
        if !field.is_updatable() {
            return Err(RouteError::FormatError(format!(
                "O campo {} não pode ser alterado",
                field
            )));
        }
        let value = value.into();
        match self.changes.iter_mut().find(|(f, _)| *f == field) {
            Some(change) => change.1 = value,
            None => self.changes.push((field, value)),
        }
        Ok(self)
    }

    pub fn changes(&self) -> &[(RouteField, String)] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
