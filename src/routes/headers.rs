//! Header set discovered from the spreadsheet
//!
//! The header row fixes the schema for the lifetime of a load. Each column
//! is resolved once against `RouteField`; the first column that resolves to
//! a field owns it, every other column is carried as an extra slot.

use super::record::{Route, RouteField};

/// Where a column's value lives inside a `Route`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Field(RouteField),
    Extra(String),
}

/// One spreadsheet column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name as written in the header row (trimmed)
    pub name: String,
    pub slot: Slot,
}

/// Ordered column schema
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    columns: Vec<Column>,
}

impl HeaderSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The schema written when no spreadsheet existed yet.
    pub fn canonical() -> Self {
        Self::from_names(RouteField::ALL.iter().map(|f| f.header().to_string()))
    }

    /// Resolves a header row into columns.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut columns: Vec<Column> = Vec::new();
        for (index, name) in names.into_iter().enumerate() {
            let name = name.as_ref().trim().to_string();
            let field = RouteField::from_header(&name)
                .filter(|f| !columns.iter().any(|c| c.slot == Slot::Field(*f)));
            let slot = match field {
                Some(field) => Slot::Field(field),
                None => {
                    let duplicate = columns.iter().any(|c| c.name == name);
                    if name.is_empty() || duplicate {
                        Slot::Extra(format!("{}#{}", name, index))
                    } else {
                        Slot::Extra(name.clone())
                    }
                }
            };
            columns.push(Column { name, slot });
        }
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, field: RouteField) -> bool {
        self.columns.iter().any(|c| c.slot == Slot::Field(field))
    }

    /// A usable schema must have a route number column.
    pub fn has_key_column(&self) -> bool {
        self.contains(RouteField::Number)
    }

    /// Zips a data row positionally against the columns.
    ///
    /// Missing trailing cells read as empty; cells past the last column are
    /// ignored.
    pub fn route_from_row(&self, cells: &[String]) -> Route {
        let mut route = Route::default();
        for (index, column) in self.columns.iter().enumerate() {
            let value = cells.get(index).cloned().unwrap_or_default();
            match &column.slot {
                Slot::Field(field) => route.set(*field, value),
                Slot::Extra(key) => {
                    if !value.is_empty() {
                        route.extra.insert(key.clone(), value);
                    }
                }
            }
        }
        route
    }

    /// Renders a route as a data row; missing values become empty strings.
    pub fn row_for(&self, route: &Route) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match &column.slot {
                Slot::Field(field) => route.get(*field).to_string(),
                Slot::Extra(key) => route.extra.get(key).cloned().unwrap_or_default(),
            })
            .collect()
    }
}
