//! Query-string filters shared by the read endpoints.

use crate::error::{EnergyError, Result};
use serde::Deserialize;

/// Raw `?year=&entity=` parameters. Values arrive as text so a bad `year`
/// becomes a validation error rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    pub year: Option<String>,
    pub entity: Option<String>,
}

impl FilterParams {
    /// Parsed year filter. Absent or empty means no filter.
    pub fn year(&self) -> Result<Option<i32>> {
        match self.year.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse::<i32>().map(Some).map_err(|_| {
                EnergyError::query_validation("year", format!("'{raw}' is not an integer"))
            }),
        }
    }

    /// Entity filter, matched exactly. Absent or empty means no filter.
    pub fn entity(&self) -> Option<String> {
        self.entity.clone().filter(|e| !e.is_empty())
    }
}
