//! Row layout of components
//!
//! Hosts render components in a grid of at most [`MAX_ROWS`] rows, each
//! holding [`ROW_WIDTH`] units. A button takes one unit, a select takes a
//! whole row. Components with an explicit row go there; the rest fill the
//! first row with room, in declaration order. A select lists at most
//! [`MAX_SELECT_OPTIONS`] options.

use super::component::{Component, ComponentKind};
use crate::error::{PageError, PageResult};

/// Maximum number of component rows in one message
pub const MAX_ROWS: usize = 5;

/// Capacity of a single row
pub const ROW_WIDTH: usize = 5;

/// Maximum number of options in one select
pub const MAX_SELECT_OPTIONS: usize = 25;

/// Arrange components into rows, or fail if they don't fit.
pub fn arrange(components: &[Component]) -> PageResult<Vec<Vec<&Component>>> {
    let mut rows: Vec<Vec<&Component>> = vec![Vec::new(); MAX_ROWS];
    let mut used = [0usize; MAX_ROWS];

    for component in components {
        if let ComponentKind::Select { options, .. } = &component.kind {
            if options.len() > MAX_SELECT_OPTIONS {
                return Err(PageError::Layout(format!(
                    "select {} has {} options, at most {} are allowed",
                    component.id,
                    options.len(),
                    MAX_SELECT_OPTIONS
                )));
            }
        }
    }

    // Pinned components first so auto-placement can't steal their room
    for component in components.iter().filter(|c| c.row.is_some()) {
        let row = usize::from(component.row.unwrap_or_default());
        if row >= MAX_ROWS {
            return Err(PageError::Layout(format!(
                "component {} requests row {} but only {} rows exist",
                component.id, row, MAX_ROWS
            )));
        }
        if used[row] + component.width() > ROW_WIDTH {
            return Err(PageError::Layout(format!(
                "component {} does not fit into row {}",
                component.id, row
            )));
        }
        used[row] += component.width();
        rows[row].push(component);
    }

    for component in components.iter().filter(|c| c.row.is_none()) {
        let Some(row) = (0..MAX_ROWS).find(|&r| used[r] + component.width() <= ROW_WIDTH) else {
            return Err(PageError::Layout(format!(
                "no room left for component {}",
                component.id
            )));
        };
        used[row] += component.width();
        rows[row].push(component);
    }

    rows.retain(|row| !row.is_empty());
    Ok(rows)
}
