//! Row advancement over a statement's result sets.

use crate::decoder;
use crate::diagnostics;
use crate::error::{Error, Result};
use crate::handle::HandleKind;
use crate::row::Row;
use crate::statement::{self, Statement};
use crate::types::*;
use crate::value::Value;

/// Outcome of [`Statement::fetch_row`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Row,
    EndOfData,
}

impl<'c> Statement<'c> {
    /// Advances to the next row; `false` at the end of the result set.
    ///
    /// Once the end is reached the backend is not asked again until the
    /// statement is re-executed or moved to its next result set.
    pub fn fetch(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let more = self.shared.with(|api, stmt| {
            let ret = unsafe { api.fetch(stmt) };
            if ret == SQL_NO_DATA {
                return Ok(false);
            }
            diagnostics::check(api, HandleKind::Statement, stmt, ret, "SQLFetch")?;
            Ok(true)
        })?;
        self.exhausted = !more;
        Ok(more)
    }

    /// Decodes 0-based column `index` of the current row.
    pub fn field(&mut self, index: usize) -> Result<Value> {
        let ty = self.column_type(index)?;
        let column = statement::column_number(index)?;
        self.shared
            .with(|api, stmt| decoder::decode(api, stmt, column, ty))
    }

    /// Fetches the next row into `dest`, one value per column.
    ///
    /// The destination is checked before the cursor moves, so a short one
    /// leaves the row in place for a retry.
    pub fn fetch_row(&mut self, dest: &mut [Value]) -> Result<FetchOutcome> {
        let count = self.num_fields()?;
        if dest.len() < count {
            return Err(Error::DestinationTooShort {
                needed: count,
                len: dest.len(),
            });
        }
        if !self.fetch()? {
            return Ok(FetchOutcome::EndOfData);
        }
        for (index, slot) in dest.iter_mut().take(count).enumerate() {
            *slot = self.field(index)?;
        }
        Ok(FetchOutcome::Row)
    }

    /// The next row, or `None` at the end of the result set.
    pub fn fetch_one(&mut self) -> Result<Option<Row>> {
        if !self.fetch()? {
            return Ok(None);
        }
        let names = self.column_names()?;
        let values = (0..names.len())
            .map(|index| self.field(index))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(Row::new(names, values)))
    }

    /// Every remaining row of the current result set.
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch_one()? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn cursor(&mut self) -> Cursor<'_, 'c> {
        Cursor {
            statement: self,
            failed: false,
        }
    }
}

/// Iterates the rows of a statement's current result set.
///
/// Iteration ends after the first error; moving to the next result set
/// resumes it.
#[derive(Debug)]
pub struct Cursor<'s, 'c> {
    statement: &'s mut Statement<'c>,
    failed: bool,
}

impl Cursor<'_, '_> {
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        self.statement.fetch_one()
    }

    pub fn fetch_into(&mut self, dest: &mut [Value]) -> Result<FetchOutcome> {
        self.statement.fetch_row(dest)
    }

    pub fn columns(&self) -> Result<Vec<String>> {
        self.statement.columns()
    }

    pub fn next_result_set(&mut self) -> Result<bool> {
        let more = self.statement.next_result()?;
        self.failed = false;
        Ok(more)
    }
}

impl Iterator for Cursor<'_, '_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let row = self.next_row().transpose();
        self.failed = matches!(row, Some(Err(_)));
        row
    }
}
