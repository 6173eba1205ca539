use log::warn;

use crate::connection::Connection;
use crate::error::Result;

/// A transaction scope on a [`Connection`].
///
/// Autocommit is off while the guard lives. [`commit`](Self::commit) and
/// [`rollback`](Self::rollback) end the transaction and turn autocommit back
/// on; dropping an unfinished guard rolls back.
#[derive(Debug)]
pub struct Transaction<'t, 'env> {
    connection: &'t Connection<'env>,
    finished: bool,
}

impl<'env> Connection<'env> {
    pub fn transaction(&self) -> Result<Transaction<'_, 'env>> {
        self.begin_transaction()?;
        Ok(Transaction {
            connection: self,
            finished: false,
        })
    }
}

impl<'t, 'env> Transaction<'t, 'env> {
    pub fn connection(&self) -> &'t Connection<'env> {
        self.connection
    }

    pub fn commit(mut self) -> Result<()> {
        self.finish(true)
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finish(false)
    }

    fn finish(&mut self, commit: bool) -> Result<()> {
        self.finished = true;
        let outcome = if commit {
            self.connection.commit()
        } else {
            self.connection.rollback()
        };
        let restored = self.connection.auto_commit(true);
        outcome.and(restored)
    }
}

impl Drop for Transaction<'_, '_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.finish(false) {
            warn!("rolling back unfinished transaction failed: {err}");
        }
    }
}
