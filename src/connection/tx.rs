use crate::error::{DbApiError, ErrorKind, Phase, translate};

use super::core::{ConnectionInner, TxnState};

impl ConnectionInner {
    /// Open the implicit transaction if none is open. A failure leaves the state at `NoTxn`.
    pub(crate) fn begin_if_needed(&mut self) -> Result<(), DbApiError> {
        if self.options.autocommit || self.txn == TxnState::TxnOpen {
            return Ok(());
        }
        self.handle_mut()?
            .execute("begin", &[])
            .map_err(|e| translate(e, Phase::Begin))?;
        tracing::debug!(database = %self.options.database, "transaction opened");
        self.txn = TxnState::TxnOpen;
        Ok(())
    }

    /// Commit the open transaction and publish its row count to the active cursor.
    ///
    /// Integrity failures reset the rowcount to 0, since nothing was applied. Other commit
    /// failures and effect-retrieval failures leave it at -1.
    pub(crate) fn commit(&mut self) -> Result<(), DbApiError> {
        self.ensure_open()?;
        if self.options.autocommit || self.txn == TxnState::NoTxn {
            return Ok(());
        }
        self.detach_active_stream();
        let handle = self.handle_mut()?;
        let committed = handle.execute("commit", &[]);
        self.txn = TxnState::NoTxn;
        if let Err(e) = committed {
            let err = translate(e, Phase::Commit);
            let rowcount = if err.kind() == ErrorKind::Integrity { 0 } else { -1 };
            self.set_active_rowcount(rowcount);
            return Err(err);
        }
        let effects = self.handle_mut()?.get_effects();
        match effects {
            Ok(effects) => {
                tracing::debug!(
                    database = %self.options.database,
                    affected = effects.num_affected,
                    "transaction committed"
                );
                self.set_active_rowcount(effects.num_affected);
                Ok(())
            }
            Err(e) => {
                self.set_active_rowcount(-1);
                Err(translate(e, Phase::Effects))
            }
        }
    }

    /// Discard the open transaction. Errors the handle deferred until now surface here.
    pub(crate) fn rollback(&mut self) -> Result<(), DbApiError> {
        self.ensure_open()?;
        if self.options.autocommit || self.txn == TxnState::NoTxn {
            return Ok(());
        }
        self.detach_active_stream();
        let rolled_back = self.handle_mut()?.execute("rollback", &[]);
        self.txn = TxnState::NoTxn;
        rolled_back.map_err(|e| translate(e, Phase::Rollback))?;
        tracing::debug!(database = %self.options.database, "transaction rolled back");
        Ok(())
    }
}
