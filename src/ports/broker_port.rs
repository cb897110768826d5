//! Broker-flow access port trait.

use crate::domain::broker::BrokerSnapshot;
use crate::domain::error::IdxQuantError;
use chrono::NaiveDate;

pub trait BrokerFlowPort {
    /// Snapshot for `ticker` on `date`, or the latest available one when
    /// `date` is `None`. `Ok(None)` means no data; callers substitute
    /// [`BrokerSnapshot::neutral`].
    fn snapshot(
        &self,
        ticker: &str,
        date: Option<NaiveDate>,
    ) -> Result<Option<BrokerSnapshot>, IdxQuantError>;
}
