//! The closed set of remote commands.

use std::fmt;

/// Wire name of the unsolicited address-activity push.
///
/// Frames with this name never answer a request; their body goes to the
/// address listeners instead of the pending-request table.
pub const ADDRESS_UPDATE: &str = "address.update";

/// A remote command understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Height of the chain tip.
    FetchLastHeight,
    /// Height of a block given its hash.
    FetchBlockHeight,
    /// 80-byte header of a block.
    FetchBlockHeader,
    /// Transaction hashes of a block.
    FetchBlockTransactionHashes,
    /// A confirmed transaction.
    FetchTransaction,
    /// An unconfirmed transaction from the memory pool.
    FetchPoolTransaction,
    /// Block height and position of a transaction.
    FetchTransactionIndex,
    /// The input spending an output.
    FetchSpend,
    /// Stealth scan by bitfield prefix.
    FetchStealth,
    /// Confirmed history of an address.
    FetchHistory,
    /// History of an address including unconfirmed transactions.
    FetchAddressHistory,
    /// Start watching an address.
    SubscribeAddress,
    /// Extend an address subscription.
    RenewAddress,
}

impl CommandKind {
    /// Every command, in table order.
    pub const ALL: [CommandKind; 13] = [
        CommandKind::FetchLastHeight,
        CommandKind::FetchBlockHeight,
        CommandKind::FetchBlockHeader,
        CommandKind::FetchBlockTransactionHashes,
        CommandKind::FetchTransaction,
        CommandKind::FetchPoolTransaction,
        CommandKind::FetchTransactionIndex,
        CommandKind::FetchSpend,
        CommandKind::FetchStealth,
        CommandKind::FetchHistory,
        CommandKind::FetchAddressHistory,
        CommandKind::SubscribeAddress,
        CommandKind::RenewAddress,
    ];

    /// The name sent as the first frame part.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::FetchLastHeight => "blockchain.fetch_last_height",
            CommandKind::FetchBlockHeight => "blockchain.fetch_block_height",
            CommandKind::FetchBlockHeader => "blockchain.fetch_block_header",
            CommandKind::FetchBlockTransactionHashes => "blockchain.fetch_block_transaction_hashes",
            CommandKind::FetchTransaction => "blockchain.fetch_transaction",
            CommandKind::FetchPoolTransaction => "transaction_pool.fetch_transaction",
            CommandKind::FetchTransactionIndex => "blockchain.fetch_transaction_index",
            CommandKind::FetchSpend => "blockchain.fetch_spend",
            CommandKind::FetchStealth => "blockchain.fetch_stealth",
            CommandKind::FetchHistory => "blockchain.fetch_history",
            CommandKind::FetchAddressHistory => "address.fetch_history",
            CommandKind::SubscribeAddress => "address.subscribe",
            CommandKind::RenewAddress => "address.renew",
        }
    }

    /// Look a command up by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(CommandKind::from_name("blockchain.fetch_nothing"), None);
        assert_eq!(CommandKind::from_name(ADDRESS_UPDATE), None);
        assert_eq!(CommandKind::from_name(""), None);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = CommandKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CommandKind::ALL.len());
    }
}
