//! Address balance computed from history rows.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::response::HistoryEntry;

/// Sum of the unspent outputs of an address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    /// Unspent value in confirmed outputs.
    #[serde(with = "crate::satoshis")]
    pub confirmed: BigUint,
    /// Unspent value in all outputs, confirmed or not.
    #[serde(with = "crate::satoshis")]
    pub unconfirmed: BigUint,
}

impl Balance {
    /// Sum the unspent outputs in `history`.
    ///
    /// Spent outputs count toward neither total, even when the spend is
    /// itself unconfirmed.
    pub fn from_history<'a, I>(history: I) -> Self
    where
        I: IntoIterator<Item = &'a HistoryEntry>,
    {
        let mut balance = Balance { confirmed: BigUint::zero(), unconfirmed: BigUint::zero() };
        for row in history.into_iter().filter(|row| row.is_unspent()) {
            balance.unconfirmed += &row.value;
            if row.output.height.is_some() {
                balance.confirmed += &row.value;
            }
        }
        balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::HistoryPoint;
    use obelisk_primitives::Hash256;

    fn row(value: u64, height: Option<u32>, spent: bool) -> HistoryEntry {
        let point = HistoryPoint { hash: Hash256::default(), index: 0, height };
        HistoryEntry {
            output: point,
            value: BigUint::from(value),
            spend: spent.then_some(point),
        }
    }

    #[test]
    fn test_empty_history() {
        let balance = Balance::from_history(&Vec::<HistoryEntry>::new());
        assert!(balance.confirmed.is_zero());
        assert!(balance.unconfirmed.is_zero());
    }

    #[test]
    fn test_sums_unspent_only() {
        let history = vec![
            row(100, Some(10), false),
            row(50, None, false),
            row(1_000, Some(11), true),
        ];
        let balance = Balance::from_history(&history);
        assert_eq!(balance.confirmed, BigUint::from(100u32));
        assert_eq!(balance.unconfirmed, BigUint::from(150u32));
    }

    #[test]
    fn test_no_overflow() {
        let history = vec![row(u64::MAX, Some(1), false), row(u64::MAX, Some(2), false)];
        let balance = Balance::from_history(&history);
        assert_eq!(balance.confirmed, BigUint::from(u64::MAX) * 2u32);
    }

    #[test]
    fn test_json_amounts_are_decimal_strings() {
        let history = vec![row(5_000_000_000, Some(1), false), row(1, None, false)];
        let balance = Balance::from_history(&history);
        let json = serde_json::to_string(&balance).unwrap();
        assert_eq!(json, r#"{"confirmed":"5000000000","unconfirmed":"5000000001"}"#);
        let back: Balance = serde_json::from_str(&json).unwrap();
        assert_eq!(back, balance);
    }

    #[test]
    fn test_json_rejects_bad_amount() {
        for confirmed in [r#""-1""#, r#""""#, r#""1e3""#, "[1]", "1"] {
            let json = format!(r#"{{"confirmed":{},"unconfirmed":"0"}}"#, confirmed);
            assert!(serde_json::from_str::<Balance>(&json).is_err(), "{}", json);
        }
    }
}
