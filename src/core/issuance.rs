//! Account and card number issuance
//!
//! Both generators are seeded from the ledger, so numbering survives restarts
//! without a separate counter file.

use crate::types::{Account, AccountId, BankError, CardId, CardTier};

/// Next sequential account ID
///
/// The first account gets `base + 1`.
pub fn next_account_id(last: Option<AccountId>, base: AccountId) -> Result<AccountId, BankError> {
    let last = last.map_or(base, |id| id.max(base));
    last.checked_add(1)
        .ok_or_else(|| BankError::invalid_argument("account ID range exhausted"))
}

/// Next card number of a tier
///
/// Card numbers run sequentially inside each tier's range: one past the
/// highest issued card of the tier, or the first number after the prefix.
pub fn next_card_id(tier: CardTier, accounts: &[Account]) -> Result<CardId, BankError> {
    let last = accounts
        .iter()
        .map(|a| a.card_id)
        .filter(|id| tier.issued(*id))
        .max()
        .unwrap_or(tier.card_prefix());

    let next = last + 1;
    if !tier.issued(next) {
        return Err(BankError::invalid_argument(format!(
            "{} card number range exhausted",
            tier
        )));
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountKind;
    use rstest::rstest;

    #[rstest]
    #[case::empty_ledger(None, 100001)]
    #[case::continues(Some(100007), 100008)]
    #[case::below_base(Some(42), 100001)]
    fn test_next_account_id(#[case] last: Option<AccountId>, #[case] expected: AccountId) {
        assert_eq!(next_account_id(last, 100000).unwrap(), expected);
    }

    #[test]
    fn test_card_numbers_are_per_tier() {
        let accounts = vec![
            Account::new(100001, 1, AccountKind::Checking, 510000001, CardTier::Standard),
            Account::new(100002, 1, AccountKind::Savings, 510000002, CardTier::Standard),
            Account::new(100003, 2, AccountKind::Checking, 550000001, CardTier::Platinum),
        ];

        assert_eq!(next_card_id(CardTier::Standard, &accounts).unwrap(), 510000003);
        assert_eq!(next_card_id(CardTier::Titanium, &accounts).unwrap(), 530000001);
        assert_eq!(next_card_id(CardTier::Platinum, &accounts).unwrap(), 550000002);
    }

    #[test]
    fn test_card_range_exhaustion() {
        let accounts = vec![Account::new(
            100001,
            1,
            AccountKind::Checking,
            519_999_999,
            CardTier::Standard,
        )];
        assert!(next_card_id(CardTier::Standard, &accounts).is_err());
    }
}
