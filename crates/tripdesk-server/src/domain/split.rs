//! Per-traveler allocation of an activity's client total.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::money::BPS_SCALE;

/// Cost split errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("Cannot split a negative amount ({0})")]
    NegativeTotal(i64),

    #[error("No travelers to split between")]
    NoTravelers,

    #[error("Traveler {0} appears more than once in the split")]
    DuplicateTraveler(i64),

    #[error("Traveler {0} is not on this trip")]
    UnknownTraveler(i64),

    #[error("Traveler {0} has a negative allocation")]
    NegativeAllocation(i64),

    #[error("Allocations sum to {actual} but the activity total is {expected}")]
    AmountMismatch { expected: i64, actual: i64 },

    #[error("Shares sum to {0} basis points, expected 10000")]
    SharesMismatch(i64),

    #[error("Allocation for traveler {0} is too large")]
    AmountTooLarge(i64),
}

/// Fixed amount for one traveler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountAllocation {
    pub traveler_id: i64,
    pub amount_cents: i64,
}

/// Proportional share for one traveler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareAllocation {
    pub traveler_id: i64,
    pub share_bps: i32,
}

/// How an activity's cost is divided between travelers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SplitRule {
    /// Equal parts; an empty list means every traveler on the trip.
    Equal {
        #[serde(default)]
        traveler_ids: Vec<i64>,
    },
    Amounts { allocations: Vec<AmountAllocation> },
    Shares { allocations: Vec<ShareAllocation> },
}

impl Default for SplitRule {
    fn default() -> Self {
        SplitRule::Equal {
            traveler_ids: Vec::new(),
        }
    }
}

impl SplitRule {
    /// Traveler ids named explicitly by the rule.
    pub fn traveler_ids(&self) -> Vec<i64> {
        match self {
            SplitRule::Equal { traveler_ids } => traveler_ids.clone(),
            SplitRule::Amounts { allocations } => {
                allocations.iter().map(|a| a.traveler_id).collect()
            }
            SplitRule::Shares { allocations } => {
                allocations.iter().map(|a| a.traveler_id).collect()
            }
        }
    }

    pub fn mentions(&self, traveler_id: i64) -> bool {
        self.traveler_ids().contains(&traveler_id)
    }
}

/// One traveler's part of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelerShare {
    pub traveler_id: i64,
    pub amount_cents: i64,
}

/// Divide `total_cents` according to `rule`.
///
/// `trip_travelers` is the trip's traveler list in display order; every id
/// named by the rule must be on it. The returned shares always sum to
/// `total_cents`.
pub fn distribute(
    total_cents: i64,
    rule: &SplitRule,
    trip_travelers: &[i64],
) -> Result<Vec<TravelerShare>, SplitError> {
    if total_cents < 0 {
        return Err(SplitError::NegativeTotal(total_cents));
    }

    let named = rule.traveler_ids();
    check_travelers(&named, trip_travelers)?;

    match rule {
        SplitRule::Equal { traveler_ids } => {
            let ids = if traveler_ids.is_empty() {
                trip_travelers
            } else {
                traveler_ids.as_slice()
            };
            split_equal(total_cents, ids)
        }
        SplitRule::Amounts { allocations } => split_amounts(total_cents, allocations),
        SplitRule::Shares { allocations } => split_shares(total_cents, allocations),
    }
}

fn check_travelers(named: &[i64], trip_travelers: &[i64]) -> Result<(), SplitError> {
    let on_trip: HashSet<i64> = trip_travelers.iter().copied().collect();
    let mut seen = HashSet::with_capacity(named.len());
    for &id in named {
        if !seen.insert(id) {
            return Err(SplitError::DuplicateTraveler(id));
        }
        if !on_trip.contains(&id) {
            return Err(SplitError::UnknownTraveler(id));
        }
    }
    Ok(())
}

fn split_equal(total_cents: i64, ids: &[i64]) -> Result<Vec<TravelerShare>, SplitError> {
    if ids.is_empty() {
        return Err(SplitError::NoTravelers);
    }

    let n = ids.len() as i64;
    let base = total_cents / n;
    let extra = (total_cents % n) as usize;

    Ok(ids
        .iter()
        .enumerate()
        .map(|(i, &traveler_id)| TravelerShare {
            traveler_id,
            amount_cents: base + i64::from(i < extra),
        })
        .collect())
}

fn split_amounts(
    total_cents: i64,
    allocations: &[AmountAllocation],
) -> Result<Vec<TravelerShare>, SplitError> {
    if allocations.is_empty() {
        return Err(SplitError::NoTravelers);
    }

    let mut sum = 0i64;
    for a in allocations {
        if a.amount_cents < 0 {
            return Err(SplitError::NegativeAllocation(a.traveler_id));
        }
        sum = sum
            .checked_add(a.amount_cents)
            .ok_or(SplitError::AmountTooLarge(a.traveler_id))?;
    }
    if sum != total_cents {
        return Err(SplitError::AmountMismatch {
            expected: total_cents,
            actual: sum,
        });
    }

    Ok(allocations
        .iter()
        .map(|a| TravelerShare {
            traveler_id: a.traveler_id,
            amount_cents: a.amount_cents,
        })
        .collect())
}

fn split_shares(
    total_cents: i64,
    allocations: &[ShareAllocation],
) -> Result<Vec<TravelerShare>, SplitError> {
    if allocations.is_empty() {
        return Err(SplitError::NoTravelers);
    }

    let mut bps_sum = 0i64;
    for a in allocations {
        if a.share_bps < 0 {
            return Err(SplitError::NegativeAllocation(a.traveler_id));
        }
        bps_sum += i64::from(a.share_bps);
    }
    if bps_sum != BPS_SCALE {
        return Err(SplitError::SharesMismatch(bps_sum));
    }

    let scale = i128::from(BPS_SCALE);
    let mut shares = Vec::with_capacity(allocations.len());
    let mut remainders = Vec::with_capacity(allocations.len());
    let mut assigned = 0i64;

    for (i, a) in allocations.iter().enumerate() {
        let exact = i128::from(total_cents) * i128::from(a.share_bps);
        let floor = (exact / scale) as i64;
        assigned += floor;
        shares.push(TravelerShare {
            traveler_id: a.traveler_id,
            amount_cents: floor,
        });
        remainders.push((exact % scale, i));
    }

    // Largest remainder first; sort is stable so ties keep list order.
    remainders.sort_by(|a, b| b.0.cmp(&a.0));
    let leftover = (total_cents - assigned) as usize;
    for &(_, i) in remainders.iter().take(leftover) {
        shares[i].amount_cents += 1;
    }

    Ok(shares)
}

/// Sum shares per traveler across many activities.
pub fn per_traveler_totals<'a>(
    allocations: impl IntoIterator<Item = &'a [TravelerShare]>,
) -> BTreeMap<i64, i64> {
    let mut totals = BTreeMap::new();
    for shares in allocations {
        for share in shares {
            let total = totals.entry(share.traveler_id).or_insert(0i64);
            *total = total.saturating_add(share.amount_cents);
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(shares: &[TravelerShare]) -> i64 {
        shares.iter().map(|s| s.amount_cents).sum()
    }

    #[test]
    fn test_equal_split_spreads_remainder_to_first_travelers() {
        let shares = distribute(10_000, &SplitRule::default(), &[7, 8, 9]).unwrap();
        let amounts: Vec<i64> = shares.iter().map(|s| s.amount_cents).collect();
        assert_eq!(amounts, vec![3_334, 3_333, 3_333]);
        assert_eq!(sum(&shares), 10_000);
        assert_eq!(shares[0].traveler_id, 7);
    }

    #[test]
    fn test_equal_split_subset() {
        let rule = SplitRule::Equal {
            traveler_ids: vec![9, 7],
        };
        let shares = distribute(101, &rule, &[7, 8, 9]).unwrap();
        assert_eq!(
            shares,
            vec![
                TravelerShare { traveler_id: 9, amount_cents: 51 },
                TravelerShare { traveler_id: 7, amount_cents: 50 },
            ]
        );
    }

    #[test]
    fn test_equal_split_without_travelers() {
        assert_eq!(
            distribute(500, &SplitRule::default(), &[]),
            Err(SplitError::NoTravelers)
        );
    }

    #[test]
    fn test_amounts_must_match_total() {
        let rule = SplitRule::Amounts {
            allocations: vec![
                AmountAllocation { traveler_id: 1, amount_cents: 700 },
                AmountAllocation { traveler_id: 2, amount_cents: 200 },
            ],
        };
        assert_eq!(
            distribute(1_000, &rule, &[1, 2]),
            Err(SplitError::AmountMismatch { expected: 1_000, actual: 900 })
        );
        let shares = distribute(900, &rule, &[1, 2]).unwrap();
        assert_eq!(sum(&shares), 900);
    }

    #[test]
    fn test_shares_use_largest_remainder() {
        let rule = SplitRule::Shares {
            allocations: vec![
                ShareAllocation { traveler_id: 1, share_bps: 3_333 },
                ShareAllocation { traveler_id: 2, share_bps: 3_333 },
                ShareAllocation { traveler_id: 3, share_bps: 3_334 },
            ],
        };
        let shares = distribute(100, &rule, &[1, 2, 3]).unwrap();
        // floors are 33, 33, 33; traveler 3 has the largest remainder
        let amounts: Vec<i64> = shares.iter().map(|s| s.amount_cents).collect();
        assert_eq!(amounts, vec![33, 33, 34]);
    }

    #[test]
    fn test_shares_tie_breaks_by_order() {
        let rule = SplitRule::Shares {
            allocations: vec![
                ShareAllocation { traveler_id: 1, share_bps: 5_000 },
                ShareAllocation { traveler_id: 2, share_bps: 5_000 },
            ],
        };
        let shares = distribute(101, &rule, &[1, 2]).unwrap();
        assert_eq!(shares[0].amount_cents, 51);
        assert_eq!(shares[1].amount_cents, 50);
    }

    #[test]
    fn test_shares_must_sum_to_whole() {
        let rule = SplitRule::Shares {
            allocations: vec![ShareAllocation { traveler_id: 1, share_bps: 9_000 }],
        };
        assert_eq!(
            distribute(100, &rule, &[1]),
            Err(SplitError::SharesMismatch(9_000))
        );
    }

    #[test]
    fn test_rejects_unknown_and_duplicate_travelers() {
        let rule = SplitRule::Equal {
            traveler_ids: vec![1, 4],
        };
        assert_eq!(distribute(100, &rule, &[1, 2]), Err(SplitError::UnknownTraveler(4)));

        let rule = SplitRule::Equal {
            traveler_ids: vec![1, 1],
        };
        assert_eq!(distribute(100, &rule, &[1, 2]), Err(SplitError::DuplicateTraveler(1)));
    }

    /// Uneven shares for `n` travelers: weights 1, 2, 3, ..., last one takes the slack.
    fn uneven_shares(n: i64, skew: i64) -> Vec<ShareAllocation> {
        let weights: Vec<i64> = (1..=n).map(|i| i * i + skew).collect();
        let weight_sum: i64 = weights.iter().sum();
        let mut allocations: Vec<ShareAllocation> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| ShareAllocation {
                traveler_id: i as i64 + 1,
                share_bps: (BPS_SCALE * w / weight_sum) as i32,
            })
            .collect();
        let assigned: i32 = allocations.iter().map(|a| a.share_bps).sum();
        if let Some(last) = allocations.last_mut() {
            last.share_bps += BPS_SCALE as i32 - assigned;
        }
        allocations
    }

    #[test]
    fn test_every_split_sums_to_total() {
        let totals = (0..=1_000).chain([9_999, 123_457, 10_000_000_001, 1_300_000_000_000_007]);
        for total in totals {
            for n in 1..=7i64 {
                let travelers: Vec<i64> = (1..=n).collect();

                let equal = distribute(total, &SplitRule::default(), &travelers).unwrap();
                assert_eq!(sum(&equal), total, "equal split of {} over {}", total, n);
                let spread = equal.iter().map(|s| s.amount_cents).max().unwrap()
                    - equal.iter().map(|s| s.amount_cents).min().unwrap();
                assert!(spread <= 1);

                for skew in [0, 3, 40] {
                    let rule = SplitRule::Shares {
                        allocations: uneven_shares(n, skew),
                    };
                    let shares = distribute(total, &rule, &travelers).unwrap();
                    assert_eq!(sum(&shares), total, "shares of {} over {} (skew {})", total, n, skew);
                    assert!(shares.iter().all(|s| s.amount_cents >= 0));
                    for (share, alloc) in shares.iter().zip(uneven_shares(n, skew)) {
                        let exact = i128::from(total) * i128::from(alloc.share_bps);
                        let floor = (exact / i128::from(BPS_SCALE)) as i64;
                        assert!(share.amount_cents == floor || share.amount_cents == floor + 1);
                    }
                }
            }
        }
    }

    #[test]
    fn test_amount_allocations_cannot_overflow() {
        let rule = SplitRule::Amounts {
            allocations: vec![
                AmountAllocation { traveler_id: 1, amount_cents: i64::MAX },
                AmountAllocation { traveler_id: 2, amount_cents: 1 },
            ],
        };
        assert_eq!(
            distribute(i64::MAX, &rule, &[1, 2]),
            Err(SplitError::AmountTooLarge(2))
        );
    }

    #[test]
    fn test_negative_total() {
        assert_eq!(
            distribute(-1, &SplitRule::default(), &[1]),
            Err(SplitError::NegativeTotal(-1))
        );
    }

    #[test]
    fn test_rule_json_shape() {
        let rule: SplitRule = serde_json::from_value(serde_json::json!({
            "mode": "shares",
            "allocations": [{"traveler_id": 3, "share_bps": 10000}]
        }))
        .unwrap();
        assert!(rule.mentions(3));

        let rule: SplitRule = serde_json::from_value(serde_json::json!({"mode": "equal"})).unwrap();
        assert_eq!(rule, SplitRule::default());
    }

    #[test]
    fn test_per_traveler_totals() {
        let dinner = distribute(9_000, &SplitRule::default(), &[1, 2, 3]).unwrap();
        let flight = distribute(
            50_000,
            &SplitRule::Equal {
                traveler_ids: vec![1],
            },
            &[1, 2, 3],
        )
        .unwrap();

        let totals = per_traveler_totals([dinner.as_slice(), flight.as_slice()]);
        assert_eq!(totals[&1], 53_000);
        assert_eq!(totals[&2], 3_000);
        assert_eq!(totals[&3], 3_000);
    }
}
