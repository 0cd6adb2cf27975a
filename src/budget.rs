// 💰 Financial Snapshot - Income vs. expenses vs. savings goals
// Numbers only; turning them into advice is an external collaborator's job

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub const DEFAULT_DISCRETIONARY_PERCENTAGE: f64 = 0.2;

#[derive(Debug, Error, PartialEq)]
pub enum BudgetError {
    #[error("Monthly income must be positive, got {0}")]
    NonPositiveIncome(f64),

    #[error("Discretionary percentage must be within [0, 1], got {0}")]
    PercentageOutOfRange(f64),
}

/// Monthly figures supplied by the user
#[derive(Debug, Clone, Deserialize)]
pub struct FinancialInput {
    pub income: f64,
    pub expenses: BTreeMap<String, f64>,
    pub savings_goals: BTreeMap<String, f64>,
    #[serde(default)]
    pub discretionary_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProjection {
    pub goal: String,
    pub target: f64,
    /// `None` when there is no monthly surplus to save from
    pub months_to_goal: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSnapshot {
    pub income: f64,
    pub fixed_expenses: f64,
    pub discretionary_expenses: f64,
    pub monthly_surplus: f64,
    pub goals: Vec<GoalProjection>,
}

impl FinancialSnapshot {
    pub fn compute(input: &FinancialInput) -> Result<Self, BudgetError> {
        if !(input.income > 0.0) {
            return Err(BudgetError::NonPositiveIncome(input.income));
        }

        let percentage = input
            .discretionary_percentage
            .unwrap_or(DEFAULT_DISCRETIONARY_PERCENTAGE);
        if !(0.0..=1.0).contains(&percentage) {
            return Err(BudgetError::PercentageOutOfRange(percentage));
        }

        let fixed_expenses: f64 = input.expenses.values().sum();
        let discretionary_expenses = fixed_expenses * percentage;
        let monthly_surplus = input.income - fixed_expenses - discretionary_expenses;

        let goals = input
            .savings_goals
            .iter()
            .map(|(goal, &target)| GoalProjection {
                goal: goal.clone(),
                target,
                months_to_goal: months_to_goal(target, monthly_surplus),
            })
            .collect();

        Ok(FinancialSnapshot {
            income: input.income,
            fixed_expenses,
            discretionary_expenses,
            monthly_surplus,
            goals,
        })
    }

    pub fn savings_rate(&self) -> f64 {
        self.monthly_surplus / self.income
    }
}

fn months_to_goal(target: f64, surplus: f64) -> Option<u32> {
    if surplus <= 0.0 {
        return None;
    }
    if target <= 0.0 {
        return Some(0);
    }
    Some((target / surplus).ceil() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(income: f64, pct: Option<f64>) -> FinancialInput {
        FinancialInput {
            income,
            expenses: BTreeMap::from([("rent".to_string(), 1000.0), ("food".to_string(), 500.0)]),
            savings_goals: BTreeMap::from([("laptop".to_string(), 1200.0)]),
            discretionary_percentage: pct,
        }
    }

    #[test]
    fn test_snapshot_default_percentage() {
        let snapshot = FinancialSnapshot::compute(&input(3000.0, None)).unwrap();

        assert_eq!(snapshot.fixed_expenses, 1500.0);
        assert_eq!(snapshot.discretionary_expenses, 300.0);
        assert_eq!(snapshot.monthly_surplus, 1200.0);
        assert_eq!(snapshot.goals[0].months_to_goal, Some(1));
        assert_eq!(snapshot.savings_rate(), 0.4);
    }

    #[test]
    fn test_goal_unreachable_without_surplus() {
        let snapshot = FinancialSnapshot::compute(&input(1500.0, Some(0.5))).unwrap();

        assert!(snapshot.monthly_surplus < 0.0);
        assert_eq!(snapshot.goals[0].months_to_goal, None);
    }

    #[test]
    fn test_partial_months_round_up() {
        let snapshot = FinancialSnapshot::compute(&input(2000.0, Some(0.0))).unwrap();

        assert_eq!(snapshot.monthly_surplus, 500.0);
        assert_eq!(snapshot.goals[0].months_to_goal, Some(3));
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            FinancialSnapshot::compute(&input(0.0, None)),
            Err(BudgetError::NonPositiveIncome(0.0))
        );
        assert_eq!(
            FinancialSnapshot::compute(&input(100.0, Some(1.5))),
            Err(BudgetError::PercentageOutOfRange(1.5))
        );
    }
}
