//! Personal finance: savings rate, net worth and fixed-multiplier projections.
//!
//! The 1/3/5-year multipliers are an illustrative compounding proxy, not an
//! annuity model.

use serde::{Deserialize, Serialize};

use super::{MentalState, ModuleUpdate, ModuleUpdater};
use crate::domain::Domain;
use crate::error::ValidationError;
use crate::events::ViolationKind;
use crate::num::clamp_score;
use crate::validator::in_range;

const GAMBLING_PENALTY: f64 = 30.0;
const CLEAN_BONUS: f64 = 20.0;
/// Upper bound on any single amount; keeps projections finite.
pub const MAX_AMOUNT: f64 = 1e12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancePayload {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    #[serde(default)]
    pub savings: Option<f64>,
    #[serde(default)]
    pub investment_value: Option<f64>,
    #[serde(default)]
    pub gambling: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceState {
    pub score: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings_rate: f64,
    pub savings: f64,
    pub investment_value: f64,
    pub net_worth: f64,
    pub discipline_score: f64,
    pub gambling_flag: bool,
    pub projection_1y: f64,
    pub projection_3y: f64,
    pub projection_5y: f64,
    /// Net worth after each submission.
    pub growth_trend: Vec<f64>,
}

impl Default for FinanceState {
    fn default() -> Self {
        Self {
            score: 0.0,
            monthly_income: 0.0,
            monthly_expenses: 0.0,
            savings_rate: 0.0,
            savings: 0.0,
            investment_value: 0.0,
            net_worth: 0.0,
            discipline_score: 50.0,
            gambling_flag: false,
            projection_1y: 0.0,
            projection_3y: 0.0,
            projection_5y: 0.0,
            growth_trend: Vec::new(),
        }
    }
}

pub fn savings_rate(income: f64, expenses: f64) -> f64 {
    if income > 0.0 {
        (income - expenses) / income
    } else {
        0.0
    }
}

impl ModuleUpdater for FinanceState {
    type Payload = FinancePayload;
    const DOMAIN: Domain = Domain::Finance;

    fn validate(payload: &FinancePayload) -> Result<(), ValidationError> {
        in_range("monthly_income", payload.monthly_income, 0.0, MAX_AMOUNT)?;
        in_range("monthly_expenses", payload.monthly_expenses, 0.0, MAX_AMOUNT)?;
        if let Some(savings) = payload.savings {
            in_range("savings", savings, 0.0, MAX_AMOUNT)?;
        }
        if let Some(investments) = payload.investment_value {
            in_range("investment_value", investments, 0.0, MAX_AMOUNT)?;
        }
        Ok(())
    }

    fn apply(&self, payload: &FinancePayload, _mental: &MentalState) -> ModuleUpdate<Self> {
        let mut next = self.clone();
        next.monthly_income = payload.monthly_income;
        next.monthly_expenses = payload.monthly_expenses;
        next.savings = payload.savings.unwrap_or(self.savings);
        next.investment_value = payload.investment_value.unwrap_or(self.investment_value);
        next.gambling_flag = payload.gambling;

        next.savings_rate = savings_rate(next.monthly_income, next.monthly_expenses);
        next.net_worth = next.savings + next.investment_value;
        next.projection_1y = next.net_worth * 1.08;
        next.projection_3y = next.net_worth * 1.25;
        next.projection_5y = next.net_worth * 1.6;
        next.growth_trend.push(next.net_worth);

        let conduct = if payload.gambling {
            -GAMBLING_PENALTY
        } else {
            CLEAN_BONUS
        };
        let asset_bonus = if next.net_worth > 0.0 { 20.0 } else { 0.0 };
        next.discipline_score = clamp_score(next.savings_rate * 100.0 + conduct);
        next.score = clamp_score(next.savings_rate * 60.0 + asset_bonus + conduct);

        if payload.gambling {
            ModuleUpdate::with_violation(next, ViolationKind::Gambling, Domain::Finance)
        } else {
            ModuleUpdate::clean(next)
        }
    }

    fn score(&self) -> f64 {
        self.score
    }
}
