//! Diet: macro targets, adherence and a self-tuning calorie deficit.

use serde::{Deserialize, Serialize};

use super::{MentalState, ModuleUpdate, ModuleUpdater};
use crate::domain::Domain;
use crate::error::ValidationError;
use crate::events::ViolationKind;
use crate::num::{clamp_score, round_to};
use crate::validator::{at_most, in_range, positive};

const ACTIVITY_FACTOR: f64 = 1.55;
const DEFICIT_STEP: f64 = 0.05;
const DEFICIT_FLOOR: f64 = 0.10;
const DEFICIT_CEILING: f64 = 0.35;
const BINGE_PENALTY: f64 = 20.0;
const MEALS_PER_DAY: u32 = 4;
const MAX_DAILY_CALORIES: f64 = 20_000.0;
const MAX_DAILY_MACRO_GRAMS: f64 = 2_000.0;

/// Daily energy and macro targets derived from body metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub bmr: f64,
    pub tdee: f64,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroTargets {
    /// Mifflin-St-Jeor BMR, moderate activity TDEE, deficit applied.
    pub fn compute(weight: f64, height: f64, age: f64, deficit_level: f64) -> Self {
        let bmr = 10.0 * weight + 6.25 * height - 5.0 * age + 5.0;
        let tdee = bmr * ACTIVITY_FACTOR;
        let calories = (tdee * (1.0 - deficit_level)).round();
        let protein = (2.2 * weight).round();
        let fat = (0.8 * weight).round();
        let carbs = ((calories - 4.0 * protein - 9.0 * fat) / 4.0).round().max(0.0);
        Self {
            bmr,
            tdee,
            calories,
            protein,
            carbs,
            fat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub meal: u32,
    pub rice_grams: f64,
    pub chicken_grams: f64,
    pub adjustment_margin_calories: f64,
}

/// Macros eaten, either as a submission or as a running total for the guide.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPayload {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub binge: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DietState {
    pub score: f64,
    pub weight: f64,
    pub height: f64,
    pub age: f64,
    pub body_fat_estimate: f64,
    pub deficit_level: f64,
    pub calorie_target: f64,
    pub protein_target: f64,
    pub carb_target: f64,
    pub fat_target: f64,
    pub adherence_score: f64,
    pub control_score: f64,
    pub binge_flag: bool,
    pub weekly_weight_trend: Vec<f64>,
    pub meal_plan: Vec<Meal>,
}

impl Default for DietState {
    fn default() -> Self {
        let mut state = Self {
            score: 0.0,
            weight: 86.0,
            height: 171.0,
            age: 25.0,
            body_fat_estimate: 24.0,
            deficit_level: 0.2,
            calorie_target: 0.0,
            protein_target: 0.0,
            carb_target: 0.0,
            fat_target: 0.0,
            adherence_score: 0.0,
            control_score: 0.0,
            binge_flag: false,
            weekly_weight_trend: Vec::new(),
            meal_plan: Vec::new(),
        };
        state.refresh_targets();
        state
    }
}

/// What is left to eat today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietGuide {
    pub calorie_target: f64,
    pub calories_remaining: f64,
    pub protein_remaining: f64,
    pub carbs_remaining: f64,
    pub fat_remaining: f64,
    pub caloric_impact_score: f64,
}

impl DietState {
    pub fn targets(&self) -> MacroTargets {
        MacroTargets::compute(self.weight, self.height, self.age, self.deficit_level)
    }

    /// Re-derive targets and the meal plan from current body metrics.
    pub fn refresh_targets(&mut self) {
        let t = self.targets();
        self.calorie_target = t.calories;
        self.protein_target = t.protein;
        self.carb_target = t.carbs;
        self.fat_target = t.fat;
        self.meal_plan = self.build_meal_plan();
    }

    fn build_meal_plan(&self) -> Vec<Meal> {
        let meals = f64::from(MEALS_PER_DAY);
        let rice = (self.carb_target / meals * 1.3).round();
        let chicken = (self.protein_target / meals * 1.2).round();
        (1..=MEALS_PER_DAY)
            .map(|meal| Meal {
                meal,
                rice_grams: rice,
                chicken_grams: chicken,
                adjustment_margin_calories: 100.0,
            })
            .collect()
    }

    /// Weighted deviation of `actual` from the current targets.
    pub fn adherence(&self, actual: &Macros) -> f64 {
        clamp_score(
            100.0
                - (actual.calories - self.calorie_target).abs() * 0.08
                - (actual.protein - self.protein_target).abs() * 0.4
                - (actual.carbs - self.carb_target).abs() * 0.2
                - (actual.fat - self.fat_target).abs() * 0.3,
        )
    }

    /// Relax the deficit on fast loss, tighten it on slow loss.
    fn tune_deficit(&mut self) {
        let n = self.weekly_weight_trend.len();
        if n < 2 {
            return;
        }
        let older = self.weekly_weight_trend[n - 2];
        let recent = self.weekly_weight_trend[n - 1];
        if older <= 0.0 {
            return;
        }
        let loss_pct = (older - recent) / older * 100.0;
        if loss_pct > 1.0 {
            self.deficit_level = (self.deficit_level - DEFICIT_STEP).max(DEFICIT_FLOOR);
        } else if loss_pct < 0.3 {
            self.deficit_level = (self.deficit_level + DEFICIT_STEP).min(DEFICIT_CEILING);
        }
        self.deficit_level = round_to(self.deficit_level, 2);
    }

    pub fn guide(&self, consumed: &Macros) -> DietGuide {
        DietGuide {
            calorie_target: self.calorie_target,
            calories_remaining: self.calorie_target - consumed.calories,
            protein_remaining: self.protein_target - consumed.protein,
            carbs_remaining: self.carb_target - consumed.carbs,
            fat_remaining: self.fat_target - consumed.fat,
            caloric_impact_score: clamp_score(
                self.score - (consumed.calories - self.calorie_target).max(0.0) * 0.05,
            ),
        }
    }
}

impl ModuleUpdater for DietState {
    type Payload = DietPayload;
    const DOMAIN: Domain = Domain::Diet;

    fn validate(payload: &DietPayload) -> Result<(), ValidationError> {
        positive("calories", payload.calories)?;
        at_most("calories", payload.calories, MAX_DAILY_CALORIES)?;
        in_range("protein", payload.protein, 0.0, MAX_DAILY_MACRO_GRAMS)?;
        in_range("carbs", payload.carbs, 0.0, MAX_DAILY_MACRO_GRAMS)?;
        in_range("fat", payload.fat, 0.0, MAX_DAILY_MACRO_GRAMS)?;
        if let Some(weight) = payload.weight {
            in_range("weight", weight, 20.0, 400.0)?;
        }
        Ok(())
    }

    fn apply(&self, payload: &DietPayload, _mental: &MentalState) -> ModuleUpdate<Self> {
        let mut next = self.clone();
        let eaten = Macros {
            calories: payload.calories,
            protein: payload.protein,
            carbs: payload.carbs,
            fat: payload.fat,
        };

        next.adherence_score = self.adherence(&eaten);
        let protein_bonus = if payload.protein >= self.protein_target {
            40.0
        } else {
            20.0
        };
        next.control_score = clamp_score(protein_bonus + 0.6 * next.adherence_score);
        next.binge_flag = payload.binge;

        if let Some(weight) = payload.weight {
            next.weight = weight;
            next.weekly_weight_trend.push(weight);
            next.tune_deficit();
        }
        next.refresh_targets();

        let penalty = if payload.binge { BINGE_PENALTY } else { 0.0 };
        next.score =
            clamp_score(0.5 * next.adherence_score + 0.5 * next.control_score - penalty);

        if payload.binge {
            ModuleUpdate::with_violation(next, ViolationKind::Binge, Domain::Diet)
        } else {
            ModuleUpdate::clean(next)
        }
    }

    fn score(&self) -> f64 {
        self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_target(state: &DietState) -> DietPayload {
        DietPayload {
            calories: state.calorie_target,
            protein: state.protein_target,
            carbs: state.carb_target,
            fat: state.fat_target,
            weight: None,
            binge: false,
        }
    }

    #[test]
    fn mifflin_targets_for_default_profile() {
        let t = MacroTargets::compute(86.0, 171.0, 25.0, 0.2);
        assert!((t.bmr - 1808.75).abs() < 1e-9);
        assert!((t.tdee - 2803.5625).abs() < 1e-9);
        assert_eq!(t.calories, 2243.0);
        assert_eq!(t.protein, 189.0);
        assert_eq!(t.fat, 69.0);
        // (2243 - 756 - 621) / 4 = 216.5
        assert_eq!(t.carbs, 217.0);
    }

    #[test]
    fn carb_target_never_negative() {
        let t = MacroTargets::compute(150.0, 150.0, 80.0, 0.35);
        assert!(t.carbs >= 0.0);
    }

    #[test]
    fn default_state_has_targets_and_plan() {
        let state = DietState::default();
        assert_eq!(state.calorie_target, 2243.0);
        assert_eq!(state.meal_plan.len(), 4);
        assert_eq!(state.meal_plan[0].chicken_grams, (189.0f64 / 4.0 * 1.2).round());
    }

    #[test]
    fn perfect_adherence_scores_full() {
        let state = DietState::default();
        let update = state.apply(&on_target(&state), &MentalState::default());
        assert_eq!(update.state.adherence_score, 100.0);
        assert_eq!(update.state.control_score, 100.0);
        assert_eq!(update.state.score, 100.0);
        assert!(update.violation.is_none());
    }

    #[test]
    fn binge_penalizes_and_raises_violation() {
        let state = DietState::default();
        let mut payload = on_target(&state);
        payload.binge = true;
        let update = state.apply(&payload, &MentalState::default());
        assert_eq!(update.state.score, 80.0);
        let violation = update.violation.unwrap();
        assert_eq!(violation.kind, ViolationKind::Binge);
        assert_eq!(violation.domain, Domain::Diet);
    }

    #[test]
    fn fast_loss_relaxes_deficit() {
        let mental = MentalState::default();
        let mut state = DietState::default();
        let mut payload = on_target(&state);
        payload.weight = Some(86.0);
        state = state.apply(&payload, &mental).state;
        payload.weight = Some(84.0);
        state = state.apply(&payload, &mental).state;
        assert_eq!(state.deficit_level, 0.15);
    }

    #[test]
    fn stalled_loss_tightens_deficit_to_ceiling() {
        let mental = MentalState::default();
        let mut state = DietState::default();
        let mut payload = on_target(&state);
        payload.weight = Some(86.0);
        for _ in 0..6 {
            state = state.apply(&payload, &mental).state;
        }
        assert_eq!(state.deficit_level, 0.35);
    }

    #[test]
    fn moderate_loss_keeps_deficit() {
        let mental = MentalState::default();
        let mut state = DietState::default();
        let mut payload = on_target(&state);
        payload.weight = Some(100.0);
        state = state.apply(&payload, &mental).state;
        payload.weight = Some(99.5);
        state = state.apply(&payload, &mental).state;
        assert_eq!(state.deficit_level, 0.2);
    }

    #[test]
    fn guide_reports_remaining_macros() {
        let state = DietState::default();
        let guide = state.guide(&Macros {
            calories: 1000.0,
            protein: 100.0,
            carbs: 50.0,
            fat: 20.0,
        });
        assert_eq!(guide.calories_remaining, 1243.0);
        assert_eq!(guide.protein_remaining, 89.0);
        assert_eq!(guide.carbs_remaining, 167.0);
        assert_eq!(guide.fat_remaining, 49.0);
    }

    #[test]
    fn validation_rejects_negative_macros() {
        let mut payload = on_target(&DietState::default());
        payload.fat = -1.0;
        assert!(DietState::validate(&payload).is_err());
    }
}
