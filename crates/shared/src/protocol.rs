use serde::{Deserialize, Serialize};

use crate::domain::{Difficulty, SessionId};

/// One progressive taxation step: everything earned above `threshold`
/// is taxed at `rate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub threshold: f64,
    pub rate: f64,
}

/// The full player-controlled configuration, submitted verbatim with
/// every turn. The server echoes back the set it actually applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySet {
    pub tax_enabled: bool,
    pub tax_brackets: Vec<TaxBracket>,
    pub ubi_enabled: bool,
    pub income_enabled: bool,
    pub base_income: f64,
    pub education_enabled: bool,
    pub education_rate: f64,
}

impl Default for PolicySet {
    fn default() -> Self {
        Self {
            tax_enabled: false,
            tax_brackets: vec![
                TaxBracket {
                    threshold: 0.0,
                    rate: 0.0,
                },
                TaxBracket {
                    threshold: 10.0,
                    rate: 0.1,
                },
                TaxBracket {
                    threshold: 30.0,
                    rate: 0.2,
                },
                TaxBracket {
                    threshold: 50.0,
                    rate: 0.3,
                },
            ],
            ubi_enabled: false,
            income_enabled: true,
            base_income: 1.0,
            education_enabled: false,
            education_rate: 0.1,
        }
    }
}

/// Field-level patch over [`PolicySet`]; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyPatch {
    pub tax_enabled: Option<bool>,
    pub tax_brackets: Option<Vec<TaxBracket>>,
    pub ubi_enabled: Option<bool>,
    pub income_enabled: Option<bool>,
    pub base_income: Option<f64>,
    pub education_enabled: Option<bool>,
    pub education_rate: Option<f64>,
}

impl PolicyPatch {
    /// Shallow merge into `base`: each `Some` field overwrites, the
    /// rest carry over unchanged.
    pub fn apply_to(&self, base: &PolicySet) -> PolicySet {
        PolicySet {
            tax_enabled: self.tax_enabled.unwrap_or(base.tax_enabled),
            tax_brackets: self
                .tax_brackets
                .clone()
                .unwrap_or_else(|| base.tax_brackets.clone()),
            ubi_enabled: self.ubi_enabled.unwrap_or(base.ubi_enabled),
            income_enabled: self.income_enabled.unwrap_or(base.income_enabled),
            base_income: self.base_income.unwrap_or(base.base_income),
            education_enabled: self.education_enabled.unwrap_or(base.education_enabled),
            education_rate: self.education_rate.unwrap_or(base.education_rate),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventCategory {
    #[serde(rename = "disaster")]
    Disaster,
    #[serde(rename = "economic")]
    Economic,
    #[serde(rename = "population")]
    Population,
    /// Categories this client does not know about render generically.
    #[serde(other)]
    Other,
}

/// One narrative event produced by a simulation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: EventCategory,
}

/// Aggregate metrics for the current turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub gini: f64,
    pub mean_wealth: f64,
    pub mean_happiness: f64,
    pub mean_productivity: f64,
    pub tax_revenue: f64,
    pub ubi_amount: f64,
    pub total_income: f64,
    pub population: u64,
    pub agents_in_poverty: u64,
    pub agents_bankrupt: u64,
    pub wealth_distribution: Vec<u64>,
}

/// Parallel per-turn series, replaced wholesale by the server each
/// turn rather than accumulated client-side.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistorySeries {
    pub gini: Vec<f64>,
    pub mean_wealth: Vec<f64>,
    pub mean_happiness: Vec<f64>,
    pub mean_productivity: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn title(self) -> &'static str {
        match self {
            Grade::S => "Utopian Visionary",
            Grade::A => "Beloved Leader",
            Grade::B => "Competent Administrator",
            Grade::C => "Struggling Manager",
            Grade::D => "Unpopular Bureaucrat",
            Grade::F => "Failed State",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub prosperity: i64,
    pub equality: i64,
    pub happiness: i64,
    pub stability: i64,
    pub composite: i64,
    pub grade: Grade,
}

/// Complete simulation step result; both remote operations return it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub game_id: SessionId,
    pub turn: u32,
    pub max_turns: u32,
    pub is_finished: bool,
    pub events: Vec<EventEntry>,
    pub state: MetricsSnapshot,
    pub history: HistorySeries,
    pub scores: Option<Scores>,
    pub policies: PolicySet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub difficulty: Difficulty,
    pub seed: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceTurnRequest {
    pub policies: PolicySet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grades_order_from_best_to_worst() {
        assert!(Grade::S < Grade::A);
        assert!(Grade::A < Grade::F);
        assert_eq!(Grade::F.title(), "Failed State");
    }

    #[test]
    fn grade_decodes_from_single_letter() {
        let scores: Scores =
            serde_json::from_str(r#"{"prosperity":70,"equality":85,"happiness":80,"stability":90,"composite":81,"grade":"A"}"#)
                .expect("scores decode");
        assert_eq!(scores.grade, Grade::A);
    }

    #[test]
    fn unknown_event_category_decodes_generically() {
        let entry: EventEntry = serde_json::from_str(
            r#"{"id":"x","name":"n","description":"d","category":"astrological"}"#,
        )
        .expect("event decode");
        assert_eq!(entry.category, EventCategory::Other);
    }

    #[test]
    fn difficulty_uses_snake_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&Difficulty::Hard).expect("encode"),
            r#""hard""#
        );
    }

    #[test]
    fn empty_patch_is_identity() {
        let base = PolicySet::default();
        assert_eq!(PolicyPatch::default().apply_to(&base), base);
    }
}
