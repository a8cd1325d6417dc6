use crate::models::{BodyType, Goal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyGoals {
    pub calories: i32,
    pub protein_grams: i32,
}

/// Daily targets assigned at registration from goal, body type and body weight (kg).
pub fn daily_goals(goal: Goal, body_type: BodyType, weight_kg: f64) -> DailyGoals {
    let (calories, protein_per_kg) = match goal {
        Goal::WeightGain => {
            let calories = match body_type {
                BodyType::Lean => 2800,
                BodyType::Bulk => 3200,
                BodyType::Normal => 2600,
            };
            (calories, 1.8)
        }
        Goal::WeightLoss => {
            let calories = match body_type {
                BodyType::Lean => 1800,
                BodyType::Bulk => 2200,
                BodyType::Normal => 2000,
            };
            (calories, 1.6)
        }
    };

    DailyGoals {
        calories,
        protein_grams: (weight_kg.max(0.0) * protein_per_kg).ceil() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_gain_goals() {
        assert_eq!(
            daily_goals(Goal::WeightGain, BodyType::Lean, 50.0),
            DailyGoals { calories: 2800, protein_grams: 90 }
        );
        assert_eq!(daily_goals(Goal::WeightGain, BodyType::Bulk, 50.0).calories, 3200);
        assert_eq!(daily_goals(Goal::WeightGain, BodyType::Normal, 50.0).calories, 2600);
    }

    #[test]
    fn test_weight_loss_goals() {
        assert_eq!(
            daily_goals(Goal::WeightLoss, BodyType::Normal, 50.0),
            DailyGoals { calories: 2000, protein_grams: 80 }
        );
        assert_eq!(daily_goals(Goal::WeightLoss, BodyType::Lean, 50.0).calories, 1800);
        assert_eq!(daily_goals(Goal::WeightLoss, BodyType::Bulk, 50.0).calories, 2200);
    }

    #[test]
    fn test_protein_rounds_up() {
        // 72.5 * 1.8 = 130.5
        assert_eq!(daily_goals(Goal::WeightGain, BodyType::Lean, 72.5).protein_grams, 131);
    }
}
