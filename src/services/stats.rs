use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{DailyTotals, FoodEntry};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub date: NaiveDate,
    pub total_calories: f64,
    pub total_protein: f64,
    pub entries: usize,
    pub daily_calorie_goal: i32,
    pub daily_protein_goal: i32,
    pub calorie_progress: f64,
    pub protein_progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub days: Vec<DailyTotals>,
    pub average_calories: f64,
    pub average_protein: f64,
}

pub fn dashboard_summary(
    date: NaiveDate,
    entries: &[FoodEntry],
    calorie_goal: i32,
    protein_goal: i32,
) -> DashboardSummary {
    let total_calories: f64 = entries.iter().map(|e| e.calories).sum();
    let total_protein: f64 = entries.iter().map(|e| e.protein).sum();

    DashboardSummary {
        date,
        total_calories,
        total_protein,
        entries: entries.len(),
        daily_calorie_goal: calorie_goal,
        daily_protein_goal: protein_goal,
        calorie_progress: percent_of(total_calories, calorie_goal),
        protein_progress: percent_of(total_protein, protein_goal),
    }
}

/// Averages are over the days that have entries, not the whole window.
pub fn progress_summary(days: Vec<DailyTotals>) -> ProgressSummary {
    let (average_calories, average_protein) = if days.is_empty() {
        (0.0, 0.0)
    } else {
        let count = days.len() as f64;
        (
            days.iter().map(|d| d.calories).sum::<f64>() / count,
            days.iter().map(|d| d.protein).sum::<f64>() / count,
        )
    };

    ProgressSummary {
        days,
        average_calories,
        average_protein,
    }
}

fn percent_of(value: f64, goal: i32) -> f64 {
    if goal > 0 {
        value / goal as f64 * 100.0
    } else {
        0.0
    }
}
