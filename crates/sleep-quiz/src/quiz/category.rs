use serde::{Deserialize, Serialize};

use super::scoring::ScoreResult;

/// Which score figure is fed into the category lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryBasis {
    #[default]
    Percentage,
    DisplayScore,
}

impl CategoryBasis {
    pub fn value_of(self, score: &ScoreResult) -> u32 {
        match self {
            CategoryBasis::Percentage => u32::from(score.percentage),
            CategoryBasis::DisplayScore => score.display_score,
        }
    }
}

/// Qualitative bucket for a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub lower_bound: u32,
    pub title: String,
    pub description: String,
}

impl Category {
    fn new(lower_bound: u32, title: &str, description: &str) -> Self {
        Self {
            lower_bound,
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// Strictly descending threshold table ending in a catch-all `0` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTable {
    entries: Vec<Category>,
}

impl CategoryTable {
    pub fn new(entries: Vec<Category>) -> Result<Self, CategoryError> {
        let Some(last) = entries.last() else {
            return Err(CategoryError::Empty);
        };
        if last.lower_bound != 0 {
            return Err(CategoryError::MissingFloor);
        }
        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].lower_bound <= pair[1].lower_bound)
        {
            return Err(CategoryError::NotDescending {
                before: pair[0].lower_bound,
                after: pair[1].lower_bound,
            });
        }
        Ok(Self { entries })
    }

    /// Percentage thresholds used by the short sleep check.
    pub fn sleep_percentage() -> Self {
        Self {
            entries: sleep_categories([83, 67, 50, 33, 0]),
        }
    }

    /// Thresholds on the 60-point display score used by the full assessment.
    pub fn sleep_display_score() -> Self {
        Self {
            entries: sleep_categories([50, 40, 30, 20, 0]),
        }
    }

    pub fn entries(&self) -> &[Category] {
        &self.entries
    }

    /// Returns the entry with the greatest lower bound not exceeding `value`.
    pub fn classify(&self, value: u32) -> &Category {
        self.entries
            .iter()
            .find(|category| category.lower_bound <= value)
            .unwrap_or_else(|| self.floor())
    }

    /// Position of the matching entry; 0 is the best category.
    pub fn rank(&self, value: u32) -> usize {
        self.entries
            .iter()
            .position(|category| category.lower_bound <= value)
            .unwrap_or(self.entries.len() - 1)
    }

    fn floor(&self) -> &Category {
        &self.entries[self.entries.len() - 1]
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("category table is empty")]
    Empty,
    #[error("category table must end with a lower bound of 0")]
    MissingFloor,
    #[error("category thresholds must strictly descend ({before} then {after})")]
    NotDescending { before: u32, after: u32 },
}

fn sleep_categories(bounds: [u32; 5]) -> Vec<Category> {
    let [excellent, good, fair, poor, very_poor] = bounds;
    vec![
        Category::new(
            excellent,
            "Excellent Sleep Quality",
            "Your sleep habits and environment are well-optimized. You're getting quality rest that supports peak performance.",
        ),
        Category::new(
            good,
            "Good Sleep Quality",
            "Your sleep is generally good with some areas for improvement. Small optimizations could enhance your rest quality.",
        ),
        Category::new(
            fair,
            "Fair Sleep Quality",
            "Your sleep quality has room for improvement. Several factors may be impacting your rest and performance.",
        ),
        Category::new(
            poor,
            "Poor Sleep Quality",
            "Your sleep quality is significantly impacting your well-being. Multiple factors need attention for better rest.",
        ),
        Category::new(
            very_poor,
            "Very Poor Sleep Quality",
            "Your sleep quality is severely compromised. Professional assessment and intervention are strongly recommended.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive_lower_bounds() {
        let table = CategoryTable::sleep_percentage();
        assert_eq!(table.classify(100).title, "Excellent Sleep Quality");
        assert_eq!(table.classify(83).title, "Excellent Sleep Quality");
        assert_eq!(table.classify(82).title, "Good Sleep Quality");
        assert_eq!(table.classify(67).title, "Good Sleep Quality");
        assert_eq!(table.classify(60).title, "Fair Sleep Quality");
        assert_eq!(table.classify(50).title, "Fair Sleep Quality");
        assert_eq!(table.classify(33).title, "Poor Sleep Quality");
        assert_eq!(table.classify(32).title, "Very Poor Sleep Quality");
        assert_eq!(table.classify(0).title, "Very Poor Sleep Quality");
    }

    #[test]
    fn classification_is_total_and_monotonic() {
        for table in [
            CategoryTable::sleep_percentage(),
            CategoryTable::sleep_display_score(),
        ] {
            let mut previous_rank = table.rank(0);
            for value in 0..=100 {
                let rank = table.rank(value);
                assert!(rank <= previous_rank, "rank regressed at {value}");
                assert_eq!(table.classify(value), &table.entries()[rank]);
                previous_rank = rank;
            }
        }
    }

    #[test]
    fn display_score_table_uses_sixty_point_bounds() {
        let table = CategoryTable::sleep_display_score();
        assert_eq!(table.classify(50).title, "Excellent Sleep Quality");
        assert_eq!(table.classify(49).title, "Good Sleep Quality");
        assert_eq!(table.classify(36).title, "Fair Sleep Quality");
        assert_eq!(table.classify(19).title, "Very Poor Sleep Quality");
    }

    #[test]
    fn rejects_malformed_tables() {
        assert_eq!(CategoryTable::new(Vec::new()), Err(CategoryError::Empty));
        assert_eq!(
            CategoryTable::new(vec![Category::new(10, "Low", "")]),
            Err(CategoryError::MissingFloor)
        );
        assert_eq!(
            CategoryTable::new(vec![
                Category::new(40, "A", ""),
                Category::new(60, "B", ""),
                Category::new(0, "C", ""),
            ]),
            Err(CategoryError::NotDescending {
                before: 40,
                after: 60
            })
        );
        assert!(CategoryTable::new(CategoryTable::sleep_percentage().entries().to_vec()).is_ok());
    }

    #[test]
    fn basis_selects_score_figure() {
        let score = ScoreResult {
            raw_weighted_sum: 4.5,
            max_possible_sum: 7.5,
            percentage: 60,
            display_score: 36,
        };
        assert_eq!(CategoryBasis::Percentage.value_of(&score), 60);
        assert_eq!(CategoryBasis::DisplayScore.value_of(&score), 36);
    }
}
