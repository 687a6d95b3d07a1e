//! Shared helper functions for CLI output.

use console::style;

use placereviews::models::ReviewRecord;

/// Aggregate figures printed after a harvest.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSummary {
    pub count: usize,
    /// Mean over records with a parseable rating.
    pub average_rating: Option<f64>,
    pub rated: usize,
    pub owner_replies: usize,
    pub edited: usize,
}

impl ReviewSummary {
    pub fn from_records(records: &[ReviewRecord]) -> Self {
        let ratings: Vec<f64> = records.iter().filter_map(|r| r.numeric_rating()).collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
        };

        Self {
            count: records.len(),
            average_rating,
            rated: ratings.len(),
            owner_replies: records.iter().filter(|r| r.has_owner_reply()).count(),
            edited: records
                .iter()
                .filter(|r| r.date_without_edit_marker() != r.date.trim())
                .count(),
        }
    }
}

pub fn print_summary(summary: &ReviewSummary) {
    println!("  {} {} reviews", style("→").dim(), summary.count);
    match summary.average_rating {
        Some(avg) => println!(
            "  {} Average rating {:.2} ({} rated)",
            style("→").dim(),
            avg,
            summary.rated
        ),
        None => println!("  {} No parseable ratings", style("→").dim()),
    }
    println!(
        "  {} {} owner replies, {} edited",
        style("→").dim(),
        summary.owner_replies,
        summary.edited
    );
}

/// Print every review in a readable block.
pub fn display_reviews(records: &[ReviewRecord]) {
    for (idx, review) in records.iter().enumerate() {
        println!("{}. Date:   {}", idx + 1, review.date);
        println!("   Rating: {}", review.rating);
        println!("   Review: {}", review.text);
        if let Some(ref owner) = review.owner {
            println!("   Owner:  {}", owner);
        }
        println!("{}", style("-".repeat(60)).dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, rating: &str, owner: Option<&str>) -> ReviewRecord {
        ReviewRecord {
            date: date.to_string(),
            rating: rating.to_string(),
            text: "text".to_string(),
            owner: owner.map(str::to_string),
        }
    }

    #[test]
    fn test_summary_skips_unrated_in_average() {
        let records = vec![
            record("2 days ago", "4/5", Some("Thanks!")),
            record("Edited a week ago", "5.0", None),
            record("a month ago", "N/A", None),
        ];
        let summary = ReviewSummary::from_records(&records);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.rated, 2);
        assert_eq!(summary.average_rating, Some(4.5));
        assert_eq!(summary.owner_replies, 1);
        assert_eq!(summary.edited, 1);
    }

    #[test]
    fn test_summary_of_nothing() {
        let summary = ReviewSummary::from_records(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average_rating, None);
    }
}
