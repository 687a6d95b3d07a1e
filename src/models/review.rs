//! Harvested review record.

use serde::{Deserialize, Serialize};

/// Rating value used when neither the textual rating nor the stars resolve.
pub const RATING_SENTINEL: &str = "N/A";

/// Prefix the page puts in front of the date of an edited review.
pub const EDIT_MARKER: &str = "Edited";

/// One review as rendered on the page.
///
/// Field values are kept as displayed; resolving relative dates or numeric
/// ratings is left to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Rendered date, e.g. "2 days ago" or "Edited a month ago".
    pub date: String,
    /// Textual rating ("5.0"), star count ("4/5") or [`RATING_SENTINEL`].
    pub rating: String,
    /// Review body, with a "(Services: ...)" suffix when services were listed.
    pub text: String,
    /// Owner's reply, if any.
    pub owner: Option<String>,
}

impl ReviewRecord {
    /// Append the services suffix to a review body.
    ///
    /// Returns the body unchanged when `services` is empty.
    pub fn text_with_services(body: &str, services: &[String]) -> String {
        if services.is_empty() {
            body.to_string()
        } else {
            format!("{} (Services: {})", body, services.join("; "))
        }
    }

    /// Rating as a number: "4/5" gives 4.0, "4.5" gives 4.5, the sentinel gives None.
    pub fn numeric_rating(&self) -> Option<f64> {
        let head = self.rating.split('/').next()?.trim();
        head.replace(',', ".").parse::<f64>().ok()
    }

    /// Date with a leading edit marker removed.
    pub fn date_without_edit_marker(&self) -> &str {
        let date = self.date.trim();
        match date.strip_prefix(EDIT_MARKER) {
            Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
            _ => date,
        }
    }

    pub fn has_owner_reply(&self) -> bool {
        self.owner.is_some()
    }
}
