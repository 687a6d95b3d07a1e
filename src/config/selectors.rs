//! Markup selectors for the target site.
//!
//! The defaults describe the place page markup as currently served. Class
//! names on that page are obfuscated and change between deployments, so every
//! one of them can be overridden from the config file.

use serde::{Deserialize, Serialize};

use crate::session::Locator;

/// Placeholder replaced by the 1-based tab position in `review_tab_xpath`.
pub const POSITION_PLACEHOLDER: &str = "{position}";

const PLACE_TITLE_XPATH: &str = "/html/body/div[1]/div[3]/div[8]/div[9]/div/div/div[1]/div[2]/div/div[1]/div/div/div[2]/div/div[1]/div[1]/h1";

const REVIEW_COUNT_XPATH: &str = "/html/body/div[1]/div[3]/div[8]/div[9]/div/div/div[1]/div[2]/div/div[1]/div/div/div[2]/div/div[1]/div[2]/div/div[1]/div[2]/span[2]/span/span/span";

const REVIEW_COUNT_XPATH_SHORT: &str = "/html/body/div[1]/div[3]/div[8]/div[9]/div/div/div[1]/div[2]/div/div[1]/div/div/div[2]/div/div[1]/div[2]/div/div[1]/div[2]/span[2]/span/span";

const REVIEW_TAB_XPATH: &str = "/html/body/div[1]/div[3]/div[8]/div[9]/div/div/div[1]/div[2]/div/div[1]/div/div/div[3]/div/div/button[{position}]/div[2]/div[2]";

/// Selectors for every element the harvester touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    /// Absolute path of the place heading.
    pub place_title_xpath: String,
    /// Review-count displays, tried in order.
    pub review_count_xpaths: Vec<String>,
    /// Class of the container holding the primary tabs.
    pub tab_container_class: String,
    /// Tag of the interactive tab controls inside the container.
    pub tab_button_tag: String,
    /// Path of the clickable part of the reviews tab, with a `{position}`
    /// placeholder. When unset, the counted tab control itself is clicked.
    pub review_tab_xpath: Option<String>,
    /// Class of the "More" controls that expand truncated review text.
    pub show_more_class: String,
    /// CSS of the controls that revert translated text to the original.
    pub show_original_css: String,
    /// Class of one review card.
    pub review_card_class: String,
    /// Class of the text-bearing element, shared by review and owner blocks.
    pub review_text_class: String,
    /// Class of the block wrapping the reviewer's own text.
    pub review_block_class: String,
    /// Class of the block wrapping the owner's response.
    pub owner_block_class: String,
    /// Date variants, tried in order.
    pub date_classes: Vec<String>,
    /// Class of the element rendering the rating as text (e.g. "5.0").
    pub rating_text_class: String,
    /// Class of the star-icon container.
    pub star_container_class: String,
    /// Class of one filled star inside the container.
    pub filled_star_class: String,
    /// Class of the wrapper around the services label and entries.
    pub services_parent_class: String,
    /// Tag of the wrapper's children; the first one is the label.
    pub services_child_tag: String,
    /// Class of the element carrying one service entry.
    pub services_entry_class: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            place_title_xpath: PLACE_TITLE_XPATH.to_string(),
            review_count_xpaths: vec![
                REVIEW_COUNT_XPATH.to_string(),
                REVIEW_COUNT_XPATH_SHORT.to_string(),
            ],
            tab_container_class: "RWPxGd".to_string(),
            tab_button_tag: "button".to_string(),
            review_tab_xpath: Some(REVIEW_TAB_XPATH.to_string()),
            show_more_class: "w8nwRe".to_string(),
            show_original_css: "button.kyuRq.fontTitleSmall.WOKzJe".to_string(),
            review_card_class: "jJc9Ad".to_string(),
            review_text_class: "wiI7pd".to_string(),
            review_block_class: "MyEned".to_string(),
            owner_block_class: "CDe7pd".to_string(),
            date_classes: vec!["rsqaWe".to_string(), "xRkPPb".to_string()],
            rating_text_class: "fzvQIb".to_string(),
            star_container_class: "kvMYJc".to_string(),
            filled_star_class: "elGi1d".to_string(),
            services_parent_class: "PBK6be".to_string(),
            services_child_tag: "div".to_string(),
            services_entry_class: "RfDO5c".to_string(),
        }
    }
}

impl SiteSelectors {
    pub fn place_title(&self) -> Locator {
        Locator::xpath(&self.place_title_xpath)
    }

    pub fn review_counts(&self) -> Vec<Locator> {
        self.review_count_xpaths
            .iter()
            .map(Locator::xpath)
            .collect()
    }

    pub fn review_card(&self) -> Locator {
        Locator::class(&self.review_card_class)
    }

    pub fn review_text(&self) -> Locator {
        Locator::class(&self.review_text_class)
    }

    /// Locator of the reviews tab target at a 1-based position, if a path
    /// template is configured.
    pub fn review_tab_at(&self, position: usize) -> Option<Locator> {
        let template = self.review_tab_xpath.as_ref()?;
        let path = template.replace(POSITION_PLACEHOLDER, &position.to_string());
        Some(Locator::xpath(path))
    }
}
