//! Portfolio Catalog
//!
//! Work items shown in the grid, category filtering and the detail modal.

use serde::{Deserialize, Serialize};

use crate::SiteError;

/// Pseudo-category matching every item
pub const ALL_CATEGORIES: &str = "All";

/// One piece of work in the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: u32,
    pub title: String,
    pub category: String,
    /// Media id of the preview video
    pub media: String,
    pub thumbnail: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub year: u16,
    #[serde(default)]
    pub client: String,
}

/// Catalog with the active filter and the open detail modal
#[derive(Debug, Clone)]
pub struct Portfolio {
    items: Vec<PortfolioItem>,
    filter: String,
    selected: Option<usize>,
}

impl Portfolio {
    pub fn new(items: Vec<PortfolioItem>) -> Self {
        Self {
            items,
            filter: ALL_CATEGORIES.to_string(),
            selected: None,
        }
    }

    pub fn items(&self) -> &[PortfolioItem] {
        &self.items
    }

    pub fn get(&self, id: u32) -> Option<&PortfolioItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// `"All"` followed by each category in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        let mut categories = vec![ALL_CATEGORIES];
        for item in &self.items {
            if !categories.contains(&item.category.as_str()) {
                categories.push(&item.category);
            }
        }
        categories
    }

    /// Items in `category`, in catalog order
    pub fn filter(&self, category: &str) -> Vec<&PortfolioItem> {
        self.items
            .iter()
            .filter(|item| category == ALL_CATEGORIES || item.category == category)
            .collect()
    }

    pub fn active_filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, category: &str) {
        self.filter = category.to_string();
    }

    /// Items under the active filter
    pub fn visible(&self) -> Vec<&PortfolioItem> {
        self.filter(&self.filter)
    }

    pub fn open(&mut self, id: u32) -> Result<&PortfolioItem, SiteError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(SiteError::UnknownPortfolioItem(id))?;
        self.selected = Some(index);
        Ok(&self.items[index])
    }

    pub fn close(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&PortfolioItem> {
        self.selected.map(|i| &self.items[i])
    }
}
