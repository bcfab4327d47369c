//! View derivation: filter, order and page a ranked collection
//!
//! `compute_view` is pure. `ViewState` owns the user's selections and applies
//! the page reset rules when they change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FlipperError, FlipperResult};
use crate::models::{RankedItem, TraitScore};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes offered by the page size selector
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [5, 10, 30];

// =============================================================================
// Parameters
// =============================================================================

/// Ordering applied to the whole filtered set before paging.
///
/// Payloads arrive sorted by rank ascending (rank 1 first), so
/// `RankDescending` ("High to Low") keeps source order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    RankDescending,
    RankAscending,
}

impl SortOrder {
    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::RankDescending => "Rank-High to Low",
            SortOrder::RankAscending => "Rank-Low to High",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortOrder {
    type Err = FlipperError;

    fn from_str(s: &str) -> FlipperResult<Self> {
        match s {
            "Rank-High to Low" | "rank_descending" => Ok(SortOrder::RankDescending),
            "Rank-Low to High" | "rank_ascending" => Ok(SortOrder::RankAscending),
            other => Err(FlipperError::Parse(format!("Unknown sort order '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewParams {
    /// Exact token id to show; `None` or empty shows everything
    pub token_filter: Option<String>,
    pub sort_order: SortOrder,
    pub page_size: usize,
    /// 1-based page number
    pub current_page: usize,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            token_filter: None,
            sort_order: SortOrder::default(),
            page_size: DEFAULT_PAGE_SIZE,
            current_page: 1,
        }
    }
}

impl ViewParams {
    pub fn new(page_size: usize) -> FlipperResult<Self> {
        validate_page_size(page_size)?;
        Ok(Self {
            page_size,
            ..Self::default()
        })
    }

    /// The filter value if one is actually in effect
    pub fn active_filter(&self) -> Option<&str> {
        self.token_filter.as_deref().filter(|f| !f.is_empty())
    }
}

pub fn validate_page_size(page_size: usize) -> FlipperResult<()> {
    if page_size == 0 {
        return Err(FlipperError::InvalidParameter(
            "Page size must be greater than zero".into(),
        ));
    }
    Ok(())
}

/// Number of pages needed for `total_count` items. Never less than one.
pub fn page_count(total_count: usize, page_size: usize) -> usize {
    total_count.div_ceil(page_size.max(1)).max(1)
}

// =============================================================================
// Derived Output
// =============================================================================

/// A ranked item with the fields the item card displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayItem {
    /// Item with its traits ordered by descending score
    #[serde(flatten)]
    pub item: RankedItem,

    /// Score rounded to two decimals
    pub display_score: f64,

    /// Score expressed in ETH (score / 10000) with four decimals
    pub display_eth_value: String,
}

impl DisplayItem {
    pub fn from_item(item: &RankedItem) -> Self {
        let mut item = item.clone();
        sort_traits(&mut item.traits);

        Self {
            display_score: (item.score * 100.0).round() / 100.0,
            display_eth_value: format!("{:.4}", item.score / 10_000.0),
            item,
        }
    }
}

fn sort_traits(traits: &mut [TraitScore]) {
    // stable: equal scores keep payload order
    traits.sort_by(|a, b| b.score.total_cmp(&a.score));
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewResult {
    pub visible_items: Vec<DisplayItem>,
    /// Size of the filtered set before paging
    pub total_count: usize,
    pub page_count: usize,
    /// Page actually shown after clamping
    pub current_page: usize,
}

impl ViewResult {
    /// Labels for the page selector: "1" through `page_count`
    pub fn page_options(&self) -> Vec<String> {
        (1..=self.page_count).map(|p| p.to_string()).collect()
    }
}

/// Derive the visible page from `raw_items`.
///
/// The sort order applies to the whole filtered set; the page window is cut
/// afterwards. An active token filter always shows page 1.
pub fn compute_view(raw_items: &[RankedItem], params: &ViewParams) -> ViewResult {
    let page_size = params.page_size.max(1);

    let mut filtered: Vec<&RankedItem> = match params.active_filter() {
        Some(token_id) => raw_items.iter().filter(|i| i.token_id == token_id).collect(),
        None => raw_items.iter().collect(),
    };

    let total_count = filtered.len();
    let page_count = page_count(total_count, page_size);
    let current_page = if params.active_filter().is_some() {
        1
    } else {
        params.current_page.clamp(1, page_count)
    };

    if params.sort_order == SortOrder::RankAscending {
        filtered.reverse();
    }

    let visible_items = filtered
        .into_iter()
        .skip((current_page - 1) * page_size)
        .take(page_size)
        .map(DisplayItem::from_item)
        .collect();

    ViewResult {
        visible_items,
        total_count,
        page_count,
        current_page,
    }
}

// =============================================================================
// View State
// =============================================================================

/// The user's filter, sort and paging selections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    params: ViewParams,
}

impl ViewState {
    pub fn new(page_size: usize) -> FlipperResult<Self> {
        Ok(Self {
            params: ViewParams::new(page_size)?,
        })
    }

    pub fn params(&self) -> &ViewParams {
        &self.params
    }

    /// Set or clear the token filter. A non-empty filter jumps to page 1.
    pub fn set_token_filter(&mut self, token_filter: Option<String>) {
        let token_filter = token_filter.filter(|f| !f.is_empty());
        if token_filter.is_some() {
            self.params.current_page = 1;
        }
        self.params.token_filter = token_filter;
    }

    /// Change the page size. Always jumps to page 1.
    pub fn set_page_size(&mut self, page_size: usize) -> FlipperResult<()> {
        validate_page_size(page_size)?;
        self.params.page_size = page_size;
        self.params.current_page = 1;
        Ok(())
    }

    /// Change the sort order, keeping the current page.
    pub fn set_sort_order(&mut self, sort_order: SortOrder) {
        self.params.sort_order = sort_order;
    }

    /// Select a page. Out-of-range pages are clamped on the next `view`.
    pub fn set_page(&mut self, page: usize) {
        self.params.current_page = page.max(1);
    }

    /// Recompute the visible page and store the clamped page number back.
    pub fn view(&mut self, raw_items: &[RankedItem]) -> ViewResult {
        let result = compute_view(raw_items, &self.params);
        self.params.current_page = result.current_page;
        result
    }
}
