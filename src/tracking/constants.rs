pub const TRACKING_LOGGER_NAME: &str = "@platypus/tracking";

/// Route namespace reported to the vendor with every page event.
pub const ROUTE_NAME: &str = "project-platypus";
pub const NAVIGATION_TYPE: &str = "pushState";

pub const CTA_CLICKED_EVENT: &str = "CTA Clicked";
pub const SEARCHED_TERM_EVENT: &str = "Searched Term";

pub const TRACK_CLICK_EVENT_MEMBER: &str = "trackClickEvent";
pub const TRACK_PAGE_MEMBER: &str = "trackPage";
pub const TRACK_SEARCH_TERM_MEMBER: &str = "trackSearchTerm";

pub const DEFAULT_PRODUCT_TITLE: &str = "Project Platypus";
pub const DEFAULT_CATEGORY: &str = "Platform";

pub const DEFAULT_CONFIG_GLOBAL: &str = "analyticsConfig";
pub const DEFAULT_DIGITAL_DATA_GLOBAL: &str = "digitalData";
pub const DEFAULT_VENDOR_GLOBAL: &str = "analyticsTracker";

pub const PRODUCT_TITLE_PATH: &str = "page.pageInfo.productTitle";
pub const CATEGORY_PATH: &str = "page.pageInfo.analytics.category";
