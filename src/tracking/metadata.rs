//! Page metadata ("digital data") published on the page and read by every forwarder.
//!
//! Every level of the nested record is optional. Forwarders never read the fields directly;
//! they go through [`PageMetadata::required_fields`], which either yields both strings or a
//! `MissingConfigurationField` error naming the absent path.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tracking::constants::{
    CATEGORY_PATH, DEFAULT_CATEGORY, DEFAULT_PRODUCT_TITLE, PRODUCT_TITLE_PATH,
};
use crate::tracking::error::{missing_configuration_field, TrackingResult};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageSection>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<PageAnalytics>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageAnalytics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Both required fields, validated as non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequiredPageFields {
    pub product_title: String,
    pub category: String,
}

impl PageMetadata {
    pub fn new(product_title: impl Into<String>, category: impl Into<String>) -> Self {
        Self::default()
            .with_product_title(product_title)
            .with_category(category)
    }

    /// Baseline written by the installer before the host supplies real page information.
    pub fn stub() -> Self {
        Self::new(DEFAULT_PRODUCT_TITLE, DEFAULT_CATEGORY)
    }

    /// Builds metadata from an arbitrary JSON value. Missing levels, unexpected shapes and
    /// non-string leaves all read as "no value" instead of failing.
    pub fn from_value(value: &Value) -> Self {
        let product_title = value
            .pointer("/page/pageInfo/productTitle")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let category = value
            .pointer("/page/pageInfo/analytics/category")
            .and_then(Value::as_str)
            .map(str::to_owned);

        let mut metadata = Self::default();
        if let Some(title) = product_title {
            metadata = metadata.with_product_title(title);
        }
        if let Some(category) = category {
            metadata = metadata.with_category(category);
        }
        metadata
    }

    pub fn with_product_title(mut self, product_title: impl Into<String>) -> Self {
        self.page_info_mut().product_title = Some(product_title.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.page_info_mut()
            .analytics
            .get_or_insert_with(PageAnalytics::default)
            .category = Some(category.into());
        self
    }

    pub fn product_title(&self) -> Option<&str> {
        self.page_info()?.product_title.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.page_info()?.analytics.as_ref()?.category.as_deref()
    }

    /// Validates that both required fields are present and non-empty.
    pub fn required_fields(&self) -> TrackingResult<RequiredPageFields> {
        let product_title = extract_required_field(|| self.product_title(), PRODUCT_TITLE_PATH)?;
        let category = extract_required_field(|| self.category(), CATEGORY_PATH)?;
        Ok(RequiredPageFields {
            product_title: product_title.to_owned(),
            category: category.to_owned(),
        })
    }

    fn page_info(&self) -> Option<&PageInfo> {
        self.page.as_ref()?.page_info.as_ref()
    }

    fn page_info_mut(&mut self) -> &mut PageInfo {
        self.page
            .get_or_insert_with(PageSection::default)
            .page_info
            .get_or_insert_with(PageInfo::default)
    }
}

/// Runs `accessor` and fails with `MissingConfigurationField` when it yields nothing or an
/// empty string.
pub fn extract_required_field<'a, F>(accessor: F, field_path: &str) -> TrackingResult<&'a str>
where
    F: FnOnce() -> Option<&'a str>,
{
    match accessor() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(missing_configuration_field(format!(
            "Page metadata is missing `{field_path}`"
        ))),
    }
}
