use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::tracking::constants::{
    CTA_CLICKED_EVENT, NAVIGATION_TYPE, ROUTE_NAME, SEARCHED_TERM_EVENT,
};
use crate::tracking::context::TrackingContext;
use crate::tracking::environment::VendorTracker;
use crate::tracking::error::{internal_error, TrackingResult};
use crate::tracking::logger::LOGGER;
use crate::tracking::metadata::RequiredPageFields;

/// Options passed with every page event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewOptions {
    pub navigation_type: String,
    pub product_title: String,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaPayload {
    /// Omitted when the action could not be determined.
    #[serde(rename = "CTA", skip_serializing_if = "Option::is_none")]
    pub cta: Option<String>,
    pub product_title: String,
    pub category: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTermPayload {
    pub category: String,
    pub location: String,
    pub product_title: String,
    pub text: String,
}

/// Parameters accepted by [`track_click_event`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickEventParams {
    Structured { action: Option<String> },
    /// JSON text of a structured parameter, e.g. `{"action":"Buy"}`.
    Serialized(String),
}

impl ClickEventParams {
    pub fn action(action: impl Into<String>) -> Self {
        ClickEventParams::Structured {
            action: Some(action.into()),
        }
    }

    /// Resolves the action. Serialized input that is not a JSON object with a string `action`
    /// yields `None`.
    pub fn resolve_action(&self) -> Option<String> {
        match self {
            ClickEventParams::Structured { action } => action.clone(),
            ClickEventParams::Serialized(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(value) => action_from_value(&value),
                Err(err) => {
                    LOGGER.debug(format!("Ignoring unparsable click parameters: {err}"));
                    None
                }
            },
        }
    }
}

impl From<&str> for ClickEventParams {
    fn from(raw: &str) -> Self {
        ClickEventParams::Serialized(raw.to_string())
    }
}

impl From<String> for ClickEventParams {
    fn from(raw: String) -> Self {
        ClickEventParams::Serialized(raw)
    }
}

/// Host-side JSON arguments: strings are serialized parameters, objects structured ones.
impl From<&Value> for ClickEventParams {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(raw) => ClickEventParams::Serialized(raw.clone()),
            other => ClickEventParams::Structured {
                action: action_from_value(other),
            },
        }
    }
}

fn action_from_value(value: &Value) -> Option<String> {
    value
        .get("action")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Reports a page view.
pub fn track_page(context: &TrackingContext, title: &str) -> TrackingResult<()> {
    let Some((vendor, fields)) = resolve_target(context)? else {
        return Ok(());
    };
    let options = to_payload(&PageViewOptions {
        navigation_type: NAVIGATION_TYPE.to_string(),
        product_title: fields.product_title,
        title: title.to_string(),
    })?;
    absorb(
        "pageEvent",
        vendor.page_event(&fields.category, ROUTE_NAME, &options),
    );
    Ok(())
}

/// Reports a call-to-action click.
pub fn track_click_event(
    context: &TrackingContext,
    params: impl Into<ClickEventParams>,
) -> TrackingResult<()> {
    let Some((vendor, fields)) = resolve_target(context)? else {
        return Ok(());
    };
    let payload = to_payload(&CtaPayload {
        cta: params.into().resolve_action(),
        product_title: fields.product_title,
        category: fields.category,
    })?;
    absorb(
        CTA_CLICKED_EVENT,
        vendor.track_event(CTA_CLICKED_EVENT, &payload),
    );
    Ok(())
}

/// Reports a search term entered in `search_component`.
pub fn track_search_term(
    context: &TrackingContext,
    search_component: &str,
    search_term: &str,
) -> TrackingResult<()> {
    let Some((vendor, fields)) = resolve_target(context)? else {
        return Ok(());
    };
    let payload = to_payload(&SearchTermPayload {
        category: fields.category,
        location: search_component.to_string(),
        product_title: fields.product_title,
        text: search_term.to_string(),
    })?;
    absorb(
        SEARCHED_TERM_EVENT,
        vendor.track_event(SEARCHED_TERM_EVENT, &payload),
    );
    Ok(())
}

/// `Ok(None)` when tracking is inactive (no vendor or no metadata); an error when the vendor
/// is present but the metadata lacks a required field.
fn resolve_target(
    context: &TrackingContext,
) -> TrackingResult<Option<(Arc<dyn VendorTracker>, RequiredPageFields)>> {
    let environment = context.environment();
    let Some(vendor) = environment.vendor() else {
        LOGGER.debug("Vendor tracker not present; skipping event");
        return Ok(None);
    };
    let Some(metadata) = environment.page_metadata() else {
        LOGGER.debug("Page metadata not present; skipping event");
        return Ok(None);
    };
    let fields = metadata.required_fields()?;
    Ok(Some((vendor, fields)))
}

fn to_payload<T: Serialize>(payload: &T) -> TrackingResult<Value> {
    serde_json::to_value(payload)
        .map_err(|err| internal_error(format!("Failed to encode event payload: {err}")))
}

fn absorb(call: &str, result: TrackingResult<()>) {
    if let Err(err) = result {
        LOGGER.warn(format!("Vendor `{call}` call failed: {err}"));
    }
}
