//! Browser bindings: script tag injection, page globals and JS-callable members.

use std::sync::Arc;

use js_sys::{Function, Object, Reflect};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::platform::environment::is_browser;
use crate::tracking::config::{AnalyticsConfig, GlobalNames, TrackingOptions};
use crate::tracking::context::TrackingContext;
use crate::tracking::environment::{TrackingEnvironment, VendorTracker};
use crate::tracking::error::{
    internal_error, script_load_failure, vendor_call_error, TrackingError, TrackingResult,
};
use crate::tracking::logger::LOGGER;
use crate::tracking::metadata::PageMetadata;
use crate::tracking::plugin::{PluginHost, TrackingMember, TrackingPlugin};
use crate::tracking::script::{ScriptInjector, ScriptLoadSignal};

/// Appends `<script async src=URL>` to the document head.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebScriptInjector;

impl ScriptInjector for WebScriptInjector {
    fn inject(&self, url: &str, signal: ScriptLoadSignal) -> TrackingResult<()> {
        let window =
            web_sys::window().ok_or_else(|| script_load_failure("Window not available"))?;
        let document = window
            .document()
            .ok_or_else(|| script_load_failure("Document not available"))?;

        let script = document
            .create_element("script")
            .map_err(|err| script_load_failure(format!("Failed to create script: {err:?}")))?
            .dyn_into::<web_sys::HtmlScriptElement>()
            .map_err(|_| script_load_failure("Script element has wrong type"))?;
        script.set_src(url);
        script.set_async(true);

        let loaded = signal.clone();
        let onload = Closure::wrap(Box::new(move || {
            loaded.resolve();
        }) as Box<dyn FnMut()>);

        let failed = signal;
        let url_string = url.to_string();
        let onerror = Closure::wrap(Box::new(move |event: JsValue| {
            LOGGER.debug(format!("Vendor script error event: {event:?}"));
            failed.reject(script_load_failure(format!(
                "Failed to load vendor script: {url_string}"
            )));
        }) as Box<dyn FnMut(JsValue)>);

        script.set_onload(Some(onload.as_ref().unchecked_ref()));
        script.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        onload.forget();
        onerror.forget();

        if let Some(head) = document.head() {
            head.append_child(&script).map_err(|err| {
                script_load_failure(format!("Failed to append script to <head>: {err:?}"))
            })?;
        } else if let Some(body) = document.body() {
            body.append_child(&script).map_err(|err| {
                script_load_failure(format!("Failed to append script to <body>: {err:?}"))
            })?;
        } else {
            return Err(script_load_failure("No <head> or <body> element found"));
        }
        Ok(())
    }
}

/// Environment backed by the page's global objects.
#[derive(Clone, Debug, Default)]
pub struct WebEnvironment {
    globals: GlobalNames,
}

impl WebEnvironment {
    pub fn new(globals: GlobalNames) -> Self {
        Self { globals }
    }
}

impl TrackingEnvironment for WebEnvironment {
    fn vendor(&self) -> Option<Arc<dyn VendorTracker>> {
        global_object(&self.globals.vendor)?;
        Some(Arc::new(WebVendorTracker {
            global: self.globals.vendor.clone(),
        }))
    }

    fn page_metadata(&self) -> Option<PageMetadata> {
        let value = global_object(&self.globals.digital_data)?;
        match js_to_json(&value) {
            Ok(json) => Some(PageMetadata::from_value(&json)),
            Err(err) => {
                LOGGER.debug(format!("`{}` is unreadable: {err}", self.globals.digital_data));
                Some(PageMetadata::default())
            }
        }
    }

    fn publish(&self, config: &AnalyticsConfig, metadata: &PageMetadata) -> TrackingResult<()> {
        set_global(&self.globals.config, config)?;
        set_global(&self.globals.digital_data, metadata)
    }
}

/// Looks the vendor object up on every call so a reloaded vendor is picked up.
struct WebVendorTracker {
    global: String,
}

impl WebVendorTracker {
    fn method(&self, name: &str) -> TrackingResult<(JsValue, Function)> {
        let target = global_object(&self.global)
            .ok_or_else(|| vendor_call_error(format!("`{}` is not defined", self.global)))?;
        let method = Reflect::get(&target, &JsValue::from_str(name))
            .map_err(|err| vendor_call_error(format!("Failed to access {name}(): {err:?}")))?
            .dyn_into::<Function>()
            .map_err(|_| vendor_call_error(format!("{name}() is not a function")))?;
        Ok((target, method))
    }
}

impl VendorTracker for WebVendorTracker {
    fn page_event(&self, category: &str, route: &str, options: &Value) -> TrackingResult<()> {
        let (target, method) = self.method("pageEvent")?;
        method
            .call3(
                &target,
                &JsValue::from_str(category),
                &JsValue::from_str(route),
                &json_to_js(options)?,
            )
            .map_err(|err| vendor_call_error(format!("pageEvent() threw: {err:?}")))?;
        Ok(())
    }

    fn track_event(&self, name: &str, payload: &Value) -> TrackingResult<()> {
        let (target, method) = self.method("trackEvent")?;
        method
            .call2(&target, &JsValue::from_str(name), &json_to_js(payload)?)
            .map_err(|err| vendor_call_error(format!("trackEvent() threw: {err:?}")))?;
        Ok(())
    }
}

/// Installs members as functions on a JS object, such as a framework's global properties.
pub struct ObjectPluginHost {
    target: Object,
}

impl ObjectPluginHost {
    pub fn new(target: Object) -> Self {
        Self { target }
    }
}

impl PluginHost for ObjectPluginHost {
    fn register_member(&mut self, name: &str, member: TrackingMember) {
        let function = Closure::<dyn Fn(JsValue, JsValue) -> Result<(), JsValue>>::new(
            move |first: JsValue, second: JsValue| {
                let mut args = Vec::with_capacity(2);
                for arg in [first, second] {
                    if arg.is_undefined() {
                        break;
                    }
                    args.push(js_to_json(&arg).map_err(to_js_error)?);
                }
                member(&args).map_err(to_js_error)
            },
        )
        .into_js_value();

        if let Err(err) = Reflect::set(&self.target, &JsValue::from_str(name), &function) {
            LOGGER.warn(format!("Failed to register member `{name}`: {err:?}"));
        }
    }
}

/// JavaScript entry point: initializes tracking for the current page and installs the three
/// members on `target`. Options missing from `options` are read from the host environment.
#[wasm_bindgen(js_name = installTracking)]
pub fn install_tracking(target: Object, options: JsValue) -> Result<(), JsValue> {
    let options = if options.is_undefined() || options.is_null() {
        TrackingOptions::from_environment()
    } else {
        js_to_json(&options).and_then(TrackingOptions::from_json)
    }
    .map_err(to_js_error)?;

    if !is_browser() {
        LOGGER.warn("installTracking called outside a browser window; tracking stays inactive");
    }
    let context = TrackingContext::browser(options.globals.clone());
    let mut host = ObjectPluginHost::new(target);
    TrackingPlugin::new(options)
        .install(&mut host, &context)
        .map(|_| ())
        .map_err(to_js_error)
}

fn global_object(name: &str) -> Option<JsValue> {
    let value = Reflect::get(&js_sys::global(), &JsValue::from_str(name)).ok()?;
    if value.is_null() || value.is_undefined() {
        None
    } else {
        Some(value)
    }
}

fn set_global<T: Serialize>(name: &str, value: &T) -> TrackingResult<()> {
    let json = serde_json::to_value(value)
        .map_err(|err| internal_error(format!("Failed to encode `{name}`: {err}")))?;
    Reflect::set(&js_sys::global(), &JsValue::from_str(name), &json_to_js(&json)?)
        .map_err(|err| internal_error(format!("Failed to set `{name}`: {err:?}")))?;
    Ok(())
}

fn json_to_js(value: &Value) -> TrackingResult<JsValue> {
    js_sys::JSON::parse(&value.to_string())
        .map_err(|err| internal_error(format!("Failed to convert payload: {err:?}")))
}

fn js_to_json(value: &JsValue) -> TrackingResult<Value> {
    if let Some(text) = value.as_string() {
        return Ok(Value::String(text));
    }
    let serialized = js_sys::JSON::stringify(value)
        .map_err(|err| internal_error(format!("Failed to serialize value: {err:?}")))?
        .as_string()
        .unwrap_or_default();
    if serialized.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&serialized)
        .map_err(|err| internal_error(format!("Failed to parse value: {err}")))
}

fn to_js_error(err: TrackingError) -> JsValue {
    let error = js_sys::Error::new(&err.to_string());
    error.set_name(err.code_str());
    error.into()
}
