//! Registration of the tracking helpers on a host application's extensibility point.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::tracking::api::{track_click_event, track_page, track_search_term, ClickEventParams};
use crate::tracking::constants::{
    TRACK_CLICK_EVENT_MEMBER, TRACK_PAGE_MEMBER, TRACK_SEARCH_TERM_MEMBER,
};
use crate::tracking::config::TrackingOptions;
use crate::tracking::context::{configure_analytics_with_flags, TrackingContext};
use crate::tracking::error::{invalid_argument, TrackingResult};
use crate::tracking::logger::LOGGER;
use crate::tracking::script::ScriptLoadSignal;

/// Callable member installed on the host. Arguments arrive as JSON values in call order.
pub type TrackingMember = Arc<dyn Fn(&[Value]) -> TrackingResult<()> + Send + Sync + 'static>;

/// Extensibility point of the host application framework.
pub trait PluginHost {
    fn register_member(&mut self, name: &str, member: TrackingMember);
}

/// In-process member table.
#[derive(Clone, Default)]
pub struct MemberRegistry {
    members: BTreeMap<String, TrackingMember>,
}

impl fmt::Debug for MemberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberRegistry")
            .field("members", &self.names())
            .finish()
    }
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.members.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<TrackingMember> {
        self.members.get(name).cloned()
    }

    pub fn call(&self, name: &str, args: &[Value]) -> TrackingResult<()> {
        let member = self
            .members
            .get(name)
            .ok_or_else(|| invalid_argument(format!("No member named `{name}` is registered")))?;
        member(args)
    }
}

impl PluginHost for MemberRegistry {
    fn register_member(&mut self, name: &str, member: TrackingMember) {
        if self.members.insert(name.to_string(), member).is_some() {
            LOGGER.debug(format!("Replaced previously registered member `{name}`"));
        }
    }
}

/// Installs the configuration, the vendor script and the three tracking members.
#[derive(Clone, Debug)]
pub struct TrackingPlugin {
    options: TrackingOptions,
}

impl TrackingPlugin {
    pub fn new(options: TrackingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TrackingOptions {
        &self.options
    }

    /// Runs initialization and registers the members. The returned signal may be awaited or
    /// ignored; a load failure is logged either way.
    pub fn install<H>(
        &self,
        host: &mut H,
        context: &TrackingContext,
    ) -> TrackingResult<ScriptLoadSignal>
    where
        H: PluginHost + ?Sized,
    {
        let (key, script_url) = self.options.validate()?;

        configure_analytics_with_flags(context, key, self.options.flags);

        let signal = context.ensure_vendor_script_loaded(script_url);
        signal.on_settled(|outcome| {
            if let Err(err) = outcome {
                LOGGER.warn(format!("Analytics vendor script unavailable: {err}"));
            }
        });

        for (name, member) in tracking_members(context) {
            host.register_member(name, member);
        }
        LOGGER.debug("Tracking members registered");
        Ok(signal)
    }
}

/// Builds the three members bound to `context`.
pub fn tracking_members(context: &TrackingContext) -> Vec<(&'static str, TrackingMember)> {
    let click_context = context.clone();
    let page_context = context.clone();
    let search_context = context.clone();

    let track_click: TrackingMember = Arc::new(move |args: &[Value]| {
        let params = args
            .first()
            .map(ClickEventParams::from)
            .unwrap_or(ClickEventParams::Structured { action: None });
        track_click_event(&click_context, params)
    });
    let track_page_member: TrackingMember = Arc::new(move |args: &[Value]| {
        let title = string_arg(args, 0, TRACK_PAGE_MEMBER, "title")?;
        track_page(&page_context, title)
    });
    let track_search: TrackingMember = Arc::new(move |args: &[Value]| {
        let component = string_arg(args, 0, TRACK_SEARCH_TERM_MEMBER, "searchComponent")?;
        let term = string_arg(args, 1, TRACK_SEARCH_TERM_MEMBER, "searchTerm")?;
        track_search_term(&search_context, component, term)
    });

    vec![
        (TRACK_CLICK_EVENT_MEMBER, track_click),
        (TRACK_PAGE_MEMBER, track_page_member),
        (TRACK_SEARCH_TERM_MEMBER, track_search),
    ]
}

fn string_arg<'a>(
    args: &'a [Value],
    index: usize,
    member: &str,
    name: &str,
) -> TrackingResult<&'a str> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        invalid_argument(format!("`{member}` expects `{name}` to be a string"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingVendor, VendorCall};
    use crate::tracking::environment::{MemoryEnvironment, TrackingEnvironment};
    use crate::tracking::error::TrackingErrorCode;
    use crate::tracking::metadata::PageMetadata;
    use crate::tracking::script::{MemoryScriptInjector, ScriptLoadState, ScriptLoader};
    use serde_json::json;

    const URL: &str = "https://cdn.example.com/tracker.js";

    struct Fixture {
        environment: Arc<MemoryEnvironment>,
        injector: Arc<MemoryScriptInjector>,
        vendor: RecordingVendor,
        context: TrackingContext,
    }

    fn fixture() -> Fixture {
        let vendor = RecordingVendor::default();
        let environment = Arc::new(MemoryEnvironment::new().with_vendor(Arc::new(vendor.clone())));
        let injector = Arc::new(MemoryScriptInjector::new());
        let loader = Arc::new(ScriptLoader::new(injector.clone()));
        let context = TrackingContext::with_script_loader(environment.clone(), loader);
        Fixture {
            environment,
            injector,
            vendor,
            context,
        }
    }

    #[test]
    fn install_registers_three_members() {
        let fixture = fixture();
        let mut registry = MemberRegistry::new();
        let signal = TrackingPlugin::new(TrackingOptions::new("key", URL))
            .install(&mut registry, &fixture.context)
            .unwrap();

        assert_eq!(
            registry.names(),
            vec!["trackClickEvent", "trackPage", "trackSearchTerm"]
        );
        assert_eq!(signal.state(), ScriptLoadState::Pending);
        assert_eq!(fixture.environment.analytics_config().unwrap().key, "key");
    }

    #[test]
    fn installing_twice_injects_once() {
        let fixture = fixture();
        let plugin = TrackingPlugin::new(TrackingOptions::new("key", URL));
        let first = plugin
            .install(&mut MemberRegistry::new(), &fixture.context)
            .unwrap();
        let second = plugin
            .install(&mut MemberRegistry::new(), &fixture.context)
            .unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(fixture.injector.injection_count(), 1);
    }

    #[test]
    fn invalid_options_register_nothing() {
        let fixture = fixture();
        let mut registry = MemberRegistry::new();
        let err = TrackingPlugin::new(TrackingOptions::new("key", ""))
            .install(&mut registry, &fixture.context)
            .unwrap_err();

        assert_eq!(err.code, TrackingErrorCode::InvalidArgument);
        assert!(registry.names().is_empty());
        assert_eq!(fixture.injector.injection_count(), 0);
        assert!(fixture.environment.analytics_config().is_none());
    }

    #[test]
    fn key_is_written_as_supplied_even_when_empty() {
        for key in ["", "  site-key "] {
            let fixture = fixture();
            let mut registry = MemberRegistry::new();
            TrackingPlugin::new(TrackingOptions::new(key, URL))
                .install(&mut registry, &fixture.context)
                .unwrap();

            assert_eq!(fixture.environment.analytics_config().unwrap().key, key);
            assert_eq!(registry.names().len(), 3);
            assert_eq!(fixture.injector.injection_count(), 1);
        }
    }

    #[test]
    fn members_forward_through_the_context() {
        let fixture = fixture();
        let mut registry = MemberRegistry::new();
        TrackingPlugin::new(TrackingOptions::new("key", URL))
            .install(&mut registry, &fixture.context)
            .unwrap();
        fixture
            .environment
            .set_page_metadata(Some(PageMetadata::new("Docs", "Reference")));

        registry.call("trackPage", &[json!("Intro")]).unwrap();
        registry
            .call("trackClickEvent", &[json!("{\"action\":\"Subscribe\"}")])
            .unwrap();
        registry
            .call("trackSearchTerm", &[json!("navbar"), json!("traits")])
            .unwrap();

        let calls = fixture.vendor.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(
            &calls[0],
            VendorCall::PageEvent { category, .. } if category == "Reference"
        ));
        assert_eq!(
            calls[1],
            VendorCall::TrackEvent {
                name: "CTA Clicked".into(),
                payload: json!({
                    "CTA": "Subscribe",
                    "productTitle": "Docs",
                    "category": "Reference"
                }),
            }
        );
    }

    #[test]
    fn members_validate_argument_shapes() {
        let fixture = fixture();
        let mut registry = MemberRegistry::new();
        TrackingPlugin::new(TrackingOptions::new("key", URL))
            .install(&mut registry, &fixture.context)
            .unwrap();

        let err = registry.call("trackPage", &[json!(12)]).unwrap_err();
        assert_eq!(err.code, TrackingErrorCode::InvalidArgument);
        let err = registry
            .call("trackSearchTerm", &[json!("navbar")])
            .unwrap_err();
        assert!(err.message().contains("searchTerm"));
        assert!(registry.call("trackEverything", &[]).is_err());

        registry.call("trackClickEvent", &[]).unwrap();
        assert!(fixture.vendor.calls().len() == 1);
    }

    #[test]
    fn members_surface_missing_metadata_fields() {
        let fixture = fixture();
        let mut registry = MemberRegistry::new();
        TrackingPlugin::new(TrackingOptions::new("key", URL))
            .install(&mut registry, &fixture.context)
            .unwrap();
        fixture
            .environment
            .set_page_metadata(Some(PageMetadata::default().with_category("Reference")));

        let err = registry.call("trackPage", &[json!("Intro")]).unwrap_err();
        assert!(err.is_missing_configuration());
        assert!(fixture.vendor.calls().is_empty());
        assert!(fixture.environment.page_metadata().is_some());
    }
}
