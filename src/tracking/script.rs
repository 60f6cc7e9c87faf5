//! One-time vendor script injection.
//!
//! A [`ScriptLoader`] owns at most one [`ScriptLoadSignal`]. The first call to
//! [`ScriptLoader::ensure_loaded`] creates it and asks the [`ScriptInjector`] to insert the
//! script tag; every later call hands back the same signal without touching the document.
//! [`ensure_vendor_script_loaded`] goes through the process-wide loader.

use std::fmt;
use std::future::IntoFuture;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared};

use crate::tracking::error::{script_load_failure, TrackingError, TrackingResult};
use crate::tracking::logger::LOGGER;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptLoadState {
    Unstarted,
    Pending,
    Resolved,
    Rejected(TrackingError),
}

type Continuation = Box<dyn FnOnce(&TrackingResult<()>) + Send + 'static>;

/// Future returned by [`ScriptLoadSignal::wait`]. Every clone completes with the same outcome.
pub type ScriptLoadWait = Shared<BoxFuture<'static, TrackingResult<()>>>;

/// Shared completion token for the vendor script request.
#[derive(Clone)]
pub struct ScriptLoadSignal {
    inner: Arc<SignalInner>,
}

struct SignalInner {
    url: String,
    completion: ScriptLoadWait,
    state: Mutex<SignalState>,
}

struct SignalState {
    sender: Option<oneshot::Sender<TrackingResult<()>>>,
    // Kept for synchronous inspection: `Shared::peek` stays empty until someone polls.
    outcome: Option<TrackingResult<()>>,
    continuations: Vec<Continuation>,
}

impl fmt::Debug for ScriptLoadSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptLoadSignal")
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .finish()
    }
}

impl ScriptLoadSignal {
    fn pending(url: &str) -> Self {
        let (sender, receiver) = oneshot::channel::<TrackingResult<()>>();
        let completion = receiver
            .map(|received| {
                received
                    .unwrap_or_else(|_| Err(script_load_failure("Script loading channel dropped")))
            })
            .boxed()
            .shared();
        Self {
            inner: Arc::new(SignalInner {
                url: url.to_string(),
                completion,
                state: Mutex::new(SignalState {
                    sender: Some(sender),
                    outcome: None,
                    continuations: Vec::new(),
                }),
            }),
        }
    }

    /// URL requested by the call that created this signal.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> ScriptLoadState {
        match self.outcome() {
            None => ScriptLoadState::Pending,
            Some(Ok(())) => ScriptLoadState::Resolved,
            Some(Err(err)) => ScriptLoadState::Rejected(err),
        }
    }

    pub fn outcome(&self) -> Option<TrackingResult<()>> {
        if let Some(outcome) = self.inner.completion.peek() {
            return Some(outcome.clone());
        }
        self.lock().outcome.clone()
    }

    pub fn is_settled(&self) -> bool {
        self.outcome().is_some()
    }

    /// Returns `true` when both handles refer to the same underlying request.
    pub fn ptr_eq(&self, other: &ScriptLoadSignal) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Registers a continuation. It runs once, immediately if the signal has already settled.
    pub fn on_settled<F>(&self, callback: F)
    where
        F: FnOnce(&TrackingResult<()>) + Send + 'static,
    {
        let mut state = self.lock();
        match state.outcome.clone() {
            Some(outcome) => {
                drop(state);
                callback(&outcome);
            }
            None => state.continuations.push(Box::new(callback)),
        }
    }

    /// Future resolving with the load outcome.
    pub fn wait(&self) -> ScriptLoadWait {
        self.inner.completion.clone()
    }

    /// Marks the script as loaded. Returns `false` if the signal had already settled.
    pub fn resolve(&self) -> bool {
        self.settle(Ok(()))
    }

    /// Marks the script as failed. Returns `false` if the signal had already settled.
    pub fn reject(&self, error: TrackingError) -> bool {
        self.settle(Err(error))
    }

    fn settle(&self, outcome: TrackingResult<()>) -> bool {
        let continuations = {
            let mut state = self.lock();
            let Some(sender) = state.sender.take() else {
                return false;
            };
            state.outcome = Some(outcome.clone());
            // The receiver lives in `completion`, which this signal still owns.
            let _ = sender.send(outcome.clone());
            std::mem::take(&mut state.continuations)
        };

        match &outcome {
            Ok(()) => LOGGER.debug(format!("Vendor script loaded: {}", self.inner.url)),
            Err(err) => LOGGER.debug(format!("Vendor script failed: {err}")),
        }

        for continuation in continuations {
            continuation(&outcome);
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl IntoFuture for ScriptLoadSignal {
    type Output = TrackingResult<()>;
    type IntoFuture = ScriptLoadWait;

    fn into_future(self) -> Self::IntoFuture {
        self.wait()
    }
}

/// Inserts the vendor `<script>` element and settles `signal` when the browser reports the
/// outcome. Returning an error rejects the signal.
pub trait ScriptInjector: Send + Sync {
    fn inject(&self, url: &str, signal: ScriptLoadSignal) -> TrackingResult<()>;
}

pub struct ScriptLoader {
    injector: Arc<dyn ScriptInjector>,
    signal: Mutex<Option<ScriptLoadSignal>>,
}

impl fmt::Debug for ScriptLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptLoader")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
fn default_injector() -> Arc<dyn ScriptInjector> {
    Arc::new(crate::tracking::web::WebScriptInjector)
}

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
fn default_injector() -> Arc<dyn ScriptInjector> {
    Arc::new(UnsupportedScriptInjector)
}

static SHARED_LOADER: LazyLock<Arc<ScriptLoader>> =
    LazyLock::new(|| Arc::new(ScriptLoader::new(default_injector())));

impl ScriptLoader {
    pub fn new(injector: Arc<dyn ScriptInjector>) -> Self {
        Self {
            injector,
            signal: Mutex::new(None),
        }
    }

    /// Process-wide loader backed by the platform's default injector.
    pub fn shared() -> Arc<ScriptLoader> {
        SHARED_LOADER.clone()
    }

    /// Requests the vendor script once and returns the shared signal.
    pub fn ensure_loaded(&self, url: &str) -> ScriptLoadSignal {
        let signal = {
            let mut guard = self
                .signal
                .lock()
                .unwrap_or_else(|poison| poison.into_inner());
            if let Some(existing) = guard.as_ref() {
                if existing.url() != url {
                    LOGGER.debug(format!(
                        "Vendor script already requested from `{}`; ignoring `{url}`",
                        existing.url()
                    ));
                }
                return existing.clone();
            }
            let signal = ScriptLoadSignal::pending(url);
            *guard = Some(signal.clone());
            signal
        };

        if url.is_empty() {
            LOGGER.warn("Injecting vendor script with an empty source URL");
        }
        if let Err(err) = self.injector.inject(url, signal.clone()) {
            LOGGER.warn(format!("Vendor script injection failed: {err}"));
            signal.reject(err);
        }
        signal
    }

    pub fn signal(&self) -> Option<ScriptLoadSignal> {
        self.signal
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    pub fn state(&self) -> ScriptLoadState {
        self.signal()
            .map(|signal| signal.state())
            .unwrap_or(ScriptLoadState::Unstarted)
    }
}

/// Requests the vendor script through the process-wide loader.
pub fn ensure_vendor_script_loaded(url: &str) -> ScriptLoadSignal {
    ScriptLoader::shared().ensure_loaded(url)
}

/// Default injector on targets without a document.
#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
#[derive(Clone, Copy, Debug, Default)]
pub struct UnsupportedScriptInjector;

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
impl ScriptInjector for UnsupportedScriptInjector {
    fn inject(&self, _url: &str, _signal: ScriptLoadSignal) -> TrackingResult<()> {
        Err(script_load_failure(
            "Script injection requires the `wasm-web` feature and a WebAssembly target",
        ))
    }
}

/// A `<script>` element as it would be written into the document head.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptTag {
    pub src: String,
    pub async_load: bool,
}

impl ScriptTag {
    pub fn to_html(&self) -> String {
        if self.async_load {
            format!("<script async src=\"{}\"></script>", self.src)
        } else {
            format!("<script src=\"{}\"></script>", self.src)
        }
    }
}

/// Injector that records tags in memory, for server-rendered heads and tests. Signals stay
/// pending until [`complete`](Self::complete) or [`fail`](Self::fail) is called.
#[derive(Default)]
pub struct MemoryScriptInjector {
    injected: Mutex<Vec<(ScriptTag, ScriptLoadSignal)>>,
}

impl MemoryScriptInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tags(&self) -> Vec<ScriptTag> {
        self.entries().iter().map(|(tag, _)| tag.clone()).collect()
    }

    pub fn injection_count(&self) -> usize {
        self.entries().len()
    }

    /// Resolves every signal waiting on `url`. Returns how many were settled.
    pub fn complete(&self, url: &str) -> usize {
        self.settle(url, |signal| signal.resolve())
    }

    /// Rejects every signal waiting on `url` with a `ScriptLoadFailure`.
    pub fn fail(&self, url: &str, message: &str) -> usize {
        let message = message.to_string();
        self.settle(url, move |signal| {
            signal.reject(script_load_failure(message.clone()))
        })
    }

    fn settle<F>(&self, url: &str, action: F) -> usize
    where
        F: Fn(&ScriptLoadSignal) -> bool,
    {
        let matching: Vec<ScriptLoadSignal> = self
            .entries()
            .iter()
            .filter(|(tag, _)| tag.src == url)
            .map(|(_, signal)| signal.clone())
            .collect();
        matching.iter().filter(|signal| action(signal)).count()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<(ScriptTag, ScriptLoadSignal)>> {
        self.injected
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl ScriptInjector for MemoryScriptInjector {
    fn inject(&self, url: &str, signal: ScriptLoadSignal) -> TrackingResult<()> {
        let tag = ScriptTag {
            src: url.to_string(),
            async_load: true,
        };
        self.entries().push((tag, signal));
        Ok(())
    }
}
