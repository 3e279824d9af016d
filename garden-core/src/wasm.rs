//! WASM bindings for the garden-core library.
//!
//! `GardenHandle` is the only type exposed to JavaScript. The page does the
//! fetching and hands response bodies in; the handle drives the canvas from
//! its own `requestAnimationFrame` loop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::Function;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, Window};

use crate::config::GardenConfig;
use crate::controller::{EventQueue, GardenEvent, GraphController};
use crate::error::GardenError;
use crate::filter::FilterState;
use crate::frame_loop::{FrameLoop, FrameScheduler};
use crate::render::CanvasSurface;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    pub fn console_log(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = warn)]
    pub fn console_warn(s: &str);

    #[wasm_bindgen(js_namespace = console, js_name = error)]
    pub fn console_error(s: &str);
}

fn to_js(err: GardenError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// `requestAnimationFrame` against a callback the handle keeps alive.
struct AnimationFrameScheduler {
    window: Window,
    callback: FrameCallback,
}

impl FrameScheduler for AnimationFrameScheduler {
    type Handle = i32;

    fn request(&mut self) -> Option<i32> {
        let callback = self.callback.borrow();
        let closure = callback.as_ref()?;
        match self.window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(id) => Some(id),
            Err(e) => {
                log::error!("requestAnimationFrame failed: {:?}", e);
                None
            }
        }
    }

    fn cancel(&mut self, handle: i32) {
        if let Err(e) = self.window.cancel_animation_frame(handle) {
            log::debug!("cancelAnimationFrame failed: {:?}", e);
        }
    }
}

#[derive(Default)]
struct Callbacks {
    node_selected: Option<Function>,
    refresh_requested: Option<Function>,
    filter_changed: Option<Function>,
}

struct Inner {
    controller: GraphController<CanvasSurface>,
    frame_loop: FrameLoop<AnimationFrameScheduler>,
    events: EventQueue,
    callbacks: Callbacks,
}

#[wasm_bindgen]
pub struct GardenHandle {
    inner: Rc<RefCell<Inner>>,
}

/// Deliver queued controller events to the registered JS callbacks. Runs with
/// no borrow held so callbacks may call back into the handle.
fn flush(inner: &Rc<RefCell<Inner>>) {
    let pending: Vec<(Function, JsValue)> = {
        let state = inner.borrow();
        state
            .events
            .drain()
            .into_iter()
            .filter_map(|event| {
                let (callback, arg) = match event {
                    GardenEvent::NodeSelected(id) => (
                        state.callbacks.node_selected.as_ref(),
                        id.map_or(JsValue::NULL, |id| JsValue::from_str(&id)),
                    ),
                    GardenEvent::RefreshRequested => (state.callbacks.refresh_requested.as_ref(), JsValue::UNDEFINED),
                    GardenEvent::FilterChanged(filter) => {
                        let json = serde_json::to_string(&filter).unwrap_or_default();
                        let arg = js_sys::JSON::parse(&json).unwrap_or(JsValue::from_str(&json));
                        (state.callbacks.filter_changed.as_ref(), arg)
                    }
                };
                callback.map(|f| (f.clone(), arg))
            })
            .collect()
    };
    for (callback, arg) in pending {
        if let Err(e) = callback.call1(&JsValue::NULL, &arg) {
            console_error(&format!("garden callback threw: {:?}", e));
        }
    }
}

fn run_frame(weak: &Weak<RefCell<Inner>>, time_ms: f64) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    {
        let mut state = inner.borrow_mut();
        if state.frame_loop.on_frame() {
            state.controller.frame(time_ms);
        }
    }
    flush(&inner);
}

impl GardenHandle {
    fn with<T>(&self, f: impl FnOnce(&mut GraphController<CanvasSurface>) -> T) -> T {
        let out = f(&mut self.inner.borrow_mut().controller);
        flush(&self.inner);
        out
    }
}

#[wasm_bindgen]
impl GardenHandle {
    /// Bind to a canvas. `config_json` may be empty or a partial config.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config_json: &str) -> Result<GardenHandle, JsValue> {
        crate::logger::init();

        let mut config = GardenConfig::from_json(config_json).map_err(to_js)?;
        if config_json.trim().is_empty() {
            config.canvas.width = f64::from(canvas.width());
            config.canvas.height = f64::from(canvas.height());
        }
        let window = web_sys::window().ok_or_else(|| to_js(GardenError::canvas("no window")))?;
        let surface = CanvasSurface::new(canvas).map_err(to_js)?;

        let events = EventQueue::new();
        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let inner = Rc::new(RefCell::new(Inner {
            controller: GraphController::new(surface, config, Box::new(events.clone())),
            frame_loop: FrameLoop::new(AnimationFrameScheduler { window, callback: callback.clone() }),
            events,
            callbacks: Callbacks::default(),
        }));

        let weak = Rc::downgrade(&inner);
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |t: f64| run_frame(&weak, t)) as Box<dyn FnMut(f64)>));

        log::info!("memory garden ready");
        Ok(GardenHandle { inner })
    }

    pub fn start(&self) {
        let mut state = self.inner.borrow_mut();
        state.controller.render(0.0);
        state.frame_loop.start();
    }

    pub fn stop(&self) {
        self.inner.borrow_mut().frame_loop.stop();
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.inner.borrow().frame_loop.is_running()
    }

    /// Graph endpoint body. On error the previous graph keeps animating.
    pub fn load_graph(&self, json: &str) -> Result<(), JsValue> {
        self.with(|c| c.apply_graph_json(json)).map_err(to_js)
    }

    pub fn load_memories(&self, json: &str) -> Result<(), JsValue> {
        self.with(|c| c.apply_memories_json(json)).map_err(to_js)
    }

    pub fn fetch_failed(&self, message: &str) {
        self.with(|c| c.fetch_failed(message));
    }

    pub fn request_refresh(&self) -> bool {
        self.with(|c| c.request_refresh())
    }

    pub fn pointer_move(&self, x: f64, y: f64) -> bool {
        self.with(|c| c.pointer_move(x, y))
    }

    pub fn pointer_click(&self, x: f64, y: f64) {
        self.with(|c| {
            c.pointer_click(x, y);
        });
    }

    pub fn pointer_leave(&self) {
        self.with(|c| {
            c.pointer_leave();
        });
    }

    pub fn cursor(&self) -> String {
        self.inner.borrow().controller.cursor().as_css().to_string()
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.with(|c| c.resize(width, height));
    }

    /// `{"category": "person"|"all", "sentiment": ..., "searchTerm": ...}`
    pub fn set_filter(&self, json: &str) -> Result<(), JsValue> {
        let filter: FilterState = serde_json::from_str(json).map_err(|e| to_js(e.into()))?;
        self.with(|c| c.set_filter(filter));
        Ok(())
    }

    pub fn filtered_memories(&self) -> String {
        let out = self.inner.borrow().controller.filtered_memories();
        serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn select_memory(&self, id: &str) -> Result<(), JsValue> {
        self.with(|c| c.select_memory(id)).map_err(to_js)
    }

    pub fn clear_selection(&self) {
        self.with(|c| {
            c.clear_selection();
        });
    }

    pub fn snapshot(&self) -> String {
        let out = self.inner.borrow().controller.snapshot();
        serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
    }

    /// Called with the node id, or `null` when the selection clears.
    pub fn on_node_selected(&self, callback: Function) {
        self.inner.borrow_mut().callbacks.node_selected = Some(callback);
    }

    pub fn on_refresh_requested(&self, callback: Function) {
        self.inner.borrow_mut().callbacks.refresh_requested = Some(callback);
    }

    /// Called with the new filter object.
    pub fn on_filter_changed(&self, callback: Function) {
        self.inner.borrow_mut().callbacks.filter_changed = Some(callback);
    }
}

impl Drop for GardenHandle {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.try_borrow_mut() {
            state.frame_loop.stop();
        }
    }
}
