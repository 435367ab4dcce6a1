//! # Application Core (`app.rs`)
//!
//! The `App` struct is the `winit` application handler. It owns the window, the egui state,
//! the keyboard [`Controls`] and, once the GPU is up, the [`Renderer`].
//!
//! ## Platform Notes
//!
//! - **Desktop**: the renderer is created synchronously with `pollster` when the window opens.
//!   A failure is logged and ends the event loop.
//! - **WebAssembly**: the window wraps the `canvas` element of the page and the renderer is
//!   created in a spawned future. It arrives through a `oneshot` channel and is picked up by the
//!   next window event.
//!
//! ## Input
//!
//! Keys are routed to egui first. Keys egui does not consume go to [`Controls`]; releases
//! reach it either way, so a key let go while a slider has focus stops moving the object. Discrete
//! commands (exit, reset, demo selection) are handled immediately, held keys turn into the
//! per-frame [`crate::controls::Motion`] passed to the renderer. Losing focus releases every
//! held key so nothing keeps moving while the window is in the background.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use std::sync::Arc;

use web_time::Instant;

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    window::{Theme, Window},
};

use crate::assets::Assets;
use crate::config::Config;
use crate::controls::{Action, Controls};
use crate::demo::Demo;
use crate::renderer::Renderer;
use crate::scene::{VolumeSettings, MAX_STEPS};

pub struct App {
    /// The main window; on the web it wraps the page canvas.
    window: Option<Arc<Window>>,

    /// `None` until the GPU is initialized.
    renderer: Option<Renderer>,

    gui_state: Option<egui_winit::State>,

    last_render_time: Option<Instant>,

    #[cfg(target_arch = "wasm32")]
    renderer_receiver: Option<futures::channel::oneshot::Receiver<Renderer>>,

    last_size: (u32, u32),

    /// Handed to the renderer when the first window opens.
    assets: Option<Assets>,

    controls: Controls,

    config: Config,

    /// Whether the settings window is shown.
    panels_visible: bool,
}

impl App {
    pub fn new(config: Config, assets: Assets) -> Self {
        Self {
            window: None,
            renderer: None,
            gui_state: None,
            last_render_time: None,
            #[cfg(target_arch = "wasm32")]
            renderer_receiver: None,
            last_size: (config.width, config.height),
            assets: Some(assets),
            controls: Controls::default(),
            config,
            panels_visible: true,
        }
    }

    fn settings(&self) -> VolumeSettings {
        VolumeSettings {
            steps: self.config.steps,
            density: self.config.density,
            threshold: self.config.threshold,
        }
    }

    fn window_title(demo: Demo) -> String {
        format!("Raycast - {}", demo.title())
    }

    /// Applies a command from the keyboard or the overlay.
    fn perform(&mut self, action: Action, event_loop: &winit::event_loop::ActiveEventLoop) {
        match action {
            Action::Exit => {
                log::info!("Exit requested");
                event_loop.exit();
            }
            Action::Reset => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.scene_mut().transform.reset();
                }
            }
            Action::SelectDemo(demo) => {
                let Some(renderer) = self.renderer.as_mut() else {
                    return;
                };
                match renderer.set_demo(demo) {
                    Ok(()) => {
                        if let Some(window) = self.window.as_ref() {
                            window.set_title(&Self::window_title(demo));
                        }
                    }
                    Err(error) => log::error!("Failed to switch to demo '{demo}': {error:#}"),
                }
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let mut attributes = Window::default_attributes();

        #[cfg(not(target_arch = "wasm32"))]
        {
            attributes = attributes
                .with_title(Self::window_title(self.config.demo))
                .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        }

        #[allow(unused_assignments)]
        #[cfg(target_arch = "wasm32")]
        let mut canvas_width = 0;

        #[allow(unused_assignments)]
        #[cfg(target_arch = "wasm32")]
        let mut canvas_height = 0;

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            // The page must provide a <canvas id="canvas">.
            let Some(canvas) = wgpu::web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id("canvas"))
                .and_then(|element| element.dyn_into::<wgpu::web_sys::HtmlCanvasElement>().ok())
            else {
                log::error!("No canvas element with id 'canvas' found");
                event_loop.exit();
                return;
            };
            canvas_width = canvas.width();
            canvas_height = canvas.height();
            self.last_size = (canvas_width, canvas_height);
            attributes = attributes.with_canvas(Some(canvas));
        }

        let window = match event_loop.create_window(attributes) {
            Ok(window) => window,
            Err(error) => {
                log::error!("Failed to create window: {error}");
                event_loop.exit();
                return;
            }
        };

        let Some(assets) = self.assets.take() else {
            return;
        };

        let window_handle = Arc::new(window);
        self.window = Some(window_handle.clone());

        let gui_context = egui::Context::default();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let inner_size = window_handle.inner_size();
            self.last_size = (inner_size.width, inner_size.height);
        }

        #[cfg(target_arch = "wasm32")]
        {
            gui_context.set_pixels_per_point(window_handle.scale_factor() as f32);
        }

        let viewport_id = gui_context.viewport_id();
        let gui_state = egui_winit::State::new(
            gui_context,
            viewport_id,
            &window_handle,
            Some(window_handle.scale_factor() as _),
            Some(Theme::Dark),
            None,
        );

        let demo = self.config.demo;
        let settings = self.settings();

        #[cfg(not(target_arch = "wasm32"))]
        {
            let (width, height) = self.last_size;
            let renderer = pollster::block_on(async move {
                Renderer::new(window_handle.clone(), width, height, demo, assets, settings).await
            });
            match renderer {
                Ok(renderer) => self.renderer = Some(renderer),
                Err(error) => {
                    log::error!("Failed to initialize the renderer: {error:#}");
                    event_loop.exit();
                    return;
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let (sender, receiver) = futures::channel::oneshot::channel();
            self.renderer_receiver = Some(receiver);
            log::info!("Canvas dimensions: ({canvas_width} x {canvas_height})");
            wasm_bindgen_futures::spawn_local(async move {
                let renderer = Renderer::new(
                    window_handle.clone(),
                    canvas_width,
                    canvas_height,
                    demo,
                    assets,
                    settings,
                )
                .await;
                match renderer {
                    Ok(renderer) => {
                        if sender.send(renderer).is_err() {
                            log::error!("Failed to send renderer!");
                        }
                    }
                    Err(error) => log::error!("Failed to initialize the renderer: {error:#}"),
                }
            });
        }

        self.gui_state = Some(gui_state);
        self.last_render_time = Some(Instant::now());
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: winit::event::WindowEvent,
    ) {
        #[cfg(target_arch = "wasm32")]
        {
            let mut renderer_received = false;
            if let Some(receiver) = self.renderer_receiver.as_mut() {
                if let Ok(Some(renderer)) = receiver.try_recv() {
                    self.renderer = Some(renderer);
                    renderer_received = true;
                }
            }
            if renderer_received {
                self.renderer_receiver = None;
            }
        }

        let (Some(gui_state), Some(window)) = (self.gui_state.as_mut(), self.window.clone()) else {
            return;
        };
        if self.renderer.is_none() || self.last_render_time.is_none() {
            return;
        }

        if gui_state.on_window_event(&window, &event).consumed {
            if let WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } = event
            {
                self.controls.handle_captured_key(key_code, state);
            }
            return;
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => {
                if let Some(action) = self.controls.handle_key(key_code, state) {
                    self.perform(action, event_loop);
                }
            }
            WindowEvent::Focused(false) => self.controls.release_all(),
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                log::info!("Resizing renderer surface to: ({width}, {height})");
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(width, height);
                }
                self.last_size = (width, height);
            }
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting...");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.redraw(&window),
            _ => (),
        }

        window.request_redraw();
    }
}

impl App {
    fn redraw(&mut self, window: &Window) {
        let (Some(gui_state), Some(renderer), Some(last_render_time)) = (
            self.gui_state.as_mut(),
            self.renderer.as_mut(),
            self.last_render_time.as_mut(),
        ) else {
            return;
        };

        let now = Instant::now();
        let delta_time = now - *last_render_time;
        *last_render_time = now;

        let gui_input = gui_state.take_egui_input(window);
        gui_state.egui_ctx().begin_pass(gui_input);

        let current_demo = renderer.demo();
        let mut selected_demo = current_demo;
        let mut reset = false;

        egui::Window::new("Raycast").show(gui_state.egui_ctx(), |ui| {
            ui.checkbox(&mut self.panels_visible, "Show Settings");
            if !self.panels_visible {
                return;
            }

            egui::ComboBox::from_label("Demo")
                .selected_text(current_demo.title())
                .show_ui(ui, |ui| {
                    for demo in Demo::ALL {
                        ui.selectable_value(&mut selected_demo, demo, demo.title());
                    }
                });

            let volume = &renderer.assets().volume;
            ui.label(format!(
                "Volume {}x{}x{}, values {} to {}",
                volume.dims[0], volume.dims[1], volume.dims[2], volume.min, volume.max
            ));

            let scene = renderer.scene_mut();
            if scene.demo.uses_volume() {
                ui.add(egui::Slider::new(&mut scene.settings.steps, 1..=MAX_STEPS).text("Steps"));
                ui.add(egui::Slider::new(&mut scene.settings.density, 0.0..=16.0).text("Density"));
                ui.add(
                    egui::Slider::new(&mut scene.settings.threshold, 0.0..=1.0).text("Threshold"),
                );
            }

            ui.horizontal(|ui| {
                if ui.button("Next Demo").clicked() {
                    selected_demo = current_demo.next();
                }
                if ui.button("Reset Transform").clicked() {
                    reset = true;
                }
            });

            ui.separator();
            ui.label("Arrows: move    +/-: scale");
            ui.label("* / X / Y / Z: rotate    R: reset");
            ui.label("1-6: demo    Esc: exit");
        });

        let egui_winit::egui::FullOutput {
            textures_delta,
            shapes,
            pixels_per_point,
            platform_output,
            ..
        } = gui_state.egui_ctx().end_pass();

        gui_state.handle_platform_output(window, platform_output);

        let paint_jobs = gui_state.egui_ctx().tessellate(shapes, pixels_per_point);

        let screen_descriptor = {
            let (width, height) = self.last_size;
            egui_wgpu::ScreenDescriptor {
                size_in_pixels: [width, height],
                pixels_per_point: window.scale_factor() as f32,
            }
        };

        let motion = self.controls.motion(delta_time.as_secs_f32());

        if let Err(error) = renderer.render_frame(
            screen_descriptor,
            paint_jobs,
            textures_delta,
            delta_time,
            &motion,
        ) {
            log::error!("Failed to render frame: {error:#}");
        }

        if reset {
            renderer.scene_mut().transform.reset();
        }
        if selected_demo != current_demo {
            match renderer.set_demo(selected_demo) {
                Ok(()) => window.set_title(&Self::window_title(selected_demo)),
                Err(error) => {
                    log::error!("Failed to switch to demo '{selected_demo}': {error:#}")
                }
            }
        }
    }
}
