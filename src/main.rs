mod content;
mod controls;
mod core;
mod playback;
mod settings;
mod ui;

use crate::content::{load_play, PlayLibrary};
use crate::controls::{Capabilities, InputEvent, ProcessRecognizer};
use crate::core::{derive_frame, PlayDefinition};
use crate::playback::{PlaybackSession, PlaybackStatus, SessionEvent, SessionHandle};
use crate::settings::ViewerSettings;
use crate::ui::{
    render_play_info, translate_key, ControlsWindow, CourtView, FileDialogs, LibraryAction,
    LibraryWindow, ShortcutAction, ShortcutManager, StatusLine,
};
use anyhow::{anyhow, Context as _, Result};
use clap::Parser;
use imgui::{Condition, Context, FontConfig, FontSource, WindowFlags};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use winit::event::{Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::ModifiersState;
use winit::window::WindowBuilder;

use glow::HasContext;
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasRawWindowHandle;

use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SESSION_STOP_TIMEOUT: Duration = Duration::from_secs(1);
const SETTINGS_SAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Step-by-step basketball play viewer
#[derive(Parser)]
#[command(name = "playboard")]
#[command(version, about = "Step through basketball plays with buttons, keys or voice")]
struct Args {
    /// Play file to open (.json)
    play: Option<PathBuf>,

    /// Directory of play files to list in the library
    #[arg(long, short = 'l')]
    library: Option<PathBuf>,

    /// Speech recognizer command line, e.g. "vosk-listen --lang en"
    #[arg(long)]
    voice_cmd: Option<String>,

    /// Ignore playback keys (buttons and voice still work)
    #[arg(long)]
    no_keyboard: bool,
}

/// A running playback session and its task
struct ActiveSession {
    handle: SessionHandle,
    task: JoinHandle<()>,
}

struct AppState {
    runtime: Handle,
    settings: ViewerSettings,
    capabilities: Capabilities,
    voice_command: Vec<String>,
    // Loaded play
    play: Option<Arc<PlayDefinition>>,
    play_path: Option<PathBuf>,
    load_error: Option<String>,
    session: Option<ActiveSession>,
    // Views
    court: CourtView,
    controls: ControlsWindow,
    library: PlayLibrary,
    library_window: LibraryWindow,
    shortcut_manager: ShortcutManager,
    modifiers: ModifiersState,
    // Window visibility
    show_court: bool,
    show_controls: bool,
    show_library: bool,
    show_play_info: bool,
    show_shortcuts: bool,
    show_open_play_pending: bool,
    show_pick_library_pending: bool,
    status_line: StatusLine,
}

impl AppState {
    fn new(runtime: Handle, settings: ViewerSettings, args: &Args) -> Self {
        let voice_command = match &args.voice_cmd {
            Some(cmd) => cmd.split_whitespace().map(str::to_string).collect(),
            None => settings.voice_command.clone(),
        };
        let capabilities = Capabilities {
            keyboard: settings.keyboard_enabled && !args.no_keyboard,
            voice: !voice_command.is_empty(),
        };

        Self {
            runtime,
            capabilities,
            voice_command,
            play: None,
            play_path: None,
            load_error: None,
            session: None,
            court: CourtView::new(),
            controls: ControlsWindow::new(),
            library: PlayLibrary::new(),
            library_window: LibraryWindow::new(),
            shortcut_manager: ShortcutManager::new(),
            modifiers: ModifiersState::empty(),
            show_court: settings.show_court,
            show_controls: settings.show_controls,
            show_library: settings.show_library,
            show_play_info: settings.show_play_info,
            show_shortcuts: settings.show_shortcuts,
            show_open_play_pending: false,
            show_pick_library_pending: false,
            status_line: StatusLine::new(),
            settings,
        }
    }

    fn save_settings(&mut self) {
        self.settings.show_court = self.show_court;
        self.settings.show_controls = self.show_controls;
        self.settings.show_library = self.show_library;
        self.settings.show_play_info = self.show_play_info;
        self.settings.show_shortcuts = self.show_shortcuts;
        self.settings.library_dir = self.library.root().map(Path::to_path_buf);
        self.settings.last_play = self.play_path.clone();

        if let Err(e) = self.settings.save() {
            warn!("Failed to save settings: {:#}", e);
        }
    }

    fn open_play(&mut self, path: &Path) {
        self.play_path = Some(path.to_path_buf());
        self.court.clear();

        match load_play(path) {
            Ok(play) => {
                let play = Arc::new(play);
                self.status_line
                    .set(format!("Loaded '{}' ({} steps)", play.title, play.step_count()));
                self.load_error = None;
                self.play = Some(play.clone());
                self.start_session(play);
            }
            Err(e) => {
                error!("Failed to load play {:?}: {}", path, e);
                self.end_session();
                self.status_line.set(format!("Failed to load play: {}", e));
                self.load_error = Some(e.to_string());
                self.play = None;
            }
        }
    }

    fn start_session(&mut self, play: Arc<PlayDefinition>) {
        self.end_session();

        let (mut session, handle) = PlaybackSession::new(play, self.capabilities);
        if let Some(recognizer) = ProcessRecognizer::from_command_line(&self.voice_command) {
            session = session.with_voice(Box::new(recognizer));
        }

        let task = self.runtime.spawn(session.run());
        self.session = Some(ActiveSession { handle, task });
    }

    /// Stop the current session and wait briefly for its task to finish
    fn end_session(&mut self) {
        let Some(active) = self.session.take() else {
            return;
        };

        active.handle.shutdown();
        let task = active.task;
        let result = self
            .runtime
            .block_on(async move { tokio::time::timeout(SESSION_STOP_TIMEOUT, task).await });
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Playback session task failed: {}", e),
            Err(_) => warn!("Playback session did not stop within {:?}", SESSION_STOP_TIMEOUT),
        }
    }

    fn open_library(&mut self, dir: &Path) {
        match self.library.scan(dir) {
            Ok(count) => {
                self.status_line.set(format!("Library: {} plays", count));
                self.show_library = true;
            }
            Err(e) => {
                error!("{:#}", e);
                self.status_line.set(format!("{:#}", e));
            }
        }
    }

    fn send(&mut self, event: SessionEvent) {
        if matches!(event, SessionEvent::Input(_)) {
            self.status_line.clear();
        }
        if let Some(active) = &self.session {
            if !active.handle.send(event) {
                warn!("Playback session is no longer running");
            }
        }
    }

    fn toggle_auto_play(&self) {
        if let Some(active) = &self.session {
            let enabled = active.handle.snapshot().state.auto_play;
            active.handle.set_auto_play(!enabled);
        }
    }

    /// Status of the running session, updating the court with its frame
    fn update_view(&mut self) -> Option<PlaybackStatus> {
        let active = self.session.as_ref()?;
        let play = self.play.as_ref()?;

        let snapshot = active.handle.snapshot();
        let frame = derive_frame(play, snapshot.state.current_index);
        self.court.set_frame(&frame);
        Some(PlaybackStatus::new(&snapshot, &frame))
    }

    fn voice_active(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.handle.snapshot().voice_active)
            .unwrap_or(false)
    }

    /// Handle a key press; returns an application shortcut if one matched
    fn handle_key(&mut self, event: &KeyEvent, want_text_input: bool) -> Option<ShortcutAction> {
        if let Some(action) = self.shortcut_manager.process_event(event, self.modifiers) {
            return Some(action);
        }
        if want_text_input || self.modifiers.control_key() || self.modifiers.alt_key() {
            return None;
        }
        if let Some(key) = translate_key(event) {
            self.send(SessionEvent::Input(InputEvent::Key(key)));
        }
        None
    }

    fn process_file_dialogs(&mut self) {
        if self.show_open_play_pending {
            self.show_open_play_pending = false;
            let start_dir = self
                .play_path
                .as_deref()
                .and_then(Path::parent)
                .or_else(|| self.library.root())
                .map(Path::to_path_buf);
            if let Some(path) = FileDialogs::open_play_file(start_dir.as_deref()) {
                self.open_play(&path);
            }
        }

        if self.show_pick_library_pending {
            self.show_pick_library_pending = false;
            if let Some(dir) = FileDialogs::pick_library_dir(self.library.root()) {
                self.open_library(&dir);
            }
        }
    }
}

fn toggle_menu_item(ui: &imgui::Ui, label: &str, flag: &mut bool) {
    if ui.menu_item_config(label).selected(*flag).build() {
        *flag = !*flag;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("playboard=info")),
        )
        .init();

    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

    let event_loop = EventLoop::new().map_err(|e| anyhow!("Failed to create event loop: {}", e))?;

    // Build the window and GL display using glutin-winit
    let (window, gl_config) = DisplayBuilder::new()
        .with_window_builder(Some(
            WindowBuilder::new()
                .with_title("Playboard")
                .with_inner_size(winit::dpi::LogicalSize::new(1400.0, 900.0)),
        ))
        .build(&event_loop, glutin::config::ConfigTemplateBuilder::new(), |mut iter| {
            iter.next().expect("no GL config available")
        })
        .map_err(|e| anyhow!("Failed to create window and display: {}", e))?;

    let window = window.context("Failed to create window")?;
    let gl_display = gl_config.display();

    let context = unsafe {
        gl_display.create_context(
            &gl_config,
            &glutin::context::ContextAttributesBuilder::new().build(Some(window.raw_window_handle())),
        )
    }
    .context("Failed to create GL context")?;

    let attrs = window.build_surface_attributes(
        glutin::surface::SurfaceAttributesBuilder::<glutin::surface::WindowSurface>::new(),
    );
    let surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
        .context("Failed to create surface")?;
    let context = context
        .make_current(&surface)
        .context("Failed to make context current")?;

    let load_gl = || unsafe {
        glow::Context::from_loader_function(|name| {
            CString::new(name)
                .map(|name| gl_display.get_proc_address(&name))
                .unwrap_or(std::ptr::null())
        })
    };
    let gl = load_gl();
    let gl_clear = load_gl();

    // Set up imgui
    let mut imgui = Context::create();
    imgui.set_log_filename(None::<PathBuf>);
    if let Some(dir) = ViewerSettings::config_dir() {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("Failed to create config dir {:?}: {}", dir, e);
        }
        imgui.set_ini_filename(Some(dir.join("layout.ini")));
    }
    imgui.io_mut().config_flags |= imgui::ConfigFlags::DOCKING_ENABLE;

    let hidpi_factor = window.scale_factor();
    let font_size = (14.0 * hidpi_factor) as f32;
    imgui.fonts().add_font(&[FontSource::DefaultFontData {
        config: Some(FontConfig {
            size_pixels: font_size,
            ..FontConfig::default()
        }),
    }]);
    imgui.io_mut().font_global_scale = (1.0 / hidpi_factor) as f32;

    let mut platform = WinitPlatform::init(&mut imgui);
    platform.attach_window(imgui.io_mut(), &window, HiDpiMode::Default);

    let mut renderer = imgui_glow_renderer::AutoRenderer::initialize(gl, &mut imgui)
        .map_err(|e| anyhow!("Failed to initialize renderer: {}", e))?;

    // Create app state
    let settings = ViewerSettings::load();
    let mut state = AppState::new(rt.handle().clone(), settings, &args);

    if let Some(dir) = args.library.clone().or_else(|| state.settings.library_dir.clone()) {
        state.open_library(&dir);
    }
    match args.play.clone() {
        Some(path) => state.open_play(&path),
        None => {
            if let Some(path) = state.settings.last_play.clone().filter(|p| p.exists()) {
                state.open_play(&path);
            }
        }
    }

    let mut last_frame_time = Instant::now();
    let mut last_settings_save = Instant::now();

    event_loop
        .run(move |event, window_target| {
            match &event {
                Event::NewEvents(_) => {
                    let now = Instant::now();
                    imgui.io_mut().update_delta_time(now - last_frame_time);
                    last_frame_time = now;
                }
                Event::AboutToWait => {
                    state.process_file_dialogs();

                    if last_settings_save.elapsed() >= SETTINGS_SAVE_INTERVAL {
                        state.save_settings();
                        last_settings_save = Instant::now();
                    }

                    if let Err(e) = platform.prepare_frame(imgui.io_mut(), &window) {
                        error!("Failed to prepare frame: {}", e);
                    }
                    window.request_redraw();
                }
                Event::WindowEvent { event: WindowEvent::ModifiersChanged(modifiers), .. } => {
                    state.modifiers = modifiers.state();
                }
                Event::WindowEvent { event: WindowEvent::KeyboardInput { event: key_event, .. }, .. } => {
                    let want_text_input = imgui.io().want_text_input;
                    match state.handle_key(key_event, want_text_input) {
                        Some(ShortcutAction::OpenPlay) => state.show_open_play_pending = true,
                        Some(ShortcutAction::OpenLibrary) => state.show_pick_library_pending = true,
                        Some(ShortcutAction::ToggleAutoPlay) => state.toggle_auto_play(),
                        Some(ShortcutAction::Quit) => {
                            state.save_settings();
                            state.end_session();
                            window_target.exit();
                        }
                        None => {}
                    }
                }
                Event::WindowEvent { event: WindowEvent::RedrawRequested, .. } => {
                    let status = state.update_view();
                    let voice_active = state.voice_active();
                    let ui = imgui.new_frame();

                    // Menu bar
                    ui.main_menu_bar(|| {
                        ui.menu("File", || {
                            if ui.menu_item_config("Open Play...").shortcut("Ctrl+O").build() {
                                state.show_open_play_pending = true;
                            }
                            if ui.menu_item_config("Open Library...").shortcut("Ctrl+L").build() {
                                state.show_pick_library_pending = true;
                            }
                            ui.separator();
                            if ui.menu_item_config("Exit").shortcut("Ctrl+Q").build() {
                                state.save_settings();
                                state.end_session();
                                window_target.exit();
                            }
                        });

                        ui.menu("Playback", || {
                            let running = status.is_some();
                            for label in ["Next", "Prev", "Reset"] {
                                if ui.menu_item_config(label).enabled(running).build() {
                                    state.send(SessionEvent::Input(InputEvent::Button(label.to_string())));
                                }
                            }
                            ui.separator();
                            let auto_play = status.as_ref().map(|s| s.auto_play).unwrap_or(false);
                            if ui
                                .menu_item_config("Auto-play")
                                .shortcut("Ctrl+A")
                                .selected(auto_play)
                                .enabled(running)
                                .build()
                            {
                                state.send(SessionEvent::SetAutoPlay(!auto_play));
                            }
                        });

                        ui.menu("View", || {
                            toggle_menu_item(ui, "Court", &mut state.show_court);
                            toggle_menu_item(ui, "Controls", &mut state.show_controls);
                            toggle_menu_item(ui, "Library", &mut state.show_library);
                            toggle_menu_item(ui, "Play Info", &mut state.show_play_info);
                            ui.separator();
                            toggle_menu_item(ui, "Keyboard Shortcuts", &mut state.show_shortcuts);
                        });
                    });

                    // Court
                    if state.show_court {
                        let court = &state.court;
                        let has_play = state.play.is_some();
                        ui.window("Court")
                            .size([620.0, 580.0], Condition::FirstUseEver)
                            .position([360.0, 30.0], Condition::FirstUseEver)
                            .opened(&mut state.show_court)
                            .build(|| {
                                if has_play {
                                    court.render(ui);
                                } else {
                                    ui.text_disabled("No play selected");
                                }
                            });
                    }

                    if state.show_controls {
                        let events = state.controls.render(ui, status.as_ref(), &mut state.show_controls);
                        for event in events {
                            state.send(event);
                        }
                    }

                    if state.show_library {
                        let action = state.library_window.render(
                            ui,
                            &state.library,
                            state.play_path.as_deref(),
                            &mut state.show_library,
                        );
                        match action {
                            Some(LibraryAction::Open(path)) => state.open_play(&path),
                            Some(LibraryAction::Refresh) => {
                                if let Err(e) = state.library.refresh() {
                                    state.status_line.set(format!("{:#}", e));
                                }
                            }
                            Some(LibraryAction::ChooseFolder) => state.show_pick_library_pending = true,
                            None => {}
                        }
                    }

                    if state.show_play_info {
                        render_play_info(
                            ui,
                            state.play.as_deref(),
                            state.load_error.as_deref(),
                            &mut state.show_play_info,
                        );
                    }

                    if state.show_shortcuts {
                        state.shortcut_manager.render_help(ui, &mut state.show_shortcuts, voice_active);
                    }

                    // Status bar
                    let [display_w, display_h] = ui.io().display_size;
                    ui.window("##status_bar")
                        .position([0.0, display_h - 25.0], Condition::Always)
                        .size([display_w, 25.0], Condition::Always)
                        .flags(WindowFlags::NO_DECORATION | WindowFlags::NO_MOVE | WindowFlags::NO_SAVED_SETTINGS)
                        .build(|| {
                            if let Some(msg) = state.status_line.current(Instant::now()) {
                                ui.text(msg);
                            } else if let Some(status) = &status {
                                ui.text(status.step_text());
                            } else {
                                ui.text("Open a play to begin (File > Open Play...)");
                            }
                            if voice_active {
                                ui.same_line();
                                ui.text_colored([0.3, 0.8, 0.4, 1.0], "| Voice on");
                            }
                        });

                    platform.prepare_render(ui, &window);
                    let draw_data = imgui.render();

                    unsafe {
                        gl_clear.clear_color(0.1, 0.1, 0.1, 1.0);
                        gl_clear.clear(glow::COLOR_BUFFER_BIT);
                    }

                    if let Err(e) = renderer.render(draw_data) {
                        error!("Rendering failed: {}", e);
                        window_target.exit();
                    }
                    if let Err(e) = surface.swap_buffers(&context) {
                        error!("Failed to swap buffers: {}", e);
                    }
                }
                Event::WindowEvent { event: WindowEvent::CloseRequested, .. } => {
                    state.save_settings();
                    state.end_session();
                    window_target.exit();
                }
                Event::LoopExiting => {
                    info!("Shutting down");
                }
                _ => {}
            }

            platform.handle_event(imgui.io_mut(), &window, &event);
        })
        .map_err(|e| anyhow!("Event loop error: {}", e))
}
