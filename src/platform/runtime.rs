//! The daemon's single-threaded event loop.
//!
//! A hidden top-level controller window owns the tick timer and the tray
//! icon, receives `WM_DISPLAYCHANGE` broadcasts and the input forwarded by
//! the overlay surfaces. All of it is dispatched by one `GetMessageW` loop,
//! so the [`App`] is only ever touched from this thread.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicIsize, AtomicU32, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::System::Console::{
    CTRL_BREAK_EVENT, CTRL_C_EVENT, CTRL_CLOSE_EVENT, SetConsoleCtrlHandler,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::HiDpi::{
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, SetProcessDpiAwarenessContext,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow,
    DispatchMessageW, GetCursorPos, GetMessageW, KillTimer, MF_CHECKED, MF_SEPARATOR, MF_STRING,
    MSG, PostMessageW, PostQuitMessage, RegisterClassW, RegisterWindowMessageW,
    SetForegroundWindow, SetTimer, TPM_RETURNCMD, TPM_RIGHTBUTTON, TrackPopupMenuEx,
    TranslateMessage, WINDOW_EX_STYLE, WM_CLOSE, WM_CONTEXTMENU, WM_DESTROY, WM_DISPLAYCHANGE,
    WM_ENDSESSION, WM_LBUTTONUP, WM_NULL, WM_QUERYENDSESSION, WM_RBUTTONUP, WM_TIMER, WNDCLASSW,
    WS_OVERLAPPED,
};
use windows::core::{BOOL, PCWSTR, w};

use crate::activity::ActivitySensor;
use crate::activity::win32::{AudioPeakProbe, ExecutionStateProbe, LastInputClock};
use crate::app::App;
use crate::config::{Config, ConfigWatcher};
use crate::logging::LogHandle;
use crate::monitor::Win32Displays;
use crate::overlay::Win32Surfaces;
use crate::overlay::window::WM_OVERLAY_INPUT;

use super::startup::sync_startup_registration;
use super::tray::{TrayIcon, TraySink, WM_TRAY_CALLBACK};

const CONTROLLER_CLASS: PCWSTR = w!("OLEDSentinelController");
const TICK_TIMER_ID: usize = 1;
/// The config file is checked for edits every this many ticks.
const CONFIG_POLL_TICKS: u64 = 4;

/// Controller window, for the console handler (which runs on its own thread).
static CONTROLLER_HWND: AtomicIsize = AtomicIsize::new(0);
/// `TaskbarCreated` message id, broadcast when Explorer restarts.
static TASKBAR_CREATED: AtomicU32 = AtomicU32::new(0);

/// Tray menu command ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuCommand {
    Toggle = 1,
    Settings = 2,
    Reload = 3,
    Startup = 4,
    Exit = 5,
}

impl MenuCommand {
    fn from_id(id: usize) -> Option<Self> {
        [
            Self::Toggle,
            Self::Settings,
            Self::Reload,
            Self::Startup,
            Self::Exit,
        ]
        .into_iter()
        .find(|c| *c as usize == id)
    }
}

/// How the daemon was launched.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Config file in use.
    pub config_path: PathBuf,
    /// Whether the path came from `--config` (and must be passed on).
    pub explicit_config: bool,
    /// Blank immediately after startup.
    pub blank_now: bool,
}

type DaemonApp = App<Win32Displays, Win32Surfaces>;

struct Runtime {
    app: DaemonApp,
    hwnd: HWND,
    tray: TrayIcon,
    watcher: ConfigWatcher,
    log: LogHandle,
    options: DaemonOptions,
    ticks: u64,
}

thread_local! {
    static RUNTIME: RefCell<Option<Runtime>> = const { RefCell::new(None) };
}

/// Run `f` against the runtime, unless it is missing or already borrowed
/// further up the stack.
fn with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> Option<R> {
    RUNTIME.with(|cell| {
        let Ok(mut guard) = cell.try_borrow_mut() else {
            debug!("Runtime busy, dropping re-entrant message");
            return None;
        };
        guard.as_mut().map(f)
    })
}

/// Run the daemon until the user exits or the session ends.
pub fn run_daemon(options: DaemonOptions, log: LogHandle) -> Result<()> {
    unsafe {
        if let Err(e) = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) {
            warn!("Per-monitor DPI awareness unavailable: {}", e);
        }
    }

    let config = Config::load_or_default(&options.config_path)
        .context("Failed to load configuration")?;
    if let Err(e) = log.set_debug(config.debug) {
        warn!("{:#}", e);
    }
    info!(
        "Configuration loaded from {} (timeout={}s)",
        options.config_path.display(),
        config.idle_timeout_seconds
    );
    sync_startup(&config, &options);

    let hwnd = create_controller_window()?;
    CONTROLLER_HWND.store(hwnd.0 as isize, Ordering::Relaxed);
    TASKBAR_CREATED.store(
        unsafe { RegisterWindowMessageW(w!("TaskbarCreated")) },
        Ordering::Relaxed,
    );

    let tray = TrayIcon::new(hwnd);
    if let Err(e) = tray.add(false) {
        warn!("Tray icon unavailable: {:#}", e);
    }

    let mut sensor = ActivitySensor::new(Box::new(LastInputClock), config.suppress_during_playback)
        .with_probe(Box::new(ExecutionStateProbe));
    match AudioPeakProbe::open(config.audio_peak_threshold) {
        Ok(probe) => sensor = sensor.with_probe(Box::new(probe)),
        Err(e) => warn!("Audio peak meter unavailable: {:#}", e),
    }

    let surfaces = match Win32Surfaces::new(hwnd) {
        Ok(surfaces) => surfaces,
        Err(e) => {
            abandon_startup(hwnd, tray);
            return Err(e);
        }
    };
    let tick_ms = config.tick_interval().as_millis() as u32;
    let mut app = App::new(
        config,
        Win32Displays,
        sensor,
        surfaces,
        Box::new(TraySink::new(tray)),
    );

    if unsafe { SetTimer(Some(hwnd), TICK_TIMER_ID, tick_ms, None) } == 0 {
        drop(app);
        abandon_startup(hwnd, tray);
        anyhow::bail!("SetTimer failed");
    }
    unsafe {
        if let Err(e) = SetConsoleCtrlHandler(Some(console_handler), true) {
            debug!("No console control handler: {}", e);
        }
    }

    if options.blank_now {
        app.manual_activate(Instant::now());
    }

    let watcher = ConfigWatcher::new(options.config_path.clone());
    RUNTIME.with(|cell| {
        *cell.borrow_mut() = Some(Runtime {
            app,
            hwnd,
            tray,
            watcher,
            log,
            options,
            ticks: 0,
        });
    });

    info!("Daemon started, tick every {} ms", tick_ms);

    // Run the message loop until WM_QUIT.
    unsafe {
        let mut msg = MSG::default();
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    if let Some(mut runtime) = RUNTIME.with(|cell| cell.borrow_mut().take()) {
        runtime.app.shutdown();
        runtime.tray.remove();
        unsafe {
            let _ = KillTimer(Some(runtime.hwnd), TICK_TIMER_ID);
        }
    }
    info!("Daemon stopped");
    Ok(())
}

/// Undo the window and tray setup when startup fails part way.
fn abandon_startup(hwnd: HWND, tray: TrayIcon) {
    tray.remove();
    unsafe {
        let _ = DestroyWindow(hwnd);
    }
}

fn sync_startup(config: &Config, options: &DaemonOptions) {
    let explicit = options
        .explicit_config
        .then_some(options.config_path.as_path());
    if let Err(e) = sync_startup_registration(config.start_with_windows, explicit) {
        warn!("{:#}", e);
    }
}

fn create_controller_window() -> Result<HWND> {
    unsafe {
        let hinstance: HINSTANCE = GetModuleHandleW(None)
            .context("GetModuleHandleW failed")?
            .into();

        let wc = WNDCLASSW {
            lpfnWndProc: Some(controller_proc),
            hInstance: hinstance,
            lpszClassName: CONTROLLER_CLASS,
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            anyhow::bail!("Failed to register controller window class");
        }

        // A hidden top-level window rather than a message-only one: only
        // top-level windows receive WM_DISPLAYCHANGE.
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            CONTROLLER_CLASS,
            w!("OLED Sentinel"),
            WS_OVERLAPPED,
            0,
            0,
            0,
            0,
            None,
            None,
            Some(hinstance),
            None,
        )
        .context("Failed to create controller window")
    }
}

// ─── Event handlers ─────────────────────────────────────────────────────────

impl Runtime {
    fn on_tick(&mut self) {
        self.app.tick(Instant::now());

        self.ticks += 1;
        if self.ticks % CONFIG_POLL_TICKS == 0 {
            match self.watcher.poll() {
                Some(Ok(config)) => {
                    info!("Config file changed, applying");
                    self.apply(config);
                }
                Some(Err(e)) => warn!("Ignoring config edit: {:#}", e),
                None => {}
            }
        }
    }

    fn apply(&mut self, config: Config) {
        let previous = self.app.config().clone();
        self.app.apply_config(config, Instant::now());
        let current = self.app.config().clone();

        if current.debug != previous.debug
            && let Err(e) = self.log.set_debug(current.debug)
        {
            warn!("{:#}", e);
        }
        if current.start_with_windows != previous.start_with_windows {
            sync_startup(&current, &self.options);
        }
        if current.tick_interval_ms != previous.tick_interval_ms {
            // Re-arming an existing timer id replaces its period.
            let period = current.tick_interval().as_millis() as u32;
            unsafe {
                let _ = SetTimer(Some(self.hwnd), TICK_TIMER_ID, period, None);
            }
        }
    }

    fn reload(&mut self) {
        match Config::load_or_default(&self.options.config_path) {
            Ok(config) => {
                self.watcher.mark_seen();
                self.apply(config);
                info!("Configuration reloaded");
            }
            Err(e) => warn!("Reload failed: {:#}", e),
        }
    }

    fn toggle_startup(&mut self) {
        let mut config = self.app.config().clone();
        config.start_with_windows = !config.start_with_windows;
        if let Err(e) = config.save(&self.options.config_path) {
            warn!("{:#}", e);
        }
        self.watcher.mark_seen();
        self.apply(config);
    }

    fn open_settings(&self) {
        let exe = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(e) => {
                warn!("Failed to locate executable: {}", e);
                return;
            }
        };
        let spawned = std::process::Command::new(exe)
            .arg("--config")
            .arg(&self.options.config_path)
            .arg("settings")
            .spawn();
        if let Err(e) = spawned {
            warn!("Failed to open settings: {}", e);
        }
    }

    fn on_menu_command(&mut self, command: MenuCommand) {
        debug!("Tray command: {:?}", command);
        match command {
            MenuCommand::Toggle => {
                self.app.toggle(Instant::now());
            }
            MenuCommand::Settings => self.open_settings(),
            MenuCommand::Reload => self.reload(),
            MenuCommand::Startup => self.toggle_startup(),
            MenuCommand::Exit => {
                self.app.shutdown();
                unsafe {
                    let _ = DestroyWindow(self.hwnd);
                }
            }
        }
    }
}

/// Show the tray menu and run the chosen command.
///
/// The menu's modal loop dispatches messages (including ticks) back into
/// `controller_proc`, so the runtime must not be borrowed while it runs.
fn show_tray_menu(hwnd: HWND) {
    let Some((active, startup)) =
        with_runtime(|rt| (rt.app.is_active(), rt.app.config().start_with_windows))
    else {
        return;
    };

    let chosen = unsafe {
        let Ok(menu) = CreatePopupMenu() else {
            error!("CreatePopupMenu failed");
            return;
        };
        let toggle_label = if active {
            w!("Wake displays")
        } else {
            w!("Blank now")
        };
        let startup_flags = if startup {
            MF_STRING | MF_CHECKED
        } else {
            MF_STRING
        };
        let _ = AppendMenuW(menu, MF_STRING, MenuCommand::Toggle as usize, toggle_label);
        let _ = AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null());
        let _ = AppendMenuW(menu, MF_STRING, MenuCommand::Settings as usize, w!("Settings..."));
        let _ = AppendMenuW(
            menu,
            MF_STRING,
            MenuCommand::Reload as usize,
            w!("Reload settings"),
        );
        let _ = AppendMenuW(
            menu,
            startup_flags,
            MenuCommand::Startup as usize,
            w!("Start with Windows"),
        );
        let _ = AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null());
        let _ = AppendMenuW(menu, MF_STRING, MenuCommand::Exit as usize, w!("Exit"));

        let mut pt = POINT::default();
        let _ = GetCursorPos(&mut pt);
        let _ = SetForegroundWindow(hwnd);
        let id = TrackPopupMenuEx(
            menu,
            (TPM_RETURNCMD | TPM_RIGHTBUTTON).0,
            pt.x,
            pt.y,
            hwnd,
            None,
        );
        let _ = DestroyMenu(menu);
        // Lets the menu close properly when the user clicks elsewhere.
        let _ = PostMessageW(Some(hwnd), WM_NULL, WPARAM(0), LPARAM(0));
        id.0 as usize
    };

    if let Some(command) = MenuCommand::from_id(chosen) {
        with_runtime(|rt| rt.on_menu_command(command));
    }
}

// ─── Window procedure ───────────────────────────────────────────────────────

unsafe extern "system" fn controller_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let taskbar_created = TASKBAR_CREATED.load(Ordering::Relaxed);
    if taskbar_created != 0 && msg == taskbar_created {
        with_runtime(|rt| {
            if let Err(e) = rt.tray.add(rt.app.is_active()) {
                warn!("Failed to restore tray icon: {:#}", e);
            }
        });
        return LRESULT(0);
    }

    match msg {
        WM_TIMER if wparam.0 == TICK_TIMER_ID => {
            with_runtime(Runtime::on_tick);
            LRESULT(0)
        }
        WM_DISPLAYCHANGE => {
            with_runtime(|rt| rt.app.display_changed());
            LRESULT(0)
        }
        WM_OVERLAY_INPUT => {
            let surface = wparam.0 as isize;
            with_runtime(|rt| rt.app.overlay_input(surface, Instant::now()));
            LRESULT(0)
        }
        WM_TRAY_CALLBACK => {
            match (lparam.0 as u32) & 0xFFFF {
                WM_LBUTTONUP => {
                    with_runtime(|rt| rt.app.toggle(Instant::now()));
                }
                WM_RBUTTONUP | WM_CONTEXTMENU => show_tray_menu(hwnd),
                _ => {}
            }
            LRESULT(0)
        }
        WM_QUERYENDSESSION => LRESULT(1),
        WM_ENDSESSION => {
            if wparam.0 != 0 {
                with_runtime(|rt| rt.app.shutdown());
            }
            LRESULT(0)
        }
        WM_CLOSE => {
            with_runtime(|rt| rt.app.shutdown());
            unsafe {
                let _ = DestroyWindow(hwnd);
            }
            LRESULT(0)
        }
        WM_DESTROY => {
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

/// Ctrl+C / console close: ask the controller window to shut down cleanly.
unsafe extern "system" fn console_handler(ctrl_type: u32) -> BOOL {
    match ctrl_type {
        CTRL_C_EVENT | CTRL_BREAK_EVENT | CTRL_CLOSE_EVENT => {
            let hwnd = CONTROLLER_HWND.load(Ordering::Relaxed);
            if hwnd != 0 {
                unsafe {
                    let _ = PostMessageW(
                        Some(HWND(hwnd as *mut _)),
                        WM_CLOSE,
                        WPARAM(0),
                        LPARAM(0),
                    );
                }
            }
            BOOL(1)
        }
        _ => BOOL(0),
    }
}
