/// Daemon mode: owns the notification center and serializes every input into one loop
use anyhow::{Context, Result, anyhow};
use ksni::TrayMethods;
use log::{debug, error, info, warn};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1};
use signal_hook::iterator::Signals;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::sync::oneshot;

use crate::center::NotificationCenter;
use crate::config::Config;
use crate::dbus;
use crate::disposition::Rect;
use crate::notification::{NotificationDraft, NotificationId};

const TRAY_START_TIMEOUT: Duration = Duration::from_secs(5);

/// One history entry on the bus: id, received (RFC 3339), application, title, body, icon.
pub type HistoryRow = (u32, String, String, String, String, String);

/// Everything the daemon loop reacts to.
#[derive(Debug)]
pub enum Request {
    Notify {
        draft: NotificationDraft,
        reply: oneshot::Sender<NotificationId>,
    },
    Close(NotificationId),
    Dismiss(NotificationId),
    InvokeAction {
        id: NotificationId,
        action_key: String,
    },
    SetExpiration {
        id: NotificationId,
        active: bool,
    },
    DropAll,
    DropQueued,
    DropVisible,
    RetryOverflow,
    SetScreenGeometry(Rect),
    SetFullscreenSuppression(bool),
    OverflowCount(oneshot::Sender<u32>),
    ExtraWindowPosition(oneshot::Sender<(i32, i32)>),
    History(oneshot::Sender<Vec<HistoryRow>>),
    ReloadConfig,
    Quit,
}

/// Daemon state manager
pub struct Daemon {
    config: Config,
    shutdown: Arc<AtomicBool>,
    tray_thread: Option<JoinHandle<()>>,
}

pub(crate) struct WaynotedTray {
    requests: UnboundedSender<Request>,
}

impl WaynotedTray {
    fn new(requests: UnboundedSender<Request>) -> Self {
        Self { requests }
    }

    fn request(&self, request: Request) {
        if let Err(err) = self.requests.send(request) {
            warn!("Daemon loop is gone, dropping tray request {:?}", err.0);
        }
    }
}

impl ksni::Tray for WaynotedTray {
    fn id(&self) -> String {
        "waynoted".into()
    }

    fn title(&self) -> String {
        "Waynoted Notifications".into()
    }

    fn icon_name(&self) -> String {
        "preferences-system-notifications".into()
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            icon_name: "preferences-system-notifications".into(),
            icon_pixmap: vec![],
            title: format!("Waynoted {}", env!("CARGO_PKG_VERSION")),
            description: "SIGUSR1 drops all notifications".into(),
        }
    }

    fn category(&self) -> ksni::Category {
        ksni::Category::Communications
    }

    fn status(&self) -> ksni::Status {
        ksni::Status::Active
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        use ksni::menu::*;

        vec![
            StandardItem {
                label: "Drop queued".to_string(),
                icon_name: "edit-clear".into(),
                activate: Box::new(|this: &mut Self| {
                    this.request(Request::DropQueued);
                }),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Drop all".to_string(),
                icon_name: "edit-clear-all".into(),
                activate: Box::new(|this: &mut Self| {
                    this.request(Request::DropAll);
                }),
                ..Default::default()
            }
            .into(),
            MenuItem::Separator,
            StandardItem {
                label: "Quit".to_string(),
                icon_name: "application-exit".into(),
                activate: Box::new(|this: &mut Self| {
                    this.request(Request::Quit);
                }),
                ..Default::default()
            }
            .into(),
        ]
    }
}

impl Daemon {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            tray_thread: None,
        }
    }

    /// Run daemon with signal handling
    pub fn run(&mut self) -> Result<()> {
        info!("Starting waynoted daemon");
        info!("Send SIGUSR1 to drop all notifications, SIGHUP to reload the config");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create Tokio runtime")?;
        let result = runtime.block_on(self.serve());

        info!("Daemon shutting down");
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.tray_thread.take() {
            match handle.join() {
                Ok(()) => info!("System tray thread joined"),
                Err(err) => warn!("System tray thread panicked: {:?}", err),
            }
        }
        result
    }

    async fn serve(&mut self) -> Result<()> {
        let (requests_tx, requests_rx) = unbounded_channel();
        let (events_tx, events_rx) = unbounded_channel();

        let mut center = NotificationCenter::from_config(&self.config);
        center.subscribe(events_tx);

        let connection = dbus::connect(requests_tx.clone())
            .await
            .context("Failed to register on the session bus (is another notification daemon running?)")?;
        let forwarder = tokio::spawn(dbus::forward_events(connection.clone(), events_rx));

        spawn_signal_thread(requests_tx.clone())?;

        match start_system_tray(requests_tx.clone(), self.shutdown.clone()) {
            Ok(handle) => self.tray_thread = Some(handle),
            Err(err) => warn!("Running without system tray: {:#}", err),
        }
        drop(requests_tx);

        info!("Daemon ready - serving {}", dbus::NOTIFICATIONS_NAME);
        let center = run_event_loop(center, requests_rx).await;

        // Dropping the center closes the event channel and ends the forwarder.
        drop(center);
        match forwarder.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("Signal forwarder failed: {}", err),
            Err(err) => warn!("Signal forwarder panicked: {}", err),
        }
        Ok(())
    }
}

/// Serves requests and expirations until `Quit` arrives or every sender is gone.
pub async fn run_event_loop(
    mut center: NotificationCenter,
    mut requests: UnboundedReceiver<Request>,
) -> NotificationCenter {
    loop {
        let deadline = center.next_deadline();
        tokio::select! {
            request = requests.recv() => match request {
                Some(Request::Quit) => {
                    info!("Quit requested - leaving event loop");
                    break;
                }
                Some(request) => handle_request(&mut center, request),
                None => {
                    debug!("All request senders dropped - leaving event loop");
                    break;
                }
            },
            () = sleep_until(deadline) => {
                let expired = center.poll_expired();
                if !expired.is_empty() {
                    debug!("Expired notifications {:?}", expired);
                }
            }
        }
    }
    center
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

fn handle_request(center: &mut NotificationCenter, request: Request) {
    match request {
        Request::Notify { draft, reply } => {
            let id = center.submit(draft);
            if reply.send(id).is_err() {
                debug!("Caller of notification {} went away before the reply", id);
            }
        }
        Request::Close(id) => {
            center.close(id);
        }
        Request::Dismiss(id) => {
            center.dismiss(id);
        }
        Request::InvokeAction { id, action_key } => {
            center.invoke_action(id, &action_key);
        }
        Request::SetExpiration { id, active } => {
            center.set_expiration(id, active);
        }
        Request::DropAll => center.drop_all(),
        Request::DropQueued => center.drop_queued(),
        Request::DropVisible => center.drop_visible(),
        Request::RetryOverflow => center.retry_overflow(),
        Request::SetScreenGeometry(screen) => center.set_screen_geometry(screen),
        Request::SetFullscreenSuppression(enabled) => {
            if center.set_suppress_on_current_desktop(enabled) {
                let persisted = Config::get_config_path()
                    .and_then(|path| persist_fullscreen_suppression(&path, enabled));
                if let Err(err) = persisted {
                    warn!("Fullscreen suppression not saved: {:#}", err);
                }
            }
        }
        Request::OverflowCount(reply) => {
            let count = u32::try_from(center.overflow_count()).unwrap_or(u32::MAX);
            let _ = reply.send(count);
        }
        Request::ExtraWindowPosition(reply) => {
            let position = center.extra_window_position();
            let _ = reply.send((position.x, position.y));
        }
        Request::History(reply) => {
            let _ = reply.send(history_rows(center));
        }
        Request::ReloadConfig => match Config::load() {
            Ok(config) => {
                info!("Configuration reloaded");
                center.reconfigure(&config);
            }
            Err(err) => error!("Keeping previous configuration: {:#}", err),
        },
        Request::Quit => {}
    }
}

/// Writes the current-desktop suppression flag back into the config file so
/// it survives a restart. A missing file starts from defaults.
fn persist_fullscreen_suppression(config_path: &Path, enabled: bool) -> Result<()> {
    let mut config = if config_path.exists() {
        Config::load_from(config_path)?
    } else {
        Config::default()
    };
    config.popups.dont_show_when_fullscreen_current_desktop = enabled;
    config.save_to(config_path)
}

fn history_rows(center: &NotificationCenter) -> Vec<HistoryRow> {
    center
        .history()
        .iter()
        .map(|entry| {
            let n = &entry.notification;
            (
                n.id,
                entry.received.to_rfc3339(),
                n.application.clone(),
                n.title.clone(),
                n.body.clone(),
                n.icon_url.clone(),
            )
        })
        .collect()
}

fn spawn_signal_thread(requests: UnboundedSender<Request>) -> Result<()> {
    let mut signals = Signals::new([SIGUSR1, SIGHUP, SIGTERM, SIGINT])
        .context("Failed to register signal handler")?;

    // Lives until process exit; signal_hook's forever() has no clean stop.
    thread::spawn(move || {
        for sig in signals.forever() {
            let request = match sig {
                SIGUSR1 => {
                    info!("Received SIGUSR1 - dropping all notifications");
                    Request::DropAll
                }
                SIGHUP => {
                    info!("Received SIGHUP - reloading configuration");
                    Request::ReloadConfig
                }
                SIGTERM | SIGINT => {
                    info!(
                        "Received {} - initiating graceful shutdown",
                        if sig == SIGTERM { "SIGTERM" } else { "SIGINT" }
                    );
                    Request::Quit
                }
                _ => {
                    warn!("Received unexpected signal: {}", sig);
                    continue;
                }
            };
            if requests.send(request).is_err() {
                break;
            }
        }
    });
    Ok(())
}

/// System tray implementation
fn start_system_tray(
    requests: UnboundedSender<Request>,
    shutdown: Arc<AtomicBool>,
) -> Result<JoinHandle<()>> {
    let tray = WaynotedTray::new(requests);
    let tray_shutdown = shutdown.clone();
    let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

    info!("Spawning system tray runtime thread...");

    let ready_thread_tx = ready_tx.clone();
    let tray_thread = thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Failed to create Tokio runtime for system tray: {}", e);
                report_tray_readiness(
                    &ready_thread_tx,
                    Err(anyhow!(
                        "Failed to create Tokio runtime for system tray: {e}"
                    )),
                );
                return;
            }
        };

        rt.block_on(async {
            match tray.spawn().await {
                Ok(handle) => {
                    info!("System tray spawned successfully");
                    report_tray_readiness(&ready_thread_tx, Ok(()));

                    loop {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        if tray_shutdown.load(Ordering::Acquire) {
                            info!("Shutting down system tray");
                            let _ = handle.shutdown().await;
                            break;
                        }
                    }
                }
                Err(e) => {
                    warn!("System tray error: {}", e);
                    report_tray_readiness(&ready_thread_tx, Err(anyhow!("System tray error: {e}")));
                }
            }
        });
    });

    drop(ready_tx);

    match ready_rx.recv_timeout(TRAY_START_TIMEOUT) {
        Ok(result) => {
            result?;
            info!("System tray thread started");
            Ok(tray_thread)
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!("Timed out waiting for system tray to start");
            shutdown.store(true, Ordering::Release);
            let _ = tray_thread.join();
            Err(anyhow!("Timed out waiting for system tray to start"))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            let _ = tray_thread.join();
            Err(anyhow!(
                "System tray thread exited before signaling readiness"
            ))
        }
    }
}

fn report_tray_readiness(tx: &mpsc::Sender<Result<()>>, result: Result<()>) {
    if let Err(err) = tx.send(result) {
        debug!(
            "System tray readiness receiver dropped before signal could be delivered: {}",
            err
        );
    }
}
