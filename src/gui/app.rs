//! Main GUI application module
//!
//! Contains the GuiApp struct, background job plumbing and the frame loop.

use crate::{
    activity_log::ActivityLog,
    config::Config,
    recipients::EXAMPLE_RECIPIENTS,
    session::{ConnectionState, NetworkStatus, WalletSession},
    wallet::Eip1193Wallet,
    workflow::{ApproveOutcome, Controller, DisperseOutcome, Operation, TransferRequest},
};
use anyhow::{anyhow, Result};
use eframe::{egui, App, Frame, NativeOptions};
use ethers::providers::Http;
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tokio::runtime::Builder;

use super::async_job::AsyncJob;
use super::theme::{configure_style, AppTheme};

pub(crate) type AppController = Controller<Eip1193Wallet<Http>>;

/// How often the wallet is re-read to notice account or network changes.
const WALLET_WATCH_INTERVAL: Duration = Duration::from_secs(3);

/// Raw form fields. Captured into a `TransferRequest` on every button press.
#[derive(Default)]
pub(crate) struct TransferForm {
    pub(crate) multisender: String,
    pub(crate) token: String,
    pub(crate) recipients: String,
}

impl TransferForm {
    fn from_config(config: &Config) -> Self {
        Self {
            multisender: config.default_multisender.clone(),
            token: config.default_token.clone(),
            recipients: String::new(),
        }
    }

    pub(crate) fn request(&self) -> TransferRequest {
        TransferRequest {
            multisender: self.multisender.clone(),
            token: self.token.clone(),
            recipients: self.recipients.clone(),
        }
    }

    pub(crate) fn fill_example(&mut self, log: Option<&ActivityLog>) {
        self.recipients = EXAMPLE_RECIPIENTS.to_string();
        if let Some(log) = log {
            log.info("Filled with example data.");
        }
    }
}

#[derive(Default)]
pub(crate) struct Jobs {
    pub(crate) connect: Option<AsyncJob<Option<WalletSession>>>,
    pub(crate) switch: Option<AsyncJob<()>>,
    pub(crate) watch: Option<AsyncJob<()>>,
    pub(crate) approve: Option<AsyncJob<ApproveOutcome>>,
    pub(crate) disperse: Option<AsyncJob<DisperseOutcome>>,
}

impl Jobs {
    fn wallet_busy(&self) -> bool {
        self.connect.as_ref().is_some_and(AsyncJob::is_running)
            || self.switch.as_ref().is_some_and(AsyncJob::is_running)
    }

    fn any_running(&self) -> bool {
        self.wallet_busy()
            || self.watch.is_some()
            || self.approve.is_some()
            || self.disperse.is_some()
    }
}

pub struct GuiApp {
    pub(crate) config: Config,
    pub(crate) theme: AppTheme,
    pub(crate) controller: Option<Arc<AppController>>,
    pub(crate) startup_error: Option<String>,
    pub(crate) form: TransferForm,
    pub(crate) jobs: Jobs,
    pub(crate) file_error: Option<String>,
    pub(crate) seen_log_len: usize,
    last_wallet_check: Instant,
}

impl GuiApp {
    fn new(config: Config, ctx: &egui::Context) -> Self {
        let theme = AppTheme::default();
        configure_style(ctx, &theme);

        let (controller, startup_error) = match config.wallet() {
            Ok(wallet) => (Some(Arc::new(Controller::new(wallet, config.clone()))), None),
            Err(e) => {
                tracing::error!("Wallet endpoint unusable: {}", e);
                (None, Some(e.to_string()))
            }
        };

        let mut app = Self {
            form: TransferForm::from_config(&config),
            config,
            theme,
            controller,
            startup_error,
            jobs: Jobs::default(),
            file_error: None,
            seen_log_len: 0,
            last_wallet_check: Instant::now(),
        };
        app.start_resume();
        app
    }

    pub(crate) fn spawn_job<T, FutBuilder, Fut>(&self, builder: FutBuilder) -> AsyncJob<T>
    where
        T: Send + 'static,
        FutBuilder: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<T>> + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let result = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(builder()),
                Err(e) => Err(anyhow!("Failed to create async runtime: {}", e)),
            };
            let _ = tx.send(result);
        });
        AsyncJob::new(rx)
    }

    pub(crate) fn connection_state(&self) -> ConnectionState {
        self.controller
            .as_ref()
            .map(|c| c.session().state())
            .unwrap_or_default()
    }

    pub(crate) fn network_status(&self) -> Option<NetworkStatus> {
        self.controller.as_ref().and_then(|c| c.session().network_status())
    }

    pub(crate) fn is_connecting(&self) -> bool {
        self.jobs.connect.is_some()
    }

    pub(crate) fn is_switching(&self) -> bool {
        self.jobs.switch.is_some()
    }

    /// True while the operation is pending, from button press to job completion.
    pub(crate) fn is_busy(&self, operation: Operation) -> bool {
        let job_pending = match operation {
            Operation::Approve => self.jobs.approve.is_some(),
            Operation::Disperse => self.jobs.disperse.is_some(),
        };
        job_pending
            || self
                .controller
                .as_ref()
                .is_some_and(|c| c.is_busy(operation))
    }

    /// Pick up an existing authorization without prompting the user.
    fn start_resume(&mut self) {
        let Some(controller) = self.controller.clone() else {
            return;
        };
        self.jobs.connect =
            Some(self.spawn_job(move || async move { Ok(controller.session().resume().await) }));
    }

    pub(crate) fn start_connect(&mut self) {
        let Some(controller) = self.controller.clone() else {
            return;
        };
        if self.jobs.wallet_busy() {
            return;
        }
        self.jobs.connect = Some(self.spawn_job(move || async move {
            let session = controller.session().connect().await?;
            Ok(Some(session))
        }));
    }

    pub(crate) fn start_switch_network(&mut self) {
        let Some(controller) = self.controller.clone() else {
            return;
        };
        if self.jobs.wallet_busy() {
            return;
        }
        self.jobs.switch = Some(self.spawn_job(move || async move {
            controller.session().switch_network().await?;
            Ok(())
        }));
    }

    pub(crate) fn disconnect(&mut self) {
        if let Some(controller) = &self.controller {
            controller.session().disconnect();
        }
    }

    pub(crate) fn start_approve(&mut self) {
        let Some(controller) = self.controller.clone() else {
            return;
        };
        if self.is_busy(Operation::Approve) {
            return;
        }
        let request = self.form.request();
        self.jobs.approve = Some(self.spawn_job(move || async move {
            Ok(controller.approve(&request).await?)
        }));
    }

    pub(crate) fn start_disperse(&mut self) {
        let Some(controller) = self.controller.clone() else {
            return;
        };
        if self.is_busy(Operation::Disperse) {
            return;
        }
        let request = self.form.request();
        self.jobs.disperse = Some(self.spawn_job(move || async move {
            Ok(controller.disperse(&request).await?)
        }));
    }

    /// Re-read account and chain from the wallet so that changes made in the
    /// wallet invalidate the session.
    fn maybe_watch_wallet(&mut self) {
        if self.last_wallet_check.elapsed() < WALLET_WATCH_INTERVAL || self.jobs.any_running() {
            return;
        }
        self.last_wallet_check = Instant::now();

        let Some(controller) = self.controller.clone() else {
            return;
        };
        if controller.session().session().is_none() {
            return;
        }
        self.jobs.watch = Some(self.spawn_job(move || async move {
            controller.session().verify().await?;
            Ok(())
        }));
    }

    pub(crate) fn load_recipients_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
        self.form.recipients = contents.trim_start_matches('\u{feff}').trim().to_string();
        tracing::info!(
            path = %path.display(),
            lines = self.form.recipients.lines().count(),
            "loaded recipient batch"
        );
        Ok(())
    }

    fn poll_jobs(&mut self) {
        // Workflow and session errors are already in the activity log; only
        // plumbing failures end up here.
        if let Some(job) = &mut self.jobs.connect {
            if let Some(res) = job.poll() {
                if let Err(e) = res {
                    tracing::debug!("connect job finished with error: {}", e);
                }
                self.jobs.connect = None;
            }
        }

        if let Some(job) = &mut self.jobs.switch {
            if let Some(res) = job.poll() {
                if let Err(e) = res {
                    tracing::debug!("network switch job finished with error: {}", e);
                }
                self.jobs.switch = None;
            }
        }

        if let Some(job) = &mut self.jobs.watch {
            if let Some(res) = job.poll() {
                if let Err(e) = res {
                    tracing::debug!("wallet check: {}", e);
                }
                self.jobs.watch = None;
            }
        }

        if let Some(job) = &mut self.jobs.approve {
            if let Some(res) = job.poll() {
                match res {
                    Ok(outcome) => tracing::info!(tx = ?outcome.tx_hash, "approve job done"),
                    Err(e) => tracing::debug!("approve job failed: {}", e),
                }
                self.jobs.approve = None;
            }
        }

        if let Some(job) = &mut self.jobs.disperse {
            if let Some(res) = job.poll() {
                match res {
                    Ok(outcome) => tracing::info!(
                        tx = ?outcome.tx_hash,
                        recipients = outcome.recipients,
                        "disperse job done"
                    ),
                    Err(e) => tracing::debug!("disperse job failed: {}", e),
                }
                self.jobs.disperse = None;
            }
        }
    }
}

impl App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_jobs();
        self.maybe_watch_wallet();

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(self.theme.spacing_xs);
            self.view_connection_bar(ui);
            ui.add_space(self.theme.spacing_xs);
        });

        egui::TopBottomPanel::bottom("activity_log")
            .resizable(true)
            .min_height(160.0)
            .default_height(240.0)
            .show(ctx, |ui| {
                self.view_activity_log(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.view_network_banner(ui);
                self.view_transfer_form(ui);
            });
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

pub fn launch(config: Config) -> Result<()> {
    let app_creator = move |cc: &eframe::CreationContext<'_>| {
        Box::new(GuiApp::new(config.clone(), &cc.egui_ctx)) as Box<dyn App>
    };

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([900.0, 760.0])
        .with_min_inner_size([640.0, 520.0]);

    let native_options = NativeOptions {
        viewport,
        persist_window: true,
        ..Default::default()
    };

    eframe::run_native("Monad Multisender", native_options, Box::new(app_creator))
        .map_err(|e| anyhow!("Failed to start GUI: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_request_copies_fields() {
        let mut form = TransferForm::from_config(&Config {
            default_multisender: "0x1111111111111111111111111111111111111111".to_string(),
            ..Config::default()
        });
        form.token = "0x2222222222222222222222222222222222222222".to_string();
        form.fill_example(None);

        let request = form.request();
        assert_eq!(request.multisender, "0x1111111111111111111111111111111111111111");
        assert_eq!(request.recipients, EXAMPLE_RECIPIENTS);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_fill_example_is_logged() {
        let log = ActivityLog::new();
        let mut form = TransferForm::default();
        form.fill_example(Some(&log));
        assert_eq!(form.recipients, EXAMPLE_RECIPIENTS);
        assert_eq!(log.messages(), vec!["Filled with example data.".to_string()]);
    }

    #[test]
    fn test_jobs_idle_by_default() {
        let jobs = Jobs::default();
        assert!(!jobs.wallet_busy());
        assert!(!jobs.any_running());
    }
}
