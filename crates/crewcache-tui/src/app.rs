//! Application state management for crewcache.
//!
//! This module contains the core `App` struct that manages all application
//! state: per-tab listing caches and view state, session management,
//! mutations, and background refresh coordination.

use anyhow::Result;
use chrono::{Duration, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crewcache_core::api::{ApiError, EmailClient, EmailRequest, StoreClient};
use crewcache_core::auth::{CredentialStore, Session};
use crewcache_core::cache::{CacheAges, CacheManager, ListingCache, Searchable, ViewState};
use crewcache_core::config::Config;
use crewcache_core::models::{
    generate_temp_password, next_employee_code, plan_auto_absent, user_stats, ApplicationStatus,
    AttendanceRecord, CampusApplication, JobApplication, JobPosting, NewUser, ProjectBudget,
    Role, UserPatch, UserRecord, UserStats, TEMP_PASSWORD_LEN,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// 32 covers one full refresh (8 collection results) with headroom.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for login username input.
const MAX_USERNAME_LENGTH: usize = 80;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for form fields and search input.
const MAX_FIELD_LENGTH: usize = 80;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs, one per management screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Admins,
    Employees,
    Hr,
    Postings,
    Applications,
    Campus,
    Attendance,
    Budgets,
}

impl Tab {
    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Admins => "Admins",
            Tab::Employees => "Employees",
            Tab::Hr => "HR",
            Tab::Postings => "Postings",
            Tab::Applications => "Applications",
            Tab::Campus => "Campus",
            Tab::Attendance => "Attendance",
            Tab::Budgets => "Budgets",
        }
    }

    /// Role behind a staff tab, None for the non-user screens.
    pub fn role(&self) -> Option<Role> {
        match self {
            Tab::Admins => Some(Role::Admin),
            Tab::Employees => Some(Role::Employee),
            Tab::Hr => Some(Role::Hr),
            _ => None,
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Admins => Tab::Employees,
            Tab::Employees => Tab::Hr,
            Tab::Hr => Tab::Postings,
            Tab::Postings => Tab::Applications,
            Tab::Applications => Tab::Campus,
            Tab::Campus => Tab::Attendance,
            Tab::Attendance => Tab::Budgets,
            Tab::Budgets => Tab::Admins,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Admins => Tab::Budgets,
            Tab::Employees => Tab::Admins,
            Tab::Hr => Tab::Employees,
            Tab::Postings => Tab::Hr,
            Tab::Applications => Tab::Postings,
            Tab::Campus => Tab::Applications,
            Tab::Attendance => Tab::Campus,
            Tab::Budgets => Tab::Attendance,
        }
    }

    pub fn all() -> [Tab; 8] {
        [
            Tab::Admins,
            Tab::Employees,
            Tab::Hr,
            Tab::Postings,
            Tab::Applications,
            Tab::Campus,
            Tab::Attendance,
            Tab::Budgets,
        ]
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    AddingUser,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// New-account form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFormFocus {
    Name,
    Email,
    Role,
    Button,
}

/// A delete waiting for its confirmation overlay
#[derive(Debug, Clone)]
pub struct PendingDelete {
    pub tab: Tab,
    pub id: String,
    pub label: String,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Result types from background refresh tasks, sent through an MPSC
/// channel back to the main application.
enum RefreshResult {
    Admins(Vec<UserRecord>),
    Employees(Vec<UserRecord>),
    Hr(Vec<UserRecord>),
    Postings(Vec<JobPosting>),
    Applications(Vec<JobApplication>),
    Campus(Vec<CampusApplication>),
    Attendance(Vec<AttendanceRecord>),
    Budgets(Vec<ProjectBudget>),
    /// Signal that all refresh tasks have completed
    RefreshComplete,
    /// An error occurred during refresh
    Error(String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: Session,
    pub store: StoreClient,
    pub mailer: Option<EmailClient>,
    pub cache: CacheManager,

    // UI state
    pub state: AppState,
    pub current_tab: Tab,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // New-account form state
    pub form_name: String,
    pub form_email: String,
    pub form_role: Role,
    pub form_focus: UserFormFocus,
    pub form_error: Option<String>,

    // Listing snapshots, one per screen
    pub admins: ListingCache<UserRecord>,
    pub employees: ListingCache<UserRecord>,
    pub hr: ListingCache<UserRecord>,
    pub postings: ListingCache<JobPosting>,
    pub applications: ListingCache<JobApplication>,
    pub campus: ListingCache<CampusApplication>,
    pub attendance: ListingCache<AttendanceRecord>,
    pub budgets: ListingCache<ProjectBudget>,

    // View state (search/filters/pagination), one per screen
    pub admins_view: ViewState,
    pub employees_view: ViewState,
    pub hr_view: ViewState,
    pub postings_view: ViewState,
    pub applications_view: ViewState,
    pub campus_view: ViewState,
    pub attendance_view: ViewState,
    pub budgets_view: ViewState,

    // Selection index within the current page, one per screen
    pub admins_selection: usize,
    pub employees_selection: usize,
    pub hr_selection: usize,
    pub postings_selection: usize,
    pub applications_selection: usize,
    pub campus_selection: usize,
    pub attendance_selection: usize,
    pub budgets_selection: usize,

    pub pending_delete: Option<PendingDelete>,

    // Background task channel
    refresh_rx: Option<mpsc::Receiver<RefreshResult>>,
    refresh_tx: mpsc::Sender<RefreshResult>,

    // Status message
    pub status_message: Option<String>,

    // Cache ages for the status bar
    pub cache_ages: CacheAges,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        debug!("App::new() starting");
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let store_url = config.resolved_store_url().ok_or_else(|| {
            anyhow::anyhow!(
                "Store connection not configured. Set CREWCACHE_STORE_URL or edit config.json"
            )
        })?;
        let store_key = config.resolved_store_key().ok_or_else(|| {
            anyhow::anyhow!(
                "Store key not configured. Set CREWCACHE_STORE_KEY or edit config.json"
            )
        })?;

        let cache_dir = config
            .cache_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        // Load session from disk if it exists
        let mut session = Session::new(cache_dir.clone());
        let load_result = session.load();
        debug!(?load_result, has_data = session.data.is_some(), "Session loaded");

        let mut store = StoreClient::new(&store_url, &store_key)?;
        if let Some(ref data) = session.data {
            if !data.is_expired() {
                store.set_token(data.token.clone());
                debug!("Token set on store client");
            }
        }

        let mailer = match config.resolved_email_url() {
            Some(url) => Some(EmailClient::new(&url)?),
            None => {
                warn!("Notification service not configured; welcome mail disabled");
                None
            }
        };

        let cache = CacheManager::new(cache_dir)?;

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Credentials from env vars or config for the login form
        let login_username = std::env::var("CREWCACHE_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var("CREWCACHE_PASSWORD").unwrap_or_default();

        Ok(Self {
            config,
            session,
            store,
            mailer,
            cache,

            state: AppState::Normal,
            current_tab: Tab::Admins,

            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,

            form_name: String::new(),
            form_email: String::new(),
            form_role: Role::Admin,
            form_focus: UserFormFocus::Name,
            form_error: None,

            admins: ListingCache::new(),
            employees: ListingCache::new(),
            hr: ListingCache::new(),
            postings: ListingCache::new(),
            applications: ListingCache::new(),
            campus: ListingCache::new(),
            attendance: ListingCache::new(),
            budgets: ListingCache::new(),

            admins_view: ViewState::default(),
            employees_view: ViewState::default(),
            hr_view: ViewState::default(),
            postings_view: ViewState::default(),
            applications_view: ViewState::default(),
            campus_view: ViewState::default(),
            attendance_view: ViewState::default(),
            budgets_view: ViewState::default(),

            admins_selection: 0,
            employees_selection: 0,
            hr_selection: 0,
            postings_selection: 0,
            applications_selection: 0,
            campus_selection: 0,
            attendance_selection: 0,
            budgets_selection: 0,

            pending_delete: None,

            refresh_rx: Some(rx),
            refresh_tx: tx,

            status_message: None,
            cache_ages: Default::default(),
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Check if the user is authenticated with a valid session
    pub fn is_authenticated(&self) -> bool {
        self.session.is_valid()
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let username = self.login_username.clone();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return Err(anyhow::anyhow!("Username and password required"));
        }

        self.login_error = None;

        match self.store.authenticate(&username, &password).await {
            Ok(session_data) => {
                if let Err(e) = CredentialStore::store(&username, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }

                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.session.update(session_data);
                if let Err(e) = self.session.save() {
                    warn!(error = %e, "Failed to save session");
                }

                if let Some(ref data) = self.session.data {
                    self.store.set_token(data.token.clone());
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                info!("Login successful");
                self.refresh_all_background();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                let msg = friendly_login_error(&e.to_string());
                // A stored password that no longer works should not be
                // offered again by the headless login prompt
                if msg == "Invalid username or password"
                    && CredentialStore::has_credentials(&username)
                {
                    let _ = CredentialStore::delete(&username);
                }
                self.login_error = Some(msg);
                Err(e)
            }
        }
    }

    /// Sign out: clear the persisted session and show the login overlay.
    pub fn logout(&mut self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session");
        }
        info!("Signed out");
        self.start_login();
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Load all data from the disk cache so tabs render immediately.
    pub fn load_from_cache(&mut self) {
        if let Ok(Some(cached)) = self.cache.load_roster(Role::Admin) {
            self.admins.install(cached.data);
        }
        if let Ok(Some(cached)) = self.cache.load_roster(Role::Employee) {
            self.employees.install(cached.data);
        }
        if let Ok(Some(cached)) = self.cache.load_roster(Role::Hr) {
            self.hr.install(cached.data);
        }
        if let Ok(Some(cached)) = self.cache.load_postings() {
            self.postings.install(cached.data);
        }
        if let Ok(Some(cached)) = self.cache.load_applications() {
            self.applications.install(cached.data);
        }
        if let Ok(Some(cached)) = self.cache.load_campus_applications() {
            self.campus.install(cached.data);
        }
        if let Ok(Some(cached)) = self.cache.load_attendance() {
            self.attendance.install(cached.data);
        }
        if let Ok(Some(cached)) = self.cache.load_budgets() {
            self.budgets.install(cached.data);
        }

        self.cache_ages = self.cache.get_cache_ages();
    }

    /// Check if any disk cache data is stale
    pub fn is_cache_stale(&self) -> bool {
        self.cache.any_stale()
    }

    /// Load the current tab's collection if its snapshot is missing or was
    /// invalidated by a mutation. Awaited inline: the store call finishes
    /// before the user continues, so the screen always reflects the latest
    /// known mutation from this client.
    pub async fn maybe_load_current_tab(&mut self) {
        if !self.is_authenticated() {
            return;
        }

        let tab = self.current_tab;
        let store = self.store.clone();
        let was_dirty = self.tab_needs_refresh(tab);
        if !was_dirty {
            return;
        }

        let result = match tab {
            Tab::Admins => {
                self.admins
                    .ensure_loaded(|| async move { store.fetch_users(Role::Admin).await })
                    .await
            }
            Tab::Employees => {
                self.employees
                    .ensure_loaded(|| async move { store.fetch_users(Role::Employee).await })
                    .await
            }
            Tab::Hr => {
                self.hr
                    .ensure_loaded(|| async move { store.fetch_users(Role::Hr).await })
                    .await
            }
            Tab::Postings => {
                self.postings
                    .ensure_loaded(|| async move { store.fetch_postings().await })
                    .await
            }
            Tab::Applications => {
                self.applications
                    .ensure_loaded(|| async move { store.fetch_applications().await })
                    .await
            }
            Tab::Campus => {
                self.campus
                    .ensure_loaded(|| async move { store.fetch_campus_applications().await })
                    .await
            }
            Tab::Attendance => {
                self.attendance
                    .ensure_loaded(|| async move { store.fetch_attendance().await })
                    .await
            }
            Tab::Budgets => {
                self.budgets
                    .ensure_loaded(|| async move { store.fetch_budgets().await })
                    .await
            }
        };

        match result {
            Ok(()) => {
                self.persist_tab_snapshot(tab);
                self.cache_ages = self.cache.get_cache_ages();
                self.clamp_selection(tab);
            }
            Err(e) => {
                error!(tab = tab.title(), error = %e, "Tab load failed");
                self.status_message = Some(friendly_store_error(&e.to_string()));
            }
        }
    }

    fn tab_needs_refresh(&self, tab: Tab) -> bool {
        match tab {
            Tab::Admins => self.admins.needs_refresh(),
            Tab::Employees => self.employees.needs_refresh(),
            Tab::Hr => self.hr.needs_refresh(),
            Tab::Postings => self.postings.needs_refresh(),
            Tab::Applications => self.applications.needs_refresh(),
            Tab::Campus => self.campus.needs_refresh(),
            Tab::Attendance => self.attendance.needs_refresh(),
            Tab::Budgets => self.budgets.needs_refresh(),
        }
    }

    /// Invalidate one tab's snapshot after a mutation touching it.
    pub fn invalidate_tab(&mut self, tab: Tab) {
        match tab {
            Tab::Admins => self.admins.invalidate(),
            Tab::Employees => self.employees.invalidate(),
            Tab::Hr => self.hr.invalidate(),
            Tab::Postings => self.postings.invalidate(),
            Tab::Applications => self.applications.invalidate(),
            Tab::Campus => self.campus.invalidate(),
            Tab::Attendance => self.attendance.invalidate(),
            Tab::Budgets => self.budgets.invalidate(),
        }
    }

    fn invalidate_role(&mut self, role: Role) {
        match role {
            Role::Admin | Role::SuperAdmin => self.admins.invalidate(),
            Role::Employee => self.employees.invalidate(),
            Role::Hr => self.hr.invalidate(),
        }
    }

    fn persist_tab_snapshot(&mut self, tab: Tab) {
        let result = match tab {
            Tab::Admins => self.cache.save_roster(Role::Admin, self.admins.records()),
            Tab::Employees => self
                .cache
                .save_roster(Role::Employee, self.employees.records()),
            Tab::Hr => self.cache.save_roster(Role::Hr, self.hr.records()),
            Tab::Postings => self.cache.save_postings(self.postings.records()),
            Tab::Applications => self.cache.save_applications(self.applications.records()),
            Tab::Campus => self
                .cache
                .save_campus_applications(self.campus.records()),
            Tab::Attendance => self.cache.save_attendance(self.attendance.records()),
            Tab::Budgets => self.cache.save_budgets(self.budgets.records()),
        };
        if let Err(e) = result {
            warn!(tab = tab.title(), error = %e, "Failed to persist snapshot");
        }
    }

    // =========================================================================
    // Background Data Refresh
    // =========================================================================

    /// Spawn a background task to refresh every collection.
    pub fn refresh_all_background(&mut self) {
        if !self.is_authenticated() {
            self.status_message = Some("Sign in to refresh data".to_string());
            return;
        }

        info!("Starting background refresh of all data");
        let store = self.store.clone();
        let tx = self.refresh_tx.clone();

        tokio::spawn(async move {
            Self::execute_background_refresh(store, tx).await;
        });

        self.status_message = Some("Refreshing data...".to_string());
    }

    /// Helper to send refresh results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<RefreshResult>, result: RefreshResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send refresh result - channel closed");
        }
    }

    /// Helper to send a successful fetch result or an error
    async fn send_fetch_result<T, F>(
        tx: &mpsc::Sender<RefreshResult>,
        name: &str,
        result: Result<T>,
        wrapper: F,
    ) where
        F: FnOnce(T) -> RefreshResult,
    {
        match result {
            Ok(data) => {
                debug!("{} fetched successfully", name);
                Self::send_result(tx, wrapper(data)).await;
            }
            Err(e) => {
                error!(error = %e, "{} fetch failed", name);
                Self::send_result(tx, RefreshResult::Error(format!("{}: {}", name, e))).await;
            }
        }
    }

    /// Execute the background refresh: the three staff rosters first (the
    /// screens people sit on), then the remaining collections in parallel.
    async fn execute_background_refresh(store: StoreClient, tx: mpsc::Sender<RefreshResult>) {
        info!("Background refresh task started");

        match store.fetch_rosters().await {
            Ok((admins, employees, hr)) => {
                Self::send_result(&tx, RefreshResult::Admins(admins)).await;
                Self::send_result(&tx, RefreshResult::Employees(employees)).await;
                Self::send_result(&tx, RefreshResult::Hr(hr)).await;
            }
            Err(e) => {
                error!(error = %e, "Roster fetch failed");
                Self::send_result(&tx, RefreshResult::Error(format!("Rosters: {}", e))).await;
            }
        }

        let (postings, applications, campus, attendance, budgets) = tokio::join!(
            store.fetch_postings(),
            store.fetch_applications(),
            store.fetch_campus_applications(),
            store.fetch_attendance(),
            store.fetch_budgets(),
        );

        Self::send_fetch_result(&tx, "Postings", postings, RefreshResult::Postings).await;
        Self::send_fetch_result(&tx, "Applications", applications, RefreshResult::Applications)
            .await;
        Self::send_fetch_result(&tx, "Campus", campus, RefreshResult::Campus).await;
        Self::send_fetch_result(&tx, "Attendance", attendance, RefreshResult::Attendance).await;
        Self::send_fetch_result(&tx, "Budgets", budgets, RefreshResult::Budgets).await;

        info!("Background refresh complete");
        Self::send_result(&tx, RefreshResult::RefreshComplete).await;
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        let results: Vec<RefreshResult> = {
            if let Some(ref mut rx) = self.refresh_rx {
                let mut results = Vec::new();
                while let Ok(result) = rx.try_recv() {
                    results.push(result);
                }
                results
            } else {
                Vec::new()
            }
        };

        for result in results {
            self.process_refresh_result(result);
        }
    }

    /// Process a single refresh result from the background task, replacing
    /// the matching snapshot and mirroring it to disk.
    fn process_refresh_result(&mut self, result: RefreshResult) {
        match result {
            RefreshResult::Admins(data) => {
                if let Err(e) = self.cache.save_roster(Role::Admin, &data) {
                    warn!(error = %e, "Failed to cache admins");
                }
                self.admins.install(data);
                self.clamp_selection(Tab::Admins);
            }
            RefreshResult::Employees(data) => {
                if let Err(e) = self.cache.save_roster(Role::Employee, &data) {
                    warn!(error = %e, "Failed to cache employees");
                }
                self.employees.install(data);
                self.clamp_selection(Tab::Employees);
            }
            RefreshResult::Hr(data) => {
                if let Err(e) = self.cache.save_roster(Role::Hr, &data) {
                    warn!(error = %e, "Failed to cache hr roster");
                }
                self.hr.install(data);
                self.clamp_selection(Tab::Hr);
            }
            RefreshResult::Postings(data) => {
                if let Err(e) = self.cache.save_postings(&data) {
                    warn!(error = %e, "Failed to cache postings");
                }
                self.postings.install(data);
                self.clamp_selection(Tab::Postings);
            }
            RefreshResult::Applications(data) => {
                if let Err(e) = self.cache.save_applications(&data) {
                    warn!(error = %e, "Failed to cache applications");
                }
                self.applications.install(data);
                self.clamp_selection(Tab::Applications);
            }
            RefreshResult::Campus(data) => {
                if let Err(e) = self.cache.save_campus_applications(&data) {
                    warn!(error = %e, "Failed to cache campus applications");
                }
                self.campus.install(data);
                self.clamp_selection(Tab::Campus);
            }
            RefreshResult::Attendance(data) => {
                if let Err(e) = self.cache.save_attendance(&data) {
                    warn!(error = %e, "Failed to cache attendance");
                }
                self.attendance.install(data);
                self.clamp_selection(Tab::Attendance);
            }
            RefreshResult::Budgets(data) => {
                if let Err(e) = self.cache.save_budgets(&data) {
                    warn!(error = %e, "Failed to cache budgets");
                }
                self.budgets.install(data);
                self.clamp_selection(Tab::Budgets);
            }
            RefreshResult::RefreshComplete => {
                self.cache_ages = self.cache.get_cache_ages();
                // Only clear progress messages, keep errors visible
                if let Some(ref msg) = self.status_message {
                    if !msg.starts_with("Error") {
                        self.status_message = None;
                    }
                }
            }
            RefreshResult::Error(msg) => {
                error!(error = %msg, "Background task error");
                self.status_message = Some(friendly_store_error(&msg));
            }
        }
    }

    // =========================================================================
    // View helpers
    // =========================================================================

    pub fn view(&self, tab: Tab) -> &ViewState {
        match tab {
            Tab::Admins => &self.admins_view,
            Tab::Employees => &self.employees_view,
            Tab::Hr => &self.hr_view,
            Tab::Postings => &self.postings_view,
            Tab::Applications => &self.applications_view,
            Tab::Campus => &self.campus_view,
            Tab::Attendance => &self.attendance_view,
            Tab::Budgets => &self.budgets_view,
        }
    }

    pub fn view_mut(&mut self, tab: Tab) -> &mut ViewState {
        match tab {
            Tab::Admins => &mut self.admins_view,
            Tab::Employees => &mut self.employees_view,
            Tab::Hr => &mut self.hr_view,
            Tab::Postings => &mut self.postings_view,
            Tab::Applications => &mut self.applications_view,
            Tab::Campus => &mut self.campus_view,
            Tab::Attendance => &mut self.attendance_view,
            Tab::Budgets => &mut self.budgets_view,
        }
    }

    pub fn selection(&self, tab: Tab) -> usize {
        match tab {
            Tab::Admins => self.admins_selection,
            Tab::Employees => self.employees_selection,
            Tab::Hr => self.hr_selection,
            Tab::Postings => self.postings_selection,
            Tab::Applications => self.applications_selection,
            Tab::Campus => self.campus_selection,
            Tab::Attendance => self.attendance_selection,
            Tab::Budgets => self.budgets_selection,
        }
    }

    pub fn selection_mut(&mut self, tab: Tab) -> &mut usize {
        match tab {
            Tab::Admins => &mut self.admins_selection,
            Tab::Employees => &mut self.employees_selection,
            Tab::Hr => &mut self.hr_selection,
            Tab::Postings => &mut self.postings_selection,
            Tab::Applications => &mut self.applications_selection,
            Tab::Campus => &mut self.campus_selection,
            Tab::Attendance => &mut self.attendance_selection,
            Tab::Budgets => &mut self.budgets_selection,
        }
    }

    /// (filtered total, rows on the current page) for a tab.
    pub fn page_shape(&self, tab: Tab) -> (usize, usize) {
        fn shape<T: Searchable>(cache: &ListingCache<T>, view: &ViewState) -> (usize, usize) {
            let page = cache.view(view);
            (page.total, page.items.len())
        }

        match tab {
            Tab::Admins => shape(&self.admins, &self.admins_view),
            Tab::Employees => shape(&self.employees, &self.employees_view),
            Tab::Hr => shape(&self.hr, &self.hr_view),
            Tab::Postings => shape(&self.postings, &self.postings_view),
            Tab::Applications => shape(&self.applications, &self.applications_view),
            Tab::Campus => shape(&self.campus, &self.campus_view),
            Tab::Attendance => shape(&self.attendance, &self.attendance_view),
            Tab::Budgets => shape(&self.budgets, &self.budgets_view),
        }
    }

    /// Keep the selection inside the current page after data or view changes.
    pub fn clamp_selection(&mut self, tab: Tab) {
        let (_, page_len) = self.page_shape(tab);
        let sel = self.selection_mut(tab);
        *sel = (*sel).min(page_len.saturating_sub(1));
    }

    /// Stats for the staff tab headers.
    pub fn stats_for(&self, tab: Tab) -> Option<UserStats> {
        match tab {
            Tab::Admins => Some(user_stats(self.admins.records())),
            Tab::Employees => Some(user_stats(self.employees.records())),
            Tab::Hr => Some(user_stats(self.hr.records())),
            _ => None,
        }
    }

    /// Status-filter values a tab cycles through with the filter key.
    pub fn filter_cycle(&self, tab: Tab) -> &'static [&'static str] {
        match tab {
            Tab::Admins | Tab::Employees | Tab::Hr => &["", "active", "inactive"],
            Tab::Postings => &["", "open", "closed"],
            Tab::Applications | Tab::Campus => {
                &["", "applied", "shortlisted", "interview", "selected", "rejected"]
            }
            Tab::Attendance => &["", "present", "absent"],
            Tab::Budgets => &[""],
        }
    }

    /// Advance the current tab's status filter to the next option.
    pub fn cycle_status_filter(&mut self) {
        let tab = self.current_tab;
        let options = self.filter_cycle(tab);
        let current = self
            .view(tab)
            .filter("status")
            .unwrap_or("")
            .to_string();
        let idx = options
            .iter()
            .position(|&o| o == current)
            .unwrap_or(0);
        let next = options[(idx + 1) % options.len()];
        self.view_mut(tab).set_filter("status", next);
        self.clamp_selection(tab);
    }

    // =========================================================================
    // Mutations (write, invalidate, re-fetch)
    // =========================================================================

    /// Open the new-account form, defaulting the role to the current tab.
    pub fn start_add_user(&mut self) {
        self.form_name.clear();
        self.form_email.clear();
        self.form_role = self.current_tab.role().unwrap_or(Role::Employee);
        self.form_focus = UserFormFocus::Name;
        self.form_error = None;
        self.state = AppState::AddingUser;
    }

    /// Create the account from the form: allocate the next employee code,
    /// insert the record, then send the welcome mail with a generated
    /// temporary password. A failed mail is a warning, never a rollback.
    pub async fn submit_new_user(&mut self) {
        let name = self.form_name.trim().to_string();
        let email = self.form_email.trim().to_string();
        let role = self.form_role;

        if let Err(msg) = validate_new_user(&name, &email) {
            self.form_error = Some(msg);
            return;
        }
        self.form_error = None;

        // Allocate the code against the store, not the snapshot: another
        // client may have created accounts since the last fetch
        let existing = match self.store.fetch_users(role).await {
            Ok(users) => users,
            Err(e) => {
                self.form_error = Some(friendly_store_error(&e.to_string()));
                return;
            }
        };
        let code = next_employee_code(&existing, role);

        let new_user = NewUser::new(&name, &email, role, &code);
        let created = match self.store.create_user(&new_user).await {
            Ok(record) => record,
            Err(e) => {
                let duplicate = e
                    .downcast_ref::<ApiError>()
                    .is_some_and(ApiError::is_duplicate);
                self.form_error = Some(if duplicate {
                    "An account with this email already exists".to_string()
                } else {
                    friendly_store_error(&e.to_string())
                });
                return;
            }
        };
        info!(code = %code, role = %role, "Account created");

        // Welcome mail with the generated temporary credential
        let mail_note = match &self.mailer {
            Some(mailer) => {
                let temp_password = generate_temp_password(TEMP_PASSWORD_LEN);
                let request = EmailRequest::welcome(
                    &created.email,
                    &created.name,
                    role,
                    &temp_password,
                    &self.config.company(),
                    &self.config.portal(),
                );
                match mailer.send(&request).await {
                    Ok(()) => format!("{} created, welcome mail sent", code),
                    Err(e) => {
                        warn!(error = %e, "Welcome mail failed");
                        format!(
                            "{} created, but the welcome mail failed - share credentials manually",
                            code
                        )
                    }
                }
            }
            None => format!("{} created (no notification service configured)", code),
        };

        self.state = AppState::Normal;
        self.status_message = Some(mail_note);
        self.invalidate_role(role);
        self.maybe_load_current_tab().await;
    }

    fn selected_user_brief(&self, tab: Tab) -> Option<(String, String, bool)> {
        let (cache, view) = match tab {
            Tab::Admins => (&self.admins, &self.admins_view),
            Tab::Employees => (&self.employees, &self.employees_view),
            Tab::Hr => (&self.hr, &self.hr_view),
            _ => return None,
        };
        let page = cache.view(view);
        page.items
            .get(self.selection(tab))
            .map(|u| (u.id.clone(), u.name.clone(), u.is_active))
    }

    /// Toggle the selected account's active flag.
    pub async fn toggle_selected_active(&mut self) {
        let tab = self.current_tab;
        let Some((id, name, is_active)) = self.selected_user_brief(tab) else {
            return;
        };

        match self
            .store
            .update_user(&id, &UserPatch::active(!is_active))
            .await
        {
            Ok(()) => {
                self.status_message = Some(format!(
                    "{} is now {}",
                    name,
                    if is_active { "inactive" } else { "active" }
                ));
                self.invalidate_tab(tab);
                self.maybe_load_current_tab().await;
            }
            Err(e) => {
                error!(error = %e, "Toggle active failed");
                self.status_message = Some(friendly_store_error(&e.to_string()));
            }
        }
    }

    /// Ask for confirmation before deleting the selected row.
    pub fn request_delete(&mut self) {
        let tab = self.current_tab;
        let pending = match tab {
            Tab::Admins | Tab::Employees | Tab::Hr => self
                .selected_user_brief(tab)
                .map(|(id, name, _)| PendingDelete { tab, id, label: name }),
            Tab::Postings => {
                let page = self.postings.view(&self.postings_view);
                page.items.get(self.selection(tab)).map(|p| PendingDelete {
                    tab,
                    id: p.id.clone(),
                    label: p.title.clone(),
                })
            }
            _ => None,
        };

        if let Some(pending) = pending {
            self.pending_delete = Some(pending);
            self.state = AppState::ConfirmingDelete;
        }
    }

    /// Perform the confirmed delete, then re-fetch the collection.
    pub async fn confirm_delete(&mut self) {
        let Some(pending) = self.pending_delete.take() else {
            self.state = AppState::Normal;
            return;
        };
        self.state = AppState::Normal;

        let result = match pending.tab {
            Tab::Admins | Tab::Employees | Tab::Hr => self.store.delete_user(&pending.id).await,
            Tab::Postings => self.store.delete_posting(&pending.id).await,
            _ => return,
        };

        match result {
            Ok(()) => {
                self.status_message = Some(format!("Deleted {}", pending.label));
                self.invalidate_tab(pending.tab);
                self.maybe_load_current_tab().await;
            }
            Err(e) => {
                error!(error = %e, "Delete failed");
                self.status_message = Some(friendly_store_error(&e.to_string()));
            }
        }
    }

    /// Advance the selected application one pipeline step, or reject it.
    pub async fn set_selected_application_status(&mut self, reject: bool) {
        let tab = self.current_tab;

        let target: Option<(String, ApplicationStatus, ApplicationStatus)> = match tab {
            Tab::Applications => {
                let page = self.applications.view(&self.applications_view);
                page.items
                    .get(self.selection(tab))
                    .map(|a| (a.id.clone(), a.status, a.status.advanced()))
            }
            Tab::Campus => {
                let page = self.campus.view(&self.campus_view);
                page.items
                    .get(self.selection(tab))
                    .map(|a| (a.id.clone(), a.status, a.status.advanced()))
            }
            _ => None,
        };

        let Some((id, current, advanced)) = target else {
            return;
        };
        let next = if reject {
            ApplicationStatus::Rejected
        } else {
            advanced
        };
        if next == current {
            return;
        }

        let result = match tab {
            Tab::Applications => self.store.set_application_status(&id, next).await,
            Tab::Campus => self.store.set_campus_application_status(&id, next).await,
            _ => return,
        };

        match result {
            Ok(()) => {
                self.status_message = Some(format!("Marked {}", next.label()));
                self.invalidate_tab(tab);
                self.maybe_load_current_tab().await;
            }
            Err(e) => {
                error!(error = %e, "Status update failed");
                self.status_message = Some(friendly_store_error(&e.to_string()));
            }
        }
    }

    /// Toggle the selected posting between open and closed.
    pub async fn toggle_selected_posting(&mut self) {
        if self.current_tab != Tab::Postings {
            return;
        }

        let target = {
            let page = self.postings.view(&self.postings_view);
            page.items
                .get(self.selection(Tab::Postings))
                .map(|p| (p.id.clone(), p.title.clone(), p.status.toggled()))
        };
        let Some((id, title, next)) = target else {
            return;
        };

        match self.store.set_posting_status(&id, next).await {
            Ok(()) => {
                self.status_message = Some(format!("{} is now {}", title, next.label()));
                self.invalidate_tab(Tab::Postings);
                self.maybe_load_current_tab().await;
            }
            Err(e) => {
                error!(error = %e, "Posting status update failed");
                self.status_message = Some(friendly_store_error(&e.to_string()));
            }
        }
    }

    /// Mark every regular employee without an attendance row yesterday as
    /// absent. The same sweep the nightly job runs, triggered by hand.
    pub async fn run_auto_absent(&mut self) {
        let date = (Utc::now() - Duration::days(1)).date_naive();

        let employees = match self.store.fetch_users(Role::Employee).await {
            Ok(users) => users,
            Err(e) => {
                self.status_message = Some(friendly_store_error(&e.to_string()));
                return;
            }
        };
        let existing = match self.store.fetch_attendance_on(date).await {
            Ok(records) => records,
            Err(e) => {
                self.status_message = Some(friendly_store_error(&e.to_string()));
                return;
            }
        };

        let planned = plan_auto_absent(&employees, &existing, date);
        if planned.is_empty() {
            self.status_message =
                Some(format!("All employees already have records for {}", date));
            return;
        }

        match self.store.insert_attendance(&planned).await {
            Ok(()) => {
                info!(count = planned.len(), %date, "Auto-absent sweep complete");
                self.status_message = Some(format!(
                    "Marked {} employees absent for {}",
                    planned.len(),
                    date
                ));
                self.invalidate_tab(Tab::Attendance);
                self.maybe_load_current_tab().await;
            }
            Err(e) => {
                error!(error = %e, "Auto-absent insert failed");
                self.status_message = Some(friendly_store_error(&e.to_string()));
            }
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

/// Check if a form/search character should be accepted
pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

/// Client-side validation for the new-account form.
pub fn validate_new_user(name: &str, email: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name is required".to_string());
    }
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Enter a valid email address".to_string());
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err("Enter a valid email address".to_string());
    }
    Ok(())
}

/// Map store errors to something a user can act on.
pub fn friendly_store_error(msg: &str) -> String {
    let lower = msg.to_lowercase();
    if lower.contains("rate limit") {
        "Server is busy. Please wait a moment and try again.".to_string()
    } else if lower.contains("unauthorized") || lower.contains("401") {
        "Session expired. Please sign in again.".to_string()
    } else if lower.contains("access denied") || lower.contains("403") {
        "You do not have permission for that.".to_string()
    } else if lower.contains("network") || lower.contains("connect") || lower.contains("timed out")
    {
        "Network error. Check your connection.".to_string()
    } else {
        format!("Error: {}", msg)
    }
}

/// Map login failures to a friendly line for the overlay.
pub fn friendly_login_error(msg: &str) -> String {
    let lower = msg.to_lowercase();
    if lower.contains("401") || lower.contains("unauthorized") || lower.contains("invalid") {
        "Invalid username or password".to_string()
    } else if lower.contains("network") || lower.contains("connect") {
        "Unable to connect to server. Check your internet connection.".to_string()
    } else if lower.contains("timeout") || lower.contains("timed out") {
        "Connection timed out. Please try again.".to_string()
    } else {
        format!("Login failed: {}", msg)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Tab Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tab_next_wraps_around() {
        let mut tab = Tab::Admins;
        for _ in 0..Tab::all().len() {
            tab = tab.next();
        }
        assert_eq!(tab, Tab::Admins);
    }

    #[test]
    fn test_tab_prev_is_inverse_of_next() {
        for tab in Tab::all() {
            assert_eq!(tab.next().prev(), tab);
            assert_eq!(tab.prev().next(), tab);
        }
    }

    #[test]
    fn test_tab_roles() {
        assert_eq!(Tab::Admins.role(), Some(Role::Admin));
        assert_eq!(Tab::Employees.role(), Some(Role::Employee));
        assert_eq!(Tab::Hr.role(), Some(Role::Hr));
        assert_eq!(Tab::Attendance.role(), None);
        assert_eq!(Tab::Budgets.role(), None);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_username_char() {
        assert!(can_add_username_char(0, 'a'));
        assert!(can_add_username_char(79, 'z'));
        assert!(!can_add_username_char(80, 'a'));
        assert!(!can_add_username_char(0, '\x00'));
        assert!(!can_add_username_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[test]
    fn test_validate_new_user() {
        assert!(validate_new_user("Jane Doe", "jane@example.com").is_ok());
        assert!(validate_new_user("", "jane@example.com").is_err());
        assert!(validate_new_user("Jane", "").is_err());
        assert!(validate_new_user("Jane", "not-an-email").is_err());
        assert!(validate_new_user("Jane", "jane@nodot").is_err());
        assert!(validate_new_user("Jane", "@example.com").is_err());
    }

    // -------------------------------------------------------------------------
    // Error Mapping Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_friendly_store_error() {
        assert_eq!(
            friendly_store_error("Rate limited - please wait before retrying"),
            "Server is busy. Please wait a moment and try again."
        );
        assert_eq!(
            friendly_store_error("Unauthorized - session may be expired"),
            "Session expired. Please sign in again."
        );
        assert!(friendly_store_error("weird failure").starts_with("Error:"));
    }

    #[test]
    fn test_friendly_login_error() {
        assert_eq!(
            friendly_login_error("status 401 Unauthorized"),
            "Invalid username or password"
        );
        assert_eq!(
            friendly_login_error("error sending request: failed to connect"),
            "Unable to connect to server. Check your internet connection."
        );
    }
}
