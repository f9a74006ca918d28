//! # Registration Session
//!
//! One wizard run: a captured catalog, the registration state, and the
//! draft it saves to.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI event ──► session.add_package("att-1", "pkg-weekend", 1)            │
//! │                  │                                                      │
//! │                  ▼  catalog lookup (UnknownPackage if missing)          │
//! │               state.apply(action)   ◄── atomic, under the lock          │
//! │                  │                                                      │
//! │  save_draft() ───┤                                                      │
//! │                  ▼                                                      │
//! │               encode under the lock, release it                         │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │               timeout(save_timeout, store.save(..))                     │
//! │                  │                                                      │
//! │        ┌─────────┴──────────┐                                           │
//! │        ▼                    ▼                                           │
//! │     Ok(record)       Persistence / SaveTimedOut                         │
//! │                      (state untouched, retryable)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use lodgetix_core::codec;
use lodgetix_core::lodge::{BookingContact, LodgeDetails};
use lodgetix_core::{
    CatalogSnapshot, OrderSummary, RegistrationAction, RegistrationMode, RegistrationState,
    SelectionKind,
};
use lodgetix_db::{generate_draft_id, DraftRecord};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::store::{CatalogSource, DraftStore};

/// A registration in progress.
///
/// Clones share the same state and store.
#[derive(Clone)]
pub struct RegistrationSession {
    draft_id: String,
    catalog: Arc<CatalogSnapshot>,
    state: Arc<Mutex<RegistrationState>>,
    drafts: Arc<dyn DraftStore>,
    save_timeout: Duration,
    autosave: bool,
}

impl RegistrationSession {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Starts an empty registration for `function_id` under a fresh draft id.
    pub async fn start(
        catalogs: &dyn CatalogSource,
        drafts: Arc<dyn DraftStore>,
        function_id: &str,
        config: &SessionConfig,
    ) -> SessionResult<Self> {
        let catalog = load_catalog(catalogs, function_id).await?;

        let mut state = RegistrationState::new(function_id);
        state.apply(RegistrationAction::CaptureFunction(catalog.function.clone()))?;

        let draft_id = generate_draft_id();
        info!(draft_id = %draft_id, function_id = %function_id, "Registration session started");

        Ok(Self::from_parts(draft_id, catalog, state, drafts, config))
    }

    /// Reopens a saved draft.
    ///
    /// The body goes through the full decode path, so a draft that fails
    /// schema checks is rejected instead of half-loaded.
    pub async fn resume(
        catalogs: &dyn CatalogSource,
        drafts: Arc<dyn DraftStore>,
        draft_id: &str,
        config: &SessionConfig,
    ) -> SessionResult<Self> {
        let record = drafts
            .load(draft_id)
            .await
            .map_err(|e| SessionError::persistence(draft_id, e))?
            .ok_or_else(|| SessionError::DraftNotFound(draft_id.to_string()))?;

        let state = codec::from_json_str(&record.body)?;
        let catalog = load_catalog(catalogs, state.function_id()).await?;

        info!(
            draft_id = %draft_id,
            function_id = %state.function_id(),
            revision = record.revision,
            mode = %state.mode(),
            "Registration session resumed"
        );

        Ok(Self::from_parts(
            draft_id.to_string(),
            catalog,
            state,
            drafts,
            config,
        ))
    }

    fn from_parts(
        draft_id: String,
        catalog: CatalogSnapshot,
        state: RegistrationState,
        drafts: Arc<dyn DraftStore>,
        config: &SessionConfig,
    ) -> Self {
        RegistrationSession {
            draft_id,
            catalog: Arc::new(catalog),
            state: Arc::new(Mutex::new(state)),
            drafts,
            save_timeout: config.save_timeout(),
            autosave: config.drafts.autosave,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn draft_id(&self) -> &str {
        &self.draft_id
    }

    pub fn catalog(&self) -> &CatalogSnapshot {
        &self.catalog
    }

    /// Executes a function with read access to the registration.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let lines = session.with_state(|state| state.order_lines())?;
    /// ```
    pub fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&RegistrationState) -> R,
    {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    fn with_state_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut RegistrationState) -> R,
    {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn summary(&self) -> OrderSummary {
        self.with_state(|state| state.summary().clone())
    }

    pub fn mode(&self) -> RegistrationMode {
        self.with_state(|state| state.mode())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Applies one action to the registration.
    pub fn dispatch(&self, action: RegistrationAction) -> SessionResult<()> {
        self.with_state_mut(|state| state.apply(action))?;
        Ok(())
    }

    /// Applies an action, then saves when autosave is on.
    ///
    /// A failed save leaves the applied change in place and returns the
    /// retryable error.
    pub async fn dispatch_and_save(
        &self,
        action: RegistrationAction,
    ) -> SessionResult<Option<DraftRecord>> {
        self.dispatch(action)?;
        if !self.autosave {
            return Ok(None);
        }
        self.save_draft().await.map(Some)
    }

    pub fn set_registration_type(&self, mode: RegistrationMode) -> SessionResult<()> {
        self.dispatch(RegistrationAction::SetRegistrationType(mode))
    }

    /// Adds (or replaces) a catalog package for an attendee.
    pub fn add_package(
        &self,
        attendee_id: &str,
        package_id: &str,
        quantity: u32,
    ) -> SessionResult<()> {
        let package = self
            .catalog
            .package(package_id)
            .ok_or_else(|| SessionError::UnknownPackage(package_id.to_string()))?
            .clone();

        self.dispatch(RegistrationAction::AddPackage {
            attendee_id: attendee_id.to_string(),
            package,
            quantity,
        })
    }

    /// Adds (or replaces) an à la carte ticket for an attendee.
    pub fn add_ticket(&self, attendee_id: &str, ticket_id: &str, quantity: u32) -> SessionResult<()> {
        let ticket = self
            .catalog
            .ticket(ticket_id)
            .ok_or_else(|| SessionError::UnknownTicket(ticket_id.to_string()))?
            .clone();

        self.dispatch(RegistrationAction::AddIndividualTicket {
            attendee_id: attendee_id.to_string(),
            ticket,
            quantity,
        })
    }

    pub fn remove_selection(
        &self,
        attendee_id: &str,
        kind: SelectionKind,
        id: &str,
    ) -> SessionResult<()> {
        self.dispatch(RegistrationAction::RemoveSelection {
            attendee_id: attendee_id.to_string(),
            kind,
            id: id.to_string(),
        })
    }

    pub fn clear_attendee(&self, attendee_id: &str) -> SessionResult<()> {
        self.dispatch(RegistrationAction::ClearAttendee {
            attendee_id: attendee_id.to_string(),
        })
    }

    /// Sets the lodge's bulk purchase of `quantity` copies of a package.
    pub fn set_lodge_bulk_selection(&self, package_id: &str, quantity: u32) -> SessionResult<()> {
        let package = self
            .catalog
            .package(package_id)
            .ok_or_else(|| SessionError::UnknownPackage(package_id.to_string()))?
            .clone();

        self.dispatch(RegistrationAction::SetLodgeBulkSelection { package, quantity })
    }

    pub fn clear_lodge_bulk_selection(&self) -> SessionResult<()> {
        self.dispatch(RegistrationAction::ClearLodgeBulkSelection)
    }

    pub fn set_booking_contact(&self, contact: BookingContact) -> SessionResult<()> {
        self.dispatch(RegistrationAction::SetBookingContact(contact))
    }

    pub fn set_lodge_details(&self, details: LodgeDetails) -> SessionResult<()> {
        self.dispatch(RegistrationAction::SetLodgeDetails(details))
    }

    /// Empties the registration. The function capture is restored so the
    /// draft still names what it is for.
    pub fn clear(&self) -> SessionResult<()> {
        let function = self.catalog.function.clone();
        self.with_state_mut(|state| {
            let mut next = state.clone();
            next.apply(RegistrationAction::Clear)?;
            next.apply(RegistrationAction::CaptureFunction(function))?;
            *state = next;
            Ok::<_, lodgetix_core::CoreError>(())
        })?;
        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Saves the current registration under this session's draft id.
    ///
    /// ## Failure
    /// Store errors become [`SessionError::Persistence`]; a store that does
    /// not answer within the configured timeout becomes
    /// [`SessionError::SaveTimedOut`]. Either way the in-memory registration
    /// is unchanged.
    pub async fn save_draft(&self) -> SessionResult<DraftRecord> {
        let (function_id, body) = self.with_state(|state| {
            codec::to_json_string(state).map(|body| (state.function_id().to_string(), body))
        })?;

        debug!(draft_id = %self.draft_id, bytes = body.len(), "Saving draft");

        let saved = tokio::time::timeout(
            self.save_timeout,
            self.drafts.save(&self.draft_id, &function_id, &body),
        )
        .await;

        match saved {
            Ok(Ok(record)) => {
                info!(
                    draft_id = %record.id,
                    revision = record.revision,
                    "Draft saved"
                );
                Ok(record)
            }
            Ok(Err(e)) => {
                warn!(draft_id = %self.draft_id, error = %e, "Draft save failed");
                Err(SessionError::persistence(&self.draft_id, e))
            }
            Err(_) => {
                warn!(
                    draft_id = %self.draft_id,
                    secs = self.save_timeout.as_secs(),
                    "Draft save timed out"
                );
                Err(SessionError::SaveTimedOut {
                    draft_id: self.draft_id.clone(),
                    secs: self.save_timeout.as_secs(),
                })
            }
        }
    }
}

async fn load_catalog(
    catalogs: &dyn CatalogSource,
    function_id: &str,
) -> SessionResult<CatalogSnapshot> {
    let catalog = catalogs
        .snapshot(function_id)
        .await
        .map_err(|e| SessionError::CatalogUnavailable(format!("{}: {}", function_id, e)))?
        .ok_or_else(|| SessionError::CatalogUnavailable(function_id.to_string()))?;

    for problem in catalog.check_integrity() {
        warn!(function_id = %function_id, problem = %problem, "Catalog integrity problem");
    }

    Ok(catalog)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lodgetix_core::catalog::{CapacityCounters, FunctionDefinition};
    use lodgetix_core::{CoreError, Money, PackageDefinition, TicketDefinition};
    use lodgetix_db::{Database, DbConfig, DbError, DbResult};

    fn ticket(id: &str, name: &str, cents: i64) -> TicketDefinition {
        TicketDefinition {
            id: id.to_string(),
            event_id: format!("evt-{}", id),
            name: name.to_string(),
            price: Money::from_cents(cents),
            capacity: CapacityCounters::default(),
            is_active: true,
            eligible_attendee_types: Vec::new(),
        }
    }

    fn package(id: &str, cents: i64, includes: Vec<&str>, modes: Vec<RegistrationMode>) -> PackageDefinition {
        PackageDefinition {
            id: id.to_string(),
            name: id.to_string(),
            price: Money::from_cents(cents),
            original_price: None,
            discount: None,
            includes: includes.into_iter().map(String::from).collect(),
            eligible_attendee_types: Vec::new(),
            eligible_registration_types: modes,
            is_active: true,
        }
    }

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::new(
            FunctionDefinition {
                id: "fn-installation".to_string(),
                name: "Grand Installation".to_string(),
                location: None,
                starts_at: None,
                ends_at: None,
            },
            vec![
                ticket("tkt-gala", "Gala Dinner", 15000),
                ticket("tkt-lunch", "Farewell Lunch", 7500),
            ],
            vec![
                package("pkg-weekend", 18000, vec!["tkt-gala"], Vec::new()),
                package("pkg-table", 195000, vec!["tkt-gala"; 10], vec![RegistrationMode::Lodge]),
                package("pkg-empty", 1000, Vec::new(), Vec::new()),
            ],
        )
    }

    struct StaticCatalog;

    #[async_trait]
    impl CatalogSource for StaticCatalog {
        async fn snapshot(&self, function_id: &str) -> DbResult<Option<CatalogSnapshot>> {
            let catalog = catalog();
            Ok((catalog.function_id() == function_id).then_some(catalog))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl DraftStore for FailingStore {
        async fn save(&self, _: &str, _: &str, _: &str) -> DbResult<DraftRecord> {
            Err(DbError::ConnectionFailed("store offline".to_string()))
        }

        async fn load(&self, _: &str) -> DbResult<Option<DraftRecord>> {
            Err(DbError::ConnectionFailed("store offline".to_string()))
        }
    }

    struct StalledStore;

    #[async_trait]
    impl DraftStore for StalledStore {
        async fn save(&self, _: &str, _: &str, _: &str) -> DbResult<DraftRecord> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(DbError::PoolExhausted)
        }

        async fn load(&self, _: &str) -> DbResult<Option<DraftRecord>> {
            Ok(None)
        }
    }

    fn config() -> SessionConfig {
        let mut config = SessionConfig::default();
        config.drafts.save_timeout_secs = 1;
        config
    }

    async fn db_session() -> (Database, RegistrationSession) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog().replace_catalog(&catalog()).await.unwrap();
        let session = RegistrationSession::start(
            &db,
            Arc::new(db.clone()),
            "fn-installation",
            &config(),
        )
        .await
        .unwrap();
        (db, session)
    }

    #[tokio::test]
    async fn test_package_priced_at_its_own_price() {
        let (_db, session) = db_session().await;
        session.add_package("att-1", "pkg-weekend", 1).unwrap();

        let subtotal = session
            .with_state(|state| state.attendee_subtotal("att-1"))
            .unwrap();
        assert_eq!(subtotal, Money::from_cents(18000));
        assert_eq!(session.summary().subtotal, Money::from_cents(18000));
    }

    #[tokio::test]
    async fn test_unknown_ids_are_rejected() {
        let session = RegistrationSession::start(
            &StaticCatalog,
            Arc::new(FailingStore),
            "fn-installation",
            &config(),
        )
        .await
        .unwrap();

        assert!(matches!(
            session.add_package("att-1", "pkg-nope", 1),
            Err(SessionError::UnknownPackage(_))
        ));
        assert!(matches!(
            session.add_ticket("att-1", "tkt-nope", 1),
            Err(SessionError::UnknownTicket(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_package_is_configuration_error() {
        let session = RegistrationSession::start(
            &StaticCatalog,
            Arc::new(FailingStore),
            "fn-installation",
            &config(),
        )
        .await
        .unwrap();

        let err = session.add_package("att-1", "pkg-empty", 1).unwrap_err();
        assert!(err.is_config_error());
        assert!(matches!(err, SessionError::Core(CoreError::EmptyPackage { .. })));
        assert_eq!(session.summary().subtotal, Money::zero());
    }

    #[tokio::test]
    async fn test_lodge_only_package_not_offered_to_individuals() {
        let session = RegistrationSession::start(
            &StaticCatalog,
            Arc::new(FailingStore),
            "fn-installation",
            &config(),
        )
        .await
        .unwrap();

        let err = session.add_package("att-1", "pkg-table", 1).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Core(CoreError::IneligiblePackage { .. })
        ));
        assert_eq!(session.summary().total_packages, 0);
    }

    #[tokio::test]
    async fn test_unknown_function_has_no_catalog() {
        let result = RegistrationSession::start(
            &StaticCatalog,
            Arc::new(FailingStore),
            "fn-elsewhere",
            &config(),
        )
        .await;
        assert!(matches!(result, Err(SessionError::CatalogUnavailable(_))));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_selections() {
        let session = RegistrationSession::start(
            &StaticCatalog,
            Arc::new(FailingStore),
            "fn-installation",
            &config(),
        )
        .await
        .unwrap();
        session.add_package("att-1", "pkg-weekend", 2).unwrap();
        let before = session.summary();

        let err = session.save_draft().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, SessionError::Persistence { .. }));
        assert_eq!(session.summary(), before);
        assert_eq!(before.total_packages, 2);
    }

    #[tokio::test]
    async fn test_stalled_save_times_out() {
        let session = RegistrationSession::start(
            &StaticCatalog,
            Arc::new(StalledStore),
            "fn-installation",
            &config(),
        )
        .await
        .unwrap();
        session.add_ticket("att-1", "tkt-lunch", 1).unwrap();

        let err = session.save_draft().await.unwrap_err();
        assert!(matches!(err, SessionError::SaveTimedOut { secs: 1, .. }));
        assert!(err.is_retryable());
        assert_eq!(session.summary().subtotal, Money::from_cents(7500));
    }

    #[tokio::test]
    async fn test_save_then_resume_reproduces_summary() {
        let (db, session) = db_session().await;
        session.add_package("att-1", "pkg-weekend", 1).unwrap();
        session.add_ticket("att-2", "tkt-lunch", 2).unwrap();

        let record = session.save_draft().await.unwrap();
        assert_eq!(record.revision, 1);

        let resumed = RegistrationSession::resume(
            &db,
            Arc::new(db.clone()),
            session.draft_id(),
            &config(),
        )
        .await
        .unwrap();

        assert_eq!(resumed.summary(), session.summary());
        assert_eq!(
            resumed.with_state(|s| s.selections().clone()),
            session.with_state(|s| s.selections().clone())
        );
    }

    #[tokio::test]
    async fn test_lodge_bulk_through_session() {
        let (_db, session) = db_session().await;
        session.set_registration_type(RegistrationMode::Lodge).unwrap();
        session.set_lodge_bulk_selection("pkg-table", 2).unwrap();

        let summary = session.summary();
        assert_eq!(summary.total_attendees, 20);
        assert_eq!(summary.subtotal, Money::from_cents(390000));

        session.set_registration_type(RegistrationMode::Individuals).unwrap();
        assert!(session.with_state(|s| s.lodge_bulk_selection().is_none()));
    }

    #[tokio::test]
    async fn test_resume_missing_draft() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let result =
            RegistrationSession::resume(&db, Arc::new(db.clone()), "draft-missing", &config()).await;
        assert!(matches!(result, Err(SessionError::DraftNotFound(_))));
    }

    #[tokio::test]
    async fn test_autosave_on_dispatch() {
        let (db, session) = db_session().await;
        let saved = session
            .dispatch_and_save(RegistrationAction::ClearAttendee {
                attendee_id: "att-1".to_string(),
            })
            .await
            .unwrap();

        assert!(saved.is_some());
        assert!(db.drafts().get(session.draft_id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_keeps_function_capture() {
        let (_db, session) = db_session().await;
        session.add_package("att-1", "pkg-weekend", 1).unwrap();
        session.clear().unwrap();

        assert!(session.with_state(|s| s.selections().is_empty()));
        assert!(session.with_state(|s| s.metadata().function.is_some()));
    }
}
