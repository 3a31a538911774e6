//! Proposal use-case service.
//!
//! # Responsibility
//! - Gate submission, editing, deletion and status changes by viewer,
//!   site settings and event policy.
//! - Normalize show routes and build listing/export projections.
//!
//! # Invariants
//! - Recoverable failures are returned as `ServiceError`; callers follow
//!   `ServiceError::redirection()`. `Outcome::Redirect` is reserved for
//!   successful submissions and canonical route changes.
//! - Preview submissions never persist.
//! - Review transitions are applied for administrators only; speaker
//!   confirmation requires ownership, even for administrators.
//! - Private fields are stripped from views unless the viewer may edit.

use crate::config::ProposalSettings;
use crate::export::{
    to_atom, to_csv, to_icalendar, to_json, to_xml, AtomFeed, CalendarOptions, ExportFormat,
};
use crate::listing::{sort_proposals, ProposalSort, SortDirection, SortKey};
use crate::model::event::{Event, EventId};
use crate::model::proposal::{Proposal, ProposalId, ProposalStatus, ProposalValidationError};
use crate::model::user::{is_admin, User, UserId};
use crate::policy::access::{
    can_change_status, can_confirm_or_decline, can_delete, can_edit, can_edit_title,
    notify_acceptance,
};
use crate::policy::fields::exportable_fields;
use crate::policy::transition::{allowed_events, attempt_transition, TransitionEvent};
use crate::policy::visibility::{
    resolve_show_route, schedule_visible, sessions_visible, ShowDecision, ShowRoute,
};
use crate::repo::proposal_repo::ProposalListQuery;
use crate::service::outcome::{
    Flash, Outcome, ProposalForm, Redirect, Redirection, ServiceError, MSG_SIGN_IN,
};
use crate::service::store::ProposalStore;
use jiff::Timestamp;
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

const CURRENT_EVENT_LABEL: &str = "current_event";

/// Whether a create/update request persists or only renders a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitMode {
    #[default]
    Commit,
    Preview,
}

/// Submitted proposal fields; `None` leaves the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProposalInput {
    pub title: Option<String>,
    pub presenter: Option<String>,
    pub email: Option<String>,
    pub excerpt: Option<String>,
    pub description: Option<String>,
    pub note_to_organizers: Option<String>,
    /// Must name a track of the proposal's event; unknown ids clear it.
    pub track_id: Option<Uuid>,
    pub session_type_id: Option<Uuid>,
    /// Epoch milliseconds; honored for administrators only.
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    /// Full speaker list in display order; honored only when multiple
    /// presenters are enabled. Unknown ids are dropped.
    pub speaker_ids: Option<Vec<UserId>>,
}

/// Outcome of resolving a proposal id from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStatus {
    /// Proposal and its event were found.
    AssignedViaParam,
    InvalidProposal,
    /// Proposal exists but has no event.
    InvalidEvent,
}

/// Proposal listing for one event, or for every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalListing {
    pub event: Option<Event>,
    pub proposals: Vec<Proposal>,
    pub sort: ProposalSort,
    pub schedule_visible: bool,
}

/// Confirmed sessions of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionListing {
    pub event: Event,
    pub sessions: Vec<Proposal>,
    pub schedule_visible: bool,
}

/// Serialized export body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub content_type: &'static str,
    pub body: String,
}

/// Data needed to render one proposal page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalView {
    pub proposal: Proposal,
    pub event: Event,
    pub route: ShowRoute,
    pub can_edit: bool,
    /// Show the "your proposal was accepted" confirmation notice.
    pub notify_acceptance: bool,
    pub schedule_visible: bool,
    /// Review transitions offered to administrators.
    pub transitions: Vec<TransitionEvent>,
}

/// Proposal use-case facade over a storage implementation.
pub struct ProposalService<S: ProposalStore> {
    pub(super) store: S,
    pub(super) settings: ProposalSettings,
}

impl<S: ProposalStore> ProposalService<S> {
    pub fn new(store: S, settings: ProposalSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &ProposalSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lists proposals of `event_slug`, or of every event when `None`.
    pub fn index(
        &self,
        event_slug: Option<&str>,
        sort: ProposalSort,
        viewer: Option<&User>,
    ) -> ServiceResult<ProposalListing> {
        let event = event_slug.map(|slug| self.event_by_slug(slug)).transpose()?;
        let query = ProposalListQuery {
            event_id: event.as_ref().map(|event| event.id),
            ..ProposalListQuery::default()
        };
        let mut proposals = self.store.list_proposals(&query)?;
        let shown = match event.as_ref() {
            Some(event) => vec![schedule_visible(event, viewer); proposals.len()],
            None => self.schedule_visibility(&proposals, viewer)?,
        };
        for (proposal, visible) in proposals.iter_mut().zip(&shown) {
            redact(proposal, viewer, *visible);
        }
        let sort = sort.visible_with(shown.iter().all(|visible| *visible));
        sort_proposals(&mut proposals, sort);

        let schedule_visible = match event.as_ref() {
            Some(event) => schedule_visible(event, viewer),
            None => is_admin(viewer) || shown.iter().any(|visible| *visible),
        };

        debug!(
            "event=proposal_index module=service status=ok event_slug={} count={}",
            event_slug.unwrap_or("*"),
            proposals.len()
        );
        Ok(ProposalListing {
            event,
            proposals,
            sort,
            schedule_visible,
        })
    }

    /// Renders the listing of `event_slug` in an export format.
    pub fn export_index(
        &self,
        event_slug: Option<&str>,
        format: ExportFormat,
        viewer: Option<&User>,
    ) -> ServiceResult<Rendered> {
        let listing = self.index(event_slug, ProposalSort::default(), viewer)?;
        let fields = exportable_fields(viewer, listing.schedule_visible);
        let now = now_ms();

        let body = match format {
            ExportFormat::Csv => to_csv(&listing.proposals, &fields)?,
            ExportFormat::Json => to_json(&listing.proposals, &fields)?,
            ExportFormat::Xml => to_xml(&listing.proposals, &fields)?,
            ExportFormat::Atom => {
                to_atom(&self.atom_feed(listing.event.as_ref(), now), &listing.proposals)?
            }
            ExportFormat::ICalendar => {
                let scheduled: Vec<Proposal> = if listing.schedule_visible {
                    listing
                        .proposals
                        .iter()
                        .filter(|proposal| proposal.is_scheduled())
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                };
                to_icalendar(&scheduled, &self.calendar_options(now))?
            }
        };

        info!(
            "event=proposal_export module=service status=ok format={:?} count={} fields={}",
            format,
            listing.proposals.len(),
            fields.len()
        );
        Ok(Rendered {
            content_type: format.content_type(),
            body,
        })
    }

    /// Lists confirmed sessions once statuses are visible to the viewer.
    ///
    /// Without an event slug, redirects to the current event's sessions (or
    /// proposals, while unpublished).
    pub fn sessions_index(
        &self,
        event_slug: Option<&str>,
        sort: ProposalSort,
        viewer: Option<&User>,
    ) -> ServiceResult<Outcome<SessionListing>> {
        let Some(slug) = event_slug else {
            let event = self.current_event()?;
            let target = if sessions_visible(&event, viewer) {
                Redirect::EventSessions(event.slug)
            } else {
                Redirect::EventProposals(event.slug)
            };
            return Ok(Outcome::Redirect(Redirection::to(target)));
        };

        let event = self.event_by_slug(slug)?;
        if !sessions_visible(&event, viewer) {
            debug!("event=sessions_index module=service status=unpublished event_slug={slug}");
            return Ok(Outcome::Redirect(Redirection::to(Redirect::EventProposals(
                event.slug,
            ))));
        }

        let mut sessions = self.store.list_proposals(&ProposalListQuery {
            event_id: Some(event.id),
            statuses: vec![ProposalStatus::Confirmed],
            scheduled_only: false,
        })?;
        let schedule_visible = schedule_visible(&event, viewer);
        for session in &mut sessions {
            redact(session, viewer, schedule_visible);
        }
        sort_proposals(&mut sessions, sort.visible_with(schedule_visible));

        Ok(Outcome::Render(SessionListing {
            event,
            sessions,
            schedule_visible,
        }))
    }

    /// Scheduled confirmed sessions ordered by start time.
    ///
    /// Without an event slug, redirects to the current event's schedule (or
    /// proposals, while hidden).
    pub fn schedule(
        &self,
        event_slug: Option<&str>,
        viewer: Option<&User>,
    ) -> ServiceResult<Outcome<SessionListing>> {
        let Some(slug) = event_slug else {
            let event = self.current_event()?;
            let target = if schedule_visible(&event, viewer) {
                Redirect::EventSchedule(event.slug)
            } else {
                Redirect::EventProposals(event.slug)
            };
            return Ok(Outcome::Redirect(Redirection::to(target)));
        };

        let event = self.event_by_slug(slug)?;
        if !schedule_visible(&event, viewer) {
            debug!("event=schedule module=service status=unpublished event_slug={slug}");
            return Ok(Outcome::Redirect(Redirection::to(Redirect::EventProposals(
                event.slug,
            ))));
        }

        let mut sessions = self.store.list_proposals(&ProposalListQuery {
            event_id: Some(event.id),
            statuses: vec![ProposalStatus::Confirmed],
            scheduled_only: true,
        })?;
        sort_proposals(
            &mut sessions,
            ProposalSort {
                key: SortKey::StartTime,
                direction: SortDirection::Ascending,
            },
        );
        for session in &mut sessions {
            redact(session, viewer, true);
        }

        Ok(Outcome::Render(SessionListing {
            event,
            sessions,
            schedule_visible: true,
        }))
    }

    /// The schedule of `event_slug` as an iCalendar document.
    pub fn schedule_calendar(
        &self,
        event_slug: &str,
        viewer: Option<&User>,
    ) -> ServiceResult<Outcome<Rendered>> {
        let listing = match self.schedule(Some(event_slug), viewer)? {
            Outcome::Render(listing) => listing,
            Outcome::Redirect(redirection) => return Ok(Outcome::Redirect(redirection)),
        };
        let options = self.calendar_options(now_ms());
        let body = to_icalendar(&listing.sessions, &options)?;
        Ok(Outcome::Render(Rendered {
            content_type: ExportFormat::ICalendar.content_type(),
            body,
        }))
    }

    /// Loads a proposal and reports whether it can be shown with its event.
    pub fn lookup_proposal(
        &self,
        id: ProposalId,
    ) -> ServiceResult<(Option<Proposal>, AssignmentStatus)> {
        let Some(proposal) = self.store.get_proposal(id)? else {
            return Ok((None, AssignmentStatus::InvalidProposal));
        };
        let status = if proposal.event_id.is_some() {
            AssignmentStatus::AssignedViaParam
        } else {
            AssignmentStatus::InvalidEvent
        };
        Ok((Some(proposal), status))
    }

    /// Loads a proposal together with its event.
    ///
    /// # Errors
    /// - `ProposalNotFound` for unknown ids.
    /// - `EventMissing` when the proposal has no (loadable) event.
    pub fn assign_proposal_and_event(&self, id: ProposalId) -> ServiceResult<(Proposal, Event)> {
        let (proposal, status) = self.lookup_proposal(id)?;
        let proposal = match (proposal, status) {
            (Some(proposal), AssignmentStatus::AssignedViaParam) => proposal,
            (_, AssignmentStatus::InvalidEvent) => return Err(self.event_missing(id)),
            _ => {
                warn!("event=proposal_lookup module=service status=not_found proposal_id={id}");
                return Err(ServiceError::ProposalNotFound(Some(id)));
            }
        };

        let event = match proposal.event_id {
            Some(event_id) => self.store.get_event(event_id)?,
            None => None,
        };
        match event {
            Some(event) => Ok((proposal, event)),
            None => Err(self.event_missing(id)),
        }
    }

    /// Renders a proposal, or redirects to its canonical route.
    pub fn show(
        &self,
        id: ProposalId,
        route: ShowRoute,
        viewer: Option<&User>,
    ) -> ServiceResult<Outcome<ProposalView>> {
        let (mut proposal, event) = self.assign_proposal_and_event(id)?;

        match resolve_show_route(&event, &proposal, viewer, route) {
            ShowDecision::Display => {}
            ShowDecision::RedirectTo(ShowRoute::Proposal) => {
                return Ok(Outcome::Redirect(Redirection::to(Redirect::Proposal(id))));
            }
            ShowDecision::RedirectTo(ShowRoute::Session) => {
                return Ok(Outcome::Redirect(Redirection::to(Redirect::Session(id))));
            }
        }

        let editable = can_edit(viewer, &proposal);
        let notify = notify_acceptance(viewer, &proposal, &event);
        let schedule_visible = schedule_visible(&event, viewer);
        let transitions = if can_change_status(viewer) {
            allowed_events(proposal.status)
                .into_iter()
                .filter(|event| event.is_review())
                .collect()
        } else {
            Vec::new()
        };
        redact(&mut proposal, viewer, schedule_visible);

        Ok(Outcome::Render(ProposalView {
            proposal,
            event,
            route,
            can_edit: editable,
            notify_acceptance: notify,
            schedule_visible,
            transitions,
        }))
    }

    /// Blank submission form for `event_slug`.
    pub fn new_proposal(
        &self,
        event_slug: &str,
        viewer: Option<&User>,
    ) -> ServiceResult<ProposalForm> {
        let event = self.event_by_slug(event_slug)?;
        self.check_submission_gates(&event, viewer)?;

        let proposal = draft_proposal(&event, viewer);
        Ok(ProposalForm {
            proposal,
            errors: Vec::new(),
            title_editable: true,
            preview: false,
        })
    }

    /// Submits a new proposal.
    ///
    /// Renders the form when fields are invalid or `mode` is a preview;
    /// otherwise persists and redirects to the new proposal.
    pub fn create(
        &self,
        event_slug: &str,
        input: &ProposalInput,
        viewer: Option<&User>,
        mode: SubmitMode,
    ) -> ServiceResult<Outcome<ProposalForm>> {
        let event = self.event_by_slug(event_slug)?;
        self.check_submission_gates(&event, viewer)?;

        let mut proposal = draft_proposal(&event, viewer);
        self.apply_input(&mut proposal, &event, input, viewer, true)?;
        let form = self.build_form(proposal, true, mode);

        if !form.is_valid() {
            debug!(
                "event=proposal_create module=service status=invalid errors={}",
                form.errors.len()
            );
            return Ok(Outcome::Render(form));
        }
        if mode == SubmitMode::Preview {
            return Ok(Outcome::Render(form));
        }

        let id = self.store.create_proposal(&form.proposal)?;
        info!(
            "event=proposal_create module=service status=ok proposal_id={id} event_slug={}",
            event.slug
        );
        Ok(Outcome::Redirect(Redirection::with_flash(
            Redirect::Proposal(id),
            Flash::success("Thanks for submitting your proposal!"),
        )))
    }

    /// Edit form for an existing proposal.
    pub fn edit(&self, id: ProposalId, viewer: Option<&User>) -> ServiceResult<ProposalForm> {
        let (proposal, event) = self.load_editable(id, viewer)?;
        Ok(ProposalForm {
            proposal,
            errors: Vec::new(),
            title_editable: can_edit_title(viewer, &event),
            preview: false,
        })
    }

    /// Updates an existing proposal, optionally applying a review transition.
    ///
    /// # Errors
    /// - `LoginRequired` / `Unauthorized` for viewers who may not edit.
    /// - `UnknownTransition` / `InvalidTransition` when an administrator asks
    ///   for an event the vocabulary or current status does not allow.
    /// - `Unauthorized` when `confirm`/`decline` comes from an administrator
    ///   who does not own the proposal.
    pub fn update(
        &self,
        id: ProposalId,
        input: &ProposalInput,
        transition: Option<&str>,
        viewer: Option<&User>,
        mode: SubmitMode,
    ) -> ServiceResult<Outcome<ProposalForm>> {
        let (mut proposal, event) = self.load_editable(id, viewer)?;

        let title_editable = can_edit_title(viewer, &event);
        self.apply_input(&mut proposal, &event, input, viewer, title_editable)?;
        let mut form = self.build_form(proposal, title_editable, mode);

        if !form.is_valid() || mode == SubmitMode::Preview {
            return Ok(Outcome::Render(form));
        }

        if let Some(name) = transition.map(str::trim).filter(|name| !name.is_empty()) {
            if can_change_status(viewer) {
                let requested: TransitionEvent = name.parse()?;
                if !requested.is_review() && !can_confirm_or_decline(viewer, &form.proposal) {
                    warn!(
                        "event=proposal_update module=service status=denied proposal_id={id} transition={requested}"
                    );
                    return Err(ServiceError::Unauthorized(id));
                }
                attempt_transition(&mut form.proposal, requested)?;
            } else {
                debug!(
                    "event=proposal_update module=service status=transition_ignored proposal_id={id}"
                );
            }
        }

        self.store.update_proposal(&form.proposal)?;
        info!(
            "event=proposal_update module=service status=ok proposal_id={id} state={}",
            form.proposal.status
        );
        Ok(Outcome::Redirect(Redirection::with_flash(
            Redirect::Proposal(id),
            Flash::success("Updated proposal."),
        )))
    }

    /// Deletes a proposal and returns to its event listing.
    pub fn destroy(&self, id: ProposalId, viewer: Option<&User>) -> ServiceResult<Outcome<()>> {
        let user = viewer.ok_or(ServiceError::LoginRequired)?;
        let (proposal, event) = self.assign_proposal_and_event(id)?;
        if !can_delete(viewer, &proposal) {
            warn!(
                "event=proposal_destroy module=service status=denied proposal_id={id} user_id={}",
                user.id
            );
            return Err(ServiceError::Unauthorized(id));
        }

        self.store.delete_proposal(id)?;
        info!("event=proposal_destroy module=service status=ok proposal_id={id}");
        Ok(Outcome::Redirect(Redirection::with_flash(
            Redirect::EventProposals(event.slug),
            Flash::success(format!("Deleted proposal: {}", proposal.title)),
        )))
    }

    /// Speaker confirms an accepted proposal.
    pub fn speaker_confirm(
        &self,
        id: ProposalId,
        viewer: Option<&User>,
    ) -> ServiceResult<Outcome<()>> {
        self.speaker_transition(id, viewer, TransitionEvent::Confirm)
    }

    /// Speaker declines an accepted proposal.
    pub fn speaker_decline(
        &self,
        id: ProposalId,
        viewer: Option<&User>,
    ) -> ServiceResult<Outcome<()>> {
        self.speaker_transition(id, viewer, TransitionEvent::Decline)
    }

    /// Sends anonymous viewers to sign in, everyone else to the proposal.
    pub fn proposal_login_required(&self, id: ProposalId, viewer: Option<&User>) -> Outcome<()> {
        let redirection = match viewer {
            Some(_) => Redirection::to(Redirect::Proposal(id)),
            None => Redirection::with_flash(Redirect::SignIn, Flash::notice(MSG_SIGN_IN)),
        };
        Outcome::Redirect(redirection)
    }

    fn speaker_transition(
        &self,
        id: ProposalId,
        viewer: Option<&User>,
        event: TransitionEvent,
    ) -> ServiceResult<Outcome<()>> {
        let user = viewer.ok_or(ServiceError::LoginRequired)?;
        let (mut proposal, _) = self.assign_proposal_and_event(id)?;
        if !proposal.is_owned_by(user.id) {
            warn!(
                "event=speaker_{} module=service status=denied proposal_id={id} user_id={}",
                event, user.id
            );
            return Err(ServiceError::Unauthorized(id));
        }

        let status = attempt_transition(&mut proposal, event)?;
        self.store.update_proposal(&proposal)?;
        info!("event=speaker_{event} module=service status=ok proposal_id={id}");
        Ok(Outcome::Redirect(Redirection::with_flash(
            Redirect::Proposal(id),
            Flash::success(format!("Updated status to {status}.")),
        )))
    }

    fn load_editable(
        &self,
        id: ProposalId,
        viewer: Option<&User>,
    ) -> ServiceResult<(Proposal, Event)> {
        let user = viewer.ok_or(ServiceError::LoginRequired)?;
        let (proposal, event) = self.assign_proposal_and_event(id)?;
        if !can_edit(viewer, &proposal) {
            warn!(
                "event=proposal_edit module=service status=denied proposal_id={id} user_id={}",
                user.id
            );
            return Err(ServiceError::Unauthorized(id));
        }
        Ok((proposal, event))
    }

    fn check_submission_gates(&self, event: &Event, viewer: Option<&User>) -> ServiceResult<()> {
        if !event.policy.accepting_proposals {
            debug!(
                "event=proposal_submit module=service status=closed event_slug={}",
                event.slug
            );
            return Err(ServiceError::EventClosed(event.slug.clone()));
        }
        match viewer {
            None if !self.settings.have_anonymous_proposals => Err(ServiceError::LoginRequired),
            Some(user) if self.settings.have_user_profiles && !user.complete_profile => {
                Err(ServiceError::IncompleteProfile(user.id))
            }
            _ => Ok(()),
        }
    }

    fn apply_input(
        &self,
        proposal: &mut Proposal,
        event: &Event,
        input: &ProposalInput,
        viewer: Option<&User>,
        title_editable: bool,
    ) -> ServiceResult<()> {
        if let Some(title) = input.title.as_deref() {
            if title_editable {
                proposal.title = title.trim().to_string();
            } else if title.trim() != proposal.title {
                debug!(
                    "event=proposal_update module=service status=title_locked proposal_id={}",
                    proposal.id
                );
            }
        }
        if let Some(presenter) = input.presenter.as_deref() {
            proposal.presenter = presenter.trim().to_string();
        }
        if let Some(email) = input.email.as_deref() {
            proposal.email = non_blank(email);
        }
        if self.settings.have_proposal_excerpts {
            if let Some(excerpt) = input.excerpt.as_deref() {
                proposal.excerpt = excerpt.trim().to_string();
            }
        }
        if let Some(description) = input.description.as_deref() {
            proposal.description = description.trim().to_string();
        }
        if let Some(note) = input.note_to_organizers.as_deref() {
            proposal.note_to_organizers = non_blank(note);
        }
        if let Some(track_id) = input.track_id {
            proposal.track = event.tracks.iter().find(|track| track.id == track_id).cloned();
        }
        if let Some(session_type_id) = input.session_type_id {
            proposal.session_type = event
                .session_types
                .iter()
                .find(|session_type| session_type.id == session_type_id)
                .cloned();
        }
        if is_admin(viewer) {
            if input.start_time.is_some() {
                proposal.start_time = input.start_time;
            }
            if input.end_time.is_some() {
                proposal.end_time = input.end_time;
            }
        }
        if self.settings.have_multiple_presenters {
            if let Some(speaker_ids) = input.speaker_ids.as_deref() {
                let mut speakers = Vec::with_capacity(speaker_ids.len());
                for user_id in speaker_ids {
                    match self.store.get_user(*user_id)? {
                        Some(user) => speakers.push(user),
                        None => debug!(
                            "event=proposal_speakers module=service status=skipped user_id={user_id}"
                        ),
                    }
                }
                proposal.users.clear();
                for user in speakers {
                    proposal.add_user(user);
                }
            }
        }
        Ok(())
    }

    fn build_form(&self, proposal: Proposal, title_editable: bool, mode: SubmitMode) -> ProposalForm {
        let mut errors = proposal.validation_errors();
        if self.settings.have_user_profiles {
            errors.extend(
                proposal
                    .users
                    .iter()
                    .filter(|user| !user.complete_profile)
                    .map(|user| ProposalValidationError::IncompleteOwnerProfile(user.id)),
            );
        }
        ProposalForm {
            proposal,
            errors,
            title_editable,
            preview: mode == SubmitMode::Preview,
        }
    }

    fn event_missing(&self, proposal_id: ProposalId) -> ServiceError {
        warn!("event=proposal_lookup module=service status=event_missing proposal_id={proposal_id}");
        ServiceError::EventMissing {
            proposal_id,
            current_event: self.settings.current_event.clone(),
        }
    }

    pub(super) fn event_by_slug(&self, slug: &str) -> ServiceResult<Event> {
        let slug = slug.trim();
        self.store
            .find_event_by_slug(slug)?
            .ok_or_else(|| ServiceError::EventNotFound(slug.to_string()))
    }

    fn current_event(&self) -> ServiceResult<Event> {
        let slug = self
            .settings
            .current_event
            .as_deref()
            .ok_or_else(|| ServiceError::EventNotFound(CURRENT_EVENT_LABEL.to_string()))?;
        self.event_by_slug(slug)
    }

    fn atom_feed(&self, event: Option<&Event>, now: i64) -> AtomFeed {
        let path = match event {
            Some(event) => Redirect::EventProposals(event.slug.clone()).path(),
            None => Redirect::ProposalList.path(),
        };
        let link = self.settings.base_url.as_deref().map(|base| format!("{base}{path}"));
        let id = match (event, link.as_deref()) {
            (_, Some(link)) => link.to_string(),
            (Some(event), None) => format!("urn:uuid:{}", event.id),
            (None, None) => "urn:proposals:all".to_string(),
        };
        let title = match event {
            Some(event) => format!("Proposals: {}", event.title),
            None => "Proposals".to_string(),
        };
        AtomFeed {
            id,
            title,
            link,
            generated_at: now,
        }
    }

    /// Schedule visibility per proposal, decided by each proposal's own
    /// event. Proposals without an event are shown to administrators only.
    fn schedule_visibility(
        &self,
        proposals: &[Proposal],
        viewer: Option<&User>,
    ) -> ServiceResult<Vec<bool>> {
        let mut by_event: HashMap<EventId, bool> = HashMap::new();
        let mut shown = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            let visible = match proposal.event_id {
                Some(event_id) => match by_event.get(&event_id) {
                    Some(visible) => *visible,
                    None => {
                        let visible = self
                            .store
                            .get_event(event_id)?
                            .map_or(is_admin(viewer), |event| schedule_visible(&event, viewer));
                        by_event.insert(event_id, visible);
                        visible
                    }
                },
                None => is_admin(viewer),
            };
            shown.push(visible);
        }
        Ok(shown)
    }

    fn calendar_options(&self, now: i64) -> CalendarOptions {
        CalendarOptions {
            base_url: self.settings.base_url.clone(),
            generated_at: now,
        }
    }
}

/// Parses a raw route id; malformed values are reported as not found.
pub fn parse_proposal_id(raw: &str) -> ServiceResult<ProposalId> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::ProposalNotFound(None))
}

/// New proposal prefilled from the viewer and the event's sole track and
/// session type; the viewer becomes the first owner.
fn draft_proposal(event: &Event, viewer: Option<&User>) -> Proposal {
    let presenter = viewer.map(|user| user.fullname.clone()).unwrap_or_default();
    let mut proposal = Proposal::new(event.id, String::new(), presenter, now_ms());
    proposal.track = event.sole_track().cloned();
    proposal.session_type = event.sole_session_type().cloned();
    if let Some(user) = viewer {
        proposal.email = Some(user.email.clone());
        proposal.add_user(user.clone());
    }
    proposal
}

/// Strips what `viewer` may not see: contact data and organizer notes
/// unless they may edit, and timing unless the schedule is visible.
fn redact(proposal: &mut Proposal, viewer: Option<&User>, schedule_visible: bool) {
    if !can_edit(viewer, proposal) {
        proposal.email = None;
        proposal.note_to_organizers = None;
    }
    if !schedule_visible {
        proposal.start_time = None;
        proposal.end_time = None;
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn now_ms() -> i64 {
    Timestamp::now().as_millisecond()
}
