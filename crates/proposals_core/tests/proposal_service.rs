use proposals_core::db::open_db_in_memory;
use proposals_core::repo::event_repo::EventRepository;
use proposals_core::repo::proposal_repo::ProposalRepository;
use proposals_core::repo::user_repo::UserRepository;
use proposals_core::service::{AssignmentStatus, FlashKind, ProposalForm, Redirection};
use proposals_core::{
    Event, Outcome, Proposal, ProposalInput, ProposalService, ProposalSettings, ProposalStatus,
    ProposalValidationError, Redirect, ServiceError, ShowRoute, SqliteStore, SubmitMode, Track,
    TransitionEvent, User,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Fixture {
    conn: Connection,
    event: Event,
    quentin: User,
    clio: User,
    aaron: User,
}

impl Fixture {
    fn new() -> Self {
        Self::with_event(Event::new("open", "Open Source Bridge"))
    }

    fn with_event(event: Event) -> Self {
        let conn = open_db_in_memory().unwrap();
        let quentin = User::new("Quentin", "quentin@example.com");
        let clio = User::new("Clio", "clio@example.com");
        let aaron = User::admin("Aaron", "aaron@example.com");
        {
            let store = SqliteStore::new(&conn);
            store.create_event(&event).unwrap();
            for user in [&quentin, &clio, &aaron] {
                store.create_user(user).unwrap();
            }
        }
        Self {
            conn,
            event,
            quentin,
            clio,
            aaron,
        }
    }

    fn service(&self) -> ProposalService<SqliteStore<'_>> {
        self.service_with(ProposalSettings {
            current_event: Some("open".to_string()),
            ..ProposalSettings::default()
        })
    }

    fn service_with(&self, settings: ProposalSettings) -> ProposalService<SqliteStore<'_>> {
        ProposalService::new(SqliteStore::new(&self.conn), settings)
    }

    /// Quentin's proposal in the fixture event.
    fn widgets(&self, status: ProposalStatus) -> Proposal {
        let mut proposal = Proposal::new(self.event.id, "Widgets", "Quentin", 1_000);
        proposal.excerpt = "All about widgets".to_string();
        proposal.email = Some("quentin@example.com".to_string());
        proposal.note_to_organizers = Some("needs projector".to_string());
        proposal.status = status;
        proposal.add_user(self.quentin.clone());
        SqliteStore::new(&self.conn)
            .create_proposal(&proposal)
            .unwrap();
        proposal
    }

    fn reload(&self, proposal: &Proposal) -> Option<Proposal> {
        SqliteStore::new(&self.conn)
            .get_proposal(proposal.id)
            .unwrap()
    }
}

fn redirection<T: std::fmt::Debug>(outcome: Outcome<T>) -> Redirection {
    match outcome {
        Outcome::Redirect(redirection) => redirection,
        Outcome::Render(value) => panic!("expected redirect, got render: {value:?}"),
    }
}

fn rendered<T>(outcome: Outcome<T>) -> T {
    outcome.rendered().expect("expected render")
}

fn recovery(err: ServiceError) -> Redirection {
    err.redirection()
        .unwrap_or_else(|| panic!("expected recoverable error, got {err}"))
}

fn published_event() -> Event {
    let mut event = Event::new("open", "Open Source Bridge");
    event.policy.proposal_status_published = true;
    event
}

#[test]
fn show_displays_extant_proposal_and_hides_private_fields() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let service = fx.service();

    let view = rendered(service.show(proposal.id, ShowRoute::Proposal, None).unwrap());
    assert_eq!(view.proposal.id, proposal.id);
    assert!(!view.can_edit);
    assert_eq!(view.proposal.email, None);
    assert_eq!(view.proposal.note_to_organizers, None);

    let view = rendered(
        service
            .show(proposal.id, ShowRoute::Proposal, Some(&fx.quentin))
            .unwrap(),
    );
    assert!(view.can_edit);
    assert_eq!(view.proposal.note_to_organizers.as_deref(), Some("needs projector"));
    assert!(view.transitions.is_empty());

    let view = rendered(
        service
            .show(proposal.id, ShowRoute::Proposal, Some(&fx.aaron))
            .unwrap(),
    );
    assert_eq!(
        view.transitions,
        vec![
            TransitionEvent::Accept,
            TransitionEvent::Reject,
            TransitionEvent::MarkAsJunk
        ]
    );
}

#[test]
fn show_unknown_proposal_redirects_to_listing_with_failure() {
    let fx = Fixture::new();
    let err = fx
        .service()
        .show(Uuid::new_v4(), ShowRoute::Proposal, None)
        .unwrap_err();
    let redirection = recovery(err);
    assert_eq!(redirection.target, Redirect::ProposalList);
    let flash = redirection.flash.expect("failure flash");
    assert_eq!(flash.kind, FlashKind::Failure);
    assert_eq!(
        flash.message,
        "Sorry, that presentation proposal doesn't exist or has been deleted."
    );
}

#[test]
fn show_proposal_without_event_redirects_to_current_event() {
    let fx = Fixture::new();
    let mut orphan = Proposal::new(fx.event.id, "Orphan", "Nobody", 1_000);
    orphan.event_id = None;
    SqliteStore::new(&fx.conn).create_proposal(&orphan).unwrap();

    let service = fx.service();
    let (found, status) = service.lookup_proposal(orphan.id).unwrap();
    assert_eq!(found.map(|p| p.id), Some(orphan.id));
    assert_eq!(status, AssignmentStatus::InvalidEvent);

    let err = service
        .show(orphan.id, ShowRoute::Proposal, None)
        .unwrap_err();
    let redirection = recovery(err);
    assert_eq!(redirection.target, Redirect::EventProposals("open".to_string()));
    assert_eq!(
        redirection.flash.unwrap().message,
        format!("Sorry, no event was associated with proposal #{}", orphan.id)
    );
}

#[test]
fn lookup_reports_assignment_status() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let service = fx.service();

    let (found, status) = service.lookup_proposal(proposal.id).unwrap();
    assert!(found.is_some());
    assert_eq!(status, AssignmentStatus::AssignedViaParam);

    let (found, status) = service.lookup_proposal(Uuid::new_v4()).unwrap();
    assert!(found.is_none());
    assert_eq!(status, AssignmentStatus::InvalidProposal);

    let (loaded, event) = service.assign_proposal_and_event(proposal.id).unwrap();
    assert_eq!(loaded.id, proposal.id);
    assert_eq!(event.id, fx.event.id);
}

#[test]
fn show_routes_are_normalized_when_statuses_are_published() {
    let fx = Fixture::with_event(published_event());
    let confirmed = fx.widgets(ProposalStatus::Confirmed);
    let proposed = fx.widgets(ProposalStatus::Proposed);
    let service = fx.service();

    let redirect = redirection(
        service
            .show(confirmed.id, ShowRoute::Proposal, None)
            .unwrap(),
    );
    assert_eq!(redirect.target, Redirect::Session(confirmed.id));

    let redirect = redirection(service.show(proposed.id, ShowRoute::Session, None).unwrap());
    assert_eq!(redirect.target, Redirect::Proposal(proposed.id));

    let view = rendered(service.show(confirmed.id, ShowRoute::Session, None).unwrap());
    assert_eq!(view.route, ShowRoute::Session);
    let view = rendered(service.show(proposed.id, ShowRoute::Proposal, None).unwrap());
    assert_eq!(view.route, ShowRoute::Proposal);
}

#[test]
fn show_routes_when_statuses_are_not_published() {
    let fx = Fixture::new();
    let confirmed = fx.widgets(ProposalStatus::Confirmed);
    let proposed = fx.widgets(ProposalStatus::Proposed);
    let service = fx.service();

    let view = rendered(
        service
            .show(confirmed.id, ShowRoute::Session, Some(&fx.aaron))
            .unwrap(),
    );
    assert_eq!(view.proposal.id, confirmed.id);

    let redirect = redirection(service.show(confirmed.id, ShowRoute::Session, None).unwrap());
    assert_eq!(redirect.target, Redirect::Proposal(confirmed.id));

    let redirect = redirection(service.show(proposed.id, ShowRoute::Session, None).unwrap());
    assert_eq!(redirect.target, Redirect::Proposal(proposed.id));

    assert!(service
        .show(confirmed.id, ShowRoute::Proposal, None)
        .unwrap()
        .rendered()
        .is_some());
}

#[test]
fn sessions_of_an_old_event_follow_that_events_publication() {
    let fx = Fixture::new();
    let mut old = Event::new("old", "Last Year");
    old.policy.proposal_status_published = true;
    SqliteStore::new(&fx.conn).create_event(&old).unwrap();
    let mut session = Proposal::new(old.id, "Retro", "Quentin", 1_000);
    session.status = ProposalStatus::Confirmed;
    SqliteStore::new(&fx.conn).create_proposal(&session).unwrap();

    let view = rendered(
        fx.service()
            .show(session.id, ShowRoute::Session, None)
            .unwrap(),
    );
    assert_eq!(view.event.slug, "old");
}

#[test]
fn acceptance_notice_is_shown_to_owners_only() {
    let fx = Fixture::new();
    let accepted = fx.widgets(ProposalStatus::Accepted);
    let service = fx.service();

    let view = rendered(
        service
            .show(accepted.id, ShowRoute::Proposal, Some(&fx.quentin))
            .unwrap(),
    );
    assert!(view.notify_acceptance);

    let view = rendered(
        service
            .show(accepted.id, ShowRoute::Proposal, Some(&fx.clio))
            .unwrap(),
    );
    assert!(!view.notify_acceptance);

    for status in [
        ProposalStatus::Proposed,
        ProposalStatus::Rejected,
        ProposalStatus::Junk,
    ] {
        let proposal = fx.widgets(status);
        let view = rendered(
            service
                .show(proposal.id, ShowRoute::Proposal, Some(&fx.quentin))
                .unwrap(),
        );
        assert!(!view.notify_acceptance, "status {status}");
    }
}

#[test]
fn acceptance_notice_respects_hidden_confirmation_controls() {
    let mut event = Event::new("open", "Open Source Bridge");
    event.policy.show_proposal_confirmation_controls = false;
    let fx = Fixture::with_event(event);
    let accepted = fx.widgets(ProposalStatus::Accepted);

    let view = rendered(
        fx.service()
            .show(accepted.id, ShowRoute::Proposal, Some(&fx.quentin))
            .unwrap(),
    );
    assert!(!view.notify_acceptance);
}

#[test]
fn new_redirects_incomplete_profiles_to_profile_form() {
    let fx = Fixture::new();
    let mut incomplete = User::new("Newbie", "newbie@example.com");
    incomplete.complete_profile = false;
    let service = fx.service_with(ProposalSettings {
        have_user_profiles: true,
        ..ProposalSettings::default()
    });

    let redirection = recovery(service.new_proposal("open", Some(&incomplete)).unwrap_err());
    assert_eq!(redirection.target, Redirect::EditProfile(incomplete.id));
    assert_eq!(redirection.flash.unwrap().kind, FlashKind::Notice);
    assert_eq!(
        redirection.target.path(),
        format!("/users/{}/edit?require_complete_profile=true", incomplete.id)
    );

    let form = service.new_proposal("open", Some(&fx.quentin)).unwrap();
    assert!(form.errors.is_empty());
}

#[test]
fn new_handles_anonymous_visitors_per_settings() {
    let fx = Fixture::new();

    let closed_to_anonymous = fx.service();
    let redirection = recovery(closed_to_anonymous.new_proposal("open", None).unwrap_err());
    assert_eq!(redirection.target, Redirect::SignIn);
    assert_eq!(redirection.flash.unwrap().kind, FlashKind::Notice);

    let open_to_anonymous = fx.service_with(ProposalSettings {
        have_anonymous_proposals: true,
        ..ProposalSettings::default()
    });
    let form = open_to_anonymous.new_proposal("open", None).unwrap();
    assert_eq!(form.proposal.presenter, "");
    assert!(form.proposal.users.is_empty());

    let form = open_to_anonymous.new_proposal("open", Some(&fx.quentin)).unwrap();
    assert_eq!(form.proposal.presenter, "Quentin");
    assert_eq!(form.proposal.users, vec![fx.quentin.clone()]);
}

#[test]
fn new_assigns_sole_track_and_session_type() {
    let mut event = Event::new("open", "Open Source Bridge");
    event.tracks = vec![Track::new("Cooking")];
    event.session_types = vec![
        proposals_core::SessionType::new("Short"),
        proposals_core::SessionType::new("Long"),
    ];
    let fx = Fixture::with_event(event);

    let form = fx.service().new_proposal("open", Some(&fx.quentin)).unwrap();
    assert_eq!(form.proposal.track, Some(fx.event.tracks[0].clone()));
    assert_eq!(form.proposal.session_type, None);
}

#[test]
fn new_and_create_refuse_closed_events() {
    let mut event = Event::new("open", "Open Source Bridge");
    event.policy.accepting_proposals = false;
    let fx = Fixture::with_event(event);
    let service = fx.service();

    let redirection = recovery(service.new_proposal("open", Some(&fx.quentin)).unwrap_err());
    assert_eq!(redirection.target, Redirect::EventProposals("open".to_string()));

    let input = ProposalInput {
        title: Some("Late".to_string()),
        ..ProposalInput::default()
    };
    let err = service
        .create("open", &input, Some(&fx.quentin), SubmitMode::Commit)
        .unwrap_err();
    assert!(matches!(err, ServiceError::EventClosed(_)));
}

#[test]
fn create_persists_proposal_owned_by_submitter() {
    let fx = Fixture::new();
    let input = ProposalInput {
        title: Some("  Gadgets  ".to_string()),
        excerpt: Some("Gadget tour".to_string()),
        ..ProposalInput::default()
    };

    let redirection = redirection(
        fx.service()
            .create("open", &input, Some(&fx.quentin), SubmitMode::Commit)
            .unwrap(),
    );
    let Redirect::Proposal(id) = redirection.target else {
        panic!("expected proposal redirect, got {:?}", redirection.target);
    };
    assert_eq!(redirection.flash.unwrap().kind, FlashKind::Success);

    let saved = SqliteStore::new(&fx.conn).get_proposal(id).unwrap().unwrap();
    assert_eq!(saved.title, "Gadgets");
    assert_eq!(saved.presenter, "Quentin");
    assert_eq!(saved.status, ProposalStatus::Proposed);
    assert_eq!(saved.users, vec![fx.quentin.clone()]);
}

#[test]
fn create_renders_form_with_errors_when_presenter_missing() {
    let fx = Fixture::new();
    let service = fx.service_with(ProposalSettings {
        have_anonymous_proposals: true,
        ..ProposalSettings::default()
    });
    let input = ProposalInput {
        title: Some("Widgets".to_string()),
        ..ProposalInput::default()
    };

    let form: ProposalForm =
        rendered(service.create("open", &input, None, SubmitMode::Commit).unwrap());
    assert_eq!(form.errors, vec![ProposalValidationError::MissingPresenter]);
    assert_eq!(form.errors[0].field(), "presenter");
    assert!(count_proposals(&fx.conn) == 0);
}

#[test]
fn create_preview_never_persists() {
    let fx = Fixture::new();
    let service = fx.service_with(ProposalSettings {
        have_anonymous_proposals: true,
        ..ProposalSettings::default()
    });
    let input = ProposalInput {
        title: Some("Widgets".to_string()),
        presenter: Some("Anonymous Coward".to_string()),
        ..ProposalInput::default()
    };

    let form = rendered(service.create("open", &input, None, SubmitMode::Preview).unwrap());
    assert!(form.preview);
    assert!(form.is_valid());
    assert_eq!(count_proposals(&fx.conn), 0);

    let outcome = service.create("open", &input, None, SubmitMode::Commit).unwrap();
    assert!(outcome.redirection().is_some());
    assert_eq!(count_proposals(&fx.conn), 1);
}

#[test]
fn create_requires_sign_in_without_anonymous_proposals() {
    let fx = Fixture::new();
    let input = ProposalInput {
        title: Some("Widgets".to_string()),
        presenter: Some("Someone".to_string()),
        ..ProposalInput::default()
    };
    let err = fx
        .service()
        .create("open", &input, None, SubmitMode::Commit)
        .unwrap_err();
    assert_eq!(recovery(err).target, Redirect::SignIn);
    assert_eq!(count_proposals(&fx.conn), 0);
}

#[test]
fn create_rejects_incomplete_profiles_when_profiles_enabled() {
    let fx = Fixture::new();
    let mut incomplete = User::new("Newbie", "newbie@example.com");
    incomplete.complete_profile = false;
    let service = fx.service_with(ProposalSettings {
        have_user_profiles: true,
        ..ProposalSettings::default()
    });
    let input = ProposalInput {
        title: Some("Widgets".to_string()),
        ..ProposalInput::default()
    };

    let err = service
        .create("open", &input, Some(&incomplete), SubmitMode::Commit)
        .unwrap_err();
    assert!(matches!(err, ServiceError::IncompleteProfile(id) if id == incomplete.id));
    assert_eq!(count_proposals(&fx.conn), 0);
}

#[test]
fn update_keeps_title_when_titles_are_locked() {
    let mut event = Event::new("open", "Open Source Bridge");
    event.policy.proposal_titles_locked = true;
    let fx = Fixture::with_event(event);
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let input = ProposalInput {
        title: Some("Renamed".to_string()),
        excerpt: Some("New excerpt".to_string()),
        ..ProposalInput::default()
    };

    let edit = fx.service().edit(proposal.id, Some(&fx.quentin)).unwrap();
    assert!(!edit.title_editable);

    fx.service()
        .update(proposal.id, &input, None, Some(&fx.quentin), SubmitMode::Commit)
        .unwrap();
    let saved = fx.reload(&proposal).unwrap();
    assert_eq!(saved.title, "Widgets");
    assert_eq!(saved.excerpt, "New excerpt");

    fx.service()
        .update(proposal.id, &input, None, Some(&fx.aaron), SubmitMode::Commit)
        .unwrap();
    assert_eq!(fx.reload(&proposal).unwrap().title, "Renamed");
}

#[test]
fn update_gates_anonymous_and_non_owner_viewers() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let input = ProposalInput {
        title: Some("Hijacked".to_string()),
        ..ProposalInput::default()
    };
    let service = fx.service();

    let err = service
        .update(proposal.id, &input, None, None, SubmitMode::Commit)
        .unwrap_err();
    assert_eq!(recovery(err).target, Redirect::SignIn);

    let err = service
        .update(proposal.id, &input, None, Some(&fx.clio), SubmitMode::Commit)
        .unwrap_err();
    let redirection = recovery(err);
    assert_eq!(redirection.target, Redirect::Proposal(proposal.id));
    assert_eq!(redirection.flash.unwrap().kind, FlashKind::Failure);

    assert_eq!(fx.reload(&proposal).unwrap().title, "Widgets");
}

#[test]
fn update_by_owner_and_admin_redirects_with_success() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let input = ProposalInput {
        description: Some("Longer description".to_string()),
        ..ProposalInput::default()
    };

    for viewer in [&fx.quentin, &fx.aaron] {
        let redirection = redirection(
            fx.service()
                .update(proposal.id, &input, None, Some(viewer), SubmitMode::Commit)
                .unwrap(),
        );
        assert_eq!(redirection.target, Redirect::Proposal(proposal.id));
        assert_eq!(redirection.flash.unwrap().kind, FlashKind::Success);
    }
    assert_eq!(fx.reload(&proposal).unwrap().description, "Longer description");
}

#[test]
fn update_renders_form_for_invalid_fields_and_previews() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let service = fx.service();

    let blank_title = ProposalInput {
        title: Some(String::new()),
        ..ProposalInput::default()
    };
    let form = rendered(
        service
            .update(
                proposal.id,
                &blank_title,
                None,
                Some(&fx.quentin),
                SubmitMode::Commit,
            )
            .unwrap(),
    );
    assert_eq!(form.errors, vec![ProposalValidationError::MissingTitle]);

    let preview = ProposalInput {
        title: Some("Preview title".to_string()),
        ..ProposalInput::default()
    };
    let form = rendered(
        service
            .update(
                proposal.id,
                &preview,
                None,
                Some(&fx.quentin),
                SubmitMode::Preview,
            )
            .unwrap(),
    );
    assert_eq!(form.proposal.title, "Preview title");
    assert_eq!(fx.reload(&proposal).unwrap().title, "Widgets");
}

#[test]
fn only_admins_change_status_through_update() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let input = ProposalInput::default();

    fx.service()
        .update(
            proposal.id,
            &input,
            Some("accept"),
            Some(&fx.quentin),
            SubmitMode::Commit,
        )
        .unwrap();
    assert_eq!(fx.reload(&proposal).unwrap().status, ProposalStatus::Proposed);

    fx.service()
        .update(
            proposal.id,
            &input,
            Some("accept"),
            Some(&fx.aaron),
            SubmitMode::Commit,
        )
        .unwrap();
    assert_eq!(fx.reload(&proposal).unwrap().status, ProposalStatus::Accepted);
}

#[test]
fn admin_update_surfaces_illegal_and_unknown_transitions() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Rejected);
    let input = ProposalInput::default();
    let service = fx.service();

    let err = service
        .update(
            proposal.id,
            &input,
            Some("accept"),
            Some(&fx.aaron),
            SubmitMode::Commit,
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
    assert!(err.redirection().is_none());

    let err = service
        .update(
            proposal.id,
            &input,
            Some("destroy"),
            Some(&fx.aaron),
            SubmitMode::Commit,
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnknownTransition(_)));
    assert_eq!(fx.reload(&proposal).unwrap().status, ProposalStatus::Rejected);
}

#[test]
fn update_leaves_speaker_confirmation_to_owners() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Accepted);
    let input = ProposalInput::default();
    let service = fx.service();

    for transition in ["confirm", "decline"] {
        let err = service
            .update(
                proposal.id,
                &input,
                Some(transition),
                Some(&fx.aaron),
                SubmitMode::Commit,
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(id) if id == proposal.id));
        assert_eq!(recovery(err).target, Redirect::Proposal(proposal.id));
        assert_eq!(fx.reload(&proposal).unwrap().status, ProposalStatus::Accepted);
    }

    let view = rendered(
        service
            .show(proposal.id, ShowRoute::Proposal, Some(&fx.aaron))
            .unwrap(),
    );
    assert!(view.transitions.is_empty());

    let mut own = Proposal::new(fx.event.id, "Admin talk", "Aaron", 2_000);
    own.status = ProposalStatus::Accepted;
    own.add_user(fx.aaron.clone());
    SqliteStore::new(&fx.conn).create_proposal(&own).unwrap();
    service
        .update(own.id, &input, Some("confirm"), Some(&fx.aaron), SubmitMode::Commit)
        .unwrap();
    assert_eq!(fx.reload(&own).unwrap().status, ProposalStatus::Confirmed);
}

#[test]
fn destroy_requires_owner_or_admin() {
    let fx = Fixture::new();
    let service = fx.service();

    let proposal = fx.widgets(ProposalStatus::Proposed);
    assert_eq!(
        recovery(service.destroy(proposal.id, None).unwrap_err()).target,
        Redirect::SignIn
    );
    let denied = recovery(service.destroy(proposal.id, Some(&fx.clio)).unwrap_err());
    assert_eq!(denied.target, Redirect::Proposal(proposal.id));
    assert_eq!(denied.flash.unwrap().kind, FlashKind::Failure);
    assert!(fx.reload(&proposal).is_some());

    for viewer in [&fx.quentin, &fx.aaron] {
        let proposal = fx.widgets(ProposalStatus::Proposed);
        let deleted = redirection(service.destroy(proposal.id, Some(viewer)).unwrap());
        assert_eq!(deleted.target, Redirect::EventProposals("open".to_string()));
        assert_eq!(deleted.flash.unwrap().kind, FlashKind::Success);
        assert!(fx.reload(&proposal).is_none());
    }
}

#[test]
fn speaker_confirm_and_decline_by_owner() {
    let fx = Fixture::new();
    let service = fx.service();

    let accepted = fx.widgets(ProposalStatus::Accepted);
    let redirection = redirection(
        service
            .speaker_confirm(accepted.id, Some(&fx.quentin))
            .unwrap(),
    );
    assert!(redirection.flash.unwrap().message.contains("Updated"));
    assert_eq!(fx.reload(&accepted).unwrap().status, ProposalStatus::Confirmed);

    let accepted = fx.widgets(ProposalStatus::Accepted);
    service
        .speaker_decline(accepted.id, Some(&fx.quentin))
        .unwrap();
    assert_eq!(fx.reload(&accepted).unwrap().status, ProposalStatus::Declined);
}

#[test]
fn speaker_confirm_rejects_non_owners_even_admins() {
    let fx = Fixture::new();
    let service = fx.service();

    for status in [ProposalStatus::Accepted, ProposalStatus::Proposed] {
        let proposal = fx.widgets(status);
        let err = service
            .speaker_confirm(proposal.id, Some(&fx.aaron))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        let err = service
            .speaker_decline(proposal.id, Some(&fx.aaron))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert_eq!(fx.reload(&proposal).unwrap().status, status);
    }
}

#[test]
fn speaker_confirm_on_unaccepted_proposal_is_fatal() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let service = fx.service();

    let err = service
        .speaker_confirm(proposal.id, Some(&fx.quentin))
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
    assert!(err.redirection().is_none());

    let err = service
        .speaker_decline(proposal.id, Some(&fx.quentin))
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));
    assert_eq!(fx.reload(&proposal).unwrap().status, ProposalStatus::Proposed);
}

#[test]
fn proposal_login_required_redirects_by_sign_in_state() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let service = fx.service();

    let redirect = redirection(service.proposal_login_required(proposal.id, None));
    assert_eq!(redirect.target, Redirect::SignIn);

    let redirect = redirection(service.proposal_login_required(proposal.id, Some(&fx.quentin)));
    assert_eq!(redirect.target, Redirect::Proposal(proposal.id));
}

fn count_proposals(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM proposals;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn global_sessions_and_schedule_redirect_to_current_event() {
    let fx = Fixture::new();
    let service = fx.service();
    let sort = proposals_core::ProposalSort::default();

    let redirect = redirection(service.sessions_index(None, sort, None).unwrap());
    assert_eq!(redirect.target, Redirect::EventProposals("open".to_string()));
    let redirect = redirection(service.sessions_index(None, sort, Some(&fx.aaron)).unwrap());
    assert_eq!(redirect.target, Redirect::EventSessions("open".to_string()));

    let redirect = redirection(service.schedule(None, None).unwrap());
    assert_eq!(redirect.target, Redirect::EventProposals("open".to_string()));
    let redirect = redirection(service.schedule(None, Some(&fx.aaron)).unwrap());
    assert_eq!(redirect.target, Redirect::EventSchedule("open".to_string()));

    let unconfigured = fx.service_with(ProposalSettings::default());
    let err = unconfigured.schedule(None, None).unwrap_err();
    assert_eq!(recovery(err).target, Redirect::ProposalList);
}

#[test]
fn sessions_index_lists_confirmed_proposals_once_published() {
    let mut event = published_event();
    event.policy.schedule_published = true;
    let fx = Fixture::with_event(event);
    let mut confirmed = Proposal::new(fx.event.id, "Keynote", "Clio", 2_000);
    confirmed.status = ProposalStatus::Confirmed;
    confirmed.start_time = Some(20_000);
    confirmed.end_time = Some(23_600);
    SqliteStore::new(&fx.conn).create_proposal(&confirmed).unwrap();
    let mut unscheduled = Proposal::new(fx.event.id, "Lightning", "Clio", 3_000);
    unscheduled.status = ProposalStatus::Confirmed;
    SqliteStore::new(&fx.conn).create_proposal(&unscheduled).unwrap();
    fx.widgets(ProposalStatus::Accepted);
    let service = fx.service();

    let listing = rendered(
        service
            .sessions_index(Some("open"), proposals_core::ProposalSort::default(), None)
            .unwrap(),
    );
    let titles = listing
        .sessions
        .iter()
        .map(|session| session.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Keynote", "Lightning"]);

    let schedule = rendered(service.schedule(Some("open"), None).unwrap());
    assert_eq!(schedule.sessions.len(), 1);
    assert_eq!(schedule.sessions[0].start_time, Some(20_000));
}

#[test]
fn unpublished_sessions_redirect_to_proposals() {
    let fx = Fixture::new();
    let service = fx.service();

    let redirect = redirection(
        service
            .sessions_index(Some("open"), proposals_core::ProposalSort::default(), None)
            .unwrap(),
    );
    assert_eq!(redirect.target, Redirect::EventProposals("open".to_string()));
    let redirect = redirection(service.schedule_calendar("open", None).unwrap());
    assert_eq!(redirect.target, Redirect::EventProposals("open".to_string()));
}

#[test]
fn manage_speakers_applies_add_and_remove() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let service = fx.service();
    let listed = format!("{}, not-a-uuid, {}", fx.quentin.id, Uuid::new_v4());

    let speakers = service
        .manage_speakers(
            Some(proposal.id),
            &listed,
            Some(fx.clio.id),
            None,
            Some(&fx.quentin),
        )
        .unwrap();
    assert_eq!(speakers, vec![fx.quentin.clone(), fx.clio.clone()]);

    let speakers = service
        .manage_speakers(
            Some(proposal.id),
            &listed,
            Some(fx.quentin.id),
            Some(fx.quentin.id),
            Some(&fx.quentin),
        )
        .unwrap();
    assert!(speakers.is_empty());

    // Nothing is persisted.
    assert_eq!(fx.reload(&proposal).unwrap().users, vec![fx.quentin.clone()]);
}

#[test]
fn manage_speakers_requires_an_editor() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let service = fx.service();

    let err = service
        .manage_speakers(Some(proposal.id), "", None, None, None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::LoginRequired));
    let err = service
        .manage_speakers(Some(proposal.id), "", Some(fx.clio.id), None, Some(&fx.clio))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));

    let speakers = service
        .manage_speakers(None, "", Some(fx.clio.id), None, Some(&fx.clio))
        .unwrap();
    assert_eq!(speakers, vec![fx.clio.clone()]);
}

#[test]
fn search_speakers_matches_names_and_skips_owners() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let service = fx.service();

    let found = service
        .search_speakers(Some(proposal.id), "IO", Some(&fx.quentin))
        .unwrap();
    assert_eq!(found, vec![fx.clio.clone()]);

    let found = service
        .search_speakers(Some(proposal.id), "quen", Some(&fx.quentin))
        .unwrap();
    assert!(found.is_empty());

    let found = service
        .search_speakers(None, "   ", Some(&fx.quentin))
        .unwrap();
    assert!(found.is_empty());
}

#[test]
fn speaker_list_is_saved_only_with_multiple_presenters() {
    let fx = Fixture::new();
    let proposal = fx.widgets(ProposalStatus::Proposed);
    let input = ProposalInput {
        speaker_ids: Some(vec![fx.clio.id, Uuid::new_v4(), fx.quentin.id]),
        ..ProposalInput::default()
    };

    fx.service()
        .update(proposal.id, &input, None, Some(&fx.quentin), SubmitMode::Commit)
        .unwrap();
    assert_eq!(fx.reload(&proposal).unwrap().users, vec![fx.quentin.clone()]);

    let service = fx.service_with(ProposalSettings {
        have_multiple_presenters: true,
        ..ProposalSettings::default()
    });
    service
        .update(proposal.id, &input, None, Some(&fx.quentin), SubmitMode::Commit)
        .unwrap();
    assert_eq!(
        fx.reload(&proposal).unwrap().users,
        vec![fx.clio.clone(), fx.quentin.clone()]
    );
}
