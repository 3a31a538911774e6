//! Operator CLI over `proposals_core`.
//!
//! # Responsibility
//! - Seed events and users into a local SQLite database.
//! - Drive proposal use-cases and print their outcome (render, or redirect
//!   with flash).

use clap::{Parser, Subcommand, ValueEnum};
use proposals_core::repo::event_repo::EventRepository;
use proposals_core::repo::user_repo::UserRepository;
use proposals_core::service::{Outcome, Redirection, Rendered};
use proposals_core::{
    default_log_level, init_logging, open_db, Event, ExportFormat, ProposalInput,
    ProposalService, ProposalSettings, ServiceResult, SessionType, ShowRoute, SqliteStore,
    SubmitMode, Track, User,
};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "proposals")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage conference talk proposals in a local database", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, default_value = "proposals.db")]
    db: PathBuf,

    /// JSON settings document
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core linkage info
    Ping,

    /// Create an event
    CreateEvent {
        #[arg(long)]
        slug: String,
        #[arg(long)]
        title: String,
        /// Stop accepting proposals
        #[arg(long)]
        closed: bool,
        #[arg(long)]
        publish_statuses: bool,
        #[arg(long)]
        publish_schedule: bool,
        #[arg(long = "track")]
        tracks: Vec<String>,
        #[arg(long = "session-type")]
        session_types: Vec<String>,
    },

    /// Create a user with a complete profile
    CreateUser {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        admin: bool,
    },

    /// Submit a proposal to an event
    Submit {
        #[arg(long)]
        event: String,
        /// Acting user id; anonymous when omitted
        #[arg(long = "as")]
        as_user: Option<String>,
        #[arg(long)]
        title: String,
        #[arg(long)]
        presenter: Option<String>,
        #[arg(long)]
        excerpt: Option<String>,
        /// Validate without saving
        #[arg(long)]
        preview: bool,
    },

    /// Export proposals of one event (or all events)
    Export {
        #[arg(long)]
        event: Option<String>,
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,
        #[arg(long = "as")]
        as_user: Option<String>,
    },

    /// Show one proposal
    Show {
        id: String,
        /// Request the session route instead of the proposal route
        #[arg(long)]
        session: bool,
        #[arg(long = "as")]
        as_user: Option<String>,
    },

    /// Apply a review transition (accept, reject, mark_as_junk)
    Transition {
        id: String,
        event: String,
        #[arg(long = "as")]
        as_user: String,
    },

    /// Confirm an accepted proposal as its speaker
    Confirm {
        id: String,
        #[arg(long = "as")]
        as_user: String,
    },

    /// Decline an accepted proposal as its speaker
    Decline {
        id: String,
        #[arg(long = "as")]
        as_user: String,
    },

    /// Delete a proposal
    Destroy {
        id: String,
        #[arg(long = "as")]
        as_user: String,
    },

    /// Print the iCalendar schedule of an event
    Calendar {
        event: String,
        #[arg(long = "as")]
        as_user: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
    Xml,
    Atom,
    Ics,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => Self::Csv,
            FormatArg::Json => Self::Json,
            FormatArg::Xml => Self::Xml,
            FormatArg::Atom => Self::Atom,
            FormatArg::Ics => Self::ICalendar,
        }
    }
}

type CliResult = Result<(), Box<dyn Error>>;

fn main() -> CliResult {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(default_log_level(), log_dir)?;
    }

    if let Commands::Ping = cli.command {
        println!("proposals_core ping={}", proposals_core::ping());
        println!("proposals_core version={}", proposals_core::core_version());
        return Ok(());
    }

    let settings = match cli.settings.as_ref() {
        Some(path) => ProposalSettings::from_json_str(&std::fs::read_to_string(path)?)?,
        None => ProposalSettings::default(),
    };
    let conn = open_db(&cli.db)?;
    let service = ProposalService::new(SqliteStore::new(&conn), settings);

    run(&service, cli.command)
}

fn run(service: &ProposalService<SqliteStore<'_>>, command: Commands) -> CliResult {
    match command {
        Commands::Ping => Ok(()),
        Commands::CreateEvent {
            slug,
            title,
            closed,
            publish_statuses,
            publish_schedule,
            tracks,
            session_types,
        } => {
            let mut event = Event::new(slug, title);
            event.policy.accepting_proposals = !closed;
            event.policy.proposal_status_published = publish_statuses;
            event.policy.schedule_published = publish_schedule;
            event.tracks = tracks.into_iter().map(Track::new).collect();
            event.session_types = session_types.into_iter().map(SessionType::new).collect();
            let id = service.store().create_event(&event)?;
            println!("event {id} slug={}", event.slug);
            Ok(())
        }
        Commands::CreateUser { name, email, admin } => {
            let user = if admin {
                User::admin(name, email)
            } else {
                User::new(name, email)
            };
            let id = service.store().create_user(&user)?;
            println!("user {id}");
            Ok(())
        }
        Commands::Submit {
            event,
            as_user,
            title,
            presenter,
            excerpt,
            preview,
        } => {
            let viewer = load_viewer(service, as_user.as_deref())?;
            let input = ProposalInput {
                title: Some(title),
                presenter,
                excerpt,
                ..ProposalInput::default()
            };
            let mode = if preview {
                SubmitMode::Preview
            } else {
                SubmitMode::Commit
            };
            report(
                service.create(&event, &input, viewer.as_ref(), mode),
                |form| {
                    if form.is_valid() {
                        println!("preview ok: {}", form.proposal.title);
                    }
                    for error in &form.errors {
                        println!("{}: {error}", error.field());
                    }
                },
            )
        }
        Commands::Export {
            event,
            format,
            as_user,
        } => {
            let viewer = load_viewer(service, as_user.as_deref())?;
            match service.export_index(event.as_deref(), format.into(), viewer.as_ref()) {
                Ok(rendered) => {
                    print_rendered(&rendered);
                    Ok(())
                }
                Err(err) => report::<()>(Err(err), |_| {}),
            }
        }
        Commands::Show {
            id,
            session,
            as_user,
        } => {
            let viewer = load_viewer(service, as_user.as_deref())?;
            let route = if session {
                ShowRoute::Session
            } else {
                ShowRoute::Proposal
            };
            let result = proposals_core::service::parse_proposal_id(&id)
                .and_then(|id| service.show(id, route, viewer.as_ref()));
            report(result, |view| {
                println!("{} [{}]", view.proposal.title, view.proposal.status);
                println!("event: {}", view.event.slug);
                println!("speakers: {}", view.proposal.speaker_names());
                if view.notify_acceptance {
                    println!("accepted: please confirm or decline");
                }
                if !view.transitions.is_empty() {
                    let names = view
                        .transitions
                        .iter()
                        .map(|event| event.as_str())
                        .collect::<Vec<_>>();
                    println!("transitions: {}", names.join(", "));
                }
            })
        }
        Commands::Transition { id, event, as_user } => {
            let viewer = load_viewer(service, Some(&as_user))?;
            let result = proposals_core::service::parse_proposal_id(&id).and_then(|id| {
                service.update(
                    id,
                    &ProposalInput::default(),
                    Some(event.as_str()),
                    viewer.as_ref(),
                    SubmitMode::Commit,
                )
            });
            report(result, |form| {
                for error in &form.errors {
                    println!("{}: {error}", error.field());
                }
            })
        }
        Commands::Confirm { id, as_user } => {
            let viewer = load_viewer(service, Some(&as_user))?;
            let result = proposals_core::service::parse_proposal_id(&id)
                .and_then(|id| service.speaker_confirm(id, viewer.as_ref()));
            report(result, |()| {})
        }
        Commands::Decline { id, as_user } => {
            let viewer = load_viewer(service, Some(&as_user))?;
            let result = proposals_core::service::parse_proposal_id(&id)
                .and_then(|id| service.speaker_decline(id, viewer.as_ref()));
            report(result, |()| {})
        }
        Commands::Destroy { id, as_user } => {
            let viewer = load_viewer(service, Some(&as_user))?;
            let result = proposals_core::service::parse_proposal_id(&id)
                .and_then(|id| service.destroy(id, viewer.as_ref()));
            report(result, |()| {})
        }
        Commands::Calendar { event, as_user } => {
            let viewer = load_viewer(service, as_user.as_deref())?;
            report(
                service.schedule_calendar(&event, viewer.as_ref()),
                |rendered| print_rendered(&rendered),
            )
        }
    }
}

fn load_viewer(
    service: &ProposalService<SqliteStore<'_>>,
    raw: Option<&str>,
) -> Result<Option<User>, Box<dyn Error>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let id = raw.trim().parse()?;
    match service.store().get_user(id)? {
        Some(user) => Ok(Some(user)),
        None => Err(format!("user not found: {raw}").into()),
    }
}

/// Prints a render or redirect; recoverable errors are printed as their
/// redirect, anything else is returned.
fn report<T>(result: ServiceResult<Outcome<T>>, render: impl FnOnce(T)) -> CliResult {
    match result {
        Ok(Outcome::Render(value)) => {
            render(value);
            Ok(())
        }
        Ok(Outcome::Redirect(redirection)) => {
            print_redirection(&redirection);
            Ok(())
        }
        Err(err) => match err.redirection() {
            Some(redirection) => {
                log::debug!("event=cli_command module=cli status=redirected error={err}");
                print_redirection(&redirection);
                Ok(())
            }
            None => Err(err.into()),
        },
    }
}

fn print_redirection(redirection: &Redirection) {
    println!("redirect {}", redirection.target.path());
    if let Some(flash) = redirection.flash.as_ref() {
        println!("{:?}: {}", flash.kind, flash.message);
    }
}

fn print_rendered(rendered: &Rendered) {
    eprintln!("content-type: {}", rendered.content_type);
    print!("{}", rendered.body);
}
