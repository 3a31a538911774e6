//! Speaker list editing for multi-presenter proposals.
//!
//! # Invariants
//! - Nothing here persists; the resulting list is submitted with the form.
//! - A new proposal (`id == None`) is treated as owned by the viewer.

use crate::model::proposal::ProposalId;
use crate::model::user::{User, UserId};
use crate::policy::access::can_edit;
use crate::service::outcome::ServiceError;
use crate::service::proposal_service::{ProposalService, ServiceResult};
use crate::service::store::ProposalStore;
use log::debug;
use uuid::Uuid;

impl<S: ProposalStore> ProposalService<S> {
    /// Resolves the speaker list a form is editing.
    ///
    /// `speakers_csv` holds the comma-separated user ids currently listed;
    /// `add` and `remove` are applied on top of it. Unknown ids are skipped.
    pub fn manage_speakers(
        &self,
        id: Option<ProposalId>,
        speakers_csv: &str,
        add: Option<UserId>,
        remove: Option<UserId>,
        viewer: Option<&User>,
    ) -> ServiceResult<Vec<User>> {
        self.speaker_manager_owners(id, viewer)?;

        let mut speakers: Vec<User> = Vec::new();
        for raw in speakers_csv
            .split(',')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
        {
            let Ok(user_id) = Uuid::parse_str(raw) else {
                debug!("event=manage_speakers module=service status=skipped value={raw}");
                continue;
            };
            if let Some(user) = self.store.get_user(user_id)? {
                push_unique(&mut speakers, user);
            }
        }

        if let Some(user_id) = add {
            if let Some(user) = self.store.get_user(user_id)? {
                push_unique(&mut speakers, user);
            }
        }
        if let Some(user_id) = remove {
            speakers.retain(|user| user.id != user_id);
        }

        Ok(speakers)
    }

    /// Users with complete profiles whose full name contains `query`
    /// (case-insensitive), excluding current speakers.
    pub fn search_speakers(
        &self,
        id: Option<ProposalId>,
        query: &str,
        viewer: Option<&User>,
    ) -> ServiceResult<Vec<User>> {
        let current = self.speaker_manager_owners(id, viewer)?;
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let matches = self
            .store
            .list_complete_profiles()?
            .into_iter()
            .filter(|user| user.fullname.to_lowercase().contains(&needle))
            .filter(|user| !current.iter().any(|speaker| speaker.id == user.id))
            .collect::<Vec<_>>();
        debug!(
            "event=search_speakers module=service status=ok matches={}",
            matches.len()
        );
        Ok(matches)
    }

    /// Authorizes the viewer and returns the proposal's current owners.
    fn speaker_manager_owners(
        &self,
        id: Option<ProposalId>,
        viewer: Option<&User>,
    ) -> ServiceResult<Vec<User>> {
        let user = viewer.ok_or(ServiceError::LoginRequired)?;
        let Some(id) = id else {
            return Ok(vec![user.clone()]);
        };
        let (proposal, _) = self.assign_proposal_and_event(id)?;
        if !can_edit(viewer, &proposal) {
            return Err(ServiceError::Unauthorized(id));
        }
        Ok(proposal.users)
    }
}

fn push_unique(speakers: &mut Vec<User>, user: User) {
    if !speakers.iter().any(|speaker| speaker.id == user.id) {
        speakers.push(user);
    }
}
