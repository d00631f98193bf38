//! The party manager.
//!
//! Parties are coordination only — no shared vitals. The manager owns
//! the party map and a member → party reverse index behind one mutex;
//! the reverse index is what enforces the one-party-per-agent invariant.
//! Joining is invite-then-accept: a member extends an invite, the
//! invitee joins while both stand in the same zone (the dispatcher
//! checks colocation before calling in).

use std::collections::BTreeMap;
use std::sync::Mutex;

use mistvale_types::{ActionError, EntityId, PartyId};
use mistvale_zone::runtime::PartyLookup;

/// A party record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    /// Party id.
    pub id: PartyId,
    /// The current leader.
    pub leader: EntityId,
    /// Members in join order (the leader is always present).
    pub members: Vec<EntityId>,
}

#[derive(Debug, Default)]
struct PartyTables {
    parties: BTreeMap<PartyId, Party>,
    member_to_party: BTreeMap<EntityId, PartyId>,
    pending_invites: BTreeMap<EntityId, PartyId>,
}

/// What happened when a member left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The member left; the party continues.
    Left {
        /// The leader after the departure (promoted by join order when
        /// the leader left).
        leader: EntityId,
    },
    /// The party emptied and was dissolved.
    Dissolved,
}

/// Owns party membership and the P1 reverse index.
#[derive(Debug, Default)]
pub struct PartyManager {
    max_size: usize,
    tables: Mutex<PartyTables>,
}

impl PartyManager {
    /// Create a manager with the configured size cap.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            tables: Mutex::new(PartyTables::default()),
        }
    }

    /// Create a new party with `leader` as its only member.
    pub fn create(&self, leader: EntityId) -> Result<PartyId, ActionError> {
        let mut tables = self.lock()?;
        if tables.member_to_party.contains_key(&leader) {
            return Err(ActionError::conflict("already in a party"));
        }
        let id = PartyId::new();
        tables.parties.insert(
            id,
            Party {
                id,
                leader,
                members: vec![leader],
            },
        );
        tables.member_to_party.insert(leader, id);
        Ok(id)
    }

    /// Extend an invite from a current member to `invitee`.
    pub fn invite(&self, inviter: EntityId, invitee: EntityId) -> Result<PartyId, ActionError> {
        let mut tables = self.lock()?;
        let Some(party_id) = tables.member_to_party.get(&inviter).copied() else {
            return Err(ActionError::validation("inviter is not in a party"));
        };
        if tables.member_to_party.contains_key(&invitee) {
            return Err(ActionError::conflict("invitee is already in a party"));
        }
        let size = tables.parties.get(&party_id).map_or(0, |p| p.members.len());
        if size >= self.max_size {
            return Err(ActionError::conflict(format!(
                "party is full ({size}/{})",
                self.max_size
            )));
        }
        tables.pending_invites.insert(invitee, party_id);
        Ok(party_id)
    }

    /// Accept a pending invite.
    pub fn join(&self, invitee: EntityId) -> Result<PartyId, ActionError> {
        let mut tables = self.lock()?;
        let Some(party_id) = tables.pending_invites.remove(&invitee) else {
            return Err(ActionError::validation("no pending invite"));
        };
        if tables.member_to_party.contains_key(&invitee) {
            return Err(ActionError::conflict("already in a party"));
        }
        let Some(party) = tables.parties.get_mut(&party_id) else {
            return Err(ActionError::conflict("the inviting party no longer exists"));
        };
        if party.members.len() >= self.max_size {
            return Err(ActionError::conflict("party is full"));
        }
        party.members.push(invitee);
        tables.member_to_party.insert(invitee, party_id);
        Ok(party_id)
    }

    /// Leave (or be removed from) the current party.
    pub fn leave(&self, member: EntityId) -> Result<LeaveOutcome, ActionError> {
        let mut tables = self.lock()?;
        let Some(party_id) = tables.member_to_party.remove(&member) else {
            return Err(ActionError::validation("not in a party"));
        };
        let Some(party) = tables.parties.get_mut(&party_id) else {
            return Err(ActionError::internal("party index out of sync"));
        };
        party.members.retain(|m| *m != member);

        if party.members.is_empty() {
            tables.parties.remove(&party_id);
            return Ok(LeaveOutcome::Dissolved);
        }
        if party.leader == member {
            // Promote the next member by join order.
            if let Some(next) = party.members.first().copied() {
                party.leader = next;
            }
        }
        Ok(LeaveOutcome::Left {
            leader: party.leader,
        })
    }

    /// Kick a member. Only the leader may kick, and not themselves.
    pub fn kick(&self, leader: EntityId, member: EntityId) -> Result<(), ActionError> {
        {
            let tables = self.lock()?;
            let Some(party_id) = tables.member_to_party.get(&leader) else {
                return Err(ActionError::validation("kicker is not in a party"));
            };
            let Some(party) = tables.parties.get(party_id) else {
                return Err(ActionError::internal("party index out of sync"));
            };
            if party.leader != leader {
                return Err(ActionError::authorization("only the leader can kick"));
            }
            if leader == member {
                return Err(ActionError::validation("use leave, not kick, on yourself"));
            }
            if !party.members.contains(&member) {
                return Err(ActionError::validation("target is not in this party"));
            }
        }
        let _ = self.leave(member)?;
        Ok(())
    }

    /// The party a member belongs to, if any.
    pub fn party_of(&self, member: EntityId) -> Option<Party> {
        let tables = self.tables.lock().ok()?;
        let party_id = tables.member_to_party.get(&member)?;
        tables.parties.get(party_id).cloned()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, PartyTables>, ActionError> {
        self.tables
            .lock()
            .map_err(|_poisoned| ActionError::internal("party tables poisoned"))
    }
}

impl PartyLookup for PartyManager {
    fn party_members(&self, player: EntityId) -> Option<Vec<EntityId>> {
        self.party_of(player).map(|p| p.members)
    }
}
