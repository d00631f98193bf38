//! The action dispatcher: one front door for everything the edge sends.
//!
//! Zone-local actions route to the owning zone runtime and execute under
//! its lock; party, dungeon, transition, and session verbs route to
//! their managers. Every path authorizes the pre-verified wallet against
//! the acting entity before anything mutates.

use std::sync::Arc;

use mistvale_types::{
    ActionEnvelope, ActionError, ActionOutcome, Class, EntityId, InstanceId, PartyId, Race,
    WalletAddress, ZoneId,
};
use mistvale_zone::actions;

use crate::dungeon::DungeonManager;
use crate::party::{LeaveOutcome, PartyManager};
use crate::session::{LoginOutcome, SessionManager};
use crate::transition::{self, TransitionOutcome};
use crate::world::WorldManager;

/// Routes authenticated requests into the world.
pub struct Dispatcher {
    world: Arc<WorldManager>,
    parties: Arc<PartyManager>,
    dungeons: Arc<DungeonManager>,
    sessions: Arc<SessionManager>,
}

impl Dispatcher {
    /// Assemble a dispatcher over the managers.
    pub fn new(
        world: Arc<WorldManager>,
        parties: Arc<PartyManager>,
        dungeons: Arc<DungeonManager>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            world,
            parties,
            dungeons,
            sessions,
        }
    }

    /// The world this dispatcher routes into.
    pub const fn world(&self) -> &Arc<WorldManager> {
        &self.world
    }

    /// Execute a zone-local action.
    pub async fn dispatch(&self, envelope: ActionEnvelope) -> Result<ActionOutcome, ActionError> {
        let zone = self.world.require_zone(&envelope.zone).await?;
        actions::execute(&zone, self.world.context(), envelope).await
    }

    // -- Party verbs --------------------------------------------------------

    /// Create a party led by the acting entity.
    pub async fn party_create(
        &self,
        wallet: &WalletAddress,
        zone: &ZoneId,
        entity: EntityId,
    ) -> Result<PartyId, ActionError> {
        self.verify_owned(zone, entity, wallet).await?;
        self.parties.create(entity)
    }

    /// Invite another player. Both must stand in the same zone.
    pub async fn party_invite(
        &self,
        wallet: &WalletAddress,
        zone: &ZoneId,
        inviter: EntityId,
        invitee: EntityId,
    ) -> Result<PartyId, ActionError> {
        self.verify_owned(zone, inviter, wallet).await?;
        // Colocation: the invitee must be present in the same zone.
        let handle = self.world.require_zone(zone).await?;
        {
            let state = handle.lock().await;
            let present = state
                .entity(invitee)
                .is_some_and(|e| e.as_player().is_some());
            if !present {
                return Err(ActionError::validation(format!(
                    "invitee {invitee} is not in zone {zone}"
                )));
            }
        }
        self.parties.invite(inviter, invitee)
    }

    /// Accept a pending invite.
    pub async fn party_join(
        &self,
        wallet: &WalletAddress,
        zone: &ZoneId,
        entity: EntityId,
    ) -> Result<PartyId, ActionError> {
        self.verify_owned(zone, entity, wallet).await?;
        self.parties.join(entity)
    }

    /// Leave the current party.
    pub async fn party_leave(
        &self,
        wallet: &WalletAddress,
        zone: &ZoneId,
        entity: EntityId,
    ) -> Result<LeaveOutcome, ActionError> {
        self.verify_owned(zone, entity, wallet).await?;
        self.parties.leave(entity)
    }

    // -- Dungeon verbs ------------------------------------------------------

    /// Open a dungeon gate for the acting entity's party.
    pub async fn open_dungeon_gate(
        &self,
        wallet: &WalletAddress,
        zone: &ZoneId,
        entity: EntityId,
        gate: EntityId,
    ) -> Result<InstanceId, ActionError> {
        self.dungeons
            .open_gate(&self.world, wallet, zone, entity, gate)
            .await
    }

    /// Walk out of the current dungeon instance.
    pub async fn leave_dungeon(
        &self,
        wallet: &WalletAddress,
        entity: EntityId,
    ) -> Result<ZoneId, ActionError> {
        self.dungeons.leave(&self.world, wallet, entity).await
    }

    // -- Transition verbs ---------------------------------------------------

    /// Transition through a named portal.
    pub async fn transition_portal(
        &self,
        wallet: &WalletAddress,
        zone: &ZoneId,
        entity: EntityId,
        portal: EntityId,
    ) -> Result<TransitionOutcome, ActionError> {
        transition::transition_portal(&self.world, Some(wallet), zone, entity, portal).await
    }

    /// Transition through whichever portal is in range.
    pub async fn transition_auto(
        &self,
        wallet: &WalletAddress,
        zone: &ZoneId,
        entity: EntityId,
    ) -> Result<TransitionOutcome, ActionError> {
        transition::transition_auto(&self.world, Some(wallet), zone, entity).await
    }

    // -- Session verbs ------------------------------------------------------

    /// Log a wallet in.
    pub async fn login(
        &self,
        wallet: &WalletAddress,
        name: &str,
        race: Race,
        class: Class,
    ) -> Result<LoginOutcome, ActionError> {
        self.sessions
            .login(&self.world, wallet, name, race, class)
            .await
    }

    /// Log a wallet out.
    pub async fn logout(
        &self,
        wallet: &WalletAddress,
        entity: EntityId,
    ) -> Result<(), ActionError> {
        self.sessions.logout(&self.world, wallet, entity).await
    }

    /// Common manager-verb authorization: the entity exists in the zone,
    /// the wallet owns it, and it is alive.
    async fn verify_owned(
        &self,
        zone: &ZoneId,
        entity: EntityId,
        wallet: &WalletAddress,
    ) -> Result<(), ActionError> {
        let handle = self.world.require_zone(zone).await?;
        let state = handle.lock().await;
        let entity = state
            .entity(entity)
            .ok_or_else(|| ActionError::validation(format!("unknown entity {entity}")))?;
        mistvale_entities::validation::require_wallet(entity, Some(wallet))?;
        mistvale_entities::validation::require_alive(entity)?;
        Ok(())
    }
}
