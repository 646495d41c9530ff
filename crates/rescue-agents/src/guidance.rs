//! The escort relation between agents and victims.
//!
//! A victim is escorted by at most one agent. The relation is stored twice:
//! in the agent's `guided_victims` list and in the victim's `guided_by`
//! back-reference. Every mutation here updates both sides, and
//! [`verify_exclusive_guidance`] checks that they agree.

use std::collections::BTreeMap;

use rescue_types::{AgentId, RescuedBy, VictimId};
use tracing::{debug, info};

use crate::actor::{Agent, Victim};
use crate::error::AgentError;

/// Look up a victim by roster index.
pub fn victim_mut(victims: &mut [Victim], id: VictimId) -> Result<&mut Victim, AgentError> {
    id.index()
        .and_then(|i| victims.get_mut(i))
        .ok_or(AgentError::UnknownVictim(id))
}

/// Start escorting `victim`.
///
/// Attaching a victim the agent already escorts is a no-op.
///
/// # Errors
///
/// [`AgentError::VictimUnavailable`] if the victim is rescued or dead,
/// [`AgentError::VictimAlreadyGuided`] if another agent escorts it.
pub fn attach(agent: &mut Agent, victim: &mut Victim) -> Result<(), AgentError> {
    if victim.is_terminal() {
        return Err(AgentError::VictimUnavailable(victim.id));
    }
    match victim.guided_by {
        Some(guide) if guide == agent.id => {}
        Some(guide) => {
            return Err(AgentError::VictimAlreadyGuided {
                victim: victim.id,
                guide,
            });
        }
        None => {
            victim.guided_by = Some(agent.id);
            debug!(agent = %agent.id, victim = %victim.id, "Victim attached");
        }
    }
    if !agent.guided_victims.contains(&victim.id) {
        agent.guided_victims.push(victim.id);
    }
    Ok(())
}

/// Move every escorted victim onto the agent's cell.
pub fn carry(agent: &Agent, victims: &mut [Victim]) -> Result<(), AgentError> {
    for id in &agent.guided_victims {
        victim_mut(victims, *id)?.position = agent.position;
    }
    Ok(())
}

/// Drop escorted victims that died on the way.
pub fn shed_dead(agent: &mut Agent, victims: &mut [Victim]) -> Result<Vec<VictimId>, AgentError> {
    let mut shed = Vec::new();
    let mut kept = Vec::with_capacity(agent.guided_victims.len());
    for id in agent.guided_victims.drain(..) {
        let victim = victim_mut(victims, id)?;
        if victim.is_dead() {
            victim.guided_by = None;
            shed.push(id);
        } else {
            kept.push(id);
        }
    }
    agent.guided_victims = kept;
    Ok(shed)
}

/// Mark every escorted victim rescued by the agent and end the escort.
///
/// Returns the victims rescued.
pub fn deliver(agent: &mut Agent, victims: &mut [Victim]) -> Result<Vec<VictimId>, AgentError> {
    let mut rescued = Vec::new();
    for id in std::mem::take(&mut agent.guided_victims) {
        let victim = victim_mut(victims, id)?;
        victim.position = agent.position;
        victim.guided_by = None;
        if victim.mark_rescued(RescuedBy::Agent) {
            rescued.push(id);
        }
    }
    if !rescued.is_empty() {
        info!(
            agent = %agent.id,
            position = %agent.position,
            count = rescued.len(),
            "Victims delivered to safety"
        );
    }
    Ok(rescued)
}

/// End the escort without a rescue. Victims stay where they stand.
pub fn release(agent: &mut Agent, victims: &mut [Victim]) -> Result<Vec<VictimId>, AgentError> {
    let released = std::mem::take(&mut agent.guided_victims);
    for id in &released {
        victim_mut(victims, *id)?.guided_by = None;
    }
    if !released.is_empty() {
        debug!(agent = %agent.id, count = released.len(), "Victims released");
    }
    Ok(released)
}

/// Check that no victim is listed by two agents and that every list entry
/// matches the victim's back-reference.
///
/// # Errors
///
/// [`AgentError::GuidanceConflict`] for a doubly-listed victim,
/// [`AgentError::GuidanceMismatch`] when the two sides disagree,
/// [`AgentError::UnknownVictim`] for a dangling list entry.
pub fn verify_exclusive_guidance(agents: &[Agent], victims: &[Victim]) -> Result<(), AgentError> {
    let mut listed: BTreeMap<VictimId, AgentId> = BTreeMap::new();
    for agent in agents {
        for id in &agent.guided_victims {
            if id.index().and_then(|i| victims.get(i)).is_none() {
                return Err(AgentError::UnknownVictim(*id));
            }
            if let Some(first) = listed.insert(*id, agent.id) {
                return Err(AgentError::GuidanceConflict {
                    victim: *id,
                    first,
                    second: agent.id,
                });
            }
        }
    }
    for victim in victims {
        let listed_by = listed.get(&victim.id).copied();
        if listed_by != victim.guided_by {
            return Err(AgentError::GuidanceMismatch {
                victim: victim.id,
                listed_by,
                guided_by: victim.guided_by,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rescue_types::{AgentMode, Cell};

    use super::*;
    use crate::config::{AgentProfile, VictimProfile};

    fn make_agents(n: u32) -> Vec<Agent> {
        (0..n)
            .map(|i| {
                Agent::new(
                    AgentId(i),
                    Cell::new(1, 1),
                    AgentMode::Autonomous,
                    AgentProfile::default(),
                )
            })
            .collect()
    }

    fn make_victims(n: u32) -> Vec<Victim> {
        (0..n)
            .map(|i| Victim::new(VictimId(i), Cell::new(2, 2), VictimProfile::default()))
            .collect()
    }

    #[test]
    fn attach_sets_both_sides() {
        let mut agents = make_agents(1);
        let mut victims = make_victims(1);
        attach(&mut agents[0], &mut victims[0]).unwrap();
        assert_eq!(agents[0].guided_victims(), &[VictimId(0)]);
        assert_eq!(victims[0].guided_by(), Some(AgentId(0)));
        attach(&mut agents[0], &mut victims[0]).unwrap();
        assert_eq!(agents[0].guided_victims().len(), 1);
        verify_exclusive_guidance(&agents, &victims).unwrap();
    }

    #[test]
    fn second_guide_is_refused() {
        let mut agents = make_agents(2);
        let mut victims = make_victims(1);
        attach(&mut agents[0], &mut victims[0]).unwrap();
        let err = attach(&mut agents[1], &mut victims[0]).unwrap_err();
        assert!(matches!(
            err,
            AgentError::VictimAlreadyGuided { guide: AgentId(0), .. }
        ));
        assert!(agents[1].guided_victims().is_empty());
    }

    #[test]
    fn rescued_victims_cannot_be_attached() {
        let mut agents = make_agents(1);
        let mut victims = make_victims(1);
        victims[0].mark_rescued(RescuedBy::SelfRescue);
        assert!(matches!(
            attach(&mut agents[0], &mut victims[0]),
            Err(AgentError::VictimUnavailable(VictimId(0)))
        ));
    }

    #[test]
    fn carry_and_deliver() {
        let mut agents = make_agents(1);
        let mut victims = make_victims(2);
        attach(&mut agents[0], &mut victims[0]).unwrap();
        attach(&mut agents[0], &mut victims[1]).unwrap();
        agents[0].position = Cell::new(0, 3);
        carry(&agents[0], &mut victims).unwrap();
        assert!(victims.iter().all(|v| v.position == Cell::new(0, 3)));

        let rescued = deliver(&mut agents[0], &mut victims).unwrap();
        assert_eq!(rescued, vec![VictimId(0), VictimId(1)]);
        assert!(victims.iter().all(|v| v.rescued_by() == Some(RescuedBy::Agent)));
        assert!(!agents[0].is_guiding());
        verify_exclusive_guidance(&agents, &victims).unwrap();
    }

    #[test]
    fn release_clears_back_references() {
        let mut agents = make_agents(1);
        let mut victims = make_victims(1);
        attach(&mut agents[0], &mut victims[0]).unwrap();
        assert_eq!(release(&mut agents[0], &mut victims).unwrap(), vec![VictimId(0)]);
        assert!(victims[0].is_awaiting_rescue());
        verify_exclusive_guidance(&agents, &victims).unwrap();
    }

    #[test]
    fn verify_detects_double_listing() {
        let mut agents = make_agents(2);
        let mut victims = make_victims(1);
        attach(&mut agents[0], &mut victims[0]).unwrap();
        agents[1].guided_victims.push(VictimId(0));
        assert!(matches!(
            verify_exclusive_guidance(&agents, &victims),
            Err(AgentError::GuidanceConflict {
                first: AgentId(0),
                second: AgentId(1),
                ..
            })
        ));
    }

    #[test]
    fn verify_detects_stale_back_reference() {
        let agents = make_agents(1);
        let mut victims = make_victims(1);
        victims[0].guided_by = Some(AgentId(0));
        assert!(matches!(
            verify_exclusive_guidance(&agents, &victims),
            Err(AgentError::GuidanceMismatch { listed_by: None, .. })
        ));
    }

    #[test]
    fn unknown_victim_lookup_fails() {
        let mut victims = make_victims(1);
        assert!(matches!(
            victim_mut(&mut victims, VictimId(7)),
            Err(AgentError::UnknownVictim(VictimId(7)))
        ));
    }
}
