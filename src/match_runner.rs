use std::{
    cell::Cell,
    panic::{self, AssertUnwindSafe},
    sync::Once,
};

use anyhow::{anyhow, Context};
use tracing::{debug, instrument, trace, warn};

use crate::game_interface::{Agent, Display, Game, GameSettings};

/// Play `game` to the end with `agents` in turn order.
///
/// With `settings.catch_exceptions`, an agent that returns an error or panics loses its move
/// (the game receives `None`) and the game goes on. Otherwise the failure ends the game and is
/// returned. When agents are also muted, their panics are kept away from the panic hook and
/// only reach the log.
#[instrument(skip_all, fields(agents = agents.len()))]
pub fn run_game<G: Game>(
    game: &mut G,
    mut agents: Vec<Box<dyn Agent<G>>>,
    display: &mut dyn Display<G>,
    settings: &GameSettings,
) -> anyhow::Result<()> {
    if agents.is_empty() {
        return Err(anyhow!("cannot run a game without agents"));
    }

    let _muted = (settings.mute_agents && settings.catch_exceptions).then(MutedPanics::enter);

    let initial_state = game.get_state();
    for agent in agents.iter_mut() {
        agent.register_initial_state(&initial_state);
    }
    display.initialize(&initial_state);

    while !game.is_finished() {
        let player = game.get_current_player_number();
        trace!("player to play: {player}");
        let agent = agents
            .get_mut(player)
            .with_context(|| format!("no agent for player {player}"))?;

        let state = game.get_state();
        let action = match ask_agent(agent.as_mut(), &state, settings.catch_exceptions) {
            Ok(action) => Some(action),
            Err(e) if settings.catch_exceptions => {
                warn!("agent {player} failed: {e:#}");
                None
            }
            Err(e) => return Err(e.context(format!("agent {player} failed"))),
        };
        if !settings.mute_agents {
            debug!(player, ?action, "agent action");
        }

        if let Err(e) = game.apply_action(action) {
            if !settings.catch_exceptions {
                return Err(e.context(format!("illegal action from agent {player}")));
            }
            warn!("illegal action from agent {player}: {e:#}");
        }

        display.update(&game.get_state());
        if !settings.delay.is_zero() {
            std::thread::sleep(settings.delay);
        }
    }

    display.finish();
    Ok(())
}

thread_local! {
    static PANICS_MUTED: Cell<usize> = const { Cell::new(0) };
}

static MUTING_HOOK: Once = Once::new();

/// Silences the panic hook on this thread while alive.
///
/// The process hook is wrapped once; the wrapper forwards to the previous hook unless the
/// panicking thread holds a guard, so concurrent games on other threads keep their output.
struct MutedPanics;

impl MutedPanics {
    fn enter() -> Self {
        MUTING_HOOK.call_once(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                if PANICS_MUTED.with(Cell::get) == 0 {
                    previous(info);
                }
            }));
        });
        PANICS_MUTED.with(|muted| muted.set(muted.get() + 1));
        MutedPanics
    }
}

impl Drop for MutedPanics {
    fn drop(&mut self) {
        PANICS_MUTED.with(|muted| muted.set(muted.get().saturating_sub(1)));
    }
}

fn ask_agent<G: Game>(
    agent: &mut dyn Agent<G>,
    state: &G::State,
    catch_panics: bool,
) -> anyhow::Result<G::Action> {
    if !catch_panics {
        return agent.select_action(state);
    }
    match panic::catch_unwind(AssertUnwindSafe(|| agent.select_action(state))) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            Err(anyhow!("agent panicked: {message}"))
        }
    }
}
