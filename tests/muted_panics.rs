use std::{
    panic,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use ctf_profiler::{game_interface::NullDisplay, match_runner::run_game, prelude::*};

/// One player, a fixed number of moves.
struct Countdown(usize);

impl Game for Countdown {
    type State = usize;
    type Action = ();

    fn apply_action(&mut self, _action: Option<()>) -> anyhow::Result<()> {
        self.0 -= 1;
        Ok(())
    }

    fn get_state(&self) -> usize {
        self.0
    }

    fn get_current_player_number(&self) -> usize {
        0
    }

    fn is_finished(&self) -> bool {
        self.0 == 0
    }

    fn score(&self) -> i32 {
        0
    }

    fn move_count(&self) -> usize {
        0
    }
}

struct Noisy;

impl Agent<Countdown> for Noisy {
    fn select_action(&mut self, _state: &usize) -> anyhow::Result<()> {
        panic!("noisy agent")
    }
}

fn play(moves: usize, settings: &GameSettings) {
    let mut game = Countdown(moves);
    let agents: Vec<Box<dyn Agent<Countdown>>> = vec![Box::new(Noisy)];
    run_game(&mut game, agents, &mut NullDisplay, settings).unwrap();
    assert!(game.is_finished());
}

// Only test of this binary: the panic hook is process-wide.
#[test]
fn muted_agents_do_not_reach_the_panic_hook() {
    let reported = Arc::new(AtomicUsize::new(0));
    let counter = reported.clone();
    panic::set_hook(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    play(3, &GameSettings::profiling());
    assert_eq!(reported.load(Ordering::SeqCst), 0);

    let loud = GameSettings {
        mute_agents: false,
        ..GameSettings::profiling()
    };
    play(2, &loud);
    assert_eq!(reported.load(Ordering::SeqCst), 2);

    // the hook is back to normal once the muted game is over
    play(1, &GameSettings::profiling());
    let _ = panic::catch_unwind(|| panic!("outside any game"));
    assert_eq!(reported.load(Ordering::SeqCst), 3);

    let _ = panic::take_hook();
}
