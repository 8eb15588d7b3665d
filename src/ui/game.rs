use std::cell::RefCell;
use std::rc::Rc;

use gtk4::glib;
use gtk4::prelude::*;

use super::board::{clear_flip_classes, play_flip_show};
use super::dialogs::show_game_over_dialog;
use super::hud::stop_timer;
use super::records::register_result;
use super::state::{AppState, FlipOutcome};

pub(super) const FLIP_PHASE_MS: u64 = 260;
/// How long a mismatched pair stays face-up.
const MISMATCH_FLIP_BACK_MS: u64 = 400;
const MATCH_BUMP_DELAY_MS: u64 = 250;
const MATCH_BUMP_DURATION_MS: u64 = 1300;
const GAME_OVER_DELAY_MS: u64 = 650;

pub fn handle_card_click(state: &Rc<RefCell<AppState>>, index: usize) {
    let mut st = state.borrow_mut();
    let outcome = st.flip_card(index);
    if outcome == FlipOutcome::Ignored {
        return;
    }

    play_flip_show(&mut st, index);
    if let Some(button) = st.grid_buttons.get(index) {
        button.add_css_class("active");
    }
    let game_id = st.game_id;

    match outcome {
        FlipOutcome::Mismatch { first, second } => {
            drop(st);
            let state_shake = state.clone();
            glib::timeout_add_local(std::time::Duration::from_millis(FLIP_PHASE_MS), move || {
                let st = state_shake.borrow();
                if st.game_id != game_id {
                    return glib::ControlFlow::Break;
                }
                for &idx in &[first, second] {
                    if let Some(button) = st.grid_buttons.get(idx) {
                        clear_flip_classes(button);
                        button.remove_css_class("mismatch-shake");
                        button.add_css_class("mismatch-shake");
                    }
                }
                drop(st);
                schedule_mismatch_reset(&state_shake, game_id);
                glib::ControlFlow::Break
            });
        }
        FlipOutcome::Matched {
            first,
            second,
            finished,
        } => {
            // Hold input until the flip animation lands on the pair.
            st.lock_input = true;
            drop(st);
            let state_settle = state.clone();
            glib::timeout_add_local(std::time::Duration::from_millis(FLIP_PHASE_MS), move || {
                let mut st = state_settle.borrow_mut();
                if st.game_id != game_id {
                    return glib::ControlFlow::Break;
                }
                for &idx in &[first, second] {
                    if let Some(button) = st.grid_buttons.get(idx) {
                        clear_flip_classes(button);
                        button.remove_css_class("active");
                        button.add_css_class("matched");
                    }
                }
                st.lock_input = finished;
                super::hud::update_subtitle(&st);
                drop(st);
                schedule_match_bump(&state_settle, [first, second], game_id);
                if finished {
                    finish_game(&state_settle, game_id);
                }
                glib::ControlFlow::Break
            });
        }
        FlipOutcome::Continue | FlipOutcome::Ignored => {}
    }
}

fn schedule_mismatch_reset(state: &Rc<RefCell<AppState>>, game_id: u64) {
    let state_hide = state.clone();
    glib::timeout_add_local(
        std::time::Duration::from_millis(MISMATCH_FLIP_BACK_MS),
        move || {
            let st = state_hide.borrow();
            if st.game_id != game_id {
                return glib::ControlFlow::Break;
            }
            for &idx in &st.flipped_indices {
                if let Some(button) = st.grid_buttons.get(idx) {
                    button.remove_css_class("mismatch-shake");
                    clear_flip_classes(button);
                    button.add_css_class("flip-hide");
                }
            }
            drop(st);

            let state_finish = state_hide.clone();
            glib::timeout_add_local(std::time::Duration::from_millis(FLIP_PHASE_MS), move || {
                let mut st = state_finish.borrow_mut();
                if st.game_id != game_id {
                    return glib::ControlFlow::Break;
                }
                let indices = st.unflip_mismatch();
                for idx in indices {
                    if let Some(button) = st.grid_buttons.get(idx) {
                        button.remove_css_class("active");
                    }
                    play_flip_show(&mut st, idx);
                }
                glib::ControlFlow::Break
            });
            glib::ControlFlow::Break
        },
    );
}

fn schedule_match_bump(state: &Rc<RefCell<AppState>>, indices: [usize; 2], game_id: u64) {
    let state_start = state.clone();
    glib::timeout_add_local(
        std::time::Duration::from_millis(MATCH_BUMP_DELAY_MS),
        move || {
            let st = state_start.borrow();
            if st.game_id != game_id {
                return glib::ControlFlow::Break;
            }
            for &idx in &indices {
                if let Some(button) = st.grid_buttons.get(idx) {
                    button.remove_css_class("match-bump");
                    button.add_css_class("match-bump");
                }
            }
            drop(st);

            let state_end = state_start.clone();
            glib::timeout_add_local(
                std::time::Duration::from_millis(MATCH_BUMP_DURATION_MS),
                move || {
                    let st = state_end.borrow();
                    if st.game_id != game_id {
                        return glib::ControlFlow::Break;
                    }
                    for &idx in &indices {
                        if let Some(button) = st.grid_buttons.get(idx) {
                            button.remove_css_class("match-bump");
                        }
                    }
                    glib::ControlFlow::Break
                },
            );
            glib::ControlFlow::Break
        },
    );
}

fn finish_game(state: &Rc<RefCell<AppState>>, game_id: u64) {
    let outcome = {
        let mut st = state.borrow_mut();
        stop_timer(&mut st);
        let duration = st.current_elapsed();
        st.run_started = None;
        st.run_elapsed_before = duration;
        register_result(&mut st.records, duration)
    };

    let state_prompt = state.clone();
    glib::timeout_add_local(
        std::time::Duration::from_millis(GAME_OVER_DELAY_MS),
        move || {
            let st = state_prompt.borrow();
            if st.game_id != game_id {
                return glib::ControlFlow::Break;
            }
            drop(st);
            show_game_over_dialog(&state_prompt, outcome);
            glib::ControlFlow::Break
        },
    );
}
