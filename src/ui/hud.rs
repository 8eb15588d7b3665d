use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use gtk4::glib;
use gtk4::prelude::*;

use super::records::format_mm_ss;
use super::state::{AppState, CardStatus};

pub(super) fn set_header_library(state: &Rc<RefCell<AppState>>) {
    let st = state.borrow();
    if let (Some(header), Some(title)) = (&st.header, &st.title_library) {
        header.set_title_widget(Some(title));
    }
    if let Some(back) = &st.back_button {
        back.set_visible(false);
    }
    if let Some(restart) = &st.restart_button {
        restart.set_visible(false);
    }
}

pub(super) fn set_header_game(state: &Rc<RefCell<AppState>>) {
    let st = state.borrow();
    if let (Some(header), Some(title_box)) = (&st.header, &st.title_game) {
        update_subtitle(&st);
        header.set_title_widget(Some(title_box));
    }
    if let Some(back) = &st.back_button {
        back.set_visible(true);
    }
    if let Some(restart) = &st.restart_button {
        restart.set_visible(true);
    }
}

pub(super) fn set_header_crop(state: &Rc<RefCell<AppState>>) {
    let st = state.borrow();
    if let (Some(header), Some(title)) = (&st.header, &st.title_crop) {
        header.set_title_widget(Some(title));
    }
    if let Some(back) = &st.back_button {
        back.set_visible(true);
    }
    if let Some(restart) = &st.restart_button {
        restart.set_visible(false);
    }
}

pub(super) fn update_subtitle(st: &AppState) {
    if let Some(subtitle) = &st.title_game_subtitle {
        let total_pairs = st.cards.len() / 2;
        let matched_pairs = st
            .cards
            .iter()
            .filter(|c| c.status == CardStatus::Matched)
            .count()
            / 2;
        subtitle.set_text(&format!(
            "{}/{} | {}",
            matched_pairs,
            total_pairs,
            format_mm_ss(st.current_elapsed())
        ));
    }
}

/// Stops the display tick and folds the running span into the elapsed
/// total, so pauses never count toward the final time.
pub(super) fn stop_timer(st: &mut AppState) {
    if let Some(handle) = st.timer_handle.take() {
        handle.remove();
    }
    if let Some(started) = st.run_started.take() {
        st.run_elapsed_before += started.elapsed().as_secs_f64();
    }
}

pub(super) fn start_timer(state: &Rc<RefCell<AppState>>, reset_elapsed: bool) {
    let mut st = state.borrow_mut();
    stop_timer(&mut st);
    if reset_elapsed {
        st.run_elapsed_before = 0.0;
    }
    st.run_started = Some(Instant::now());
    update_subtitle(&st);

    let state_clone = state.clone();
    let handle = glib::timeout_add_local(std::time::Duration::from_secs(1), move || {
        let st = state_clone.borrow();
        update_subtitle(&st);
        glib::ControlFlow::Continue
    });
    st.timer_handle = Some(handle);
}
