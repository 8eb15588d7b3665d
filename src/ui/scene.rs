use std::cell::RefCell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::prelude::*;

use super::board::build_board_grid;
use super::hud::{set_header_game, set_header_library, start_timer, stop_timer};
use super::library::refresh_library;
use super::state::{AppState, max_pairs_for_width};

pub(super) fn rebuild_board(state: &Rc<RefCell<AppState>>) {
    let (board_container, grid_cols, grid_rows) = {
        let st = state.borrow();
        (st.board_container.clone(), st.grid_cols, st.grid_rows)
    };
    let Some(board_container) = board_container else {
        return;
    };

    while let Some(child) = board_container.first_child() {
        board_container.remove(&child);
    }
    let grid = build_board_grid(state);
    let grid_ratio = if grid_rows > 0 {
        grid_cols as f32 / grid_rows as f32
    } else {
        1.0
    };
    let grid_frame = gtk::AspectFrame::new(0.5, 0.5, grid_ratio, false);
    grid_frame.set_halign(gtk::Align::Fill);
    grid_frame.set_valign(gtk::Align::Fill);
    grid_frame.set_hexpand(true);
    grid_frame.set_vexpand(true);
    grid_frame.set_child(Some(&grid));
    board_container.append(&grid_frame);
}

/// Deals a fresh deck and slides to the board. Also the "Play Again" and
/// restart path: every entry is a brand-new session.
pub(super) fn show_game(state: &Rc<RefCell<AppState>>) {
    let width = {
        let st = state.borrow();
        st.view_stack.as_ref().map(|stack| stack.width()).unwrap_or(0)
    };
    {
        let mut st = state.borrow_mut();
        stop_timer(&mut st);
        st.start_game(max_pairs_for_width(width));
    }

    rebuild_board(state);
    set_header_game(state);
    {
        let st = state.borrow();
        if let Some(stack) = &st.view_stack {
            stack.set_transition_type(gtk::StackTransitionType::SlideLeft);
            stack.set_visible_child_name("game");
        }
    }
    start_timer(state, true);
}

/// Back to the photo library. Any running session is discarded.
pub(super) fn show_library(state: &Rc<RefCell<AppState>>) {
    {
        let mut st = state.borrow_mut();
        stop_timer(&mut st);
        st.end_game();
    }
    refresh_library(state);
    set_header_library(state);
    let st = state.borrow();
    if let Some(stack) = &st.view_stack {
        stack.set_transition_type(gtk::StackTransitionType::SlideRight);
        stack.set_visible_child_name("library");
    }
}
