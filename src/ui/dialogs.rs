use std::cell::RefCell;
use std::rc::Rc;

use gettextrs::gettext;
use gtk4 as gtk;
use libadwaita as adw;

use adw::prelude::*;

use super::records::{GameOutcome, format_mm_ss};
use super::scene::{show_game, show_library};
use super::state::AppState;
use super::tile_store;

pub fn show_instructions_dialog(app: &adw::Application) -> adw::AlertDialog {
    let dialog = adw::AlertDialog::new(
        Some(&gettext("Instructions")),
        Some(&gettext(
            "Pick photos and crop each one into a square tile.\n\
Every tile appears twice on the board, face down.\n\
Flip two cards at a time and find all the pairs before the clock ruins your record.",
        )),
    );
    dialog.add_response("ok", &gettext("Got it"));
    dialog.set_default_response(Some("ok"));
    dialog.set_close_response("ok");
    dialog.present(app.active_window().as_ref());
    dialog
}

pub fn show_about_dialog(app: &adw::Application) -> adw::AboutDialog {
    let dialog = adw::AboutDialog::builder()
        .application_name("Pairshot")
        .application_icon("io.hedberg.Pairshot")
        .developer_name("Jonas Hedberg")
        .developers(vec!["Jonas Hedberg"])
        .version("0.1.0")
        .comments(gettext("A pair-matching game built from your own photos."))
        .issue_url("https://github.com/jhedberg/pairshot/issues")
        .website("https://github.com/jhedberg/pairshot")
        .build();
    dialog.add_legal_section(
        "Pairshot",
        Some("© 2026 Jonas Hedberg"),
        gtk::License::MitX11,
        None,
    );
    dialog.present(app.active_window().as_ref());
    dialog
}

/// End-of-game prompt: replay with a fresh deck or return to the library.
pub(super) fn show_game_over_dialog(state: &Rc<RefCell<AppState>>, outcome: GameOutcome) {
    let heading = if outcome.improved {
        gettext("New Best Time!")
    } else {
        gettext("You Found Them All!")
    };
    let body = format!(
        "{}: {}\n{}: {}\n\n{}",
        gettext("Time"),
        format_mm_ss(outcome.duration_secs),
        gettext("Best"),
        format_mm_ss(outcome.best_secs),
        gettext("Play again?")
    );

    let dialog = adw::AlertDialog::new(Some(&heading), Some(&body));
    dialog.add_response("library", &gettext("Back to Photos"));
    dialog.add_response("again", &gettext("Play Again"));
    dialog.set_response_appearance("again", adw::ResponseAppearance::Suggested);
    dialog.set_default_response(Some("again"));
    dialog.set_close_response("library");
    dialog.connect_response(None, {
        let state = state.clone();
        move |_, response| {
            if response == "again" {
                show_game(&state);
            } else {
                show_library(&state);
            }
        }
    });

    let parent = state.borrow().view_stack.clone();
    dialog.present(parent.as_ref());
}

pub(super) fn confirm_delete_all(state: &Rc<RefCell<AppState>>) {
    let dialog = adw::AlertDialog::new(
        Some(&gettext("Delete All Photos?")),
        Some(&gettext(
            "This removes every tile from your deck. The original photos on disk are not touched.",
        )),
    );
    dialog.add_response("cancel", &gettext("Cancel"));
    dialog.add_response("delete", &gettext("Delete All"));
    dialog.set_response_appearance("delete", adw::ResponseAppearance::Destructive);
    dialog.set_default_response(Some("cancel"));
    dialog.set_close_response("cancel");
    dialog.connect_response(None, {
        let state = state.clone();
        move |_, response| {
            if response == "delete" {
                {
                    let mut st = state.borrow_mut();
                    st.tiles.clear();
                    tile_store::save_tiles(&st.tiles);
                }
                super::library::refresh_library(&state);
            }
        }
    });

    let parent = state.borrow().view_stack.clone();
    dialog.present(parent.as_ref());
}
