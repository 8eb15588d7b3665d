use std::cell::RefCell;
use std::rc::Rc;

use gettextrs::gettext;
use gtk4 as gtk;
use gtk4::gdk;
use gtk4::prelude::*;

use super::dialogs::confirm_delete_all;
use super::picker::open_photo;
use super::records::format_mm_ss;
use super::scene::show_game;
use super::state::{AppState, TileImage};
use super::tile_store;

const THUMB_SIZE: i32 = 112;

fn build_tile_thumb(state: &Rc<RefCell<AppState>>, index: usize, tile: &Rc<TileImage>) -> gtk::Overlay {
    let overlay = gtk::Overlay::new();

    let picture = gtk::Picture::new();
    picture.set_content_fit(gtk::ContentFit::Cover);
    picture.set_size_request(THUMB_SIZE, THUMB_SIZE);
    picture.add_css_class("library-tile");
    let texture = gdk::Texture::for_pixbuf(&tile.pixbuf);
    picture.set_paintable(Some(&texture));
    overlay.set_child(Some(&picture));

    let delete_button = gtk::Button::from_icon_name("window-close-symbolic");
    delete_button.add_css_class("circular");
    delete_button.add_css_class("osd");
    delete_button.set_halign(gtk::Align::End);
    delete_button.set_valign(gtk::Align::Start);
    delete_button.set_margin_top(4);
    delete_button.set_margin_end(4);
    delete_button.set_tooltip_text(Some(&gettext("Remove photo")));
    delete_button.connect_clicked({
        let state = state.clone();
        move |_| {
            {
                let mut st = state.borrow_mut();
                st.remove_tile(index);
                tile_store::save_tiles(&st.tiles);
            }
            refresh_library(&state);
        }
    });
    overlay.add_overlay(&delete_button);

    overlay
}

/// Rebuilds the thumbnail grid and control visibility from the current
/// tile list.
pub(super) fn refresh_library(state: &Rc<RefCell<AppState>>) {
    let flow = {
        let st = state.borrow();
        st.tile_flow.clone()
    };
    let Some(flow) = flow else {
        return;
    };

    while let Some(child) = flow.first_child() {
        flow.remove(&child);
    }

    let st = state.borrow();
    for (index, tile) in st.tiles.iter().enumerate() {
        flow.insert(&build_tile_thumb(state, index, tile), -1);
    }

    if let Some(placeholder) = &st.library_placeholder {
        placeholder.set_visible(st.tiles.is_empty());
    }
    if let Some(start) = &st.start_button {
        start.set_visible(st.tiles.len() >= 2);
    }
    if let Some(delete_all) = &st.delete_all_button {
        delete_all.set_visible(!st.tiles.is_empty());
    }
    if let Some(label) = &st.best_time_label {
        match st.records.best_time_secs {
            Some(best) => {
                label.set_text(&format!("{} {}", gettext("Best time"), format_mm_ss(best)));
                label.set_visible(true);
            }
            None => label.set_visible(false),
        }
    }
}

pub(super) fn build_library_view(state: &Rc<RefCell<AppState>>) -> gtk::Box {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 0);
    root.set_hexpand(true);
    root.set_vexpand(true);
    root.add_css_class("library-root");

    let content = gtk::Box::new(gtk::Orientation::Vertical, 16);
    content.set_halign(gtk::Align::Center);
    content.set_valign(gtk::Align::Start);
    content.set_margin_top(24);
    content.set_margin_bottom(24);
    content.set_margin_start(24);
    content.set_margin_end(24);
    content.add_css_class("library-content");

    let placeholder = gtk::Box::new(gtk::Orientation::Vertical, 12);
    placeholder.set_halign(gtk::Align::Center);
    placeholder.add_css_class("library-empty");

    let icon = gtk::Image::from_icon_name("camera-photo-symbolic");
    icon.set_pixel_size(96);
    icon.add_css_class("dim-label");

    let hint = gtk::Label::new(Some(&gettext(
        "Choose a few photos to build your own matching deck.",
    )));
    hint.set_wrap(true);
    hint.set_justify(gtk::Justification::Center);
    hint.set_max_width_chars(36);
    hint.add_css_class("dim-label");

    placeholder.append(&icon);
    placeholder.append(&hint);
    content.append(&placeholder);

    let best_time_label = gtk::Label::new(None);
    best_time_label.add_css_class("caption");
    best_time_label.add_css_class("library-best-time");
    best_time_label.set_halign(gtk::Align::Center);
    best_time_label.set_visible(false);
    content.append(&best_time_label);

    let buttons_row = gtk::Box::new(gtk::Orientation::Horizontal, 12);
    buttons_row.set_halign(gtk::Align::Center);

    let choose_button = gtk::Button::with_label(&gettext("Choose Photo"));
    choose_button.add_css_class("pill");
    choose_button.connect_clicked({
        let state = state.clone();
        move |_| {
            open_photo(&state);
        }
    });
    buttons_row.append(&choose_button);

    let start_button = gtk::Button::with_label(&gettext("Start Game"));
    start_button.add_css_class("pill");
    start_button.add_css_class("suggested-action");
    start_button.set_visible(false);
    start_button.connect_clicked({
        let state = state.clone();
        move |_| {
            show_game(&state);
        }
    });
    buttons_row.append(&start_button);
    content.append(&buttons_row);

    let flow = gtk::FlowBox::new();
    flow.set_selection_mode(gtk::SelectionMode::None);
    flow.set_homogeneous(true);
    flow.set_column_spacing(12);
    flow.set_row_spacing(12);
    flow.set_min_children_per_line(2);
    flow.set_max_children_per_line(6);
    flow.set_halign(gtk::Align::Center);
    content.append(&flow);

    let delete_all_button = gtk::Button::with_label(&gettext("Delete all photos"));
    delete_all_button.add_css_class("flat");
    delete_all_button.add_css_class("destructive-action");
    delete_all_button.set_halign(gtk::Align::Center);
    delete_all_button.set_visible(false);
    delete_all_button.connect_clicked({
        let state = state.clone();
        move |_| {
            confirm_delete_all(&state);
        }
    });
    content.append(&delete_all_button);

    let scrolled = gtk::ScrolledWindow::new();
    scrolled.set_hexpand(true);
    scrolled.set_vexpand(true);
    scrolled.set_policy(gtk::PolicyType::Never, gtk::PolicyType::Automatic);
    scrolled.set_child(Some(&content));
    root.append(&scrolled);

    {
        let mut st = state.borrow_mut();
        st.tile_flow = Some(flow);
        st.library_placeholder = Some(placeholder);
        st.start_button = Some(start_button);
        st.delete_all_button = Some(delete_all_button);
        st.best_time_label = Some(best_time_label);
    }

    root
}
