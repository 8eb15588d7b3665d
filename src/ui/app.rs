use std::cell::RefCell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::gdk;
use gtk4::glib;
use gtk4::prelude::*;
use libadwaita as adw;
use adw::prelude::*;
use gio::SimpleAction;

use super::board::CONTENT_MARGIN;
use super::crop::{build_crop_view, cancel_crop};
use super::dialogs::{show_about_dialog, show_instructions_dialog};
use super::hud::{set_header_library, start_timer, stop_timer, update_subtitle};
use super::library::{build_library_view, refresh_library};
use super::records::load_records;
use super::scene::{show_game, show_library};
use super::state::{AppState, CardStatus};
use super::tile_store;

const APP_ID: &str = "io.hedberg.Pairshot";

#[derive(Clone, Copy, Default)]
struct OverlayPauseState {
    paused: bool,
    previous_lock_input: bool,
}

fn pause_game_for_overlay(state: &Rc<RefCell<AppState>>) -> OverlayPauseState {
    let mut st = state.borrow_mut();
    let in_game_view = st
        .view_stack
        .as_ref()
        .and_then(|stack| stack.visible_child_name())
        .as_deref()
        == Some("game");
    if !in_game_view || st.timer_handle.is_none() {
        return OverlayPauseState::default();
    }

    let pause_state = OverlayPauseState {
        paused: true,
        previous_lock_input: st.lock_input,
    };
    stop_timer(&mut st);
    st.lock_input = true;
    if let Some(subtitle) = &st.title_game_subtitle {
        subtitle.set_text("PAUSED");
    }
    pause_state
}

fn resume_game_after_overlay(state: &Rc<RefCell<AppState>>, pause_state: OverlayPauseState) {
    if !pause_state.paused {
        return;
    }

    let should_resume_timer = {
        let mut st = state.borrow_mut();
        let in_game_view = st
            .view_stack
            .as_ref()
            .and_then(|stack| stack.visible_child_name())
            .as_deref()
            == Some("game");
        if !in_game_view {
            return;
        }

        st.lock_input = pause_state.previous_lock_input;
        update_subtitle(&st);
        st.timer_handle.is_none()
            && !st.cards.is_empty()
            && st.cards.iter().any(|c| c.status != CardStatus::Matched)
    };

    if should_resume_timer {
        start_timer(state, false);
    }
}

pub fn run() -> glib::ExitCode {
    glib::set_prgname(Some(APP_ID));
    let app = adw::Application::builder()
        .application_id(APP_ID)
        .build();

    app.connect_activate(move |app| {
        load_css();

        let state = Rc::new(RefCell::new(AppState::new()));

        let instructions_action = SimpleAction::new("instructions", None);
        instructions_action.connect_activate({
            let app = app.clone();
            let state = state.clone();
            move |_, _| {
                let pause_state = pause_game_for_overlay(&state);
                let dialog = show_instructions_dialog(&app);
                let state_resume = state.clone();
                dialog.connect_response(None, move |_, _| {
                    resume_game_after_overlay(&state_resume, pause_state);
                });
            }
        });
        app.add_action(&instructions_action);

        let about_action = SimpleAction::new("about", None);
        about_action.connect_activate({
            let app = app.clone();
            let state = state.clone();
            move |_, _| {
                let pause_state = pause_game_for_overlay(&state);
                let dialog = show_about_dialog(&app);
                let state_resume = state.clone();
                dialog.connect_closed(move |_| {
                    resume_game_after_overlay(&state_resume, pause_state);
                });
            }
        });
        app.add_action(&about_action);

        let quit_action = SimpleAction::new("quit", None);
        quit_action.connect_activate({
            let app = app.clone();
            move |_, _| app.quit()
        });
        app.add_action(&quit_action);

        let dynamic_css_provider = gtk::CssProvider::new();
        if let Some(display) = gdk::Display::default() {
            gtk::style_context_add_provider_for_display(
                &display,
                &dynamic_css_provider,
                gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
            );
        }

        let title_library = gtk::Label::new(None);
        title_library.set_markup("<b>Pairshot</b>");
        title_library.set_halign(gtk::Align::Center);

        let title_game_box = gtk::Box::new(gtk::Orientation::Vertical, 0);
        title_game_box.set_valign(gtk::Align::Center);
        title_game_box.set_halign(gtk::Align::Center);
        title_game_box.set_hexpand(true);

        let title_game_main = gtk::Label::builder()
            .label("Pairshot")
            .halign(gtk::Align::Center)
            .css_classes(vec!["game-title-main"])
            .build();

        let title_game_subtitle = gtk::Label::builder()
            .label("")
            .halign(gtk::Align::Center)
            .css_classes(vec!["game-title-subtitle", "caption"])
            .build();

        title_game_box.append(&title_game_main);
        title_game_box.append(&title_game_subtitle);

        let title_crop = gtk::Label::new(None);
        title_crop.set_markup(&format!("<b>{}</b>", gettextrs::gettext("Crop Photo")));
        title_crop.set_halign(gtk::Align::Center);

        let header = adw::HeaderBar::builder()
            .title_widget(&title_library)
            .build();
        header.add_css_class("app-header");
        header.add_css_class("flat");

        let back_button = gtk::Button::builder()
            .icon_name("go-previous-symbolic")
            .build();
        back_button.set_tooltip_text(Some(&gettextrs::gettext("Back")));
        back_button.connect_clicked({
            let state = state.clone();
            move |_| {
                let view = state
                    .borrow()
                    .view_stack
                    .as_ref()
                    .and_then(|stack| stack.visible_child_name());
                match view.as_deref() {
                    Some("crop") => cancel_crop(&state),
                    Some("game") => show_library(&state),
                    _ => {}
                }
            }
        });
        header.pack_start(&back_button);

        let menu_model = gio::Menu::new();
        menu_model.append(Some(&gettextrs::gettext("Instructions")), Some("app.instructions"));
        menu_model.append(Some(&gettextrs::gettext("About Pairshot")), Some("app.about"));
        menu_model.append(Some(&gettextrs::gettext("Quit")), Some("app.quit"));
        let menu_button = gtk::MenuButton::builder()
            .icon_name("open-menu-symbolic")
            .menu_model(&menu_model)
            .build();

        let restart_button = gtk::Button::builder()
            .icon_name("view-refresh-symbolic")
            .build();
        restart_button.set_tooltip_text(Some(&gettextrs::gettext("New Game")));
        restart_button.connect_clicked({
            let state = state.clone();
            move |_| {
                show_game(&state);
            }
        });
        let end_box = gtk::Box::new(gtk::Orientation::Horizontal, 6);
        end_box.append(&restart_button);
        end_box.append(&menu_button);
        header.pack_end(&end_box);

        let view_stack = gtk::Stack::new();
        view_stack.set_hexpand(true);
        view_stack.set_vexpand(true);
        view_stack.set_hhomogeneous(false);
        view_stack.set_vhomogeneous(false);
        view_stack.set_interpolate_size(false);
        view_stack.set_transition_type(gtk::StackTransitionType::SlideLeft);
        view_stack.set_transition_duration(300);

        let library_view = build_library_view(&state);
        view_stack.add_named(&library_view, Some("library"));

        let crop_view = build_crop_view(&state);
        view_stack.add_named(&crop_view, Some("crop"));

        let game_view = build_game_view(&state);
        view_stack.add_named(&game_view, Some("game"));

        view_stack.set_visible_child_name("library");

        let toolbar = adw::ToolbarView::new();
        toolbar.set_hexpand(true);
        toolbar.set_vexpand(true);
        toolbar.add_top_bar(&header);
        toolbar.set_content(Some(&view_stack));

        let win = adw::ApplicationWindow::builder()
            .application(app)
            .title("Pairshot")
            .icon_name(APP_ID)
            .default_width(860)
            .default_height(680)
            .content(&toolbar)
            .build();
        win.set_size_request(360, 560);
        win.add_css_class("app-window");

        let style_manager = adw::StyleManager::default();
        if style_manager.is_dark() {
            win.add_css_class("theme-dark");
        } else {
            win.add_css_class("theme-light");
        }
        style_manager.connect_notify_local(Some("dark"), {
            let win = win.clone();
            move |manager, _| {
                if manager.is_dark() {
                    win.remove_css_class("theme-light");
                    win.add_css_class("theme-dark");
                } else {
                    win.remove_css_class("theme-dark");
                    win.add_css_class("theme-light");
                }
            }
        });

        {
            let mut st = state.borrow_mut();
            st.view_stack = Some(view_stack.clone());
            st.header = Some(header.clone());
            st.back_button = Some(back_button);
            st.menu_button = Some(menu_button);
            st.restart_button = Some(restart_button);
            st.title_library = Some(title_library);
            st.title_game = Some(title_game_box.upcast::<gtk::Widget>());
            st.title_game_subtitle = Some(title_game_subtitle);
            st.title_crop = Some(title_crop);
            st.dynamic_css_provider = Some(dynamic_css_provider);
            st.records = load_records();
            st.tiles = tile_store::load_tiles();
        }
        refresh_library(&state);

        let global_key = gtk::EventControllerKey::new();
        global_key.set_propagation_phase(gtk::PropagationPhase::Capture);
        global_key.connect_key_pressed({
            let state = state.clone();
            move |_, key, _, _| {
                if key == gdk::Key::Escape {
                    let view = state
                        .borrow()
                        .view_stack
                        .as_ref()
                        .and_then(|stack| stack.visible_child_name());
                    match view.as_deref() {
                        Some("crop") => {
                            cancel_crop(&state);
                            return glib::Propagation::Stop;
                        }
                        Some("game") if !state.borrow().lock_input => {
                            show_library(&state);
                            return glib::Propagation::Stop;
                        }
                        _ => {}
                    }
                }
                glib::Propagation::Proceed
            }
        });
        win.add_controller(global_key);

        set_header_library(&state);
        win.present();
    });

    app.run()
}

fn load_css() {
    let Some(display) = gdk::Display::default() else {
        return;
    };

    let provider = gtk::CssProvider::new();
    provider.load_from_data(include_str!("../../data/style.css"));
    gtk::style_context_add_provider_for_display(
        &display,
        &provider,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}

fn build_game_view(state: &Rc<RefCell<AppState>>) -> gtk::Box {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 0);
    root.set_hexpand(true);
    root.set_vexpand(true);
    root.add_css_class("game-root");

    let content = gtk::Box::new(gtk::Orientation::Vertical, 12);
    content.set_hexpand(true);
    content.set_vexpand(true);
    content.set_halign(gtk::Align::Fill);
    content.set_valign(gtk::Align::Fill);
    content.set_margin_top(CONTENT_MARGIN);
    content.set_margin_bottom(CONTENT_MARGIN);
    content.set_margin_start(CONTENT_MARGIN);
    content.set_margin_end(CONTENT_MARGIN);

    let board_card = gtk::Box::new(gtk::Orientation::Vertical, 0);
    board_card.set_halign(gtk::Align::Fill);
    board_card.set_valign(gtk::Align::Fill);
    board_card.set_hexpand(true);
    board_card.set_vexpand(true);
    board_card.add_css_class("pair-card-container");

    board_card.connect_closure(
        "notify::width",
        false,
        glib::closure_local!(move |card: gtk::Box, _: glib::ParamSpec| {
            if card.width() < 500 {
                card.add_css_class("compact");
            } else {
                card.remove_css_class("compact");
            }
        }),
    );

    content.append(&board_card);
    root.append(&content);

    {
        let mut st = state.borrow_mut();
        st.board_container = Some(board_card.clone());
    }

    root
}
