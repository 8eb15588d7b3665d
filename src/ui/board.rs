use std::cell::RefCell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::gdk;
use gtk4::pango;
use gtk4::prelude::*;

use super::game::handle_card_click;
use super::state::{AppState, CardStatus};

pub const CONTENT_MARGIN: i32 = 12;
pub const TILE_GAP: i32 = 6;

pub(super) fn clear_flip_classes(button: &gtk::Button) {
    button.remove_css_class("flip-hide");
    button.remove_css_class("flip-show-a");
    button.remove_css_class("flip-show-b");
}

/// Syncs a card widget's face with its status.
pub(super) fn set_face_visible(st: &AppState, index: usize) {
    let (Some(stack), Some(card)) = (st.card_faces.get(index), st.cards.get(index)) else {
        return;
    };
    let child = if card.status == CardStatus::Hidden {
        "back"
    } else {
        "face"
    };
    stack.set_visible_child_name(child);
}

pub(super) fn play_flip_show(st: &mut AppState, index: usize) {
    let Some(button) = st.grid_buttons.get(index).cloned() else {
        return;
    };
    clear_flip_classes(&button);
    st.flip_anim_phase = !st.flip_anim_phase;
    if st.flip_anim_phase {
        button.add_css_class("flip-show-a");
    } else {
        button.add_css_class("flip-show-b");
    }
    set_face_visible(st, index);
}

fn draw_card_back(area: &gtk::DrawingArea, cr: &cairo::Context, width: i32, height: i32) {
    let min_dim = width.min(height) as f64;
    let font_size = min_dim * 0.34;

    cr.set_antialias(cairo::Antialias::Best);

    let layout = pangocairo::functions::create_layout(cr);
    let mut font_desc = pango::FontDescription::new();
    font_desc.set_family("Cantarell, Noto Sans, sans");
    font_desc.set_weight(pango::Weight::Bold);
    font_desc.set_size((font_size * pango::SCALE as f64) as i32);
    layout.set_font_description(Some(&font_desc));
    layout.set_text("?");

    let fg = area.style_context().color();
    cr.set_source_rgba(
        fg.red() as f64,
        fg.green() as f64,
        fg.blue() as f64,
        fg.alpha() as f64,
    );

    let (text_width, text_height) = layout.pixel_size();
    cr.move_to(
        (width as f64 - text_width as f64) / 2.0,
        (height as f64 - text_height as f64) / 2.0,
    );
    pangocairo::functions::show_layout(cr, &layout);
}

pub fn build_board_grid(state: &Rc<RefCell<AppState>>) -> gtk::Grid {
    let grid = gtk::Grid::new();
    grid.add_css_class("pair-board");
    grid.set_row_spacing(TILE_GAP as u32);
    grid.set_column_spacing(TILE_GAP as u32);
    grid.set_halign(gtk::Align::Fill);
    grid.set_valign(gtk::Align::Fill);
    grid.set_hexpand(true);
    grid.set_vexpand(true);

    let css_provider = {
        let st = state.borrow();
        st.dynamic_css_provider.clone()
    };

    let (grid_cols, grid_rows, card_count) = {
        let st = state.borrow();
        (st.grid_cols, st.grid_rows, st.cards.len())
    };
    if grid_cols <= 0 || grid_rows <= 0 {
        return grid;
    }

    let update_styles = {
        let css_provider = css_provider.clone();
        move |grid: &gtk::Grid| {
            let width = grid.width();
            let height = grid.height();
            if width > 0 && height > 0 {
                let cell_width = (width - (grid_cols - 1) * TILE_GAP) / grid_cols;
                let cell_height = (height - (grid_rows - 1) * TILE_GAP) / grid_rows;
                let min_dim = cell_width.min(cell_height);

                // Corner radii follow the available cell size.
                let card_radius = (min_dim as f64 * 0.12) as i32;
                let container_radius = (min_dim as f64 * 0.2) as i32;

                if let Some(provider) = &css_provider {
                    provider.load_from_data(&format!(
                        ".pair-card {{ border-radius: {card_radius}px; }} \
                         .pair-card-container {{ border-radius: {container_radius}px; }}",
                        card_radius = card_radius,
                        container_radius = container_radius
                    ));
                }
            }
        }
    };

    let update_styles_clone = update_styles.clone();
    grid.connect_closure(
        "notify::width",
        false,
        glib::closure_local!(move |grid: gtk::Grid, _: glib::ParamSpec| {
            update_styles_clone(&grid);
        }),
    );
    grid.connect_closure(
        "notify::height",
        false,
        glib::closure_local!(move |grid: gtk::Grid, _: glib::ParamSpec| {
            update_styles(&grid);
        }),
    );

    let mut buttons = Vec::with_capacity(card_count);
    let mut faces = Vec::with_capacity(card_count);

    for i in 0..card_count {
        let index = i;
        let aspect_frame = gtk::AspectFrame::builder()
            .ratio(1.0)
            .obey_child(false)
            .halign(gtk::Align::Fill)
            .valign(gtk::Align::Fill)
            .hexpand(true)
            .vexpand(true)
            .build();

        let button = gtk::Button::builder()
            .css_classes(vec!["pair-card"])
            .build();
        button.set_hexpand(true);
        button.set_vexpand(true);

        let face_stack = gtk::Stack::new();
        face_stack.set_hexpand(true);
        face_stack.set_vexpand(true);

        let back = gtk::DrawingArea::builder()
            .hexpand(true)
            .vexpand(true)
            .build();
        back.add_css_class("pair-card-back");
        back.set_draw_func(|area, cr, width, height| {
            draw_card_back(area, cr, width, height);
        });
        face_stack.add_named(&back, Some("back"));

        let picture = gtk::Picture::new();
        picture.set_content_fit(gtk::ContentFit::Cover);
        picture.set_hexpand(true);
        picture.set_vexpand(true);
        picture.add_css_class("pair-card-face");
        {
            let st = state.borrow();
            if let Some(card) = st.cards.get(index) {
                let texture = gdk::Texture::for_pixbuf(&card.tile.pixbuf);
                picture.set_paintable(Some(&texture));
            }
        }
        face_stack.add_named(&picture, Some("face"));
        face_stack.set_visible_child_name("back");

        button.set_child(Some(&face_stack));

        if let Some(card) = state.borrow().cards.get(index) {
            match card.status {
                CardStatus::Matched => button.add_css_class("matched"),
                CardStatus::Flipped => button.add_css_class("active"),
                CardStatus::Hidden => (),
            }
        }

        let state_clone = state.clone();
        button.connect_clicked(move |_| {
            handle_card_click(&state_clone, index);
        });

        aspect_frame.set_child(Some(&button));

        let x = (i as i32) % grid_cols;
        let y = (i as i32) / grid_cols;
        grid.attach(&aspect_frame, x, y, 1, 1);
        buttons.push(button);
        faces.push(face_stack);
    }

    {
        let mut st = state.borrow_mut();
        st.grid_buttons = buttons;
        st.card_faces = faces;
        for index in 0..card_count {
            set_face_visible(&st, index);
        }
    }

    grid
}
