use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gdk_pixbuf::{InterpType, Pixbuf};
use gtk4 as gtk;
use gtk4::gdk;
use gtk4::prelude::*;

use gettextrs::gettext;

use super::library::refresh_library;
use super::scene::show_library;
use super::state::{AppState, TileImage};
use super::tile_store;

/// Edge length of a finished tile, in pixels.
pub const TILE_EDGE: i32 = 320;

const SCALE_MIN: f64 = 0.2;
const SCALE_MAX: f64 = 8.0;
const FRAME_FRACTION: f64 = 0.75;

fn frame_side(view_w: f64, view_h: f64) -> f64 {
    (view_w.min(view_h) * FRAME_FRACTION).max(1.0)
}

/// Scale that fits the image inside the viewport, the baseline the user
/// zoom multiplies.
fn fit_scale(img_w: f64, img_h: f64, view_w: f64, view_h: f64) -> f64 {
    if img_w <= 0.0 || img_h <= 0.0 {
        return 1.0;
    }
    (view_w / img_w).min(view_h / img_h)
}

/// Maps the centered square frame through the current pan/zoom into a
/// square source rect in image coordinates. `None` when the frame misses
/// the image entirely or collapses below one pixel.
fn crop_source_rect(
    img_w: f64,
    img_h: f64,
    view_w: f64,
    view_h: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
) -> Option<(i32, i32, i32)> {
    if img_w < 1.0 || img_h < 1.0 || view_w < 1.0 || view_h < 1.0 {
        return None;
    }
    let display = fit_scale(img_w, img_h, view_w, view_h) * scale;
    if display <= 0.0 {
        return None;
    }

    let disp_w = img_w * display;
    let disp_h = img_h * display;
    let pic_x = (view_w - disp_w) / 2.0 + offset_x;
    let pic_y = (view_h - disp_h) / 2.0 + offset_y;

    let side = frame_side(view_w, view_h);
    let src_x = ((view_w - side) / 2.0 - pic_x) / display;
    let src_y = ((view_h - side) / 2.0 - pic_y) / display;
    let src_side = side / display;

    // Frame entirely off the image: nothing to crop.
    if src_x + src_side <= 0.0 || src_y + src_side <= 0.0 || src_x >= img_w || src_y >= img_h {
        return None;
    }

    let side = src_side.min(img_w).min(img_h);
    if side < 1.0 {
        return None;
    }
    let x = src_x.clamp(0.0, img_w - side);
    let y = src_y.clamp(0.0, img_h - side);
    Some((x as i32, y as i32, side as i32))
}

fn center_square_rect(img_w: i32, img_h: i32) -> (i32, i32, i32) {
    let side = img_w.min(img_h).max(1);
    ((img_w - side) / 2, (img_h - side) / 2, side)
}

/// Extracts the framed square, or the center square of the original when
/// the mapping degenerates.
fn extract_tile(pixbuf: &Pixbuf, view_w: f64, view_h: f64, scale: f64, off_x: f64, off_y: f64) -> Pixbuf {
    let (img_w, img_h) = (pixbuf.width(), pixbuf.height());
    let (x, y, side) = match crop_source_rect(
        img_w as f64,
        img_h as f64,
        view_w,
        view_h,
        scale,
        off_x,
        off_y,
    ) {
        Some(rect) => rect,
        None => {
            glib::g_warning!("pairshot", "crop frame missed the photo, using center square");
            center_square_rect(img_w, img_h)
        }
    };
    let sub = pixbuf.new_subpixbuf(x, y, side, side);
    sub.scale_simple(TILE_EDGE, TILE_EDGE, InterpType::Bilinear)
        .unwrap_or(sub)
}

/// Hands a freshly picked photo to the crop view and shows it.
pub(super) fn begin_crop(state: &Rc<RefCell<AppState>>, pixbuf: Pixbuf) {
    {
        let mut st = state.borrow_mut();
        st.pending_image = Some(pixbuf.clone());
        st.crop_scale = 1.0;
        st.crop_offset_x = 0.0;
        st.crop_offset_y = 0.0;
        if let Some(picture) = &st.crop_picture {
            let texture = gdk::Texture::for_pixbuf(&pixbuf);
            picture.set_paintable(Some(&texture));
        }
    }

    super::hud::set_header_crop(state);
    {
        let st = state.borrow();
        if let Some(stack) = &st.view_stack {
            stack.set_transition_type(gtk::StackTransitionType::SlideLeft);
            stack.set_visible_child_name("crop");
        }
    }
    update_crop_layout(state);
}

pub(super) fn cancel_crop(state: &Rc<RefCell<AppState>>) {
    state.borrow_mut().pending_image = None;
    show_library(state);
}

fn apply_crop(state: &Rc<RefCell<AppState>>) {
    let tile = {
        let st = state.borrow();
        let Some(pixbuf) = &st.pending_image else {
            return;
        };
        let Some(area) = &st.crop_frame_area else {
            return;
        };
        let cropped = extract_tile(
            pixbuf,
            area.width() as f64,
            area.height() as f64,
            st.crop_scale,
            st.crop_offset_x,
            st.crop_offset_y,
        );
        TileImage::from_pixbuf(cropped)
    };

    match tile {
        Ok(tile) => {
            let mut st = state.borrow_mut();
            st.tiles.push(Rc::new(tile));
            st.pending_image = None;
            tile_store::save_tiles(&st.tiles);
        }
        Err(err) => {
            glib::g_warning!("pairshot", "failed to encode cropped tile: {err}");
            state.borrow_mut().pending_image = None;
        }
    }

    refresh_library(state);
    show_library(state);
}

pub(super) fn update_crop_layout(state: &Rc<RefCell<AppState>>) {
    let st = state.borrow();
    let (Some(area), Some(fixed), Some(picture)) =
        (&st.crop_frame_area, &st.crop_fixed, &st.crop_picture)
    else {
        return;
    };
    let Some(pixbuf) = &st.pending_image else {
        return;
    };

    let view_w = area.width() as f64;
    let view_h = area.height() as f64;
    if view_w < 1.0 || view_h < 1.0 {
        return;
    }

    let img_w = pixbuf.width() as f64;
    let img_h = pixbuf.height() as f64;
    let display = fit_scale(img_w, img_h, view_w, view_h) * st.crop_scale;
    let disp_w = (img_w * display).max(1.0);
    let disp_h = (img_h * display).max(1.0);

    picture.set_size_request(disp_w as i32, disp_h as i32);
    fixed.move_(
        picture,
        (view_w - disp_w) / 2.0 + st.crop_offset_x,
        (view_h - disp_h) / 2.0 + st.crop_offset_y,
    );
    area.queue_draw();
}

fn draw_frame(cr: &cairo::Context, width: i32, height: i32) {
    let w = width as f64;
    let h = height as f64;
    let side = frame_side(w, h);
    let left = (w - side) / 2.0;
    let top = (h - side) / 2.0;

    cr.set_source_rgba(0.0, 0.0, 0.0, 0.45);
    cr.rectangle(0.0, 0.0, w, top);
    cr.rectangle(0.0, top + side, w, h - top - side);
    cr.rectangle(0.0, top, left, side);
    cr.rectangle(left + side, top, w - left - side, side);
    let _ = cr.fill();

    cr.set_source_rgb(1.0, 1.0, 1.0);
    cr.set_line_width(2.0);
    cr.rectangle(left, top, side, side);
    let _ = cr.stroke();
}

pub(super) fn build_crop_view(state: &Rc<RefCell<AppState>>) -> gtk::Box {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 0);
    root.set_hexpand(true);
    root.set_vexpand(true);
    root.add_css_class("crop-root");

    let viewport = gtk::Overlay::new();
    viewport.set_hexpand(true);
    viewport.set_vexpand(true);

    let fixed = gtk::Fixed::new();
    fixed.set_hexpand(true);
    fixed.set_vexpand(true);
    fixed.add_css_class("crop-canvas");

    let picture = gtk::Picture::new();
    picture.set_content_fit(gtk::ContentFit::Fill);
    fixed.put(&picture, 0.0, 0.0);
    viewport.set_child(Some(&fixed));

    let frame_area = gtk::DrawingArea::new();
    frame_area.set_hexpand(true);
    frame_area.set_vexpand(true);
    frame_area.set_can_target(false);
    frame_area.set_draw_func(|_, cr, width, height| {
        draw_frame(cr, width, height);
    });
    viewport.add_overlay(&frame_area);

    frame_area.connect_resize({
        let state = state.clone();
        move |_, _, _| {
            update_crop_layout(&state);
        }
    });

    let drag = gtk::GestureDrag::new();
    let drag_origin = Rc::new(Cell::new((0.0_f64, 0.0_f64)));
    drag.connect_drag_begin({
        let state = state.clone();
        let drag_origin = drag_origin.clone();
        move |_, _, _| {
            let st = state.borrow();
            drag_origin.set((st.crop_offset_x, st.crop_offset_y));
        }
    });
    drag.connect_drag_update({
        let state = state.clone();
        let drag_origin = drag_origin.clone();
        move |_, dx, dy| {
            let (base_x, base_y) = drag_origin.get();
            {
                let mut st = state.borrow_mut();
                st.crop_offset_x = base_x + dx;
                st.crop_offset_y = base_y + dy;
            }
            update_crop_layout(&state);
        }
    });
    viewport.add_controller(drag);

    let scroll = gtk::EventControllerScroll::new(gtk::EventControllerScrollFlags::VERTICAL);
    scroll.connect_scroll({
        let state = state.clone();
        move |_, _, dy| {
            {
                let mut st = state.borrow_mut();
                let factor = if dy < 0.0 { 1.1 } else { 1.0 / 1.1 };
                st.crop_scale = (st.crop_scale * factor).clamp(SCALE_MIN, SCALE_MAX);
            }
            update_crop_layout(&state);
            glib::Propagation::Stop
        }
    });
    viewport.add_controller(scroll);

    let zoom = gtk::GestureZoom::new();
    let zoom_origin = Rc::new(Cell::new(1.0_f64));
    zoom.connect_begin({
        let state = state.clone();
        let zoom_origin = zoom_origin.clone();
        move |_, _| {
            zoom_origin.set(state.borrow().crop_scale);
        }
    });
    zoom.connect_scale_changed({
        let state = state.clone();
        let zoom_origin = zoom_origin.clone();
        move |_, scale| {
            {
                let mut st = state.borrow_mut();
                st.crop_scale = (zoom_origin.get() * scale).clamp(SCALE_MIN, SCALE_MAX);
            }
            update_crop_layout(&state);
        }
    });
    viewport.add_controller(zoom);

    root.append(&viewport);

    let actions = gtk::Box::new(gtk::Orientation::Horizontal, 12);
    actions.set_halign(gtk::Align::Center);
    actions.set_margin_top(12);
    actions.set_margin_bottom(18);

    let cancel_button = gtk::Button::with_label(&gettext("Cancel"));
    cancel_button.add_css_class("pill");
    cancel_button.connect_clicked({
        let state = state.clone();
        move |_| {
            cancel_crop(&state);
        }
    });

    let choose_button = gtk::Button::with_label(&gettext("Choose Frame"));
    choose_button.add_css_class("pill");
    choose_button.add_css_class("suggested-action");
    choose_button.connect_clicked({
        let state = state.clone();
        move |_| {
            apply_crop(&state);
        }
    });

    actions.append(&cancel_button);
    actions.append(&choose_button);
    root.append(&actions);

    {
        let mut st = state.borrow_mut();
        st.crop_picture = Some(picture);
        st.crop_fixed = Some(fixed);
        st.crop_frame_area = Some(frame_area);
    }

    root
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1000x800 image in a 1000x800 viewport fits at scale 1.0, so the
    // 600px frame maps straight onto image pixels.
    const IMG_W: f64 = 1000.0;
    const IMG_H: f64 = 800.0;
    const VIEW_W: f64 = 1000.0;
    const VIEW_H: f64 = 800.0;

    #[test]
    fn centered_frame_maps_to_centered_square() {
        let (x, y, side) =
            crop_source_rect(IMG_W, IMG_H, VIEW_W, VIEW_H, 1.0, 0.0, 0.0).unwrap();
        assert_eq!(side, 600);
        assert_eq!(x, 200);
        assert_eq!(y, 100);
    }

    #[test]
    fn pan_shifts_the_source_rect_opposite() {
        let (x, y, _) =
            crop_source_rect(IMG_W, IMG_H, VIEW_W, VIEW_H, 1.0, 50.0, -30.0).unwrap();
        assert_eq!(x, 150);
        assert_eq!(y, 130);
    }

    #[test]
    fn zoom_shrinks_the_source_rect() {
        let (_, _, side) =
            crop_source_rect(IMG_W, IMG_H, VIEW_W, VIEW_H, 2.0, 0.0, 0.0).unwrap();
        assert_eq!(side, 300);
    }

    #[test]
    fn result_stays_inside_image_bounds() {
        for &(scale, off_x, off_y) in &[
            (1.0, 900.0, 0.0),
            (0.3, -400.0, 250.0),
            (4.0, 123.0, -456.0),
        ] {
            if let Some((x, y, side)) =
                crop_source_rect(IMG_W, IMG_H, VIEW_W, VIEW_H, scale, off_x, off_y)
            {
                assert!(side >= 1);
                assert!(x >= 0 && y >= 0);
                assert!(x + side <= IMG_W as i32);
                assert!(y + side <= IMG_H as i32);
            }
        }
    }

    #[test]
    fn frame_fully_off_the_image_degenerates() {
        // Image dragged far off screen to the right.
        assert_eq!(
            crop_source_rect(IMG_W, IMG_H, VIEW_W, VIEW_H, 1.0, 5000.0, 0.0),
            None
        );
        assert_eq!(crop_source_rect(0.0, 0.0, VIEW_W, VIEW_H, 1.0, 0.0, 0.0), None);
    }

    #[test]
    fn center_square_fallback_is_square_and_centered() {
        assert_eq!(center_square_rect(1000, 800), (100, 0, 800));
        assert_eq!(center_square_rect(640, 640), (0, 0, 640));
        assert_eq!(center_square_rect(320, 1000), (0, 340, 320));
    }
}
