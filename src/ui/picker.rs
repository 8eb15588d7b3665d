use std::cell::RefCell;
use std::rc::Rc;

use gdk_pixbuf::Pixbuf;
use gettextrs::gettext;
use gtk4 as gtk;
use gtk4::prelude::*;

use super::crop::begin_crop;
use super::state::AppState;

fn parent_window(state: &Rc<RefCell<AppState>>) -> Option<gtk::Window> {
    let st = state.borrow();
    st.view_stack
        .as_ref()
        .and_then(|stack| stack.root())
        .and_then(|root| root.downcast::<gtk::Window>().ok())
}

/// Opens the photo chooser; a successful pick flows into the crop view.
pub(super) fn open_photo(state: &Rc<RefCell<AppState>>) {
    let window = parent_window(state);

    let filter = gtk::FileFilter::new();
    filter.add_pixbuf_formats();
    filter.set_name(Some(&gettext("Images")));

    let filters = gio::ListStore::new::<gtk::FileFilter>();
    filters.append(&filter);

    let dialog = gtk::FileDialog::builder()
        .title(gettext("Choose a Photo"))
        .modal(true)
        .filters(&filters)
        .default_filter(&filter)
        .build();

    let state = state.clone();
    dialog.open(window.as_ref(), None::<&gio::Cancellable>, move |result| {
        match result {
            Ok(file) => load_photo_async(&state, file),
            Err(err) => {
                if !err.matches(gtk::DialogError::Dismissed) {
                    glib::g_warning!("pairshot", "photo chooser failed: {err}");
                }
            }
        }
    });
}

fn load_photo_async(state: &Rc<RefCell<AppState>>, file: gio::File) {
    let state = state.clone();
    file.read_async(
        glib::Priority::DEFAULT,
        None::<&gio::Cancellable>,
        move |result| {
            let stream = match result {
                Ok(stream) => stream,
                Err(err) => {
                    glib::g_warning!("pairshot", "could not open photo: {err}");
                    return;
                }
            };

            let state = state.clone();
            Pixbuf::from_stream_async(&stream, None::<&gio::Cancellable>, move |result| {
                match result {
                    Ok(pixbuf) if pixbuf.width() > 0 && pixbuf.height() > 0 => {
                        begin_crop(&state, pixbuf);
                    }
                    Ok(_) => {
                        glib::g_warning!("pairshot", "picked image has no pixels, ignoring");
                    }
                    Err(err) => {
                        glib::g_warning!("pairshot", "could not decode photo: {err}");
                    }
                }
            });
        },
    );
}
