use gettextrs::{LocaleCategory, setlocale};

mod ui;

const GETTEXT_DOMAIN: &str = "pairshot";

fn main() -> glib::ExitCode {
    setlocale(LocaleCategory::LcAll, "");
    let _ = gettextrs::bindtextdomain(GETTEXT_DOMAIN, "/usr/share/locale");
    let _ = gettextrs::bind_textdomain_codeset(GETTEXT_DOMAIN, "UTF-8");
    let _ = gettextrs::textdomain(GETTEXT_DOMAIN);

    ui::app::run()
}
