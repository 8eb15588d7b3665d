use std::rc::Rc;
use std::time::Instant;

use gdk_pixbuf::Pixbuf;
use gtk4 as gtk;
use libadwaita as adw;

use super::records::Records;

#[derive(Clone, Debug, PartialEq)]
pub enum CardStatus {
    Hidden,
    Flipped,
    Matched,
}

/// A square photo tile. The encoded PNG bytes double as the tile's
/// identity: cards match when their bytes compare equal.
pub struct TileImage {
    pub png: Vec<u8>,
    pub pixbuf: Pixbuf,
}

impl TileImage {
    pub fn from_pixbuf(pixbuf: Pixbuf) -> Result<Self, glib::Error> {
        let png = pixbuf.save_to_bufferv("png", &[])?;
        Ok(TileImage { png, pixbuf })
    }

    pub fn from_png_bytes(png: Vec<u8>) -> Result<Self, glib::Error> {
        let stream = gio::MemoryInputStream::from_bytes(&glib::Bytes::from(png.as_slice()));
        let pixbuf = Pixbuf::from_stream(&stream, None::<&gio::Cancellable>)?;
        Ok(TileImage { png, pixbuf })
    }
}

#[derive(Clone)]
pub struct Card {
    pub tile: Rc<TileImage>,
    pub status: CardStatus,
}

#[derive(Debug, PartialEq)]
pub enum FlipOutcome {
    Ignored,
    Continue,
    Mismatch { first: usize, second: usize },
    Matched { first: usize, second: usize, finished: bool },
}

pub const MAX_PAIRS_WIDE: usize = 12;
pub const MAX_PAIRS_COMPACT: usize = 4;
const COMPACT_WIDTH: i32 = 500;

pub fn max_pairs_for_width(width: i32) -> usize {
    if width > 0 && width < COMPACT_WIDTH {
        MAX_PAIRS_COMPACT
    } else {
        MAX_PAIRS_WIDE
    }
}

/// Deduplicate by PNG bytes, shuffle, cap, pair up, shuffle again.
/// The result is always even-length and fully face-down.
pub fn build_deck(tiles: &[Rc<TileImage>], max_pairs: usize) -> Vec<Card> {
    use rand::seq::SliceRandom;

    let mut unique: Vec<Rc<TileImage>> = Vec::new();
    for tile in tiles {
        if !unique.iter().any(|seen| seen.png == tile.png) {
            unique.push(tile.clone());
        }
    }

    let mut rng = rand::rng();
    unique.shuffle(&mut rng);
    unique.truncate(max_pairs.max(1));

    let mut cards: Vec<Card> = unique
        .iter()
        .chain(unique.iter())
        .map(|tile| Card {
            tile: tile.clone(),
            status: CardStatus::Hidden,
        })
        .collect();
    cards.shuffle(&mut rng);
    cards
}

/// Most-square factor pair of the card count, wider than tall.
pub fn grid_dims(card_count: usize) -> (i32, i32) {
    if card_count == 0 {
        return (0, 0);
    }
    let mut best_cols = card_count;
    for cols in 1..=card_count {
        if card_count % cols != 0 {
            continue;
        }
        let rows = card_count / cols;
        if cols >= rows && cols - rows < best_cols - card_count / best_cols {
            best_cols = cols;
        }
    }
    (best_cols as i32, (card_count / best_cols) as i32)
}

pub struct AppState {
    pub view_stack: Option<gtk::Stack>,
    pub header: Option<adw::HeaderBar>,
    pub back_button: Option<gtk::Button>,
    pub menu_button: Option<gtk::MenuButton>,
    pub restart_button: Option<gtk::Button>,
    pub title_library: Option<gtk::Label>,
    pub title_game: Option<gtk::Widget>,
    pub title_game_subtitle: Option<gtk::Label>,
    pub title_crop: Option<gtk::Label>,
    pub board_container: Option<gtk::Box>,
    pub dynamic_css_provider: Option<gtk::CssProvider>,

    // Library
    pub tiles: Vec<Rc<TileImage>>,
    pub tile_flow: Option<gtk::FlowBox>,
    pub library_placeholder: Option<gtk::Box>,
    pub start_button: Option<gtk::Button>,
    pub delete_all_button: Option<gtk::Button>,
    pub best_time_label: Option<gtk::Label>,

    // Crop
    pub pending_image: Option<Pixbuf>,
    pub crop_scale: f64,
    pub crop_offset_x: f64,
    pub crop_offset_y: f64,
    pub crop_picture: Option<gtk::Picture>,
    pub crop_fixed: Option<gtk::Fixed>,
    pub crop_frame_area: Option<gtk::DrawingArea>,

    // Game
    pub cards: Vec<Card>,
    pub flipped_indices: Vec<usize>,
    pub grid_buttons: Vec<gtk::Button>,
    pub card_faces: Vec<gtk::Stack>,
    pub lock_input: bool,
    pub flip_anim_phase: bool,
    pub game_id: u64,
    pub grid_cols: i32,
    pub grid_rows: i32,
    pub run_started: Option<Instant>,
    pub run_elapsed_before: f64,
    pub timer_handle: Option<glib::SourceId>,
    pub records: Records,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            view_stack: None,
            header: None,
            back_button: None,
            menu_button: None,
            restart_button: None,
            title_library: None,
            title_game: None,
            title_game_subtitle: None,
            title_crop: None,
            board_container: None,
            dynamic_css_provider: None,
            tiles: Vec::new(),
            tile_flow: None,
            library_placeholder: None,
            start_button: None,
            delete_all_button: None,
            best_time_label: None,
            pending_image: None,
            crop_scale: 1.0,
            crop_offset_x: 0.0,
            crop_offset_y: 0.0,
            crop_picture: None,
            crop_fixed: None,
            crop_frame_area: None,
            cards: Vec::new(),
            flipped_indices: Vec::new(),
            grid_buttons: Vec::new(),
            card_faces: Vec::new(),
            lock_input: false,
            flip_anim_phase: false,
            game_id: 0,
            grid_cols: 0,
            grid_rows: 0,
            run_started: None,
            run_elapsed_before: 0.0,
            timer_handle: None,
            records: Records::default(),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps the game id so stale timeouts from the previous session
    /// see the change and bail.
    pub fn start_game(&mut self, max_pairs: usize) {
        self.game_id = self.game_id.wrapping_add(1);
        self.cards = build_deck(&self.tiles, max_pairs);
        self.flipped_indices.clear();
        self.lock_input = false;
        let (cols, rows) = grid_dims(self.cards.len());
        self.grid_cols = cols;
        self.grid_rows = rows;
        self.run_started = None;
        self.run_elapsed_before = 0.0;
    }

    pub fn end_game(&mut self) {
        self.game_id = self.game_id.wrapping_add(1);
        self.cards.clear();
        self.flipped_indices.clear();
        self.lock_input = false;
        self.run_started = None;
        self.run_elapsed_before = 0.0;
    }

    pub fn flip_card(&mut self, index: usize) -> FlipOutcome {
        if index >= self.cards.len()
            || self.lock_input
            || self.cards[index].status != CardStatus::Hidden
        {
            return FlipOutcome::Ignored;
        }

        self.cards[index].status = CardStatus::Flipped;
        self.flipped_indices.push(index);
        if self.flipped_indices.len() < 2 {
            return FlipOutcome::Continue;
        }

        let first = self.flipped_indices[0];
        let second = index;
        if self.cards[first].tile.png == self.cards[second].tile.png {
            self.cards[first].status = CardStatus::Matched;
            self.cards[second].status = CardStatus::Matched;
            self.flipped_indices.clear();
            let finished = self.cards.iter().all(|c| c.status == CardStatus::Matched);
            FlipOutcome::Matched {
                first,
                second,
                finished,
            }
        } else {
            // Input stays locked until the delayed flip-back runs.
            self.lock_input = true;
            FlipOutcome::Mismatch { first, second }
        }
    }

    pub fn unflip_mismatch(&mut self) -> Vec<usize> {
        let indices: Vec<usize> = self.flipped_indices.drain(..).collect();
        for &idx in &indices {
            if let Some(card) = self.cards.get_mut(idx)
                && card.status == CardStatus::Flipped
            {
                card.status = CardStatus::Hidden;
            }
        }
        self.lock_input = false;
        indices
    }

    pub fn current_elapsed(&self) -> f64 {
        self.run_elapsed_before
            + self
                .run_started
                .map(|started| started.elapsed().as_secs_f64())
                .unwrap_or(0.0)
    }

    pub fn remove_tile(&mut self, index: usize) {
        if index < self.tiles.len() {
            self.tiles.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdk_pixbuf::Colorspace;

    fn tile(marker: u8) -> Rc<TileImage> {
        let pixbuf = Pixbuf::new(Colorspace::Rgb, false, 8, 1, 1).unwrap();
        Rc::new(TileImage {
            png: vec![marker, marker, marker],
            pixbuf,
        })
    }

    fn state_with_deck(markers: &[u8]) -> AppState {
        let mut st = AppState::new();
        st.cards = markers
            .iter()
            .map(|&m| Card {
                tile: tile(m),
                status: CardStatus::Hidden,
            })
            .collect();
        st
    }

    #[test]
    fn deck_is_even_face_down_and_paired() {
        let tiles: Vec<_> = (0..5).map(tile).collect();
        let deck = build_deck(&tiles, MAX_PAIRS_WIDE);
        assert_eq!(deck.len(), 10);
        assert!(deck.iter().all(|c| c.status == CardStatus::Hidden));
        for t in &tiles {
            let copies = deck.iter().filter(|c| c.tile.png == t.png).count();
            assert_eq!(copies, 2);
        }
    }

    #[test]
    fn deck_dedups_and_caps() {
        let mut tiles: Vec<_> = (0..8).map(tile).collect();
        tiles.push(tile(0));
        tiles.push(tile(3));
        let deck = build_deck(&tiles, MAX_PAIRS_COMPACT);
        assert_eq!(deck.len(), MAX_PAIRS_COMPACT * 2);
        // Duplicate source tiles must not produce more than one pair.
        for card in &deck {
            let copies = deck.iter().filter(|c| c.tile.png == card.tile.png).count();
            assert_eq!(copies, 2);
        }
    }

    #[test]
    fn flip_two_equal_marks_matched() {
        let mut st = state_with_deck(&[1, 2, 1, 2]);
        assert_eq!(st.flip_card(0), FlipOutcome::Continue);
        let outcome = st.flip_card(2);
        assert_eq!(
            outcome,
            FlipOutcome::Matched {
                first: 0,
                second: 2,
                finished: false,
            }
        );
        assert_eq!(st.cards[0].status, CardStatus::Matched);
        assert_eq!(st.cards[2].status, CardStatus::Matched);
        assert!(st.flipped_indices.is_empty());
        assert!(!st.lock_input);
    }

    #[test]
    fn flip_two_unequal_locks_until_unflip() {
        let mut st = state_with_deck(&[1, 2, 1, 2]);
        st.flip_card(0);
        let outcome = st.flip_card(1);
        assert_eq!(outcome, FlipOutcome::Mismatch { first: 0, second: 1 });
        assert!(st.lock_input);
        // Taps are ignored while the flip-back is pending.
        assert_eq!(st.flip_card(2), FlipOutcome::Ignored);

        let reverted = st.unflip_mismatch();
        assert_eq!(reverted, vec![0, 1]);
        assert_eq!(st.cards[0].status, CardStatus::Hidden);
        assert_eq!(st.cards[1].status, CardStatus::Hidden);
        assert!(!st.lock_input);
    }

    #[test]
    fn unflip_never_reverts_matched_cards() {
        let mut st = state_with_deck(&[1, 1, 2, 2]);
        st.flip_card(0);
        st.flip_card(1);
        st.flipped_indices = vec![0, 1];
        st.unflip_mismatch();
        assert_eq!(st.cards[0].status, CardStatus::Matched);
        assert_eq!(st.cards[1].status, CardStatus::Matched);
    }

    #[test]
    fn last_pair_reports_finished() {
        let mut st = state_with_deck(&[7, 7]);
        st.flip_card(0);
        let outcome = st.flip_card(1);
        assert_eq!(
            outcome,
            FlipOutcome::Matched {
                first: 0,
                second: 1,
                finished: true,
            }
        );
    }

    #[test]
    fn flipped_and_matched_cards_ignore_taps() {
        let mut st = state_with_deck(&[1, 1, 2, 2]);
        st.flip_card(0);
        assert_eq!(st.flip_card(0), FlipOutcome::Ignored);
        st.flip_card(1);
        assert_eq!(st.flip_card(0), FlipOutcome::Ignored);
        assert_eq!(st.flip_card(1), FlipOutcome::Ignored);
    }

    #[test]
    fn restart_bumps_game_id_and_resets_deck() {
        let mut st = AppState::new();
        st.tiles = (0..3).map(tile).collect();
        st.start_game(MAX_PAIRS_WIDE);
        let first_id = st.game_id;
        st.flip_card(0);
        st.start_game(MAX_PAIRS_WIDE);
        assert_ne!(st.game_id, first_id);
        assert_eq!(st.cards.len(), 6);
        assert!(st.cards.iter().all(|c| c.status == CardStatus::Hidden));
        assert!(st.flipped_indices.is_empty());
    }

    #[test]
    fn remove_tile_shrinks_by_one() {
        let mut st = AppState::new();
        st.tiles = (0..4).map(tile).collect();
        st.remove_tile(1);
        assert_eq!(st.tiles.len(), 3);
        st.remove_tile(99);
        assert_eq!(st.tiles.len(), 3);
    }

    #[test]
    fn grid_dims_prefers_square_wide_layouts() {
        assert_eq!(grid_dims(0), (0, 0));
        assert_eq!(grid_dims(4), (2, 2));
        assert_eq!(grid_dims(6), (3, 2));
        assert_eq!(grid_dims(8), (4, 2));
        assert_eq!(grid_dims(12), (4, 3));
        assert_eq!(grid_dims(24), (6, 4));
    }

    #[test]
    fn pair_cap_follows_compact_breakpoint() {
        assert_eq!(max_pairs_for_width(360), MAX_PAIRS_COMPACT);
        assert_eq!(max_pairs_for_width(499), MAX_PAIRS_COMPACT);
        assert_eq!(max_pairs_for_width(500), MAX_PAIRS_WIDE);
        assert_eq!(max_pairs_for_width(1280), MAX_PAIRS_WIDE);
        assert_eq!(max_pairs_for_width(0), MAX_PAIRS_WIDE);
    }
}
