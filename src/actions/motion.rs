use tracing::debug;

use crate::gesture::NavigationDirection;
use crate::host::{Document, Navigator};

pub fn scroll(document: &dyn Document, delta_y: f64) {
    debug!("Scrolling page by {}px", delta_y);
    document.scroll_by(0.0, delta_y);
}

pub fn navigate(navigator: &dyn Navigator, direction: NavigationDirection) {
    match direction {
        NavigationDirection::Back => navigator.go_back(),
        NavigationDirection::Forward => navigator.go_forward(),
    }
}
