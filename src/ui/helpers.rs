use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Flatten a chained error into one footer-sized message: the outermost
/// description, plus the root cause when it adds information.
pub(crate) fn surface_error(err: &Error) -> String {
    let message = err.to_string();
    match err.chain().last() {
        Some(root) if root.to_string() != message => format!("{message}: {root}"),
        _ => message,
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn surface_error_appends_distinct_root_cause() {
        let err = anyhow!("disk unplugged").context("failed to insert book");
        assert_eq!(
            surface_error(&err),
            "failed to insert book: disk unplugged"
        );
    }

    #[test]
    fn surface_error_keeps_single_message_untouched() {
        let err = anyhow!("no book found with id 404");
        assert_eq!(surface_error(&err), "no book found with id 404");
    }

    #[test]
    fn centered_rect_stays_inside_the_area() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(60, 50, area);
        assert!(rect.x >= area.x && rect.right() <= area.right());
        assert!(rect.y >= area.y && rect.bottom() <= area.bottom());
    }
}
