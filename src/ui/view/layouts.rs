//! 布局辅助函数

use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};

/// 按百分比居中的弹窗区域
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    horizontal_center(percent_x, popup_layout[1])
}

/// 宽度按百分比、高度固定行数的居中区域，用于单行输入框
pub fn centered_lines(percent_x: u16, height: u16, r: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(r);
    horizontal_center(percent_x, row)
}

fn horizontal_center(percent_x: u16, r: Rect) -> Rect {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(r)[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_lines_keeps_height() {
        let area = centered_lines(60, 5, Rect::new(0, 0, 100, 40));
        assert_eq!(area.height, 5);
        assert_eq!(area.width, 60);
        assert!(area.y > 0);
    }

    #[test]
    fn test_centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 80, 24);
        let area = centered_rect(80, 80, outer);
        assert!(outer.contains(area.as_position()));
        assert!(area.width <= 65);
    }
}
