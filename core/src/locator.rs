use serde::{Deserialize, Serialize};

use crate::*;

/// Cached result of a scanner ping.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ping {
    pub direction: Direction,
    pub distance: u32,
}

impl Ping {
    pub fn describe(&self) -> String {
        format!(
            "Nearest question node is {} (≈ {} steps).",
            self.direction, self.distance
        )
    }
}

/// Scans every hidden tile holding a question node and points at the closest
/// one by Manhattan distance. First-found wins ties, scan order is row-major.
pub fn locate_question_node(grid: &MineGrid, player: Coord2) -> Option<Ping> {
    let mut best: Option<(Coord2, u32)> = None;

    for coords in grid.iter_coords() {
        if !grid.is_hidden(coords) || grid.content_at(coords) != TileContent::QuestionNode {
            continue;
        }
        let distance = manhattan(coords, player);
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((coords, distance));
        }
    }

    let (target, distance) = best?;
    log::debug!("ping locked on {:?} at distance {}", target, distance);
    Some(Ping {
        direction: dominant_direction(player, target),
        distance,
    })
}

/// Dominant-axis direction label. Ties go to the vertical axis.
fn dominant_direction(from: Coord2, to: Coord2) -> Direction {
    let dx = i32::from(to.0) - i32::from(from.0);
    let dy = i32::from(to.1) - i32::from(from.1);

    if dx.abs() > dy.abs() {
        if dx > 0 { Direction::Right } else { Direction::Left }
    } else if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(size: Coord2, nodes: &[Coord2]) -> MineGrid {
        let mut layout = TileLayout::filled(GridConfig::new_unchecked(size));
        for &coords in nodes {
            layout[coords] = TileContent::QuestionNode;
        }
        MineGrid::new(layout)
    }

    #[test]
    fn finds_the_true_minimum_distance() {
        let grid = grid((8, 8), &[(7, 7), (5, 2), (0, 6)]);

        let ping = locate_question_node(&grid, (2, 2)).unwrap();

        assert_eq!(ping.distance, 3);
        assert_eq!(ping.direction, Direction::Right);
    }

    #[test]
    fn absent_when_no_hidden_node_exists() {
        let empty = grid((4, 4), &[]);
        assert_eq!(locate_question_node(&empty, (1, 1)), None);

        let mut revealed = grid((4, 4), &[(3, 3)]);
        revealed.reveal_at((3, 3)).unwrap();
        assert_eq!(locate_question_node(&revealed, (1, 1)), None);
    }

    #[test]
    fn scan_order_breaks_distance_ties() {
        // both nodes sit 2 away; (3, 1) comes first in row-major order
        let grid = grid((6, 6), &[(3, 1), (1, 3)]);

        let ping = locate_question_node(&grid, (1, 1)).unwrap();

        assert_eq!(ping.distance, 2);
        assert_eq!(ping.direction, Direction::Right);
    }

    #[test]
    fn axis_ties_point_vertically() {
        assert_eq!(dominant_direction((2, 2), (4, 4)), Direction::Down);
        assert_eq!(dominant_direction((2, 2), (0, 0)), Direction::Up);
        assert_eq!(dominant_direction((2, 2), (5, 3)), Direction::Right);
        assert_eq!(dominant_direction((2, 2), (0, 3)), Direction::Left);
    }
}
