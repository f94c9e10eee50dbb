//! Property tests: the tower defense grid always keeps a valid path.

use lumen_engine::prelude::PathGraph;
use lumen_games::prelude::*;
use proptest::prelude::*;

fn cell() -> impl Strategy<Value = Cell> {
    (0usize..16, 0usize..7).prop_map(|(column, row)| Cell::new(column, row))
}

proptest! {
    #[test]
    fn path_survives_any_placement_sequence(cells in prop::collection::vec(cell(), 0..60)) {
        let grid = Grid::new(&TowerDefenseConfig::default());
        for cell in cells {
            let node = grid.node_at(cell).unwrap();
            let was_blocked = grid.is_blocked(node);
            match grid.block(cell) {
                Ok(placed) => {
                    prop_assert_eq!(placed, node);
                    prop_assert!(grid.is_blocked(node));
                }
                Err(TowerError::Occupied) => prop_assert!(was_blocked),
                Err(TowerError::Endpoint) => {
                    prop_assert!(node == grid.start() || node == grid.end());
                }
                Err(TowerError::BlocksPath) => prop_assert!(!grid.is_blocked(node)),
                Err(err) => prop_assert!(false, "unexpected {err}"),
            }

            let path = grid.path();
            prop_assert_eq!(path.first().copied(), Some(grid.start()));
            prop_assert_eq!(path.last().copied(), Some(grid.end()));
            prop_assert_eq!(grid.next_hop(grid.end()), None);
            for pair in path.windows(2) {
                prop_assert_eq!(grid.layout().manhattan(pair[0], pair[1]), 1.0);
            }
            for node in &path {
                prop_assert!(!grid.is_blocked(*node));
            }
        }
    }
}
