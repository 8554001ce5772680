//! Demo battle line-up.
use battle_core::{Position3D, Unit};

pub const COMBAT_ID: &str = "demo";

/// Texture keys and paths loaded by the view.
pub const ASSETS: [(&str, &str); 2] = [
    ("tile", "assets/tiles/grass.png"),
    ("effect", "assets/fx/numbers.png"),
];

/// Three against three on opposite corners of the grid.
pub fn units(grid_width: i32, grid_height: i32) -> Vec<Unit> {
    let far_x = (grid_width - 2).max(1);
    let far_y = (grid_height - 2).max(1);

    let mut archer = Unit::new("archer", "player", Position3D::new(1, 2, 0)).with_sprite("archer");
    archer.stats.range = 3;
    archer.stats.attack = 16;

    let mut brute = Unit::new("orc", "enemy", Position3D::new(far_x, far_y - 1, 0)).with_sprite("orc");
    brute.stats.hp = 130;
    brute.stats.hp_max = 130;
    brute.stats.speed = 7;

    vec![
        Unit::new("knight", "player", Position3D::new(1, 1, 0)).with_sprite("knight"),
        archer,
        Unit::new("squire", "player", Position3D::new(2, 1, 0)).with_sprite("knight"),
        Unit::new("goblin", "enemy", Position3D::new(far_x, far_y, 0)).with_sprite("goblin"),
        brute,
        Unit::new("imp", "enemy", Position3D::new(far_x - 1, far_y, 0)).with_sprite("goblin"),
    ]
}
