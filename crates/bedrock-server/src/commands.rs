//! Bedrock console command text for each game tool
//!
//! Pure string assembly; nothing here talks to the server.

use bedrock_core::{BedrockError, Result};
use std::fmt;
use std::str::FromStr;

/// Format a JSON number the way a player would type it: `10`, not `10.0`
pub fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Block coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pos {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Pos {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", fmt_num(self.x), fmt_num(self.y), fmt_num(self.z))
    }
}

pub fn teleport(player: &str, to: Pos) -> String {
    format!("tp {} {}", player, to)
}

pub fn give(player: &str, item: &str, amount: f64) -> String {
    format!("give {} {} {}", player, item, fmt_num(amount))
}

pub fn time_set(time: &str) -> String {
    format!("time set {}", time)
}

/// A zero or missing duration leaves the server default
pub fn weather(weather: &str, duration: Option<f64>) -> String {
    match duration {
        Some(d) if d != 0.0 => format!("weather {} {}", weather, fmt_num(d)),
        _ => format!("weather {}", weather),
    }
}

pub fn setblock(at: Pos, block: &str) -> String {
    format!("setblock {} {}", at, block)
}

pub fn fill(from: Pos, to: Pos, block: &str, mode: Option<&str>) -> String {
    match mode {
        Some(mode) => format!("fill {} {} {} {}", from, to, block, mode),
        None => format!("fill {} {} {}", from, to, block),
    }
}

pub fn clone(from: Pos, to: Pos, dest: Pos) -> String {
    format!("clone {} {} {}", from, to, dest)
}

pub fn structure_save(name: &str, from: Pos, to: Pos) -> String {
    format!("structure save {} {} {}", name, from, to)
}

pub fn structure_load(name: &str, at: Pos) -> String {
    format!("structure load {} {}", name, at)
}

pub fn summon(entity: &str, at: Pos) -> String {
    format!("summon {} {}", entity, at)
}

pub fn particle(particle: &str, at: Pos) -> String {
    format!("particle {} {}", particle, at)
}

/// Prefab shapes for `create-simple-building`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingKind {
    House,
    Tower,
    Wall,
    Platform,
    Pyramid,
}

impl FromStr for BuildingKind {
    type Err = BedrockError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "house" => Ok(Self::House),
            "tower" => Ok(Self::Tower),
            "wall" => Ok(Self::Wall),
            "platform" => Ok(Self::Platform),
            "pyramid" => Ok(Self::Pyramid),
            other => Err(BedrockError::InvalidArguments(format!(
                "Unknown structure type: {} (expected house, tower, wall, platform or pyramid)",
                other
            ))),
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::House => "house",
            Self::Tower => "tower",
            Self::Wall => "wall",
            Self::Platform => "platform",
            Self::Pyramid => "pyramid",
        };
        f.write_str(name)
    }
}

/// Largest accepted building size
pub const MAX_BUILDING_SIZE: f64 = 64.0;

/// Commands that build `kind` around `origin`, in execution order.
///
/// `size` must be finite and within `1..=MAX_BUILDING_SIZE`.
pub fn building_plan(
    kind: BuildingKind,
    origin: Pos,
    size: f64,
    material: &str,
) -> Result<Vec<String>> {
    if !size.is_finite() || !(1.0..=MAX_BUILDING_SIZE).contains(&size) {
        return Err(BedrockError::InvalidArguments(format!(
            "size must be between 1 and {}, got {}",
            fmt_num(MAX_BUILDING_SIZE),
            size
        )));
    }
    let s = size;
    let plan = match kind {
        BuildingKind::House => vec![
            // floor
            fill(origin.offset(-s, 0.0, -s), origin.offset(s, 0.0, s), material, None),
            // walls
            fill(
                origin.offset(-s, 1.0, -s),
                origin.offset(s, 5.0, s),
                material,
                Some("hollow"),
            ),
            // door
            setblock(origin.offset(0.0, 1.0, -s), "air"),
            // roof
            fill(origin.offset(-s, 6.0, -s), origin.offset(s, 6.0, s), material, None),
        ],
        BuildingKind::Tower => vec![fill(
            origin.offset(-s, 0.0, -s),
            origin.offset(s, 20.0, s),
            material,
            Some("hollow"),
        )],
        BuildingKind::Wall => vec![fill(
            origin.offset(0.0, 0.0, -s),
            origin.offset(0.0, 5.0, s),
            material,
            None,
        )],
        BuildingKind::Platform => vec![fill(
            origin.offset(-s, 0.0, -s),
            origin.offset(s, 0.0, s),
            material,
            None,
        )],
        BuildingKind::Pyramid => {
            let levels = size.floor() as i64;
            (0..levels)
                .map(|i| {
                    let half = (levels - i) as f64;
                    fill(
                        origin.offset(-half, i as f64, -half),
                        origin.offset(half, i as f64, half),
                        material,
                        None,
                    )
                })
                .collect()
        }
    };
    Ok(plan)
}
